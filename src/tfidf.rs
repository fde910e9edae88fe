//! Pesos IDF, vectorización TF-IDF y similitud coseno.
//!
//! La frecuencia de documento cuenta los documentos que *contienen* la
//! palabra como subcadena, no como token. Es el comportamiento de referencia
//! del asistente y se mantiene tal cual (ver DESIGN.md).

use std::collections::HashMap;

use indexmap::IndexMap;

use crate::error::{AssistantError, AssistantResult};
use crate::text::{char_len, split_words};

/// Tabla palabra → peso IDF calculada sobre un corpus fijo.
///
/// El orden de inserción (primera aparición en el corpus) define el orden
/// del vocabulario y no cambia durante la vida de la tabla.
#[derive(Debug, Clone, Default)]
pub struct IdfTable {
    weights: IndexMap<String, f64>,
    documents: usize,
}

impl IdfTable {
    /// Calcula `ln(N / (1 + df)) + 1` para cada palabra (longitud > 1).
    pub fn compute<S: AsRef<str>>(corpus: &[S]) -> Self {
        if corpus.is_empty() {
            return Self::default();
        }

        let n = corpus.len() as f64;
        let docs: Vec<&str> = corpus.iter().map(|doc| doc.as_ref()).collect();
        let joined = docs.join(" ");

        let mut weights = IndexMap::new();
        for word in split_words(&joined) {
            if char_len(word) <= 1 || weights.contains_key(word) {
                continue;
            }
            let containing = docs.iter().filter(|doc| doc.contains(word)).count() as f64;
            weights.insert(word.to_string(), (n / (1.0 + containing)).ln() + 1.0);
        }

        Self {
            weights,
            documents: corpus.len(),
        }
    }

    pub fn weight(&self, word: &str) -> Option<f64> {
        self.weights.get(word).copied()
    }

    /// Peso de la palabra, o 0 si no está en la tabla.
    pub fn weight_or_zero(&self, word: &str) -> f64 {
        self.weight(word).unwrap_or(0.0)
    }

    pub fn vocabulary(&self) -> Vocabulary {
        Vocabulary(self.weights.keys().cloned().collect())
    }

    pub fn len(&self) -> usize {
        self.weights.len()
    }

    pub fn is_empty(&self) -> bool {
        self.weights.is_empty()
    }

    /// Número de documentos del corpus de origen.
    #[cfg(test)]
    pub fn documents(&self) -> usize {
        self.documents
    }
}

/// Palabras de una `IdfTable`, en su orden estable. Fija la dimensión de los vectores.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Vocabulary(Vec<String>);

impl Vocabulary {
    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &str> {
        self.0.iter().map(String::as_str)
    }
}

/// Vector TF-IDF de `text` con una dimensión por palabra del vocabulario.
///
/// TF = apariciones / total de palabras del texto (separadas por espacios).
/// Si una palabra del vocabulario no tiene peso en `idf` se usa 1.
pub fn vectorize(text: &str, vocabulary: &Vocabulary, idf: &IdfTable) -> Vec<f64> {
    let words = split_words(text);
    if words.is_empty() || vocabulary.is_empty() {
        return vec![0.0; vocabulary.len()];
    }

    let total = words.len() as f64;
    let mut counts: HashMap<&str, usize> = HashMap::new();
    for word in words {
        *counts.entry(word).or_insert(0) += 1;
    }

    vocabulary
        .iter()
        .map(|word| match counts.get(word) {
            Some(&count) => (count as f64 / total) * idf.weight(word).unwrap_or(1.0),
            None => 0.0,
        })
        .collect()
}

/// Similitud coseno. Devuelve 0 si alguno de los vectores tiene módulo nulo.
pub fn cosine_similarity(a: &[f64], b: &[f64]) -> AssistantResult<f64> {
    if a.len() != b.len() {
        return Err(AssistantError::DimensionMismatch {
            left: a.len(),
            right: b.len(),
        });
    }

    let dot: f64 = a.iter().zip(b).map(|(x, y)| x * y).sum();
    let norm_a = a.iter().map(|x| x * x).sum::<f64>().sqrt();
    let norm_b = b.iter().map(|x| x * x).sum::<f64>().sqrt();

    if norm_a == 0.0 || norm_b == 0.0 {
        Ok(0.0)
    } else {
        Ok(dot / (norm_a * norm_b))
    }
}
