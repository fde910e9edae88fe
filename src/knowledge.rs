//! Base de conocimiento estática: última prioridad del router.
//!
//! Las preguntas se normalizan al cargar y sobre ellas se calcula, una sola
//! vez, la tabla IDF y el vocabulario. Los vectores de las preguntas se
//! precalculan con ese mismo vocabulario.

use std::{fs, path::Path};

use anyhow::{Context, Result};
use tracing::{info, warn};

use crate::models::QaPair;
use crate::text::normalize;
use crate::tfidf::{cosine_similarity, vectorize, IdfTable, Vocabulary};

/// La similitud debe superar estrictamente este valor.
pub const SIMILARITY_THRESHOLD: f64 = 0.1;

#[derive(Debug, Clone)]
struct Entry {
    question: String,
    answer: String,
    vector: Vec<f64>,
}

#[derive(Debug, Clone, Default)]
pub struct KnowledgeBase {
    entries: Vec<Entry>,
    idf: IdfTable,
    vocabulary: Vocabulary,
}

impl KnowledgeBase {
    pub fn new(pairs: Vec<QaPair>) -> Self {
        let questions: Vec<String> = pairs.iter().map(|p| normalize(&p.question)).collect();
        let idf = IdfTable::compute(&questions);
        let vocabulary = idf.vocabulary();

        let entries = pairs
            .into_iter()
            .zip(questions)
            .map(|(pair, question)| Entry {
                vector: vectorize(&question, &vocabulary, &idf),
                question,
                answer: pair.answer,
            })
            .collect();

        Self {
            entries,
            idf,
            vocabulary,
        }
    }

    /// Carga `knowledge_base.json` (array de `{question, answer}`).
    pub fn load(path: &Path) -> Result<Self> {
        let raw = fs::read_to_string(path).with_context(|| {
            format!("No se pudo leer la base de conocimiento {}", path.display())
        })?;
        let pairs: Vec<QaPair> = serde_json::from_str(&raw)
            .with_context(|| format!("JSON de la base de conocimiento no válido en {}", path.display()))?;
        let kb = Self::new(pairs);
        info!(
            "Base de conocimiento cargada: {} preguntas, vocabulario de {} palabras.",
            kb.len(),
            kb.vocabulary.len()
        );
        Ok(kb)
    }

    /// Respuesta de la pregunta más parecida, si supera el umbral.
    ///
    /// `normalized_message` debe venir ya normalizado.
    pub fn answer(&self, normalized_message: &str) -> Option<&str> {
        if self.idf.is_empty() {
            return None;
        }
        let query = vectorize(normalized_message, &self.vocabulary, &self.idf);
        let scored = self.entries.iter().map(|entry| {
            let score = cosine_similarity(&query, &entry.vector).unwrap_or_else(|e| {
                warn!("Pregunta '{}' ignorada: {e}", entry.question);
                0.0
            });
            (score, entry.answer.as_str())
        });
        best_above_threshold(scored, SIMILARITY_THRESHOLD)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// Mejor candidato con `>` estricto: en caso de empate gana el primero.
pub fn best_above_threshold<'a, I>(candidates: I, threshold: f64) -> Option<&'a str>
where
    I: IntoIterator<Item = (f64, &'a str)>,
{
    let mut best_score = threshold;
    let mut best = None;
    for (score, answer) in candidates {
        if score > best_score {
            best_score = score;
            best = Some(answer);
        }
    }
    best
}
