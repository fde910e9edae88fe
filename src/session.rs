//! Sesión de extracción: preguntas y resúmenes sobre un documento del usuario.
//!
//! Al recibir el texto se calcula de una vez el corpus de frases y su tabla
//! IDF. El contexto es inmutable; un documento nuevo lo sustituye entero.

use chrono::{DateTime, Utc};
use indexmap::IndexSet;

use crate::models::{DocumentSource, SessionInfo, SessionSummary};
use crate::text::{build_corpus, char_len, normalize, split_words};
use crate::tfidf::IdfTable;

/// Puntuación mínima (exclusiva) para responder con una frase del documento.
pub const ANSWER_THRESHOLD: f64 = 0.5;
/// Frases que componen un resumen.
pub const SUMMARY_SENTENCES: usize = 3;

pub const NOT_RELEVANT_MESSAGE: &str =
    "Xin lỗi, tôi không tìm thấy thông tin liên quan trong tài liệu.";

#[derive(Debug, Clone)]
pub struct ExtractionContext {
    source: DocumentSource,
    raw_text: String,
    corpus: Vec<String>,
    idf: IdfTable,
    started_at: DateTime<Utc>,
}

impl ExtractionContext {
    /// Construye corpus e IDF. Trabajo por lotes: en el servidor se ejecuta
    /// en `spawn_blocking`.
    pub fn analyze(source: DocumentSource, raw_text: String) -> Self {
        let corpus = build_corpus(&raw_text);
        let idf = IdfTable::compute(&corpus);
        Self {
            source,
            raw_text,
            corpus,
            idf,
            started_at: Utc::now(),
        }
    }

    pub fn corpus(&self) -> &[String] {
        &self.corpus
    }

    pub fn idf(&self) -> &IdfTable {
        &self.idf
    }

    pub fn source(&self) -> &DocumentSource {
        &self.source
    }

    pub fn has_corpus(&self) -> bool {
        !self.corpus.is_empty()
    }

    pub fn info(&self) -> SessionInfo {
        SessionInfo {
            source: self.source.clone(),
            sentences: self.corpus.len(),
            vocabulary: self.idf.len(),
            characters: char_len(&self.raw_text),
            started_at: self.started_at,
        }
    }

    /// Consume el contexto y genera la tarjeta de cierre.
    pub fn close(self) -> SessionSummary {
        SessionSummary {
            info: self.info(),
            ended_at: Utc::now(),
        }
    }

    /// Las `SUMMARY_SENTENCES` frases con mayor suma de IDF, como lista.
    ///
    /// Las palabras no se deduplican. La ordenación es estable, así que en
    /// caso de empate se respeta el orden del documento.
    pub fn summarize(&self) -> String {
        let mut scored: Vec<(f64, &str)> = self
            .corpus
            .iter()
            .map(|sentence| {
                let score: f64 = split_words(sentence)
                    .into_iter()
                    .map(|word| self.idf.weight_or_zero(word))
                    .sum();
                (score, sentence.as_str())
            })
            .collect();
        scored.sort_by(|a, b| b.0.total_cmp(&a.0));

        scored
            .into_iter()
            .take(SUMMARY_SENTENCES)
            .map(|(_, sentence)| format!("- {}", sentence.trim()))
            .collect::<Vec<_>>()
            .join("\n")
    }

    /// Frase del documento que mejor responde al mensaje, si supera el umbral.
    ///
    /// Cada palabra distinta del mensaje (longitud > 1) suma su IDF a las
    /// frases que la contienen como subcadena. Gana el primer máximo.
    pub fn answer(&self, message: &str) -> Option<&str> {
        let normalized = normalize(message);
        let query: IndexSet<&str> = split_words(&normalized)
            .into_iter()
            .filter(|word| char_len(word) > 1)
            .collect();

        let mut best_score = 0.0;
        let mut best: Option<&str> = None;
        for sentence in &self.corpus {
            let score: f64 = query
                .iter()
                .filter(|word| sentence.contains(**word))
                .map(|word| self.idf.weight_or_zero(word))
                .sum();
            if score > best_score {
                best_score = score;
                best = Some(sentence.as_str());
            }
        }

        if best_score > ANSWER_THRESHOLD {
            best.map(str::trim)
        } else {
            None
        }
    }
}
