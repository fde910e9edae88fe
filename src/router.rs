//! Router de respuestas: decide qué estrategia contesta cada mensaje.
//!
//! Orden estricto, gana la primera que produce algo:
//!   1. Sesión de extracción activa (cierre, resumen o pregunta al documento).
//!   2. Cálculo aritmético.
//!   3. Intenciones por patrones.
//!   4. Base de conocimiento TF-IDF.
//!
//! El router no guarda estado mutable: la sesión se le pasa explícitamente
//! y la aleatoriedad de las intenciones llega como `Rng`.

use rand::Rng;
use serde::Serialize;
use tracing::debug;

use crate::intent::IntentSet;
use crate::knowledge::KnowledgeBase;
use crate::math;
use crate::models::SessionSummary;
use crate::session::{ExtractionContext, NOT_RELEVANT_MESSAGE};
use crate::text::normalize;

/// Palabras que cierran la sesión de extracción.
pub const CLOSING_KEYWORDS: &[&str] = &["thoát", "xong", "cảm ơn", "đủ rồi", "kết thúc"];
/// Palabra que pide un resumen del documento.
pub const SUMMARY_KEYWORD: &str = "tóm tắt";

pub const CANNOT_ANSWER_MESSAGE: &str =
    "Xin lỗi, tôi chưa hiểu câu hỏi của bạn. Bạn có thể hỏi theo cách khác không?";

/// Resultado de procesar un mensaje.
#[derive(Debug, Clone, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Reply {
    /// Respuesta de texto normal.
    Text { text: String },
    /// La sesión de extracción terminó; no hay texto, sólo la tarjeta de resumen.
    EndSession { summary: SessionSummary },
    /// Nada que responder.
    Silent,
}

impl Reply {
    fn text(text: impl Into<String>) -> Self {
        Reply::Text { text: text.into() }
    }

    #[cfg(test)]
    pub fn as_text(&self) -> Option<&str> {
        match self {
            Reply::Text { text } => Some(text),
            _ => None,
        }
    }
}

/// Estrategia que produjo la respuesta (para trazas).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Strategy {
    Extraction,
    Math,
    Intent,
    KnowledgeBase,
    Empty,
}

#[derive(Debug, Clone, Default)]
pub struct ResponseRouter {
    knowledge: KnowledgeBase,
    intents: IntentSet,
}

impl ResponseRouter {
    pub fn new(knowledge: KnowledgeBase, intents: IntentSet) -> Self {
        Self { knowledge, intents }
    }

    /// Procesa un mensaje ya preprocesado. Nunca falla.
    pub fn route<R: Rng + ?Sized>(
        &self,
        session: &mut Option<ExtractionContext>,
        message: &str,
        rng: &mut R,
    ) -> Reply {
        let (strategy, reply) = self.decide(session, message, rng);
        debug!("Mensaje respondido por {:?}", strategy);
        reply
    }

    fn decide<R: Rng + ?Sized>(
        &self,
        session: &mut Option<ExtractionContext>,
        message: &str,
        rng: &mut R,
    ) -> (Strategy, Reply) {
        if message.trim().is_empty() {
            return (Strategy::Empty, Reply::Silent);
        }

        if let Some(reply) = extraction_reply(session, message) {
            return (Strategy::Extraction, reply);
        }

        if let Some(result) = math::solve(message) {
            return (Strategy::Math, Reply::text(result));
        }

        let normalized = normalize(message);
        if let Some(response) = self.intents.respond(&normalized, rng) {
            return (Strategy::Intent, Reply::text(response));
        }

        let answer = self
            .knowledge
            .answer(&normalized)
            .unwrap_or(CANNOT_ANSWER_MESSAGE);
        (Strategy::KnowledgeBase, Reply::text(answer))
    }
}

/// Prioridad 1. `None` si no hay sesión activa con frases.
fn extraction_reply(session: &mut Option<ExtractionContext>, message: &str) -> Option<Reply> {
    let context = session.as_ref().filter(|ctx| ctx.has_corpus())?;
    let lowered = message.to_lowercase();

    if CLOSING_KEYWORDS.iter().any(|k| lowered.contains(k)) {
        let summary = session.take()?.close();
        return Some(Reply::EndSession { summary });
    }

    if lowered.contains(SUMMARY_KEYWORD) {
        return Some(Reply::text(context.summarize()));
    }

    Some(Reply::text(
        context.answer(message).unwrap_or(NOT_RELEVANT_MESSAGE),
    ))
}
