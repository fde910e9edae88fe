//! Modelos de los ficheros de datos y de los resultados que ve el frontend.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Par pregunta/respuesta tal y como aparece en `knowledge_base.json`.
#[derive(Debug, Clone, Deserialize)]
pub struct QaPair {
    pub question: String,
    pub answer: String,
}

/// Intención en `intents.json`: patrones (subcadenas) y respuestas candidatas.
#[derive(Debug, Clone, Deserialize)]
pub struct IntentSpec {
    #[serde(default)]
    pub patterns: Vec<String>,
    #[serde(default)]
    pub responses: Vec<String>,
}

/// Origen del documento de la sesión de extracción.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "type", content = "value", rename_all = "snake_case")]
pub enum DocumentSource {
    File(String),
    Url(String),
    Text(String),
}

impl std::fmt::Display for DocumentSource {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            DocumentSource::File(path) => write!(f, "fichero {path}"),
            DocumentSource::Url(url) => write!(f, "URL {url}"),
            DocumentSource::Text(title) => write!(f, "texto '{title}'"),
        }
    }
}

/// Datos de la sesión activa, devueltos al analizar un documento.
#[derive(Debug, Clone, Serialize)]
pub struct SessionInfo {
    pub source: DocumentSource,
    pub sentences: usize,
    pub vocabulary: usize,
    pub characters: usize,
    pub started_at: DateTime<Utc>,
}

/// Tarjeta de resumen que el frontend muestra al cerrar la sesión.
#[derive(Debug, Clone, Serialize)]
pub struct SessionSummary {
    #[serde(flatten)]
    pub info: SessionInfo,
    pub ended_at: DateTime<Utc>,
}
