//! Errores tipados del asistente.
//!
//! El arranque y la configuración usan `anyhow`; estos son los fallos de
//! dominio que la API traduce a códigos HTTP.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum AssistantError {
    #[error("Dimensiones distintas en la similitud coseno: {left} frente a {right}")]
    DimensionMismatch { left: usize, right: usize },
    #[error("Formato de documento no soportado: {0}")]
    UnsupportedFormat(String),
    #[error("El documento no contiene frases útiles: {0}")]
    EmptyDocument(String),
    #[error("URL no válida: {0}")]
    InvalidUrl(String),
    #[error("Error descargando el documento: {0}")]
    Fetch(String),
    #[error("Error de E/S: {0}")]
    Io(#[from] std::io::Error),
}

impl From<reqwest::Error> for AssistantError {
    fn from(e: reqwest::Error) -> Self {
        AssistantError::Fetch(e.to_string())
    }
}

impl From<url::ParseError> for AssistantError {
    fn from(e: url::ParseError) -> Self {
        AssistantError::InvalidUrl(e.to_string())
    }
}

pub type AssistantResult<T> = Result<T, AssistantError>;
