//! Intenciones por patrones: la tercera prioridad del router.
//!
//! Se recorren las intenciones en el orden de carga y, dentro de cada una,
//! los patrones en orden. La primera subcadena encontrada decide; no hay
//! puntuación entre intenciones.

use std::{fs, path::Path};

use anyhow::{Context, Result};
use rand::seq::SliceRandom;
use rand::Rng;
use tracing::{info, warn};

use crate::models::IntentSpec;

#[derive(Debug, Clone)]
pub struct Intent {
    patterns: Vec<String>,
    responses: Vec<String>,
}

impl Intent {
    /// Descarta patrones vacíos. `None` si no quedan patrones o no hay respuestas.
    pub fn new(patterns: Vec<String>, responses: Vec<String>) -> Option<Self> {
        let patterns: Vec<String> = patterns.into_iter().filter(|p| !p.is_empty()).collect();
        if patterns.is_empty() || responses.is_empty() {
            return None;
        }
        Some(Self {
            patterns,
            responses,
        })
    }

    fn matches(&self, normalized_message: &str) -> bool {
        self.patterns
            .iter()
            .any(|pattern| normalized_message.contains(pattern.as_str()))
    }
}

/// Conjunto inmutable de intenciones, en orden de carga.
#[derive(Debug, Clone, Default)]
pub struct IntentSet {
    intents: Vec<Intent>,
}

impl IntentSet {
    pub fn new(intents: Vec<Intent>) -> Self {
        Self { intents }
    }

    /// Construye el conjunto a partir de las especificaciones del fichero,
    /// avisando de las entradas que no se pueden usar.
    pub fn from_specs(specs: Vec<IntentSpec>) -> Self {
        let mut intents = Vec::with_capacity(specs.len());
        for (index, spec) in specs.into_iter().enumerate() {
            match Intent::new(spec.patterns, spec.responses) {
                Some(intent) => intents.push(intent),
                None => warn!("Intención #{index} sin patrones o sin respuestas. Se ignora."),
            }
        }
        Self::new(intents)
    }

    /// Carga `intents.json` (array de `{patterns, responses}`).
    pub fn load(path: &Path) -> Result<Self> {
        let raw = fs::read_to_string(path)
            .with_context(|| format!("No se pudo leer el fichero de intenciones {}", path.display()))?;
        let specs: Vec<IntentSpec> = serde_json::from_str(&raw)
            .with_context(|| format!("JSON de intenciones no válido en {}", path.display()))?;
        let set = Self::from_specs(specs);
        info!("Cargadas {} intenciones desde {}", set.len(), path.display());
        Ok(set)
    }

    /// Respuesta aleatoria de la primera intención cuyo patrón aparece en el mensaje.
    pub fn respond<R: Rng + ?Sized>(&self, normalized_message: &str, rng: &mut R) -> Option<String> {
        self.intents
            .iter()
            .find(|intent| intent.matches(normalized_message))
            .and_then(|intent| intent.responses.choose(rng))
            .cloned()
    }

    pub fn len(&self) -> usize {
        self.intents.len()
    }

    pub fn is_empty(&self) -> bool {
        self.intents.is_empty()
    }
}
