//! Expansión de abreviaturas antes de que el mensaje llegue al router.
//!
//! El router recibe texto ya expandido; la capa HTTP aplica el
//! `Preprocessor` configurado. Las abreviaturas se comparan palabra a palabra
//! (sin distinguir mayúsculas) conservando la puntuación que las rodea.

use std::{collections::HashMap, fs, path::Path};

use anyhow::{Context, Result};
use tracing::info;

/// Transformación previa del mensaje del usuario.
pub trait Preprocessor: Send + Sync {
    fn preprocess(&self, message: &str) -> String;
}

#[derive(Debug, Clone, Default)]
pub struct AbbreviationExpander {
    table: HashMap<String, String>,
}

impl AbbreviationExpander {
    pub fn new<I, K, V>(entries: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: AsRef<str>,
        V: Into<String>,
    {
        let table = entries
            .into_iter()
            .map(|(k, v)| (k.as_ref().to_lowercase(), v.into()))
            .collect();
        Self { table }
    }

    /// Carga un objeto JSON `{ "abreviatura": "expansión" }`.
    /// Si el fichero no existe se devuelve un expansor vacío.
    pub fn load(path: &Path) -> Result<Self> {
        if !path.exists() {
            info!("Sin fichero de abreviaturas en {}. No se expandirá nada.", path.display());
            return Ok(Self::default());
        }
        let raw = fs::read_to_string(path)
            .with_context(|| format!("No se pudo leer el fichero de abreviaturas {}", path.display()))?;
        let table: HashMap<String, String> = serde_json::from_str(&raw)
            .with_context(|| format!("JSON de abreviaturas no válido en {}", path.display()))?;
        let expander = Self::new(table);
        info!("Cargadas {} abreviaturas desde {}", expander.len(), path.display());
        Ok(expander)
    }

    pub fn len(&self) -> usize {
        self.table.len()
    }

    pub fn is_empty(&self) -> bool {
        self.table.is_empty()
    }

    fn expand_word(&self, word: &str) -> Option<String> {
        let core_start = word.find(|c: char| c.is_alphanumeric())?;
        let core_end = word
            .char_indices()
            .rev()
            .find(|(_, c)| c.is_alphanumeric())
            .map(|(i, c)| i + c.len_utf8())?;
        let core = &word[core_start..core_end];
        let expansion = self.table.get(&core.to_lowercase())?;
        Some(format!("{}{}{}", &word[..core_start], expansion, &word[core_end..]))
    }
}

impl Preprocessor for AbbreviationExpander {
    fn preprocess(&self, message: &str) -> String {
        if self.is_empty() {
            return message.to_string();
        }
        message
            .split(' ')
            .map(|word| self.expand_word(word).unwrap_or_else(|| word.to_string()))
            .collect::<Vec<_>>()
            .join(" ")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn expander() -> AbbreviationExpander {
        AbbreviationExpander::new([("ko", "không"), ("dc", "được"), ("tks", "cảm ơn")])
    }

    #[test]
    fn expands_whole_words_case_insensitively() {
        let e = expander();
        assert_eq!(e.preprocess("Ko dc sao"), "không được sao");
        // "kok" no es una abreviatura
        assert_eq!(e.preprocess("kok"), "kok");
    }

    #[test]
    fn keeps_surrounding_punctuation() {
        let e = expander();
        assert_eq!(e.preprocess("tks!"), "cảm ơn!");
        assert_eq!(e.preprocess("(ko)"), "(không)");
    }

    #[test]
    fn preserves_spacing() {
        let e = expander();
        assert_eq!(e.preprocess("ko  dc"), "không  được");
        assert_eq!(e.preprocess(""), "");
    }

    #[test]
    fn missing_file_gives_empty_expander() {
        let e = AbbreviationExpander::load(Path::new("/no/such/abbrev.json")).unwrap();
        assert!(e.is_empty());
    }

    #[test]
    fn load_reads_json_object() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("abbrev.json");
        fs::write(&path, r#"{"k": "không", "VN": "Việt Nam"}"#).unwrap();
        let e = AbbreviationExpander::load(&path).unwrap();
        assert_eq!(e.len(), 2);
        assert_eq!(e.preprocess("vn k"), "Việt Nam không");
    }
}
