//! Carga y gestión de configuración de la aplicación.

use std::{env, path::PathBuf, str::FromStr, time::Duration};

use anyhow::{anyhow, Result};

/// Configuración completa de la aplicación.
#[derive(Clone, Debug)]
pub struct AppConfig {
    pub server_addr: String,
    pub knowledge_base_path: PathBuf,
    pub intents_path: PathBuf,
    pub abbreviations_path: PathBuf,
    pub frontend_dir: PathBuf,
    pub fetch_timeout: Duration,
    pub open_browser: bool,
    /// Semilla para que las respuestas de las intenciones sean reproducibles.
    pub reply_seed: Option<u64>,
}

impl AppConfig {
    /// Carga la configuración desde variables de entorno (usando .env si existe).
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Igual que `from_env`, pero leyendo de cualquier fuente clave → valor.
    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let var_or = |key: &str, default: &str| lookup(key).unwrap_or_else(|| default.to_string());

        let server_addr = var_or("SERVER_ADDR", "127.0.0.1:3322");
        let knowledge_base_path = PathBuf::from(var_or("KNOWLEDGE_BASE_PATH", "data/knowledge_base.json"));
        let intents_path = PathBuf::from(var_or("INTENTS_PATH", "data/intents.json"));
        let abbreviations_path = PathBuf::from(var_or("ABBREVIATIONS_PATH", "data/abbreviations.json"));
        let frontend_dir = PathBuf::from(var_or("FRONTEND_DIR", "frontend"));

        let fetch_timeout_secs: u64 = parse_var("FETCH_TIMEOUT_SECS", lookup("FETCH_TIMEOUT_SECS"))?.unwrap_or(15);
        if fetch_timeout_secs == 0 {
            return Err(anyhow!("FETCH_TIMEOUT_SECS debe ser mayor que 0"));
        }
        let open_browser = parse_bool("OPEN_BROWSER", lookup("OPEN_BROWSER"))?.unwrap_or(true);
        let reply_seed = parse_var("REPLY_SEED", lookup("REPLY_SEED"))?;

        Ok(Self {
            server_addr,
            knowledge_base_path,
            intents_path,
            abbreviations_path,
            frontend_dir,
            fetch_timeout: Duration::from_secs(fetch_timeout_secs),
            open_browser,
            reply_seed,
        })
    }
}

fn parse_var<T: FromStr>(key: &str, value: Option<String>) -> Result<Option<T>> {
    value
        .map(|raw| {
            raw.trim()
                .parse()
                .map_err(|_| anyhow!("Valor no válido para {key}: '{raw}'"))
        })
        .transpose()
}

fn parse_bool(key: &str, value: Option<String>) -> Result<Option<bool>> {
    value
        .map(|raw| match raw.trim().to_lowercase().as_str() {
            "1" | "true" | "yes" | "on" => Ok(true),
            "0" | "false" | "no" | "off" => Ok(false),
            _ => Err(anyhow!("Valor booleano no válido para {key}: '{raw}'")),
        })
        .transpose()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn config_from(pairs: &[(&str, &str)]) -> Result<AppConfig> {
        let vars: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        AppConfig::from_lookup(|key| vars.get(key).cloned())
    }

    #[test]
    fn defaults_when_nothing_is_set() {
        let cfg = config_from(&[]).unwrap();
        assert_eq!(cfg.server_addr, "127.0.0.1:3322");
        assert_eq!(cfg.knowledge_base_path, PathBuf::from("data/knowledge_base.json"));
        assert_eq!(cfg.fetch_timeout, Duration::from_secs(15));
        assert!(cfg.open_browser);
        assert_eq!(cfg.reply_seed, None);
    }

    #[test]
    fn overrides_are_parsed() {
        let cfg = config_from(&[
            ("SERVER_ADDR", "0.0.0.0:8080"),
            ("FETCH_TIMEOUT_SECS", "30"),
            ("OPEN_BROWSER", "off"),
            ("REPLY_SEED", "42"),
        ])
        .unwrap();
        assert_eq!(cfg.server_addr, "0.0.0.0:8080");
        assert_eq!(cfg.fetch_timeout, Duration::from_secs(30));
        assert!(!cfg.open_browser);
        assert_eq!(cfg.reply_seed, Some(42));
    }

    #[test]
    fn invalid_values_are_errors() {
        assert!(config_from(&[("FETCH_TIMEOUT_SECS", "abc")]).is_err());
        assert!(config_from(&[("FETCH_TIMEOUT_SECS", "0")]).is_err());
        assert!(config_from(&[("OPEN_BROWSER", "quizás")]).is_err());
        assert!(config_from(&[("REPLY_SEED", "-1")]).is_err());
    }
}
