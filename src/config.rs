use serde::Deserialize;
use std::{fs, path::Path};
use tracing::warn;

#[derive(Debug, Deserialize)]
pub struct Config {
    #[serde(default = "default_db_path")]
    pub db_path: String,
    #[serde(default)]
    pub extraction: ExtractionSection,
    /// VAT rate used when creating a fresh state; stored state wins.
    #[serde(default)]
    pub default_vat_rate: Option<f64>,
}

fn default_db_path() -> String {
    "teklif/state.db".to_string()
}

#[derive(Debug, Deserialize)]
pub struct ExtractionSection {
    #[serde(default = "default_ocr_languages")]
    pub ocr_languages: String,
}

fn default_ocr_languages() -> String {
    "tur+eng".to_string()
}

impl Default for ExtractionSection {
    fn default() -> Self {
        Self {
            ocr_languages: default_ocr_languages(),
        }
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            db_path: default_db_path(),
            extraction: ExtractionSection::default(),
            default_vat_rate: None,
        }
    }
}

impl Config {
    pub fn load(path: impl AsRef<Path>) -> Result<Self, Box<dyn std::error::Error>> {
        let content = fs::read_to_string(path)?;
        Ok(toml::from_str(&content)?)
    }

    /// Load the config file if present; otherwise run on defaults. A
    /// malformed file is reported but does not stop the program.
    pub fn load_or_default(path: impl AsRef<Path>) -> Self {
        let path = path.as_ref();
        if !path.exists() {
            return Self::default();
        }
        match Self::load(path) {
            Ok(config) => config,
            Err(e) => {
                warn!(path = %path.display(), error = %e, "config unreadable, using defaults");
                Self::default()
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults() {
        let config = Config::default();
        assert_eq!(config.db_path, "teklif/state.db");
        assert_eq!(config.extraction.ocr_languages, "tur+eng");
        assert!(config.default_vat_rate.is_none());
    }

    #[test]
    fn partial_toml_fills_in_defaults() {
        let config: Config = toml::from_str("db_path = \"custom.db\"").unwrap();
        assert_eq!(config.db_path, "custom.db");
        assert_eq!(config.extraction.ocr_languages, "tur+eng");
    }
}
