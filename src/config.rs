use std::collections::BTreeMap;
use std::fs;
use std::path::Path;

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

/// Pattern extraction settings
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct ExtractionConfig {
    /// Fewest digits a phone number may have after normalization
    pub min_phone_digits: usize,
    /// Most digits a phone number may have after normalization
    pub max_phone_digits: usize,
    /// Drop the leading `1` of 11-digit numbers (North American country code)
    pub strip_country_code: bool,
    /// Also match IPv6 addresses
    pub ipv6: bool,
}

impl Default for ExtractionConfig {
    fn default() -> Self {
        Self {
            min_phone_digits: 7,
            max_phone_digits: 15,
            strip_country_code: true,
            ipv6: true,
        }
    }
}

/// Application configuration
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct AppConfig {
    pub extraction: ExtractionConfig,
    /// Display names for source tiles, keyed by source id
    pub source_names: BTreeMap<String, String>,
}

impl Default for AppConfig {
    fn default() -> Self {
        let source_names = [("1", "Source 1"), ("2", "Source 2")]
            .into_iter()
            .map(|(id, name)| (id.to_string(), name.to_string()))
            .collect();
        Self {
            extraction: ExtractionConfig::default(),
            source_names,
        }
    }
}

impl AppConfig {
    /// Display name for a source; unnamed sources get "Source <id>"
    pub fn source_name(&self, source_id: &str) -> String {
        self.source_names
            .get(source_id)
            .cloned()
            .unwrap_or_else(|| format!("Source {}", source_id))
    }
}

/// Load configuration from a JSON file, or defaults when no path is given
pub fn load_config(path: Option<&Path>) -> Result<AppConfig> {
    let Some(path) = path else {
        return Ok(AppConfig::default());
    };

    let content = fs::read_to_string(path)
        .with_context(|| format!("failed to read config file {}", path.display()))?;
    let config: AppConfig = serde_json::from_str(&content)
        .with_context(|| format!("failed to parse config file {}", path.display()))?;

    if config.extraction.min_phone_digits > config.extraction.max_phone_digits {
        anyhow::bail!(
            "minPhoneDigits ({}) exceeds maxPhoneDigits ({})",
            config.extraction.min_phone_digits,
            config.extraction.max_phone_digits
        );
    }

    log::debug!("Loaded config from {}", path.display());
    Ok(config)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_missing_fields_fall_back_to_defaults() {
        let config: AppConfig =
            serde_json::from_str(r#"{"extraction": {"minPhoneDigits": 10}}"#).unwrap();
        assert_eq!(config.extraction.min_phone_digits, 10);
        assert_eq!(config.extraction.max_phone_digits, 15);
        assert!(config.extraction.strip_country_code);
        assert_eq!(config.source_name("1"), "Source 1");
    }

    #[test]
    fn test_unknown_source_gets_generated_name() {
        let config = AppConfig::default();
        assert_eq!(config.source_name("7"), "Source 7");
    }

    #[test]
    fn test_load_config_without_path() {
        assert_eq!(load_config(None).unwrap(), AppConfig::default());
    }

    #[test]
    fn test_load_config_rejects_inverted_digit_bounds() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(
            file,
            r#"{{"extraction": {{"minPhoneDigits": 12, "maxPhoneDigits": 8}}}}"#
        )
        .unwrap();

        let err = load_config(Some(file.path())).unwrap_err();
        assert!(err.to_string().contains("minPhoneDigits"));
    }
}
