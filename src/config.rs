use std::path::PathBuf;

use thiserror::Error;

/// Application-level constants
pub const APP_NAME: &str = "Labport";
pub const APP_VERSION: &str = env!("CARGO_PKG_VERSION");

/// Endpoint and model defaults for the extraction API.
pub const DEFAULT_API_BASE_URL: &str = "https://api.openai.com/v1";
pub const DEFAULT_MODEL: &str = "gpt-4o-mini";

const DEFAULT_MAX_OUTPUT_TOKENS: u32 = 2048;
const DEFAULT_TIMEOUT_SECS: u64 = 120;
const DEFAULT_MAX_ATTEMPTS: usize = 4;

/// Tracing filter used when RUST_LOG is unset.
pub fn default_log_filter() -> &'static str {
    "info,labport=debug"
}

/// Default vault location: ~/Labport/vault (user-visible on all platforms)
pub fn default_vault_dir() -> PathBuf {
    let home = dirs::home_dir().expect("Cannot determine home directory");
    home.join("Labport").join("vault")
}

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("missing required environment variable: {0}")]
    MissingVar(&'static str),

    #[error("invalid value for {var}: {value}")]
    InvalidVar { var: &'static str, value: String },
}

/// Everything the components need, resolved once at process start and
/// passed in explicitly. No ambient global client or credential state.
#[derive(Debug, Clone)]
pub struct AppConfig {
    pub api_key: String,
    pub api_base_url: String,
    pub model: String,
    pub max_output_tokens: u32,
    pub request_timeout_secs: u64,
    pub max_attempts: usize,
    pub vault_dir: PathBuf,
    pub webhook_url: Option<String>,
}

impl AppConfig {
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Resolve from a lookup function (tests inject a map instead of
    /// touching the process environment).
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let api_key = lookup("LABPORT_API_KEY")
            .or_else(|| lookup("OPENAI_API_KEY"))
            .ok_or(ConfigError::MissingVar("LABPORT_API_KEY"))?;

        let api_base_url = lookup("LABPORT_API_BASE_URL")
            .unwrap_or_else(|| DEFAULT_API_BASE_URL.to_string());

        let model = lookup("LABPORT_MODEL").unwrap_or_else(|| DEFAULT_MODEL.to_string());

        let max_output_tokens = parse_var(
            "LABPORT_MAX_OUTPUT_TOKENS",
            lookup("LABPORT_MAX_OUTPUT_TOKENS"),
            DEFAULT_MAX_OUTPUT_TOKENS,
        )?;
        let request_timeout_secs = parse_var(
            "LABPORT_TIMEOUT_SECS",
            lookup("LABPORT_TIMEOUT_SECS"),
            DEFAULT_TIMEOUT_SECS,
        )?;
        let max_attempts = parse_var(
            "LABPORT_MAX_ATTEMPTS",
            lookup("LABPORT_MAX_ATTEMPTS"),
            DEFAULT_MAX_ATTEMPTS,
        )?;

        let vault_dir = lookup("LABPORT_VAULT_DIR")
            .map(PathBuf::from)
            .unwrap_or_else(default_vault_dir);

        let webhook_url = lookup("LABPORT_WEBHOOK_URL").filter(|url| !url.trim().is_empty());

        Ok(Self {
            api_key,
            api_base_url,
            model,
            max_output_tokens,
            request_timeout_secs,
            max_attempts,
            vault_dir,
            webhook_url,
        })
    }
}

fn parse_var<T: std::str::FromStr>(
    var: &'static str,
    value: Option<String>,
    default: T,
) -> Result<T, ConfigError> {
    match value {
        None => Ok(default),
        Some(raw) => raw
            .trim()
            .parse()
            .map_err(|_| ConfigError::InvalidVar { var, value: raw }),
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use super::*;

    fn lookup_from(vars: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn api_key_is_required() {
        let result = AppConfig::from_lookup(lookup_from(&[]));
        assert!(matches!(result, Err(ConfigError::MissingVar(_))));
    }

    #[test]
    fn defaults_apply_when_only_key_is_set() {
        let config =
            AppConfig::from_lookup(lookup_from(&[("LABPORT_API_KEY", "sk-test")])).unwrap();
        assert_eq!(config.api_base_url, DEFAULT_API_BASE_URL);
        assert_eq!(config.model, DEFAULT_MODEL);
        assert_eq!(config.request_timeout_secs, DEFAULT_TIMEOUT_SECS);
        assert_eq!(config.max_attempts, DEFAULT_MAX_ATTEMPTS);
        assert!(config.webhook_url.is_none());
    }

    #[test]
    fn openai_key_accepted_as_fallback() {
        let config =
            AppConfig::from_lookup(lookup_from(&[("OPENAI_API_KEY", "sk-fallback")])).unwrap();
        assert_eq!(config.api_key, "sk-fallback");
    }

    #[test]
    fn overrides_are_honored() {
        let config = AppConfig::from_lookup(lookup_from(&[
            ("LABPORT_API_KEY", "sk-test"),
            ("LABPORT_MODEL", "gpt-4o"),
            ("LABPORT_TIMEOUT_SECS", "30"),
            ("LABPORT_VAULT_DIR", "/tmp/vault"),
            ("LABPORT_WEBHOOK_URL", "https://example.com/hook"),
        ]))
        .unwrap();
        assert_eq!(config.model, "gpt-4o");
        assert_eq!(config.request_timeout_secs, 30);
        assert_eq!(config.vault_dir, PathBuf::from("/tmp/vault"));
        assert_eq!(config.webhook_url.as_deref(), Some("https://example.com/hook"));
    }

    #[test]
    fn bad_numeric_value_is_rejected() {
        let result = AppConfig::from_lookup(lookup_from(&[
            ("LABPORT_API_KEY", "sk-test"),
            ("LABPORT_TIMEOUT_SECS", "soon"),
        ]));
        assert!(matches!(result, Err(ConfigError::InvalidVar { var, .. }) if var == "LABPORT_TIMEOUT_SECS"));
    }

    #[test]
    fn blank_webhook_url_treated_as_absent() {
        let config = AppConfig::from_lookup(lookup_from(&[
            ("LABPORT_API_KEY", "sk-test"),
            ("LABPORT_WEBHOOK_URL", "  "),
        ]))
        .unwrap();
        assert!(config.webhook_url.is_none());
    }

    #[test]
    fn app_version_matches_cargo() {
        assert_eq!(APP_VERSION, env!("CARGO_PKG_VERSION"));
    }
}
