use std::path::PathBuf;

/// Application-level constants
pub const APP_NAME: &str = "PracticeFlow";
pub const APP_VERSION: &str = env!("CARGO_PKG_VERSION");

/// Model used for note refinement and email drafting.
pub const DEFAULT_MODEL: &str = "gemini-2.5-flash";

/// Public Gemini endpoint root.
pub const DEFAULT_API_BASE: &str = "https://generativelanguage.googleapis.com";

/// Connect timeout for the generation client. Requests themselves never time out.
pub const DEFAULT_CONNECT_TIMEOUT_SECS: u64 = 10;

/// Database file inside the data directory.
pub const DATABASE_FILE: &str = "practiceflow.db";

const ENV_DATA_DIR: &str = "PRACTICEFLOW_DATA_DIR";
const ENV_MODEL: &str = "PRACTICEFLOW_MODEL";
const ENV_API_BASE: &str = "PRACTICEFLOW_API_BASE";
const ENV_ON_MALFORMED: &str = "PRACTICEFLOW_ON_MALFORMED";
/// Checked in order; the first non-empty value wins.
const ENV_API_KEYS: &[&str] = &["GEMINI_API_KEY", "API_KEY"];

/// Get the application data directory
/// ~/PracticeFlow/ on all platforms, current directory if home is unknown.
pub fn app_data_dir() -> PathBuf {
    dirs::home_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join(APP_NAME)
}

/// Log filter used when `RUST_LOG` is not set.
pub fn default_log_filter() -> &'static str {
    "practiceflow_lib=info,warn"
}

/// What to do when a stored collection cannot be parsed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum MalformedDataPolicy {
    /// Surface the error and leave the stored value untouched.
    #[default]
    FailFast,
    /// Log the error, replace the value with seed data and continue.
    ResetToSeed,
}

impl MalformedDataPolicy {
    fn from_env_value(value: &str) -> Option<Self> {
        match value.trim().to_ascii_lowercase().as_str() {
            "fail" | "fail_fast" => Some(Self::FailFast),
            "reset" | "reset_to_seed" => Some(Self::ResetToSeed),
            _ => None,
        }
    }
}

/// Runtime configuration, resolved once at startup.
#[derive(Debug, Clone)]
pub struct AppConfig {
    pub data_dir: PathBuf,
    pub model: String,
    pub api_base_url: String,
    pub api_key: Option<String>,
    pub connect_timeout_secs: u64,
    pub malformed_data: MalformedDataPolicy,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            data_dir: app_data_dir(),
            model: DEFAULT_MODEL.to_string(),
            api_base_url: DEFAULT_API_BASE.to_string(),
            api_key: None,
            connect_timeout_secs: DEFAULT_CONNECT_TIMEOUT_SECS,
            malformed_data: MalformedDataPolicy::default(),
        }
    }
}

impl AppConfig {
    /// Build the configuration from process environment variables.
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build the configuration from an arbitrary variable lookup.
    pub fn from_lookup<F>(lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let non_empty = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());
        let defaults = Self::default();

        let malformed_data = match non_empty(ENV_ON_MALFORMED) {
            Some(raw) => MalformedDataPolicy::from_env_value(&raw).unwrap_or_else(|| {
                tracing::warn!("Unknown {ENV_ON_MALFORMED} value '{raw}', using fail-fast");
                MalformedDataPolicy::FailFast
            }),
            None => defaults.malformed_data,
        };

        Self {
            data_dir: non_empty(ENV_DATA_DIR)
                .map(PathBuf::from)
                .unwrap_or(defaults.data_dir),
            model: non_empty(ENV_MODEL).unwrap_or(defaults.model),
            api_base_url: non_empty(ENV_API_BASE).unwrap_or(defaults.api_base_url),
            api_key: ENV_API_KEYS.iter().find_map(|key| non_empty(key)),
            connect_timeout_secs: defaults.connect_timeout_secs,
            malformed_data,
        }
    }

    /// Path of the SQLite database holding the key-value store.
    pub fn database_path(&self) -> PathBuf {
        self.data_dir.join(DATABASE_FILE)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup_from(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn app_data_dir_ends_with_app_name() {
        assert!(app_data_dir().ends_with("PracticeFlow"));
    }

    #[test]
    fn app_name_is_practiceflow() {
        assert_eq!(APP_NAME, "PracticeFlow");
    }

    #[test]
    fn app_version_matches_cargo() {
        assert_eq!(APP_VERSION, "0.1.0");
    }

    #[test]
    fn empty_environment_uses_defaults() {
        let config = AppConfig::from_lookup(lookup_from(&[]));
        assert_eq!(config.model, "gemini-2.5-flash");
        assert_eq!(config.api_base_url, DEFAULT_API_BASE);
        assert!(config.api_key.is_none());
        assert_eq!(config.malformed_data, MalformedDataPolicy::FailFast);
        assert!(config.database_path().ends_with("practiceflow.db"));
    }

    #[test]
    fn gemini_key_takes_precedence_over_generic_key() {
        let config = AppConfig::from_lookup(lookup_from(&[
            ("API_KEY", "generic"),
            ("GEMINI_API_KEY", "specific"),
        ]));
        assert_eq!(config.api_key.as_deref(), Some("specific"));
    }

    #[test]
    fn blank_key_is_treated_as_missing() {
        let config = AppConfig::from_lookup(lookup_from(&[("GEMINI_API_KEY", "  ")]));
        assert!(config.api_key.is_none());
    }

    #[test]
    fn overrides_are_applied() {
        let config = AppConfig::from_lookup(lookup_from(&[
            ("PRACTICEFLOW_DATA_DIR", "/tmp/pf"),
            ("PRACTICEFLOW_MODEL", "gemini-2.0-pro"),
            ("PRACTICEFLOW_API_BASE", "http://localhost:9999"),
            ("PRACTICEFLOW_ON_MALFORMED", "reset"),
        ]));
        assert_eq!(config.data_dir, PathBuf::from("/tmp/pf"));
        assert_eq!(config.model, "gemini-2.0-pro");
        assert_eq!(config.api_base_url, "http://localhost:9999");
        assert_eq!(config.malformed_data, MalformedDataPolicy::ResetToSeed);
        assert_eq!(config.database_path(), PathBuf::from("/tmp/pf/practiceflow.db"));
    }

    #[test]
    fn unknown_malformed_policy_falls_back_to_fail_fast() {
        let config = AppConfig::from_lookup(lookup_from(&[("PRACTICEFLOW_ON_MALFORMED", "maybe")]));
        assert_eq!(config.malformed_data, MalformedDataPolicy::FailFast);
    }
}
