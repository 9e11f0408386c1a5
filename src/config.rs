//! Configuration types.

use std::path::PathBuf;

use secrecy::SecretString;

use crate::error::ConfigError;
use crate::mail::gmail::GMAIL_API_BASE;

/// Default number of recent messages pulled per fetch.
const DEFAULT_FETCH_LIMIT: usize = 10;

/// Runtime configuration for the `mail-rules` binary.
#[derive(Debug, Clone)]
pub struct EngineConfig {
    /// JSON rule file.
    pub rules_path: PathBuf,
    /// libSQL database holding fetched emails.
    pub db_path: PathBuf,
    /// OAuth access token for the Gmail API. Only needed by commands that
    /// talk to Gmail.
    pub gmail_access_token: Option<SecretString>,
    /// Gmail API root for the authenticated user.
    pub gmail_api_base: String,
    /// Messages pulled per fetch.
    pub fetch_limit: usize,
    /// Remove `INBOX` when moving a message to a label.
    pub archive_on_move: bool,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            rules_path: PathBuf::from("./rules.json"),
            db_path: PathBuf::from("./data/emails.db"),
            gmail_access_token: None,
            gmail_api_base: GMAIL_API_BASE.to_string(),
            fetch_limit: DEFAULT_FETCH_LIMIT,
            archive_on_move: false,
        }
    }
}

impl EngineConfig {
    /// Build config from environment variables, falling back to defaults.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build config from an arbitrary variable lookup.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let defaults = Self::default();

        let fetch_limit = match lookup("MAIL_RULES_FETCH_LIMIT") {
            Some(raw) => match raw.trim().parse::<usize>() {
                Ok(n) if n > 0 => n,
                _ => {
                    return Err(ConfigError::InvalidValue {
                        key: "MAIL_RULES_FETCH_LIMIT".into(),
                        message: format!("expected a positive integer, got '{raw}'"),
                    });
                }
            },
            None => defaults.fetch_limit,
        };

        let archive_on_move = match lookup("MAIL_RULES_ARCHIVE_ON_MOVE") {
            Some(raw) => parse_bool("MAIL_RULES_ARCHIVE_ON_MOVE", &raw)?,
            None => defaults.archive_on_move,
        };

        Ok(Self {
            rules_path: lookup("MAIL_RULES_PATH")
                .map(PathBuf::from)
                .unwrap_or(defaults.rules_path),
            db_path: lookup("MAIL_RULES_DB_PATH")
                .map(PathBuf::from)
                .unwrap_or(defaults.db_path),
            gmail_access_token: lookup("GMAIL_ACCESS_TOKEN")
                .filter(|t| !t.is_empty())
                .map(SecretString::from),
            gmail_api_base: lookup("GMAIL_API_BASE").unwrap_or(defaults.gmail_api_base),
            fetch_limit,
            archive_on_move,
        })
    }

    /// The Gmail access token, or an error naming the variable to set.
    pub fn require_gmail_token(&self) -> Result<SecretString, ConfigError> {
        self.gmail_access_token
            .clone()
            .ok_or_else(|| ConfigError::MissingEnvVar("GMAIL_ACCESS_TOKEN".into()))
    }
}

fn parse_bool(key: &str, raw: &str) -> Result<bool, ConfigError> {
    match raw.trim().to_lowercase().as_str() {
        "1" | "true" | "t" | "yes" => Ok(true),
        "0" | "false" | "f" | "no" | "" => Ok(false),
        _ => Err(ConfigError::InvalidValue {
            key: key.into(),
            message: format!("expected a boolean, got '{raw}'"),
        }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use secrecy::ExposeSecret;
    use std::collections::HashMap;

    fn config_from(vars: &[(&str, &str)]) -> Result<EngineConfig, ConfigError> {
        let map: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        EngineConfig::from_lookup(|key| map.get(key).cloned())
    }

    #[test]
    fn defaults_when_unset() {
        let config = config_from(&[]).unwrap();
        assert_eq!(config.rules_path, PathBuf::from("./rules.json"));
        assert_eq!(config.db_path, PathBuf::from("./data/emails.db"));
        assert_eq!(config.fetch_limit, 10);
        assert!(!config.archive_on_move);
        assert!(config.gmail_access_token.is_none());
        assert_eq!(config.gmail_api_base, GMAIL_API_BASE);
    }

    #[test]
    fn reads_overrides() {
        let config = config_from(&[
            ("MAIL_RULES_PATH", "/etc/mail/rules.json"),
            ("MAIL_RULES_DB_PATH", "/var/lib/mail.db"),
            ("GMAIL_ACCESS_TOKEN", "ya29.token"),
            ("MAIL_RULES_FETCH_LIMIT", "50"),
            ("MAIL_RULES_ARCHIVE_ON_MOVE", "True"),
        ])
        .unwrap();
        assert_eq!(config.rules_path, PathBuf::from("/etc/mail/rules.json"));
        assert_eq!(config.db_path, PathBuf::from("/var/lib/mail.db"));
        assert_eq!(config.fetch_limit, 50);
        assert!(config.archive_on_move);
        assert_eq!(
            config.require_gmail_token().unwrap().expose_secret(),
            "ya29.token"
        );
    }

    #[test]
    fn rejects_bad_fetch_limit() {
        for bad in ["0", "-3", "ten"] {
            let err = config_from(&[("MAIL_RULES_FETCH_LIMIT", bad)]).unwrap_err();
            assert!(matches!(err, ConfigError::InvalidValue { .. }), "{bad}");
        }
    }

    #[test]
    fn rejects_bad_bool() {
        let err = config_from(&[("MAIL_RULES_ARCHIVE_ON_MOVE", "maybe")]).unwrap_err();
        assert!(err.to_string().contains("MAIL_RULES_ARCHIVE_ON_MOVE"));
    }

    #[test]
    fn missing_token_names_variable() {
        let config = config_from(&[("GMAIL_ACCESS_TOKEN", "")]).unwrap();
        let err = config.require_gmail_token().unwrap_err();
        assert!(err.to_string().contains("GMAIL_ACCESS_TOKEN"));
    }
}
