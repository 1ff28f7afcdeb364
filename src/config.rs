use std::{
    fs,
    path::{Path, PathBuf},
    time::Duration,
};

use log::debug;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::collector::DEFAULT_PAGE_DELAY;
use crate::utils;

pub const DEFAULT_SITE: &str = "babson";
pub const DEFAULT_LLM_ENDPOINT: &str = "https://api.openai.com/v1";
pub const DEFAULT_LLM_MODEL: &str = "gpt-5";
pub const DEFAULT_SMTP_SERVER: &str = "smtp.gmail.com";
pub const DEFAULT_SMTP_PORT: u16 = 587;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("unable to read config {}: {source}", path.display())]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("invalid config {}: {source}", path.display())]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
    #[error("invalid value for {key}: {value:?}")]
    Invalid { key: &'static str, value: String },
    #[error("{0} is not set")]
    Missing(&'static str),
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct AppConfig {
    pub site: String,
    /// Falls back to the site's own default file name when unset.
    pub output_file: Option<PathBuf>,
    pub interests_file: PathBuf,
    pub recommendations_file: PathBuf,
    pub page_delay_ms: u64,
    pub llm_endpoint: String,
    pub llm_model: String,
    pub smtp_server: String,
    pub smtp_port: u16,
    pub recipient_email: Option<String>,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            site: DEFAULT_SITE.to_string(),
            output_file: None,
            interests_file: PathBuf::from("interests.txt"),
            recommendations_file: PathBuf::from("output.txt"),
            page_delay_ms: DEFAULT_PAGE_DELAY.as_millis() as u64,
            llm_endpoint: DEFAULT_LLM_ENDPOINT.to_string(),
            llm_model: DEFAULT_LLM_MODEL.to_string(),
            smtp_server: DEFAULT_SMTP_SERVER.to_string(),
            smtp_port: DEFAULT_SMTP_PORT,
            recipient_email: None,
        }
    }
}

impl AppConfig {
    /// Reads the JSON config (an explicit path must exist, the default one may not)
    /// and layers environment overrides on top.
    pub fn load(explicit: Option<&Path>) -> Result<Self, ConfigError> {
        let mut config = match explicit {
            Some(path) => read_config(path)?,
            None => {
                let path = utils::config_path();
                if path.exists() {
                    read_config(&path)?
                } else {
                    debug!("no config at {}; using defaults", path.display());
                    AppConfig::default()
                }
            }
        };
        config.apply_overrides(|key| std::env::var(key).ok())?;
        Ok(config)
    }

    pub fn apply_overrides<F>(&mut self, lookup: F) -> Result<(), ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(site) = lookup("EVENT_SCOUT_SITE") {
            self.site = site;
        }
        if let Some(output) = lookup("EVENT_SCOUT_OUTPUT") {
            self.output_file = Some(PathBuf::from(output));
        }
        if let Some(delay) = lookup("EVENT_SCOUT_DELAY_MS") {
            self.page_delay_ms = delay.trim().parse().map_err(|_| ConfigError::Invalid {
                key: "EVENT_SCOUT_DELAY_MS",
                value: delay.clone(),
            })?;
        }
        if let Some(endpoint) = lookup("LLM_ENDPOINT") {
            self.llm_endpoint = endpoint;
        }
        if let Some(model) = lookup("LLM_MODEL") {
            self.llm_model = model;
        }
        if let Some(server) = lookup("SMTP_SERVER") {
            self.smtp_server = server;
        }
        if let Some(port) = lookup("SMTP_PORT") {
            self.smtp_port = port.trim().parse().map_err(|_| ConfigError::Invalid {
                key: "SMTP_PORT",
                value: port.clone(),
            })?;
        }
        if let Some(recipient) = lookup("RECIPIENT_EMAIL") {
            self.recipient_email = Some(recipient);
        }
        Ok(())
    }

    pub fn page_delay(&self) -> Duration {
        Duration::from_millis(self.page_delay_ms)
    }
}

/// Secrets never live in the config file; they come from the environment (or `.env`).
#[derive(Debug, Clone, Default)]
pub struct Credentials {
    pub api_key: Option<String>,
    pub sender_email: Option<String>,
    pub app_password: Option<String>,
}

impl Credentials {
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    pub fn from_lookup<F>(lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| lookup(key).filter(|value| !value.trim().is_empty());
        Self {
            api_key: get("OPENAI_API_KEY"),
            sender_email: get("MY_EMAIL"),
            app_password: get("EMAIL_APP_PASSWORD"),
        }
    }

    pub fn api_key(&self) -> Result<&str, ConfigError> {
        self.api_key
            .as_deref()
            .ok_or(ConfigError::Missing("OPENAI_API_KEY"))
    }

    pub fn sender_email(&self) -> Result<&str, ConfigError> {
        self.sender_email
            .as_deref()
            .ok_or(ConfigError::Missing("MY_EMAIL"))
    }

    pub fn app_password(&self) -> Result<&str, ConfigError> {
        self.app_password
            .as_deref()
            .ok_or(ConfigError::Missing("EMAIL_APP_PASSWORD"))
    }
}

fn read_config(path: &Path) -> Result<AppConfig, ConfigError> {
    let contents = fs::read_to_string(path).map_err(|source| ConfigError::Read {
        path: path.to_path_buf(),
        source,
    })?;
    serde_json::from_str(&contents).map_err(|source| ConfigError::Parse {
        path: path.to_path_buf(),
        source,
    })
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use super::*;

    fn lookup_from(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key: &str| map.get(key).cloned()
    }

    #[test]
    fn partial_file_keeps_defaults() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join("config.json");
        fs::write(&path, r#"{"page_delay_ms": 250, "recipient_email": "me@example.com"}"#)
            .expect("write config");

        let config = read_config(&path).expect("read config");

        assert_eq!(config.page_delay(), Duration::from_millis(250));
        assert_eq!(config.recipient_email.as_deref(), Some("me@example.com"));
        assert_eq!(config.site, DEFAULT_SITE);
        assert_eq!(config.smtp_port, DEFAULT_SMTP_PORT);
        assert_eq!(config.recommendations_file, PathBuf::from("output.txt"));
    }

    #[test]
    fn default_delay_is_one_second() {
        assert_eq!(AppConfig::default().page_delay(), Duration::from_secs(1));
    }

    #[test]
    fn explicit_missing_file_is_an_error() {
        let dir = tempfile::tempdir().expect("tempdir");
        let missing = dir.path().join("nope.json");
        let err = AppConfig::load(Some(missing.as_path())).expect_err("missing");
        assert!(matches!(err, ConfigError::Read { .. }));
    }

    #[test]
    fn malformed_file_is_a_parse_error() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join("config.json");
        fs::write(&path, "{ not json").expect("write config");
        assert!(matches!(read_config(&path), Err(ConfigError::Parse { .. })));
    }

    #[test]
    fn environment_overrides_file_values() {
        let mut config = AppConfig::default();
        config
            .apply_overrides(lookup_from(&[
                ("EVENT_SCOUT_DELAY_MS", "0"),
                ("EVENT_SCOUT_OUTPUT", "events.csv"),
                ("LLM_MODEL", "gpt-4o-mini"),
                ("SMTP_PORT", "2525"),
            ]))
            .expect("overrides");

        assert_eq!(config.page_delay(), Duration::ZERO);
        assert_eq!(config.output_file, Some(PathBuf::from("events.csv")));
        assert_eq!(config.llm_model, "gpt-4o-mini");
        assert_eq!(config.smtp_port, 2525);
        assert_eq!(config.llm_endpoint, DEFAULT_LLM_ENDPOINT);
    }

    #[test]
    fn rejects_non_numeric_delay() {
        let mut config = AppConfig::default();
        let err = config
            .apply_overrides(lookup_from(&[("EVENT_SCOUT_DELAY_MS", "soon")]))
            .expect_err("bad delay");
        assert!(matches!(err, ConfigError::Invalid { key: "EVENT_SCOUT_DELAY_MS", .. }));
    }

    #[test]
    fn credentials_are_required_lazily() {
        let creds = Credentials::from_lookup(lookup_from(&[
            ("OPENAI_API_KEY", "sk-test"),
            ("EMAIL_APP_PASSWORD", "  "),
        ]));
        assert_eq!(creds.api_key().expect("api key"), "sk-test");
        assert!(matches!(creds.sender_email(), Err(ConfigError::Missing("MY_EMAIL"))));
        assert!(matches!(
            creds.app_password(),
            Err(ConfigError::Missing("EMAIL_APP_PASSWORD"))
        ));
    }
}
