use std::collections::BTreeMap;
use std::path::Path;
use serde::{Serialize, Deserialize};
use crate::error::{Error, Result};

pub const SERVER_URL_ENV: &str = "FLOWLENS_SERVER_URL";
pub const TIMEOUT_ENV: &str = "FLOWLENS_TIMEOUT_MS";

/// Connection settings for the orchestration server API.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct ClientConfig {
    /// API root, e.g. `http://localhost:8080/api`
    pub base_url: String,
    pub timeout_ms: u64,
    /// Extra headers sent with every request (auth tokens, tenant ids).
    pub headers: BTreeMap<String, String>,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            base_url: "http://localhost:8080/api".to_string(),
            timeout_ms: 10_000,
            headers: BTreeMap::new(),
        }
    }
}

impl ClientConfig {
    pub fn from_yaml_str(content: &str) -> Result<Self> {
        serde_yaml::from_str(content).map_err(|e| Error::Config(e.to_string()))
    }

    pub fn from_file(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        Self::from_yaml_str(&content)
    }

    /// File settings (if any), then environment overrides.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let mut cfg = match path {
            Some(p) => Self::from_file(p)?,
            None => Self::default(),
        };
        cfg.apply_overrides(
            std::env::var(SERVER_URL_ENV).ok(),
            std::env::var(TIMEOUT_ENV).ok(),
        )?;
        Ok(cfg)
    }

    pub fn apply_overrides(&mut self, base_url: Option<String>, timeout_ms: Option<String>) -> Result<()> {
        if let Some(url) = base_url.filter(|v| !v.trim().is_empty()) {
            self.base_url = url.trim().to_string();
        }
        if let Some(raw) = timeout_ms.filter(|v| !v.trim().is_empty()) {
            self.timeout_ms = raw.trim().parse()
                .map_err(|_| Error::Config(format!("invalid timeout `{}`", raw)))?;
        }
        self.validate()
    }

    pub fn validate(&self) -> Result<()> {
        if !(self.base_url.starts_with("http://") || self.base_url.starts_with("https://")) {
            return Err(Error::Config(format!("base_url must be an http(s) URL, got `{}`", self.base_url)));
        }
        if self.timeout_ms == 0 {
            return Err(Error::Config("timeout_ms must be positive".to_string()));
        }
        Ok(())
    }
}
