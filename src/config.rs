//! Configuration types for the collector
//!
//! This module contains the configuration structures loaded from YAML:
//! named Jira accounts, optional proxy settings and the list of configured
//! inputs. Validation happens once, up front, so the collector driver can
//! rely on a well-formed configuration for the rest of a pass.

use crate::error::{Error, Result};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::Path;

// ============================================================================
// Top-Level Collector Config
// ============================================================================

/// Complete collector configuration loaded from YAML
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CollectorConfig {
    /// Named Jira accounts
    #[serde(default)]
    pub accounts: HashMap<String, AccountConfig>,

    /// Optional outbound proxy settings
    #[serde(default)]
    pub proxy: Option<ProxyConfig>,

    /// Configured inputs, executed in order
    #[serde(default)]
    pub inputs: Vec<InputConfig>,
}

impl CollectorConfig {
    /// Load a collector configuration from a YAML file
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let contents = std::fs::read_to_string(path).map_err(|_| Error::FileNotFound {
            path: path.display().to_string(),
        })?;
        Self::from_str(&contents)
    }

    /// Parse a collector configuration from a YAML string
    #[allow(clippy::should_implement_trait)]
    pub fn from_str(yaml: &str) -> Result<Self> {
        let config: Self = serde_yaml::from_str(yaml)?;
        config.validate()?;
        Ok(config)
    }

    /// Validate all inputs
    pub fn validate(&self) -> Result<()> {
        for input in &self.inputs {
            input.validate()?;
        }
        Ok(())
    }

    /// Resolve a named account, checking that all required fields are set
    pub fn resolve_account(&self, name: &str) -> Result<&AccountConfig> {
        let account = self
            .accounts
            .get(name)
            .ok_or_else(|| Error::account(name, "account not found"))?;

        if account.server.trim().is_empty() {
            return Err(Error::account(name, "missing Jira server"));
        }
        if account.username.trim().is_empty() {
            return Err(Error::account(name, "missing username"));
        }
        if account.password.is_empty() {
            return Err(Error::account(name, "missing password"));
        }

        Ok(account)
    }
}

// ============================================================================
// Account Config
// ============================================================================

/// Credentials and connection settings for one Jira server
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AccountConfig {
    /// Jira server host (no scheme, e.g. "jira.example.com")
    pub server: String,

    /// Basic auth username
    pub username: String,

    /// Basic auth password or API token
    pub password: String,

    /// Whether to verify the server TLS certificate.
    /// Absent means "do not verify", matching the upstream product.
    #[serde(default)]
    pub verify_certificate: Option<Toggle>,
}

impl AccountConfig {
    /// Effective TLS verification flag
    pub fn verify_tls(&self) -> bool {
        self.verify_certificate.as_ref().is_some_and(Toggle::enabled)
    }
}

/// A boolean flag that operators may also write as text ("no", "false", "0")
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Toggle {
    Bool(bool),
    Text(String),
}

impl Toggle {
    /// Lenient truthiness: "no", "false", "0" and "" (any case) are off
    pub fn enabled(&self) -> bool {
        match self {
            Self::Bool(b) => *b,
            Self::Text(s) => {
                let s = s.trim().to_ascii_lowercase();
                !matches!(s.as_str(), "" | "no" | "false" | "0")
            }
        }
    }
}

// ============================================================================
// Proxy Config
// ============================================================================

/// Outbound proxy settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProxyConfig {
    /// Whether the proxy is enabled
    #[serde(default)]
    pub enabled: Option<Toggle>,

    /// Proxy URL, e.g. "http://proxy.example.com:3128"
    #[serde(default)]
    pub url: Option<String>,
}

impl ProxyConfig {
    /// Effective proxy URL, or None when disabled or not configured
    pub fn effective_url(&self) -> Option<&str> {
        if !self.enabled.as_ref().is_some_and(Toggle::enabled) {
            return None;
        }
        self.url.as_deref().filter(|u| !u.trim().is_empty())
    }
}

// ============================================================================
// Input Config
// ============================================================================

/// One configured input: a JQL filter collected into one index
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct InputConfig {
    /// Unique input name; also the checkpoint key and event source
    pub name: String,

    /// JQL filter selecting the issues to collect
    pub jql: String,

    /// Comma-separated list of issue fields to collect
    pub issue_fields: String,

    /// Optional comma-separated expand directives
    #[serde(default)]
    pub expand_fields: Option<String>,

    /// Optional checkpoint seed hint, "YYYY-MM-DD HH:MM"
    #[serde(default)]
    pub last_updated_start_time: Option<String>,

    /// Destination index for emitted events
    pub index: String,

    /// Name of the account to use
    pub account: String,
}

impl InputConfig {
    /// Validate the input parameters, mirroring the operator-facing checks
    pub fn validate(&self) -> Result<()> {
        if self.name.trim().is_empty() {
            return Err(Error::missing_field("name"));
        }
        if self.jql.trim().is_empty() {
            return Err(Error::config("You have to enter a valid JQL"));
        }
        if self.issue_fields.trim().is_empty() {
            return Err(Error::config("You have to enter Jira issue fields to collect"));
        }
        for field in self.issue_fields.split(',') {
            if field.trim().is_empty() {
                return Err(Error::config(
                    "You have entered an invalid comma-separated list of issue fields",
                ));
            }
        }
        if self.account.trim().is_empty() {
            return Err(Error::missing_field("account"));
        }
        Ok(())
    }
}
