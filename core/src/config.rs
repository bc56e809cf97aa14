//! Client configuration.
//!
//! # Design
//! Everything fixed about the service (base URLs, timeouts, user agent,
//! header names) lives in immutable structs with `Default` impls holding the
//! production values. Tests substitute `Endpoints` to point the client at a
//! local server; nothing else needs to vary.

use std::path::PathBuf;
use std::time::Duration;

use serde::Deserialize;
use thiserror::Error;

/// API version segment shared by both base URLs.
pub const API_VERSION: &str = "1.0";

pub const PRODUCTION_URL: &str = "https://api.parllay.com/1.0/";
pub const SANDBOX_URL: &str = "https://api-ppe.parllay.com/1.0/";

pub const APP_ID_HEADER: &str = "X-Parllay-App-Id";
pub const APP_SECRET_HEADER: &str = "X-Parllay-App-Secret";

pub const DEFAULT_USER_AGENT: &str = concat!("parllay-rust-sdk/", env!("CARGO_PKG_VERSION"));

/// Errors raised while assembling a client, before any request is made.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("app id is required")]
    MissingAppId,

    #[error("app secret is required")]
    MissingAppSecret,

    #[error("invalid client configuration: {0}")]
    Parse(#[from] serde_json::Error),

    #[error("failed to read CA chain {}: {source}", .path.display())]
    CaChainRead {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("invalid CA chain {}: {reason}", .path.display())]
    CaChainInvalid { path: PathBuf, reason: String },
}

/// App id and secret sent with every request.
#[derive(Clone, PartialEq, Eq)]
pub struct Credentials {
    app_id: String,
    app_secret: String,
}

impl Credentials {
    pub fn new(app_id: impl Into<String>, app_secret: impl Into<String>) -> Result<Self, ConfigError> {
        let app_id = app_id.into();
        let app_secret = app_secret.into();
        if app_id.trim().is_empty() {
            return Err(ConfigError::MissingAppId);
        }
        if app_secret.trim().is_empty() {
            return Err(ConfigError::MissingAppSecret);
        }
        Ok(Self { app_id, app_secret })
    }

    pub fn app_id(&self) -> &str {
        &self.app_id
    }

    pub fn app_secret(&self) -> &str {
        &self.app_secret
    }

    pub(crate) fn set_app_id(&mut self, app_id: String) -> Result<(), ConfigError> {
        if app_id.trim().is_empty() {
            return Err(ConfigError::MissingAppId);
        }
        self.app_id = app_id;
        Ok(())
    }

    pub(crate) fn set_app_secret(&mut self, app_secret: String) -> Result<(), ConfigError> {
        if app_secret.trim().is_empty() {
            return Err(ConfigError::MissingAppSecret);
        }
        self.app_secret = app_secret;
        Ok(())
    }
}

// The secret stays out of logs and panic messages.
impl std::fmt::Debug for Credentials {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Credentials")
            .field("app_id", &self.app_id)
            .field("app_secret", &"<redacted>")
            .finish()
    }
}

/// Base URLs for the two environments.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct Endpoints {
    pub production: String,
    pub sandbox: String,
}

impl Default for Endpoints {
    fn default() -> Self {
        Self {
            production: PRODUCTION_URL.to_string(),
            sandbox: SANDBOX_URL.to_string(),
        }
    }
}

impl Endpoints {
    pub fn base_url(&self, sandbox: bool) -> &str {
        if sandbox {
            &self.sandbox
        } else {
            &self.production
        }
    }
}

/// Settings applied to every HTTP exchange.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TransportConfig {
    pub connect_timeout: Duration,
    pub timeout: Duration,
    pub user_agent: String,
    /// PEM file trusted when the default roots reject the server certificate.
    /// Without one, the fallback uses the operating system's verifier.
    pub ca_chain: Option<PathBuf>,
}

impl Default for TransportConfig {
    fn default() -> Self {
        Self {
            connect_timeout: Duration::from_secs(10),
            timeout: Duration::from_secs(60),
            user_agent: DEFAULT_USER_AGENT.to_string(),
            ca_chain: None,
        }
    }
}

/// Everything needed to construct a `Client`.
///
/// Deserializes from `{"appId": "...", "secret": "...", "sandbox": false}`;
/// `endpoints` is optional and transport settings are code-only.
#[derive(Debug, Clone, Deserialize)]
pub struct ClientConfig {
    #[serde(rename = "appId", default)]
    pub app_id: String,
    #[serde(default)]
    pub secret: String,
    #[serde(default)]
    pub sandbox: bool,
    #[serde(default)]
    pub endpoints: Endpoints,
    #[serde(skip)]
    pub transport: TransportConfig,
}

impl ClientConfig {
    pub fn new(app_id: impl Into<String>, secret: impl Into<String>) -> Self {
        Self {
            app_id: app_id.into(),
            secret: secret.into(),
            sandbox: false,
            endpoints: Endpoints::default(),
            transport: TransportConfig::default(),
        }
    }

    pub fn from_json(raw: &str) -> Result<Self, ConfigError> {
        Ok(serde_json::from_str(raw)?)
    }

    /// Read `PARLLAY_APP_ID`, `PARLLAY_APP_SECRET`, `PARLLAY_SANDBOX` and
    /// `PARLLAY_CA_CHAIN`.
    pub fn from_env() -> Result<Self, ConfigError> {
        let app_id = std::env::var("PARLLAY_APP_ID").map_err(|_| ConfigError::MissingAppId)?;
        let secret = std::env::var("PARLLAY_APP_SECRET").map_err(|_| ConfigError::MissingAppSecret)?;
        let mut config = Self::new(app_id, secret);
        config.sandbox = std::env::var("PARLLAY_SANDBOX")
            .map(|v| matches!(v.trim().to_ascii_lowercase().as_str(), "1" | "true" | "yes"))
            .unwrap_or(false);
        config.transport.ca_chain = std::env::var_os("PARLLAY_CA_CHAIN").map(PathBuf::from);
        Ok(config)
    }

    pub fn with_sandbox(mut self, sandbox: bool) -> Self {
        self.sandbox = sandbox;
        self
    }

    pub fn with_endpoints(mut self, endpoints: Endpoints) -> Self {
        self.endpoints = endpoints;
        self
    }

    pub fn with_transport(mut self, transport: TransportConfig) -> Self {
        self.transport = transport;
        self
    }

    pub fn credentials(&self) -> Result<Credentials, ConfigError> {
        Credentials::new(self.app_id.clone(), self.secret.clone())
    }
}
