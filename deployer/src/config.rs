//! Deployment configuration loaded once at start-up.
//!
//! Settings come from a dotenv-style file (`.env.ftp` by default) and the
//! process environment. Environment variables win over file values, and
//! empty values count as absent. The resolved [`DeployConfig`] is passed
//! explicitly into each stage; nothing reads the environment afterwards.

use crate::error::{DeployError, Result};
use camino::Utf8Path;
use std::collections::HashMap;
use std::fmt;

/// Default FTP control port.
pub const DEFAULT_FTP_PORT: u16 = 21;

/// Credentials for the file-transfer host.
#[derive(Clone, PartialEq, Eq)]
pub struct TransferCredentials {
    /// Host name or address of the FTP server.
    pub host: String,
    /// Login user.
    pub user: String,
    password: String,
    /// Control connection port.
    pub port: u16,
    /// Whether to upgrade the connection to explicit FTPS.
    pub secure: bool,
}

impl TransferCredentials {
    /// Create credentials.
    #[must_use]
    pub fn new(host: impl Into<String>, user: impl Into<String>, password: impl Into<String>) -> Self {
        Self {
            host: host.into(),
            user: user.into(),
            password: password.into(),
            port: DEFAULT_FTP_PORT,
            secure: false,
        }
    }

    /// The login password.
    #[must_use]
    pub fn password(&self) -> &str {
        &self.password
    }

    /// `host:port` address for the control connection.
    #[must_use]
    pub fn address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

impl fmt::Debug for TransferCredentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TransferCredentials")
            .field("host", &self.host)
            .field("user", &self.user)
            .field("password", &"<redacted>")
            .field("port", &self.port)
            .field("secure", &self.secure)
            .finish()
    }
}

/// Credentials for the CDN cache purge API.
#[derive(Clone, PartialEq, Eq)]
pub struct CdnCredentials {
    /// Zone whose cache is purged.
    pub zone_id: String,
    api_token: String,
}

impl CdnCredentials {
    /// Create CDN credentials.
    #[must_use]
    pub fn new(zone_id: impl Into<String>, api_token: impl Into<String>) -> Self {
        Self {
            zone_id: zone_id.into(),
            api_token: api_token.into(),
        }
    }

    /// The bearer token.
    #[must_use]
    pub fn api_token(&self) -> &str {
        &self.api_token
    }
}

impl fmt::Debug for CdnCredentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CdnCredentials")
            .field("zone_id", &self.zone_id)
            .field("api_token", &"<redacted>")
            .finish()
    }
}

/// Resolved deployment configuration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeployConfig {
    /// FTP credentials (required).
    pub transfer: TransferCredentials,
    /// CDN credentials; `None` disables cache purging.
    pub cdn: Option<CdnCredentials>,
}

impl DeployConfig {
    /// Load configuration from `env_file` overlaid by the process environment.
    ///
    /// A missing file is not an error in itself; the required-key check
    /// reports what is absent.
    ///
    /// # Errors
    ///
    /// Returns [`DeployError::ConfigInvalid`] if the file is malformed or a
    /// value is unusable, and [`DeployError::ConfigMissing`] if a required key
    /// is absent from both sources.
    pub fn load(env_file: &Utf8Path) -> Result<Self> {
        let file_values = read_env_file(env_file)?;
        Self::from_lookup(|key| {
            std::env::var(key)
                .ok()
                .or_else(|| file_values.get(key).cloned())
        })
    }

    /// Resolve configuration through an arbitrary key lookup.
    ///
    /// # Errors
    ///
    /// See [`DeployConfig::load`].
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self> {
        let value = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        let host = value("FTP_HOST");
        let user = value("FTP_USER");
        let password = value("FTP_PASSWORD");
        let (Some(host), Some(user), Some(password)) = (host, user, password) else {
            let missing: Vec<&str> = ["FTP_HOST", "FTP_USER", "FTP_PASSWORD"]
                .into_iter()
                .filter(|key| value(key).is_none())
                .collect();
            return Err(DeployError::ConfigMissing {
                keys: missing.join(", "),
            });
        };

        let port = match value("FTP_PORT") {
            Some(raw) => raw
                .trim()
                .parse::<u16>()
                .map_err(|e| DeployError::ConfigInvalid {
                    key: "FTP_PORT",
                    reason: format!("{raw:?} is not a port number: {e}"),
                })?,
            None => DEFAULT_FTP_PORT,
        };
        let secure = value("FTP_SECURE").is_some_and(|v| v.trim() == "true");

        let cdn = match (value("CLOUDFLARE_ZONE_ID"), value("CLOUDFLARE_API_TOKEN")) {
            (Some(zone_id), Some(token)) => Some(CdnCredentials::new(zone_id, token)),
            _ => None,
        };

        Ok(Self {
            transfer: TransferCredentials {
                port,
                secure,
                ..TransferCredentials::new(host, user, password)
            },
            cdn,
        })
    }
}

/// Parse a dotenv file into a key/value map without touching the process
/// environment.
fn read_env_file(path: &Utf8Path) -> Result<HashMap<String, String>> {
    if !path.exists() {
        log::debug!("config file {path} not found; using environment only");
        return Ok(HashMap::new());
    }
    let invalid = |e: dotenvy::Error| DeployError::ConfigInvalid {
        key: "env file",
        reason: format!("{path}: {e}"),
    };
    let mut values = HashMap::new();
    for item in dotenvy::from_path_iter(path).map_err(invalid)? {
        let (key, val) = item.map_err(invalid)?;
        values.insert(key, val);
    }
    log::debug!("loaded {} entries from {path}", values.len());
    Ok(values)
}

#[cfg(test)]
#[path = "config_tests.rs"]
mod tests;
