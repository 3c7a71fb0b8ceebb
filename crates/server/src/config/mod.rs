mod credentials;
mod logging;
mod scan;
mod server;


pub use credentials::*;
pub use logging::*;
pub use scan::*;
pub use server::*;

use std::path::Path;

use serde::Deserialize;

use crate::error::ServerError;

/// Top-level configuration, loaded from `reclaim.toml`. Every section is
/// optional.
#[derive(Debug, Default, Deserialize)]
pub struct ReclaimConfig {
    /// HTTP bind configuration.
    #[serde(default)]
    pub server: ServerConfig,
    /// Scan and remediation defaults.
    #[serde(default)]
    pub scan: ScanConfig,
    /// Where provider credentials are stored.
    #[serde(default)]
    pub credentials: CredentialsConfig,
    /// Log output configuration.
    #[serde(default)]
    pub logging: LoggingConfig,
}

impl ReclaimConfig {
    /// Read `path`, or fall back to defaults when the file does not exist.
    pub fn load(path: &Path) -> Result<Self, ServerError> {
        if !path.exists() {
            return Ok(Self::default());
        }
        let contents = std::fs::read_to_string(path)?;
        Self::parse(&contents)
    }

    pub fn parse(contents: &str) -> Result<Self, ServerError> {
        toml::from_str(contents)
            .map_err(|e| ServerError::Config(format!("failed to parse config: {e}")))
    }
}
