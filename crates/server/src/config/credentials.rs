use std::path::PathBuf;

use serde::Deserialize;

/// Environment variable holding the credential master key (hex or base64).
pub const MASTER_KEY_ENV: &str = "RECLAIM_MASTER_KEY";

/// Credential storage backend.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CredentialBackend {
    /// Encrypted file under `directory`.
    #[default]
    File,
    /// Process memory only; nothing survives a restart.
    Memory,
}

/// Credential store configuration.
///
/// ```toml
/// [credentials]
/// backend = "file"
/// directory = "~/.reclaim"
/// ```
#[derive(Debug, Deserialize)]
pub struct CredentialsConfig {
    #[serde(default)]
    pub backend: CredentialBackend,
    /// Directory holding `credentials.enc` and the generated `.key`.
    #[serde(default = "default_directory")]
    pub directory: String,
}

impl Default for CredentialsConfig {
    fn default() -> Self {
        Self {
            backend: CredentialBackend::default(),
            directory: default_directory(),
        }
    }
}

impl CredentialsConfig {
    /// `directory` with a leading `~` expanded to `$HOME`.
    pub fn resolved_directory(&self) -> PathBuf {
        match self.directory.strip_prefix('~') {
            Some(rest) => {
                let home = std::env::var_os("HOME").map_or_else(|| PathBuf::from("."), PathBuf::from);
                home.join(rest.trim_start_matches('/'))
            }
            None => PathBuf::from(&self.directory),
        }
    }
}

fn default_directory() -> String {
    "~/.reclaim".to_owned()
}
