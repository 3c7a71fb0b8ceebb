use std::fmt;

use aes_gcm::aead::{KeyInit, OsRng};
use aes_gcm::Aes256Gcm;
use base64::Engine;
use base64::engine::general_purpose::STANDARD as B64;
use zeroize::{Zeroize, ZeroizeOnDrop};

use crate::CryptoError;

/// A 32-byte AES-256 master key that is zeroized when dropped.
///
/// The [`Debug`] implementation is redacted. Raw bytes never leave this
/// crate except through [`MasterKey::to_hex`], which exists so a freshly
/// generated key can be written to the key file.
#[derive(Clone, Zeroize, ZeroizeOnDrop)]
pub struct MasterKey([u8; 32]);

impl MasterKey {
    pub(crate) fn as_bytes(&self) -> &[u8; 32] {
        &self.0
    }

    /// Hex encoding accepted by [`parse_master_key`].
    pub fn to_hex(&self) -> String {
        hex::encode(self.0)
    }
}

impl fmt::Debug for MasterKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("MasterKey([REDACTED])")
    }
}

/// Generate a random master key from the operating system RNG.
pub fn generate_master_key() -> MasterKey {
    let generated = Aes256Gcm::generate_key(OsRng);
    let mut key = [0u8; 32];
    key.copy_from_slice(generated.as_slice());
    MasterKey(key)
}

/// Parse a 32-byte master key from hex or base64.
///
/// Accepts either 64 hex characters or a base64 string that decodes to exactly
/// 32 bytes. Surrounding whitespace (e.g. a trailing newline in a key file) is
/// ignored.
pub fn parse_master_key(raw: &str) -> Result<MasterKey, CryptoError> {
    let trimmed = raw.trim();
    let decoded = if trimmed.len() == 64 {
        hex::decode(trimmed).ok()
    } else {
        None
    };
    let bytes = decoded
        .or_else(|| B64.decode(trimmed).ok())
        .filter(|bytes| bytes.len() == 32)
        .ok_or_else(|| {
            CryptoError::InvalidKey("must be 32 bytes encoded as 64 hex chars or base64".to_owned())
        })?;

    let mut key = [0u8; 32];
    key.copy_from_slice(&bytes);
    Ok(MasterKey(key))
}
