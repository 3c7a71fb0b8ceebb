//! AES-256-GCM encryption for credentials at rest.
//!
//! Values are stored in the format:
//! `ENC[AES256-GCM,kid:<id>,data:<b64>,iv:<b64>,tag:<b64>]`
//!
//! The `kid` field is optional. [`SealedJson`] is the entry point: it seals a
//! whole serializable record into one envelope. Plaintext is held as a
//! [`SecretString`] between decryption and deserialization, and the
//! [`MasterKey`] wrapper zeroizes key material on drop.

mod cipher;
mod envelope;
mod key;

pub use cipher::SealedJson;
pub use envelope::is_encrypted;
pub use key::{MasterKey, generate_master_key, parse_master_key};

// Re-export for consumers so they don't need a direct `secrecy` dependency.
pub use secrecy::{ExposeSecret, SecretString};

use thiserror::Error;

/// Errors that can occur during encryption/decryption operations.
#[derive(Debug, Error)]
pub enum CryptoError {
    /// The provided master key is not valid (wrong length or encoding).
    #[error("invalid master key: {0}")]
    InvalidKey(String),

    /// The encrypted value format is malformed.
    #[error("invalid encrypted value: {0}")]
    InvalidFormat(String),

    /// Decryption failed: wrong key or corrupted data.
    #[error("decryption failed (wrong key or corrupted data)")]
    DecryptionFailed,

    /// Encryption failed.
    #[error("encryption failed: {0}")]
    EncryptionFailed(String),
}
