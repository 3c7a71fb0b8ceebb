use std::fmt;

use secrecy::ExposeSecret;
use serde::Serialize;
use serde::de::DeserializeOwned;

use crate::envelope;
use crate::{CryptoError, MasterKey};

/// Seals serializable values into a single envelope string and opens them
/// again.
///
/// Used for records that hold several secrets at once (an access key pair
/// plus its region) so the whole record is encrypted as one unit.
#[derive(Clone)]
pub struct SealedJson {
    key: MasterKey,
    kid: Option<String>,
}

impl SealedJson {
    pub fn new(key: MasterKey) -> Self {
        Self { key, kid: None }
    }

    /// Tag every sealed envelope with a key id.
    #[must_use]
    pub fn with_kid(mut self, kid: impl Into<String>) -> Self {
        self.kid = Some(kid.into());
        self
    }

    /// Serialize `value` to JSON and encrypt it.
    pub fn seal<T: Serialize>(&self, value: &T) -> Result<String, CryptoError> {
        let json = serde_json::to_string(value)
            .map_err(|e| CryptoError::EncryptionFailed(format!("JSON serialization: {e}")))?;
        envelope::seal(&json, &self.key, self.kid.as_deref())
    }

    /// Decrypt an envelope and deserialize the JSON inside it.
    pub fn open<T: DeserializeOwned>(&self, sealed: &str) -> Result<T, CryptoError> {
        let secret = envelope::open(sealed, &self.key)?;
        serde_json::from_str(secret.expose_secret())
            .map_err(|e| CryptoError::InvalidFormat(format!("JSON deserialization: {e}")))
    }
}

impl fmt::Debug for SealedJson {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SealedJson")
            .field("key", &"[REDACTED]")
            .field("kid", &self.kid)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use serde::Deserialize;

    use super::*;
    use crate::{generate_master_key, is_encrypted};

    #[derive(Debug, PartialEq, Serialize, Deserialize)]
    struct Record {
        access_key: String,
        secret_key: String,
    }

    fn record() -> Record {
        Record {
            access_key: "AKIA1234".into(),
            secret_key: "shh".into(),
        }
    }

    #[test]
    fn seal_and_open() {
        let sealer = SealedJson::new(generate_master_key());
        let sealed = sealer.seal(&record()).unwrap();
        assert!(is_encrypted(&sealed));
        assert!(!sealed.contains("shh"));

        let opened: Record = sealer.open(&sealed).unwrap();
        assert_eq!(opened, record());
    }

    #[test]
    fn open_with_other_key_fails() {
        let sealed = SealedJson::new(generate_master_key()).seal(&record()).unwrap();
        let other = SealedJson::new(generate_master_key());
        assert!(matches!(
            other.open::<Record>(&sealed),
            Err(CryptoError::DecryptionFailed)
        ));
    }

    #[test]
    fn open_rejects_wrong_shape() {
        let sealer = SealedJson::new(generate_master_key());
        let sealed = sealer.seal(&vec![1, 2, 3]).unwrap();
        assert!(matches!(
            sealer.open::<Record>(&sealed),
            Err(CryptoError::InvalidFormat(_))
        ));
    }

    #[test]
    fn kid_is_applied() {
        let sealer = SealedJson::new(generate_master_key()).with_kid("local");
        let sealed = sealer.seal(&record()).unwrap();
        let parsed = envelope::Envelope::parse(&sealed).unwrap();
        assert_eq!(parsed.kid.as_deref(), Some("local"));
    }

    #[test]
    fn open_rejects_plain_json() {
        let sealer = SealedJson::new(generate_master_key());
        let plain = serde_json::to_string(&record()).unwrap();
        assert!(matches!(
            sealer.open::<Record>(&plain),
            Err(CryptoError::InvalidFormat(_))
        ));
    }

    #[test]
    fn debug_hides_key() {
        let sealer = SealedJson::new(generate_master_key());
        assert!(format!("{sealer:?}").contains("[REDACTED]"));
    }
}
