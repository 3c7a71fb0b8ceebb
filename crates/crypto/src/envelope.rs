use std::sync::LazyLock;

use aes_gcm::aead::{Aead, AeadCore, KeyInit, OsRng};
use aes_gcm::{Aes256Gcm, Nonce};
use base64::Engine;
use base64::engine::general_purpose::STANDARD as B64;
use regex::Regex;
use secrecy::SecretString;

use crate::{CryptoError, MasterKey};

const NONCE_LEN: usize = 12;
const TAG_LEN: usize = 16;

/// `ENC[AES256-GCM,(kid:<id>,)?data:<b64>,iv:<b64>,tag:<b64>]`
static ENC_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"^ENC\[AES256-GCM,(?:kid:(?P<kid>[A-Za-z0-9_-]+),)?data:(?P<data>[A-Za-z0-9+/=]+),iv:(?P<iv>[A-Za-z0-9+/=]+),tag:(?P<tag>[A-Za-z0-9+/=]+)\]$",
    )
    .expect("ENC regex is valid")
});

/// Returns `true` if the value is an `ENC[...]` envelope.
pub fn is_encrypted(value: &str) -> bool {
    ENC_RE.is_match(value.trim())
}

/// Decoded parts of one envelope.
#[derive(Debug, PartialEq, Eq)]
pub(crate) struct Envelope {
    pub(crate) kid: Option<String>,
    data: Vec<u8>,
    nonce: [u8; NONCE_LEN],
    tag: [u8; TAG_LEN],
}

impl Envelope {
    /// Parse and decode an envelope string. Anything that is not a
    /// well-formed envelope is `InvalidFormat`.
    pub(crate) fn parse(value: &str) -> Result<Self, CryptoError> {
        let caps = ENC_RE
            .captures(value.trim())
            .ok_or_else(|| CryptoError::InvalidFormat("not an ENC[...] envelope".into()))?;
        let decode = |name: &str| {
            B64.decode(&caps[name])
                .map_err(|e| CryptoError::InvalidFormat(format!("{name}: {e}")))
        };
        let nonce: [u8; NONCE_LEN] = decode("iv")?.try_into().map_err(|iv: Vec<u8>| {
            CryptoError::InvalidFormat(format!("iv must be {NONCE_LEN} bytes, got {}", iv.len()))
        })?;
        let tag: [u8; TAG_LEN] = decode("tag")?.try_into().map_err(|tag: Vec<u8>| {
            CryptoError::InvalidFormat(format!("tag must be {TAG_LEN} bytes, got {}", tag.len()))
        })?;

        Ok(Self {
            kid: caps.name("kid").map(|m| m.as_str().to_owned()),
            data: decode("data")?,
            nonce,
            tag,
        })
    }

    fn render(&self) -> String {
        let kid = self
            .kid
            .as_deref()
            .map(|id| format!("kid:{id},"))
            .unwrap_or_default();
        format!(
            "ENC[AES256-GCM,{kid}data:{},iv:{},tag:{}]",
            B64.encode(&self.data),
            B64.encode(self.nonce),
            B64.encode(self.tag),
        )
    }
}

fn cipher(key: &MasterKey) -> Result<Aes256Gcm, CryptoError> {
    Aes256Gcm::new_from_slice(key.as_bytes()).map_err(|e| CryptoError::InvalidKey(e.to_string()))
}

/// Encrypt `plaintext` under a fresh random nonce.
pub(crate) fn seal(plaintext: &str, key: &MasterKey, kid: Option<&str>) -> Result<String, CryptoError> {
    let nonce = Aes256Gcm::generate_nonce(&mut OsRng);
    let mut sealed = cipher(key)?
        .encrypt(&nonce, plaintext.as_bytes())
        .map_err(|e| CryptoError::EncryptionFailed(e.to_string()))?;
    // aes-gcm appends the tag to the ciphertext.
    let tag = sealed.split_off(sealed.len() - TAG_LEN);

    let envelope = Envelope {
        kid: kid.map(str::to_owned),
        data: sealed,
        nonce: nonce
            .as_slice()
            .try_into()
            .map_err(|_| CryptoError::EncryptionFailed("unexpected nonce length".into()))?,
        tag: tag
            .try_into()
            .map_err(|_| CryptoError::EncryptionFailed("unexpected tag length".into()))?,
    };
    Ok(envelope.render())
}

/// Decrypt an envelope produced by [`seal`].
pub(crate) fn open(value: &str, key: &MasterKey) -> Result<SecretString, CryptoError> {
    let Envelope {
        mut data,
        nonce,
        tag,
        ..
    } = Envelope::parse(value)?;
    data.extend_from_slice(&tag);

    let plaintext = cipher(key)?
        .decrypt(Nonce::from_slice(&nonce), data.as_ref())
        .map_err(|_| CryptoError::DecryptionFailed)?;
    String::from_utf8(plaintext)
        .map(SecretString::new)
        .map_err(|e| CryptoError::InvalidFormat(format!("plaintext is not UTF-8: {e}")))
}

#[cfg(test)]
mod tests {
    use secrecy::ExposeSecret;

    use super::*;
    use crate::parse_master_key;

    fn key(byte: &str) -> MasterKey {
        parse_master_key(&byte.repeat(32)).unwrap()
    }

    #[test]
    fn seal_then_open() {
        let k = key("01");
        let sealed = seal("AKIA/secret", &k, None).unwrap();
        assert!(is_encrypted(&sealed));
        assert!(!sealed.contains("AKIA"));
        assert_eq!(open(&sealed, &k).unwrap().expose_secret(), "AKIA/secret");
    }

    #[test]
    fn nonce_is_fresh_per_seal() {
        let k = key("01");
        assert_ne!(seal("x", &k, None).unwrap(), seal("x", &k, None).unwrap());
    }

    #[test]
    fn plain_text_is_not_an_envelope() {
        let err = open(r#"{"access_key":"a"}"#, &key("01")).unwrap_err();
        assert!(matches!(err, CryptoError::InvalidFormat(_)));
        assert!(!is_encrypted("ENC[garbage]"));
    }

    #[test]
    fn wrong_key_fails() {
        let sealed = seal("secret", &key("01"), None).unwrap();
        let err = open(&sealed, &key("02")).unwrap_err();
        assert!(matches!(err, CryptoError::DecryptionFailed));
    }

    #[test]
    fn short_iv_is_rejected() {
        let bogus = format!(
            "ENC[AES256-GCM,data:{},iv:{},tag:{}]",
            B64.encode(b"abc"),
            B64.encode([0u8; 4]),
            B64.encode([0u8; 16]),
        );
        let err = Envelope::parse(&bogus).unwrap_err();
        assert!(matches!(err, CryptoError::InvalidFormat(ref m) if m.starts_with("iv")));
    }

    #[test]
    fn kid_survives_render_and_parse() {
        let k = key("03");
        let sealed = seal("v", &k, Some("file-1")).unwrap();
        assert!(sealed.starts_with("ENC[AES256-GCM,kid:file-1,"));
        assert_eq!(Envelope::parse(&sealed).unwrap().kid.as_deref(), Some("file-1"));
        assert_eq!(open(&sealed, &k).unwrap().expose_secret(), "v");

        let unlabelled = seal("v", &k, None).unwrap();
        assert_eq!(Envelope::parse(&unlabelled).unwrap().kid, None);
    }
}
