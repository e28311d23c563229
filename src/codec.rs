//! On-disk encoding of the document tree.
//!
//! A [`Codec`] turns the in-memory tree into the string stored in the
//! database file and back. Three schemes are supported: plain JSON text,
//! base64-encoded JSON, and AES-256-CBC under a PBKDF2-derived key.

use crate::value::Map;
use crate::{Error, Result};
use aes::cipher::block_padding::Pkcs7;
use aes::cipher::{BlockDecryptMut, BlockEncryptMut, KeyIvInit};
use base64ct::{Base64, Encoding};
use pbkdf2::pbkdf2_hmac;
use rand::rngs::OsRng;
use rand::RngCore;
use sha2::Sha256;
use std::fmt;
use zeroize::Zeroize;

type Aes256CbcEnc = cbc::Encryptor<aes::Aes256>;
type Aes256CbcDec = cbc::Decryptor<aes::Aes256>;

const KEY_DERIVATION_ROUNDS: u32 = 100_000;
const SALT_LEN: usize = 16;
const IV_LEN: usize = 16;

/// How the tree is represented on disk.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EncryptionMethod {
    /// Plain JSON text.
    None,
    /// Base64 of the JSON text. Reversible encoding, not encryption.
    Base64,
    /// AES-256-CBC with PKCS7 padding, keyed by PBKDF2-HMAC-SHA256 over
    /// the configured secret and a per-write random salt.
    Aes,
}

impl EncryptionMethod {
    /// Parse a method name. Matching is case-insensitive and anything
    /// other than `base64` or `aes` selects no encryption.
    pub fn from_name(name: &str) -> Self {
        match name.to_ascii_lowercase().as_str() {
            "base64" => EncryptionMethod::Base64,
            "aes" => EncryptionMethod::Aes,
            _ => EncryptionMethod::None,
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            EncryptionMethod::None => "none",
            EncryptionMethod::Base64 => "base64",
            EncryptionMethod::Aes => "aes",
        }
    }
}

impl fmt::Display for EncryptionMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Serializes and deserializes the tree under one fixed method/secret
/// pair. The pair is immutable for the life of the codec; migrating to
/// another scheme means building a new codec.
pub struct Codec {
    method: EncryptionMethod,
    key: Option<String>,
}

impl Codec {
    /// Build a codec. The `aes` method requires a non-empty key, else
    /// this fails with [`Error::Config`].
    pub fn new(method: EncryptionMethod, key: Option<String>) -> Result<Self> {
        if method == EncryptionMethod::Aes && key.as_deref().map_or(true, str::is_empty) {
            return Err(Error::Config(
                "aes encryption requires a non-empty key".to_string(),
            ));
        }
        Ok(Self { method, key })
    }

    pub fn method(&self) -> EncryptionMethod {
        self.method
    }

    /// Encode the tree to its on-disk string form.
    pub fn encode(&self, tree: &Map) -> Result<String> {
        let json = serde_json::to_string(tree)?;
        match self.method {
            EncryptionMethod::None => Ok(json),
            EncryptionMethod::Base64 => Ok(Base64::encode_string(json.as_bytes())),
            EncryptionMethod::Aes => self.aes_encrypt(&json),
        }
    }

    /// Decode an on-disk string back into a tree.
    ///
    /// Fails with [`Error::Decode`] on malformed structure, a wrong key,
    /// or invalid JSON.
    pub fn decode(&self, raw: &str) -> Result<Map> {
        let json = match self.method {
            EncryptionMethod::None => raw.to_string(),
            EncryptionMethod::Base64 => {
                let bytes = Base64::decode_vec(raw)
                    .map_err(|e| Error::Decode(format!("invalid base64 payload: {e}")))?;
                String::from_utf8(bytes)
                    .map_err(|_| Error::Decode("payload is not valid UTF-8".to_string()))?
            }
            EncryptionMethod::Aes => self.aes_decrypt(raw)?,
        };
        serde_json::from_str(&json)
            .map_err(|e| Error::Decode(format!("payload is not a valid document: {e}")))
    }

    fn derive_key(&self, salt: &[u8]) -> [u8; 32] {
        let secret = self.key.as_deref().unwrap_or_default();
        let mut derived = [0u8; 32];
        pbkdf2_hmac::<Sha256>(secret.as_bytes(), salt, KEY_DERIVATION_ROUNDS, &mut derived);
        derived
    }

    fn aes_encrypt(&self, plaintext: &str) -> Result<String> {
        let mut salt = [0u8; SALT_LEN];
        OsRng.fill_bytes(&mut salt);
        let mut iv = [0u8; IV_LEN];
        OsRng.fill_bytes(&mut iv);

        let mut key = self.derive_key(&salt);
        let ciphertext = Aes256CbcEnc::new(&key.into(), &iv.into())
            .encrypt_padded_vec_mut::<Pkcs7>(plaintext.as_bytes());
        key.zeroize();

        Ok(format!(
            "{}:{}:{}",
            Base64::encode_string(&salt),
            Base64::encode_string(&iv),
            Base64::encode_string(&ciphertext)
        ))
    }

    fn aes_decrypt(&self, raw: &str) -> Result<String> {
        let parts: Vec<&str> = raw.split(':').collect();
        if parts.len() != 3 {
            return Err(Error::Decode(
                "expected salt:iv:ciphertext payload".to_string(),
            ));
        }

        let salt = Base64::decode_vec(parts[0])
            .map_err(|e| Error::Decode(format!("invalid salt: {e}")))?;
        let iv_bytes = Base64::decode_vec(parts[1])
            .map_err(|e| Error::Decode(format!("invalid iv: {e}")))?;
        let ciphertext = Base64::decode_vec(parts[2])
            .map_err(|e| Error::Decode(format!("invalid ciphertext: {e}")))?;

        let iv: [u8; IV_LEN] = iv_bytes
            .as_slice()
            .try_into()
            .map_err(|_| Error::Decode(format!("iv must be {IV_LEN} bytes")))?;

        let mut key = self.derive_key(&salt);
        let plaintext = Aes256CbcDec::new(&key.into(), &iv.into())
            .decrypt_padded_vec_mut::<Pkcs7>(&ciphertext)
            .map_err(|_| Error::Decode("wrong key or corrupt ciphertext".to_string()));
        key.zeroize();

        String::from_utf8(plaintext?)
            .map_err(|_| Error::Decode("decrypted payload is not valid UTF-8".to_string()))
    }
}
