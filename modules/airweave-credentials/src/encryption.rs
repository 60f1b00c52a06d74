//! Symmetric encryption of credential payloads at rest (spec §4.9/§6:
//! "AES-like symmetric; key from environment. Cipher output is opaque bytes
//! stored in the credential row"). AES-256-GCM, key hex-decoded from
//! `Config::credential_encryption_key`, nonce generated per call and
//! prepended to the ciphertext so `decrypt` is self-contained.

use std::collections::BTreeMap;

use aes_gcm::aead::{Aead, KeyInit};
use aes_gcm::{Aes256Gcm, Key, Nonce};
use base64::Engine;
use rand::RngCore;
use serde_json::Value;

use airweave_common::AirweaveError;

const NONCE_LEN: usize = 12;

pub struct CredentialCipher {
    cipher: Aes256Gcm,
}

impl CredentialCipher {
    /// `hex_key` must decode to exactly 32 bytes.
    pub fn new(hex_key: &str) -> Result<Self, AirweaveError> {
        let key_bytes = hex_decode(hex_key)
            .map_err(|e| AirweaveError::Config(format!("invalid credential encryption key: {e}")))?;
        if key_bytes.len() != 32 {
            return Err(AirweaveError::Config(format!(
                "credential encryption key must decode to 32 bytes, got {}",
                key_bytes.len()
            )));
        }
        let key = Key::<Aes256Gcm>::from_slice(&key_bytes);
        Ok(Self { cipher: Aes256Gcm::new(key) })
    }

    pub fn encrypt(&self, plain_map: &BTreeMap<String, Value>) -> Result<Vec<u8>, AirweaveError> {
        let plaintext =
            serde_json::to_vec(plain_map).map_err(|e| AirweaveError::Anyhow(e.into()))?;

        let mut nonce_bytes = [0u8; NONCE_LEN];
        rand::thread_rng().fill_bytes(&mut nonce_bytes);
        let nonce = Nonce::from_slice(&nonce_bytes);

        let ciphertext = self
            .cipher
            .encrypt(nonce, plaintext.as_ref())
            .map_err(|e| AirweaveError::Config(format!("credential encryption failed: {e}")))?;

        let mut out = Vec::with_capacity(NONCE_LEN + ciphertext.len());
        out.extend_from_slice(&nonce_bytes);
        out.extend_from_slice(&ciphertext);
        Ok(out)
    }

    pub fn decrypt(&self, cipher_bytes: &[u8]) -> Result<BTreeMap<String, Value>, AirweaveError> {
        if cipher_bytes.len() < NONCE_LEN {
            return Err(AirweaveError::Config("credential cipher payload too short".into()));
        }
        let (nonce_bytes, ciphertext) = cipher_bytes.split_at(NONCE_LEN);
        let nonce = Nonce::from_slice(nonce_bytes);

        let plaintext = self
            .cipher
            .decrypt(nonce, ciphertext)
            .map_err(|e| AirweaveError::Config(format!("credential decryption failed: {e}")))?;

        serde_json::from_slice(&plaintext).map_err(|e| AirweaveError::Anyhow(e.into()))
    }
}

fn hex_decode(s: &str) -> Result<Vec<u8>, String> {
    let s = s.trim();
    if s.len() % 2 != 0 {
        return Err("odd-length hex string".to_string());
    }
    (0..s.len())
        .step_by(2)
        .map(|i| u8::from_str_radix(&s[i..i + 2], 16).map_err(|e| e.to_string()))
        .collect()
}

/// base64-encode cipher bytes for storage in a text column, if the backing
/// schema prefers text over bytea.
pub fn to_base64(cipher_bytes: &[u8]) -> String {
    base64::engine::general_purpose::STANDARD.encode(cipher_bytes)
}

pub fn from_base64(encoded: &str) -> Result<Vec<u8>, AirweaveError> {
    base64::engine::general_purpose::STANDARD
        .decode(encoded)
        .map_err(|e| AirweaveError::Config(format!("invalid base64 credential payload: {e}")))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn test_key() -> String {
        "00".repeat(32)
    }

    #[test]
    fn encrypt_then_decrypt_round_trips() {
        let cipher = CredentialCipher::new(&test_key()).unwrap();
        let mut plain = BTreeMap::new();
        plain.insert("access_token".to_string(), Value::String("secret-abc".to_string()));

        let cipher_bytes = cipher.encrypt(&plain).unwrap();
        assert_ne!(cipher_bytes, serde_json::to_vec(&plain).unwrap());

        let decrypted = cipher.decrypt(&cipher_bytes).unwrap();
        assert_eq!(decrypted, plain);
    }

    #[test]
    fn each_encryption_uses_a_fresh_nonce() {
        let cipher = CredentialCipher::new(&test_key()).unwrap();
        let mut plain = BTreeMap::new();
        plain.insert("k".to_string(), Value::String("v".to_string()));

        let a = cipher.encrypt(&plain).unwrap();
        let b = cipher.encrypt(&plain).unwrap();
        assert_ne!(a, b);
    }

    #[test]
    fn rejects_a_key_that_is_not_32_bytes() {
        assert!(CredentialCipher::new("00112233").is_err());
    }

    #[test]
    fn base64_round_trips() {
        let bytes = vec![1u8, 2, 3, 250, 255];
        assert_eq!(from_base64(&to_base64(&bytes)).unwrap(), bytes);
    }
}
