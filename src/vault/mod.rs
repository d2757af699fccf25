/// Credential vault
///
/// Symmetric encryption for integration credentials at rest. Ciphertexts are
/// AES-256-GCM with a fresh random nonce per call, stored as
/// base64(nonce || ciphertext || tag). The vault is constructed once at
/// startup and handed to the services that need it.

use crate::config::VaultConfig;
use aes_gcm::aead::{Aead, KeyInit};
use aes_gcm::{Aes256Gcm, Nonce};
use base64::engine::general_purpose::STANDARD as BASE64_STANDARD;
use base64::Engine;
use rand::RngCore;
use serde_json::{Map, Value};
use thiserror::Error;

const KEY_LEN: usize = 32;
const NONCE_LEN: usize = 12;
const TAG_LEN: usize = 16;

/// Failures raised by the vault
#[derive(Debug, Error)]
pub enum VaultError {
    #[error("Invalid encryption key: {0}")]
    InvalidKey(String),

    #[error("Encryption failed")]
    Encryption,

    #[error("Decryption failed: {0}")]
    Decryption(String),

    #[error("Decrypted credentials are not a JSON object: {0}")]
    MalformedCredentials(String),
}

/// AES-256-GCM credential vault
#[derive(Clone)]
pub struct CredentialVault {
    cipher: Aes256Gcm,
}

impl std::fmt::Debug for CredentialVault {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CredentialVault").finish_non_exhaustive()
    }
}

impl CredentialVault {
    /// Build a vault from raw key bytes (must be exactly 32 bytes)
    pub fn new(key: &[u8]) -> Result<Self, VaultError> {
        if key.len() != KEY_LEN {
            return Err(VaultError::InvalidKey(format!(
                "expected {} bytes, got {}",
                KEY_LEN,
                key.len()
            )));
        }
        let cipher = Aes256Gcm::new_from_slice(key)
            .map_err(|_| VaultError::InvalidKey("failed to initialize AES-256-GCM".to_string()))?;
        Ok(Self { cipher })
    }

    /// Build a vault from a base64-encoded key
    pub fn from_base64_key(encoded: &str) -> Result<Self, VaultError> {
        let key = BASE64_STANDARD
            .decode(encoded.trim())
            .map_err(|e| VaultError::InvalidKey(format!("key is not valid base64: {}", e)))?;
        Self::new(&key)
    }

    /// Build the vault from configuration, refusing to start without a key
    pub fn from_config(config: &VaultConfig) -> Result<Self, VaultError> {
        let key = config.encryption_key.as_deref().ok_or_else(|| {
            VaultError::InvalidKey(format!(
                "INTEGRAFLOW_ENCRYPTION_KEY is not set (example key: {})",
                Self::generate_key()
            ))
        })?;
        Self::from_base64_key(key)
    }

    /// Generate a new random base64-encoded key
    pub fn generate_key() -> String {
        let mut key = [0u8; KEY_LEN];
        rand::thread_rng().fill_bytes(&mut key);
        BASE64_STANDARD.encode(key)
    }

    /// Encrypt a UTF-8 string
    pub fn encrypt(&self, plaintext: &str) -> Result<String, VaultError> {
        let mut iv = [0u8; NONCE_LEN];
        rand::thread_rng().fill_bytes(&mut iv);
        let nonce = Nonce::from_slice(&iv);

        let ciphertext = self
            .cipher
            .encrypt(nonce, plaintext.as_bytes())
            .map_err(|_| VaultError::Encryption)?;

        let mut blob = Vec::with_capacity(NONCE_LEN + ciphertext.len());
        blob.extend_from_slice(&iv);
        blob.extend_from_slice(&ciphertext);
        Ok(BASE64_STANDARD.encode(blob))
    }

    /// Decrypt a string produced by [`CredentialVault::encrypt`]
    pub fn decrypt(&self, encoded: &str) -> Result<String, VaultError> {
        let blob = BASE64_STANDARD
            .decode(encoded.trim())
            .map_err(|e| VaultError::Decryption(format!("ciphertext is not valid base64: {}", e)))?;
        if blob.len() < NONCE_LEN + TAG_LEN {
            return Err(VaultError::Decryption("ciphertext is too short".to_string()));
        }

        let (iv, ciphertext) = blob.split_at(NONCE_LEN);
        let plaintext = self
            .cipher
            .decrypt(Nonce::from_slice(iv), ciphertext)
            .map_err(|_| VaultError::Decryption("authentication failed (wrong key or tampered data)".to_string()))?;

        String::from_utf8(plaintext)
            .map_err(|_| VaultError::Decryption("plaintext is not valid UTF-8".to_string()))
    }

    /// Serialize and encrypt a credential object
    pub fn encrypt_credentials(&self, credentials: &Map<String, Value>) -> Result<String, VaultError> {
        let plaintext = serde_json::to_string(credentials).map_err(|_| VaultError::Encryption)?;
        self.encrypt(&plaintext)
    }

    /// Decrypt and parse a credential object
    pub fn decrypt_credentials(&self, encoded: &str) -> Result<Map<String, Value>, VaultError> {
        let plaintext = self.decrypt(encoded)?;
        match serde_json::from_str::<Value>(&plaintext) {
            Ok(Value::Object(map)) => Ok(map),
            Ok(other) => Err(VaultError::MalformedCredentials(format!("found {}", json_kind(&other)))),
            Err(e) => Err(VaultError::MalformedCredentials(e.to_string())),
        }
    }
}

fn json_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "an object",
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn vault() -> CredentialVault {
        CredentialVault::from_base64_key(&CredentialVault::generate_key()).unwrap()
    }

    #[test]
    fn decrypt_inverts_encrypt() {
        let vault = vault();
        for plaintext in ["", "token", "{\"api_token\":\"abc\"}", "ünïcödé ✅"] {
            let sealed = vault.encrypt(plaintext).unwrap();
            assert_eq!(vault.decrypt(&sealed).unwrap(), plaintext);
        }
    }

    #[test]
    fn encrypting_twice_produces_different_ciphertexts() {
        let vault = vault();
        let first = vault.encrypt("same secret").unwrap();
        let second = vault.encrypt("same secret").unwrap();
        assert_ne!(first, second);
        assert_eq!(vault.decrypt(&first).unwrap(), vault.decrypt(&second).unwrap());
    }

    #[test]
    fn foreign_ciphertext_is_rejected() {
        let sealed = vault().encrypt("secret").unwrap();
        let err = vault().decrypt(&sealed).unwrap_err();
        assert!(matches!(err, VaultError::Decryption(_)));
    }

    #[test]
    fn garbage_is_rejected() {
        let vault = vault();
        assert!(matches!(vault.decrypt("not base64 !!"), Err(VaultError::Decryption(_))));
        assert!(matches!(vault.decrypt("c2hvcnQ="), Err(VaultError::Decryption(_))));
    }

    #[test]
    fn key_length_is_enforced() {
        assert!(matches!(CredentialVault::new(&[0u8; 16]), Err(VaultError::InvalidKey(_))));
        assert!(CredentialVault::new(&[7u8; 32]).is_ok());
    }

    #[test]
    fn missing_key_in_config_is_an_error() {
        let config = VaultConfig { encryption_key: None };
        assert!(matches!(CredentialVault::from_config(&config), Err(VaultError::InvalidKey(_))));
    }

    #[test]
    fn credentials_round_trip_as_objects() {
        let vault = vault();
        let credentials = json!({"token": "ghp_123", "username": "octo"});
        let sealed = vault
            .encrypt_credentials(credentials.as_object().unwrap())
            .unwrap();
        let opened = vault.decrypt_credentials(&sealed).unwrap();
        assert_eq!(Value::Object(opened), credentials);
    }

    #[test]
    fn non_object_credentials_are_malformed() {
        let vault = vault();
        let sealed = vault.encrypt("[1,2,3]").unwrap();
        assert!(matches!(
            vault.decrypt_credentials(&sealed),
            Err(VaultError::MalformedCredentials(_))
        ));
    }
}
