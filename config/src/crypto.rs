//! Encryption for secrets kept in settings.toml (the project API key).
//!
//! AES-256-GCM with a key derived from the hostname and username, so a copied
//! settings file is useless on another machine.

use aes_gcm::{
    Aes256Gcm, Nonce,
    aead::{Aead, KeyInit},
};
use base64::{Engine, engine::general_purpose::STANDARD as BASE64};
use rand::Rng;
use sha2::{Digest, Sha256};

const NONCE_SIZE: usize = 12;
const KEY_SALT: &[u8] = b"atelier-settings-secret-v1";

fn machine_key() -> [u8; 32] {
    let hostname = whoami::fallible::hostname().unwrap_or_else(|_| "unknown".to_string());
    let username = whoami::username();

    let mut hasher = Sha256::new();
    hasher.update(KEY_SALT);
    hasher.update(hostname.as_bytes());
    hasher.update(b":");
    hasher.update(username.as_bytes());
    let digest = hasher.finalize();
    let mut key = [0u8; 32];
    key.copy_from_slice(&digest);
    key
}

fn cipher() -> Result<Aes256Gcm, String> {
    Aes256Gcm::new_from_slice(&machine_key()).map_err(|e| format!("Failed to create cipher: {}", e))
}

/// Encrypt a secret. The result is base64 of `nonce || ciphertext`.
pub fn seal_secret(plaintext: &str) -> Result<String, String> {
    let cipher = cipher()?;

    let mut nonce_bytes = [0u8; NONCE_SIZE];
    rand::rng().fill(&mut nonce_bytes);

    let ciphertext = cipher
        .encrypt(Nonce::from_slice(&nonce_bytes), plaintext.as_bytes())
        .map_err(|e| format!("Encryption failed: {}", e))?;

    let mut sealed = Vec::with_capacity(NONCE_SIZE + ciphertext.len());
    sealed.extend_from_slice(&nonce_bytes);
    sealed.extend_from_slice(&ciphertext);
    Ok(BASE64.encode(&sealed))
}

/// Decrypt the output of [`seal_secret`].
pub fn open_secret(sealed: &str) -> Result<String, String> {
    let cipher = cipher()?;

    let sealed = BASE64
        .decode(sealed)
        .map_err(|e| format!("Failed to decode base64: {}", e))?;
    if sealed.len() < NONCE_SIZE {
        return Err("Sealed secret too short".to_string());
    }

    let (nonce_bytes, ciphertext) = sealed.split_at(NONCE_SIZE);
    let plaintext = cipher
        .decrypt(Nonce::from_slice(nonce_bytes), ciphertext)
        .map_err(|e| format!("Decryption failed: {}", e))?;

    String::from_utf8(plaintext).map_err(|e| format!("Invalid UTF-8 in secret: {}", e))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_seal_open() {
        let key = "eyJhbGciOiJIUzI1NiJ9.anon";
        let sealed = seal_secret(key).unwrap();
        assert_ne!(sealed, key);
        assert_eq!(open_secret(&sealed).unwrap(), key);
    }

    #[test]
    fn test_nonce_varies() {
        assert_ne!(seal_secret("same").unwrap(), seal_secret("same").unwrap());
    }

    #[test]
    fn test_open_rejects_garbage() {
        assert!(open_secret("%%%not base64").is_err());
        assert!(open_secret(&BASE64.encode(b"tiny")).is_err());
    }

    #[test]
    fn test_open_rejects_tampering() {
        let sealed = seal_secret("service-key").unwrap();
        let mut bytes = BASE64.decode(&sealed).unwrap();
        let last = bytes.len() - 1;
        bytes[last] ^= 0xff;
        assert!(open_secret(&BASE64.encode(&bytes)).is_err());
    }
}
