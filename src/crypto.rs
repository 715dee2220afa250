use aes_gcm::aead::{Aead, AeadCore, KeyInit, OsRng};
use aes_gcm::{Aes256Gcm, Nonce};
use base64::engine::general_purpose::STANDARD as BASE64;
use base64::Engine as _;
use sha2::{Digest, Sha256};

const NONCE_LEN: usize = 12;

#[derive(Debug, thiserror::Error)]
pub enum CryptoError {
    #[error("encryption key is not set")]
    KeyNotSet,
    #[error("encryption key must decode to 32 bytes")]
    InvalidKey,
    #[error("failed to decode base64 data")]
    DecodeBase64,
    #[error("ciphertext too short")]
    CiphertextTooShort,
    #[error("failed to encrypt data")]
    Encrypt,
    #[error("failed to decrypt data")]
    Decrypt,
}

/// Encrypts the stored email column. AES-256-GCM with the nonce prepended
/// to the sealed bytes; key and output are base64. Equality lookups never
/// touch this value, they go through [`hash_email`].
#[derive(Clone)]
pub struct EmailEncryptor {
    cipher: Aes256Gcm,
}

impl std::fmt::Debug for EmailEncryptor {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EmailEncryptor").finish_non_exhaustive()
    }
}

impl EmailEncryptor {
    pub fn new(base64_key: &str) -> Result<Self, CryptoError> {
        if base64_key.is_empty() {
            return Err(CryptoError::KeyNotSet);
        }
        let key = BASE64
            .decode(base64_key)
            .map_err(|_| CryptoError::DecodeBase64)?;
        let cipher = Aes256Gcm::new_from_slice(&key).map_err(|_| CryptoError::InvalidKey)?;
        Ok(Self { cipher })
    }

    pub fn encrypt(&self, plaintext: &str) -> Result<String, CryptoError> {
        let nonce = Aes256Gcm::generate_nonce(&mut OsRng);
        let sealed = self
            .cipher
            .encrypt(&nonce, plaintext.as_bytes())
            .map_err(|_| CryptoError::Encrypt)?;
        let mut out = nonce.to_vec();
        out.extend_from_slice(&sealed);
        Ok(BASE64.encode(out))
    }

    pub fn decrypt(&self, ciphertext: &str) -> Result<String, CryptoError> {
        let data = BASE64
            .decode(ciphertext)
            .map_err(|_| CryptoError::DecodeBase64)?;
        if data.len() < NONCE_LEN {
            return Err(CryptoError::CiphertextTooShort);
        }
        let (nonce, sealed) = data.split_at(NONCE_LEN);
        let plain = self
            .cipher
            .decrypt(Nonce::from_slice(nonce), sealed)
            .map_err(|_| CryptoError::Decrypt)?;
        String::from_utf8(plain).map_err(|_| CryptoError::Decrypt)
    }
}

/// Deterministic digest of an email address, used as the unique lookup key
/// next to the encrypted column. Input is hashed as-is (case-sensitive).
pub fn hash_email(email: &str) -> String {
    hex::encode(Sha256::digest(email.as_bytes()))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn test_key() -> String {
        BASE64.encode([7u8; 32])
    }

    #[test]
    fn encrypt_decrypt_roundtrip() {
        let enc = EmailEncryptor::new(&test_key()).expect("valid key");
        let plaintext = "user@example.com";
        let ciphertext = enc.encrypt(plaintext).expect("encrypt");
        assert_ne!(ciphertext, plaintext);
        assert_eq!(enc.decrypt(&ciphertext).expect("decrypt"), plaintext);
    }

    #[test]
    fn encrypt_is_randomized() {
        let enc = EmailEncryptor::new(&test_key()).expect("valid key");
        let a = enc.encrypt("same input").unwrap();
        let b = enc.encrypt("same input").unwrap();
        assert_ne!(a, b);
    }

    #[test]
    fn decrypt_rejects_tampered_ciphertext() {
        let enc = EmailEncryptor::new(&test_key()).expect("valid key");
        let ciphertext = enc.encrypt("user@example.com").unwrap();
        let mut raw = BASE64.decode(&ciphertext).unwrap();
        let last = raw.len() - 1;
        raw[last] ^= 0x01;
        let err = enc.decrypt(&BASE64.encode(raw)).unwrap_err();
        assert!(matches!(err, CryptoError::Decrypt));
    }

    #[test]
    fn decrypt_rejects_short_ciphertext() {
        let enc = EmailEncryptor::new(&test_key()).expect("valid key");
        let err = enc.decrypt(&BASE64.encode([0u8; 4])).unwrap_err();
        assert!(matches!(err, CryptoError::CiphertextTooShort));
    }

    #[test]
    fn new_rejects_bad_keys() {
        assert!(matches!(
            EmailEncryptor::new("").unwrap_err(),
            CryptoError::KeyNotSet
        ));
        assert!(matches!(
            EmailEncryptor::new("not-base64!!!").unwrap_err(),
            CryptoError::DecodeBase64
        ));
        let short = BASE64.encode([0u8; 16]);
        assert!(matches!(
            EmailEncryptor::new(&short).unwrap_err(),
            CryptoError::InvalidKey
        ));
    }

    #[test]
    fn hash_email_is_deterministic_and_case_sensitive() {
        let a = hash_email("user@example.com");
        assert_eq!(a.len(), 64);
        assert_eq!(a, hash_email("user@example.com"));
        assert_ne!(a, hash_email("User@example.com"));
    }
}
