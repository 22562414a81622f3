//! Encryption/decryption using Argon2id + XSalsa20Poly1305
//!
//! This module implements passphrase-based encryption using:
//! - Argon2id for key derivation from passphrase
//! - NaCl secretbox (XSalsa20Poly1305) for authenticated encryption
//!
//! Output is framed by [`crate::container`]. Every failure to open a sealed
//! box is reported the same way, whether the key is wrong or the data was
//! modified.

use crypto_secretbox::aead::{Aead, KeyInit};
use crypto_secretbox::{Nonce, XSalsa20Poly1305};
use rand::RngCore;
use rand::rngs::OsRng;

use crate::container::{self, ContainerParts};
use crate::error::{ErrorCategory, ErrorKind, Result, SealedSaveError};
use crate::kdf::{self, DerivedKey};
use crate::size::{NONCE_LEN, SALT_LEN};

const AUTH_FAILED_MSG: &str = "wrong passphrase, or corrupted or tampered-with data";

/// Encrypt plaintext under an already derived key and a random nonce.
///
/// The key's salt is written into the container so the same passphrase can
/// later re-derive it.
pub fn encrypt(plaintext: &[u8], key: &DerivedKey) -> Result<Vec<u8>> {
    let mut nonce = [0u8; NONCE_LEN];
    OsRng.fill_bytes(&mut nonce);

    seal(plaintext, key, &nonce)
}

/// Encrypt plaintext with a passphrase using random salt and nonce
pub fn encrypt_with_passphrase(plaintext: &[u8], passphrase: &[u8]) -> Result<Vec<u8>> {
    let key = kdf::derive_key_with_random_salt(passphrase)?;
    encrypt(plaintext, &key)
}

/// Encrypt plaintext with a passphrase using provided salt and nonce
///
/// This function is ONLY for testing purposes to generate deterministic output.
/// NEVER use this in production - always use `encrypt_with_passphrase()` which
/// generates random salt/nonce.
pub fn encrypt_deterministic(
    passphrase: &[u8],
    plaintext: &[u8],
    salt: &[u8; SALT_LEN],
    nonce: &[u8; NONCE_LEN],
) -> Result<Vec<u8>> {
    let key = kdf::derive_key(passphrase, salt)?;
    seal(plaintext, &key, nonce)
}

/// Decrypt a container with an already derived key.
///
/// The salt stored in the container is not consulted.
pub fn decrypt(ciphertext: &[u8], key: &DerivedKey) -> Result<Vec<u8>> {
    let parts = container::parse(ciphertext)?;
    open(&parts, key)
}

/// Decrypt a container with a passphrase
///
/// Framing is validated before the (expensive) key derivation runs.
pub fn decrypt_with_passphrase(ciphertext: &[u8], passphrase: &[u8]) -> Result<Vec<u8>> {
    let parts = container::parse(ciphertext)?;
    let key = kdf::derive_key(passphrase, parts.salt)?;
    open(&parts, &key)
}

fn seal(plaintext: &[u8], key: &DerivedKey, nonce: &[u8; NONCE_LEN]) -> Result<Vec<u8>> {
    let cipher = XSalsa20Poly1305::new(key.as_bytes().into());
    let sealed_box = cipher
        .encrypt(Nonce::from_slice(nonce), plaintext)
        .map_err(|e| {
            SealedSaveError::with_kind(
                ErrorCategory::Internal,
                ErrorKind::SecretboxFailure,
                format!("encryption failed: {}", e),
            )
        })?;

    tracing::debug!(
        plaintext_len = plaintext.len(),
        sealed_len = sealed_box.len(),
        "sealed container"
    );

    Ok(container::frame(key.salt(), nonce, &sealed_box))
}

fn open(parts: &ContainerParts<'_>, key: &DerivedKey) -> Result<Vec<u8>> {
    let cipher = XSalsa20Poly1305::new(key.as_bytes().into());
    let plaintext = cipher
        .decrypt(Nonce::from_slice(parts.nonce), parts.sealed)
        .map_err(|_| {
            SealedSaveError::with_kind(
                ErrorCategory::User,
                ErrorKind::AuthenticationFailed,
                AUTH_FAILED_MSG,
            )
        })?;

    tracing::debug!(plaintext_len = plaintext.len(), "opened container");

    Ok(plaintext)
}
