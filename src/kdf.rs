//! Passphrase to key derivation using Argon2id
//!
//! Argon2id parameters are fixed: the container format stores only the salt,
//! so changing them would make every existing container unreadable.
//!
//! The Argon2 working memory is allocated here rather than inside the
//! `argon2` crate, so that a failed allocation is an error instead of an
//! abort and the memory is wiped on every exit path.

use std::fmt;

use argon2::{Algorithm, Argon2, Block, Params, Version};
use rand::RngCore;
use rand::rngs::OsRng;
use zeroize::{Zeroize, Zeroizing};

use crate::error::{ErrorCategory, ErrorKind, Result, SealedSaveError};
use crate::size::{KEY_LEN, SALT_LEN};

/// Argon2id cost parameters
#[derive(Debug, Clone, Copy)]
struct KdfParams {
    /// Memory cost in KiB (one Argon2 block each)
    mem_cost_kib: u32,
    /// Time cost / iterations
    time_cost: u32,
    /// Lanes
    parallelism: u32,
}

/// 19 MiB, 2 passes, 1 lane
const KDF_PARAMS: KdfParams = KdfParams {
    mem_cost_kib: 19 * 1024,
    time_cost: 2,
    parallelism: 1,
};

/// A symmetric key together with the salt it was derived from.
///
/// The key bytes are wiped when the value is dropped.
#[derive(Clone)]
pub struct DerivedKey {
    key: [u8; KEY_LEN],
    salt: [u8; SALT_LEN],
}

impl DerivedKey {
    /// Builds a key from caller-supplied bytes, e.g. a key held by a host
    /// application across several saves.
    pub fn from_parts(key: [u8; KEY_LEN], salt: [u8; SALT_LEN]) -> Self {
        Self { key, salt }
    }

    /// Raw key bytes, as handed to the cipher.
    pub fn as_bytes(&self) -> &[u8; KEY_LEN] {
        &self.key
    }

    /// Salt written into every container sealed with this key.
    pub fn salt(&self) -> &[u8; SALT_LEN] {
        &self.salt
    }
}

impl Drop for DerivedKey {
    fn drop(&mut self) {
        self.key.zeroize();
    }
}

impl fmt::Debug for DerivedKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DerivedKey")
            .field("key", &"[REDACTED]")
            .field("salt", &self.salt)
            .finish()
    }
}

/// Fresh random salt from the operating system CSPRNG.
pub fn generate_salt() -> [u8; SALT_LEN] {
    let mut salt = [0u8; SALT_LEN];
    OsRng.fill_bytes(&mut salt);
    salt
}

/// Derive a key from a passphrase and salt using Argon2id.
///
/// Empty passphrases are accepted but logged, since they leave only the
/// salt between an attacker and the data. Fails with
/// [`ErrorKind::DerivationFailed`] if the working memory cannot be reserved.
pub fn derive_key(passphrase: &[u8], salt: &[u8; SALT_LEN]) -> Result<DerivedKey> {
    derive_key_with_params(passphrase, salt, KDF_PARAMS)
}

/// Derive a key under a freshly generated salt, available via
/// [`DerivedKey::salt`].
pub fn derive_key_with_random_salt(passphrase: &[u8]) -> Result<DerivedKey> {
    let salt = generate_salt();
    derive_key(passphrase, &salt)
}

fn derive_key_with_params(
    passphrase: &[u8],
    salt: &[u8; SALT_LEN],
    kdf: KdfParams,
) -> Result<DerivedKey> {
    if passphrase.is_empty() {
        tracing::warn!("deriving a key from an empty passphrase");
    }

    let params = Params::new(
        kdf.mem_cost_kib,
        kdf.time_cost,
        kdf.parallelism,
        Some(KEY_LEN),
    )
    .map_err(|e| derivation_failed(format!("invalid Argon2id params: {}", e)))?;

    tracing::debug!(
        mem_cost_kib = kdf.mem_cost_kib,
        time_cost = kdf.time_cost,
        parallelism = kdf.parallelism,
        "deriving key with Argon2id"
    );

    let mut blocks = allocate_blocks(params.block_count())?;
    let argon2 = Argon2::new(Algorithm::Argon2id, Version::V0x13, params);

    let mut key = Zeroizing::new([0u8; KEY_LEN]);
    argon2
        .hash_password_into_with_memory(passphrase, salt, &mut key[..], &mut blocks[..])
        .map_err(|e| derivation_failed(format!("Argon2id KDF failed: {}", e)))?;

    Ok(DerivedKey::from_parts(*key, *salt))
}

/// Working memory for one derivation, wiped when dropped.
fn allocate_blocks(count: usize) -> Result<Zeroizing<Vec<Block>>> {
    let mut blocks = Zeroizing::new(Vec::new());
    blocks.try_reserve_exact(count).map_err(|e| {
        SealedSaveError::with_kind_and_source(
            ErrorCategory::Internal,
            ErrorKind::DerivationFailed,
            format!("cannot reserve {} KiB for key derivation", count),
            e,
        )
    })?;
    blocks.resize(count, Block::default());
    Ok(blocks)
}

fn derivation_failed(msg: String) -> SealedSaveError {
    SealedSaveError::with_kind(ErrorCategory::Internal, ErrorKind::DerivationFailed, msg)
}
