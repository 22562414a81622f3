//! Binary container layout
//!
//! The format is:
//! - magic: 2 bytes (0x16 0x6C)
//! - salt: 32 bytes
//! - nonce: 24 bytes
//! - sealed box: plaintext length + 16 bytes (Poly1305 MAC, then ciphertext)
//!
//! There is no length field; the sealed box runs to the end of the buffer.

use crate::error::{ErrorCategory, ErrorKind, Result, SealedSaveError};
use crate::size::{EXTRA_LEN, MAGIC_LEN, NONCE_LEN, SALT_LEN};

/// Leading bytes of every container
pub const MAGIC: [u8; MAGIC_LEN] = [0x16, 0x6C];

/// Borrowed view of the regions of a container.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ContainerParts<'a> {
    pub salt: &'a [u8; SALT_LEN],
    pub nonce: &'a [u8; NONCE_LEN],
    pub sealed: &'a [u8],
}

/// Assemble a container from its parts.
pub fn frame(salt: &[u8; SALT_LEN], nonce: &[u8; NONCE_LEN], sealed: &[u8]) -> Vec<u8> {
    let mut output = Vec::with_capacity(MAGIC_LEN + SALT_LEN + NONCE_LEN + sealed.len());
    output.extend_from_slice(&MAGIC);
    output.extend_from_slice(salt);
    output.extend_from_slice(nonce);
    output.extend_from_slice(sealed);
    output
}

/// Split a container into its parts without verifying anything
/// cryptographically.
pub fn parse(buf: &[u8]) -> Result<ContainerParts<'_>> {
    if buf.len() < EXTRA_LEN {
        return Err(SealedSaveError::with_kind(
            ErrorCategory::User,
            ErrorKind::TooShort,
            "input shorter than the smallest possible container; likely truncated",
        ));
    }

    let (magic, rest) = buf.split_at(MAGIC_LEN);
    if magic != MAGIC {
        return Err(SealedSaveError::with_kind(
            ErrorCategory::User,
            ErrorKind::BadMagic,
            "input unrecognized as sealedsave data",
        ));
    }

    let (salt, rest) = rest.split_at(SALT_LEN);
    let (nonce, sealed) = rest.split_at(NONCE_LEN);

    Ok(ContainerParts {
        salt: salt.try_into().map_err(|_| invariant("salt"))?,
        nonce: nonce.try_into().map_err(|_| invariant("nonce"))?,
        sealed,
    })
}

fn invariant(region: &str) -> SealedSaveError {
    SealedSaveError::with_kind(
        ErrorCategory::Internal,
        ErrorKind::InternalInvariant,
        format!("container {} region has the wrong length", region),
    )
}
