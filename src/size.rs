//! Format constants and exact container sizes
//!
//! Every length here is fixed at compile time, so callers can size buffers
//! before touching any secret material.

use crate::error::{ErrorCategory, ErrorKind, Result, SealedSaveError};

/// Length of the magic prefix in bytes
pub const MAGIC_LEN: usize = 2;

/// Length of the KDF salt in bytes
pub const SALT_LEN: usize = 32;

/// Length of a derived key in bytes
pub const KEY_LEN: usize = 32;

/// Length of the XSalsa20 nonce in bytes
pub const NONCE_LEN: usize = 24;

/// Length of the Poly1305 authenticator in bytes
pub const MAC_LEN: usize = 16;

/// Bytes a container adds on top of its plaintext
pub const EXTRA_LEN: usize = MAGIC_LEN + SALT_LEN + NONCE_LEN + MAC_LEN;

/// Something that can report the length of the plaintext it would save,
/// such as a live profile session.
pub trait DataLengthSource {
    /// Current plaintext length, or `None` if there is nothing to save.
    fn current_data_length(&self) -> Option<usize>;
}

/// Exact container length for a plaintext of `plaintext_len` bytes.
///
/// Returns `None` when that length is not representable.
pub const fn encrypted_size_for(plaintext_len: usize) -> Option<usize> {
    plaintext_len.checked_add(EXTRA_LEN)
}

/// Plaintext length carried by a container of `container_len` bytes.
///
/// Returns `None` when no valid container can be that short.
pub const fn decrypted_size_for(container_len: usize) -> Option<usize> {
    container_len.checked_sub(EXTRA_LEN)
}

/// Container length for whatever `source` currently holds.
pub fn encrypted_size_for_session(source: Option<&dyn DataLengthSource>) -> Result<usize> {
    let len = source
        .and_then(|s| s.current_data_length())
        .ok_or_else(|| {
            SealedSaveError::with_kind(
                ErrorCategory::User,
                ErrorKind::NoData,
                "no data source available to report a plaintext length",
            )
        })?;
    encrypted_size_for(len).ok_or_else(|| size_overflow(len))
}

/// Error for a plaintext length whose container size overflows `usize`.
pub fn size_overflow(plaintext_len: usize) -> SealedSaveError {
    SealedSaveError::with_kind(
        ErrorCategory::User,
        ErrorKind::SizeOverflow,
        format!(
            "a container for {} plaintext bytes would exceed the addressable size",
            plaintext_len
        ),
    )
}
