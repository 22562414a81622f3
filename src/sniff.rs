//! Container detection without decryption

use crate::container::MAGIC;

/// Whether `buf` starts with the container magic bytes.
///
/// This only looks at the first two bytes. Plain data that happens to start
/// with the same bytes is reported as encrypted; callers that need certainty
/// must attempt decryption.
pub fn looks_encrypted(buf: &[u8]) -> bool {
    buf.starts_with(&MAGIC)
}
