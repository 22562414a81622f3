//! sealedsave - passphrase-protected containers for profile state
//!
//! A container is `magic || salt || nonce || sealed box`, where the key for
//! the NaCl secretbox (XSalsa20Poly1305) is derived from a passphrase with
//! Argon2id. See [`container`] for the exact layout and [`size`] for the
//! constants.
//!
//! ```no_run
//! use sealedsave::{secretcrypt, sniff, EXTRA_LEN};
//!
//! let container = secretcrypt::encrypt_with_passphrase(b"profile", b"somePassword")?;
//! assert_eq!(container.len(), EXTRA_LEN + 7);
//! assert!(sniff::looks_encrypted(&container));
//! let profile = secretcrypt::decrypt_with_passphrase(&container, b"somePassword")?;
//! assert_eq!(profile, b"profile");
//! # Ok::<(), sealedsave::error::SealedSaveError>(())
//! ```

#![forbid(unsafe_code)]

pub mod container;
pub mod deferred;
pub mod error;
pub mod file_ops;
pub mod kdf;
pub mod passphrase;
pub mod secretcrypt;
pub mod size;
pub mod sniff;

pub use error::{ErrorCategory, ErrorKind, Result, SealedSaveError};
pub use kdf::DerivedKey;
pub use size::{EXTRA_LEN, KEY_LEN, MAC_LEN, MAGIC_LEN, NONCE_LEN, SALT_LEN};
