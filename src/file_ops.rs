//! File encryption/decryption operations
//!
//! Containers are written to disk as-is, with no armoring. Output files are
//! created with mode 0o600 (read/write for owner only) on Unix systems.

use std::fs;
use std::io::{self, Write};
use std::path::Path;

use crate::error::{ErrorCategory, ErrorKind, Result, SealedSaveError};
use crate::passphrase::{CachingPassphraseReader, PassphraseReader};
use crate::secretcrypt;
use crate::size;
use crate::sniff;

/// What can be learned about a file without a passphrase.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FileReport {
    /// Whether the file starts with the container magic bytes.
    pub encrypted: bool,
    /// Size of the file in bytes.
    pub file_len: usize,
    /// Plaintext size if the file is a container, or the size of the
    /// container it would become if it is plain data.
    pub counterpart_len: Option<usize>,
}

/// Encrypt a file with a passphrase
///
/// Reads plaintext from `input_path`, encrypts it using a passphrase from
/// `passphrase_reader`, and writes the container to `output_path`.
pub fn encrypt_file(
    input_path: &Path,
    output_path: &Path,
    passphrase_reader: &mut dyn PassphraseReader,
) -> Result<()> {
    let plaintext = fs::read(input_path).map_err(|e| read_error(input_path, e))?;
    if sniff::looks_encrypted(&plaintext) {
        tracing::warn!(
            path = %input_path.display(),
            "input already looks like a sealedsave container; encrypting it again"
        );
    }
    let passphrase = passphrase_reader.read_passphrase()?;
    let container = secretcrypt::encrypt_with_passphrase(&plaintext, &passphrase)
        .map_err(|e| e.with_context("encryption failed"))?;
    drop(passphrase);
    write_file_secure(output_path, &container)
        .map_err(|e| e.with_context(format!("failed to write to {}", output_path.display())))?;

    Ok(())
}

/// Decrypt a file with a passphrase
///
/// Input that is not a container is rejected before the passphrase is read.
pub fn decrypt_file(
    input_path: &Path,
    output_path: &Path,
    passphrase_reader: &mut dyn PassphraseReader,
) -> Result<()> {
    let container = read_container(input_path)?;
    let passphrase = passphrase_reader.read_passphrase()?;
    let plaintext = secretcrypt::decrypt_with_passphrase(&container, &passphrase)
        .map_err(|e| e.with_context("failed to decrypt"))?;
    drop(passphrase);
    write_file_secure(output_path, &plaintext)
        .map_err(|e| e.with_context(format!("failed to write to {}", output_path.display())))?;
    Ok(())
}

/// Replace an encrypted file with new plaintext under the same passphrase
///
/// The existing container at `crypt_path` is decrypted first so that a
/// mistyped passphrase cannot silently re-key the file. The replacement is
/// written to a temporary file in the same directory, synced, and renamed
/// over the original, so readers see either the old or the new container.
pub fn update_file(
    plain_path: &Path,
    crypt_path: &Path,
    passphrase_reader: &mut dyn PassphraseReader,
) -> Result<()> {
    let existing = read_container(crypt_path)?;
    let mut passphrase_reader = CachingPassphraseReader::new(passphrase_reader);

    let passphrase = passphrase_reader.read_passphrase()?;
    secretcrypt::decrypt_with_passphrase(&existing, &passphrase)
        .map_err(|e| e.with_context("failed to decrypt"))?;
    drop(passphrase);

    let crypt_dir = match crypt_path.parent() {
        Some(dir) if !dir.as_os_str().is_empty() => dir,
        _ => Path::new("."),
    };
    let mut temp_file = tempfile::Builder::new()
        .prefix(".sealedsave-update")
        .tempfile_in(crypt_dir)
        .map_err(|e| io_failure("failed to create tempfile", e))?;

    let new_plaintext = fs::read(plain_path).map_err(|e| read_error(plain_path, e))?;
    let passphrase = passphrase_reader.read_passphrase()?;
    let new_container = secretcrypt::encrypt_with_passphrase(&new_plaintext, &passphrase)
        .map_err(|e| e.with_context("failed to encrypt"))?;

    temp_file
        .write_all(&new_container)
        .map_err(|e| io_failure("failed to write to tempfile", e))?;
    // Flush and fsync() such that the rename later, if it succeeds, will
    // always point to a valid file.
    temp_file
        .flush()
        .map_err(|e| io_failure("failed to flush tempfile", e))?;
    temp_file
        .as_file()
        .sync_all()
        .map_err(|e| io_failure("failed to sync file prior to rename", e))?;

    #[cfg(unix)]
    {
        use std::os::unix::fs::PermissionsExt;
        temp_file
            .as_file()
            .set_permissions(fs::Permissions::from_mode(0o600))
            .map_err(|e| io_failure("failed to set tempfile permissions", e))?;
    }

    temp_file.persist(crypt_path).map_err(|e| {
        SealedSaveError::with_kind_and_source(
            ErrorCategory::Internal,
            ErrorKind::Io,
            format!("failed to rename to target file {}", crypt_path.display()),
            e,
        )
    })?;
    tracing::debug!(path = %crypt_path.display(), "replaced container");
    Ok(())
}

/// Classify a file and report sizes without decrypting it.
pub fn inspect_file(path: &Path) -> Result<FileReport> {
    let data = fs::read(path).map_err(|e| read_error(path, e))?;
    let encrypted = sniff::looks_encrypted(&data);
    let counterpart_len = if encrypted {
        size::decrypted_size_for(data.len())
    } else {
        size::encrypted_size_for(data.len())
    };
    Ok(FileReport {
        encrypted,
        file_len: data.len(),
        counterpart_len,
    })
}

fn read_container(path: &Path) -> Result<Vec<u8>> {
    let data = fs::read(path).map_err(|e| read_error(path, e))?;
    if !sniff::looks_encrypted(&data) {
        return Err(SealedSaveError::with_kind(
            ErrorCategory::User,
            ErrorKind::NotEncrypted,
            format!("{} is not a sealedsave container", path.display()),
        ));
    }
    Ok(data)
}

/// Write file with secure permissions (0o600 on Unix)
fn write_file_secure(path: &Path, contents: &[u8]) -> Result<()> {
    #[cfg(unix)]
    let opened = {
        use std::os::unix::fs::OpenOptionsExt;

        fs::OpenOptions::new()
            .write(true)
            .create(true)
            .truncate(true)
            .mode(0o600)
            .open(path)
    };

    #[cfg(not(unix))]
    let opened = fs::OpenOptions::new()
        .write(true)
        .create(true)
        .truncate(true)
        .open(path);

    let mut file = opened.map_err(|e| {
        SealedSaveError::with_kind_and_source(
            ErrorCategory::User,
            ErrorKind::Io,
            format!("failed to open {}", path.display()),
            e,
        )
    })?;

    file.write_all(contents)
        .map_err(|e| io_failure(format!("failed to write {}", path.display()), e))
}

fn io_failure(msg: impl Into<String>, err: io::Error) -> SealedSaveError {
    SealedSaveError::with_kind_and_source(ErrorCategory::Internal, ErrorKind::Io, msg, err)
}

fn read_error(path: &Path, err: io::Error) -> SealedSaveError {
    let category = if err.kind() == io::ErrorKind::NotFound {
        ErrorCategory::User
    } else {
        ErrorCategory::Internal
    };
    SealedSaveError::with_kind_and_source(
        category,
        ErrorKind::Io,
        format!("failed to read from {}", path.display()),
        err,
    )
}
