//! CLI integration tests
//!
//! Tests the command-line interface end-to-end.

use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};
use std::process::{Command, Output, Stdio};

use tempfile::TempDir;

use sealedsave::EXTRA_LEN;

/// Run sealedsave with the passphrase fed through stdin
fn run_with_passphrase(args: &[&str], passphrase: &str) -> Output {
    let mut child = Command::new(env!("CARGO_BIN_EXE_sealedsave"))
        .arg("--passphrase-stdin")
        .args(args)
        .stdin(Stdio::piped())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .spawn()
        .expect("failed to spawn sealedsave");

    if let Some(mut stdin) = child.stdin.take() {
        // Ignore BrokenPipe errors - the command may exit before reading stdin
        // if it encounters an error (e.g., file not found)
        let _ = stdin.write_all(passphrase.as_bytes());
    }

    child.wait_with_output().expect("failed to wait for sealedsave")
}

fn run_without_passphrase(args: &[&str]) -> Output {
    Command::new(env!("CARGO_BIN_EXE_sealedsave"))
        .args(args)
        .stdin(Stdio::null())
        .output()
        .expect("failed to run sealedsave")
}

fn assert_success(output: &Output, what: &str) {
    assert!(
        output.status.success(),
        "{} failed: {}",
        what,
        String::from_utf8_lossy(&output.stderr)
    );
}

fn path_str(path: &Path) -> &str {
    path.to_str().expect("temp paths are UTF-8")
}

fn testdata_path(filename: &str) -> PathBuf {
    let mut path = PathBuf::from(env!("CARGO_MANIFEST_DIR"));
    path.push("testdata");
    path.push(filename);
    path
}

fn encrypt(input: &Path, output: &Path, passphrase: &str) -> Output {
    run_with_passphrase(
        &["encrypt", "-i", path_str(input), "-o", path_str(output)],
        passphrase,
    )
}

fn decrypt(input: &Path, output: &Path, passphrase: &str) -> Output {
    run_with_passphrase(
        &["decrypt", "-i", path_str(input), "-o", path_str(output)],
        passphrase,
    )
}

#[test]
fn test_decrypt_known_container() {
    let temp_dir = TempDir::new().unwrap();
    let output = temp_dir.path().join("hello-decrypted.txt");

    let result = decrypt(&testdata_path("hello.txt.sealed"), &output, "test");
    assert_success(&result, "decrypt");

    let decrypted = fs::read(&output).unwrap();
    let expected = fs::read(testdata_path("hello.txt")).unwrap();
    assert_eq!(decrypted, expected);
}

#[test]
fn test_encrypt_decrypt_roundtrip() {
    let temp_dir = TempDir::new().unwrap();
    let plaintext_path = testdata_path("hello.txt");
    let encrypted_path = temp_dir.path().join("hello.txt.sealed");
    let decrypted_path = temp_dir.path().join("hello-decrypted.txt");

    assert_success(&encrypt(&plaintext_path, &encrypted_path, "test"), "encrypt");

    let original = fs::read(&plaintext_path).unwrap();
    let container = fs::read(&encrypted_path).unwrap();
    assert_eq!(container.len(), EXTRA_LEN + original.len());
    assert_eq!(&container[..2], &[0x16, 0x6C]);

    assert_success(&decrypt(&encrypted_path, &decrypted_path, "test"), "decrypt");
    assert_eq!(fs::read(&decrypted_path).unwrap(), original);
}

#[test]
fn test_decrypt_wrong_passphrase_fails() {
    let temp_dir = TempDir::new().unwrap();
    let output = temp_dir.path().join("out.txt");

    let result = decrypt(&testdata_path("hello.txt.sealed"), &output, "wrongPassword");

    assert!(!result.status.success());
    let stderr = String::from_utf8_lossy(&result.stderr);
    assert!(
        stderr.contains("wrong passphrase"),
        "Expected authentication failure message, got: {}",
        stderr
    );
    assert!(!output.exists());
}

#[test]
fn test_update_operation() {
    let temp_dir = TempDir::new().unwrap();
    let plaintext1 = temp_dir.path().join("plaintext1.txt");
    let plaintext2 = temp_dir.path().join("plaintext2.txt");
    let encrypted = temp_dir.path().join("profile.sealed");
    let decrypted = temp_dir.path().join("decrypted.txt");

    fs::write(&plaintext1, "Original content").unwrap();
    assert_success(&encrypt(&plaintext1, &encrypted, "test"), "encrypt");

    fs::write(&plaintext2, "Updated content").unwrap();
    let result = run_with_passphrase(
        &["update", "-i", path_str(&plaintext2), "-o", path_str(&encrypted)],
        "test",
    );
    assert_success(&result, "update");

    assert_success(&decrypt(&encrypted, &decrypted, "test"), "decrypt");
    assert_eq!(fs::read_to_string(&decrypted).unwrap(), "Updated content");
}

#[test]
fn test_update_with_wrong_passphrase_fails() {
    let temp_dir = TempDir::new().unwrap();
    let plaintext1 = temp_dir.path().join("plaintext1.txt");
    let plaintext2 = temp_dir.path().join("plaintext2.txt");
    let encrypted = temp_dir.path().join("profile.sealed");

    fs::write(&plaintext1, "Original").unwrap();
    assert_success(&encrypt(&plaintext1, &encrypted, "correct_password"), "encrypt");
    let before = fs::read(&encrypted).unwrap();

    fs::write(&plaintext2, "Updated").unwrap();
    let result = run_with_passphrase(
        &["update", "-i", path_str(&plaintext2), "-o", path_str(&encrypted)],
        "wrong_password",
    );

    assert!(!result.status.success());
    let stderr = String::from_utf8_lossy(&result.stderr);
    assert!(
        stderr.contains("failed to decrypt"),
        "Expected error message about decryption, got: {}",
        stderr
    );
    assert_eq!(fs::read(&encrypted).unwrap(), before);
}

#[test]
fn test_decrypt_plain_file_fails() {
    let temp_dir = TempDir::new().unwrap();
    let output = temp_dir.path().join("out.txt");

    let result = decrypt(&testdata_path("hello.txt"), &output, "test");

    assert!(!result.status.success());
    let stderr = String::from_utf8_lossy(&result.stderr);
    assert!(
        stderr.contains("not a sealedsave container"),
        "Expected not-a-container message, got: {}",
        stderr
    );
}

#[test]
fn test_decrypt_nonexistent_file_fails() {
    let temp_dir = TempDir::new().unwrap();
    let nonexistent = temp_dir.path().join("nonexistent.sealed");
    let output = temp_dir.path().join("output.txt");

    let result = decrypt(&nonexistent, &output, "test");

    assert!(!result.status.success());
    assert!(!output.exists());
}

#[test]
fn test_inspect() {
    let result = run_without_passphrase(&["inspect", path_str(&testdata_path("hello.txt.sealed"))]);
    assert_success(&result, "inspect");
    let stdout = String::from_utf8_lossy(&result.stdout);
    assert!(stdout.contains("encrypted: yes"), "got: {}", stdout);
    assert!(stdout.contains("plaintext bytes: 35"), "got: {}", stdout);

    let result = run_without_passphrase(&["inspect", path_str(&testdata_path("hello.txt"))]);
    assert_success(&result, "inspect");
    let stdout = String::from_utf8_lossy(&result.stdout);
    assert!(stdout.contains("encrypted: no"), "got: {}", stdout);
    assert!(
        stdout.contains(&format!("container bytes once encrypted: {}", EXTRA_LEN + 35)),
        "got: {}",
        stdout
    );
}

#[test]
fn test_sizes() {
    let result = run_without_passphrase(&["sizes", "--plaintext-len", "16"]);
    assert_success(&result, "sizes");
    let stdout = String::from_utf8_lossy(&result.stdout);
    assert!(stdout.contains(&format!("extra: {}", EXTRA_LEN)), "got: {}", stdout);
    assert!(
        stdout.contains(&format!("container for 16 bytes: {}", EXTRA_LEN + 16)),
        "got: {}",
        stdout
    );
}

#[test]
fn test_sizes_overflow_fails() {
    let len = usize::MAX.to_string();
    let result = run_without_passphrase(&["sizes", "--plaintext-len", &len]);

    assert!(!result.status.success());
    let stderr = String::from_utf8_lossy(&result.stderr);
    assert!(
        stderr.contains("exceed the addressable size"),
        "Expected size overflow message, got: {}",
        stderr
    );
    assert!(result.stdout.is_empty());
}

#[test]
fn test_empty_file_roundtrip() {
    let temp_dir = TempDir::new().unwrap();
    let plaintext = temp_dir.path().join("empty.txt");
    let encrypted = temp_dir.path().join("empty.sealed");
    let decrypted = temp_dir.path().join("empty-decrypted.txt");

    fs::write(&plaintext, b"").unwrap();

    assert_success(&encrypt(&plaintext, &encrypted, "test"), "encrypt");
    assert_eq!(fs::read(&encrypted).unwrap().len(), EXTRA_LEN);
    assert_success(&decrypt(&encrypted, &decrypted, "test"), "decrypt");
    assert_eq!(fs::read(&decrypted).unwrap(), b"");
}

#[test]
fn test_large_file_roundtrip() {
    let temp_dir = TempDir::new().unwrap();
    let plaintext = temp_dir.path().join("large.bin");
    let encrypted = temp_dir.path().join("large.sealed");
    let decrypted = temp_dir.path().join("large-decrypted.bin");

    let large_content = vec![0x42u8; 1024 * 1024];
    fs::write(&plaintext, &large_content).unwrap();

    assert_success(&encrypt(&plaintext, &encrypted, "test"), "encrypt");
    assert_success(&decrypt(&encrypted, &decrypted, "test"), "decrypt");
    assert_eq!(fs::read(&decrypted).unwrap(), large_content);
}
