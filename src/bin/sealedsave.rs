//! sealedsave CLI - passphrase-protected profile containers
//!
//! Command-line interface for encrypting, decrypting and inspecting
//! containers sealed with NaCl secretbox (XSalsa20Poly1305) under a
//! Argon2id-derived key.

use std::path::PathBuf;
use std::process;

use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

use sealedsave::file_ops;
use sealedsave::passphrase::{PassphraseReader, ReaderPassphraseReader, TerminalPassphraseReader};
use sealedsave::size;

#[derive(Parser)]
#[command(name = "sealedsave")]
#[command(version)]
#[command(about = "Passphrase-protected profile containers.", long_about = None)]
struct Cli {
    /// Read passphrase from stdin instead of from terminal
    #[arg(long, global = true)]
    passphrase_stdin: bool,

    /// Log debug output to stderr (RUST_LOG takes precedence)
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Encrypt a file
    #[command(alias = "e")]
    Encrypt {
        /// Path to the file whose contents is to be encrypted
        #[arg(short, long, value_name = "FILE")]
        input: PathBuf,

        /// Path to the file to write the container to
        #[arg(short, long, value_name = "FILE")]
        output: PathBuf,
    },

    /// Decrypt a file
    #[command(alias = "d")]
    Decrypt {
        /// Path to the container to decrypt
        #[arg(short, long, value_name = "FILE")]
        input: PathBuf,

        /// Path to the file to write the plaintext to
        #[arg(short, long, value_name = "FILE")]
        output: PathBuf,
    },

    /// Update a container with new content, while validating
    /// that the passphrase is not accidentally changed.
    #[command(alias = "u")]
    Update {
        /// Path to the file whose contents is to be encrypted
        #[arg(short, long, value_name = "FILE")]
        input: PathBuf,

        /// Path to the existing container to replace
        #[arg(short, long, value_name = "FILE")]
        output: PathBuf,
    },

    /// Report whether a file is a container, without decrypting it
    #[command(alias = "i")]
    Inspect {
        /// Path to the file to inspect
        #[arg(value_name = "FILE")]
        input: PathBuf,
    },

    /// Print the format's fixed sizes
    Sizes {
        /// Also print the container size for a plaintext of this many bytes
        #[arg(long, value_name = "BYTES")]
        plaintext_len: Option<usize>,
    },
}

fn main() {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    let result = match cli.command {
        Commands::Encrypt { input, output } => {
            let mut reader = get_passphrase_reader(cli.passphrase_stdin);
            file_ops::encrypt_file(&input, &output, &mut *reader)
        }
        Commands::Decrypt { input, output } => {
            let mut reader = get_passphrase_reader(cli.passphrase_stdin);
            file_ops::decrypt_file(&input, &output, &mut *reader)
        }
        Commands::Update { input, output } => {
            let mut reader = get_passphrase_reader(cli.passphrase_stdin);
            file_ops::update_file(&input, &output, &mut *reader)
        }
        Commands::Inspect { input } => file_ops::inspect_file(&input).map(|report| {
            if report.encrypted {
                println!("encrypted: yes");
                println!("container bytes: {}", report.file_len);
                match report.counterpart_len {
                    Some(len) => println!("plaintext bytes: {}", len),
                    None => println!("plaintext bytes: unknown (truncated container)"),
                }
            } else {
                println!("encrypted: no");
                println!("plaintext bytes: {}", report.file_len);
                if let Some(len) = report.counterpart_len {
                    println!("container bytes once encrypted: {}", len);
                }
            }
        }),
        Commands::Sizes { plaintext_len } => plaintext_len
            .map(|len| {
                size::encrypted_size_for(len)
                    .map(|container_len| (len, container_len))
                    .ok_or_else(|| size::size_overflow(len))
            })
            .transpose()
            .map(|container| {
                println!("magic: {}", size::MAGIC_LEN);
                println!("salt: {}", size::SALT_LEN);
                println!("key: {}", size::KEY_LEN);
                println!("nonce: {}", size::NONCE_LEN);
                println!("mac: {}", size::MAC_LEN);
                println!("extra: {}", size::EXTRA_LEN);
                if let Some((len, container_len)) = container {
                    println!("container for {} bytes: {}", len, container_len);
                }
            }),
    };

    if let Err(e) = result {
        eprintln!("Error: {}", render_error(&e));
        process::exit(1);
    }
}

fn init_logging(verbose: bool) {
    let default_level = if verbose { "debug" } else { "warn" };
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();
}

/// Joins the error and its chain of sources into one line.
fn render_error(err: &(dyn std::error::Error + 'static)) -> String {
    let mut rendered = err.to_string();
    let mut source = err.source();
    while let Some(cause) = source {
        rendered.push_str(": ");
        rendered.push_str(&cause.to_string());
        source = cause.source();
    }
    rendered
}

fn get_passphrase_reader(use_stdin: bool) -> Box<dyn PassphraseReader> {
    if use_stdin {
        Box::new(ReaderPassphraseReader::new(std::io::stdin()))
    } else {
        Box::new(TerminalPassphraseReader)
    }
}
