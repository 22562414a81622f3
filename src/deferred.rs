//! Running blocking operations off the calling thread
//!
//! Every operation in this crate is synchronous. Callers that cannot block
//! (a UI thread, an event loop) wrap any of them here instead of each
//! operation growing its own asynchronous twin:
//!
//! ```no_run
//! use sealedsave::deferred::Deferred;
//! use sealedsave::secretcrypt;
//!
//! let pending = Deferred::spawn(|| secretcrypt::encrypt_with_passphrase(b"profile", b"pw"))?;
//! // ... do other work ...
//! let container = pending.wait()?;
//! # Ok::<(), sealedsave::error::SealedSaveError>(())
//! ```
//!
//! There is no cancellation. A caller that gives up simply drops the handle;
//! the operation still runs to completion and its result is discarded.

use std::panic::{self, AssertUnwindSafe};
use std::thread::{self, JoinHandle};

use crate::error::{ErrorCategory, ErrorKind, Result, SealedSaveError};

const THREAD_NAME: &str = "sealedsave-deferred";

/// Handle to an operation running on a background thread.
pub struct Deferred<T> {
    handle: JoinHandle<Result<T>>,
}

impl<T: Send + 'static> Deferred<T> {
    /// Start `op` on a new thread.
    pub fn spawn<F>(op: F) -> Result<Self>
    where
        F: FnOnce() -> Result<T> + Send + 'static,
    {
        let handle = spawn_named(move || run_guarded(op))?;
        Ok(Self { handle })
    }

    /// Whether the operation has finished and `wait` will not block.
    pub fn is_finished(&self) -> bool {
        self.handle.is_finished()
    }

    /// Block until the operation completes and return its result.
    pub fn wait(self) -> Result<T> {
        self.handle.join().map_err(|_| panicked())?
    }
}

/// Run `op` on a new thread and pass its result to `callback` on that same
/// thread.
pub fn with_callback<T, F, C>(op: F, callback: C) -> Result<()>
where
    T: Send + 'static,
    F: FnOnce() -> Result<T> + Send + 'static,
    C: FnOnce(Result<T>) + Send + 'static,
{
    spawn_named(move || callback(run_guarded(op)))?;
    Ok(())
}

fn spawn_named<R, F>(f: F) -> Result<JoinHandle<R>>
where
    R: Send + 'static,
    F: FnOnce() -> R + Send + 'static,
{
    tracing::debug!("spawning deferred operation");
    thread::Builder::new()
        .name(THREAD_NAME.to_string())
        .spawn(f)
        .map_err(|e| {
            SealedSaveError::with_kind_and_source(
                ErrorCategory::Internal,
                ErrorKind::Io,
                "failed to spawn worker thread",
                e,
            )
        })
}

fn run_guarded<T, F>(op: F) -> Result<T>
where
    F: FnOnce() -> Result<T>,
{
    panic::catch_unwind(AssertUnwindSafe(op)).unwrap_or_else(|_| Err(panicked()))
}

fn panicked() -> SealedSaveError {
    SealedSaveError::with_kind(
        ErrorCategory::Internal,
        ErrorKind::InternalInvariant,
        "deferred operation panicked",
    )
}
