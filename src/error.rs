//! Error types for the autosplitter

use thiserror::Error;

/// Result type for host-facing autosplitter operations
pub type Result<T> = std::result::Result<T, AutosplitterError>;

/// Errors surfaced to the embedding host
#[derive(Debug, Error)]
pub enum AutosplitterError {
    /// `start_monitoring` was called while the poll thread is already running
    #[error("monitoring is already running")]
    AlreadyRunning,

    /// The candidate process is not a supported Skyrim build
    #[error("unsupported game binary: main module image size {0} does not match Skyrim 1.9.32.0.8")]
    UnsupportedBinary(usize),

    /// The background polling thread could not be spawned
    #[error("failed to spawn the polling thread")]
    Spawn(#[source] std::io::Error),
}

/// Errors from a single process-memory read
///
/// All of these are non-fatal to the engine: a failed read leaves the
/// affected signal at its previous value for the current tick.
#[derive(Debug, Error, Clone, Copy, PartialEq, Eq)]
pub enum ReadError {
    /// The target process exited mid-read
    #[error("target process has exited")]
    ProcessExited,

    /// The resolved address is outside the target's mapped memory
    #[error("address is outside the target's mapped memory")]
    InvalidAddress,

    /// The pointer's base module is not loaded (process still initializing)
    #[error("base module is not loaded in the target process")]
    ModuleNotFound,
}
