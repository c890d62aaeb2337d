//! Error types for relocation runs.
//!
//! Errors are categorized by rollback policy:
//! - [`PreconditionError`]: nothing has mutated yet; never triggers rollback
//! - [`ToolError`]: an external call failed; rollback iff the ledger is non-empty
//! - [`VerificationError`]: a post-action check failed even though the action
//!   reported success; same rollback policy as [`ToolError`]

use std::io;
use std::path::PathBuf;

use thiserror::Error;

pub type MoveResult<T> = Result<T, MoveError>;

// ============================================================================
// Top-Level Error
// ============================================================================

/// Errors that can occur during a relocation run.
///
/// The sub-enums group failures by what the driver must do next:
/// ```ignore
/// match relocator.run() {
///     Err(MoveError::Precondition(_)) => { /* nothing mutated, just report */ }
///     Err(MoveError::Tool(_)) => { /* ledger was unwound if non-empty */ }
///     Err(MoveError::Verification(_)) => { /* same as Tool */ }
///     _ => {}
/// }
/// ```
#[derive(Debug, Error)]
pub enum MoveError {
    /// A safety check failed before any destructive action.
    #[error("precondition: {0}")]
    Precondition(#[from] PreconditionError),

    /// The external instance manager or a filesystem call failed.
    #[error("tool: {0}")]
    Tool(#[from] ToolError),

    /// A post-action check failed; the system state cannot be trusted.
    #[error("verification: {0}")]
    Verification(#[from] VerificationError),

    /// The run was interrupted by SIGINT/SIGTERM between phases.
    #[error("interrupted by signal")]
    Interrupted,

    /// Another relocation run already holds the lock for this instance.
    #[error("another relocation is already running for instance '{0}'")]
    Locked(String),

    /// Generic IO error (catch-all).
    #[error("io: {0}")]
    Io(#[from] io::Error),
}

impl MoveError {
    /// Whether this failure class unwinds the rollback ledger.
    ///
    /// Precondition failures never do (nothing has mutated). Tool and
    /// verification failures do, as does an interrupt that lands after a
    /// destructive action was recorded.
    pub fn triggers_rollback(&self) -> bool {
        matches!(
            self,
            MoveError::Tool(_) | MoveError::Verification(_) | MoveError::Interrupted
        )
    }
}

// ============================================================================
// Precondition Errors (space, privileges, missing source)
// ============================================================================

/// A safety check rejected the run before anything was touched.
#[derive(Debug, Error)]
pub enum PreconditionError {
    /// The request itself is malformed (same path, relative path, nesting).
    #[error("invalid request: {0}")]
    InvalidRequest(String),

    /// Source storage root is missing or not a directory.
    #[error("source {path} does not exist or is not a directory")]
    MissingSource { path: PathBuf },

    /// Source exists but holds no recognizable instance data file.
    #[error("no instance data file under {path} (expected an extension in [{expected}])")]
    NoDataFile { path: PathBuf, expected: String },

    /// The strategy needs elevated privileges and the operator has none.
    #[error("the {strategy} strategy requires elevated privileges")]
    NotElevated { strategy: &'static str },

    /// No mounted volume could be resolved for the destination path.
    #[error("no volume found for destination {path}")]
    UnknownVolume { path: PathBuf },

    /// Destination volume reports less free space than the safety margin.
    #[error("insufficient space on volume of {path}: {free} bytes free, {required} required")]
    InsufficientSpace {
        path: PathBuf,
        free: u64,
        required: u64,
    },
}

// ============================================================================
// Tool Errors (instance manager / filesystem invocations)
// ============================================================================

/// An external call returned failure.
#[derive(Debug, Error)]
pub enum ToolError {
    /// The manager binary could not be launched at all.
    #[error("failed to launch {tool}: {source}")]
    Spawn {
        tool: String,
        #[source]
        source: io::Error,
    },

    /// The manager ran but exited non-zero.
    #[error("{tool} {operation} failed ({status}): {stderr}")]
    CommandFailed {
        tool: String,
        operation: &'static str,
        status: String,
        stderr: String,
    },

    /// A filesystem primitive (copy, rename, symlink, delete) failed.
    #[error("{operation} {path}: {source}")]
    Fs {
        operation: &'static str,
        path: PathBuf,
        #[source]
        source: io::Error,
    },
}

impl ToolError {
    /// Create a filesystem error.
    pub fn fs(operation: &'static str, path: impl Into<PathBuf>, source: io::Error) -> Self {
        Self::Fs {
            operation,
            path: path.into(),
            source,
        }
    }
}

// ============================================================================
// Verification Errors (post-action checks)
// ============================================================================

/// A check after a successful-looking action found the result untrustworthy.
#[derive(Debug, Error)]
pub enum VerificationError {
    /// Export reported success but the archive is missing or empty.
    #[error("archive {path} is missing or empty after export")]
    EmptyArchive { path: PathBuf },

    /// The instance is absent from the manager's listing.
    #[error("instance '{name}' not present in manager listing")]
    NotRegistered { name: String },

    /// No recognizable data file is visible under the given root.
    #[error("no instance data file visible under {path}")]
    NoDataAt { path: PathBuf },

    /// The destination is missing entries that are present at the source.
    #[error("destination is missing {count} source entries (first: {first})")]
    MissingEntries { count: usize, first: String },

    /// Traversing the source link yields a different file count than the target.
    #[error("entry count mismatch: {via_link} reachable via link, {at_target} at target")]
    CountMismatch { via_link: usize, at_target: usize },
}
