//! Relocation request: the immutable input of one run.

use std::fmt;
use std::path::PathBuf;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::errors::PreconditionError;

/// How the instance storage is moved.
///
/// Both strategies share the same driver; they differ in which actions are
/// destructive and what rollback means.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Strategy {
    /// Export to an archive, deregister, re-import at the new location.
    Archive,
    /// Copy files verbatim, rename the original aside, substitute a link.
    CopyRelink,
}

impl Strategy {
    pub fn as_str(&self) -> &'static str {
        match self {
            Strategy::Archive => "archive",
            Strategy::CopyRelink => "copy-relink",
        }
    }

    /// The copy-relink strategy swaps directories at system paths and
    /// creates links there; it needs an elevated operator. Archive does not.
    pub fn requires_elevation(&self) -> bool {
        matches!(self, Strategy::CopyRelink)
    }
}

impl fmt::Display for Strategy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for Strategy {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "archive" => Ok(Strategy::Archive),
            "copy-relink" => Ok(Strategy::CopyRelink),
            other => Err(format!(
                "unknown strategy '{other}' (expected 'archive' or 'copy-relink')"
            )),
        }
    }
}

/// Immutable input of one relocation run.
///
/// All paths are explicit; the orchestrator carries no ambient
/// "current location" state.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RelocationRequest {
    /// Logical name of the instance being relocated.
    pub instance: String,
    /// Existing instance storage root.
    pub source: PathBuf,
    /// Destination storage root.
    pub target: PathBuf,
    pub strategy: Strategy,
    /// Free-space safety margin override, in bytes.
    ///
    /// When unset the margin is the observed source size, falling back to
    /// a fixed 20 GiB floor if the size cannot be computed.
    #[serde(default)]
    pub margin_bytes: Option<u64>,
}

impl RelocationRequest {
    pub fn new(
        instance: impl Into<String>,
        source: impl Into<PathBuf>,
        target: impl Into<PathBuf>,
        strategy: Strategy,
    ) -> Self {
        Self {
            instance: instance.into(),
            source: source.into(),
            target: target.into(),
            strategy,
            margin_bytes: None,
        }
    }

    /// Validate the request shape before any filesystem access.
    ///
    /// # Errors
    ///
    /// Returns [`PreconditionError::InvalidRequest`] if:
    /// - the instance name is empty
    /// - either path is relative
    /// - source and target are the same path
    /// - the target lies inside the source (a recursive copy trap)
    pub fn sanitize(&self) -> Result<(), PreconditionError> {
        if self.instance.trim().is_empty() {
            return Err(PreconditionError::InvalidRequest(
                "instance name must not be empty".into(),
            ));
        }

        if !self.source.is_absolute() || !self.target.is_absolute() {
            return Err(PreconditionError::InvalidRequest(format!(
                "source and target must be absolute paths (got {} and {})",
                self.source.display(),
                self.target.display()
            )));
        }

        // Component-wise comparison so `/data/old/` equals `/data/old`.
        if self.source.components().eq(self.target.components()) {
            return Err(PreconditionError::InvalidRequest(format!(
                "source and target are the same path: {}",
                self.source.display()
            )));
        }

        if self.target.starts_with(&self.source) {
            return Err(PreconditionError::InvalidRequest(format!(
                "target {} lies inside source {}",
                self.target.display(),
                self.source.display()
            )));
        }

        Ok(())
    }
}
