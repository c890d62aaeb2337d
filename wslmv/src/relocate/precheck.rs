//! Precondition verifier.
//!
//! Confirms the operation is safe to attempt before any destructive action.
//! Checks run in a fixed order and the first failure wins; nothing has
//! mutated at this point, so a failure here never involves rollback.

use std::path::Path;

use crate::constants::{instance, space};
use crate::errors::PreconditionError;
use crate::request::RelocationRequest;
use crate::storage::{self, SpaceProbe};

/// Reports whether the operator is elevated.
///
/// Seam for tests and embedders; the real probe asks the kernel.
pub trait Privileges: Send + Sync {
    fn is_elevated(&self) -> bool;
}

/// Real probe: effective UID 0.
#[derive(Debug, Default, Clone, Copy)]
pub struct EuidPrivileges;

impl Privileges for EuidPrivileges {
    #[cfg(unix)]
    fn is_elevated(&self) -> bool {
        nix::unistd::geteuid().is_root()
    }

    #[cfg(not(unix))]
    fn is_elevated(&self) -> bool {
        false
    }
}

/// What the verifier measured, for operator-facing summaries.
#[derive(Debug, Clone, serde::Serialize)]
pub struct PrecheckSummary {
    /// Observed source size; `None` when it could not be computed cheaply.
    pub source_bytes: Option<u64>,
    /// Safety margin the destination volume was held to.
    pub required_bytes: u64,
    /// Free bytes reported for the destination volume.
    pub free_bytes: u64,
}

/// Run all precondition checks for `request`, in order.
///
/// 1. elevation, when the strategy requires it
/// 2. source exists and holds a recognizable instance data file
/// 3. destination volume exists with free space above the safety margin
pub fn verify(
    request: &RelocationRequest,
    probe: &dyn SpaceProbe,
    privileges: &dyn Privileges,
) -> Result<PrecheckSummary, PreconditionError> {
    if request.strategy.requires_elevation() && !privileges.is_elevated() {
        return Err(PreconditionError::NotElevated {
            strategy: request.strategy.as_str(),
        });
    }

    if !request.source.is_dir() {
        return Err(PreconditionError::MissingSource {
            path: request.source.clone(),
        });
    }
    if !has_data_file(&request.source) {
        return Err(PreconditionError::NoDataFile {
            path: request.source.clone(),
            expected: instance::DATA_FILE_EXTENSIONS.join(", "),
        });
    }

    let source_bytes = match storage::dir_size(&request.source) {
        Ok(size) => Some(size),
        Err(e) => {
            tracing::warn!(
                source = %request.source.display(),
                error = %e,
                "could not size source, applying fixed safety floor"
            );
            None
        }
    };

    let required_bytes = request
        .margin_bytes
        .or(source_bytes)
        .unwrap_or(space::FALLBACK_MARGIN_BYTES);

    // The target may not exist yet; the volume is resolved from its
    // nearest existing ancestor.
    let anchor = nearest_existing_ancestor(&request.target);
    let free_bytes = anchor
        .and_then(|p| probe.free_space(p))
        .ok_or_else(|| PreconditionError::UnknownVolume {
            path: request.target.clone(),
        })?;

    if free_bytes < required_bytes {
        return Err(PreconditionError::InsufficientSpace {
            path: request.target.clone(),
            free: free_bytes,
            required: required_bytes,
        });
    }

    tracing::info!(
        source_bytes = ?source_bytes,
        required_bytes,
        free_bytes,
        "preconditions satisfied"
    );

    Ok(PrecheckSummary {
        source_bytes,
        required_bytes,
        free_bytes,
    })
}

/// At least one top-level entry with a recognized disk-image extension.
pub fn has_data_file(root: &Path) -> bool {
    let Ok(entries) = std::fs::read_dir(root) else {
        return false;
    };
    entries.filter_map(Result::ok).any(|entry| {
        let path = entry.path();
        path.is_file()
            && path
                .extension()
                .and_then(|ext| ext.to_str())
                .is_some_and(|ext| {
                    instance::DATA_FILE_EXTENSIONS
                        .iter()
                        .any(|known| ext.eq_ignore_ascii_case(known))
                })
    })
}

fn nearest_existing_ancestor(path: &Path) -> Option<&Path> {
    path.ancestors().find(|candidate| candidate.exists())
}
