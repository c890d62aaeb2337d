//! Copy-relink strategy: copy → verify copy → back up → relink → verify.
//!
//! The copy is non-destructive. The rename-aside is the only true
//! destructive action and pushes its inverse first, so the relink failure
//! path reduces to a single ledger unwind. The copied destination data is
//! never deleted on rollback; a stray copy is harmless, deleting it is not.

use chrono::Utc;

use crate::errors::{MoveResult, ToolError, VerificationError};
use crate::relocate::ledger::Remedy;
use crate::relocate::phase::{Phase, PhaseOutcome, RunContext};
use crate::relocate::state::RelocationPhase;
use crate::storage;

/// Ordered phase list for the copy-relink strategy.
pub fn phases() -> Vec<Box<dyn Phase>> {
    vec![
        Box::new(CopyPhase),
        Box::new(VerifyCopyPhase),
        Box::new(BackupPhase),
        Box::new(RelinkPhase),
        Box::new(VerifyLinkPhase),
    ]
}

/// Recursively copy the source contents into the target.
struct CopyPhase;

impl Phase for CopyPhase {
    fn name(&self) -> &'static str {
        "copy"
    }

    fn phase(&self) -> RelocationPhase {
        RelocationPhase::Copying
    }

    fn run(&self, ctx: &mut RunContext<'_>) -> MoveResult<PhaseOutcome> {
        let created_target = !ctx.request.target.exists();

        if let Err(e) = storage::copy_dir_recursive(&ctx.request.source, &ctx.request.target) {
            // Only clean up what this run created; a pre-existing target
            // directory is not ours to delete.
            if created_target {
                storage::remove_dir_best_effort(&ctx.request.target);
            } else {
                tracing::warn!(
                    target = %ctx.request.target.display(),
                    "leaving pre-existing target directory with partial copy"
                );
            }
            return Err(e);
        }

        tracing::info!(
            source = %ctx.request.source.display(),
            target = %ctx.request.target.display(),
            "copy complete"
        );
        Ok(PhaseOutcome::Success)
    }
}

/// Presence check: every top-level source entry must exist at the target.
///
/// Deliberately not a hash comparison; see the design notes on content
/// verification.
struct VerifyCopyPhase;

impl Phase for VerifyCopyPhase {
    fn name(&self) -> &'static str {
        "verify copy"
    }

    fn phase(&self) -> RelocationPhase {
        RelocationPhase::Verifying
    }

    fn run(&self, ctx: &mut RunContext<'_>) -> MoveResult<PhaseOutcome> {
        let source_names = storage::top_level_names(&ctx.request.source)?;
        let target_names = storage::top_level_names(&ctx.request.target)?;

        let missing: Vec<_> = source_names.difference(&target_names).collect();
        if let Some(first) = missing.first() {
            return Err(VerificationError::MissingEntries {
                count: missing.len(),
                first: first.to_string_lossy().into_owned(),
            }
            .into());
        }

        tracing::info!(entries = source_names.len(), "copy verified");
        Ok(PhaseOutcome::Success)
    }
}

/// Rename the original directory to a timestamped sibling backup.
struct BackupPhase;

impl Phase for BackupPhase {
    fn name(&self) -> &'static str {
        "back up"
    }

    fn phase(&self) -> RelocationPhase {
        RelocationPhase::BackingUp
    }

    fn run(&self, ctx: &mut RunContext<'_>) -> MoveResult<PhaseOutcome> {
        let backup = backup_path_for(&ctx.request.source)?;

        // Inverse first, then the (atomic) forward rename.
        ctx.state.ledger.push(Remedy::RenameBack {
            from: backup.clone(),
            to: ctx.request.source.clone(),
        })?;
        storage::rename_dir(&ctx.request.source, &backup)?;

        tracing::info!(backup = %backup.display(), "original renamed aside");
        ctx.state.backup_path = Some(backup);
        Ok(PhaseOutcome::Success)
    }
}

/// Substitute a link at the original path pointing at the new location.
struct RelinkPhase;

impl Phase for RelinkPhase {
    fn name(&self) -> &'static str {
        "relink"
    }

    fn phase(&self) -> RelocationPhase {
        RelocationPhase::Relinking
    }

    fn run(&self, ctx: &mut RunContext<'_>) -> MoveResult<PhaseOutcome> {
        ctx.linker
            .make_link(&ctx.request.source, &ctx.request.target)
            .map_err(|e| ToolError::fs("symlink", &ctx.request.source, e))?;

        tracing::info!(
            link = %ctx.request.source.display(),
            target = %ctx.request.target.display(),
            "link substituted at original path"
        );
        Ok(PhaseOutcome::Success)
    }
}

/// Advisory: traversing the old path reaches the same number of files.
struct VerifyLinkPhase;

impl Phase for VerifyLinkPhase {
    fn name(&self) -> &'static str {
        "verify link"
    }

    fn phase(&self) -> RelocationPhase {
        RelocationPhase::Verifying
    }

    fn run(&self, ctx: &mut RunContext<'_>) -> MoveResult<PhaseOutcome> {
        let via_link = storage::count_files(&ctx.request.source)?;
        let at_target = storage::count_files(&ctx.request.target)?;

        if via_link != at_target {
            return Err(VerificationError::CountMismatch {
                via_link,
                at_target,
            }
            .into());
        }

        tracing::info!(files = via_link, "link verified");
        Ok(PhaseOutcome::Success)
    }
}

/// Timestamped sibling of the source, e.g. `/data/old.backup-20260806-114500`.
fn backup_path_for(source: &std::path::Path) -> MoveResult<std::path::PathBuf> {
    let name = source
        .file_name()
        .and_then(|n| n.to_str())
        .ok_or_else(|| {
            ToolError::fs(
                "backup name",
                source,
                std::io::Error::new(std::io::ErrorKind::InvalidInput, "source has no file name"),
            )
        })?;
    let stamp = Utc::now().format("%Y%m%d-%H%M%S");
    Ok(source.with_file_name(format!("{name}.backup-{stamp}")))
}
