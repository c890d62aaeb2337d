//! Archive strategy: export → deregister → import → verify.
//!
//! Export is non-destructive; a failure there simply reports. Deregister is
//! destructive and cannot be undone in place, so its ledger entry is the
//! recovery artifact: re-import the archive at the original location.

use std::path::Path;

use crate::constants::filenames;
use crate::errors::{MoveResult, ToolError, VerificationError};
use crate::relocate::ledger::Remedy;
use crate::relocate::phase::{Phase, PhaseOutcome, RunContext};
use crate::relocate::precheck;
use crate::relocate::state::RelocationPhase;

/// Ordered phase list for the archive strategy.
pub fn phases() -> Vec<Box<dyn Phase>> {
    vec![
        Box::new(ExportPhase),
        Box::new(DeregisterPhase),
        Box::new(ImportPhase),
        Box::new(VerifyImportPhase),
    ]
}

/// Serialize the instance to an archive in a run-scoped temp directory.
struct ExportPhase;

impl Phase for ExportPhase {
    fn name(&self) -> &'static str {
        "export"
    }

    fn phase(&self) -> RelocationPhase {
        RelocationPhase::Exporting
    }

    fn run(&self, ctx: &mut RunContext<'_>) -> MoveResult<PhaseOutcome> {
        let temp_dir = tempfile::Builder::new()
            .prefix(filenames::EXPORT_TMP_PREFIX)
            .tempdir()
            .map_err(|e| ToolError::fs("create temp dir", std::env::temp_dir(), e))?
            .into_path();
        ctx.state.archive_dir = Some(temp_dir.clone());

        let archive = temp_dir.join(format!(
            "{}.{}",
            ctx.request.instance,
            filenames::ARCHIVE_EXT
        ));

        ctx.manager.export(&ctx.request.instance, &archive)?;

        // Trust the exit signal only as far as it can be confirmed on disk.
        let non_empty = archive
            .metadata()
            .map(|meta| meta.len() > 0)
            .unwrap_or(false);
        if !non_empty {
            return Err(VerificationError::EmptyArchive { path: archive }.into());
        }

        tracing::info!(archive = %archive.display(), "export complete");
        ctx.state.archive_path = Some(archive);
        Ok(PhaseOutcome::Success)
    }
}

/// Remove the instance's registration at the old location.
struct DeregisterPhase;

impl Phase for DeregisterPhase {
    fn name(&self) -> &'static str {
        "deregister"
    }

    fn phase(&self) -> RelocationPhase {
        RelocationPhase::Deregistering
    }

    fn run(&self, ctx: &mut RunContext<'_>) -> MoveResult<PhaseOutcome> {
        let archive = ctx
            .state
            .archive_path
            .clone()
            .expect("export phase runs first");

        // First destructive action. The tool cannot re-register in place,
        // so the recorded remedy re-imports the archive at the original
        // location rather than undoing anything.
        ctx.state.ledger.push(Remedy::ReimportArchive {
            archive,
            instance: ctx.request.instance.clone(),
            location: ctx.request.source.clone(),
        })?;

        ctx.manager.unregister(&ctx.request.instance)?;
        tracing::info!(instance = %ctx.request.instance, "instance deregistered");
        Ok(PhaseOutcome::Success)
    }
}

/// Register the instance at the new storage location from the archive.
struct ImportPhase;

impl Phase for ImportPhase {
    fn name(&self) -> &'static str {
        "import"
    }

    fn phase(&self) -> RelocationPhase {
        RelocationPhase::Importing
    }

    fn run(&self, ctx: &mut RunContext<'_>) -> MoveResult<PhaseOutcome> {
        let archive = ctx
            .state
            .archive_path
            .clone()
            .expect("export phase runs first");

        ctx.manager
            .import(&ctx.request.instance, &ctx.request.target, &archive)?;

        tracing::info!(
            instance = %ctx.request.instance,
            target = %ctx.request.target.display(),
            "instance imported at new location"
        );
        Ok(PhaseOutcome::Success)
    }
}

/// Confirm the instance is visible and its data landed under the target.
struct VerifyImportPhase;

impl Phase for VerifyImportPhase {
    fn name(&self) -> &'static str {
        "verify import"
    }

    fn phase(&self) -> RelocationPhase {
        RelocationPhase::Verifying
    }

    fn run(&self, ctx: &mut RunContext<'_>) -> MoveResult<PhaseOutcome> {
        if !ctx.manager.is_registered(&ctx.request.instance)? {
            return Err(VerificationError::NotRegistered {
                name: ctx.request.instance.clone(),
            }
            .into());
        }

        if !precheck::has_data_file(&ctx.request.target) {
            return Err(VerificationError::NoDataAt {
                path: ctx.request.target.clone(),
            }
            .into());
        }

        tracing::info!("import verified");
        Ok(PhaseOutcome::Success)
    }
}

/// Delete the temp archive and its directory, best effort.
///
/// Runs regardless of the run's outcome and never fails it; errors are
/// logged only.
pub fn cleanup_temp(dir: &Path) {
    match std::fs::remove_dir_all(dir) {
        Ok(()) => tracing::debug!(dir = %dir.display(), "removed export temp dir"),
        Err(e) => tracing::warn!(dir = %dir.display(), error = %e, "failed to remove export temp dir"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cleanup_missing_dir_is_quiet() {
        // Returns unit: a cleanup failure cannot demote a successful run.
        cleanup_temp(Path::new("/nonexistent/wslmv-export-xyz"));
    }

    #[test]
    fn test_cleanup_removes_tree() {
        let temp = tempfile::TempDir::new().unwrap();
        let dir = temp.path().join("export");
        std::fs::create_dir(&dir).unwrap();
        std::fs::write(dir.join("Ubuntu.tar"), b"archive").unwrap();

        cleanup_temp(&dir);
        assert!(!dir.exists());
    }

    #[test]
    fn test_phase_order() {
        let names: Vec<_> = phases().iter().map(|p| p.name()).collect();
        assert_eq!(names, vec!["export", "deregister", "import", "verify import"]);
    }
}
