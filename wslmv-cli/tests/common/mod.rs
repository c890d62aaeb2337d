#![allow(dead_code)]

use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use assert_cmd::Command;
use tempfile::TempDir;

/// Per-test sandbox: seeded source dir, stub manager script, isolated HOME.
pub struct TestContext {
    pub temp: TempDir,
    pub source: PathBuf,
    pub target: PathBuf,
    stub: PathBuf,
    state: PathBuf,
}

impl TestContext {
    pub fn new() -> Self {
        let temp = TempDir::new().unwrap();

        let source = temp.path().join("old");
        fs::create_dir(&source).unwrap();
        fs::write(source.join("ext4.vhdx"), b"disk image bytes").unwrap();

        let target = temp.path().join("new");

        let state = temp.path().join("stub-state");
        fs::create_dir(&state).unwrap();
        fs::write(state.join("registered"), "Ubuntu\n").unwrap();

        let stub = write_stub_manager(temp.path(), &state);

        Self {
            temp,
            source,
            target,
            stub,
            state,
        }
    }

    /// A command wired to the stub manager, with HOME inside the sandbox so
    /// lock files and ledger mirrors stay isolated per test.
    pub fn cmd(&self) -> Command {
        let mut cmd = Command::new(env!("CARGO_BIN_EXE_wslmv"));
        cmd.timeout(Duration::from_secs(60));
        cmd.env("WSLMV_MANAGER", &self.stub);
        cmd.env("HOME", self.temp.path());
        cmd
    }

    /// Instance names currently known to the stub registry.
    pub fn registered(&self) -> Vec<String> {
        fs::read_to_string(self.state.join("registered"))
            .unwrap_or_default()
            .lines()
            .filter(|line| !line.is_empty())
            .map(str::to_string)
            .collect()
    }
}

/// Shell script standing in for the external instance manager.
///
/// Maintains a one-name-per-line registry file and produces real file
/// effects for export/import, which is all the orchestrator observes.
fn write_stub_manager(dir: &Path, state: &Path) -> PathBuf {
    let script = format!(
        r#"#!/bin/sh
REG="{state}/registered"
case "$1" in
  --shutdown)
    exit 0
    ;;
  --list)
    [ -f "$REG" ] && cat "$REG"
    exit 0
    ;;
  --export)
    grep -qx "$2" "$REG" 2>/dev/null || {{ echo "no such distribution" >&2; exit 1; }}
    printf 'stub-archive:%s' "$2" > "$3"
    ;;
  --unregister)
    grep -qx "$2" "$REG" 2>/dev/null || {{ echo "no such distribution" >&2; exit 1; }}
    grep -vx "$2" "$REG" > "$REG.tmp" || true
    mv "$REG.tmp" "$REG"
    ;;
  --import)
    grep -qx "$2" "$REG" 2>/dev/null && {{ echo "already registered" >&2; exit 1; }}
    [ -s "$4" ] || {{ echo "archive missing or empty" >&2; exit 1; }}
    mkdir -p "$3"
    cp "$4" "$3/ext4.vhdx"
    echo "$2" >> "$REG"
    ;;
  *)
    echo "unknown operation: $1" >&2
    exit 1
    ;;
esac
"#,
        state = state.display()
    );

    let path = dir.join("stub-manager.sh");
    fs::write(&path, script).unwrap();

    #[cfg(unix)]
    {
        use std::os::unix::fs::PermissionsExt;
        fs::set_permissions(&path, fs::Permissions::from_mode(0o755)).unwrap();
    }

    path
}
