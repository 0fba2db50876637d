//! Platform-specific helpers.
//!
//! Path expansion for user-supplied paths, program lookup on `PATH`, default data
//! directories, and spawning processes that outlive the launcher.

use anyhow::{Context, Result};
use std::ffi::OsStr;
use std::path::{Path, PathBuf};
use std::process::{Command, Stdio};

/// `true` when compiled for Windows.
#[must_use]
pub const fn is_windows() -> bool {
    cfg!(windows)
}

/// The current user's home directory.
pub fn get_home_dir() -> Result<PathBuf> {
    dirs::home_dir().ok_or_else(|| {
        let platform_help = if is_windows() {
            "On Windows: Check that the USERPROFILE environment variable is set"
        } else {
            "On Unix/Linux: Check that the HOME environment variable is set"
        };
        anyhow::anyhow!("Could not determine home directory.\n\n{platform_help}")
    })
}

/// Default directory for launcher state (skip marker, caches, catalog).
///
/// `%LOCALAPPDATA%\launchpad` on Windows, `$XDG_DATA_HOME/launchpad` (or the platform
/// equivalent) elsewhere.
pub fn get_data_dir() -> Result<PathBuf> {
    let base = if is_windows() {
        dirs::data_local_dir()
    } else {
        dirs::data_dir()
    };
    base.map(|p| p.join("launchpad")).ok_or_else(|| {
        let platform_help = if is_windows() {
            "On Windows: Check that the LOCALAPPDATA environment variable is set"
        } else if cfg!(target_os = "macos") {
            "On macOS: Check that the HOME environment variable is set"
        } else {
            "On Linux: Check that the XDG_DATA_HOME or HOME environment variable is set"
        };
        anyhow::anyhow!("Could not determine data directory.\n\n{platform_help}")
    })
}

/// Expand `~` and environment variables (`$VAR`, `${VAR}`) in a user-supplied path.
pub fn resolve_path(path: &str) -> Result<PathBuf> {
    let expanded = shellexpand::full(path).with_context(|| {
        let platform_vars = if is_windows() {
            "Common Windows variables: $USERPROFILE, $LOCALAPPDATA, $TEMP"
        } else {
            "Common Unix variables: $HOME, $USER, $TMPDIR"
        };
        format!(
            "Failed to expand path: {path}\n\n\
            Check for undefined environment variables (use $VAR or ${{VAR}}).\n\
            {platform_vars}"
        )
    })?;
    Ok(PathBuf::from(expanded.into_owned()))
}

/// Resolve a program for launching.
///
/// Paths containing a separator are returned as-is; bare names are looked up on
/// `PATH` and fall back to the name itself if not found.
#[must_use]
pub fn resolve_program(program: &Path) -> PathBuf {
    if program.components().count() > 1 || program.is_absolute() {
        return program.to_path_buf();
    }
    which::which(program).unwrap_or_else(|_| program.to_path_buf())
}

/// Spawn `program` with `args` so that it keeps running after this process exits.
///
/// On Windows the child gets its own process group and no console. On Unix it is
/// moved into a new process group. Standard streams are detached in both cases.
/// The child is not waited on.
pub fn spawn_detached<I, S>(program: &Path, args: I) -> std::io::Result<u32>
where
    I: IntoIterator<Item = S>,
    S: AsRef<OsStr>,
{
    let mut command = Command::new(program);
    command.args(args).stdin(Stdio::null()).stdout(Stdio::null()).stderr(Stdio::null());

    if let Some(dir) = program.parent()
        && !dir.as_os_str().is_empty()
        && dir.is_dir()
    {
        command.current_dir(dir);
    }

    #[cfg(windows)]
    {
        use std::os::windows::process::CommandExt;
        const DETACHED_PROCESS: u32 = 0x0000_0008;
        const CREATE_NEW_PROCESS_GROUP: u32 = 0x0000_0200;
        command.creation_flags(DETACHED_PROCESS | CREATE_NEW_PROCESS_GROUP);
    }

    #[cfg(unix)]
    {
        use std::os::unix::process::CommandExt;
        command.process_group(0);
    }

    let child = command.spawn()?;
    Ok(child.id())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_resolve_path_expands_home() {
        let home = get_home_dir().unwrap();
        let resolved = resolve_path("~/launchpad/config.toml").unwrap();
        assert_eq!(resolved, home.join("launchpad/config.toml"));
    }

    #[test]
    fn test_resolve_path_plain() {
        assert_eq!(resolve_path("relative/file").unwrap(), PathBuf::from("relative/file"));
    }

    #[test]
    fn test_resolve_path_undefined_var() {
        let err = resolve_path("$LAUNCHPAD_SURELY_UNDEFINED_VAR/x").unwrap_err();
        assert!(err.to_string().contains("Failed to expand path"));
    }

    #[test]
    fn test_resolve_program_keeps_paths() {
        let path = Path::new("/opt/tools/app");
        assert_eq!(resolve_program(path), PathBuf::from("/opt/tools/app"));
        let missing = Path::new("definitely-not-a-real-program-xyz");
        assert_eq!(resolve_program(missing), PathBuf::from("definitely-not-a-real-program-xyz"));
    }

    #[test]
    fn test_data_dir_is_namespaced() {
        if let Ok(dir) = get_data_dir() {
            assert!(dir.ends_with("launchpad"));
        }
    }

    #[test]
    fn test_spawn_missing_program_fails() {
        let result = spawn_detached(Path::new("/nonexistent/launchpad-installer"), ["/S"]);
        assert!(result.is_err());
    }

    #[cfg(unix)]
    #[test]
    fn test_spawn_detached_runs() {
        let pid = spawn_detached(Path::new("/bin/sh"), ["-c", "exit 0"]).unwrap();
        assert!(pid > 0);
    }
}
