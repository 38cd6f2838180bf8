//! Renderer binary preparation.
//!
//! The binary is resolved once and its permissions are fixed once, before
//! anything is spawned. There is no fallback: without a renderer the bridge
//! has nothing to talk to.

use crate::error::{BridgeError, Result};
use log::{debug, info};
use std::fs;
use std::path::{Path, PathBuf};

/// Resolve `path` to an absolute executable file.
///
/// Relative paths are resolved against the working directory, never
/// against `PATH`. A file lacking every execute bit is made `0o755`.
pub fn prepare_binary(path: &Path) -> Result<PathBuf> {
    let not_found = || BridgeError::BinaryNotFound {
        path: path.to_path_buf(),
    };

    let resolved = fs::canonicalize(path).map_err(|_| not_found())?;
    if !resolved.is_file() {
        return Err(not_found());
    }

    ensure_executable(&resolved)?;
    debug!("Renderer binary resolved to {}", resolved.display());
    Ok(resolved)
}

#[cfg(unix)]
fn ensure_executable(path: &Path) -> Result<()> {
    use std::os::unix::fs::PermissionsExt;

    let not_executable = |source| BridgeError::NotExecutable {
        path: path.to_path_buf(),
        source,
    };

    let mode = fs::metadata(path).map_err(not_executable)?.permissions().mode();
    if mode & 0o111 != 0 {
        return Ok(());
    }

    info!("Making the renderer executable: {}", path.display());
    fs::set_permissions(path, fs::Permissions::from_mode(0o755)).map_err(not_executable)
}

#[cfg(not(unix))]
#[allow(clippy::unnecessary_wraps)]
fn ensure_executable(_path: &Path) -> Result<()> {
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_missing_binary() {
        let dir = tempfile::tempdir().unwrap();
        let err = prepare_binary(&dir.path().join("sdl2_rust")).unwrap_err();

        assert!(matches!(err, BridgeError::BinaryNotFound { .. }));
    }

    #[test]
    fn test_directory_is_not_a_binary() {
        let dir = tempfile::tempdir().unwrap();
        let err = prepare_binary(dir.path()).unwrap_err();

        assert!(matches!(err, BridgeError::BinaryNotFound { .. }));
    }

    #[cfg(unix)]
    #[test]
    fn test_permissions_fixed_once() {
        use std::os::unix::fs::PermissionsExt;

        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("renderer");
        fs::write(&path, "#!/bin/sh\n").unwrap();
        fs::set_permissions(&path, fs::Permissions::from_mode(0o644)).unwrap();

        let resolved = prepare_binary(&path).unwrap();
        let mode = fs::metadata(&resolved).unwrap().permissions().mode();
        assert_eq!(mode & 0o777, 0o755);
        assert!(resolved.is_absolute());
    }

    #[cfg(unix)]
    #[test]
    fn test_executable_left_alone() {
        use std::os::unix::fs::PermissionsExt;

        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("renderer");
        fs::write(&path, "#!/bin/sh\n").unwrap();
        fs::set_permissions(&path, fs::Permissions::from_mode(0o700)).unwrap();

        prepare_binary(&path).unwrap();
        let mode = fs::metadata(&path).unwrap().permissions().mode();
        assert_eq!(mode & 0o777, 0o700);
    }
}
