//! Secure filesystem preparation for the accounts database.
//!
//! The accounts table holds credentials, so the database file and its parent
//! directory are created owner-only on Unix (0o700 directory, 0o600 file,
//! WAL/SHM sidecars tightened when present).

use std::path::Path;

use crate::error::StoreError;

/// Prepare `path` for a SQLite database: create the parent directory,
/// tighten its permissions, and create the database file with secure
/// permissions if it does not exist yet.
pub(crate) fn prepare_db_path(path: &Path) -> Result<(), StoreError> {
    let wrap = |source: std::io::Error| StoreError::Prepare {
        path: path.to_path_buf(),
        source,
    };

    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent).map_err(wrap)?;
        tighten_dir_permissions(parent).map_err(wrap)?;
    }
    create_secure_db_file(path).map_err(wrap)
}

/// On Unix, restrict a directory we own to 0o700. Directories owned by
/// another user are left alone.
#[cfg(unix)]
fn tighten_dir_permissions(dir: &Path) -> std::io::Result<()> {
    use std::os::unix::fs::{MetadataExt, PermissionsExt};

    let metadata = std::fs::metadata(dir)?;
    let our_uid = unsafe { libc::getuid() };
    if metadata.uid() != our_uid {
        return Ok(());
    }

    if metadata.permissions().mode() & 0o077 != 0 {
        std::fs::set_permissions(dir, std::fs::Permissions::from_mode(0o700))?;
    }
    Ok(())
}

#[cfg(not(unix))]
fn tighten_dir_permissions(_dir: &Path) -> std::io::Result<()> {
    Ok(())
}

/// Create the database file with 0o600 if missing, and tighten the file and
/// any WAL/SHM sidecars left over from a previous run.
fn create_secure_db_file(path: &Path) -> std::io::Result<()> {
    let mut options = std::fs::OpenOptions::new();
    options.create(true).truncate(false).read(true).write(true);

    #[cfg(unix)]
    {
        use std::os::unix::fs::OpenOptionsExt;
        options.mode(0o600);
    }
    let _file = options.open(path)?;

    #[cfg(unix)]
    {
        use std::os::unix::fs::PermissionsExt;

        std::fs::set_permissions(path, std::fs::Permissions::from_mode(0o600))?;
        for suffix in ["-wal", "-shm"] {
            let sidecar = match path.file_name() {
                Some(name) => path.with_file_name(format!("{}{suffix}", name.to_string_lossy())),
                None => continue,
            };
            if sidecar.exists() {
                let _ = std::fs::set_permissions(&sidecar, std::fs::Permissions::from_mode(0o600));
            }
        }
    }
    Ok(())
}
