//! File write helpers
//!
//! Writes go to a uniquely named temp file next to the target and are then
//! persisted over it, so a reader never observes a half-written document and a
//! failed write leaves the previous content in place.
//!
//! A target that is a symlink is written through: the link stays and the file
//! it points at is replaced. An existing target keeps its permissions.

use std::fs;
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use tempfile::NamedTempFile;

/// Mode for files that did not exist before the write
#[cfg(unix)]
pub const NEW_FILE_MODE: u32 = 0o644;

/// Path the write actually lands on: the link target for symlinks, else `target`
///
/// A dangling link cannot be resolved and is replaced like a regular file.
pub fn resolve_target(target: &Path) -> PathBuf {
    match fs::symlink_metadata(target) {
        Ok(meta) if meta.file_type().is_symlink() => {
            fs::canonicalize(target).unwrap_or_else(|_| target.to_path_buf())
        }
        _ => target.to_path_buf(),
    }
}

/// Atomically replace `target` with `contents`
///
/// The parent directory must already exist. On failure the temp file is
/// removed and `target` is left untouched.
pub fn write_atomic(target: &Path, contents: &[u8]) -> io::Result<()> {
    let resolved = resolve_target(target);
    let parent = match resolved.parent() {
        Some(p) if !p.as_os_str().is_empty() => p,
        _ => Path::new("."),
    };

    let mut temp = NamedTempFile::new_in(parent)?;
    temp.write_all(contents)?;
    if let Some(permissions) = permissions_for(&resolved) {
        temp.as_file().set_permissions(permissions)?;
    }
    temp.as_file().sync_all()?;

    temp.persist(&resolved).map_err(|e| e.error)?;
    Ok(())
}

/// Atomically replace `target`, creating missing parent directories first
pub fn write_atomic_create_dirs(target: &Path, contents: &[u8]) -> io::Result<()> {
    if let Some(parent) = target.parent() {
        if !parent.as_os_str().is_empty() {
            fs::create_dir_all(parent)?;
        }
    }
    write_atomic(target, contents)
}

fn permissions_for(target: &Path) -> Option<fs::Permissions> {
    match fs::metadata(target) {
        Ok(meta) => Some(meta.permissions()),
        Err(_) => new_file_permissions(),
    }
}

#[cfg(unix)]
fn new_file_permissions() -> Option<fs::Permissions> {
    use std::os::unix::fs::PermissionsExt;
    Some(fs::Permissions::from_mode(NEW_FILE_MODE))
}

#[cfg(not(unix))]
fn new_file_permissions() -> Option<fs::Permissions> {
    None
}
