//! Filesystem-facing helpers: [`path_resolver`] and [`directory_lister`].
//! The core exposes the native filesystem directly (spec.md §1 Non-goals:
//! no virtual filesystem layer), chrooted logically per user via
//! [`path_resolver::PathResolver`].

pub mod directory_lister;
pub mod path_resolver;

pub use path_resolver::{PathError, PathResolver};

/// Applies a configured uid/gid override to a freshly uploaded file
/// (spec.md §3, UserAccount.ownership_override). Unix-only; a no-op
/// elsewhere, matching the spec's framing of this as an optional,
/// best-effort step taken "after close".
#[cfg(unix)]
pub fn apply_ownership(path: &std::path::Path, uid: u32, gid: u32) -> std::io::Result<()> {
    use std::ffi::CString;
    use std::os::unix::ffi::OsStrExt;
    let c_path = CString::new(path.as_os_str().as_bytes()).map_err(|e| std::io::Error::new(std::io::ErrorKind::InvalidInput, e))?;
    let ret = unsafe { libc::chown(c_path.as_ptr(), uid, gid) };
    if ret == 0 {
        Ok(())
    } else {
        Err(std::io::Error::last_os_error())
    }
}

#[cfg(not(unix))]
pub fn apply_ownership(_path: &std::path::Path, _uid: u32, _gid: u32) -> std::io::Result<()> {
    Ok(())
}
