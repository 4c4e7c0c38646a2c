//! PathResolver (spec.md §4.3): maps FTP virtual paths to host paths under
//! a per-user root, and rejects escapes.

use std::path::{Component, Path, PathBuf};
use thiserror::Error;

const PATH_MAX: usize = 4096;

#[derive(Debug, Error, Eq, PartialEq)]
pub enum PathError {
    #[error("path contains an embedded NUL byte")]
    EmbeddedNul,
    #[error("path exceeds the maximum allowed length")]
    TooLong,
    #[error("path escapes the user's root")]
    Escape,
    #[error("path does not exist")]
    NotFound,
}

/// Resolves client-supplied virtual paths against a session's `cwd` and
/// `root`. Holds no state of its own; every call is self-contained so it
/// can be invoked freely from any command handler.
pub struct PathResolver<'a> {
    pub root: &'a Path,
}

impl<'a> PathResolver<'a> {
    pub fn new(root: &'a Path) -> Self {
        PathResolver { root }
    }

    /// Lexically normalizes a virtual path (composing with `cwd` if
    /// relative) without touching the filesystem: `.` segments are dropped,
    /// `..` pops the last segment but is clamped at `/` rather than
    /// escaping above it. Returns the normalized *virtual* path (always
    /// absolute).
    pub fn normalize_virtual(cwd: &str, input: &str) -> Result<String, PathError> {
        if input.as_bytes().contains(&0) {
            return Err(PathError::EmbeddedNul);
        }
        if input.len() > PATH_MAX {
            return Err(PathError::TooLong);
        }

        let combined = if input.starts_with('/') {
            input.to_string()
        } else {
            format!("{}/{}", cwd.trim_end_matches('/'), input)
        };

        let mut stack: Vec<&str> = Vec::new();
        for segment in combined.split('/') {
            match segment {
                "" | "." => continue,
                ".." => {
                    stack.pop();
                }
                s => stack.push(s),
            }
        }

        Ok(format!("/{}", stack.join("/")))
    }

    /// Composes a normalized virtual path with `root` to get a host path,
    /// *without* checking the filesystem. Used for paths that do not yet
    /// exist (e.g. a `STOR` destination, or `MKD`'s argument).
    pub fn to_host_path(&self, virtual_path: &str) -> PathBuf {
        let trimmed = virtual_path.trim_start_matches('/');
        if trimmed.is_empty() {
            self.root.to_path_buf()
        } else {
            self.root.join(trimmed)
        }
    }

    /// Full resolution per spec.md §4.3: normalize, compose with root, and
    /// if the result exists, canonicalize and re-check that the
    /// canonicalized path still lies under `root` (symlinks are followed,
    /// but a realpath check afterwards must confirm containment). Returns
    /// `PathError::NotFound` (not `Escape`) when the check fails, so the
    /// client sees a uniform 550 revealing no structure above the root.
    pub fn resolve(&self, cwd: &str, input: &str) -> Result<PathBuf, PathError> {
        let virtual_path = Self::normalize_virtual(cwd, input)?;
        let host_path = self.to_host_path(&virtual_path);

        match std::fs::canonicalize(&host_path) {
            Ok(canon) => {
                let root_canon = std::fs::canonicalize(self.root).map_err(|_| PathError::NotFound)?;
                if canon.starts_with(&root_canon) {
                    Ok(canon)
                } else {
                    Err(PathError::NotFound)
                }
            }
            Err(_) => {
                // Path doesn't exist yet (STOR/MKD/RNTO target): the
                // lexical composition above already guarantees containment
                // since `..` was clamped at `/`, so this is safe to return
                // as-is for callers that only need a destination path.
                Ok(host_path)
            }
        }
    }

    /// Like [`resolve`] but requires the path to exist (CWD, DELE, RETR,
    /// RMD, RNFR, SIZE, MDTM all stat their target).
    pub fn resolve_existing(&self, cwd: &str, input: &str) -> Result<PathBuf, PathError> {
        let resolved = self.resolve(cwd, input)?;
        if resolved.exists() {
            Ok(resolved)
        } else {
            Err(PathError::NotFound)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::tempdir;

    #[test]
    fn normalizes_dot_dot_within_root() {
        let v = PathResolver::normalize_virtual("/a/b", "../c").unwrap();
        assert_eq!(v, "/a/c");
    }

    #[test]
    fn clamps_dot_dot_above_root() {
        let v = PathResolver::normalize_virtual("/", "../../../etc/passwd").unwrap();
        assert_eq!(v, "/etc/passwd");
    }

    #[test]
    fn absolute_input_ignores_cwd() {
        let v = PathResolver::normalize_virtual("/a/b/c", "/x/y").unwrap();
        assert_eq!(v, "/x/y");
    }

    #[test]
    fn rejects_embedded_nul() {
        assert_eq!(PathResolver::normalize_virtual("/", "foo\0bar").unwrap_err(), PathError::EmbeddedNul);
    }

    #[test]
    fn resolved_path_stays_under_root() {
        let dir = tempdir().unwrap();
        fs::create_dir_all(dir.path().join("sub")).unwrap();
        fs::write(dir.path().join("sub/hello.txt"), b"hi").unwrap();
        let resolver = PathResolver::new(dir.path());

        let p = resolver.resolve_existing("/", "sub/hello.txt").unwrap();
        assert!(p.starts_with(dir.path()));
    }

    #[test]
    fn escape_via_dot_dot_clamped_to_root_not_found() {
        let dir = tempdir().unwrap();
        let resolver = PathResolver::new(dir.path());
        // Scenario 5 from spec.md §8: RETR ../../etc/passwd from a rooted
        // session must not reveal /etc/passwd; clamped to root, and since
        // the file doesn't exist there, resolution fails not-found.
        let err = resolver.resolve_existing("/", "../../etc/passwd").unwrap_err();
        assert_eq!(err, PathError::NotFound);
    }

    #[cfg(unix)]
    #[test]
    fn symlink_escaping_root_is_rejected() {
        let dir = tempdir().unwrap();
        let outside = tempdir().unwrap();
        fs::write(outside.path().join("secret.txt"), b"nope").unwrap();
        std::os::unix::fs::symlink(outside.path().join("secret.txt"), dir.path().join("link")).unwrap();

        let resolver = PathResolver::new(dir.path());
        let err = resolver.resolve_existing("/", "link").unwrap_err();
        assert_eq!(err, PathError::NotFound);
    }
}
