//! DirectoryLister (spec.md §4.4): produces LIST / NLST / MLSD formatted
//! entries from directory contents.

use chrono::{DateTime, Datelike, Utc};
use std::fs::Metadata;
use std::path::Path;
use std::time::SystemTime;

/// One directory entry, already stat'd.
pub struct Entry {
    pub name: String,
    pub metadata: Metadata,
}

fn mode_string(meta: &Metadata) -> String {
    #[cfg(unix)]
    {
        use std::os::unix::fs::PermissionsExt;
        let mode = meta.permissions().mode();
        let file_type = if meta.is_dir() {
            'd'
        } else if meta.file_type().is_symlink() {
            'l'
        } else {
            '-'
        };
        let mut s = String::with_capacity(10);
        s.push(file_type);
        for (shift, triad) in [(6, "rwx"), (3, "rwx"), (0, "rwx")] {
            for (i, c) in triad.chars().enumerate() {
                let bit = 1 << (shift + (2 - i));
                s.push(if mode & bit != 0 { c } else { '-' });
            }
        }
        s
    }
    #[cfg(not(unix))]
    {
        if meta.is_dir() {
            "drwxr-xr-x".to_string()
        } else {
            "-rw-r--r--".to_string()
        }
    }
}

fn uid_gid(meta: &Metadata) -> (u32, u32) {
    #[cfg(unix)]
    {
        use std::os::unix::fs::MetadataExt;
        (meta.uid(), meta.gid())
    }
    #[cfg(not(unix))]
    {
        let _ = meta;
        (0, 0)
    }
}

fn nlink(meta: &Metadata) -> u64 {
    #[cfg(unix)]
    {
        use std::os::unix::fs::MetadataExt;
        meta.nlink()
    }
    #[cfg(not(unix))]
    {
        let _ = meta;
        1
    }
}

fn blocks_512(meta: &Metadata) -> u64 {
    #[cfg(unix)]
    {
        use std::os::unix::fs::MetadataExt;
        meta.blocks()
    }
    #[cfg(not(unix))]
    {
        (meta.len() + 511) / 512
    }
}

fn mtime(meta: &Metadata) -> DateTime<Utc> {
    meta.modified().unwrap_or(SystemTime::UNIX_EPOCH).into()
}

/// Unix `ls -l`-style timestamp: `MMM DD HH:MM` within the last six months,
/// `MMM DD  YYYY` otherwise (note the two spaces before the year, matching
/// coreutils' column alignment).
fn format_mtime_unix_style(t: DateTime<Utc>, now: DateTime<Utc>) -> String {
    let six_months_ago = now - chrono::Duration::days(182);
    if t > six_months_ago && t <= now {
        t.format("%b %e %H:%M").to_string()
    } else {
        t.format("%b %e  %Y").to_string()
    }
}

/// `LIST`: Unix-style long listing, CRLF-terminated lines, preceded by a
/// `total N` line where N is the sum of 512-byte blocks.
pub fn format_list(entries: &[Entry], now: DateTime<Utc>) -> String {
    let total: u64 = entries.iter().map(|e| blocks_512(&e.metadata) / 2).sum();
    let mut out = format!("total {}\r\n", total);
    for e in entries {
        let (uid, gid) = uid_gid(&e.metadata);
        out.push_str(&format!(
            "{} {:>3} {:<8} {:<8} {:>13} {} {}\r\n",
            mode_string(&e.metadata),
            nlink(&e.metadata),
            uid,
            gid,
            e.metadata.len(),
            format_mtime_unix_style(mtime(&e.metadata), now),
            e.name
        ));
    }
    out
}

/// `NLST`: bare names, one per CRLF-terminated line.
pub fn format_nlst(entries: &[Entry]) -> String {
    let mut out = String::new();
    for e in entries {
        out.push_str(&e.name);
        out.push_str("\r\n");
    }
    out
}

fn mlsd_type(meta: &Metadata, name: &str) -> &'static str {
    if meta.is_dir() {
        match name {
            "." => "cdir",
            ".." => "pdir",
            _ => "dir",
        }
    } else {
        "file"
    }
}

fn mlsd_perm(meta: &Metadata, read_only: bool) -> String {
    let mut perm = String::new();
    if meta.is_dir() {
        perm.push('e');
        if !read_only {
            perm.push_str("lcp");
        }
    } else {
        perm.push('r');
        if !read_only {
            perm.push_str("adfw");
        }
    }
    perm
}

/// `MLSD` (RFC 3659): `fact1=val1;fact2=val2; name` lines. `type`, `size`,
/// `modify` (UTC, `YYYYMMDDHHMMSS`), and `perm` are emitted for every entry.
pub fn format_mlsd(entries: &[Entry], read_only: bool) -> String {
    let mut out = String::new();
    for e in entries {
        out.push_str(&format!(
            "type={};size={};modify={};perm={}; {}\r\n",
            mlsd_type(&e.metadata, &e.name),
            e.metadata.len(),
            mtime(&e.metadata).format("%Y%m%d%H%M%S"),
            mlsd_perm(&e.metadata, read_only),
            e.name
        ));
    }
    out
}

/// Lists a directory's contents, applying the LIST/NLST "hidden entries
/// may be elided" allowance (spec.md §4.4) uniformly: dotfiles are included
/// only when `include_hidden` is set. Ordering is filesystem-native, as the
/// spec leaves unspecified.
pub fn list_dir(path: &Path, include_hidden: bool) -> std::io::Result<Vec<Entry>> {
    let mut out = Vec::new();
    for entry in std::fs::read_dir(path)? {
        let entry = entry?;
        let name = entry.file_name().to_string_lossy().into_owned();
        if !include_hidden && name.starts_with('.') {
            continue;
        }
        let metadata = entry.metadata()?;
        out.push(Entry { name, metadata });
    }
    Ok(out)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::tempdir;

    #[test]
    fn list_has_total_line_and_crlf() {
        let dir = tempdir().unwrap();
        fs::write(dir.path().join("hello.txt"), b"hello world").unwrap();
        let entries = list_dir(dir.path(), false).unwrap();
        let out = format_list(&entries, Utc::now());
        assert!(out.starts_with("total "));
        assert!(out.contains("hello.txt"));
        assert!(out.ends_with("\r\n"));
    }

    #[test]
    fn hidden_files_elided_by_default() {
        let dir = tempdir().unwrap();
        fs::write(dir.path().join(".hidden"), b"x").unwrap();
        fs::write(dir.path().join("visible"), b"x").unwrap();
        let entries = list_dir(dir.path(), false).unwrap();
        assert_eq!(entries.len(), 1);
        assert_eq!(entries[0].name, "visible");
    }

    #[test]
    fn mlsd_includes_required_facts() {
        let dir = tempdir().unwrap();
        fs::write(dir.path().join("a.txt"), b"abc").unwrap();
        let entries = list_dir(dir.path(), false).unwrap();
        let out = format_mlsd(&entries, false);
        assert!(out.contains("type=file;"));
        assert!(out.contains("size=3;"));
        assert!(out.contains("modify="));
        assert!(out.contains("perm="));
        assert!(out.contains(" a.txt"));
    }
}
