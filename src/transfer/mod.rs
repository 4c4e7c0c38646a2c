//! TransferEngine (spec.md §4.5): streams a file to/from a data socket with
//! REST offset and ABOR cancellation.
//!
//! Mirrors the shape of `libunftp`'s data-channel processing
//! (`InternalMsg::{SendData, WrittenData}`, `data_abort_tx`) but is written
//! against a concrete `tokio::fs::File` and a boxed data stream instead of
//! the teacher's generic `StorageBackend<U>`, since this spec's Non-goals
//! explicitly rule out a pluggable virtual filesystem (spec.md §1).

use std::io;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use tokio::fs::{File, OpenOptions};
use tokio::io::{AsyncRead, AsyncReadExt, AsyncSeekExt, AsyncWrite, AsyncWriteExt};

/// 64 KiB, as specified in spec.md §4.5.
pub const CHUNK_SIZE: usize = 64 * 1024;

/// Transfer representation type (spec.md §3: ASCII|Binary).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TransferMode {
    Ascii,
    Binary,
}

/// What a [`TransferEngine`] run produced. Surfaces to `SessionFSM` over the
/// completion channel (spec.md §4.5: "the engine never touches the control
/// stream; it signals completion ... via a completion channel").
#[derive(Debug)]
pub enum TransferOutcome {
    /// Transfer ran to completion; carries the byte count moved.
    Completed(u64),
    /// Cancelled via ABOR or session teardown before completion.
    Aborted,
    /// An I/O error occurred reading/writing the file or the data socket.
    Error(io::Error),
}

/// Shared cancellation flag handed to a running transfer worker, mirroring
/// spec.md §5's "a shared cancellation flag (atomic boolean)".
#[derive(Clone, Default)]
pub struct CancelFlag(Arc<AtomicBool>);

impl CancelFlag {
    pub fn new() -> Self {
        CancelFlag(Arc::new(AtomicBool::new(false)))
    }

    pub fn cancel(&self) {
        self.0.store(true, Ordering::SeqCst);
    }

    pub fn is_cancelled(&self) -> bool {
        self.0.load(Ordering::SeqCst)
    }
}

/// Translates a buffer containing bare `LF`/`CR` into FTP's ASCII-mode
/// CRLF line ending, straddling chunk boundaries via `pending_cr`.
///
/// Policy (spec.md §9 Open Question — undocumented in the source, decided
/// here and recorded in DESIGN.md): every LF not already preceded by CR is
/// widened to CRLF, and every CR not immediately followed by LF is passed
/// through unchanged (treated as data, not a line ending). A CR that is the
/// very last byte of a chunk is held back in `pending_cr` until the next
/// chunk (or EOF) reveals whether it's followed by LF.
fn ascii_encode_chunk(input: &[u8], pending_cr: &mut bool, out: &mut Vec<u8>) {
    let mut i = 0;
    if *pending_cr {
        if input.first() == Some(&b'\n') {
            out.push(b'\r');
            out.push(b'\n');
            i = 1;
        } else {
            out.push(b'\r');
        }
        *pending_cr = false;
    }
    while i < input.len() {
        let b = input[i];
        if b == b'\n' {
            out.push(b'\r');
            out.push(b'\n');
        } else if b == b'\r' {
            if i + 1 == input.len() {
                *pending_cr = true;
                i += 1;
                continue;
            } else if input[i + 1] == b'\n' {
                out.push(b'\r');
                out.push(b'\n');
                i += 1;
            } else {
                out.push(b'\r');
            }
        } else {
            out.push(b);
        }
        i += 1;
    }
}

/// Inverse of [`ascii_encode_chunk`]: strips a bare `\r` immediately
/// preceding `\n`, straddling chunk boundaries via `pending_cr`.
fn ascii_decode_chunk(input: &[u8], pending_cr: &mut bool, out: &mut Vec<u8>) {
    let mut i = 0;
    if *pending_cr {
        if input.first() == Some(&b'\n') {
            out.push(b'\n');
            i = 1;
        } else {
            out.push(b'\r');
        }
        *pending_cr = false;
    }
    while i < input.len() {
        let b = input[i];
        if b == b'\r' {
            if i + 1 == input.len() {
                *pending_cr = true;
            } else if input[i + 1] == b'\n' {
                out.push(b'\n');
                i += 1;
            } else {
                out.push(b'\r');
            }
        } else {
            out.push(b);
        }
        i += 1;
    }
}

/// RETR: streams `path` from `offset` to EOF into `sink`, honoring `cancel`.
pub async fn retrieve<W>(path: &Path, offset: u64, mode: TransferMode, mut sink: W, cancel: CancelFlag) -> TransferOutcome
where
    W: AsyncWrite + Unpin,
{
    let mut file = match File::open(path).await {
        Ok(f) => f,
        Err(e) => return TransferOutcome::Error(e),
    };
    if offset > 0 {
        if let Err(e) = file.seek(io::SeekFrom::Start(offset)).await {
            return TransferOutcome::Error(e);
        }
    }

    let mut buf = vec![0u8; CHUNK_SIZE];
    let mut sent: u64 = 0;
    let mut pending_cr = false;

    loop {
        if cancel.is_cancelled() {
            return TransferOutcome::Aborted;
        }
        let n = match file.read(&mut buf).await {
            Ok(0) => break,
            Ok(n) => n,
            Err(e) => return TransferOutcome::Error(e),
        };

        let write_result = match mode {
            TransferMode::Binary => sink.write_all(&buf[..n]).await,
            TransferMode::Ascii => {
                let mut translated = Vec::with_capacity(n + n / 32);
                ascii_encode_chunk(&buf[..n], &mut pending_cr, &mut translated);
                sink.write_all(&translated).await
            }
        };
        if let Err(e) = write_result {
            return TransferOutcome::Error(e);
        }
        sent += n as u64;

        if cancel.is_cancelled() {
            return TransferOutcome::Aborted;
        }
    }

    if mode == TransferMode::Ascii && pending_cr {
        if sink.write_all(b"\r").await.is_err() {
            // Best effort; the transfer already completed logically.
        }
    }

    if let Err(e) = sink.flush().await {
        return TransferOutcome::Error(e);
    }

    TransferOutcome::Completed(sent)
}

/// Which open-mode a write transfer uses.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WriteKind {
    /// `STOR`: create/truncate.
    Store,
    /// `APPE`: create, append to existing content.
    Append,
}

/// STOR/APPE: streams `source` into `path`, honoring `cancel`. On success,
/// applies `ownership` if configured (spec.md §3 UserAccount.ownership_override).
pub async fn store<R>(
    path: &Path,
    kind: WriteKind,
    mode: TransferMode,
    mut source: R,
    cancel: CancelFlag,
    ownership: Option<(u32, u32)>,
) -> TransferOutcome
where
    R: AsyncRead + Unpin,
{
    let mut options = OpenOptions::new();
    options.write(true).create(true);
    match kind {
        WriteKind::Store => {
            options.truncate(true);
        }
        WriteKind::Append => {
            options.append(true);
        }
    }

    let mut file = match options.open(path).await {
        Ok(f) => f,
        Err(e) => return TransferOutcome::Error(e),
    };

    let mut buf = vec![0u8; CHUNK_SIZE];
    let mut received: u64 = 0;
    let mut pending_cr = false;

    loop {
        if cancel.is_cancelled() {
            return TransferOutcome::Aborted;
        }
        let n = match source.read(&mut buf).await {
            Ok(0) => break,
            Ok(n) => n,
            Err(e) => return TransferOutcome::Error(e),
        };

        let write_result = match mode {
            TransferMode::Binary => file.write_all(&buf[..n]).await,
            TransferMode::Ascii => {
                let mut translated = Vec::with_capacity(n);
                ascii_decode_chunk(&buf[..n], &mut pending_cr, &mut translated);
                file.write_all(&translated).await
            }
        };
        if let Err(e) = write_result {
            return TransferOutcome::Error(e);
        }
        received += n as u64;
    }

    if mode == TransferMode::Ascii && pending_cr {
        if file.write_all(b"\r").await.is_err() {
            // Non-fatal; see retrieve()'s equivalent note.
        }
    }

    if let Err(e) = file.flush().await {
        return TransferOutcome::Error(e);
    }
    drop(file);

    if let Some((uid, gid)) = ownership {
        // Partial uploads are retained per spec.md §4.5 even if this
        // best-effort step fails; the transfer itself already succeeded.
        let _ = crate::fs::apply_ownership(path, uid, gid);
    }

    TransferOutcome::Completed(received)
}

/// LIST/NLST/MLSD (spec.md §4.2, §4.4): streams an already-formatted
/// listing buffer to the data socket in [`CHUNK_SIZE`] pieces, honoring
/// `cancel` the same way [`retrieve`] does. The listing itself is produced
/// up front by [`crate::fs::directory_lister`] — there's no seek/offset
/// concept for a listing, so this is simpler than `retrieve`.
pub async fn send_listing<W>(data: &[u8], mut sink: W, cancel: CancelFlag) -> TransferOutcome
where
    W: AsyncWrite + Unpin,
{
    for chunk in data.chunks(CHUNK_SIZE) {
        if cancel.is_cancelled() {
            return TransferOutcome::Aborted;
        }
        if let Err(e) = sink.write_all(chunk).await {
            return TransferOutcome::Error(e);
        }
    }
    if let Err(e) = sink.flush().await {
        return TransferOutcome::Error(e);
    }
    TransferOutcome::Completed(data.len() as u64)
}

/// STOU (spec.md §4.5, §9): synthesizes a non-conflicting unique name in
/// `dir`. Returns `None` after 100 attempts, which `SessionFSM` maps to 450
/// per the spec's suggested resolution of an otherwise-silent source.
pub fn unique_name(dir: &Path, base: &str) -> Option<PathBuf> {
    const MAX_ATTEMPTS: u32 = 100;
    for attempt in 0..MAX_ATTEMPTS {
        let candidate = if attempt == 0 {
            dir.join(base)
        } else {
            dir.join(format!("{}.{}", base, attempt))
        };
        if !candidate.exists() {
            return Some(candidate);
        }
    }
    None
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;
    use tokio::io::BufWriter;

    #[tokio::test]
    async fn retrieve_streams_binary_content() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("hello.txt");
        tokio::fs::write(&path, b"hello world").await.unwrap();

        let mut out = Vec::new();
        let outcome = retrieve(&path, 0, TransferMode::Binary, &mut out, CancelFlag::new()).await;
        assert!(matches!(outcome, TransferOutcome::Completed(11)));
        assert_eq!(out, b"hello world");
    }

    #[tokio::test]
    async fn retrieve_honors_rest_offset() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("hello.txt");
        tokio::fs::write(&path, b"hello world").await.unwrap();

        let mut out = Vec::new();
        let outcome = retrieve(&path, 6, TransferMode::Binary, &mut out, CancelFlag::new()).await;
        assert!(matches!(outcome, TransferOutcome::Completed(5)));
        assert_eq!(out, b"world");
    }

    #[tokio::test]
    async fn retrieve_cancelled_before_start_aborts() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("hello.txt");
        tokio::fs::write(&path, b"hello world").await.unwrap();

        let cancel = CancelFlag::new();
        cancel.cancel();
        let mut out = Vec::new();
        let outcome = retrieve(&path, 0, TransferMode::Binary, &mut out, cancel).await;
        assert!(matches!(outcome, TransferOutcome::Aborted));
    }

    #[tokio::test]
    async fn store_then_retrieve_roundtrips() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("up.bin");

        let data = b"the quick brown fox".to_vec();
        let outcome = store(&path, WriteKind::Store, TransferMode::Binary, &data[..], CancelFlag::new(), None).await;
        assert!(matches!(outcome, TransferOutcome::Completed(_)));

        let mut out = Vec::new();
        let outcome = retrieve(&path, 0, TransferMode::Binary, &mut out, CancelFlag::new()).await;
        assert!(matches!(outcome, TransferOutcome::Completed(_)));
        assert_eq!(out, data);
    }

    #[tokio::test]
    async fn append_adds_to_existing_file() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("log.txt");
        tokio::fs::write(&path, b"first\n").await.unwrap();

        let outcome = store(&path, WriteKind::Append, TransferMode::Binary, &b"second\n"[..], CancelFlag::new(), None).await;
        assert!(matches!(outcome, TransferOutcome::Completed(_)));

        let content = tokio::fs::read(&path).await.unwrap();
        assert_eq!(content, b"first\nsecond\n");
    }

    #[tokio::test]
    async fn ascii_mode_translates_bare_lf_to_crlf() {
        let mut out = Vec::new();
        {
            let mut w = BufWriter::new(&mut out);
            let dir = tempdir().unwrap();
            let path = dir.path().join("text.txt");
            tokio::fs::write(&path, b"line1\nline2\n").await.unwrap();
            let outcome = retrieve(&path, 0, TransferMode::Ascii, &mut w, CancelFlag::new()).await;
            assert!(matches!(outcome, TransferOutcome::Completed(_)));
            use tokio::io::AsyncWriteExt as _;
            w.flush().await.unwrap();
        }
        assert_eq!(out, b"line1\r\nline2\r\n");
    }

    #[tokio::test]
    async fn send_listing_streams_full_buffer() {
        let data = b"total 0\r\n-rw-r--r-- 1 0 0 11 Jan 06 2026 hello.txt\r\n".to_vec();
        let mut out = Vec::new();
        let outcome = send_listing(&data, &mut out, CancelFlag::new()).await;
        assert!(matches!(outcome, TransferOutcome::Completed(n) if n as usize == data.len()));
        assert_eq!(out, data);
    }

    #[test]
    fn unique_name_finds_non_conflicting_candidate() {
        let dir = tempdir().unwrap();
        std::fs::write(dir.path().join("file"), b"x").unwrap();
        let name = unique_name(dir.path(), "file").unwrap();
        assert_eq!(name, dir.path().join("file.1"));
    }

    #[test]
    fn unique_name_gives_up_after_max_attempts() {
        let dir = tempdir().unwrap();
        std::fs::write(dir.path().join("file"), b"x").unwrap();
        for i in 1..100 {
            std::fs::write(dir.path().join(format!("file.{}", i)), b"x").unwrap();
        }
        assert!(unique_name(dir.path(), "file").is_none());
    }
}
