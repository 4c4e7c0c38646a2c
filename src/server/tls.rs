//! TlsAdapter (spec.md §4.7): wraps a byte stream with optional, explicitly
//! negotiated TLS.
//!
//! Grounded on `libunftp`'s `server::tls` module, which loads a PKCS#12
//! identity via `native_tls::Identity::from_pkcs12` and wraps the control
//! socket with `tokio_tls::TlsAcceptor`. `tokio-tls` was later renamed
//! `tokio-native-tls`; this is the same crate under its current name. Unlike
//! the teacher's version, every fallible step here returns a `Result`
//! instead of `.unwrap()`-ing, since a malformed cert/key must become a
//! spec.md §7 `Fatal` error at startup, not a panic.

use native_tls::Identity;
use std::fs;
use std::path::Path;
use std::pin::Pin;
use std::task::{Context, Poll};
use thiserror::Error;
use tokio::io::{AsyncRead, AsyncWrite, ReadBuf};
use tokio::net::TcpStream;
use tokio_native_tls::{TlsAcceptor, TlsStream};

/// Errors loading the server's TLS identity at startup. Distinct from
/// `native_tls::Error` because reading the cert/key files can also fail
/// with a plain `io::Error`, which `native_tls::Error` has no conversion
/// from.
#[derive(Debug, Error)]
pub enum TlsLoadError {
    #[error("failed to read TLS identity file: {0}")]
    Io(#[from] std::io::Error),
    #[error("failed to parse TLS identity: {0}")]
    Parse(#[from] native_tls::Error),
}

/// Loads a TLS identity, either as a PEM cert+key pair (the common case for
/// deployments that already have `fullchain.pem`/`privkey.pem`) or, if that
/// fails to parse, as a DER-formatted PKCS#12 archive with `password` —
/// the format `libunftp`'s `Server::ftps` accepts.
pub fn load_identity(cert_path: &Path, key_path: &Path, password: &str) -> Result<Identity, TlsLoadError> {
    let cert = fs::read(cert_path)?;
    let key = fs::read(key_path)?;
    match Identity::from_pkcs8(&cert, &key) {
        Ok(identity) => Ok(identity),
        Err(_) => Ok(Identity::from_pkcs12(&cert, password)?),
    }
}

/// A control- or data-channel stream that begins plaintext and may be
/// upgraded to TLS in place (spec.md §4.7: "a stream begins plaintext and
/// transitions to TLS when the FSM instructs"). The read/write contract is
/// identical before and after the upgrade from the caller's point of view.
pub enum MaybeTlsStream {
    Plain(TcpStream),
    Tls(Box<TlsStream<TcpStream>>),
}

impl MaybeTlsStream {
    /// Consumes a plaintext stream and returns a TLS-wrapped one. Only valid
    /// between complete command lines (spec.md §4.7: "readers mid-line at
    /// upgrade time are not supported").
    pub async fn upgrade_server(self, acceptor: &TlsAcceptor) -> std::io::Result<Self> {
        match self {
            MaybeTlsStream::Plain(tcp) => {
                let tls = acceptor
                    .accept(tcp)
                    .await
                    .map_err(|e| std::io::Error::new(std::io::ErrorKind::Other, e))?;
                Ok(MaybeTlsStream::Tls(Box::new(tls)))
            }
            already @ MaybeTlsStream::Tls(_) => Ok(already),
        }
    }

    pub fn is_tls(&self) -> bool {
        matches!(self, MaybeTlsStream::Tls(_))
    }
}

impl AsyncRead for MaybeTlsStream {
    fn poll_read(self: Pin<&mut Self>, cx: &mut Context<'_>, buf: &mut ReadBuf<'_>) -> Poll<std::io::Result<()>> {
        match self.get_mut() {
            MaybeTlsStream::Plain(s) => Pin::new(s).poll_read(cx, buf),
            MaybeTlsStream::Tls(s) => Pin::new(s.as_mut()).poll_read(cx, buf),
        }
    }
}

impl AsyncWrite for MaybeTlsStream {
    fn poll_write(self: Pin<&mut Self>, cx: &mut Context<'_>, buf: &[u8]) -> Poll<std::io::Result<usize>> {
        match self.get_mut() {
            MaybeTlsStream::Plain(s) => Pin::new(s).poll_write(cx, buf),
            MaybeTlsStream::Tls(s) => Pin::new(s.as_mut()).poll_write(cx, buf),
        }
    }

    fn poll_flush(self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<std::io::Result<()>> {
        match self.get_mut() {
            MaybeTlsStream::Plain(s) => Pin::new(s).poll_flush(cx),
            MaybeTlsStream::Tls(s) => Pin::new(s.as_mut()).poll_flush(cx),
        }
    }

    fn poll_shutdown(self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<std::io::Result<()>> {
        match self.get_mut() {
            MaybeTlsStream::Plain(s) => Pin::new(s).poll_shutdown(cx),
            MaybeTlsStream::Tls(s) => Pin::new(s.as_mut()).poll_shutdown(cx),
        }
    }
}
