//! Crate-level `Fatal` errors (spec.md §7): bind failures, TLS setup
//! failures at startup, and the like. These are the only errors that leave
//! the crate outright — everything that happens per-session is converted to
//! an FTP reply at the `SessionFSM` boundary (see
//! [`crate::server::controlchan::error`]) and never surfaces here.

use std::net::SocketAddr;
use std::path::PathBuf;

pub type Result<T> = std::result::Result<T, Error>;

#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("failed to bind control listener on {addr}: {source}")]
    Bind { addr: SocketAddr, #[source] source: std::io::Error },

    #[error("failed to load TLS identity from {cert} / {key}: {source}")]
    TlsSetup {
        cert: PathBuf,
        key: PathBuf,
        #[source]
        source: crate::server::tls::TlsLoadError,
    },

    #[error("invalid configuration: {0}")]
    Config(#[from] crate::config::ConfigError),

    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
}
