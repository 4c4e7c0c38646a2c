//! DataChannel (spec.md §4.1 table, §4.2 "Transfer setup"/"Transfer
//! execution"): turns a session's pending [`DataChannelIntent`] into a
//! connected, optionally TLS-wrapped data socket.
//!
//! Grounded on `libunftp`'s `server::chancomms` / data-connection handling in
//! `server/ftpserver.rs` (`spawn_data_processing`), generalized to the
//! explicit Passive/Active split spec.md §3 names instead of a single
//! combined `DataCommand` enum.

use crate::server::session::{DataChannelIntent, Session};
use crate::server::tls::MaybeTlsStream;
use std::time::Duration;
use thiserror::Error;
use tokio::net::TcpStream;
use tokio_native_tls::TlsAcceptor;

#[derive(Debug, Error)]
pub enum DataChannelError {
    #[error("no PASV/EPSV/PORT/EPRT was issued before this transfer")]
    NoIntent,
    #[error("timed out waiting for the client to connect to the passive listener")]
    AcceptTimeout,
    #[error("data connection I/O error: {0}")]
    Io(#[from] std::io::Error),
    #[error("data connection TLS handshake failed")]
    Tls,
}

/// Consumes the session's pending data-channel intent and returns a
/// connected stream, TLS-wrapped if `PROT P` is in effect (spec.md §4.7:
/// "Data-channel sockets are TLS-wrapped at open time if PROT P is active").
///
/// The PASV/EPSV passive port is released back to the allocator once the
/// accept (or its timeout) resolves, win or lose — spec.md §3's passive-port
/// ledger only needs the port held until the one connection it was opened
/// for has arrived.
pub async fn open(session: &mut Session, accept_timeout: Duration, tls_acceptor: Option<&TlsAcceptor>) -> Result<MaybeTlsStream, DataChannelError> {
    let intent = std::mem::replace(&mut session.data_intent, DataChannelIntent::None);

    let raw_stream = match intent {
        DataChannelIntent::None => return Err(DataChannelError::NoIntent),
        DataChannelIntent::Passive { listener, .. } => {
            let accepted = tokio::time::timeout(accept_timeout, listener.accept()).await;
            session.passive_port_guard = None;
            match accepted {
                Ok(Ok((stream, _peer))) => stream,
                Ok(Err(e)) => return Err(DataChannelError::Io(e)),
                Err(_) => return Err(DataChannelError::AcceptTimeout),
            }
        }
        DataChannelIntent::Active { peer_addr } => TcpStream::connect(peer_addr).await?,
    };

    let plain = MaybeTlsStream::Plain(raw_stream);
    if session.data_tls {
        match tls_acceptor {
            Some(acceptor) => plain.upgrade_server(acceptor).await.map_err(|_| DataChannelError::Tls),
            // PROT P can only have been accepted while the server has a TLS
            // acceptor configured (see commands::prot), so this branch is
            // unreachable in practice; fail closed rather than silently
            // serving the transfer in the clear.
            None => Err(DataChannelError::Tls),
        }
    } else {
        Ok(plain)
    }
}
