//! CommandHandler / CommandContext (spec.md §4.2).
//!
//! Grounded on `libunftp`'s `CommandContext<S, U>` / `CommandHandler<S, U>`
//! trait (see `server/controlchan/commands/{abor,allo,type_}.rs`,
//! `server/ftpserver.rs::handle_command`'s dispatch table). Generalized
//! here to the same concrete filesystem everywhere instead of a generic
//! `StorageBackend<S, U>`, since virtual filesystems are an explicit
//! Non-goal (spec.md §1).

use super::error::ControlChanError;
use super::reply::Reply;
use crate::auth::AuthGate;
use crate::config::Config;
use crate::server::net::PortAllocator;
use crate::server::session::SharedSession;
use crate::transfer::TransferOutcome;
use async_trait::async_trait;
use std::net::SocketAddr;
use std::sync::Arc;
use tokio::sync::oneshot;

/// Everything a command handler needs: the session it's operating on, and
/// the server-wide collaborators (spec.md §4.1–§4.8) it may call into.
pub struct CommandContext {
    pub session: SharedSession,
    pub auth_gate: Arc<AuthGate>,
    pub config: Arc<Config>,
    pub port_allocator: Arc<PortAllocator>,
    pub local_addr: SocketAddr,
    pub tls_acceptor: Option<Arc<tokio_native_tls::TlsAcceptor>>,
    pub metrics_enabled: bool,
}

impl CommandContext {
    pub fn tls_available(&self) -> bool {
        self.tls_acceptor.is_some()
    }
}

/// What a handler produced, beyond the reply text itself: side effects the
/// control-loop (not the handler) is responsible for carrying out, since
/// they touch the socket/codec layer the handler doesn't own.
pub struct HandlerOutput {
    pub reply: Reply,
    /// Set by RETR/STOR/APPE/STOU/LIST/NLST/MLSD once a transfer worker has
    /// been spawned: the completion channel the control loop selects on
    /// alongside the next command (spec.md §4.5's "completion channel").
    pub spawned_transfer: Option<oneshot::Receiver<TransferOutcome>>,
    pub should_quit: bool,
    /// Set by `AUTH TLS`: the control loop performs the actual socket
    /// upgrade between this reply and the next command line (spec.md §4.7:
    /// "upgrade occurs only between complete command lines").
    pub request_tls_upgrade: bool,
    /// Set by `ABOR` when a transfer was in flight: the control loop waits
    /// for that transfer's completion reply (426, per spec.md §4.2: "the
    /// worker ... emits 426 ... and the session emits 226 ABOR OK") before
    /// sending this handler's own reply.
    pub wait_for_abort: bool,
}

impl HandlerOutput {
    pub fn reply_only(reply: Reply) -> Self {
        HandlerOutput {
            reply,
            spawned_transfer: None,
            should_quit: false,
            request_tls_upgrade: false,
            wait_for_abort: false,
        }
    }

    pub fn quit(reply: Reply) -> Self {
        HandlerOutput {
            reply,
            spawned_transfer: None,
            should_quit: true,
            request_tls_upgrade: false,
            wait_for_abort: false,
        }
    }

    pub fn tls_upgrade(reply: Reply) -> Self {
        HandlerOutput {
            reply,
            spawned_transfer: None,
            should_quit: false,
            request_tls_upgrade: true,
            wait_for_abort: false,
        }
    }

    pub fn transfer(reply: Reply, done: oneshot::Receiver<TransferOutcome>) -> Self {
        HandlerOutput {
            reply,
            spawned_transfer: Some(done),
            should_quit: false,
            request_tls_upgrade: false,
            wait_for_abort: false,
        }
    }

    pub fn abort_wait(reply: Reply, wait: bool) -> Self {
        HandlerOutput {
            reply,
            spawned_transfer: None,
            should_quit: false,
            request_tls_upgrade: false,
            wait_for_abort: wait,
        }
    }
}

#[async_trait]
pub trait CommandHandler: Send + Sync {
    async fn handle(&self, ctx: &CommandContext) -> Result<HandlerOutput, ControlChanError>;
}
