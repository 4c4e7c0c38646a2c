//! Session (spec.md §3): one per control connection.

use crate::config::UserAccount;
use crate::transfer::{CancelFlag, TransferMode};
use std::net::{IpAddr, SocketAddr};
use std::path::PathBuf;
use std::sync::Arc;
use tokio::sync::Mutex;

/// Where a session sits in the authentication sub-machine (spec.md §3, §4.2).
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AuthState {
    AwaitUser,
    AwaitPass(String),
    Authenticated(UserAccount),
    Closing,
}

/// What, if anything, the next data-channel operation will do (spec.md §3).
pub enum DataChannelIntent {
    None,
    /// A PASV/EPSV listener is open on this port, awaiting a client connect.
    Passive { listener: tokio::net::TcpListener, port: u16 },
    /// PORT/EPRT was issued; dial out to this address on the next transfer.
    Active { peer_addr: SocketAddr },
}

impl std::fmt::Debug for DataChannelIntent {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            DataChannelIntent::None => write!(f, "None"),
            DataChannelIntent::Passive { port, .. } => write!(f, "Passive {{ port: {} }}", port),
            DataChannelIntent::Active { peer_addr } => write!(f, "Active {{ peer_addr: {} }}", peer_addr),
        }
    }
}

/// Handle to a transfer worker running on behalf of this session. Dropping
/// it (or calling `abort`) signals cancellation; the worker owns its own
/// socket/file handles so nothing further needs releasing here (spec.md §9:
/// "the Session [is] the sole owner of its resources").
pub struct WorkerHandle {
    pub cancel: CancelFlag,
    pub join: tokio::task::JoinHandle<()>,
}

impl WorkerHandle {
    pub fn abort(&self) {
        self.cancel.cancel();
    }
}

impl Drop for WorkerHandle {
    fn drop(&mut self) {
        self.cancel.cancel();
    }
}

/// A guard releasing a held passive port back to the allocator on drop,
/// realizing spec.md §3's PassivePort ledger invariant structurally instead
/// of via external bookkeeping (spec.md §9).
pub struct PassivePortGuard {
    pub port: u16,
    allocator: Arc<crate::server::net::port_allocator::PortAllocator>,
}

impl PassivePortGuard {
    pub fn new(port: u16, allocator: Arc<crate::server::net::port_allocator::PortAllocator>) -> Self {
        PassivePortGuard { port, allocator }
    }
}

impl Drop for PassivePortGuard {
    fn drop(&mut self) {
        self.allocator.release(self.port);
    }
}

/// Per-connection protocol state (spec.md §3).
pub struct Session {
    pub peer_addr: SocketAddr,
    pub auth_state: AuthState,
    /// Virtual cwd, always absolute and normalized.
    pub cwd: String,
    /// Host path that virtual `/` maps to, once authenticated.
    pub user_root: Option<PathBuf>,
    pub transfer_mode: TransferMode,
    /// Cleared after one transfer or on any non-transfer command.
    pub rest_offset: Option<u64>,
    /// Set by RNFR; cleared by RNTO or any other command.
    pub rename_from: Option<PathBuf>,
    pub data_intent: DataChannelIntent,
    pub passive_port_guard: Option<PassivePortGuard>,
    pub worker: Option<WorkerHandle>,
    /// True once AUTH TLS has upgraded the control channel.
    pub control_tls: bool,
    /// PROT P (true) vs PROT C (false, default).
    pub data_tls: bool,
}

impl Session {
    pub fn new(peer_addr: SocketAddr) -> Self {
        Session {
            peer_addr,
            auth_state: AuthState::AwaitUser,
            cwd: "/".to_string(),
            user_root: None,
            transfer_mode: TransferMode::Binary,
            rest_offset: None,
            rename_from: None,
            data_intent: DataChannelIntent::None,
            passive_port_guard: None,
            worker: None,
            control_tls: false,
            data_tls: false,
        }
    }

    pub fn peer_ip(&self) -> IpAddr {
        self.peer_addr.ip()
    }

    pub fn is_authenticated(&self) -> bool {
        matches!(self.auth_state, AuthState::Authenticated(_))
    }

    pub fn user(&self) -> Option<&UserAccount> {
        match &self.auth_state {
            AuthState::Authenticated(u) => Some(u),
            _ => None,
        }
    }

    /// Clears state that spec.md §4.2 says any non-{RNTO,transfer} command
    /// resets: the pending rename source, and (separately, by callers that
    /// just consumed it) the REST offset.
    pub fn clear_rename_from(&mut self) {
        self.rename_from = None;
    }

    pub fn has_active_transfer(&self) -> bool {
        self.worker.is_some()
    }

    pub fn discard_data_intent(&mut self) {
        self.data_intent = DataChannelIntent::None;
        self.passive_port_guard = None;
    }
}

pub type SharedSession = Arc<Mutex<Session>>;
