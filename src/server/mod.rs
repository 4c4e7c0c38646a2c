//! Top-level server wiring (spec.md §2's overall data flow: a `Listener`
//! handing off to one `SessionFSM` per client). Grounded on `libunftp`'s
//! `server::Server` builder and its `listen()`/accept-loop in
//! `server/ftpserver.rs`, generalized from the teacher's generic
//! `Server<S, U>` (parameterized over a pluggable `StorageBackend` and
//! `Authenticator`) to this crate's concrete filesystem + [`crate::auth::AuthGate`]
//! (spec.md §1 Non-goals: no pluggable storage backend).

pub mod controlchan;
pub mod datachan;
pub mod net;
pub mod session;
pub mod tls;

use crate::auth::AuthGate;
use crate::config::Config;
use crate::error::{Error, Result};
use crate::server::net::{Accepted, Listener, PortAllocator, RejectReason};
use log::{info, warn};
use std::future::Future;
use std::sync::Arc;
use tokio::io::AsyncWriteExt;
use tokio_native_tls::TlsAcceptor;

/// A configured, not-yet-listening server (spec.md §6: built from a
/// validated [`Config`]). Cheap to construct; all the actual work happens
/// in [`Server::listen`]/[`Server::listen_until`].
pub struct Server {
    config: Arc<Config>,
    auth_gate: Arc<AuthGate>,
    port_allocator: Arc<PortAllocator>,
    tls_acceptor: Option<Arc<TlsAcceptor>>,
}

impl Server {
    /// Validates `config` (spec.md §6) and, if TLS is configured, loads the
    /// identity eagerly so a bad cert/key fails at startup rather than on
    /// the first `AUTH TLS`.
    pub fn new(config: Config) -> Result<Self> {
        config.validate()?;

        let tls_acceptor = if config.tls_enabled() {
            let cert = config.tls_cert_path.clone().expect("tls_enabled() implies both paths are set");
            let key = config.tls_key_path.clone().expect("tls_enabled() implies both paths are set");
            let identity = tls::load_identity(&cert, &key, "").map_err(|source| Error::TlsSetup {
                cert: cert.clone(),
                key: key.clone(),
                source,
            })?;
            let native_acceptor = native_tls::TlsAcceptor::builder(identity)
                .build()
                .map_err(|e| Error::TlsSetup { cert, key, source: tls::TlsLoadError::Parse(e) })?;
            Some(Arc::new(TlsAcceptor::from(native_acceptor)))
        } else {
            None
        };

        let config = Arc::new(config);
        let auth_gate = AuthGate::new(&config);
        let port_allocator = Arc::new(PortAllocator::new(config.passive_port_lo, config.passive_port_hi));

        Ok(Server { config, auth_gate, port_allocator, tls_acceptor })
    }

    /// The process-wide [`prometheus::Registry`] (spec.md §9). Always
    /// populated; whether a deployment scrapes it is the caller's choice.
    pub fn metrics_registry(&self) -> &prometheus::Registry {
        &crate::metrics::handle().registry
    }

    /// Binds the control port and serves connections forever (spec.md §4.1).
    pub async fn listen(&self) -> Result<()> {
        self.listen_until(std::future::pending()).await
    }

    /// As [`Server::listen`], but stops *accepting new connections* once
    /// `shutdown` resolves. Sessions already in flight are left to end on
    /// their own per spec.md §3's lifecycle; this crate does not force-close
    /// them, matching `libunftp`'s graceful-shutdown behavior.
    pub async fn listen_until(&self, shutdown: impl Future<Output = ()>) -> Result<()> {
        let listener = Listener::bind_dual_stack(self.config.control_port, self.auth_gate.clone(), self.config.max_sessions, self.config.max_sessions_per_ip)
            .await
            .map_err(|source| Error::Bind {
                addr: std::net::SocketAddr::new(std::net::IpAddr::V4(std::net::Ipv4Addr::UNSPECIFIED), self.config.control_port),
                source,
            })?;

        info!("unftpd listening on port {}", self.config.control_port);
        tokio::pin!(shutdown);

        loop {
            tokio::select! {
                _ = &mut shutdown => {
                    info!("shutdown requested; no longer accepting new connections");
                    return Ok(());
                }
                accepted = listener.accept_next() => {
                    self.handle_accepted(accepted);
                }
            }
        }
    }

    fn handle_accepted(&self, accepted: Accepted) {
        match accepted {
            Accepted::Session(stream, peer_addr, slot) => {
                let local_addr = match stream.local_addr() {
                    Ok(a) => a,
                    Err(e) => {
                        warn!("dropping accepted connection, could not read local_addr: {}", e);
                        return;
                    }
                };
                crate::metrics::handle().sessions_accepted_total.inc();

                let config = self.config.clone();
                let auth_gate = self.auth_gate.clone();
                let port_allocator = self.port_allocator.clone();
                let tls_acceptor = self.tls_acceptor.clone();

                tokio::spawn(async move {
                    let _slot = slot;
                    controlchan::run_session(stream, peer_addr, local_addr, config, auth_gate, port_allocator, tls_acceptor, true).await;
                });
            }
            Accepted::Rejected(mut stream, reply, reason) => {
                let label = match reason {
                    RejectReason::PerIpCap => "per_ip_cap",
                    RejectReason::Bruteforce => "bruteforce",
                };
                crate::metrics::handle().sessions_rejected_total.with_label_values(&[label]).inc();

                tokio::spawn(async move {
                    if let Some(text) = reply {
                        let _ = stream.write_all(text.as_bytes()).await;
                    }
                    let _ = stream.shutdown().await;
                });
            }
        }
    }
}
