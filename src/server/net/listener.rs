//! Listener (spec.md §4.1): accepts control connections, enforces
//! global/per-IP connection caps, hands off sessions.

use crate::auth::AuthGate;
use log::{info, warn};
use std::collections::HashMap;
use std::net::{IpAddr, SocketAddr};
use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::{Arc, Mutex};
use tokio::net::{TcpListener, TcpStream};
use tokio::sync::Notify;
use tokio::time::Duration;

/// Why a connection never became a session (metrics label, spec.md §4.1).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RejectReason {
    PerIpCap,
    Bruteforce,
}

/// RAII guard occupying one global + one per-IP session slot; releasing on
/// drop wakes anyone backpressured on the global cap (spec.md §4.1, §9:
/// resource release tied to session lifetime, not external bookkeeping).
pub struct SessionSlot {
    peer_ip: IpAddr,
    active_total: Arc<AtomicU32>,
    active_per_ip: Arc<Mutex<HashMap<IpAddr, u32>>>,
    capacity_freed: Arc<Notify>,
}

impl Drop for SessionSlot {
    fn drop(&mut self) {
        self.active_total.fetch_sub(1, Ordering::SeqCst);
        let mut map = self.active_per_ip.lock().expect("listener mutex poisoned");
        if let Some(count) = map.get_mut(&self.peer_ip) {
            *count -= 1;
            if *count == 0 {
                map.remove(&self.peer_ip);
            }
        }
        self.capacity_freed.notify_waiters();
    }
}

/// Binds the control port (IPv4, and IPv6 if the bind address provides one)
/// and accepts connections subject to the caps in spec.md §4.1.
pub struct Listener {
    listeners: Vec<TcpListener>,
    auth_gate: Arc<AuthGate>,
    max_sessions: u32,
    max_sessions_per_ip: u32,
    active_total: Arc<AtomicU32>,
    active_per_ip: Arc<Mutex<HashMap<IpAddr, u32>>>,
    capacity_freed: Arc<Notify>,
}

/// What `accept_next` yielded.
pub enum Accepted {
    /// A new control connection that passed every cap/bruteforce check.
    Session(TcpStream, SocketAddr, SessionSlot),
    /// A connection was rejected after its socket was already open; caller
    /// should send `reply` (if any) then close. `reply` is `None` for a
    /// blocked peer, which spec.md §4.1 says gets no reply at all.
    Rejected(TcpStream, Option<&'static str>, RejectReason),
}

impl Listener {
    pub async fn bind(addr: SocketAddr, auth_gate: Arc<AuthGate>, max_sessions: u32, max_sessions_per_ip: u32) -> std::io::Result<Self> {
        let listener = TcpListener::bind(addr).await?;
        Ok(Listener {
            listeners: vec![listener],
            auth_gate,
            max_sessions,
            max_sessions_per_ip,
            active_total: Arc::new(AtomicU32::new(0)),
            active_per_ip: Arc::new(Mutex::new(HashMap::new())),
            capacity_freed: Arc::new(Notify::new()),
        })
    }

    /// Also binds an IPv6 control socket on the same port, for dual-stack
    /// deployments (spec.md §4.1: "Binds one or two sockets").
    pub async fn bind_dual_stack(port: u16, auth_gate: Arc<AuthGate>, max_sessions: u32, max_sessions_per_ip: u32) -> std::io::Result<Self> {
        let v4 = TcpListener::bind(SocketAddr::new(IpAddr::V4(std::net::Ipv4Addr::UNSPECIFIED), port)).await?;
        let v6 = TcpListener::bind(SocketAddr::new(IpAddr::V6(std::net::Ipv6Addr::UNSPECIFIED), port)).await;
        let mut listeners = vec![v4];
        match v6 {
            Ok(l) => listeners.push(l),
            Err(e) => info!("no IPv6 control listener bound (this is fine on IPv4-only hosts): {}", e),
        }
        Ok(Listener {
            listeners,
            auth_gate,
            max_sessions,
            max_sessions_per_ip,
            active_total: Arc::new(AtomicU32::new(0)),
            active_per_ip: Arc::new(Mutex::new(HashMap::new())),
            capacity_freed: Arc::new(Notify::new()),
        })
    }

    /// Waits (without calling `accept()`) until there's global capacity.
    /// spec.md §4.1: "the accept is deferred, not rejected".
    async fn wait_for_global_capacity(&self) {
        loop {
            if (self.active_total.load(Ordering::SeqCst) as u32) < self.max_sessions {
                return;
            }
            self.capacity_freed.notified().await;
        }
    }

    async fn accept_any(&self) -> std::io::Result<(TcpStream, SocketAddr)> {
        if self.listeners.len() == 1 {
            return self.listeners[0].accept().await;
        }
        // Dual-stack: race both listeners' accept futures.
        tokio::select! {
            r = self.listeners[0].accept() => r,
            r = self.listeners[1].accept() => r,
        }
    }

    /// Accepts the next connection, applying backpressure and both caps.
    /// Accept-loop errors are retried with exponential backoff (spec.md §7),
    /// capped at 1 second, rather than propagated to the caller.
    pub async fn accept_next(&self) -> Accepted {
        let mut backoff = Duration::from_millis(10);
        loop {
            self.wait_for_global_capacity().await;

            let (stream, peer_addr) = match self.accept_any().await {
                Ok(v) => v,
                Err(e) => {
                    warn!("accept() failed: {}; retrying in {:?}", e, backoff);
                    tokio::time::sleep(backoff).await;
                    backoff = (backoff * 2).min(Duration::from_secs(1));
                    continue;
                }
            };
            backoff = Duration::from_millis(10);

            let peer_ip = peer_addr.ip();

            if self.auth_gate.is_peer_blocked(peer_ip) {
                info!("rejecting connection from locked-out peer {}", peer_ip);
                return Accepted::Rejected(stream, None, RejectReason::Bruteforce);
            }

            {
                let mut map = self.active_per_ip.lock().expect("listener mutex poisoned");
                let count = map.entry(peer_ip).or_insert(0);
                if *count >= self.max_sessions_per_ip {
                    return Accepted::Rejected(stream, Some("421 Too many connections from your address\r\n"), RejectReason::PerIpCap);
                }
                *count += 1;
            }
            self.active_total.fetch_add(1, Ordering::SeqCst);

            let slot = SessionSlot {
                peer_ip,
                active_total: self.active_total.clone(),
                active_per_ip: self.active_per_ip.clone(),
                capacity_freed: self.capacity_freed.clone(),
            };

            return Accepted::Session(stream, peer_addr, slot);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{AuthBackend, Config};

    fn test_config() -> Config {
        Config {
            control_port: 0,
            max_sessions: 2,
            max_sessions_per_ip: 1,
            idle_timeout_s: 300,
            passive_port_lo: 50000,
            passive_port_hi: 50010,
            nat_ip: None,
            tls_cert_path: None,
            tls_key_path: None,
            force_tls: false,
            auth_backend: AuthBackend::Local,
            users: vec![],
            bruteforce_threshold: 3,
            bruteforce_cooldown_s: 300,
            passive_accept_timeout_s: 30,
        }
    }

    #[tokio::test]
    async fn per_ip_cap_rejects_second_connection_from_same_peer() {
        let gate = AuthGate::new(&test_config());
        let listener = Listener::bind("127.0.0.1:0".parse().unwrap(), gate, 10, 1).await.unwrap();
        let addr = listener.listeners[0].local_addr().unwrap();

        let _c1 = TcpStream::connect(addr).await.unwrap();
        let first = listener.accept_next().await;
        let _slot = match first {
            Accepted::Session(_, _, slot) => slot,
            _ => panic!("expected first connection to be accepted"),
        };

        let _c2 = TcpStream::connect(addr).await.unwrap();
        let second = listener.accept_next().await;
        assert!(matches!(second, Accepted::Rejected(_, _, RejectReason::PerIpCap)));
    }

    #[tokio::test]
    async fn slot_release_frees_per_ip_capacity() {
        let gate = AuthGate::new(&test_config());
        let listener = Listener::bind("127.0.0.1:0".parse().unwrap(), gate, 10, 1).await.unwrap();
        let addr = listener.listeners[0].local_addr().unwrap();

        let _c1 = TcpStream::connect(addr).await.unwrap();
        let first = listener.accept_next().await;
        match first {
            Accepted::Session(_, _, slot) => drop(slot),
            _ => panic!("expected first connection to be accepted"),
        };

        let _c2 = TcpStream::connect(addr).await.unwrap();
        let second = listener.accept_next().await;
        assert!(matches!(second, Accepted::Session(..)));
    }
}
