//! AuthGate (spec.md §4.6): validates credentials and guards session
//! establishment against bruteforce.

pub mod failure_counter;
pub mod local;
#[cfg(feature = "pam_auth")]
pub mod pam;

use crate::config::{AuthBackend, Config, UserAccount};
use failure_counter::FailureCounter;
use log::warn;
use std::net::IpAddr;
use std::sync::Arc;

/// The result of an `AuthGate::verify` call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Outcome {
    /// Credentials accepted; carries the matched account.
    Success(UserAccount),
    /// Credentials rejected by the backend.
    BadCredentials,
    /// The peer is currently locked out; the backend was not consulted.
    Blocked,
}

/// Validates credentials (local table or PAM) and maintains the per-IP
/// failure counters described in spec.md §3/§4.6.
pub struct AuthGate {
    backend: AuthBackend,
    users: Vec<UserAccount>,
    failures: FailureCounter,
    #[cfg(feature = "pam_auth")]
    pam_service: String,
}

impl AuthGate {
    /// Consulted by `Listener` on accept (spec.md §4.1), before a `Session`
    /// even exists — a blocked peer is closed with no 220 at all.
    pub fn is_peer_blocked(&self, ip: IpAddr) -> bool {
        self.failures.is_blocked(ip)
    }

    pub fn new(config: &Config) -> Arc<Self> {
        Arc::new(AuthGate {
            backend: config.auth_backend,
            users: config.users.clone(),
            failures: FailureCounter::new(config.bruteforce_threshold, config.bruteforce_cooldown()),
            #[cfg(feature = "pam_auth")]
            pam_service: "unftpd".to_string(),
        })
    }

    /// spec.md §4.6: `verify(user, pass, peer_ip) -> Outcome`.
    pub async fn verify(&self, user: &str, pass: &str, peer_ip: IpAddr) -> Outcome {
        if self.failures.is_blocked(peer_ip) {
            return Outcome::Blocked;
        }

        let ok = match self.backend {
            AuthBackend::Local => self.users.iter().any(|u| u.name == user && u.password.as_deref().map(|p| local::constant_time_eq(p, pass)).unwrap_or(false)),
            AuthBackend::Pam => self.verify_pam(user, pass).await,
        };

        if ok {
            self.failures.reset(peer_ip);
            // The PAM backend authenticates against the system, not the
            // local table; an account record still needs to exist so the
            // rest of the session (home dir, read-only flag) has somewhere
            // to read it from.
            match self.users.iter().find(|u| u.name == user) {
                Some(u) => Outcome::Success(u.clone()),
                None if self.backend == AuthBackend::Pam => Outcome::Success(UserAccount {
                    name: user.to_string(),
                    password: None,
                    home: std::path::PathBuf::from("/"),
                    ownership_override: None,
                    read_only: false,
                }),
                None => Outcome::BadCredentials,
            }
        } else {
            let now_blocked = self.failures.record_failure(peer_ip);
            if now_blocked {
                warn!("peer {} locked out after repeated failed logins", peer_ip);
                crate::metrics::handle().auth_lockouts_total.inc();
            }
            crate::metrics::handle().auth_failures_total.inc();
            Outcome::BadCredentials
        }
    }

    #[cfg(feature = "pam_auth")]
    async fn verify_pam(&self, user: &str, pass: &str) -> bool {
        pam::authenticate(self.pam_service.clone(), user.to_string(), pass.to_string())
            .await
            .unwrap_or(false)
    }

    #[cfg(not(feature = "pam_auth"))]
    async fn verify_pam(&self, _user: &str, _pass: &str) -> bool {
        warn!("auth_backend = Pam configured but the pam_auth feature is not compiled in");
        false
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::net::Ipv4Addr;

    fn test_config() -> Config {
        Config {
            control_port: 2121,
            max_sessions: 10,
            max_sessions_per_ip: 6,
            idle_timeout_s: 300,
            passive_port_lo: 50000,
            passive_port_hi: 50100,
            nat_ip: None,
            tls_cert_path: None,
            tls_key_path: None,
            force_tls: false,
            auth_backend: AuthBackend::Local,
            users: vec![UserAccount {
                name: "admin".into(),
                password: Some("admin123".into()),
                home: "/srv/ftp/admin".into(),
                ownership_override: None,
                read_only: false,
            }],
            bruteforce_threshold: 3,
            bruteforce_cooldown_s: 300,
            passive_accept_timeout_s: 30,
        }
    }

    fn ip() -> IpAddr {
        IpAddr::V4(Ipv4Addr::new(10, 0, 0, 1))
    }

    #[tokio::test]
    async fn correct_password_succeeds() {
        let gate = AuthGate::new(&test_config());
        let outcome = gate.verify("admin", "admin123", ip()).await;
        assert!(matches!(outcome, Outcome::Success(u) if u.name == "admin"));
    }

    #[tokio::test]
    async fn wrong_password_fails_and_counts() {
        let gate = AuthGate::new(&test_config());
        assert_eq!(gate.verify("admin", "wrong", ip()).await, Outcome::BadCredentials);
        assert_eq!(gate.verify("admin", "wrong", ip()).await, Outcome::BadCredentials);
        assert_eq!(gate.verify("admin", "wrong", ip()).await, Outcome::BadCredentials);
        // Fourth attempt: now blocked regardless of credentials.
        assert_eq!(gate.verify("admin", "admin123", ip()).await, Outcome::Blocked);
    }

    #[tokio::test]
    async fn success_resets_counter() {
        let gate = AuthGate::new(&test_config());
        gate.verify("admin", "wrong", ip()).await;
        gate.verify("admin", "wrong", ip()).await;
        assert!(matches!(gate.verify("admin", "admin123", ip()).await, Outcome::Success(_)));
        // Counter reset; two more failures shouldn't trip the threshold yet.
        assert_eq!(gate.verify("admin", "wrong", ip()).await, Outcome::BadCredentials);
        assert_eq!(gate.verify("admin", "wrong", ip()).await, Outcome::BadCredentials);
        assert!(matches!(gate.verify("admin", "admin123", ip()).await, Outcome::Success(_)));
    }
}
