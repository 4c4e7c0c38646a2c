//! The configuration structure the core consumes.
//!
//! Parsing an actual config file (TOML, JSON, whatever the packaging layer
//! picks) is out of scope for this crate, same as it is out of scope for
//! `libunftp` itself — `libunftp`'s `jsonfile_auth` feature only derives
//! `serde` on its credential table and leaves the surrounding file format to
//! the caller. We do the same here: `Config` derives `Serialize` /
//! `Deserialize` so any `serde`-compatible format can populate it, but this
//! crate never opens a file itself.

use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::time::Duration;

/// Selects where [`crate::auth::AuthGate`] verifies credentials.
#[derive(Clone, Copy, Debug, Eq, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AuthBackend {
    /// Compare against the plaintext passwords in [`Config::users`].
    Local,
    /// Delegate to the system's PAM stack. Requires the `pam_auth` feature.
    Pam,
}

/// Optional uid/gid override applied to files a user uploads.
#[derive(Clone, Copy, Debug, Eq, PartialEq, Serialize, Deserialize)]
pub struct OwnershipOverride {
    pub uid: u32,
    pub gid: u32,
}

/// One configured FTP account.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct UserAccount {
    pub name: String,
    /// Present only when [`AuthBackend::Local`] is in effect; ignored by PAM.
    #[serde(default)]
    pub password: Option<String>,
    pub home: PathBuf,
    #[serde(default)]
    pub ownership_override: Option<OwnershipOverride>,
    #[serde(default)]
    pub read_only: bool,
}

/// The structure specified in spec.md §6: everything the core needs to run,
/// with the config-file parser itself treated as an external collaborator.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Config {
    pub control_port: u16,
    #[serde(default = "default_max_sessions")]
    pub max_sessions: u32,
    #[serde(default = "default_max_sessions_per_ip")]
    pub max_sessions_per_ip: u32,
    #[serde(default = "default_idle_timeout_s")]
    pub idle_timeout_s: u64,
    pub passive_port_lo: u16,
    pub passive_port_hi: u16,
    #[serde(default)]
    pub nat_ip: Option<std::net::IpAddr>,
    #[serde(default)]
    pub tls_cert_path: Option<PathBuf>,
    #[serde(default)]
    pub tls_key_path: Option<PathBuf>,
    #[serde(default)]
    pub force_tls: bool,
    pub auth_backend: AuthBackend,
    #[serde(default)]
    pub users: Vec<UserAccount>,
    #[serde(default = "default_bruteforce_threshold")]
    pub bruteforce_threshold: u32,
    #[serde(default = "default_bruteforce_cooldown_s")]
    pub bruteforce_cooldown_s: u64,
    /// Accept timeout for a PASV/EPSV listener (spec.md §5). Not part of the
    /// enumerated §6 field list but needed to realize the 30s default it
    /// names; exposed here so deployments can tune it.
    #[serde(default = "default_passive_accept_timeout_s")]
    pub passive_accept_timeout_s: u64,
}

fn default_max_sessions() -> u32 {
    2048
}
fn default_max_sessions_per_ip() -> u32 {
    6
}
fn default_idle_timeout_s() -> u64 {
    300
}
fn default_bruteforce_threshold() -> u32 {
    3
}
fn default_bruteforce_cooldown_s() -> u64 {
    300
}
fn default_passive_accept_timeout_s() -> u64 {
    30
}

/// Errors surfaced by [`Config::validate`].
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("passive_port_lo ({lo}) must be <= passive_port_hi ({hi})")]
    InvalidPassivePortRange { lo: u16, hi: u16 },
    #[error("tls_cert_path and tls_key_path must both be set, or both left unset")]
    IncompleteTlsConfig,
    #[error("force_tls requires tls_cert_path/tls_key_path to be configured")]
    ForceTlsWithoutTls,
    #[error("bruteforce_threshold must be at least 1")]
    ZeroBruteforceThreshold,
    #[error("auth_backend is Local but no users are configured")]
    NoLocalUsers,
    #[error("user {0:?} has auth_backend Local but no password set")]
    LocalUserMissingPassword(String),
}

impl Config {
    /// Cross-field validation the spec implies but the field list alone
    /// doesn't express.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.passive_port_lo > self.passive_port_hi {
            return Err(ConfigError::InvalidPassivePortRange {
                lo: self.passive_port_lo,
                hi: self.passive_port_hi,
            });
        }
        let tls_configured = self.tls_cert_path.is_some() || self.tls_key_path.is_some();
        let tls_complete = self.tls_cert_path.is_some() && self.tls_key_path.is_some();
        if tls_configured && !tls_complete {
            return Err(ConfigError::IncompleteTlsConfig);
        }
        if self.force_tls && !tls_complete {
            return Err(ConfigError::ForceTlsWithoutTls);
        }
        if self.bruteforce_threshold == 0 {
            return Err(ConfigError::ZeroBruteforceThreshold);
        }
        if self.auth_backend == AuthBackend::Local {
            if self.users.is_empty() {
                return Err(ConfigError::NoLocalUsers);
            }
            for u in &self.users {
                if u.password.is_none() {
                    return Err(ConfigError::LocalUserMissingPassword(u.name.clone()));
                }
            }
        }
        Ok(())
    }

    pub fn idle_timeout(&self) -> Duration {
        Duration::from_secs(self.idle_timeout_s)
    }

    pub fn bruteforce_cooldown(&self) -> Duration {
        Duration::from_secs(self.bruteforce_cooldown_s)
    }

    pub fn passive_accept_timeout(&self) -> Duration {
        Duration::from_secs(self.passive_accept_timeout_s)
    }

    pub fn tls_enabled(&self) -> bool {
        self.tls_cert_path.is_some() && self.tls_key_path.is_some()
    }

    pub fn find_user(&self, name: &str) -> Option<&UserAccount> {
        self.users.iter().find(|u| u.name == name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn base_config() -> Config {
        Config {
            control_port: 2121,
            max_sessions: 2048,
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

    #[test]
    fn valid_config_passes() {
        assert!(base_config().validate().is_ok());
    }

    #[test]
    fn rejects_inverted_passive_range() {
        let mut c = base_config();
        c.passive_port_lo = 60000;
        c.passive_port_hi = 50000;
        assert!(matches!(c.validate(), Err(ConfigError::InvalidPassivePortRange { .. })));
    }

    #[test]
    fn rejects_force_tls_without_certs() {
        let mut c = base_config();
        c.force_tls = true;
        assert!(matches!(c.validate(), Err(ConfigError::ForceTlsWithoutTls)));
    }

    #[test]
    fn rejects_local_user_without_password() {
        let mut c = base_config();
        c.users[0].password = None;
        assert!(matches!(c.validate(), Err(ConfigError::LocalUserMissingPassword(_))));
    }
}
