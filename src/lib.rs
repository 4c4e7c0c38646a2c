//! Core control/data channel engine for a lightweight, embeddable FTP(S) server.
//!
//! This crate implements RFC 959 plus the extensions that are commonly
//! deployed alongside it: EPSV/EPRT (RFC 2428), MLSD/SIZE/MDTM/REST
//! (RFC 3659), and explicit TLS via AUTH TLS / PBSZ / PROT (RFC 4217).
//!
//! The entry point is [`Server`], built from a [`config::Config`] (which in
//! turn drives [`auth::AuthGate`]), and started with [`Server::listen`].
//! Parsing an actual config file is left to the caller — this crate never
//! opens one itself (see [`config`]'s docs); this example builds a
//! [`config::Config`] directly.
//!
//! ```no_run
//! use unftpd_core::{Server, config::{Config, AuthBackend, UserAccount}};
//!
//! # async fn go() -> Result<(), Box<dyn std::error::Error>> {
//! let config = Config {
//!     control_port: 2121,
//!     max_sessions: 2048,
//!     max_sessions_per_ip: 6,
//!     idle_timeout_s: 300,
//!     passive_port_lo: 50000,
//!     passive_port_hi: 50100,
//!     nat_ip: None,
//!     tls_cert_path: None,
//!     tls_key_path: None,
//!     force_tls: false,
//!     auth_backend: AuthBackend::Local,
//!     users: vec![UserAccount {
//!         name: "anonymous".into(),
//!         password: Some("".into()),
//!         home: "/srv/ftp".into(),
//!         ownership_override: None,
//!         read_only: true,
//!     }],
//!     bruteforce_threshold: 3,
//!     bruteforce_cooldown_s: 300,
//!     passive_accept_timeout_s: 30,
//! };
//! let server = Server::new(config)?;
//! server.listen().await?;
//! # Ok(())
//! # }
//! ```

pub mod auth;
pub mod config;
pub mod error;
pub mod fs;
pub mod metrics;
pub mod server;
pub mod transfer;

pub use config::Config;
pub use error::{Error, Result};
pub use server::Server;
