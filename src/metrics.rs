//! Observability surface (spec.md §9, "Global mutable counters" /
//! "observability of server memory usage"). Grounded on `libunftp`'s
//! `metrics` module and its opt-in `Server::metrics()` builder method: this
//! module registers a small set of `prometheus` counters/gauges, lazily,
//! the way the teacher reaches for `lazy_static` (`Cargo.toml`) for its own
//! process-wide statics. Nothing here allocates global mutable state by
//! hand the way the original C server's memory-counter-behind-a-mutex does;
//! `prometheus`'s own atomics back every metric.

use once_cell::sync::Lazy;
use prometheus::{IntCounter, IntCounterVec, IntGauge, Opts, Registry};

pub struct Metrics {
    pub registry: Registry,
    pub sessions_accepted_total: IntCounter,
    pub sessions_rejected_total: IntCounterVec,
    pub sessions_active: IntGauge,
    pub commands_total: IntCounterVec,
    pub replies_total: IntCounterVec,
    pub transfer_bytes_total: IntCounterVec,
    pub auth_failures_total: IntCounter,
    pub auth_lockouts_total: IntCounter,
}

impl Metrics {
    fn new() -> Self {
        let registry = Registry::new();

        let sessions_accepted_total = IntCounter::new("unftpd_sessions_accepted_total", "Control connections accepted").unwrap();
        let sessions_rejected_total = IntCounterVec::new(
            Opts::new("unftpd_sessions_rejected_total", "Control connections rejected before a session was created"),
            &["reason"],
        )
        .unwrap();
        let sessions_active = IntGauge::new("unftpd_sessions_active", "Currently open control sessions").unwrap();
        let commands_total = IntCounterVec::new(Opts::new("unftpd_commands_total", "Commands processed, by verb"), &["verb"]).unwrap();
        let replies_total = IntCounterVec::new(Opts::new("unftpd_replies_total", "Replies sent, by status code"), &["code"]).unwrap();
        let transfer_bytes_total =
            IntCounterVec::new(Opts::new("unftpd_transfer_bytes_total", "Bytes transferred, by direction"), &["direction"]).unwrap();
        let auth_failures_total = IntCounter::new("unftpd_auth_failures_total", "Failed PASS attempts").unwrap();
        let auth_lockouts_total = IntCounter::new("unftpd_auth_lockouts_total", "Peers that crossed the bruteforce threshold").unwrap();

        registry.register(Box::new(sessions_accepted_total.clone())).ok();
        registry.register(Box::new(sessions_rejected_total.clone())).ok();
        registry.register(Box::new(sessions_active.clone())).ok();
        registry.register(Box::new(commands_total.clone())).ok();
        registry.register(Box::new(replies_total.clone())).ok();
        registry.register(Box::new(transfer_bytes_total.clone())).ok();
        registry.register(Box::new(auth_failures_total.clone())).ok();
        registry.register(Box::new(auth_lockouts_total.clone())).ok();

        Metrics {
            registry,
            sessions_accepted_total,
            sessions_rejected_total,
            sessions_active,
            commands_total,
            replies_total,
            transfer_bytes_total,
            auth_failures_total,
            auth_lockouts_total,
        }
    }
}

static METRICS: Lazy<Metrics> = Lazy::new(Metrics::new);

/// Returns the process-wide metrics registry. Cheap and idempotent; the
/// registry is only scraped by callers who opted in via `Server::metrics()`.
pub fn handle() -> &'static Metrics {
    &METRICS
}
