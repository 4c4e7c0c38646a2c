//! Per-IP bruteforce tracking (spec.md §3 "FailureCounter", §4.6, §5).
//!
//! Grounded on `libunftp`'s discipline for shared mutable state: "protected
//! by a single mutex; critical sections contain only map operations"
//! (spec.md §5). We use a `std::sync::Mutex` rather than `tokio::sync::Mutex`
//! because the critical section never awaits — exactly the property the
//! spec calls out.

use std::collections::HashMap;
use std::net::IpAddr;
use std::sync::Mutex;
use std::time::{Duration, Instant};

struct Entry {
    count: u32,
    first_fail: Instant,
}

/// Tracks failed `PASS` attempts per peer IP and enforces a cooldown once a
/// peer crosses `threshold`.
pub struct FailureCounter {
    threshold: u32,
    cooldown: Duration,
    entries: Mutex<HashMap<IpAddr, Entry>>,
}

impl FailureCounter {
    pub fn new(threshold: u32, cooldown: Duration) -> Self {
        FailureCounter {
            threshold,
            cooldown,
            entries: Mutex::new(HashMap::new()),
        }
    }

    /// True if `ip` is currently locked out. A lockout that has outlived the
    /// cooldown is cleared as a side effect (lazy expiry, matching the
    /// "reset, then" wording in spec.md §3).
    pub fn is_blocked(&self, ip: IpAddr) -> bool {
        let mut entries = self.entries.lock().expect("FailureCounter mutex poisoned");
        match entries.get(&ip) {
            Some(e) if e.count >= self.threshold => {
                if e.first_fail.elapsed() >= self.cooldown {
                    entries.remove(&ip);
                    false
                } else {
                    true
                }
            }
            _ => false,
        }
    }

    /// Records a failed attempt. Returns `true` if this call pushed the
    /// counter to or past `threshold` (i.e. the peer is now blocked).
    /// Concurrent callers race on the same map entry; spec.md §4.6 accepts
    /// that "a single winning increment may push the counter past the
    /// threshold" as correct behavior, so we don't need CAS loops here —
    /// the mutex already serializes the whole read-modify-write.
    pub fn record_failure(&self, ip: IpAddr) -> bool {
        let mut entries = self.entries.lock().expect("FailureCounter mutex poisoned");
        let now = Instant::now();
        let entry = entries.entry(ip).or_insert_with(|| Entry { count: 0, first_fail: now });
        entry.count += 1;
        entry.count >= self.threshold
    }

    /// Clears the counter for `ip` on a successful login.
    pub fn reset(&self, ip: IpAddr) {
        self.entries.lock().expect("FailureCounter mutex poisoned").remove(&ip);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::net::Ipv4Addr;

    fn ip() -> IpAddr {
        IpAddr::V4(Ipv4Addr::new(1, 2, 3, 4))
    }

    #[test]
    fn blocks_after_threshold() {
        let fc = FailureCounter::new(3, Duration::from_secs(300));
        assert!(!fc.is_blocked(ip()));
        assert!(!fc.record_failure(ip()));
        assert!(!fc.record_failure(ip()));
        assert!(fc.record_failure(ip()));
        assert!(fc.is_blocked(ip()));
    }

    #[test]
    fn reset_clears_counter() {
        let fc = FailureCounter::new(3, Duration::from_secs(300));
        fc.record_failure(ip());
        fc.record_failure(ip());
        fc.reset(ip());
        assert!(!fc.record_failure(ip()));
    }

    #[test]
    fn cooldown_expiry_unblocks() {
        let fc = FailureCounter::new(1, Duration::from_millis(10));
        fc.record_failure(ip());
        assert!(fc.is_blocked(ip()));
        std::thread::sleep(Duration::from_millis(20));
        assert!(!fc.is_blocked(ip()));
    }
}
