use std::net::SocketAddr;
use std::time::{Duration, Instant};

use ahash::HashMap;
use parking_lot::Mutex;

/// Addresses that have been pinged and have not yet answered, with the time
/// the ping went out. At most one record per address.
///
/// Lock order is roster before pings, and the lock is never held across a
/// socket send; the record for an address is cleared under the roster write
/// lock (by ret-ping, disconn, kick or eviction) so a reply that already
/// landed always preempts the eviction scan.
#[derive(Default)]
pub struct PendingPings {
    pending: Mutex<HashMap<SocketAddr, Instant>>,
}

impl PendingPings {
    /// Record a ping for `addr` unless one is already outstanding. Returns
    /// whether a new record was created.
    pub fn track(&self, addr: SocketAddr, now: Instant) -> bool {
        let mut pending = self.pending.lock();
        if pending.contains_key(&addr) {
            return false;
        }

        pending.insert(addr, now);
        true
    }

    /// Drop the record for `addr`, if any. Returns whether one existed.
    pub fn clear(&self, addr: &SocketAddr) -> bool {
        self.pending.lock().remove(addr).is_some()
    }

    pub fn is_pending(&self, addr: &SocketAddr) -> bool {
        self.pending.lock().contains_key(addr)
    }

    /// Addresses whose ping has been outstanding for at least `timeout`.
    pub fn expired(&self, now: Instant, timeout: Duration) -> Vec<SocketAddr> {
        self.pending
            .lock()
            .iter()
            .filter(|(_, sent)| now.duration_since(**sent) >= timeout)
            .map(|(addr, _)| *addr)
            .collect()
    }
}
