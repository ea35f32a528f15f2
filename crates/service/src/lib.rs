//! ## iChat service core
//!
//! Everything the chat server does between receiving a datagram and knowing
//! which datagrams to send back: the roster and its per-entry mute sets, the
//! bounded history ring, the pending-ping set, the command router with its
//! handlers, and the liveness sweep. The crate is transport-free; the
//! embedding binary owns the socket and performs every send after routing has
//! returned and released all locks.

pub mod history;
pub mod liveness;
pub mod roster;
pub mod routing;

use std::net::SocketAddr;
use std::sync::Arc;
use std::time::{Duration, Instant};

use crate::history::History;
use crate::liveness::PendingPings;
use crate::roster::Roster;
use crate::routing::{Outbound, Router};

/// A client whose source port equals this value at `conn` time is the admin.
/// This is the protocol's whole authentication story, on purpose.
pub const ADMIN_PORT: u16 = 6666;

/// Number of broadcast lines replayed to a joining client.
pub const HISTORY_CAPACITY: usize = 15;

/// Default cadence of the liveness sweep.
pub const MONITOR_INTERVAL: Duration = Duration::from_secs(30);

/// Default idle time after which a client is pinged.
pub const INACTIVITY_THRESHOLD: Duration = Duration::from_secs(300);

/// Default grace period for a ret-ping before eviction.
pub const PING_TIMEOUT: Duration = Duration::from_secs(10);

/// Roster lifecycle events, surfaced to the embedding binary. All callbacks
/// fire after the mutation they report, outside the roster lock.
pub trait ServiceHandler: Send + Sync {
    /// A client joined the roster.
    #[allow(unused_variables)]
    fn on_connected(&self, addr: &SocketAddr, name: &str, admin: bool) {}

    /// A client changed its display name.
    #[allow(unused_variables)]
    fn on_renamed(&self, addr: &SocketAddr, old: &str, new: &str) {}

    /// A client left on its own.
    #[allow(unused_variables)]
    fn on_disconnected(&self, addr: &SocketAddr, name: &str) {}

    /// The admin removed a client.
    #[allow(unused_variables)]
    fn on_kicked(&self, addr: &SocketAddr, name: &str, by: &str) {}

    /// The liveness monitor removed a client that did not answer its ping.
    #[allow(unused_variables)]
    fn on_evicted(&self, addr: &SocketAddr, name: &str) {}
}

pub struct ServiceOptions<T> {
    pub idle_threshold: Duration,
    pub ping_timeout: Duration,
    pub handler: T,
}

impl<T> ServiceOptions<T> {
    pub fn with_defaults(handler: T) -> Self {
        Self {
            idle_threshold: INACTIVITY_THRESHOLD,
            ping_timeout: PING_TIMEOUT,
            handler,
        }
    }
}

pub(crate) struct State<T> {
    pub idle_threshold: Duration,
    pub ping_timeout: Duration,
    pub roster: Roster,
    pub history: History,
    pub pings: PendingPings,
    pub handler: T,
}

/// Chat service.
///
/// The roster, the history ring and the pending-ping set are constructed here
/// once and shared by every router and by the liveness sweep; nothing in the
/// crate is a process-wide global.
pub struct Service<T> {
    state: Arc<State<T>>,
}

impl<T> Clone for Service<T> {
    fn clone(&self) -> Self {
        Self {
            state: self.state.clone(),
        }
    }
}

impl<T> Service<T>
where
    T: ServiceHandler,
{
    pub fn new(options: ServiceOptions<T>) -> Self {
        Self {
            state: Arc::new(State {
                idle_threshold: options.idle_threshold,
                ping_timeout: options.ping_timeout,
                roster: Roster::default(),
                history: History::default(),
                pings: PendingPings::default(),
                handler: options.handler,
            }),
        }
    }

    /// Get a router over the shared state. Routers are cheap to clone, one
    /// per in-flight handler task.
    pub fn make_router(&self) -> Router<T> {
        Router::new(self.state.clone())
    }

    pub fn roster(&self) -> &Roster {
        &self.state.roster
    }

    pub fn history(&self) -> &History {
        &self.state.history
    }

    pub fn pings(&self) -> &PendingPings {
        &self.state.pings
    }

    /// One liveness tick.
    ///
    /// Pings entries idle past the threshold, then evicts entries whose ping
    /// has gone unanswered past the timeout. Returns the datagrams to send;
    /// no lock is held once this returns.
    pub fn sweep(&self, now: Instant) -> Vec<Outbound> {
        let mut out = Vec::new();

        // Idle scan: snapshot candidates under the read lock, record pings
        // after releasing it.
        let idle: Vec<SocketAddr> = {
            self.state
                .roster
                .read()
                .iter()
                .filter(|entry| now.duration_since(entry.last_active) >= self.state.idle_threshold)
                .map(|entry| entry.addr)
                .collect()
        };

        for addr in idle {
            if self.state.pings.track(addr, now) {
                out.push(Outbound::new(addr, "ping$\n"));
            }
        }

        // Timeout scan: an entry and its pending ping leave together, inside
        // one roster write-lock section, so a ret-ping that already cleared
        // the record wins over eviction.
        let mut evicted = Vec::new();
        {
            let mut table = self.state.roster.write();
            for addr in self.state.pings.expired(now, self.state.ping_timeout) {
                self.state.pings.clear(&addr);
                if let Some(entry) = table.remove_by_addr(&addr) {
                    let peers: Vec<SocketAddr> = table.addrs().collect();
                    evicted.push((entry, peers));
                }
            }
        }

        for (entry, peers) in evicted {
            self.state.handler.on_evicted(&entry.addr, &entry.name);

            let line = format!(
                "say$ System: {} has been removed due to inactivity\n",
                entry.name
            );
            out.extend(peers.into_iter().map(|addr| Outbound::new(addr, line.clone())));
        }

        out
    }
}
