use std::net::SocketAddr;

use service::ServiceHandler;

/// Logs every roster lifecycle event the service reports.
#[derive(Default, Clone)]
pub struct Observer;

impl ServiceHandler for Observer {
    fn on_connected(&self, addr: &SocketAddr, name: &str, admin: bool) {
        log::info!("connected: addr={:?}, name={:?}, admin={}", addr, name, admin);
    }

    fn on_renamed(&self, addr: &SocketAddr, old: &str, new: &str) {
        log::info!("renamed: addr={:?}, old={:?}, new={:?}", addr, old, new);
    }

    fn on_disconnected(&self, addr: &SocketAddr, name: &str) {
        log::info!("disconnected: addr={:?}, name={:?}", addr, name);
    }

    fn on_kicked(&self, addr: &SocketAddr, name: &str, by: &str) {
        log::info!("kicked: addr={:?}, name={:?}, by={:?}", addr, name, by);
    }

    fn on_evicted(&self, addr: &SocketAddr, name: &str) {
        log::warn!("evicted for inactivity: addr={:?}, name={:?}", addr, name);
    }
}
