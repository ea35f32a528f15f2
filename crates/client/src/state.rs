use std::net::SocketAddr;
use std::sync::atomic::{AtomicBool, Ordering};

use parking_lot::Mutex;
use tokio::net::UdpSocket;

use crate::transcript::Transcript;

/// The record shared by the input and listener streams. The running flag is
/// the shutdown barrier: whichever stream clears it first stops the other on
/// its next iteration.
pub struct ClientState {
    pub socket: UdpSocket,
    pub server: SocketAddr,
    pub transcript: Transcript,
    running: AtomicBool,
    connected: AtomicBool,
    name: Mutex<String>,
}

impl ClientState {
    pub fn new(socket: UdpSocket, server: SocketAddr, transcript: Transcript) -> Self {
        Self {
            socket,
            server,
            transcript,
            running: AtomicBool::new(true),
            connected: AtomicBool::new(false),
            name: Mutex::new(String::new()),
        }
    }

    pub fn running(&self) -> bool {
        self.running.load(Ordering::Acquire)
    }

    pub fn stop(&self) {
        self.running.store(false, Ordering::Release);
    }

    pub fn connected(&self) -> bool {
        self.connected.load(Ordering::Acquire)
    }

    /// Record the canonical name echoed by the server and mark the session
    /// connected.
    pub fn set_name(&self, name: &str) {
        *self.name.lock() = name.to_string();
        self.connected.store(true, Ordering::Release);
    }

    pub fn name(&self) -> String {
        self.name.lock().clone()
    }
}
