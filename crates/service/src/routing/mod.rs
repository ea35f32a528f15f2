mod handlers;

use std::net::SocketAddr;
use std::sync::Arc;

use codec::{Command, Frame};

use crate::{ServiceHandler, State};

/// One datagram to send once routing has returned and every lock is released.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Outbound {
    pub addr: SocketAddr,
    pub payload: String,
}

impl Outbound {
    pub(crate) fn new(addr: SocketAddr, payload: impl Into<String>) -> Self {
        Self {
            addr,
            payload: payload.into(),
        }
    }
}

/// Everything a handler needs for one inbound frame.
pub(crate) struct Request<'a, T> {
    pub state: &'a State<T>,
    pub source: SocketAddr,
    pub content: &'a str,
}

impl<T> Request<'_, T> {
    pub(crate) fn reply(&self, payload: impl Into<String>) -> Outbound {
        Outbound::new(self.source, payload)
    }
}

/// Classifies one parsed frame and dispatches it to its handler.
///
/// The router knows nothing about the roster; it centralizes trimming (done
/// by the codec), classification and the uniform error framing. Handlers are
/// their own error boundary: whatever goes wrong inside one becomes an
/// `Error$` reply or silence, never a crash of the ingress path.
pub struct Router<T> {
    state: Arc<State<T>>,
}

impl<T> Clone for Router<T> {
    fn clone(&self) -> Self {
        Self {
            state: self.state.clone(),
        }
    }
}

impl<T> Router<T>
where
    T: ServiceHandler,
{
    pub(crate) fn new(state: Arc<State<T>>) -> Self {
        Self { state }
    }

    /// Route one datagram payload from `source`. Returns the datagrams to
    /// send in reply; sends happen at the caller, outside every lock.
    pub fn route(&self, payload: &[u8], source: SocketAddr) -> Vec<Outbound> {
        let frame = match Frame::parse(payload) {
            Ok(frame) => frame,
            Err(_) => {
                return vec![Outbound::new(
                    source,
                    "Error$ Invalid request format. Expected 'command$content'\n",
                )];
            }
        };

        let req = Request {
            state: &self.state,
            source,
            content: frame.content,
        };

        match Command::from_name(frame.command) {
            Some(Command::Conn) => handlers::conn(req),
            Some(Command::Say) => handlers::say(req),
            Some(Command::Sayto) => handlers::sayto(req),
            Some(Command::Disconn) => handlers::disconn(req),
            Some(Command::Mute) => handlers::mute(req),
            Some(Command::Unmute) => handlers::unmute(req),
            Some(Command::Rename) => handlers::rename(req),
            Some(Command::Kick) => handlers::kick(req),
            Some(Command::RetPing) => handlers::ret_ping(req),
            None => vec![Outbound::new(
                source,
                format!(
                    "Error$ Unknown command '{}'. Supported: conn, say, sayto, disconn, mute, unmute, rename, kick\n",
                    frame.command
                ),
            )],
        }
    }
}
