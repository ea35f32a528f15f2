use std::sync::Arc;
use std::time::Duration;

use codec::{Frame, ServerCommand};
use tokio::time::timeout;

use crate::state::ClientState;

/// How long a blocking receive may run before the running flag is re-checked,
/// so a shutdown started by the input stream is noticed promptly.
const RECV_CHECK_INTERVAL: Duration = Duration::from_millis(500);

/// listener stream.
///
/// Receives server datagrams and dispatches them: acknowledgements update the
/// shared state, chat traffic is mirrored to the transcript, pings are
/// answered immediately, and `disconn`/`kick` end the session.
pub async fn run(state: Arc<ClientState>) -> anyhow::Result<()> {
    let result = listen(&state).await;
    state.stop();
    result
}

async fn listen(state: &ClientState) -> anyhow::Result<()> {
    let mut buf = vec![0u8; codec::BUFFER_SIZE];

    while state.running() {
        let (size, _) = match timeout(RECV_CHECK_INTERVAL, state.socket.recv_from(&mut buf)).await {
            Ok(Ok(received)) => received,
            Ok(Err(e)) => return Err(e.into()),
            // Timed out: loop around and re-check the running flag.
            Err(_) => continue,
        };

        if !dispatch(state, &buf[..size]).await? {
            break;
        }
    }

    Ok(())
}

/// Handle one server frame. Returns `false` when the session is over.
async fn dispatch(state: &ClientState, payload: &[u8]) -> anyhow::Result<bool> {
    let frame = match Frame::parse(payload) {
        Ok(frame) => frame,
        Err(_) => {
            eprintln!("Error$ Invalid acknowledge format. Expected 'command$content' from server");
            return Ok(true);
        }
    };

    match ServerCommand::from_name(frame.command) {
        Some(ServerCommand::Conn) => {
            println!("{}", frame.content);
            if let Some(name) = parse_conn_name(frame.content) {
                state.set_name(name);
                log::debug!("connected as {:?}", name);
            }
        }
        Some(ServerCommand::Rename) => {
            println!("{}", frame.content);
            if let Some(name) = parse_rename_name(frame.content) {
                state.set_name(name);
            }
        }
        Some(ServerCommand::Say | ServerCommand::Sayto | ServerCommand::History) => {
            state.transcript.append(&format!("{}\n", frame.content))?;
        }
        Some(ServerCommand::Disconn | ServerCommand::Kick) => {
            println!("{}", frame.content);
            return Ok(false);
        }
        Some(ServerCommand::Ping) => {
            state.socket.send_to(b"ret-ping$", state.server).await?;
            log::debug!("answered server ping");
        }
        Some(ServerCommand::Error) => {
            println!("Error$ {}", frame.content);
        }
        None => {
            eprintln!("Error$ Unexpected '{}' frame from server", frame.command);
        }
    }

    Ok(true)
}

/// The conn acknowledgement carries the canonical name:
/// `Hi <name>, you have successfully connected to the chat`.
fn parse_conn_name(content: &str) -> Option<&str> {
    let rest = content.strip_prefix("Hi ")?;
    let (name, _) = rest.split_once(',')?;
    Some(name)
}

/// The rename acknowledgement: `You are now known as <name>`.
fn parse_rename_name(content: &str) -> Option<&str> {
    content.strip_prefix("You are now known as ")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn conn_acknowledgement_yields_the_name() {
        assert_eq!(
            parse_conn_name("Hi Alice, you have successfully connected to the chat"),
            Some("Alice")
        );
        assert_eq!(parse_conn_name("something else entirely"), None);
    }

    #[test]
    fn rename_acknowledgement_yields_the_name() {
        assert_eq!(
            parse_rename_name("You are now known as Alicia"),
            Some("Alicia")
        );
        assert_eq!(parse_rename_name("no rename here"), None);
    }
}
