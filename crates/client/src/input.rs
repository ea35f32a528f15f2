use std::sync::Arc;

use codec::Frame;
use tokio::io::{AsyncBufReadExt, BufReader, stdin};

use crate::state::ClientState;

/// input stream.
///
/// Reads one frame per line from standard input, validates the framing
/// locally and sends it to the server. Nothing is sent for invalid lines;
/// the diagnostic goes to standard error. `disconn$` is sent, then the
/// running flag is cleared and the stream exits.
pub async fn run(state: Arc<ClientState>) -> anyhow::Result<()> {
    let result = pump_lines(&state).await;
    state.stop();
    result
}

async fn pump_lines(state: &ClientState) -> anyhow::Result<()> {
    let mut lines = BufReader::new(stdin()).lines();

    while state.running() {
        let line = match lines.next_line().await? {
            Some(line) => line,
            None => break,
        };

        let line = line.trim();
        if line.is_empty() {
            eprintln!("Empty input detected. Please enter input.");
            continue;
        }

        let disconnect = line == "disconn$";
        if !disconnect {
            if let Err(reason) = validate_request(line) {
                eprintln!("Input Error$ {}", reason);
                continue;
            }
        }

        state.socket.send_to(line.as_bytes(), state.server).await?;

        if disconnect {
            break;
        }
    }

    Ok(())
}

/// Local framing check before anything is put on the wire: `$` present,
/// nonempty command, nonempty content. Only `disconn$` may be bare, and that
/// is handled before this runs. Command-level validation stays on the server.
fn validate_request(line: &str) -> Result<(), String> {
    let frame = Frame::parse(line.as_bytes()).map_err(|e| e.to_string())?;

    if frame.content.is_empty() {
        return Err("no content after '$'".to_string());
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn well_formed_requests_pass() {
        assert!(validate_request("conn$Alice").is_ok());
        assert!(validate_request("say$hello world").is_ok());
        assert!(validate_request("sayto$Bob hi").is_ok());
    }

    #[test]
    fn missing_delimiter_is_rejected() {
        assert!(validate_request("hello").is_err());
    }

    #[test]
    fn empty_command_or_content_is_rejected() {
        assert!(validate_request("$hello").is_err());
        assert!(validate_request("say$").is_err());
        assert!(validate_request("say$   ").is_err());
    }
}
