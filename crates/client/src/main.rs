mod input;
mod listener;
mod state;
mod transcript;

use std::net::SocketAddr;
use std::sync::Arc;

use clap::Parser;
use tokio::net::UdpSocket;

use crate::state::ClientState;
use crate::transcript::Transcript;

#[derive(Parser)]
#[command(
    about = "Thin UDP chat client: frames in from stdin, chat out to a transcript file.",
    version = env!("CARGO_PKG_VERSION"),
)]
struct Cli {
    /// chat server address.
    #[arg(long, default_value = "127.0.0.1:9000")]
    server: SocketAddr,

    /// local bind address; the admin client must bind port 6666.
    #[arg(long, default_value = "0.0.0.0:0")]
    bind: SocketAddr,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    simple_logger::init_with_level(log::Level::Warn)?;

    let socket = UdpSocket::bind(cli.bind).await?;
    let transcript = Transcript::create()?;
    println!("tail -f {}", transcript.path().display());

    let state = Arc::new(ClientState::new(socket, cli.server, transcript));

    let mut input = tokio::spawn(input::run(state.clone()));
    let mut listener = tokio::spawn(listener::run(state.clone()));

    tokio::select! {
        res = &mut input => {
            state.stop();
            listener.await??;
            res??;
        }
        res = &mut listener => {
            state.stop();
            // Stdin reads block until the next line lands; the session is
            // over, so do not wait for one.
            input.abort();
            res??;
        }
    }

    if state.connected() {
        log::debug!("session ended as {:?}", state.name());
    }

    Ok(())
}
