mod monitor;
mod udp;

use std::sync::Arc;

use service::{Service, ServiceHandler};
use tokio::net::UdpSocket;

use crate::config::Config;

/// start the chat server.
///
/// Binds the UDP socket, spawns the liveness monitor and then runs the
/// ingress pump in the foreground; only a fatal socket error returns.
pub async fn run<T>(config: Arc<Config>, service: &Service<T>) -> anyhow::Result<()>
where
    T: ServiceHandler + 'static,
{
    let socket = Arc::new(UdpSocket::bind(config.chat.listen).await?);

    tokio::spawn(monitor::run(
        service.clone(),
        socket.clone(),
        config.liveness.interval_duration(),
    ));

    log::info!("chat server listening: {}", config.chat.listen);
    udp::pump(service.make_router(), socket).await
}
