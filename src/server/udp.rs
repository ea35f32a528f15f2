use std::io::ErrorKind::*;
use std::sync::Arc;

use service::ServiceHandler;
use service::routing::Router;
use tokio::net::UdpSocket;

/// udp ingress pump.
///
/// Reads one datagram at a time from the socket and hands it to a spawned
/// handler task; concurrency happens at handler granularity, never on the
/// socket read itself. Handler tasks route the frame and perform their own
/// sends, so a slow recipient or a contended lock never stalls the pump.
pub async fn pump<T>(router: Router<T>, socket: Arc<UdpSocket>) -> anyhow::Result<()>
where
    T: ServiceHandler + 'static,
{
    let mut buf = vec![0u8; codec::BUFFER_SIZE];

    loop {
        // An error is also reported here when a remote host closes its
        // socket; that is not fatal for a datagram server.
        let (size, addr) = match socket.recv_from(&mut buf).await {
            Ok(s) => s,
            Err(e) => {
                if e.kind() != ConnectionReset {
                    return Err(e.into());
                } else {
                    continue;
                }
            }
        };

        log::trace!("udp socket receive: size={}, addr={:?}", size, addr);

        let payload = buf[..size].to_vec();
        let router = router.clone();
        let socket = socket.clone();

        tokio::spawn(async move {
            for frame in router.route(&payload, addr) {
                match socket.send_to(frame.payload.as_bytes(), frame.addr).await {
                    Ok(size) => {
                        log::trace!("udp socket send: size={}, addr={:?}", size, frame.addr);
                    }
                    Err(e) => {
                        if e.kind() != ConnectionReset {
                            log::warn!("udp socket send error: addr={:?}, {:?}", frame.addr, e);
                        }
                    }
                }
            }
        });
    }
}
