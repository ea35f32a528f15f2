use std::io::ErrorKind::*;
use std::sync::Arc;
use std::time::{Duration, Instant};

use service::{Service, ServiceHandler};
use tokio::net::UdpSocket;
use tokio::time::{MissedTickBehavior, interval};

/// liveness monitor task.
///
/// Runs the sweep on a fixed tick: idle clients get a ping, clients whose
/// ping went unanswered past the timeout are evicted by the sweep and the
/// remaining roster is told. All sends happen here, after the sweep has
/// released every lock. A failed send is logged and the monitor carries on.
pub async fn run<T>(service: Service<T>, socket: Arc<UdpSocket>, tick: Duration)
where
    T: ServiceHandler,
{
    let mut ticker = interval(tick);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

    loop {
        ticker.tick().await;

        for frame in service.sweep(Instant::now()) {
            if let Err(e) = socket.send_to(frame.payload.as_bytes(), frame.addr).await {
                if e.kind() != ConnectionReset {
                    log::warn!("liveness send error: addr={:?}, {:?}", frame.addr, e);
                }
            }
        }
    }
}
