pub mod config;
pub mod observer;
pub mod server;

use std::sync::Arc;

use config::Config;
use observer::Observer;
use service::{Service, ServiceOptions};

/// In order to let integration tests start the server from the crate, a
/// function replaces the main function body.
pub async fn server_main(config: Arc<Config>) -> anyhow::Result<()> {
    let service = Service::new(ServiceOptions {
        idle_threshold: config.liveness.idle_threshold_duration(),
        ping_timeout: config.liveness.ping_timeout_duration(),
        handler: Observer,
    });

    server::run(config, &service).await
}
