use clap::Parser;
use serde::*;
use std::{fs::read_to_string, net::SocketAddr, time::Duration};

#[derive(Deserialize, Debug)]
pub struct Chat {
    /// chat server listen address
    ///
    /// the address and port bound by the UDP server. clients find the admin
    /// role by source port, so the server itself can listen anywhere.
    #[serde(default = "Chat::listen")]
    pub listen: SocketAddr,
}

impl Chat {
    fn listen() -> SocketAddr {
        "0.0.0.0:9000".parse().unwrap()
    }
}

impl Default for Chat {
    fn default() -> Self {
        Self {
            listen: Self::listen(),
        }
    }
}

#[derive(Deserialize, Debug)]
pub struct Liveness {
    /// sweep interval, in seconds
    ///
    /// how often the monitor scans the roster for idle clients and checks
    /// outstanding pings.
    #[serde(default = "Liveness::interval")]
    pub interval: u64,

    /// idle threshold, in seconds
    ///
    /// a client that has not sent anything for this long gets pinged.
    #[serde(default = "Liveness::idle_threshold")]
    pub idle_threshold: u64,

    /// ping timeout, in seconds
    ///
    /// a pinged client that stays silent for this long is evicted.
    #[serde(default = "Liveness::ping_timeout")]
    pub ping_timeout: u64,
}

impl Liveness {
    fn interval() -> u64 {
        service::MONITOR_INTERVAL.as_secs()
    }

    fn idle_threshold() -> u64 {
        service::INACTIVITY_THRESHOLD.as_secs()
    }

    fn ping_timeout() -> u64 {
        service::PING_TIMEOUT.as_secs()
    }

    pub fn interval_duration(&self) -> Duration {
        Duration::from_secs(self.interval)
    }

    pub fn idle_threshold_duration(&self) -> Duration {
        Duration::from_secs(self.idle_threshold)
    }

    pub fn ping_timeout_duration(&self) -> Duration {
        Duration::from_secs(self.ping_timeout)
    }
}

impl Default for Liveness {
    fn default() -> Self {
        Self {
            interval: Self::interval(),
            idle_threshold: Self::idle_threshold(),
            ping_timeout: Self::ping_timeout(),
        }
    }
}

#[derive(Deserialize, Debug)]
pub enum LogLevel {
    Error,
    Warn,
    Info,
    Debug,
    Trace,
}

impl Default for LogLevel {
    fn default() -> Self {
        Self::Info
    }
}

impl LogLevel {
    pub fn as_level(&self) -> log::Level {
        match *self {
            Self::Error => log::Level::Error,
            Self::Debug => log::Level::Debug,
            Self::Trace => log::Level::Trace,
            Self::Warn => log::Level::Warn,
            Self::Info => log::Level::Info,
        }
    }
}

#[derive(Deserialize, Debug, Default)]
pub struct Log {
    /// log level
    ///
    /// An enum representing the available verbosity levels of the logger.
    #[serde(default)]
    pub level: LogLevel,
}

#[derive(Deserialize, Debug, Default)]
pub struct Config {
    #[serde(default)]
    pub chat: Chat,
    #[serde(default)]
    pub liveness: Liveness,
    #[serde(default)]
    pub log: Log,
}

#[derive(Parser)]
#[command(
    about = env!("CARGO_PKG_DESCRIPTION"),
    version = env!("CARGO_PKG_VERSION"),
)]
struct Cli {
    /// specify the configuration file path.
    #[arg(long)]
    config: Option<String>,
}

impl Config {
    /// Load command line parameters; if a configuration file path is
    /// specified the configuration is read from it, otherwise every field
    /// takes its default.
    pub fn load() -> anyhow::Result<Self> {
        let cfg_str = match Cli::parse().config {
            Some(path) => read_to_string(path)?,
            None => String::new(),
        };

        Ok(toml::from_str(&cfg_str)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_input_yields_defaults() {
        let config: Config = toml::from_str("").unwrap();
        assert_eq!(config.chat.listen, "0.0.0.0:9000".parse().unwrap());
        assert_eq!(config.liveness.interval, 30);
        assert_eq!(config.liveness.idle_threshold, 300);
        assert_eq!(config.liveness.ping_timeout, 10);
    }

    #[test]
    fn partial_sections_keep_other_defaults() {
        let config: Config = toml::from_str(
            r#"
            [chat]
            listen = "127.0.0.1:7000"

            [liveness]
            idle_threshold = 60
            "#,
        )
        .unwrap();

        assert_eq!(config.chat.listen, "127.0.0.1:7000".parse().unwrap());
        assert_eq!(config.liveness.idle_threshold, 60);
        assert_eq!(config.liveness.ping_timeout, 10);
    }
}
