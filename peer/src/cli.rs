//! Command-line argument parsing.

use std::net::Ipv4Addr;
use std::time::Duration;

use clap::Parser;
use xchat::{ChannelConfig, PeerEndpoint, DEFAULT_LISTEN_PORT, DEFAULT_REMOTE_PORT};

/// One side of a two-peer loopback chat.
#[derive(Parser, Debug, Clone)]
#[command(name = "peer")]
#[command(about = "Two-peer loopback text chat")]
#[command(version)]
pub struct Cli {
    /// Name shown in status lines.
    #[arg(long, default_value = "Client 1")]
    pub name: String,

    /// Port this peer listens on.
    #[arg(long, default_value_t = DEFAULT_LISTEN_PORT)]
    pub listen: u16,

    /// Port of the other peer.
    #[arg(long, default_value_t = DEFAULT_REMOTE_PORT)]
    pub remote: u16,

    /// IPv4 address both peers use.
    #[arg(long, default_value = "127.0.0.1")]
    pub host: Ipv4Addr,

    /// Give up connecting to the other peer after this many milliseconds.
    #[arg(long)]
    pub connect_timeout_ms: Option<u64>,

    /// Log level (trace, debug, info, warn, error).
    #[arg(long, default_value = "warn")]
    pub log_level: String,
}

impl Cli {
    /// Parse command-line arguments.
    pub fn parse_args() -> Self {
        Self::parse()
    }

    /// Build the channel configuration.
    pub fn channel_config(&self) -> ChannelConfig {
        let config = ChannelConfig::new(self.name.clone())
            .with_local(PeerEndpoint::new(self.host, self.listen))
            .with_remote(PeerEndpoint::new(self.host, self.remote));
        match self.connect_timeout_ms {
            Some(ms) => config.with_connect_timeout(Duration::from_millis(ms)),
            None => config,
        }
    }
}
