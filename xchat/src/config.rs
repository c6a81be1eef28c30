//! Channel configuration.

use std::time::Duration;

use crate::endpoint::PeerEndpoint;
use crate::{DEFAULT_BACKLOG, DEFAULT_LISTEN_PORT, DEFAULT_REMOTE_PORT, RECV_BUFFER_SIZE};

/// Settings for one peer channel.
#[derive(Debug, Clone)]
pub struct ChannelConfig {
    /// Display name used in status notifications.
    pub name: String,
    /// Address the inbound half listens on.
    pub local: PeerEndpoint,
    /// Address the outbound half sends to.
    pub remote: PeerEndpoint,
    /// Bytes read per accepted connection.
    pub recv_buffer_size: usize,
    /// Pending-connection queue length of the listening socket.
    pub backlog: u32,
    /// Upper bound on connecting to the remote; `None` waits for the OS.
    pub connect_timeout: Option<Duration>,
}

impl ChannelConfig {
    /// Creates a config with loopback defaults (listen 8001, send to 8002).
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            local: PeerEndpoint::loopback(DEFAULT_LISTEN_PORT),
            remote: PeerEndpoint::loopback(DEFAULT_REMOTE_PORT),
            recv_buffer_size: RECV_BUFFER_SIZE,
            backlog: DEFAULT_BACKLOG,
            connect_timeout: None,
        }
    }

    /// Sets the listen endpoint. Port `0` picks a free port.
    pub fn with_local(mut self, local: PeerEndpoint) -> Self {
        self.local = local;
        self
    }

    /// Sets the send target.
    pub fn with_remote(mut self, remote: PeerEndpoint) -> Self {
        self.remote = remote;
        self
    }

    /// Sets the per-connection read size (at least 1).
    pub fn with_recv_buffer_size(mut self, size: usize) -> Self {
        self.recv_buffer_size = size.max(1);
        self
    }

    /// Sets the listen backlog (at least 1).
    pub fn with_backlog(mut self, backlog: u32) -> Self {
        self.backlog = backlog.max(1);
        self
    }

    /// Bounds how long a send waits to connect.
    pub fn with_connect_timeout(mut self, timeout: Duration) -> Self {
        self.connect_timeout = Some(timeout);
        self
    }
}

impl Default for ChannelConfig {
    fn default() -> Self {
        Self::new("peer")
    }
}
