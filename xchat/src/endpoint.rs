//! Peer addressing.

use core::fmt;
use core::str::FromStr;
use std::net::{Ipv4Addr, SocketAddr, SocketAddrV4};

use crate::error::EndpointParseError;

/// An IPv4 host and port identifying a bind address or a send target.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct PeerEndpoint {
    host: Ipv4Addr,
    port: u16,
}

impl PeerEndpoint {
    /// Creates an endpoint from a host and port.
    pub const fn new(host: Ipv4Addr, port: u16) -> Self {
        Self { host, port }
    }

    /// Creates an endpoint on `127.0.0.1`.
    pub const fn loopback(port: u16) -> Self {
        Self::new(Ipv4Addr::LOCALHOST, port)
    }

    /// Returns the host address.
    pub fn host(&self) -> Ipv4Addr {
        self.host
    }

    /// Returns the port. Zero means "any free port" when used for binding.
    pub fn port(&self) -> u16 {
        self.port
    }

    /// Returns the endpoint as a socket address.
    pub fn socket_addr(&self) -> SocketAddr {
        SocketAddr::V4(SocketAddrV4::new(self.host, self.port))
    }
}

impl fmt::Display for PeerEndpoint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.host, self.port)
    }
}

impl From<SocketAddrV4> for PeerEndpoint {
    fn from(addr: SocketAddrV4) -> Self {
        Self::new(*addr.ip(), addr.port())
    }
}

impl TryFrom<SocketAddr> for PeerEndpoint {
    type Error = EndpointParseError;

    fn try_from(addr: SocketAddr) -> Result<Self, Self::Error> {
        match addr {
            SocketAddr::V4(v4) => Ok(v4.into()),
            SocketAddr::V6(_) => Err(EndpointParseError::new(addr.to_string())),
        }
    }
}

impl FromStr for PeerEndpoint {
    type Err = EndpointParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        s.trim()
            .parse::<SocketAddrV4>()
            .map(Self::from)
            .map_err(|_| EndpointParseError::new(s))
    }
}
