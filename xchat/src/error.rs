//! Error types for listening, receiving and sending.

use core::fmt;
use std::io;

use crate::endpoint::PeerEndpoint;

/// Why a listening socket could not be set up.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BindErrorKind {
    /// Another socket already holds the port.
    AddrInUse,
    /// The host is not a local address.
    AddrNotAvailable,
    /// The process may not bind the port.
    PermissionDenied,
    /// Any other socket failure.
    Io,
}

/// Listen setup failed; the channel never became operative.
#[derive(Debug)]
pub struct BindError {
    kind: BindErrorKind,
    endpoint: PeerEndpoint,
    source: io::Error,
}

impl BindError {
    pub(crate) fn new(endpoint: PeerEndpoint, source: io::Error) -> Self {
        let kind = match source.kind() {
            io::ErrorKind::AddrInUse => BindErrorKind::AddrInUse,
            io::ErrorKind::AddrNotAvailable => BindErrorKind::AddrNotAvailable,
            io::ErrorKind::PermissionDenied => BindErrorKind::PermissionDenied,
            _ => BindErrorKind::Io,
        };
        BindError { kind, endpoint, source }
    }

    /// Returns the failure category.
    pub fn kind(&self) -> BindErrorKind {
        self.kind
    }

    /// Returns the endpoint that could not be bound.
    pub fn endpoint(&self) -> PeerEndpoint {
        self.endpoint
    }
}

impl fmt::Display for BindError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.kind {
            BindErrorKind::AddrInUse => write!(f, "address {} already in use", self.endpoint),
            BindErrorKind::AddrNotAvailable => write!(f, "address {} not available", self.endpoint),
            BindErrorKind::PermissionDenied => write!(f, "permission denied binding {}", self.endpoint),
            BindErrorKind::Io => write!(f, "failed to listen on {}: {}", self.endpoint, self.source),
        }
    }
}

impl std::error::Error for BindError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        Some(&self.source)
    }
}

/// Which step of the inbound loop failed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AcceptErrorKind {
    /// Accepting the next connection failed.
    Accept,
    /// Reading from an accepted connection failed.
    Read,
}

/// A non-cancellation failure that stopped the inbound loop.
#[derive(Debug)]
pub struct AcceptError {
    kind: AcceptErrorKind,
    source: io::Error,
}

impl AcceptError {
    pub(crate) fn accept(source: io::Error) -> Self {
        AcceptError { kind: AcceptErrorKind::Accept, source }
    }

    pub(crate) fn read(source: io::Error) -> Self {
        AcceptError { kind: AcceptErrorKind::Read, source }
    }

    /// Returns the failed step.
    pub fn kind(&self) -> AcceptErrorKind {
        self.kind
    }
}

impl fmt::Display for AcceptError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.kind {
            AcceptErrorKind::Accept => write!(f, "accept failed: {}", self.source),
            AcceptErrorKind::Read => write!(f, "read failed: {}", self.source),
        }
    }
}

impl std::error::Error for AcceptError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        Some(&self.source)
    }
}

/// Why a single send failed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SendErrorKind {
    /// Nothing is listening on the remote port.
    ConnectRefused,
    /// The connect did not finish within the configured timeout.
    Timeout,
    /// The payload could not be written in full.
    WriteFailed,
    /// Any other socket failure.
    Io,
}

/// A send failed. Local to the call; the inbound half is unaffected.
#[derive(Debug)]
pub struct SendError {
    kind: SendErrorKind,
    remote: PeerEndpoint,
    source: Option<io::Error>,
}

impl SendError {
    pub(crate) fn connect(remote: PeerEndpoint, source: io::Error) -> Self {
        let kind = match source.kind() {
            io::ErrorKind::ConnectionRefused => SendErrorKind::ConnectRefused,
            io::ErrorKind::TimedOut => SendErrorKind::Timeout,
            _ => SendErrorKind::Io,
        };
        SendError { kind, remote, source: Some(source) }
    }

    pub(crate) fn timeout(remote: PeerEndpoint) -> Self {
        SendError { kind: SendErrorKind::Timeout, remote, source: None }
    }

    pub(crate) fn write(remote: PeerEndpoint, source: io::Error) -> Self {
        SendError { kind: SendErrorKind::WriteFailed, remote, source: Some(source) }
    }

    /// Returns the failure category.
    pub fn kind(&self) -> SendErrorKind {
        self.kind
    }

    /// Returns the endpoint the send was aimed at.
    pub fn remote(&self) -> PeerEndpoint {
        self.remote
    }
}

impl fmt::Display for SendError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.kind {
            SendErrorKind::ConnectRefused => write!(f, "connection to {} refused", self.remote)?,
            SendErrorKind::Timeout => write!(f, "connection to {} timed out", self.remote)?,
            SendErrorKind::WriteFailed => write!(f, "write to {} failed", self.remote)?,
            SendErrorKind::Io => write!(f, "send to {} failed", self.remote)?,
        }
        match &self.source {
            Some(e) if matches!(self.kind, SendErrorKind::WriteFailed | SendErrorKind::Io) => {
                write!(f, ": {}", e)
            }
            _ => Ok(()),
        }
    }
}

impl std::error::Error for SendError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        self.source.as_ref().map(|e| e as &(dyn std::error::Error + 'static))
    }
}

impl From<SendError> for io::Error {
    fn from(err: SendError) -> io::Error {
        let kind = match err.kind {
            SendErrorKind::ConnectRefused => io::ErrorKind::ConnectionRefused,
            SendErrorKind::Timeout => io::ErrorKind::TimedOut,
            SendErrorKind::WriteFailed => io::ErrorKind::WriteZero,
            SendErrorKind::Io => io::ErrorKind::Other,
        };
        io::Error::new(kind, err)
    }
}

/// A string that is not an IPv4 `host:port` pair.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EndpointParseError {
    input: String,
}

impl EndpointParseError {
    pub(crate) fn new(input: impl Into<String>) -> Self {
        EndpointParseError { input: input.into() }
    }
}

impl fmt::Display for EndpointParseError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "invalid IPv4 endpoint {:?}", self.input)
    }
}

impl std::error::Error for EndpointParseError {}
