//! # XChat - A Duplex Two-Peer Text Channel
//!
//! XChat is the messaging core of a minimal two-peer chat. Each peer listens
//! on its own loopback port and sends to the other peer's port:
//!
//! - **Inbound half**: a cancellable accept loop on a background task that
//!   reads one message per connection
//! - **Outbound half**: a one-shot connect, write, close per message
//! - **Lifecycle**: a monotonic state machine that joins the accept loop
//!   on shutdown so no accept is left outstanding
//!
//! ## Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────┐
//! │              Presentation (MessageSink / UserInput)      │
//! ├─────────────────────────────────────────────────────────┤
//! │                      PeerChannel                         │
//! │  ┌─────────────────┐ ┌──────────────┐ ┌──────────────┐  │
//! │  │ Lifecycle state │ │ Accept loop  │ │ Send         │  │
//! │  │ + cancel token  │ │ (background) │ │ (caller)     │  │
//! │  └─────────────────┘ └──────────────┘ └──────────────┘  │
//! ├─────────────────────────────────────────────────────────┤
//! │              TCP over IPv4 loopback, raw UTF-8           │
//! └─────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Example
//!
//! ```rust,ignore
//! use std::sync::Arc;
//! use xchat::{ChannelConfig, LogSink, PeerChannel, PeerEndpoint};
//!
//! let config = ChannelConfig::new("Client 1")
//!     .with_local(PeerEndpoint::loopback(8001))
//!     .with_remote(PeerEndpoint::loopback(8002));
//! let channel = PeerChannel::start(config, Arc::new(LogSink)).await?;
//!
//! channel.send("hi").await?;
//! channel.shutdown().await;
//! ```

#![deny(unsafe_code)]
#![warn(missing_docs)]

pub mod channel;
pub mod config;
pub mod endpoint;
pub mod error;
pub mod sink;

// Re-export commonly used types
pub use channel::{ChannelState, PeerChannel};
pub use config::ChannelConfig;
pub use endpoint::PeerEndpoint;
pub use error::{AcceptError, BindError, EndpointParseError, SendError};
pub use sink::{InboundMessage, LogSink, MessageSink, Origin, PendingText, QueueSink, UserInput};

/// Bytes read from an accepted connection. Longer messages are truncated.
pub const RECV_BUFFER_SIZE: usize = 1024;

/// Default listen backlog
pub const DEFAULT_BACKLOG: u32 = 128;

/// Default listen port of the first peer
pub const DEFAULT_LISTEN_PORT: u16 = 8001;

/// Default listen port of the second peer
pub const DEFAULT_REMOTE_PORT: u16 = 8002;
