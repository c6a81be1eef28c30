//! The duplex peer channel.
//!
//! [`PeerChannel`] owns the lifecycle: it binds the listening socket,
//! spawns the inbound accept loop on one background task, and joins that
//! task on shutdown. Sends run on the caller's task and open a fresh
//! connection per message.

mod receiver;
mod sender;

pub use sender::send_message;

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};

use log::{debug, error, info};
use tokio::net::{TcpListener, TcpSocket};
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;

use crate::config::ChannelConfig;
use crate::endpoint::PeerEndpoint;
use crate::error::{BindError, SendError};
use crate::sink::{InboundMessage, MessageSink, UserInput};
use receiver::Receiver;

/// Channel state.
///
/// Transitions only move forward:
/// `Initializing -> Listening -> ShuttingDown -> Closed`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum ChannelState {
    /// Listening socket not yet bound.
    Initializing,

    /// Accept loop is running (or has stopped on a receive error).
    Listening,

    /// Shutdown requested, waiting for the accept loop to exit.
    ShuttingDown,

    /// Accept loop joined and listening socket released.
    Closed,
}

/// One peer of the chat: a listening inbound half plus an on-demand
/// outbound half.
pub struct PeerChannel {
    config: ChannelConfig,
    local: PeerEndpoint,
    sink: Arc<dyn MessageSink>,
    state: Mutex<ChannelState>,
    cancel: CancellationToken,
    receiving: Arc<AtomicBool>,
    task: tokio::sync::Mutex<Option<JoinHandle<()>>>,
}

impl PeerChannel {
    /// Binds `config.local`, starts the accept loop and reports readiness
    /// to the sink.
    ///
    /// On failure the sink receives one status line, no task is spawned
    /// and the error is returned.
    pub async fn start(config: ChannelConfig, sink: Arc<dyn MessageSink>) -> Result<Self, BindError> {
        let listener = match bind(&config) {
            Ok(listener) => listener,
            Err(e) => {
                error!("[{}] initialization failed: {}", config.name, e);
                sink.notify(InboundMessage::status(format!("initialization failed: {}", e)));
                return Err(e);
            }
        };

        let local = listener
            .local_addr()
            .ok()
            .and_then(|addr| PeerEndpoint::try_from(addr).ok())
            .unwrap_or(config.local);
        info!("[{}] listening on {}, sending to {}", config.name, local, config.remote);

        let cancel = CancellationToken::new();
        let receiving = Arc::new(AtomicBool::new(true));
        let receiver = Receiver::new(
            listener,
            Arc::clone(&sink),
            config.recv_buffer_size,
            cancel.clone(),
            Arc::clone(&receiving),
        );
        let task = tokio::spawn(receiver.run());

        sink.notify(InboundMessage::status(format!("{} is ready to chat", config.name)));

        Ok(Self {
            config,
            local,
            sink,
            state: Mutex::new(ChannelState::Listening),
            cancel,
            receiving,
            task: tokio::sync::Mutex::new(Some(task)),
        })
    }

    /// Returns the current channel state.
    pub fn state(&self) -> ChannelState {
        *self.state.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    /// Returns the endpoint actually bound (resolves port `0`).
    pub fn local_endpoint(&self) -> PeerEndpoint {
        self.local
    }

    /// Returns the configured send target.
    pub fn remote_endpoint(&self) -> PeerEndpoint {
        self.config.remote
    }

    /// Returns the channel configuration.
    pub fn config(&self) -> &ChannelConfig {
        &self.config
    }

    /// Returns false once the accept loop has exited, whether through
    /// shutdown or a receive error.
    pub fn is_receiving(&self) -> bool {
        self.receiving.load(Ordering::Acquire)
    }

    /// Sends `text` to the configured remote peer.
    ///
    /// Whitespace-only text is a no-op. On success the trimmed text is
    /// echoed to the sink as [`Origin::Local`](crate::Origin::Local).
    pub async fn send(&self, text: &str) -> Result<(), SendError> {
        self.send_to(self.config.remote, text).await
    }

    /// Sends `text` to an explicit endpoint.
    pub async fn send_to(&self, remote: PeerEndpoint, text: &str) -> Result<(), SendError> {
        let text = text.trim();
        if send_message(remote, text, self.config.connect_timeout).await? == 0 {
            return Ok(());
        }
        self.sink.notify(InboundMessage::local(text));
        Ok(())
    }

    /// Sends whatever `input` has staged and clears it on success.
    ///
    /// On failure the staged text stays so the user can retry. Text staged
    /// while the send was in flight is not cleared.
    pub async fn submit(&self, input: &dyn UserInput) -> Result<(), SendError> {
        let text = input.pending();
        if text.trim().is_empty() {
            return Ok(());
        }
        self.send(&text).await?;
        input.clear_if(&text);
        Ok(())
    }

    /// Stops the accept loop and waits for it to exit.
    ///
    /// Idempotent. When this returns the listening socket is closed and
    /// the port can be bound again.
    pub async fn shutdown(&self) {
        let mut task = self.task.lock().await;
        let Some(handle) = task.take() else {
            return;
        };

        self.advance(ChannelState::ShuttingDown);
        debug!("[{}] shutting down accept loop on {}", self.config.name, self.local);
        self.cancel.cancel();

        if let Err(e) = handle.await {
            error!("[{}] accept loop ended abnormally: {}", self.config.name, e);
        }

        self.advance(ChannelState::Closed);
        info!("[{}] channel closed", self.config.name);
    }

    fn advance(&self, next: ChannelState) {
        let mut state = self.state.lock().unwrap_or_else(|poisoned| poisoned.into_inner());
        if next > *state {
            *state = next;
        }
    }
}

impl Drop for PeerChannel {
    fn drop(&mut self) {
        // The task cannot be joined here; it exits on its own once cancelled.
        self.cancel.cancel();
    }
}

impl core::fmt::Debug for PeerChannel {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("PeerChannel")
            .field("name", &self.config.name)
            .field("local", &self.local)
            .field("remote", &self.config.remote)
            .field("state", &self.state())
            .finish()
    }
}

fn bind(config: &ChannelConfig) -> Result<TcpListener, BindError> {
    let endpoint = config.local;
    let fail = |e: std::io::Error| BindError::new(endpoint, e);

    let socket = TcpSocket::new_v4().map_err(fail)?;
    // Lets a restarted channel reclaim the port while accepted
    // connections from the previous run sit in TIME_WAIT.
    #[cfg(unix)]
    socket.set_reuseaddr(true).map_err(fail)?;
    socket.bind(endpoint.socket_addr()).map_err(fail)?;
    socket.listen(config.backlog).map_err(fail)
}
