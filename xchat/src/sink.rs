//! Collaborator interfaces between the channel and its presentation.
//!
//! The channel never renders anything. Everything it has to show goes
//! through a [`MessageSink`], and everything the user typed comes in
//! through a [`UserInput`]. Both may be touched from the accept task and
//! from the sending task at the same time, so implementations carry
//! their own synchronization.

use std::sync::{Mutex, MutexGuard};

use log::{info, warn};
use tokio::sync::mpsc;

/// Where a displayed message came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Origin {
    /// Received from the remote peer.
    Peer,
    /// Sent by this peer.
    Local,
    /// Produced by the channel itself (ready, bind or receive failures).
    Status,
}

/// A text payload on its way to the display. Never stored by the channel.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InboundMessage {
    /// Decoded text.
    pub text: String,
    /// Origin label.
    pub origin: Origin,
}

impl InboundMessage {
    /// Creates a message received from the remote peer.
    pub fn peer(text: impl Into<String>) -> Self {
        Self { text: text.into(), origin: Origin::Peer }
    }

    /// Creates a message sent by this peer.
    pub fn local(text: impl Into<String>) -> Self {
        Self { text: text.into(), origin: Origin::Local }
    }

    /// Creates a status line.
    pub fn status(text: impl Into<String>) -> Self {
        Self { text: text.into(), origin: Origin::Status }
    }
}

/// Receives text and status notifications for display.
///
/// Called from the background accept task and from whichever task
/// sends. Must not block indefinitely.
pub trait MessageSink: Send + Sync {
    /// Hands one message to the display.
    fn notify(&self, message: InboundMessage);
}

/// Supplies outbound text on user action.
pub trait UserInput: Send + Sync {
    /// Returns the currently staged text without clearing it.
    fn pending(&self) -> String;

    /// Clears the staged text.
    fn clear(&self);

    /// Returns the staged text and clears it.
    fn take_pending(&self) -> String {
        let text = self.pending();
        self.clear();
        text
    }

    /// Clears the staged text only if it is still `sent`.
    ///
    /// Returns false when the user staged something else meanwhile; that
    /// text is left in place.
    fn clear_if(&self, sent: &str) -> bool {
        if self.pending() != sent {
            return false;
        }
        self.clear();
        true
    }
}

/// Writes every notification through the `log` facade.
#[derive(Debug, Default, Clone, Copy)]
pub struct LogSink;

impl MessageSink for LogSink {
    fn notify(&self, message: InboundMessage) {
        match message.origin {
            Origin::Peer => info!("[peer] {}", message.text),
            Origin::Local => info!("[you] {}", message.text),
            Origin::Status => warn!("[status] {}", message.text),
        }
    }
}

/// Marshals notifications onto an unbounded queue drained by the task
/// that owns presentation.
#[derive(Debug, Clone)]
pub struct QueueSink {
    tx: mpsc::UnboundedSender<InboundMessage>,
}

impl QueueSink {
    /// Creates a sink and the receiver the presentation task drains.
    pub fn channel() -> (Self, mpsc::UnboundedReceiver<InboundMessage>) {
        let (tx, rx) = mpsc::unbounded_channel();
        (Self { tx }, rx)
    }
}

impl MessageSink for QueueSink {
    fn notify(&self, message: InboundMessage) {
        // Receiver gone means nobody is displaying anymore.
        let _ = self.tx.send(message);
    }
}

/// Staged outbound text guarded by a mutex.
#[derive(Debug, Default)]
pub struct PendingText {
    text: Mutex<String>,
}

impl PendingText {
    /// Creates an input with nothing staged.
    pub fn new() -> Self {
        Self::default()
    }

    /// Replaces the staged text.
    pub fn set(&self, text: impl Into<String>) {
        *self.lock() = text.into();
    }

    fn lock(&self) -> MutexGuard<'_, String> {
        self.text.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

impl UserInput for PendingText {
    fn pending(&self) -> String {
        self.lock().clone()
    }

    fn clear(&self) {
        self.lock().clear();
    }

    fn take_pending(&self) -> String {
        std::mem::take(&mut *self.lock())
    }

    fn clear_if(&self, sent: &str) -> bool {
        let mut text = self.lock();
        if *text != sent {
            return false;
        }
        text.clear();
        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_pending_text() {
        let input = PendingText::new();
        assert_eq!(input.pending(), "");

        input.set("hello");
        assert_eq!(input.pending(), "hello");
        assert_eq!(input.pending(), "hello");

        assert_eq!(input.take_pending(), "hello");
        assert_eq!(input.pending(), "");

        input.set("again");
        input.clear();
        assert_eq!(input.pending(), "");
    }

    #[test]
    fn test_clear_if_keeps_newer_text() {
        let input = PendingText::new();
        input.set("sent");
        assert!(input.clear_if("sent"));
        assert_eq!(input.pending(), "");

        input.set("typed later");
        assert!(!input.clear_if("sent"));
        assert_eq!(input.pending(), "typed later");
    }

    #[test]
    fn test_log_sink_accepts_every_origin() {
        let _ = env_logger::builder().is_test(true).try_init();
        let sink = LogSink;
        sink.notify(InboundMessage::peer("from peer"));
        sink.notify(InboundMessage::local("from me"));
        sink.notify(InboundMessage::status("ready"));
    }

    #[tokio::test]
    async fn test_queue_sink_preserves_order() {
        let (sink, mut rx) = QueueSink::channel();
        sink.notify(InboundMessage::peer("a"));
        sink.notify(InboundMessage::local("b"));
        sink.notify(InboundMessage::status("c"));

        assert_eq!(rx.recv().await, Some(InboundMessage::peer("a")));
        assert_eq!(rx.recv().await.map(|m| m.origin), Some(Origin::Local));
        assert_eq!(rx.recv().await.map(|m| m.text), Some("c".to_string()));
    }

    #[test]
    fn test_queue_sink_after_receiver_dropped() {
        let (sink, rx) = QueueSink::channel();
        drop(rx);
        sink.notify(InboundMessage::peer("nobody listening"));
    }
}
