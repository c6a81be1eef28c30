//! Inbound half of the peer channel.
//!
//! Accepts one connection at a time, reads one message from it,
//! and hands the decoded text to the sink.

use std::net::SocketAddr;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use log::{debug, error, trace};
use tokio::io::AsyncReadExt;
use tokio::net::{TcpListener, TcpStream};
use tokio_util::sync::CancellationToken;

use crate::error::AcceptError;
use crate::sink::{InboundMessage, MessageSink};

/// Outcome of one accepted connection.
#[derive(Debug, PartialEq, Eq)]
enum Received {
    /// A non-empty message.
    Message(String),

    /// The peer closed without sending anything.
    Empty,

    /// Shutdown fired while reading.
    Cancelled,
}

/// Background accept loop. Owns the listening socket; dropping the
/// receiver closes it.
pub(super) struct Receiver {
    listener: TcpListener,
    sink: Arc<dyn MessageSink>,
    buffer_size: usize,
    cancel: CancellationToken,
    receiving: Arc<AtomicBool>,
}

impl Receiver {
    pub(super) fn new(
        listener: TcpListener,
        sink: Arc<dyn MessageSink>,
        buffer_size: usize,
        cancel: CancellationToken,
        receiving: Arc<AtomicBool>,
    ) -> Self {
        Self {
            listener,
            sink,
            buffer_size,
            cancel,
            receiving,
        }
    }

    /// Runs until cancelled or until a receive error.
    pub(super) async fn run(self) {
        match self.accept_loop().await {
            Ok(()) => debug!("Accept loop cancelled"),
            // Failures racing a shutdown are the unblocking path, not errors.
            Err(e) if self.cancel.is_cancelled() => debug!("Accept loop stopped during shutdown: {}", e),
            Err(e) => {
                error!("Accept loop terminated: {}", e);
                self.sink.notify(InboundMessage::status(format!("receive error: {}", e)));
            }
        }
        self.receiving.store(false, Ordering::Release);
    }

    async fn accept_loop(&self) -> Result<(), AcceptError> {
        let mut buf = vec![0u8; self.buffer_size];

        loop {
            let (stream, peer) = tokio::select! {
                biased;
                _ = self.cancel.cancelled() => return Ok(()),
                accepted = self.listener.accept() => accepted.map_err(AcceptError::accept)?,
            };
            trace!("Accepted connection from {}", peer);

            // `stream` is consumed here and closed on every return path.
            match self.receive_one(stream, peer, &mut buf).await? {
                Received::Message(text) => self.sink.notify(InboundMessage::peer(text)),
                Received::Empty => trace!("Connection from {} closed empty", peer),
                Received::Cancelled => return Ok(()),
            }
        }
    }

    async fn receive_one(
        &self,
        mut stream: TcpStream,
        peer: SocketAddr,
        buf: &mut [u8],
    ) -> Result<Received, AcceptError> {
        let n = tokio::select! {
            biased;
            _ = self.cancel.cancelled() => return Ok(Received::Cancelled),
            read = stream.read(buf) => read.map_err(AcceptError::read)?,
        };

        if n == 0 {
            return Ok(Received::Empty);
        }

        let text = decode(&buf[..n]);
        debug!("Received {} bytes from {}", n, peer);
        Ok(Received::Message(text))
    }
}

/// Decodes UTF-8, replacing invalid sequences (including a multi-byte
/// character cut by the buffer limit) with U+FFFD.
fn decode(bytes: &[u8]) -> String {
    String::from_utf8_lossy(bytes).into_owned()
}

#[cfg(test)]
mod tests {
    use super::*;

    use tokio::io::AsyncWriteExt;

    use crate::sink::{Origin, QueueSink};

    async fn spawn_receiver(
        buffer_size: usize,
    ) -> (
        SocketAddr,
        CancellationToken,
        tokio::task::JoinHandle<()>,
        tokio::sync::mpsc::UnboundedReceiver<InboundMessage>,
    ) {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        let (sink, rx) = QueueSink::channel();
        let cancel = CancellationToken::new();
        let receiver = Receiver::new(
            listener,
            Arc::new(sink),
            buffer_size,
            cancel.clone(),
            Arc::new(AtomicBool::new(true)),
        );
        (addr, cancel, tokio::spawn(receiver.run()), rx)
    }

    #[test]
    fn test_decode() {
        assert_eq!(decode(b"hello"), "hello");
        assert_eq!(decode("привет".as_bytes()), "привет");

        // Cut in the middle of a two-byte character
        let bytes = "é".as_bytes();
        assert_eq!(decode(&bytes[..1]), "\u{FFFD}");
    }

    #[tokio::test]
    async fn test_one_message_per_connection() {
        let (addr, cancel, task, mut rx) = spawn_receiver(1024).await;

        let mut stream = TcpStream::connect(addr).await.unwrap();
        stream.write_all(b"hello").await.unwrap();
        stream.shutdown().await.unwrap();

        let msg = rx.recv().await.unwrap();
        assert_eq!(msg.origin, Origin::Peer);
        assert_eq!(msg.text, "hello");

        cancel.cancel();
        task.await.unwrap();
    }

    #[tokio::test]
    async fn test_empty_connection_is_dropped() {
        let (addr, cancel, task, mut rx) = spawn_receiver(1024).await;

        drop(TcpStream::connect(addr).await.unwrap());

        let mut stream = TcpStream::connect(addr).await.unwrap();
        stream.write_all(b"after").await.unwrap();
        stream.shutdown().await.unwrap();

        assert_eq!(rx.recv().await.unwrap().text, "after");

        cancel.cancel();
        task.await.unwrap();
        assert!(rx.try_recv().is_err());
    }

    #[tokio::test]
    async fn test_truncates_to_buffer_size() {
        let (addr, cancel, task, mut rx) = spawn_receiver(4).await;

        let mut stream = TcpStream::connect(addr).await.unwrap();
        stream.write_all(b"abcdefgh").await.unwrap();
        let _ = stream.shutdown().await;

        assert_eq!(rx.recv().await.unwrap().text, "abcd");

        cancel.cancel();
        task.await.unwrap();
    }

    #[tokio::test]
    async fn test_cancel_unblocks_idle_accept() {
        let (_addr, cancel, task, mut rx) = spawn_receiver(1024).await;

        cancel.cancel();
        tokio::time::timeout(std::time::Duration::from_secs(5), task)
            .await
            .expect("accept loop did not observe cancellation")
            .unwrap();

        // Cancellation is silent
        assert!(rx.try_recv().is_err());
    }

    #[tokio::test]
    async fn test_cancel_unblocks_stalled_read() {
        let (addr, cancel, task, mut rx) = spawn_receiver(1024).await;

        // Connected but never writes
        let _stream = TcpStream::connect(addr).await.unwrap();
        tokio::time::sleep(std::time::Duration::from_millis(50)).await;

        cancel.cancel();
        tokio::time::timeout(std::time::Duration::from_secs(5), task)
            .await
            .expect("read did not observe cancellation")
            .unwrap();
        assert!(rx.try_recv().is_err());
    }
}
