//! Outbound half of the peer channel.
//!
//! Every message travels on its own connection: connect, write, close.

use std::time::Duration;

use log::{debug, trace};
use tokio::io::AsyncWriteExt;
use tokio::net::TcpStream;

use crate::endpoint::PeerEndpoint;
use crate::error::SendError;

/// Sends one message to `remote` and closes the connection.
///
/// The text is trimmed first. Whitespace-only text performs no network
/// I/O and returns `Ok(0)`; otherwise returns the number of bytes written.
/// Receivers read at most [`RECV_BUFFER_SIZE`](crate::RECV_BUFFER_SIZE)
/// bytes per connection, so longer messages arrive truncated.
pub async fn send_message(
    remote: PeerEndpoint,
    text: &str,
    connect_timeout: Option<Duration>,
) -> Result<usize, SendError> {
    let text = text.trim();
    if text.is_empty() {
        trace!("Nothing to send to {}", remote);
        return Ok(0);
    }

    let mut stream = connect(remote, connect_timeout).await?;
    let data = text.as_bytes();
    stream
        .write_all(data)
        .await
        .map_err(|e| SendError::write(remote, e))?;

    // The payload is already out; a failed FIN only means the receiver
    // hung up first.
    if let Err(e) = stream.shutdown().await {
        debug!("Shutdown of connection to {} failed: {}", remote, e);
    }

    debug!("Sent {} bytes to {}", data.len(), remote);
    Ok(data.len())
}

async fn connect(remote: PeerEndpoint, limit: Option<Duration>) -> Result<TcpStream, SendError> {
    let connecting = TcpStream::connect(remote.socket_addr());
    let stream = match limit {
        Some(limit) => tokio::time::timeout(limit, connecting)
            .await
            .map_err(|_| SendError::timeout(remote))?,
        None => connecting.await,
    };
    stream.map_err(|e| SendError::connect(remote, e))
}

#[cfg(test)]
mod tests {
    use super::*;

    use tokio::io::AsyncReadExt;
    use tokio::net::TcpListener;

    use crate::error::SendErrorKind;

    #[tokio::test]
    async fn test_blank_text_is_noop() {
        // Nothing listens on port 1; a connect attempt would fail.
        let remote = PeerEndpoint::loopback(1);
        assert_eq!(send_message(remote, "", None).await.unwrap(), 0);
        assert_eq!(send_message(remote, "  \t\n ", None).await.unwrap(), 0);
    }

    #[tokio::test]
    async fn test_sends_trimmed_text_and_closes() {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        let remote = PeerEndpoint::try_from(addr).unwrap();

        let reader = tokio::spawn(async move {
            let (mut stream, _) = listener.accept().await.unwrap();
            let mut buf = Vec::new();
            // EOF proves the sender closed the connection
            stream.read_to_end(&mut buf).await.unwrap();
            buf
        });

        let n = send_message(remote, "  hi there \n", None).await.unwrap();
        assert_eq!(n, 8);
        assert_eq!(reader.await.unwrap(), b"hi there");
    }

    #[tokio::test]
    async fn test_connect_refused() {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let remote = PeerEndpoint::try_from(listener.local_addr().unwrap()).unwrap();
        drop(listener);

        let err = send_message(remote, "hello", None).await.unwrap_err();
        assert_eq!(err.kind(), SendErrorKind::ConnectRefused);
        assert_eq!(err.remote(), remote);
    }
}
