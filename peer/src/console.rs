//! Terminal presentation: the only place that writes the transcript.

use std::io::{self, BufRead, Write};
use std::thread;

use tokio::sync::mpsc::{self, UnboundedReceiver};
use tokio::task::JoinHandle;
use xchat::{InboundMessage, Origin};

/// Formats one transcript line.
pub fn render(message: &InboundMessage) -> String {
    match message.origin {
        Origin::Peer => format!("Peer: {}", message.text),
        Origin::Local => format!("You: {}", message.text),
        Origin::Status => message.text.clone(),
    }
}

/// Drains the sink queue onto stdout until every sender is gone.
pub fn spawn_printer(mut rx: UnboundedReceiver<InboundMessage>) -> JoinHandle<()> {
    tokio::spawn(async move {
        while let Some(message) = rx.recv().await {
            let mut out = std::io::stdout().lock();
            let _ = writeln!(out, "{}", render(&message));
            let _ = out.flush();
        }
    })
}

/// Reads lines on a plain OS thread and forwards them to the runtime.
///
/// A blocked read there does not hold up runtime shutdown; the thread
/// dies with the process. The channel closes at EOF or after the first
/// read error, which is forwarded.
pub fn spawn_line_reader<R>(reader: R) -> UnboundedReceiver<io::Result<String>>
where
    R: BufRead + Send + 'static,
{
    let (tx, rx) = mpsc::unbounded_channel();
    thread::spawn(move || {
        for line in reader.lines() {
            let failed = line.is_err();
            if tx.send(line).is_err() || failed {
                break;
            }
        }
    });
    rx
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_line_reader_forwards_until_eof() {
        let mut rx = spawn_line_reader(io::Cursor::new("hi\nyo\n"));
        assert_eq!(rx.recv().await.unwrap().unwrap(), "hi");
        assert_eq!(rx.recv().await.unwrap().unwrap(), "yo");
        assert!(rx.recv().await.is_none());
    }

    #[test]
    fn test_line_reader_does_not_block_runtime_shutdown() {
        // A reader that never produces a line, like an idle terminal
        let (_hold, pipe) = std::sync::mpsc::channel::<()>();
        struct Idle(std::sync::mpsc::Receiver<()>);
        impl io::Read for Idle {
            fn read(&mut self, _: &mut [u8]) -> io::Result<usize> {
                let _ = self.0.recv();
                Ok(0)
            }
        }

        let runtime = tokio::runtime::Builder::new_current_thread().build().unwrap();
        let _rx = runtime.block_on(async { spawn_line_reader(io::BufReader::new(Idle(pipe))) });

        let started = std::time::Instant::now();
        drop(runtime);
        assert!(started.elapsed() < std::time::Duration::from_secs(1));
    }

    #[test]
    fn test_render() {
        assert_eq!(render(&InboundMessage::peer("yo")), "Peer: yo");
        assert_eq!(render(&InboundMessage::local("hi")), "You: hi");
        assert_eq!(
            render(&InboundMessage::status("Client 1 is ready to chat")),
            "Client 1 is ready to chat"
        );
    }
}
