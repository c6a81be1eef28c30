//! Console peer for the two-peer loopback chat.
//!
//! Run two of these with mirrored ports:
//!
//! ```text
//! peer --name "Client 1" --listen 8001 --remote 8002
//! peer --name "Client 2" --listen 8002 --remote 8001
//! ```
//!
//! Each line typed on stdin is sent to the other peer.

mod cli;
mod console;

use std::process::ExitCode;
use std::sync::Arc;

use log::{error, info, warn};
use xchat::{InboundMessage, MessageSink, PeerChannel, PendingText, QueueSink};

use crate::cli::Cli;

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse_args();

    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(cli.log_level.as_str())).init();

    let (sink, rx) = QueueSink::channel();
    let printer = console::spawn_printer(rx);

    let channel = match PeerChannel::start(cli.channel_config(), Arc::new(sink.clone())).await {
        Ok(channel) => channel,
        Err(e) => {
            error!("Failed to start {}: {}", cli.name, e);
            drop(sink);
            let _ = printer.await;
            return ExitCode::FAILURE;
        }
    };
    info!("{:?}", channel);

    let input = PendingText::new();
    let mut lines = console::spawn_line_reader(std::io::BufReader::new(std::io::stdin()));
    let ctrl_c = tokio::signal::ctrl_c();
    tokio::pin!(ctrl_c);

    loop {
        tokio::select! {
            _ = &mut ctrl_c => {
                info!("Received Ctrl+C, shutting down...");
                break;
            }
            line = lines.recv() => match line {
                Some(Ok(line)) => {
                    input.set(line);
                    if let Err(e) = channel.submit(&input).await {
                        warn!("Send failed: {}", e);
                        sink.notify(InboundMessage::status(format!("send error: {}", e)));
                    }
                }
                None => {
                    info!("Input closed, shutting down...");
                    break;
                }
                Some(Err(e)) => {
                    error!("Failed to read input: {}", e);
                    break;
                }
            }
        }
    }

    channel.shutdown().await;
    drop(channel);
    drop(sink);
    let _ = printer.await;
    ExitCode::SUCCESS
}
