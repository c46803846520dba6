use super::types::WatchOutcome;
use tokio::io::{AsyncBufRead, AsyncBufReadExt, AsyncReadExt, BufReader};
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

/// Control-channel sentinel; matched anywhere within a line
pub const QUIT_COMMAND: &str = "QUIT";

/// Longest stretch of a single control line held in memory at once
pub const MAX_CONTROL_LINE: usize = 4096;

fn contains_quit(line: &[u8]) -> bool {
    line.windows(QUIT_COMMAND.len())
        .any(|window| window == QUIT_COMMAND.as_bytes())
}

/// Read control lines until QUIT, end of input, or external cancellation.
///
/// Lines are matched as raw bytes, so input that is not UTF-8 is ignored
/// rather than ending the watcher. Overlong lines are scanned in bounded
/// chunks. Only ever moves the latch from not-cancelled to cancelled.
pub async fn watch_for_quit<R>(mut reader: R, cancel: CancellationToken) -> WatchOutcome
where
    R: AsyncBufRead + Unpin,
{
    let mut line: Vec<u8> = Vec::with_capacity(256);

    loop {
        let mut chunk = (&mut reader).take(MAX_CONTROL_LINE as u64);
        let read = tokio::select! {
            _ = cancel.cancelled() => {
                debug!("Quit watcher stopping, shutdown already requested");
                return WatchOutcome::Stopped;
            }
            read = chunk.read_until(b'\n', &mut line) => read,
        };

        match read {
            Ok(0) => {
                debug!("Control input closed");
                return WatchOutcome::InputClosed;
            }
            Ok(_) => {
                if contains_quit(&line) {
                    info!("Received QUIT command. Exiting gracefully.");
                    cancel.cancel();
                    return WatchOutcome::QuitReceived;
                }

                if line.last() == Some(&b'\n') {
                    debug!(
                        "Ignoring control input: {:?}",
                        String::from_utf8_lossy(&line).trim_end()
                    );
                    line.clear();
                } else if line.len() >= MAX_CONTROL_LINE {
                    // Keep the tail so a QUIT split across chunks still matches
                    let keep = QUIT_COMMAND.len() - 1;
                    line.drain(..line.len() - keep);
                }
            }
            Err(e) => {
                warn!("Error reading control input: {}", e);
                return WatchOutcome::InputClosed;
            }
        }
    }
}

/// Watch process stdin on its own task
pub fn spawn_quit_watcher(cancel: CancellationToken) -> JoinHandle<WatchOutcome> {
    tokio::spawn(watch_for_quit(BufReader::new(tokio::io::stdin()), cancel))
}
