use tokio_util::sync::CancellationToken;
use tracing::{info, warn};

/// Route SIGINT/SIGTERM onto the shutdown latch so a signalled process
/// leaves through the same finalizer as QUIT
pub fn spawn_signal_handlers(cancel: &CancellationToken) {
    // Handle SIGTERM - Unix only
    #[cfg(unix)]
    {
        let cancel_sigterm = cancel.clone();
        tokio::spawn(async move {
            use tokio::signal::unix::{signal, SignalKind};

            match signal(SignalKind::terminate()) {
                Ok(mut sigterm) => {
                    if sigterm.recv().await.is_some() {
                        info!("Received SIGTERM signal");
                        cancel_sigterm.cancel();
                    }
                }
                Err(e) => warn!("Failed to register SIGTERM handler: {}", e),
            }
        });
    }

    // Handle SIGINT (Ctrl+C) - Cross-platform
    let cancel_sigint = cancel.clone();
    tokio::spawn(async move {
        if let Ok(()) = tokio::signal::ctrl_c().await {
            info!("Received SIGINT signal (Ctrl+C)");
            cancel_sigint.cancel();
        }
    });
}
