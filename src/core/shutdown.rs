//! Signal-driven shutdown
//!
//! A [`ShutdownCoordinator`] owns the root [`CancellationToken`] of the
//! process. Publishers and consumer loops receive child tokens, so a single
//! signal cancels everything that is waiting on channel capacity, waiting
//! for messages, or running inside a handler.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use tokio_util::sync::CancellationToken;

/// Exit status used when a second signal forces an immediate exit
pub const FORCED_EXIT_CODE: i32 = 130;

/// Coordinates graceful shutdown across the application
#[derive(Debug, Clone, Default)]
pub struct ShutdownCoordinator {
    token: CancellationToken,
    signal_count: Arc<AtomicUsize>,
}

impl ShutdownCoordinator {
    pub fn new() -> Self {
        Self::default()
    }

    /// The root token; cancelled once shutdown is requested
    pub fn token(&self) -> &CancellationToken {
        &self.token
    }

    /// A token cancelled with the root, but cancellable on its own
    pub fn child_token(&self) -> CancellationToken {
        self.token.child_token()
    }

    pub fn trigger_shutdown(&self) {
        self.token.cancel();
    }

    pub fn is_shutdown_requested(&self) -> bool {
        self.token.is_cancelled()
    }

    /// Record a received signal and cancel the root token
    ///
    /// Returns true when this was not the first signal; the caller is
    /// expected to exit immediately in that case.
    fn on_signal(&self, name: &str) -> bool {
        let previous = self.signal_count.fetch_add(1, Ordering::AcqRel);
        if previous == 0 {
            log::warn!("Received {}; shutting down (repeat to force exit)", name);
        }
        self.trigger_shutdown();
        previous >= 1
    }

    /// Install SIGINT/SIGTERM/SIGHUP/SIGQUIT and Ctrl-C handlers
    ///
    /// The first signal cancels the root token; a second one exits the
    /// process with [`FORCED_EXIT_CODE`]. Must be called from within a tokio
    /// runtime.
    pub fn install_signal_handlers(&self) {
        #[cfg(unix)]
        {
            // Restore default SIGPIPE so writes to a closed pipe end the process quietly
            unsafe {
                libc::signal(libc::SIGPIPE, libc::SIG_DFL);
            }

            use tokio::signal::unix::{signal, SignalKind};
            let signals = [
                (SignalKind::interrupt(), "SIGINT"),
                (SignalKind::terminate(), "SIGTERM"),
                (SignalKind::hangup(), "SIGHUP"),
                (SignalKind::quit(), "SIGQUIT"),
            ];

            for (kind, name) in signals {
                let coordinator = self.clone();
                tokio::spawn(async move {
                    let Ok(mut stream) = signal(kind) else {
                        log::debug!("Could not install {} handler", name);
                        return;
                    };
                    while stream.recv().await.is_some() {
                        if coordinator.on_signal(name) {
                            std::process::exit(FORCED_EXIT_CODE);
                        }
                    }
                });
            }
        }

        // Terminals that do not deliver SIGINT directly still raise ctrl_c
        let coordinator = self.clone();
        tokio::spawn(async move {
            while tokio::signal::ctrl_c().await.is_ok() {
                if coordinator.on_signal("Ctrl-C") {
                    log::warn!("Ctrl-C received again; exiting");
                    std::process::exit(FORCED_EXIT_CODE);
                }
            }
        });
    }
}
