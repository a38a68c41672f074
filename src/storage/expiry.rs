//! Background Expiry Sweeper
//!
//! This module implements the reaper: a background task that periodically scans
//! the registry for expired files and removes them.
//!
//! ## Why Do We Need This?
//!
//! Downloads already refuse expired entries, but a file that is never
//! requested again would stay in memory forever. The sweeper reclaims it.
//!
//! ## Design
//!
//! The sweeper runs as a Tokio task and:
//! 1. Sleeps for a fixed interval (default: one minute)
//! 2. Wakes up and sweeps the whole registry under its lock
//! 3. Logs every evicted key with the expiry it had
//!
//! It holds no state between ticks. Stopping it (or dropping its handle) ends
//! the task at the next wake-up, which lets tests start and stop it
//! deterministically.

use crate::storage::Registry;
use chrono::Utc;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::watch;
use tracing::{debug, info, trace};

/// Configuration for the expiry sweeper.
#[derive(Debug, Clone)]
pub struct ExpiryConfig {
    /// Interval between sweeps (default: 60s)
    pub interval: Duration,
}

impl Default for ExpiryConfig {
    fn default() -> Self {
        Self {
            interval: Duration::from_secs(60),
        }
    }
}

/// A handle to the running expiry sweeper.
///
/// When this handle is dropped, the sweeper task will be stopped.
#[derive(Debug)]
pub struct ExpirySweeper {
    /// Sender to signal shutdown
    shutdown_tx: watch::Sender<bool>,
}

impl ExpirySweeper {
    /// Starts the expiry sweeper as a background task.
    ///
    /// # Arguments
    ///
    /// * `registry` - The registry to sweep
    /// * `config` - Configuration for the sweeper
    ///
    /// # Returns
    ///
    /// Returns a handle that can be used to stop the sweeper.
    /// The sweeper will automatically stop when the handle is dropped.
    ///
    /// # Example
    ///
    /// ```ignore
    /// use temp_file_registry::storage::{ExpiryConfig, ExpirySweeper, Registry};
    /// use std::sync::Arc;
    ///
    /// let registry = Arc::new(Registry::new());
    /// let sweeper = ExpirySweeper::start(registry, ExpiryConfig::default());
    ///
    /// // Sweeper runs in the background...
    ///
    /// // Dropping the sweeper will stop it
    /// drop(sweeper);
    /// ```
    pub fn start(registry: Arc<Registry>, config: ExpiryConfig) -> Self {
        let (shutdown_tx, shutdown_rx) = watch::channel(false);

        info!(
            interval_secs = config.interval.as_secs_f64(),
            "Background expiry sweeper started"
        );

        tokio::spawn(sweeper_loop(registry, config, shutdown_rx));

        Self { shutdown_tx }
    }

    /// Stops the expiry sweeper.
    ///
    /// This is called automatically when the handle is dropped.
    pub fn stop(&self) {
        if self.shutdown_tx.send_replace(true) {
            return;
        }
        info!("Background expiry sweeper stopped");
    }
}

impl Drop for ExpirySweeper {
    fn drop(&mut self) {
        self.stop();
    }
}

/// The main sweeper loop.
async fn sweeper_loop(
    registry: Arc<Registry>,
    config: ExpiryConfig,
    mut shutdown_rx: watch::Receiver<bool>,
) {
    loop {
        // Wait for the interval or shutdown signal
        tokio::select! {
            _ = tokio::time::sleep(config.interval) => {}
            result = shutdown_rx.changed() => {
                if result.is_err() || *shutdown_rx.borrow() {
                    debug!("Expiry sweeper received shutdown signal");
                    return;
                }
            }
        }

        let evicted = registry.sweep_expired(Utc::now());

        for entry in &evicted {
            debug!(
                key = %entry.key,
                expires_at = %entry.expires_at.to_rfc3339(),
                "File expired, removed from registry"
            );
        }

        if evicted.is_empty() {
            trace!("Expiry sweep found nothing to remove");
        } else {
            debug!(
                expired = evicted.len(),
                entries_remaining = registry.len(),
                "Expired files cleaned up"
            );
        }
    }
}

/// Starts the expiry sweeper with default configuration.
///
/// This is a convenience function for simple use cases.
pub fn start_expiry_sweeper(registry: Arc<Registry>) -> ExpirySweeper {
    ExpirySweeper::start(registry, ExpiryConfig::default())
}
