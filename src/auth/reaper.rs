// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! # Session Reaper
//!
//! Background task that periodically evicts expired sessions. Verification
//! already evicts lazily, but a token that is never presented again would
//! otherwise sit in memory forever.
//!
//! ## Shutdown
//!
//! Uses `tokio_util::sync::CancellationToken` for graceful shutdown.

use std::sync::Arc;
use std::time::Duration;

use chrono::Utc;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info};

use super::SessionStore;

/// Default interval between sweeps.
pub const DEFAULT_SWEEP_INTERVAL: Duration = Duration::from_secs(60);

/// Periodic sweeper for expired sessions.
pub struct SessionReaper {
    sessions: Arc<SessionStore>,
    sweep_interval: Duration,
}

impl SessionReaper {
    pub fn new(sessions: Arc<SessionStore>) -> Self {
        Self {
            sessions,
            sweep_interval: DEFAULT_SWEEP_INTERVAL,
        }
    }

    pub fn with_interval(mut self, sweep_interval: Duration) -> Self {
        self.sweep_interval = sweep_interval;
        self
    }

    /// Run the sweep loop until the cancellation token is triggered.
    ///
    /// Should be spawned as a background task:
    /// ```rust,ignore
    /// tokio::spawn(reaper.run(shutdown.clone()));
    /// ```
    pub async fn run(self, shutdown: CancellationToken) {
        info!(
            interval_secs = self.sweep_interval.as_secs(),
            "Session reaper starting"
        );

        loop {
            tokio::select! {
                _ = tokio::time::sleep(self.sweep_interval) => {},
                _ = shutdown.cancelled() => {
                    info!("Session reaper shutting down");
                    return;
                }
            }

            self.sweep();
        }
    }

    /// Evict expired sessions once. Returns how many were removed.
    pub fn sweep(&self) -> usize {
        let evicted = self.sessions.purge_expired(Utc::now());
        if evicted > 0 {
            info!(
                evicted,
                remaining = self.sessions.len(),
                "Session reaper: evicted expired sessions"
            );
        } else {
            debug!("Session reaper: nothing to evict");
        }
        evicted
    }
}
