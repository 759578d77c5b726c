//! Inactivity sweeper
//!
//! Background task that ends sessions idle past the configured timeout.
//! Runs on a fixed interval and stops cooperatively through a watch
//! channel so shutdown can join it cleanly.

use std::sync::Arc;
use std::time::Duration;

use chrono::Utc;
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tracing::{debug, warn};

use crate::engine::DialogueEngine;

pub struct SweeperHandle {
    shutdown: watch::Sender<bool>,
    task: JoinHandle<()>,
}

impl SweeperHandle {
    /// Signal the sweeper and wait for it to exit.
    pub async fn stop(self) {
        let _ = self.shutdown.send(true);
        let _ = self.task.await;
    }
}

impl DialogueEngine {
    /// Spawn the inactivity sweeper for this engine.
    pub fn start_sweeper(self: &Arc<Self>) -> SweeperHandle {
        let engine = Arc::clone(self);
        let (shutdown, mut rx) = watch::channel(false);
        let period = Duration::from_secs(self.settings().engine.sweep_interval_secs);
        let idle_after =
            chrono::Duration::seconds(self.settings().engine.session_inactivity_timeout_secs as i64);

        let task = tokio::spawn(async move {
            let mut ticker = tokio::time::interval(period);
            ticker.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Skip);
            // First tick fires immediately; skip it so a fresh engine
            // doesn't sweep before any session has had a chance to act.
            ticker.tick().await;
            loop {
                tokio::select! {
                    _ = ticker.tick() => {
                        let now = Utc::now();
                        let cutoff = now - idle_after;
                        for session_id in engine.store().idle_session_ids(cutoff) {
                            debug!(session_id = %session_id, "sweeping inactive session");
                            if let Err(err) = engine.end_session(&session_id, now).await {
                                warn!(session_id = %session_id, error = %err, "sweep failed");
                            }
                        }
                    }
                    changed = rx.changed() => {
                        if changed.is_err() || *rx.borrow() {
                            break;
                        }
                    }
                }
            }
            debug!("session sweeper stopped");
        });

        SweeperHandle { shutdown, task }
    }
}
