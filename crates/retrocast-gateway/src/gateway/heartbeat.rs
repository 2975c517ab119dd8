//! Heartbeat liveness monitor.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tokio::time::{Instant, MissedTickBehavior};

/// What the monitor asks the connection driver to do on each tick.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HeartbeatSignal {
    /// Send a heartbeat now.
    Beat,
    /// The previous heartbeat was never acknowledged. The monitor has stopped.
    Stale,
}

/// Periodic heartbeat task with an acknowledged flag.
///
/// The flag starts out set. On every tick a cleared flag means the previous
/// probe went unanswered, so the monitor emits [`HeartbeatSignal::Stale`] and
/// stops; otherwise it clears the flag and emits [`HeartbeatSignal::Beat`].
/// [`HeartbeatMonitor::acknowledge`] sets it again.
#[derive(Debug)]
pub struct HeartbeatMonitor {
    acked: Arc<AtomicBool>,
    running: Arc<AtomicBool>,
    task: Option<JoinHandle<()>>,
}

impl Default for HeartbeatMonitor {
    fn default() -> Self {
        Self::new()
    }
}

impl HeartbeatMonitor {
    /// Create an idle monitor.
    #[must_use]
    pub fn new() -> Self {
        Self {
            acked: Arc::new(AtomicBool::new(true)),
            running: Arc::new(AtomicBool::new(false)),
            task: None,
        }
    }

    /// Start ticking every `interval`, replacing any running task.
    ///
    /// The first tick fires one full interval after this call.
    pub fn start(&mut self, interval: Duration, tx: mpsc::Sender<HeartbeatSignal>) {
        self.stop();

        let acked = Arc::new(AtomicBool::new(true));
        let running = Arc::new(AtomicBool::new(true));
        self.acked = Arc::clone(&acked);
        self.running = Arc::clone(&running);

        self.task = Some(tokio::spawn(async move {
            let mut ticker = tokio::time::interval_at(Instant::now() + interval, interval);
            ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

            while running.load(Ordering::SeqCst) {
                ticker.tick().await;

                if !running.load(Ordering::SeqCst) {
                    break;
                }

                let signal = if acked.swap(false, Ordering::SeqCst) {
                    HeartbeatSignal::Beat
                } else {
                    HeartbeatSignal::Stale
                };

                if tx.send(signal).await.is_err() || signal == HeartbeatSignal::Stale {
                    running.store(false, Ordering::SeqCst);
                    break;
                }
            }
        }));
    }

    /// Stop the task. Idempotent.
    pub fn stop(&mut self) {
        self.running.store(false, Ordering::SeqCst);
        if let Some(task) = self.task.take() {
            task.abort();
        }
    }

    /// Record a HEARTBEAT_ACK.
    pub fn acknowledge(&self) {
        self.acked.store(true, Ordering::SeqCst);
    }

    /// Whether the last heartbeat has been acknowledged.
    #[must_use]
    pub fn is_acknowledged(&self) -> bool {
        self.acked.load(Ordering::SeqCst)
    }

    /// Check if the heartbeat task is running.
    #[must_use]
    pub fn is_running(&self) -> bool {
        self.running.load(Ordering::SeqCst)
    }
}

impl Drop for HeartbeatMonitor {
    fn drop(&mut self) {
        self.stop();
    }
}
