//! # Spawn Scheduler
//!
//! Optional background timer that asks for extra hazards.
//!
//! The scheduler never touches the map. It only sends [`SpawnRequest`]s
//! through a bounded channel; the map drains them inside `update()` on the
//! thread that owns it.
//!
//! ```text
//! ┌──────────────┐     ┌──────────────┐     ┌──────────────┐
//! │    Timer     │ ──▶ │   Channel    │ ──▶ │   GameMap    │
//! │   (thread)   │     │  (bounded)   │     │  update()    │
//! └──────────────┘     └──────────────┘     └──────────────┘
//! ```

use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::Arc;
use std::thread::{self, JoinHandle};
use std::time::{Duration, Instant};

use crossbeam_channel::{bounded, Receiver, Sender, TrySendError};
use parking_lot::Mutex;

use lanehop_core::ObstacleKind;

/// Default channel capacity.
pub const DEFAULT_CAPACITY: usize = 64;

/// A request for one extra moving hazard.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct SpawnRequest {
    /// Kind to spawn. Always a moving kind.
    pub kind: ObstacleKind,
}

/// Counters shared with the timer thread.
#[derive(Debug, Default)]
pub struct SpawnerStats {
    /// Requests delivered to the channel.
    pub sent: AtomicU64,
    /// Requests dropped because the channel was full.
    pub dropped: AtomicU64,
}

/// Background timer emitting spawn requests.
///
/// Stopping is immediate (the timer thread is woken, not waited out) and
/// idempotent. Dropping the scheduler stops it.
pub struct SpawnScheduler {
    sender: Sender<SpawnRequest>,
    receiver: Receiver<SpawnRequest>,
    kinds: Arc<[ObstacleKind]>,
    interval: Duration,
    running: Arc<AtomicBool>,
    paused: Arc<AtomicBool>,
    stats: Arc<SpawnerStats>,
    worker: Mutex<Option<JoinHandle<()>>>,
}

impl SpawnScheduler {
    /// Creates a stopped scheduler.
    ///
    /// Requests cycle through `kinds` in order, one every `interval`.
    ///
    /// # Arguments
    ///
    /// * `interval` - Time between requests
    /// * `kinds` - Hazard kinds to request, in rotation
    /// * `capacity` - Channel capacity (at least 1)
    ///
    /// # Panics
    ///
    /// Panics if `kinds` is empty or contains a kind that does not move.
    #[must_use]
    pub fn new(interval: Duration, kinds: &[ObstacleKind], capacity: usize) -> Self {
        assert!(!kinds.is_empty(), "Spawn scheduler needs at least one kind");
        for kind in kinds {
            assert!(kind.is_moving(), "{kind:?} is not a moving obstacle");
        }

        let (sender, receiver) = bounded(capacity.max(1));
        Self {
            sender,
            receiver,
            kinds: kinds.into(),
            interval,
            running: Arc::new(AtomicBool::new(false)),
            paused: Arc::new(AtomicBool::new(false)),
            stats: Arc::new(SpawnerStats::default()),
            worker: Mutex::new(None),
        }
    }

    /// Returns a receiver for the map to drain.
    #[must_use]
    pub fn receiver(&self) -> Receiver<SpawnRequest> {
        self.receiver.clone()
    }

    /// Returns the shared counters.
    #[must_use]
    pub fn stats(&self) -> Arc<SpawnerStats> {
        Arc::clone(&self.stats)
    }

    /// Checks if the timer thread is running.
    #[must_use]
    pub fn is_running(&self) -> bool {
        self.running.load(Ordering::Relaxed)
    }

    /// Checks if requests are currently suppressed.
    #[must_use]
    pub fn is_paused(&self) -> bool {
        self.paused.load(Ordering::Relaxed)
    }

    /// Starts the timer thread. Does nothing if already running.
    pub fn start(&self) {
        let mut worker = self.worker.lock();
        if self.running.swap(true, Ordering::SeqCst) {
            return;
        }

        let sender = self.sender.clone();
        let kinds = Arc::clone(&self.kinds);
        let interval = self.interval;
        let running = Arc::clone(&self.running);
        let paused = Arc::clone(&self.paused);
        let stats = Arc::clone(&self.stats);

        *worker = Some(thread::spawn(move || {
            let mut next = 0usize;
            loop {
                let deadline = Instant::now() + interval;
                loop {
                    if !running.load(Ordering::SeqCst) {
                        return;
                    }
                    let now = Instant::now();
                    if now >= deadline {
                        break;
                    }
                    thread::park_timeout(deadline - now);
                }
                if paused.load(Ordering::SeqCst) {
                    continue;
                }

                let request = SpawnRequest {
                    kind: kinds[next % kinds.len()],
                };
                match sender.try_send(request) {
                    Ok(()) => {
                        stats.sent.fetch_add(1, Ordering::Relaxed);
                        next = next.wrapping_add(1);
                    }
                    Err(TrySendError::Full(_)) => {
                        stats.dropped.fetch_add(1, Ordering::Relaxed);
                        tracing::warn!(kind = ?request.kind, "spawn channel full, request dropped");
                    }
                    Err(TrySendError::Disconnected(_)) => return,
                }
            }
        }));
        tracing::debug!(interval_ms = self.interval.as_millis() as u64, "spawn scheduler started");
    }

    /// Stops the timer thread and waits for it to exit.
    ///
    /// Safe to call any number of times, including before `start`.
    pub fn stop(&self) {
        let handle = {
            let mut worker = self.worker.lock();
            self.running.store(false, Ordering::SeqCst);
            worker.take()
        };
        if let Some(handle) = handle {
            handle.thread().unpark();
            if handle.join().is_err() {
                tracing::warn!("spawn scheduler thread panicked");
            }
            tracing::debug!("spawn scheduler stopped");
        }
    }

    /// Suppresses requests without stopping the thread.
    pub fn pause(&self) {
        self.paused.store(true, Ordering::SeqCst);
    }

    /// Lifts a pause.
    pub fn resume(&self) {
        self.paused.store(false, Ordering::SeqCst);
    }
}

impl Drop for SpawnScheduler {
    fn drop(&mut self) {
        self.stop();
    }
}
