//! Fixed-rate background scheduling with a non-overlap guard.
//!
//! Runs on two dedicated threads per session:
//!
//! * the **timer** wakes every `interval` (first tick immediately), tries to
//!   claim the busy flag and, if it wins, hands the tick to the worker;
//! * the **worker** runs the task and releases the flag.
//!
//! A tick that finds the flag already claimed is skipped and counted, never
//! queued.  `stop()` closes the timer's stop channel, then waits for the
//! worker to finish whatever it is running.

use std::panic::{self, AssertUnwindSafe};
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::Arc;
use std::thread::{self, JoinHandle};
use std::time::{Duration, Instant};

use crossbeam_channel::{bounded, Receiver, RecvTimeoutError, Sender};
use tracing::{debug, error, info};

use crate::error::SchedulerError;

/// Default spacing between ticks.
pub const DEFAULT_INTERVAL: Duration = Duration::from_secs(5);

/// Work the scheduler runs on each tick.
///
/// Implementations handle their own errors; nothing a tick does can stop the
/// schedule.
pub trait Tick: Send + Sync + 'static {
    fn tick(&self);
}

impl Tick for crate::job::FetchJob {
    fn tick(&self) {
        // Failures are already logged and recorded in the job's state.
        let _ = self.run();
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SchedulerState {
    Idle,
    Running,
    Stopped,
}

/// Tick counters.  `fired == completed + skipped + in-flight`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SchedulerStats {
    pub fired: u64,
    pub completed: u64,
    pub skipped: u64,
}

#[derive(Debug, Default)]
struct Counters {
    fired: AtomicU64,
    completed: AtomicU64,
    skipped: AtomicU64,
}

pub struct Scheduler {
    interval: Duration,
    state: SchedulerState,
    counters: Arc<Counters>,
    busy: Arc<AtomicBool>,
    stop_tx: Option<Sender<()>>,
    timer: Option<JoinHandle<()>>,
    worker: Option<JoinHandle<()>>,
}

impl Scheduler {
    pub fn new(interval: Duration) -> Self {
        Self {
            interval: interval.max(Duration::from_millis(1)),
            state: SchedulerState::Idle,
            counters: Arc::new(Counters::default()),
            busy: Arc::new(AtomicBool::new(false)),
            stop_tx: None,
            timer: None,
            worker: None,
        }
    }

    pub fn state(&self) -> SchedulerState {
        self.state
    }

    pub fn interval(&self) -> Duration {
        self.interval
    }

    /// Whether a tick is executing right now.
    pub fn is_busy(&self) -> bool {
        self.busy.load(Ordering::Acquire)
    }

    pub fn stats(&self) -> SchedulerStats {
        SchedulerStats {
            fired: self.counters.fired.load(Ordering::Relaxed),
            completed: self.counters.completed.load(Ordering::Relaxed),
            skipped: self.counters.skipped.load(Ordering::Relaxed),
        }
    }

    /// Start ticking `task`.  The first tick fires immediately.
    ///
    /// Only an `Idle` scheduler can be started; anything else returns
    /// [`SchedulerError::AlreadyStarted`].  A stopped scheduler stays stopped.
    pub fn start<T: Tick>(&mut self, task: Arc<T>) -> Result<(), SchedulerError> {
        if self.state != SchedulerState::Idle {
            return Err(SchedulerError::AlreadyStarted);
        }

        let (work_tx, work_rx) = bounded::<()>(1);
        let (stop_tx, stop_rx) = bounded::<()>(1);

        let worker = {
            let busy = Arc::clone(&self.busy);
            let counters = Arc::clone(&self.counters);
            thread::Builder::new()
                .name("news-fetch-worker".to_string())
                .spawn(move || worker_loop(task, work_rx, busy, counters))
                .map_err(|e| SchedulerError::Spawn(e.to_string()))?
        };

        let timer = {
            let busy = Arc::clone(&self.busy);
            let counters = Arc::clone(&self.counters);
            let interval = self.interval;
            thread::Builder::new()
                .name("news-fetch-timer".to_string())
                .spawn(move || timer_loop(interval, stop_rx, work_tx, busy, counters))
                .map_err(|e| SchedulerError::Spawn(e.to_string()))?
        };

        self.stop_tx = Some(stop_tx);
        self.timer = Some(timer);
        self.worker = Some(worker);
        self.state = SchedulerState::Running;
        info!(interval_ms = self.interval.as_millis() as u64, "scheduler started");
        Ok(())
    }

    /// Stop ticking and block until any in-flight tick has finished.
    ///
    /// No-op unless the scheduler is running.
    pub fn stop(&mut self) {
        if self.state != SchedulerState::Running {
            return;
        }

        // Disconnecting the stop channel wakes the timer.
        drop(self.stop_tx.take());
        if let Some(timer) = self.timer.take() {
            if timer.join().is_err() {
                error!("scheduler timer thread panicked");
            }
        }
        // The timer dropped its work sender, so the worker exits once the
        // current tick (if any) returns.
        if let Some(worker) = self.worker.take() {
            if worker.join().is_err() {
                error!("scheduler worker thread panicked");
            }
        }

        self.state = SchedulerState::Stopped;
        let stats = self.stats();
        info!(
            fired = stats.fired,
            completed = stats.completed,
            skipped = stats.skipped,
            "scheduler stopped"
        );
    }
}

impl Drop for Scheduler {
    fn drop(&mut self) {
        self.stop();
    }
}

fn timer_loop(
    interval: Duration,
    stop_rx: Receiver<()>,
    work_tx: Sender<()>,
    busy: Arc<AtomicBool>,
    counters: Arc<Counters>,
) {
    let mut next = Instant::now();
    loop {
        counters.fired.fetch_add(1, Ordering::Relaxed);
        if busy
            .compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .is_ok()
        {
            if work_tx.send(()).is_err() {
                break;
            }
        } else {
            counters.skipped.fetch_add(1, Ordering::Relaxed);
            debug!("previous fetch still running; tick skipped");
        }

        next += interval;
        let now = Instant::now();
        if next < now {
            // Fell behind (suspend, long stall): resume from now instead of
            // firing a burst of catch-up ticks.
            next = now + interval;
        }

        match stop_rx.recv_deadline(next) {
            Err(RecvTimeoutError::Timeout) => continue,
            Ok(()) | Err(RecvTimeoutError::Disconnected) => break,
        }
    }
}

fn worker_loop<T: Tick>(
    task: Arc<T>,
    work_rx: Receiver<()>,
    busy: Arc<AtomicBool>,
    counters: Arc<Counters>,
) {
    for () in work_rx.iter() {
        if panic::catch_unwind(AssertUnwindSafe(|| task.tick())).is_err() {
            error!("scheduled tick panicked");
        }
        counters.completed.fetch_add(1, Ordering::Relaxed);
        busy.store(false, Ordering::Release);
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
