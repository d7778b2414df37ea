//! One-shot timers for notifier auto-dismissal

use std::sync::{Mutex, PoisonError};
use std::time::Duration;

/// Work run once a timer fires
pub type Task = Box<dyn FnOnce() + Send + 'static>;

/// Runs a task after a delay
pub trait Scheduler: Send + Sync {
    fn schedule(&self, delay: Duration, task: Task);
}

/// Timers on the ambient tokio runtime.
///
/// Scheduling outside a runtime drops the task with a warning, so it never
/// runs. Schedule from within the runtime, or use [`ManualScheduler`].
#[cfg(not(target_arch = "wasm32"))]
#[derive(Debug, Default, Clone, Copy)]
pub struct TokioScheduler;

#[cfg(not(target_arch = "wasm32"))]
impl Scheduler for TokioScheduler {
    fn schedule(&self, delay: Duration, task: Task) {
        match tokio::runtime::Handle::try_current() {
            Ok(handle) => {
                handle.spawn(async move {
                    tokio::time::sleep(delay).await;
                    task();
                });
            }
            Err(err) => {
                warn!(error = %err, "No tokio runtime, timer dropped");
            }
        }
    }
}

/// Timers on the browser event loop
#[cfg(target_arch = "wasm32")]
#[derive(Debug, Default, Clone, Copy)]
pub struct BrowserScheduler;

#[cfg(target_arch = "wasm32")]
impl Scheduler for BrowserScheduler {
    fn schedule(&self, delay: Duration, task: Task) {
        let millis = u32::try_from(delay.as_millis()).unwrap_or(u32::MAX);
        gloo::timers::callback::Timeout::new(millis, task).forget();
    }
}

/// Platform default scheduler
#[cfg(not(target_arch = "wasm32"))]
pub type DefaultScheduler = TokioScheduler;

/// Platform default scheduler
#[cfg(target_arch = "wasm32")]
pub type DefaultScheduler = BrowserScheduler;

struct Pending {
    due: Duration,
    seq: u64,
    task: Task,
}

#[derive(Default)]
struct Clock {
    now: Duration,
    next_seq: u64,
    pending: Vec<Pending>,
}

/// Scheduler driven by an explicit clock.
///
/// Nothing fires until [`ManualScheduler::advance`] moves time past a task's
/// due point. Tasks due at the same instant run in the order they were
/// scheduled.
#[derive(Default)]
pub struct ManualScheduler {
    clock: Mutex<Clock>,
}

impl ManualScheduler {
    pub fn new() -> Self {
        Self::default()
    }

    /// Time elapsed since creation
    pub fn now(&self) -> Duration {
        self.lock().now
    }

    /// Tasks waiting to fire
    pub fn pending(&self) -> usize {
        self.lock().pending.len()
    }

    /// Move the clock forward, running every task that becomes due.
    ///
    /// Tasks scheduled by a firing task run in the same call if they fall
    /// inside the advanced window.
    pub fn advance(&self, by: Duration) {
        let target = self.lock().now + by;
        loop {
            let next = {
                let mut clock = self.lock();
                let position = clock
                    .pending
                    .iter()
                    .enumerate()
                    .filter(|(_, p)| p.due <= target)
                    .min_by_key(|(_, p)| (p.due, p.seq))
                    .map(|(i, _)| i);
                match position {
                    Some(index) => {
                        let pending = clock.pending.remove(index);
                        clock.now = clock.now.max(pending.due);
                        Some(pending.task)
                    }
                    None => {
                        clock.now = target;
                        None
                    }
                }
            };
            // Run outside the lock, the task may schedule more work
            match next {
                Some(task) => task(),
                None => break,
            }
        }
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, Clock> {
        self.clock.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl Scheduler for ManualScheduler {
    fn schedule(&self, delay: Duration, task: Task) {
        let mut clock = self.lock();
        let due = clock.now + delay;
        let seq = clock.next_seq;
        clock.next_seq += 1;
        clock.pending.push(Pending { due, seq, task });
    }
}
