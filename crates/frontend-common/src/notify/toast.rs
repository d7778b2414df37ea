//! Toast queue

use super::scheduler::Scheduler;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;
use tokio::sync::watch;

/// Display time used by the convenience helpers
pub const DEFAULT_TOAST_DURATION: Duration = Duration::from_millis(2200);

/// Identifier of a toast, increasing from 1
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ToastId(pub u64);

impl fmt::Display for ToastId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ToastKind {
    #[default]
    Info,
    Success,
    Error,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Toast {
    pub id: ToastId,
    pub message: String,
    pub kind: ToastKind,
    /// Zero keeps the toast until dismissed
    pub duration: Duration,
}

struct Inner {
    next_id: AtomicU64,
    toasts: watch::Sender<Vec<Toast>>,
    scheduler: Arc<dyn Scheduler>,
}

/// Ordered list of transient messages.
///
/// Cloning yields another handle to the same queue. Pending auto-dismiss
/// timers do not keep the queue alive.
#[derive(Clone)]
pub struct ToastQueue {
    inner: Arc<Inner>,
}

impl ToastQueue {
    /// Auto-dismissal relies on `scheduler`. With the tokio scheduler, toasts
    /// must be shown from within a runtime, otherwise timed toasts stay until
    /// dismissed.
    pub fn new(scheduler: Arc<dyn Scheduler>) -> Self {
        Self {
            inner: Arc::new(Inner {
                next_id: AtomicU64::new(1),
                toasts: watch::Sender::new(Vec::new()),
                scheduler,
            }),
        }
    }

    /// Append a toast. A non-zero `duration` removes it once elapsed.
    pub fn show(&self, message: impl Into<String>, kind: ToastKind, duration: Duration) -> ToastId {
        let id = ToastId(self.inner.next_id.fetch_add(1, Ordering::Relaxed));
        let toast = Toast {
            id,
            message: message.into(),
            kind,
            duration,
        };
        self.inner.toasts.send_modify(|toasts| toasts.push(toast));

        if !duration.is_zero() {
            let queue = Arc::downgrade(&self.inner);
            self.inner.scheduler.schedule(
                duration,
                Box::new(move || {
                    if let Some(inner) = queue.upgrade() {
                        Self { inner }.dismiss(id);
                    }
                }),
            );
        }
        id
    }

    pub fn info(&self, message: impl Into<String>) -> ToastId {
        self.show(message, ToastKind::Info, DEFAULT_TOAST_DURATION)
    }

    pub fn success(&self, message: impl Into<String>) -> ToastId {
        self.show(message, ToastKind::Success, DEFAULT_TOAST_DURATION)
    }

    pub fn error(&self, message: impl Into<String>) -> ToastId {
        self.show(message, ToastKind::Error, DEFAULT_TOAST_DURATION)
    }

    /// Remove a toast; returns whether it was still shown
    pub fn dismiss(&self, id: ToastId) -> bool {
        self.inner.toasts.send_if_modified(|toasts| {
            let before = toasts.len();
            toasts.retain(|toast| toast.id != id);
            toasts.len() != before
        })
    }

    /// Toasts currently shown, oldest first
    pub fn toasts(&self) -> Vec<Toast> {
        self.inner.toasts.borrow().clone()
    }

    pub fn subscribe(&self) -> watch::Receiver<Vec<Toast>> {
        self.inner.toasts.subscribe()
    }
}

impl fmt::Debug for ToastQueue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ToastQueue")
            .field("toasts", &*self.inner.toasts.borrow())
            .finish_non_exhaustive()
    }
}
