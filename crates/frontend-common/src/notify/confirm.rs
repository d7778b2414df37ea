//! Confirmation dialogs awaiting a user decision

use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;
use std::future::Future;
use std::pin::Pin;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, PoisonError};
use std::task::{Context, Poll};
use tokio::sync::{oneshot, watch};

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ConfirmId(pub u64);

impl fmt::Display for ConfirmId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Visual weight of a dialog
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ConfirmKind {
    #[default]
    Default,
    Danger,
    Warning,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ConfirmOptions {
    pub title: String,
    pub ok_text: String,
    pub cancel_text: String,
    pub kind: ConfirmKind,
}

impl Default for ConfirmOptions {
    fn default() -> Self {
        Self {
            title: "Confirm".to_string(),
            ok_text: "OK".to_string(),
            cancel_text: "Cancel".to_string(),
            kind: ConfirmKind::Default,
        }
    }
}

impl ConfirmOptions {
    /// Options for a destructive action
    pub fn danger(title: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            kind: ConfirmKind::Danger,
            ..Self::default()
        }
    }

    #[must_use]
    pub fn with_title(mut self, title: impl Into<String>) -> Self {
        self.title = title.into();
        self
    }

    #[must_use]
    pub fn with_ok_text(mut self, text: impl Into<String>) -> Self {
        self.ok_text = text.into();
        self
    }

    #[must_use]
    pub fn with_cancel_text(mut self, text: impl Into<String>) -> Self {
        self.cancel_text = text.into();
        self
    }

    #[must_use]
    pub const fn with_kind(mut self, kind: ConfirmKind) -> Self {
        self.kind = kind;
        self
    }
}

/// A dialog waiting for an answer
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConfirmRequest {
    pub id: ConfirmId,
    pub message: String,
    #[serde(flatten)]
    pub options: ConfirmOptions,
}

struct Inner {
    next_id: AtomicU64,
    requests: watch::Sender<Vec<ConfirmRequest>>,
    waiters: Mutex<HashMap<ConfirmId, oneshot::Sender<bool>>>,
}

/// Queue of pending confirmations.
///
/// Each request is answered independently through [`ConfirmQueue::resolve`].
/// Requests have no timeout; dropping the last queue handle answers every
/// outstanding request with `false`.
#[derive(Clone)]
pub struct ConfirmQueue {
    inner: Arc<Inner>,
}

impl Default for ConfirmQueue {
    fn default() -> Self {
        Self::new()
    }
}

impl ConfirmQueue {
    pub fn new() -> Self {
        Self {
            inner: Arc::new(Inner {
                next_id: AtomicU64::new(1),
                requests: watch::Sender::new(Vec::new()),
                waiters: Mutex::new(HashMap::new()),
            }),
        }
    }

    /// Enqueue a dialog. The returned future completes with the answer.
    pub fn request(&self, message: impl Into<String>, options: ConfirmOptions) -> Confirmation {
        let id = ConfirmId(self.inner.next_id.fetch_add(1, Ordering::Relaxed));
        let (tx, rx) = oneshot::channel();
        self.inner
            .waiters
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(id, tx);

        let request = ConfirmRequest {
            id,
            message: message.into(),
            options,
        };
        self.inner.requests.send_modify(|pending| pending.push(request));
        Confirmation { id, answer: rx }
    }

    /// Answer a pending dialog and remove it.
    ///
    /// Returns `false` when `id` is not pending.
    pub fn resolve(&self, id: ConfirmId, accepted: bool) -> bool {
        let waiter = self
            .inner
            .waiters
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .remove(&id);

        self.inner.requests.send_if_modified(|pending| {
            let before = pending.len();
            pending.retain(|request| request.id != id);
            pending.len() != before
        });

        match waiter {
            Some(waiter) => {
                if waiter.send(accepted).is_err() {
                    debug!(id = %id, "Confirmation answered after caller went away");
                }
                true
            }
            None => false,
        }
    }

    /// Pending dialogs, oldest first
    pub fn pending(&self) -> Vec<ConfirmRequest> {
        self.inner.requests.borrow().clone()
    }

    pub fn subscribe(&self) -> watch::Receiver<Vec<ConfirmRequest>> {
        self.inner.requests.subscribe()
    }
}

impl fmt::Debug for ConfirmQueue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ConfirmQueue")
            .field("pending", &*self.inner.requests.borrow())
            .finish_non_exhaustive()
    }
}

/// Answer to a confirmation request
#[derive(Debug)]
#[must_use = "a confirmation does nothing unless awaited"]
pub struct Confirmation {
    id: ConfirmId,
    answer: oneshot::Receiver<bool>,
}

impl Confirmation {
    pub const fn id(&self) -> ConfirmId {
        self.id
    }
}

impl Future for Confirmation {
    type Output = bool;

    fn poll(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<bool> {
        Pin::new(&mut self.answer)
            .poll(cx)
            .map(|answer| answer.unwrap_or(false))
    }
}
