//! Toast and confirmation queues

pub mod confirm;
pub mod scheduler;
pub mod toast;

pub use confirm::{ConfirmId, ConfirmKind, ConfirmOptions, ConfirmQueue, ConfirmRequest, Confirmation};
pub use scheduler::{DefaultScheduler, ManualScheduler, Scheduler};
pub use toast::{DEFAULT_TOAST_DURATION, Toast, ToastId, ToastKind, ToastQueue};
