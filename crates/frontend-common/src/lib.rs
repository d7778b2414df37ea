//! Client-side core of the Quill front end
//!
//! Routing with the admin route guard, toast and confirmation queues, browser
//! bindings and the [`AppServices`] container that wires them to the
//! `quill-http` request pipeline.

#[macro_use]
extern crate tracing;

pub mod app;
#[cfg(target_arch = "wasm32")]
pub mod browser;
pub mod logging;
pub mod notify;
pub mod routing;
pub mod services;

pub use app::AppServices;
pub use logging::init_logging;
pub use notify::{ConfirmOptions, ConfirmQueue, ToastKind, ToastQueue};
pub use routing::{Location, NavigationState, RouteName, Router};
pub use services::AdminSessionService;
