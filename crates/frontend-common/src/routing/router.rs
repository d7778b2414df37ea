//! Guarded navigation

use super::guard::{NavigationState, RouteGuard};
use super::{Location, RouteMatch, RouteTable};
use quill_http::client::auth::Navigator;
use std::sync::{Arc, Mutex, PoisonError, RwLock};
use thiserror::Error;

/// Guard redirects followed before a navigation is abandoned
const MAX_REDIRECTS: usize = 8;

/// Routing error types
#[derive(Debug, Error, PartialEq, Eq)]
pub enum RouteError {
    /// No route matches the path
    #[error("No route matches {0}")]
    NotFound(String),

    /// Redirects never settled on an allowed route
    #[error("Too many redirects navigating to {0}")]
    RedirectLoop(String),
}

/// Where committed locations are reported, e.g. the browser address bar
pub trait History: Send + Sync {
    fn push(&self, full_path: &str);
}

/// History kept in memory
#[derive(Debug, Default)]
pub struct MemoryHistory {
    entries: Mutex<Vec<String>>,
}

impl MemoryHistory {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn entries(&self) -> Vec<String> {
        self.entries
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }
}

impl History for MemoryHistory {
    fn push(&self, full_path: &str) {
        self.entries
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(full_path.to_string());
    }
}

struct RouterState {
    current: Option<RouteMatch>,
    last: NavigationState,
}

/// Resolves paths, runs the route guard and commits the outcome
pub struct Router {
    table: RouteTable,
    guard: RouteGuard,
    history: Arc<dyn History>,
    state: RwLock<RouterState>,
}

impl Router {
    pub fn new(table: RouteTable, guard: RouteGuard, history: Arc<dyn History>) -> Self {
        Self {
            table,
            guard,
            history,
            state: RwLock::new(RouterState {
                current: None,
                last: NavigationState::Allowed,
            }),
        }
    }

    /// Currently displayed route, `None` before the first navigation
    pub fn current(&self) -> Option<RouteMatch> {
        self.state
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .current
            .clone()
    }

    pub fn current_location(&self) -> Location {
        self.current()
            .map_or_else(|| Location::new("/"), |current| current.location)
    }

    /// How the most recent committed navigation ended: `Allowed`, or the
    /// last guard redirect it followed. Failed navigations leave it unchanged.
    pub fn last_state(&self) -> NavigationState {
        self.state
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .last
            .clone()
    }

    /// Navigate to `target`, following static and guard redirects.
    ///
    /// # Errors
    ///
    /// Returns an error if a path along the way matches no route or redirects
    /// do not settle. The current route is left unchanged in that case.
    pub fn navigate(&self, target: &str) -> Result<RouteMatch, RouteError> {
        let from = self.current().map(|current| current.location);
        let mut location = Location::parse(target);
        let mut outcome = NavigationState::Allowed;

        for _ in 0..=MAX_REDIRECTS {
            let matched = self
                .table
                .resolve(&location)
                .ok_or_else(|| RouteError::NotFound(location.full_path()))?;

            if let Some(next) = matched.route.redirect {
                location = Location::new(next.pattern());
                continue;
            }

            match self.guard.evaluate(&matched, from.as_ref()) {
                NavigationState::Redirected(redirect) => {
                    location = redirect.location();
                    outcome = NavigationState::Redirected(redirect);
                }
                NavigationState::Allowed | NavigationState::Evaluating => {
                    self.commit(matched.clone(), outcome);
                    return Ok(matched);
                }
            }
        }

        warn!(target, "Navigation abandoned after too many redirects");
        Err(RouteError::RedirectLoop(target.to_string()))
    }

    /// Show `matched` and record how the navigation ended, in one write
    fn commit(&self, matched: RouteMatch, outcome: NavigationState) {
        let full_path = matched.location.full_path();
        {
            let mut state = self.state.write().unwrap_or_else(PoisonError::into_inner);
            state.current = Some(matched);
            state.last = outcome;
        }
        self.history.push(&full_path);
        debug!(location = %full_path, "Navigation committed");
    }
}

impl Navigator for Router {
    fn current_path(&self) -> String {
        self.current_location().full_path()
    }

    fn navigate_to(&self, path: &str) {
        if let Err(err) = self.navigate(path) {
            error!(path, error = %err, "Forced navigation failed");
        }
    }
}
