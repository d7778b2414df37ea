//! Admin route guard

use super::{Location, REDIRECT_QUERY_KEY, RouteMatch, RouteName};
use quill_http::session::ADMIN_ROLE;
use quill_http::{Audience, CredentialStore};
use std::sync::Arc;

/// Outcome of a navigation attempt
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum NavigationState {
    /// The guard has not decided yet
    Evaluating,
    /// Navigation proceeds to the requested target
    Allowed,
    /// Navigation continues to another route instead
    Redirected(Redirect),
}

/// Where a rejected navigation goes instead
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Redirect {
    pub to: RouteName,
    /// Full path of the original target, for coming back after sign-in
    pub return_to: Option<String>,
}

impl Redirect {
    pub const fn to(route: RouteName) -> Self {
        Self {
            to: route,
            return_to: None,
        }
    }

    /// Location to navigate to
    pub fn location(&self) -> Location {
        let location = Location::new(self.to.pattern());
        match &self.return_to {
            Some(target) => location.with_query(REDIRECT_QUERY_KEY, target.clone()),
            None => location,
        }
    }
}

/// Decides whether an admin route may be shown for the stored admin session.
///
/// Front routes are never inspected.
#[derive(Clone)]
pub struct RouteGuard {
    credentials: Arc<CredentialStore>,
}

impl RouteGuard {
    pub const fn new(credentials: Arc<CredentialStore>) -> Self {
        Self { credentials }
    }

    /// Evaluate a navigation. Never returns [`NavigationState::Evaluating`].
    pub fn evaluate(&self, to: &RouteMatch, from: Option<&Location>) -> NavigationState {
        if to.route.audience != Audience::Admin {
            return NavigationState::Allowed;
        }

        let admin = self.credentials.admin();
        let authenticated = admin.is_authenticated();
        let is_admin = authenticated && admin.has_role(ADMIN_ROLE);

        let state = if to.route.requires_auth {
            if !authenticated {
                NavigationState::Redirected(Redirect {
                    to: RouteName::AdminLogin,
                    return_to: Some(to.location.full_path()),
                })
            } else if !is_admin {
                NavigationState::Redirected(Redirect::to(RouteName::AdminLogin))
            } else {
                NavigationState::Allowed
            }
        } else if to.name() == RouteName::AdminLogin && is_admin {
            NavigationState::Redirected(Redirect::to(RouteName::AdminPosts))
        } else {
            NavigationState::Allowed
        };

        if let NavigationState::Redirected(redirect) = &state {
            debug!(
                from = from.map(Location::full_path).as_deref().unwrap_or("-"),
                to = %to.location,
                redirect = ?redirect.to,
                "Admin route guard redirected navigation"
            );
        }
        state
    }
}
