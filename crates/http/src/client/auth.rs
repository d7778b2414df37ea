//! Authentication middleware: bearer tokens out, 401 handling in

use super::error::ClientError;
use super::middleware::{Middleware, RequestContext};
use crate::session::{Audience, CredentialStore};
use reqwest::header::{self, HeaderValue};
use reqwest::{Request, Response, StatusCode};
use std::sync::Arc;

/// Path of the admin console sign-in view
pub const ADMIN_LOGIN_PATH: &str = "/admin/login";

/// Prefix of every admin console view
pub const ADMIN_AREA_PREFIX: &str = "/admin";

/// Access to the displayed location, used to force a view change
#[cfg_attr(test, mockall::automock)]
pub trait Navigator: Send + Sync {
    /// Path currently displayed, without origin
    fn current_path(&self) -> String;

    /// Replace the displayed location
    fn navigate_to(&self, path: &str);
}

/// `path` is `/admin` or below it
pub fn is_admin_area(path: &str) -> bool {
    path.strip_prefix(ADMIN_AREA_PREFIX)
        .is_some_and(|rest| rest.is_empty() || rest.starts_with(['/', '?', '#']))
}

/// `path` is the sign-in view itself, ignoring query and fragment
pub fn is_login_view(path: &str) -> bool {
    let path = path.split(['?', '#']).next().unwrap_or_default();
    let path = path.trim_end_matches('/');
    path == ADMIN_LOGIN_PATH
}

/// Attaches `Authorization: Bearer <token>` using the token of the request's audience.
///
/// Unreadable storage counts as no session; the request goes out without the header.
#[derive(Clone)]
pub struct BearerAuth {
    credentials: Arc<CredentialStore>,
}

impl BearerAuth {
    pub const fn new(credentials: Arc<CredentialStore>) -> Self {
        Self { credentials }
    }
}

impl Middleware for BearerAuth {
    fn name(&self) -> &'static str {
        "bearer_auth"
    }

    fn on_request(&self, ctx: &RequestContext, request: &mut Request) -> Result<(), ClientError> {
        let token = match self.credentials.token(ctx.audience) {
            Ok(token) => token,
            Err(err) => {
                warn!(audience = %ctx.audience, error = %err, "Failed to read stored token, sending without credentials");
                None
            }
        };
        if let Some(token) = token {
            let mut value = HeaderValue::from_str(&format!("Bearer {token}"))?;
            value.set_sensitive(true);
            request.headers_mut().insert(header::AUTHORIZATION, value);
        }
        Ok(())
    }
}

/// Reacts to `401 Unauthorized` responses.
///
/// An admin request that is rejected clears the admin session, and when the
/// admin console is on screen the user is sent back to its sign-in view.
/// Front requests are passed through untouched.
#[derive(Clone)]
pub struct UnauthorizedHandler {
    credentials: Arc<CredentialStore>,
    navigator: Arc<dyn Navigator>,
}

impl UnauthorizedHandler {
    pub fn new(credentials: Arc<CredentialStore>, navigator: Arc<dyn Navigator>) -> Self {
        Self {
            credentials,
            navigator,
        }
    }
}

impl Middleware for UnauthorizedHandler {
    fn name(&self) -> &'static str {
        "unauthorized_handler"
    }

    fn on_response(&self, ctx: &RequestContext, response: &Response) {
        if response.status() != StatusCode::UNAUTHORIZED {
            return;
        }

        match ctx.audience {
            Audience::Admin => {
                info!(path = %ctx.path, "Admin request rejected, clearing admin session");
                if let Err(err) = self.credentials.clear_session(Audience::Admin) {
                    error!(error = %err, "Failed to clear admin session");
                }

                let current = self.navigator.current_path();
                if is_admin_area(&current) && !is_login_view(&current) {
                    self.navigator.navigate_to(ADMIN_LOGIN_PATH);
                }
            }
            // TODO: clear the front session here once front sign-in ships
            Audience::Front => {
                debug!(path = %ctx.path, "Front request rejected, passing through");
            }
        }
    }
}
