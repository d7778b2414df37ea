//! Admin sign-in and sign-out flow

use crate::routing::{REDIRECT_QUERY_KEY, RouteName, Router};
use quill_http::client::auth::{ADMIN_LOGIN_PATH, is_admin_area, is_login_view};
use quill_http::types::LoginResponse;
use quill_http::{ApiClient, ClientError, CredentialStore};

/// Admin session service
pub struct AdminSessionService<'a> {
    client: &'a ApiClient,
    credentials: &'a CredentialStore,
    router: &'a Router,
}

impl<'a> AdminSessionService<'a> {
    pub const fn new(
        client: &'a ApiClient,
        credentials: &'a CredentialStore,
        router: &'a Router,
    ) -> Self {
        Self {
            client,
            credentials,
            router,
        }
    }

    /// Sign in, then continue to the view that sent the user to sign-in, or
    /// to the post list when there is none.
    pub async fn login(&self, username: &str, password: &str) -> Result<LoginResponse, ClientError> {
        let response = self
            .client
            .admin_auth(self.credentials)
            .login(username, password)
            .await?;

        let destination = self.return_destination();
        if let Err(err) = self.router.navigate(&destination) {
            error!(destination, error = %err, "Failed to leave sign-in view");
        }
        Ok(response)
    }

    /// Forget the admin session and show the sign-in view
    pub fn logout(&self) -> Result<(), ClientError> {
        self.client.admin_auth(self.credentials).logout()?;
        if let Err(err) = self.router.navigate(ADMIN_LOGIN_PATH) {
            error!(error = %err, "Failed to show sign-in view");
        }
        Ok(())
    }

    /// Return destination carried by the current location.
    ///
    /// Only paths inside the admin console are honoured.
    pub fn return_destination(&self) -> String {
        let location = self.router.current_location();
        match location.query_value(REDIRECT_QUERY_KEY) {
            Some(target) if is_safe_return(target) => target.to_string(),
            Some(target) => {
                warn!(target, "Ignoring return destination outside the admin console");
                RouteName::AdminPosts.pattern().to_string()
            }
            None => RouteName::AdminPosts.pattern().to_string(),
        }
    }
}

fn is_safe_return(target: &str) -> bool {
    target.starts_with('/')
        && !target.starts_with("//")
        && is_admin_area(target)
        && !is_login_view(target)
}
