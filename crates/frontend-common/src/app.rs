//! Application service container

use crate::notify::{ConfirmQueue, Scheduler, ToastQueue};
use crate::routing::{History, RouteError, RouteGuard, RouteMatch, RouteTable, Router};
use crate::services::AdminSessionService;
use quill_http::client::auth::{BearerAuth, UnauthorizedHandler};
use quill_http::session::KeyValueStorage;
use quill_http::{ApiClient, ClientConfig, ClientError, CredentialStore};
use std::sync::Arc;

/// Everything a view needs, built once at start-up and shared by handle.
///
/// The API client attaches the bearer token of the request's audience and
/// sends the user back to sign-in through the router when the admin session
/// is rejected.
#[derive(Clone)]
pub struct AppServices {
    pub credentials: Arc<CredentialStore>,
    pub client: ApiClient,
    pub router: Arc<Router>,
    pub toasts: ToastQueue,
    pub confirms: ConfirmQueue,
}

impl AppServices {
    /// # Errors
    ///
    /// Returns an error if the configuration is invalid or the HTTP client cannot be built
    pub fn new(
        config: &ClientConfig,
        storage: Arc<dyn KeyValueStorage>,
        history: Arc<dyn History>,
        scheduler: Arc<dyn Scheduler>,
    ) -> Result<Self, ClientError> {
        config
            .validate()
            .map_err(|err| ClientError::Configuration(err.to_string()))?;

        let credentials = Arc::new(CredentialStore::new(storage));
        let router = Arc::new(Router::new(
            RouteTable::default(),
            RouteGuard::new(credentials.clone()),
            history,
        ));

        let client = ApiClient::builder()
            .config(config)
            .with(BearerAuth::new(credentials.clone()))
            .with(UnauthorizedHandler::new(credentials.clone(), router.clone()))
            .build()?;

        debug!(
            base_url = client.base_url(),
            middleware = ?client.middleware().names(),
            "Application services ready"
        );

        Ok(Self {
            credentials,
            client,
            router,
            toasts: ToastQueue::new(scheduler),
            confirms: ConfirmQueue::new(),
        })
    }

    /// Services backed by `localStorage`, the History API and browser timers
    ///
    /// # Errors
    ///
    /// See [`AppServices::new`]
    #[cfg(target_arch = "wasm32")]
    pub fn browser(config: &ClientConfig) -> Result<Self, ClientError> {
        use crate::browser::{BrowserHistory, BrowserStorage};
        use crate::notify::DefaultScheduler;

        Self::new(
            config,
            Arc::new(BrowserStorage),
            Arc::new(BrowserHistory),
            Arc::new(DefaultScheduler::default()),
        )
    }

    /// Resolve the first location shown
    ///
    /// # Errors
    ///
    /// See [`Router::navigate`]
    pub fn start(&self, initial_path: &str) -> Result<RouteMatch, RouteError> {
        self.router.navigate(initial_path)
    }

    pub fn admin_session(&self) -> AdminSessionService<'_> {
        AdminSessionService::new(&self.client, &self.credentials, &self.router)
    }
}
