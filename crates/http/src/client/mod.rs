//! Quill API client
//!
//! A single [`ApiClient`] is shared by the whole application. It appends
//! request paths to the configured API root and runs every call through its
//! [`MiddlewareChain`].

pub mod admin;
pub mod auth;
pub mod error;
pub mod events;
pub mod middleware;
pub mod public;

use crate::config::ClientConfig;
use error::ClientError;
use middleware::{Middleware, MiddlewareChain, RequestContext};
use reqwest::{Client, ClientBuilder, Method, header};
use serde::Serialize;
use serde::de::DeserializeOwned;
use std::sync::Arc;
use std::time::Duration;

/// Per-call timeout policy
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum RequestTimeout {
    /// The client's configured default
    #[default]
    Default,
    /// A specific limit for this call
    Fixed(Duration),
    /// No limit, for long uploads and event streams
    Unbounded,
}

impl RequestTimeout {
    /// Effective limit given the client default
    pub const fn resolve(self, default: Duration) -> Option<Duration> {
        match self {
            Self::Default => Some(default),
            Self::Fixed(limit) => Some(limit),
            Self::Unbounded => None,
        }
    }
}

/// Quill API client
#[derive(Clone)]
pub struct ApiClient {
    client: Client,
    base_url: Arc<str>,
    chain: MiddlewareChain,
    default_timeout: Duration,
    upload_timeout: Duration,
}

impl ApiClient {
    /// Create a client from configuration with an empty middleware chain
    ///
    /// # Errors
    ///
    /// Returns an error if the configuration is invalid or the transport cannot be built
    pub fn new(config: &ClientConfig) -> Result<Self, ClientError> {
        Self::builder().config(config).build()
    }

    /// Create a new client builder
    pub fn builder() -> ApiClientBuilder {
        ApiClientBuilder::default()
    }

    /// Get the base URL
    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Middleware applied to every call
    pub const fn middleware(&self) -> &MiddlewareChain {
        &self.chain
    }

    /// Timeout used for file-bearing calls
    /// Timeout applied to calls that do not override it
    pub const fn default_timeout(&self) -> Duration {
        self.default_timeout
    }

    pub const fn upload_timeout(&self) -> Duration {
        self.upload_timeout
    }

    /// Start a request to `path`, relative to the API root
    pub fn request(&self, method: Method, path: &str) -> ApiRequest {
        let url = format!("{}{}", self.base_url, path);
        ApiRequest {
            client: self.clone(),
            context: RequestContext::new(method.clone(), path),
            builder: self.client.request(method, url),
            timeout: RequestTimeout::Default,
        }
    }

    pub fn get(&self, path: &str) -> ApiRequest {
        self.request(Method::GET, path)
    }

    pub fn post(&self, path: &str) -> ApiRequest {
        self.request(Method::POST, path)
    }

    pub fn put(&self, path: &str) -> ApiRequest {
        self.request(Method::PUT, path)
    }

    pub fn delete(&self, path: &str) -> ApiRequest {
        self.request(Method::DELETE, path)
    }
}

/// A call being assembled; nothing is sent until [`ApiRequest::send`]
pub struct ApiRequest {
    client: ApiClient,
    context: RequestContext,
    builder: reqwest::RequestBuilder,
    timeout: RequestTimeout,
}

impl ApiRequest {
    pub const fn context(&self) -> &RequestContext {
        &self.context
    }

    /// Append query parameters
    #[must_use]
    pub fn query<T: Serialize + ?Sized>(mut self, query: &T) -> Self {
        self.builder = self.builder.query(query);
        self
    }

    /// Send a JSON body
    #[must_use]
    pub fn json<T: Serialize + ?Sized>(mut self, body: &T) -> Self {
        self.builder = self.builder.json(body);
        self
    }

    /// Send a multipart body. The transport supplies the content type and boundary.
    #[must_use]
    pub fn multipart(mut self, form: reqwest::multipart::Form) -> Self {
        self.builder = self.builder.multipart(form);
        self
    }

    #[must_use]
    pub fn header(mut self, name: header::HeaderName, value: header::HeaderValue) -> Self {
        self.builder = self.builder.header(name, value);
        self
    }

    /// Override the timeout for this call only
    #[must_use]
    pub const fn timeout(mut self, timeout: RequestTimeout) -> Self {
        self.timeout = timeout;
        self
    }

    /// Send the request through the middleware chain.
    ///
    /// Any response, whatever its status, is returned as `Ok`; only transport
    /// failures and middleware rejections are errors.
    ///
    /// # Errors
    ///
    /// Returns an error if the request cannot be built, a middleware rejects it,
    /// or no response is received
    pub async fn send(self) -> Result<reqwest::Response, ClientError> {
        let Self {
            client,
            context,
            builder,
            timeout,
        } = self;

        let mut request = builder.build()?;

        #[cfg(not(target_arch = "wasm32"))]
        {
            *request.timeout_mut() = timeout.resolve(client.default_timeout);
        }
        #[cfg(target_arch = "wasm32")]
        let _ = timeout; // Timeouts not supported on WASM

        client.chain.before_send(&context, &mut request)?;

        debug!(method = %context.method, path = %context.path, audience = %context.audience, "Sending request");
        let response = match client.client.execute(request).await {
            Ok(response) => response,
            Err(err) => {
                warn!(method = %context.method, path = %context.path, error = %err, "Request failed");
                return Err(err.into());
            }
        };
        debug!(path = %context.path, status = response.status().as_u16(), "Received response");

        client.chain.after_receive(&context, &response);
        Ok(response)
    }

    /// Send the request and decode a successful JSON body.
    ///
    /// An empty success body decodes as JSON `null`, so `()`, `Option<_>` and
    /// `serde_json::Value` all accept it.
    ///
    /// # Errors
    ///
    /// Returns an error for transport failures, non-success statuses and
    /// undecodable bodies
    pub async fn execute<T: DeserializeOwned>(self) -> Result<T, ClientError> {
        let response = self.send().await?;
        let status = response.status();

        if status.is_success() {
            let body = response.bytes().await?;
            if body.is_empty() {
                return Ok(serde_json::from_value(serde_json::Value::Null)?);
            }
            Ok(serde_json::from_slice(&body)?)
        } else {
            let message = response.text().await.unwrap_or_else(|_| status.to_string());
            Err(ClientError::from_status(status, message))
        }
    }
}

/// Builder for ApiClient
#[derive(Default)]
pub struct ApiClientBuilder {
    base_url: Option<String>,
    timeout: Option<Duration>,
    upload_timeout: Option<Duration>,
    user_agent: Option<String>,
    middleware: Vec<Arc<dyn Middleware>>,
}

impl ApiClientBuilder {
    /// Take base URL, timeouts and user agent from configuration
    #[must_use]
    pub fn config(mut self, config: &ClientConfig) -> Self {
        self.base_url = Some(config.base_url.clone());
        self.timeout = Some(config.timeout());
        self.upload_timeout = Some(config.upload_timeout());
        self.user_agent = Some(config.user_agent.clone());
        self
    }

    /// Set the base URL
    #[must_use]
    pub fn base_url(mut self, url: impl Into<String>) -> Self {
        self.base_url = Some(url.into());
        self
    }

    /// Set the default request timeout
    #[must_use]
    pub const fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    /// Set the timeout used for uploads
    #[must_use]
    pub const fn upload_timeout(mut self, timeout: Duration) -> Self {
        self.upload_timeout = Some(timeout);
        self
    }

    /// Set the user agent
    #[must_use]
    pub fn user_agent(mut self, agent: impl Into<String>) -> Self {
        self.user_agent = Some(agent.into());
        self
    }

    /// Append a middleware stage; stages run in the order they are added
    #[must_use]
    pub fn with(mut self, middleware: impl Middleware + 'static) -> Self {
        self.middleware.push(Arc::new(middleware));
        self
    }

    /// Append an already shared middleware stage
    #[must_use]
    pub fn with_shared(mut self, middleware: Arc<dyn Middleware>) -> Self {
        self.middleware.push(middleware);
        self
    }

    /// Build the client
    ///
    /// # Errors
    ///
    /// Returns an error if no base URL was given or the transport cannot be built
    pub fn build(self) -> Result<ApiClient, ClientError> {
        let base_url = self
            .base_url
            .ok_or_else(|| ClientError::Configuration("base_url is required".into()))?;

        // Ensure base_url ends without a trailing slash
        let base_url = base_url.trim_end_matches('/');
        if base_url.is_empty() {
            return Err(ClientError::Configuration("base_url is empty".into()));
        }

        let defaults = ClientConfig::default();
        let default_timeout = self.timeout.unwrap_or_else(|| defaults.timeout());
        let upload_timeout = self
            .upload_timeout
            .unwrap_or_else(|| defaults.upload_timeout());

        #[cfg(not(target_arch = "wasm32"))]
        let client = ClientBuilder::new()
            .user_agent(self.user_agent.unwrap_or(defaults.user_agent))
            .build()?;

        #[cfg(target_arch = "wasm32")]
        let client = {
            let _ = self.user_agent; // Browsers set their own user agent
            ClientBuilder::new().build()?
        };

        Ok(ApiClient {
            client,
            base_url: base_url.into(),
            chain: MiddlewareChain::new(self.middleware),
            default_timeout,
            upload_timeout,
        })
    }
}
