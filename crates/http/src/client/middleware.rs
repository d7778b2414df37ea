//! Ordered request/response middleware chain
//!
//! Every call made through [`ApiClient`](super::ApiClient) passes through the
//! chain twice: each middleware's [`Middleware::on_request`] runs in
//! registration order on the outbound request, and each
//! [`Middleware::on_response`] runs in the same order on the inbound response.
//! Response hooks observe only; they cannot replace the response or turn it
//! into an error.

use super::error::ClientError;
use crate::session::Audience;
use reqwest::{Method, Request, Response};
use std::sync::Arc;

/// What the pipeline knows about a call besides the raw request
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RequestContext {
    pub method: Method,
    /// Path relative to the API root, as passed to [`ApiClient::request`](super::ApiClient::request)
    pub path: String,
    pub audience: Audience,
}

impl RequestContext {
    pub fn new(method: Method, path: impl Into<String>) -> Self {
        let path = path.into();
        let audience = Audience::classify(&path);
        Self {
            method,
            path,
            audience,
        }
    }
}

/// A single pipeline stage.
///
/// Hooks are synchronous: they may only consult local state.
pub trait Middleware: Send + Sync {
    /// Short name used in logs
    fn name(&self) -> &'static str;

    /// Inspect or modify an outbound request
    ///
    /// # Errors
    ///
    /// An error aborts the call before anything is sent
    fn on_request(&self, _ctx: &RequestContext, _request: &mut Request) -> Result<(), ClientError> {
        Ok(())
    }

    /// Observe an inbound response
    fn on_response(&self, _ctx: &RequestContext, _response: &Response) {}
}

/// Immutable ordered list of middleware
#[derive(Clone, Default)]
pub struct MiddlewareChain {
    stages: Arc<[Arc<dyn Middleware>]>,
}

impl MiddlewareChain {
    pub fn new(stages: Vec<Arc<dyn Middleware>>) -> Self {
        Self {
            stages: stages.into(),
        }
    }

    pub fn len(&self) -> usize {
        self.stages.len()
    }

    pub fn is_empty(&self) -> bool {
        self.stages.is_empty()
    }

    /// Stage names in execution order
    pub fn names(&self) -> Vec<&'static str> {
        self.stages.iter().map(|stage| stage.name()).collect()
    }

    /// Run every outbound hook, stopping at the first error
    ///
    /// # Errors
    ///
    /// Returns the first error raised by a stage
    pub fn before_send(&self, ctx: &RequestContext, request: &mut Request) -> Result<(), ClientError> {
        for stage in self.stages.iter() {
            if let Err(err) = stage.on_request(ctx, request) {
                warn!(middleware = stage.name(), path = %ctx.path, error = %err, "Outbound middleware rejected request");
                return Err(err);
            }
        }
        Ok(())
    }

    /// Run every inbound hook
    pub fn after_receive(&self, ctx: &RequestContext, response: &Response) {
        for stage in self.stages.iter() {
            stage.on_response(ctx, response);
        }
    }
}
