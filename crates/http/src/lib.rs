//! Quill HTTP module providing the session-aware request pipeline
//!
//! This module provides the credential store for the admin and front audiences,
//! a single shared API client that runs every call through an ordered middleware
//! chain, and typed endpoint groups for the blog API.

#[macro_use]
extern crate tracing;

pub mod client;
pub mod config;
pub mod session;
pub mod types;

pub use client::error::ClientError;
pub use client::{ApiClient, ApiClientBuilder, RequestTimeout};
pub use config::ClientConfig;
pub use session::{Audience, CredentialStore, Session, UserProfile};
