pub mod auth;

pub use auth::AdminSessionService;
