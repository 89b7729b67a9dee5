//! # Quill Client
//!
//! Typed HTTP client for the Quill API.
//!
//! The caller owns the [`Session`]: it is loaded on login or registration, passed to
//! every call that needs an identity, and cleared on logout.

mod client;
mod error;
mod session;

pub use client::ApiClient;
pub use error::{ClientError, ClientResult};
pub use session::Session;
