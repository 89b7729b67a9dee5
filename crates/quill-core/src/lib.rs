//! # Quill Core
//!
//! The domain layer of the Quill blog backend.
//! Entities, ports, the ownership guard and the post/comment/account services live
//! here with zero infrastructure dependencies.

pub mod domain;
pub mod error;
pub mod guard;
pub mod ports;
pub mod projection;
pub mod services;

pub use error::{DomainError, DomainResult};
pub use guard::authorize;
