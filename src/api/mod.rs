//! API route definitions
//!
//! Profile endpoints live under `/api/profile`; health checks are served at the root.

pub mod error;
pub mod health;
pub mod profile;
pub mod validation;

pub use error::{ApiError, FieldError};
