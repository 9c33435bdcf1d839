//! Shared types for Bookworm

mod error;

pub use error::{BookwormError, ErrorBody, Result};
