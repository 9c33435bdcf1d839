//! Bookworm - book reviews behind a proof-of-reading quiz
//!
//! Readers may only review a book after answering its short multiple-choice
//! quiz correctly in their current login session.
//!
//! ## Components
//!
//! - **Quiz**: per-book questions; answers never leave the server
//! - **Sessions**: login sessions carrying per-book verification
//! - **Reviews**: admission gate, review persistence, rating aggregation
//! - **Catalog**: books, reading lists and likes in MongoDB

pub mod auth;
pub mod config;
pub mod db;
pub mod quiz;
pub mod reviews;
pub mod routes;
pub mod server;
pub mod session;
pub mod types;

pub use config::Args;
pub use server::{handle_request, run, AppState};
pub use types::{BookwormError, Result};
