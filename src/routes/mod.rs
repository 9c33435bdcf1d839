//! HTTP routes for Bookworm

pub mod admin_users;
pub mod auth_routes;
pub mod books;
pub mod health;
pub mod helpers;
pub mod library;
pub mod questions;
pub mod reviews;
pub mod views;

pub use health::{health_check, version_info};
pub use helpers::{
    authenticate, authenticate_admin, cors_preflight, error_response, json_response, ApiRequest,
    FullBody, MAX_BODY_BYTES,
};
