//! Authentication and authorization for Bookworm
//!
//! Provides:
//! - JWT token generation and validation
//! - Permission levels for route authorization
//! - Password hashing with Argon2
//! - Administrator bootstrap

pub mod admin;
pub mod jwt;
pub mod password;
pub mod permissions;

pub use admin::ensure_admin;
pub use jwt::{extract_token_from_header, Claims, JwtValidator, TokenInput, TokenValidationResult};
pub use password::{hash_password, verify_password, MIN_PASSWORD_LEN};
pub use permissions::PermissionLevel;
