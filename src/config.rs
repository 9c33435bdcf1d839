//! Configuration for Bookworm
//!
//! CLI arguments and environment variable handling using clap.

use clap::Parser;
use std::net::SocketAddr;

/// Bookworm - book reviews behind a proof-of-reading quiz
#[derive(Parser, Debug, Clone)]
#[command(name = "bookworm")]
#[command(about = "Book review service with proof-of-reading quizzes")]
pub struct Args {
    /// Address to listen on
    #[arg(long, env = "LISTEN", default_value = "0.0.0.0:8080")]
    pub listen: SocketAddr,

    /// Enable development mode (insecure JWT secret, in-memory fallback store)
    #[arg(long, env = "DEV_MODE", default_value = "false")]
    pub dev_mode: bool,

    /// MongoDB connection URI
    #[arg(long, env = "MONGODB_URI", default_value = "mongodb://localhost:27017")]
    pub mongodb_uri: String,

    /// MongoDB database name
    #[arg(long, env = "MONGODB_DB", default_value = "bookworm")]
    pub mongodb_db: String,

    /// Use the in-memory store instead of MongoDB (data is lost on restart)
    #[arg(long, env = "MEMORY_STORE", default_value = "false")]
    pub memory_store: bool,

    /// JWT secret for token signing (required in production)
    #[arg(long, env = "JWT_SECRET")]
    pub jwt_secret: Option<String>,

    /// JWT token expiry in seconds; also the lifetime of a login session
    #[arg(long, env = "JWT_EXPIRY_SECONDS", default_value = "3600")]
    pub jwt_expiry_seconds: u64,

    /// Maximum number of live sessions held in memory
    #[arg(long, env = "MAX_SESSIONS", default_value = "10000")]
    pub max_sessions: usize,

    /// Interval between expired-session sweeps, in seconds
    #[arg(long, env = "SESSION_CLEANUP_SECS", default_value = "60")]
    pub session_cleanup_secs: u64,

    /// Accept the client-supplied `verified` flag on review submissions.
    /// Off by default: verification is derived from session state only.
    #[arg(long, env = "TRUST_INLINE_VERIFICATION", default_value = "false")]
    pub trust_inline_verification: bool,

    /// Username of an administrator account to create at startup
    #[arg(long, env = "ADMIN_USERNAME")]
    pub admin_username: Option<String>,

    /// Password for the bootstrap administrator
    #[arg(long, env = "ADMIN_PASSWORD")]
    pub admin_password: Option<String>,

    /// Log level (trace, debug, info, warn, error)
    #[arg(long, env = "LOG_LEVEL", default_value = "info")]
    pub log_level: String,

    /// Emit logs as JSON lines instead of human-readable text
    #[arg(long, env = "LOG_JSON", default_value = "false")]
    pub log_json: bool,
}

impl Args {
    /// Get effective JWT secret (uses default in dev mode)
    pub fn jwt_secret(&self) -> Option<String> {
        match (&self.jwt_secret, self.dev_mode) {
            (Some(secret), _) => Some(secret.clone()),
            (None, true) => Some("dev-only-insecure-secret-not-for-production".to_string()),
            (None, false) => None,
        }
    }

    /// Admin bootstrap credentials, if both halves are configured
    pub fn admin_credentials(&self) -> Option<(&str, &str)> {
        match (&self.admin_username, &self.admin_password) {
            (Some(user), Some(pass)) => Some((user.as_str(), pass.as_str())),
            _ => None,
        }
    }

    /// Validate configuration
    pub fn validate(&self) -> Result<(), String> {
        if !self.dev_mode && self.jwt_secret.is_none() {
            return Err("JWT_SECRET is required in production mode".to_string());
        }

        if self.admin_username.is_some() != self.admin_password.is_some() {
            return Err("ADMIN_USERNAME and ADMIN_PASSWORD must be set together".to_string());
        }

        if self.max_sessions == 0 {
            return Err("MAX_SESSIONS must be greater than zero".to_string());
        }

        if self.jwt_expiry_seconds == 0 {
            return Err("JWT_EXPIRY_SECONDS must be greater than zero".to_string());
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_dev_mode_defaults() {
        let args = Args::parse_from(["bookworm", "--dev-mode"]);
        assert!(args.validate().is_ok());
        assert!(args.jwt_secret().is_some());
        assert!(!args.trust_inline_verification);
        assert_eq!(args.jwt_expiry_seconds, 3600);
        assert!(!args.log_json);
    }

    #[test]
    fn test_log_json_flag() {
        let args = Args::parse_from(["bookworm", "--dev-mode", "--log-json"]);
        assert!(args.log_json);
    }

    #[test]
    fn test_dev_secret_is_usable() {
        let args = Args::parse_from(["bookworm", "--dev-mode"]);
        let secret = args.jwt_secret().unwrap();
        assert!(crate::auth::JwtValidator::new(secret, args.jwt_expiry_seconds).is_ok());
    }

    #[test]
    fn test_production_requires_secret() {
        let args = Args::parse_from(["bookworm"]);
        assert!(args.validate().is_err());
        assert!(args.jwt_secret().is_none());
    }

    #[test]
    fn test_admin_credentials_must_pair() {
        let args = Args::parse_from(["bookworm", "--dev-mode", "--admin-username", "root"]);
        assert!(args.validate().is_err());

        let args = Args::parse_from([
            "bookworm",
            "--dev-mode",
            "--admin-username",
            "root",
            "--admin-password",
            "hunter22",
        ]);
        assert!(args.validate().is_ok());
        assert_eq!(args.admin_credentials(), Some(("root", "hunter22")));
    }

    #[test]
    fn test_zero_sessions_rejected() {
        let args = Args::parse_from(["bookworm", "--dev-mode", "--max-sessions", "0"]);
        assert!(args.validate().is_err());
    }
}
