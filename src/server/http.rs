//! HTTP server implementation
//!
//! Uses hyper http1 with TokioIo for async handling. Routing is a single
//! match over method and path segments.

use bytes::Bytes;
use hyper::body::Body;
use hyper::server::conn::http1;
use hyper::service::service_fn;
use hyper::{Method, Request, Response};
use hyper_util::rt::TokioIo;
use std::convert::Infallible;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::net::TcpListener;
use tracing::{error, info, warn};

use crate::auth::JwtValidator;
use crate::config::Args;
use crate::db::CatalogStore;
use crate::quiz::QuizStore;
use crate::reviews::{AdmissionPolicy, ReviewService};
use crate::routes::helpers::parse_id;
use crate::routes::{
    self, admin_users, auth_routes, books, cors_preflight, error_response, library, questions,
    reviews, ApiRequest, FullBody,
};
use crate::session::{spawn_cleanup_task, SessionStore};
use crate::types::{BookwormError, Result};

/// Shared application state
pub struct AppState {
    pub args: Args,
    /// Catalog persistence (MongoDB or in-memory)
    pub store: Arc<dyn CatalogStore>,
    /// `mongodb` or `memory`, reported by /health
    pub store_kind: &'static str,
    /// Live sessions and their quiz verifications
    pub sessions: Arc<SessionStore>,
    pub jwt: JwtValidator,
    pub quiz: QuizStore,
    pub reviews: ReviewService,
    pub started_at: Instant,
}

impl AppState {
    pub fn new(args: Args, store: Arc<dyn CatalogStore>, store_kind: &'static str) -> Result<Self> {
        let secret = args
            .jwt_secret()
            .ok_or_else(|| BookwormError::Config("JWT_SECRET is required in production mode".into()))?;
        let jwt = JwtValidator::new(secret, args.jwt_expiry_seconds)?;

        // A session lives exactly as long as the token that names it
        let sessions = Arc::new(SessionStore::new(
            Duration::from_secs(args.jwt_expiry_seconds),
            args.max_sessions,
        ));
        let policy = AdmissionPolicy::new(args.trust_inline_verification);

        Ok(Self {
            quiz: QuizStore::new(store.clone()),
            reviews: ReviewService::new(store.clone(), sessions.clone(), policy),
            args,
            store,
            store_kind,
            sessions,
            jwt,
            started_at: Instant::now(),
        })
    }
}

/// Start the HTTP server
pub async fn run(state: Arc<AppState>) -> Result<()> {
    let listener = TcpListener::bind(state.args.listen).await?;

    info!("Bookworm listening on {}", state.args.listen);

    if state.args.dev_mode {
        warn!("Development mode enabled - insecure JWT secret in use");
    }
    if state.args.trust_inline_verification {
        warn!("Inline verification flags are trusted - reviews can bypass the quiz");
    }

    spawn_cleanup_task(
        Arc::clone(&state.sessions),
        Duration::from_secs(state.args.session_cleanup_secs),
    );
    info!(
        "Session store enabled (max {} sessions, ttl {}s)",
        state.args.max_sessions, state.args.jwt_expiry_seconds
    );

    loop {
        match listener.accept().await {
            Ok((stream, addr)) => {
                let state = Arc::clone(&state);
                tokio::spawn(async move {
                    let io = TokioIo::new(stream);

                    let service = service_fn(move |req| {
                        let state = Arc::clone(&state);
                        async move { Ok::<_, Infallible>(handle_request(state, req).await) }
                    });

                    if let Err(err) = http1::Builder::new()
                        .serve_connection(io, service)
                        .await
                    {
                        error!("Error serving connection from {}: {:?}", addr, err);
                    }
                });
            }
            Err(e) => {
                error!("Error accepting connection: {:?}", e);
            }
        }
    }
}

/// Route one request. Errors are rendered as JSON; this never fails.
pub async fn handle_request<B>(state: Arc<AppState>, req: Request<B>) -> Response<FullBody>
where
    B: Body<Data = Bytes>,
    B::Error: Into<Box<dyn std::error::Error + Send + Sync>>,
{
    if req.method() == Method::OPTIONS {
        return cors_preflight();
    }

    let started = Instant::now();
    let req = match ApiRequest::from_request(req).await {
        Ok(req) => req,
        Err(e) => return error_response(e),
    };

    let response = match route(&state, &req).await {
        Ok(response) => response,
        Err(e) => error_response(e),
    };
    info!(
        "{} {} -> {} ({} ms)",
        req.method,
        req.path,
        response.status().as_u16(),
        started.elapsed().as_millis()
    );
    response
}

async fn route(state: &AppState, req: &ApiRequest) -> Result<Response<FullBody>> {
    let segments: Vec<&str> = req.path.split('/').filter(|s| !s.is_empty()).collect();

    match (&req.method, segments.as_slice()) {
        // Liveness and build info
        (&Method::GET, ["health"]) | (&Method::GET, ["healthz"]) => Ok(routes::health_check(state)),
        (&Method::GET, ["version"]) => Ok(routes::version_info()),

        // Authentication
        (&Method::POST, ["api", "auth", "register"]) => auth_routes::handle_register(state, req).await,
        (&Method::POST, ["api", "auth", "login"]) => auth_routes::handle_login(state, req).await,
        (&Method::POST, ["api", "auth", "logout"]) => auth_routes::handle_logout(state, req).await,
        (&Method::GET, ["api", "auth", "me"]) => auth_routes::handle_me(state, req).await,

        // Account administration
        (&Method::PUT, ["api", "admin", "users", id, "status"]) => {
            admin_users::handle_update_user_status(state, req, parse_id(id, "user")?).await
        }

        // Catalog
        (&Method::GET, ["api", "books"]) => books::handle_list_books(state, req).await,
        (&Method::POST, ["api", "books"]) => books::handle_create_book(state, req).await,
        (&Method::GET, ["api", "books", id]) => {
            books::handle_get_book(state, parse_id(id, "book")?).await
        }
        (&Method::PUT, ["api", "books", id]) => {
            books::handle_update_book(state, req, parse_id(id, "book")?).await
        }
        (&Method::DELETE, ["api", "books", id]) => {
            books::handle_delete_book(state, req, parse_id(id, "book")?).await
        }

        // Quizzes
        (&Method::GET, ["api", "books", id, "questions"]) => {
            questions::handle_list_questions(state, parse_id(id, "book")?).await
        }
        (&Method::GET, ["api", "books", id, "questions", "answers"]) => {
            questions::handle_list_answers(state, req, parse_id(id, "book")?).await
        }
        (&Method::POST, ["api", "books", id, "questions"]) => {
            questions::handle_create_question(state, req, parse_id(id, "book")?).await
        }
        (&Method::PUT, ["api", "books", id, "questions"]) => {
            questions::handle_replace_questions(state, req, parse_id(id, "book")?).await
        }
        (&Method::DELETE, ["api", "books", id, "questions"]) => {
            questions::handle_delete_questions(state, req, parse_id(id, "book")?).await
        }
        (&Method::PUT, ["api", "questions", id]) => {
            questions::handle_update_question(state, req, parse_id(id, "question")?).await
        }
        (&Method::DELETE, ["api", "questions", id]) => {
            questions::handle_delete_question(state, req, parse_id(id, "question")?).await
        }

        // Verification
        (&Method::POST, ["api", "books", id, "verify"]) => {
            questions::handle_verify(state, req, parse_id(id, "book")?).await
        }
        (&Method::GET, ["api", "books", id, "verification"]) => {
            questions::handle_verification_status(state, req, parse_id(id, "book")?).await
        }

        // Reviews
        (&Method::GET, ["api", "books", id, "reviews"]) => {
            reviews::handle_list_reviews(state, parse_id(id, "book")?).await
        }
        (&Method::POST, ["api", "books", id, "reviews"]) => {
            reviews::handle_create_review(state, req, parse_id(id, "book")?).await
        }
        (&Method::PUT, ["api", "reviews", id]) => {
            reviews::handle_update_review(state, req, parse_id(id, "review")?).await
        }
        (&Method::DELETE, ["api", "reviews", id]) => {
            reviews::handle_delete_review(state, req, parse_id(id, "review")?).await
        }

        // Reading list and likes
        (&Method::GET, ["api", "me", "reading-list"]) => library::handle_reading_list(state, req).await,
        (&Method::PUT, ["api", "me", "reading-list", id]) => {
            library::handle_set_progress(state, req, parse_id(id, "book")?).await
        }
        (&Method::DELETE, ["api", "me", "reading-list", id]) => {
            library::handle_remove_from_reading_list(state, req, parse_id(id, "book")?).await
        }
        (&Method::GET, ["api", "me", "liked"]) => library::handle_liked_books(state, req).await,
        (&Method::PUT, ["api", "me", "liked", id]) => {
            library::handle_like(state, req, parse_id(id, "book")?).await
        }
        (&Method::DELETE, ["api", "me", "liked", id]) => {
            library::handle_unlike(state, req, parse_id(id, "book")?).await
        }

        _ => Err(BookwormError::NotFound(format!(
            "No route for {} {}",
            req.method, req.path
        ))),
    }
}
