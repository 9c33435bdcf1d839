//! Shared request and response plumbing for the route handlers

use bytes::Bytes;
use http_body_util::{BodyExt, Full, LengthLimitError, Limited};
use hyper::body::Body;
use hyper::header::{
    HeaderValue, ACCESS_CONTROL_ALLOW_HEADERS, ACCESS_CONTROL_ALLOW_METHODS,
    ACCESS_CONTROL_ALLOW_ORIGIN, ACCESS_CONTROL_MAX_AGE, AUTHORIZATION, CACHE_CONTROL,
    CONTENT_TYPE,
};
use hyper::{Method, Request, Response, StatusCode};
use serde::de::DeserializeOwned;
use serde::Serialize;
use tracing::{debug, error};

use crate::auth::{extract_token_from_header, PermissionLevel};
use crate::server::AppState;
use crate::session::SessionContext;
use crate::types::{BookwormError, Result};

pub type FullBody = Full<Bytes>;

/// Largest request body accepted
pub const MAX_BODY_BYTES: usize = 64 * 1024;

/// A request with its body already read
#[derive(Debug, Clone)]
pub struct ApiRequest {
    pub method: Method,
    pub path: String,
    pub query: Option<String>,
    pub authorization: Option<String>,
    pub body: Bytes,
}

impl ApiRequest {
    /// Read the body of `req`, refusing anything over [`MAX_BODY_BYTES`]
    pub async fn from_request<B>(req: Request<B>) -> Result<Self>
    where
        B: Body<Data = Bytes>,
        B::Error: Into<Box<dyn std::error::Error + Send + Sync>>,
    {
        let (parts, body) = req.into_parts();

        let body = Limited::new(body, MAX_BODY_BYTES)
            .collect()
            .await
            .map_err(|e| {
                if e.downcast_ref::<LengthLimitError>().is_some() {
                    BookwormError::BadRequest("Request body too large".into())
                } else {
                    BookwormError::BadRequest(format!("Failed to read body: {}", e))
                }
            })?
            .to_bytes();

        Ok(Self {
            method: parts.method,
            path: parts.uri.path().to_string(),
            query: parts.uri.query().map(str::to_string),
            authorization: parts
                .headers
                .get(AUTHORIZATION)
                .and_then(|v| v.to_str().ok())
                .map(str::to_string),
            body,
        })
    }

    /// Decode the JSON body
    pub fn json<T: DeserializeOwned>(&self) -> Result<T> {
        if self.body.is_empty() {
            return Err(BookwormError::BadRequest("Request body is required".into()));
        }
        serde_json::from_slice(&self.body)
            .map_err(|e| BookwormError::BadRequest(format!("Invalid JSON: {}", e)))
    }

    /// Decode the query string; a missing query yields the default
    pub fn query<T: DeserializeOwned + Default>(&self) -> Result<T> {
        match self.query.as_deref() {
            None | Some("") => Ok(T::default()),
            Some(query) => serde_urlencoded::from_str(query)
                .map_err(|e| BookwormError::BadRequest(format!("Invalid query: {}", e))),
        }
    }
}

/// Resolve the caller from the bearer token.
///
/// The token must verify and its session must still be open: logging out
/// or letting the session lapse invalidates the token before its `exp`.
/// The account is re-read on every call, so a deactivated or deleted user
/// loses access at once and the permission level follows the stored role.
pub async fn authenticate(state: &AppState, req: &ApiRequest) -> Result<SessionContext> {
    let token = extract_token_from_header(req.authorization.as_deref())
        .ok_or_else(|| BookwormError::Unauthorized("No token provided".into()))?;

    let result = state.jwt.verify_token(token);
    let claims = match result.claims {
        Some(claims) if result.valid => claims,
        _ => {
            return Err(BookwormError::Unauthorized(
                result.error.unwrap_or_else(|| "Invalid token".into()),
            ))
        }
    };

    match state.sessions.user_id(&claims.sid) {
        Some(user_id) if user_id == claims.sub => {}
        _ => return Err(BookwormError::Unauthorized("Session expired".into())),
    }

    let user = match state.store.get_user(claims.sub).await? {
        Some(user) if user.is_active => user,
        _ => {
            state.sessions.destroy(&claims.sid);
            return Err(BookwormError::Unauthorized("Account is disabled".into()));
        }
    };

    Ok(SessionContext {
        session_id: claims.sid,
        user_id: user.id,
        username: user.username,
        permission_level: PermissionLevel::for_user(user.is_admin),
    })
}

/// Like [`authenticate`], additionally requiring administrator rights
pub async fn authenticate_admin(state: &AppState, req: &ApiRequest) -> Result<SessionContext> {
    let ctx = authenticate(state, req).await?;
    ctx.permission_level.require(PermissionLevel::Admin)?;
    Ok(ctx)
}

pub fn parse_id(raw: &str, what: &str) -> Result<i64> {
    raw.parse::<i64>()
        .map_err(|_| BookwormError::BadRequest(format!("Invalid {} id: {}", what, raw)))
}

fn with_cors(mut response: Response<FullBody>) -> Response<FullBody> {
    let headers = response.headers_mut();
    headers.insert(ACCESS_CONTROL_ALLOW_ORIGIN, HeaderValue::from_static("*"));
    headers.insert(
        ACCESS_CONTROL_ALLOW_METHODS,
        HeaderValue::from_static("GET, POST, PUT, DELETE, OPTIONS"),
    );
    headers.insert(
        ACCESS_CONTROL_ALLOW_HEADERS,
        HeaderValue::from_static("Content-Type, Authorization"),
    );
    response
}

pub fn json_response<T: Serialize>(status: StatusCode, body: &T) -> Response<FullBody> {
    let json = serde_json::to_vec(body).unwrap_or_else(|_| b"{}".to_vec());

    let mut response = Response::new(Full::new(Bytes::from(json)));
    *response.status_mut() = status;
    let headers = response.headers_mut();
    headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));
    headers.insert(CACHE_CONTROL, HeaderValue::from_static("no-store"));
    with_cors(response)
}

pub fn ok<T: Serialize>(body: &T) -> Result<Response<FullBody>> {
    Ok(json_response(StatusCode::OK, body))
}

pub fn created<T: Serialize>(body: &T) -> Result<Response<FullBody>> {
    Ok(json_response(StatusCode::CREATED, body))
}

pub fn error_response(err: BookwormError) -> Response<FullBody> {
    let (status, body) = err.into_status_code_and_body();
    if status.is_server_error() {
        error!("{} {}: {}", status.as_u16(), body.code, body.error);
    } else {
        debug!("{} {}: {}", status.as_u16(), body.code, body.error);
    }
    json_response(status, &body)
}

pub fn cors_preflight() -> Response<FullBody> {
    let mut response = Response::new(Full::new(Bytes::new()));
    *response.status_mut() = StatusCode::NO_CONTENT;
    response
        .headers_mut()
        .insert(ACCESS_CONTROL_MAX_AGE, HeaderValue::from_static("86400"));
    with_cors(response)
}

#[derive(Debug, Serialize)]
pub struct SuccessResponse {
    pub success: bool,
}

impl SuccessResponse {
    pub fn new() -> Self {
        Self { success: true }
    }
}

impl Default for SuccessResponse {
    fn default() -> Self {
        Self::new()
    }
}
