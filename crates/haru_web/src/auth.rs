use axum::body::Body;
use axum::extract::State;
use axum::http::{header, Request, StatusCode};
use axum::middleware::Next;
use axum::response::{IntoResponse, Response};
use axum::Json;

use crate::handlers::ErrorResponse;

/// Admin-token guard for the mutating and crawl routes. An unset token
/// leaves the API open (development mode).
#[derive(Clone)]
pub struct AuthState {
    admin_token: Option<String>,
}

impl AuthState {
    pub fn new(admin_token: Option<String>) -> Self {
        Self { admin_token }
    }

    pub fn auth_required(&self) -> bool {
        self.admin_token.is_some()
    }

    pub fn validate(&self, token: &str) -> bool {
        match &self.admin_token {
            Some(expected) => expected == token,
            None => true,
        }
    }
}

/// Accepts "Bearer <token>" or the bare token in the Authorization header.
pub async fn admin_middleware(
    State(auth): State<AuthState>,
    request: Request<Body>,
    next: Next,
) -> Response {
    if !auth.auth_required() {
        return next.run(request).await;
    }

    let token = request
        .headers()
        .get(header::AUTHORIZATION)
        .and_then(|h| h.to_str().ok())
        .map(|h| h.strip_prefix("Bearer ").unwrap_or(h).trim());

    match token {
        Some(token) if auth.validate(token) => next.run(request).await,
        Some(_) => (
            StatusCode::FORBIDDEN,
            Json(ErrorResponse {
                error: "Admin role required".to_string(),
            }),
        )
            .into_response(),
        None => (
            StatusCode::UNAUTHORIZED,
            Json(ErrorResponse {
                error: "Authorization header required".to_string(),
            }),
        )
            .into_response(),
    }
}
