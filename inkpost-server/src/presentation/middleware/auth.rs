use axum::{
    extract::{FromRequestParts, Request, State},
    http::{HeaderMap, header, request::Parts},
    middleware::Next,
    response::Response,
};
use axum_extra::extract::cookie::CookieJar;

use crate::presentation::AppState;
use crate::presentation::app_error::AppError;

/// Name of the cookie the session token travels in.
pub(crate) const SESSION_COOKIE: &str = "session";

#[derive(Debug, Clone)]
pub(crate) struct AuthenticatedUser {
    pub(crate) user_id: i64,
}

impl<S> FromRequestParts<S> for AuthenticatedUser
where
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        parts
            .extensions
            .get::<AuthenticatedUser>()
            .cloned()
            .ok_or(AppError::Unauthorized)
    }
}

/// Accepts the session token either as a bearer header or in the session
/// cookie; the cookie is what the login handler sets.
pub(crate) async fn session_auth_middleware(
    State(state): State<AppState>,
    mut request: Request,
    next: Next,
) -> Result<Response, AppError> {
    let token = match bearer_token(request.headers())? {
        Some(token) => token,
        None => cookie_token(request.headers()).ok_or(AppError::Unauthorized)?,
    };

    let claims = state
        .jwt
        .verify_token(&token)
        .map_err(|_| AppError::Unauthorized)?;

    request.extensions_mut().insert(AuthenticatedUser {
        user_id: claims.user_id,
    });

    Ok(next.run(request).await)
}

fn bearer_token(headers: &HeaderMap) -> Result<Option<String>, AppError> {
    let Some(auth_header) = headers
        .get(header::AUTHORIZATION)
        .and_then(|value| value.to_str().ok())
    else {
        return Ok(None);
    };

    let mut parts = auth_header.split_whitespace();
    let scheme = parts.next().ok_or(AppError::Unauthorized)?;
    let token = parts.next().ok_or(AppError::Unauthorized)?;
    if parts.next().is_some() {
        return Err(AppError::Unauthorized);
    }
    if !scheme.eq_ignore_ascii_case("bearer") {
        return Err(AppError::Unauthorized);
    }
    if token.trim().is_empty() {
        return Err(AppError::Unauthorized);
    }

    Ok(Some(token.trim().to_string()))
}

fn cookie_token(headers: &HeaderMap) -> Option<String> {
    let jar = CookieJar::from_headers(headers);
    jar.get(SESSION_COOKIE)
        .map(|cookie| cookie.value().to_string())
        .filter(|token| !token.is_empty())
}
