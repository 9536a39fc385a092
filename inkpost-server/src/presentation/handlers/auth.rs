use axum::{
    Json,
    extract::{Query, State},
    http::StatusCode,
    response::Redirect,
};
use axum_extra::extract::cookie::{Cookie, CookieJar, SameSite};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use validator::Validate;

use crate::domain::user::{LoginRequest, RegisterRequest, User};
use crate::presentation::AppState;
use crate::presentation::app_error::AppResult;
use crate::presentation::middleware::auth::SESSION_COOKIE;

#[derive(Debug, Deserialize, Validate, ToSchema)]
pub(crate) struct RegisterDto {
    #[validate(length(min = 3, max = 64))]
    pub(crate) username: String,
    #[validate(email)]
    pub(crate) email: String,
    #[validate(length(min = 8, max = 128))]
    pub(crate) password: String,
}

#[derive(Debug, Deserialize, Validate, ToSchema)]
pub(crate) struct LoginDto {
    #[validate(email)]
    pub(crate) email: String,
    #[validate(length(min = 1))]
    pub(crate) password: String,
    #[serde(default)]
    pub(crate) remember: bool,
}

#[derive(Debug, Deserialize, ToSchema)]
pub(crate) struct NextQuery {
    pub(crate) next: Option<String>,
}

#[derive(Debug, Serialize, ToSchema)]
pub(crate) struct UserDto {
    pub(crate) id: i64,
    pub(crate) username: String,
    pub(crate) email: String,
    pub(crate) image_file: String,
    pub(crate) created_at: DateTime<Utc>,
}

impl From<User> for UserDto {
    fn from(user: User) -> Self {
        Self {
            id: user.id,
            username: user.username,
            email: user.email,
            image_file: user.image_file,
            created_at: user.created_at,
        }
    }
}

#[derive(Debug, Serialize, ToSchema)]
pub(crate) struct RegisterResponseDto {
    pub(crate) message: String,
    pub(crate) category: &'static str,
    pub(crate) user: UserDto,
}

#[derive(Debug, Serialize, ToSchema)]
pub(crate) struct LoginResponseDto {
    pub(crate) message: String,
    pub(crate) category: &'static str,
    pub(crate) user: UserDto,
    /// Where the client wanted to go before being sent to login.
    pub(crate) next: String,
}

#[utoipa::path(
    post,
    path = "/register",
    tag = "auth",
    request_body = RegisterDto,
    responses(
        (status = 201, description = "Account created", body = RegisterResponseDto),
        (status = 400, description = "Validation error"),
        (status = 409, description = "Username or email already in use"),
        (status = 500, description = "Internal error")
    )
)]
pub(crate) async fn register(
    State(state): State<AppState>,
    Json(dto): Json<RegisterDto>,
) -> AppResult<(StatusCode, Json<RegisterResponseDto>)> {
    dto.validate()?;

    let req = RegisterRequest {
        username: dto.username,
        email: dto.email,
        password: dto.password,
    };

    let user = state.auth_service.register(req).await?;

    Ok((
        StatusCode::CREATED,
        Json(RegisterResponseDto {
            message: format!("Account created for {}. Login here!", user.username),
            category: "success",
            user: user.into(),
        }),
    ))
}

#[utoipa::path(
    post,
    path = "/login",
    tag = "auth",
    params(
        ("next" = Option<String>, Query, description = "Path to resume after login")
    ),
    request_body = LoginDto,
    responses(
        (status = 200, description = "Session established", body = LoginResponseDto),
        (status = 400, description = "Validation error"),
        (status = 401, description = "Invalid credentials"),
        (status = 500, description = "Internal error")
    )
)]
pub(crate) async fn login(
    State(state): State<AppState>,
    Query(query): Query<NextQuery>,
    jar: CookieJar,
    Json(dto): Json<LoginDto>,
) -> AppResult<(CookieJar, Json<LoginResponseDto>)> {
    dto.validate()?;

    let req = LoginRequest {
        email: dto.email,
        password: dto.password,
        remember: dto.remember,
    };
    let remember = req.remember;

    let result = state.auth_service.login(req).await?;

    let ttl = if remember {
        state.jwt.remember_ttl_seconds
    } else {
        state.jwt.ttl_seconds
    };
    let jar = jar.add(session_cookie(result.access_token, remember, ttl));

    // Only same-site paths are honored as a resume target.
    let next = query
        .next
        .filter(|next| next.starts_with('/'))
        .unwrap_or_else(|| "/".to_string());

    Ok((
        jar,
        Json(LoginResponseDto {
            message: "Logged in".to_string(),
            category: "success",
            user: result.user.into(),
            next,
        }),
    ))
}

#[utoipa::path(
    get,
    path = "/logout",
    tag = "auth",
    responses(
        (status = 303, description = "Session cleared, back to home")
    )
)]
pub(crate) async fn logout(jar: CookieJar) -> (CookieJar, Redirect) {
    let jar = jar.remove(Cookie::build((SESSION_COOKIE, "")).path("/"));
    (jar, Redirect::to("/"))
}

fn session_cookie(token: String, remember: bool, ttl_seconds: i64) -> Cookie<'static> {
    let mut builder = Cookie::build((SESSION_COOKIE, token))
        .path("/")
        .http_only(true)
        .same_site(SameSite::Lax);

    // A remembered session persists across browser restarts; otherwise the
    // cookie stays session-scoped and only the token carries the expiry.
    if remember {
        builder = builder.max_age(time::Duration::seconds(ttl_seconds));
    }

    builder.build()
}

#[cfg(test)]
mod tests {
    use super::session_cookie;

    #[test]
    fn remembered_cookie_carries_max_age() {
        let cookie = session_cookie("tok".to_string(), true, 3600);
        assert_eq!(cookie.max_age(), Some(time::Duration::seconds(3600)));
        assert_eq!(cookie.http_only(), Some(true));
    }

    #[test]
    fn plain_cookie_is_session_scoped() {
        let cookie = session_cookie("tok".to_string(), false, 3600);
        assert_eq!(cookie.max_age(), None);
    }
}
