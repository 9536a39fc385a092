use axum::{
    Json,
    extract::{Multipart, State},
    http::StatusCode,
};
use serde::Serialize;
use utoipa::ToSchema;
use validator::Validate;

use crate::application::account_service::UploadedPicture;
use crate::domain::user::{UpdateAccountRequest, User};
use crate::presentation::app_error::{AppError, AppResult};
use crate::presentation::middleware::auth::AuthenticatedUser;
use crate::presentation::{AppState, PROFILE_PICS_ROUTE};

#[derive(Debug, Validate, ToSchema)]
pub(crate) struct UpdateAccountForm {
    #[validate(length(min = 3, max = 64))]
    pub(crate) username: String,
    #[validate(email)]
    pub(crate) email: String,
}

#[derive(Debug, Serialize, ToSchema)]
pub(crate) struct AccountDto {
    pub(crate) id: i64,
    pub(crate) username: String,
    pub(crate) email: String,
    pub(crate) image_file: String,
    pub(crate) image_url: String,
}

impl From<User> for AccountDto {
    fn from(user: User) -> Self {
        let image_url = format!("{PROFILE_PICS_ROUTE}/{}", user.image_file);
        Self {
            id: user.id,
            username: user.username,
            email: user.email,
            image_file: user.image_file,
            image_url,
        }
    }
}

#[derive(Debug, Serialize, ToSchema)]
pub(crate) struct AccountUpdatedDto {
    pub(crate) message: &'static str,
    pub(crate) category: &'static str,
    pub(crate) user: AccountDto,
}

#[utoipa::path(
    get,
    path = "/account",
    tag = "account",
    security(
        ("session_cookie" = []),
        ("bearer_auth" = [])
    ),
    responses(
        (status = 200, description = "Current profile", body = AccountDto),
        (status = 401, description = "Unauthorized"),
        (status = 500, description = "Internal error")
    )
)]
pub(crate) async fn get_account(
    State(state): State<AppState>,
    auth: AuthenticatedUser,
) -> AppResult<(StatusCode, Json<AccountDto>)> {
    let user = state.account_service.get_profile(auth.user_id).await?;

    Ok((StatusCode::OK, Json(AccountDto::from(user))))
}

#[utoipa::path(
    post,
    path = "/account",
    tag = "account",
    security(
        ("session_cookie" = []),
        ("bearer_auth" = [])
    ),
    request_body(content = UpdateAccountForm, content_type = "multipart/form-data"),
    responses(
        (status = 200, description = "Profile updated", body = AccountUpdatedDto),
        (status = 400, description = "Validation error or unusable picture"),
        (status = 401, description = "Unauthorized"),
        (status = 409, description = "Username or email already in use"),
        (status = 500, description = "Internal error")
    )
)]
pub(crate) async fn update_account(
    State(state): State<AppState>,
    auth: AuthenticatedUser,
    multipart: Multipart,
) -> AppResult<(StatusCode, Json<AccountUpdatedDto>)> {
    let (form, picture) = read_account_form(multipart).await?;
    form.validate()?;

    let req = UpdateAccountRequest {
        username: form.username,
        email: form.email,
    };

    let user = state
        .account_service
        .update_account(auth.user_id, req, picture)
        .await?;

    Ok((
        StatusCode::OK,
        Json(AccountUpdatedDto {
            message: "Your account has been updated!",
            category: "success",
            user: user.into(),
        }),
    ))
}

/// Pulls username/email plus an optional picture out of the multipart body.
/// An empty picture part (no file selected) counts as "no new picture".
async fn read_account_form(
    mut multipart: Multipart,
) -> Result<(UpdateAccountForm, Option<UploadedPicture>), AppError> {
    let mut username = None;
    let mut email = None;
    let mut picture = None;

    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|err| AppError::BadRequest(err.to_string()))?
    {
        match field.name() {
            Some("username") => {
                username = Some(
                    field
                        .text()
                        .await
                        .map_err(|err| AppError::BadRequest(err.to_string()))?,
                );
            }
            Some("email") => {
                email = Some(
                    field
                        .text()
                        .await
                        .map_err(|err| AppError::BadRequest(err.to_string()))?,
                );
            }
            Some("picture") => {
                let filename = field.file_name().map(str::to_string);
                let data = field
                    .bytes()
                    .await
                    .map_err(|err| AppError::BadRequest(err.to_string()))?;
                if !data.is_empty() {
                    let filename = filename.ok_or_else(|| {
                        AppError::BadRequest("picture must carry a file name".to_string())
                    })?;
                    picture = Some(UploadedPicture {
                        filename,
                        data: data.to_vec(),
                    });
                }
            }
            _ => {}
        }
    }

    let username =
        username.ok_or_else(|| AppError::BadRequest("username is required".to_string()))?;
    let email = email.ok_or_else(|| AppError::BadRequest("email is required".to_string()))?;

    Ok((UpdateAccountForm { username, email }, picture))
}
