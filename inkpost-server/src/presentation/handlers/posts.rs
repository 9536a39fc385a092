use axum::{
    Json,
    extract::{Path, State},
    http::StatusCode,
};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use validator::Validate;

use crate::domain::post::{CreatePostRequest, Post, UpdatePostRequest};
use crate::presentation::AppState;
use crate::presentation::app_error::AppResult;
use crate::presentation::middleware::auth::AuthenticatedUser;

#[derive(Debug, Deserialize, Validate, ToSchema)]
pub(crate) struct CreatePostDto {
    #[validate(length(min = 1, max = 255))]
    pub(crate) title: String,
    #[validate(length(min = 1))]
    pub(crate) content: String,
}

#[derive(Debug, Deserialize, Validate, ToSchema)]
pub(crate) struct UpdatePostDto {
    #[validate(length(min = 1, max = 255))]
    pub(crate) title: String,
    #[validate(length(min = 1))]
    pub(crate) content: String,
}

#[derive(Debug, Serialize, ToSchema)]
pub(crate) struct PostDto {
    pub(crate) id: i64,
    pub(crate) title: String,
    pub(crate) content: String,
    pub(crate) author_id: i64,
    pub(crate) created_at: DateTime<Utc>,
}

impl From<Post> for PostDto {
    fn from(post: Post) -> Self {
        Self {
            id: post.id,
            title: post.title,
            content: post.content,
            author_id: post.author_id,
            created_at: post.created_at,
        }
    }
}

#[derive(Debug, Serialize, ToSchema)]
pub(crate) struct PostMutationDto {
    pub(crate) message: &'static str,
    pub(crate) category: &'static str,
    pub(crate) post: PostDto,
}

#[derive(Debug, Serialize, ToSchema)]
pub(crate) struct PostDeletedDto {
    pub(crate) message: &'static str,
    pub(crate) category: &'static str,
}

#[utoipa::path(
    post,
    path = "/post/new",
    tag = "posts",
    security(
        ("session_cookie" = []),
        ("bearer_auth" = [])
    ),
    request_body = CreatePostDto,
    responses(
        (status = 201, description = "Post created", body = PostMutationDto),
        (status = 400, description = "Validation error"),
        (status = 401, description = "Unauthorized"),
        (status = 500, description = "Internal error")
    )
)]
pub(crate) async fn new_post(
    State(state): State<AppState>,
    auth: AuthenticatedUser,
    Json(dto): Json<CreatePostDto>,
) -> AppResult<(StatusCode, Json<PostMutationDto>)> {
    dto.validate()?;
    let req = CreatePostRequest {
        title: dto.title,
        content: dto.content,
    };

    let post = state.blog_service.create_post(auth.user_id, req).await?;
    Ok((
        StatusCode::CREATED,
        Json(PostMutationDto {
            message: "Post has been created",
            category: "success",
            post: post.into(),
        }),
    ))
}

#[utoipa::path(
    get,
    path = "/post/{id}",
    tag = "posts",
    security(
        ("session_cookie" = []),
        ("bearer_auth" = [])
    ),
    params(
        ("id" = i64, Path, description = "Post id")
    ),
    responses(
        (status = 200, description = "Post found", body = PostDto),
        (status = 401, description = "Unauthorized"),
        (status = 404, description = "Post not found"),
        (status = 500, description = "Internal error")
    )
)]
pub(crate) async fn get_post(
    State(state): State<AppState>,
    _auth: AuthenticatedUser,
    Path(id): Path<i64>,
) -> AppResult<(StatusCode, Json<PostDto>)> {
    let post = state.blog_service.get_post(id).await?;

    Ok((StatusCode::OK, Json(PostDto::from(post))))
}

#[utoipa::path(
    post,
    path = "/post/{id}/update",
    tag = "posts",
    security(
        ("session_cookie" = []),
        ("bearer_auth" = [])
    ),
    params(
        ("id" = i64, Path, description = "Post id")
    ),
    request_body = UpdatePostDto,
    responses(
        (status = 200, description = "Post updated", body = PostMutationDto),
        (status = 400, description = "Validation error"),
        (status = 401, description = "Unauthorized"),
        (status = 403, description = "Not the author"),
        (status = 404, description = "Post not found"),
        (status = 500, description = "Internal error")
    )
)]
pub(crate) async fn update_post(
    State(state): State<AppState>,
    auth: AuthenticatedUser,
    Path(id): Path<i64>,
    Json(dto): Json<UpdatePostDto>,
) -> AppResult<(StatusCode, Json<PostMutationDto>)> {
    dto.validate()?;
    let req = UpdatePostRequest {
        title: dto.title,
        content: dto.content,
    };

    let post = state
        .blog_service
        .update_post(auth.user_id, id, req)
        .await?;
    Ok((
        StatusCode::OK,
        Json(PostMutationDto {
            message: "Your post has been updated",
            category: "success",
            post: post.into(),
        }),
    ))
}

#[utoipa::path(
    post,
    path = "/post/{id}/delete",
    tag = "posts",
    security(
        ("session_cookie" = []),
        ("bearer_auth" = [])
    ),
    params(
        ("id" = i64, Path, description = "Post id")
    ),
    responses(
        (status = 200, description = "Post deleted", body = PostDeletedDto),
        (status = 401, description = "Unauthorized"),
        (status = 403, description = "Not the author"),
        (status = 404, description = "Post not found"),
        (status = 500, description = "Internal error")
    )
)]
pub(crate) async fn delete_post(
    State(state): State<AppState>,
    auth: AuthenticatedUser,
    Path(id): Path<i64>,
) -> AppResult<(StatusCode, Json<PostDeletedDto>)> {
    state.blog_service.delete_post(auth.user_id, id).await?;
    Ok((
        StatusCode::OK,
        Json(PostDeletedDto {
            message: "Your post has been deleted",
            category: "success",
        }),
    ))
}
