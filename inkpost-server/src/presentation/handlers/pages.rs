use axum::{
    Json,
    extract::{Query, State},
    http::StatusCode,
};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use validator::Validate;

use super::posts::PostDto;
use crate::application::blog_service::ListPostsResult;
use crate::presentation::AppState;
use crate::presentation::app_error::AppResult;

#[derive(Debug, Deserialize, Validate, ToSchema)]
pub(crate) struct PageQuery {
    #[validate(range(min = 1))]
    pub(crate) page: Option<u32>,
}

#[derive(Debug, Serialize, ToSchema)]
pub(crate) struct HomePageDto {
    pub(crate) posts: Vec<PostDto>,
    pub(crate) page: u32,
    pub(crate) page_size: u32,
    pub(crate) total: i64,
}

#[derive(Debug, Serialize, ToSchema)]
pub(crate) struct AboutPageDto {
    pub(crate) title: &'static str,
}

impl From<ListPostsResult> for HomePageDto {
    fn from(result: ListPostsResult) -> Self {
        Self {
            posts: result.posts.into_iter().map(PostDto::from).collect(),
            page: result.page,
            page_size: result.page_size,
            total: result.total,
        }
    }
}

#[utoipa::path(
    get,
    path = "/",
    tag = "pages",
    params(
        ("page" = Option<u32>, Query, description = "Page number, 1-based")
    ),
    responses(
        (status = 200, description = "Newest-first page of posts", body = HomePageDto),
        (status = 400, description = "Validation error"),
        (status = 500, description = "Internal error")
    )
)]
pub(crate) async fn home(
    State(state): State<AppState>,
    Query(query): Query<PageQuery>,
) -> AppResult<(StatusCode, Json<HomePageDto>)> {
    query.validate()?;
    let page = query.page.unwrap_or(1);

    let result = state
        .blog_service
        .list_posts(page, state.posts_page_size)
        .await?;

    Ok((StatusCode::OK, Json(HomePageDto::from(result))))
}

#[utoipa::path(
    get,
    path = "/about",
    tag = "pages",
    responses(
        (status = 200, description = "About page data", body = AboutPageDto)
    )
)]
pub(crate) async fn about() -> Json<AboutPageDto> {
    Json(AboutPageDto { title: "About" })
}
