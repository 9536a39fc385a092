use std::sync::Arc;

use crate::application::account_service::AccountService;
use crate::application::auth_service::AuthService;
use crate::application::blog_service::BlogService;
use crate::data::repositories::postgres::post_repository::PostgresPostRepository;
use crate::data::repositories::postgres::user_repository::PostgresUserRepository;
use crate::infrastructure::jwt::JwtService;

/// URL prefix profile pictures are served under.
pub(crate) const PROFILE_PICS_ROUTE: &str = "/static/profile_pics";

pub(crate) mod app_error;
pub(crate) mod handlers;
pub(crate) mod middleware;
pub(crate) mod openapi;
pub(crate) mod routes;

#[derive(Clone)]
pub(crate) struct AppState {
    pub(crate) auth_service: Arc<AuthService<PostgresUserRepository>>,
    pub(crate) blog_service: Arc<BlogService<PostgresPostRepository>>,
    pub(crate) account_service: Arc<AccountService<PostgresUserRepository>>,
    pub(crate) jwt: Arc<JwtService>,
    pub(crate) posts_page_size: u32,
}

impl AppState {
    pub(crate) fn new(
        auth_service: Arc<AuthService<PostgresUserRepository>>,
        blog_service: Arc<BlogService<PostgresPostRepository>>,
        account_service: Arc<AccountService<PostgresUserRepository>>,
        jwt: Arc<JwtService>,
        posts_page_size: u32,
    ) -> Self {
        Self {
            auth_service,
            blog_service,
            account_service,
            jwt,
            posts_page_size,
        }
    }
}
