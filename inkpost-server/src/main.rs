use std::sync::Arc;

use anyhow::Result;

mod application;
mod data;
mod domain;
mod infrastructure;
mod presentation;
mod server;

use application::account_service::AccountService;
use application::auth_service::AuthService;
use application::blog_service::BlogService;
use data::repositories::postgres::post_repository::PostgresPostRepository;
use data::repositories::postgres::user_repository::PostgresUserRepository;
use infrastructure::database::{create_pool, run_migrations};
use infrastructure::jwt::JwtService;
use infrastructure::logging::init_logging;
use infrastructure::media::MediaStore;
use infrastructure::settings::Settings;
use presentation::AppState;

#[tokio::main]
async fn main() -> Result<()> {
    dotenvy::dotenv().ok();
    let settings = Settings::from_env()?;

    init_logging(&settings.log_level)?;

    let pool = create_pool(&settings.database_url).await?;
    run_migrations(&pool).await?;

    let media = MediaStore::new(&settings.media_dir)?;
    let jwt = Arc::new(JwtService::new(
        &settings.jwt_secret,
        settings.jwt_ttl_seconds,
        settings.jwt_remember_ttl_seconds,
    ));

    let user_repo = PostgresUserRepository::new(pool.clone());
    let post_repo = PostgresPostRepository::new(pool);

    let auth_service = Arc::new(AuthService::new(user_repo.clone(), jwt.clone()));
    let blog_service = Arc::new(BlogService::new(post_repo));
    let account_service = Arc::new(AccountService::new(user_repo, media));

    let state = AppState::new(
        auth_service,
        blog_service,
        account_service,
        jwt,
        settings.posts_page_size,
    );

    server::run_http(&settings, state).await
}
