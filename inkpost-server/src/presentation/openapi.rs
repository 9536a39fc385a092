use utoipa::openapi::security::{ApiKey, ApiKeyValue, HttpAuthScheme, HttpBuilder, SecurityScheme};
use utoipa::{Modify, OpenApi};

use crate::presentation::handlers::account::{AccountDto, AccountUpdatedDto, UpdateAccountForm};
use crate::presentation::handlers::auth::{
    LoginDto, LoginResponseDto, RegisterDto, RegisterResponseDto, UserDto,
};
use crate::presentation::handlers::pages::{AboutPageDto, HomePageDto, PageQuery};
use crate::presentation::handlers::posts::{
    CreatePostDto, PostDeletedDto, PostDto, PostMutationDto, UpdatePostDto,
};
use crate::presentation::middleware::auth::SESSION_COOKIE;

#[derive(OpenApi)]
#[openapi(
    paths(
        crate::presentation::handlers::pages::home,
        crate::presentation::handlers::pages::about,
        crate::presentation::handlers::auth::register,
        crate::presentation::handlers::auth::login,
        crate::presentation::handlers::auth::logout,
        crate::presentation::handlers::account::get_account,
        crate::presentation::handlers::account::update_account,
        crate::presentation::handlers::posts::new_post,
        crate::presentation::handlers::posts::get_post,
        crate::presentation::handlers::posts::update_post,
        crate::presentation::handlers::posts::delete_post
    ),
    components(
        schemas(
            RegisterDto,
            LoginDto,
            RegisterResponseDto,
            LoginResponseDto,
            UserDto,
            AccountDto,
            AccountUpdatedDto,
            UpdateAccountForm,
            CreatePostDto,
            UpdatePostDto,
            PostDto,
            PostMutationDto,
            PostDeletedDto,
            PageQuery,
            HomePageDto,
            AboutPageDto
        )
    ),
    tags(
        (name = "pages", description = "Home and about pages"),
        (name = "auth", description = "Registration and session endpoints"),
        (name = "account", description = "Profile endpoints"),
        (name = "posts", description = "Post endpoints")
    ),
    modifiers(&SecurityAddon)
)]
pub(crate) struct ApiDoc;

pub(crate) struct SecurityAddon;

impl Modify for SecurityAddon {
    fn modify(&self, openapi: &mut utoipa::openapi::OpenApi) {
        let mut components = openapi.components.take().unwrap_or_default();
        components.add_security_scheme(
            "session_cookie",
            SecurityScheme::ApiKey(ApiKey::Cookie(ApiKeyValue::new(SESSION_COOKIE))),
        );
        components.add_security_scheme(
            "bearer_auth",
            SecurityScheme::Http(
                HttpBuilder::new()
                    .scheme(HttpAuthScheme::Bearer)
                    .bearer_format("JWT")
                    .build(),
            ),
        );
        openapi.components = Some(components);
    }
}
