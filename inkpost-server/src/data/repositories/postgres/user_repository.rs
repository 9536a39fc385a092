use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::PgPool;

use crate::data::user_repository::{NewUser, ProfilePatch, UserCredentials, UserRepository};
use crate::domain::error::DomainError;
use crate::domain::user::User;

#[derive(Debug, Clone)]
pub(crate) struct PostgresUserRepository {
    pool: PgPool,
}

impl PostgresUserRepository {
    pub(crate) fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[derive(sqlx::FromRow)]
struct UserRow {
    id: i64,
    username: String,
    email: String,
    image_file: String,
    created_at: DateTime<Utc>,
}

#[derive(sqlx::FromRow)]
struct UserCredentialsRow {
    id: i64,
    username: String,
    email: String,
    password_hash: String,
    image_file: String,
    created_at: DateTime<Utc>,
}

#[async_trait]
impl UserRepository for PostgresUserRepository {
    async fn create_user(&self, input: NewUser) -> Result<User, DomainError> {
        let row = sqlx::query_as::<_, UserRow>(
            r#"
            INSERT INTO users (username, email, password_hash)
            VALUES ($1, $2, $3)
            RETURNING id, username, email, image_file, created_at
            "#,
        )
        .bind(&input.username)
        .bind(&input.email)
        .bind(&input.password_hash)
        .fetch_one(&self.pool)
        .await
        .map_err(map_user_db_error)?;

        map_row_to_user(row)
    }

    async fn find_by_email(&self, email: &str) -> Result<Option<UserCredentials>, DomainError> {
        let row = sqlx::query_as::<_, UserCredentialsRow>(
            r#"
            SELECT
            id,
            username,
            email,
            password_hash,
            image_file,
            created_at
            FROM users
            WHERE email = $1
            "#,
        )
        .bind(email)
        .fetch_optional(&self.pool)
        .await
        .map_err(map_user_db_error)?;

        if let Some(r) = row {
            let user = User::new(r.id, r.username, r.email, r.image_file, r.created_at)
                .map_err(|err| DomainError::Unexpected(err.to_string()))?;

            Ok(Some(UserCredentials {
                user,
                password_hash: r.password_hash,
            }))
        } else {
            Ok(None)
        }
    }

    async fn get_user(&self, id: i64) -> Result<Option<User>, DomainError> {
        let row = sqlx::query_as::<_, UserRow>(
            r#"
            SELECT
            id,
            username,
            email,
            image_file,
            created_at
            FROM users
            WHERE id = $1
            "#,
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await
        .map_err(map_user_db_error)?;

        row.map(map_row_to_user).transpose()
    }

    async fn update_profile(
        &self,
        id: i64,
        patch: ProfilePatch,
    ) -> Result<Option<User>, DomainError> {
        let row = sqlx::query_as::<_, UserRow>(
            r#"
            UPDATE users
            SET username = $2,
                email = $3,
                image_file = COALESCE($4, image_file)
            WHERE id = $1
            RETURNING id, username, email, image_file, created_at
            "#,
        )
        .bind(id)
        .bind(&patch.username)
        .bind(&patch.email)
        .bind(&patch.image_file)
        .fetch_optional(&self.pool)
        .await
        .map_err(map_user_db_error)?;

        row.map(map_row_to_user).transpose()
    }
}

fn map_row_to_user(row: UserRow) -> Result<User, DomainError> {
    User::new(
        row.id,
        row.username,
        row.email,
        row.image_file,
        row.created_at,
    )
    .map_err(|err| DomainError::Unexpected(err.to_string()))
}

fn map_user_db_error(err: sqlx::Error) -> DomainError {
    if let sqlx::Error::Database(db_err) = &err
        && db_err.code().as_deref() == Some("23505")
    {
        let resource = match db_err.constraint() {
            Some("users_username_key") => "username",
            Some("users_email_key") => "email",
            _ => "user",
        };
        return DomainError::AlreadyExists(resource.to_string());
    }
    DomainError::Unexpected(err.to_string())
}
