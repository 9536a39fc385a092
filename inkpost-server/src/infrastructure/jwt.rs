use chrono::{Duration, Utc};
use jsonwebtoken::{Algorithm, DecodingKey, EncodingKey, Header, Validation, decode, encode};
use serde::{Deserialize, Serialize};
use thiserror::Error;

#[derive(Debug, Error)]
pub(crate) enum JwtError {
    #[error("token encode failed")]
    Encode(#[source] jsonwebtoken::errors::Error),

    #[error("token decode/validation failed")]
    Decode(#[source] jsonwebtoken::errors::Error),
}

#[derive(Serialize, Deserialize, Debug, Clone)]
pub(crate) struct Claims {
    pub(crate) user_id: i64,
    pub(crate) username: String,
    pub(crate) exp: i64,
}

/// Signs and verifies session tokens. A session lives `ttl_seconds` unless
/// the login asked to be remembered, which switches to the long TTL.
pub(crate) struct JwtService {
    pub(crate) secret: String,
    pub(crate) ttl_seconds: i64,
    pub(crate) remember_ttl_seconds: i64,
}

impl JwtService {
    const DEFAULT_TTL_SECONDS: i64 = 60 * 60;
    const DEFAULT_REMEMBER_TTL_SECONDS: i64 = 30 * 24 * 60 * 60;

    pub(crate) fn new(secret: &str, ttl_seconds: i64, remember_ttl_seconds: i64) -> Self {
        let ttl_seconds = if ttl_seconds > 0 {
            ttl_seconds
        } else {
            Self::DEFAULT_TTL_SECONDS
        };
        let remember_ttl_seconds = if remember_ttl_seconds > 0 {
            remember_ttl_seconds
        } else {
            Self::DEFAULT_REMEMBER_TTL_SECONDS
        };

        JwtService {
            secret: secret.into(),
            ttl_seconds,
            remember_ttl_seconds,
        }
    }

    pub(crate) fn generate_token(
        &self,
        user_id: i64,
        username: &str,
        remember: bool,
    ) -> Result<String, JwtError> {
        let ttl = if remember {
            self.remember_ttl_seconds
        } else {
            self.ttl_seconds
        };
        let exp = (Utc::now() + Duration::seconds(ttl)).timestamp();

        let claims = Claims {
            user_id,
            username: username.into(),
            exp,
        };

        encode(
            &Header::new(Algorithm::HS256),
            &claims,
            &EncodingKey::from_secret(self.secret.as_bytes()),
        )
        .map_err(JwtError::Encode)
    }

    pub(crate) fn verify_token(&self, token: &str) -> Result<Claims, JwtError> {
        let mut validation = Validation::new(Algorithm::HS256);
        validation.validate_exp = true;
        validation.leeway = 10;

        let token_data = decode::<Claims>(
            token,
            &DecodingKey::from_secret(self.secret.as_bytes()),
            &validation,
        )
        .map_err(JwtError::Decode)?;

        Ok(token_data.claims)
    }
}

#[cfg(test)]
mod tests {
    use chrono::Utc;

    use super::JwtService;

    const SECRET: &str = "0123456789abcdef0123456789abcdef";

    #[test]
    fn token_round_trip_preserves_identity() {
        let jwt = JwtService::new(SECRET, 3600, 0);

        let token = jwt
            .generate_token(42, "valid_user", false)
            .expect("token must encode");
        let claims = jwt.verify_token(&token).expect("token must verify");

        assert_eq!(claims.user_id, 42);
        assert_eq!(claims.username, "valid_user");
    }

    #[test]
    fn token_signed_with_other_secret_is_rejected() {
        let jwt = JwtService::new(SECRET, 3600, 0);
        let other = JwtService::new("ffffffffffffffffffffffffffffffff", 3600, 0);

        let token = jwt
            .generate_token(42, "valid_user", false)
            .expect("token must encode");
        assert!(other.verify_token(&token).is_err());
    }

    #[test]
    fn remember_extends_expiry() {
        let jwt = JwtService::new(SECRET, 3600, 7 * 24 * 60 * 60);

        let token = jwt
            .generate_token(42, "valid_user", true)
            .expect("token must encode");
        let claims = jwt.verify_token(&token).expect("token must verify");

        let min_exp = Utc::now().timestamp() + 6 * 24 * 60 * 60;
        assert!(claims.exp > min_exp);
    }
}
