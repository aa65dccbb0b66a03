use chrono::{Duration, Utc};
use jsonwebtoken::{decode, encode, DecodingKey, EncodingKey, Header, TokenData, Validation};
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use uuid::Uuid;

use crate::config::Config;
use crate::error::{AppError, AppResult};

#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct Claims {
    pub sub: Uuid,
    pub email: String,
    pub exp: i64,
    pub iat: i64,
    pub token_type: TokenType,
    #[serde(default)]
    pub jti: Option<Uuid>,
}

#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum TokenType {
    Access,
    Refresh,
}

#[derive(Debug, Serialize)]
pub struct TokenPair {
    pub access_token: String,
    pub refresh_token: String,
    pub expires_in: i64,
}

fn sign(user_id: Uuid, email: &str, ttl_secs: i64, token_type: TokenType, config: &Config) -> AppResult<String> {
    let now = Utc::now();
    let claims = Claims {
        sub: user_id,
        email: email.to_string(),
        exp: (now + Duration::seconds(ttl_secs)).timestamp(),
        iat: now.timestamp(),
        token_type,
        // Refresh tokens get a unique id so two issued in the same second
        // never collide in the token store.
        jti: match token_type {
            TokenType::Access => None,
            TokenType::Refresh => Some(Uuid::new_v4()),
        },
    };

    encode(
        &Header::default(),
        &claims,
        &EncodingKey::from_secret(config.jwt_secret.as_bytes()),
    )
    .map_err(|e| AppError::Internal(anyhow::anyhow!("Failed to sign token: {}", e)))
}

pub fn create_token_pair(user_id: Uuid, email: &str, config: &Config) -> AppResult<TokenPair> {
    let access_token = sign(
        user_id,
        email,
        config.jwt_access_ttl_secs,
        TokenType::Access,
        config,
    )?;
    let refresh_token = sign(
        user_id,
        email,
        config.jwt_refresh_ttl_secs,
        TokenType::Refresh,
        config,
    )?;

    Ok(TokenPair {
        access_token,
        refresh_token,
        expires_in: config.jwt_access_ttl_secs,
    })
}

/// SHA-256 of a raw token, lowercase hex. Raw refresh and confirmation
/// tokens are never stored.
pub fn hash_token(raw_token: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(raw_token.as_bytes());
    format!("{:x}", hasher.finalize())
}

pub fn verify_token(token: &str, config: &Config) -> AppResult<TokenData<Claims>> {
    let mut validation = Validation::default();
    validation.validate_exp = true;

    decode::<Claims>(
        token,
        &DecodingKey::from_secret(config.jwt_secret.as_bytes()),
        &validation,
    )
    .map_err(|_| AppError::Unauthorized)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn hash_token_is_deterministic() {
        let h1 = hash_token("some-refresh-token");
        let h2 = hash_token("some-refresh-token");
        assert_eq!(h1, h2);
        assert_eq!(h1.len(), 64);
    }

    #[test]
    fn hash_token_separates_inputs() {
        assert_ne!(hash_token("token-a"), hash_token("token-b"));
    }

    #[test]
    fn token_pair_round_trips() {
        let config = Config {
            database_url: String::new(),
            host: "127.0.0.1".into(),
            port: 0,
            frontend_url: String::new(),
            jwt_secret: "test-secret".into(),
            jwt_access_ttl_secs: 900,
            jwt_refresh_ttl_secs: 3600,
        };
        let user_id = Uuid::new_v4();

        let pair = create_token_pair(user_id, "a@b.test", &config).unwrap();
        let access = verify_token(&pair.access_token, &config).unwrap();
        let refresh = verify_token(&pair.refresh_token, &config).unwrap();

        assert_eq!(access.claims.sub, user_id);
        assert_eq!(access.claims.token_type, TokenType::Access);
        assert!(access.claims.jti.is_none());
        assert_eq!(refresh.claims.token_type, TokenType::Refresh);
        assert!(refresh.claims.jti.is_some());
    }
}
