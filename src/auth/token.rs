use crate::config::Config;
use crate::error::AppError;
use jsonwebtoken::{decode, encode, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Represents the claims encoded within an access token.
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct Claims {
    /// Subject of the token: the user's e-mail.
    pub sub: String,
    /// Expiration timestamp (seconds since epoch).
    pub exp: usize,
    /// Issued-at timestamp (seconds since epoch).
    pub iat: usize,
    /// Unique token id, so that two tokens issued in the same second differ.
    pub jti: String,
}

/// Generates an access token for the user identified by `email`.
///
/// The token expires after `config.access_token_expire_minutes` and is signed
/// with `config.secret_key` using `config.algorithm`.
pub fn generate_token(email: &str, config: &Config) -> Result<String, AppError> {
    let now = chrono::Utc::now();
    let expiration = now
        .checked_add_signed(chrono::Duration::minutes(config.access_token_expire_minutes))
        .ok_or_else(|| AppError::InternalServerError("invalid token expiration".into()))?;

    let claims = Claims {
        sub: email.to_string(),
        exp: expiration.timestamp() as usize,
        iat: now.timestamp() as usize,
        jti: Uuid::new_v4().to_string(),
    };

    encode(
        &Header::new(config.algorithm),
        &claims,
        &EncodingKey::from_secret(config.secret_key.as_bytes()),
    )
    .map_err(|e| AppError::InternalServerError(format!("Failed to generate token: {}", e)))
}

/// Verifies a token's signature and expiration and decodes its claims.
///
/// Any failure is reported as `AppError::Unauthorized`.
pub fn verify_token(token: &str, config: &Config) -> Result<Claims, AppError> {
    let claims = decode::<Claims>(
        token,
        &DecodingKey::from_secret(config.secret_key.as_bytes()),
        &Validation::new(config.algorithm),
    )
    .map(|data| data.claims)?;

    if claims.sub.is_empty() {
        return Err(AppError::invalid_credentials());
    }
    Ok(claims)
}

#[cfg(test)]
mod tests {
    use super::*;
    use jsonwebtoken::Algorithm;

    fn test_config(secret: &str) -> Config {
        Config {
            database_url: "postgres://unused".into(),
            database_max_connections: 1,
            server_port: 8080,
            server_host: "127.0.0.1".into(),
            secret_key: secret.into(),
            algorithm: Algorithm::HS256,
            access_token_expire_minutes: 30,
        }
    }

    fn encode_claims(claims: &Claims, secret: &str) -> String {
        encode(
            &Header::default(),
            claims,
            &EncodingKey::from_secret(secret.as_bytes()),
        )
        .unwrap()
    }

    #[test]
    fn test_token_generation_and_verification() {
        let config = test_config("test_secret_for_gen_verify");
        let token = generate_token("tester@email.com", &config).unwrap();
        let claims = verify_token(&token, &config).unwrap();
        assert_eq!(claims.sub, "tester@email.com");
        assert!(claims.exp > claims.iat);
    }

    #[test]
    fn test_tokens_are_unique() {
        let config = test_config("test_secret");
        let first = generate_token("tester@email.com", &config).unwrap();
        let second = generate_token("tester@email.com", &config).unwrap();
        assert_ne!(first, second);
    }

    #[test]
    fn test_token_expiration() {
        let config = test_config("test_secret_for_expiration");
        let expired = chrono::Utc::now()
            .checked_sub_signed(chrono::Duration::hours(2))
            .unwrap()
            .timestamp() as usize;
        let claims = Claims {
            sub: "tester@email.com".into(),
            exp: expired,
            iat: expired - 60,
            jti: Uuid::new_v4().to_string(),
        };
        let token = encode_claims(&claims, "test_secret_for_expiration");

        match verify_token(&token, &config) {
            Err(AppError::Unauthorized(msg)) => assert_eq!(msg, "could not validate credentials"),
            other => panic!("expired token should be rejected, got {:?}", other),
        }
    }

    #[test]
    fn test_invalid_token_signature() {
        let token = generate_token("tester@email.com", &test_config("one_secret")).unwrap();
        let result = verify_token(&token, &test_config("a_completely_different_secret"));
        assert!(matches!(result, Err(AppError::Unauthorized(_))));
    }

    #[test]
    fn test_empty_subject_is_rejected() {
        let config = test_config("test_secret");
        let now = chrono::Utc::now().timestamp() as usize;
        let claims = Claims {
            sub: String::new(),
            exp: now + 600,
            iat: now,
            jti: Uuid::new_v4().to_string(),
        };
        let token = encode_claims(&claims, "test_secret");
        assert!(matches!(
            verify_token(&token, &config),
            Err(AppError::Unauthorized(_))
        ));
    }

    #[test]
    fn test_garbage_token() {
        let config = test_config("test_secret");
        assert!(verify_token("not-a-jwt", &config).is_err());
    }
}
