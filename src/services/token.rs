//! Stateless access-token issuance. Tokens are HS256-signed and short proof
//! of login only; the persisted session is what actually gates requests.

use chrono::{Duration, Utc};
use jsonwebtoken::{decode, encode, Algorithm, DecodingKey, EncodingKey, Header, Validation};
use secrecy::ExposeSecret;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::config::AuthConfig;
use crate::models::UserRole;

#[derive(Clone)]
pub struct TokenService {
    encoding_key: EncodingKey,
    decoding_key: DecodingKey,
    ttl_minutes: i64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AccessTokenClaims {
    /// Subject (phone number)
    pub sub: String,
    pub role: UserRole,
    /// Expiration time (Unix timestamp)
    pub exp: i64,
    /// Issued at (Unix timestamp)
    pub iat: i64,
    /// Token ID, unique per issued token
    pub jti: String,
}

impl TokenService {
    pub fn new(config: &AuthConfig) -> Self {
        let secret = config.jwt_secret.expose_secret().as_bytes();
        Self {
            encoding_key: EncodingKey::from_secret(secret),
            decoding_key: DecodingKey::from_secret(secret),
            ttl_minutes: config.session_ttl_minutes,
        }
    }

    pub fn generate(&self, phone: &str, role: UserRole) -> Result<String, anyhow::Error> {
        let now = Utc::now();
        let claims = AccessTokenClaims {
            sub: phone.to_string(),
            role,
            exp: (now + Duration::minutes(self.ttl_minutes)).timestamp(),
            iat: now.timestamp(),
            jti: Uuid::new_v4().to_string(),
        };

        let token = encode(&Header::new(Algorithm::HS256), &claims, &self.encoding_key)
            .map_err(|e| anyhow::anyhow!("Failed to encode access token: {}", e))?;

        Ok(token)
    }

    pub fn verify(&self, token: &str) -> Result<AccessTokenClaims, anyhow::Error> {
        let mut validation = Validation::new(Algorithm::HS256);
        validation.validate_exp = true;

        let data = decode::<AccessTokenClaims>(token, &self.decoding_key, &validation)
            .map_err(|e| anyhow::anyhow!("Invalid access token: {}", e))?;

        Ok(data.claims)
    }

    pub fn ttl_minutes(&self) -> i64 {
        self.ttl_minutes
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use secrecy::Secret;

    fn test_config(ttl_minutes: i64) -> AuthConfig {
        AuthConfig {
            jwt_secret: Secret::new("test-secret-key-for-unit-tests".to_string()),
            session_ttl_minutes: ttl_minutes,
            session_retention_days: 30,
        }
    }

    #[test]
    fn token_round_trip() {
        let service = TokenService::new(&test_config(720));

        let token = service.generate("0501234567", UserRole::Cashier).unwrap();
        assert!(!token.is_empty());

        let claims = service.verify(&token).unwrap();
        assert_eq!(claims.sub, "0501234567");
        assert_eq!(claims.role, UserRole::Cashier);
        assert!(claims.exp > claims.iat);
    }

    #[test]
    fn tokens_carry_unique_ids() {
        let service = TokenService::new(&test_config(720));
        let a = service.verify(&service.generate("1", UserRole::Admin).unwrap()).unwrap();
        let b = service.verify(&service.generate("1", UserRole::Admin).unwrap()).unwrap();
        assert_ne!(a.jti, b.jti);
    }

    #[test]
    fn tampered_token_is_rejected() {
        let service = TokenService::new(&test_config(720));
        let other = TokenService::new(&AuthConfig {
            jwt_secret: Secret::new("a-different-secret-entirely".to_string()),
            session_ttl_minutes: 720,
            session_retention_days: 30,
        });

        let token = service.generate("0501234567", UserRole::Customer).unwrap();
        assert!(other.verify(&token).is_err());
        assert!(service.verify("not.a.token").is_err());
    }
}
