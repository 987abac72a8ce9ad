//! JWT token service implementation.

use chrono::{TimeDelta, Utc};
use jsonwebtoken::{DecodingKey, EncodingKey, Header, Validation, decode, encode};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use quill_core::domain::Role;
use quill_core::ports::{AuthError, TokenClaims, TokenService};

/// JWT token service configuration.
#[derive(Debug, Clone)]
pub struct JwtConfig {
    pub secret: String,
    pub expiration_days: i64,
}

impl Default for JwtConfig {
    fn default() -> Self {
        Self {
            secret: "change-me-in-production".to_string(),
            expiration_days: 7,
        }
    }
}

impl JwtConfig {
    pub fn from_env() -> Self {
        let secret =
            std::env::var("JWT_SECRET").unwrap_or_else(|_| "change-me-in-production".to_string());

        if secret == "change-me-in-production" {
            let is_production = std::env::var("RUST_ENV")
                .map(|v| v == "production" || v == "prod")
                .unwrap_or(false);

            if is_production {
                tracing::error!(
                    "SECURITY: Using default JWT secret in production! Set JWT_SECRET environment variable."
                );
            } else {
                tracing::warn!("Using default JWT secret. Set JWT_SECRET for production use.");
            }
        }

        Self {
            secret,
            expiration_days: std::env::var("JWT_EXPIRE_DAYS")
                .ok()
                .and_then(|s| s.parse().ok())
                .unwrap_or(7),
        }
    }
}

/// Internal JWT claims structure for serialization.
///
/// Identity is written under `id`; tokens minted by older deployments carry
/// it under `userId` instead, and both are accepted on verification.
#[derive(Debug, Serialize, Deserialize)]
struct Claims {
    #[serde(skip_serializing_if = "Option::is_none")]
    id: Option<String>,
    #[serde(rename = "userId", skip_serializing_if = "Option::is_none")]
    user_id: Option<String>,
    role: String,
    exp: i64,
    iat: i64,
}

/// JWT-based token service.
pub struct JwtTokenService {
    encoding_key: EncodingKey,
    decoding_key: DecodingKey,
    config: JwtConfig,
}

impl JwtTokenService {
    pub fn new(config: JwtConfig) -> Self {
        let encoding_key = EncodingKey::from_secret(config.secret.as_bytes());
        let decoding_key = DecodingKey::from_secret(config.secret.as_bytes());

        Self {
            encoding_key,
            decoding_key,
            config,
        }
    }

    pub fn from_env() -> Self {
        Self::new(JwtConfig::from_env())
    }
}

impl TokenService for JwtTokenService {
    fn issue(&self, user_id: Uuid, role: Role) -> Result<String, AuthError> {
        let now = Utc::now();
        let exp = now + TimeDelta::days(self.config.expiration_days);

        let claims = Claims {
            id: Some(user_id.to_string()),
            user_id: None,
            role: role.as_str().to_string(),
            exp: exp.timestamp(),
            iat: now.timestamp(),
        };

        encode(&Header::default(), &claims, &self.encoding_key)
            .map_err(|e| AuthError::InvalidToken(e.to_string()))
    }

    fn verify(&self, token: &str) -> Result<TokenClaims, AuthError> {
        let mut validation = Validation::default();
        validation.leeway = 0;

        let token_data =
            decode::<Claims>(token, &self.decoding_key, &validation).map_err(|e| match e.kind() {
                jsonwebtoken::errors::ErrorKind::ExpiredSignature => AuthError::Expired,
                _ => AuthError::InvalidToken(e.to_string()),
            })?;

        let claims = token_data.claims;
        let subject = claims
            .id
            .or(claims.user_id)
            .ok_or_else(|| AuthError::InvalidToken("Invalid token format".to_string()))?;
        let user_id =
            Uuid::parse_str(&subject).map_err(|e| AuthError::InvalidToken(e.to_string()))?;
        let role = claims.role.parse().unwrap_or(Role::User);

        Ok(TokenClaims {
            user_id,
            role,
            iat: claims.iat,
            exp: claims.exp,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn test_config() -> JwtConfig {
        JwtConfig {
            secret: "test-secret-key".to_string(),
            expiration_days: 1,
        }
    }

    #[test]
    fn issue_and_verify_round_trip() {
        let service = JwtTokenService::new(test_config());
        let user_id = Uuid::new_v4();

        let token = service.issue(user_id, Role::Admin).unwrap();
        let claims = service.verify(&token).unwrap();

        assert_eq!(claims.user_id, user_id);
        assert_eq!(claims.role, Role::Admin);
        assert!(claims.exp > Utc::now().timestamp());
    }

    #[test]
    fn verify_rejects_garbage() {
        let service = JwtTokenService::new(test_config());

        let result = service.verify("invalid-token");

        assert!(matches!(result, Err(AuthError::InvalidToken(_))));
    }

    #[test]
    fn verify_rejects_wrong_secret() {
        let issuer = JwtTokenService::new(test_config());
        let verifier = JwtTokenService::new(JwtConfig {
            secret: "another-secret".to_string(),
            expiration_days: 1,
        });

        let token = issuer.issue(Uuid::new_v4(), Role::User).unwrap();

        assert!(verifier.verify(&token).is_err());
    }

    #[test]
    fn expired_token_fails_with_expired_even_when_signed() {
        let service = JwtTokenService::new(JwtConfig {
            secret: "test-secret-key".to_string(),
            expiration_days: -1,
        });

        let token = service.issue(Uuid::new_v4(), Role::User).unwrap();
        let result = service.verify(&token);

        assert!(matches!(result, Err(AuthError::Expired)));
    }

    #[test]
    fn legacy_user_id_claim_is_accepted() {
        let config = test_config();
        let service = JwtTokenService::new(config.clone());
        let user_id = Uuid::new_v4();

        #[derive(Serialize)]
        struct LegacyClaims {
            #[serde(rename = "userId")]
            user_id: String,
            role: String,
            exp: i64,
            iat: i64,
        }

        let now = Utc::now().timestamp();
        let legacy = LegacyClaims {
            user_id: user_id.to_string(),
            role: "user".to_string(),
            exp: now + 3600,
            iat: now,
        };
        let token = encode(
            &Header::default(),
            &legacy,
            &EncodingKey::from_secret(config.secret.as_bytes()),
        )
        .unwrap();

        let claims = service.verify(&token).unwrap();
        assert_eq!(claims.user_id, user_id);
        assert_eq!(claims.role, Role::User);
    }
}
