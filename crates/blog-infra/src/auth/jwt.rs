//! JWT session token service.

use chrono::{DateTime, TimeDelta, Utc};
use jsonwebtoken::{DecodingKey, EncodingKey, Header, Validation, decode, encode};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use blog_core::domain::User;
use blog_core::ports::{AuthError, ClaimsUpdate, IssuedToken, SessionClaims, TokenService};

const DEFAULT_SECRET: &str = "change-me-in-production";

/// JWT token service configuration.
#[derive(Debug, Clone)]
pub struct JwtConfig {
    pub secret: String,
    pub expiration_days: i64,
    pub issuer: String,
}

impl Default for JwtConfig {
    fn default() -> Self {
        Self {
            secret: DEFAULT_SECRET.to_string(),
            expiration_days: 30,
            issuer: "blog-api".to_string(),
        }
    }
}

impl JwtConfig {
    pub fn from_env() -> Self {
        let secret = std::env::var("JWT_SECRET").unwrap_or_else(|_| DEFAULT_SECRET.to_string());

        if secret == DEFAULT_SECRET {
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
            expiration_days: std::env::var("SESSION_MAX_AGE_DAYS")
                .ok()
                .and_then(|s| s.parse().ok())
                .unwrap_or(30),
            issuer: std::env::var("JWT_ISSUER").unwrap_or_else(|_| "blog-api".to_string()),
        }
    }
}

/// Wire format of the session token.
#[derive(Debug, Serialize, Deserialize)]
struct Claims {
    sub: String,
    email: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    username: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    image: Option<String>,
    iat: i64,
    exp: i64,
    iss: String,
}

/// HS256 session tokens.
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

    fn sign(&self, claims: &SessionClaims) -> Result<IssuedToken, AuthError> {
        let wire = Claims {
            sub: claims.user_id.to_string(),
            email: claims.email.clone(),
            username: claims.username.clone(),
            name: claims.name.clone(),
            image: claims.image.clone(),
            iat: claims.issued_at.timestamp(),
            exp: claims.expires_at.timestamp(),
            iss: self.config.issuer.clone(),
        };

        let token = encode(&Header::default(), &wire, &self.encoding_key)
            .map_err(|e| AuthError::Signing(e.to_string()))?;

        Ok(IssuedToken {
            token,
            expires_at: claims.expires_at,
        })
    }
}

fn timestamp(seconds: i64, claim: &str) -> Result<DateTime<Utc>, AuthError> {
    DateTime::from_timestamp(seconds, 0)
        .ok_or_else(|| AuthError::InvalidToken(format!("{} out of range", claim)))
}

impl TokenService for JwtTokenService {
    fn issue(&self, user: &User) -> Result<IssuedToken, AuthError> {
        // Whole seconds, so the issued expiry equals the one read back.
        let now = timestamp(Utc::now().timestamp(), "iat")?;
        let exp = now + TimeDelta::days(self.config.expiration_days);

        self.sign(&SessionClaims {
            user_id: user.id,
            email: user.email.clone(),
            username: user.username.clone(),
            name: user.name.clone(),
            image: user.image.clone(),
            issued_at: now,
            expires_at: exp,
        })
    }

    fn verify(&self, token: &str) -> Result<SessionClaims, AuthError> {
        let mut validation = Validation::default();
        validation.set_issuer(&[&self.config.issuer]);

        let token_data = decode::<Claims>(token, &self.decoding_key, &validation).map_err(|e| {
            match e.kind() {
                jsonwebtoken::errors::ErrorKind::ExpiredSignature => AuthError::TokenExpired,
                _ => AuthError::InvalidToken(e.to_string()),
            }
        })?;
        let claims = token_data.claims;

        let user_id =
            Uuid::parse_str(&claims.sub).map_err(|e| AuthError::InvalidToken(e.to_string()))?;
        let issued_at = timestamp(claims.iat, "iat")?;
        let expires_at = timestamp(claims.exp, "exp")?;

        Ok(SessionClaims {
            user_id,
            email: claims.email,
            username: claims.username,
            name: claims.name,
            image: claims.image,
            issued_at,
            expires_at,
        })
    }

    fn merge_claims(&self, token: &str, update: ClaimsUpdate) -> Result<IssuedToken, AuthError> {
        let mut claims = self.verify(token)?;
        claims.merge(update);
        self.sign(&claims)
    }

    fn max_age_seconds(&self) -> i64 {
        self.config.expiration_days * 86_400
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn test_config() -> JwtConfig {
        JwtConfig {
            secret: "test-secret-key".to_string(),
            expiration_days: 1,
            issuer: "test-issuer".to_string(),
        }
    }

    fn alice() -> User {
        User::new(
            "alice@example.com".to_string(),
            Some("alice".to_string()),
            None,
        )
    }

    #[test]
    fn test_issue_and_verify() {
        let service = JwtTokenService::new(test_config());
        let user = alice();

        let issued = service.issue(&user).unwrap();
        assert!(!issued.token.is_empty());

        let claims = service.verify(&issued.token).unwrap();
        assert_eq!(claims.user_id, user.id);
        assert_eq!(claims.email, "alice@example.com");
        assert_eq!(claims.username.as_deref(), Some("alice"));
        assert_eq!(claims.name, None);
        assert_eq!((claims.expires_at - claims.issued_at).num_seconds(), 86_400);
        assert_eq!(claims.expires_at, issued.expires_at);
    }

    #[test]
    fn test_verify_invalid_token() {
        let service = JwtTokenService::new(test_config());

        let result = service.verify("invalid-token");

        assert!(matches!(result, Err(AuthError::InvalidToken(_))));
    }

    #[test]
    fn test_verify_expired_token() {
        let service = JwtTokenService::new(JwtConfig {
            expiration_days: -1,
            ..test_config()
        });

        let issued = service.issue(&alice()).unwrap();

        assert!(matches!(
            service.verify(&issued.token),
            Err(AuthError::TokenExpired)
        ));
    }

    #[test]
    fn test_verify_wrong_issuer_token() {
        let service1 = JwtTokenService::new(JwtConfig {
            issuer: "issuer1".to_string(),
            ..test_config()
        });
        let service2 = JwtTokenService::new(JwtConfig {
            issuer: "issuer2".to_string(),
            ..test_config()
        });

        let issued = service1.issue(&alice()).unwrap();

        assert!(service2.verify(&issued.token).is_err());
    }

    #[test]
    fn test_verify_wrong_secret_token() {
        let other = JwtTokenService::new(JwtConfig {
            secret: "another-secret".to_string(),
            ..test_config()
        });
        let issued = other.issue(&alice()).unwrap();

        let result = JwtTokenService::new(test_config()).verify(&issued.token);
        assert!(matches!(result, Err(AuthError::InvalidToken(_))));
    }

    #[test]
    fn test_merge_keeps_subject_and_expiry() {
        let service = JwtTokenService::new(test_config());
        let user = alice();
        let issued = service.issue(&user).unwrap();
        let before = service.verify(&issued.token).unwrap();

        let merged = service
            .merge_claims(
                &issued.token,
                ClaimsUpdate {
                    name: Some(Some("Alice".to_string())),
                    ..Default::default()
                },
            )
            .unwrap();
        let after = service.verify(&merged.token).unwrap();

        assert_eq!(after.name.as_deref(), Some("Alice"));
        assert_eq!(after.user_id, before.user_id);
        assert_eq!(after.issued_at, before.issued_at);
        assert_eq!(after.expires_at, before.expires_at);
        assert_eq!(after.username, before.username);
    }

    #[test]
    fn test_verify_rejects_out_of_range_expiry() {
        let config = test_config();
        let wire = Claims {
            sub: Uuid::new_v4().to_string(),
            email: "alice@example.com".to_string(),
            username: None,
            name: None,
            image: None,
            iat: Utc::now().timestamp(),
            exp: i64::MAX,
            iss: config.issuer.clone(),
        };
        let token = encode(
            &Header::default(),
            &wire,
            &EncodingKey::from_secret(config.secret.as_bytes()),
        )
        .unwrap();

        let result = JwtTokenService::new(config).verify(&token);

        assert!(matches!(result, Err(AuthError::InvalidToken(_))));
    }

    #[test]
    fn test_merge_clears_username() {
        let service = JwtTokenService::new(test_config());
        let issued = service.issue(&alice()).unwrap();

        let merged = service
            .merge_claims(
                &issued.token,
                ClaimsUpdate {
                    username: Some(None),
                    ..Default::default()
                },
            )
            .unwrap();

        assert_eq!(service.verify(&merged.token).unwrap().username, None);
    }

    #[test]
    fn test_merge_rejects_invalid_token() {
        let service = JwtTokenService::new(test_config());
        let result = service.merge_claims("garbage", ClaimsUpdate::default());
        assert!(result.is_err());
    }

    #[test]
    fn test_max_age_seconds() {
        let service = JwtTokenService::new(JwtConfig {
            expiration_days: 30,
            ..test_config()
        });

        assert_eq!(service.max_age_seconds(), 30 * 86_400);
    }
}
