use crate::core::errors::SpendlyError;
use chrono::{Duration, Utc};
use jsonwebtoken::{DecodingKey, EncodingKey, Header, Validation, decode, encode};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum TokenType {
    Access,
    Refresh,
}

#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct Claims {
    pub sub: String, // User ID
    pub token_type: TokenType,
    pub jti: String,
    pub iat: usize,
    pub exp: usize,
}

pub struct JwtService {
    secret: String,
    access_ttl: Duration,
    refresh_ttl: Duration,
}

impl JwtService {
    pub fn new(secret: String, access_ttl: Duration, refresh_ttl: Duration) -> Self {
        JwtService {
            secret,
            access_ttl,
            refresh_ttl,
        }
    }

    pub fn generate_token(&self, user_id: &str, token_type: TokenType) -> Result<(String, Claims), SpendlyError> {
        let now = Utc::now();
        let ttl = match token_type {
            TokenType::Access => self.access_ttl,
            TokenType::Refresh => self.refresh_ttl,
        };
        let expires_at = now
            .checked_add_signed(ttl)
            .ok_or_else(|| SpendlyError::InternalServerError(format!("token lifetime {} is out of range", ttl)))?;
        let claims = Claims {
            sub: user_id.to_string(),
            token_type,
            jti: Uuid::new_v4().to_string(),
            iat: now.timestamp().max(0) as usize,
            exp: expires_at.timestamp().max(0) as usize,
        };

        let token = encode(
            &Header::default(),
            &claims,
            &EncodingKey::from_secret(self.secret.as_bytes()),
        )
        .map_err(|e| SpendlyError::InternalServerError(format!("JWT encoding error: {}", e)))?;
        Ok((token, claims))
    }

    /// Decodes `token` and checks that it is of the `expected` kind.
    pub fn validate_token(&self, token: &str, expected: TokenType) -> Result<Claims, SpendlyError> {
        let mut validation = Validation::default();
        validation.leeway = 0;
        let token_data = decode::<Claims>(
            token,
            &DecodingKey::from_secret(self.secret.as_bytes()),
            &validation,
        )
        .map_err(|e| SpendlyError::Unauthenticated(format!("Invalid token: {}", e)))?;

        if token_data.claims.token_type != expected {
            return Err(SpendlyError::Unauthenticated("Wrong token type".to_string()));
        }
        Ok(token_data.claims)
    }
}
