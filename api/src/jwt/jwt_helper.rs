use jsonwebtoken::errors::Result as JwtResult;
use jsonwebtoken::{decode, Algorithm, DecodingKey, Validation};

use crate::jwt::claims::Claims;

/// HS256 keys derived from the shared `JWT_SECRET`.
pub struct JwtKeys {
    secret: Vec<u8>,
}

impl JwtKeys {
    pub fn from_secret(secret: &str) -> Self {
        JwtKeys {
            secret: secret.as_bytes().to_vec(),
        }
    }

    /// Checks signature and expiry.
    pub fn verify_token(&self, token: &str) -> JwtResult<Claims> {
        decode::<Claims>(
            token,
            &DecodingKey::from_secret(&self.secret),
            &Validation::new(Algorithm::HS256),
        )
        .map(|data| data.claims)
    }

    #[cfg(test)]
    pub fn create_token(&self, user_id: &str, email: &str, ttl_secs: i64) -> JwtResult<String> {
        use jsonwebtoken::{encode, EncodingKey, Header};

        let claims = Claims {
            sub: user_id.to_string(),
            email: email.to_string(),
            exp: (chrono::Utc::now().timestamp() + ttl_secs) as usize,
        };
        encode(&Header::default(), &claims, &EncodingKey::from_secret(&self.secret))
    }
}
