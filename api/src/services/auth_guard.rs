use mongodb::bson::oid::ObjectId;
use rocket::http::Status;
use rocket::request::{FromRequest, Outcome};
use rocket::Request;
use thiserror::Error;

use crate::jwt::jwt_helper::JwtKeys;

/// Authenticated caller, trusted once the bearer token verifies.
#[derive(Debug, Clone, PartialEq)]
pub struct Principal {
    pub user_id: ObjectId,
    pub email: String,
}

#[derive(Debug, Error)]
pub enum AuthError {
    #[error("missing bearer token")]
    Missing,
    #[error("invalid token: {0}")]
    Invalid(String),
    #[error("token keys are not configured")]
    NotConfigured,
}

fn bearer_token<'a>(request: &'a Request<'_>) -> Option<&'a str> {
    request
        .headers()
        .get_one("Authorization")
        .and_then(|value| value.strip_prefix("Bearer "))
        .map(str::trim)
        .filter(|token| !token.is_empty())
}

#[rocket::async_trait]
impl<'r> FromRequest<'r> for Principal {
    type Error = AuthError;

    async fn from_request(request: &'r Request<'_>) -> Outcome<Self, Self::Error> {
        let Some(keys) = request.rocket().state::<JwtKeys>() else {
            return Outcome::Error((Status::InternalServerError, AuthError::NotConfigured));
        };
        let Some(token) = bearer_token(request) else {
            return Outcome::Error((Status::Unauthorized, AuthError::Missing));
        };
        let claims = match keys.verify_token(token) {
            Ok(claims) => claims,
            Err(err) => {
                tracing::debug!(error = %err, "bearer token rejected");
                return Outcome::Error((Status::Unauthorized, AuthError::Invalid(err.to_string())));
            }
        };
        match ObjectId::parse_str(&claims.sub) {
            Ok(user_id) => Outcome::Success(Principal {
                user_id,
                email: claims.email,
            }),
            Err(_) => Outcome::Error((
                Status::Unauthorized,
                AuthError::Invalid(format!("subject `{}` is not a user id", claims.sub)),
            )),
        }
    }
}
