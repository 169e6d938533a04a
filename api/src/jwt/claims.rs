use serde::{Deserialize, Serialize};

/// Token payload issued by the auth service.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Claims {
    /// Owning user id as an ObjectId hex string.
    pub sub: String,
    pub email: String,
    pub exp: usize,
}
