//! Persistence seams.
//!
//! Services only see the store traits below. The MongoDB repositories
//! implement them for production; uniqueness of seller identity fields is
//! enforced by unique indexes and surfaces as `RepositoryError::Duplicate`.

pub mod order_repository;
pub mod product_repository;
pub mod seller_repository;
pub mod user_repository;

use mongodb::bson::oid::ObjectId;
use mongodb::bson::DateTime;
use mongodb::error::{Error as MongoError, ErrorKind, WriteFailure};
use thiserror::Error;

use crate::models::order::Order;
use crate::models::product::{Product, ProductType};
use crate::models::seller::{Seller, SellerChanges};

const DUPLICATE_KEY: i32 = 11000;

#[derive(Debug, Error)]
pub enum RepositoryError {
    /// A unique index rejected the write; carries the offending field.
    #[error("duplicate value for unique field `{0}`")]
    Duplicate(String),

    #[error("database error: {0}")]
    Database(#[source] MongoError),
}

pub type Result<T> = std::result::Result<T, RepositoryError>;

impl From<MongoError> for RepositoryError {
    fn from(err: MongoError) -> Self {
        let message = match err.kind.as_ref() {
            ErrorKind::Write(WriteFailure::WriteError(write)) if write.code == DUPLICATE_KEY => {
                Some(write.message.clone())
            }
            ErrorKind::Command(command) if command.code == DUPLICATE_KEY => {
                Some(command.message.clone())
            }
            _ => None,
        };
        match message {
            Some(message) => Self::Duplicate(
                duplicate_key_field(&message).unwrap_or_else(|| "unknown".to_string()),
            ),
            None => Self::Database(err),
        }
    }
}

/// Pulls the field name out of a server duplicate-key message such as
/// `E11000 duplicate key error collection: db.sellers index: username_1 dup key: { username: "alice" }`.
pub fn duplicate_key_field(message: &str) -> Option<String> {
    if let Some((_, rest)) = message.split_once("index: ") {
        let index = rest.split_whitespace().next()?;
        let field = match index.rsplit_once('_') {
            Some((field, direction)) if direction.parse::<i32>().is_ok() => field,
            _ => index,
        };
        if !field.is_empty() {
            return Some(field.to_string());
        }
    }
    let (_, rest) = message.split_once("dup key: {")?;
    let field = rest.trim_start().split(':').next()?.trim();
    (!field.is_empty()).then(|| field.to_string())
}

#[rocket::async_trait]
pub trait SellerStore: Send + Sync {
    /// Any seller owned by `user_id` or registered under `email`.
    async fn find_by_user_or_email(&self, user_id: ObjectId, email: &str) -> Result<Option<Seller>>;
    async fn find_by_user_id(&self, user_id: ObjectId) -> Result<Option<Seller>>;
    async fn find_by_email(&self, email: &str) -> Result<Option<Seller>>;
    async fn find_by_username(&self, username: &str) -> Result<Option<Seller>>;
    async fn find_by_id(&self, id: ObjectId) -> Result<Option<Seller>>;
    async fn find_by_ids(&self, ids: &[ObjectId]) -> Result<Vec<Seller>>;
    async fn insert(&self, seller: &Seller) -> Result<()>;
    /// Applies `changes` to the seller with this account email and returns
    /// the stored document after the update.
    async fn update_by_email(
        &self,
        email: &str,
        changes: &SellerChanges,
        now: DateTime,
    ) -> Result<Option<Seller>>;
}

#[rocket::async_trait]
pub trait ProductStore: Send + Sync {
    async fn insert(&self, product: &Product) -> Result<()>;
    async fn find_by_id(&self, id: ObjectId) -> Result<Option<Product>>;
    /// Newest first, optionally restricted to one `productType` value.
    async fn find_recent(&self, product_type: Option<&str>, limit: i64) -> Result<Vec<Product>>;
    /// Compares against the stored `productType` string verbatim.
    async fn find_by_type(&self, product_type: &str) -> Result<Vec<Product>>;
    async fn find_by_owner(&self, owner: ObjectId, product_type: ProductType) -> Result<Vec<Product>>;
    /// Overwrites the mutable fields of an existing listing.
    async fn save(&self, product: &Product) -> Result<()>;
    async fn delete(&self, id: ObjectId) -> Result<bool>;
}

#[rocket::async_trait]
pub trait UserStore: Send + Sync {
    async fn set_role(&self, user_id: ObjectId, role: &str) -> Result<()>;
}

#[rocket::async_trait]
pub trait OrderStore: Send + Sync {
    async fn insert(&self, order: &Order) -> Result<()>;
}
