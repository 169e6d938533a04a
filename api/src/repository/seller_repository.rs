use futures::stream::TryStreamExt;
use mongodb::bson::oid::ObjectId;
use mongodb::bson::{doc, DateTime, Document};
use mongodb::error::Error as MongoError;
use mongodb::options::{FindOneAndUpdateOptions, IndexOptions, ReturnDocument};
use mongodb::{Client, Collection, IndexModel};

use crate::models::seller::{Seller, SellerChanges};
use crate::repository::{Result, SellerStore};

pub struct SellerRepository {
    collection: Collection<Seller>,
}

impl SellerRepository {
    pub fn new(client: &Client, database: &str) -> Self {
        let collection = client.database(database).collection::<Seller>("sellers");
        SellerRepository { collection }
    }

    /// Unique indexes are the only guard against two concurrent profile
    /// creations for the same user, email or username.
    pub async fn ensure_indexes(&self) -> Result<()> {
        let indexes = ["userId", "accountEmail", "username"].map(|field| {
            let mut keys = Document::new();
            keys.insert(field, 1);
            IndexModel::builder()
                .keys(keys)
                .options(IndexOptions::builder().unique(true).build())
                .build()
        });
        self.collection.create_indexes(indexes, None).await?;
        tracing::info!("seller unique indexes ensured");
        Ok(())
    }

    async fn find_one(&self, filter: Document) -> Result<Option<Seller>> {
        Ok(self.collection.find_one(filter, None).await?)
    }
}

#[rocket::async_trait]
impl SellerStore for SellerRepository {
    async fn find_by_user_or_email(&self, user_id: ObjectId, email: &str) -> Result<Option<Seller>> {
        self.find_one(doc! { "$or": [{ "userId": user_id }, { "accountEmail": email }] })
            .await
    }

    async fn find_by_user_id(&self, user_id: ObjectId) -> Result<Option<Seller>> {
        self.find_one(doc! { "userId": user_id }).await
    }

    async fn find_by_email(&self, email: &str) -> Result<Option<Seller>> {
        self.find_one(doc! { "accountEmail": email }).await
    }

    async fn find_by_username(&self, username: &str) -> Result<Option<Seller>> {
        self.find_one(doc! { "username": username }).await
    }

    async fn find_by_id(&self, id: ObjectId) -> Result<Option<Seller>> {
        self.find_one(doc! { "_id": id }).await
    }

    async fn find_by_ids(&self, ids: &[ObjectId]) -> Result<Vec<Seller>> {
        if ids.is_empty() {
            return Ok(Vec::new());
        }
        let cursor = self.collection.find(doc! { "_id": { "$in": ids.to_vec() } }, None).await?;
        Ok(cursor.try_collect().await?)
    }

    async fn insert(&self, seller: &Seller) -> Result<()> {
        self.collection.insert_one(seller, None).await?;
        Ok(())
    }

    async fn update_by_email(
        &self,
        email: &str,
        changes: &SellerChanges,
        now: DateTime,
    ) -> Result<Option<Seller>> {
        let options = FindOneAndUpdateOptions::builder()
            .return_document(ReturnDocument::After)
            .build();
        let set = changes.to_set_document(now).map_err(MongoError::from)?;
        let update = doc! { "$set": set };
        Ok(self
            .collection
            .find_one_and_update(doc! { "accountEmail": email }, update, options)
            .await?)
    }
}
