use futures::stream::TryStreamExt;
use mongodb::bson::oid::ObjectId;
use mongodb::bson::{doc, to_document, Document};
use mongodb::error::Error as MongoError;
use mongodb::options::FindOptions;
use mongodb::{Client, Collection};

use crate::models::product::{Product, ProductType};
use crate::repository::{ProductStore, Result};

// Fields a listing edit may never touch.
const IMMUTABLE_FIELDS: [&str; 4] = ["_id", "uploadedBy", "createdAt", "productType"];

pub struct ProductRepository {
    collection: Collection<Product>,
}

impl ProductRepository {
    pub fn new(client: &Client, database: &str) -> Self {
        let collection = client.database(database).collection::<Product>("products");
        ProductRepository { collection }
    }

    async fn find_many(&self, filter: Document, options: Option<FindOptions>) -> Result<Vec<Product>> {
        let cursor = self.collection.find(filter, options).await?;
        Ok(cursor.try_collect().await?)
    }
}

#[rocket::async_trait]
impl ProductStore for ProductRepository {
    async fn insert(&self, product: &Product) -> Result<()> {
        self.collection.insert_one(product, None).await?;
        Ok(())
    }

    async fn find_by_id(&self, id: ObjectId) -> Result<Option<Product>> {
        Ok(self.collection.find_one(doc! { "_id": id }, None).await?)
    }

    async fn find_recent(&self, product_type: Option<&str>, limit: i64) -> Result<Vec<Product>> {
        let filter = match product_type {
            Some(product_type) => doc! { "productType": product_type },
            None => doc! {},
        };
        let options = FindOptions::builder()
            .sort(doc! { "createdAt": -1 })
            .limit(limit)
            .build();
        self.find_many(filter, Some(options)).await
    }

    async fn find_by_type(&self, product_type: &str) -> Result<Vec<Product>> {
        self.find_many(doc! { "productType": product_type }, None).await
    }

    async fn find_by_owner(&self, owner: ObjectId, product_type: ProductType) -> Result<Vec<Product>> {
        self.find_many(
            doc! { "productType": product_type.as_str(), "uploadedBy": owner },
            None,
        )
        .await
    }

    async fn save(&self, product: &Product) -> Result<()> {
        let mut set = to_document(product).map_err(MongoError::from)?;
        for field in IMMUTABLE_FIELDS {
            set.remove(field);
        }
        let mut update = doc! { "$set": set };
        if product.color.is_none() {
            update.insert("$unset", doc! { "color": "" });
        }
        self.collection
            .update_one(doc! { "_id": product.id }, update, None)
            .await?;
        Ok(())
    }

    async fn delete(&self, id: ObjectId) -> Result<bool> {
        let result = self.collection.delete_one(doc! { "_id": id }, None).await?;
        Ok(result.deleted_count > 0)
    }
}
