use mongodb::bson::oid::ObjectId;
use mongodb::bson::{doc, Document};
use mongodb::{Client, Collection};

use crate::repository::{Result, UserStore};

/// The `users` collection belongs to the auth service; this side only ever
/// flips the role of an existing account.
pub struct UserRepository {
    collection: Collection<Document>,
}

impl UserRepository {
    pub fn new(client: &Client, database: &str) -> Self {
        let collection = client.database(database).collection::<Document>("users");
        UserRepository { collection }
    }
}

#[rocket::async_trait]
impl UserStore for UserRepository {
    async fn set_role(&self, user_id: ObjectId, role: &str) -> Result<()> {
        let filter = doc! { "_id": user_id };
        let update = doc! { "$set": { "role": role } };
        let result = self.collection.update_one(filter, update, None).await?;
        if result.matched_count == 0 {
            tracing::warn!(user_id = %user_id, "no user document to promote");
        }
        Ok(())
    }
}
