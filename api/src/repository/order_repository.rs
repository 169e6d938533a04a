use mongodb::{Client, Collection};

use crate::models::order::Order;
use crate::repository::{OrderStore, Result};

pub struct OrderRepository {
    collection: Collection<Order>,
}

impl OrderRepository {
    pub fn new(client: &Client, database: &str) -> Self {
        let collection = client.database(database).collection::<Order>("orders");
        OrderRepository { collection }
    }
}

#[rocket::async_trait]
impl OrderStore for OrderRepository {
    async fn insert(&self, order: &Order) -> Result<()> {
        self.collection.insert_one(order, None).await?;
        Ok(())
    }
}
