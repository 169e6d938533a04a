use mongodb::error::Result;
use mongodb::options::ClientOptions;
use rocket_db_pools::mongodb::Client;

use crate::config::app_config::AppConfig;

pub async fn setup_mongo(config: &AppConfig) -> Result<Client> {
    let mut client_options = ClientOptions::parse(&config.mongo_uri).await?;
    client_options.app_name = Some("scrapcraft-api".to_string());
    let client = Client::with_options(client_options)?;
    tracing::info!(database = %config.mongo_database, "MongoDB client configured");
    Ok(client)
}
