use rocket::serde::json::Json;
use rocket::{get, routes, Route, State};
use serde::Serialize;

use crate::error::MarketError;
use crate::services::inspiration::Inspiration;

#[derive(Serialize)]
pub struct ImageResults {
    images: Vec<String>,
}

#[get("/images?<query>")]
async fn search_images(
    query: Option<&str>,
    inspiration: &State<Inspiration>,
) -> Result<Json<ImageResults>, MarketError> {
    let images = inspiration.search_images(query.unwrap_or_default()).await?;
    Ok(Json(ImageResults { images }))
}

pub fn routes() -> Vec<Route> {
    routes![search_images]
}
