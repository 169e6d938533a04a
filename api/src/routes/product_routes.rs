use rocket::form::{Form, FromForm};
use rocket::fs::TempFile;
use rocket::http::Status;
use rocket::serde::json::Json;
use rocket::{delete, get, post, put, routes, Route, State};

use crate::error::{ApiResponse, MarketError};
use crate::models::product::{ProductInput, ProductSummary, ProductType, ProductView};
use crate::services::auth_guard::Principal;
use crate::services::catalog::{Catalog, RECENT_LIMIT};
use crate::services::identity::IdentityResolver;
use crate::services::input::flatten_list;
use crate::services::upload::UploadStore;

#[derive(FromForm)]
pub struct ProductForm<'r> {
    name: Option<String>,
    price: Option<String>,
    description: Option<String>,
    category: Option<String>,
    #[field(name = "productType")]
    product_type: Option<String>,
    dimensions: Option<String>,
    quantity: Option<String>,
    color: Option<String>,
    tags: Option<String>,
    customization: Option<String>,
    purpose: Option<String>,
    #[field(name = "deliveryTime")]
    delivery_time: Option<String>,
    #[field(name = "deliveryMethod")]
    delivery_method: Option<String>,
    location: Option<String>,
    images: Vec<TempFile<'r>>,
    video: Option<TempFile<'r>>,
    #[field(name = "imagesToDelete")]
    images_to_delete: Vec<String>,
}

impl ProductForm<'_> {
    fn input(&mut self) -> ProductInput {
        ProductInput {
            name: self.name.take(),
            price: self.price.take(),
            description: self.description.take(),
            category: self.category.take(),
            product_type: self.product_type.take(),
            dimensions: self.dimensions.take(),
            quantity: self.quantity.take(),
            color: self.color.take(),
            tags: self.tags.take(),
            customization: self.customization.take(),
            purpose: self.purpose.take(),
            delivery_time: self.delivery_time.take(),
            delivery_method: self.delivery_method.take(),
            location: self.location.take(),
        }
    }
}

#[post("/upload", data = "<form>")]
async fn upload_product(
    principal: Principal,
    identity: &State<IdentityResolver>,
    catalog: &State<Catalog>,
    uploads: &State<UploadStore>,
    mut form: Form<ProductForm<'_>>,
) -> Result<(Status, Json<ApiResponse<ProductView>>), MarketError> {
    let seller = identity.resolve_seller(principal.user_id).await?;
    let images = uploads.store_all(&mut form.images).await?;
    let video = uploads.store_opt(form.video.as_mut()).await?;
    let product = catalog.create(&seller, form.input(), images, video).await?;
    Ok((
        Status::Created,
        ApiResponse::ok("Product uploaded successfully", product),
    ))
}

#[get("/recent")]
async fn recent(catalog: &State<Catalog>) -> Result<Json<ApiResponse<Vec<ProductSummary>>>, MarketError> {
    let products = catalog.list_recent(RECENT_LIMIT).await?;
    Ok(ApiResponse::ok("Recent products fetched", products))
}

#[get("/recent/<category>")]
async fn recent_by_category(
    category: &str,
    catalog: &State<Catalog>,
) -> Result<Json<ApiResponse<Vec<ProductSummary>>>, MarketError> {
    let products = catalog.list_recent_by_category(category, RECENT_LIMIT).await?;
    Ok(ApiResponse::ok("Recent products fetched", products))
}

async fn own_items(
    principal: &Principal,
    identity: &IdentityResolver,
    catalog: &Catalog,
    product_type: ProductType,
) -> Result<Json<ApiResponse<Vec<ProductView>>>, MarketError> {
    let seller = identity.resolve_seller(principal.user_id).await?;
    let products = catalog.list_mine(&seller, product_type).await?;
    Ok(ApiResponse::ok("Seller products fetched", products))
}

#[get("/items/creative")]
async fn own_creative_items(
    principal: Principal,
    identity: &State<IdentityResolver>,
    catalog: &State<Catalog>,
) -> Result<Json<ApiResponse<Vec<ProductView>>>, MarketError> {
    own_items(&principal, identity, catalog, ProductType::Creative).await
}

#[get("/items/scrapcraft")]
async fn own_scrapcraft_items(
    principal: Principal,
    identity: &State<IdentityResolver>,
    catalog: &State<Catalog>,
) -> Result<Json<ApiResponse<Vec<ProductView>>>, MarketError> {
    own_items(&principal, identity, catalog, ProductType::Scrapcraft).await
}

#[get("/id/<id>")]
async fn product_by_id(
    id: &str,
    catalog: &State<Catalog>,
) -> Result<Json<ApiResponse<ProductView>>, MarketError> {
    let product = catalog.get_by_id(id).await?;
    Ok(ApiResponse::ok("Product fetched", product))
}

#[get("/<category>")]
async fn by_category(
    category: &str,
    catalog: &State<Catalog>,
) -> Result<Json<ApiResponse<Vec<ProductView>>>, MarketError> {
    let products = catalog.list_by_category(category).await?;
    Ok(ApiResponse::ok("Products fetched", products))
}

#[put("/<id>", data = "<form>")]
async fn update_product(
    id: &str,
    principal: Principal,
    identity: &State<IdentityResolver>,
    catalog: &State<Catalog>,
    uploads: &State<UploadStore>,
    mut form: Form<ProductForm<'_>>,
) -> Result<Json<ApiResponse<ProductView>>, MarketError> {
    let seller = identity.resolve_seller(principal.user_id).await?;
    let images_to_delete = flatten_list(&form.images_to_delete)
        .map_err(|_| MarketError::validation("Invalid imagesToDelete format"))?;
    let new_images = uploads.store_all(&mut form.images).await?;
    let new_video = uploads.store_opt(form.video.as_mut()).await?;
    let product = catalog
        .update(id, &seller, form.input(), new_images, images_to_delete, new_video)
        .await?;
    Ok(ApiResponse::ok("Product updated successfully", product))
}

#[delete("/<id>")]
async fn delete_product(
    id: &str,
    principal: Principal,
    identity: &State<IdentityResolver>,
    catalog: &State<Catalog>,
) -> Result<Json<ApiResponse<String>>, MarketError> {
    let seller = identity.resolve_seller(principal.user_id).await?;
    catalog.delete(id, &seller).await?;
    Ok(ApiResponse::ok("Product deleted successfully", id.to_string()))
}

pub fn routes() -> Vec<Route> {
    routes![
        upload_product,
        recent,
        recent_by_category,
        own_creative_items,
        own_scrapcraft_items,
        product_by_id,
        by_category,
        update_product,
        delete_product
    ]
}
