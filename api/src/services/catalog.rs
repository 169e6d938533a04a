//! Product listings scoped to their owning seller.
//!
//! Mutations take the caller's already resolved `Seller`; ownership is
//! checked against `uploadedBy` after the product itself is found.

use std::collections::HashMap;
use std::sync::Arc;

use mongodb::bson::oid::ObjectId;
use mongodb::bson::DateTime;

use crate::error::MarketError;
use crate::media::{MediaUrls, StoredFile};
use crate::models::product::{
    OwnerSummary, Product, ProductFields, ProductInput, ProductSummary, ProductType, ProductView,
};
use crate::models::seller::Seller;
use crate::repository::{ProductStore, SellerStore};
use crate::services::input::{ensure_present, parse_enum, parse_json_blob, present};

/// Size of the "recent" feeds.
pub const RECENT_LIMIT: i64 = 8;

/// Uppercases the first character and leaves the rest alone, so
/// `creative` becomes `Creative` while `ScrapCraft` never turns into the
/// stored `Scrapcraft`.
pub fn title_case_token(token: &str) -> String {
    let mut chars = token.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}

pub struct Catalog {
    products: Arc<dyn ProductStore>,
    sellers: Arc<dyn SellerStore>,
    media: MediaUrls,
}

impl Catalog {
    pub fn new(products: Arc<dyn ProductStore>, sellers: Arc<dyn SellerStore>, media: MediaUrls) -> Self {
        Catalog {
            products,
            sellers,
            media,
        }
    }

    pub async fn create(
        &self,
        seller: &Seller,
        input: ProductInput,
        images: Vec<StoredFile>,
        video: Option<StoredFile>,
    ) -> Result<ProductView, MarketError> {
        let mut required = required_fields(&input);
        required.insert(4, ("productType", present(&input.product_type).is_some()));
        ensure_present(&required)?;

        let product_type = present(&input.product_type)
            .and_then(parse_enum::<ProductType>)
            .ok_or_else(|| MarketError::validation("Invalid product type"))?;
        if images.is_empty() {
            return Err(MarketError::validation("At least one product image is required"));
        }
        let fields = parse_fields(&input)?;

        let product = Product::list(
            fields,
            product_type,
            seller.id,
            images.iter().map(StoredFile::reference).collect(),
            video.as_ref().map(StoredFile::reference),
            DateTime::now(),
        );
        self.products.insert(&product).await?;

        tracing::info!(product_id = %product.id, seller_id = %seller.id, "product listed");
        let owner = OwnerSummary::from_seller(seller, &self.media);
        Ok(ProductView::new(product, Some(owner), &self.media))
    }

    pub async fn list_recent(&self, limit: i64) -> Result<Vec<ProductSummary>, MarketError> {
        self.recent(None, limit).await
    }

    pub async fn list_recent_by_category(
        &self,
        category: &str,
        limit: i64,
    ) -> Result<Vec<ProductSummary>, MarketError> {
        self.recent(Some(&title_case_token(category)), limit).await
    }

    pub async fn list_by_category(&self, category: &str) -> Result<Vec<ProductView>, MarketError> {
        let products = self.products.find_by_type(&title_case_token(category)).await?;
        self.views_with_owners(products).await
    }

    pub async fn list_mine(
        &self,
        seller: &Seller,
        product_type: ProductType,
    ) -> Result<Vec<ProductView>, MarketError> {
        let products = self.products.find_by_owner(seller.id, product_type).await?;
        let owner = OwnerSummary::from_seller(seller, &self.media);
        Ok(products
            .into_iter()
            .map(|p| ProductView::new(p, Some(owner.clone()), &self.media))
            .collect())
    }

    pub async fn get_by_id(&self, id: &str) -> Result<ProductView, MarketError> {
        let product = self.find(id).await?;
        let owner = self
            .sellers
            .find_by_id(product.uploaded_by)
            .await?
            .map(|seller| OwnerSummary::from_seller(&seller, &self.media));
        Ok(ProductView::new(product, owner, &self.media))
    }

    /// Replaces every scalar field, drops the listed images (matched by
    /// stored reference or by served URL), then appends the new uploads.
    pub async fn update(
        &self,
        id: &str,
        seller: &Seller,
        input: ProductInput,
        new_images: Vec<StoredFile>,
        images_to_delete: Vec<String>,
        new_video: Option<StoredFile>,
    ) -> Result<ProductView, MarketError> {
        let mut product = self.find(id).await?;
        if product.uploaded_by != seller.id {
            return Err(MarketError::forbidden("Not authorized to update this product"));
        }
        ensure_present(&required_fields(&input))?;
        let fields = parse_fields(&input)?;

        product.assign(fields);
        product.images = retain_images(&product.images, &images_to_delete, &self.media);
        product
            .images
            .extend(new_images.iter().map(StoredFile::reference));
        if product.images.is_empty() {
            return Err(MarketError::validation("At least one product image is required"));
        }
        if let Some(video) = new_video {
            product.video = Some(video.reference());
        }
        product.updated_at = DateTime::now();
        self.products.save(&product).await?;

        tracing::info!(product_id = %product.id, "product updated");
        let owner = OwnerSummary::from_seller(seller, &self.media);
        Ok(ProductView::new(product, Some(owner), &self.media))
    }

    pub async fn delete(&self, id: &str, seller: &Seller) -> Result<(), MarketError> {
        let product = self.find(id).await?;
        if product.uploaded_by != seller.id {
            return Err(MarketError::forbidden("Not authorized to delete this product"));
        }
        if !self.products.delete(product.id).await? {
            return Err(MarketError::not_found("Product not found"));
        }
        tracing::info!(product_id = %product.id, "product deleted");
        Ok(())
    }

    async fn find(&self, id: &str) -> Result<Product, MarketError> {
        let id = ObjectId::parse_str(id).map_err(|_| MarketError::not_found("Product not found"))?;
        self.products
            .find_by_id(id)
            .await?
            .ok_or_else(|| MarketError::not_found("Product not found"))
    }

    async fn owners_of(&self, products: &[Product]) -> Result<HashMap<ObjectId, OwnerSummary>, MarketError> {
        let mut ids: Vec<ObjectId> = products.iter().map(|p| p.uploaded_by).collect();
        ids.sort();
        ids.dedup();
        let sellers = self.sellers.find_by_ids(&ids).await?;
        Ok(sellers
            .iter()
            .map(|seller| (seller.id, OwnerSummary::from_seller(seller, &self.media)))
            .collect())
    }

    async fn recent(&self, product_type: Option<&str>, limit: i64) -> Result<Vec<ProductSummary>, MarketError> {
        let products = self.products.find_recent(product_type, limit).await?;
        let owners = self.owners_of(&products).await?;
        Ok(products
            .into_iter()
            .map(|p| {
                let owner = owners.get(&p.uploaded_by).cloned();
                ProductSummary::new(p, owner, &self.media)
            })
            .collect())
    }

    async fn views_with_owners(&self, products: Vec<Product>) -> Result<Vec<ProductView>, MarketError> {
        let owners = self.owners_of(&products).await?;
        Ok(products
            .into_iter()
            .map(|p| {
                let owner = owners.get(&p.uploaded_by).cloned();
                ProductView::new(p, owner, &self.media)
            })
            .collect())
    }
}

fn required_fields(input: &ProductInput) -> Vec<(&'static str, bool)> {
    vec![
        ("name", present(&input.name).is_some()),
        ("price", present(&input.price).is_some()),
        ("description", present(&input.description).is_some()),
        ("category", present(&input.category).is_some()),
        ("dimensions", present(&input.dimensions).is_some()),
        ("quantity", present(&input.quantity).is_some()),
        ("customization", present(&input.customization).is_some()),
        ("purpose", present(&input.purpose).is_some()),
        ("deliveryTime", present(&input.delivery_time).is_some()),
        ("deliveryMethod", present(&input.delivery_method).is_some()),
        ("location", present(&input.location).is_some()),
    ]
}

/// Validates the scalar listing fields. Presence is checked beforehand.
pub fn parse_fields(input: &ProductInput) -> Result<ProductFields, MarketError> {
    fn text(value: &Option<String>) -> String {
        value.as_deref().unwrap_or_default().trim().to_string()
    }
    fn enumerated<T: serde::de::DeserializeOwned>(value: &Option<String>, name: &str) -> Result<T, MarketError> {
        present(value)
            .and_then(parse_enum)
            .ok_or_else(|| MarketError::validation(format!("Invalid {name}")))
    }

    let price = text(&input.price)
        .parse::<f64>()
        .ok()
        .filter(|price| price.is_finite() && *price > 0.0)
        .ok_or_else(|| MarketError::validation("Price must be a positive number"))?;
    let quantity = text(&input.quantity)
        .parse::<i32>()
        .ok()
        .filter(|quantity| *quantity >= 1)
        .ok_or_else(|| MarketError::validation("Quantity must be a whole number of at least 1"))?;
    let tags: Vec<String> = parse_json_blob(&input.tags)
        .map_err(|_| MarketError::validation("Invalid tags format"))?
        .unwrap_or_default();

    Ok(ProductFields {
        name: text(&input.name),
        price,
        description: text(&input.description),
        category: enumerated(&input.category, "category")?,
        dimensions: text(&input.dimensions),
        quantity,
        color: present(&input.color).map(|c| c.trim().to_string()),
        tags,
        customization: enumerated(&input.customization, "customization")?,
        purpose: enumerated(&input.purpose, "purpose")?,
        delivery_time: text(&input.delivery_time),
        delivery_method: enumerated(&input.delivery_method, "delivery method")?,
        location: text(&input.location),
    })
}

fn retain_images(images: &[String], to_delete: &[String], media: &MediaUrls) -> Vec<String> {
    images
        .iter()
        .filter(|image| {
            let served = media.normalize(image);
            !to_delete.iter().any(|gone| gone == *image || *gone == served)
        })
        .cloned()
        .collect()
}
