use chrono::{DateTime as ChronoDateTime, Utc};
use mongodb::bson::oid::ObjectId;
use mongodb::bson::DateTime;
use serde::{Deserialize, Serialize};

use crate::media::MediaUrls;
use crate::models::seller::Seller;

#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq)]
pub enum Category {
    Metal,
    Plastic,
    Fabric,
    Paper,
    Wood,
    Glass,
    Ceramic,
    Other,
}

/// Listing classification. Not the same enumeration as `SellerType`: note
/// the lowercase "c" in `Scrapcraft`.
#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProductType {
    Creative,
    Scrapcraft,
}

impl ProductType {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Creative => "Creative",
            Self::Scrapcraft => "Scrapcraft",
        }
    }
}

#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum Customization {
    Yes,
    No,
}

#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "kebab-case")]
pub enum Purpose {
    ForSale,
    Showcase,
}

#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq)]
pub enum DeliveryMethod {
    #[serde(rename = "Standard Shipping")]
    StandardShipping,
    #[serde(rename = "Express Delivery")]
    ExpressDelivery,
    #[serde(rename = "Local Pickup")]
    LocalPickup,
    #[serde(rename = "Custom Arrangement")]
    CustomArrangement,
}

#[derive(Serialize, Deserialize, Debug, Clone)]
#[serde(rename_all = "camelCase")]
pub struct Product {
    #[serde(rename = "_id")]
    pub id: ObjectId,
    pub name: String,
    pub price: f64,
    pub description: String,
    pub category: Category,
    pub product_type: ProductType,
    pub dimensions: String,
    pub quantity: i32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub color: Option<String>,
    #[serde(default)]
    pub tags: Vec<String>,
    pub customization: Customization,
    pub purpose: Purpose,
    pub delivery_time: String,
    pub delivery_method: DeliveryMethod,
    pub location: String,
    pub images: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub video: Option<String>,
    pub uploaded_by: ObjectId,
    pub created_at: DateTime,
    pub updated_at: DateTime,
}

/// Scalar listing fields after validation. `productType` is fixed at creation
/// and therefore not part of this set.
#[derive(Debug, Clone, PartialEq)]
pub struct ProductFields {
    pub name: String,
    pub price: f64,
    pub description: String,
    pub category: Category,
    pub dimensions: String,
    pub quantity: i32,
    pub color: Option<String>,
    pub tags: Vec<String>,
    pub customization: Customization,
    pub purpose: Purpose,
    pub delivery_time: String,
    pub delivery_method: DeliveryMethod,
    pub location: String,
}

impl Product {
    /// A fresh listing owned by `uploaded_by`.
    pub fn list(
        fields: ProductFields,
        product_type: ProductType,
        uploaded_by: ObjectId,
        images: Vec<String>,
        video: Option<String>,
        now: DateTime,
    ) -> Self {
        Self {
            id: ObjectId::new(),
            name: fields.name,
            price: fields.price,
            description: fields.description,
            category: fields.category,
            product_type,
            dimensions: fields.dimensions,
            quantity: fields.quantity,
            color: fields.color,
            tags: fields.tags,
            customization: fields.customization,
            purpose: fields.purpose,
            delivery_time: fields.delivery_time,
            delivery_method: fields.delivery_method,
            location: fields.location,
            images,
            video,
            uploaded_by,
            created_at: now,
            updated_at: now,
        }
    }

    pub fn assign(&mut self, fields: ProductFields) {
        self.name = fields.name;
        self.price = fields.price;
        self.description = fields.description;
        self.category = fields.category;
        self.dimensions = fields.dimensions;
        self.quantity = fields.quantity;
        self.color = fields.color;
        self.tags = fields.tags;
        self.customization = fields.customization;
        self.purpose = fields.purpose;
        self.delivery_time = fields.delivery_time;
        self.delivery_method = fields.delivery_method;
        self.location = fields.location;
    }
}

/// Raw listing fields as submitted by the upload/edit forms.
#[derive(Debug, Clone, Default)]
pub struct ProductInput {
    pub name: Option<String>,
    pub price: Option<String>,
    pub description: Option<String>,
    pub category: Option<String>,
    pub product_type: Option<String>,
    pub dimensions: Option<String>,
    pub quantity: Option<String>,
    pub color: Option<String>,
    /// JSON array of strings.
    pub tags: Option<String>,
    pub customization: Option<String>,
    pub purpose: Option<String>,
    pub delivery_time: Option<String>,
    pub delivery_method: Option<String>,
    pub location: Option<String>,
}

/// Lightweight owner info joined onto listings.
#[derive(Serialize, Debug, Clone, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct OwnerSummary {
    #[serde(rename = "_id")]
    pub id: String,
    pub username: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub profile_picture: Option<String>,
}

impl OwnerSummary {
    pub fn from_seller(seller: &Seller, media: &MediaUrls) -> Self {
        Self {
            id: seller.id.to_hex(),
            username: seller.username.clone(),
            profile_picture: media.normalize_opt(seller.profile_picture.as_deref()),
        }
    }
}

#[derive(Serialize, Debug, Clone)]
#[serde(rename_all = "camelCase")]
pub struct ProductView {
    #[serde(rename = "_id")]
    pub id: String,
    pub name: String,
    pub price: f64,
    pub description: String,
    pub category: Category,
    pub product_type: ProductType,
    pub dimensions: String,
    pub quantity: i32,
    pub color: Option<String>,
    pub tags: Vec<String>,
    pub customization: Customization,
    pub purpose: Purpose,
    pub delivery_time: String,
    pub delivery_method: DeliveryMethod,
    pub location: String,
    pub images: Vec<String>,
    pub video: Option<String>,
    /// `null` when the owning seller no longer resolves.
    pub uploaded_by: Option<OwnerSummary>,
    pub created_at: ChronoDateTime<Utc>,
    pub updated_at: ChronoDateTime<Utc>,
}

impl ProductView {
    pub fn new(product: Product, owner: Option<OwnerSummary>, media: &MediaUrls) -> Self {
        Self {
            id: product.id.to_hex(),
            images: media.normalize_all(&product.images),
            video: media.normalize_opt(product.video.as_deref()),
            name: product.name,
            price: product.price,
            description: product.description,
            category: product.category,
            product_type: product.product_type,
            dimensions: product.dimensions,
            quantity: product.quantity,
            color: product.color,
            tags: product.tags,
            customization: product.customization,
            purpose: product.purpose,
            delivery_time: product.delivery_time,
            delivery_method: product.delivery_method,
            location: product.location,
            uploaded_by: owner,
            created_at: product.created_at.to_chrono(),
            updated_at: product.updated_at.to_chrono(),
        }
    }
}

/// Card-sized projection used by the "recent" feeds.
#[derive(Serialize, Debug, Clone)]
#[serde(rename_all = "camelCase")]
pub struct ProductSummary {
    #[serde(rename = "_id")]
    pub id: String,
    pub name: String,
    pub price: f64,
    pub images: Vec<String>,
    pub category: Category,
    pub uploaded_by: Option<OwnerSummary>,
    pub created_at: ChronoDateTime<Utc>,
}

impl ProductSummary {
    pub fn new(product: Product, owner: Option<OwnerSummary>, media: &MediaUrls) -> Self {
        Self {
            id: product.id.to_hex(),
            images: media.normalize_all(&product.images),
            name: product.name,
            price: product.price,
            category: product.category,
            uploaded_by: owner,
            created_at: product.created_at.to_chrono(),
        }
    }
}
