use std::sync::Arc;

use mongodb::bson::oid::ObjectId;
use mongodb::bson::DateTime;

use crate::error::MarketError;
use crate::media::{MediaUrls, StoredFile};
use crate::models::seller::{SellerChanges, SellerProfileInput, SellerView};
use crate::repository::{RepositoryError, SellerStore};
use crate::services::identity::{parse_faqs, parse_seller_types};
use crate::services::input::present;

/// Read and edit access to stored seller profiles.
pub struct SellerProfiles {
    sellers: Arc<dyn SellerStore>,
    media: MediaUrls,
}

impl SellerProfiles {
    pub fn new(sellers: Arc<dyn SellerStore>, media: MediaUrls) -> Self {
        SellerProfiles { sellers, media }
    }

    /// The caller's own profile.
    pub async fn get_by_email(&self, email: &str) -> Result<SellerView, MarketError> {
        let seller = self
            .sellers
            .find_by_email(email)
            .await?
            .ok_or_else(|| MarketError::not_found("Seller profile not found"))?;
        Ok(SellerView::owner(seller, &self.media))
    }

    pub async fn get_by_username(&self, username: &str) -> Result<SellerView, MarketError> {
        let seller = self
            .sellers
            .find_by_username(username)
            .await?
            .ok_or_else(|| MarketError::not_found("Seller not found"))?;
        Ok(SellerView::public(seller, &self.media))
    }

    /// Malformed ids are reported the same way as unknown ones.
    pub async fn get_by_id(&self, id: &str) -> Result<SellerView, MarketError> {
        let id = ObjectId::parse_str(id).map_err(|_| MarketError::not_found("Seller not found"))?;
        let seller = self
            .sellers
            .find_by_id(id)
            .await?
            .ok_or_else(|| MarketError::not_found("Seller not found"))?;
        Ok(SellerView::public(seller, &self.media))
    }

    pub async fn update(
        &self,
        email: &str,
        input: SellerProfileInput,
        picture: Option<StoredFile>,
    ) -> Result<SellerView, MarketError> {
        let changes = changes_from_input(input, picture)?;
        let updated = self
            .sellers
            .update_by_email(email, &changes, DateTime::now())
            .await
            .map_err(|err| match err {
                RepositoryError::Duplicate(field) if field == "username" => {
                    MarketError::conflict(Some("username"), "Username already taken")
                }
                other => other.into(),
            })?
            .ok_or_else(|| MarketError::not_found("Seller profile not found"))?;

        tracing::info!(seller_id = %updated.id, "seller profile updated");
        Ok(SellerView::owner(updated, &self.media))
    }
}

/// Builds the partial update. Required profile fields may be omitted but
/// never blanked; optional text fields may be cleared with an empty value.
pub fn changes_from_input(
    input: SellerProfileInput,
    picture: Option<StoredFile>,
) -> Result<SellerChanges, MarketError> {
    fn required(name: &str, value: Option<String>) -> Result<Option<String>, MarketError> {
        match value {
            Some(value) if value.trim().is_empty() => {
                Err(MarketError::validation(format!("{name} cannot be empty")))
            }
            other => Ok(other),
        }
    }

    let seller_type = if input.seller_type.is_empty() {
        None
    } else {
        let types = parse_seller_types(&input.seller_type)?;
        if types.is_empty() {
            return Err(MarketError::validation("sellerType cannot be empty"));
        }
        Some(types)
    };
    let faqs = parse_faqs(&input.faqs)?;
    let contact_email = present(&input.contact_email).map(str::to_string);

    Ok(SellerChanges {
        username: required("username", input.username)?.map(|u| u.trim().to_string()),
        full_name: required("fullName", input.full_name)?,
        contact_email,
        phone: required("phone", input.phone)?,
        seller_type,
        address: input.address,
        city: input.city,
        country: input.country,
        bio: input.bio,
        facebook: input.facebook,
        instagram: input.instagram,
        linkedin: input.linkedin,
        profile_picture: picture.map(|file| file.reference()),
        faqs,
    })
}
