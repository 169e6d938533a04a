//! Maps an authenticated user onto their seller profile.
//!
//! A user owns at most one seller and an account email backs at most one
//! seller. The pre-insert lookup gives friendly messages; the unique indexes
//! on the collection settle concurrent creations.

use std::collections::BTreeSet;
use std::sync::Arc;

use mongodb::bson::oid::ObjectId;
use mongodb::bson::DateTime;

use crate::error::MarketError;
use crate::media::{MediaUrls, StoredFile};
use crate::models::seller::{FaqEntry, Seller, SellerProfileInput, SellerType, SellerView};
use crate::repository::{RepositoryError, SellerStore, UserStore};
use crate::services::auth_guard::Principal;
use crate::services::input::{ensure_present, flatten_list, parse_enum, parse_json_blob, present};

pub const SELLER_ROLE: &str = "seller";

pub struct IdentityResolver {
    sellers: Arc<dyn SellerStore>,
    users: Arc<dyn UserStore>,
    media: MediaUrls,
}

impl IdentityResolver {
    pub fn new(sellers: Arc<dyn SellerStore>, users: Arc<dyn UserStore>, media: MediaUrls) -> Self {
        IdentityResolver { sellers, users, media }
    }

    /// The gate in front of every seller-scoped mutation.
    pub async fn resolve_seller(&self, user_id: ObjectId) -> Result<Seller, MarketError> {
        self.sellers
            .find_by_user_id(user_id)
            .await?
            .ok_or_else(|| MarketError::not_found("Seller profile not found"))
    }

    pub async fn profile_exists(&self, email: &str) -> Result<bool, MarketError> {
        Ok(self.sellers.find_by_email(email).await?.is_some())
    }

    pub async fn create_profile(
        &self,
        principal: &Principal,
        input: SellerProfileInput,
        picture: Option<StoredFile>,
    ) -> Result<SellerView, MarketError> {
        if let Some(existing) = self
            .sellers
            .find_by_user_or_email(principal.user_id, &principal.email)
            .await?
        {
            return Err(if existing.user_id == principal.user_id {
                MarketError::conflict(Some("userId"), "You already have a seller profile.")
            } else {
                MarketError::conflict(
                    Some("accountEmail"),
                    "This email is already associated with another seller account.",
                )
            });
        }

        let seller_types = parse_seller_types(&input.seller_type)?;
        ensure_present(&[
            ("username", present(&input.username).is_some()),
            ("fullName", present(&input.full_name).is_some()),
            ("phone", present(&input.phone).is_some()),
            ("sellerType", !seller_types.is_empty()),
        ])?;
        let faqs = parse_faqs(&input.faqs)?.unwrap_or_default();

        let now = DateTime::now();
        let seller = Seller {
            id: ObjectId::new(),
            user_id: principal.user_id,
            account_email: principal.email.clone(),
            username: input.username.unwrap_or_default().trim().to_string(),
            full_name: input.full_name.unwrap_or_default(),
            contact_email: present(&input.contact_email)
                .map(str::to_string)
                .unwrap_or_else(|| principal.email.clone()),
            phone: input.phone.unwrap_or_default(),
            seller_type: seller_types,
            address: input.address.unwrap_or_default(),
            city: input.city.unwrap_or_default(),
            country: input.country.unwrap_or_default(),
            bio: input.bio.unwrap_or_default(),
            facebook: present(&input.facebook).map(str::to_string),
            instagram: present(&input.instagram).map(str::to_string),
            linkedin: present(&input.linkedin).map(str::to_string),
            profile_picture: picture.map(|file| file.reference()),
            faqs,
            created_at: now,
            updated_at: now,
        };

        self.sellers.insert(&seller).await.map_err(|err| match err {
            RepositoryError::Duplicate(field) if field == "username" => {
                MarketError::conflict(Some("username"), "Username already taken")
            }
            RepositoryError::Duplicate(field) => MarketError::conflict(
                Some(field.as_str()),
                "Email already associated with another account",
            ),
            other => other.into(),
        })?;
        self.users.set_role(principal.user_id, SELLER_ROLE).await?;

        tracing::info!(seller_id = %seller.id, username = %seller.username, "seller profile created");
        Ok(SellerView::owner(seller, &self.media))
    }
}

/// Accepts repeated values or a JSON array; every value must be a known type.
pub fn parse_seller_types(values: &[String]) -> Result<BTreeSet<SellerType>, MarketError> {
    let names = flatten_list(values).map_err(|_| MarketError::validation("Invalid seller type format"))?;
    names
        .iter()
        .map(|name| {
            parse_enum::<SellerType>(name)
                .ok_or_else(|| MarketError::validation(format!("Invalid seller type: {name}")))
        })
        .collect()
}

pub fn parse_faqs(blob: &Option<String>) -> Result<Option<Vec<FaqEntry>>, MarketError> {
    parse_json_blob(blob).map_err(|_| MarketError::validation("Invalid FAQs format"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{media, principal, seller_input, MemorySellers, MemoryUsers};

    fn resolver(sellers: &Arc<MemorySellers>, users: &Arc<MemoryUsers>) -> IdentityResolver {
        IdentityResolver::new(sellers.clone(), users.clone(), media())
    }

    #[tokio::test]
    async fn test_create_promotes_user_and_resolves() {
        let sellers = Arc::new(MemorySellers::default());
        let users = Arc::new(MemoryUsers::default());
        let identity = resolver(&sellers, &users);
        let alice = principal("alice@x.com");

        let view = identity
            .create_profile(&alice, seller_input("alice"), None)
            .await
            .expect("created");
        assert_eq!(view.username, "alice");
        assert_eq!(view.contact_email, "alice@x.com");
        assert_eq!(users.role_of(alice.user_id).as_deref(), Some(SELLER_ROLE));

        let seller = identity.resolve_seller(alice.user_id).await.expect("resolves");
        assert_eq!(seller.account_email, "alice@x.com");
        assert!(identity.profile_exists("alice@x.com").await.expect("lookup"));
        assert!(!identity.profile_exists("bob@x.com").await.expect("lookup"));
    }

    #[tokio::test]
    async fn test_second_profile_conflicts_by_user_then_email() {
        let sellers = Arc::new(MemorySellers::default());
        let users = Arc::new(MemoryUsers::default());
        let identity = resolver(&sellers, &users);
        let alice = principal("alice@x.com");
        identity
            .create_profile(&alice, seller_input("alice"), None)
            .await
            .expect("created");

        let again = identity
            .create_profile(&alice, seller_input("alice2"), None)
            .await
            .expect_err("duplicate user");
        assert_eq!(again.to_string(), "You already have a seller profile.");

        let same_email = principal("alice@x.com");
        let err = identity
            .create_profile(&same_email, seller_input("alice3"), None)
            .await
            .expect_err("duplicate email");
        assert_eq!(
            err.to_string(),
            "This email is already associated with another seller account."
        );
    }

    #[tokio::test]
    async fn test_username_taken_maps_from_unique_index() {
        let sellers = Arc::new(MemorySellers::default());
        let users = Arc::new(MemoryUsers::default());
        let identity = resolver(&sellers, &users);
        identity
            .create_profile(&principal("alice@x.com"), seller_input("crafty"), None)
            .await
            .expect("created");

        let err = identity
            .create_profile(&principal("bob@x.com"), seller_input("crafty"), None)
            .await
            .expect_err("username taken");
        match err {
            MarketError::Conflict { field, message } => {
                assert_eq!(field.as_deref(), Some("username"));
                assert_eq!(message, "Username already taken");
            }
            other => panic!("unexpected {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_concurrent_create_for_same_email_maps_to_email_conflict() {
        let sellers = Arc::new(MemorySellers::with_stale_lookups());
        let users = Arc::new(MemoryUsers::default());
        let identity = resolver(&sellers, &users);
        identity
            .create_profile(&principal("alice@x.com"), seller_input("alice"), None)
            .await
            .expect("created");

        let late = principal("alice@x.com");
        let err = identity
            .create_profile(&late, seller_input("alice2"), None)
            .await
            .expect_err("email taken");
        match err {
            MarketError::Conflict { field, message } => {
                assert_eq!(field.as_deref(), Some("accountEmail"));
                assert_eq!(message, "Email already associated with another account");
            }
            other => panic!("unexpected {other:?}"),
        }
        assert_eq!(users.role_of(late.user_id), None);
    }

    #[tokio::test]
    async fn test_missing_fields_and_bad_seller_type() {
        let sellers = Arc::new(MemorySellers::default());
        let users = Arc::new(MemoryUsers::default());
        let identity = resolver(&sellers, &users);

        let mut input = seller_input("alice");
        input.phone = None;
        input.seller_type = Vec::new();
        let err = identity
            .create_profile(&principal("a@x.com"), input, None)
            .await
            .expect_err("missing");
        assert_eq!(err.to_string(), "Missing required fields: phone, sellerType");

        let mut input = seller_input("alice");
        input.seller_type = vec!["Painter".to_string()];
        let err = identity
            .create_profile(&principal("a@x.com"), input, None)
            .await
            .expect_err("bad type");
        assert_eq!(err.to_string(), "Invalid seller type: Painter");

        let mut input = seller_input("alice");
        input.faqs = Some("{not json".to_string());
        let err = identity
            .create_profile(&principal("a@x.com"), input, None)
            .await
            .expect_err("bad faqs");
        assert_eq!(err.to_string(), "Invalid FAQs format");
        assert!(sellers.is_empty());
    }

    #[tokio::test]
    async fn test_profile_picture_is_normalized_on_return() {
        let sellers = Arc::new(MemorySellers::default());
        let users = Arc::new(MemoryUsers::default());
        let identity = resolver(&sellers, &users);
        let picture = StoredFile {
            original_filename: "me.png".to_string(),
            stored_filename: "abc.png".to_string(),
        };
        let view = identity
            .create_profile(&principal("a@x.com"), seller_input("alice"), Some(picture))
            .await
            .expect("created");
        assert_eq!(
            view.profile_picture.as_deref(),
            Some("http://localhost:5000/uploads/abc.png")
        );
        let stored = sellers.find_by_username("alice").await.expect("ok").expect("stored");
        assert_eq!(stored.profile_picture.as_deref(), Some("/uploads/abc.png"));
    }

    #[tokio::test]
    async fn test_unknown_user_has_no_seller() {
        let identity = resolver(&Arc::new(MemorySellers::default()), &Arc::new(MemoryUsers::default()));
        let err = identity.resolve_seller(ObjectId::new()).await.expect_err("none");
        assert!(matches!(err, MarketError::NotFound(_)));
    }

    #[test]
    fn test_seller_types_accept_json_array_and_dedupe() {
        let types = parse_seller_types(&[r#"["ScrapCraft","Creative","Creative"]"#.to_string()])
            .expect("parses");
        assert_eq!(types, BTreeSet::from([SellerType::Creative, SellerType::ScrapCraft]));
    }

    #[test]
    fn test_faqs_blob_parses_entries() {
        let faqs = parse_faqs(&Some(r#"[{"question":"Ship abroad?","answer":"Yes"}]"#.to_string()))
            .expect("parses")
            .expect("present");
        assert_eq!(faqs[0].question, "Ship abroad?");
        assert_eq!(parse_faqs(&Some(String::new())).expect("blank"), None);
    }
}
