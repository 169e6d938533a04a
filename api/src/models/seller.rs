use std::collections::BTreeSet;

use mongodb::bson::oid::ObjectId;
use mongodb::bson::{doc, to_bson, DateTime, Document};
use serde::{Deserialize, Deserializer, Serialize};

use crate::media::MediaUrls;

#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum SellerType {
    Creative,
    ScrapCraft,
}

/// One question/answer pair shown on a seller's public page.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
pub struct FaqEntry {
    #[serde(default)]
    pub question: String,
    #[serde(default)]
    pub answer: String,
}

#[derive(Serialize, Deserialize, Debug, Clone)]
#[serde(rename_all = "camelCase")]
pub struct Seller {
    #[serde(rename = "_id")]
    pub id: ObjectId,
    pub user_id: ObjectId,
    pub account_email: String,
    pub username: String,
    pub full_name: String,
    pub contact_email: String,
    pub phone: String,
    // Older documents stored a bare string here.
    #[serde(default, deserialize_with = "seller_types_from_one_or_many")]
    pub seller_type: BTreeSet<SellerType>,
    #[serde(default)]
    pub address: String,
    #[serde(default)]
    pub city: String,
    #[serde(default)]
    pub country: String,
    #[serde(default)]
    pub bio: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub facebook: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub instagram: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub linkedin: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub profile_picture: Option<String>,
    #[serde(default)]
    pub faqs: Vec<FaqEntry>,
    pub created_at: DateTime,
    pub updated_at: DateTime,
}

#[derive(Deserialize)]
#[serde(untagged)]
enum OneOrMany {
    One(SellerType),
    Many(Vec<SellerType>),
}

fn seller_types_from_one_or_many<'de, D>(deserializer: D) -> Result<BTreeSet<SellerType>, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(match OneOrMany::deserialize(deserializer)? {
        OneOrMany::One(seller_type) => BTreeSet::from([seller_type]),
        OneOrMany::Many(seller_types) => seller_types.into_iter().collect(),
    })
}

/// Raw profile fields as they arrive from a form; nothing is validated yet.
#[derive(Debug, Clone, Default)]
pub struct SellerProfileInput {
    pub username: Option<String>,
    pub full_name: Option<String>,
    pub contact_email: Option<String>,
    pub phone: Option<String>,
    pub seller_type: Vec<String>,
    pub address: Option<String>,
    pub city: Option<String>,
    pub country: Option<String>,
    pub bio: Option<String>,
    pub facebook: Option<String>,
    pub instagram: Option<String>,
    pub linkedin: Option<String>,
    /// JSON encoded list of `{question, answer}` objects.
    pub faqs: Option<String>,
}

/// Validated partial update of a seller profile.
#[derive(Debug, Clone, Default)]
pub struct SellerChanges {
    pub username: Option<String>,
    pub full_name: Option<String>,
    pub contact_email: Option<String>,
    pub phone: Option<String>,
    pub seller_type: Option<BTreeSet<SellerType>>,
    pub address: Option<String>,
    pub city: Option<String>,
    pub country: Option<String>,
    pub bio: Option<String>,
    pub facebook: Option<String>,
    pub instagram: Option<String>,
    pub linkedin: Option<String>,
    pub profile_picture: Option<String>,
    pub faqs: Option<Vec<FaqEntry>>,
}

impl SellerChanges {
    /// `$set` body for the store; `updatedAt` is always bumped.
    pub fn to_set_document(&self, now: DateTime) -> Result<Document, mongodb::bson::ser::Error> {
        let mut set = doc! { "updatedAt": now };
        let text_fields = [
            ("username", &self.username),
            ("fullName", &self.full_name),
            ("contactEmail", &self.contact_email),
            ("phone", &self.phone),
            ("address", &self.address),
            ("city", &self.city),
            ("country", &self.country),
            ("bio", &self.bio),
            ("facebook", &self.facebook),
            ("instagram", &self.instagram),
            ("linkedin", &self.linkedin),
            ("profilePicture", &self.profile_picture),
        ];
        for (key, value) in text_fields {
            if let Some(value) = value {
                set.insert(key, value.clone());
            }
        }
        if let Some(seller_type) = &self.seller_type {
            let names: Vec<String> = seller_type.iter().map(|t| t.as_str().to_string()).collect();
            set.insert("sellerType", names);
        }
        if let Some(faqs) = &self.faqs {
            set.insert("faqs", to_bson(faqs)?);
        }
        Ok(set)
    }
}

impl SellerType {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Creative => "Creative",
            Self::ScrapCraft => "ScrapCraft",
        }
    }
}

/// Outbound representation of a seller. Audit timestamps are never included;
/// the public variant also leaves out the account email and phone number.
#[derive(Serialize, Debug, Clone)]
#[serde(rename_all = "camelCase")]
pub struct SellerView {
    #[serde(rename = "_id")]
    pub id: String,
    pub user_id: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub account_email: Option<String>,
    pub username: String,
    pub full_name: String,
    pub contact_email: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub phone: Option<String>,
    pub seller_type: BTreeSet<SellerType>,
    pub address: String,
    pub city: String,
    pub country: String,
    pub bio: String,
    pub facebook: Option<String>,
    pub instagram: Option<String>,
    pub linkedin: Option<String>,
    pub profile_picture: Option<String>,
    pub faqs: Vec<FaqEntry>,
}

impl SellerView {
    /// What the seller sees about themselves.
    pub fn owner(seller: Seller, media: &MediaUrls) -> Self {
        let profile_picture = media.normalize_opt(seller.profile_picture.as_deref());
        Self {
            id: seller.id.to_hex(),
            user_id: seller.user_id.to_hex(),
            account_email: Some(seller.account_email),
            username: seller.username,
            full_name: seller.full_name,
            contact_email: seller.contact_email,
            phone: Some(seller.phone),
            seller_type: seller.seller_type,
            address: seller.address,
            city: seller.city,
            country: seller.country,
            bio: seller.bio,
            facebook: seller.facebook,
            instagram: seller.instagram,
            linkedin: seller.linkedin,
            profile_picture,
            faqs: seller.faqs,
        }
    }

    /// What anyone can see.
    pub fn public(seller: Seller, media: &MediaUrls) -> Self {
        Self {
            account_email: None,
            phone: None,
            ..Self::owner(seller, media)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use mongodb::bson;

    fn stored_seller_document(seller_type: bson::Bson) -> Document {
        doc! {
            "_id": ObjectId::new(),
            "userId": ObjectId::new(),
            "accountEmail": "a@x.com",
            "username": "alice",
            "fullName": "Alice A",
            "contactEmail": "a@x.com",
            "phone": "123",
            "sellerType": seller_type,
            "createdAt": DateTime::now(),
            "updatedAt": DateTime::now(),
            "__v": 0,
        }
    }

    #[test]
    fn test_scalar_seller_type_reads_as_set() {
        let seller: Seller =
            bson::from_document(stored_seller_document("Creative".into())).expect("decodes");
        assert_eq!(seller.seller_type, BTreeSet::from([SellerType::Creative]));
    }

    #[test]
    fn test_array_seller_type_reads_as_set() {
        let doc = stored_seller_document(bson::bson!(["ScrapCraft", "Creative", "Creative"]));
        let seller: Seller = bson::from_document(doc).expect("decodes");
        assert_eq!(
            seller.seller_type,
            BTreeSet::from([SellerType::Creative, SellerType::ScrapCraft])
        );
    }

    #[test]
    fn test_public_view_hides_contact_sensitive_fields() {
        let seller: Seller =
            bson::from_document(stored_seller_document("Creative".into())).expect("decodes");
        let media = MediaUrls::new("http://localhost:5000").expect("valid");
        let view = serde_json::to_value(SellerView::public(seller, &media)).expect("serializes");
        assert!(view.get("accountEmail").is_none());
        assert!(view.get("phone").is_none());
        assert!(view.get("createdAt").is_none());
        assert_eq!(view["username"], "alice");
        assert_eq!(view["sellerType"], serde_json::json!(["Creative"]));
    }

    #[test]
    fn test_changes_only_set_present_fields() {
        let changes = SellerChanges {
            bio: Some("Upcycled lamps".to_string()),
            seller_type: Some(BTreeSet::from([SellerType::ScrapCraft])),
            ..SellerChanges::default()
        };
        let set = changes.to_set_document(DateTime::now()).expect("encodes");
        assert_eq!(set.get_str("bio").ok(), Some("Upcycled lamps"));
        assert!(set.contains_key("updatedAt"));
        assert!(set.contains_key("sellerType"));
        assert!(!set.contains_key("username"));
        assert!(!set.contains_key("faqs"));
    }

    #[test]
    fn test_faq_changes_are_encoded_into_the_set() {
        let changes = SellerChanges {
            faqs: Some(vec![FaqEntry {
                question: "Do you ship abroad?".to_string(),
                answer: "Only within Pakistan".to_string(),
            }]),
            ..SellerChanges::default()
        };
        let set = changes.to_set_document(DateTime::now()).expect("encodes");
        let faqs = set.get_array("faqs").expect("faqs set");
        assert_eq!(faqs.len(), 1);
        let entry = faqs[0].as_document().expect("entry");
        assert_eq!(entry.get_str("question").ok(), Some("Do you ship abroad?"));
        assert_eq!(entry.get_str("answer").ok(), Some("Only within Pakistan"));
    }
}
