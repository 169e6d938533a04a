//! In-memory stores, recording collaborators and fixtures for unit and
//! route tests.

use std::collections::{BTreeSet, HashMap};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;

use mongodb::bson::oid::ObjectId;
use mongodb::bson::DateTime;

use crate::media::{MediaUrls, StoredFile};
use crate::models::order::Order;
use crate::models::product::{
    Category, Customization, DeliveryMethod, Product, ProductInput, ProductType, Purpose,
};
use crate::models::seller::{Seller, SellerChanges, SellerProfileInput, SellerType};
use crate::repository::{OrderStore, ProductStore, RepositoryError, Result, SellerStore, UserStore};
use crate::services::auth_guard::Principal;
use crate::services::mailer::{Email, Mailer, NotificationError};
use crate::services::payment::{CheckoutItem, CheckoutSession, PaymentError, PaymentGateway, SessionStatus};

pub const BASE_URL: &str = "http://localhost:5000";

pub fn media() -> MediaUrls {
    MediaUrls::new(BASE_URL).expect("valid base url")
}

pub fn principal(email: &str) -> Principal {
    Principal {
        user_id: ObjectId::new(),
        email: email.to_string(),
    }
}

pub fn stored(name: &str) -> StoredFile {
    StoredFile {
        original_filename: name.to_string(),
        stored_filename: name.to_string(),
    }
}

pub fn seller_input(username: &str) -> SellerProfileInput {
    SellerProfileInput {
        username: Some(username.to_string()),
        full_name: Some("Test Seller".to_string()),
        phone: Some("0300-0000000".to_string()),
        seller_type: vec!["Creative".to_string()],
        ..SellerProfileInput::default()
    }
}

pub fn seeded_seller(username: &str, email: &str) -> Seller {
    let now = DateTime::now();
    Seller {
        id: ObjectId::new(),
        user_id: ObjectId::new(),
        account_email: email.to_string(),
        username: username.to_string(),
        full_name: format!("{username} full name"),
        contact_email: email.to_string(),
        phone: "0300-1234567".to_string(),
        seller_type: BTreeSet::from([SellerType::ScrapCraft]),
        address: String::new(),
        city: "Lahore".to_string(),
        country: "Pakistan".to_string(),
        bio: String::new(),
        facebook: None,
        instagram: None,
        linkedin: None,
        profile_picture: Some("/uploads/avatar.png".to_string()),
        faqs: Vec::new(),
        created_at: now,
        updated_at: now,
    }
}

pub fn product_input(name: &str, product_type: &str) -> ProductInput {
    let text = |value: &str| Some(value.to_string());
    ProductInput {
        name: text(name),
        price: text("1500"),
        description: text("Made from reclaimed glass"),
        category: text("Glass"),
        product_type: text(product_type),
        dimensions: text("30cm x 10cm"),
        quantity: text("2"),
        color: None,
        tags: None,
        customization: text("no"),
        purpose: text("for-sale"),
        delivery_time: text("3 days"),
        delivery_method: text("Local Pickup"),
        location: text("Lahore"),
    }
}

#[derive(Default)]
pub struct MemorySellers {
    sellers: Mutex<Vec<Seller>>,
    stale_lookups: bool,
}

impl MemorySellers {
    /// The user/email pre-check never sees existing rows, as when a concurrent
    /// create lands between the check and the insert.
    pub fn with_stale_lookups() -> Self {
        Self {
            sellers: Mutex::default(),
            stale_lookups: true,
        }
    }

    pub fn seed(&self, seller: Seller) -> Seller {
        self.sellers.lock().expect("lock").push(seller.clone());
        seller
    }

    pub fn is_empty(&self) -> bool {
        self.sellers.lock().expect("lock").is_empty()
    }

    fn find(&self, matches: impl Fn(&Seller) -> bool) -> Option<Seller> {
        self.sellers.lock().expect("lock").iter().find(|s| matches(s)).cloned()
    }
}

/// Mirrors the unique indexes on `userId`, `accountEmail` and `username`.
fn unique_violation(existing: &[Seller], candidate: &Seller) -> Option<RepositoryError> {
    let others = existing.iter().filter(|s| s.id != candidate.id);
    for other in others {
        let field = if other.user_id == candidate.user_id {
            "userId"
        } else if other.account_email == candidate.account_email {
            "accountEmail"
        } else if other.username == candidate.username {
            "username"
        } else {
            continue;
        };
        return Some(RepositoryError::Duplicate(field.to_string()));
    }
    None
}

/// What the `$set` update does to the stored document.
fn apply_changes(changes: &SellerChanges, seller: &mut Seller, now: DateTime) {
    fn assign<T: Clone>(target: &mut T, value: &Option<T>) {
        if let Some(value) = value {
            *target = value.clone();
        }
    }
    fn assign_opt<T: Clone>(target: &mut Option<T>, value: &Option<T>) {
        if value.is_some() {
            *target = value.clone();
        }
    }
    assign(&mut seller.username, &changes.username);
    assign(&mut seller.full_name, &changes.full_name);
    assign(&mut seller.contact_email, &changes.contact_email);
    assign(&mut seller.phone, &changes.phone);
    assign(&mut seller.seller_type, &changes.seller_type);
    assign(&mut seller.address, &changes.address);
    assign(&mut seller.city, &changes.city);
    assign(&mut seller.country, &changes.country);
    assign(&mut seller.bio, &changes.bio);
    assign_opt(&mut seller.facebook, &changes.facebook);
    assign_opt(&mut seller.instagram, &changes.instagram);
    assign_opt(&mut seller.linkedin, &changes.linkedin);
    assign_opt(&mut seller.profile_picture, &changes.profile_picture);
    assign(&mut seller.faqs, &changes.faqs);
    seller.updated_at = now;
}

#[rocket::async_trait]
impl SellerStore for MemorySellers {
    async fn find_by_user_or_email(&self, user_id: ObjectId, email: &str) -> Result<Option<Seller>> {
        if self.stale_lookups {
            return Ok(None);
        }
        Ok(self.find(|s| s.user_id == user_id || s.account_email == email))
    }

    async fn find_by_user_id(&self, user_id: ObjectId) -> Result<Option<Seller>> {
        Ok(self.find(|s| s.user_id == user_id))
    }

    async fn find_by_email(&self, email: &str) -> Result<Option<Seller>> {
        Ok(self.find(|s| s.account_email == email))
    }

    async fn find_by_username(&self, username: &str) -> Result<Option<Seller>> {
        Ok(self.find(|s| s.username == username))
    }

    async fn find_by_id(&self, id: ObjectId) -> Result<Option<Seller>> {
        Ok(self.find(|s| s.id == id))
    }

    async fn find_by_ids(&self, ids: &[ObjectId]) -> Result<Vec<Seller>> {
        let sellers = self.sellers.lock().expect("lock");
        Ok(sellers.iter().filter(|s| ids.contains(&s.id)).cloned().collect())
    }

    async fn insert(&self, seller: &Seller) -> Result<()> {
        let mut sellers = self.sellers.lock().expect("lock");
        if let Some(err) = unique_violation(&sellers, seller) {
            return Err(err);
        }
        sellers.push(seller.clone());
        Ok(())
    }

    async fn update_by_email(
        &self,
        email: &str,
        changes: &SellerChanges,
        now: DateTime,
    ) -> Result<Option<Seller>> {
        let mut sellers = self.sellers.lock().expect("lock");
        let Some(index) = sellers.iter().position(|s| s.account_email == email) else {
            return Ok(None);
        };
        let mut updated = sellers[index].clone();
        apply_changes(changes, &mut updated, now);
        if let Some(err) = unique_violation(&sellers, &updated) {
            return Err(err);
        }
        sellers[index] = updated.clone();
        Ok(Some(updated))
    }
}

#[derive(Default)]
pub struct MemoryProducts {
    products: Mutex<Vec<Product>>,
}

impl MemoryProducts {
    pub fn len(&self) -> usize {
        self.products.lock().expect("lock").len()
    }

    pub fn get(&self, id: ObjectId) -> Option<Product> {
        self.products.lock().expect("lock").iter().find(|p| p.id == id).cloned()
    }

    /// Stores a valid listing created `created_millis` after the epoch.
    pub fn seed_product(&self, owner: ObjectId, name: &str, product_type: &str, created_millis: i64) -> ObjectId {
        let product_type = match product_type {
            "Creative" => ProductType::Creative,
            _ => ProductType::Scrapcraft,
        };
        let created_at = DateTime::from_millis(created_millis);
        let product = Product {
            id: ObjectId::new(),
            name: name.to_string(),
            price: 100.0,
            description: format!("{name} description"),
            category: Category::Other,
            product_type,
            dimensions: "10cm".to_string(),
            quantity: 1,
            color: None,
            tags: Vec::new(),
            customization: Customization::No,
            purpose: Purpose::Showcase,
            delivery_time: "1 week".to_string(),
            delivery_method: DeliveryMethod::StandardShipping,
            location: "Karachi".to_string(),
            images: vec![format!("/uploads/{name}.jpg")],
            video: None,
            uploaded_by: owner,
            created_at,
            updated_at: created_at,
        };
        let id = product.id;
        self.products.lock().expect("lock").push(product);
        id
    }

    fn filtered(&self, keep: impl Fn(&Product) -> bool) -> Vec<Product> {
        self.products
            .lock()
            .expect("lock")
            .iter()
            .filter(|p| keep(p))
            .cloned()
            .collect()
    }
}

#[rocket::async_trait]
impl ProductStore for MemoryProducts {
    async fn insert(&self, product: &Product) -> Result<()> {
        self.products.lock().expect("lock").push(product.clone());
        Ok(())
    }

    async fn find_by_id(&self, id: ObjectId) -> Result<Option<Product>> {
        Ok(self.get(id))
    }

    async fn find_recent(&self, product_type: Option<&str>, limit: i64) -> Result<Vec<Product>> {
        let mut products = self.filtered(|p| product_type.map_or(true, |t| p.product_type.as_str() == t));
        products.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        products.truncate(usize::try_from(limit).unwrap_or(0));
        Ok(products)
    }

    async fn find_by_type(&self, product_type: &str) -> Result<Vec<Product>> {
        Ok(self.filtered(|p| p.product_type.as_str() == product_type))
    }

    async fn find_by_owner(&self, owner: ObjectId, product_type: ProductType) -> Result<Vec<Product>> {
        Ok(self.filtered(|p| p.uploaded_by == owner && p.product_type == product_type))
    }

    async fn save(&self, product: &Product) -> Result<()> {
        let mut products = self.products.lock().expect("lock");
        if let Some(slot) = products.iter_mut().find(|p| p.id == product.id) {
            *slot = product.clone();
        }
        Ok(())
    }

    async fn delete(&self, id: ObjectId) -> Result<bool> {
        let mut products = self.products.lock().expect("lock");
        let before = products.len();
        products.retain(|p| p.id != id);
        Ok(products.len() < before)
    }
}

#[derive(Default)]
pub struct MemoryUsers {
    roles: Mutex<HashMap<ObjectId, String>>,
}

impl MemoryUsers {
    pub fn role_of(&self, user_id: ObjectId) -> Option<String> {
        self.roles.lock().expect("lock").get(&user_id).cloned()
    }
}

#[rocket::async_trait]
impl UserStore for MemoryUsers {
    async fn set_role(&self, user_id: ObjectId, role: &str) -> Result<()> {
        self.roles.lock().expect("lock").insert(user_id, role.to_string());
        Ok(())
    }
}

#[derive(Default)]
pub struct MemoryOrders {
    orders: Mutex<Vec<Order>>,
}

impl MemoryOrders {
    pub fn len(&self) -> usize {
        self.orders.lock().expect("lock").len()
    }
}

#[rocket::async_trait]
impl OrderStore for MemoryOrders {
    async fn insert(&self, order: &Order) -> Result<()> {
        self.orders.lock().expect("lock").push(order.clone());
        Ok(())
    }
}

/// Keeps every delivered email; deliveries to `fail_for` error instead.
#[derive(Default)]
pub struct RecordingMailer {
    sent: Mutex<Vec<Email>>,
    fail_for: Option<String>,
}

impl RecordingMailer {
    pub fn failing_for(address: &str) -> Self {
        Self {
            sent: Mutex::default(),
            fail_for: Some(address.to_string()),
        }
    }

    pub fn sent(&self) -> Vec<Email> {
        self.sent.lock().expect("lock").clone()
    }
}

#[rocket::async_trait]
impl Mailer for RecordingMailer {
    async fn send(&self, email: Email) -> std::result::Result<(), NotificationError> {
        if self.fail_for.as_deref() == Some(email.to.as_str()) {
            return Err(NotificationError::InvalidAddress(email.to));
        }
        self.sent.lock().expect("lock").push(email);
        Ok(())
    }
}

#[derive(Default)]
pub struct FakeGateway {
    calls: AtomicUsize,
}

impl FakeGateway {
    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[rocket::async_trait]
impl PaymentGateway for FakeGateway {
    async fn create_session(&self, _items: &[CheckoutItem]) -> std::result::Result<CheckoutSession, PaymentError> {
        let n = self.calls.fetch_add(1, Ordering::SeqCst) + 1;
        Ok(CheckoutSession {
            id: format!("cs_test_{n}"),
        })
    }

    async fn session_status(&self, session_id: &str) -> std::result::Result<SessionStatus, PaymentError> {
        Ok(SessionStatus {
            id: session_id.to_string(),
            status: Some("complete".to_string()),
            payment_status: Some("paid".to_string()),
        })
    }
}
