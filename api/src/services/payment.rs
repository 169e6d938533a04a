//! Card checkout through Stripe Checkout sessions.

use std::sync::Arc;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::error::MarketError;

const STRIPE_API: &str = "https://api.stripe.com/v1";

#[derive(Debug, Error)]
pub enum PaymentError {
    #[error("STRIPE_SECRET_KEY is not configured")]
    NotConfigured,

    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Stripe returned {status}: {message}")]
    Gateway { status: u16, message: String },

    #[error("cannot build a Stripe URL for session `{0}`")]
    SessionUrl(String),
}

impl From<PaymentError> for MarketError {
    fn from(err: PaymentError) -> Self {
        MarketError::internal(err)
    }
}

fn one() -> u32 {
    1
}

/// One cart line. `price` is already in the currency's minor unit.
#[derive(Deserialize, Debug, Clone, PartialEq)]
pub struct CheckoutItem {
    #[serde(default)]
    pub title: String,
    #[serde(default = "one")]
    pub qty: u32,
    pub price: f64,
}

#[derive(Deserialize, Debug, Default)]
pub struct CheckoutRequest {
    #[serde(default)]
    pub items: Vec<CheckoutItem>,
}

#[derive(Serialize, Debug, Clone, PartialEq)]
pub struct CheckoutSession {
    pub id: String,
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct SessionStatus {
    pub id: String,
    pub status: Option<String>,
    pub payment_status: Option<String>,
}

#[rocket::async_trait]
pub trait PaymentGateway: Send + Sync {
    async fn create_session(&self, items: &[CheckoutItem]) -> Result<CheckoutSession, PaymentError>;
    async fn session_status(&self, session_id: &str) -> Result<SessionStatus, PaymentError>;
}

/// Redirect targets on the storefront.
#[derive(Debug, Clone)]
pub struct CheckoutUrls {
    pub success: String,
    pub cancel: String,
}

impl CheckoutUrls {
    pub fn for_client(client_url: &str) -> Self {
        let client_url = client_url.trim_end_matches('/');
        Self {
            success: format!("{client_url}/success?session_id={{CHECKOUT_SESSION_ID}}"),
            cancel: format!("{client_url}/cancel"),
        }
    }
}

/// Form body for `POST /v1/checkout/sessions`.
pub fn checkout_form(items: &[CheckoutItem], currency: &str, urls: &CheckoutUrls) -> Vec<(String, String)> {
    let mut form = vec![
        ("payment_method_types[0]".to_string(), "card".to_string()),
        ("mode".to_string(), "payment".to_string()),
    ];
    for (i, item) in items.iter().enumerate() {
        let prefix = format!("line_items[{i}]");
        form.push((format!("{prefix}[price_data][currency]"), currency.to_string()));
        form.push((format!("{prefix}[price_data][product_data][name]"), item.title.clone()));
        form.push((
            format!("{prefix}[price_data][product_data][description]"),
            format!("Quantity: {}", item.qty),
        ));
        form.push((
            format!("{prefix}[price_data][unit_amount]"),
            (item.price.round() as i64).to_string(),
        ));
        form.push((format!("{prefix}[quantity]"), item.qty.to_string()));
    }
    form.push(("success_url".to_string(), urls.success.clone()));
    form.push(("cancel_url".to_string(), urls.cancel.clone()));
    form
}

#[derive(Deserialize)]
struct StripeSession {
    id: String,
    #[serde(default)]
    status: Option<String>,
    #[serde(default)]
    payment_status: Option<String>,
}

#[derive(Deserialize)]
struct StripeErrorBody {
    error: StripeErrorDetail,
}

#[derive(Deserialize)]
struct StripeErrorDetail {
    #[serde(default)]
    message: String,
}

/// The session id is pushed as a single escaped path segment, so it can never
/// reach another Stripe endpoint or add a query string.
pub fn session_url(session_id: &str) -> Result<reqwest::Url, PaymentError> {
    let invalid = || PaymentError::SessionUrl(session_id.to_string());
    let mut url = reqwest::Url::parse(STRIPE_API).map_err(|_| invalid())?;
    url.path_segments_mut()
        .map_err(|_| invalid())?
        .extend(["checkout", "sessions", session_id]);
    Ok(url)
}

pub struct StripeGateway {
    client: reqwest::Client,
    secret_key: Option<String>,
    currency: String,
    urls: CheckoutUrls,
}

impl StripeGateway {
    pub fn new(secret_key: Option<String>, currency: &str, urls: CheckoutUrls) -> Self {
        Self {
            client: reqwest::Client::new(),
            secret_key: secret_key.filter(|key| !key.is_empty()),
            currency: currency.to_string(),
            urls,
        }
    }

    fn key(&self) -> Result<&str, PaymentError> {
        self.secret_key.as_deref().ok_or(PaymentError::NotConfigured)
    }

    async fn read_session(response: reqwest::Response) -> Result<StripeSession, PaymentError> {
        let status = response.status();
        if status.is_success() {
            return Ok(response.json::<StripeSession>().await?);
        }
        let message = match response.json::<StripeErrorBody>().await {
            Ok(body) => body.error.message,
            Err(_) => status.canonical_reason().unwrap_or("unknown error").to_string(),
        };
        Err(PaymentError::Gateway {
            status: status.as_u16(),
            message,
        })
    }
}

#[rocket::async_trait]
impl PaymentGateway for StripeGateway {
    async fn create_session(&self, items: &[CheckoutItem]) -> Result<CheckoutSession, PaymentError> {
        let response = self
            .client
            .post(format!("{STRIPE_API}/checkout/sessions"))
            .bearer_auth(self.key()?)
            .form(&checkout_form(items, &self.currency, &self.urls))
            .send()
            .await?;
        let session = Self::read_session(response).await?;
        tracing::info!(session_id = %session.id, items = items.len(), "checkout session created");
        Ok(CheckoutSession { id: session.id })
    }

    async fn session_status(&self, session_id: &str) -> Result<SessionStatus, PaymentError> {
        let response = self
            .client
            .get(session_url(session_id)?)
            .bearer_auth(self.key()?)
            .send()
            .await?;
        let session = Self::read_session(response).await?;
        Ok(SessionStatus {
            id: session.id,
            status: session.status,
            payment_status: session.payment_status,
        })
    }
}

pub struct Payments {
    gateway: Arc<dyn PaymentGateway>,
}

impl Payments {
    pub fn new(gateway: Arc<dyn PaymentGateway>) -> Self {
        Payments { gateway }
    }

    pub async fn create_checkout_session(&self, items: &[CheckoutItem]) -> Result<CheckoutSession, MarketError> {
        if items.is_empty() {
            return Err(MarketError::validation("No items in cart"));
        }
        if let Some(bad) = items.iter().find(|i| i.qty == 0 || !i.price.is_finite() || i.price < 0.0) {
            return Err(MarketError::validation(format!("Invalid cart line: {}", bad.title)));
        }
        Ok(self.gateway.create_session(items).await?)
    }

    pub async fn session_status(&self, session_id: &str) -> Result<SessionStatus, MarketError> {
        Ok(self.gateway.session_status(session_id).await?)
    }
}
