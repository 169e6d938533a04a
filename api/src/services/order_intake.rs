//! Order placement and the notification fan-out that follows it.

use std::sync::Arc;

use askama::Template;
use mongodb::bson::oid::ObjectId;
use mongodb::bson::DateTime;

use crate::error::MarketError;
use crate::models::order::{Order, OrderItem, OrderRequest, DEFAULT_PAYMENT_METHOD, PENDING};
use crate::repository::OrderStore;
use crate::services::mailer::{Email, Mailer};

struct LineRow {
    title: String,
    qty: u32,
    total: String,
}

impl LineRow {
    fn from_item(item: &OrderItem) -> Self {
        Self {
            title: item.title.clone(),
            qty: item.qty,
            total: money(item.line_total()),
        }
    }
}

#[derive(Template)]
#[template(path = "email/order_buyer.html")]
struct BuyerEmail<'a> {
    buyer_name: &'a str,
    order_id: &'a str,
    currency: &'a str,
    lines: &'a [LineRow],
    total: &'a str,
}

#[derive(Template)]
#[template(path = "email/order_seller.html")]
struct SellerEmail<'a> {
    buyer_name: &'a str,
    buyer_email: &'a str,
    address: &'a str,
    currency: &'a str,
    lines: &'a [LineRow],
    subtotal: &'a str,
}

fn money(amount: f64) -> String {
    format!("{amount:.2}")
}

#[derive(Clone)]
pub struct OrderIntake {
    orders: Arc<dyn OrderStore>,
    mailer: Arc<dyn Mailer>,
}

impl OrderIntake {
    pub fn new(orders: Arc<dyn OrderStore>, mailer: Arc<dyn Mailer>) -> Self {
        OrderIntake { orders, mailer }
    }

    pub async fn place(&self, request: OrderRequest) -> Result<Order, MarketError> {
        let email = request.email.trim().to_string();
        if email.is_empty() {
            return Err(MarketError::validation("Buyer email is required"));
        }
        if request.items.is_empty() {
            return Err(MarketError::validation("Order must contain at least one item"));
        }
        let items = request
            .items
            .into_iter()
            .map(|item| {
                let product_id = ObjectId::parse_str(&item.product_id).map_err(|_| {
                    MarketError::validation(format!("Invalid product id: {}", item.product_id))
                })?;
                if item.qty == 0 {
                    return Err(MarketError::validation("Item quantity must be at least 1"));
                }
                Ok(OrderItem {
                    product_id,
                    title: item.title,
                    price: item.price,
                    qty: item.qty,
                    image: item.image,
                    seller_email: item.seller_email.trim().to_string(),
                })
            })
            .collect::<Result<Vec<_>, _>>()?;

        let now = DateTime::now();
        let payment_method = request
            .payment_method
            .filter(|method| !method.trim().is_empty())
            .unwrap_or_else(|| DEFAULT_PAYMENT_METHOD.to_string());
        let order = Order {
            id: ObjectId::new(),
            email,
            shipping: request.shipping,
            payment_method,
            items,
            pricing: request.pricing,
            status: PENDING.to_string(),
            created_at: now,
            updated_at: now,
        };
        self.orders.insert(&order).await?;
        tracing::info!(order_id = %order.id, items = order.items.len(), "order placed");
        Ok(order)
    }

    /// Never fails; every delivery problem is logged and skipped.
    pub async fn notify(&self, order: &Order) {
        let emails = match compose_notifications(order) {
            Ok(emails) => emails,
            Err(err) => {
                tracing::error!(order_id = %order.id, error = %err, "failed to render order emails");
                return;
            }
        };
        for email in emails {
            let to = email.to.clone();
            if let Err(err) = self.mailer.send(email).await {
                tracing::error!(order_id = %order.id, to = %to, error = %err, "order email failed");
            }
        }
    }
}

/// One email for the buyer, then one per distinct seller in first-seen order.
pub fn compose_notifications(order: &Order) -> Result<Vec<Email>, askama::Error> {
    let shipping = &order.shipping;
    let buyer_name = format!("{} {}", shipping.first_name, shipping.last_name)
        .trim()
        .to_string();
    let order_id = order.id.to_hex();
    let currency = if order.pricing.currency.is_empty() {
        "Rs."
    } else {
        order.pricing.currency.as_str()
    };

    let lines: Vec<LineRow> = order.items.iter().map(LineRow::from_item).collect();
    let mut emails = vec![Email {
        to: order.email.clone(),
        subject: "Order Placed Successfully".to_string(),
        html: BuyerEmail {
            buyer_name: &buyer_name,
            order_id: &order_id,
            currency,
            lines: &lines,
            total: &money(order.pricing.total),
        }
        .render()?,
    }];

    let address = [
        shipping.address1.as_str(),
        shipping.city.as_str(),
        shipping.province.as_str(),
        shipping.country.as_str(),
    ]
    .into_iter()
    .filter(|part| !part.is_empty())
    .collect::<Vec<_>>()
    .join(", ");

    let mut sellers: Vec<&str> = Vec::new();
    for item in &order.items {
        if !item.seller_email.is_empty() && !sellers.contains(&item.seller_email.as_str()) {
            sellers.push(&item.seller_email);
        }
    }
    for seller in sellers {
        let items: Vec<&OrderItem> = order.items.iter().filter(|i| i.seller_email == seller).collect();
        let subtotal: f64 = items.iter().map(|i| i.line_total()).sum();
        let lines: Vec<LineRow> = items.into_iter().map(LineRow::from_item).collect();
        emails.push(Email {
            to: seller.to_string(),
            subject: "New Order Received".to_string(),
            html: SellerEmail {
                buyer_name: &buyer_name,
                buyer_email: &order.email,
                address: &address,
                currency,
                lines: &lines,
                subtotal: &money(subtotal),
            }
            .render()?,
        });
    }
    Ok(emails)
}
