use rocket::serde::json::Json;
use rocket::{get, post, routes, Route, State};

use crate::error::MarketError;
use crate::services::payment::{CheckoutRequest, CheckoutSession, Payments, SessionStatus};

#[post("/create-checkout-session", format = "json", data = "<request>")]
async fn create_checkout_session(
    payments: &State<Payments>,
    request: Json<CheckoutRequest>,
) -> Result<Json<CheckoutSession>, MarketError> {
    let session = payments.create_checkout_session(&request.items).await?;
    Ok(Json(session))
}

#[get("/session/<session_id>")]
async fn session_status(
    session_id: &str,
    payments: &State<Payments>,
) -> Result<Json<SessionStatus>, MarketError> {
    Ok(Json(payments.session_status(session_id).await?))
}

pub fn routes() -> Vec<Route> {
    routes![create_checkout_session, session_status]
}
