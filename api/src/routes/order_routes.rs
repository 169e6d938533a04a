use rocket::http::Status;
use rocket::serde::json::Json;
use rocket::{post, routes, Route, State};

use crate::error::MarketError;
use crate::models::order::{OrderPlaced, OrderRequest};
use crate::services::order_intake::OrderIntake;

/// Stores the order, then sends notifications on a background task so a
/// slow SMTP server never holds up the response.
#[post("/", format = "json", data = "<request>")]
async fn place_order(
    intake: &State<OrderIntake>,
    request: Json<OrderRequest>,
) -> Result<(Status, Json<OrderPlaced>), MarketError> {
    let order = intake.place(request.into_inner()).await?;
    let order_id = order.id.to_hex();

    let notifier = intake.inner().clone();
    tokio::spawn(async move {
        notifier.notify(&order).await;
    });

    Ok((
        Status::Created,
        Json(OrderPlaced {
            success: true,
            order_id,
        }),
    ))
}

pub fn routes() -> Vec<Route> {
    routes![place_order]
}
