//! HTTP surface. Each module exposes the routes mounted under its prefix.

pub mod creative_routes;
pub mod order_routes;
pub mod payment_routes;
pub mod product_routes;
pub mod seller_routes;
