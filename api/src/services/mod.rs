pub mod auth_guard;
pub mod catalog;
pub mod identity;
pub mod input;
pub mod inspiration;
pub mod mailer;
pub mod order_intake;
pub mod payment;
pub mod seller_service;
pub mod upload;
