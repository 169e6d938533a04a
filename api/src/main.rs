mod config;
mod error;
mod jwt;
mod media;
mod models;
mod repository;
mod routes;
mod services;
#[cfg(test)]
mod testing;

use std::sync::Arc;

use rocket::fairing::{Fairing, Info, Kind};
use rocket::fs::{FileServer, Options};
use rocket::http::{Header, Status};
use rocket::serde::json::Json;
use rocket::{catch, catchers, options, Build, Request, Response, Rocket};
use thiserror::Error;
use tracing_subscriber::EnvFilter;

use config::app_config::{AppConfig, ConfigError};
use config::mongo_config::setup_mongo;
use error::ErrorBody;
use jwt::jwt_helper::JwtKeys;
use media::MediaUrls;
use repository::order_repository::OrderRepository;
use repository::product_repository::ProductRepository;
use repository::seller_repository::SellerRepository;
use repository::user_repository::UserRepository;
use repository::{OrderStore, ProductStore, RepositoryError, SellerStore, UserStore};
use services::catalog::Catalog;
use services::identity::IdentityResolver;
use services::inspiration::Inspiration;
use services::mailer::{DisabledMailer, Mailer, NotificationError, SmtpMailer};
use services::order_intake::OrderIntake;
use services::payment::{CheckoutUrls, PaymentGateway, Payments, StripeGateway};
use services::seller_service::SellerProfiles;
use services::upload::UploadStore;

#[derive(Debug, Error)]
enum StartupError {
    #[error("configuration: {0}")]
    Config(#[from] ConfigError),
    #[error("database: {0}")]
    Database(#[from] mongodb::error::Error),
    #[error("indexes: {0}")]
    Repository(#[from] RepositoryError),
    #[error("mailer: {0}")]
    Mailer(#[from] NotificationError),
    #[error("upload directory: {0}")]
    Io(#[from] std::io::Error),
    #[error("server: {0}")]
    Rocket(#[from] rocket::Error),
}

/// Echoes the request origin back, with credentials, only when it is listed
/// explicitly. A `*` entry opens anonymous access without credentials.
pub struct Cors {
    allowed_origins: Vec<String>,
}

impl Cors {
    fn lists(&self, origin: &str) -> bool {
        self.allowed_origins
            .iter()
            .any(|allowed| allowed != "*" && allowed.trim_end_matches('/') == origin)
    }

    fn wildcard(&self) -> bool {
        self.allowed_origins.iter().any(|allowed| allowed == "*")
    }
}

#[rocket::async_trait]
impl Fairing for Cors {
    fn info(&self) -> Info {
        Info {
            name: "Add CORS headers to responses",
            kind: Kind::Response,
        }
    }

    async fn on_response<'r>(&self, request: &'r Request<'_>, response: &mut Response<'r>) {
        if let Some(origin) = request.headers().get_one("Origin") {
            if self.lists(origin) {
                response.set_header(Header::new("Access-Control-Allow-Origin", origin.to_string()));
                response.set_header(Header::new("Access-Control-Allow-Credentials", "true"));
                response.set_header(Header::new("Vary", "Origin"));
            } else if self.wildcard() {
                response.set_header(Header::new("Access-Control-Allow-Origin", "*"));
            }
        }
        response.set_header(Header::new(
            "Access-Control-Allow-Methods",
            "POST, GET, PUT, DELETE, OPTIONS",
        ));
        response.set_header(Header::new(
            "Access-Control-Allow-Headers",
            "Content-Type, Authorization",
        ));
    }
}

// Preflight requests for any path.
#[options("/<_..>")]
fn all_options() -> Status {
    Status::Ok
}

#[catch(404)]
fn not_found(req: &Request) -> Json<ErrorBody> {
    ErrorBody::new(format!("'{}' route not found", req.uri()))
}

#[catch(401)]
fn unauthorized() -> Json<ErrorBody> {
    ErrorBody::new("Not authorized, token missing or invalid")
}

#[catch(400)]
fn bad_request() -> Json<ErrorBody> {
    ErrorBody::new("Malformed request")
}

#[catch(422)]
fn unprocessable() -> Json<ErrorBody> {
    ErrorBody::new("Request body could not be parsed")
}

#[catch(500)]
fn internal_error() -> Json<ErrorBody> {
    ErrorBody::new("Internal server error")
}

/// Persistence seams the services are built on.
pub struct Stores {
    pub sellers: Arc<dyn SellerStore>,
    pub products: Arc<dyn ProductStore>,
    pub users: Arc<dyn UserStore>,
    pub orders: Arc<dyn OrderStore>,
}

/// Outbound collaborators.
pub struct Gateways {
    pub mailer: Arc<dyn Mailer>,
    pub payments: Arc<dyn PaymentGateway>,
}

fn assemble(
    config: AppConfig,
    stores: Stores,
    gateways: Gateways,
    uploads: UploadStore,
) -> Result<Rocket<Build>, ConfigError> {
    let media = MediaUrls::new(&config.public_base_url)?;
    let files = FileServer::new(uploads.dir(), Options::Missing);

    let identity = IdentityResolver::new(stores.sellers.clone(), stores.users, media.clone());
    let profiles = SellerProfiles::new(stores.sellers.clone(), media.clone());
    let catalog = Catalog::new(stores.products, stores.sellers, media);
    let intake = OrderIntake::new(stores.orders, gateways.mailer);
    let payments = Payments::new(gateways.payments);
    let inspiration = Inspiration::new(config.unsplash_access_key.clone());
    let cors = Cors {
        allowed_origins: config.allowed_origins.clone(),
    };

    Ok(rocket::build()
        .manage(JwtKeys::from_secret(&config.jwt_secret))
        .manage(identity)
        .manage(profiles)
        .manage(catalog)
        .manage(intake)
        .manage(payments)
        .manage(inspiration)
        .manage(uploads)
        .manage(config)
        .attach(cors)
        .mount("/", rocket::routes![all_options])
        .mount("/api/seller", routes::seller_routes::routes())
        .mount("/api/products", routes::product_routes::routes())
        .mount("/api/orders", routes::order_routes::routes())
        .mount("/api/payments", routes::payment_routes::routes())
        .mount("/api/creative", routes::creative_routes::routes())
        .mount("/uploads", files)
        .register(
            "/",
            catchers![not_found, unauthorized, bad_request, unprocessable, internal_error],
        ))
}

fn init_tracing() {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("scrapcraft_api=info,rocket=warn"));
    tracing_subscriber::fmt().with_env_filter(filter).init();
}

#[rocket::main]
async fn main() -> Result<(), StartupError> {
    init_tracing();
    let config = AppConfig::load()?;
    tracing::info!(?config, "configuration loaded");

    let client = setup_mongo(&config).await?;
    let database = config.mongo_database.as_str();
    let sellers = SellerRepository::new(&client, database);
    sellers.ensure_indexes().await?;
    let stores = Stores {
        sellers: Arc::new(sellers),
        products: Arc::new(ProductRepository::new(&client, database)),
        users: Arc::new(UserRepository::new(&client, database)),
        orders: Arc::new(OrderRepository::new(&client, database)),
    };

    let mailer: Arc<dyn Mailer> = match config.smtp_credentials() {
        Some((user, password)) => Arc::new(SmtpMailer::new(
            &config.smtp_host,
            config.smtp_port,
            user,
            password,
        )?),
        None => {
            tracing::warn!("EMAIL_USER/EMAIL_PASSWORD not set, order emails will be dropped");
            Arc::new(DisabledMailer)
        }
    };
    let stripe = StripeGateway::new(
        config.stripe_secret_key.clone(),
        &config.stripe_currency,
        CheckoutUrls::for_client(&config.client_url),
    );
    let gateways = Gateways {
        mailer,
        payments: Arc::new(stripe),
    };

    let uploads = UploadStore::new(config.upload_dir.clone());
    uploads.ensure_dir().await?;

    assemble(config, stores, gateways, uploads)?.launch().await?;
    Ok(())
}
