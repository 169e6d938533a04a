use rocket::form::{Form, FromForm};
use rocket::fs::TempFile;
use rocket::http::Status;
use rocket::serde::json::Json;
use rocket::{get, post, put, routes, Route, State};
use serde::Serialize;

use crate::error::{ApiResponse, MarketError};
use crate::models::seller::{SellerProfileInput, SellerView};
use crate::services::auth_guard::Principal;
use crate::services::identity::IdentityResolver;
use crate::services::seller_service::SellerProfiles;
use crate::services::upload::UploadStore;

#[derive(FromForm)]
pub struct SellerForm<'r> {
    username: Option<String>,
    #[field(name = "fullName")]
    full_name: Option<String>,
    #[field(name = "contactEmail")]
    contact_email: Option<String>,
    phone: Option<String>,
    #[field(name = "sellerType")]
    seller_type: Vec<String>,
    address: Option<String>,
    city: Option<String>,
    country: Option<String>,
    bio: Option<String>,
    facebook: Option<String>,
    instagram: Option<String>,
    linkedin: Option<String>,
    faqs: Option<String>,
    #[field(name = "profilePicture")]
    profile_picture: Option<TempFile<'r>>,
}

impl SellerForm<'_> {
    fn input(&mut self) -> SellerProfileInput {
        SellerProfileInput {
            username: self.username.take(),
            full_name: self.full_name.take(),
            contact_email: self.contact_email.take(),
            phone: self.phone.take(),
            seller_type: std::mem::take(&mut self.seller_type),
            address: self.address.take(),
            city: self.city.take(),
            country: self.country.take(),
            bio: self.bio.take(),
            facebook: self.facebook.take(),
            instagram: self.instagram.take(),
            linkedin: self.linkedin.take(),
            faqs: self.faqs.take(),
        }
    }
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ProfileCheck {
    has_profile: bool,
}

#[post("/create", data = "<form>")]
async fn create_profile(
    principal: Principal,
    identity: &State<IdentityResolver>,
    uploads: &State<UploadStore>,
    mut form: Form<SellerForm<'_>>,
) -> Result<(Status, Json<ApiResponse<SellerView>>), MarketError> {
    let picture = uploads.store_opt(form.profile_picture.as_mut()).await?;
    let seller = identity.create_profile(&principal, form.input(), picture).await?;
    Ok((
        Status::Created,
        ApiResponse::ok("Seller profile created successfully", seller),
    ))
}

#[get("/profile")]
async fn own_profile(
    principal: Principal,
    profiles: &State<SellerProfiles>,
) -> Result<Json<ApiResponse<SellerView>>, MarketError> {
    let seller = profiles.get_by_email(&principal.email).await?;
    Ok(ApiResponse::ok("Seller profile fetched", seller))
}

#[get("/profile-check")]
async fn profile_check(
    principal: Principal,
    identity: &State<IdentityResolver>,
) -> Result<Json<ApiResponse<ProfileCheck>>, MarketError> {
    let has_profile = identity.profile_exists(&principal.email).await?;
    Ok(ApiResponse::ok("Profile check complete", ProfileCheck { has_profile }))
}

#[get("/profile/username/<username>")]
async fn public_profile(
    username: &str,
    profiles: &State<SellerProfiles>,
) -> Result<Json<ApiResponse<SellerView>>, MarketError> {
    let seller = profiles.get_by_username(username).await?;
    Ok(ApiResponse::ok("Seller profile fetched", seller))
}

#[put("/update", data = "<form>")]
async fn update_profile(
    principal: Principal,
    profiles: &State<SellerProfiles>,
    uploads: &State<UploadStore>,
    mut form: Form<SellerForm<'_>>,
) -> Result<Json<ApiResponse<SellerView>>, MarketError> {
    let picture = uploads.store_opt(form.profile_picture.as_mut()).await?;
    let seller = profiles.update(&principal.email, form.input(), picture).await?;
    Ok(ApiResponse::ok("Seller profile updated successfully", seller))
}

#[get("/<id>")]
async fn seller_by_id(
    id: &str,
    profiles: &State<SellerProfiles>,
) -> Result<Json<ApiResponse<SellerView>>, MarketError> {
    let seller = profiles.get_by_id(id).await?;
    Ok(ApiResponse::ok("Seller profile fetched", seller))
}

pub fn routes() -> Vec<Route> {
    routes![
        create_profile,
        own_profile,
        profile_check,
        public_profile,
        update_profile,
        seller_by_id
    ]
}
