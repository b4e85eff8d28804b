use actix_web::{web, HttpResponse};
use serde::Serialize;
use utoipa::ToSchema;
use uuid::Uuid;

use crate::application::{CheckoutService, LinkDetails};
use crate::domain::order::Product;
use crate::errors::AppError;

#[derive(Debug, Serialize, ToSchema)]
pub struct ProductResponse {
    pub id: i64,
    pub title: String,
    pub description: Option<String>,
    pub image: Option<String>,
    pub price: String,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct AmbassadorResponse {
    pub id: Uuid,
    pub email: String,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct LinkResponse {
    pub code: String,
    pub user: AmbassadorResponse,
    pub products: Vec<ProductResponse>,
}

impl From<Product> for ProductResponse {
    fn from(p: Product) -> Self {
        ProductResponse {
            id: p.id,
            title: p.title,
            description: p.description,
            image: p.image,
            price: p.price.to_string(),
        }
    }
}

impl From<LinkDetails> for LinkResponse {
    fn from(details: LinkDetails) -> Self {
        LinkResponse {
            code: details.link.code,
            user: AmbassadorResponse {
                id: details.link.ambassador_id,
                email: details.link.ambassador_email,
            },
            products: details.products.into_iter().map(ProductResponse::from).collect(),
        }
    }
}

/// GET /links/{code}
///
/// Returns the referral link with its ambassador and purchasable products.
#[utoipa::path(
    get,
    path = "/links/{code}",
    params(
        ("code" = String, Path, description = "Referral code"),
    ),
    responses(
        (status = 200, description = "Link found", body = LinkResponse),
        (status = 404, description = "No link with this code"),
    ),
    tag = "links"
)]
pub async fn get_link(
    service: web::Data<CheckoutService>,
    path: web::Path<String>,
) -> Result<HttpResponse, AppError> {
    match service.link_details(&path.into_inner()).await? {
        Some(details) => Ok(HttpResponse::Ok().json(LinkResponse::from(details))),
        None => Err(AppError::NotFound),
    }
}
