use std::str::FromStr;

use actix_web::{web, HttpResponse};
use bigdecimal::BigDecimal;
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::{json, Value};
use utoipa::ToSchema;
use uuid::Uuid;

use crate::application::{CheckoutOutcome, CheckoutService};
use crate::domain::order::{CheckoutSubmission, LineRequest, OrderFilter, OrderItemView, OrderView};
use crate::errors::AppError;

// ── Request / response DTOs ──────────────────────────────────────────────────

#[derive(Debug, Deserialize, ToSchema)]
pub struct CheckoutLineRequest {
    pub product_id: i64,
    /// Decimal quantity, as a JSON number or string, e.g. 2 or "1.5"
    #[serde(deserialize_with = "decimal_from_number_or_string")]
    #[schema(value_type = String, example = "2")]
    pub quantity: BigDecimal,
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct CheckoutRequest {
    pub code: String,
    pub first_name: String,
    pub last_name: String,
    pub email: String,
    pub address: Option<String>,
    pub country: Option<String>,
    pub city: Option<String>,
    pub zip_code: Option<String>,
    pub products: Vec<CheckoutLineRequest>,
}

impl From<CheckoutRequest> for CheckoutSubmission {
    fn from(body: CheckoutRequest) -> Self {
        CheckoutSubmission {
            code: body.code,
            first_name: body.first_name,
            last_name: body.last_name,
            email: body.email,
            address: body.address,
            country: body.country,
            city: body.city,
            zip_code: body.zip_code,
            products: body
                .products
                .into_iter()
                .map(|l| LineRequest {
                    product_id: l.product_id,
                    quantity: l.quantity,
                })
                .collect(),
        }
    }
}

#[derive(Debug, Serialize, ToSchema)]
pub struct CheckoutResponse {
    pub order_id: Uuid,
    pub session_id: String,
    pub url: Option<String>,
    /// The payment provider's session object.
    #[schema(value_type = Object)]
    pub session: Value,
}

impl From<CheckoutOutcome> for CheckoutResponse {
    fn from(outcome: CheckoutOutcome) -> Self {
        CheckoutResponse {
            order_id: outcome.order_id,
            session_id: outcome.session.id,
            url: outcome.session.url,
            session: outcome.session.raw,
        }
    }
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct ConfirmRequest {
    /// Payment session id reported by the provider. Anything other than a
    /// string matches no order.
    #[serde(default)]
    #[schema(value_type = Option<String>)]
    pub source: Option<Value>,
}

impl ConfirmRequest {
    pub fn session_id(&self) -> Option<&str> {
        self.source.as_ref().and_then(Value::as_str)
    }
}

#[derive(Debug, Serialize, ToSchema)]
pub struct OrderItemResponse {
    pub id: Uuid,
    pub product_id: Option<i64>,
    pub product_title: String,
    pub price: String,
    pub quantity: String,
    pub ambassador_revenue: String,
    pub admin_revenue: String,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct OrderResponse {
    pub id: Uuid,
    pub transaction_id: Option<String>,
    pub code: String,
    pub ambassador_id: Uuid,
    pub ambassador_email: String,
    pub first_name: String,
    pub last_name: String,
    pub email: String,
    pub address: Option<String>,
    pub country: Option<String>,
    pub city: Option<String>,
    pub zip_code: Option<String>,
    pub complete: bool,
    pub total: String,
    pub ambassador_revenue: String,
    pub admin_revenue: String,
    pub created_at: String,
    pub order_items: Vec<OrderItemResponse>,
}

impl From<OrderItemView> for OrderItemResponse {
    fn from(item: OrderItemView) -> Self {
        OrderItemResponse {
            id: item.id,
            product_id: item.product_id,
            product_title: item.product_title,
            price: item.price.to_string(),
            quantity: item.quantity.to_string(),
            ambassador_revenue: item.ambassador_revenue.to_string(),
            admin_revenue: item.admin_revenue.to_string(),
        }
    }
}

impl From<OrderView> for OrderResponse {
    fn from(order: OrderView) -> Self {
        let total = order.total().to_string();
        let ambassador_revenue = order.ambassador_revenue().to_string();
        let admin_revenue = order.admin_revenue().to_string();
        OrderResponse {
            id: order.id,
            transaction_id: order.transaction_id,
            code: order.code,
            ambassador_id: order.ambassador_id,
            ambassador_email: order.ambassador_email,
            first_name: order.customer.first_name,
            last_name: order.customer.last_name,
            email: order.customer.email,
            address: order.customer.address,
            country: order.customer.country,
            city: order.customer.city,
            zip_code: order.customer.zip_code,
            complete: order.complete,
            total,
            ambassador_revenue,
            admin_revenue,
            created_at: order.created_at.to_rfc3339(),
            order_items: order.items.into_iter().map(OrderItemResponse::from).collect(),
        }
    }
}

// ── Pagination ───────────────────────────────────────────────────────────────

#[derive(Debug, Deserialize, ToSchema)]
pub struct ListOrdersParams {
    /// Page number (1-based). Defaults to 1.
    #[serde(default = "default_page")]
    pub page: i64,
    /// Number of items per page. Defaults to 20, maximum 100.
    #[serde(default = "default_limit")]
    pub limit: i64,
    /// Only orders with this completion state.
    pub complete: Option<bool>,
}

fn default_page() -> i64 {
    1
}

fn default_limit() -> i64 {
    20
}

#[derive(Debug, Serialize, ToSchema)]
pub struct ListOrdersResponse {
    pub items: Vec<OrderResponse>,
    pub total: i64,
    pub page: i64,
    pub limit: i64,
}

#[derive(Deserialize)]
#[serde(untagged)]
enum NumberOrString {
    Number(serde_json::Number),
    String(String),
}

/// Parses a decimal from its textual form so `0.1` stays exactly `0.1`.
fn decimal_from_number_or_string<'de, D>(deserializer: D) -> Result<BigDecimal, D::Error>
where
    D: Deserializer<'de>,
{
    let text = match NumberOrString::deserialize(deserializer)? {
        NumberOrString::Number(n) => n.to_string(),
        NumberOrString::String(s) => s,
    };
    BigDecimal::from_str(text.trim()).map_err(serde::de::Error::custom)
}

// ── Handlers ─────────────────────────────────────────────────────────────────

/// POST /orders
///
/// Places an order through a referral link. The order and all of its items
/// are committed in one transaction before the payment session is opened.
/// If the session cannot be opened the order stays recorded and the response
/// carries its id so the session can be retried.
#[utoipa::path(
    post,
    path = "/orders",
    request_body = CheckoutRequest,
    responses(
        (status = 200, description = "Order placed, payment session opened", body = CheckoutResponse),
        (status = 400, description = "Invalid code, unknown product or malformed submission"),
        (status = 502, description = "Order recorded but the payment session failed"),
        (status = 504, description = "Order recorded but the payment provider timed out"),
    ),
    tag = "orders"
)]
pub async fn place_order(
    service: web::Data<CheckoutService>,
    body: web::Json<CheckoutRequest>,
) -> Result<HttpResponse, AppError> {
    let outcome = service.place_order(body.into_inner().into()).await?;
    Ok(HttpResponse::Ok().json(CheckoutResponse::from(outcome)))
}

/// POST /orders/confirm
///
/// Completes the order paid through the given payment session. Repeated
/// deliveries of the same confirmation are acknowledged without side effects.
#[utoipa::path(
    post,
    path = "/orders/confirm",
    request_body = ConfirmRequest,
    responses(
        (status = 200, description = "Order completed"),
        (status = 404, description = "Missing, malformed or unknown payment session id"),
    ),
    tag = "orders"
)]
pub async fn confirm_order(
    service: web::Data<CheckoutService>,
    body: web::Json<ConfirmRequest>,
) -> Result<HttpResponse, AppError> {
    service.confirm(body.session_id()).await?;
    Ok(HttpResponse::Ok().json(json!({ "message": "Success!" })))
}

/// POST /orders/{id}/payment-session
///
/// Opens a new payment session for an order whose previous attempt failed.
#[utoipa::path(
    post,
    path = "/orders/{id}/payment-session",
    params(
        ("id" = Uuid, Path, description = "Order UUID"),
    ),
    responses(
        (status = 200, description = "Payment session opened", body = CheckoutResponse),
        (status = 404, description = "Order not found"),
        (status = 409, description = "Order already has a payment session"),
        (status = 502, description = "Payment session failed"),
    ),
    tag = "orders"
)]
pub async fn retry_payment_session(
    service: web::Data<CheckoutService>,
    path: web::Path<Uuid>,
) -> Result<HttpResponse, AppError> {
    let outcome = service.retry_payment_session(path.into_inner()).await?;
    Ok(HttpResponse::Ok().json(CheckoutResponse::from(outcome)))
}

/// GET /orders/sessions/{session_id}
///
/// Returns the order a payment session was opened for.
#[utoipa::path(
    get,
    path = "/orders/sessions/{session_id}",
    params(
        ("session_id" = String, Path, description = "Payment session id"),
    ),
    responses(
        (status = 200, description = "Order found", body = OrderResponse),
        (status = 404, description = "No order carries this session"),
        (status = 500, description = "Internal server error"),
    ),
    tag = "orders"
)]
pub async fn get_order_by_session(
    service: web::Data<CheckoutService>,
    path: web::Path<String>,
) -> Result<HttpResponse, AppError> {
    match service.find_by_session(&path.into_inner()).await? {
        Some(order) => Ok(HttpResponse::Ok().json(OrderResponse::from(order))),
        None => Err(AppError::NotFound),
    }
}

/// GET /orders/{id}
///
/// Returns the order together with its items and revenue totals.
#[utoipa::path(
    get,
    path = "/orders/{id}",
    params(
        ("id" = Uuid, Path, description = "Order UUID"),
    ),
    responses(
        (status = 200, description = "Order found", body = OrderResponse),
        (status = 404, description = "Order not found"),
        (status = 500, description = "Internal server error"),
    ),
    tag = "orders"
)]
pub async fn get_order(
    service: web::Data<CheckoutService>,
    path: web::Path<Uuid>,
) -> Result<HttpResponse, AppError> {
    match service.get_order(path.into_inner()).await? {
        Some(order) => Ok(HttpResponse::Ok().json(OrderResponse::from(order))),
        None => Err(AppError::NotFound),
    }
}

/// GET /orders
///
/// Returns a paginated list of orders, newest first.
/// Use `page` (1-based) and `limit` to control pagination.
#[utoipa::path(
    get,
    path = "/orders",
    params(
        ("page" = Option<i64>, Query, description = "Page number (1-based, default 1)"),
        ("limit" = Option<i64>, Query, description = "Items per page (default 20, max 100)"),
        ("complete" = Option<bool>, Query, description = "Filter by completion state"),
    ),
    responses(
        (status = 200, description = "Paginated list of orders", body = ListOrdersResponse),
        (status = 500, description = "Internal server error"),
    ),
    tag = "orders"
)]
pub async fn list_orders(
    service: web::Data<CheckoutService>,
    query: web::Query<ListOrdersParams>,
) -> Result<HttpResponse, AppError> {
    let params = query.into_inner();
    let page = params.page.max(1);
    let limit = params.limit.clamp(1, 100);
    let filter = OrderFilter {
        complete: params.complete,
    };

    let result = service.list_orders(filter, page, limit).await?;

    Ok(HttpResponse::Ok().json(ListOrdersResponse {
        items: result.items.into_iter().map(OrderResponse::from).collect(),
        total: result.total,
        page,
        limit,
    }))
}
