use bigdecimal::BigDecimal;
use chrono::{DateTime, Utc};
use diesel::prelude::*;
use serde_json::Value;
use uuid::Uuid;

use crate::domain::order::{CustomerDetails, OrderItemView, OrderView, Product};
use crate::schema::{checkout_outbox, links, order_items, orders, products};

#[derive(Debug, Clone, Queryable, Selectable, Identifiable)]
#[diesel(table_name = orders)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub struct OrderRow {
    pub id: Uuid,
    pub transaction_id: Option<String>,
    pub code: String,
    pub ambassador_id: Uuid,
    pub ambassador_email: String,
    pub first_name: String,
    pub last_name: String,
    pub email: String,
    pub address: Option<String>,
    pub city: Option<String>,
    pub country: Option<String>,
    pub zip_code: Option<String>,
    pub complete: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Insertable)]
#[diesel(table_name = orders)]
pub struct NewOrderRow {
    pub id: Uuid,
    pub code: String,
    pub ambassador_id: Uuid,
    pub ambassador_email: String,
    pub first_name: String,
    pub last_name: String,
    pub email: String,
    pub address: Option<String>,
    pub city: Option<String>,
    pub country: Option<String>,
    pub zip_code: Option<String>,
}

#[derive(Debug, Clone, Queryable, Selectable, Identifiable, Associations)]
#[diesel(table_name = order_items)]
#[diesel(belongs_to(OrderRow, foreign_key = order_id))]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub struct OrderItemRow {
    pub id: Uuid,
    pub order_id: Uuid,
    pub product_id: Option<i64>,
    pub product_title: String,
    pub price: BigDecimal,
    pub quantity: BigDecimal,
    pub ambassador_revenue: BigDecimal,
    pub admin_revenue: BigDecimal,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Insertable)]
#[diesel(table_name = order_items)]
pub struct NewOrderItemRow {
    pub id: Uuid,
    pub order_id: Uuid,
    pub product_id: Option<i64>,
    pub product_title: String,
    pub price: BigDecimal,
    pub quantity: BigDecimal,
    pub ambassador_revenue: BigDecimal,
    pub admin_revenue: BigDecimal,
}

#[derive(Debug, Clone, Queryable, Selectable, Identifiable)]
#[diesel(table_name = checkout_outbox)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub struct OutboxEventRow {
    pub id: Uuid,
    pub aggregate_type: String,
    pub aggregate_id: String,
    pub event_type: String,
    pub payload: Value,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Insertable)]
#[diesel(table_name = checkout_outbox)]
pub struct NewOutboxEventRow {
    pub id: Uuid,
    pub aggregate_type: String,
    pub aggregate_id: String,
    pub event_type: String,
    pub payload: Value,
}

#[derive(Debug, Clone, Queryable, Selectable, Identifiable)]
#[diesel(table_name = links)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub struct LinkRow {
    pub id: i64,
    pub code: String,
    pub ambassador_id: Uuid,
    pub ambassador_email: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Queryable, Selectable, Identifiable)]
#[diesel(table_name = products)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub struct ProductRow {
    pub id: i64,
    pub title: String,
    pub description: Option<String>,
    pub image: Option<String>,
    pub price: BigDecimal,
}

impl From<ProductRow> for Product {
    fn from(row: ProductRow) -> Self {
        Product {
            id: row.id,
            title: row.title,
            price: row.price,
            description: row.description,
            image: row.image,
        }
    }
}

impl From<OrderItemRow> for OrderItemView {
    fn from(row: OrderItemRow) -> Self {
        OrderItemView {
            id: row.id,
            product_id: row.product_id,
            product_title: row.product_title,
            price: row.price,
            quantity: row.quantity,
            ambassador_revenue: row.ambassador_revenue,
            admin_revenue: row.admin_revenue,
            created_at: row.created_at,
        }
    }
}

impl OrderRow {
    pub fn into_view(self, items: Vec<OrderItemRow>) -> OrderView {
        OrderView {
            id: self.id,
            transaction_id: self.transaction_id,
            code: self.code,
            ambassador_id: self.ambassador_id,
            ambassador_email: self.ambassador_email,
            customer: CustomerDetails {
                first_name: self.first_name,
                last_name: self.last_name,
                email: self.email,
                address: self.address,
                country: self.country,
                city: self.city,
                zip_code: self.zip_code,
            },
            complete: self.complete,
            created_at: self.created_at,
            updated_at: self.updated_at,
            items: items.into_iter().map(OrderItemView::from).collect(),
        }
    }
}
