use async_trait::async_trait;
use chrono::Utc;
use diesel::pg::{Pg, PgConnection};
use diesel::prelude::*;
use serde_json::{json, Value};
use uuid::Uuid;

use crate::db::DbPool;
use crate::domain::errors::DomainError;
use crate::domain::order::{Completion, ListResult, NewOrder, OrderFilter, OrderView};
use crate::domain::ports::OrderRepository;
use crate::schema::{checkout_outbox, order_items, orders};

use super::models::{NewOrderItemRow, NewOrderRow, NewOutboxEventRow, OrderItemRow, OrderRow};
use super::run_blocking;

// ── Repository ────────────────────────────────────────────────────────────────

pub struct DieselOrderRepository {
    pool: DbPool,
}

impl DieselOrderRepository {
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }
}

fn load_view(conn: &mut PgConnection, row: OrderRow) -> Result<OrderView, DomainError> {
    let items = OrderItemRow::belonging_to(&row)
        .select(OrderItemRow::as_select())
        .order(order_items::created_at.asc())
        .load(conn)?;
    Ok(row.into_view(items))
}

fn find_row_by_transaction(
    conn: &mut PgConnection,
    transaction_id: &str,
) -> Result<Option<OrderRow>, DomainError> {
    Ok(orders::table
        .filter(orders::transaction_id.eq(transaction_id))
        .select(OrderRow::as_select())
        .first(conn)
        .optional()?)
}

/// Writes an outbox event in the caller's transaction.
/// Relays route events by `aggregate_type`.
fn append_event(
    conn: &mut PgConnection,
    order_id: Uuid,
    event_type: &str,
    payload: Value,
) -> Result<(), DomainError> {
    diesel::insert_into(checkout_outbox::table)
        .values(&NewOutboxEventRow {
            id: Uuid::new_v4(),
            aggregate_type: "Order".to_string(),
            aggregate_id: order_id.to_string(),
            event_type: event_type.to_string(),
            payload,
        })
        .execute(conn)?;
    Ok(())
}

#[async_trait]
impl OrderRepository for DieselOrderRepository {
    async fn create(&self, order: NewOrder) -> Result<OrderView, DomainError> {
        run_blocking(&self.pool, move |conn| {
            conn.transaction::<_, DomainError, _>(|conn| {
                let row = diesel::insert_into(orders::table)
                    .values(&NewOrderRow {
                        id: order.id,
                        code: order.code.clone(),
                        ambassador_id: order.ambassador_id,
                        ambassador_email: order.ambassador_email.clone(),
                        first_name: order.customer.first_name.clone(),
                        last_name: order.customer.last_name.clone(),
                        email: order.customer.email.clone(),
                        address: order.customer.address.clone(),
                        city: order.customer.city.clone(),
                        country: order.customer.country.clone(),
                        zip_code: order.customer.zip_code.clone(),
                    })
                    .returning(OrderRow::as_returning())
                    .get_result(conn)?;

                let new_items: Vec<NewOrderItemRow> = order
                    .items
                    .iter()
                    .map(|item| NewOrderItemRow {
                        id: Uuid::new_v4(),
                        order_id: order.id,
                        product_id: Some(item.product_id),
                        product_title: item.product_title.clone(),
                        price: item.price.clone(),
                        quantity: item.quantity.clone(),
                        ambassador_revenue: item.ambassador_revenue.clone(),
                        admin_revenue: item.admin_revenue.clone(),
                    })
                    .collect();
                let items = diesel::insert_into(order_items::table)
                    .values(&new_items)
                    .returning(OrderItemRow::as_returning())
                    .get_results(conn)?;

                let item_payloads: Vec<Value> = order
                    .items
                    .iter()
                    .map(|item| {
                        json!({
                            "product_id": item.product_id,
                            "product_title": item.product_title,
                            "price": item.price.to_string(),
                            "quantity": item.quantity.to_string(),
                            "ambassador_revenue": item.ambassador_revenue.to_string(),
                            "admin_revenue": item.admin_revenue.to_string()
                        })
                    })
                    .collect();
                append_event(
                    conn,
                    order.id,
                    "OrderCreated",
                    json!({
                        "order_id": order.id,
                        "code": order.code,
                        "ambassador_id": order.ambassador_id,
                        "items": item_payloads
                    }),
                )?;

                Ok(row.into_view(items))
            })
        })
        .await
    }

    async fn attach_session(&self, order_id: Uuid, transaction_id: &str) -> Result<(), DomainError> {
        let transaction_id = transaction_id.to_string();
        run_blocking(&self.pool, move |conn| {
            conn.transaction::<_, DomainError, _>(|conn| {
                let updated = diesel::update(
                    orders::table
                        .filter(orders::id.eq(order_id))
                        .filter(orders::transaction_id.is_null()),
                )
                .set((
                    orders::transaction_id.eq(&transaction_id),
                    orders::updated_at.eq(Utc::now()),
                ))
                .execute(conn)?;
                if updated == 1 {
                    return Ok(());
                }

                let exists: i64 = orders::table
                    .filter(orders::id.eq(order_id))
                    .count()
                    .get_result(conn)?;
                if exists == 0 {
                    Err(DomainError::OrderNotFound)
                } else {
                    Err(DomainError::PaymentSessionExists(order_id))
                }
            })
        })
        .await
    }

    async fn complete(&self, transaction_id: &str) -> Result<Completion, DomainError> {
        let transaction_id = transaction_id.to_string();
        run_blocking(&self.pool, move |conn| {
            conn.transaction::<_, DomainError, _>(|conn| {
                // A single guarded UPDATE: concurrent deliveries race on the row
                // lock and only one of them sees `complete = false`.
                let flipped = diesel::update(
                    orders::table
                        .filter(orders::transaction_id.eq(&transaction_id))
                        .filter(orders::complete.eq(false)),
                )
                .set((orders::complete.eq(true), orders::updated_at.eq(Utc::now())))
                .returning(OrderRow::as_returning())
                .get_result(conn)
                .optional()?;

                match flipped {
                    Some(row) => {
                        let view = load_view(conn, row)?;
                        append_event(
                            conn,
                            view.id,
                            "OrderCompleted",
                            json!({
                                "order_id": view.id,
                                "code": view.code,
                                "ambassador_id": view.ambassador_id,
                                "ambassador_revenue": view.ambassador_revenue().to_string(),
                                "admin_revenue": view.admin_revenue().to_string(),
                                "total": view.total().to_string()
                            }),
                        )?;
                        Ok(Completion::Completed(view))
                    }
                    None => match find_row_by_transaction(conn, &transaction_id)? {
                        Some(row) => Ok(Completion::AlreadyComplete(load_view(conn, row)?)),
                        None => Err(DomainError::OrderNotFound),
                    },
                }
            })
        })
        .await
    }

    async fn find_by_id(&self, id: Uuid) -> Result<Option<OrderView>, DomainError> {
        run_blocking(&self.pool, move |conn| {
            let order = orders::table
                .filter(orders::id.eq(id))
                .select(OrderRow::as_select())
                .first(conn)
                .optional()?;

            order.map(|row| load_view(conn, row)).transpose()
        })
        .await
    }

    async fn find_by_transaction(&self, transaction_id: &str) -> Result<Option<OrderView>, DomainError> {
        let transaction_id = transaction_id.to_string();
        run_blocking(&self.pool, move |conn| {
            find_row_by_transaction(conn, &transaction_id)?
                .map(|row| load_view(conn, row))
                .transpose()
        })
        .await
    }

    async fn list(&self, filter: OrderFilter, page: i64, limit: i64) -> Result<ListResult, DomainError> {
        let offset = (page - 1) * limit;
        run_blocking(&self.pool, move |conn| {
            conn.transaction::<_, DomainError, _>(|conn| {
                let mut count_query: orders::BoxedQuery<'_, Pg> = orders::table.into_boxed();
                let mut page_query: orders::BoxedQuery<'_, Pg> = orders::table.into_boxed();
                if let Some(complete) = filter.complete {
                    count_query = count_query.filter(orders::complete.eq(complete));
                    page_query = page_query.filter(orders::complete.eq(complete));
                }

                let total: i64 = count_query.count().get_result(conn)?;

                let rows = page_query
                    .select(OrderRow::as_select())
                    .order(orders::created_at.desc())
                    .limit(limit)
                    .offset(offset)
                    .load(conn)?;

                let items = OrderItemRow::belonging_to(&rows)
                    .select(OrderItemRow::as_select())
                    .load(conn)?
                    .grouped_by(&rows);

                Ok(ListResult {
                    items: rows
                        .into_iter()
                        .zip(items)
                        .map(|(row, items)| row.into_view(items))
                        .collect(),
                    total,
                })
            })
        })
        .await
    }
}
