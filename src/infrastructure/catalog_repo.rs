use async_trait::async_trait;
use diesel::prelude::*;

use crate::db::DbPool;
use crate::domain::errors::DomainError;
use crate::domain::order::{Product, ReferralLink};
use crate::domain::ports::{CatalogLookup, LinkResolver};
use crate::schema::{link_products, links, products};

use super::models::{LinkRow, ProductRow};
use super::run_blocking;

/// Read-only access to the product catalog and referral links.
pub struct DieselCatalog {
    pool: DbPool,
}

impl DieselCatalog {
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl LinkResolver for DieselCatalog {
    async fn resolve(&self, code: &str) -> Result<Option<ReferralLink>, DomainError> {
        let code = code.to_string();
        run_blocking(&self.pool, move |conn| {
            let link = links::table
                .filter(links::code.eq(&code))
                .select(LinkRow::as_select())
                .first(conn)
                .optional()?;

            let Some(link) = link else {
                return Ok(None);
            };

            let product_ids = link_products::table
                .filter(link_products::link_id.eq(link.id))
                .order((link_products::position.asc(), link_products::product_id.asc()))
                .select(link_products::product_id)
                .load::<i64>(conn)?;

            Ok(Some(ReferralLink {
                code: link.code,
                ambassador_id: link.ambassador_id,
                ambassador_email: link.ambassador_email,
                product_ids,
            }))
        })
        .await
    }
}

#[async_trait]
impl CatalogLookup for DieselCatalog {
    async fn get(&self, product_id: i64) -> Result<Option<Product>, DomainError> {
        run_blocking(&self.pool, move |conn| {
            Ok(products::table
                .find(product_id)
                .select(ProductRow::as_select())
                .first(conn)
                .optional()?
                .map(Product::from))
        })
        .await
    }
}
