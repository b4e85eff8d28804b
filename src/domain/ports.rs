use async_trait::async_trait;
use uuid::Uuid;

use super::errors::DomainError;
use super::notification::{DeliveryError, Notification};
use super::order::{Completion, ListResult, NewOrder, OrderFilter, OrderView, Product, ReferralLink};
use super::payment::{GatewayError, PaymentSession, PaymentSessionRequest};

#[async_trait]
pub trait LinkResolver: Send + Sync + 'static {
    async fn resolve(&self, code: &str) -> Result<Option<ReferralLink>, DomainError>;
}

#[async_trait]
pub trait CatalogLookup: Send + Sync + 'static {
    async fn get(&self, product_id: i64) -> Result<Option<Product>, DomainError>;
}

#[async_trait]
pub trait OrderRepository: Send + Sync + 'static {
    /// Persists the order and every item atomically.
    async fn create(&self, order: NewOrder) -> Result<OrderView, DomainError>;

    /// Stores the payment session id on an order that has none yet.
    ///
    /// Fails with [`DomainError::PaymentSessionExists`] when one is already set.
    async fn attach_session(&self, order_id: Uuid, transaction_id: &str) -> Result<(), DomainError>;

    /// Compare-and-set of `complete` from false to true for the order carrying
    /// `transaction_id`.
    async fn complete(&self, transaction_id: &str) -> Result<Completion, DomainError>;

    async fn find_by_id(&self, id: Uuid) -> Result<Option<OrderView>, DomainError>;
    async fn find_by_transaction(&self, transaction_id: &str) -> Result<Option<OrderView>, DomainError>;
    async fn list(&self, filter: OrderFilter, page: i64, limit: i64) -> Result<ListResult, DomainError>;
}

#[async_trait]
pub trait PaymentGateway: Send + Sync + 'static {
    async fn create_session(&self, request: &PaymentSessionRequest) -> Result<PaymentSession, GatewayError>;
}

#[async_trait]
pub trait Notifier: Send + Sync + 'static {
    async fn send(&self, notification: &Notification) -> Result<(), DeliveryError>;
}
