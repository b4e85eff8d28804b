use thiserror::Error;
use uuid::Uuid;

use super::payment::GatewayError;

#[derive(Debug, Error)]
pub enum DomainError {
    #[error("Invalid code: {0}")]
    InvalidReferralCode(String),
    #[error("Unknown product: {0}")]
    UnknownProduct(i64),
    #[error("Invalid input: {0}")]
    Validation(String),
    /// The order was recorded but no payment session could be opened for it.
    #[error("Payment session failed for order {order_id}: {source}")]
    PaymentSession { order_id: Uuid, source: GatewayError },
    /// The provider opened a session but it could not be stored on the order.
    #[error("Payment session {session_id} for order {order_id} was opened but not recorded: {reason}")]
    SessionNotRecorded {
        order_id: Uuid,
        session_id: String,
        reason: String,
    },
    #[error("Order {0} already has a payment session")]
    PaymentSessionExists(Uuid),
    #[error("Order not found")]
    OrderNotFound,
    #[error("Internal error: {0}")]
    Internal(String),
}
