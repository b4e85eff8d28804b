use thiserror::Error;

pub const ORDER_COMPLETED_SUBJECT: &str = "An order has been completed.";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Notification {
    pub to: String,
    pub subject: String,
    pub body: String,
}

#[derive(Debug, Error)]
#[error("notification to {to} not delivered: {reason}")]
pub struct DeliveryError {
    pub to: String,
    pub reason: String,
}
