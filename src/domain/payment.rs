use bigdecimal::BigDecimal;
use serde_json::Value;
use thiserror::Error;

/// One provider-facing line of a payment session.
#[derive(Debug, Clone, PartialEq)]
pub struct PaymentLineItem {
    pub name: String,
    pub description: Option<String>,
    pub image: Option<String>,
    /// Unit price in minor currency units.
    pub unit_amount: i64,
    pub currency: String,
    pub quantity: BigDecimal,
}

#[derive(Debug, Clone, PartialEq)]
pub struct PaymentSessionRequest {
    /// Reference the provider stores alongside the session (the order id).
    pub client_reference: String,
    /// Requests sharing this key must never open more than one session.
    pub idempotency_key: String,
    pub line_items: Vec<PaymentLineItem>,
    pub success_url: String,
    pub cancel_url: String,
}

/// A session opened by the payment provider.
#[derive(Debug, Clone)]
pub struct PaymentSession {
    pub id: String,
    pub url: Option<String>,
    /// The provider's full response body.
    pub raw: Value,
}

#[derive(Debug, Error)]
pub enum GatewayError {
    #[error("payment provider timed out")]
    Timeout,
    #[error("payment provider unavailable: {0}")]
    Unavailable(String),
    #[error("payment provider rejected the request ({status}): {message}")]
    Rejected { status: u16, message: String },
    #[error("invalid payment provider response: {0}")]
    InvalidResponse(String),
    #[error("payment session request cannot be encoded: {0}")]
    InvalidRequest(String),
}

impl GatewayError {
    /// Whether repeating the same request may succeed.
    pub fn is_retryable(&self) -> bool {
        matches!(self, GatewayError::Timeout | GatewayError::Unavailable(_))
    }
}
