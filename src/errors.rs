use actix_web::http::StatusCode;
use actix_web::HttpResponse;
use serde_json::json;
use thiserror::Error;
use uuid::Uuid;

use crate::domain::errors::DomainError;

#[derive(Debug, Error)]
pub enum AppError {
    #[error("Not found")]
    NotFound,

    #[error("{0}")]
    BadRequest(String),

    #[error("{0}")]
    Conflict(String),

    /// The order exists but its payment session could not be opened.
    #[error("Payment session failed, please retry")]
    PaymentSession {
        order_id: Uuid,
        retryable: bool,
        timed_out: bool,
    },

    /// A payment session exists at the provider but not on the order.
    #[error("Payment session was opened but could not be recorded")]
    SessionNotRecorded { order_id: Uuid, session_id: String },

    #[error("Internal error: {0}")]
    Internal(String),
}

impl From<DomainError> for AppError {
    fn from(e: DomainError) -> Self {
        match e {
            DomainError::OrderNotFound => AppError::NotFound,
            DomainError::InvalidReferralCode(_) => AppError::BadRequest("Invalid code!".to_string()),
            DomainError::UnknownProduct(_) | DomainError::Validation(_) => AppError::BadRequest(e.to_string()),
            DomainError::PaymentSessionExists(_) => AppError::Conflict(e.to_string()),
            DomainError::PaymentSession { order_id, source } => AppError::PaymentSession {
                order_id,
                retryable: source.is_retryable(),
                timed_out: matches!(source, crate::domain::payment::GatewayError::Timeout),
            },
            DomainError::SessionNotRecorded {
                order_id, session_id, ..
            } => AppError::SessionNotRecorded {
                order_id,
                session_id,
            },
            DomainError::Internal(msg) => AppError::Internal(msg),
        }
    }
}

impl actix_web::ResponseError for AppError {
    fn status_code(&self) -> StatusCode {
        match self {
            AppError::NotFound => StatusCode::NOT_FOUND,
            AppError::BadRequest(_) => StatusCode::BAD_REQUEST,
            AppError::Conflict(_) => StatusCode::CONFLICT,
            AppError::PaymentSession { timed_out: true, .. } => StatusCode::GATEWAY_TIMEOUT,
            AppError::PaymentSession { .. } => StatusCode::BAD_GATEWAY,
            AppError::SessionNotRecorded { .. } | AppError::Internal(_) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        }
    }

    fn error_response(&self) -> HttpResponse {
        let body = match self {
            AppError::PaymentSession {
                order_id, retryable, ..
            } => json!({
                "error": self.to_string(),
                "order_id": order_id,
                "retryable": retryable
            }),
            AppError::SessionNotRecorded {
                order_id,
                session_id,
            } => json!({
                "error": self.to_string(),
                "order_id": order_id,
                "session_id": session_id
            }),
            AppError::Internal(msg) => {
                log::error!("Request failed: {msg}");
                json!({ "error": "Internal server error" })
            }
            _ => json!({ "error": self.to_string() }),
        };
        HttpResponse::build(self.status_code()).json(body)
    }
}
