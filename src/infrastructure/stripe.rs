use std::time::Duration;

use async_trait::async_trait;
use bigdecimal::{BigDecimal, RoundingMode, ToPrimitive};
use reqwest::Client;
use serde::Deserialize;
use serde_json::Value;

use crate::domain::payment::{GatewayError, PaymentLineItem, PaymentSession, PaymentSessionRequest};
use crate::domain::ports::PaymentGateway;

#[derive(Debug, Clone)]
pub struct StripeConfig {
    pub api_key: String,
    pub api_base: String,
    pub timeout: Duration,
    pub max_attempts: u32,
    /// Delay before the first retry; doubled on every further attempt.
    pub retry_backoff: Duration,
}

/// Opens Stripe Checkout sessions.
pub struct StripeGateway {
    config: StripeConfig,
    client: Client,
}

#[derive(Debug, Deserialize)]
struct SessionBody {
    id: String,
    url: Option<String>,
}

impl StripeGateway {
    pub fn new(config: StripeConfig) -> Result<Self, GatewayError> {
        let client = Client::builder()
            .timeout(config.timeout)
            .build()
            .map_err(|e| GatewayError::Unavailable(e.to_string()))?;
        Ok(Self { config, client })
    }

    async fn post_session(
        &self,
        form: &[(String, String)],
        idempotency_key: &str,
    ) -> Result<PaymentSession, GatewayError> {
        let url = format!(
            "{}/v1/checkout/sessions",
            self.config.api_base.trim_end_matches('/')
        );
        let response = self
            .client
            .post(url)
            .bearer_auth(&self.config.api_key)
            .header("Idempotency-Key", idempotency_key)
            .form(form)
            .send()
            .await
            .map_err(transport_error)?;

        let status = response.status();
        if !status.is_success() {
            let text = response.text().await.map_err(transport_error)?;
            let message = error_message(&text);
            return Err(if status.is_server_error() || status.as_u16() == 429 {
                GatewayError::Unavailable(format!("{status}: {message}"))
            } else {
                GatewayError::Rejected {
                    status: status.as_u16(),
                    message,
                }
            });
        }

        let raw: Value = response
            .json()
            .await
            .map_err(|e| GatewayError::InvalidResponse(e.to_string()))?;
        let body: SessionBody = serde_json::from_value(raw.clone())
            .map_err(|e| GatewayError::InvalidResponse(e.to_string()))?;

        Ok(PaymentSession {
            id: body.id,
            url: body.url,
            raw,
        })
    }
}

#[async_trait]
impl PaymentGateway for StripeGateway {
    async fn create_session(&self, request: &PaymentSessionRequest) -> Result<PaymentSession, GatewayError> {
        let form = session_form(request)?;
        let mut backoff = self.config.retry_backoff;
        let mut attempt = 1;
        loop {
            match self.post_session(&form, &request.idempotency_key).await {
                Err(e) if e.is_retryable() && attempt < self.config.max_attempts => {
                    log::warn!(
                        "Stripe session attempt {attempt} for {} failed: {e}; retrying",
                        request.client_reference
                    );
                    tokio::time::sleep(backoff).await;
                    backoff *= 2;
                    attempt += 1;
                }
                result => return result,
            }
        }
    }
}

fn transport_error(e: reqwest::Error) -> GatewayError {
    if e.is_timeout() {
        GatewayError::Timeout
    } else {
        GatewayError::Unavailable(e.to_string())
    }
}

/// Pulls `error.message` out of a Stripe error body, falling back to the raw text.
fn error_message(body: &str) -> String {
    serde_json::from_str::<Value>(body)
        .ok()
        .and_then(|v| v["error"]["message"].as_str().map(str::to_string))
        .unwrap_or_else(|| body.to_string())
}

/// Stripe only accepts whole quantities; a fractional quantity is charged as a
/// single unit carrying the whole line amount.
fn stripe_amount_and_quantity(item: &PaymentLineItem) -> Result<(i64, i64), GatewayError> {
    if item.quantity.with_scale(0) == item.quantity {
        let quantity = item
            .quantity
            .to_i64()
            .ok_or_else(|| GatewayError::InvalidRequest(format!("quantity {} too large", item.quantity)))?;
        return Ok((item.unit_amount, quantity));
    }

    let line_amount = (BigDecimal::from(item.unit_amount) * &item.quantity)
        .with_scale_round(0, RoundingMode::HalfUp)
        .to_i64()
        .ok_or_else(|| GatewayError::InvalidRequest(format!("amount for {} too large", item.name)))?;
    Ok((line_amount, 1))
}

pub(crate) fn session_form(request: &PaymentSessionRequest) -> Result<Vec<(String, String)>, GatewayError> {
    let mut form = vec![
        ("mode".to_string(), "payment".to_string()),
        ("success_url".to_string(), request.success_url.clone()),
        ("cancel_url".to_string(), request.cancel_url.clone()),
        ("payment_method_types[0]".to_string(), "card".to_string()),
        ("client_reference_id".to_string(), request.client_reference.clone()),
    ];

    for (i, item) in request.line_items.iter().enumerate() {
        let (unit_amount, quantity) = stripe_amount_and_quantity(item)?;
        let prefix = format!("line_items[{i}]");
        form.push((format!("{prefix}[price_data][currency]"), item.currency.clone()));
        form.push((format!("{prefix}[price_data][unit_amount]"), unit_amount.to_string()));
        form.push((format!("{prefix}[price_data][product_data][name]"), item.name.clone()));
        if let Some(description) = item.description.as_ref().filter(|d| !d.is_empty()) {
            form.push((
                format!("{prefix}[price_data][product_data][description]"),
                description.clone(),
            ));
        }
        if let Some(image) = item.image.as_ref().filter(|d| !d.is_empty()) {
            form.push((format!("{prefix}[price_data][product_data][images][0]"), image.clone()));
        }
        form.push((format!("{prefix}[quantity]"), quantity.to_string()));
    }

    Ok(form)
}
