use std::sync::Arc;

use uuid::Uuid;
use validator::Validate;

use crate::domain::errors::DomainError;
use crate::domain::notification::{Notification, ORDER_COMPLETED_SUBJECT};
use crate::domain::order::{
    payment_line_item, CheckoutSubmission, Completion, ListResult, NewOrder, OrderFilter, OrderView,
    Product, ReferralLink, ResolvedLine,
};
use crate::domain::payment::{PaymentLineItem, PaymentSession, PaymentSessionRequest};
use crate::domain::ports::{CatalogLookup, LinkResolver, Notifier, OrderRepository, PaymentGateway};

/// Settings the checkout pipeline needs from the environment.
#[derive(Debug, Clone)]
pub struct CheckoutSettings {
    pub success_url: String,
    pub cancel_url: String,
    pub currency: String,
    pub admin_email: String,
}

/// An order that now has an open payment session.
#[derive(Debug, Clone)]
pub struct CheckoutOutcome {
    pub order_id: Uuid,
    pub session: PaymentSession,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ConfirmationOutcome {
    pub order_id: Uuid,
    /// False when the order had already been confirmed by an earlier delivery.
    pub newly_completed: bool,
}

/// A referral link with its products resolved against the catalog.
#[derive(Debug, Clone)]
pub struct LinkDetails {
    pub link: ReferralLink,
    pub products: Vec<Product>,
}

pub struct CheckoutService {
    links: Arc<dyn LinkResolver>,
    catalog: Arc<dyn CatalogLookup>,
    orders: Arc<dyn OrderRepository>,
    gateway: Arc<dyn PaymentGateway>,
    notifier: Arc<dyn Notifier>,
    settings: CheckoutSettings,
}

impl CheckoutService {
    pub fn new(
        links: Arc<dyn LinkResolver>,
        catalog: Arc<dyn CatalogLookup>,
        orders: Arc<dyn OrderRepository>,
        gateway: Arc<dyn PaymentGateway>,
        notifier: Arc<dyn Notifier>,
        settings: CheckoutSettings,
    ) -> Self {
        Self {
            links,
            catalog,
            orders,
            gateway,
            notifier,
            settings,
        }
    }

    /// Places an order through a referral link and opens its payment session.
    ///
    /// Nothing is written unless the code and every product resolve. Once the
    /// order is committed, a gateway failure is reported as
    /// [`DomainError::PaymentSession`] and the order stays recorded so the
    /// session can be retried with [`CheckoutService::retry_payment_session`].
    pub async fn place_order(&self, submission: CheckoutSubmission) -> Result<CheckoutOutcome, DomainError> {
        submission
            .validate()
            .map_err(|e| DomainError::Validation(e.to_string()))?;

        let link = self
            .links
            .resolve(&submission.code)
            .await?
            .ok_or_else(|| DomainError::InvalidReferralCode(submission.code.clone()))?;

        let mut lines = Vec::with_capacity(submission.products.len());
        for requested in &submission.products {
            let product = self
                .catalog
                .get(requested.product_id)
                .await?
                .ok_or(DomainError::UnknownProduct(requested.product_id))?;
            lines.push(ResolvedLine {
                product,
                quantity: requested.quantity.clone(),
            });
        }

        let line_items = lines
            .iter()
            .map(|line| {
                payment_line_item(
                    &line.product.title,
                    line.product.description.as_deref(),
                    line.product.image.as_deref(),
                    &line.product.price,
                    &line.quantity,
                    &self.settings.currency,
                )
            })
            .collect::<Result<Vec<_>, _>>()?;

        let new_order = NewOrder::assemble(&link, submission.customer(), &lines);
        let order = self.orders.create(new_order).await?;
        log::info!(
            "Order {} placed via link {} ({} items, total {}, ambassador revenue {})",
            order.id,
            order.code,
            order.items.len(),
            order.total(),
            order.ambassador_revenue()
        );

        self.open_session(order.id, order.id.to_string(), line_items).await
    }

    /// Opens a new payment session for an order whose first attempt failed.
    pub async fn retry_payment_session(&self, order_id: Uuid) -> Result<CheckoutOutcome, DomainError> {
        let order = self
            .orders
            .find_by_id(order_id)
            .await?
            .ok_or(DomainError::OrderNotFound)?;
        if order.complete || order.transaction_id.is_some() {
            return Err(DomainError::PaymentSessionExists(order_id));
        }

        let mut line_items = Vec::with_capacity(order.items.len());
        for item in &order.items {
            let product = match item.product_id {
                Some(id) => self.catalog.get(id).await?,
                None => None,
            };
            line_items.push(payment_line_item(
                &item.product_title,
                product.as_ref().and_then(|p| p.description.as_deref()),
                product.as_ref().and_then(|p| p.image.as_deref()),
                &item.price,
                &item.quantity,
                &self.settings.currency,
            )?);
        }

        log::info!("Retrying payment session for order {order_id}");
        self.open_session(order_id, format!("{order_id}-{}", Uuid::new_v4()), line_items)
            .await
    }

    async fn open_session(
        &self,
        order_id: Uuid,
        idempotency_key: String,
        line_items: Vec<PaymentLineItem>,
    ) -> Result<CheckoutOutcome, DomainError> {
        let request = PaymentSessionRequest {
            client_reference: order_id.to_string(),
            idempotency_key,
            line_items,
            success_url: self.settings.success_url.clone(),
            cancel_url: self.settings.cancel_url.clone(),
        };

        let session = match self.gateway.create_session(&request).await {
            Ok(session) => session,
            Err(source) => {
                log::error!("Payment session for order {order_id} failed: {source}");
                return Err(DomainError::PaymentSession { order_id, source });
            }
        };

        if let Err(e) = self.orders.attach_session(order_id, &session.id).await {
            log::error!(
                "Order {order_id}: payment session {} was opened but not recorded: {e}",
                session.id
            );
            return Err(match e {
                DomainError::PaymentSessionExists(_) => e,
                other => DomainError::SessionNotRecorded {
                    order_id,
                    session_id: session.id,
                    reason: other.to_string(),
                },
            });
        }
        log::info!("Order {order_id} attached to payment session {}", session.id);

        Ok(CheckoutOutcome { order_id, session })
    }

    /// Marks the order paid through session `source` as complete.
    ///
    /// Replayed confirmations succeed without touching the order or sending
    /// any notification again.
    pub async fn confirm(&self, source: Option<&str>) -> Result<ConfirmationOutcome, DomainError> {
        let Some(source) = source.map(str::trim).filter(|s| !s.is_empty()) else {
            log::warn!("Confirmation received without a session id");
            return Err(DomainError::OrderNotFound);
        };

        let completion = match self.orders.complete(source).await {
            Ok(completion) => completion,
            Err(DomainError::OrderNotFound) => {
                log::warn!("Confirmation for unknown payment session {source}");
                return Err(DomainError::OrderNotFound);
            }
            Err(e) => return Err(e),
        };

        let order = match completion {
            Completion::Completed(order) => order,
            Completion::AlreadyComplete(order) => {
                log::info!("Order {} was already confirmed, ignoring replay", order.id);
                return Ok(ConfirmationOutcome {
                    order_id: order.id,
                    newly_completed: false,
                });
            }
        };

        log::info!("Order {} completed by payment session {source}", order.id);
        self.notify_completion(&order).await;

        Ok(ConfirmationOutcome {
            order_id: order.id,
            newly_completed: true,
        })
    }

    async fn notify_completion(&self, order: &OrderView) {
        let messages = [
            Notification {
                to: self.settings.admin_email.clone(),
                subject: ORDER_COMPLETED_SUBJECT.to_string(),
                body: format!(
                    "Order #{} with total of ${} has been completed.",
                    order.id,
                    order.admin_revenue()
                ),
            },
            Notification {
                to: order.ambassador_email.clone(),
                subject: ORDER_COMPLETED_SUBJECT.to_string(),
                body: format!(
                    "You earned ${} from the link #{}.",
                    order.ambassador_revenue(),
                    order.code
                ),
            },
        ];

        for message in &messages {
            if let Err(e) = self.notifier.send(message).await {
                log::warn!("Order {}: {e}", order.id);
            }
        }
    }

    pub async fn get_order(&self, id: Uuid) -> Result<Option<OrderView>, DomainError> {
        self.orders.find_by_id(id).await
    }

    /// Finds the order a payment session was opened for.
    pub async fn find_by_session(&self, session_id: &str) -> Result<Option<OrderView>, DomainError> {
        self.orders.find_by_transaction(session_id).await
    }

    pub async fn list_orders(
        &self,
        filter: OrderFilter,
        page: i64,
        limit: i64,
    ) -> Result<ListResult, DomainError> {
        self.orders.list(filter, page, limit).await
    }

    /// Looks up a referral link; products missing from the catalog are skipped.
    pub async fn link_details(&self, code: &str) -> Result<Option<LinkDetails>, DomainError> {
        let Some(link) = self.links.resolve(code).await? else {
            return Ok(None);
        };

        let mut products = Vec::with_capacity(link.product_ids.len());
        for id in &link.product_ids {
            if let Some(product) = self.catalog.get(*id).await? {
                products.push(product);
            }
        }

        Ok(Some(LinkDetails { link, products }))
    }
}
