//! In-memory fakes for every checkout port.
#![allow(dead_code)]

use std::collections::{HashMap, VecDeque};
use std::str::FromStr;
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use bigdecimal::BigDecimal;
use chrono::Utc;
use serde_json::json;
use uuid::Uuid;

use referral_checkout::application::{CheckoutService, CheckoutSettings};
use referral_checkout::domain::errors::DomainError;
use referral_checkout::domain::notification::{DeliveryError, Notification};
use referral_checkout::domain::order::{
    CheckoutSubmission, Completion, LineRequest, ListResult, NewOrder, OrderFilter, OrderItemView,
    OrderView, Product, ReferralLink,
};
use referral_checkout::domain::payment::{GatewayError, PaymentSession, PaymentSessionRequest};
use referral_checkout::domain::ports::{
    CatalogLookup, LinkResolver, Notifier, OrderRepository, PaymentGateway,
};

pub const ADMIN_EMAIL: &str = "admin@admin.com";
pub const AMBASSADOR_EMAIL: &str = "user@example.com";

pub fn dec(s: &str) -> BigDecimal {
    BigDecimal::from_str(s).expect("valid decimal")
}

// ── Store: links, catalog and orders ─────────────────────────────────────────

#[derive(Default)]
struct State {
    links: HashMap<String, ReferralLink>,
    products: HashMap<i64, Product>,
    orders: Vec<OrderView>,
    fail_next_attach: bool,
}

#[derive(Default)]
pub struct InMemoryStore {
    state: Mutex<State>,
}

impl InMemoryStore {
    pub fn add_link(&self, code: &str, ambassador_email: &str, product_ids: Vec<i64>) -> ReferralLink {
        let link = ReferralLink {
            code: code.to_string(),
            ambassador_id: Uuid::new_v4(),
            ambassador_email: ambassador_email.to_string(),
            product_ids,
        };
        self.state
            .lock()
            .unwrap()
            .links
            .insert(code.to_string(), link.clone());
        link
    }

    pub fn add_product(&self, id: i64, title: &str, price: &str) {
        self.state.lock().unwrap().products.insert(
            id,
            Product {
                id,
                title: title.to_string(),
                price: dec(price),
                description: Some("some details".to_string()),
                image: Some("https://example.com/image.png".to_string()),
            },
        );
    }

    /// Makes the next `attach_session` fail as if the database dropped out.
    pub fn fail_next_attach(&self) {
        self.state.lock().unwrap().fail_next_attach = true;
    }

    pub fn remove_product(&self, id: i64) {
        self.state.lock().unwrap().products.remove(&id);
    }

    pub fn orders(&self) -> Vec<OrderView> {
        self.state.lock().unwrap().orders.clone()
    }

    pub fn order_count(&self) -> usize {
        self.state.lock().unwrap().orders.len()
    }

    pub fn item_count(&self) -> usize {
        self.state
            .lock()
            .unwrap()
            .orders
            .iter()
            .map(|o| o.items.len())
            .sum()
    }
}

#[async_trait]
impl LinkResolver for InMemoryStore {
    async fn resolve(&self, code: &str) -> Result<Option<ReferralLink>, DomainError> {
        Ok(self.state.lock().unwrap().links.get(code).cloned())
    }
}

#[async_trait]
impl CatalogLookup for InMemoryStore {
    async fn get(&self, product_id: i64) -> Result<Option<Product>, DomainError> {
        Ok(self.state.lock().unwrap().products.get(&product_id).cloned())
    }
}

#[async_trait]
impl OrderRepository for InMemoryStore {
    async fn create(&self, order: NewOrder) -> Result<OrderView, DomainError> {
        let now = Utc::now();
        let view = OrderView {
            id: order.id,
            transaction_id: None,
            code: order.code,
            ambassador_id: order.ambassador_id,
            ambassador_email: order.ambassador_email,
            customer: order.customer,
            complete: false,
            created_at: now,
            updated_at: now,
            items: order
                .items
                .into_iter()
                .map(|item| OrderItemView {
                    id: Uuid::new_v4(),
                    product_id: Some(item.product_id),
                    product_title: item.product_title,
                    price: item.price,
                    quantity: item.quantity,
                    ambassador_revenue: item.ambassador_revenue,
                    admin_revenue: item.admin_revenue,
                    created_at: now,
                })
                .collect(),
        };
        self.state.lock().unwrap().orders.push(view.clone());
        Ok(view)
    }

    async fn attach_session(&self, order_id: Uuid, transaction_id: &str) -> Result<(), DomainError> {
        let mut state = self.state.lock().unwrap();
        if std::mem::take(&mut state.fail_next_attach) {
            return Err(DomainError::Internal("connection reset".to_string()));
        }
        let order = state
            .orders
            .iter_mut()
            .find(|o| o.id == order_id)
            .ok_or(DomainError::OrderNotFound)?;
        if order.transaction_id.is_some() {
            return Err(DomainError::PaymentSessionExists(order_id));
        }
        order.transaction_id = Some(transaction_id.to_string());
        order.updated_at = Utc::now();
        Ok(())
    }

    async fn complete(&self, transaction_id: &str) -> Result<Completion, DomainError> {
        let mut state = self.state.lock().unwrap();
        let order = state
            .orders
            .iter_mut()
            .find(|o| o.transaction_id.as_deref() == Some(transaction_id))
            .ok_or(DomainError::OrderNotFound)?;
        if order.complete {
            return Ok(Completion::AlreadyComplete(order.clone()));
        }
        order.complete = true;
        order.updated_at = Utc::now();
        Ok(Completion::Completed(order.clone()))
    }

    async fn find_by_id(&self, id: Uuid) -> Result<Option<OrderView>, DomainError> {
        Ok(self
            .state
            .lock()
            .unwrap()
            .orders
            .iter()
            .find(|o| o.id == id)
            .cloned())
    }

    async fn find_by_transaction(&self, transaction_id: &str) -> Result<Option<OrderView>, DomainError> {
        Ok(self
            .state
            .lock()
            .unwrap()
            .orders
            .iter()
            .find(|o| o.transaction_id.as_deref() == Some(transaction_id))
            .cloned())
    }

    async fn list(&self, filter: OrderFilter, page: i64, limit: i64) -> Result<ListResult, DomainError> {
        let state = self.state.lock().unwrap();
        let matching: Vec<OrderView> = state
            .orders
            .iter()
            .rev()
            .filter(|o| filter.complete.map_or(true, |c| o.complete == c))
            .cloned()
            .collect();
        let total = matching.len() as i64;
        let items = matching
            .into_iter()
            .skip(((page - 1) * limit) as usize)
            .take(limit as usize)
            .collect();
        Ok(ListResult { items, total })
    }
}

// ── Payment gateway ──────────────────────────────────────────────────────────

/// Answers with scripted results, then with fresh `sess_N` sessions.
#[derive(Default)]
pub struct FakeGateway {
    scripted: Mutex<VecDeque<Result<PaymentSession, GatewayError>>>,
    requests: Mutex<Vec<PaymentSessionRequest>>,
}

impl FakeGateway {
    pub fn fail_next(&self, error: GatewayError) {
        self.scripted.lock().unwrap().push_back(Err(error));
    }

    pub fn requests(&self) -> Vec<PaymentSessionRequest> {
        self.requests.lock().unwrap().clone()
    }
}

#[async_trait]
impl PaymentGateway for FakeGateway {
    async fn create_session(&self, request: &PaymentSessionRequest) -> Result<PaymentSession, GatewayError> {
        let n = {
            let mut requests = self.requests.lock().unwrap();
            requests.push(request.clone());
            requests.len()
        };
        if let Some(result) = self.scripted.lock().unwrap().pop_front() {
            return result;
        }
        let id = format!("sess_{n}");
        Ok(PaymentSession {
            url: Some(format!("https://checkout.example.com/{id}")),
            raw: json!({ "id": id, "object": "checkout.session" }),
            id,
        })
    }
}

// ── Notifier ─────────────────────────────────────────────────────────────────

#[derive(Default)]
pub struct RecordingNotifier {
    sent: Mutex<Vec<Notification>>,
    failing: Mutex<bool>,
}

impl RecordingNotifier {
    pub fn fail_all(&self) {
        *self.failing.lock().unwrap() = true;
    }

    pub fn sent(&self) -> Vec<Notification> {
        self.sent.lock().unwrap().clone()
    }
}

#[async_trait]
impl Notifier for RecordingNotifier {
    async fn send(&self, notification: &Notification) -> Result<(), DeliveryError> {
        self.sent.lock().unwrap().push(notification.clone());
        if *self.failing.lock().unwrap() {
            return Err(DeliveryError {
                to: notification.to.clone(),
                reason: "mailbox unavailable".to_string(),
            });
        }
        Ok(())
    }
}

// ── Harness ──────────────────────────────────────────────────────────────────

pub struct Harness {
    pub store: Arc<InMemoryStore>,
    pub gateway: Arc<FakeGateway>,
    pub notifier: Arc<RecordingNotifier>,
    pub service: Arc<CheckoutService>,
}

/// A service with link `123456` owned by [`AMBASSADOR_EMAIL`] and product 1
/// priced 10.00.
pub fn harness() -> Harness {
    let store = Arc::new(InMemoryStore::default());
    store.add_product(1, "Product 1", "10.00");
    store.add_link("123456", AMBASSADOR_EMAIL, vec![1]);
    let gateway = Arc::new(FakeGateway::default());
    let notifier = Arc::new(RecordingNotifier::default());

    let service = CheckoutService::new(
        store.clone(),
        store.clone(),
        store.clone(),
        gateway.clone(),
        notifier.clone(),
        CheckoutSettings {
            success_url: "http://localhost:5000/checkout/success?source={CHECKOUT_SESSION_ID}"
                .to_string(),
            cancel_url: "http://localhost:5000/checkout/error".to_string(),
            currency: "usd".to_string(),
            admin_email: ADMIN_EMAIL.to_string(),
        },
    );

    Harness {
        store,
        gateway,
        notifier,
        service: Arc::new(service),
    }
}

pub fn submission(code: &str, lines: &[(i64, &str)]) -> CheckoutSubmission {
    CheckoutSubmission {
        code: code.to_string(),
        first_name: "John".to_string(),
        last_name: "Doe".to_string(),
        email: "johndoe@example.com".to_string(),
        address: Some("123 Main St".to_string()),
        country: Some("USA".to_string()),
        city: Some("New York".to_string()),
        zip_code: Some("10001".to_string()),
        products: lines
            .iter()
            .map(|(product_id, quantity)| LineRequest {
                product_id: *product_id,
                quantity: dec(quantity),
            })
            .collect(),
    }
}
