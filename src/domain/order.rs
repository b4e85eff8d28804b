use bigdecimal::BigDecimal;
use chrono::{DateTime, Utc};
use uuid::Uuid;
use validator::{Validate, ValidationError};

use super::errors::DomainError;
use super::money::{
    quantity_in_range, to_minor_units, RevenueSplit, QUANTITY_MAX_INTEGER_DIGITS, QUANTITY_MAX_SCALE,
};
use super::payment::PaymentLineItem;

// ── Collaborator records ─────────────────────────────────────────────────────

/// An ambassador-owned referral code, as seen by the checkout pipeline.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReferralLink {
    pub code: String,
    pub ambassador_id: Uuid,
    pub ambassador_email: String,
    pub product_ids: Vec<i64>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Product {
    pub id: i64,
    pub title: String,
    pub price: BigDecimal,
    pub description: Option<String>,
    pub image: Option<String>,
}

// ── Checkout submission ──────────────────────────────────────────────────────

#[derive(Debug, Clone, Validate)]
pub struct CheckoutSubmission {
    #[validate(length(min = 1, message = "code is required"))]
    pub code: String,
    #[validate(length(min = 1, max = 255, message = "first_name is required"))]
    pub first_name: String,
    #[validate(length(min = 1, max = 255, message = "last_name is required"))]
    pub last_name: String,
    #[validate(email(message = "email must be a valid address"))]
    pub email: String,
    #[validate(length(max = 255))]
    pub address: Option<String>,
    #[validate(length(max = 255))]
    pub country: Option<String>,
    #[validate(length(max = 255))]
    pub city: Option<String>,
    #[validate(length(max = 10))]
    pub zip_code: Option<String>,
    #[validate(
        length(min = 1, message = "at least one product is required"),
        custom = "positive_quantities"
    )]
    pub products: Vec<LineRequest>,
}

#[derive(Debug, Clone, PartialEq, serde::Serialize)]
pub struct LineRequest {
    pub product_id: i64,
    pub quantity: BigDecimal,
}

fn positive_quantities(lines: &[LineRequest]) -> Result<(), ValidationError> {
    // Precision first: comparing or multiplying an unbounded exponent is not cheap.
    if !lines.iter().all(|l| quantity_in_range(&l.quantity)) {
        let mut err = ValidationError::new("quantity_range");
        err.message = Some(
            format!(
                "quantity must have at most {QUANTITY_MAX_INTEGER_DIGITS} whole digits \
                 and {QUANTITY_MAX_SCALE} decimal places"
            )
            .into(),
        );
        return Err(err);
    }
    if lines.iter().all(|l| l.quantity > BigDecimal::from(0)) {
        Ok(())
    } else {
        let mut err = ValidationError::new("positive_quantity");
        err.message = Some("quantity must be greater than zero".into());
        Err(err)
    }
}

impl CheckoutSubmission {
    pub fn customer(&self) -> CustomerDetails {
        CustomerDetails {
            first_name: self.first_name.clone(),
            last_name: self.last_name.clone(),
            email: self.email.clone(),
            address: self.address.clone(),
            country: self.country.clone(),
            city: self.city.clone(),
            zip_code: self.zip_code.clone(),
        }
    }
}

/// A submitted line whose product has been found in the catalog.
#[derive(Debug, Clone)]
pub struct ResolvedLine {
    pub product: Product,
    pub quantity: BigDecimal,
}

// ── Order aggregate ──────────────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CustomerDetails {
    pub first_name: String,
    pub last_name: String,
    pub email: String,
    pub address: Option<String>,
    pub country: Option<String>,
    pub city: Option<String>,
    pub zip_code: Option<String>,
}

/// An order ready to be persisted together with all of its items.
#[derive(Debug, Clone)]
pub struct NewOrder {
    pub id: Uuid,
    pub code: String,
    pub ambassador_id: Uuid,
    pub ambassador_email: String,
    pub customer: CustomerDetails,
    pub items: Vec<NewOrderItem>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct NewOrderItem {
    pub product_id: i64,
    pub product_title: String,
    pub price: BigDecimal,
    pub quantity: BigDecimal,
    pub ambassador_revenue: BigDecimal,
    pub admin_revenue: BigDecimal,
}

impl NewOrder {
    /// Builds the order aggregate for `lines`, snapshotting the link's code and
    /// ambassador along with each product's title and price.
    pub fn assemble(link: &ReferralLink, customer: CustomerDetails, lines: &[ResolvedLine]) -> Self {
        let items = lines
            .iter()
            .map(|line| {
                let split = RevenueSplit::for_line(&line.product.price, &line.quantity);
                NewOrderItem {
                    product_id: line.product.id,
                    product_title: line.product.title.clone(),
                    price: line.product.price.clone(),
                    quantity: line.quantity.clone(),
                    ambassador_revenue: split.ambassador,
                    admin_revenue: split.admin,
                }
            })
            .collect();

        Self {
            id: Uuid::new_v4(),
            code: link.code.clone(),
            ambassador_id: link.ambassador_id,
            ambassador_email: link.ambassador_email.clone(),
            customer,
            items,
        }
    }
}

#[derive(Debug, Clone)]
pub struct OrderItemView {
    pub id: Uuid,
    pub product_id: Option<i64>,
    pub product_title: String,
    pub price: BigDecimal,
    pub quantity: BigDecimal,
    pub ambassador_revenue: BigDecimal,
    pub admin_revenue: BigDecimal,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone)]
pub struct OrderView {
    pub id: Uuid,
    pub transaction_id: Option<String>,
    pub code: String,
    pub ambassador_id: Uuid,
    pub ambassador_email: String,
    pub customer: CustomerDetails,
    pub complete: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub items: Vec<OrderItemView>,
}

impl OrderView {
    pub fn total(&self) -> BigDecimal {
        sum(self.items.iter().map(|i| &i.price * &i.quantity))
    }

    pub fn admin_revenue(&self) -> BigDecimal {
        sum(self.items.iter().map(|i| i.admin_revenue.clone()))
    }

    pub fn ambassador_revenue(&self) -> BigDecimal {
        sum(self.items.iter().map(|i| i.ambassador_revenue.clone()))
    }
}

fn sum(values: impl Iterator<Item = BigDecimal>) -> BigDecimal {
    values.fold(BigDecimal::from(0), |acc, v| acc + v)
}

/// Result of the compare-and-set that marks an order complete.
#[derive(Debug, Clone)]
pub enum Completion {
    /// This call flipped `complete` from false to true.
    Completed(OrderView),
    /// The order was already complete; nothing changed.
    AlreadyComplete(OrderView),
}

#[derive(Debug, Clone, Copy, Default)]
pub struct OrderFilter {
    pub complete: Option<bool>,
}

#[derive(Debug, Clone)]
pub struct ListResult {
    pub items: Vec<OrderView>,
    pub total: i64,
}

// ── Provider line items ──────────────────────────────────────────────────────

pub fn payment_line_item(
    name: &str,
    description: Option<&str>,
    image: Option<&str>,
    price: &BigDecimal,
    quantity: &BigDecimal,
    currency: &str,
) -> Result<PaymentLineItem, DomainError> {
    let unit_amount = to_minor_units(price)
        .ok_or_else(|| DomainError::Validation(format!("price {price} is out of range")))?;
    Ok(PaymentLineItem {
        name: name.to_string(),
        description: description.map(str::to_string),
        image: image.map(str::to_string),
        unit_amount,
        currency: currency.to_string(),
        quantity: quantity.clone(),
    })
}
