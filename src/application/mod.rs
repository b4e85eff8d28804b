pub mod checkout_service;

pub use checkout_service::{
    CheckoutOutcome, CheckoutService, CheckoutSettings, ConfirmationOutcome, LinkDetails,
};
