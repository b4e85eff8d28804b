use std::time::Duration;

use config::{Config, ConfigError, Environment, Map};
use serde::Deserialize;
use thiserror::Error;

use crate::application::CheckoutSettings;
use crate::infrastructure::stripe::StripeConfig;

const DEFAULT_HOST: &str = "0.0.0.0";
const DEFAULT_PORT: i64 = 8080;
const DEFAULT_CURRENCY: &str = "usd";
const DEFAULT_STRIPE_API_BASE: &str = "https://api.stripe.com";
const DEFAULT_GATEWAY_TIMEOUT_SECS: i64 = 10;
const DEFAULT_GATEWAY_MAX_ATTEMPTS: i64 = 3;
const DEFAULT_FROM_EMAIL: &str = "no-reply@localhost";
const GATEWAY_RETRY_BACKOFF: Duration = Duration::from_millis(200);

#[derive(Debug, Error)]
pub enum AppConfigError {
    #[error("failed to load configuration: {0}")]
    Load(#[from] ConfigError),
    #[error("{0} must not be empty")]
    Empty(&'static str),
}

/// Flat view of the environment; keys are the lowercased variable names.
#[derive(Debug, Deserialize)]
struct EnvSettings {
    database_url: String,
    host: String,
    port: u16,
    frontend_url: String,
    stripe_api_key: String,
    stripe_api_base: String,
    checkout_currency: String,
    gateway_timeout_secs: u64,
    gateway_max_attempts: u32,
    admin_email: String,
    default_from_email: String,
    mail_relay_url: Option<String>,
    mail_relay_token: Option<String>,
}

#[derive(Debug, Clone)]
pub struct MailConfig {
    pub relay_url: Option<String>,
    pub relay_token: Option<String>,
    pub from: String,
}

#[derive(Debug, Clone)]
pub struct AppConfig {
    pub database_url: String,
    pub host: String,
    pub port: u16,
    pub checkout: CheckoutSettings,
    pub stripe: StripeConfig,
    pub mail: MailConfig,
}

impl AppConfig {
    /// Reads the configuration from the process environment.
    pub fn from_env() -> Result<Self, AppConfigError> {
        Self::load(Environment::default())
    }

    /// Reads the configuration from an explicit set of variables.
    pub fn from_vars(vars: Map<String, String>) -> Result<Self, AppConfigError> {
        Self::load(Environment::default().source(Some(vars)))
    }

    fn load(environment: Environment) -> Result<Self, AppConfigError> {
        let settings: EnvSettings = Config::builder()
            .set_default("host", DEFAULT_HOST)?
            .set_default("port", DEFAULT_PORT)?
            .set_default("stripe_api_base", DEFAULT_STRIPE_API_BASE)?
            .set_default("checkout_currency", DEFAULT_CURRENCY)?
            .set_default("gateway_timeout_secs", DEFAULT_GATEWAY_TIMEOUT_SECS)?
            .set_default("gateway_max_attempts", DEFAULT_GATEWAY_MAX_ATTEMPTS)?
            .set_default("default_from_email", DEFAULT_FROM_EMAIL)?
            .add_source(environment)
            .build()?
            .try_deserialize()?;

        for (name, value) in [
            ("DATABASE_URL", &settings.database_url),
            ("FRONTEND_URL", &settings.frontend_url),
            ("STRIPE_API_KEY", &settings.stripe_api_key),
            ("ADMIN_EMAIL", &settings.admin_email),
        ] {
            if value.trim().is_empty() {
                return Err(AppConfigError::Empty(name));
            }
        }

        Ok(settings.into())
    }
}

impl From<EnvSettings> for AppConfig {
    fn from(s: EnvSettings) -> Self {
        let frontend_url = s.frontend_url.trim_end_matches('/');
        AppConfig {
            checkout: CheckoutSettings {
                success_url: format!("{frontend_url}/checkout/success?source={{CHECKOUT_SESSION_ID}}"),
                cancel_url: format!("{frontend_url}/checkout/error"),
                currency: s.checkout_currency,
                admin_email: s.admin_email,
            },
            stripe: StripeConfig {
                api_key: s.stripe_api_key,
                api_base: s.stripe_api_base,
                timeout: Duration::from_secs(s.gateway_timeout_secs),
                max_attempts: s.gateway_max_attempts,
                retry_backoff: GATEWAY_RETRY_BACKOFF,
            },
            mail: MailConfig {
                relay_url: s.mail_relay_url.filter(|u| !u.trim().is_empty()),
                relay_token: s.mail_relay_token.filter(|t| !t.trim().is_empty()),
                from: s.default_from_email,
            },
            database_url: s.database_url,
            host: s.host,
            port: s.port,
        }
    }
}
