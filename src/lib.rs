pub mod application;
pub mod config;
pub mod db;
pub mod domain;
pub mod errors;
pub mod handlers;
pub mod infrastructure;
pub mod schema;

use std::sync::Arc;

use actix_web::{middleware::Logger, web, App, HttpServer};
use diesel_migrations::{embed_migrations, EmbeddedMigrations, MigrationHarness};
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

use crate::application::CheckoutService;
use crate::config::AppConfig;
use crate::domain::errors::DomainError;
use crate::domain::ports::Notifier;
use crate::infrastructure::catalog_repo::DieselCatalog;
use crate::infrastructure::mailer::{LogNotifier, MailRelayNotifier};
use crate::infrastructure::order_repo::DieselOrderRepository;
use crate::infrastructure::stripe::StripeGateway;

pub use db::{create_pool, DbPool};

pub const MIGRATIONS: EmbeddedMigrations = embed_migrations!("migrations");

#[derive(OpenApi)]
#[openapi(
    paths(
        handlers::links::get_link,
        handlers::orders::place_order,
        handlers::orders::confirm_order,
        handlers::orders::retry_payment_session,
        handlers::orders::get_order,
        handlers::orders::get_order_by_session,
        handlers::orders::list_orders,
    ),
    components(schemas(
        handlers::links::LinkResponse,
        handlers::links::AmbassadorResponse,
        handlers::links::ProductResponse,
        handlers::orders::CheckoutRequest,
        handlers::orders::CheckoutLineRequest,
        handlers::orders::CheckoutResponse,
        handlers::orders::ConfirmRequest,
        handlers::orders::OrderResponse,
        handlers::orders::OrderItemResponse,
        handlers::orders::ListOrdersResponse,
    )),
    tags(
        (name = "orders", description = "Checkout and order settlement"),
        (name = "links", description = "Referral links"),
    )
)]
pub struct ApiDoc;

/// Run any pending Diesel migrations against the pool's database.
pub fn run_migrations(pool: &DbPool) -> Result<(), DomainError> {
    let mut conn = pool.get()?;
    conn.run_pending_migrations(MIGRATIONS)
        .map_err(|e| DomainError::Internal(format!("migrations failed: {e}")))?;
    Ok(())
}

/// Wire the Diesel, Stripe and mail adapters into a [`CheckoutService`].
pub fn build_service(config: &AppConfig, pool: DbPool) -> Result<CheckoutService, DomainError> {
    let catalog = Arc::new(DieselCatalog::new(pool.clone()));
    let orders = Arc::new(DieselOrderRepository::new(pool));
    let gateway = StripeGateway::new(config.stripe.clone())
        .map_err(|e| DomainError::Internal(e.to_string()))?;
    let notifier: Arc<dyn Notifier> = match &config.mail.relay_url {
        Some(url) => Arc::new(
            MailRelayNotifier::new(url.clone(), config.mail.relay_token.clone(), config.mail.from.clone())
                .map_err(|e| DomainError::Internal(e.to_string()))?,
        ),
        None => {
            log::warn!("MAIL_RELAY_URL not set, notifications will only be logged");
            Arc::new(LogNotifier)
        }
    };

    Ok(CheckoutService::new(
        catalog.clone(),
        catalog,
        orders,
        Arc::new(gateway),
        notifier,
        config.checkout.clone(),
    ))
}

/// Build and return an actix-web `Server` bound to `host:port`.
///
/// The caller is responsible for `.await`-ing (or `tokio::spawn`-ing) the
/// returned server.
pub fn build_server(
    service: CheckoutService,
    host: &str,
    port: u16,
) -> std::io::Result<actix_web::dev::Server> {
    let service = web::Data::new(service);
    let openapi = ApiDoc::openapi();
    Ok(HttpServer::new(move || {
        App::new()
            .app_data(service.clone())
            .wrap(Logger::default())
            .configure(handlers::configure)
            .service(SwaggerUi::new("/swagger-ui/{_:.*}").url("/api-docs/openapi.json", openapi.clone()))
    })
    .bind((host.to_string(), port))?
    .run())
}
