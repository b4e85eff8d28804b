pub mod links;
pub mod orders;

use actix_web::web;

use crate::errors::AppError;

/// Registers every checkout route; shared by the server and the HTTP tests.
pub fn configure(cfg: &mut web::ServiceConfig) {
    cfg.app_data(
        web::JsonConfig::default()
            .error_handler(|err, _req| AppError::BadRequest(format!("Invalid input: {err}")).into()),
    )
    .service(web::scope("/links").route("/{code}", web::get().to(links::get_link)))
    .service(
        web::scope("/orders")
            .route("", web::post().to(orders::place_order))
            .route("", web::get().to(orders::list_orders))
            .route("/confirm", web::post().to(orders::confirm_order))
            .route(
                "/sessions/{session_id}",
                web::get().to(orders::get_order_by_session),
            )
            .route("/{id}", web::get().to(orders::get_order))
            .route(
                "/{id}/payment-session",
                web::post().to(orders::retry_payment_session),
            ),
    );
}
