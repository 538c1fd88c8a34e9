mod handlers;

use std::future::Future;
use std::net::SocketAddr;
use std::sync::Arc;

use axum::{
    extract::Extension,
    routing::{get, patch, post, put},
    Router,
};

use crate::engine::Engine;
use crate::error::{unexpected_error, Error};
use crate::server::handlers::{offers, rides, safety, session, transactions, vacations};

pub type SharedEngine = Arc<Engine>;

pub fn router(engine: SharedEngine) -> Router {
    Router::new()
        .route("/session", get(session::find))
        .route("/session/online", patch(session::toggle_online))
        .route("/session/blocked", put(session::set_blocked))
        .route("/session/reconcile", post(session::reconcile))
        .route("/session/reconnect", post(session::reconnect))
        .route("/offers/:kind/:id/accept", patch(offers::accept))
        .route("/offers/:kind/:id/reject", patch(offers::reject))
        .route("/rides/:id/start", patch(rides::start))
        .route("/rides/:id/complete", patch(rides::complete))
        .route("/rides/:id/cancel", patch(rides::cancel))
        .route("/vacations/:id/start", patch(vacations::start))
        .route("/vacations/:id/complete", patch(vacations::complete))
        .route("/safety/alerts", post(safety::create))
        .route("/transactions", get(transactions::list))
        .layer(Extension(engine))
}

pub async fn serve<F>(engine: SharedEngine, addr: SocketAddr, shutdown: F) -> Result<(), Error>
where
    F: Future<Output = ()>,
{
    let app = router(engine);

    tracing::info!("listening on {}", addr);

    axum::Server::bind(&addr)
        .serve(app.into_make_service())
        .with_graceful_shutdown(shutdown)
        .await
        .map_err(|err| {
            tracing::error!("control surface failed: {}", err);
            unexpected_error()
        })
}
