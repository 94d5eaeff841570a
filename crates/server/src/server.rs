use std::sync::Arc;

use axum::{
    Router, middleware,
    routing::{get, post},
};

use crate::{accounts, auth, logs, settings, transactions};
use engine::Engine;

#[derive(Clone)]
pub struct ServerState {
    pub engine: Arc<Engine>,
    pub tokens: Arc<auth::TokenIssuer>,
}

impl ServerState {
    pub fn new(engine: Arc<Engine>, tokens: auth::TokenIssuer) -> Self {
        Self {
            engine,
            tokens: Arc::new(tokens),
        }
    }
}

pub fn router(state: ServerState) -> Router {
    let protected = Router::new()
        .route("/user/settings", get(settings::get).put(settings::update))
        .route("/accounts", get(accounts::list).post(accounts::create))
        .route(
            "/accounts/{id}",
            get(accounts::get)
                .patch(accounts::rename)
                .delete(accounts::delete),
        )
        .route("/accounts/{id}/logs", get(logs::list))
        .route("/accounts/{id}/logs/rebuild", post(logs::rebuild))
        .route(
            "/transactions",
            get(transactions::list).post(transactions::create),
        )
        .route(
            "/transactions/{id}",
            get(transactions::get)
                .patch(transactions::update)
                .delete(transactions::remove),
        )
        .route_layer(middleware::from_fn_with_state(
            state.clone(),
            auth::require_bearer,
        ));

    Router::new()
        .route("/login", post(auth::login))
        .merge(protected)
        .with_state(state)
}

pub async fn run_with_listener(
    state: ServerState,
    listener: tokio::net::TcpListener,
) -> Result<(), std::io::Error> {
    let addr = listener.local_addr()?;
    tracing::info!("Server listening on {}", addr);

    axum::serve(listener, router(state)).await
}
