use axum::{
    Json, Router,
    routing::{get, post, put},
};
use axum_extra::headers::{Error as AxumError, Header};

use std::sync::Arc;

use crate::{inventory, shifts, transactions};
use api_types::health::Health;
use engine::Engine;

static IDEMPOTENCY_HEADER: axum::http::HeaderName =
    axum::http::HeaderName::from_static("idempotency-key");

#[derive(Clone)]
pub struct ServerState {
    pub engine: Arc<Engine>,
}

/// `TypedHeader` for the `Idempotency-Key` header
///
/// Retried creates carrying the same key return the originally recorded
/// transaction.
#[derive(Debug)]
pub(crate) struct IdempotencyKey(pub(crate) String);

impl Header for IdempotencyKey {
    fn name() -> &'static axum::http::HeaderName {
        &IDEMPOTENCY_HEADER
    }

    fn decode<'i, I>(values: &mut I) -> Result<Self, AxumError>
    where
        Self: Sized,
        I: Iterator<Item = &'i axum::http::HeaderValue>,
    {
        let value = values.next().ok_or_else(AxumError::invalid)?;
        let Ok(value) = value.to_str() else {
            return Err(AxumError::invalid());
        };
        let value = value.trim();
        if value.is_empty() {
            return Err(AxumError::invalid());
        }

        Ok(IdempotencyKey(value.to_string()))
    }

    fn encode<E: Extend<axum::http::HeaderValue>>(&self, values: &mut E) {
        match axum::http::HeaderValue::from_str(&self.0) {
            Ok(value) => values.extend(std::iter::once(value)),
            Err(_) => tracing::error!("failed to encode idempotency-key header"),
        }
    }
}

async fn health() -> Json<Health> {
    Json(Health {
        status: "ok".to_string(),
    })
}

pub fn router(state: ServerState) -> Router {
    Router::new()
        .route("/health", get(health))
        .route("/shifts", post(shifts::start))
        .route("/shifts/{id}", get(shifts::get))
        .route("/shifts/{id}/participants", post(shifts::add_participant))
        .route("/shifts/{id}/end", post(shifts::end))
        .route("/shifts/{id}/balance", get(shifts::balance))
        .route("/shifts/{id}/reconcile", get(shifts::reconcile))
        .route("/shifts/{id}/transactions", get(shifts::transactions))
        .route("/employees/{id}/active-shift", get(shifts::active_for_employee))
        .route("/transactions", post(transactions::create))
        .route(
            "/transactions/{id}",
            get(transactions::get).put(transactions::update),
        )
        .route("/transactions/{id}/complete", post(transactions::complete))
        .route("/transactions/{id}/cancel", post(transactions::cancel))
        .route("/transactions/{id}/reverse", post(transactions::reverse))
        .route("/branches/{id}/inventory", get(inventory::matrix))
        .route(
            "/branches/{id}/inventory/snapshots",
            put(inventory::record_snapshot),
        )
        .with_state(state)
}

pub async fn run(engine: Engine, bind: &str) {
    let listener = match tokio::net::TcpListener::bind(bind).await {
        Ok(listener) => listener,
        Err(err) => {
            tracing::error!("failed to bind server listener: {err}");
            return;
        }
    };
    if let Err(err) = run_with_listener(engine, listener).await {
        tracing::error!("server failed: {err}");
    }
}

pub async fn run_with_listener(
    engine: Engine,
    listener: tokio::net::TcpListener,
) -> Result<(), std::io::Error> {
    let addr = listener.local_addr()?;
    tracing::info!("Server listening on {}", addr);

    let state = ServerState {
        engine: Arc::new(engine),
    };

    axum::serve(listener, router(state)).await
}

pub fn spawn_with_listener(
    engine: Engine,
    listener: tokio::net::TcpListener,
) -> Result<std::net::SocketAddr, std::io::Error> {
    let addr = listener.local_addr()?;

    tokio::spawn(async move {
        if let Err(err) = run_with_listener(engine, listener).await {
            tracing::error!("server failed: {err}");
        }
    });

    Ok(addr)
}
