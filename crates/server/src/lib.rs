use axum::{Json, http::StatusCode, response::IntoResponse};
use engine::EngineError;

use serde::Serialize;
pub use server::{ServerState, router, run, run_with_listener, spawn_with_listener};

mod inventory;
mod server;
mod shifts;
mod transactions;
mod views;

pub mod types {
    pub mod shift {
        pub use api_types::shift::{
            ActiveShiftResponse, ParticipantAdd, ParticipantView, ShiftEnd, ShiftStart, ShiftView,
        };
    }

    pub mod balance {
        pub use api_types::balance::{BalanceMode, BalanceQuery, BalanceView, ReconciliationView};
    }

    pub mod transaction {
        pub use api_types::transaction::{
            LineItemNew, LineItemView, TransactionCancel, TransactionComplete, TransactionList,
            TransactionListResponse, TransactionNew, TransactionReverse, TransactionUpdate,
            TransactionView,
        };
    }

    pub mod inventory {
        pub use api_types::inventory::{
            InventoryMatrixView, InventoryQuery, ItemInventoryView, SnapshotRecord,
        };
    }
}

#[derive(Debug)]
pub enum ServerError {
    Engine(EngineError),
    Generic(String),
}

#[derive(Serialize)]
struct Error {
    kind: &'static str,
    error: String,
}

fn status_for_engine_error(err: &EngineError) -> StatusCode {
    match err {
        EngineError::Validation(_) => StatusCode::UNPROCESSABLE_ENTITY,
        EngineError::Conflict(_) | EngineError::InvalidState(_) => StatusCode::CONFLICT,
        EngineError::NotFound(_) => StatusCode::NOT_FOUND,
        EngineError::Storage(_) => StatusCode::SERVICE_UNAVAILABLE,
    }
}

fn message_for_engine_error(err: EngineError) -> String {
    match err {
        EngineError::Storage(db_err) => {
            tracing::error!("database error: {db_err}");
            "storage unavailable, retry later".to_string()
        }
        other => other.to_string(),
    }
}

impl IntoResponse for ServerError {
    fn into_response(self) -> axum::response::Response {
        let (status, kind, error) = match self {
            ServerError::Engine(err) => (
                status_for_engine_error(&err),
                err.kind(),
                message_for_engine_error(err),
            ),
            ServerError::Generic(err) => (StatusCode::BAD_REQUEST, "bad_request", err),
        };

        (status, Json(Error { kind, error })).into_response()
    }
}

impl From<EngineError> for ServerError {
    fn from(value: EngineError) -> Self {
        Self::Engine(value)
    }
}
