//! Inventory API endpoints.

use api_types::inventory::{InventoryMatrixView, InventoryQuery, SnapshotRecord};
use axum::{
    Json,
    extract::{Path, Query, State},
    http::StatusCode,
};

use crate::{
    ServerError,
    server::ServerState,
    views::{matrix_view, parse_quantity},
};

pub async fn matrix(
    State(state): State<ServerState>,
    Path(branch_id): Path<i64>,
    Query(query): Query<InventoryQuery>,
) -> Result<Json<InventoryMatrixView>, ServerError> {
    let matrix = state
        .engine
        .get_matrix(branch_id, query.month, query.year)
        .await?;
    Ok(Json(matrix_view(matrix)))
}

pub async fn record_snapshot(
    State(state): State<ServerState>,
    Path(branch_id): Path<i64>,
    Json(payload): Json<SnapshotRecord>,
) -> Result<StatusCode, ServerError> {
    state
        .engine
        .record_previous_period(
            branch_id,
            payload.item_id,
            payload.month,
            payload.year,
            parse_quantity(&payload.quantity)?,
        )
        .await?;
    Ok(StatusCode::NO_CONTENT)
}
