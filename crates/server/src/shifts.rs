//! Shift API endpoints.

use api_types::{
    balance::{BalanceMode, BalanceQuery, BalanceView, ReconciliationView},
    shift::{ActiveShiftResponse, ParticipantAdd, ShiftEnd, ShiftStart, ShiftView},
    transaction::{TransactionList, TransactionListResponse},
};
use axum::{
    Json,
    extract::{Path, Query, State},
    http::StatusCode,
};
use engine::{StartShiftCmd, TransactionListFilter};
use uuid::Uuid;

use crate::{
    ServerError,
    server::ServerState,
    views::{
        at_or_now, balance_view, kind_from_api, parse_money, reconciliation_view, shift_view,
        status_from_api, transaction_view,
    },
};

const DEFAULT_PAGE: u64 = 50;

pub async fn start(
    State(state): State<ServerState>,
    Json(payload): Json<ShiftStart>,
) -> Result<(StatusCode, Json<ShiftView>), ServerError> {
    let mut cmd = StartShiftCmd::new(
        payload.employee_id,
        parse_money(&payload.initial_cash)?,
        at_or_now(payload.started_at),
    );
    if let Some(branch_id) = payload.branch_id {
        cmd = cmd.branch_id(branch_id);
    }

    let shift = state.engine.start_shift(cmd).await?;
    Ok((StatusCode::CREATED, Json(shift_view(shift, Vec::new()))))
}

pub async fn get(
    State(state): State<ServerState>,
    Path(shift_id): Path<Uuid>,
) -> Result<Json<ShiftView>, ServerError> {
    let shift = state.engine.shift(shift_id).await?;
    let participants = state.engine.shift_participants(shift_id).await?;
    Ok(Json(shift_view(shift, participants)))
}

pub async fn active_for_employee(
    State(state): State<ServerState>,
    Path(employee_id): Path<i64>,
) -> Result<Json<ActiveShiftResponse>, ServerError> {
    let shift = match state.engine.active_shift(employee_id).await? {
        Some(shift) => {
            let participants = state.engine.shift_participants(shift.id).await?;
            Some(shift_view(shift, participants))
        }
        None => None,
    };
    Ok(Json(ActiveShiftResponse { shift }))
}

pub async fn add_participant(
    State(state): State<ServerState>,
    Path(shift_id): Path<Uuid>,
    Json(payload): Json<ParticipantAdd>,
) -> Result<StatusCode, ServerError> {
    state
        .engine
        .add_participant(shift_id, payload.employee_id, at_or_now(payload.added_at))
        .await?;
    Ok(StatusCode::NO_CONTENT)
}

pub async fn end(
    State(state): State<ServerState>,
    Path(shift_id): Path<Uuid>,
    Json(payload): Json<ShiftEnd>,
) -> Result<Json<ShiftView>, ServerError> {
    let shift = state
        .engine
        .end_shift(shift_id, at_or_now(payload.ended_at))
        .await?;
    let participants = state.engine.shift_participants(shift_id).await?;
    Ok(Json(shift_view(shift, participants)))
}

pub async fn balance(
    State(state): State<ServerState>,
    Path(shift_id): Path<Uuid>,
    Query(query): Query<BalanceQuery>,
) -> Result<Json<BalanceView>, ServerError> {
    let balance = match query.mode.unwrap_or_default() {
        BalanceMode::Incremental => state.engine.compute_balance(shift_id).await?,
        BalanceMode::Scan => state.engine.compute_balance_scan(shift_id).await?,
    };
    Ok(Json(balance_view(balance)))
}

pub async fn reconcile(
    State(state): State<ServerState>,
    Path(shift_id): Path<Uuid>,
) -> Result<Json<ReconciliationView>, ServerError> {
    let rec = state.engine.reconcile_shift(shift_id).await?;
    Ok(Json(reconciliation_view(rec)))
}

pub async fn transactions(
    State(state): State<ServerState>,
    Path(shift_id): Path<Uuid>,
    Query(query): Query<TransactionList>,
) -> Result<Json<TransactionListResponse>, ServerError> {
    let filter = TransactionListFilter {
        kinds: query.kind.map(|kind| vec![kind_from_api(kind)]),
        statuses: query.status.map(|status| vec![status_from_api(status)]),
    };
    let (transactions, next_cursor) = state
        .engine
        .list_shift_transactions(
            shift_id,
            query.limit.unwrap_or(DEFAULT_PAGE),
            query.cursor.as_deref(),
            &filter,
        )
        .await?;

    Ok(Json(TransactionListResponse {
        transactions: transactions.into_iter().map(transaction_view).collect(),
        next_cursor,
    }))
}
