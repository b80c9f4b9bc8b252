//! Transactions API endpoints

use api_types::transaction::{
    TransactionCancel, TransactionComplete, TransactionNew, TransactionReverse, TransactionUpdate,
    TransactionView,
};
use axum::{
    Json,
    extract::{Path, State},
    http::StatusCode,
};
use axum_extra::TypedHeader;
use engine::{CreateTransactionCmd, PartyType, ReverseTransactionCmd, UpdatePendingCmd};

use crate::{
    ServerError,
    server::{IdempotencyKey, ServerState},
    views::{
        at_or_now, kind_from_api, line_items, method_from_api, parse_money, party_from_api,
        transaction_view,
    },
};

pub async fn create(
    State(state): State<ServerState>,
    key: Option<TypedHeader<IdempotencyKey>>,
    Json(payload): Json<TransactionNew>,
) -> Result<(StatusCode, Json<TransactionView>), ServerError> {
    let mut cmd = CreateTransactionCmd::new(
        payload.shift_id,
        kind_from_api(payload.kind),
        at_or_now(payload.created_at),
    );
    cmd.party_type = payload
        .party_type
        .map_or(PartyType::None, party_from_api);
    cmd.party_id = payload.party_id;
    if let Some(method) = payload.payment_method {
        cmd = cmd.payment_method(method_from_api(method));
    }
    if let Some(amount) = payload.amount.as_deref() {
        cmd = cmd.amount(parse_money(amount)?);
    }
    cmd.items = line_items(payload.items)?;
    cmd.notes = payload.notes;
    cmd.idempotency_key = key.map(|TypedHeader(key)| key.0);
    cmd.complete = payload.complete;

    let tx = state.engine.create_transaction(cmd).await?;
    Ok((StatusCode::CREATED, Json(transaction_view(tx))))
}

pub async fn get(
    State(state): State<ServerState>,
    Path(transaction_id): Path<i64>,
) -> Result<Json<TransactionView>, ServerError> {
    let tx = state.engine.transaction(transaction_id).await?;
    Ok(Json(transaction_view(tx)))
}

pub async fn update(
    State(state): State<ServerState>,
    Path(transaction_id): Path<i64>,
    Json(payload): Json<TransactionUpdate>,
) -> Result<Json<TransactionView>, ServerError> {
    let mut cmd = UpdatePendingCmd::new();
    match (payload.party_type, payload.party_id) {
        (Some(party_type), party_id) => {
            cmd = cmd.party(party_from_api(party_type), party_id);
        }
        (None, Some(_)) => {
            return Err(ServerError::Generic(
                "party_id requires party_type".to_string(),
            ));
        }
        (None, None) => {}
    }
    if let Some(method) = payload.payment_method {
        cmd = cmd.payment_method(method_from_api(method));
    }
    if let Some(amount) = payload.amount.as_deref() {
        cmd = cmd.amount(parse_money(amount)?);
    }
    if let Some(items) = payload.items {
        cmd = cmd.items(line_items(items)?);
    }
    if let Some(notes) = payload.notes {
        cmd = cmd.notes(notes);
    }

    let tx = state
        .engine
        .update_pending_transaction(transaction_id, cmd)
        .await?;
    Ok(Json(transaction_view(tx)))
}

pub async fn complete(
    State(state): State<ServerState>,
    Path(transaction_id): Path<i64>,
    Json(payload): Json<TransactionComplete>,
) -> Result<Json<TransactionView>, ServerError> {
    let tx = state
        .engine
        .complete_transaction(transaction_id, at_or_now(payload.completed_at))
        .await?;
    Ok(Json(transaction_view(tx)))
}

pub async fn cancel(
    State(state): State<ServerState>,
    Path(transaction_id): Path<i64>,
    Json(payload): Json<TransactionCancel>,
) -> Result<Json<TransactionView>, ServerError> {
    let tx = state
        .engine
        .cancel_transaction(transaction_id, at_or_now(payload.cancelled_at))
        .await?;
    Ok(Json(transaction_view(tx)))
}

pub async fn reverse(
    State(state): State<ServerState>,
    Path(transaction_id): Path<i64>,
    key: Option<TypedHeader<IdempotencyKey>>,
    Json(payload): Json<TransactionReverse>,
) -> Result<(StatusCode, Json<TransactionView>), ServerError> {
    let mut cmd = ReverseTransactionCmd::new(transaction_id, at_or_now(payload.created_at));
    if let Some(notes) = payload.notes {
        cmd = cmd.notes(notes);
    }
    if let Some(TypedHeader(key)) = key {
        cmd = cmd.idempotency_key(key.0);
    }

    let tx = state.engine.reverse_transaction(cmd).await?;
    Ok((StatusCode::CREATED, Json(transaction_view(tx))))
}
