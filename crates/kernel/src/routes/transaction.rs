//! Transaction and transaction part routes.

use axum::extract::State;
use axum::routing::{get, patch, post};
use axum::{Json, Router};
use serde::Serialize;
use tracing::info;

use super::helpers::{Created, Empty, Id, JsonBody, QueryParams};
use crate::error::AppResult;
use crate::models::{
    CreateTransaction, CreateTransactionPart, Transaction, TransactionFilter, TransactionPart,
    UpdateTransaction, UpdateTransactionPart,
};
use crate::state::AppState;
use crate::validation::{check_filter, require_min, require_min_opt};

#[derive(Serialize)]
struct TransactionsResponse {
    transactions: Vec<Transaction>,
}

#[derive(Serialize)]
struct PartsResponse {
    parts: Vec<TransactionPart>,
}

async fn list_transactions(
    State(state): State<AppState>,
    QueryParams(filter): QueryParams<TransactionFilter>,
) -> AppResult<Json<TransactionsResponse>> {
    check_filter(&filter)?;
    let mut conn = state.db().acquire().await?;
    let transactions = Transaction::list(&mut conn, &filter).await?;
    Ok(Json(TransactionsResponse { transactions }))
}

async fn create_transaction(
    State(state): State<AppState>,
    Id(dataset): Id,
    JsonBody(body): JsonBody<CreateTransaction>,
) -> AppResult<Created> {
    let mut tx = state.db().begin().await?;
    let id = Transaction::create(&mut tx, dataset, &body).await?;
    tx.commit().await?;

    info!(id, dataset, "transaction created");
    Ok(Created { id })
}

async fn update_transaction(
    State(state): State<AppState>,
    Id(id): Id,
    JsonBody(body): JsonBody<UpdateTransaction>,
) -> AppResult<Empty> {
    let mut tx = state.db().begin().await?;
    Transaction::update(&mut tx, id, body).await?;
    tx.commit().await?;
    Ok(Empty {})
}

async fn delete_transaction(State(state): State<AppState>, Id(id): Id) -> AppResult<Empty> {
    let mut tx = state.db().begin().await?;
    Transaction::delete(&mut tx, id).await?;
    tx.commit().await?;

    info!(id, "transaction deleted");
    Ok(Empty {})
}

async fn list_parts(
    State(state): State<AppState>,
    Id(txn): Id,
) -> AppResult<Json<PartsResponse>> {
    let mut conn = state.db().acquire().await?;
    let parts = TransactionPart::list(&mut conn, txn).await?;
    Ok(Json(PartsResponse { parts }))
}

async fn create_part(
    State(state): State<AppState>,
    Id(txn): Id,
    JsonBody(body): JsonBody<CreateTransactionPart>,
) -> AppResult<Created> {
    require_min("amount", body.amount, 0)?;
    require_min_opt("category", body.category, 0)?;

    let mut tx = state.db().begin().await?;
    let id = TransactionPart::create(&mut tx, txn, &body).await?;
    tx.commit().await?;
    Ok(Created { id })
}

async fn update_part(
    State(state): State<AppState>,
    Id(id): Id,
    JsonBody(body): JsonBody<UpdateTransactionPart>,
) -> AppResult<Empty> {
    let mut tx = state.db().begin().await?;
    TransactionPart::update(&mut tx, id, body).await?;
    tx.commit().await?;
    Ok(Empty {})
}

/// Create the transaction router.
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/transactions", get(list_transactions))
        .route(
            "/transaction/{id}",
            patch(update_transaction).delete(delete_transaction),
        )
        .route("/dataset/{id}/transactions", post(create_transaction))
        .route("/transaction/{id}/parts", get(list_parts).post(create_part))
        .route("/transaction_part/{id}", patch(update_part))
}
