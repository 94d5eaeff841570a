//! Transactions API endpoints.
//!
//! Every mutation answers as soon as it is committed; the account logs it
//! affects are rebuilt in the background.

use api_types::{
    PageResponse,
    transaction::{TransactionListQuery, TransactionNew, TransactionUpdate, TransactionView},
};
use axum::{
    Extension, Json,
    extract::{Path, Query, State},
    http::StatusCode,
};
use engine::{
    CreateTransactionCmd, PageRequest, Scope, TransactionListFilter, UpdateTransactionCmd,
};
use uuid::Uuid;

use crate::{CurrentUser, ServerError, page_response, server::ServerState};

fn view(tx: engine::Transaction) -> TransactionView {
    TransactionView {
        id: tx.id,
        account_id: tx.account_id,
        amount_minor: tx.amount_minor,
        occurred_on: tx.occurred_on,
        description: tx.description,
        created_at: tx.created_at,
    }
}

pub async fn list(
    Extension(user): Extension<CurrentUser>,
    State(state): State<ServerState>,
    Query(query): Query<TransactionListQuery>,
) -> Result<Json<PageResponse<TransactionView>>, ServerError> {
    let filter = TransactionListFilter {
        account_id: query.account_id,
        from: query.from,
        to: query.to,
    };
    let page = state
        .engine
        .list_transactions(
            &Scope::User(user.id),
            &filter,
            PageRequest::new(query.page, query.per_page),
        )
        .await?;
    Ok(Json(page_response(page, view)))
}

pub async fn create(
    Extension(user): Extension<CurrentUser>,
    State(state): State<ServerState>,
    Json(payload): Json<TransactionNew>,
) -> Result<(StatusCode, Json<TransactionView>), ServerError> {
    let mut cmd = CreateTransactionCmd::new(
        user.id,
        payload.account_id,
        payload.amount_minor,
        payload.occurred_on,
    );
    if let Some(description) = payload.description {
        cmd = cmd.description(description);
    }
    let tx = state.engine.create_transaction(cmd).await?;
    Ok((StatusCode::CREATED, Json(view(tx))))
}

pub async fn get(
    Extension(user): Extension<CurrentUser>,
    State(state): State<ServerState>,
    Path(transaction_id): Path<Uuid>,
) -> Result<Json<TransactionView>, ServerError> {
    let tx = state
        .engine
        .transaction(&Scope::User(user.id), transaction_id)
        .await?;
    Ok(Json(view(tx)))
}

pub async fn update(
    Extension(user): Extension<CurrentUser>,
    State(state): State<ServerState>,
    Path(transaction_id): Path<Uuid>,
    Json(payload): Json<TransactionUpdate>,
) -> Result<Json<TransactionView>, ServerError> {
    if payload.account_id.is_none()
        && payload.amount_minor.is_none()
        && payload.occurred_on.is_none()
        && payload.description.is_none()
    {
        return Err(ServerError::Generic(
            "provide at least one of account_id, amount_minor, occurred_on or description"
                .to_string(),
        ));
    }

    let cmd = UpdateTransactionCmd {
        account_id: payload.account_id,
        amount_minor: payload.amount_minor,
        occurred_on: payload.occurred_on,
        description: payload.description,
    };
    let tx = state
        .engine
        .update_transaction(&Scope::User(user.id), transaction_id, cmd)
        .await?;
    Ok(Json(view(tx)))
}

pub async fn remove(
    Extension(user): Extension<CurrentUser>,
    State(state): State<ServerState>,
    Path(transaction_id): Path<Uuid>,
) -> Result<StatusCode, ServerError> {
    state
        .engine
        .remove_transaction(&Scope::User(user.id), transaction_id)
        .await?;
    Ok(StatusCode::NO_CONTENT)
}
