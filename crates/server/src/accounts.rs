//! Accounts API endpoints.

use api_types::{
    PageQuery, PageResponse,
    account::{AccountNew, AccountRename, AccountView},
};
use axum::{
    Extension, Json,
    extract::{Path, Query, State},
    http::StatusCode,
};
use engine::{CreateAccountCmd, PageRequest, Scope};
use uuid::Uuid;

use crate::{
    CurrentUser, ServerError, api_currency, engine_currency, page_response, server::ServerState,
};

fn view(account: engine::Account) -> AccountView {
    AccountView {
        id: account.id,
        name: account.name,
        currency: api_currency(account.currency),
        opening_balance_minor: account.opening_balance,
        balance_minor: account.balance,
        created_at: account.created_at,
    }
}

pub async fn list(
    Extension(user): Extension<CurrentUser>,
    State(state): State<ServerState>,
    Query(query): Query<PageQuery>,
) -> Result<Json<PageResponse<AccountView>>, ServerError> {
    let page = state
        .engine
        .list_accounts(
            &Scope::User(user.id),
            PageRequest::new(query.page, query.per_page),
        )
        .await?;
    Ok(Json(page_response(page, view)))
}

pub async fn create(
    Extension(user): Extension<CurrentUser>,
    State(state): State<ServerState>,
    Json(payload): Json<AccountNew>,
) -> Result<(StatusCode, Json<AccountView>), ServerError> {
    let mut cmd =
        CreateAccountCmd::new(user.id, payload.name).opening_balance(payload.opening_balance_minor);
    if let Some(currency) = payload.currency {
        cmd = cmd.currency(engine_currency(currency));
    }
    let account = state.engine.create_account(cmd).await?;
    Ok((StatusCode::CREATED, Json(view(account))))
}

pub async fn get(
    Extension(user): Extension<CurrentUser>,
    State(state): State<ServerState>,
    Path(account_id): Path<Uuid>,
) -> Result<Json<AccountView>, ServerError> {
    let account = state
        .engine
        .account(&Scope::User(user.id), account_id)
        .await?;
    Ok(Json(view(account)))
}

pub async fn rename(
    Extension(user): Extension<CurrentUser>,
    State(state): State<ServerState>,
    Path(account_id): Path<Uuid>,
    Json(payload): Json<AccountRename>,
) -> Result<Json<AccountView>, ServerError> {
    let account = state
        .engine
        .rename_account(&Scope::User(user.id), account_id, &payload.name)
        .await?;
    Ok(Json(view(account)))
}

pub async fn delete(
    Extension(user): Extension<CurrentUser>,
    State(state): State<ServerState>,
    Path(account_id): Path<Uuid>,
) -> Result<StatusCode, ServerError> {
    state
        .engine
        .delete_account(&Scope::User(user.id), account_id)
        .await?;
    Ok(StatusCode::NO_CONTENT)
}
