//! Account log endpoints.

use api_types::{
    PageQuery, PageResponse,
    log::{AccountLogView, RebuildResponse},
};
use axum::{
    Extension, Json,
    extract::{Path, Query, State},
};
use engine::{PageRequest, Scope};
use uuid::Uuid;

use crate::{CurrentUser, ServerError, page_response, server::ServerState};

fn view(log: engine::AccountLog) -> AccountLogView {
    AccountLogView {
        date: log.date,
        opening_balance_minor: log.opening_balance,
        inflow_minor: log.inflow,
        outflow_minor: log.outflow,
        closing_balance_minor: log.closing_balance,
        transaction_count: log.transaction_count,
    }
}

/// Newest day first.
pub async fn list(
    Extension(user): Extension<CurrentUser>,
    State(state): State<ServerState>,
    Path(account_id): Path<Uuid>,
    Query(query): Query<PageQuery>,
) -> Result<Json<PageResponse<AccountLogView>>, ServerError> {
    let page = state
        .engine
        .account_logs(
            &Scope::User(user.id),
            account_id,
            PageRequest::new(query.page, query.per_page),
        )
        .await?;
    Ok(Json(page_response(page, view)))
}

pub async fn rebuild(
    Extension(user): Extension<CurrentUser>,
    State(state): State<ServerState>,
    Path(account_id): Path<Uuid>,
) -> Result<Json<RebuildResponse>, ServerError> {
    let summary = state
        .engine
        .rebuild_account_logs(&Scope::User(user.id), account_id)
        .await?;
    Ok(Json(RebuildResponse {
        account_id: summary.account_id,
        logs_written: summary.logs_written,
        balance_minor: summary.balance,
    }))
}
