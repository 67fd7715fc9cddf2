//! Ledger endpoints: paginated history plus the four balance-moving
//! operations. Every POST responds with the ledger entry it appended.

use api_types::transaction::{
    EntryKind, EntryView, ExpenseAssign, GoalAssign, IncomeAssign, LedgerQuery, LedgerResponse,
    WalletTransferNew,
};
use axum::{
    Extension, Json,
    extract::{Path, Query, State},
    http::StatusCode,
};
use uuid::Uuid;

use crate::{ServerError, current_user_id, server::ServerState};
use engine::{
    AssignIncomeCmd, AssignToExpenseCmd, AssignToGoalCmd, LedgerEntry, LedgerListFilter,
    WalletTransferCmd,
};

const DEFAULT_PAGE_SIZE: u64 = 50;
const MAX_PAGE_SIZE: u64 = 200;

fn kind_to_engine(kind: EntryKind) -> engine::EntryKind {
    match kind {
        EntryKind::Income => engine::EntryKind::Income,
        EntryKind::Expense => engine::EntryKind::Expense,
        EntryKind::GoalTransfer => engine::EntryKind::GoalTransfer,
        EntryKind::WalletTransfer => engine::EntryKind::WalletTransfer,
    }
}

fn kind_to_api(kind: engine::EntryKind) -> EntryKind {
    match kind {
        engine::EntryKind::Income => EntryKind::Income,
        engine::EntryKind::Expense => EntryKind::Expense,
        engine::EntryKind::GoalTransfer => EntryKind::GoalTransfer,
        engine::EntryKind::WalletTransfer => EntryKind::WalletTransfer,
    }
}

pub(crate) fn entry_view(entry: LedgerEntry) -> EntryView {
    EntryView {
        id: entry.id,
        kind: kind_to_api(entry.kind),
        amount_minor: entry.amount_minor,
        occurred_on: entry.occurred_on,
        note: entry.note,
        from_wallet_id: entry.from_wallet_id,
        to_wallet_id: entry.to_wallet_id,
        to_goal_id: entry.to_goal_id,
        from_category_id: entry.from_category_id,
        to_category_id: entry.to_category_id,
        created_at: entry.created_at,
    }
}

pub async fn list(
    Extension(user): Extension<engine::users::Model>,
    State(state): State<ServerState>,
    Query(query): Query<LedgerQuery>,
) -> Result<Json<LedgerResponse>, ServerError> {
    let user_id = current_user_id(&user)?;
    let filter = LedgerListFilter {
        from: query.from,
        to: query.to,
        kinds: query.kind.map(|kind| vec![kind_to_engine(kind)]),
        wallet_id: query.wallet_id,
    };
    let limit = query
        .limit
        .unwrap_or(DEFAULT_PAGE_SIZE)
        .clamp(1, MAX_PAGE_SIZE);
    let (entries, next_cursor) = state
        .engine
        .list_ledger_page(user_id, limit, query.cursor.as_deref(), &filter)
        .await?;
    Ok(Json(LedgerResponse {
        entries: entries.into_iter().map(entry_view).collect(),
        next_cursor,
    }))
}

pub async fn get(
    Extension(user): Extension<engine::users::Model>,
    State(state): State<ServerState>,
    Path(transaction_id): Path<Uuid>,
) -> Result<Json<EntryView>, ServerError> {
    let user_id = current_user_id(&user)?;
    let entry = state.engine.transaction(user_id, transaction_id).await?;
    Ok(Json(entry_view(entry)))
}

pub async fn assign_to_goal(
    Extension(user): Extension<engine::users::Model>,
    State(state): State<ServerState>,
    Path(goal_id): Path<Uuid>,
    Json(payload): Json<GoalAssign>,
) -> Result<(StatusCode, Json<EntryView>), ServerError> {
    let user_id = current_user_id(&user)?;
    let assignment = state
        .engine
        .assign_to_goal(AssignToGoalCmd {
            user_id,
            wallet_id: payload.wallet_id,
            goal_id,
            amount_minor: payload.amount_minor,
            occurred_on: payload.occurred_on,
            note: payload.note,
        })
        .await?;
    Ok((StatusCode::CREATED, Json(entry_view(assignment.transaction))))
}

pub async fn assign_to_expense(
    Extension(user): Extension<engine::users::Model>,
    State(state): State<ServerState>,
    Path(expense_id): Path<Uuid>,
    Json(payload): Json<ExpenseAssign>,
) -> Result<(StatusCode, Json<EntryView>), ServerError> {
    let user_id = current_user_id(&user)?;
    let assignment = state
        .engine
        .assign_to_expense(AssignToExpenseCmd {
            user_id,
            wallet_id: payload.wallet_id,
            expense_id,
            amount_minor: payload.amount_minor,
            occurred_on: payload.occurred_on,
            category_id: payload.category_id,
            note: payload.note,
        })
        .await?;
    Ok((StatusCode::CREATED, Json(entry_view(assignment.transaction))))
}

pub async fn assign_income(
    Extension(user): Extension<engine::users::Model>,
    State(state): State<ServerState>,
    Path(income_id): Path<Uuid>,
    Json(payload): Json<IncomeAssign>,
) -> Result<(StatusCode, Json<EntryView>), ServerError> {
    let user_id = current_user_id(&user)?;
    let assignment = state
        .engine
        .assign_income(AssignIncomeCmd {
            user_id,
            income_id,
            wallet_id: payload.wallet_id,
            amount_minor: payload.amount_minor,
            occurred_on: payload.occurred_on,
            category_id: payload.category_id,
            note: payload.note,
        })
        .await?;
    Ok((StatusCode::CREATED, Json(entry_view(assignment.transaction))))
}

pub async fn transfer_between_wallets(
    Extension(user): Extension<engine::users::Model>,
    State(state): State<ServerState>,
    Json(payload): Json<WalletTransferNew>,
) -> Result<(StatusCode, Json<EntryView>), ServerError> {
    let user_id = current_user_id(&user)?;
    let transfer = state
        .engine
        .transfer_between_wallets(WalletTransferCmd {
            user_id,
            from_wallet_id: payload.from_wallet_id,
            to_wallet_id: payload.to_wallet_id,
            amount_minor: payload.amount_minor,
            occurred_on: payload.occurred_on,
            note: payload.note,
        })
        .await?;
    Ok((StatusCode::CREATED, Json(entry_view(transfer.transaction))))
}
