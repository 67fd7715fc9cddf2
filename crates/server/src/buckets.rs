//! Income and expense bucket endpoints.
//!
//! Buckets are created empty; their `amount_minor` and last-assignment
//! snapshot only change through the ledger endpoints in
//! [`crate::transactions`].

use api_types::bucket::{BucketNew, BucketUpdate, BucketView};
use axum::{
    Extension, Json,
    extract::{Path, State},
    http::StatusCode,
};
use uuid::Uuid;

use crate::{ServerError, current_user_id, server::ServerState};
use engine::{Bucket, NewBucket, UpdateBucket};

pub(crate) fn bucket_view(bucket: Bucket) -> BucketView {
    BucketView {
        id: bucket.id,
        name: bucket.name,
        icon: bucket.icon,
        color: bucket.color,
        amount_minor: bucket.amount_minor,
        wallet_id: bucket.wallet_id,
        category_id: bucket.category_id,
        occurred_on: bucket.occurred_on,
        note: bucket.note,
    }
}

fn new_bucket(payload: BucketNew) -> NewBucket {
    NewBucket {
        name: payload.name,
        icon: payload.icon,
        color: payload.color,
    }
}

fn update_bucket(payload: BucketUpdate) -> UpdateBucket {
    UpdateBucket {
        name: payload.name,
        icon: payload.icon,
        color: payload.color,
    }
}

pub async fn income_list(
    Extension(user): Extension<engine::users::Model>,
    State(state): State<ServerState>,
) -> Result<Json<Vec<BucketView>>, ServerError> {
    let user_id = current_user_id(&user)?;
    let incomes = state.engine.incomes(user_id).await?;
    Ok(Json(incomes.into_iter().map(bucket_view).collect()))
}

pub async fn income_get(
    Extension(user): Extension<engine::users::Model>,
    State(state): State<ServerState>,
    Path(income_id): Path<Uuid>,
) -> Result<Json<BucketView>, ServerError> {
    let user_id = current_user_id(&user)?;
    let income = state.engine.income(user_id, income_id).await?;
    Ok(Json(bucket_view(income)))
}

pub async fn income_create(
    Extension(user): Extension<engine::users::Model>,
    State(state): State<ServerState>,
    Json(payload): Json<BucketNew>,
) -> Result<(StatusCode, Json<BucketView>), ServerError> {
    let user_id = current_user_id(&user)?;
    let income = state.engine.new_income(user_id, new_bucket(payload)).await?;
    Ok((StatusCode::CREATED, Json(bucket_view(income))))
}

pub async fn income_update(
    Extension(user): Extension<engine::users::Model>,
    State(state): State<ServerState>,
    Path(income_id): Path<Uuid>,
    Json(payload): Json<BucketUpdate>,
) -> Result<Json<BucketView>, ServerError> {
    let user_id = current_user_id(&user)?;
    let income = state
        .engine
        .update_income(user_id, income_id, update_bucket(payload))
        .await?;
    Ok(Json(bucket_view(income)))
}

pub async fn income_remove(
    Extension(user): Extension<engine::users::Model>,
    State(state): State<ServerState>,
    Path(income_id): Path<Uuid>,
) -> Result<StatusCode, ServerError> {
    let user_id = current_user_id(&user)?;
    state.engine.delete_income(user_id, income_id).await?;
    Ok(StatusCode::NO_CONTENT)
}

pub async fn expense_list(
    Extension(user): Extension<engine::users::Model>,
    State(state): State<ServerState>,
) -> Result<Json<Vec<BucketView>>, ServerError> {
    let user_id = current_user_id(&user)?;
    let expenses = state.engine.expenses(user_id).await?;
    Ok(Json(expenses.into_iter().map(bucket_view).collect()))
}

pub async fn expense_get(
    Extension(user): Extension<engine::users::Model>,
    State(state): State<ServerState>,
    Path(expense_id): Path<Uuid>,
) -> Result<Json<BucketView>, ServerError> {
    let user_id = current_user_id(&user)?;
    let expense = state.engine.expense(user_id, expense_id).await?;
    Ok(Json(bucket_view(expense)))
}

pub async fn expense_create(
    Extension(user): Extension<engine::users::Model>,
    State(state): State<ServerState>,
    Json(payload): Json<BucketNew>,
) -> Result<(StatusCode, Json<BucketView>), ServerError> {
    let user_id = current_user_id(&user)?;
    let expense = state
        .engine
        .new_expense(user_id, new_bucket(payload))
        .await?;
    Ok((StatusCode::CREATED, Json(bucket_view(expense))))
}

pub async fn expense_update(
    Extension(user): Extension<engine::users::Model>,
    State(state): State<ServerState>,
    Path(expense_id): Path<Uuid>,
    Json(payload): Json<BucketUpdate>,
) -> Result<Json<BucketView>, ServerError> {
    let user_id = current_user_id(&user)?;
    let expense = state
        .engine
        .update_expense(user_id, expense_id, update_bucket(payload))
        .await?;
    Ok(Json(bucket_view(expense)))
}

pub async fn expense_remove(
    Extension(user): Extension<engine::users::Model>,
    State(state): State<ServerState>,
    Path(expense_id): Path<Uuid>,
) -> Result<StatusCode, ServerError> {
    let user_id = current_user_id(&user)?;
    state.engine.delete_expense(user_id, expense_id).await?;
    Ok(StatusCode::NO_CONTENT)
}
