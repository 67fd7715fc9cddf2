//! Category CRUD endpoints. The kind is fixed at creation; only the name
//! can change afterwards.

use api_types::category::{
    CategoryKind, CategoryListQuery, CategoryNew, CategoryRename, CategoryView,
};
use axum::{
    Extension, Json,
    extract::{Path, Query, State},
    http::StatusCode,
};
use uuid::Uuid;

use crate::{ServerError, current_user_id, server::ServerState};
use engine::Category;

fn kind_to_engine(kind: CategoryKind) -> engine::CategoryKind {
    match kind {
        CategoryKind::Income => engine::CategoryKind::Income,
        CategoryKind::Expense => engine::CategoryKind::Expense,
    }
}

fn kind_to_api(kind: engine::CategoryKind) -> CategoryKind {
    match kind {
        engine::CategoryKind::Income => CategoryKind::Income,
        engine::CategoryKind::Expense => CategoryKind::Expense,
    }
}

fn category_view(category: Category) -> CategoryView {
    CategoryView {
        id: category.id,
        name: category.name,
        kind: kind_to_api(category.kind),
    }
}

pub async fn list(
    Extension(user): Extension<engine::users::Model>,
    State(state): State<ServerState>,
    Query(query): Query<CategoryListQuery>,
) -> Result<Json<Vec<CategoryView>>, ServerError> {
    let user_id = current_user_id(&user)?;
    let categories = state
        .engine
        .categories(user_id, query.kind.map(kind_to_engine))
        .await?;
    Ok(Json(categories.into_iter().map(category_view).collect()))
}

pub async fn get(
    Extension(user): Extension<engine::users::Model>,
    State(state): State<ServerState>,
    Path(category_id): Path<Uuid>,
) -> Result<Json<CategoryView>, ServerError> {
    let user_id = current_user_id(&user)?;
    let category = state.engine.category(user_id, category_id).await?;
    Ok(Json(category_view(category)))
}

pub async fn create(
    Extension(user): Extension<engine::users::Model>,
    State(state): State<ServerState>,
    Json(payload): Json<CategoryNew>,
) -> Result<(StatusCode, Json<CategoryView>), ServerError> {
    let user_id = current_user_id(&user)?;
    let category = state
        .engine
        .new_category(user_id, &payload.name, kind_to_engine(payload.kind))
        .await?;
    Ok((StatusCode::CREATED, Json(category_view(category))))
}

pub async fn rename(
    Extension(user): Extension<engine::users::Model>,
    State(state): State<ServerState>,
    Path(category_id): Path<Uuid>,
    Json(payload): Json<CategoryRename>,
) -> Result<Json<CategoryView>, ServerError> {
    let user_id = current_user_id(&user)?;
    let category = state
        .engine
        .rename_category(user_id, category_id, &payload.name)
        .await?;
    Ok(Json(category_view(category)))
}

pub async fn remove(
    Extension(user): Extension<engine::users::Model>,
    State(state): State<ServerState>,
    Path(category_id): Path<Uuid>,
) -> Result<StatusCode, ServerError> {
    let user_id = current_user_id(&user)?;
    state.engine.delete_category(user_id, category_id).await?;
    Ok(StatusCode::NO_CONTENT)
}
