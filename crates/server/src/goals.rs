//! Savings goal CRUD endpoints. Progress only moves through the ledger's
//! goal assignment.

use api_types::goal::{GoalNew, GoalUpdate, GoalView};
use axum::{
    Extension, Json,
    extract::{Path, State},
    http::StatusCode,
};
use uuid::Uuid;

use crate::{ServerError, current_user_id, server::ServerState};
use engine::{Goal, NewGoal, UpdateGoal};

fn goal_view(goal: Goal) -> GoalView {
    let remaining_minor = goal.remaining_minor();
    GoalView {
        id: goal.id,
        name: goal.name,
        target_minor: goal.target_minor,
        current_minor: goal.current_minor,
        remaining_minor,
        currency: goal.currency,
        icon: goal.icon,
        color: goal.color,
        plan_period: goal.plan_period,
        plan_amount_minor: goal.plan_amount_minor,
        created_at: goal.created_at,
        updated_at: goal.updated_at,
    }
}

pub async fn list(
    Extension(user): Extension<engine::users::Model>,
    State(state): State<ServerState>,
) -> Result<Json<Vec<GoalView>>, ServerError> {
    let user_id = current_user_id(&user)?;
    let goals = state.engine.goals(user_id).await?;
    Ok(Json(goals.into_iter().map(goal_view).collect()))
}

pub async fn get(
    Extension(user): Extension<engine::users::Model>,
    State(state): State<ServerState>,
    Path(goal_id): Path<Uuid>,
) -> Result<Json<GoalView>, ServerError> {
    let user_id = current_user_id(&user)?;
    let goal = state.engine.goal(user_id, goal_id).await?;
    Ok(Json(goal_view(goal)))
}

pub async fn create(
    Extension(user): Extension<engine::users::Model>,
    State(state): State<ServerState>,
    Json(payload): Json<GoalNew>,
) -> Result<(StatusCode, Json<GoalView>), ServerError> {
    let user_id = current_user_id(&user)?;
    let goal = state
        .engine
        .new_goal(
            user_id,
            NewGoal {
                name: payload.name,
                target_minor: payload.target_minor,
                currency: payload.currency,
                icon: payload.icon,
                color: payload.color,
                plan_period: payload.plan_period,
                plan_amount_minor: payload.plan_amount_minor,
            },
        )
        .await?;
    Ok((StatusCode::CREATED, Json(goal_view(goal))))
}

pub async fn update(
    Extension(user): Extension<engine::users::Model>,
    State(state): State<ServerState>,
    Path(goal_id): Path<Uuid>,
    Json(payload): Json<GoalUpdate>,
) -> Result<Json<GoalView>, ServerError> {
    let user_id = current_user_id(&user)?;
    let goal = state
        .engine
        .update_goal(
            user_id,
            goal_id,
            UpdateGoal {
                name: payload.name,
                target_minor: payload.target_minor,
                icon: payload.icon,
                color: payload.color,
                plan_period: payload.plan_period,
                plan_amount_minor: payload.plan_amount_minor,
            },
        )
        .await?;
    Ok(Json(goal_view(goal)))
}

pub async fn remove(
    Extension(user): Extension<engine::users::Model>,
    State(state): State<ServerState>,
    Path(goal_id): Path<Uuid>,
) -> Result<StatusCode, ServerError> {
    let user_id = current_user_id(&user)?;
    state.engine.delete_goal(user_id, goal_id).await?;
    Ok(StatusCode::NO_CONTENT)
}
