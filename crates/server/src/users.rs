//! The authenticated account's own profile.

use api_types::user::{UserUpdate, UserView};
use axum::{Extension, Json, extract::State, http::StatusCode};
use uuid::Uuid;

use crate::{ServerError, current_user_id, server::ServerState};
use engine::UpdateUser;

pub(crate) fn user_view(user: engine::users::Model) -> Result<UserView, ServerError> {
    Ok(UserView {
        id: Uuid::parse_str(&user.id)
            .map_err(|_| ServerError::Generic("invalid user id".to_string()))?,
        email: user.email,
        full_name: user.full_name,
        is_email_verified: user.is_email_verified,
        created_at: user.created_at,
    })
}

pub async fn me(
    Extension(user): Extension<engine::users::Model>,
) -> Result<Json<UserView>, ServerError> {
    user_view(user).map(Json)
}

pub async fn update(
    Extension(user): Extension<engine::users::Model>,
    State(state): State<ServerState>,
    Json(payload): Json<UserUpdate>,
) -> Result<Json<UserView>, ServerError> {
    let user_id = current_user_id(&user)?;
    let user = state
        .engine
        .update_user(
            user_id,
            UpdateUser {
                full_name: payload.full_name,
                password: payload.password,
            },
        )
        .await?;
    user_view(user).map(Json)
}

pub async fn remove(
    Extension(user): Extension<engine::users::Model>,
    State(state): State<ServerState>,
) -> Result<StatusCode, ServerError> {
    let user_id = current_user_id(&user)?;
    state.engine.delete_user(user_id).await?;
    Ok(StatusCode::NO_CONTENT)
}
