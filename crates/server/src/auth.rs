//! Registration, social sign-in and credential recovery endpoints.
//!
//! Everything here except email verification is reachable without
//! credentials, so responses are careful not to reveal whether an email is
//! registered.

use api_types::auth::{
    ForgotPassword, Login, Message, Register, ResetPassword, SocialSignIn, VerifyEmail,
};
use api_types::user::UserView;
use axum::{Extension, Json, extract::State};

use crate::{ServerError, current_user_id, server::ServerState, users::user_view};
use engine::NewUser;

pub async fn register(
    State(state): State<ServerState>,
    Json(payload): Json<Register>,
) -> Result<Json<UserView>, ServerError> {
    let registered = state
        .engine
        .register_user(NewUser {
            email: payload.email,
            password: payload.password,
            full_name: payload.full_name,
        })
        .await?;

    state
        .mailer
        .send_verification_code(&registered.user.email, &registered.verification_code);

    user_view(registered.user).map(Json)
}

/// Credential check for clients; subsequent requests keep sending the same
/// Basic credentials.
pub async fn login(
    State(state): State<ServerState>,
    Json(payload): Json<Login>,
) -> Result<Json<UserView>, ServerError> {
    let user = state
        .engine
        .authenticate(&payload.email, &payload.password)
        .await?;
    user_view(user).map(Json)
}

pub async fn google_sign_in(
    State(state): State<ServerState>,
    Json(payload): Json<SocialSignIn>,
) -> Result<Json<UserView>, ServerError> {
    let user = state
        .engine
        .user_with_google(
            &payload.provider_id,
            &payload.email,
            payload.full_name.as_deref(),
        )
        .await?;
    user_view(user).map(Json)
}

pub async fn apple_sign_in(
    State(state): State<ServerState>,
    Json(payload): Json<SocialSignIn>,
) -> Result<Json<UserView>, ServerError> {
    let user = state
        .engine
        .user_with_apple(
            &payload.provider_id,
            &payload.email,
            payload.full_name.as_deref(),
        )
        .await?;
    user_view(user).map(Json)
}

pub async fn verify_email(
    Extension(user): Extension<engine::users::Model>,
    State(state): State<ServerState>,
    Json(payload): Json<VerifyEmail>,
) -> Result<Json<UserView>, ServerError> {
    let user_id = current_user_id(&user)?;
    let user = state.engine.verify_email_code(user_id, &payload.code).await?;
    user_view(user).map(Json)
}

pub async fn resend_verification(
    Extension(user): Extension<engine::users::Model>,
    State(state): State<ServerState>,
) -> Result<Json<Message>, ServerError> {
    let user_id = current_user_id(&user)?;
    let code = state.engine.resend_verification_code(user_id).await?;
    state.mailer.send_verification_code(&user.email, &code);
    Ok(Json(Message {
        message: "verification code sent".to_string(),
    }))
}

pub async fn forgot_password(
    State(state): State<ServerState>,
    Json(payload): Json<ForgotPassword>,
) -> Result<Json<Message>, ServerError> {
    if let Some((user, token)) = state.engine.request_password_reset(&payload.email).await? {
        state.mailer.send_password_reset(&user.email, &token);
    }
    // Same answer whether or not the email is registered.
    Ok(Json(Message {
        message: "if the email is registered, a reset message was sent".to_string(),
    }))
}

pub async fn reset_password(
    State(state): State<ServerState>,
    Json(payload): Json<ResetPassword>,
) -> Result<Json<Message>, ServerError> {
    state
        .engine
        .reset_password(&payload.token, &payload.new_password)
        .await?;
    Ok(Json(Message {
        message: "password updated".to_string(),
    }))
}
