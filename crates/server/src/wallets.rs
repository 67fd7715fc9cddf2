//! Wallet CRUD endpoints.

use api_types::wallet::{WalletNew, WalletUpdate, WalletView};
use axum::{
    Extension, Json,
    extract::{Path, State},
    http::StatusCode,
};
use uuid::Uuid;

use crate::{ServerError, current_user_id, server::ServerState};
use engine::{NewWallet, UpdateWallet, Wallet};

fn wallet_view(wallet: Wallet) -> WalletView {
    WalletView {
        id: wallet.id,
        name: wallet.name,
        balance_minor: wallet.balance_minor,
        currency: wallet.currency,
        icon: wallet.icon,
        color: wallet.color,
    }
}

pub async fn list(
    Extension(user): Extension<engine::users::Model>,
    State(state): State<ServerState>,
) -> Result<Json<Vec<WalletView>>, ServerError> {
    let user_id = current_user_id(&user)?;
    let wallets = state.engine.wallets(user_id).await?;
    Ok(Json(wallets.into_iter().map(wallet_view).collect()))
}

pub async fn get(
    Extension(user): Extension<engine::users::Model>,
    State(state): State<ServerState>,
    Path(wallet_id): Path<Uuid>,
) -> Result<Json<WalletView>, ServerError> {
    let user_id = current_user_id(&user)?;
    let wallet = state.engine.wallet(user_id, wallet_id).await?;
    Ok(Json(wallet_view(wallet)))
}

pub async fn create(
    Extension(user): Extension<engine::users::Model>,
    State(state): State<ServerState>,
    Json(payload): Json<WalletNew>,
) -> Result<(StatusCode, Json<WalletView>), ServerError> {
    let user_id = current_user_id(&user)?;
    let wallet = state
        .engine
        .new_wallet(
            user_id,
            NewWallet {
                name: payload.name,
                balance_minor: payload.balance_minor,
                currency: payload.currency,
                icon: payload.icon,
                color: payload.color,
            },
        )
        .await?;
    Ok((StatusCode::CREATED, Json(wallet_view(wallet))))
}

pub async fn update(
    Extension(user): Extension<engine::users::Model>,
    State(state): State<ServerState>,
    Path(wallet_id): Path<Uuid>,
    Json(payload): Json<WalletUpdate>,
) -> Result<Json<WalletView>, ServerError> {
    let user_id = current_user_id(&user)?;
    let wallet = state
        .engine
        .update_wallet(
            user_id,
            wallet_id,
            UpdateWallet {
                name: payload.name,
                currency: payload.currency,
                icon: payload.icon,
                color: payload.color,
            },
        )
        .await?;
    Ok(Json(wallet_view(wallet)))
}

pub async fn remove(
    Extension(user): Extension<engine::users::Model>,
    State(state): State<ServerState>,
    Path(wallet_id): Path<Uuid>,
) -> Result<StatusCode, ServerError> {
    let user_id = current_user_id(&user)?;
    state.engine.delete_wallet(user_id, wallet_id).await?;
    Ok(StatusCode::NO_CONTENT)
}
