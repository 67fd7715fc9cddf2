use axum::{Json, http::StatusCode, response::IntoResponse};
use engine::EngineError;

use serde::Serialize;
pub use mailer::{LogMailer, Mailer};
pub use server::{run, run_with_listener, spawn_with_listener};

mod auth;
mod buckets;
mod categories;
mod dashboard;
mod goals;
mod mailer;
mod server;
mod transactions;
mod users;
mod wallets;

pub mod types {
    pub mod auth {
        pub use api_types::auth::{
            ForgotPassword, Login, Message, Register, ResetPassword, SocialSignIn, VerifyEmail,
        };
    }

    pub mod user {
        pub use api_types::user::{UserUpdate, UserView};
    }

    pub mod wallet {
        pub use api_types::wallet::{WalletNew, WalletUpdate, WalletView};
    }

    pub mod category {
        pub use api_types::category::{
            CategoryKind, CategoryListQuery, CategoryNew, CategoryRename, CategoryView,
        };
    }

    pub mod goal {
        pub use api_types::goal::{GoalNew, GoalUpdate, GoalView};
    }

    pub mod bucket {
        pub use api_types::bucket::{BucketNew, BucketUpdate, BucketView};
    }

    pub mod transaction {
        pub use api_types::transaction::{
            EntryKind, EntryView, ExpenseAssign, GoalAssign, IncomeAssign, LedgerQuery,
            LedgerResponse, WalletTransferNew,
        };
    }

    pub mod dashboard {
        pub use api_types::dashboard::{CategoryTotalView, DashboardQuery, DashboardView};
    }
}

pub enum ServerError {
    Engine(EngineError),
    Generic(String),
}

#[derive(Serialize)]
struct Error {
    error: String,
}

fn status_for_engine_error(err: &EngineError) -> StatusCode {
    match err {
        EngineError::InvalidCredentials(_) => StatusCode::UNAUTHORIZED,
        EngineError::KeyNotFound(_) => StatusCode::NOT_FOUND,
        EngineError::ExistingKey(_) => StatusCode::CONFLICT,
        EngineError::Database(_) | EngineError::Hashing(_) => StatusCode::INTERNAL_SERVER_ERROR,
        EngineError::InsufficientFunds(_)
        | EngineError::GoalAlreadyComplete(_)
        | EngineError::InvalidAmount(_) => StatusCode::UNPROCESSABLE_ENTITY,
    }
}

fn message_for_engine_error(err: EngineError) -> String {
    match err {
        EngineError::Database(db_err) => {
            tracing::error!("database error: {db_err}");
            "internal server error".to_string()
        }
        EngineError::Hashing(hash_err) => {
            tracing::error!("hashing error: {hash_err}");
            "internal server error".to_string()
        }
        other => other.to_string(),
    }
}

impl IntoResponse for ServerError {
    fn into_response(self) -> axum::response::Response {
        let (status, error) = match self {
            ServerError::Engine(err) => {
                (status_for_engine_error(&err), message_for_engine_error(err))
            }
            ServerError::Generic(err) => (StatusCode::BAD_REQUEST, err),
        };

        (status, Json(Error { error })).into_response()
    }
}

impl From<EngineError> for ServerError {
    fn from(value: EngineError) -> Self {
        Self::Engine(value)
    }
}

/// Uuid of the authenticated account carried in the request extensions.
fn current_user_id(user: &engine::users::Model) -> Result<uuid::Uuid, ServerError> {
    uuid::Uuid::parse_str(&user.id)
        .map_err(|_| ServerError::Generic("invalid user id".to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn engine_invalid_credentials_maps_to_401() {
        let res =
            ServerError::from(EngineError::InvalidCredentials("x".to_string())).into_response();
        assert_eq!(res.status(), StatusCode::UNAUTHORIZED);
    }

    #[test]
    fn engine_not_found_maps_to_404() {
        let res = ServerError::from(EngineError::KeyNotFound("x".to_string())).into_response();
        assert_eq!(res.status(), StatusCode::NOT_FOUND);
    }

    #[test]
    fn engine_conflict_maps_to_409() {
        let res = ServerError::from(EngineError::ExistingKey("x".to_string())).into_response();
        assert_eq!(res.status(), StatusCode::CONFLICT);
    }

    #[test]
    fn engine_validation_maps_to_422() {
        let res = ServerError::from(EngineError::InvalidAmount("x".to_string())).into_response();
        assert_eq!(res.status(), StatusCode::UNPROCESSABLE_ENTITY);
        let res =
            ServerError::from(EngineError::InsufficientFunds("x".to_string())).into_response();
        assert_eq!(res.status(), StatusCode::UNPROCESSABLE_ENTITY);
        let res =
            ServerError::from(EngineError::GoalAlreadyComplete("x".to_string())).into_response();
        assert_eq!(res.status(), StatusCode::UNPROCESSABLE_ENTITY);
    }

    #[test]
    fn generic_maps_to_400() {
        let res = ServerError::Generic("bad".to_string()).into_response();
        assert_eq!(res.status(), StatusCode::BAD_REQUEST);
    }
}
