//! Wire types shared between the HTTP server and its clients.
//!
//! Amounts are always integer minor units (`*_minor`); dates are plain
//! `YYYY-MM-DD` strings on ledger entries and RFC3339 timestamps elsewhere.

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

pub mod auth {
    use super::*;

    #[derive(Debug, Serialize, Deserialize)]
    pub struct Register {
        pub email: String,
        pub password: String,
        pub full_name: Option<String>,
    }

    #[derive(Debug, Serialize, Deserialize)]
    pub struct Login {
        pub email: String,
        pub password: String,
    }

    #[derive(Debug, Serialize, Deserialize)]
    pub struct VerifyEmail {
        pub code: String,
    }

    #[derive(Debug, Serialize, Deserialize)]
    pub struct SocialSignIn {
        /// Stable subject identifier issued by the provider.
        pub provider_id: String,
        pub email: String,
        pub full_name: Option<String>,
    }

    #[derive(Debug, Serialize, Deserialize)]
    pub struct ForgotPassword {
        pub email: String,
    }

    #[derive(Debug, Serialize, Deserialize)]
    pub struct ResetPassword {
        pub token: String,
        pub new_password: String,
    }

    #[derive(Debug, Serialize, Deserialize)]
    pub struct Message {
        pub message: String,
    }
}

pub mod user {
    use super::*;

    #[derive(Debug, Serialize, Deserialize)]
    pub struct UserView {
        pub id: Uuid,
        pub email: String,
        pub full_name: Option<String>,
        pub is_email_verified: bool,
        pub created_at: DateTime<Utc>,
    }

    #[derive(Debug, Serialize, Deserialize)]
    pub struct UserUpdate {
        pub full_name: Option<String>,
        pub password: Option<String>,
    }
}

pub mod wallet {
    use super::*;

    #[derive(Debug, Serialize, Deserialize)]
    pub struct WalletNew {
        pub name: String,
        /// Opening balance in minor units. May be negative for overdrafts.
        pub balance_minor: i64,
        pub currency: Option<String>,
        pub icon: Option<String>,
        pub color: Option<String>,
    }

    #[derive(Debug, Serialize, Deserialize)]
    pub struct WalletUpdate {
        pub name: Option<String>,
        pub currency: Option<String>,
        pub icon: Option<String>,
        pub color: Option<String>,
    }

    #[derive(Debug, Serialize, Deserialize)]
    pub struct WalletView {
        pub id: Uuid,
        pub name: String,
        pub balance_minor: i64,
        pub currency: String,
        pub icon: Option<String>,
        pub color: Option<String>,
    }
}

pub mod category {
    use super::*;

    #[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
    #[serde(rename_all = "snake_case")]
    pub enum CategoryKind {
        Income,
        Expense,
    }

    #[derive(Debug, Serialize, Deserialize)]
    pub struct CategoryNew {
        pub name: String,
        pub kind: CategoryKind,
    }

    #[derive(Debug, Serialize, Deserialize)]
    pub struct CategoryRename {
        pub name: String,
    }

    #[derive(Debug, Serialize, Deserialize)]
    pub struct CategoryView {
        pub id: Uuid,
        pub name: String,
        pub kind: CategoryKind,
    }

    #[derive(Debug, Deserialize)]
    pub struct CategoryListQuery {
        pub kind: Option<CategoryKind>,
    }
}

pub mod goal {
    use super::*;

    #[derive(Debug, Serialize, Deserialize)]
    pub struct GoalNew {
        pub name: String,
        pub target_minor: i64,
        pub currency: Option<String>,
        pub icon: Option<String>,
        pub color: Option<String>,
        pub plan_period: Option<String>,
        pub plan_amount_minor: Option<i64>,
    }

    #[derive(Debug, Serialize, Deserialize)]
    pub struct GoalUpdate {
        pub name: Option<String>,
        pub target_minor: Option<i64>,
        pub icon: Option<String>,
        pub color: Option<String>,
        pub plan_period: Option<String>,
        pub plan_amount_minor: Option<i64>,
    }

    #[derive(Debug, Serialize, Deserialize)]
    pub struct GoalView {
        pub id: Uuid,
        pub name: String,
        pub target_minor: i64,
        pub current_minor: i64,
        pub remaining_minor: i64,
        pub currency: String,
        pub icon: Option<String>,
        pub color: Option<String>,
        pub plan_period: Option<String>,
        pub plan_amount_minor: Option<i64>,
        pub created_at: DateTime<Utc>,
        pub updated_at: DateTime<Utc>,
    }
}

pub mod bucket {
    use super::*;

    /// Shared shape of income and expense buckets.
    #[derive(Debug, Serialize, Deserialize)]
    pub struct BucketNew {
        pub name: String,
        pub icon: Option<String>,
        pub color: Option<String>,
    }

    #[derive(Debug, Serialize, Deserialize)]
    pub struct BucketUpdate {
        pub name: Option<String>,
        pub icon: Option<String>,
        pub color: Option<String>,
    }

    #[derive(Debug, Serialize, Deserialize)]
    pub struct BucketView {
        pub id: Uuid,
        pub name: String,
        pub icon: Option<String>,
        pub color: Option<String>,
        /// Total assigned so far, in minor units.
        pub amount_minor: i64,
        pub wallet_id: Option<Uuid>,
        pub category_id: Option<Uuid>,
        /// Date of the most recent assignment.
        pub occurred_on: Option<NaiveDate>,
        pub note: Option<String>,
    }
}

pub mod transaction {
    use super::*;

    #[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
    #[serde(rename_all = "snake_case")]
    pub enum EntryKind {
        Income,
        Expense,
        GoalTransfer,
        WalletTransfer,
    }

    #[derive(Debug, Serialize, Deserialize)]
    pub struct EntryView {
        pub id: Uuid,
        pub kind: EntryKind,
        pub amount_minor: i64,
        pub occurred_on: NaiveDate,
        pub note: Option<String>,
        pub from_wallet_id: Option<Uuid>,
        pub to_wallet_id: Option<Uuid>,
        pub to_goal_id: Option<Uuid>,
        pub from_category_id: Option<Uuid>,
        pub to_category_id: Option<Uuid>,
        pub created_at: DateTime<Utc>,
    }

    #[derive(Debug, Default, Deserialize)]
    pub struct LedgerQuery {
        /// Inclusive lower bound on `occurred_on`.
        pub from: Option<NaiveDate>,
        /// Exclusive upper bound on `occurred_on`.
        pub to: Option<NaiveDate>,
        pub kind: Option<EntryKind>,
        pub wallet_id: Option<Uuid>,
        pub limit: Option<u64>,
        /// Opaque pagination cursor (base64), from `next_cursor`.
        pub cursor: Option<String>,
    }

    #[derive(Debug, Serialize, Deserialize)]
    pub struct LedgerResponse {
        pub entries: Vec<EntryView>,
        /// Opaque cursor for fetching the next page (older items).
        pub next_cursor: Option<String>,
    }

    /// Body of `POST /goals/{id}/assign`; the goal comes from the path.
    #[derive(Debug, Serialize, Deserialize)]
    pub struct GoalAssign {
        pub wallet_id: Uuid,
        pub amount_minor: i64,
        pub occurred_on: NaiveDate,
        pub note: Option<String>,
    }

    /// Body of `POST /expenses/{id}/assign`; the bucket comes from the path.
    #[derive(Debug, Serialize, Deserialize)]
    pub struct ExpenseAssign {
        pub wallet_id: Uuid,
        pub amount_minor: i64,
        pub occurred_on: NaiveDate,
        pub category_id: Option<Uuid>,
        pub note: Option<String>,
    }

    /// Body of `POST /incomes/{id}/assign`; the bucket comes from the path.
    #[derive(Debug, Serialize, Deserialize)]
    pub struct IncomeAssign {
        pub wallet_id: Uuid,
        pub amount_minor: i64,
        pub occurred_on: NaiveDate,
        pub category_id: Option<Uuid>,
        pub note: Option<String>,
    }

    #[derive(Debug, Serialize, Deserialize)]
    pub struct WalletTransferNew {
        pub from_wallet_id: Uuid,
        pub to_wallet_id: Uuid,
        pub amount_minor: i64,
        pub occurred_on: NaiveDate,
        pub note: Option<String>,
    }
}

pub mod dashboard {
    use super::*;

    #[derive(Debug, Default, Deserialize)]
    pub struct DashboardQuery {
        pub from: Option<NaiveDate>,
        pub to: Option<NaiveDate>,
    }

    #[derive(Debug, Serialize, Deserialize)]
    pub struct CategoryTotalView {
        pub category_id: Option<Uuid>,
        pub name: Option<String>,
        pub total_minor: i64,
    }

    #[derive(Debug, Serialize, Deserialize)]
    pub struct DashboardView {
        pub total_balance_minor: i64,
        pub income_minor: i64,
        pub expense_minor: i64,
        pub goals_saved_minor: i64,
        pub goals_target_minor: i64,
        pub incomes_by_category: Vec<CategoryTotalView>,
        pub expenses_by_category: Vec<CategoryTotalView>,
    }
}
