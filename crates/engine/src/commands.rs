//! Command and result payloads for the engine's operations.
//!
//! The ledger operations take a command struct so call sites stay readable;
//! plain CRUD takes its arguments directly. Result structs bundle every row
//! the operation touched so the API layer can respond without re-reading.

use chrono::NaiveDate;
use uuid::Uuid;

use crate::{Bucket, Goal, LedgerEntry, Wallet};

/// Payload for registering a password user.
#[derive(Clone, Debug)]
pub struct NewUser {
    pub email: String,
    pub password: String,
    pub full_name: Option<String>,
}

/// Profile fields a user may change about themselves.
#[derive(Clone, Debug, Default)]
pub struct UpdateUser {
    pub full_name: Option<String>,
    pub password: Option<String>,
}

#[derive(Clone, Debug)]
pub struct NewWallet {
    pub name: String,
    pub balance_minor: i64,
    pub currency: Option<String>,
    pub icon: Option<String>,
    pub color: Option<String>,
}

#[derive(Clone, Debug, Default)]
pub struct UpdateWallet {
    pub name: Option<String>,
    pub currency: Option<String>,
    pub icon: Option<String>,
    pub color: Option<String>,
}

#[derive(Clone, Debug)]
pub struct NewGoal {
    pub name: String,
    pub target_minor: i64,
    pub currency: Option<String>,
    pub icon: Option<String>,
    pub color: Option<String>,
    pub plan_period: Option<String>,
    pub plan_amount_minor: Option<i64>,
}

#[derive(Clone, Debug, Default)]
pub struct UpdateGoal {
    pub name: Option<String>,
    pub target_minor: Option<i64>,
    pub icon: Option<String>,
    pub color: Option<String>,
    pub plan_period: Option<String>,
    pub plan_amount_minor: Option<i64>,
}

/// Payload for creating an income or expense bucket.
#[derive(Clone, Debug)]
pub struct NewBucket {
    pub name: String,
    pub icon: Option<String>,
    pub color: Option<String>,
}

#[derive(Clone, Debug, Default)]
pub struct UpdateBucket {
    pub name: Option<String>,
    pub icon: Option<String>,
    pub color: Option<String>,
}

/// Move funds from a wallet into a savings goal.
#[derive(Clone, Debug)]
pub struct AssignToGoalCmd {
    pub user_id: Uuid,
    pub wallet_id: Uuid,
    pub goal_id: Uuid,
    pub amount_minor: i64,
    pub occurred_on: NaiveDate,
    pub note: Option<String>,
}

/// Everything the goal assignment touched.
#[derive(Clone, Debug)]
pub struct GoalAssignment {
    pub wallet: Wallet,
    pub goal: Goal,
    pub transaction: LedgerEntry,
}

/// Move funds from a wallet into an expense bucket.
#[derive(Clone, Debug)]
pub struct AssignToExpenseCmd {
    pub user_id: Uuid,
    pub wallet_id: Uuid,
    pub expense_id: Uuid,
    pub amount_minor: i64,
    pub occurred_on: NaiveDate,
    pub category_id: Option<Uuid>,
    pub note: Option<String>,
}

#[derive(Clone, Debug)]
pub struct ExpenseAssignment {
    pub wallet: Wallet,
    pub expense: Bucket,
    pub transaction: LedgerEntry,
}

/// Credit an income bucket's amount into a wallet.
#[derive(Clone, Debug)]
pub struct AssignIncomeCmd {
    pub user_id: Uuid,
    pub income_id: Uuid,
    pub wallet_id: Uuid,
    pub amount_minor: i64,
    pub occurred_on: NaiveDate,
    pub category_id: Option<Uuid>,
    pub note: Option<String>,
}

#[derive(Clone, Debug)]
pub struct IncomeAssignment {
    pub income: Bucket,
    pub wallet: Wallet,
    pub transaction: LedgerEntry,
}

/// Move funds between two wallets of the same user.
#[derive(Clone, Debug)]
pub struct WalletTransferCmd {
    pub user_id: Uuid,
    pub from_wallet_id: Uuid,
    pub to_wallet_id: Uuid,
    pub amount_minor: i64,
    pub occurred_on: NaiveDate,
    pub note: Option<String>,
}

#[derive(Clone, Debug)]
pub struct WalletTransfer {
    pub from_wallet: Wallet,
    pub to_wallet: Wallet,
    pub transaction: LedgerEntry,
}
