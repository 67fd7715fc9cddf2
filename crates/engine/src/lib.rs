//! The domain core of Granary, a personal-finance tracking backend.
//!
//! The engine owns every database mutation. It is split in three concerns:
//!
//! - the account store: CRUD over users, wallets, categories, goals and
//!   income/expense buckets;
//! - the ledger recorder: balance-moving operations that debit/credit
//!   wallets, goals and buckets while appending an immutable row to the
//!   `transactions` table, all inside a single database transaction;
//! - the aggregator: read-only dashboard sums over the ledger.

pub use buckets::Bucket;
pub use categories::{Category, CategoryKind};
pub use commands::{
    AssignIncomeCmd, AssignToExpenseCmd, AssignToGoalCmd, ExpenseAssignment, GoalAssignment,
    IncomeAssignment, NewBucket, NewGoal, NewUser, NewWallet, UpdateBucket, UpdateGoal, UpdateUser,
    UpdateWallet, WalletTransfer, WalletTransferCmd,
};
pub use error::EngineError;
pub use goals::Goal;
pub use ops::{
    CategoryTotal, DashboardSummary, Engine, EngineBuilder, LedgerListFilter, RegisteredUser,
};
pub use transactions::{EntryKind, LedgerEntry};
pub use wallets::Wallet;

mod buckets;
mod commands;
mod error;
mod ops;

pub mod categories;
pub mod expenses;
pub mod goals;
pub mod incomes;
pub mod transactions;
pub mod users;
pub mod wallets;

type ResultEngine<T> = Result<T, EngineError>;
