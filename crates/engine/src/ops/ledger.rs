//! The four money movements. Every operation validates against in-memory
//! snapshots first and only then writes, so a failed check leaves the store
//! untouched and all writes of one movement share a single DB transaction.

use sea_orm::{ActiveValue, DatabaseTransaction, TransactionTrait, prelude::*};
use uuid::Uuid;

use crate::{
    AssignIncomeCmd, AssignToExpenseCmd, AssignToGoalCmd, Bucket, CategoryKind, EngineError,
    EntryKind, ExpenseAssignment, GoalAssignment, IncomeAssignment, LedgerEntry, ResultEngine,
    Wallet, WalletTransfer, WalletTransferCmd, expenses, goals, incomes, transactions, wallets,
};

use super::{Engine, normalize_optional_text, require_positive_amount, with_tx};

impl Engine {
    /// Move funds from a wallet into a savings goal.
    pub async fn assign_to_goal(&self, cmd: AssignToGoalCmd) -> ResultEngine<GoalAssignment> {
        require_positive_amount(cmd.amount_minor)?;
        let note = normalize_optional_text(cmd.note.as_deref());
        with_tx!(self, |db_tx| {
            let mut wallet = self.require_wallet(&db_tx, cmd.user_id, cmd.wallet_id).await?;
            let mut goal = self.require_goal(&db_tx, cmd.user_id, cmd.goal_id).await?;

            wallet.debit(cmd.amount_minor)?;
            goal.allocate(cmd.amount_minor)?;

            let mut entry = LedgerEntry::new(
                cmd.user_id,
                EntryKind::GoalTransfer,
                cmd.amount_minor,
                cmd.occurred_on,
                note,
            )?;
            entry.from_wallet_id = Some(wallet.id);
            entry.to_goal_id = Some(goal.id);

            persist_wallet_balance(&db_tx, &wallet).await?;
            persist_goal_progress(&db_tx, &goal).await?;
            transactions::ActiveModel::from(&entry).insert(&db_tx).await?;

            Ok(GoalAssignment {
                wallet,
                goal,
                transaction: entry,
            })
        })
    }

    /// Pay from a wallet into an expense bucket.
    ///
    /// The bucket accumulates the amount and remembers the wallet, date and
    /// note of the latest assignment. The ledger entry is tagged with the
    /// category passed in the command, falling back to the bucket's own.
    pub async fn assign_to_expense(
        &self,
        cmd: AssignToExpenseCmd,
    ) -> ResultEngine<ExpenseAssignment> {
        require_positive_amount(cmd.amount_minor)?;
        let note = normalize_optional_text(cmd.note.as_deref());
        with_tx!(self, |db_tx| {
            let mut wallet = self.require_wallet(&db_tx, cmd.user_id, cmd.wallet_id).await?;
            let bucket = self.require_expense(&db_tx, cmd.user_id, cmd.expense_id).await?;

            let category_id = self
                .resolve_bucket_category(
                    &db_tx,
                    cmd.user_id,
                    cmd.category_id,
                    bucket.category_id.as_deref(),
                    CategoryKind::Expense,
                )
                .await?;

            wallet.debit(cmd.amount_minor)?;

            let mut entry = LedgerEntry::new(
                cmd.user_id,
                EntryKind::Expense,
                cmd.amount_minor,
                cmd.occurred_on,
                note.clone(),
            )?;
            entry.from_wallet_id = Some(wallet.id);
            entry.to_category_id = category_id;

            persist_wallet_balance(&db_tx, &wallet).await?;
            let model = expenses::ActiveModel {
                id: ActiveValue::Set(bucket.id.clone()),
                amount_minor: ActiveValue::Set(bucket.amount_minor + cmd.amount_minor),
                wallet_id: ActiveValue::Set(Some(wallet.id.to_string())),
                category_id: ActiveValue::Set(category_id.map(|id| id.to_string())),
                occurred_on: ActiveValue::Set(Some(cmd.occurred_on)),
                note: ActiveValue::Set(note),
                ..Default::default()
            }
            .update(&db_tx)
            .await?;
            transactions::ActiveModel::from(&entry).insert(&db_tx).await?;

            Ok(ExpenseAssignment {
                wallet,
                expense: Bucket::try_from(model)?,
                transaction: entry,
            })
        })
    }

    /// Credit income into a wallet through an income bucket.
    pub async fn assign_income(&self, cmd: AssignIncomeCmd) -> ResultEngine<IncomeAssignment> {
        require_positive_amount(cmd.amount_minor)?;
        let note = normalize_optional_text(cmd.note.as_deref());
        with_tx!(self, |db_tx| {
            let bucket = self.require_income(&db_tx, cmd.user_id, cmd.income_id).await?;
            let mut wallet = self.require_wallet(&db_tx, cmd.user_id, cmd.wallet_id).await?;

            let category_id = self
                .resolve_bucket_category(
                    &db_tx,
                    cmd.user_id,
                    cmd.category_id,
                    bucket.category_id.as_deref(),
                    CategoryKind::Income,
                )
                .await?;

            wallet.credit(cmd.amount_minor);

            let mut entry = LedgerEntry::new(
                cmd.user_id,
                EntryKind::Income,
                cmd.amount_minor,
                cmd.occurred_on,
                note.clone(),
            )?;
            entry.to_wallet_id = Some(wallet.id);
            entry.from_category_id = category_id;

            persist_wallet_balance(&db_tx, &wallet).await?;
            let model = incomes::ActiveModel {
                id: ActiveValue::Set(bucket.id.clone()),
                amount_minor: ActiveValue::Set(bucket.amount_minor + cmd.amount_minor),
                wallet_id: ActiveValue::Set(Some(wallet.id.to_string())),
                category_id: ActiveValue::Set(category_id.map(|id| id.to_string())),
                occurred_on: ActiveValue::Set(Some(cmd.occurred_on)),
                note: ActiveValue::Set(note),
                ..Default::default()
            }
            .update(&db_tx)
            .await?;
            transactions::ActiveModel::from(&entry).insert(&db_tx).await?;

            Ok(IncomeAssignment {
                income: Bucket::try_from(model)?,
                wallet,
                transaction: entry,
            })
        })
    }

    /// Move funds between two wallets of the same user.
    pub async fn transfer_between_wallets(
        &self,
        cmd: WalletTransferCmd,
    ) -> ResultEngine<WalletTransfer> {
        require_positive_amount(cmd.amount_minor)?;
        if cmd.from_wallet_id == cmd.to_wallet_id {
            return Err(EngineError::InvalidAmount(
                "source and destination wallet must differ".to_string(),
            ));
        }
        let note = normalize_optional_text(cmd.note.as_deref());
        with_tx!(self, |db_tx| {
            let mut from_wallet = self
                .require_wallet(&db_tx, cmd.user_id, cmd.from_wallet_id)
                .await?;
            let mut to_wallet = self
                .require_wallet(&db_tx, cmd.user_id, cmd.to_wallet_id)
                .await?;

            from_wallet.debit(cmd.amount_minor)?;
            to_wallet.credit(cmd.amount_minor);

            let mut entry = LedgerEntry::new(
                cmd.user_id,
                EntryKind::WalletTransfer,
                cmd.amount_minor,
                cmd.occurred_on,
                note,
            )?;
            entry.from_wallet_id = Some(from_wallet.id);
            entry.to_wallet_id = Some(to_wallet.id);

            persist_wallet_balance(&db_tx, &from_wallet).await?;
            persist_wallet_balance(&db_tx, &to_wallet).await?;
            transactions::ActiveModel::from(&entry).insert(&db_tx).await?;

            Ok(WalletTransfer {
                from_wallet,
                to_wallet,
                transaction: entry,
            })
        })
    }

    /// Resolve which category tags a bucket assignment: an explicit override
    /// wins over the bucket's own, and either must belong to the user and
    /// match `expected_kind`.
    async fn resolve_bucket_category(
        &self,
        db_tx: &DatabaseTransaction,
        user_id: Uuid,
        override_id: Option<Uuid>,
        bucket_category_id: Option<&str>,
        expected_kind: CategoryKind,
    ) -> ResultEngine<Option<Uuid>> {
        let candidate = match override_id {
            Some(id) => Some(id),
            None => bucket_category_id.and_then(|s| Uuid::parse_str(s).ok()),
        };
        let Some(category_id) = candidate else {
            return Ok(None);
        };
        let category = self.require_category(db_tx, user_id, category_id).await?;
        if category.kind != expected_kind {
            return Err(EngineError::InvalidAmount(format!(
                "category '{}' is not an {} category",
                category.name,
                expected_kind.as_str()
            )));
        }
        Ok(Some(category.id))
    }
}

async fn persist_wallet_balance(db_tx: &DatabaseTransaction, wallet: &Wallet) -> ResultEngine<()> {
    wallets::ActiveModel {
        id: ActiveValue::Set(wallet.id.to_string()),
        balance_minor: ActiveValue::Set(wallet.balance_minor),
        ..Default::default()
    }
    .update(db_tx)
    .await?;
    Ok(())
}

async fn persist_goal_progress(db_tx: &DatabaseTransaction, goal: &crate::Goal) -> ResultEngine<()> {
    goals::ActiveModel {
        id: ActiveValue::Set(goal.id.to_string()),
        current_minor: ActiveValue::Set(goal.current_minor),
        updated_at: ActiveValue::Set(goal.updated_at),
        ..Default::default()
    }
    .update(db_tx)
    .await?;
    Ok(())
}
