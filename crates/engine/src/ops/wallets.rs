use uuid::Uuid;

use sea_orm::{
    ActiveValue, DatabaseTransaction, QueryFilter, QueryOrder, TransactionTrait, prelude::*,
    sea_query::Expr,
};

use crate::{
    EngineError, NewWallet, ResultEngine, UpdateWallet, Wallet, expenses, incomes, transactions,
    wallets,
};

use super::{Engine, normalize_optional_text, normalize_required_name, with_tx};

/// Currency used when a wallet or goal is created without one.
pub(super) const DEFAULT_CURRENCY: &str = "KZT";

impl Engine {
    /// Return all wallets of a user, sorted by name.
    pub async fn wallets(&self, user_id: Uuid) -> ResultEngine<Vec<Wallet>> {
        let models = wallets::Entity::find()
            .filter(wallets::Column::UserId.eq(user_id.to_string()))
            .order_by_asc(wallets::Column::Name)
            .all(&self.database)
            .await?;
        models.into_iter().map(Wallet::try_from).collect()
    }

    /// Return a wallet snapshot from DB.
    pub async fn wallet(&self, user_id: Uuid, wallet_id: Uuid) -> ResultEngine<Wallet> {
        let model = wallets::Entity::find_by_id(wallet_id.to_string())
            .filter(wallets::Column::UserId.eq(user_id.to_string()))
            .one(&self.database)
            .await?
            .ok_or_else(|| EngineError::KeyNotFound("wallet not exists".to_string()))?;
        Wallet::try_from(model)
    }

    /// Add a new wallet with its opening balance.
    ///
    /// Names are unique per user, case-insensitively.
    pub async fn new_wallet(&self, user_id: Uuid, new_wallet: NewWallet) -> ResultEngine<Wallet> {
        let name = normalize_required_name(&new_wallet.name, "wallet")?;
        with_tx!(self, |db_tx| {
            self.require_user(&db_tx, user_id).await?;

            let exists = wallets::Entity::find()
                .filter(wallets::Column::UserId.eq(user_id.to_string()))
                .filter(Expr::cust("LOWER(name)").eq(name.to_lowercase()))
                .one(&db_tx)
                .await?
                .is_some();
            if exists {
                return Err(EngineError::ExistingKey(name));
            }

            let wallet = Wallet::new(
                user_id,
                name,
                new_wallet.balance_minor,
                new_wallet
                    .currency
                    .unwrap_or_else(|| DEFAULT_CURRENCY.to_string()),
                normalize_optional_text(new_wallet.icon.as_deref()),
                normalize_optional_text(new_wallet.color.as_deref()),
            );
            let model: wallets::ActiveModel = (&wallet).into();
            model.insert(&db_tx).await?;
            Ok(wallet)
        })
    }

    /// Update wallet fields. Absent fields are left untouched; the balance
    /// only moves through ledger operations.
    pub async fn update_wallet(
        &self,
        user_id: Uuid,
        wallet_id: Uuid,
        update: UpdateWallet,
    ) -> ResultEngine<Wallet> {
        let name = match update.name.as_deref() {
            Some(name) => Some(normalize_required_name(name, "wallet")?),
            None => None,
        };
        with_tx!(self, |db_tx| {
            self.require_wallet(&db_tx, user_id, wallet_id).await?;

            if let Some(name) = &name {
                let exists = wallets::Entity::find()
                    .filter(wallets::Column::UserId.eq(user_id.to_string()))
                    .filter(Expr::cust("LOWER(name)").eq(name.to_lowercase()))
                    .filter(wallets::Column::Id.ne(wallet_id.to_string()))
                    .one(&db_tx)
                    .await?
                    .is_some();
                if exists {
                    return Err(EngineError::ExistingKey(name.clone()));
                }
            }

            let mut active = wallets::ActiveModel {
                id: ActiveValue::Set(wallet_id.to_string()),
                ..Default::default()
            };
            if let Some(name) = name {
                active.name = ActiveValue::Set(name);
            }
            if let Some(currency) = update.currency {
                active.currency = ActiveValue::Set(currency);
            }
            if update.icon.is_some() {
                active.icon = ActiveValue::Set(normalize_optional_text(update.icon.as_deref()));
            }
            if update.color.is_some() {
                active.color = ActiveValue::Set(normalize_optional_text(update.color.as_deref()));
            }
            let model = active.update(&db_tx).await?;
            Wallet::try_from(model)
        })
    }

    /// Delete a wallet, detaching history instead of erasing it.
    ///
    /// Ledger entries and buckets that referenced the wallet keep their rows
    /// with the wallet reference set to NULL.
    pub async fn delete_wallet(&self, user_id: Uuid, wallet_id: Uuid) -> ResultEngine<()> {
        let id = wallet_id.to_string();
        with_tx!(self, |db_tx| {
            self.require_wallet(&db_tx, user_id, wallet_id).await?;

            transactions::Entity::update_many()
                .col_expr(transactions::Column::FromWalletId, Expr::value(None::<String>))
                .filter(transactions::Column::FromWalletId.eq(id.clone()))
                .exec(&db_tx)
                .await?;
            transactions::Entity::update_many()
                .col_expr(transactions::Column::ToWalletId, Expr::value(None::<String>))
                .filter(transactions::Column::ToWalletId.eq(id.clone()))
                .exec(&db_tx)
                .await?;
            incomes::Entity::update_many()
                .col_expr(incomes::Column::WalletId, Expr::value(None::<String>))
                .filter(incomes::Column::WalletId.eq(id.clone()))
                .exec(&db_tx)
                .await?;
            expenses::Entity::update_many()
                .col_expr(expenses::Column::WalletId, Expr::value(None::<String>))
                .filter(expenses::Column::WalletId.eq(id.clone()))
                .exec(&db_tx)
                .await?;

            wallets::Entity::delete_many()
                .filter(wallets::Column::Id.eq(id.clone()))
                .exec(&db_tx)
                .await?;
            Ok(())
        })
    }

    pub(super) async fn require_wallet(
        &self,
        db_tx: &DatabaseTransaction,
        user_id: Uuid,
        wallet_id: Uuid,
    ) -> ResultEngine<Wallet> {
        let model = wallets::Entity::find_by_id(wallet_id.to_string())
            .filter(wallets::Column::UserId.eq(user_id.to_string()))
            .one(db_tx)
            .await?
            .ok_or_else(|| EngineError::KeyNotFound("wallet not exists".to_string()))?;
        Wallet::try_from(model)
    }
}
