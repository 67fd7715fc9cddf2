//! CRUD for income and expense buckets.
//!
//! The two tables are structurally identical, so each operation exists in an
//! income and an expense flavor over the same shape. Amounts on buckets only
//! move through the ledger operations.

use uuid::Uuid;

use sea_orm::{
    ActiveValue, DatabaseTransaction, QueryFilter, QueryOrder, TransactionTrait, prelude::*,
    sea_query::Expr,
};

use crate::{Bucket, EngineError, NewBucket, ResultEngine, UpdateBucket, expenses, incomes};

use super::{Engine, normalize_optional_text, normalize_required_name, with_tx};

impl Engine {
    /// Return a user's income buckets, sorted by name.
    pub async fn incomes(&self, user_id: Uuid) -> ResultEngine<Vec<Bucket>> {
        let models = incomes::Entity::find()
            .filter(incomes::Column::UserId.eq(user_id.to_string()))
            .order_by_asc(incomes::Column::Name)
            .all(&self.database)
            .await?;
        models.into_iter().map(Bucket::try_from).collect()
    }

    pub async fn income(&self, user_id: Uuid, income_id: Uuid) -> ResultEngine<Bucket> {
        let model = incomes::Entity::find_by_id(income_id.to_string())
            .filter(incomes::Column::UserId.eq(user_id.to_string()))
            .one(&self.database)
            .await?
            .ok_or_else(|| EngineError::KeyNotFound("income not exists".to_string()))?;
        Bucket::try_from(model)
    }

    /// Add an income bucket with nothing assigned yet.
    pub async fn new_income(&self, user_id: Uuid, new_bucket: NewBucket) -> ResultEngine<Bucket> {
        let name = normalize_required_name(&new_bucket.name, "income")?;
        with_tx!(self, |db_tx| {
            self.require_user(&db_tx, user_id).await?;

            let exists = incomes::Entity::find()
                .filter(incomes::Column::UserId.eq(user_id.to_string()))
                .filter(Expr::cust("LOWER(name)").eq(name.to_lowercase()))
                .one(&db_tx)
                .await?
                .is_some();
            if exists {
                return Err(EngineError::ExistingKey(name));
            }

            let model = incomes::ActiveModel {
                id: ActiveValue::Set(Uuid::new_v4().to_string()),
                user_id: ActiveValue::Set(user_id.to_string()),
                name: ActiveValue::Set(name),
                icon: ActiveValue::Set(normalize_optional_text(new_bucket.icon.as_deref())),
                color: ActiveValue::Set(normalize_optional_text(new_bucket.color.as_deref())),
                amount_minor: ActiveValue::Set(0),
                wallet_id: ActiveValue::Set(None),
                category_id: ActiveValue::Set(None),
                occurred_on: ActiveValue::Set(None),
                note: ActiveValue::Set(None),
            }
            .insert(&db_tx)
            .await?;
            Bucket::try_from(model)
        })
    }

    pub async fn update_income(
        &self,
        user_id: Uuid,
        income_id: Uuid,
        update: UpdateBucket,
    ) -> ResultEngine<Bucket> {
        let name = match update.name.as_deref() {
            Some(name) => Some(normalize_required_name(name, "income")?),
            None => None,
        };
        with_tx!(self, |db_tx| {
            self.require_income(&db_tx, user_id, income_id).await?;

            if let Some(name) = &name {
                let exists = incomes::Entity::find()
                    .filter(incomes::Column::UserId.eq(user_id.to_string()))
                    .filter(Expr::cust("LOWER(name)").eq(name.to_lowercase()))
                    .filter(incomes::Column::Id.ne(income_id.to_string()))
                    .one(&db_tx)
                    .await?
                    .is_some();
                if exists {
                    return Err(EngineError::ExistingKey(name.clone()));
                }
            }

            let mut active = incomes::ActiveModel {
                id: ActiveValue::Set(income_id.to_string()),
                ..Default::default()
            };
            if let Some(name) = name {
                active.name = ActiveValue::Set(name);
            }
            if update.icon.is_some() {
                active.icon = ActiveValue::Set(normalize_optional_text(update.icon.as_deref()));
            }
            if update.color.is_some() {
                active.color = ActiveValue::Set(normalize_optional_text(update.color.as_deref()));
            }
            let model = active.update(&db_tx).await?;
            Bucket::try_from(model)
        })
    }

    /// Delete an income bucket. Ledger entries it produced are kept.
    pub async fn delete_income(&self, user_id: Uuid, income_id: Uuid) -> ResultEngine<()> {
        with_tx!(self, |db_tx| {
            self.require_income(&db_tx, user_id, income_id).await?;
            incomes::Entity::delete_many()
                .filter(incomes::Column::Id.eq(income_id.to_string()))
                .exec(&db_tx)
                .await?;
            Ok(())
        })
    }

    /// Return a user's expense buckets, sorted by name.
    pub async fn expenses(&self, user_id: Uuid) -> ResultEngine<Vec<Bucket>> {
        let models = expenses::Entity::find()
            .filter(expenses::Column::UserId.eq(user_id.to_string()))
            .order_by_asc(expenses::Column::Name)
            .all(&self.database)
            .await?;
        models.into_iter().map(Bucket::try_from).collect()
    }

    pub async fn expense(&self, user_id: Uuid, expense_id: Uuid) -> ResultEngine<Bucket> {
        let model = expenses::Entity::find_by_id(expense_id.to_string())
            .filter(expenses::Column::UserId.eq(user_id.to_string()))
            .one(&self.database)
            .await?
            .ok_or_else(|| EngineError::KeyNotFound("expense not exists".to_string()))?;
        Bucket::try_from(model)
    }

    /// Add an expense bucket with nothing assigned yet.
    pub async fn new_expense(&self, user_id: Uuid, new_bucket: NewBucket) -> ResultEngine<Bucket> {
        let name = normalize_required_name(&new_bucket.name, "expense")?;
        with_tx!(self, |db_tx| {
            self.require_user(&db_tx, user_id).await?;

            let exists = expenses::Entity::find()
                .filter(expenses::Column::UserId.eq(user_id.to_string()))
                .filter(Expr::cust("LOWER(name)").eq(name.to_lowercase()))
                .one(&db_tx)
                .await?
                .is_some();
            if exists {
                return Err(EngineError::ExistingKey(name));
            }

            let model = expenses::ActiveModel {
                id: ActiveValue::Set(Uuid::new_v4().to_string()),
                user_id: ActiveValue::Set(user_id.to_string()),
                name: ActiveValue::Set(name),
                icon: ActiveValue::Set(normalize_optional_text(new_bucket.icon.as_deref())),
                color: ActiveValue::Set(normalize_optional_text(new_bucket.color.as_deref())),
                amount_minor: ActiveValue::Set(0),
                wallet_id: ActiveValue::Set(None),
                category_id: ActiveValue::Set(None),
                occurred_on: ActiveValue::Set(None),
                note: ActiveValue::Set(None),
            }
            .insert(&db_tx)
            .await?;
            Bucket::try_from(model)
        })
    }

    pub async fn update_expense(
        &self,
        user_id: Uuid,
        expense_id: Uuid,
        update: UpdateBucket,
    ) -> ResultEngine<Bucket> {
        let name = match update.name.as_deref() {
            Some(name) => Some(normalize_required_name(name, "expense")?),
            None => None,
        };
        with_tx!(self, |db_tx| {
            self.require_expense(&db_tx, user_id, expense_id).await?;

            if let Some(name) = &name {
                let exists = expenses::Entity::find()
                    .filter(expenses::Column::UserId.eq(user_id.to_string()))
                    .filter(Expr::cust("LOWER(name)").eq(name.to_lowercase()))
                    .filter(expenses::Column::Id.ne(expense_id.to_string()))
                    .one(&db_tx)
                    .await?
                    .is_some();
                if exists {
                    return Err(EngineError::ExistingKey(name.clone()));
                }
            }

            let mut active = expenses::ActiveModel {
                id: ActiveValue::Set(expense_id.to_string()),
                ..Default::default()
            };
            if let Some(name) = name {
                active.name = ActiveValue::Set(name);
            }
            if update.icon.is_some() {
                active.icon = ActiveValue::Set(normalize_optional_text(update.icon.as_deref()));
            }
            if update.color.is_some() {
                active.color = ActiveValue::Set(normalize_optional_text(update.color.as_deref()));
            }
            let model = active.update(&db_tx).await?;
            Bucket::try_from(model)
        })
    }

    /// Delete an expense bucket. Ledger entries it produced are kept.
    pub async fn delete_expense(&self, user_id: Uuid, expense_id: Uuid) -> ResultEngine<()> {
        with_tx!(self, |db_tx| {
            self.require_expense(&db_tx, user_id, expense_id).await?;
            expenses::Entity::delete_many()
                .filter(expenses::Column::Id.eq(expense_id.to_string()))
                .exec(&db_tx)
                .await?;
            Ok(())
        })
    }

    pub(super) async fn require_income(
        &self,
        db_tx: &DatabaseTransaction,
        user_id: Uuid,
        income_id: Uuid,
    ) -> ResultEngine<incomes::Model> {
        incomes::Entity::find_by_id(income_id.to_string())
            .filter(incomes::Column::UserId.eq(user_id.to_string()))
            .one(db_tx)
            .await?
            .ok_or_else(|| EngineError::KeyNotFound("income not exists".to_string()))
    }

    pub(super) async fn require_expense(
        &self,
        db_tx: &DatabaseTransaction,
        user_id: Uuid,
        expense_id: Uuid,
    ) -> ResultEngine<expenses::Model> {
        expenses::Entity::find_by_id(expense_id.to_string())
            .filter(expenses::Column::UserId.eq(user_id.to_string()))
            .one(db_tx)
            .await?
            .ok_or_else(|| EngineError::KeyNotFound("expense not exists".to_string()))
    }
}
