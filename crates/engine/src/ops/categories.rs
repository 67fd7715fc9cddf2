use uuid::Uuid;

use sea_orm::{
    ActiveValue, Condition, DatabaseTransaction, QueryFilter, QueryOrder, TransactionTrait,
    prelude::*, sea_query::Expr,
};

use crate::{
    Category, CategoryKind, EngineError, ResultEngine, categories, expenses, incomes, transactions,
};

use super::{Engine, normalize_required_name, with_tx};

impl Engine {
    /// Return a user's categories, optionally restricted to one kind.
    pub async fn categories(
        &self,
        user_id: Uuid,
        kind: Option<CategoryKind>,
    ) -> ResultEngine<Vec<Category>> {
        let mut query = categories::Entity::find()
            .filter(categories::Column::UserId.eq(user_id.to_string()));
        if let Some(kind) = kind {
            query = query.filter(categories::Column::Kind.eq(kind.as_str()));
        }
        let models = query
            .order_by_asc(categories::Column::Name)
            .all(&self.database)
            .await?;
        models.into_iter().map(Category::try_from).collect()
    }

    pub async fn category(&self, user_id: Uuid, category_id: Uuid) -> ResultEngine<Category> {
        let model = categories::Entity::find_by_id(category_id.to_string())
            .filter(categories::Column::UserId.eq(user_id.to_string()))
            .one(&self.database)
            .await?
            .ok_or_else(|| EngineError::KeyNotFound("category not exists".to_string()))?;
        Category::try_from(model)
    }

    /// Add a category. Names are unique per user and kind,
    /// case-insensitively.
    pub async fn new_category(
        &self,
        user_id: Uuid,
        name: &str,
        kind: CategoryKind,
    ) -> ResultEngine<Category> {
        let name = normalize_required_name(name, "category")?;
        with_tx!(self, |db_tx| {
            self.require_user(&db_tx, user_id).await?;

            let exists = categories::Entity::find()
                .filter(categories::Column::UserId.eq(user_id.to_string()))
                .filter(categories::Column::Kind.eq(kind.as_str()))
                .filter(Expr::cust("LOWER(name)").eq(name.to_lowercase()))
                .one(&db_tx)
                .await?
                .is_some();
            if exists {
                return Err(EngineError::ExistingKey(name));
            }

            let category = Category::new(user_id, name, kind);
            let model: categories::ActiveModel = (&category).into();
            model.insert(&db_tx).await?;
            Ok(category)
        })
    }

    /// Renames an existing category. The kind is fixed at creation.
    pub async fn rename_category(
        &self,
        user_id: Uuid,
        category_id: Uuid,
        new_name: &str,
    ) -> ResultEngine<Category> {
        let new_name = normalize_required_name(new_name, "category")?;
        with_tx!(self, |db_tx| {
            let current = self.require_category(&db_tx, user_id, category_id).await?;

            let exists = categories::Entity::find()
                .filter(categories::Column::UserId.eq(user_id.to_string()))
                .filter(categories::Column::Kind.eq(current.kind.as_str()))
                .filter(Expr::cust("LOWER(name)").eq(new_name.to_lowercase()))
                .filter(categories::Column::Id.ne(category_id.to_string()))
                .one(&db_tx)
                .await?
                .is_some();
            if exists {
                return Err(EngineError::ExistingKey(new_name));
            }

            let active = categories::ActiveModel {
                id: ActiveValue::Set(category_id.to_string()),
                name: ActiveValue::Set(new_name),
                ..Default::default()
            };
            let model = active.update(&db_tx).await?;
            Category::try_from(model)
        })
    }

    /// Delete a category together with the buckets and ledger entries
    /// classified under it.
    pub async fn delete_category(&self, user_id: Uuid, category_id: Uuid) -> ResultEngine<()> {
        let id = category_id.to_string();
        with_tx!(self, |db_tx| {
            self.require_category(&db_tx, user_id, category_id).await?;

            transactions::Entity::delete_many()
                .filter(
                    Condition::any()
                        .add(transactions::Column::FromCategoryId.eq(id.clone()))
                        .add(transactions::Column::ToCategoryId.eq(id.clone())),
                )
                .exec(&db_tx)
                .await?;
            incomes::Entity::delete_many()
                .filter(incomes::Column::CategoryId.eq(id.clone()))
                .exec(&db_tx)
                .await?;
            expenses::Entity::delete_many()
                .filter(expenses::Column::CategoryId.eq(id.clone()))
                .exec(&db_tx)
                .await?;
            categories::Entity::delete_many()
                .filter(categories::Column::Id.eq(id.clone()))
                .exec(&db_tx)
                .await?;
            Ok(())
        })
    }

    pub(super) async fn require_category(
        &self,
        db_tx: &DatabaseTransaction,
        user_id: Uuid,
        category_id: Uuid,
    ) -> ResultEngine<Category> {
        let model = categories::Entity::find_by_id(category_id.to_string())
            .filter(categories::Column::UserId.eq(user_id.to_string()))
            .one(db_tx)
            .await?
            .ok_or_else(|| EngineError::KeyNotFound("category not exists".to_string()))?;
        Category::try_from(model)
    }
}
