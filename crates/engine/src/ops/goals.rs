use chrono::Utc;
use uuid::Uuid;

use sea_orm::{
    ActiveValue, DatabaseTransaction, QueryFilter, QueryOrder, TransactionTrait, prelude::*,
    sea_query::Expr,
};

use crate::{EngineError, Goal, NewGoal, ResultEngine, UpdateGoal, goals, transactions};

use super::{
    Engine, normalize_optional_text, normalize_required_name, require_positive_amount,
    wallets::DEFAULT_CURRENCY, with_tx,
};

impl Engine {
    /// Return a user's goals, newest first.
    pub async fn goals(&self, user_id: Uuid) -> ResultEngine<Vec<Goal>> {
        let models = goals::Entity::find()
            .filter(goals::Column::UserId.eq(user_id.to_string()))
            .order_by_desc(goals::Column::CreatedAt)
            .all(&self.database)
            .await?;
        models.into_iter().map(Goal::try_from).collect()
    }

    pub async fn goal(&self, user_id: Uuid, goal_id: Uuid) -> ResultEngine<Goal> {
        let model = goals::Entity::find_by_id(goal_id.to_string())
            .filter(goals::Column::UserId.eq(user_id.to_string()))
            .one(&self.database)
            .await?
            .ok_or_else(|| EngineError::KeyNotFound("goal not exists".to_string()))?;
        Goal::try_from(model)
    }

    /// Add a savings goal with a positive target and nothing saved yet.
    pub async fn new_goal(&self, user_id: Uuid, new_goal: NewGoal) -> ResultEngine<Goal> {
        let name = normalize_required_name(&new_goal.name, "goal")?;
        require_positive_amount(new_goal.target_minor)?;
        if let Some(plan_amount_minor) = new_goal.plan_amount_minor {
            require_positive_amount(plan_amount_minor)?;
        }
        with_tx!(self, |db_tx| {
            self.require_user(&db_tx, user_id).await?;

            let exists = goals::Entity::find()
                .filter(goals::Column::UserId.eq(user_id.to_string()))
                .filter(Expr::cust("LOWER(name)").eq(name.to_lowercase()))
                .one(&db_tx)
                .await?
                .is_some();
            if exists {
                return Err(EngineError::ExistingKey(name));
            }

            let goal = Goal::new(
                user_id,
                name,
                new_goal.target_minor,
                new_goal
                    .currency
                    .unwrap_or_else(|| DEFAULT_CURRENCY.to_string()),
                normalize_optional_text(new_goal.icon.as_deref()),
                normalize_optional_text(new_goal.color.as_deref()),
                normalize_optional_text(new_goal.plan_period.as_deref()),
                new_goal.plan_amount_minor,
            );
            let model: goals::ActiveModel = (&goal).into();
            model.insert(&db_tx).await?;
            Ok(goal)
        })
    }

    /// Update goal fields. Lowering the target below the saved amount fails;
    /// the saved amount itself only moves through the ledger.
    pub async fn update_goal(
        &self,
        user_id: Uuid,
        goal_id: Uuid,
        update: UpdateGoal,
    ) -> ResultEngine<Goal> {
        let name = match update.name.as_deref() {
            Some(name) => Some(normalize_required_name(name, "goal")?),
            None => None,
        };
        if let Some(target_minor) = update.target_minor {
            require_positive_amount(target_minor)?;
        }
        if let Some(plan_amount_minor) = update.plan_amount_minor {
            require_positive_amount(plan_amount_minor)?;
        }
        with_tx!(self, |db_tx| {
            let current = self.require_goal(&db_tx, user_id, goal_id).await?;

            if let Some(target_minor) = update.target_minor
                && target_minor < current.current_minor
            {
                return Err(EngineError::InvalidAmount(format!(
                    "target {} is below the {} already saved",
                    target_minor, current.current_minor
                )));
            }

            if let Some(name) = &name {
                let exists = goals::Entity::find()
                    .filter(goals::Column::UserId.eq(user_id.to_string()))
                    .filter(Expr::cust("LOWER(name)").eq(name.to_lowercase()))
                    .filter(goals::Column::Id.ne(goal_id.to_string()))
                    .one(&db_tx)
                    .await?
                    .is_some();
                if exists {
                    return Err(EngineError::ExistingKey(name.clone()));
                }
            }

            let mut active = goals::ActiveModel {
                id: ActiveValue::Set(goal_id.to_string()),
                updated_at: ActiveValue::Set(Utc::now()),
                ..Default::default()
            };
            if let Some(name) = name {
                active.name = ActiveValue::Set(name);
            }
            if let Some(target_minor) = update.target_minor {
                active.target_minor = ActiveValue::Set(target_minor);
            }
            if update.icon.is_some() {
                active.icon = ActiveValue::Set(normalize_optional_text(update.icon.as_deref()));
            }
            if update.color.is_some() {
                active.color = ActiveValue::Set(normalize_optional_text(update.color.as_deref()));
            }
            if update.plan_period.is_some() {
                active.plan_period =
                    ActiveValue::Set(normalize_optional_text(update.plan_period.as_deref()));
            }
            if let Some(plan_amount_minor) = update.plan_amount_minor {
                active.plan_amount_minor = ActiveValue::Set(Some(plan_amount_minor));
            }
            let model = active.update(&db_tx).await?;
            Goal::try_from(model)
        })
    }

    /// Delete a goal together with the ledger entries that funded it.
    ///
    /// Funds already moved into the goal are not returned to any wallet.
    pub async fn delete_goal(&self, user_id: Uuid, goal_id: Uuid) -> ResultEngine<()> {
        let id = goal_id.to_string();
        with_tx!(self, |db_tx| {
            self.require_goal(&db_tx, user_id, goal_id).await?;

            transactions::Entity::delete_many()
                .filter(transactions::Column::ToGoalId.eq(id.clone()))
                .exec(&db_tx)
                .await?;
            goals::Entity::delete_many()
                .filter(goals::Column::Id.eq(id.clone()))
                .exec(&db_tx)
                .await?;
            Ok(())
        })
    }

    pub(super) async fn require_goal(
        &self,
        db_tx: &DatabaseTransaction,
        user_id: Uuid,
        goal_id: Uuid,
    ) -> ResultEngine<Goal> {
        let model = goals::Entity::find_by_id(goal_id.to_string())
            .filter(goals::Column::UserId.eq(user_id.to_string()))
            .one(db_tx)
            .await?
            .ok_or_else(|| EngineError::KeyNotFound("goal not exists".to_string()))?;
        Goal::try_from(model)
    }
}
