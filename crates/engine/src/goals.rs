//! The module contains the `Goal` struct and its entity.
//!
//! A goal is a savings target. `current_minor` only moves toward
//! `target_minor` through the ledger's goal assignment; it never moves back.

use chrono::{DateTime, Utc};
use sea_orm::entity::{ActiveValue, prelude::*};
use uuid::Uuid;

use crate::{EngineError, ResultEngine};

/// A savings goal owned by a single user.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Goal {
    pub id: Uuid,
    pub user_id: Uuid,
    pub name: String,
    pub target_minor: i64,
    pub current_minor: i64,
    pub currency: String,
    pub icon: Option<String>,
    pub color: Option<String>,
    pub plan_period: Option<String>,
    pub plan_amount_minor: Option<i64>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Goal {
    pub fn new(
        user_id: Uuid,
        name: String,
        target_minor: i64,
        currency: String,
        icon: Option<String>,
        color: Option<String>,
        plan_period: Option<String>,
        plan_amount_minor: Option<i64>,
    ) -> Self {
        let now = Utc::now();
        Self {
            id: Uuid::new_v4(),
            user_id,
            name,
            target_minor,
            current_minor: 0,
            currency,
            icon,
            color,
            plan_period,
            plan_amount_minor,
            created_at: now,
            updated_at: now,
        }
    }

    /// How much is still missing to reach the target.
    pub fn remaining_minor(&self) -> i64 {
        (self.target_minor - self.current_minor).max(0)
    }

    /// Move `amount_minor` toward the target.
    ///
    /// Fails with [`EngineError::GoalAlreadyComplete`] when the goal has
    /// already reached its target, and with [`EngineError::InvalidAmount`]
    /// when the amount overshoots the remaining delta. The goal is left
    /// untouched on failure.
    pub fn allocate(&mut self, amount_minor: i64) -> ResultEngine<()> {
        if self.current_minor >= self.target_minor {
            return Err(EngineError::GoalAlreadyComplete(format!(
                "goal '{}' already reached its target of {}",
                self.name, self.target_minor
            )));
        }
        if amount_minor > self.remaining_minor() {
            return Err(EngineError::InvalidAmount(format!(
                "amount {} exceeds the {} remaining for goal '{}'",
                amount_minor,
                self.remaining_minor(),
                self.name
            )));
        }
        self.current_minor += amount_minor;
        self.updated_at = Utc::now();
        Ok(())
    }
}

#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Eq)]
#[sea_orm(table_name = "goals")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: String,
    pub user_id: String,
    pub name: String,
    pub target_minor: i64,
    pub current_minor: i64,
    pub currency: String,
    pub icon: Option<String>,
    pub color: Option<String>,
    pub plan_period: Option<String>,
    pub plan_amount_minor: Option<i64>,
    pub created_at: DateTimeUtc,
    pub updated_at: DateTimeUtc,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::users::Entity",
        from = "Column::UserId",
        to = "super::users::Column::Id",
        on_update = "NoAction",
        on_delete = "Cascade"
    )]
    Users,
}

impl Related<super::users::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Users.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}

impl From<&Goal> for ActiveModel {
    fn from(value: &Goal) -> Self {
        Self {
            id: ActiveValue::Set(value.id.to_string()),
            user_id: ActiveValue::Set(value.user_id.to_string()),
            name: ActiveValue::Set(value.name.clone()),
            target_minor: ActiveValue::Set(value.target_minor),
            current_minor: ActiveValue::Set(value.current_minor),
            currency: ActiveValue::Set(value.currency.clone()),
            icon: ActiveValue::Set(value.icon.clone()),
            color: ActiveValue::Set(value.color.clone()),
            plan_period: ActiveValue::Set(value.plan_period.clone()),
            plan_amount_minor: ActiveValue::Set(value.plan_amount_minor),
            created_at: ActiveValue::Set(value.created_at),
            updated_at: ActiveValue::Set(value.updated_at),
        }
    }
}

impl TryFrom<Model> for Goal {
    type Error = EngineError;

    fn try_from(model: Model) -> Result<Self, Self::Error> {
        Ok(Self {
            id: Uuid::parse_str(&model.id)
                .map_err(|_| EngineError::KeyNotFound("goal not exists".to_string()))?,
            user_id: Uuid::parse_str(&model.user_id)
                .map_err(|_| EngineError::KeyNotFound("user not exists".to_string()))?,
            name: model.name,
            target_minor: model.target_minor,
            current_minor: model.current_minor,
            currency: model.currency,
            icon: model.icon,
            color: model.color,
            plan_period: model.plan_period,
            plan_amount_minor: model.plan_amount_minor,
            created_at: model.created_at,
            updated_at: model.updated_at,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn goal() -> Goal {
        let mut goal = Goal::new(
            Uuid::new_v4(),
            String::from("Vacation"),
            500,
            String::from("KZT"),
            None,
            None,
            None,
            None,
        );
        goal.current_minor = 200;
        goal
    }

    #[test]
    fn allocate_up_to_remaining() {
        let mut goal = goal();
        goal.allocate(300).unwrap();
        assert_eq!(goal.current_minor, 500);
        assert_eq!(goal.remaining_minor(), 0);
    }

    #[test]
    fn allocate_over_remaining_fails() {
        let mut goal = goal();
        let err = goal.allocate(301).unwrap_err();
        assert!(matches!(err, EngineError::InvalidAmount(_)));
        assert_eq!(goal.current_minor, 200);
    }

    #[test]
    fn allocate_on_complete_goal_fails() {
        let mut goal = goal();
        goal.current_minor = 500;
        let err = goal.allocate(1).unwrap_err();
        assert!(matches!(err, EngineError::GoalAlreadyComplete(_)));
        assert_eq!(goal.current_minor, 500);
    }
}
