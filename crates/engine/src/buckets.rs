//! The shared `Bucket` domain type behind the `incomes` and `expenses`
//! entities.
//!
//! Income and expense buckets are structurally identical: a named plan that
//! accumulates assigned amounts over time. The ledger fills them in through
//! [`crate::Engine::assign_income`] and [`crate::Engine::assign_to_expense`].

use chrono::NaiveDate;
use uuid::Uuid;

use crate::{EngineError, expenses, incomes};

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Bucket {
    pub id: Uuid,
    pub user_id: Uuid,
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

fn parse_id(raw: &str, what: &str) -> Result<Uuid, EngineError> {
    Uuid::parse_str(raw).map_err(|_| EngineError::KeyNotFound(format!("{what} not exists")))
}

fn parse_optional_id(raw: Option<String>) -> Option<Uuid> {
    raw.and_then(|s| Uuid::parse_str(&s).ok())
}

impl TryFrom<incomes::Model> for Bucket {
    type Error = EngineError;

    fn try_from(model: incomes::Model) -> Result<Self, Self::Error> {
        Ok(Self {
            id: parse_id(&model.id, "income")?,
            user_id: parse_id(&model.user_id, "user")?,
            name: model.name,
            icon: model.icon,
            color: model.color,
            amount_minor: model.amount_minor,
            wallet_id: parse_optional_id(model.wallet_id),
            category_id: parse_optional_id(model.category_id),
            occurred_on: model.occurred_on,
            note: model.note,
        })
    }
}

impl TryFrom<expenses::Model> for Bucket {
    type Error = EngineError;

    fn try_from(model: expenses::Model) -> Result<Self, Self::Error> {
        Ok(Self {
            id: parse_id(&model.id, "expense")?,
            user_id: parse_id(&model.user_id, "user")?,
            name: model.name,
            icon: model.icon,
            color: model.color,
            amount_minor: model.amount_minor,
            wallet_id: parse_optional_id(model.wallet_id),
            category_id: parse_optional_id(model.category_id),
            occurred_on: model.occurred_on,
            note: model.note,
        })
    }
}
