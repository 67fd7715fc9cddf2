//! Ledger primitives.
//!
//! A `LedgerEntry` is an immutable record of one money movement. The `kind`
//! tag decides which of the from/to references are meaningful:
//!
//! - `income`: `to_wallet_id` (+ `from_category_id` for the source tag)
//! - `expense`: `from_wallet_id` (+ `to_category_id` for the spending tag)
//! - `goal_transfer`: `from_wallet_id` and `to_goal_id`
//! - `wallet_transfer`: `from_wallet_id` and `to_wallet_id`

use chrono::{DateTime, NaiveDate, Utc};
use sea_orm::{ActiveValue, entity::prelude::*};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::{EngineError, ResultEngine};

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EntryKind {
    Income,
    Expense,
    GoalTransfer,
    WalletTransfer,
}

impl EntryKind {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Income => "income",
            Self::Expense => "expense",
            Self::GoalTransfer => "goal_transfer",
            Self::WalletTransfer => "wallet_transfer",
        }
    }
}

impl TryFrom<&str> for EntryKind {
    type Error = EngineError;

    fn try_from(value: &str) -> Result<Self, Self::Error> {
        match value {
            "income" => Ok(Self::Income),
            "expense" => Ok(Self::Expense),
            "goal_transfer" => Ok(Self::GoalTransfer),
            "wallet_transfer" => Ok(Self::WalletTransfer),
            other => Err(EngineError::InvalidAmount(format!(
                "invalid ledger entry kind: {other}"
            ))),
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct LedgerEntry {
    pub id: Uuid,
    pub user_id: Uuid,
    pub kind: EntryKind,
    pub amount_minor: i64,
    pub occurred_on: NaiveDate,
    pub note: Option<String>,
    pub from_wallet_id: Option<Uuid>,
    pub to_wallet_id: Option<Uuid>,
    pub from_goal_id: Option<Uuid>,
    pub to_goal_id: Option<Uuid>,
    pub from_category_id: Option<Uuid>,
    pub to_category_id: Option<Uuid>,
    pub created_at: DateTime<Utc>,
}

impl LedgerEntry {
    pub fn new(
        user_id: Uuid,
        kind: EntryKind,
        amount_minor: i64,
        occurred_on: NaiveDate,
        note: Option<String>,
    ) -> ResultEngine<Self> {
        if amount_minor <= 0 {
            return Err(EngineError::InvalidAmount(
                "amount_minor must be > 0".to_string(),
            ));
        }
        Ok(Self {
            id: Uuid::new_v4(),
            user_id,
            kind,
            amount_minor,
            occurred_on,
            note,
            from_wallet_id: None,
            to_wallet_id: None,
            from_goal_id: None,
            to_goal_id: None,
            from_category_id: None,
            to_category_id: None,
            created_at: Utc::now(),
        })
    }
}

#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Eq)]
#[sea_orm(table_name = "transactions")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: String,
    pub user_id: String,
    pub kind: String,
    pub amount_minor: i64,
    pub occurred_on: Date,
    pub note: Option<String>,
    pub from_wallet_id: Option<String>,
    pub to_wallet_id: Option<String>,
    pub from_goal_id: Option<String>,
    pub to_goal_id: Option<String>,
    pub from_category_id: Option<String>,
    pub to_category_id: Option<String>,
    pub created_at: DateTimeUtc,
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
    #[sea_orm(
        belongs_to = "super::wallets::Entity",
        from = "Column::FromWalletId",
        to = "super::wallets::Column::Id",
        on_update = "NoAction",
        on_delete = "SetNull"
    )]
    FromWallet,
    #[sea_orm(
        belongs_to = "super::wallets::Entity",
        from = "Column::ToWalletId",
        to = "super::wallets::Column::Id",
        on_update = "NoAction",
        on_delete = "SetNull"
    )]
    ToWallet,
    #[sea_orm(
        belongs_to = "super::goals::Entity",
        from = "Column::ToGoalId",
        to = "super::goals::Column::Id",
        on_update = "NoAction",
        on_delete = "Cascade"
    )]
    ToGoal,
    #[sea_orm(
        belongs_to = "super::categories::Entity",
        from = "Column::FromCategoryId",
        to = "super::categories::Column::Id",
        on_update = "NoAction",
        on_delete = "Cascade"
    )]
    FromCategory,
    #[sea_orm(
        belongs_to = "super::categories::Entity",
        from = "Column::ToCategoryId",
        to = "super::categories::Column::Id",
        on_update = "NoAction",
        on_delete = "Cascade"
    )]
    ToCategory,
}

impl Related<super::users::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Users.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}

impl From<&LedgerEntry> for ActiveModel {
    fn from(entry: &LedgerEntry) -> Self {
        Self {
            id: ActiveValue::Set(entry.id.to_string()),
            user_id: ActiveValue::Set(entry.user_id.to_string()),
            kind: ActiveValue::Set(entry.kind.as_str().to_string()),
            amount_minor: ActiveValue::Set(entry.amount_minor),
            occurred_on: ActiveValue::Set(entry.occurred_on),
            note: ActiveValue::Set(entry.note.clone()),
            from_wallet_id: ActiveValue::Set(entry.from_wallet_id.map(|id| id.to_string())),
            to_wallet_id: ActiveValue::Set(entry.to_wallet_id.map(|id| id.to_string())),
            from_goal_id: ActiveValue::Set(entry.from_goal_id.map(|id| id.to_string())),
            to_goal_id: ActiveValue::Set(entry.to_goal_id.map(|id| id.to_string())),
            from_category_id: ActiveValue::Set(entry.from_category_id.map(|id| id.to_string())),
            to_category_id: ActiveValue::Set(entry.to_category_id.map(|id| id.to_string())),
            created_at: ActiveValue::Set(entry.created_at),
        }
    }
}

impl TryFrom<Model> for LedgerEntry {
    type Error = EngineError;

    fn try_from(model: Model) -> Result<Self, Self::Error> {
        Ok(Self {
            id: Uuid::parse_str(&model.id)
                .map_err(|_| EngineError::KeyNotFound("transaction not exists".to_string()))?,
            user_id: Uuid::parse_str(&model.user_id)
                .map_err(|_| EngineError::KeyNotFound("user not exists".to_string()))?,
            kind: EntryKind::try_from(model.kind.as_str())?,
            amount_minor: model.amount_minor,
            occurred_on: model.occurred_on,
            note: model.note,
            from_wallet_id: model.from_wallet_id.and_then(|s| Uuid::parse_str(&s).ok()),
            to_wallet_id: model.to_wallet_id.and_then(|s| Uuid::parse_str(&s).ok()),
            from_goal_id: model.from_goal_id.and_then(|s| Uuid::parse_str(&s).ok()),
            to_goal_id: model.to_goal_id.and_then(|s| Uuid::parse_str(&s).ok()),
            from_category_id: model
                .from_category_id
                .and_then(|s| Uuid::parse_str(&s).ok()),
            to_category_id: model.to_category_id.and_then(|s| Uuid::parse_str(&s).ok()),
            created_at: model.created_at,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn non_positive_amount_is_rejected() {
        let err = LedgerEntry::new(
            Uuid::new_v4(),
            EntryKind::GoalTransfer,
            0,
            NaiveDate::from_ymd_opt(2025, 7, 1).unwrap(),
            None,
        )
        .unwrap_err();
        assert!(matches!(err, EngineError::InvalidAmount(_)));
    }

    #[test]
    fn unknown_kind_is_rejected() {
        let err = EntryKind::try_from("refund").unwrap_err();
        assert!(matches!(err, EngineError::InvalidAmount(_)));
    }
}
