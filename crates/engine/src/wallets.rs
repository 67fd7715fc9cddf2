//! The module contains the `Wallet` struct and its entity.
//!
//! A wallet is a named money container: a real wallet, a bank account or
//! anything else money is kept in. Balances are integer minor units.

use sea_orm::entity::{ActiveValue, prelude::*};
use uuid::Uuid;

use crate::{EngineError, ResultEngine};

/// A wallet owned by a single user.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Wallet {
    /// Stable identifier, generated once and persisted so the wallet can be
    /// renamed without breaking ledger references.
    pub id: Uuid,
    pub user_id: Uuid,
    pub name: String,
    pub balance_minor: i64,
    pub currency: String,
    pub icon: Option<String>,
    pub color: Option<String>,
}

impl Wallet {
    pub fn new(
        user_id: Uuid,
        name: String,
        balance_minor: i64,
        currency: String,
        icon: Option<String>,
        color: Option<String>,
    ) -> Self {
        Self {
            id: Uuid::new_v4(),
            user_id,
            name,
            balance_minor,
            currency,
            icon,
            color,
        }
    }

    /// Remove `amount_minor` from the balance.
    ///
    /// Fails with [`EngineError::InsufficientFunds`] when the balance does
    /// not cover the amount; the wallet is left untouched in that case.
    pub fn debit(&mut self, amount_minor: i64) -> ResultEngine<()> {
        if self.balance_minor < amount_minor {
            return Err(EngineError::InsufficientFunds(format!(
                "wallet '{}' holds {}, requested {}",
                self.name, self.balance_minor, amount_minor
            )));
        }
        self.balance_minor -= amount_minor;
        Ok(())
    }

    /// Add `amount_minor` to the balance.
    pub fn credit(&mut self, amount_minor: i64) {
        self.balance_minor += amount_minor;
    }
}

#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Eq)]
#[sea_orm(table_name = "wallets")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: String,
    pub user_id: String,
    pub name: String,
    pub balance_minor: i64,
    pub currency: String,
    pub icon: Option<String>,
    pub color: Option<String>,
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

impl From<&Wallet> for ActiveModel {
    fn from(value: &Wallet) -> Self {
        Self {
            id: ActiveValue::Set(value.id.to_string()),
            user_id: ActiveValue::Set(value.user_id.to_string()),
            name: ActiveValue::Set(value.name.clone()),
            balance_minor: ActiveValue::Set(value.balance_minor),
            currency: ActiveValue::Set(value.currency.clone()),
            icon: ActiveValue::Set(value.icon.clone()),
            color: ActiveValue::Set(value.color.clone()),
        }
    }
}

impl TryFrom<Model> for Wallet {
    type Error = EngineError;

    fn try_from(model: Model) -> Result<Self, Self::Error> {
        Ok(Self {
            id: Uuid::parse_str(&model.id)
                .map_err(|_| EngineError::KeyNotFound("wallet not exists".to_string()))?,
            user_id: Uuid::parse_str(&model.user_id)
                .map_err(|_| EngineError::KeyNotFound("user not exists".to_string()))?,
            name: model.name,
            balance_minor: model.balance_minor,
            currency: model.currency,
            icon: model.icon,
            color: model.color,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn wallet() -> Wallet {
        Wallet::new(
            Uuid::new_v4(),
            String::from("Cash"),
            1000,
            String::from("KZT"),
            None,
            None,
        )
    }

    #[test]
    fn debit_within_balance() {
        let mut wallet = wallet();
        wallet.debit(300).unwrap();
        assert_eq!(wallet.balance_minor, 700);
    }

    #[test]
    fn debit_over_balance_leaves_wallet_unchanged() {
        let mut wallet = wallet();
        let err = wallet.debit(1001).unwrap_err();
        assert!(matches!(err, EngineError::InsufficientFunds(_)));
        assert_eq!(wallet.balance_minor, 1000);
    }

    #[test]
    fn credit_adds_to_balance() {
        let mut wallet = wallet();
        wallet.credit(250);
        assert_eq!(wallet.balance_minor, 1250);
    }
}
