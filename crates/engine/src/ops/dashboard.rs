//! Aggregated totals for the dashboard view. Everything is computed in SQL
//! and scoped to one user; nothing here writes.

use std::collections::HashMap;

use chrono::NaiveDate;
use uuid::Uuid;

use sea_orm::{
    DatabaseTransaction, QueryFilter, QuerySelect, TransactionTrait, prelude::*, sea_query::Expr,
};

use crate::{EntryKind, ResultEngine, categories, goals, transactions, wallets};

use super::{Engine, with_tx};

/// One category's share of the income or expense total.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct CategoryTotal {
    /// `None` groups the entries recorded without a category.
    pub category_id: Option<Uuid>,
    pub name: Option<String>,
    pub total_minor: i64,
}

/// Snapshot of a user's finances, optionally restricted to a date range.
///
/// Wallet and goal totals always reflect the current state; the income and
/// expense figures honor the `[from, to)` range on `occurred_on`.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct DashboardSummary {
    pub total_balance_minor: i64,
    pub income_minor: i64,
    pub expense_minor: i64,
    pub goals_saved_minor: i64,
    pub goals_target_minor: i64,
    pub incomes_by_category: Vec<CategoryTotal>,
    pub expenses_by_category: Vec<CategoryTotal>,
}

fn entry_range_filter<Q>(
    mut query: Q,
    from: Option<NaiveDate>,
    to: Option<NaiveDate>,
) -> Q
where
    Q: QueryFilter,
{
    if let Some(from) = from {
        query = query.filter(transactions::Column::OccurredOn.gte(from));
    }
    if let Some(to) = to {
        query = query.filter(transactions::Column::OccurredOn.lt(to));
    }
    query
}

impl Engine {
    /// Compute the dashboard in one DB transaction for a consistent read.
    pub async fn dashboard(
        &self,
        user_id: Uuid,
        from: Option<NaiveDate>,
        to: Option<NaiveDate>,
    ) -> ResultEngine<DashboardSummary> {
        with_tx!(self, |db_tx| {
            self.require_user(&db_tx, user_id).await?;

            let total_balance_minor: Option<i64> = wallets::Entity::find()
                .select_only()
                .column_as(
                    Expr::col((wallets::Entity, wallets::Column::BalanceMinor)).sum(),
                    "total",
                )
                .filter(wallets::Column::UserId.eq(user_id.to_string()))
                .into_tuple()
                .one(&db_tx)
                .await?
                .flatten();

            let (goals_saved_minor, goals_target_minor): (Option<i64>, Option<i64>) =
                goals::Entity::find()
                    .select_only()
                    .column_as(
                        Expr::col((goals::Entity, goals::Column::CurrentMinor)).sum(),
                        "saved",
                    )
                    .column_as(
                        Expr::col((goals::Entity, goals::Column::TargetMinor)).sum(),
                        "target",
                    )
                    .filter(goals::Column::UserId.eq(user_id.to_string()))
                    .into_tuple()
                    .one(&db_tx)
                    .await?
                    .unwrap_or((None, None));

            let income_minor = self
                .sum_entries(&db_tx, user_id, EntryKind::Income, from, to)
                .await?;
            let expense_minor = self
                .sum_entries(&db_tx, user_id, EntryKind::Expense, from, to)
                .await?;

            let incomes_by_category = self
                .totals_by_category(
                    &db_tx,
                    user_id,
                    EntryKind::Income,
                    transactions::Column::FromCategoryId,
                    from,
                    to,
                )
                .await?;
            let expenses_by_category = self
                .totals_by_category(
                    &db_tx,
                    user_id,
                    EntryKind::Expense,
                    transactions::Column::ToCategoryId,
                    from,
                    to,
                )
                .await?;

            Ok(DashboardSummary {
                total_balance_minor: total_balance_minor.unwrap_or(0),
                income_minor,
                expense_minor,
                goals_saved_minor: goals_saved_minor.unwrap_or(0),
                goals_target_minor: goals_target_minor.unwrap_or(0),
                incomes_by_category,
                expenses_by_category,
            })
        })
    }

    async fn sum_entries(
        &self,
        db_tx: &DatabaseTransaction,
        user_id: Uuid,
        kind: EntryKind,
        from: Option<NaiveDate>,
        to: Option<NaiveDate>,
    ) -> ResultEngine<i64> {
        let query = transactions::Entity::find()
            .select_only()
            .column_as(
                Expr::col((transactions::Entity, transactions::Column::AmountMinor)).sum(),
                "total",
            )
            .filter(transactions::Column::UserId.eq(user_id.to_string()))
            .filter(transactions::Column::Kind.eq(kind.as_str()));
        let total: Option<i64> = entry_range_filter(query, from, to)
            .into_tuple()
            .one(db_tx)
            .await?
            .flatten();
        Ok(total.unwrap_or(0))
    }

    async fn totals_by_category(
        &self,
        db_tx: &DatabaseTransaction,
        user_id: Uuid,
        kind: EntryKind,
        category_column: transactions::Column,
        from: Option<NaiveDate>,
        to: Option<NaiveDate>,
    ) -> ResultEngine<Vec<CategoryTotal>> {
        let query = transactions::Entity::find()
            .select_only()
            .column(category_column)
            .column_as(
                Expr::col((transactions::Entity, transactions::Column::AmountMinor)).sum(),
                "total",
            )
            .filter(transactions::Column::UserId.eq(user_id.to_string()))
            .filter(transactions::Column::Kind.eq(kind.as_str()))
            .group_by(category_column);
        let rows: Vec<(Option<String>, Option<i64>)> = entry_range_filter(query, from, to)
            .into_tuple()
            .all(db_tx)
            .await?;

        let ids: Vec<String> = rows.iter().filter_map(|(id, _)| id.clone()).collect();
        let names: HashMap<String, String> = if ids.is_empty() {
            HashMap::new()
        } else {
            categories::Entity::find()
                .filter(categories::Column::Id.is_in(ids))
                .all(db_tx)
                .await?
                .into_iter()
                .map(|model| (model.id, model.name))
                .collect()
        };

        let mut out = Vec::with_capacity(rows.len());
        for (category_id, total) in rows {
            let name = category_id.as_ref().and_then(|id| names.get(id).cloned());
            out.push(CategoryTotal {
                category_id: category_id.as_deref().and_then(|s| Uuid::parse_str(s).ok()),
                name,
                total_minor: total.unwrap_or(0),
            });
        }
        out.sort_by(|a, b| b.total_minor.cmp(&a.total_minor));
        Ok(out)
    }
}
