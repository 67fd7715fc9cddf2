use base64::Engine as _;
use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use sea_orm::{
    Condition, QueryFilter, QueryOrder, QuerySelect, TransactionTrait, prelude::*,
};

use crate::{EngineError, EntryKind, LedgerEntry, ResultEngine, transactions};

use super::{Engine, with_tx};

/// Filters for listing ledger entries.
///
/// `from` is inclusive and `to` is exclusive (`[from, to)`), both on
/// `occurred_on`.
#[derive(Clone, Debug, Default)]
pub struct LedgerListFilter {
    pub from: Option<NaiveDate>,
    pub to: Option<NaiveDate>,
    /// If present, acts as an allow-list of kinds to return.
    pub kinds: Option<Vec<EntryKind>>,
    /// If present, only entries touching this wallet on either side.
    pub wallet_id: Option<Uuid>,
}

fn validate_list_filter(filter: &LedgerListFilter) -> ResultEngine<()> {
    if let (Some(from), Some(to)) = (filter.from, filter.to)
        && from >= to
    {
        return Err(EngineError::InvalidAmount(
            "invalid range: from must be < to".to_string(),
        ));
    }
    if filter.kinds.as_ref().is_some_and(|k| k.is_empty()) {
        return Err(EngineError::InvalidAmount(
            "kinds must not be empty".to_string(),
        ));
    }
    Ok(())
}

trait ApplyLedgerFilters: QueryFilter + Sized {
    fn apply_ledger_filters(self, filter: &LedgerListFilter) -> Self;
}

impl<T> ApplyLedgerFilters for T
where
    T: QueryFilter + Sized,
{
    fn apply_ledger_filters(mut self, filter: &LedgerListFilter) -> Self {
        if let Some(from) = filter.from {
            self = self.filter(transactions::Column::OccurredOn.gte(from));
        }
        if let Some(to) = filter.to {
            self = self.filter(transactions::Column::OccurredOn.lt(to));
        }
        if let Some(kinds) = &filter.kinds {
            let kinds: Vec<String> = kinds.iter().map(|k| k.as_str().to_string()).collect();
            self = self.filter(transactions::Column::Kind.is_in(kinds));
        }
        if let Some(wallet_id) = filter.wallet_id {
            self = self.filter(
                Condition::any()
                    .add(transactions::Column::FromWalletId.eq(wallet_id.to_string()))
                    .add(transactions::Column::ToWalletId.eq(wallet_id.to_string())),
            );
        }
        self
    }
}

#[derive(Clone, Debug, Serialize, Deserialize)]
struct LedgerCursor {
    created_at: DateTime<Utc>,
    transaction_id: String,
}

impl LedgerCursor {
    fn encode(&self) -> ResultEngine<String> {
        let bytes = serde_json::to_vec(self)
            .map_err(|_| EngineError::InvalidAmount("invalid ledger cursor".to_string()))?;
        Ok(base64::engine::general_purpose::URL_SAFE_NO_PAD.encode(bytes))
    }

    fn decode(input: &str) -> ResultEngine<Self> {
        let bytes = base64::engine::general_purpose::URL_SAFE_NO_PAD
            .decode(input.as_bytes())
            .map_err(|_| EngineError::InvalidAmount("invalid ledger cursor".to_string()))?;
        serde_json::from_slice::<Self>(&bytes)
            .map_err(|_| EngineError::InvalidAmount("invalid ledger cursor".to_string()))
    }
}

impl Engine {
    /// Returns a single ledger entry (detail view).
    pub async fn transaction(
        &self,
        user_id: Uuid,
        transaction_id: Uuid,
    ) -> ResultEngine<LedgerEntry> {
        let model = transactions::Entity::find_by_id(transaction_id.to_string())
            .filter(transactions::Column::UserId.eq(user_id.to_string()))
            .one(&self.database)
            .await?
            .ok_or_else(|| EngineError::KeyNotFound("transaction not exists".to_string()))?;
        LedgerEntry::try_from(model)
    }

    /// Lists a user's ledger, newest first, with cursor-based pagination.
    ///
    /// Pagination is newest to older by `(created_at DESC, id DESC)`. The
    /// returned cursor, when present, resumes after the last returned entry.
    pub async fn list_ledger_page(
        &self,
        user_id: Uuid,
        limit: u64,
        cursor: Option<&str>,
        filter: &LedgerListFilter,
    ) -> ResultEngine<(Vec<LedgerEntry>, Option<String>)> {
        validate_list_filter(filter)?;
        with_tx!(self, |db_tx| {
            self.require_user(&db_tx, user_id).await?;

            let limit_plus_one = limit.saturating_add(1);
            let mut query = transactions::Entity::find()
                .filter(transactions::Column::UserId.eq(user_id.to_string()))
                .order_by_desc(transactions::Column::CreatedAt)
                .order_by_desc(transactions::Column::Id)
                .limit(limit_plus_one);

            if let Some(cursor) = cursor {
                let cursor = LedgerCursor::decode(cursor)?;
                query = query.filter(
                    Condition::any()
                        .add(transactions::Column::CreatedAt.lt(cursor.created_at))
                        .add(
                            Condition::all()
                                .add(transactions::Column::CreatedAt.eq(cursor.created_at))
                                .add(transactions::Column::Id.lt(cursor.transaction_id)),
                        ),
                );
            }
            query = query.apply_ledger_filters(filter);

            let rows: Vec<transactions::Model> = query.all(&db_tx).await?;
            let has_more = rows.len() > limit as usize;

            let mut out: Vec<LedgerEntry> = Vec::with_capacity(rows.len().min(limit as usize));
            for model in rows.into_iter().take(limit as usize) {
                out.push(LedgerEntry::try_from(model)?);
            }

            let next_cursor = out.last().map(|entry| LedgerCursor {
                created_at: entry.created_at,
                transaction_id: entry.id.to_string(),
            });
            let next_cursor = if has_more {
                next_cursor.map(|c| c.encode()).transpose()?
            } else {
                None
            };

            Ok((out, next_cursor))
        })
    }
}
