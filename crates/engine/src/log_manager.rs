//! Account log recomputation.
//!
//! Account logs are a projection of the transaction table: one row per
//! account and day, carrying the running balance. They are never patched in
//! place. A rebuild deletes every log from a given date onwards and replays
//! the transactions from that date, starting from the closing balance of the
//! last log it kept.

use std::collections::BTreeMap;

use chrono::NaiveDate;
use sea_orm::{
    ActiveValue, DatabaseConnection, QueryFilter, QueryOrder, TransactionTrait, prelude::*,
};
use uuid::Uuid;

use crate::{AccountLog, EngineError, ResultEngine, account_logs, accounts, transactions};

/// Recompute the logs of `account_id` starting at `from`.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct Rebuild {
    pub account_id: Uuid,
    pub from: NaiveDate,
}

/// Outcome of a rebuild.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct RebuildSummary {
    pub account_id: Uuid,
    pub from: Option<NaiveDate>,
    pub logs_written: usize,
    pub balance: i64,
}

/// Totals of a single day, before ids are assigned.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub(crate) struct DailyTotals {
    pub date: NaiveDate,
    pub opening_balance: i64,
    pub inflow: i64,
    pub outflow: i64,
    pub closing_balance: i64,
    pub transaction_count: i64,
}

/// Fold `(date, amount)` pairs into per-day running totals.
///
/// `entries` may come in any order; output is sorted by date and each day
/// opens at the previous day's close. Totals that do not fit an `i64` are
/// rejected with [`EngineError::InvalidAmount`].
pub(crate) fn project_daily_totals(
    starting_balance: i64,
    entries: impl IntoIterator<Item = (NaiveDate, i64)>,
) -> ResultEngine<Vec<DailyTotals>> {
    let overflow = || EngineError::InvalidAmount("amount too large".to_string());

    let mut per_day: BTreeMap<NaiveDate, (i64, i64, i64)> = BTreeMap::new();
    for (date, amount_minor) in entries {
        let (inflow, outflow, count) = per_day.entry(date).or_default();
        if amount_minor >= 0 {
            *inflow = inflow.checked_add(amount_minor).ok_or_else(overflow)?;
        } else {
            let spent = amount_minor.checked_neg().ok_or_else(overflow)?;
            *outflow = outflow.checked_add(spent).ok_or_else(overflow)?;
        }
        *count += 1;
    }

    let mut balance = starting_balance;
    let mut days = Vec::with_capacity(per_day.len());
    for (date, (inflow, outflow, transaction_count)) in per_day {
        let opening_balance = balance;
        balance = opening_balance
            .checked_add(inflow)
            .and_then(|v| v.checked_sub(outflow))
            .ok_or_else(overflow)?;
        days.push(DailyTotals {
            date,
            opening_balance,
            inflow,
            outflow,
            closing_balance: balance,
            transaction_count,
        });
    }
    Ok(days)
}

/// Merge rebuild requests so every account is rebuilt once, from the
/// earliest date any request asked for. Output is ordered by account id.
pub fn coalesce(requests: impl IntoIterator<Item = Rebuild>) -> Vec<Rebuild> {
    let mut earliest: BTreeMap<Uuid, NaiveDate> = BTreeMap::new();
    for request in requests {
        earliest
            .entry(request.account_id)
            .and_modify(|from| *from = (*from).min(request.from))
            .or_insert(request.from);
    }
    earliest
        .into_iter()
        .map(|(account_id, from)| Rebuild { account_id, from })
        .collect()
}

/// Owns the `account_logs` projection.
#[derive(Clone, Debug)]
pub struct AccountLogManager {
    database: DatabaseConnection,
}

impl AccountLogManager {
    pub fn new(database: DatabaseConnection) -> Self {
        Self { database }
    }

    /// Rebuild the logs of one account from `from` (everything when `None`)
    /// and refresh the account balance, in a single DB transaction.
    pub async fn rebuild_logs(
        &self,
        account_id: Uuid,
        from: Option<NaiveDate>,
    ) -> ResultEngine<RebuildSummary> {
        // Logs are a system-level projection, so no ownership scope applies.
        let db_tx = self.database.begin().await?;

        let account = accounts::Entity::find_by_id(account_id.to_string())
            .one(&db_tx)
            .await?
            .ok_or_else(|| EngineError::KeyNotFound("account not exists".to_string()))?;
        let user_id = crate::util::parse_uuid(&account.user_id, "user")?;

        let mut stale = account_logs::Entity::delete_many()
            .filter(account_logs::Column::AccountId.eq(account.id.clone()));
        if let Some(from) = from {
            stale = stale.filter(account_logs::Column::Date.gte(from));
        }
        stale.exec(&db_tx).await?;

        let starting_balance = match from {
            Some(from) => account_logs::Entity::find()
                .filter(account_logs::Column::AccountId.eq(account.id.clone()))
                .filter(account_logs::Column::Date.lt(from))
                .order_by_desc(account_logs::Column::Date)
                .one(&db_tx)
                .await?
                .map_or(account.opening_balance, |log| log.closing_balance),
            None => account.opening_balance,
        };

        let mut replay = transactions::Entity::find()
            .filter(transactions::Column::AccountId.eq(account.id.clone()))
            .order_by_asc(transactions::Column::OccurredOn)
            .order_by_asc(transactions::Column::CreatedAt)
            .order_by_asc(transactions::Column::Id);
        if let Some(from) = from {
            replay = replay.filter(transactions::Column::OccurredOn.gte(from));
        }
        let rows = replay.all(&db_tx).await?;

        let days = project_daily_totals(
            starting_balance,
            rows.iter().map(|tx| (tx.occurred_on, tx.amount_minor)),
        )?;
        for day in &days {
            let log = AccountLog {
                id: Uuid::new_v4(),
                user_id,
                account_id,
                date: day.date,
                opening_balance: day.opening_balance,
                inflow: day.inflow,
                outflow: day.outflow,
                closing_balance: day.closing_balance,
                transaction_count: day.transaction_count,
            };
            account_logs::ActiveModel::from(&log).insert(&db_tx).await?;
        }

        let balance = days
            .last()
            .map_or(starting_balance, |day| day.closing_balance);
        accounts::ActiveModel {
            id: ActiveValue::Set(account.id.clone()),
            balance: ActiveValue::Set(balance),
            ..Default::default()
        }
        .update(&db_tx)
        .await?;

        db_tx.commit().await?;

        tracing::debug!(
            %account_id,
            ?from,
            logs = days.len(),
            balance,
            "account logs rebuilt"
        );

        Ok(RebuildSummary {
            account_id,
            from,
            logs_written: days.len(),
            balance,
        })
    }

    /// Run a set of rebuild requests, one rebuild per account.
    ///
    /// Accounts deleted in the meantime are skipped: there is nothing left to
    /// project. A failing account does not stop the others; every failure is
    /// logged and the first one is returned once all accounts were tried.
    pub async fn apply(&self, requests: impl IntoIterator<Item = Rebuild>) -> ResultEngine<()> {
        let mut first_error = None;
        let mut failed = 0usize;
        for request in coalesce(requests) {
            match self
                .rebuild_logs(request.account_id, Some(request.from))
                .await
            {
                Ok(_) => {}
                Err(EngineError::KeyNotFound(_)) => {
                    tracing::info!(
                        account_id = %request.account_id,
                        "account vanished before its logs were rebuilt, skipping"
                    );
                }
                Err(err) => {
                    tracing::error!(
                        account_id = %request.account_id,
                        from = %request.from,
                        "account log rebuild failed: {err}"
                    );
                    failed += 1;
                    first_error.get_or_insert(err);
                }
            }
        }

        match first_error {
            Some(err) => {
                if failed > 1 {
                    tracing::warn!(failed, "several account log rebuilds failed");
                }
                Err(err)
            }
            None => Ok(()),
        }
    }

    /// Rebuild every account from scratch.
    pub async fn rebuild_all(&self) -> ResultEngine<Vec<RebuildSummary>> {
        let accounts = accounts::Entity::find()
            .order_by_asc(accounts::Column::Id)
            .all(&self.database)
            .await?;

        let mut summaries = Vec::with_capacity(accounts.len());
        for account in accounts {
            let account_id = crate::util::parse_uuid(&account.id, "account")?;
            summaries.push(self.rebuild_logs(account_id, None).await?);
        }
        Ok(summaries)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn day(d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2026, 3, d).unwrap()
    }

    #[test]
    fn no_entries_no_logs() {
        assert!(project_daily_totals(500, Vec::new()).unwrap().is_empty());
    }

    #[test]
    fn days_chain_running_balance() {
        let days =
            project_daily_totals(1000, vec![(day(2), -300), (day(1), 200), (day(2), 50)]).unwrap();

        assert_eq!(days.len(), 2);
        assert_eq!(
            days[0],
            DailyTotals {
                date: day(1),
                opening_balance: 1000,
                inflow: 200,
                outflow: 0,
                closing_balance: 1200,
                transaction_count: 1,
            }
        );
        assert_eq!(
            days[1],
            DailyTotals {
                date: day(2),
                opening_balance: 1200,
                inflow: 50,
                outflow: 300,
                closing_balance: 950,
                transaction_count: 2,
            }
        );
    }

    #[test]
    fn totals_that_do_not_fit_are_rejected() {
        let too_large = EngineError::InvalidAmount("amount too large".to_string());

        assert_eq!(
            project_daily_totals(0, vec![(day(1), i64::MAX), (day(1), i64::MAX)]).unwrap_err(),
            too_large
        );
        assert_eq!(
            project_daily_totals(0, vec![(day(1), i64::MIN)]).unwrap_err(),
            too_large
        );
        assert_eq!(
            project_daily_totals(i64::MAX, vec![(day(2), 1)]).unwrap_err(),
            too_large
        );
        // Same-day totals fit, but the running balance does not.
        assert_eq!(
            project_daily_totals(-10, vec![(day(1), i64::MAX), (day(2), -5)]).unwrap(),
            vec![
                DailyTotals {
                    date: day(1),
                    opening_balance: -10,
                    inflow: i64::MAX,
                    outflow: 0,
                    closing_balance: i64::MAX - 10,
                    transaction_count: 1,
                },
                DailyTotals {
                    date: day(2),
                    opening_balance: i64::MAX - 10,
                    inflow: 0,
                    outflow: 5,
                    closing_balance: i64::MAX - 15,
                    transaction_count: 1,
                },
            ]
        );
    }

    #[test]
    fn coalesce_keeps_earliest_date_per_account() {
        let a = Uuid::from_u128(1);
        let b = Uuid::from_u128(2);
        let merged = coalesce(vec![
            Rebuild {
                account_id: b,
                from: day(9),
            },
            Rebuild {
                account_id: a,
                from: day(5),
            },
            Rebuild {
                account_id: b,
                from: day(3),
            },
            Rebuild {
                account_id: a,
                from: day(7),
            },
        ]);
        assert_eq!(
            merged,
            vec![
                Rebuild {
                    account_id: a,
                    from: day(5),
                },
                Rebuild {
                    account_id: b,
                    from: day(3),
                },
            ]
        );
    }
}
