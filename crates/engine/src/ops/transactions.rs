use sea_orm::{ActiveValue, QueryFilter, QueryOrder, TransactionTrait, prelude::*};
use uuid::Uuid;

use crate::{
    CreateTransactionCmd, EngineError, Page, PageRequest, ResultEngine, Scope, Transaction,
    TransactionCreated, TransactionListFilter, TransactionRemoved, TransactionUpdated,
    UpdateTransactionCmd, paginate,
    ownership::OwnedQuery,
    transactions::{self, validate_amount},
    util::normalize_optional_text,
};

use super::{Engine, with_tx};

fn validate_list_filter(filter: &TransactionListFilter) -> ResultEngine<()> {
    if let (Some(from), Some(to)) = (filter.from, filter.to)
        && from > to
    {
        return Err(EngineError::InvalidFilter(
            "invalid range: from must be <= to".to_string(),
        ));
    }
    Ok(())
}

impl Engine {
    async fn require_transaction<C: ConnectionTrait>(
        &self,
        db: &C,
        scope: &Scope,
        transaction_id: Uuid,
    ) -> ResultEngine<transactions::Model> {
        transactions::Entity::find_by_id(transaction_id.to_string())
            .scoped(scope)
            .one(db)
            .await?
            .ok_or_else(|| EngineError::KeyNotFound("transaction not exists".to_string()))
    }

    /// Book a transaction and schedule the log rebuild of its account.
    pub async fn create_transaction(&self, cmd: CreateTransactionCmd) -> ResultEngine<Transaction> {
        let scope = Scope::User(cmd.user_id);
        let tx = Transaction::new(
            cmd.user_id,
            cmd.account_id,
            cmd.amount_minor,
            cmd.occurred_on,
            normalize_optional_text(cmd.description.as_deref()),
        )?;

        let tx = with_tx!(self, |db_tx| {
            self.require_account(&db_tx, &scope, cmd.account_id).await?;
            transactions::ActiveModel::from(&tx).insert(&db_tx).await?;
            Ok::<_, EngineError>(tx)
        })?;

        self.dispatch(TransactionCreated {
            transaction_id: tx.id,
            account_id: tx.account_id,
            occurred_on: tx.occurred_on,
        });
        Ok(tx)
    }

    pub async fn transaction(
        &self,
        scope: &Scope,
        transaction_id: Uuid,
    ) -> ResultEngine<Transaction> {
        let model = self
            .require_transaction(&self.database, scope, transaction_id)
            .await?;
        Transaction::try_from(model)
    }

    /// Transactions visible in `scope`, newest first.
    ///
    /// Filtering by an account outside the scope is reported as a missing
    /// account rather than an empty page.
    pub async fn list_transactions(
        &self,
        scope: &Scope,
        filter: &TransactionListFilter,
        request: PageRequest,
    ) -> ResultEngine<Page<Transaction>> {
        validate_list_filter(filter)?;

        let mut query = transactions::Entity::find()
            .scoped(scope)
            .order_by_desc(transactions::Column::OccurredOn)
            .order_by_desc(transactions::Column::CreatedAt)
            .order_by_desc(transactions::Column::Id);

        if let Some(account_id) = filter.account_id {
            self.require_account(&self.database, scope, account_id)
                .await?;
            query = query.filter(transactions::Column::AccountId.eq(account_id.to_string()));
        }
        if let Some(from) = filter.from {
            query = query.filter(transactions::Column::OccurredOn.gte(from));
        }
        if let Some(to) = filter.to {
            query = query.filter(transactions::Column::OccurredOn.lte(to));
        }

        paginate(query, &self.database, request)
            .await?
            .try_map(Transaction::try_from)
    }

    /// Change a transaction and schedule the rebuild of both its previous and
    /// its new position.
    pub async fn update_transaction(
        &self,
        scope: &Scope,
        transaction_id: Uuid,
        cmd: UpdateTransactionCmd,
    ) -> ResultEngine<Transaction> {
        if let Some(amount_minor) = cmd.amount_minor {
            validate_amount(amount_minor)?;
        }

        let (previous, updated) = with_tx!(self, |db_tx| {
            let model = self
                .require_transaction(&db_tx, scope, transaction_id)
                .await?;
            let previous = Transaction::try_from(model.clone())?;

            let mut active: transactions::ActiveModel = model.into();
            if let Some(account_id) = cmd.account_id {
                // A transaction only moves between accounts of its owner.
                self.require_account(&db_tx, &Scope::User(previous.user_id), account_id)
                    .await?;
                active.account_id = ActiveValue::Set(account_id.to_string());
            }
            if let Some(amount_minor) = cmd.amount_minor {
                active.amount_minor = ActiveValue::Set(amount_minor);
            }
            if let Some(occurred_on) = cmd.occurred_on {
                active.occurred_on = ActiveValue::Set(occurred_on);
            }
            if let Some(description) = cmd.description {
                active.description =
                    ActiveValue::Set(normalize_optional_text(description.as_deref()));
            }

            let updated = Transaction::try_from(active.update(&db_tx).await?)?;
            Ok::<_, EngineError>((previous, updated))
        })?;

        self.dispatch(TransactionUpdated {
            transaction_id: updated.id,
            account_id: updated.account_id,
            occurred_on: updated.occurred_on,
            previous_account_id: previous.account_id,
            previous_occurred_on: previous.occurred_on,
        });
        Ok(updated)
    }

    /// Delete a transaction and schedule the log rebuild of its account.
    pub async fn remove_transaction(
        &self,
        scope: &Scope,
        transaction_id: Uuid,
    ) -> ResultEngine<Transaction> {
        let removed = with_tx!(self, |db_tx| {
            let model = self
                .require_transaction(&db_tx, scope, transaction_id)
                .await?;
            let removed = Transaction::try_from(model)?;
            transactions::Entity::delete_many()
                .scoped(scope)
                .filter(transactions::Column::Id.eq(transaction_id.to_string()))
                .exec(&db_tx)
                .await?;
            Ok::<_, EngineError>(removed)
        })?;

        self.dispatch(TransactionRemoved {
            transaction_id: removed.id,
            account_id: removed.account_id,
            occurred_on: removed.occurred_on,
        });
        Ok(removed)
    }
}

#[cfg(test)]
mod tests {
    use chrono::NaiveDate;

    use super::*;

    #[test]
    fn inverted_range_is_rejected() {
        let filter = TransactionListFilter {
            account_id: None,
            from: NaiveDate::from_ymd_opt(2026, 5, 2),
            to: NaiveDate::from_ymd_opt(2026, 5, 1),
        };
        assert!(matches!(
            validate_list_filter(&filter),
            Err(EngineError::InvalidFilter(_))
        ));
    }

    #[test]
    fn single_day_range_is_allowed() {
        let day = NaiveDate::from_ymd_opt(2026, 5, 1);
        let filter = TransactionListFilter {
            account_id: None,
            from: day,
            to: day,
        };
        assert!(validate_list_filter(&filter).is_ok());
    }
}
