use sea_orm::{DatabaseTransaction, QueryFilter, QueryOrder, TransactionTrait, prelude::*};
use uuid::Uuid;

use crate::{
    Account, CreateAccountCmd, EngineError, Page, PageRequest, ResultEngine, Scope, account_logs,
    accounts, paginate, transactions, user_settings, users,
    ownership::OwnedQuery,
    util::normalize_required_name,
};

use super::{Engine, with_tx};

impl Engine {
    /// Fetch the account row visible in `scope`.
    ///
    /// Accounts owned by someone else are reported as missing.
    pub(super) async fn require_account<C: ConnectionTrait>(
        &self,
        db: &C,
        scope: &Scope,
        account_id: Uuid,
    ) -> ResultEngine<accounts::Model> {
        accounts::Entity::find_by_id(account_id.to_string())
            .scoped(scope)
            .one(db)
            .await?
            .ok_or_else(|| EngineError::KeyNotFound("account not exists".to_string()))
    }

    async fn require_unique_account_name(
        &self,
        db: &DatabaseTransaction,
        user_id: &str,
        name: &str,
        except: Option<&str>,
    ) -> ResultEngine<()> {
        let mut query = accounts::Entity::find()
            .filter(accounts::Column::UserId.eq(user_id))
            .filter(accounts::Column::Name.eq(name));
        if let Some(id) = except {
            query = query.filter(accounts::Column::Id.ne(id));
        }
        if query.one(db).await?.is_some() {
            return Err(EngineError::ExistingKey(name.to_string()));
        }
        Ok(())
    }

    /// Open a new account.
    ///
    /// When no currency is given the owner's preferred one is used.
    pub async fn create_account(&self, cmd: CreateAccountCmd) -> ResultEngine<Account> {
        let name = normalize_required_name(&cmd.name, "account")?;
        let owner = cmd.user_id.to_string();

        with_tx!(self, |db_tx| {
            if users::Entity::find_by_id(owner.clone())
                .one(&db_tx)
                .await?
                .is_none()
            {
                return Err(EngineError::KeyNotFound("user not exists".to_string()));
            }
            self.require_unique_account_name(&db_tx, &owner, &name, None)
                .await?;

            let currency = match cmd.currency {
                Some(currency) => currency,
                None => user_settings::Entity::find_by_id(owner.clone())
                    .one(&db_tx)
                    .await?
                    .map(crate::UserSettings::try_from)
                    .transpose()?
                    .unwrap_or_default()
                    .currency,
            };

            let account = Account::new(cmd.user_id, name, currency, cmd.opening_balance);
            accounts::ActiveModel::from(&account).insert(&db_tx).await?;
            tracing::info!(account_id = %account.id, "account created");
            Ok(account)
        })
    }

    pub async fn account(&self, scope: &Scope, account_id: Uuid) -> ResultEngine<Account> {
        let model = self
            .require_account(&self.database, scope, account_id)
            .await?;
        Account::try_from(model)
    }

    /// Accounts visible in `scope`, ordered by name.
    pub async fn list_accounts(
        &self,
        scope: &Scope,
        request: PageRequest,
    ) -> ResultEngine<Page<Account>> {
        let query = accounts::Entity::find()
            .scoped(scope)
            .order_by_asc(accounts::Column::Name)
            .order_by_asc(accounts::Column::Id);
        paginate(query, &self.database, request)
            .await?
            .try_map(Account::try_from)
    }

    pub async fn rename_account(
        &self,
        scope: &Scope,
        account_id: Uuid,
        name: &str,
    ) -> ResultEngine<Account> {
        let name = normalize_required_name(name, "account")?;

        with_tx!(self, |db_tx| {
            let model = self.require_account(&db_tx, scope, account_id).await?;
            self.require_unique_account_name(&db_tx, &model.user_id, &name, Some(&model.id))
                .await?;

            let mut active: accounts::ActiveModel = model.into();
            active.name = sea_orm::ActiveValue::Set(name);
            let updated = active.update(&db_tx).await?;
            Account::try_from(updated)
        })
    }

    /// Delete an account together with its transactions and logs.
    pub async fn delete_account(&self, scope: &Scope, account_id: Uuid) -> ResultEngine<()> {
        with_tx!(self, |db_tx| {
            let model = self.require_account(&db_tx, scope, account_id).await?;

            account_logs::Entity::delete_many()
                .scoped(scope)
                .filter(account_logs::Column::AccountId.eq(model.id.clone()))
                .exec(&db_tx)
                .await?;
            transactions::Entity::delete_many()
                .scoped(scope)
                .filter(transactions::Column::AccountId.eq(model.id.clone()))
                .exec(&db_tx)
                .await?;
            accounts::Entity::delete_by_id(model.id).exec(&db_tx).await?;

            tracing::info!(%account_id, "account deleted");
            Ok(())
        })
    }
}
