use sea_orm::{QueryFilter, QueryOrder, prelude::*};
use uuid::Uuid;

use crate::{
    AccountLog, Page, PageRequest, RebuildSummary, ResultEngine, Scope, account_logs, paginate,
    ownership::OwnedQuery,
};

use super::Engine;

impl Engine {
    /// Daily logs of an account visible in `scope`, newest first.
    pub async fn account_logs(
        &self,
        scope: &Scope,
        account_id: Uuid,
        request: PageRequest,
    ) -> ResultEngine<Page<AccountLog>> {
        self.require_account(&self.database, scope, account_id)
            .await?;

        let query = account_logs::Entity::find()
            .scoped(scope)
            .filter(account_logs::Column::AccountId.eq(account_id.to_string()))
            .order_by_desc(account_logs::Column::Date);
        paginate(query, &self.database, request)
            .await?
            .try_map(AccountLog::try_from)
    }

    /// Rebuild every log of an account now, bypassing the message queue.
    pub async fn rebuild_account_logs(
        &self,
        scope: &Scope,
        account_id: Uuid,
    ) -> ResultEngine<RebuildSummary> {
        self.require_account(&self.database, scope, account_id)
            .await?;
        self.log_manager().rebuild_logs(account_id, None).await
    }
}
