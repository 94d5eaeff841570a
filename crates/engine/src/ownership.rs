//! Row-level ownership scoping.
//!
//! Entities that carry an owning-user column implement [`Ownable`]. Every
//! query the engine runs against them goes through [`OwnedQuery::scoped`],
//! which appends `owner = <user>` for [`Scope::User`] and leaves the query
//! untouched for [`Scope::System`] (background workers, admin tooling).

use sea_orm::{ColumnTrait, DeleteMany, EntityTrait, QueryFilter, Select};
use uuid::Uuid;

/// Who a query runs on behalf of.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Scope {
    /// Restrict every ownable row to the ones owned by this user.
    User(Uuid),
    /// Unrestricted access.
    System,
}

/// An entity carrying an owning-user reference.
pub trait Ownable: EntityTrait {
    fn owner_column() -> Self::Column;
}

/// Installs the ownership predicate on a query.
pub trait OwnedQuery: Sized {
    #[must_use]
    fn scoped(self, scope: &Scope) -> Self;
}

impl<E: Ownable> OwnedQuery for Select<E> {
    fn scoped(self, scope: &Scope) -> Self {
        match scope {
            Scope::User(id) => self.filter(E::owner_column().eq(id.to_string())),
            Scope::System => self,
        }
    }
}

impl<E: Ownable> OwnedQuery for DeleteMany<E> {
    fn scoped(self, scope: &Scope) -> Self {
        match scope {
            Scope::User(id) => self.filter(E::owner_column().eq(id.to_string())),
            Scope::System => self,
        }
    }
}

impl Ownable for crate::accounts::Entity {
    fn owner_column() -> Self::Column {
        crate::accounts::Column::UserId
    }
}

impl Ownable for crate::transactions::Entity {
    fn owner_column() -> Self::Column {
        crate::transactions::Column::UserId
    }
}

impl Ownable for crate::account_logs::Entity {
    fn owner_column() -> Self::Column {
        crate::account_logs::Column::UserId
    }
}

#[cfg(test)]
mod tests {
    use sea_orm::{DbBackend, QueryTrait};

    use super::*;
    use crate::accounts;

    #[test]
    fn user_scope_adds_owner_predicate() {
        let id = Uuid::nil();
        let sql = accounts::Entity::find()
            .scoped(&Scope::User(id))
            .build(DbBackend::Sqlite)
            .to_string();
        assert!(sql.contains(&format!(
            "\"accounts\".\"user_id\" = '{}'",
            Uuid::nil()
        )));
    }

    #[test]
    fn system_scope_leaves_query_untouched() {
        let scoped = accounts::Entity::find()
            .scoped(&Scope::System)
            .build(DbBackend::Sqlite)
            .to_string();
        let plain = accounts::Entity::find().build(DbBackend::Sqlite).to_string();
        assert_eq!(scoped, plain);
    }
}
