//! The module contains `Account` and its database entity.

use chrono::{DateTime, Utc};
use sea_orm::{ActiveValue, entity::prelude::*};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::{
    Currency, EngineError,
    util::{model_currency, parse_uuid},
};

/// An account.
///
/// A representation of a bank account, a wallet or anything else where money
/// is kept. `balance` is derived: it always equals `opening_balance` plus the
/// sum of the account's transactions once the logs are rebuilt.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Account {
    pub id: Uuid,
    pub user_id: Uuid,
    pub name: String,
    pub currency: Currency,
    pub opening_balance: i64,
    pub balance: i64,
    pub created_at: DateTime<Utc>,
}

impl Account {
    pub fn new(user_id: Uuid, name: String, currency: Currency, opening_balance: i64) -> Self {
        Self {
            id: Uuid::new_v4(),
            user_id,
            name,
            currency,
            opening_balance,
            balance: opening_balance,
            created_at: Utc::now(),
        }
    }
}

#[derive(Clone, Debug, PartialEq, DeriveEntityModel)]
#[sea_orm(table_name = "accounts")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: String,
    pub user_id: String,
    pub name: String,
    pub currency: String,
    pub opening_balance: i64,
    pub balance: i64,
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
    #[sea_orm(has_many = "super::transactions::Entity")]
    Transactions,
    #[sea_orm(has_many = "super::account_logs::Entity")]
    Logs,
}

impl Related<super::users::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Users.def()
    }
}

impl Related<super::transactions::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Transactions.def()
    }
}

impl Related<super::account_logs::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Logs.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}

impl From<&Account> for ActiveModel {
    fn from(value: &Account) -> Self {
        Self {
            id: ActiveValue::Set(value.id.to_string()),
            user_id: ActiveValue::Set(value.user_id.to_string()),
            name: ActiveValue::Set(value.name.clone()),
            currency: ActiveValue::Set(value.currency.code().to_string()),
            opening_balance: ActiveValue::Set(value.opening_balance),
            balance: ActiveValue::Set(value.balance),
            created_at: ActiveValue::Set(value.created_at),
        }
    }
}

impl TryFrom<Model> for Account {
    type Error = EngineError;

    fn try_from(model: Model) -> Result<Self, Self::Error> {
        Ok(Self {
            id: parse_uuid(&model.id, "account")?,
            user_id: parse_uuid(&model.user_id, "user")?,
            name: model.name,
            currency: model_currency(&model.currency)?,
            opening_balance: model.opening_balance,
            balance: model.balance,
            created_at: model.created_at,
        })
    }
}
