//! Derived per-account daily logs.
//!
//! One row per account and calendar day with at least one transaction. Rows
//! are owned by [`crate::AccountLogManager`]: it deletes and re-inserts them,
//! nothing else writes to the table.

use chrono::NaiveDate;
use sea_orm::{ActiveValue, entity::prelude::*};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::{EngineError, util::parse_uuid};

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct AccountLog {
    pub id: Uuid,
    pub user_id: Uuid,
    pub account_id: Uuid,
    pub date: NaiveDate,
    pub opening_balance: i64,
    pub inflow: i64,
    pub outflow: i64,
    pub closing_balance: i64,
    pub transaction_count: i64,
}

#[derive(Clone, Debug, PartialEq, DeriveEntityModel)]
#[sea_orm(table_name = "account_logs")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: String,
    pub user_id: String,
    pub account_id: String,
    pub date: Date,
    pub opening_balance: i64,
    pub inflow: i64,
    pub outflow: i64,
    pub closing_balance: i64,
    pub transaction_count: i64,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::accounts::Entity",
        from = "Column::AccountId",
        to = "super::accounts::Column::Id",
        on_update = "NoAction",
        on_delete = "Cascade"
    )]
    Accounts,
}

impl Related<super::accounts::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Accounts.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}

impl From<&AccountLog> for ActiveModel {
    fn from(log: &AccountLog) -> Self {
        Self {
            id: ActiveValue::Set(log.id.to_string()),
            user_id: ActiveValue::Set(log.user_id.to_string()),
            account_id: ActiveValue::Set(log.account_id.to_string()),
            date: ActiveValue::Set(log.date),
            opening_balance: ActiveValue::Set(log.opening_balance),
            inflow: ActiveValue::Set(log.inflow),
            outflow: ActiveValue::Set(log.outflow),
            closing_balance: ActiveValue::Set(log.closing_balance),
            transaction_count: ActiveValue::Set(log.transaction_count),
        }
    }
}

impl TryFrom<Model> for AccountLog {
    type Error = EngineError;

    fn try_from(model: Model) -> Result<Self, Self::Error> {
        Ok(Self {
            id: parse_uuid(&model.id, "account log")?,
            user_id: parse_uuid(&model.user_id, "user")?,
            account_id: parse_uuid(&model.account_id, "account")?,
            date: model.date,
            opening_balance: model.opening_balance,
            inflow: model.inflow,
            outflow: model.outflow,
            closing_balance: model.closing_balance,
            transaction_count: model.transaction_count,
        })
    }
}
