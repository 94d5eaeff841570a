//! Transaction primitives.
//!
//! A `Transaction` is a signed amount booked on one account at a calendar
//! date: positive amounts are money in, negative amounts money out.

use chrono::{DateTime, NaiveDate, Utc};
use sea_orm::{ActiveValue, entity::prelude::*};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::{EngineError, ResultEngine, util::parse_uuid};

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Transaction {
    pub id: Uuid,
    pub user_id: Uuid,
    pub account_id: Uuid,
    pub amount_minor: i64,
    pub occurred_on: NaiveDate,
    pub description: Option<String>,
    pub created_at: DateTime<Utc>,
}

impl Transaction {
    pub fn new(
        user_id: Uuid,
        account_id: Uuid,
        amount_minor: i64,
        occurred_on: NaiveDate,
        description: Option<String>,
    ) -> ResultEngine<Self> {
        validate_amount(amount_minor)?;
        Ok(Self {
            id: Uuid::new_v4(),
            user_id,
            account_id,
            amount_minor,
            occurred_on,
            description,
            created_at: Utc::now(),
        })
    }
}

pub(crate) fn validate_amount(amount_minor: i64) -> ResultEngine<()> {
    if amount_minor == 0 {
        return Err(EngineError::InvalidAmount(
            "amount_minor must not be 0".to_string(),
        ));
    }
    // Its magnitude has no positive `i64` counterpart.
    if amount_minor == i64::MIN {
        return Err(EngineError::InvalidAmount("amount too large".to_string()));
    }
    Ok(())
}

#[derive(Clone, Debug, PartialEq, DeriveEntityModel)]
#[sea_orm(table_name = "transactions")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: String,
    pub user_id: String,
    pub account_id: String,
    pub amount_minor: i64,
    pub occurred_on: Date,
    pub description: Option<String>,
    pub created_at: DateTimeUtc,
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

impl From<&Transaction> for ActiveModel {
    fn from(tx: &Transaction) -> Self {
        Self {
            id: ActiveValue::Set(tx.id.to_string()),
            user_id: ActiveValue::Set(tx.user_id.to_string()),
            account_id: ActiveValue::Set(tx.account_id.to_string()),
            amount_minor: ActiveValue::Set(tx.amount_minor),
            occurred_on: ActiveValue::Set(tx.occurred_on),
            description: ActiveValue::Set(tx.description.clone()),
            created_at: ActiveValue::Set(tx.created_at),
        }
    }
}

impl TryFrom<Model> for Transaction {
    type Error = EngineError;

    fn try_from(model: Model) -> Result<Self, Self::Error> {
        Ok(Self {
            id: parse_uuid(&model.id, "transaction")?,
            user_id: parse_uuid(&model.user_id, "user")?,
            account_id: parse_uuid(&model.account_id, "account")?,
            amount_minor: model.amount_minor,
            occurred_on: model.occurred_on,
            description: model.description,
            created_at: model.created_at,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn zero_amount_is_rejected() {
        let date = NaiveDate::from_ymd_opt(2026, 1, 1).unwrap();
        let err = Transaction::new(Uuid::new_v4(), Uuid::new_v4(), 0, date, None).unwrap_err();
        assert_eq!(
            err,
            EngineError::InvalidAmount("amount_minor must not be 0".to_string())
        );
    }

    #[test]
    fn most_negative_amount_is_rejected() {
        let date = NaiveDate::from_ymd_opt(2026, 1, 1).unwrap();
        let err =
            Transaction::new(Uuid::new_v4(), Uuid::new_v4(), i64::MIN, date, None).unwrap_err();
        assert_eq!(err, EngineError::InvalidAmount("amount too large".to_string()));
    }

    #[test]
    fn negative_amounts_are_expenses() {
        let date = NaiveDate::from_ymd_opt(2026, 1, 1).unwrap();
        let tx = Transaction::new(Uuid::new_v4(), Uuid::new_v4(), -1250, date, None).unwrap();
        assert_eq!(tx.amount_minor, -1250);
    }
}
