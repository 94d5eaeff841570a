//! Asynchronous account-log jobs.
//!
//! Transaction mutations emit one of three envelopes after their DB commit.
//! The envelopes travel over a [`MessageBus`] to a [`LogWorker`], which hands
//! them to the matching [`MessageHandler`] and rebuilds the affected account
//! logs outside the request that caused them.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

mod bus;
mod handlers;

pub use bus::{LogWorker, MessageBus, log_pipeline};
pub use handlers::{
    LogMessageRouter, MessageHandler, TransactionCreatedHandler, TransactionRemovedHandler,
    TransactionUpdatedHandler,
};

/// A transaction was booked.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct TransactionCreated {
    pub transaction_id: Uuid,
    pub account_id: Uuid,
    pub occurred_on: NaiveDate,
}

/// A transaction changed. The `previous_*` fields describe it before the
/// update so both the old and the new position can be recomputed.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct TransactionUpdated {
    pub transaction_id: Uuid,
    pub account_id: Uuid,
    pub occurred_on: NaiveDate,
    pub previous_account_id: Uuid,
    pub previous_occurred_on: NaiveDate,
}

/// A transaction was deleted.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct TransactionRemoved {
    pub transaction_id: Uuid,
    pub account_id: Uuid,
    pub occurred_on: NaiveDate,
}

/// Every envelope the log worker understands.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum AccountLogMessage {
    TransactionCreated(TransactionCreated),
    TransactionUpdated(TransactionUpdated),
    TransactionRemoved(TransactionRemoved),
}

impl AccountLogMessage {
    pub fn transaction_id(&self) -> Uuid {
        match self {
            Self::TransactionCreated(m) => m.transaction_id,
            Self::TransactionUpdated(m) => m.transaction_id,
            Self::TransactionRemoved(m) => m.transaction_id,
        }
    }

    pub fn kind(&self) -> &'static str {
        match self {
            Self::TransactionCreated(_) => "transaction_created",
            Self::TransactionUpdated(_) => "transaction_updated",
            Self::TransactionRemoved(_) => "transaction_removed",
        }
    }
}

impl From<TransactionCreated> for AccountLogMessage {
    fn from(value: TransactionCreated) -> Self {
        Self::TransactionCreated(value)
    }
}

impl From<TransactionUpdated> for AccountLogMessage {
    fn from(value: TransactionUpdated) -> Self {
        Self::TransactionUpdated(value)
    }
}

impl From<TransactionRemoved> for AccountLogMessage {
    fn from(value: TransactionRemoved) -> Self {
        Self::TransactionRemoved(value)
    }
}
