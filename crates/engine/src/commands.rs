//! Command structs for engine operations.
//!
//! These types group parameters for write operations, keeping call sites
//! readable and avoiding long argument lists.

use chrono::NaiveDate;
use uuid::Uuid;

use crate::Currency;

/// Create an account for a user.
#[derive(Clone, Debug)]
pub struct CreateAccountCmd {
    pub user_id: Uuid,
    pub name: String,
    /// `None` picks the owner's preferred currency.
    pub currency: Option<Currency>,
    pub opening_balance: i64,
}

impl CreateAccountCmd {
    #[must_use]
    pub fn new(user_id: Uuid, name: impl Into<String>) -> Self {
        Self {
            user_id,
            name: name.into(),
            currency: None,
            opening_balance: 0,
        }
    }

    #[must_use]
    pub fn currency(mut self, currency: Currency) -> Self {
        self.currency = Some(currency);
        self
    }

    #[must_use]
    pub fn opening_balance(mut self, opening_balance: i64) -> Self {
        self.opening_balance = opening_balance;
        self
    }
}

/// Book a transaction on an account the user owns.
#[derive(Clone, Debug)]
pub struct CreateTransactionCmd {
    pub user_id: Uuid,
    pub account_id: Uuid,
    pub amount_minor: i64,
    pub occurred_on: NaiveDate,
    pub description: Option<String>,
}

impl CreateTransactionCmd {
    #[must_use]
    pub fn new(user_id: Uuid, account_id: Uuid, amount_minor: i64, occurred_on: NaiveDate) -> Self {
        Self {
            user_id,
            account_id,
            amount_minor,
            occurred_on,
            description: None,
        }
    }

    #[must_use]
    pub fn description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }
}

/// Partial update of a transaction; `None` keeps the current value.
#[derive(Clone, Debug, Default)]
pub struct UpdateTransactionCmd {
    pub account_id: Option<Uuid>,
    pub amount_minor: Option<i64>,
    pub occurred_on: Option<NaiveDate>,
    /// `Some(None)` clears the description.
    pub description: Option<Option<String>>,
}

impl UpdateTransactionCmd {
    #[must_use]
    pub fn account_id(mut self, account_id: Uuid) -> Self {
        self.account_id = Some(account_id);
        self
    }

    #[must_use]
    pub fn amount_minor(mut self, amount_minor: i64) -> Self {
        self.amount_minor = Some(amount_minor);
        self
    }

    #[must_use]
    pub fn occurred_on(mut self, occurred_on: NaiveDate) -> Self {
        self.occurred_on = Some(occurred_on);
        self
    }

    #[must_use]
    pub fn description(mut self, description: Option<String>) -> Self {
        self.description = Some(description);
        self
    }
}

/// Filters for listing transactions.
///
/// `from` and `to` are both inclusive calendar dates.
#[derive(Clone, Debug, Default)]
pub struct TransactionListFilter {
    pub account_id: Option<Uuid>,
    pub from: Option<NaiveDate>,
    pub to: Option<NaiveDate>,
}
