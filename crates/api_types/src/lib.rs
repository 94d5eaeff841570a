use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Currency {
    #[default]
    Eur,
    Usd,
    Gbp,
    Chf,
    Jpy,
}

/// Query string accepted by every paginated endpoint.
#[derive(Clone, Copy, Debug, Default, Serialize, Deserialize)]
pub struct PageQuery {
    pub page: Option<u64>,
    pub per_page: Option<u64>,
}

/// One page of a listing.
#[derive(Debug, Serialize, Deserialize)]
pub struct PageResponse<T> {
    pub items: Vec<T>,
    pub page: u64,
    pub per_page: u64,
    pub total_items: u64,
    pub total_pages: u64,
}

pub mod auth {
    use super::*;

    #[derive(Debug, Serialize, Deserialize)]
    pub struct Login {
        pub username: String,
        pub password: String,
    }

    #[derive(Debug, Serialize, Deserialize)]
    pub struct LoginResponse {
        /// Signed HS256 token, to be sent back as `Authorization: Bearer`.
        pub token: String,
        pub expires_at: DateTime<Utc>,
    }
}

pub mod settings {
    use super::*;

    #[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
    pub struct UserSettings {
        pub currency: Currency,
        pub locale: String,
        pub timezone: String,
        pub date_format: String,
    }

    /// Partial update: missing fields are left untouched.
    #[derive(Debug, Default, Serialize, Deserialize)]
    pub struct UserSettingsUpdate {
        pub currency: Option<Currency>,
        pub locale: Option<String>,
        pub timezone: Option<String>,
        pub date_format: Option<String>,
    }
}

pub mod account {
    use super::*;

    #[derive(Debug, Serialize, Deserialize)]
    pub struct AccountNew {
        pub name: String,
        /// Defaults to the user's preferred currency.
        pub currency: Option<Currency>,
        #[serde(default)]
        pub opening_balance_minor: i64,
    }

    #[derive(Debug, Serialize, Deserialize)]
    pub struct AccountRename {
        pub name: String,
    }

    #[derive(Debug, Serialize, Deserialize)]
    pub struct AccountView {
        pub id: Uuid,
        pub name: String,
        pub currency: Currency,
        pub opening_balance_minor: i64,
        pub balance_minor: i64,
        pub created_at: DateTime<Utc>,
    }
}

pub mod transaction {
    use super::*;

    #[derive(Debug, Serialize, Deserialize)]
    pub struct TransactionNew {
        pub account_id: Uuid,
        /// Signed amount: positive is income, negative is expense.
        pub amount_minor: i64,
        pub occurred_on: NaiveDate,
        pub description: Option<String>,
    }

    /// Partial update of a transaction.
    ///
    /// `description: null` clears the description, while a missing
    /// `description` keeps it.
    #[derive(Debug, Default, Serialize, Deserialize)]
    pub struct TransactionUpdate {
        pub account_id: Option<Uuid>,
        pub amount_minor: Option<i64>,
        pub occurred_on: Option<NaiveDate>,
        #[serde(
            default,
            skip_serializing_if = "Option::is_none",
            with = "double_option"
        )]
        pub description: Option<Option<String>>,
    }

    #[derive(Debug, Default, Serialize, Deserialize)]
    pub struct TransactionListQuery {
        pub account_id: Option<Uuid>,
        pub from: Option<NaiveDate>,
        pub to: Option<NaiveDate>,
        pub page: Option<u64>,
        pub per_page: Option<u64>,
    }

    #[derive(Debug, Serialize, Deserialize)]
    pub struct TransactionView {
        pub id: Uuid,
        pub account_id: Uuid,
        pub amount_minor: i64,
        pub occurred_on: NaiveDate,
        pub description: Option<String>,
        pub created_at: DateTime<Utc>,
    }

    mod double_option {
        use serde::{Deserialize, Deserializer, Serialize, Serializer};

        pub fn serialize<S>(value: &Option<Option<String>>, serializer: S) -> Result<S::Ok, S::Error>
        where
            S: Serializer,
        {
            match value {
                Some(inner) => inner.serialize(serializer),
                None => serializer.serialize_none(),
            }
        }

        pub fn deserialize<'de, D>(deserializer: D) -> Result<Option<Option<String>>, D::Error>
        where
            D: Deserializer<'de>,
        {
            Option::<String>::deserialize(deserializer).map(Some)
        }
    }
}

pub mod log {
    use super::*;

    #[derive(Debug, Serialize, Deserialize)]
    pub struct AccountLogView {
        pub date: NaiveDate,
        pub opening_balance_minor: i64,
        pub inflow_minor: i64,
        pub outflow_minor: i64,
        pub closing_balance_minor: i64,
        pub transaction_count: i64,
    }

    #[derive(Debug, Serialize, Deserialize)]
    pub struct RebuildResponse {
        pub account_id: Uuid,
        pub logs_written: usize,
        pub balance_minor: i64,
    }
}

#[cfg(test)]
mod tests {
    use super::transaction::TransactionUpdate;

    #[test]
    fn update_distinguishes_null_from_missing_description() {
        let missing: TransactionUpdate = serde_json::from_str(r#"{"amount_minor": 5}"#).unwrap();
        assert_eq!(missing.description, None);

        let cleared: TransactionUpdate = serde_json::from_str(r#"{"description": null}"#).unwrap();
        assert_eq!(cleared.description, Some(None));

        let set: TransactionUpdate = serde_json::from_str(r#"{"description": "rent"}"#).unwrap();
        assert_eq!(set.description, Some(Some("rent".to_string())));
    }
}
