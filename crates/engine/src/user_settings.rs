//! User preferences.
//!
//! A user without a stored row gets [`UserSettings::default`]; rows are only
//! written on the first update.

use chrono::format::{Item, StrftimeItems};
use sea_orm::{ActiveValue, entity::prelude::*};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::{Currency, EngineError, ResultEngine, util::model_currency};

pub const DEFAULT_LOCALE: &str = "en";
pub const DEFAULT_TIMEZONE: &str = "UTC";
pub const DEFAULT_DATE_FORMAT: &str = "%Y-%m-%d";

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserSettings {
    pub currency: Currency,
    pub locale: String,
    pub timezone: String,
    pub date_format: String,
}

impl Default for UserSettings {
    fn default() -> Self {
        Self {
            currency: Currency::default(),
            locale: DEFAULT_LOCALE.to_string(),
            timezone: DEFAULT_TIMEZONE.to_string(),
            date_format: DEFAULT_DATE_FORMAT.to_string(),
        }
    }
}

/// Partial update; `None` keeps the current value.
#[derive(Clone, Debug, Default)]
pub struct UserSettingsPatch {
    pub currency: Option<Currency>,
    pub locale: Option<String>,
    pub timezone: Option<String>,
    pub date_format: Option<String>,
}

impl UserSettings {
    /// Apply `patch` on top of `self`, validating every changed field.
    pub fn merged(mut self, patch: UserSettingsPatch) -> ResultEngine<Self> {
        if let Some(currency) = patch.currency {
            self.currency = currency;
        }
        if let Some(locale) = patch.locale {
            self.locale = validate_locale(&locale)?;
        }
        if let Some(timezone) = patch.timezone {
            self.timezone = validate_timezone(&timezone)?;
        }
        if let Some(date_format) = patch.date_format {
            self.date_format = validate_date_format(&date_format)?;
        }
        Ok(self)
    }
}

fn validate_locale(value: &str) -> ResultEngine<String> {
    let trimmed = value.trim();
    let well_formed = !trimmed.is_empty()
        && trimmed
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_');
    if !well_formed {
        return Err(EngineError::InvalidSettings(format!(
            "invalid locale: {value}"
        )));
    }
    Ok(trimmed.to_string())
}

fn validate_timezone(value: &str) -> ResultEngine<String> {
    let trimmed = value.trim();
    trimmed
        .parse::<chrono_tz::Tz>()
        .map(|tz| tz.name().to_string())
        .map_err(|_| EngineError::InvalidSettings(format!("invalid timezone: {value}")))
}

fn validate_date_format(value: &str) -> ResultEngine<String> {
    if value.trim().is_empty() || StrftimeItems::new(value).any(|item| item == Item::Error) {
        return Err(EngineError::InvalidSettings(format!(
            "invalid date format: {value}"
        )));
    }
    Ok(value.to_string())
}

#[derive(Clone, Debug, PartialEq, DeriveEntityModel)]
#[sea_orm(table_name = "user_settings")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub user_id: String,
    pub currency: String,
    pub locale: String,
    pub timezone: String,
    pub date_format: String,
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
}

impl Related<super::users::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Users.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}

impl ActiveModel {
    pub(crate) fn from_settings(user_id: Uuid, settings: &UserSettings) -> Self {
        Self {
            user_id: ActiveValue::Set(user_id.to_string()),
            currency: ActiveValue::Set(settings.currency.code().to_string()),
            locale: ActiveValue::Set(settings.locale.clone()),
            timezone: ActiveValue::Set(settings.timezone.clone()),
            date_format: ActiveValue::Set(settings.date_format.clone()),
        }
    }
}

impl TryFrom<Model> for UserSettings {
    type Error = EngineError;

    fn try_from(model: Model) -> Result<Self, Self::Error> {
        Ok(Self {
            currency: model_currency(&model.currency)?,
            locale: model.locale,
            timezone: model.timezone,
            date_format: model.date_format,
        })
    }
}
