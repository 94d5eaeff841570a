//! User settings endpoints.

use api_types::settings::{UserSettings, UserSettingsUpdate};
use axum::{Extension, Json, extract::State};

use crate::{CurrentUser, ServerError, api_currency, engine_currency, server::ServerState};

fn view(settings: engine::UserSettings) -> UserSettings {
    UserSettings {
        currency: api_currency(settings.currency),
        locale: settings.locale,
        timezone: settings.timezone,
        date_format: settings.date_format,
    }
}

pub async fn get(
    Extension(user): Extension<CurrentUser>,
    State(state): State<ServerState>,
) -> Result<Json<UserSettings>, ServerError> {
    let settings = state.engine.user_settings(user.id).await?;
    Ok(Json(view(settings)))
}

/// Changes show up in the next token issued by `/login`.
pub async fn update(
    Extension(user): Extension<CurrentUser>,
    State(state): State<ServerState>,
    Json(payload): Json<UserSettingsUpdate>,
) -> Result<Json<UserSettings>, ServerError> {
    let patch = engine::UserSettingsPatch {
        currency: payload.currency.map(engine_currency),
        locale: payload.locale,
        timezone: payload.timezone,
        date_format: payload.date_format,
    };
    let settings = state.engine.update_user_settings(user.id, patch).await?;
    Ok(Json(view(settings)))
}
