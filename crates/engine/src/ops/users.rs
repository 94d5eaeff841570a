use sea_orm::{QueryFilter, TransactionTrait, prelude::*};
use uuid::Uuid;

use crate::{
    EngineError, ResultEngine, User, UserSettings, UserSettingsPatch, user_settings,
    users::{self, hash_password, verify_password},
    util::normalize_required_name,
};

use super::{Engine, with_tx};

const BAD_CREDENTIALS: &str = "invalid username or password";

impl Engine {
    /// Register a user. Usernames are unique.
    pub async fn create_user(&self, username: &str, password: &str) -> ResultEngine<User> {
        let username = normalize_required_name(username, "user")?;
        if password.is_empty() {
            return Err(EngineError::InvalidCredentials(
                "password must not be empty".to_string(),
            ));
        }
        let password_hash = hash_password(password)?;

        with_tx!(self, |db_tx| {
            let taken = users::Entity::find()
                .filter(users::Column::Username.eq(username.clone()))
                .one(&db_tx)
                .await?
                .is_some();
            if taken {
                return Err(EngineError::ExistingKey(username));
            }

            let model = users::ActiveModel::new_user(Uuid::new_v4(), username, password_hash)
                .insert(&db_tx)
                .await?;
            tracing::info!(username = %model.username, "user created");
            User::try_from(model)
        })
    }

    /// Check a username/password pair.
    ///
    /// Unknown users and wrong passwords fail with the same error.
    pub async fn authenticate(&self, username: &str, password: &str) -> ResultEngine<User> {
        let model = users::Entity::find()
            .filter(users::Column::Username.eq(username.trim()))
            .one(&self.database)
            .await?
            .ok_or_else(|| EngineError::Unauthorized(BAD_CREDENTIALS.to_string()))?;

        if !verify_password(password, &model.password_hash) {
            return Err(EngineError::Unauthorized(BAD_CREDENTIALS.to_string()));
        }
        User::try_from(model)
    }

    pub async fn user(&self, user_id: Uuid) -> ResultEngine<User> {
        users::Entity::find_by_id(user_id.to_string())
            .one(&self.database)
            .await?
            .ok_or_else(|| EngineError::KeyNotFound("user not exists".to_string()))
            .and_then(User::try_from)
    }

    /// Stored settings of `user_id`, or the defaults when none were saved.
    pub async fn user_settings(&self, user_id: Uuid) -> ResultEngine<UserSettings> {
        user_settings::Entity::find_by_id(user_id.to_string())
            .one(&self.database)
            .await?
            .map_or_else(|| Ok(UserSettings::default()), UserSettings::try_from)
    }

    pub async fn update_user_settings(
        &self,
        user_id: Uuid,
        patch: UserSettingsPatch,
    ) -> ResultEngine<UserSettings> {
        with_tx!(self, |db_tx| {
            if users::Entity::find_by_id(user_id.to_string())
                .one(&db_tx)
                .await?
                .is_none()
            {
                return Err(EngineError::KeyNotFound("user not exists".to_string()));
            }

            let existing = user_settings::Entity::find_by_id(user_id.to_string())
                .one(&db_tx)
                .await?;
            let stored = existing.is_some();
            let current = existing
                .map(UserSettings::try_from)
                .transpose()?
                .unwrap_or_default();
            let merged = current.merged(patch)?;

            let model = user_settings::ActiveModel::from_settings(user_id, &merged);
            if stored {
                model.update(&db_tx).await?;
            } else {
                model.insert(&db_tx).await?;
            }
            Ok(merged)
        })
    }
}
