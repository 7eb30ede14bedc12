use chrono::Utc;
use sea_orm::{ActiveValue, QueryFilter, TransactionTrait, prelude::*};

use crate::{EngineError, ResultEngine, users};

use super::Engine;

impl Engine {
    /// Mirror an identity-provider user locally and return its id.
    ///
    /// Wallets reference `users.id`, so a user has to exist here before a
    /// wallet can be provisioned for it.
    pub async fn provision_user(&self, username: &str) -> ResultEngine<i32> {
        let username = username.trim();
        if username.is_empty() {
            return Err(EngineError::InvalidAmount(
                "username must not be empty".to_string(),
            ));
        }

        let db_tx = self.database.begin().await?;
        let exists = users::Entity::find()
            .filter(users::Column::Username.eq(username))
            .one(&db_tx)
            .await?
            .is_some();
        if exists {
            return Err(EngineError::ExistingKey(username.to_string()));
        }

        let model = users::ActiveModel {
            id: ActiveValue::NotSet,
            username: ActiveValue::Set(username.to_string()),
            created_at: ActiveValue::Set(Utc::now()),
        }
        .insert(&db_tx)
        .await?;
        db_tx.commit().await?;

        tracing::info!(user_id = model.id, username, "user provisioned");
        Ok(model.id)
    }

    /// Look up a mirrored user id by username.
    pub async fn user_id(&self, username: &str) -> ResultEngine<i32> {
        users::Entity::find()
            .filter(users::Column::Username.eq(username.trim()))
            .one(&self.database)
            .await?
            .map(|model| model.id)
            .ok_or_else(|| EngineError::KeyNotFound(format!("user {username}")))
    }
}
