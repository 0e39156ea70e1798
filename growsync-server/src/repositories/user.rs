use std::sync::Arc;

use sqlx::Error;

use crate::configs::Storage;
use crate::models::User;

pub struct UserRepository {
    storage: Arc<Storage>,
}

impl UserRepository {
    pub fn new(storage: Arc<Storage>) -> Self {
        Self { storage }
    }

    pub async fn find_by_id(&self, id: i32) -> Result<Option<User>, Error> {
        let user: Option<User> = sqlx::query_as("SELECT * FROM users WHERE id = $1")
            .bind(id)
            .fetch_optional(self.storage.get_pool())
            .await?;

        Ok(user)
    }

    pub async fn find_active_by_id(&self, id: i32) -> Result<Option<User>, Error> {
        let user: Option<User> =
            sqlx::query_as("SELECT * FROM users WHERE id = $1 AND is_active = TRUE")
                .bind(id)
                .fetch_optional(self.storage.get_pool())
                .await?;

        Ok(user)
    }
}
