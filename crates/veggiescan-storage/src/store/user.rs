use anyhow::Result;
use chrono::Utc;
use sea_orm::{
    ActiveModelTrait, ActiveValue::Set, ColumnTrait, EntityTrait, PaginatorTrait, QueryFilter,
    SqlErr,
};
use veggiescan_common::types::User;

use crate::entities::user::{self, Column, Entity};
use crate::error::StorageError;
use crate::store::VeggieStore;

fn to_user(m: user::Model) -> User {
    User {
        id: m.id,
        email: m.email,
        username: m.username,
        password_hash: m.password_hash,
        is_admin: m.is_admin,
        created_at: m.created_at.with_timezone(&Utc),
        updated_at: m.updated_at.with_timezone(&Utc),
    }
}

impl VeggieStore {
    pub async fn get_user_by_email(&self, email: &str) -> Result<Option<User>> {
        let model = Entity::find()
            .filter(Column::Email.eq(email))
            .one(self.db())
            .await?;
        Ok(model.map(to_user))
    }

    pub async fn get_user_by_id(&self, id: &str) -> Result<Option<User>> {
        let model = Entity::find_by_id(id).one(self.db()).await?;
        Ok(model.map(to_user))
    }

    /// Insert a user. A taken email yields [`StorageError::Conflict`].
    pub async fn create_user(
        &self,
        email: &str,
        username: &str,
        password_hash: &str,
        is_admin: bool,
    ) -> Result<User> {
        let now = Utc::now().fixed_offset();
        let am = user::ActiveModel {
            id: Set(veggiescan_common::id::next_id()),
            email: Set(email.to_owned()),
            username: Set(username.to_owned()),
            password_hash: Set(password_hash.to_owned()),
            is_admin: Set(is_admin),
            created_at: Set(now),
            updated_at: Set(now),
        };
        match am.insert(self.db()).await {
            Ok(m) => Ok(to_user(m)),
            Err(e) if matches!(e.sql_err(), Some(SqlErr::UniqueConstraintViolation(_))) => {
                Err(StorageError::Conflict {
                    entity: "user",
                    key: email.to_owned(),
                }
                .into())
            }
            Err(e) => Err(StorageError::from(e).into()),
        }
    }

    pub async fn count_users(&self) -> Result<u64> {
        Ok(Entity::find().count(self.db()).await?)
    }
}
