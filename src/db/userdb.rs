// db/userdb.rs
use async_trait::async_trait;
use sqlx::{Postgres, QueryBuilder};

use super::db::DBClient;
use crate::dtos::userdtos::UpdateUserDto;
use crate::models::usermodel::{User, UserRole};

#[async_trait]
pub trait UserExt {
    async fn save_user(
        &self,
        username: String,
        email: String,
        full_name: String,
        role: UserRole,
        is_active: bool,
    ) -> Result<User, sqlx::Error>;

    /// Active users only; inactive accounts are reachable through
    /// `get_user_by_id` but never listed.
    async fn get_users(&self, role: Option<UserRole>) -> Result<Vec<User>, sqlx::Error>;

    async fn get_user_by_id(&self, user_id: i32) -> Result<Option<User>, sqlx::Error>;

    /// Partial update. `updated_at` moves only when a supplied field actually
    /// differs from the stored row; a no-op returns the row untouched.
    async fn update_user(
        &self,
        user_id: i32,
        dto: &UpdateUserDto,
    ) -> Result<Option<User>, sqlx::Error>;
}

#[async_trait]
impl UserExt for DBClient {
    async fn save_user(
        &self,
        username: String,
        email: String,
        full_name: String,
        role: UserRole,
        is_active: bool,
    ) -> Result<User, sqlx::Error> {
        let user = sqlx::query_as::<_, User>(
            r#"
            INSERT INTO users (username, email, full_name, role, is_active)
            VALUES ($1, $2, $3, $4, $5)
            RETURNING *
            "#,
        )
        .bind(username)
        .bind(email)
        .bind(full_name)
        .bind(role)
        .bind(is_active)
        .fetch_one(&self.pool)
        .await?;

        Ok(user)
    }

    async fn get_users(&self, role: Option<UserRole>) -> Result<Vec<User>, sqlx::Error> {
        let query = match role {
            Some(role) => sqlx::query_as::<_, User>(
                r#"
                SELECT * FROM users
                WHERE is_active = TRUE AND role = $1
                ORDER BY username
                "#,
            )
            .bind(role),
            None => sqlx::query_as::<_, User>(
                r#"
                SELECT * FROM users
                WHERE is_active = TRUE
                ORDER BY username
                "#,
            ),
        };

        let users = query.fetch_all(&self.pool).await?;
        Ok(users)
    }

    async fn get_user_by_id(&self, user_id: i32) -> Result<Option<User>, sqlx::Error> {
        let user = sqlx::query_as::<_, User>(
            r#"
            SELECT * FROM users
            WHERE id = $1
            "#,
        )
        .bind(user_id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(user)
    }

    async fn update_user(
        &self,
        user_id: i32,
        dto: &UpdateUserDto,
    ) -> Result<Option<User>, sqlx::Error> {
        let current = match self.get_user_by_id(user_id).await? {
            Some(user) => user,
            None => return Ok(None),
        };

        let mut qb = QueryBuilder::<Postgres>::new("UPDATE users SET updated_at = NOW()");
        let mut changed = false;

        if let Some(username) = &dto.username {
            if *username != current.username {
                qb.push(", username = ").push_bind(username.clone());
                changed = true;
            }
        }
        if let Some(email) = &dto.email {
            if *email != current.email {
                qb.push(", email = ").push_bind(email.clone());
                changed = true;
            }
        }
        if let Some(full_name) = &dto.full_name {
            if *full_name != current.full_name {
                qb.push(", full_name = ").push_bind(full_name.clone());
                changed = true;
            }
        }
        if let Some(role) = dto.role {
            if role != current.role {
                qb.push(", role = ").push_bind(role);
                changed = true;
            }
        }
        if let Some(is_active) = dto.is_active {
            if is_active != current.is_active {
                qb.push(", is_active = ").push_bind(is_active);
                changed = true;
            }
        }

        if !changed {
            return Ok(Some(current));
        }

        qb.push(" WHERE id = ").push_bind(user_id);
        qb.push(" RETURNING *");

        let user = qb
            .build_query_as::<User>()
            .fetch_optional(&self.pool)
            .await?;

        Ok(user)
    }
}
