// src/db/user_repo.rs

use std::collections::BTreeSet;

use sqlx::{Executor, PgConnection, PgPool, Postgres};

use crate::{
    common::error::AppError,
    models::auth::{Group, User},
};

// O repositório de usuários: tabelas 'users' e 'user_groups'
#[derive(Clone)]
pub struct UserRepository {
    pool: PgPool,
}

impl UserRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    pub async fn find_by_username(&self, username: &str) -> Result<Option<User>, AppError> {
        let maybe_user = sqlx::query_as::<_, User>(
            r#"
            SELECT id, username, email, password_hash, is_admin, created_at
            FROM users
            WHERE username = $1
            "#,
        )
        .bind(username)
        .fetch_optional(&self.pool)
        .await?;
        Ok(maybe_user)
    }

    pub async fn find_by_id(&self, id: i64) -> Result<Option<User>, AppError> {
        let maybe_user = sqlx::query_as::<_, User>(
            r#"
            SELECT id, username, email, password_hash, is_admin, created_at
            FROM users
            WHERE id = $1
            "#,
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;
        Ok(maybe_user)
    }

    /// Grupos do usuário. Nomes desconhecidos no banco são ignorados.
    pub async fn groups_for(&self, user_id: i64) -> Result<BTreeSet<Group>, AppError> {
        let names: Vec<String> =
            sqlx::query_scalar("SELECT group_name FROM user_groups WHERE user_id = $1")
                .bind(user_id)
                .fetch_all(&self.pool)
                .await?;

        Ok(names.iter().filter_map(|name| name.parse().ok()).collect())
    }

    // Cria um novo usuário; nome duplicado vira erro de domínio
    pub async fn create_user<'e, E>(
        &self,
        executor: E,
        username: &str,
        email: &str,
        password_hash: &str,
        is_admin: bool,
    ) -> Result<User, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let user = sqlx::query_as::<_, User>(
            r#"
            INSERT INTO users (username, email, password_hash, is_admin)
            VALUES ($1, $2, $3, $4)
            RETURNING id, username, email, password_hash, is_admin, created_at
            "#,
        )
        .bind(username)
        .bind(email)
        .bind(password_hash)
        .bind(is_admin)
        .fetch_one(executor)
        .await
        .map_err(|e| {
            if let sqlx::Error::Database(db_err) = &e {
                if db_err.is_unique_violation() {
                    return AppError::UsernameAlreadyExists;
                }
            }
            e.into()
        })?;

        Ok(user)
    }

    /// Troca grupos e flag de admin. Roda dentro da transação de quem chama.
    pub async fn replace_access(
        &self,
        conn: &mut PgConnection,
        user_id: i64,
        groups: &BTreeSet<Group>,
        is_admin: bool,
    ) -> Result<Option<User>, AppError> {
        let Some(user) = sqlx::query_as::<_, User>(
            r#"
            UPDATE users SET is_admin = $1
            WHERE id = $2
            RETURNING id, username, email, password_hash, is_admin, created_at
            "#,
        )
        .bind(is_admin)
        .bind(user_id)
        .fetch_optional(&mut *conn)
        .await?
        else {
            return Ok(None);
        };

        sqlx::query("DELETE FROM user_groups WHERE user_id = $1")
            .bind(user_id)
            .execute(&mut *conn)
            .await?;

        let names: Vec<&str> = groups.iter().map(|g| g.as_str()).collect();
        sqlx::query(
            "INSERT INTO user_groups (user_id, group_name) SELECT $1, UNNEST($2::varchar[])",
        )
        .bind(user_id)
        .bind(names)
        .execute(&mut *conn)
        .await?;

        Ok(Some(user))
    }
}
