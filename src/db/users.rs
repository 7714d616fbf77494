use super::{optional_json_column, to_json, Database};
use crate::error::AppError;
use crate::models::product::Image;
use crate::models::user::{Credentials, User, ROLE_ADMIN, ROLE_USER};
use chrono::{DateTime, Utc};
use rusqlite::{params, OptionalExtension, Row};
use tracing::info;
use uuid::Uuid;

const USER_COLUMNS: &str = "id, name, email, avatar, role, created_at";

fn user_from_row(row: &Row<'_>) -> rusqlite::Result<User> {
    Ok(User {
        id: row.get(0)?,
        name: row.get(1)?,
        email: row.get(2)?,
        avatar: optional_json_column(row, 3)?,
        role: row.get(4)?,
        created_at: row.get(5)?,
    })
}

fn credentials_from_row(row: &Row<'_>) -> rusqlite::Result<Credentials> {
    Ok(Credentials {
        user: user_from_row(row)?,
        password_hash: row.get(6)?,
    })
}

impl Database {
    pub async fn insert_user(
        &self,
        name: &str,
        email: &str,
        password_hash: &str,
        avatar: Option<&Image>,
    ) -> Result<User, AppError> {
        self.insert_user_with_role(name, email, password_hash, avatar, ROLE_USER)
            .await
    }

    pub async fn insert_user_with_role(
        &self,
        name: &str,
        email: &str,
        password_hash: &str,
        avatar: Option<&Image>,
        role: &str,
    ) -> Result<User, AppError> {
        let user = User {
            id: Uuid::new_v4().to_string(),
            name: name.trim().to_string(),
            email: email.trim().to_lowercase(),
            avatar: avatar.cloned(),
            role: role.to_string(),
            created_at: Utc::now(),
        };
        let avatar_json = user.avatar.as_ref().map(to_json).transpose()?;

        let conn = self.conn.lock().await;
        conn.execute(
            "INSERT INTO users (id, name, email, avatar, role, created_at, password_hash)
             VALUES (?, ?, ?, ?, ?, ?, ?)",
            params![
                &user.id,
                &user.name,
                &user.email,
                avatar_json,
                &user.role,
                user.created_at,
                password_hash
            ],
        )
        .map_err(AppError::from_user_write)?;
        info!("[DB] User registered: {} ({})", user.email, user.id);
        Ok(user)
    }

    pub async fn get_user(&self, id: &str) -> Result<Option<User>, AppError> {
        let conn = self.conn.lock().await;
        let user = conn
            .query_row(
                &format!("SELECT {} FROM users WHERE id = ?", USER_COLUMNS),
                [id],
                user_from_row,
            )
            .optional()?;
        Ok(user)
    }

    pub async fn get_credentials(&self, id: &str) -> Result<Option<Credentials>, AppError> {
        let conn = self.conn.lock().await;
        let creds = conn
            .query_row(
                &format!("SELECT {}, password_hash FROM users WHERE id = ?", USER_COLUMNS),
                [id],
                credentials_from_row,
            )
            .optional()?;
        Ok(creds)
    }

    pub async fn find_credentials_by_email(&self, email: &str) -> Result<Option<Credentials>, AppError> {
        let conn = self.conn.lock().await;
        let creds = conn
            .query_row(
                &format!("SELECT {}, password_hash FROM users WHERE email = ?", USER_COLUMNS),
                [email.trim().to_lowercase()],
                credentials_from_row,
            )
            .optional()?;
        Ok(creds)
    }

    pub async fn find_user_by_email(&self, email: &str) -> Result<Option<User>, AppError> {
        Ok(self.find_credentials_by_email(email).await?.map(|c| c.user))
    }

    pub async fn list_users(&self) -> Result<Vec<User>, AppError> {
        let conn = self.conn.lock().await;
        let mut stmt = conn.prepare(&format!(
            "SELECT {} FROM users ORDER BY created_at ASC, rowid ASC",
            USER_COLUMNS
        ))?;
        let users = stmt
            .query_map([], user_from_row)?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(users)
    }

    /// Rewrites name, email and role. `None` when the user does not exist.
    pub async fn update_user(
        &self,
        id: &str,
        name: &str,
        email: &str,
        role: Option<&str>,
    ) -> Result<Option<User>, AppError> {
        {
            let conn = self.conn.lock().await;
            let changed = match role {
                Some(role) => conn.execute(
                    "UPDATE users SET name = ?, email = ?, role = ? WHERE id = ?",
                    params![name.trim(), email.trim().to_lowercase(), role, id],
                ),
                None => conn.execute(
                    "UPDATE users SET name = ?, email = ? WHERE id = ?",
                    params![name.trim(), email.trim().to_lowercase(), id],
                ),
            }
            .map_err(AppError::from_user_write)?;
            if changed == 0 {
                return Ok(None);
            }
        }
        info!("[DB] User updated: {}", id);
        self.get_user(id).await
    }

    /// Grants the admin role to the account registered under `email`.
    pub async fn promote_to_admin(&self, email: &str) -> Result<Option<User>, AppError> {
        let changed = {
            let conn = self.conn.lock().await;
            conn.execute(
                "UPDATE users SET role = ? WHERE email = ?",
                params![ROLE_ADMIN, email.trim().to_lowercase()],
            )?
        };
        if changed == 0 {
            return Ok(None);
        }
        info!("[DB] Promoted {} to admin", email);
        self.find_user_by_email(email).await
    }

    pub async fn set_password(&self, id: &str, password_hash: &str) -> Result<(), AppError> {
        let conn = self.conn.lock().await;
        conn.execute(
            "UPDATE users SET password_hash = ?, reset_password_token = NULL,
                reset_password_expire = NULL
             WHERE id = ?",
            params![password_hash, id],
        )?;
        info!("[DB] Password changed for user {}", id);
        Ok(())
    }

    pub async fn set_reset_token(
        &self,
        id: &str,
        token_digest: &str,
        expires_at: DateTime<Utc>,
    ) -> Result<(), AppError> {
        let conn = self.conn.lock().await;
        conn.execute(
            "UPDATE users SET reset_password_token = ?, reset_password_expire = ? WHERE id = ?",
            params![token_digest, expires_at, id],
        )?;
        Ok(())
    }

    pub async fn clear_reset_token(&self, id: &str) -> Result<(), AppError> {
        let conn = self.conn.lock().await;
        conn.execute(
            "UPDATE users SET reset_password_token = NULL, reset_password_expire = NULL
             WHERE id = ?",
            [id],
        )?;
        Ok(())
    }

    /// The user holding an unexpired reset token with this digest.
    pub async fn find_user_by_reset_token(
        &self,
        token_digest: &str,
        now: DateTime<Utc>,
    ) -> Result<Option<User>, AppError> {
        let conn = self.conn.lock().await;
        let found = conn
            .query_row(
                &format!(
                    "SELECT {}, reset_password_expire FROM users WHERE reset_password_token = ?",
                    USER_COLUMNS
                ),
                [token_digest],
                |row| {
                    let expires: Option<DateTime<Utc>> = row.get(6)?;
                    Ok((user_from_row(row)?, expires))
                },
            )
            .optional()?;

        Ok(match found {
            Some((user, Some(expires))) if expires > now => Some(user),
            _ => None,
        })
    }

    pub async fn delete_user(&self, id: &str) -> Result<bool, AppError> {
        let conn = self.conn.lock().await;
        let deleted = conn.execute("DELETE FROM users WHERE id = ?", [id])?;
        info!("[DB] User deleted: {} ({} rows)", id, deleted);
        Ok(deleted > 0)
    }
}
