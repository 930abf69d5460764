//! SQLite-backed user store.
//!
//! One pooled connection set per process; every logical operation is a
//! single statement (or transaction) against the `users` table.

use std::path::PathBuf;

use chrono::{DateTime, Utc};
use sqlx::sqlite::{SqliteConnectOptions, SqliteJournalMode, SqlitePoolOptions, SqliteSynchronous};
use sqlx::{Row, SqlitePool};

use super::service::{internal, AccountError};
use super::types::{Department, TokenState, User};

/// Validated registration data ready for insertion.
pub struct NewUserRecord<'a> {
    pub email: &'a str,
    pub password_hash: &'a str,
    pub name: &'a str,
    pub employee_id: &'a str,
    pub department: Department,
    pub job_title: &'a str,
    pub token: &'a str,
    pub token_expiry: DateTime<Utc>,
}

#[derive(Clone)]
pub struct UserStore {
    pool: SqlitePool,
}

impl UserStore {
    pub async fn new(db_path: PathBuf) -> Result<Self, AccountError> {
        let options = SqliteConnectOptions::new()
            .filename(&db_path)
            .create_if_missing(true)
            .journal_mode(SqliteJournalMode::Wal)
            .synchronous(SqliteSynchronous::Normal)
            .foreign_keys(true);

        let pool = SqlitePoolOptions::new()
            .min_connections(1)
            .max_connections(4)
            .connect_with(options)
            .await
            .map_err(internal)?;

        let store = Self { pool };
        store.init_schema().await?;
        Ok(store)
    }

    async fn init_schema(&self) -> Result<(), AccountError> {
        sqlx::query(
            "CREATE TABLE IF NOT EXISTS users (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                email TEXT NOT NULL UNIQUE,
                password_hash TEXT NOT NULL,
                name TEXT NOT NULL,
                employee_id TEXT NOT NULL UNIQUE,
                department TEXT NOT NULL,
                job_title TEXT NOT NULL,
                is_verified INTEGER NOT NULL DEFAULT 0,
                reset_token TEXT,
                reset_expiry TEXT
            )",
        )
        .execute(&self.pool)
        .await
        .map_err(internal)?;

        Ok(())
    }

    /// Insert a new, unverified user together with their verification
    /// token. A single statement, so there is no window in which the row
    /// exists without a token.
    pub async fn insert_user(&self, record: NewUserRecord<'_>) -> Result<(), AccountError> {
        sqlx::query(
            "INSERT INTO users
                (email, password_hash, name, employee_id, department, job_title,
                 is_verified, reset_token, reset_expiry)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, 0, ?7, ?8)",
        )
        .bind(record.email)
        .bind(record.password_hash)
        .bind(record.name)
        .bind(record.employee_id)
        .bind(record.department.as_str())
        .bind(record.job_title)
        .bind(record.token)
        .bind(record.token_expiry.to_rfc3339())
        .execute(&self.pool)
        .await
        .map_err(|err| match &err {
            sqlx::Error::Database(db) if db.is_unique_violation() => {
                AccountError::AlreadyRegistered
            }
            _ => internal(err),
        })?;

        Ok(())
    }

    pub async fn find_by_email(&self, email: &str) -> Result<Option<User>, AccountError> {
        let row = sqlx::query(
            "SELECT id, email, password_hash, name, employee_id, department, job_title,
                    is_verified, reset_token, reset_expiry
             FROM users WHERE email = ?1",
        )
        .bind(email)
        .fetch_optional(&self.pool)
        .await
        .map_err(internal)?;

        row.as_ref().map(row_to_user).transpose()
    }

    pub async fn find_by_token(&self, token: &str) -> Result<Option<User>, AccountError> {
        if token.is_empty() {
            return Ok(None);
        }

        let row = sqlx::query(
            "SELECT id, email, password_hash, name, employee_id, department, job_title,
                    is_verified, reset_token, reset_expiry
             FROM users WHERE reset_token = ?1",
        )
        .bind(token)
        .fetch_optional(&self.pool)
        .await
        .map_err(internal)?;

        row.as_ref().map(row_to_user).transpose()
    }

    /// Overwrite the user's token; any previously issued token is gone.
    pub async fn set_token(
        &self,
        email: &str,
        token: &str,
        expiry: DateTime<Utc>,
    ) -> Result<bool, AccountError> {
        let result = sqlx::query(
            "UPDATE users SET reset_token = ?1, reset_expiry = ?2 WHERE email = ?3",
        )
        .bind(token)
        .bind(expiry.to_rfc3339())
        .bind(email)
        .execute(&self.pool)
        .await
        .map_err(internal)?;

        Ok(result.rows_affected() > 0)
    }

    /// Consume a verification token: set the flag and clear the token in
    /// one statement.
    pub async fn mark_verified(&self, token: &str) -> Result<(), AccountError> {
        sqlx::query(
            "UPDATE users SET is_verified = 1, reset_token = NULL, reset_expiry = NULL
             WHERE reset_token = ?1",
        )
        .bind(token)
        .execute(&self.pool)
        .await
        .map_err(internal)?;

        Ok(())
    }

    /// Consume a reset token: replace the password hash and clear the token.
    pub async fn update_password(
        &self,
        token: &str,
        password_hash: &str,
    ) -> Result<(), AccountError> {
        sqlx::query(
            "UPDATE users SET password_hash = ?1, reset_token = NULL, reset_expiry = NULL
             WHERE reset_token = ?2",
        )
        .bind(password_hash)
        .bind(token)
        .execute(&self.pool)
        .await
        .map_err(internal)?;

        Ok(())
    }

    pub async fn count(&self) -> Result<usize, AccountError> {
        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM users")
            .fetch_one(&self.pool)
            .await
            .map_err(internal)?;

        Ok(count as usize)
    }
}

fn row_to_user(row: &sqlx::sqlite::SqliteRow) -> Result<User, AccountError> {
    let department_raw: String = row.get("department");
    let department = Department::parse(&department_raw).ok_or_else(|| {
        AccountError::Internal(format!("unknown department in users table: {}", department_raw))
    })?;

    let token: Option<String> = row.get("reset_token");
    let expiry: Option<String> = row.get("reset_expiry");

    Ok(User {
        id: row.get("id"),
        email: row.get("email"),
        password_hash: row.get("password_hash"),
        name: row.get("name"),
        employee_id: row.get("employee_id"),
        department,
        job_title: row.get("job_title"),
        is_verified: row.get("is_verified"),
        token: TokenState::from_columns(token, expiry),
    })
}
