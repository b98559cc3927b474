//! # Operator Repository
//!
//! Lookup and creation of register operators. The credential record (with
//! the password hash) stays inside this crate; everything above the data
//! layer sees only the public [`Operator`] profile.

use chrono::Utc;
use sqlx::SqlitePool;
use tracing::debug;

use caja_core::{Operator, OperatorRole};

use crate::error::{DbError, DbResult};

/// Internal operator row including the password hash. Used only by the
/// login path for verification; never serialized outward.
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct OperatorRecord {
    pub id: i64,
    pub name: String,
    pub email: String,
    pub password_hash: String,
    pub role: OperatorRole,
    pub is_active: bool,
}

impl OperatorRecord {
    /// Strips the credential into the public profile.
    pub fn into_operator(self) -> Operator {
        Operator {
            id: self.id,
            name: self.name,
            email: self.email,
            role: self.role,
            is_active: self.is_active,
        }
    }
}

/// Repository for operator database operations.
#[derive(Debug, Clone)]
pub struct OperatorRepository {
    pool: SqlitePool,
}

impl OperatorRepository {
    pub fn new(pool: SqlitePool) -> Self {
        OperatorRepository { pool }
    }

    /// Finds an active operator by email, with credentials, for login.
    pub async fn find_by_email(&self, email: &str) -> DbResult<Option<OperatorRecord>> {
        let record = sqlx::query_as::<_, OperatorRecord>(
            "SELECT id, name, email, password_hash, role, is_active \
             FROM operators WHERE email = ?1 AND is_active = 1",
        )
        .bind(email)
        .fetch_optional(&self.pool)
        .await?;

        Ok(record)
    }

    /// Gets an operator's public profile by id.
    pub async fn get_by_id(&self, id: i64) -> DbResult<Option<Operator>> {
        let operator = sqlx::query_as::<_, Operator>(
            "SELECT id, name, email, role, is_active FROM operators WHERE id = ?1",
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(operator)
    }

    /// Creates an operator. The hash must already be an argon2 PHC string;
    /// hashing is an API-layer concern.
    pub async fn create(
        &self,
        name: &str,
        email: &str,
        password_hash: &str,
        role: OperatorRole,
    ) -> DbResult<Operator> {
        debug!(email, ?role, "creating operator");

        let result = sqlx::query(
            "INSERT INTO operators (name, email, password_hash, role, is_active, created_at) \
             VALUES (?1, ?2, ?3, ?4, 1, ?5)",
        )
        .bind(name)
        .bind(email)
        .bind(password_hash)
        .bind(role)
        .bind(Utc::now())
        .execute(&self.pool)
        .await?;

        let id = result.last_insert_rowid();
        self.get_by_id(id)
            .await?
            .ok_or_else(|| DbError::not_found("operator", id))
    }
}
