//! # Safe-Ledger Repository
//!
//! Database operations for the cash-safe ledger ("caja fuerte").
//!
//! The ledger is a balance chain: each movement snapshots the balance
//! before and after itself, and the current balance is the `balance_after`
//! of the latest active row. Registration is a read-modify-write inside a
//! transaction; the API layer additionally serializes registrations behind
//! a process-wide lock so two concurrent movements cannot both read the
//! same prior balance.
//!
//! Only the most recent active movement may be removed. Deleting an
//! interior row would desynchronize every snapshot after it, so the ledger
//! behaves like a stack: correct a mistake by undoing the tip, never by
//! editing history.

use chrono::Utc;
use sqlx::{QueryBuilder, Sqlite, SqlitePool};
use tracing::debug;

use caja_core::{CoreError, Money, MovementKind, SafeMovement};

use crate::error::{DbError, DbResult};
use crate::filter::{DateRange, MovementFilter};

const MOVEMENT_COLUMNS: &str = "id, kind, amount_cents, description, operator_id, session_id, \
     balance_before_cents, balance_after_cents, recorded_at, is_active";

/// Input for registering a safe movement.
#[derive(Debug, Clone)]
pub struct NewMovement {
    pub kind: MovementKind,
    pub amount: Money,
    pub description: String,
    pub operator_id: i64,
    pub session_id: Option<i64>,
}

/// Repository for safe-ledger database operations.
#[derive(Debug, Clone)]
pub struct SafeRepository {
    pool: SqlitePool,
}

impl SafeRepository {
    pub fn new(pool: SqlitePool) -> Self {
        SafeRepository { pool }
    }

    /// Current safe balance: `balance_after` of the latest active movement,
    /// zero when the ledger is empty.
    pub async fn current_balance(&self) -> DbResult<Money> {
        let cents: Option<i64> = sqlx::query_scalar(
            "SELECT balance_after_cents FROM safe_movements \
             WHERE is_active = 1 ORDER BY id DESC LIMIT 1",
        )
        .fetch_optional(&self.pool)
        .await?;

        Ok(Money::from_cents(cents.unwrap_or(0)))
    }

    /// Registers a movement, extending the balance chain.
    ///
    /// A withdrawal exceeding the current balance fails with
    /// [`CoreError::InsufficientSafeBalance`]; a withdrawal of exactly the
    /// balance succeeds and leaves it at zero. The chain read and the
    /// insert share one transaction.
    pub async fn register(&self, new: NewMovement) -> DbResult<SafeMovement> {
        let mut tx = self.pool.begin().await?;

        let balance_before: i64 = sqlx::query_scalar(
            "SELECT balance_after_cents FROM safe_movements \
             WHERE is_active = 1 ORDER BY id DESC LIMIT 1",
        )
        .fetch_optional(&mut *tx)
        .await?
        .unwrap_or(0);

        let balance_before = Money::from_cents(balance_before);

        if new.kind == MovementKind::Withdrawal && new.amount > balance_before {
            return Err(CoreError::InsufficientSafeBalance {
                balance_cents: balance_before.cents(),
                requested_cents: new.amount.cents(),
            }
            .into());
        }

        let balance_after = new.kind.apply(balance_before, new.amount);
        let now = Utc::now();

        debug!(
            kind = ?new.kind,
            amount = %new.amount,
            balance_after = %balance_after,
            "registering safe movement"
        );

        let result = sqlx::query(
            "INSERT INTO safe_movements \
             (kind, amount_cents, description, operator_id, session_id, \
              balance_before_cents, balance_after_cents, recorded_at, is_active) \
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, 1)",
        )
        .bind(new.kind)
        .bind(new.amount)
        .bind(&new.description)
        .bind(new.operator_id)
        .bind(new.session_id)
        .bind(balance_before)
        .bind(balance_after)
        .bind(now)
        .execute(&mut *tx)
        .await?;

        tx.commit().await?;

        let id = result.last_insert_rowid();
        self.get_by_id(id)
            .await?
            .ok_or_else(|| DbError::not_found("safe movement", id))
    }

    /// Gets a movement by id, including soft-deleted rows.
    pub async fn get_by_id(&self, id: i64) -> DbResult<Option<SafeMovement>> {
        let movement = sqlx::query_as::<_, SafeMovement>(&format!(
            "SELECT {MOVEMENT_COLUMNS} FROM safe_movements WHERE id = ?1"
        ))
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(movement)
    }

    /// Soft-deletes the most recent active movement, by id.
    ///
    /// Any movement other than the tip of the chain fails with
    /// [`CoreError::MovementNotDeletable`]. Undoing the tip restores the
    /// previous balance because the chain now ends at the prior row.
    pub async fn soft_delete(&self, id: i64) -> DbResult<SafeMovement> {
        let mut tx = self.pool.begin().await?;

        let movement = sqlx::query_as::<_, SafeMovement>(&format!(
            "SELECT {MOVEMENT_COLUMNS} FROM safe_movements WHERE id = ?1 AND is_active = 1"
        ))
        .bind(id)
        .fetch_optional(&mut *tx)
        .await?
        .ok_or_else(|| DbError::not_found("safe movement", id))?;

        let latest_id: Option<i64> = sqlx::query_scalar(
            "SELECT id FROM safe_movements WHERE is_active = 1 ORDER BY id DESC LIMIT 1",
        )
        .fetch_optional(&mut *tx)
        .await?;

        if latest_id != Some(id) {
            return Err(CoreError::MovementNotDeletable {
                id,
                kind: movement.kind,
            }
            .into());
        }

        sqlx::query("UPDATE safe_movements SET is_active = 0 WHERE id = ?1")
            .bind(id)
            .execute(&mut *tx)
            .await?;

        tx.commit().await?;

        debug!(movement_id = id, "safe movement undone");
        Ok(movement)
    }

    /// Lists active movements, newest first, narrowed by the filter.
    pub async fn list(&self, filter: &MovementFilter) -> DbResult<Vec<SafeMovement>> {
        let mut qb: QueryBuilder<Sqlite> = QueryBuilder::new(format!(
            "SELECT {MOVEMENT_COLUMNS} FROM safe_movements WHERE is_active = 1"
        ));

        if let Some(kind) = filter.kind {
            qb.push(" AND kind = ").push_bind(kind);
        }
        if let Some(operator_id) = filter.operator_id {
            qb.push(" AND operator_id = ").push_bind(operator_id);
        }
        if let Some(session_id) = filter.session_id {
            qb.push(" AND session_id = ").push_bind(session_id);
        }
        if let Some(ref from) = filter.recorded.from {
            qb.push(" AND date(recorded_at) >= ").push_bind(from.clone());
        }
        if let Some(ref to) = filter.recorded.to {
            qb.push(" AND date(recorded_at) <= ").push_bind(to.clone());
        }

        qb.push(" ORDER BY id DESC");

        let movements = qb
            .build_query_as::<SafeMovement>()
            .fetch_all(&self.pool)
            .await?;

        Ok(movements)
    }

    /// Chronological history over a date range, oldest first, for the
    /// balance-evolution view.
    pub async fn history(&self, range: &DateRange) -> DbResult<Vec<SafeMovement>> {
        let mut qb: QueryBuilder<Sqlite> = QueryBuilder::new(format!(
            "SELECT {MOVEMENT_COLUMNS} FROM safe_movements WHERE is_active = 1"
        ));

        if let Some(ref from) = range.from {
            qb.push(" AND date(recorded_at) >= ").push_bind(from.clone());
        }
        if let Some(ref to) = range.to {
            qb.push(" AND date(recorded_at) <= ").push_bind(to.clone());
        }

        qb.push(" ORDER BY id ASC");

        let movements = qb
            .build_query_as::<SafeMovement>()
            .fetch_all(&self.pool)
            .await?;

        Ok(movements)
    }
}
