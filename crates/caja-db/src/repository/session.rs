//! # Cash-Session Repository
//!
//! Database operations for the register-session lifecycle.
//!
//! ## Session Lifecycle
//! ```text
//! 1. OPEN      open() -> CashSession { status: Open }
//!              one open session per operator, enforced twice:
//!              a pre-check for a friendly error, and the partial unique
//!              index as the race-proof backstop
//!
//! 2. ACTIVITY  sales/expenses reference the session while it is open;
//!              totals() previews the reconciliation at any time
//!
//! 3. CLOSE     close() -> one transaction: sum activity, compute
//!              expected/variance, UPDATE ... WHERE status = 'abierta'.
//!              0 rows affected means the session was not open: a second
//!              close fails, by design.
//!
//! 4. (terminal) closed sessions accept note/shift edits only; status,
//!              floats, totals and variance have no update path.
//! ```

use chrono::Utc;
use sqlx::{QueryBuilder, Sqlite, SqlitePool};
use tracing::debug;

use caja_core::reconcile::{close_figures, ClosingFigures, SessionTotals};
use caja_core::{CashSession, CoreError, Money, Shift};

use crate::error::{DbError, DbResult};
use crate::filter::SessionFilter;

const SESSION_COLUMNS: &str = "id, operator_id, shift, status, opened_at, closed_at, \
     opening_float_cents, closing_float_cents, sales_total_cents, expenses_total_cents, \
     variance_cents, opening_notes, closing_notes, is_active, updated_at";

/// Repository for cash-session database operations.
#[derive(Debug, Clone)]
pub struct SessionRepository {
    pool: SqlitePool,
}

impl SessionRepository {
    pub fn new(pool: SqlitePool) -> Self {
        SessionRepository { pool }
    }

    /// Gets a session by id.
    pub async fn get_by_id(&self, id: i64) -> DbResult<Option<CashSession>> {
        let session = sqlx::query_as::<_, CashSession>(&format!(
            "SELECT {SESSION_COLUMNS} FROM cash_sessions WHERE id = ?1"
        ))
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(session)
    }

    /// Returns the operator's open session, if any. `None` is a normal
    /// outcome here, not an error.
    pub async fn find_open(&self, operator_id: i64) -> DbResult<Option<CashSession>> {
        let session = sqlx::query_as::<_, CashSession>(&format!(
            "SELECT {SESSION_COLUMNS} FROM cash_sessions \
             WHERE operator_id = ?1 AND status = 'abierta' AND is_active = 1 \
             ORDER BY opened_at DESC LIMIT 1"
        ))
        .bind(operator_id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(session)
    }

    /// Opens a new session for an operator.
    ///
    /// Fails with [`CoreError::SessionAlreadyOpen`] when the operator
    /// already has one. The pre-check produces the useful message; if two
    /// opens race past it, the partial unique index rejects the second
    /// insert and the violation is mapped to the same error.
    pub async fn open(
        &self,
        operator_id: i64,
        shift: Shift,
        opening_float: Money,
        opening_notes: Option<String>,
    ) -> DbResult<CashSession> {
        if let Some(existing) = self.find_open(operator_id).await? {
            return Err(CoreError::SessionAlreadyOpen {
                operator_id,
                session_id: existing.id,
            }
            .into());
        }

        let now = Utc::now();

        debug!(operator_id, ?shift, opening_float = %opening_float, "opening cash session");

        let result = sqlx::query(
            "INSERT INTO cash_sessions \
             (operator_id, shift, status, opened_at, opening_float_cents, \
              sales_total_cents, expenses_total_cents, opening_notes, is_active, updated_at) \
             VALUES (?1, ?2, 'abierta', ?3, ?4, 0, 0, ?5, 1, ?6)",
        )
        .bind(operator_id)
        .bind(shift)
        .bind(now)
        .bind(opening_float)
        .bind(&opening_notes)
        .bind(now)
        .execute(&self.pool)
        .await;

        let result = match result {
            Ok(r) => r,
            // Lost the race against a concurrent open: the partial unique
            // index on (operator_id) WHERE status='abierta' fired.
            Err(e) => match DbError::from(e) {
                violation @ DbError::UniqueViolation { .. } => {
                    if let Some(existing) = self.find_open(operator_id).await? {
                        return Err(CoreError::SessionAlreadyOpen {
                            operator_id,
                            session_id: existing.id,
                        }
                        .into());
                    }
                    // The winning session closed before the re-query;
                    // surface the raw conflict rather than invent an id.
                    return Err(violation);
                }
                other => return Err(other),
            },
        };

        let id = result.last_insert_rowid();
        self.get_by_id(id)
            .await?
            .ok_or_else(|| DbError::not_found("cash session", id))
    }

    /// Live totals preview for a session: summed active sales and
    /// expenses, and the cash the drawer should hold right now. Pure read;
    /// also usable against closed sessions for auditing.
    pub async fn totals(&self, session_id: i64) -> DbResult<SessionTotals> {
        let session = self
            .get_by_id(session_id)
            .await?
            .ok_or_else(|| DbError::not_found("cash session", session_id))?;

        let (sales_total, expenses_total) =
            session_activity(&self.pool, session_id).await?;

        Ok(SessionTotals::compute(
            session.opening_float(),
            sales_total,
            expenses_total,
        ))
    }

    /// Closes an open session and reconciles it.
    ///
    /// Runs as a single transaction: the activity sums, the reconciliation
    /// figures and the status flip are atomic, so a sale registered after
    /// the sums were taken cannot slip between them and the UPDATE.
    ///
    /// Fails with [`CoreError::SessionNotOpen`] when no session with this
    /// id is currently open, which includes the second close of an
    /// already-closed session.
    pub async fn close(
        &self,
        session_id: i64,
        closing_float: Money,
        closing_notes: Option<String>,
    ) -> DbResult<(CashSession, ClosingFigures)> {
        let mut tx = self.pool.begin().await?;

        let session = sqlx::query_as::<_, CashSession>(&format!(
            "SELECT {SESSION_COLUMNS} FROM cash_sessions \
             WHERE id = ?1 AND status = 'abierta' AND is_active = 1"
        ))
        .bind(session_id)
        .fetch_optional(&mut *tx)
        .await?
        .ok_or(CoreError::SessionNotOpen(session_id))?;

        let sales_total: i64 = sqlx::query_scalar(
            "SELECT COALESCE(SUM(amount_cents), 0) FROM sales \
             WHERE session_id = ?1 AND is_active = 1",
        )
        .bind(session_id)
        .fetch_one(&mut *tx)
        .await?;

        let expenses_total: i64 = sqlx::query_scalar(
            "SELECT COALESCE(SUM(amount_cents), 0) FROM expenses \
             WHERE session_id = ?1 AND is_active = 1",
        )
        .bind(session_id)
        .fetch_one(&mut *tx)
        .await?;

        let figures = close_figures(
            session.opening_float(),
            Money::from_cents(sales_total),
            Money::from_cents(expenses_total),
            closing_float,
        );

        let now = Utc::now();

        let result = sqlx::query(
            "UPDATE cash_sessions SET \
                status = 'cerrada', \
                closed_at = ?2, \
                closing_float_cents = ?3, \
                sales_total_cents = ?4, \
                expenses_total_cents = ?5, \
                variance_cents = ?6, \
                closing_notes = ?7, \
                updated_at = ?2 \
             WHERE id = ?1 AND status = 'abierta'",
        )
        .bind(session_id)
        .bind(now)
        .bind(closing_float)
        .bind(figures.sales_total_cents)
        .bind(figures.expenses_total_cents)
        .bind(figures.variance_cents)
        .bind(&closing_notes)
        .execute(&mut *tx)
        .await?;

        if result.rows_affected() == 0 {
            return Err(CoreError::SessionNotOpen(session_id).into());
        }

        tx.commit().await?;

        debug!(
            session_id,
            variance_cents = figures.variance_cents,
            exact = figures.exact_reconciliation,
            "cash session closed"
        );

        let closed = self
            .get_by_id(session_id)
            .await?
            .ok_or_else(|| DbError::not_found("cash session", session_id))?;

        Ok((closed, figures))
    }

    /// Administrative edit of a session. Only the shift label and the
    /// notes are updatable; status, floats, totals and variance are not
    /// reachable from here regardless of session state.
    pub async fn update_notes(
        &self,
        session_id: i64,
        shift: Option<Shift>,
        opening_notes: Option<String>,
        closing_notes: Option<String>,
    ) -> DbResult<CashSession> {
        let now = Utc::now();

        let result = sqlx::query(
            "UPDATE cash_sessions SET \
                shift = COALESCE(?2, shift), \
                opening_notes = COALESCE(?3, opening_notes), \
                closing_notes = COALESCE(?4, closing_notes), \
                updated_at = ?5 \
             WHERE id = ?1",
        )
        .bind(session_id)
        .bind(shift)
        .bind(&opening_notes)
        .bind(&closing_notes)
        .bind(now)
        .execute(&self.pool)
        .await?;

        if result.rows_affected() == 0 {
            return Err(DbError::not_found("cash session", session_id));
        }

        self.get_by_id(session_id)
            .await?
            .ok_or_else(|| DbError::not_found("cash session", session_id))
    }

    /// Lists active sessions, newest first, narrowed by the filter.
    pub async fn list(&self, filter: &SessionFilter) -> DbResult<Vec<CashSession>> {
        let mut qb: QueryBuilder<Sqlite> = QueryBuilder::new(format!(
            "SELECT {SESSION_COLUMNS} FROM cash_sessions WHERE is_active = 1"
        ));

        if let Some(operator_id) = filter.operator_id {
            qb.push(" AND operator_id = ").push_bind(operator_id);
        }
        if let Some(status) = filter.status {
            qb.push(" AND status = ").push_bind(status);
        }
        if let Some(shift) = filter.shift {
            qb.push(" AND shift = ").push_bind(shift);
        }
        if let Some(ref from) = filter.opened.from {
            qb.push(" AND date(opened_at) >= ").push_bind(from.clone());
        }
        if let Some(ref to) = filter.opened.to {
            qb.push(" AND date(opened_at) <= ").push_bind(to.clone());
        }

        qb.push(" ORDER BY opened_at DESC");

        let sessions = qb
            .build_query_as::<CashSession>()
            .fetch_all(&self.pool)
            .await?;

        Ok(sessions)
    }
}

/// Sums active sales and expenses linked to a session.
async fn session_activity(pool: &SqlitePool, session_id: i64) -> DbResult<(Money, Money)> {
    let sales: i64 = sqlx::query_scalar(
        "SELECT COALESCE(SUM(amount_cents), 0) FROM sales \
         WHERE session_id = ?1 AND is_active = 1",
    )
    .bind(session_id)
    .fetch_one(pool)
    .await?;

    let expenses: i64 = sqlx::query_scalar(
        "SELECT COALESCE(SUM(amount_cents), 0) FROM expenses \
         WHERE session_id = ?1 AND is_active = 1",
    )
    .bind(session_id)
    .fetch_one(pool)
    .await?;

    Ok((Money::from_cents(sales), Money::from_cents(expenses)))
}
