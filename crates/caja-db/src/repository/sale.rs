//! # Sale Repository
//!
//! Database operations for registered sales.
//!
//! Sales may be recorded without an open session (`session_id` null); those
//! rows exist for reporting but never enter a reconciliation. Deletion is
//! always soft: `is_active = 0` keeps the row for audit while removing it
//! from every listing, sum and report.

use chrono::Utc;
use sqlx::{QueryBuilder, Sqlite, SqlitePool};
use tracing::debug;

use caja_core::{Money, PaymentMethod, Sale, SaleChannel};

use crate::error::{DbError, DbResult};
use crate::filter::SaleFilter;

const SALE_COLUMNS: &str = "id, description, channel, amount_cents, method, recorded_at, \
     operator_id, session_id, exit_reference, notes, is_active";

/// Input for registering a sale. Amounts arrive pre-validated as positive
/// cents; descriptions pre-validated for length.
#[derive(Debug, Clone)]
pub struct NewSale {
    pub description: String,
    pub channel: SaleChannel,
    pub amount: Money,
    pub method: PaymentMethod,
    pub operator_id: i64,
    pub session_id: Option<i64>,
    pub exit_reference: Option<i64>,
    pub notes: Option<String>,
}

/// Repository for sale database operations.
#[derive(Debug, Clone)]
pub struct SaleRepository {
    pool: SqlitePool,
}

impl SaleRepository {
    pub fn new(pool: SqlitePool) -> Self {
        SaleRepository { pool }
    }

    /// Registers a sale.
    pub async fn create(&self, new: NewSale) -> DbResult<Sale> {
        let now = Utc::now();

        debug!(
            amount = %new.amount,
            method = ?new.method,
            session_id = ?new.session_id,
            "registering sale"
        );

        let result = sqlx::query(
            "INSERT INTO sales \
             (description, channel, amount_cents, method, recorded_at, \
              operator_id, session_id, exit_reference, notes, is_active) \
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, 1)",
        )
        .bind(&new.description)
        .bind(new.channel)
        .bind(new.amount)
        .bind(new.method)
        .bind(now)
        .bind(new.operator_id)
        .bind(new.session_id)
        .bind(new.exit_reference)
        .bind(&new.notes)
        .execute(&self.pool)
        .await?;

        let id = result.last_insert_rowid();
        self.get_by_id(id)
            .await?
            .ok_or_else(|| DbError::not_found("sale", id))
    }

    /// Gets a sale by id, including soft-deleted rows.
    pub async fn get_by_id(&self, id: i64) -> DbResult<Option<Sale>> {
        let sale = sqlx::query_as::<_, Sale>(&format!(
            "SELECT {SALE_COLUMNS} FROM sales WHERE id = ?1"
        ))
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(sale)
    }

    /// Lists active sales, newest first, narrowed by the filter.
    pub async fn list(&self, filter: &SaleFilter) -> DbResult<Vec<Sale>> {
        let mut qb: QueryBuilder<Sqlite> = QueryBuilder::new(format!(
            "SELECT {SALE_COLUMNS} FROM sales WHERE is_active = 1"
        ));

        if let Some(session_id) = filter.session_id {
            qb.push(" AND session_id = ").push_bind(session_id);
        }
        if let Some(method) = filter.method {
            qb.push(" AND method = ").push_bind(method);
        }
        if let Some(channel) = filter.channel {
            qb.push(" AND channel = ").push_bind(channel);
        }
        if let Some(ref from) = filter.recorded.from {
            qb.push(" AND date(recorded_at) >= ").push_bind(from.clone());
        }
        if let Some(ref to) = filter.recorded.to {
            qb.push(" AND date(recorded_at) <= ").push_bind(to.clone());
        }

        qb.push(" ORDER BY recorded_at DESC");

        let sales = qb.build_query_as::<Sale>().fetch_all(&self.pool).await?;
        Ok(sales)
    }

    /// Updates a sale's editable fields. Absent fields keep their value.
    /// The session link and timestamps are never editable.
    pub async fn update(
        &self,
        id: i64,
        description: Option<String>,
        channel: Option<SaleChannel>,
        amount: Option<Money>,
        method: Option<PaymentMethod>,
        notes: Option<String>,
    ) -> DbResult<Sale> {
        let result = sqlx::query(
            "UPDATE sales SET \
                description = COALESCE(?2, description), \
                channel = COALESCE(?3, channel), \
                amount_cents = COALESCE(?4, amount_cents), \
                method = COALESCE(?5, method), \
                notes = COALESCE(?6, notes) \
             WHERE id = ?1 AND is_active = 1",
        )
        .bind(id)
        .bind(&description)
        .bind(channel)
        .bind(amount)
        .bind(method)
        .bind(&notes)
        .execute(&self.pool)
        .await?;

        if result.rows_affected() == 0 {
            return Err(DbError::not_found("sale", id));
        }

        self.get_by_id(id)
            .await?
            .ok_or_else(|| DbError::not_found("sale", id))
    }

    /// Soft-deletes a sale. Idempotent only in the negative sense: a second
    /// delete of the same row reports not found.
    pub async fn soft_delete(&self, id: i64) -> DbResult<()> {
        let result = sqlx::query("UPDATE sales SET is_active = 0 WHERE id = ?1 AND is_active = 1")
            .bind(id)
            .execute(&self.pool)
            .await?;

        if result.rows_affected() == 0 {
            return Err(DbError::not_found("sale", id));
        }

        debug!(sale_id = id, "sale soft-deleted");
        Ok(())
    }
}
