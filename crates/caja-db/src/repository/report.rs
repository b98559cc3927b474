//! # Report Repository
//!
//! Aggregation queries for the reporting endpoints. All aggregation happens
//! in SQL over active rows only; the grouped payment-method report is
//! zero-filled to the full method domain at the core layer.

use sqlx::{QueryBuilder, Sqlite, SqlitePool};

use caja_core::{CategorySummary, DailyReportRow, MethodSummary, MonthlyReportRow};

use crate::error::DbResult;
use crate::filter::DateRange;

/// Repository for reporting queries.
#[derive(Debug, Clone)]
pub struct ReportRepository {
    pool: SqlitePool,
}

impl ReportRepository {
    pub fn new(pool: SqlitePool) -> Self {
        ReportRepository { pool }
    }

    /// Sales grouped by payment method over a range. Only methods with
    /// activity appear; callers zero-fill via
    /// [`caja_core::reconcile::complete_method_summary`].
    pub async fn sales_by_method(&self, range: &DateRange) -> DbResult<Vec<MethodSummary>> {
        let mut qb: QueryBuilder<Sqlite> = QueryBuilder::new(
            "SELECT method, SUM(amount_cents) AS total_cents, COUNT(*) AS count \
             FROM sales WHERE is_active = 1",
        );
        push_range(&mut qb, range);
        qb.push(" GROUP BY method");

        let rows = qb
            .build_query_as::<MethodSummary>()
            .fetch_all(&self.pool)
            .await?;

        Ok(rows)
    }

    /// Expenses grouped by category name over a range, largest total first.
    pub async fn expenses_by_category(&self, range: &DateRange) -> DbResult<Vec<CategorySummary>> {
        let mut qb: QueryBuilder<Sqlite> = QueryBuilder::new(
            "SELECT c.name AS category, SUM(e.amount_cents) AS total_cents, \
                    COUNT(*) AS count \
             FROM expenses e \
             JOIN expense_categories c ON c.id = e.category_id \
             WHERE e.is_active = 1",
        );
        if let Some(ref from) = range.from {
            qb.push(" AND date(e.recorded_at) >= ").push_bind(from.clone());
        }
        if let Some(ref to) = range.to {
            qb.push(" AND date(e.recorded_at) <= ").push_bind(to.clone());
        }
        qb.push(" GROUP BY c.name ORDER BY total_cents DESC");

        let rows = qb
            .build_query_as::<CategorySummary>()
            .fetch_all(&self.pool)
            .await?;

        Ok(rows)
    }

    /// Daily sales-vs-expenses rollup over a range, oldest day first. Days
    /// with activity on only one side still get a row, with the silent side
    /// at zero.
    pub async fn daily(&self, range: &DateRange) -> DbResult<Vec<DailyReportRow>> {
        let mut qb: QueryBuilder<Sqlite> = QueryBuilder::new(
            "SELECT day, \
                    SUM(sales_cents) AS sales_cents, \
                    SUM(expenses_cents) AS expenses_cents, \
                    SUM(sales_cents) - SUM(expenses_cents) AS difference_cents \
             FROM ( \
                 SELECT date(recorded_at) AS day, amount_cents AS sales_cents, \
                        0 AS expenses_cents \
                 FROM sales WHERE is_active = 1 \
                 UNION ALL \
                 SELECT date(recorded_at) AS day, 0 AS sales_cents, \
                        amount_cents AS expenses_cents \
                 FROM expenses WHERE is_active = 1 \
             )",
        );

        let mut first = true;
        if let Some(ref from) = range.from {
            qb.push(" WHERE day >= ").push_bind(from.clone());
            first = false;
        }
        if let Some(ref to) = range.to {
            qb.push(if first { " WHERE " } else { " AND " });
            qb.push("day <= ").push_bind(to.clone());
        }

        qb.push(" GROUP BY day ORDER BY day ASC");

        let rows = qb
            .build_query_as::<DailyReportRow>()
            .fetch_all(&self.pool)
            .await?;

        Ok(rows)
    }

    /// Monthly sales-vs-expenses rollup for a year, optionally narrowed to
    /// one month. Months are `YYYY-MM`.
    pub async fn monthly(&self, year: i32, month: Option<u32>) -> DbResult<Vec<MonthlyReportRow>> {
        let prefix = match month {
            Some(m) => format!("{year:04}-{m:02}"),
            None => format!("{year:04}"),
        };
        let pattern = format!("{prefix}%");

        let rows = sqlx::query_as::<_, MonthlyReportRow>(
            "SELECT month, \
                    SUM(sales_cents) AS sales_cents, \
                    SUM(expenses_cents) AS expenses_cents, \
                    SUM(sales_cents) - SUM(expenses_cents) AS difference_cents \
             FROM ( \
                 SELECT strftime('%Y-%m', recorded_at) AS month, \
                        amount_cents AS sales_cents, 0 AS expenses_cents \
                 FROM sales WHERE is_active = 1 \
                 UNION ALL \
                 SELECT strftime('%Y-%m', recorded_at) AS month, \
                        0 AS sales_cents, amount_cents AS expenses_cents \
                 FROM expenses WHERE is_active = 1 \
             ) \
             WHERE month LIKE ?1 \
             GROUP BY month ORDER BY month ASC",
        )
        .bind(pattern)
        .fetch_all(&self.pool)
        .await?;

        Ok(rows)
    }
}

fn push_range(qb: &mut QueryBuilder<'_, Sqlite>, range: &DateRange) {
    if let Some(ref from) = range.from {
        qb.push(" AND date(recorded_at) >= ").push_bind(from.clone());
    }
    if let Some(ref to) = range.to {
        qb.push(" AND date(recorded_at) <= ").push_bind(to.clone());
    }
}
