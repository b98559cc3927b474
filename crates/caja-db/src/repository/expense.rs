//! # Expense Repository
//!
//! Database operations for expenses and the category/subcategory reference
//! lists.
//!
//! Every expense references exactly one active category; a subcategory is
//! optional but, when given, must belong to that category. Both checks run
//! before the insert so a bad payload yields a domain error instead of a
//! bare foreign-key violation.

use chrono::Utc;
use sqlx::{QueryBuilder, Sqlite, SqlitePool};
use tracing::debug;

use caja_core::{CoreError, Expense, ExpenseCategory, ExpenseSubcategory, Money, PaymentMethod};

use crate::error::{DbError, DbResult};
use crate::filter::ExpenseFilter;

const EXPENSE_COLUMNS: &str = "id, description, category_id, subcategory_id, amount_cents, \
     method, recorded_at, operator_id, session_id, is_active";

/// Input for registering an expense.
#[derive(Debug, Clone)]
pub struct NewExpense {
    pub description: String,
    pub category_id: i64,
    pub subcategory_id: Option<i64>,
    pub amount: Money,
    pub method: PaymentMethod,
    pub operator_id: i64,
    pub session_id: Option<i64>,
}

/// Repository for expense database operations.
#[derive(Debug, Clone)]
pub struct ExpenseRepository {
    pool: SqlitePool,
}

impl ExpenseRepository {
    pub fn new(pool: SqlitePool) -> Self {
        ExpenseRepository { pool }
    }

    /// Registers an expense.
    ///
    /// Fails with not-found when the category does not exist or is inactive,
    /// and with [`CoreError::SubcategoryMismatch`] when the subcategory does
    /// not belong to the category.
    pub async fn create(&self, new: NewExpense) -> DbResult<Expense> {
        let category_exists: i64 = sqlx::query_scalar(
            "SELECT COUNT(*) FROM expense_categories WHERE id = ?1 AND is_active = 1",
        )
        .bind(new.category_id)
        .fetch_one(&self.pool)
        .await?;

        if category_exists == 0 {
            return Err(DbError::not_found("expense category", new.category_id));
        }

        if let Some(subcategory_id) = new.subcategory_id {
            let parent: Option<i64> = sqlx::query_scalar(
                "SELECT category_id FROM expense_subcategories WHERE id = ?1 AND is_active = 1",
            )
            .bind(subcategory_id)
            .fetch_optional(&self.pool)
            .await?;

            match parent {
                None => {
                    return Err(DbError::not_found("expense subcategory", subcategory_id));
                }
                Some(parent_id) if parent_id != new.category_id => {
                    return Err(CoreError::SubcategoryMismatch {
                        subcategory_id,
                        category_id: new.category_id,
                    }
                    .into());
                }
                Some(_) => {}
            }
        }

        let now = Utc::now();

        debug!(
            amount = %new.amount,
            category_id = new.category_id,
            session_id = ?new.session_id,
            "registering expense"
        );

        let result = sqlx::query(
            "INSERT INTO expenses \
             (description, category_id, subcategory_id, amount_cents, method, \
              recorded_at, operator_id, session_id, is_active) \
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, 1)",
        )
        .bind(&new.description)
        .bind(new.category_id)
        .bind(new.subcategory_id)
        .bind(new.amount)
        .bind(new.method)
        .bind(now)
        .bind(new.operator_id)
        .bind(new.session_id)
        .execute(&self.pool)
        .await?;

        let id = result.last_insert_rowid();
        self.get_by_id(id)
            .await?
            .ok_or_else(|| DbError::not_found("expense", id))
    }

    /// Gets an expense by id, including soft-deleted rows.
    pub async fn get_by_id(&self, id: i64) -> DbResult<Option<Expense>> {
        let expense = sqlx::query_as::<_, Expense>(&format!(
            "SELECT {EXPENSE_COLUMNS} FROM expenses WHERE id = ?1"
        ))
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(expense)
    }

    /// Lists active expenses, newest first, narrowed by the filter.
    pub async fn list(&self, filter: &ExpenseFilter) -> DbResult<Vec<Expense>> {
        let mut qb: QueryBuilder<Sqlite> = QueryBuilder::new(format!(
            "SELECT {EXPENSE_COLUMNS} FROM expenses WHERE is_active = 1"
        ));

        if let Some(session_id) = filter.session_id {
            qb.push(" AND session_id = ").push_bind(session_id);
        }
        if let Some(category_id) = filter.category_id {
            qb.push(" AND category_id = ").push_bind(category_id);
        }
        if let Some(subcategory_id) = filter.subcategory_id {
            qb.push(" AND subcategory_id = ").push_bind(subcategory_id);
        }
        if let Some(method) = filter.method {
            qb.push(" AND method = ").push_bind(method);
        }
        if let Some(ref from) = filter.recorded.from {
            qb.push(" AND date(recorded_at) >= ").push_bind(from.clone());
        }
        if let Some(ref to) = filter.recorded.to {
            qb.push(" AND date(recorded_at) <= ").push_bind(to.clone());
        }

        qb.push(" ORDER BY recorded_at DESC");

        let expenses = qb.build_query_as::<Expense>().fetch_all(&self.pool).await?;
        Ok(expenses)
    }

    /// Updates an expense's editable fields. Absent fields keep their value.
    /// Re-categorizing goes through the same parent check as creation.
    pub async fn update(
        &self,
        id: i64,
        description: Option<String>,
        category_id: Option<i64>,
        subcategory_id: Option<i64>,
        amount: Option<Money>,
        method: Option<PaymentMethod>,
    ) -> DbResult<Expense> {
        let current = self
            .get_by_id(id)
            .await?
            .filter(|e| e.is_active)
            .ok_or_else(|| DbError::not_found("expense", id))?;

        let effective_category = category_id.unwrap_or(current.category_id);
        let effective_subcategory = subcategory_id.or(current.subcategory_id);

        if let Some(sub_id) = effective_subcategory {
            let parent: Option<i64> = sqlx::query_scalar(
                "SELECT category_id FROM expense_subcategories WHERE id = ?1 AND is_active = 1",
            )
            .bind(sub_id)
            .fetch_optional(&self.pool)
            .await?;

            match parent {
                None => return Err(DbError::not_found("expense subcategory", sub_id)),
                Some(parent_id) if parent_id != effective_category => {
                    return Err(CoreError::SubcategoryMismatch {
                        subcategory_id: sub_id,
                        category_id: effective_category,
                    }
                    .into());
                }
                Some(_) => {}
            }
        }

        let result = sqlx::query(
            "UPDATE expenses SET \
                description = COALESCE(?2, description), \
                category_id = COALESCE(?3, category_id), \
                subcategory_id = COALESCE(?4, subcategory_id), \
                amount_cents = COALESCE(?5, amount_cents), \
                method = COALESCE(?6, method) \
             WHERE id = ?1 AND is_active = 1",
        )
        .bind(id)
        .bind(&description)
        .bind(category_id)
        .bind(subcategory_id)
        .bind(amount)
        .bind(method)
        .execute(&self.pool)
        .await?;

        if result.rows_affected() == 0 {
            return Err(DbError::not_found("expense", id));
        }

        self.get_by_id(id)
            .await?
            .ok_or_else(|| DbError::not_found("expense", id))
    }

    /// Soft-deletes an expense.
    pub async fn soft_delete(&self, id: i64) -> DbResult<()> {
        let result =
            sqlx::query("UPDATE expenses SET is_active = 0 WHERE id = ?1 AND is_active = 1")
                .bind(id)
                .execute(&self.pool)
                .await?;

        if result.rows_affected() == 0 {
            return Err(DbError::not_found("expense", id));
        }

        debug!(expense_id = id, "expense soft-deleted");
        Ok(())
    }

    /// Lists active expense categories, alphabetically.
    pub async fn categories(&self) -> DbResult<Vec<ExpenseCategory>> {
        let categories = sqlx::query_as::<_, ExpenseCategory>(
            "SELECT id, name, description, is_active FROM expense_categories \
             WHERE is_active = 1 ORDER BY name",
        )
        .fetch_all(&self.pool)
        .await?;

        Ok(categories)
    }

    /// Lists active subcategories of a category, alphabetically.
    pub async fn subcategories(&self, category_id: i64) -> DbResult<Vec<ExpenseSubcategory>> {
        let subcategories = sqlx::query_as::<_, ExpenseSubcategory>(
            "SELECT id, category_id, name, description, is_active \
             FROM expense_subcategories \
             WHERE category_id = ?1 AND is_active = 1 ORDER BY name",
        )
        .bind(category_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(subcategories)
    }
}
