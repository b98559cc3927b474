//! Integration tests for the repositories, running against an in-memory
//! SQLite database with the real migrations applied.

use caja_db::repository::{NewExpense, NewMovement, NewSale};
use caja_db::{Database, DbConfig, DbError, ExpenseFilter, MovementFilter, SaleFilter};

use caja_core::{
    CoreError, Money, MovementKind, OperatorRole, PaymentMethod, SaleChannel, SessionStatus, Shift,
};

async fn test_db() -> Database {
    Database::new(DbConfig::in_memory()).await.unwrap()
}

/// Seeds one operator and returns its id. Tests exercise money flows, not
/// credential handling, so the hash is a placeholder PHC string.
async fn seed_operator(db: &Database) -> i64 {
    let operator = db
        .operators()
        .create(
            "Marta",
            "marta@example.com",
            "$argon2id$v=19$m=19456,t=2,p=1$c2FsdHNhbHQ$AAAAAAAAAAA",
            OperatorRole::Operator,
        )
        .await
        .unwrap();
    operator.id
}

fn sale(operator_id: i64, session_id: Option<i64>, cents: i64, method: PaymentMethod) -> NewSale {
    NewSale {
        description: format!("FV-{cents}"),
        channel: SaleChannel::InStore,
        amount: Money::from_cents(cents),
        method,
        operator_id,
        session_id,
        exit_reference: None,
        notes: None,
    }
}

fn expense(operator_id: i64, session_id: Option<i64>, cents: i64) -> NewExpense {
    NewExpense {
        description: "Flete".to_string(),
        category_id: 2, // Transporte, seeded by the initial migration
        subcategory_id: None,
        amount: Money::from_cents(cents),
        method: PaymentMethod::Cash,
        operator_id,
        session_id,
    }
}

// =============================================================================
// Session lifecycle
// =============================================================================

#[tokio::test]
async fn open_session_starts_open_with_float() {
    let db = test_db().await;
    let op = seed_operator(&db).await;

    let session = db
        .sessions()
        .open(op, Shift::Morning, Money::from_cents(100_000), None)
        .await
        .unwrap();

    assert_eq!(session.status, SessionStatus::Open);
    assert_eq!(session.opening_float_cents, 100_000);
    assert!(session.closed_at.is_none());
    assert!(session.variance_cents.is_none());
}

#[tokio::test]
async fn second_open_for_same_operator_is_rejected() {
    let db = test_db().await;
    let op = seed_operator(&db).await;

    let first = db
        .sessions()
        .open(op, Shift::Morning, Money::from_cents(50_000), None)
        .await
        .unwrap();

    let err = db
        .sessions()
        .open(op, Shift::Afternoon, Money::from_cents(50_000), None)
        .await
        .unwrap_err();

    match err {
        DbError::Domain(CoreError::SessionAlreadyOpen {
            operator_id,
            session_id,
        }) => {
            assert_eq!(operator_id, op);
            assert_eq!(session_id, first.id);
        }
        other => panic!("expected SessionAlreadyOpen, got {other:?}"),
    }
}

#[tokio::test]
async fn operator_can_open_again_after_closing() {
    let db = test_db().await;
    let op = seed_operator(&db).await;

    let first = db
        .sessions()
        .open(op, Shift::Morning, Money::from_cents(10_000), None)
        .await
        .unwrap();

    db.sessions()
        .close(first.id, Money::from_cents(10_000), None)
        .await
        .unwrap();

    let second = db
        .sessions()
        .open(op, Shift::Afternoon, Money::from_cents(20_000), None)
        .await
        .unwrap();

    assert_ne!(second.id, first.id);
}

/// The canonical scenario: open 100000, sell 50000, spend 20000, count
/// 130000. Expected is 130000 and the reconciliation is exact.
#[tokio::test]
async fn close_reconciles_exactly_when_count_matches() {
    let db = test_db().await;
    let op = seed_operator(&db).await;

    let session = db
        .sessions()
        .open(op, Shift::Morning, Money::from_cents(100_000), None)
        .await
        .unwrap();

    db.sales()
        .create(sale(op, Some(session.id), 50_000, PaymentMethod::Cash))
        .await
        .unwrap();
    db.expenses()
        .create(expense(op, Some(session.id), 20_000))
        .await
        .unwrap();

    let (closed, figures) = db
        .sessions()
        .close(session.id, Money::from_cents(130_000), None)
        .await
        .unwrap();

    assert_eq!(closed.status, SessionStatus::Closed);
    assert_eq!(figures.expected_cents, 130_000);
    assert_eq!(figures.variance_cents, 0);
    assert!(figures.exact_reconciliation);
    assert_eq!(closed.sales_total_cents, 50_000);
    assert_eq!(closed.expenses_total_cents, 20_000);
    assert_eq!(closed.variance_cents, Some(0));
}

#[tokio::test]
async fn close_records_shortage_as_negative_variance() {
    let db = test_db().await;
    let op = seed_operator(&db).await;

    let session = db
        .sessions()
        .open(op, Shift::Morning, Money::from_cents(100_000), None)
        .await
        .unwrap();

    db.sales()
        .create(sale(op, Some(session.id), 50_000, PaymentMethod::Cash))
        .await
        .unwrap();

    let (_, figures) = db
        .sessions()
        .close(session.id, Money::from_cents(148_500), None)
        .await
        .unwrap();

    assert_eq!(figures.variance_cents, -1_500);
    assert!(!figures.exact_reconciliation);
}

#[tokio::test]
async fn closing_twice_fails() {
    let db = test_db().await;
    let op = seed_operator(&db).await;

    let session = db
        .sessions()
        .open(op, Shift::Morning, Money::from_cents(10_000), None)
        .await
        .unwrap();

    db.sessions()
        .close(session.id, Money::from_cents(10_000), None)
        .await
        .unwrap();

    let err = db
        .sessions()
        .close(session.id, Money::from_cents(10_000), None)
        .await
        .unwrap_err();

    assert!(matches!(
        err,
        DbError::Domain(CoreError::SessionNotOpen(id)) if id == session.id
    ));
}

#[tokio::test]
async fn soft_deleted_sales_do_not_count_toward_close() {
    let db = test_db().await;
    let op = seed_operator(&db).await;

    let session = db
        .sessions()
        .open(op, Shift::Morning, Money::from_cents(10_000), None)
        .await
        .unwrap();

    let kept = db
        .sales()
        .create(sale(op, Some(session.id), 5_000, PaymentMethod::Cash))
        .await
        .unwrap();
    let removed = db
        .sales()
        .create(sale(op, Some(session.id), 7_000, PaymentMethod::Card))
        .await
        .unwrap();

    db.sales().soft_delete(removed.id).await.unwrap();

    let totals = db.sessions().totals(session.id).await.unwrap();
    assert_eq!(totals.sales_total_cents, kept.amount_cents);
    assert_eq!(totals.net_expected_cents, 15_000);
}

#[tokio::test]
async fn totals_preview_matches_close_figures() {
    let db = test_db().await;
    let op = seed_operator(&db).await;

    let session = db
        .sessions()
        .open(op, Shift::Afternoon, Money::from_cents(30_000), None)
        .await
        .unwrap();

    db.sales()
        .create(sale(op, Some(session.id), 12_000, PaymentMethod::Nequi))
        .await
        .unwrap();
    db.expenses()
        .create(expense(op, Some(session.id), 2_000))
        .await
        .unwrap();

    let totals = db.sessions().totals(session.id).await.unwrap();

    let (_, figures) = db
        .sessions()
        .close(session.id, totals.net_expected(), None)
        .await
        .unwrap();

    assert_eq!(figures.expected_cents, totals.net_expected_cents);
    assert!(figures.exact_reconciliation);
}

#[tokio::test]
async fn closed_session_accepts_note_edits_only() {
    let db = test_db().await;
    let op = seed_operator(&db).await;

    let session = db
        .sessions()
        .open(op, Shift::Morning, Money::from_cents(10_000), None)
        .await
        .unwrap();
    db.sessions()
        .close(session.id, Money::from_cents(10_000), None)
        .await
        .unwrap();

    let updated = db
        .sessions()
        .update_notes(
            session.id,
            Some(Shift::Afternoon),
            Some("turno corregido".to_string()),
            Some("cuadre revisado".to_string()),
        )
        .await
        .unwrap();

    assert_eq!(updated.shift, Shift::Afternoon);
    assert_eq!(updated.opening_notes.as_deref(), Some("turno corregido"));
    assert_eq!(updated.closing_notes.as_deref(), Some("cuadre revisado"));
    // The reconciliation is untouched.
    assert_eq!(updated.status, SessionStatus::Closed);
    assert_eq!(updated.variance_cents, Some(0));
}

// =============================================================================
// Sales and expenses
// =============================================================================

#[tokio::test]
async fn sale_without_session_is_listed_but_unlinked() {
    let db = test_db().await;
    let op = seed_operator(&db).await;

    let created = db
        .sales()
        .create(sale(op, None, 9_900, PaymentMethod::Daviplata))
        .await
        .unwrap();
    assert!(created.session_id.is_none());

    let listed = db.sales().list(&SaleFilter::default()).await.unwrap();
    assert_eq!(listed.len(), 1);
    assert_eq!(listed[0].id, created.id);
}

#[tokio::test]
async fn sale_list_filters_by_method() {
    let db = test_db().await;
    let op = seed_operator(&db).await;

    db.sales()
        .create(sale(op, None, 1_000, PaymentMethod::Cash))
        .await
        .unwrap();
    db.sales()
        .create(sale(op, None, 2_000, PaymentMethod::ALaMano))
        .await
        .unwrap();

    let filter = SaleFilter {
        method: Some(PaymentMethod::ALaMano),
        ..Default::default()
    };
    let listed = db.sales().list(&filter).await.unwrap();
    assert_eq!(listed.len(), 1);
    assert_eq!(listed[0].amount_cents, 2_000);
}

#[tokio::test]
async fn deleting_a_sale_twice_reports_not_found() {
    let db = test_db().await;
    let op = seed_operator(&db).await;

    let created = db
        .sales()
        .create(sale(op, None, 3_000, PaymentMethod::Cash))
        .await
        .unwrap();

    db.sales().soft_delete(created.id).await.unwrap();
    let err = db.sales().soft_delete(created.id).await.unwrap_err();
    assert!(matches!(err, DbError::NotFound { .. }));

    // The row itself survives for audit.
    let row = db.sales().get_by_id(created.id).await.unwrap().unwrap();
    assert!(!row.is_active);
}

#[tokio::test]
async fn expense_requires_existing_category() {
    let db = test_db().await;
    let op = seed_operator(&db).await;

    let mut bad = expense(op, None, 1_000);
    bad.category_id = 999;

    let err = db.expenses().create(bad).await.unwrap_err();
    assert!(matches!(err, DbError::NotFound { .. }));
}

#[tokio::test]
async fn expense_subcategory_must_belong_to_category() {
    let db = test_db().await;
    let op = seed_operator(&db).await;

    // Subcategory 4 (Domicilios) belongs to category 2, not category 1.
    let mut bad = expense(op, None, 1_000);
    bad.category_id = 1;
    bad.subcategory_id = Some(4);

    let err = db.expenses().create(bad).await.unwrap_err();
    assert!(matches!(
        err,
        DbError::Domain(CoreError::SubcategoryMismatch { .. })
    ));
}

#[tokio::test]
async fn expense_with_matching_subcategory_is_accepted() {
    let db = test_db().await;
    let op = seed_operator(&db).await;

    let mut good = expense(op, None, 4_500);
    good.subcategory_id = Some(4); // Domicilios under Transporte

    let created = db.expenses().create(good).await.unwrap();
    assert_eq!(created.subcategory_id, Some(4));

    let filter = ExpenseFilter {
        category_id: Some(2),
        ..Default::default()
    };
    let listed = db.expenses().list(&filter).await.unwrap();
    assert_eq!(listed.len(), 1);
}

#[tokio::test]
async fn seeded_categories_and_subcategories_are_listed() {
    let db = test_db().await;

    let categories = db.expenses().categories().await.unwrap();
    assert_eq!(categories.len(), 3);

    let servicios = categories.iter().find(|c| c.name == "Servicios").unwrap();
    let subs = db.expenses().subcategories(servicios.id).await.unwrap();
    assert_eq!(subs.len(), 3);
    assert!(subs.iter().all(|s| s.category_id == servicios.id));
}

// =============================================================================
// Safe ledger
// =============================================================================

#[tokio::test]
async fn empty_ledger_has_zero_balance() {
    let db = test_db().await;
    assert_eq!(db.safe().current_balance().await.unwrap(), Money::zero());
}

#[tokio::test]
async fn movements_chain_balances() {
    let db = test_db().await;
    let op = seed_operator(&db).await;

    let deposit = db
        .safe()
        .register(NewMovement {
            kind: MovementKind::Deposit,
            amount: Money::from_cents(200_000),
            description: "Consignación inicial".to_string(),
            operator_id: op,
            session_id: None,
        })
        .await
        .unwrap();

    assert_eq!(deposit.balance_before_cents, 0);
    assert_eq!(deposit.balance_after_cents, 200_000);

    let withdrawal = db
        .safe()
        .register(NewMovement {
            kind: MovementKind::Withdrawal,
            amount: Money::from_cents(50_000),
            description: "Base para caja".to_string(),
            operator_id: op,
            session_id: None,
        })
        .await
        .unwrap();

    assert_eq!(withdrawal.balance_before_cents, 200_000);
    assert_eq!(withdrawal.balance_after_cents, 150_000);
    assert_eq!(
        db.safe().current_balance().await.unwrap().cents(),
        150_000
    );
}

#[tokio::test]
async fn deposit_then_equal_withdrawal_returns_to_start() {
    let db = test_db().await;
    let op = seed_operator(&db).await;

    for kind in [MovementKind::Deposit, MovementKind::Withdrawal] {
        db.safe()
            .register(NewMovement {
                kind,
                amount: Money::from_cents(75_000),
                description: "Movimiento".to_string(),
                operator_id: op,
                session_id: None,
            })
            .await
            .unwrap();
    }

    assert_eq!(db.safe().current_balance().await.unwrap(), Money::zero());
}

#[tokio::test]
async fn withdrawal_beyond_balance_is_refused() {
    let db = test_db().await;
    let op = seed_operator(&db).await;

    db.safe()
        .register(NewMovement {
            kind: MovementKind::Deposit,
            amount: Money::from_cents(10_000),
            description: "Depósito".to_string(),
            operator_id: op,
            session_id: None,
        })
        .await
        .unwrap();

    let err = db
        .safe()
        .register(NewMovement {
            kind: MovementKind::Withdrawal,
            amount: Money::from_cents(10_001),
            description: "Retiro".to_string(),
            operator_id: op,
            session_id: None,
        })
        .await
        .unwrap_err();

    match err {
        DbError::Domain(CoreError::InsufficientSafeBalance {
            balance_cents,
            requested_cents,
        }) => {
            assert_eq!(balance_cents, 10_000);
            assert_eq!(requested_cents, 10_001);
        }
        other => panic!("expected InsufficientSafeBalance, got {other:?}"),
    }

    // The refused movement left no row behind.
    assert_eq!(db.safe().current_balance().await.unwrap().cents(), 10_000);
}

#[tokio::test]
async fn withdrawing_the_full_balance_is_allowed() {
    let db = test_db().await;
    let op = seed_operator(&db).await;

    db.safe()
        .register(NewMovement {
            kind: MovementKind::Deposit,
            amount: Money::from_cents(30_000),
            description: "Depósito".to_string(),
            operator_id: op,
            session_id: None,
        })
        .await
        .unwrap();

    db.safe()
        .register(NewMovement {
            kind: MovementKind::Withdrawal,
            amount: Money::from_cents(30_000),
            description: "Retiro total".to_string(),
            operator_id: op,
            session_id: None,
        })
        .await
        .unwrap();

    assert_eq!(db.safe().current_balance().await.unwrap(), Money::zero());
}

#[tokio::test]
async fn only_the_latest_movement_can_be_undone() {
    let db = test_db().await;
    let op = seed_operator(&db).await;

    let first = db
        .safe()
        .register(NewMovement {
            kind: MovementKind::Deposit,
            amount: Money::from_cents(10_000),
            description: "Primero".to_string(),
            operator_id: op,
            session_id: None,
        })
        .await
        .unwrap();

    let second = db
        .safe()
        .register(NewMovement {
            kind: MovementKind::Deposit,
            amount: Money::from_cents(5_000),
            description: "Segundo".to_string(),
            operator_id: op,
            session_id: None,
        })
        .await
        .unwrap();

    // Interior delete refused.
    let err = db.safe().soft_delete(first.id).await.unwrap_err();
    assert!(matches!(
        err,
        DbError::Domain(CoreError::MovementNotDeletable { .. })
    ));

    // Undoing the tip restores the prior balance.
    db.safe().soft_delete(second.id).await.unwrap();
    assert_eq!(db.safe().current_balance().await.unwrap().cents(), 10_000);

    // The first movement is the tip now and can be undone too.
    db.safe().soft_delete(first.id).await.unwrap();
    assert_eq!(db.safe().current_balance().await.unwrap(), Money::zero());
}

#[tokio::test]
async fn movement_list_filters_by_kind() {
    let db = test_db().await;
    let op = seed_operator(&db).await;

    for (kind, cents) in [
        (MovementKind::Deposit, 20_000),
        (MovementKind::Withdrawal, 5_000),
        (MovementKind::Deposit, 1_000),
    ] {
        db.safe()
            .register(NewMovement {
                kind,
                amount: Money::from_cents(cents),
                description: "Movimiento".to_string(),
                operator_id: op,
                session_id: None,
            })
            .await
            .unwrap();
    }

    let filter = MovementFilter {
        kind: Some(MovementKind::Deposit),
        ..Default::default()
    };
    let deposits = db.safe().list(&filter).await.unwrap();
    assert_eq!(deposits.len(), 2);

    let history = db
        .safe()
        .history(&caja_db::DateRange::default())
        .await
        .unwrap();
    assert_eq!(history.len(), 3);
    // Ascending: each row's balance_before is the previous row's balance_after.
    for pair in history.windows(2) {
        assert_eq!(pair[1].balance_before_cents, pair[0].balance_after_cents);
    }
}

// =============================================================================
// Reports
// =============================================================================

#[tokio::test]
async fn sales_by_method_groups_and_counts() {
    let db = test_db().await;
    let op = seed_operator(&db).await;

    db.sales()
        .create(sale(op, None, 10_000, PaymentMethod::Cash))
        .await
        .unwrap();
    db.sales()
        .create(sale(op, None, 15_000, PaymentMethod::Cash))
        .await
        .unwrap();
    db.sales()
        .create(sale(op, None, 8_000, PaymentMethod::Card))
        .await
        .unwrap();

    let rows = db
        .reports()
        .sales_by_method(&caja_db::DateRange::default())
        .await
        .unwrap();

    assert_eq!(rows.len(), 2);
    let cash = rows
        .iter()
        .find(|r| r.method == PaymentMethod::Cash)
        .unwrap();
    assert_eq!(cash.total_cents, 25_000);
    assert_eq!(cash.count, 2);

    // The API completes the domain to all six methods.
    let complete = caja_core::reconcile::complete_method_summary(rows);
    assert_eq!(complete.len(), 6);
    assert_eq!(complete.iter().map(|r| r.total_cents).sum::<i64>(), 33_000);
}

#[tokio::test]
async fn daily_report_nets_sales_against_expenses() {
    let db = test_db().await;
    let op = seed_operator(&db).await;

    db.sales()
        .create(sale(op, None, 40_000, PaymentMethod::Cash))
        .await
        .unwrap();
    db.expenses()
        .create(expense(op, None, 15_000))
        .await
        .unwrap();

    let rows = db
        .reports()
        .daily(&caja_db::DateRange::default())
        .await
        .unwrap();

    assert_eq!(rows.len(), 1);
    assert_eq!(rows[0].sales_cents, 40_000);
    assert_eq!(rows[0].expenses_cents, 15_000);
    assert_eq!(rows[0].difference_cents, 25_000);
}

#[tokio::test]
async fn monthly_report_rolls_up_current_month() {
    let db = test_db().await;
    let op = seed_operator(&db).await;

    db.sales()
        .create(sale(op, None, 100_000, PaymentMethod::Bancolombia))
        .await
        .unwrap();

    let now = chrono::Utc::now();
    use chrono::Datelike;

    let rows = db.reports().monthly(now.year(), None).await.unwrap();
    assert_eq!(rows.len(), 1);
    assert_eq!(rows[0].sales_cents, 100_000);
    assert_eq!(rows[0].month, now.format("%Y-%m").to_string());

    // Narrowed to a month with no activity.
    let other_month = if now.month() == 1 { 2 } else { 1 };
    let empty = db
        .reports()
        .monthly(now.year(), Some(other_month))
        .await
        .unwrap();
    assert!(empty.is_empty());
}

#[tokio::test]
async fn expenses_by_category_uses_category_names() {
    let db = test_db().await;
    let op = seed_operator(&db).await;

    db.expenses()
        .create(expense(op, None, 12_000))
        .await
        .unwrap();

    let mut servicios = expense(op, None, 3_000);
    servicios.category_id = 1;
    db.expenses().create(servicios).await.unwrap();

    let rows = db
        .reports()
        .expenses_by_category(&caja_db::DateRange::default())
        .await
        .unwrap();

    assert_eq!(rows.len(), 2);
    // Largest total first.
    assert_eq!(rows[0].category, "Transporte");
    assert_eq!(rows[0].total_cents, 12_000);
    assert_eq!(rows[1].category, "Servicios");
}

// =============================================================================
// Operators
// =============================================================================

#[tokio::test]
async fn operator_lookup_by_email_returns_credentials() {
    let db = test_db().await;
    let op = seed_operator(&db).await;

    let record = db
        .operators()
        .find_by_email("marta@example.com")
        .await
        .unwrap()
        .unwrap();

    assert_eq!(record.id, op);
    assert!(record.password_hash.starts_with("$argon2id$"));

    let profile = record.into_operator();
    assert_eq!(profile.role, OperatorRole::Operator);

    assert!(db
        .operators()
        .find_by_email("nadie@example.com")
        .await
        .unwrap()
        .is_none());
}

#[tokio::test]
async fn duplicate_operator_email_is_a_unique_violation() {
    let db = test_db().await;
    seed_operator(&db).await;

    let err = db
        .operators()
        .create("Otra", "marta@example.com", "$argon2id$x", OperatorRole::Admin)
        .await
        .unwrap_err();

    assert!(matches!(err, DbError::UniqueViolation { .. }));
}

#[tokio::test]
async fn concurrent_open_hits_the_unique_index_not_a_made_up_session() {
    let db = test_db().await;
    let op = seed_operator(&db).await;

    let first = db
        .sessions()
        .open(op, Shift::Morning, Money::from_cents(100_000), None)
        .await
        .unwrap();

    // Bypass the repository pre-check: insert a second open row directly,
    // the way a racing writer would after the pre-check passed.
    let err = sqlx::query(
        "INSERT INTO cash_sessions \
         (operator_id, shift, status, opened_at, opening_float_cents, \
          sales_total_cents, expenses_total_cents, is_active, updated_at) \
         VALUES (?1, 'tarde', 'abierta', datetime('now'), 0, 0, 0, 1, datetime('now'))",
    )
    .bind(op)
    .execute(db.pool())
    .await
    .unwrap_err();

    assert!(matches!(
        DbError::from(err),
        DbError::UniqueViolation { .. }
    ));

    // The surviving open session is still the first one, with its real id.
    let open = db.sessions().find_open(op).await.unwrap().unwrap();
    assert_eq!(open.id, first.id);
    assert!(open.id > 0);
}
