//! # Transaction Repository
//!
//! The stock engine. Every stock change in the system happens here.
//!
//! ## Invariants
//! - Recording a transaction and moving the item's stock commit together
//! - Stock never goes below zero: an "out" larger than stock is rejected,
//!   and deleting an "in" whose quantity was already consumed clamps at zero
//! - A rejected operation leaves no trace
//!
//! ## Recording an "out"
//! ```text
//! BEGIN IMMEDIATE                      ← write lock first, waits on busy_timeout
//!   SELECT stock FROM items            → NotFound / InsufficientStock
//!   UPDATE items SET stock = stock - q
//!     WHERE id = ? AND stock >= q      → 0 rows: lost a race, InsufficientStock
//!   INSERT INTO transactions
//! COMMIT
//! ```

use chrono::Utc;
use sqlx::SqlitePool;
use stockroom_core::requests::{NewTransaction, TransactionFilter};
use stockroom_core::stock::{apply_transaction, reverse_delta};
use stockroom_core::validation::validate_quantity;
use stockroom_core::{
    CoreError, DeletedTransaction, EntityKind, Page, PageRequest, Transaction, TransactionDetail,
    TransactionKind,
};
use tracing::{debug, info, warn};

use crate::error::{DbError, DbResult};
use crate::repository::generate_id;

const TRANSACTION_DETAIL_SELECT: &str = r#"
    SELECT
        t.id,
        t.item_id,
        i.name AS item_name,
        t.date,
        t.quantity,
        t.transaction_type,
        t.description,
        t.user_id,
        u.username,
        i.stock AS current_stock,
        t.created_at
    FROM transactions t
    JOIN items i ON i.id = t.item_id
    JOIN users u ON u.id = t.user_id
"#;

/// Takes the write lock when the unit of work opens, so concurrent writers
/// queue on the busy timeout. A deferred `BEGIN` that has already read
/// gets `SQLITE_BUSY` immediately when it tries to write.
const BEGIN_WRITE: &str = "BEGIN IMMEDIATE";

const TRANSACTION_FILTER: &str = r#"
    WHERE (?1 = '' OR i.name LIKE '%' || ?1 || '%')
      AND (?2 IS NULL OR t.date >= ?2)
      AND (?3 IS NULL OR t.date <= ?3)
      AND (?4 IS NULL OR t.transaction_type = ?4)
"#;

/// Repository for stock transactions.
///
/// ## Usage
/// ```rust,ignore
/// let recorded = db.transactions().create(new_tx).await?;
/// println!("{} now at {}", recorded.item_name, recorded.current_stock);
///
/// let deleted = db.transactions().delete(&recorded.id).await?;
/// if let Some(warning) = deleted.warning {
///     println!("{warning}");
/// }
/// ```
#[derive(Debug, Clone)]
pub struct TransactionRepository {
    pool: SqlitePool,
}

impl TransactionRepository {
    /// Creates a new TransactionRepository.
    pub fn new(pool: SqlitePool) -> Self {
        TransactionRepository { pool }
    }

    /// Records a movement and applies it to the item's stock atomically.
    ///
    /// ## Returns
    /// * `Ok(TransactionDetail)` - With the item's stock after the movement
    /// * `Err(NotFound)` - No such item
    /// * `Err(InsufficientStock)` - An "out" larger than current stock
    pub async fn create(&self, new_tx: NewTransaction) -> DbResult<TransactionDetail> {
        validate_quantity(new_tx.quantity).map_err(CoreError::invalid_field)?;

        debug!(
            item_id = %new_tx.item_id,
            kind = %new_tx.kind,
            quantity = new_tx.quantity,
            "Recording transaction"
        );

        let mut tx = self.pool.begin_with(BEGIN_WRITE).await?;

        let current_stock: i64 = sqlx::query_scalar("SELECT stock FROM items WHERE id = ?1")
            .bind(&new_tx.item_id)
            .fetch_optional(&mut *tx)
            .await?
            .ok_or_else(|| DbError::not_found(EntityKind::Item, &new_tx.item_id))?;

        let new_stock = apply_transaction(current_stock, new_tx.kind, new_tx.quantity)?;

        let updated = match new_tx.kind {
            TransactionKind::In => {
                sqlx::query("UPDATE items SET stock = stock + ?2, updated_at = ?3 WHERE id = ?1")
                    .bind(&new_tx.item_id)
                    .bind(new_tx.quantity)
                    .bind(Utc::now())
                    .execute(&mut *tx)
                    .await?
            }
            TransactionKind::Out => {
                sqlx::query(
                    r#"
                    UPDATE items SET stock = stock - ?2, updated_at = ?3
                    WHERE id = ?1 AND stock >= ?2
                    "#,
                )
                .bind(&new_tx.item_id)
                .bind(new_tx.quantity)
                .bind(Utc::now())
                .execute(&mut *tx)
                .await?
            }
        };

        if updated.rows_affected() == 0 {
            let current_stock: i64 = sqlx::query_scalar("SELECT stock FROM items WHERE id = ?1")
                .bind(&new_tx.item_id)
                .fetch_one(&mut *tx)
                .await?;
            return Err(CoreError::InsufficientStock {
                current_stock,
                required: new_tx.quantity,
            }
            .into());
        }

        let id = generate_id();
        let now = Utc::now();

        sqlx::query(
            r#"
            INSERT INTO transactions (
                id, item_id, date, quantity, transaction_type, description, user_id,
                created_at, updated_at
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9)
            "#,
        )
        .bind(&id)
        .bind(&new_tx.item_id)
        .bind(new_tx.date)
        .bind(new_tx.quantity)
        .bind(new_tx.kind)
        .bind(&new_tx.description)
        .bind(&new_tx.user_id)
        .bind(now)
        .bind(now)
        .execute(&mut *tx)
        .await?;

        tx.commit().await?;

        info!(
            id = %id,
            item_id = %new_tx.item_id,
            stock = new_stock,
            "Transaction recorded"
        );

        self.get_detail(&id).await
    }

    /// Deletes a transaction and reverses its effect on stock atomically.
    ///
    /// Reversing an "in" whose goods already left clamps stock at zero and
    /// reports a warning instead of failing.
    pub async fn delete(&self, id: &str) -> DbResult<DeletedTransaction> {
        debug!(id = %id, "Deleting transaction");

        let mut tx = self.pool.begin_with(BEGIN_WRITE).await?;

        let (item_id, quantity, kind, current_stock): (String, i64, TransactionKind, i64) =
            sqlx::query_as(
                r#"
                SELECT t.item_id, t.quantity, t.transaction_type, i.stock
                FROM transactions t
                JOIN items i ON i.id = t.item_id
                WHERE t.id = ?1
                "#,
            )
            .bind(id)
            .fetch_optional(&mut *tx)
            .await?
            .ok_or_else(|| DbError::not_found(EntityKind::Transaction, id))?;

        let reversal = reverse_delta(current_stock, kind, quantity);

        sqlx::query("DELETE FROM transactions WHERE id = ?1")
            .bind(id)
            .execute(&mut *tx)
            .await?;

        sqlx::query(
            "UPDATE items SET stock = MAX(stock + ?2, 0), updated_at = ?3 WHERE id = ?1",
        )
        .bind(&item_id)
        .bind(-kind.delta(quantity))
        .bind(Utc::now())
        .execute(&mut *tx)
        .await?;

        let resulting_stock: i64 = sqlx::query_scalar("SELECT stock FROM items WHERE id = ?1")
            .bind(&item_id)
            .fetch_one(&mut *tx)
            .await?;

        tx.commit().await?;

        if reversal.clamped {
            warn!(
                id = %id,
                item_id = %item_id,
                original_stock = reversal.original_stock,
                "Stock clamped at zero while reversing transaction"
            );
        }

        Ok(DeletedTransaction {
            transaction_id: id.to_string(),
            item_id,
            current_stock: resulting_stock,
            warning: reversal.warning(),
        })
    }

    /// Gets the stored transaction by ID.
    pub async fn find_by_id(&self, id: &str) -> DbResult<Option<Transaction>> {
        let transaction = sqlx::query_as::<_, Transaction>(
            r#"
            SELECT id, item_id, date, quantity, transaction_type, description, user_id,
                   created_at, updated_at
            FROM transactions
            WHERE id = ?1
            "#,
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(transaction)
    }

    /// Gets a transaction with item name, username and current stock.
    pub async fn get_detail(&self, id: &str) -> DbResult<TransactionDetail> {
        let sql = format!("{TRANSACTION_DETAIL_SELECT} WHERE t.id = ?1");

        sqlx::query_as::<_, TransactionDetail>(&sql)
            .bind(id)
            .fetch_optional(&self.pool)
            .await?
            .ok_or_else(|| DbError::not_found(EntityKind::Transaction, id))
    }

    /// Lists transactions matching `filter`, latest business date first.
    pub async fn list(
        &self,
        filter: &TransactionFilter,
        page: PageRequest,
    ) -> DbResult<Page<TransactionDetail>> {
        let sql = format!(
            r#"{TRANSACTION_DETAIL_SELECT}
            {TRANSACTION_FILTER}
            ORDER BY t.date DESC, t.created_at DESC, t.id DESC
            LIMIT ?5 OFFSET ?6
            "#
        );

        let transactions = sqlx::query_as::<_, TransactionDetail>(&sql)
            .bind(&filter.search)
            .bind(filter.start_date)
            .bind(filter.end_date)
            .bind(filter.kind)
            .bind(page.limit())
            .bind(page.offset())
            .fetch_all(&self.pool)
            .await?;

        let count_sql = format!(
            r#"
            SELECT COUNT(*)
            FROM transactions t
            JOIN items i ON i.id = t.item_id
            {TRANSACTION_FILTER}
            "#
        );

        let total: i64 = sqlx::query_scalar(&count_sql)
            .bind(&filter.search)
            .bind(filter.start_date)
            .bind(filter.end_date)
            .bind(filter.kind)
            .fetch_one(&self.pool)
            .await?;

        Ok(Page::new(transactions, page, total))
    }

    /// Counts transactions.
    pub async fn count(&self) -> DbResult<i64> {
        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM transactions")
            .fetch_one(&self.pool)
            .await?;

        Ok(count)
    }
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::repository::test_support::{database, fixtures};
    use crate::{Database, DbConfig};
    use chrono::NaiveDate;
    use stockroom_core::requests::NewItem;
    use stockroom_core::stock::ledger_stock;
    use stockroom_core::CLAMPED_STOCK_WARNING;

    fn date(raw: &str) -> NaiveDate {
        NaiveDate::parse_from_str(raw, "%Y-%m-%d").unwrap()
    }

    async fn item(db: &Database, name: &str, minimum_stock: i64) -> (String, String) {
        let (unit_id, type_id, user_id) = fixtures(db).await;
        let item = db
            .items()
            .create(NewItem {
                name: name.to_string(),
                type_id,
                unit_id,
                minimum_stock,
                image: None,
            })
            .await
            .unwrap();
        (item.id, user_id)
    }

    fn movement(
        item_id: &str,
        user_id: &str,
        kind: TransactionKind,
        quantity: i64,
        on: &str,
    ) -> NewTransaction {
        NewTransaction {
            item_id: item_id.to_string(),
            date: date(on),
            quantity,
            kind,
            description: None,
            user_id: user_id.to_string(),
        }
    }

    async fn stock_of(db: &Database, item_id: &str) -> i64 {
        db.items().find_by_id(item_id).await.unwrap().unwrap().stock
    }

    #[tokio::test]
    async fn test_worked_example() {
        let db = database().await;
        let (item_id, user_id) = item(&db, "Laptop", 5).await;
        let repo = db.transactions();

        let received = repo
            .create(movement(&item_id, &user_id, TransactionKind::In, 10, "2024-01-01"))
            .await
            .unwrap();
        assert_eq!(received.current_stock, 10);
        assert_eq!(received.item_name, "Laptop");
        assert_eq!(received.username, "admin");

        let shipped = repo
            .create(movement(&item_id, &user_id, TransactionKind::Out, 8, "2024-01-02"))
            .await
            .unwrap();
        assert_eq!(shipped.current_stock, 2);
        assert_eq!(db.items().low_stock().await.unwrap().len(), 1);

        let deleted = repo.delete(&received.id).await.unwrap();
        assert_eq!(deleted.current_stock, 0);
        assert_eq!(deleted.warning.as_deref(), Some(CLAMPED_STOCK_WARNING));
        assert_eq!(stock_of(&db, &item_id).await, 0);

        let summary = db
            .reports()
            .inventory_summary(Some(TransactionKind::In))
            .await
            .unwrap();
        assert_eq!(summary.items_in, Some(0));
        assert_eq!(summary.total_items, None);
    }

    #[tokio::test]
    async fn test_insufficient_out_changes_nothing() {
        let db = database().await;
        let (item_id, user_id) = item(&db, "Laptop", 0).await;
        let repo = db.transactions();

        repo.create(movement(&item_id, &user_id, TransactionKind::In, 3, "2024-01-01"))
            .await
            .unwrap();

        let err = repo
            .create(movement(&item_id, &user_id, TransactionKind::Out, 4, "2024-01-02"))
            .await
            .unwrap_err();
        assert!(matches!(
            err,
            DbError::Domain(CoreError::InsufficientStock {
                current_stock: 3,
                required: 4,
            })
        ));

        assert_eq!(stock_of(&db, &item_id).await, 3);
        assert_eq!(repo.count().await.unwrap(), 1);
    }

    #[tokio::test]
    async fn test_out_equal_to_stock_empties_item() {
        let db = database().await;
        let (item_id, user_id) = item(&db, "Laptop", 0).await;
        let repo = db.transactions();

        repo.create(movement(&item_id, &user_id, TransactionKind::In, 4, "2024-01-01"))
            .await
            .unwrap();
        let out = repo
            .create(movement(&item_id, &user_id, TransactionKind::Out, 4, "2024-01-01"))
            .await
            .unwrap();
        assert_eq!(out.current_stock, 0);
    }

    #[tokio::test]
    async fn test_missing_item_and_zero_quantity() {
        let db = database().await;
        let (_, user_id) = item(&db, "Laptop", 0).await;
        let repo = db.transactions();

        let err = repo
            .create(movement("missing", &user_id, TransactionKind::In, 1, "2024-01-01"))
            .await
            .unwrap_err();
        assert!(matches!(
            err,
            DbError::Domain(CoreError::NotFound {
                entity: EntityKind::Item,
                ..
            })
        ));

        let err = repo
            .create(movement("missing", &user_id, TransactionKind::In, 0, "2024-01-01"))
            .await
            .unwrap_err();
        assert!(matches!(
            err,
            DbError::Domain(CoreError::ValidationFailed(_))
        ));
        assert_eq!(repo.count().await.unwrap(), 0);
    }

    #[tokio::test]
    async fn test_deleting_out_restores_stock() {
        let db = database().await;
        let (item_id, user_id) = item(&db, "Laptop", 0).await;
        let repo = db.transactions();

        repo.create(movement(&item_id, &user_id, TransactionKind::In, 10, "2024-01-01"))
            .await
            .unwrap();
        let out = repo
            .create(movement(&item_id, &user_id, TransactionKind::Out, 6, "2024-01-02"))
            .await
            .unwrap();

        let deleted = repo.delete(&out.id).await.unwrap();
        assert_eq!(deleted.current_stock, 10);
        assert!(deleted.warning.is_none());
        assert!(repo.find_by_id(&out.id).await.unwrap().is_none());

        let err = repo.delete(&out.id).await.unwrap_err();
        assert!(matches!(
            err,
            DbError::Domain(CoreError::NotFound {
                entity: EntityKind::Transaction,
                ..
            })
        ));
    }

    #[tokio::test]
    async fn test_stock_matches_ledger() {
        let db = database().await;
        let (item_id, user_id) = item(&db, "Laptop", 0).await;
        let repo = db.transactions();

        let script = [
            (TransactionKind::In, 7),
            (TransactionKind::Out, 3),
            (TransactionKind::Out, 9),
            (TransactionKind::In, 2),
            (TransactionKind::Out, 6),
            (TransactionKind::In, 5),
        ];

        let mut accepted = Vec::new();
        for (kind, quantity) in script {
            if repo
                .create(movement(&item_id, &user_id, kind, quantity, "2024-02-01"))
                .await
                .is_ok()
            {
                accepted.push((kind, quantity));
            }
        }

        // 7 - 3 = 4, 9 rejected, +2 = 6, -6 = 0, +5 = 5
        assert_eq!(accepted.len(), 5);
        assert_eq!(stock_of(&db, &item_id).await, ledger_stock(&accepted));
        assert_eq!(stock_of(&db, &item_id).await, 5);
    }

    enum Step {
        Create(TransactionKind, i64),
        /// Delete the n-th accepted movement.
        Delete(usize),
    }

    #[tokio::test]
    async fn test_stock_follows_model_through_creates_and_deletes() {
        use Step::{Create, Delete};
        use TransactionKind::{In, Out};

        let db = database().await;
        let (item_id, user_id) = item(&db, "Laptop", 0).await;
        let repo = db.transactions();

        let script = [
            Create(In, 10),
            Create(Out, 4),
            Create(In, 3),
            Delete(1),
            Create(Out, 12),
            Delete(2),
            Create(Out, 1),
            Create(In, 2),
            Delete(3),
            Delete(0),
        ];

        let mut model: i64 = 0;
        // (id, kind, quantity, still live)
        let mut accepted: Vec<(String, TransactionKind, i64, bool)> = Vec::new();
        let mut clamped_once = false;

        for (step, op) in script.iter().enumerate() {
            match *op {
                Create(kind, quantity) => {
                    let result = repo
                        .create(movement(&item_id, &user_id, kind, quantity, "2024-02-01"))
                        .await;
                    if kind == Out && quantity > model {
                        assert!(
                            matches!(
                                result,
                                Err(DbError::Domain(CoreError::InsufficientStock { .. }))
                            ),
                            "step {step}"
                        );
                    } else {
                        let recorded = result.unwrap();
                        model += kind.delta(quantity);
                        assert_eq!(recorded.current_stock, model, "step {step}");
                        accepted.push((recorded.id, kind, quantity, true));
                    }
                }
                Delete(n) => {
                    let (id, kind, quantity, _) = accepted[n].clone();
                    let deleted = repo.delete(&id).await.unwrap();
                    accepted[n].3 = false;

                    let unclamped = model - kind.delta(quantity);
                    model = unclamped.max(0);
                    clamped_once |= unclamped < 0;
                    assert_eq!(deleted.current_stock, model, "step {step}");
                    assert_eq!(deleted.warning.is_some(), unclamped < 0, "step {step}");
                }
            }

            assert_eq!(stock_of(&db, &item_id).await, model, "step {step}");

            // Until a reversal clamps, stock is exactly the ledger of live rows.
            if !clamped_once {
                let live: Vec<(TransactionKind, i64)> = accepted
                    .iter()
                    .filter(|(.., live)| *live)
                    .map(|(_, kind, quantity, _)| (*kind, *quantity))
                    .collect();
                assert_eq!(model, ledger_stock(&live), "step {step}");
            }
        }

        // in 10, out 4, in 3, -out 4, out 12, -in 3 (clamped), out 1 rejected,
        // in 2, -out 12, -in 10
        assert!(clamped_once);
        assert_eq!(model, 4);
    }

    #[tokio::test]
    async fn test_quantity_that_overflows_stock_is_rejected() {
        let db = database().await;
        let (item_id, user_id) = item(&db, "Laptop", 0).await;
        let repo = db.transactions();

        repo.create(movement(&item_id, &user_id, TransactionKind::In, i64::MAX, "2024-01-01"))
            .await
            .unwrap();

        let err = repo
            .create(movement(&item_id, &user_id, TransactionKind::In, 1, "2024-01-02"))
            .await
            .unwrap_err();
        match err {
            DbError::Domain(CoreError::ValidationFailed(errors)) => {
                assert!(errors.get("quantity").is_some());
            }
            other => panic!("unexpected: {other:?}"),
        }

        assert_eq!(stock_of(&db, &item_id).await, i64::MAX);
        assert_eq!(repo.count().await.unwrap(), 1);
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_concurrent_movements_on_file_database() {
        let dir = std::env::temp_dir().join(format!("stockroom-db-{}", generate_id()));
        std::fs::create_dir_all(&dir).unwrap();
        let db = Database::new(DbConfig::new(dir.join("stockroom.db")).max_connections(8))
            .await
            .unwrap();

        let (unit_id, type_id, user_id) = fixtures(&db).await;
        let mut item_ids = Vec::new();
        for n in 0..8 {
            let item = db
                .items()
                .create(NewItem {
                    name: format!("Item {n}"),
                    type_id: type_id.clone(),
                    unit_id: unit_id.clone(),
                    minimum_stock: 0,
                    image: None,
                })
                .await
                .unwrap();
            item_ids.push(item.id);
        }

        // 40 receipts spread over 8 items, all at once
        let mut handles = Vec::new();
        for n in 0..40 {
            let repo = db.transactions();
            let tx = movement(&item_ids[n % 8], &user_id, TransactionKind::In, 1, "2024-03-01");
            handles.push(tokio::spawn(async move { repo.create(tx).await }));
        }
        for handle in handles {
            handle.await.unwrap().unwrap();
        }
        for item_id in &item_ids {
            assert_eq!(stock_of(&db, item_id).await, 5);
        }

        // 10 competing shipments of 1 against a stock of 5
        let mut handles = Vec::new();
        for _ in 0..10 {
            let repo = db.transactions();
            let tx = movement(&item_ids[0], &user_id, TransactionKind::Out, 1, "2024-03-02");
            handles.push(tokio::spawn(async move { repo.create(tx).await }));
        }
        let mut shipped = 0;
        for handle in handles {
            match handle.await.unwrap() {
                Ok(_) => shipped += 1,
                Err(DbError::Domain(CoreError::InsufficientStock { .. })) => {}
                Err(other) => panic!("unexpected: {other:?}"),
            }
        }
        assert_eq!(shipped, 5);
        assert_eq!(stock_of(&db, &item_ids[0]).await, 0);
        assert_eq!(db.transactions().count().await.unwrap(), 45);

        db.close().await;
        let _ = std::fs::remove_dir_all(&dir);
    }

    #[tokio::test]
    async fn test_list_filters_and_order() {
        let db = database().await;
        let (item_id, user_id) = item(&db, "Laptop", 0).await;
        let repo = db.transactions();

        repo.create(movement(&item_id, &user_id, TransactionKind::In, 10, "2024-01-05"))
            .await
            .unwrap();
        repo.create(movement(&item_id, &user_id, TransactionKind::Out, 1, "2024-01-10"))
            .await
            .unwrap();
        repo.create(movement(&item_id, &user_id, TransactionKind::Out, 2, "2024-01-20"))
            .await
            .unwrap();

        let all = repo
            .list(&TransactionFilter::default(), PageRequest::default())
            .await
            .unwrap();
        let dates: Vec<NaiveDate> = all.data.iter().map(|t| t.date).collect();
        assert_eq!(
            dates,
            vec![date("2024-01-20"), date("2024-01-10"), date("2024-01-05")]
        );
        assert!(all.data.iter().all(|t| t.current_stock == 7));

        let outs_in_range =
            TransactionFilter::parse(None, Some("2024-01-01"), Some("2024-01-15"), Some("out"))
                .unwrap();
        let page = repo.list(&outs_in_range, PageRequest::default()).await.unwrap();
        assert_eq!(page.pagination.total_data, 1);
        assert_eq!(page.data[0].quantity, 1);

        let by_name = TransactionFilter::parse(Some("lap"), None, None, None).unwrap();
        assert_eq!(
            repo.list(&by_name, PageRequest::default())
                .await
                .unwrap()
                .pagination
                .total_data,
            3
        );

        let none = TransactionFilter::parse(Some("Mouse"), None, None, None).unwrap();
        assert!(repo
            .list(&none, PageRequest::default())
            .await
            .unwrap()
            .data
            .is_empty());

        let far = repo
            .list(
                &TransactionFilter::default(),
                PageRequest::new(Some(i64::MAX), None),
            )
            .await
            .unwrap();
        assert!(far.data.is_empty());
        assert_eq!(far.pagination.total_data, 3);
    }
}
