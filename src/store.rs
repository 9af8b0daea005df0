//! SQLite-backed route store.
//!
//! Single owner of SQL for the `train_routes` table. The ingest pipeline
//! only talks to this module, so the stage that failed (lookup, max-id
//! lookup, delete, insert) is always identifiable from the error variant.

use sqlx::{QueryBuilder, Row, Sqlite, SqlitePool};

use crate::models::RouteRow;

/// Rows per INSERT statement, kept well under SQLite's bind parameter limit.
const INSERT_CHUNK_ROWS: usize = 500;

#[derive(Clone)]
pub struct RouteStore {
    pool: SqlitePool,
}

impl RouteStore {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    /// Look up the internal identifiers already stored for the given train
    /// numbers. Returns (train_number, train_id) pairs ordered by insertion,
    /// so a first-seen-wins fold over the result is deterministic even if
    /// storage holds conflicting duplicates.
    pub async fn existing_train_ids(
        &self,
        train_numbers: &[String],
    ) -> Result<Vec<(String, i64)>, StoreError> {
        if train_numbers.is_empty() {
            return Ok(Vec::new());
        }

        let placeholders = vec!["?"; train_numbers.len()].join(", ");
        let sql = format!(
            "SELECT train_number, train_id FROM train_routes \
             WHERE train_number IN ({placeholders}) ORDER BY id"
        );

        let mut query = sqlx::query(&sql);
        for number in train_numbers {
            query = query.bind(number);
        }

        let rows = query
            .fetch_all(&self.pool)
            .await
            .map_err(|e| StoreError::Lookup(e.to_string()))?;

        Ok(rows
            .iter()
            .map(|row| (row.get("train_number"), row.get("train_id")))
            .collect())
    }

    /// Highest train_id currently in use, or None on an empty store.
    pub async fn max_train_id(&self) -> Result<Option<i64>, StoreError> {
        let row = sqlx::query("SELECT MAX(train_id) AS max_id FROM train_routes")
            .fetch_one(&self.pool)
            .await
            .map_err(|e| StoreError::MaxId(e.to_string()))?;

        Ok(row.get("max_id"))
    }

    /// Replace the stored routes for a batch: delete every row belonging to
    /// the already-known train numbers, then bulk-insert the new rows. Both
    /// steps run in one transaction so a train's old and new stop sets are
    /// never visible as a mixed or empty state.
    pub async fn replace_routes(
        &self,
        known_train_numbers: &[String],
        rows: &[RouteRow],
    ) -> Result<u64, StoreError> {
        let mut tx = self
            .pool
            .begin()
            .await
            .map_err(|e| StoreError::Delete(e.to_string()))?;

        if !known_train_numbers.is_empty() {
            let placeholders = vec!["?"; known_train_numbers.len()].join(", ");
            let sql =
                format!("DELETE FROM train_routes WHERE train_number IN ({placeholders})");

            let mut query = sqlx::query(&sql);
            for number in known_train_numbers {
                query = query.bind(number);
            }

            query
                .execute(&mut *tx)
                .await
                .map_err(|e| StoreError::Delete(e.to_string()))?;
        }

        let mut inserted = 0u64;
        for chunk in rows.chunks(INSERT_CHUNK_ROWS) {
            let mut builder: QueryBuilder<Sqlite> = QueryBuilder::new(
                "INSERT INTO train_routes (train_id, train_number, train_name, \
                 station_from, station_to, running_days, station_sequence, \
                 station_code, station_name, arrives, departs, stop_duration, \
                 distance, platform, route_flag, day, status, uploaded_at) ",
            );

            builder.push_values(chunk, |mut b, row| {
                b.push_bind(row.train_id)
                    .push_bind(row.train_number.clone())
                    .push_bind(row.train_name.clone())
                    .push_bind(row.station_from.clone())
                    .push_bind(row.station_to.clone())
                    .push_bind(row.running_days.clone())
                    .push_bind(row.station_sequence)
                    .push_bind(row.station_code.clone())
                    .push_bind(row.station_name.clone())
                    .push_bind(row.arrives.clone())
                    .push_bind(row.departs.clone())
                    .push_bind(row.stop_duration.clone())
                    .push_bind(row.distance.clone())
                    .push_bind(row.platform.clone())
                    .push_bind(row.route_flag)
                    .push_bind(row.day)
                    .push_bind(row.status.clone())
                    .push_bind(row.uploaded_at.clone());
            });

            let result = builder
                .build()
                .execute(&mut *tx)
                .await
                .map_err(|e| StoreError::Insert(e.to_string()))?;
            inserted += result.rows_affected();
        }

        tx.commit()
            .await
            .map_err(|e| StoreError::Insert(e.to_string()))?;

        Ok(inserted)
    }

    /// Total stored route rows and distinct trains, for the health endpoint.
    pub async fn stats(&self) -> Result<(i64, i64), StoreError> {
        let row = sqlx::query(
            "SELECT COUNT(*) AS row_count, COUNT(DISTINCT train_number) AS train_count \
             FROM train_routes",
        )
        .fetch_one(&self.pool)
        .await
        .map_err(|e| StoreError::Lookup(e.to_string()))?;

        Ok((row.get("row_count"), row.get("train_count")))
    }
}

#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("Route lookup failed: {0}")]
    Lookup(String),
    #[error("Max train_id lookup failed: {0}")]
    MaxId(String),
    #[error("Route delete failed: {0}")]
    Delete(String),
    #[error("Route insert failed: {0}")]
    Insert(String),
}
