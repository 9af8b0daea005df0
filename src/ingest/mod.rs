//! CSV route-upload reconciliation.
//!
//! One upload is processed start-to-finish as a single batch:
//! parse -> normalize/group -> resolve identities -> replace-commit.
//! Row-level problems are skipped with diagnostics; stage-level problems
//! abort the whole upload with nothing applied.

pub mod commit;
pub mod normalize;
pub mod reader;
pub mod resolve;

pub use reader::SkippedRow;

use tracing::{info, warn};

use crate::store::{RouteStore, StoreError};

/// Counts returned to the caller after a successful upload.
#[derive(Debug)]
pub struct UploadSummary {
    /// Route rows written to the store.
    pub inserted: u64,
    /// Distinct trains whose routes were replaced or created.
    pub trains_affected: usize,
    /// Data rows dropped during parsing/normalization, with reasons.
    pub skipped: Vec<SkippedRow>,
}

#[derive(Debug, thiserror::Error)]
pub enum UploadError {
    #[error("Upload is empty")]
    EmptyCsv,
    #[error("Upload has no parseable route rows")]
    NoParseableRows,
    #[error("Nothing to insert after resolution")]
    NothingToInsert,
    #[error(transparent)]
    Store(#[from] StoreError),
}

/// Run one upload batch against the store.
///
/// Every stage either completes fully or aborts the upload; there is no
/// partial commit. Re-running the same upload is idempotent: identifiers
/// are reused and each train's stop set is wholly replaced, never merged.
pub async fn process_upload(
    store: &RouteStore,
    raw: &str,
) -> Result<UploadSummary, UploadError> {
    if raw.trim().is_empty() {
        return Err(UploadError::EmptyCsv);
    }

    let batch = normalize::normalize(reader::parse(raw));
    if batch.trains.is_empty() {
        return Err(UploadError::NoParseableRows);
    }

    let assignment = resolve::resolve(store, &batch).await?;

    let rows = commit::build_rows(&batch, &assignment);
    if rows.is_empty() {
        return Err(UploadError::NothingToInsert);
    }

    let outcome = commit::replace(store, &batch, &assignment, rows).await?;

    if !batch.skipped.is_empty() {
        warn!(skipped = batch.skipped.len(), "Dropped unusable rows during upload");
    }
    info!(
        inserted = outcome.inserted,
        trains = outcome.trains_affected,
        "Replaced routes from upload"
    );

    Ok(UploadSummary {
        inserted: outcome.inserted,
        trains_affected: outcome.trains_affected,
        skipped: batch.skipped,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use sqlx::SqlitePool;

    const SCENARIO_CSV: &str = "trainNumber,trainName,StnNumber,StationCode\n\
                                12345,Shatabdi Express,1,NDLS\n\
                                12345,Shatabdi Express,2,AGC\n\
                                67890,Duronto Express,1,BCT\n";

    async fn stored_rows(pool: &SqlitePool, train_number: &str) -> Vec<(i64, Option<String>)> {
        sqlx::query_as(
            "SELECT train_id, station_code FROM train_routes \
             WHERE train_number = ? ORDER BY station_sequence",
        )
        .bind(train_number)
        .fetch_all(pool)
        .await
        .unwrap()
    }

    async fn total_rows(pool: &SqlitePool) -> i64 {
        sqlx::query_scalar("SELECT COUNT(*) FROM train_routes")
            .fetch_one(pool)
            .await
            .unwrap()
    }

    #[sqlx::test]
    async fn test_upload_into_empty_store(pool: SqlitePool) {
        let store = RouteStore::new(pool.clone());
        let summary = process_upload(&store, SCENARIO_CSV).await.unwrap();

        assert_eq!(summary.inserted, 3);
        assert_eq!(summary.trains_affected, 2);
        assert!(summary.skipped.is_empty());

        // Identifiers start at 1 on an empty store and are assigned in
        // first-appearance order, distinct and sequential.
        let first = stored_rows(&pool, "12345").await;
        let second = stored_rows(&pool, "67890").await;
        assert_eq!(first.len(), 2);
        assert_eq!(second.len(), 1);
        assert_eq!(first[0].0, 1);
        assert_eq!(second[0].0, 2);
    }

    #[sqlx::test]
    async fn test_reupload_is_idempotent(pool: SqlitePool) {
        let store = RouteStore::new(pool.clone());
        let first = process_upload(&store, SCENARIO_CSV).await.unwrap();
        let second = process_upload(&store, SCENARIO_CSV).await.unwrap();

        assert_eq!(second.inserted, first.inserted);
        assert_eq!(second.trains_affected, first.trains_affected);
        assert_eq!(total_rows(&pool).await, 3);

        // Same identifiers as the first upload.
        assert_eq!(stored_rows(&pool, "12345").await[0].0, 1);
        assert_eq!(stored_rows(&pool, "67890").await[0].0, 2);
    }

    #[sqlx::test]
    async fn test_reupload_replaces_not_merges(pool: SqlitePool) {
        let store = RouteStore::new(pool.clone());
        let full = "trainNumber,StnNumber,stationCode\n\
                    12345,1,A\n\
                    12345,2,B\n\
                    12345,3,C\n";
        process_upload(&store, full).await.unwrap();

        let trimmed = "trainNumber,StnNumber,stationCode\n\
                       12345,1,A\n\
                       12345,2,B\n";
        let summary = process_upload(&store, trimmed).await.unwrap();
        assert_eq!(summary.inserted, 2);

        let rows = stored_rows(&pool, "12345").await;
        let codes: Vec<_> = rows.iter().filter_map(|r| r.1.as_deref()).collect();
        assert_eq!(codes, vec!["A", "B"]);
    }

    #[sqlx::test]
    async fn test_existing_train_keeps_its_id(pool: SqlitePool) {
        let store = RouteStore::new(pool.clone());
        sqlx::query(
            "INSERT INTO train_routes (train_id, train_number, status, uploaded_at) \
             VALUES (7, '12345', 'ACTIVE', '2026-01-01T00:00:00Z')",
        )
        .execute(&pool)
        .await
        .unwrap();

        process_upload(&store, SCENARIO_CSV).await.unwrap();

        // 12345 keeps id 7; the new train allocates above the stored max.
        assert_eq!(stored_rows(&pool, "12345").await[0].0, 7);
        assert_eq!(stored_rows(&pool, "67890").await[0].0, 8);
    }

    #[sqlx::test]
    async fn test_new_ids_exceed_stored_max_and_are_distinct(pool: SqlitePool) {
        let store = RouteStore::new(pool.clone());
        sqlx::query(
            "INSERT INTO train_routes (train_id, train_number, status, uploaded_at) \
             VALUES (40, '99999', 'ACTIVE', '2026-01-01T00:00:00Z')",
        )
        .execute(&pool)
        .await
        .unwrap();

        let csv = "trainNumber,StnNumber\n11111,1\n22222,1\n33333,1\n";
        process_upload(&store, csv).await.unwrap();

        let ids: Vec<i64> = sqlx::query_scalar(
            "SELECT DISTINCT train_id FROM train_routes \
             WHERE train_number != '99999' ORDER BY train_id",
        )
        .fetch_all(&pool)
        .await
        .unwrap();
        assert_eq!(ids, vec![41, 42, 43]);
    }

    #[sqlx::test]
    async fn test_denormalized_fields_consistent_across_rows(pool: SqlitePool) {
        let store = RouteStore::new(pool.clone());
        // Second row disagrees on the train name; the group-level value wins
        // so all stored rows stay identical in the denormalized columns.
        let csv = "trainNumber,trainName,StnNumber\n\
                   12345,Shatabdi Express,1\n\
                   12345,Wrong Name,2\n";
        process_upload(&store, csv).await.unwrap();

        let names: Vec<Option<String>> =
            sqlx::query_scalar("SELECT train_name FROM train_routes WHERE train_number = '12345'")
                .fetch_all(&pool)
                .await
                .unwrap();
        assert_eq!(names.len(), 2);
        assert!(names
            .iter()
            .all(|n| n.as_deref() == Some("Shatabdi Express")));
    }

    #[sqlx::test]
    async fn test_rows_stamped_active(pool: SqlitePool) {
        let store = RouteStore::new(pool.clone());
        process_upload(&store, SCENARIO_CSV).await.unwrap();

        let statuses: Vec<String> = sqlx::query_scalar("SELECT status FROM train_routes")
            .fetch_all(&pool)
            .await
            .unwrap();
        assert!(statuses.iter().all(|s| s == "ACTIVE"));
    }

    #[sqlx::test]
    async fn test_empty_file_rejected(pool: SqlitePool) {
        let store = RouteStore::new(pool.clone());
        let err = process_upload(&store, "").await.unwrap_err();
        assert!(matches!(err, UploadError::EmptyCsv));
        assert_eq!(total_rows(&pool).await, 0);
    }

    #[sqlx::test]
    async fn test_whitespace_only_file_rejected(pool: SqlitePool) {
        let store = RouteStore::new(pool.clone());
        let err = process_upload(&store, "  \n \n").await.unwrap_err();
        assert!(matches!(err, UploadError::EmptyCsv));
    }

    #[sqlx::test]
    async fn test_header_only_file_rejected(pool: SqlitePool) {
        let store = RouteStore::new(pool.clone());
        let err = process_upload(&store, "trainNumber,trainName\n")
            .await
            .unwrap_err();
        assert!(matches!(err, UploadError::NoParseableRows));
        assert_eq!(total_rows(&pool).await, 0);
    }

    #[sqlx::test]
    async fn test_no_resolvable_train_number_rejected(pool: SqlitePool) {
        let store = RouteStore::new(pool.clone());
        let csv = "stationCode,stationName\nNDLS,New Delhi\nAGC,Agra Cantt\n";
        let err = process_upload(&store, csv).await.unwrap_err();
        assert!(matches!(err, UploadError::NoParseableRows));
        assert_eq!(total_rows(&pool).await, 0);
    }

    #[sqlx::test]
    async fn test_skipped_rows_reported_on_success(pool: SqlitePool) {
        let store = RouteStore::new(pool.clone());
        let csv = "trainNumber,stationCode\n\
                   12345,NDLS\n\
                   ,AGC\n";
        let summary = process_upload(&store, csv).await.unwrap();

        assert_eq!(summary.inserted, 1);
        assert_eq!(summary.trains_affected, 1);
        assert_eq!(summary.skipped.len(), 1);
        assert_eq!(summary.skipped[0].row, 3);
        assert_eq!(summary.skipped[0].reason, "missing train number");
    }

    #[sqlx::test]
    async fn test_upload_does_not_touch_other_trains(pool: SqlitePool) {
        let store = RouteStore::new(pool.clone());
        process_upload(&store, SCENARIO_CSV).await.unwrap();

        // Re-upload only one of the two trains; the other keeps its rows.
        let csv = "trainNumber,StnNumber,stationCode\n12345,1,NDLS\n";
        process_upload(&store, csv).await.unwrap();

        assert_eq!(stored_rows(&pool, "12345").await.len(), 1);
        assert_eq!(stored_rows(&pool, "67890").await.len(), 1);
        assert_eq!(stored_rows(&pool, "67890").await[0].0, 2);
    }
}
