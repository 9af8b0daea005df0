//! Replace-commit: build the full insertion set and swap it in for the
//! previously stored routes of every affected train.

use crate::models::{RouteRow, STATUS_ACTIVE};
use crate::store::{RouteStore, StoreError};

use super::normalize::NormalizedBatch;
use super::resolve::IdAssignment;

#[derive(Debug)]
pub struct CommitOutcome {
    pub inserted: u64,
    pub trains_affected: usize,
}

/// Materialize the insertion set for a batch. Every row gets its train's
/// resolved identifier, the shared denormalized train-level fields, and an
/// ACTIVE status, so all rows of a train are identical in those columns.
pub fn build_rows(batch: &NormalizedBatch, assignment: &IdAssignment) -> Vec<RouteRow> {
    let uploaded_at = chrono::Utc::now().to_rfc3339();
    let mut rows = Vec::new();

    for train in &batch.trains {
        // Resolution assigns an id to every train in the batch.
        let Some(&train_id) = assignment.ids.get(&train.train_number) else {
            continue;
        };

        for stop in &train.stops {
            rows.push(RouteRow {
                train_id,
                train_number: train.train_number.clone(),
                train_name: train.train_name.clone(),
                station_from: train.station_from.clone(),
                station_to: train.station_to.clone(),
                running_days: train.running_days.clone(),
                station_sequence: stop.station_sequence,
                station_code: stop.station_code.clone(),
                station_name: stop.station_name.clone(),
                arrives: stop.arrives.clone(),
                departs: stop.departs.clone(),
                stop_duration: stop.stop_duration.clone(),
                distance: stop.distance.clone(),
                platform: stop.platform.clone(),
                route_flag: stop.route_flag,
                day: stop.day,
                status: STATUS_ACTIVE.to_string(),
                uploaded_at: uploaded_at.clone(),
            });
        }
    }

    rows
}

/// Delete the previously stored rows of every already-known train, then
/// insert the new batch. Store-side this is one transaction, so a failing
/// delete or insert aborts the entire batch with nothing applied.
pub async fn replace(
    store: &RouteStore,
    batch: &NormalizedBatch,
    assignment: &IdAssignment,
    rows: Vec<RouteRow>,
) -> Result<CommitOutcome, StoreError> {
    let known: Vec<String> = batch
        .trains
        .iter()
        .map(|t| t.train_number.clone())
        .filter(|n| assignment.is_known(n))
        .collect();

    let inserted = store.replace_routes(&known, &rows).await?;

    Ok(CommitOutcome {
        inserted,
        trains_affected: batch.trains.len(),
    })
}
