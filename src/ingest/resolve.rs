//! Train identity resolution: map each train number in the batch to its
//! internal identifier, reusing stored ones and allocating the rest.

use std::collections::{HashMap, HashSet};

use crate::store::{RouteStore, StoreError};

use super::normalize::NormalizedBatch;

#[derive(Debug, Default)]
pub struct IdAssignment {
    /// train_number -> train_id for every train in the batch.
    pub ids: HashMap<String, i64>,
    /// Train numbers that already had rows in the store before this batch.
    pub known: HashSet<String>,
}

impl IdAssignment {
    pub fn is_known(&self, train_number: &str) -> bool {
        self.known.contains(train_number)
    }
}

/// Resolve or allocate an identifier for every distinct train number.
///
/// Existing identifiers are reused (first-seen wins if storage holds
/// duplicates). Brand-new trains get strictly increasing identifiers
/// starting above the store's current maximum, in the order they first
/// appear in the upload. Any store failure aborts the whole resolution.
pub async fn resolve(
    store: &RouteStore,
    batch: &NormalizedBatch,
) -> Result<IdAssignment, StoreError> {
    let train_numbers = batch.train_numbers();

    let mut assignment = IdAssignment::default();
    for (number, id) in store.existing_train_ids(&train_numbers).await? {
        assignment.ids.entry(number.clone()).or_insert(id);
        assignment.known.insert(number);
    }

    let max_id = store.max_train_id().await?;
    let mut next_id = max_id.unwrap_or(0) + 1;

    for number in train_numbers {
        if !assignment.ids.contains_key(&number) {
            assignment.ids.insert(number, next_id);
            next_id += 1;
        }
    }

    Ok(assignment)
}
