//! Per-task delivery views.

use std::collections::BTreeSet;

use tracing::debug;

use crate::error::{Result, ResultExt};
use crate::store::ReferenceStore;
use crate::types::{Delivery, DistinctUnits};

/// Distinct units that delivered at least once against `task_id`.
pub fn count_distinct_units_for_task(store: &dyn ReferenceStore, task_id: u32) -> Result<DistinctUnits> {
    let deliveries = store
        .deliveries_for_task(task_id)
        .context(|| format!("counting distinct units for task {}", task_id))?;
    let unit_ids: BTreeSet<u32> = deliveries.iter().map(|d| d.municipality_id).collect();
    let unit_ids: Vec<u32> = unit_ids.into_iter().collect();
    debug!(task_id, deliveries = deliveries.len(), units = unit_ids.len(), "distinct units");
    Ok(DistinctUnits {
        count: unit_ids.len(),
        unit_ids,
    })
}

/// Deliveries for `task_id`, oldest first. Equal timestamps keep store order.
pub fn sorted_deliveries_for_task(store: &dyn ReferenceStore, task_id: u32) -> Result<Vec<Delivery>> {
    let mut deliveries = store
        .deliveries_for_task(task_id)
        .context(|| format!("listing deliveries for task {}", task_id))?;
    deliveries.sort_by_key(|d| d.submitted_at);
    Ok(deliveries)
}
