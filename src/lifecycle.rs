//! `in_progress -> finished` transitions.
//!
//! Both the bulk and the manual path are conditional writes in the store,
//! so repeated or concurrent calls converge on `finished` without error.

use chrono::NaiveDateTime;
use tracing::{info, warn};

use crate::error::{EvalError, Result, ResultExt};
use crate::store::ReferenceStore;

/// Finish every in-progress task whose deadline is at or before `now`.
pub fn advance_due_tasks(store: &dyn ReferenceStore, now: NaiveDateTime) -> Result<usize> {
    let changed = store
        .finish_due_tasks(now)
        .context(|| format!("advancing tasks due by {}", now))?;
    if changed > 0 {
        info!(changed, %now, "tasks moved to finished");
    }
    Ok(changed)
}

/// Read-path variant: a store failure is logged and reported as zero
/// transitions so the caller can still render its report.
pub fn refresh_task_statuses(store: &dyn ReferenceStore, now: NaiveDateTime) -> usize {
    match advance_due_tasks(store, now) {
        Ok(changed) => changed,
        Err(e) => {
            warn!(error = %e, "task status refresh failed; continuing with stale statuses");
            0
        }
    }
}

/// Manually finish one task. `Ok(false)` when it was already finished.
pub fn finalize_task(store: &dyn ReferenceStore, task_id: u32) -> Result<bool> {
    store
        .task(task_id)
        .context(|| format!("looking up task {}", task_id))?
        .ok_or_else(|| EvalError::not_found("task", task_id))?;
    let changed = store
        .finish_task(task_id)
        .context(|| format!("finalizing task {}", task_id))?;
    if changed {
        info!(task_id, "task finalized");
    }
    Ok(changed)
}
