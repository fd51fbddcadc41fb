use std::collections::{HashMap, HashSet};

use tracing::debug;

use crate::error::{Result, ResultExt};
use crate::palette::color_for_index;
use crate::store::{ReferenceStore, TaskQuery};
use crate::types::{CoverageRow, Task, UnitPerformance};
use crate::util::{format_number, percentage};

/// Completion of every task in the system, one entry per unit in name order.
pub fn compute_unit_performance(store: &dyn ReferenceStore) -> Result<Vec<UnitPerformance>> {
    let units = store.units().context(|| "listing units for coverage")?;
    let tasks = store
        .tasks(&TaskQuery::all())
        .context(|| "listing tasks for coverage")?;
    let total_tasks = tasks.len();
    let by_id: HashMap<u32, &Task> = tasks.iter().map(|t| (t.id, t)).collect();

    let mut out = Vec::with_capacity(units.len());
    for (idx, unit) in units.into_iter().enumerate() {
        let deliveries = store
            .deliveries_for_unit(unit.id)
            .context(|| format!("listing deliveries for unit {}", unit.id))?;

        // One completion per task id, in first-seen order.
        let mut seen: HashSet<u32> = HashSet::new();
        let mut completed_task_names = Vec::new();
        for d in &deliveries {
            let Some(task) = by_id.get(&d.task_id) else {
                continue;
            };
            if seen.insert(task.id) {
                completed_task_names.push(task.name.clone());
            }
        }
        let tasks_completed = completed_task_names.len();

        out.push(UnitPerformance {
            unit_id: unit.id,
            unit_name: unit.name,
            total_tasks,
            tasks_completed,
            completion_percentage: percentage(tasks_completed, total_tasks),
            completed_task_names,
            color: color_for_index(idx),
        });
    }
    debug!(units = out.len(), total_tasks, "computed unit coverage");
    Ok(out)
}

pub fn coverage_rows(perf: &[UnitPerformance]) -> Vec<CoverageRow> {
    perf.iter()
        .map(|p| CoverageRow {
            municipality: p.unit_name.clone(),
            total_tasks: p.total_tasks,
            tasks_completed: p.tasks_completed,
            completion_pct: format_number(p.completion_percentage, 2),
            color: p.color.to_string(),
            completed_tasks: p.completed_task_names.join("; "),
        })
        .collect()
}
