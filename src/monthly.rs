use std::collections::{HashMap, HashSet};

use tracing::debug;

use crate::error::{Result, ResultExt};
use crate::store::{ReferenceStore, TaskQuery};
use crate::types::{DivisionBreakdown, MonthlyReport, MonthlyRow, UnitMonthlyPerformance};
use crate::util::{format_number, percentage};
use crate::window::TimeWindow;

/// Per-unit completion for tasks overlapping the given calendar month,
/// broken down by owning division.
pub fn compute_monthly_performance(
    store: &dyn ReferenceStore,
    year: i32,
    month: u32,
) -> Result<MonthlyReport> {
    let window = TimeWindow::month(year, month)?;
    let period_label = window.period_label();

    let units = store
        .units()
        .context(|| format!("listing units for {}", period_label))?;
    let divisions = store
        .divisions()
        .context(|| format!("listing divisions for {}", period_label))?;
    let query = TaskQuery {
        division_id: None,
        window: Some(window),
    };
    let tasks = store
        .tasks(&query)
        .context(|| format!("listing tasks for {}", period_label))?;

    // division id -> task ids owned by it inside the window
    let mut by_division: HashMap<u32, Vec<u32>> = HashMap::new();
    for t in &tasks {
        by_division.entry(t.division_id).or_default().push(t.id);
    }

    let mut per_unit = Vec::with_capacity(units.len());
    for unit in units {
        let delivered: HashSet<u32> = store
            .deliveries_for_unit(unit.id)
            .context(|| format!("listing deliveries for unit {} in {}", unit.id, period_label))?
            .into_iter()
            .map(|d| d.task_id)
            .collect();

        let mut breakdown = Vec::new();
        for division in &divisions {
            let Some(task_ids) = by_division.get(&division.id) else {
                continue;
            };
            let tasks_assigned = task_ids.len();
            let tasks_completed = task_ids.iter().filter(|id| delivered.contains(id)).count();
            breakdown.push(DivisionBreakdown {
                division_id: division.id,
                division_name: division.name.clone(),
                tasks_assigned,
                tasks_completed,
                division_percentage: percentage(tasks_completed, tasks_assigned),
            });
        }

        let total_assigned: usize = breakdown.iter().map(|b| b.tasks_assigned).sum();
        let total_completed: usize = breakdown.iter().map(|b| b.tasks_completed).sum();
        per_unit.push(UnitMonthlyPerformance {
            unit_id: unit.id,
            unit_name: unit.name,
            divisions: breakdown,
            total_assigned,
            total_completed,
            total_percentage: percentage(total_completed, total_assigned),
        });
    }

    debug!(period = %period_label, tasks = tasks.len(), units = per_unit.len(), "computed monthly breakdown");
    Ok(MonthlyReport {
        period_label,
        per_unit,
    })
}

/// One row per (unit, division) plus a `Total` row per unit.
pub fn monthly_rows(report: &MonthlyReport) -> Vec<MonthlyRow> {
    let mut rows = Vec::new();
    for unit in &report.per_unit {
        for d in &unit.divisions {
            rows.push(MonthlyRow {
                period: report.period_label.clone(),
                municipality: unit.unit_name.clone(),
                division: d.division_name.clone(),
                assigned: d.tasks_assigned,
                completed: d.tasks_completed,
                pct: format_number(d.division_percentage, 2),
            });
        }
        rows.push(MonthlyRow {
            period: report.period_label.clone(),
            municipality: unit.unit_name.clone(),
            division: "Total".to_string(),
            assigned: unit.total_assigned,
            completed: unit.total_completed,
            pct: format_number(unit.total_percentage, 2),
        });
    }
    rows
}
