//! Punctuality, quality, coverage and the weighted composite score per unit,
//! plus rankings over any one of those metrics.

use std::cmp::Ordering;
use std::collections::HashMap;

use chrono::NaiveDateTime;
use tracing::{debug, info};

use crate::error::{EvalError, Result, ResultExt};
use crate::store::{ReferenceStore, TaskQuery};
use crate::types::{
    ComprehensiveEvaluation, Delivery, EvaluationRow, EvaluationSummary, Municipality, RankMetric,
    RankingEntry, RankingRow, Task, TaskDetail,
};
use crate::util::{average, format_number, percentage, round2};
use crate::window::TimeWindow;

pub const COVERAGE_WEIGHT: f64 = 0.40;
pub const PUNCTUALITY_WEIGHT: f64 = 0.30;
pub const QUALITY_WEIGHT: f64 = 0.20;
pub const QUANTITY_WEIGHT: f64 = 0.10;

/// Each delivery per completed task is worth 20 points, capped at 100.
const QUANTITY_POINTS_PER_DELIVERY: f64 = 20.0;

/// Narrows the evaluated tasks. Both parts are optional and combine with AND.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct EvaluationFilter {
    pub division_id: Option<u32>,
    pub range: Option<TimeWindow>,
}

impl EvaluationFilter {
    pub fn all() -> Self {
        Self::default()
    }

    pub fn for_division(division_id: u32) -> Self {
        EvaluationFilter {
            division_id: Some(division_id),
            range: None,
        }
    }

    pub fn between(start: NaiveDateTime, end: NaiveDateTime) -> Result<Self> {
        Ok(EvaluationFilter {
            division_id: None,
            range: Some(TimeWindow::new(start, end)?),
        })
    }

    pub fn since(start: NaiveDateTime) -> Self {
        EvaluationFilter {
            division_id: None,
            range: Some(TimeWindow {
                start,
                ..TimeWindow::unbounded()
            }),
        }
    }

    pub fn until(end: NaiveDateTime) -> Self {
        EvaluationFilter {
            division_id: None,
            range: Some(TimeWindow {
                end,
                ..TimeWindow::unbounded()
            }),
        }
    }

    pub fn with_division(mut self, division_id: u32) -> Self {
        self.division_id = Some(division_id);
        self
    }

    fn task_query(&self) -> TaskQuery {
        TaskQuery {
            division_id: self.division_id,
            window: self.range,
        }
    }
}

/// How early a delivery arrived relative to the task window, in `[0, 100]`.
///
/// 100 at or before the start, 0 at or after the deadline, linear between.
pub fn punctuality_score(task: &Task, submitted_at: NaiveDateTime) -> f64 {
    let elapsed = (submitted_at - task.start_time).num_milliseconds();
    let window = (task.deadline_time - task.start_time).num_milliseconds();
    if elapsed <= 0 {
        return 100.0;
    }
    if elapsed >= window {
        return 0.0;
    }
    round2(100.0 - elapsed as f64 / window as f64 * 100.0)
}

pub fn is_on_time(task: &Task, delivery: &Delivery) -> bool {
    delivery.submitted_at <= task.deadline_time
}

pub fn composite_score(coverage_pct: f64, punctuality: f64, quality: f64, avg_quantity: f64) -> f64 {
    let quantity = (avg_quantity * QUANTITY_POINTS_PER_DELIVERY).min(100.0);
    round2(
        coverage_pct * COVERAGE_WEIGHT
            + punctuality * PUNCTUALITY_WEIGHT
            + quality * QUALITY_WEIGHT
            + quantity * QUANTITY_WEIGHT,
    )
}

/// Pure evaluation of one unit over an already-loaded task scope.
///
/// Deliveries against tasks outside `tasks` are ignored.
pub fn evaluate_loaded(
    unit: &Municipality,
    tasks: &[Task],
    deliveries: &[Delivery],
) -> ComprehensiveEvaluation {
    let mut by_task: HashMap<u32, Vec<&Delivery>> = HashMap::new();
    for d in deliveries {
        by_task.entry(d.task_id).or_default().push(d);
    }

    let mut details = Vec::with_capacity(tasks.len());
    let mut all_scores: Vec<f64> = Vec::new();
    let mut all_ratings: Vec<f64> = Vec::new();
    let mut tasks_completed = 0usize;
    let mut total_deliveries = 0usize;
    let mut on_time_count = 0usize;

    for task in tasks {
        let task_deliveries = by_task.get(&task.id).map(Vec::as_slice).unwrap_or(&[]);
        let scores: Vec<f64> = task_deliveries
            .iter()
            .map(|d| punctuality_score(task, d.submitted_at))
            .collect();
        let ratings: Vec<f64> = task_deliveries
            .iter()
            .filter_map(|d| d.quality_rating.map(f64::from))
            .collect();

        if !task_deliveries.is_empty() {
            tasks_completed += 1;
        }
        total_deliveries += task_deliveries.len();
        on_time_count += task_deliveries.iter().filter(|d| is_on_time(task, d)).count();

        details.push(TaskDetail {
            task_id: task.id,
            task_name: task.name.clone(),
            delivered: !task_deliveries.is_empty(),
            delivery_count: task_deliveries.len(),
            punctuality_score: round2(average(&scores)),
            quality_average: if ratings.is_empty() {
                None
            } else {
                Some(round2(average(&ratings)))
            },
            first_delivery_at: task_deliveries.iter().map(|d| d.submitted_at).min(),
            deadline_time: task.deadline_time,
        });

        all_scores.extend(scores);
        all_ratings.extend(ratings);
    }

    let coverage_pct = percentage(tasks_completed, tasks.len());
    let avg_punctuality_score = round2(average(&all_scores));
    let avg_quality = round2(average(&all_ratings));
    let avg_quantity = if tasks_completed == 0 {
        0.0
    } else {
        round2(total_deliveries as f64 / tasks_completed as f64)
    };

    ComprehensiveEvaluation {
        unit_id: unit.id,
        unit_name: unit.name.clone(),
        total_tasks: tasks.len(),
        tasks_completed,
        coverage_pct,
        total_deliveries,
        on_time_count,
        late_count: total_deliveries - on_time_count,
        punctuality_pct: percentage(on_time_count, total_deliveries),
        avg_punctuality_score,
        avg_quantity,
        avg_quality,
        composite_score: composite_score(coverage_pct, avg_punctuality_score, avg_quality, avg_quantity),
        tasks: details,
    }
}

fn scoped_tasks(store: &dyn ReferenceStore, filter: &EvaluationFilter) -> Result<Vec<Task>> {
    store
        .tasks(&filter.task_query())
        .context(|| "listing tasks for evaluation")
}

pub fn evaluate_unit(
    store: &dyn ReferenceStore,
    unit_id: u32,
    filter: &EvaluationFilter,
) -> Result<ComprehensiveEvaluation> {
    let unit = store
        .unit(unit_id)
        .context(|| format!("looking up unit {}", unit_id))?
        .ok_or_else(|| EvalError::not_found("municipality", unit_id))?;
    let tasks = scoped_tasks(store, filter)?;
    let deliveries = store
        .deliveries_for_unit(unit_id)
        .context(|| format!("listing deliveries for unit {}", unit_id))?;
    Ok(evaluate_loaded(&unit, &tasks, &deliveries))
}

/// Units in name order; the scope is loaded once and shared.
fn evaluate_in_name_order(
    store: &dyn ReferenceStore,
    filter: &EvaluationFilter,
) -> Result<Vec<ComprehensiveEvaluation>> {
    let units = store.units().context(|| "listing units for evaluation")?;
    let tasks = scoped_tasks(store, filter)?;
    let mut out = Vec::with_capacity(units.len());
    for unit in &units {
        let deliveries = store
            .deliveries_for_unit(unit.id)
            .context(|| format!("listing deliveries for unit {}", unit.id))?;
        out.push(evaluate_loaded(unit, &tasks, &deliveries));
    }
    debug!(units = out.len(), tasks = tasks.len(), "evaluated units");
    Ok(out)
}

/// Every unit, best composite score first.
pub fn evaluate_all_units(
    store: &dyn ReferenceStore,
    filter: &EvaluationFilter,
) -> Result<Vec<ComprehensiveEvaluation>> {
    let mut evals = evaluate_in_name_order(store, filter)?;
    evals.sort_by(|a, b| {
        b.composite_score
            .partial_cmp(&a.composite_score)
            .unwrap_or(Ordering::Equal)
    });
    Ok(evals)
}

/// Rank 1 is the highest value. Ties keep name order and still get
/// consecutive rank numbers.
pub fn rank_by(
    store: &dyn ReferenceStore,
    metric: RankMetric,
    filter: &EvaluationFilter,
) -> Result<Vec<RankingEntry>> {
    let evals = evaluate_in_name_order(store, filter)?;
    Ok(rank_evaluations(&evals, metric))
}

pub fn rank_evaluations(evals: &[ComprehensiveEvaluation], metric: RankMetric) -> Vec<RankingEntry> {
    let mut scored: Vec<(f64, &str)> = evals
        .iter()
        .map(|e| (metric.value_of(e), e.unit_name.as_str()))
        .collect();
    scored.sort_by(|a, b| b.0.partial_cmp(&a.0).unwrap_or(Ordering::Equal));
    scored
        .into_iter()
        .enumerate()
        .map(|(idx, (value, name))| RankingEntry {
            unit_name: name.to_string(),
            value,
            rank: idx + 1,
        })
        .collect()
}

/// Set the quality rating of an existing delivery.
pub fn rate_delivery(store: &dyn ReferenceStore, delivery_id: u32, rating: u32) -> Result<()> {
    let rating = u8::try_from(rating)
        .ok()
        .filter(|r| *r <= 100)
        .ok_or_else(|| EvalError::InvalidInput(format!("quality rating {} outside 0..=100", rating)))?;
    let updated = store
        .set_quality_rating(delivery_id, rating)
        .context(|| format!("rating delivery {}", delivery_id))?;
    if !updated {
        return Err(EvalError::not_found("delivery", delivery_id));
    }
    info!(delivery_id, rating, "delivery rated");
    Ok(())
}

pub fn summarize(evals: &[ComprehensiveEvaluation]) -> EvaluationSummary {
    let composites: Vec<f64> = evals.iter().map(|e| e.composite_score).collect();
    let coverages: Vec<f64> = evals.iter().map(|e| e.coverage_pct).collect();
    let top_unit = evals
        .iter()
        .fold(None::<&ComprehensiveEvaluation>, |best, e| match best {
            Some(b) if b.composite_score >= e.composite_score => Some(b),
            _ => Some(e),
        })
        .map(|e| e.unit_name.clone());
    EvaluationSummary {
        total_units: evals.len(),
        total_tasks_in_scope: evals.first().map(|e| e.total_tasks).unwrap_or(0),
        total_deliveries: evals.iter().map(|e| e.total_deliveries).sum(),
        avg_composite_score: round2(average(&composites)),
        avg_coverage_pct: round2(average(&coverages)),
        top_unit,
    }
}

pub fn evaluation_rows(evals: &[ComprehensiveEvaluation]) -> Vec<EvaluationRow> {
    evals
        .iter()
        .map(|e| EvaluationRow {
            municipality: e.unit_name.clone(),
            tasks: e.total_tasks,
            coverage_pct: format_number(e.coverage_pct, 2),
            on_time: e.on_time_count,
            late: e.late_count,
            punctuality_score: format_number(e.avg_punctuality_score, 2),
            avg_quality: format_number(e.avg_quality, 2),
            avg_quantity: format_number(e.avg_quantity, 2),
            composite_score: format_number(e.composite_score, 2),
        })
        .collect()
}

pub fn ranking_rows(entries: &[RankingEntry], metric: RankMetric) -> Vec<RankingRow> {
    entries
        .iter()
        .map(|e| RankingRow {
            rank: e.rank,
            municipality: e.unit_name.clone(),
            metric: metric.to_string(),
            value: format_number(e.value, 2),
        })
        .collect()
}
