use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use tabled::Tabled;

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Division {
    pub id: u32,
    pub name: String,
}

/// A municipality: the unit every report is computed for.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Municipality {
    pub id: u32,
    pub name: String,
    pub code: Option<String>,
}

/// Two-state task lifecycle. `InProgress -> Finished` is the only transition.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TaskStatus {
    InProgress,
    Finished,
}

impl TaskStatus {
    pub fn as_str(self) -> &'static str {
        match self {
            TaskStatus::InProgress => "in_progress",
            TaskStatus::Finished => "finished",
        }
    }
}

impl fmt::Display for TaskStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for TaskStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "" | "in_progress" | "in-progress" | "inprogress" => Ok(TaskStatus::InProgress),
            "finished" => Ok(TaskStatus::Finished),
            other => Err(format!("unknown task status `{}`", other)),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Task {
    pub id: u32,
    pub name: String,
    pub division_id: u32,
    pub start_time: NaiveDateTime,
    pub deadline_time: NaiveDateTime,
    pub status: TaskStatus,
}

impl Task {
    /// In progress and past (or exactly at) its deadline.
    pub fn is_due(&self, now: NaiveDateTime) -> bool {
        self.status == TaskStatus::InProgress && self.deadline_time <= now
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Delivery {
    pub id: u32,
    pub task_id: u32,
    pub municipality_id: u32,
    pub submitted_at: NaiveDateTime,
    pub attachment: Option<String>,
    pub quality_rating: Option<u8>,
}

// Raw CSV rows. Everything is optional text so the loader can count
// malformed rows instead of aborting the whole file.

#[derive(Debug, Deserialize)]
pub struct RawDivisionRow {
    pub id: Option<String>,
    pub name: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct RawMunicipalityRow {
    pub id: Option<String>,
    pub name: Option<String>,
    pub code: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct RawTaskRow {
    pub id: Option<String>,
    pub name: Option<String>,
    pub division_id: Option<String>,
    pub start_time: Option<String>,
    pub deadline_time: Option<String>,
    pub status: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct RawDeliveryRow {
    pub id: Option<String>,
    pub task_id: Option<String>,
    pub municipality_id: Option<String>,
    pub submitted_at: Option<String>,
    pub attachment: Option<String>,
    pub quality_rating: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DistinctUnits {
    pub count: usize,
    pub unit_ids: Vec<u32>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct UnitPerformance {
    pub unit_id: u32,
    pub unit_name: String,
    pub total_tasks: usize,
    pub tasks_completed: usize,
    pub completion_percentage: f64,
    pub completed_task_names: Vec<String>,
    pub color: &'static str,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DivisionBreakdown {
    pub division_id: u32,
    pub division_name: String,
    pub tasks_assigned: usize,
    pub tasks_completed: usize,
    pub division_percentage: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct UnitMonthlyPerformance {
    pub unit_id: u32,
    pub unit_name: String,
    pub divisions: Vec<DivisionBreakdown>,
    pub total_assigned: usize,
    pub total_completed: usize,
    pub total_percentage: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MonthlyReport {
    pub period_label: String,
    pub per_unit: Vec<UnitMonthlyPerformance>,
}

/// Drill-down record for one task inside a unit evaluation.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TaskDetail {
    pub task_id: u32,
    pub task_name: String,
    pub delivered: bool,
    pub delivery_count: usize,
    pub punctuality_score: f64,
    pub quality_average: Option<f64>,
    pub first_delivery_at: Option<NaiveDateTime>,
    pub deadline_time: NaiveDateTime,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ComprehensiveEvaluation {
    pub unit_id: u32,
    pub unit_name: String,
    pub total_tasks: usize,
    pub tasks_completed: usize,
    pub coverage_pct: f64,
    pub total_deliveries: usize,
    pub on_time_count: usize,
    pub late_count: usize,
    pub punctuality_pct: f64,
    pub avg_punctuality_score: f64,
    pub avg_quantity: f64,
    pub avg_quality: f64,
    pub composite_score: f64,
    pub tasks: Vec<TaskDetail>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RankMetric {
    Composite,
    Coverage,
    Punctuality,
    Quality,
}

impl RankMetric {
    pub const ALL: [RankMetric; 4] = [
        RankMetric::Composite,
        RankMetric::Coverage,
        RankMetric::Punctuality,
        RankMetric::Quality,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            RankMetric::Composite => "composite",
            RankMetric::Coverage => "coverage",
            RankMetric::Punctuality => "punctuality",
            RankMetric::Quality => "quality",
        }
    }

    /// Pick this metric's value out of an evaluation.
    pub fn value_of(self, eval: &ComprehensiveEvaluation) -> f64 {
        match self {
            RankMetric::Composite => eval.composite_score,
            RankMetric::Coverage => eval.coverage_pct,
            RankMetric::Punctuality => eval.avg_punctuality_score,
            RankMetric::Quality => eval.avg_quality,
        }
    }
}

impl fmt::Display for RankMetric {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for RankMetric {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "composite" => Ok(RankMetric::Composite),
            "coverage" => Ok(RankMetric::Coverage),
            "punctuality" => Ok(RankMetric::Punctuality),
            "quality" => Ok(RankMetric::Quality),
            other => Err(format!("unknown ranking metric `{}`", other)),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RankingEntry {
    pub unit_name: String,
    pub value: f64,
    pub rank: usize,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct EvaluationSummary {
    pub total_units: usize,
    pub total_tasks_in_scope: usize,
    pub total_deliveries: usize,
    pub avg_composite_score: f64,
    pub avg_coverage_pct: f64,
    pub top_unit: Option<String>,
}

// Flattened, pre-formatted rows for CSV export and console previews.

#[derive(Debug, Serialize, Tabled, Clone)]
pub struct CoverageRow {
    #[serde(rename = "Municipality")]
    #[tabled(rename = "Municipality")]
    pub municipality: String,
    #[serde(rename = "TotalTasks")]
    #[tabled(rename = "TotalTasks")]
    pub total_tasks: usize,
    #[serde(rename = "TasksCompleted")]
    #[tabled(rename = "TasksCompleted")]
    pub tasks_completed: usize,
    #[serde(rename = "CompletionPct")]
    #[tabled(rename = "CompletionPct")]
    pub completion_pct: String,
    #[serde(rename = "Color")]
    #[tabled(rename = "Color")]
    pub color: String,
    #[serde(rename = "CompletedTasks")]
    #[tabled(rename = "CompletedTasks")]
    pub completed_tasks: String,
}

#[derive(Debug, Serialize, Tabled, Clone)]
pub struct MonthlyRow {
    #[serde(rename = "Period")]
    #[tabled(rename = "Period")]
    pub period: String,
    #[serde(rename = "Municipality")]
    #[tabled(rename = "Municipality")]
    pub municipality: String,
    #[serde(rename = "Division")]
    #[tabled(rename = "Division")]
    pub division: String,
    #[serde(rename = "Assigned")]
    #[tabled(rename = "Assigned")]
    pub assigned: usize,
    #[serde(rename = "Completed")]
    #[tabled(rename = "Completed")]
    pub completed: usize,
    #[serde(rename = "Pct")]
    #[tabled(rename = "Pct")]
    pub pct: String,
}

#[derive(Debug, Serialize, Tabled, Clone)]
pub struct EvaluationRow {
    #[serde(rename = "Municipality")]
    #[tabled(rename = "Municipality")]
    pub municipality: String,
    #[serde(rename = "Tasks")]
    #[tabled(rename = "Tasks")]
    pub tasks: usize,
    #[serde(rename = "CoveragePct")]
    #[tabled(rename = "CoveragePct")]
    pub coverage_pct: String,
    #[serde(rename = "OnTime")]
    #[tabled(rename = "OnTime")]
    pub on_time: usize,
    #[serde(rename = "Late")]
    #[tabled(rename = "Late")]
    pub late: usize,
    #[serde(rename = "PunctualityScore")]
    #[tabled(rename = "PunctualityScore")]
    pub punctuality_score: String,
    #[serde(rename = "AvgQuality")]
    #[tabled(rename = "AvgQuality")]
    pub avg_quality: String,
    #[serde(rename = "AvgQuantity")]
    #[tabled(rename = "AvgQuantity")]
    pub avg_quantity: String,
    #[serde(rename = "CompositeScore")]
    #[tabled(rename = "CompositeScore")]
    pub composite_score: String,
}

#[derive(Debug, Serialize, Tabled, Clone)]
pub struct RankingRow {
    #[serde(rename = "Rank")]
    #[tabled(rename = "Rank")]
    pub rank: usize,
    #[serde(rename = "Municipality")]
    #[tabled(rename = "Municipality")]
    pub municipality: String,
    #[serde(rename = "Metric")]
    #[tabled(rename = "Metric")]
    pub metric: String,
    #[serde(rename = "Value")]
    #[tabled(rename = "Value")]
    pub value: String,
}
