use crate::store::{MemoryStore, ReferenceStore};
use crate::types::{
    Delivery, Division, Municipality, RawDeliveryRow, RawDivisionRow, RawMunicipalityRow,
    RawTaskRow, Task, TaskStatus,
};
use crate::util::{non_blank, parse_datetime_safe, parse_rating_safe, parse_u32_safe};
use anyhow::Context;
use csv::ReaderBuilder;
use serde::de::DeserializeOwned;
use std::path::Path;
use tracing::{info, warn};

pub const DIVISIONS_FILE: &str = "divisions.csv";
pub const MUNICIPALITIES_FILE: &str = "municipalities.csv";
pub const TASKS_FILE: &str = "tasks.csv";
pub const DELIVERIES_FILE: &str = "deliveries.csv";

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LoadReport {
    pub total_rows: usize,
    pub divisions: usize,
    pub municipalities: usize,
    pub tasks: usize,
    pub deliveries: usize,
    pub parse_errors: usize,
    pub orphan_deliveries: usize,
}

/// Load the four reference tables from `dir` into a fresh store.
///
/// Tables are read in dependency order so tasks can check their division
/// and deliveries their task and unit.
pub fn load_directory(dir: &Path) -> anyhow::Result<(MemoryStore, LoadReport)> {
    let store = MemoryStore::new();
    let mut report = LoadReport::default();

    for row in read_rows::<RawDivisionRow>(&dir.join(DIVISIONS_FILE), &mut report)? {
        let (Some(id), Some(name)) = (parse_u32_safe(row.id.as_deref()), non_blank(row.name)) else {
            report.parse_errors += 1;
            continue;
        };
        match store.insert_division(Division { id, name }) {
            Ok(()) => report.divisions += 1,
            Err(e) => reject(&mut report, DIVISIONS_FILE, &e),
        }
    }

    for row in read_rows::<RawMunicipalityRow>(&dir.join(MUNICIPALITIES_FILE), &mut report)? {
        let (Some(id), Some(name)) = (parse_u32_safe(row.id.as_deref()), non_blank(row.name)) else {
            report.parse_errors += 1;
            continue;
        };
        let unit = Municipality {
            id,
            name,
            code: non_blank(row.code),
        };
        match store.insert_unit(unit) {
            Ok(()) => report.municipalities += 1,
            Err(e) => reject(&mut report, MUNICIPALITIES_FILE, &e),
        }
    }

    for row in read_rows::<RawTaskRow>(&dir.join(TASKS_FILE), &mut report)? {
        let Some(task) = clean_task(row) else {
            report.parse_errors += 1;
            continue;
        };
        match store.insert_task(task) {
            Ok(()) => report.tasks += 1,
            Err(e) => reject(&mut report, TASKS_FILE, &e),
        }
    }

    for row in read_rows::<RawDeliveryRow>(&dir.join(DELIVERIES_FILE), &mut report)? {
        let Some(delivery) = clean_delivery(row) else {
            report.parse_errors += 1;
            continue;
        };
        let known_task = store.task(delivery.task_id)?.is_some();
        let known_unit = store.unit(delivery.municipality_id)?.is_some();
        if !known_task || !known_unit {
            report.orphan_deliveries += 1;
            continue;
        }
        match store.insert_delivery(delivery) {
            Ok(()) => report.deliveries += 1,
            Err(e) => reject(&mut report, DELIVERIES_FILE, &e),
        }
    }

    info!(
        divisions = report.divisions,
        municipalities = report.municipalities,
        tasks = report.tasks,
        deliveries = report.deliveries,
        skipped = report.parse_errors + report.orphan_deliveries,
        "reference data loaded"
    );
    Ok((store, report))
}

fn read_rows<T: DeserializeOwned>(path: &Path, report: &mut LoadReport) -> anyhow::Result<Vec<T>> {
    let mut rdr = ReaderBuilder::new()
        .flexible(true)
        .trim(csv::Trim::All)
        .from_path(path)
        .with_context(|| format!("opening {}", path.display()))?;
    let mut rows = Vec::new();
    for result in rdr.deserialize::<T>() {
        report.total_rows += 1;
        match result {
            Ok(r) => rows.push(r),
            Err(e) => {
                warn!(file = %path.display(), error = %e, "skipping unreadable row");
                report.parse_errors += 1;
            }
        }
    }
    Ok(rows)
}

fn reject(report: &mut LoadReport, file: &str, err: &crate::error::StoreError) {
    warn!(file, error = %err, "skipping rejected row");
    report.parse_errors += 1;
}

fn clean_task(row: RawTaskRow) -> Option<Task> {
    let status = match non_blank(row.status) {
        Some(s) => s.parse::<TaskStatus>().ok()?,
        None => TaskStatus::InProgress,
    };
    Some(Task {
        id: parse_u32_safe(row.id.as_deref())?,
        name: non_blank(row.name)?,
        division_id: parse_u32_safe(row.division_id.as_deref())?,
        start_time: parse_datetime_safe(row.start_time.as_deref())?,
        deadline_time: parse_datetime_safe(row.deadline_time.as_deref())?,
        status,
    })
}

fn clean_delivery(row: RawDeliveryRow) -> Option<Delivery> {
    // A rating that is present but invalid rejects the row; blank means unrated.
    let quality_rating = match non_blank(row.quality_rating) {
        Some(raw) => Some(parse_rating_safe(Some(&raw))?),
        None => None,
    };
    Some(Delivery {
        id: parse_u32_safe(row.id.as_deref())?,
        task_id: parse_u32_safe(row.task_id.as_deref())?,
        municipality_id: parse_u32_safe(row.municipality_id.as_deref())?,
        submitted_at: parse_datetime_safe(row.submitted_at.as_deref())?,
        attachment: non_blank(row.attachment),
        quality_rating,
    })
}
