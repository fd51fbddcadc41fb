//! CSV ingestion of the reference tables.

use std::fs;
use std::path::Path;

use unit_scorecard::coverage::compute_unit_performance;
use unit_scorecard::loader::load_directory;
use unit_scorecard::types::TaskStatus;
use unit_scorecard::{ReferenceStore, TaskQuery};

fn write(dir: &Path, name: &str, body: &str) {
    fs::write(dir.join(name), body).unwrap();
}

fn write_fixture(dir: &Path) {
    write(dir, "divisions.csv", "id,name\n1,Works\n2,Health\nx,Broken\n");
    write(
        dir,
        "municipalities.csv",
        "id,name,code\n1,Beta,B01\n2,Alpha,\n3,,C03\n",
    );
    write(
        dir,
        "tasks.csv",
        "id,name,division_id,start_time,deadline_time,status\n\
         1,Census,1,2024-01-01 00:00:00,2024-01-31 00:00:00,in_progress\n\
         2,Budget,2,2024-03-01,2024-03-11,finished\n\
         3,Backwards,1,2024-03-11,2024-03-01,\n\
         4,Orphan division,9,2024-03-01,2024-03-11,\n\
         5,Bad status,1,2024-03-01,2024-03-11,archived\n",
    );
    write(
        dir,
        "deliveries.csv",
        "id,task_id,municipality_id,submitted_at,attachment,quality_rating\n\
         1,1,1,2024-01-10T08:30:00,report.pdf,85\n\
         2,1,2,2024-01-12 09:00:00,,\n\
         3,2,2,2024-03-05 10:00:00,,150\n\
         4,99,1,2024-03-05 10:00:00,,\n\
         5,1,1,not a date,,\n",
    );
}

#[test]
fn loads_valid_rows_and_counts_the_rest() {
    let dir = tempfile::tempdir().unwrap();
    write_fixture(dir.path());
    let (store, report) = load_directory(dir.path()).unwrap();

    assert_eq!(report.divisions, 2);
    assert_eq!(report.municipalities, 2);
    assert_eq!(report.tasks, 2);
    assert_eq!(report.deliveries, 2);
    assert_eq!(report.orphan_deliveries, 1);
    // 1 division, 1 unit, 3 tasks, 2 deliveries
    assert_eq!(report.parse_errors, 7);
    assert_eq!(report.total_rows, 16);

    let units: Vec<String> = store.units().unwrap().into_iter().map(|u| u.name).collect();
    assert_eq!(units, vec!["Alpha", "Beta"]);
    assert_eq!(store.unit(1).unwrap().unwrap().code.as_deref(), Some("B01"));
    assert_eq!(store.unit(2).unwrap().unwrap().code, None);

    let tasks = store.tasks(&TaskQuery::all()).unwrap();
    assert_eq!(tasks[0].status, TaskStatus::InProgress);
    assert_eq!(tasks[1].status, TaskStatus::Finished);

    let beta = store.deliveries_for_unit(1).unwrap();
    assert_eq!(beta.len(), 1);
    assert_eq!(beta[0].quality_rating, Some(85));
    assert_eq!(beta[0].attachment.as_deref(), Some("report.pdf"));
}

#[test]
fn loaded_store_feeds_the_calculators() {
    let dir = tempfile::tempdir().unwrap();
    write_fixture(dir.path());
    let (store, _) = load_directory(dir.path()).unwrap();
    let perf = compute_unit_performance(&store).unwrap();
    assert_eq!(perf.len(), 2);
    assert!(perf.iter().all(|p| p.total_tasks == 2 && p.tasks_completed == 1));
}

#[test]
fn missing_file_is_an_error() {
    let dir = tempfile::tempdir().unwrap();
    write(dir.path(), "divisions.csv", "id,name\n1,Works\n");
    let err = load_directory(dir.path()).unwrap_err();
    assert!(format!("{:#}", err).contains("municipalities.csv"));
}
