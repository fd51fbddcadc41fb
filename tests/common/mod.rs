//! Shared fixtures for integration tests.

use chrono::{NaiveDate, NaiveDateTime};
use unit_scorecard::store::StoreResult;
use unit_scorecard::types::{Delivery, Division, Municipality, Task, TaskStatus};
use unit_scorecard::{MemoryStore, ReferenceStore, StoreError, TaskQuery};

pub fn ts(y: i32, m: u32, d: u32, h: u32) -> NaiveDateTime {
    NaiveDate::from_ymd_opt(y, m, d)
        .unwrap()
        .and_hms_opt(h, 0, 0)
        .unwrap()
}

/// Builder over a `MemoryStore` with auto-numbered deliveries.
pub struct Fixture {
    pub store: MemoryStore,
    next_delivery: u32,
}

impl Fixture {
    pub fn new() -> Self {
        Fixture {
            store: MemoryStore::new(),
            next_delivery: 1,
        }
    }

    pub fn division(self, id: u32, name: &str) -> Self {
        self.store
            .insert_division(Division { id, name: name.into() })
            .unwrap();
        self
    }

    pub fn unit(self, id: u32, name: &str) -> Self {
        self.store
            .insert_unit(Municipality { id, name: name.into(), code: None })
            .unwrap();
        self
    }

    pub fn task(
        self,
        id: u32,
        name: &str,
        division_id: u32,
        start: NaiveDateTime,
        deadline: NaiveDateTime,
    ) -> Self {
        self.store
            .insert_task(Task {
                id,
                name: name.into(),
                division_id,
                start_time: start,
                deadline_time: deadline,
                status: TaskStatus::InProgress,
            })
            .unwrap();
        self
    }

    pub fn deliver(self, task_id: u32, unit_id: u32, at: NaiveDateTime) -> Self {
        self.deliver_rated(task_id, unit_id, at, None)
    }

    pub fn deliver_rated(
        mut self,
        task_id: u32,
        unit_id: u32,
        at: NaiveDateTime,
        rating: Option<u8>,
    ) -> Self {
        self.store
            .insert_delivery(Delivery {
                id: self.next_delivery,
                task_id,
                municipality_id: unit_id,
                submitted_at: at,
                attachment: None,
                quality_rating: rating,
            })
            .unwrap();
        self.next_delivery += 1;
        self
    }
}

/// Store whose every query fails.
pub struct FailingStore;

fn down<T>() -> StoreResult<T> {
    Err(StoreError::Unavailable("database offline".into()))
}

impl ReferenceStore for FailingStore {
    fn divisions(&self) -> StoreResult<Vec<Division>> {
        down()
    }
    fn division(&self, _id: u32) -> StoreResult<Option<Division>> {
        down()
    }
    fn units(&self) -> StoreResult<Vec<Municipality>> {
        down()
    }
    fn unit(&self, _id: u32) -> StoreResult<Option<Municipality>> {
        down()
    }
    fn tasks(&self, _query: &TaskQuery) -> StoreResult<Vec<Task>> {
        down()
    }
    fn task(&self, _id: u32) -> StoreResult<Option<Task>> {
        down()
    }
    fn deliveries_for_task(&self, _task_id: u32) -> StoreResult<Vec<Delivery>> {
        down()
    }
    fn deliveries_for_unit(&self, _unit_id: u32) -> StoreResult<Vec<Delivery>> {
        down()
    }
    fn finish_task(&self, _id: u32) -> StoreResult<bool> {
        down()
    }
    fn finish_due_tasks(&self, _now: NaiveDateTime) -> StoreResult<usize> {
        down()
    }
    fn set_quality_rating(&self, _delivery_id: u32, _rating: u8) -> StoreResult<bool> {
        down()
    }
}
