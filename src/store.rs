//! Reference store port and the bundled in-memory implementation.
//!
//! The calculators only ever read through `ReferenceStore`. The two write
//! paths (finishing tasks, rating deliveries) are conditional updates so
//! concurrent callers converge instead of conflicting.

use chrono::NaiveDateTime;
use std::sync::{RwLock, RwLockReadGuard, RwLockWriteGuard};

use crate::error::StoreError;
use crate::types::{Delivery, Division, Municipality, Task, TaskStatus};
use crate::window::{task_in_window, TimeWindow};

pub type StoreResult<T> = std::result::Result<T, StoreError>;

/// Filter for task listings. Both parts are optional and combine with AND.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct TaskQuery {
    pub division_id: Option<u32>,
    pub window: Option<TimeWindow>,
}

impl TaskQuery {
    pub fn all() -> Self {
        Self::default()
    }

    pub fn matches(&self, task: &Task) -> bool {
        if let Some(division_id) = self.division_id {
            if task.division_id != division_id {
                return false;
            }
        }
        match &self.window {
            Some(window) => task_in_window(task, window),
            None => true,
        }
    }
}

pub trait ReferenceStore: Send + Sync {
    /// All divisions, ordered by name.
    fn divisions(&self) -> StoreResult<Vec<Division>>;

    fn division(&self, id: u32) -> StoreResult<Option<Division>>;

    /// All units, ordered by name (ties by id).
    fn units(&self) -> StoreResult<Vec<Municipality>>;

    fn unit(&self, id: u32) -> StoreResult<Option<Municipality>>;

    /// Tasks matching `query`, ordered by id.
    fn tasks(&self, query: &TaskQuery) -> StoreResult<Vec<Task>>;

    fn task(&self, id: u32) -> StoreResult<Option<Task>>;

    fn deliveries_for_task(&self, task_id: u32) -> StoreResult<Vec<Delivery>>;

    fn deliveries_for_unit(&self, unit_id: u32) -> StoreResult<Vec<Delivery>>;

    /// Move one task to `Finished` if it is still in progress.
    ///
    /// Returns whether this call performed the transition; `false` both for
    /// already finished and for unknown tasks.
    fn finish_task(&self, id: u32) -> StoreResult<bool>;

    /// Finish every in-progress task whose deadline is at or before `now`.
    fn finish_due_tasks(&self, now: NaiveDateTime) -> StoreResult<usize>;

    /// Returns `false` when the delivery does not exist.
    fn set_quality_rating(&self, delivery_id: u32, rating: u8) -> StoreResult<bool>;
}

#[derive(Debug, Default)]
struct Tables {
    divisions: Vec<Division>,
    units: Vec<Municipality>,
    tasks: Vec<Task>,
    deliveries: Vec<Delivery>,
}

/// `RwLock`-guarded tables. Readers never block each other; every write
/// takes the lock for one short, conditional update.
#[derive(Debug, Default)]
pub struct MemoryStore {
    tables: RwLock<Tables>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn read(&self) -> StoreResult<RwLockReadGuard<'_, Tables>> {
        self.tables
            .read()
            .map_err(|_| StoreError::Unavailable("lock poisoned".into()))
    }

    fn write(&self) -> StoreResult<RwLockWriteGuard<'_, Tables>> {
        self.tables
            .write()
            .map_err(|_| StoreError::Unavailable("lock poisoned".into()))
    }

    pub fn insert_division(&self, division: Division) -> StoreResult<()> {
        let mut t = self.write()?;
        if t.divisions.iter().any(|d| d.id == division.id) {
            return Err(StoreError::InvalidRecord(format!("duplicate division id {}", division.id)));
        }
        t.divisions.push(division);
        Ok(())
    }

    pub fn insert_unit(&self, unit: Municipality) -> StoreResult<()> {
        let mut t = self.write()?;
        if t.units.iter().any(|u| u.id == unit.id) {
            return Err(StoreError::InvalidRecord(format!("duplicate municipality id {}", unit.id)));
        }
        t.units.push(unit);
        Ok(())
    }

    pub fn insert_task(&self, task: Task) -> StoreResult<()> {
        if task.deadline_time < task.start_time {
            return Err(StoreError::InvalidRecord(format!(
                "task {} deadline precedes its start",
                task.id
            )));
        }
        let mut t = self.write()?;
        if t.tasks.iter().any(|x| x.id == task.id) {
            return Err(StoreError::InvalidRecord(format!("duplicate task id {}", task.id)));
        }
        if !t.divisions.iter().any(|d| d.id == task.division_id) {
            return Err(StoreError::InvalidRecord(format!(
                "task {} references unknown division {}",
                task.id, task.division_id
            )));
        }
        t.tasks.push(task);
        Ok(())
    }

    pub fn insert_delivery(&self, delivery: Delivery) -> StoreResult<()> {
        if matches!(delivery.quality_rating, Some(r) if r > 100) {
            return Err(StoreError::InvalidRecord(format!(
                "delivery {} rating out of range",
                delivery.id
            )));
        }
        let mut t = self.write()?;
        if t.deliveries.iter().any(|d| d.id == delivery.id) {
            return Err(StoreError::InvalidRecord(format!("duplicate delivery id {}", delivery.id)));
        }
        if !t.tasks.iter().any(|x| x.id == delivery.task_id) {
            return Err(StoreError::InvalidRecord(format!(
                "delivery {} references unknown task {}",
                delivery.id, delivery.task_id
            )));
        }
        if !t.units.iter().any(|u| u.id == delivery.municipality_id) {
            return Err(StoreError::InvalidRecord(format!(
                "delivery {} references unknown municipality {}",
                delivery.id, delivery.municipality_id
            )));
        }
        t.deliveries.push(delivery);
        Ok(())
    }

    /// Refused while any task still belongs to the division.
    pub fn remove_division(&self, id: u32) -> StoreResult<bool> {
        let mut t = self.write()?;
        if t.tasks.iter().any(|x| x.division_id == id) {
            return Err(StoreError::InvalidRecord(format!(
                "division {} is referenced by tasks",
                id
            )));
        }
        let before = t.divisions.len();
        t.divisions.retain(|d| d.id != id);
        Ok(t.divisions.len() != before)
    }

    /// Removes the task together with its deliveries.
    pub fn remove_task(&self, id: u32) -> StoreResult<bool> {
        let mut t = self.write()?;
        let before = t.tasks.len();
        t.tasks.retain(|x| x.id != id);
        let removed = t.tasks.len() != before;
        if removed {
            t.deliveries.retain(|d| d.task_id != id);
        }
        Ok(removed)
    }

    /// Removes the unit together with its deliveries.
    pub fn remove_unit(&self, id: u32) -> StoreResult<bool> {
        let mut t = self.write()?;
        let before = t.units.len();
        t.units.retain(|u| u.id != id);
        let removed = t.units.len() != before;
        if removed {
            t.deliveries.retain(|d| d.municipality_id != id);
        }
        Ok(removed)
    }

    pub fn delivery_count(&self) -> StoreResult<usize> {
        Ok(self.read()?.deliveries.len())
    }
}

impl ReferenceStore for MemoryStore {
    fn divisions(&self) -> StoreResult<Vec<Division>> {
        let mut out = self.read()?.divisions.clone();
        out.sort_by(|a, b| a.name.cmp(&b.name).then(a.id.cmp(&b.id)));
        Ok(out)
    }

    fn division(&self, id: u32) -> StoreResult<Option<Division>> {
        Ok(self.read()?.divisions.iter().find(|d| d.id == id).cloned())
    }

    fn units(&self) -> StoreResult<Vec<Municipality>> {
        let mut out = self.read()?.units.clone();
        out.sort_by(|a, b| a.name.cmp(&b.name).then(a.id.cmp(&b.id)));
        Ok(out)
    }

    fn unit(&self, id: u32) -> StoreResult<Option<Municipality>> {
        Ok(self.read()?.units.iter().find(|u| u.id == id).cloned())
    }

    fn tasks(&self, query: &TaskQuery) -> StoreResult<Vec<Task>> {
        let mut out: Vec<Task> = self
            .read()?
            .tasks
            .iter()
            .filter(|t| query.matches(t))
            .cloned()
            .collect();
        out.sort_by_key(|t| t.id);
        Ok(out)
    }

    fn task(&self, id: u32) -> StoreResult<Option<Task>> {
        Ok(self.read()?.tasks.iter().find(|t| t.id == id).cloned())
    }

    fn deliveries_for_task(&self, task_id: u32) -> StoreResult<Vec<Delivery>> {
        Ok(self
            .read()?
            .deliveries
            .iter()
            .filter(|d| d.task_id == task_id)
            .cloned()
            .collect())
    }

    fn deliveries_for_unit(&self, unit_id: u32) -> StoreResult<Vec<Delivery>> {
        Ok(self
            .read()?
            .deliveries
            .iter()
            .filter(|d| d.municipality_id == unit_id)
            .cloned()
            .collect())
    }

    fn finish_task(&self, id: u32) -> StoreResult<bool> {
        let mut t = self.write()?;
        match t
            .tasks
            .iter_mut()
            .find(|x| x.id == id && x.status == TaskStatus::InProgress)
        {
            Some(task) => {
                task.status = TaskStatus::Finished;
                Ok(true)
            }
            None => Ok(false),
        }
    }

    fn finish_due_tasks(&self, now: NaiveDateTime) -> StoreResult<usize> {
        let mut t = self.write()?;
        let mut changed = 0usize;
        for task in t.tasks.iter_mut().filter(|x| x.is_due(now)) {
            task.status = TaskStatus::Finished;
            changed += 1;
        }
        Ok(changed)
    }

    fn set_quality_rating(&self, delivery_id: u32, rating: u8) -> StoreResult<bool> {
        let mut t = self.write()?;
        match t.deliveries.iter_mut().find(|d| d.id == delivery_id) {
            Some(d) => {
                d.quality_rating = Some(rating);
                Ok(true)
            }
            None => Ok(false),
        }
    }
}
