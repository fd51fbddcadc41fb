//! Time windows and the overlap rule shared by the monthly breakdown and
//! the evaluation range filter.

use chrono::{Datelike, Duration, NaiveDate, NaiveDateTime, NaiveTime};

use crate::error::{EvalError, Result};
use crate::types::Task;

/// Closed interval `[start, end]`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TimeWindow {
    pub start: NaiveDateTime,
    pub end: NaiveDateTime,
}

impl TimeWindow {
    pub fn new(start: NaiveDateTime, end: NaiveDateTime) -> Result<Self> {
        if end < start {
            return Err(EvalError::InvalidInput(format!(
                "window end {} precedes start {}",
                end, start
            )));
        }
        Ok(TimeWindow { start, end })
    }

    /// `[first day 00:00, last day 23:59:59.999]` of the given month.
    pub fn month(year: i32, month: u32) -> Result<Self> {
        let first = NaiveDate::from_ymd_opt(year, month, 1)
            .ok_or_else(|| EvalError::InvalidInput(format!("invalid month {}-{}", year, month)))?;
        let next_first = if month == 12 {
            NaiveDate::from_ymd_opt(year + 1, 1, 1)
        } else {
            NaiveDate::from_ymd_opt(year, month + 1, 1)
        }
        .ok_or_else(|| EvalError::InvalidInput(format!("month {}-{} out of range", year, month)))?;

        let start = first.and_time(NaiveTime::default());
        let end = next_first.and_time(NaiveTime::default()) - Duration::milliseconds(1);
        Ok(TimeWindow { start, end })
    }

    /// Unbounded on both ends.
    pub fn unbounded() -> Self {
        TimeWindow {
            start: NaiveDateTime::MIN,
            end: NaiveDateTime::MAX,
        }
    }

    pub fn contains(&self, t: NaiveDateTime) -> bool {
        self.start <= t && t <= self.end
    }

    /// `YYYY-MM` of the window start.
    pub fn period_label(&self) -> String {
        format!("{:04}-{:02}", self.start.year(), self.start.month())
    }
}

/// A task window belongs to `window` when it starts inside it, ends inside
/// it, or spans it entirely.
pub fn overlaps(task_start: NaiveDateTime, task_deadline: NaiveDateTime, window: &TimeWindow) -> bool {
    window.contains(task_start)
        || window.contains(task_deadline)
        || (task_start <= window.start && task_deadline >= window.end)
}

pub fn task_in_window(task: &Task, window: &TimeWindow) -> bool {
    overlaps(task.start_time, task.deadline_time, window)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn at(y: i32, m: u32, d: u32, h: u32) -> NaiveDateTime {
        NaiveDate::from_ymd_opt(y, m, d)
            .unwrap()
            .and_hms_opt(h, 0, 0)
            .unwrap()
    }

    #[test]
    fn month_window_bounds() {
        let w = TimeWindow::month(2024, 2).unwrap();
        assert_eq!(w.start, at(2024, 2, 1, 0));
        assert_eq!(
            w.end,
            NaiveDate::from_ymd_opt(2024, 2, 29)
                .unwrap()
                .and_time(NaiveTime::from_hms_milli_opt(23, 59, 59, 999).unwrap())
        );
        assert_eq!(w.period_label(), "2024-02");
    }

    #[test]
    fn december_rolls_into_next_year() {
        let w = TimeWindow::month(2023, 12).unwrap();
        assert_eq!(w.end.date(), NaiveDate::from_ymd_opt(2023, 12, 31).unwrap());
        assert_eq!(w.period_label(), "2023-12");
    }

    #[test]
    fn invalid_month_is_rejected() {
        assert!(TimeWindow::month(2024, 13).is_err());
        assert!(TimeWindow::month(2024, 0).is_err());
    }

    #[test]
    fn reversed_window_is_rejected() {
        assert!(TimeWindow::new(at(2024, 2, 1, 0), at(2024, 1, 1, 0)).is_err());
    }

    #[test]
    fn overlap_three_ways() {
        let w = TimeWindow::month(2024, 3).unwrap();
        // starts inside
        assert!(overlaps(at(2024, 3, 20, 0), at(2024, 4, 20, 0), &w));
        // ends inside
        assert!(overlaps(at(2024, 2, 10, 0), at(2024, 3, 5, 0), &w));
        // spans the whole month
        assert!(overlaps(at(2024, 1, 1, 0), at(2024, 5, 1, 0), &w));
        // entirely before / after
        assert!(!overlaps(at(2024, 1, 1, 0), at(2024, 2, 29, 23), &w));
        assert!(!overlaps(at(2024, 4, 1, 0), at(2024, 4, 30, 0), &w));
    }

    #[test]
    fn boundary_instants_are_inside() {
        let w = TimeWindow::month(2024, 3).unwrap();
        assert!(overlaps(at(2024, 1, 1, 0), w.start, &w));
        assert!(overlaps(w.end, at(2024, 6, 1, 0), &w));
    }
}
