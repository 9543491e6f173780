use crate::model::WorkItem;

use super::percent;

/// One point of a burnup/burndown series.
#[derive(Debug, Clone, PartialEq)]
pub struct BurnupPoint {
    /// ISO `yyyy-mm-dd` completion date (or the entity start date for the
    /// synthetic first point).
    pub date: String,
    /// Total planned tasks at this point.
    pub planned: usize,
    /// Cumulative completed tasks at this point.
    pub completed: usize,
    pub label: String,
}

/// A computed series plus its axis range.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct BurnupSeries {
    pub points: Vec<BurnupPoint>,
    pub start_date: String,
    pub end_date: String,
}

impl BurnupSeries {
    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }
}

/// Build the burnup series for an entity with the given date range and task
/// set.
///
/// Completed tasks with a non-empty completion date are sorted ascending by
/// date (ISO strings compare chronologically) and emitted with cumulative
/// counts. A synthetic start point (start date, 0 completed) is prepended;
/// if the last real point sits below 100%, a synthetic end point at the last
/// completion date with every task counted is appended. The series is empty
/// when either date is missing or there are no tasks at all.
pub fn burnup_series(start_date: &str, end_date: &str, items: &[WorkItem]) -> BurnupSeries {
    if start_date.is_empty() || end_date.is_empty() || items.is_empty() {
        return BurnupSeries::default();
    }
    let total = items.len();

    let mut completed: Vec<&WorkItem> = items
        .iter()
        .filter(|t| {
            t.status() == crate::model::TaskStatus::Completed && !t.completed_date().is_empty()
        })
        .collect();
    completed.sort_by(|a, b| a.completed_date().cmp(b.completed_date()));

    let mut points = vec![BurnupPoint {
        date: start_date.to_string(),
        planned: total,
        completed: 0,
        label: start_date.to_string(),
    }];
    let mut count = 0;
    let mut last_progress = 0;
    let mut last_date = String::new();
    for item in completed {
        count += 1;
        last_progress = percent(count, total);
        last_date = item.completed_date().to_string();
        points.push(BurnupPoint {
            date: last_date.clone(),
            planned: total,
            completed: count,
            label: last_date.clone(),
        });
    }
    // Close the series at 100% on the day of the last completion.
    if last_progress < 100 && !last_date.is_empty() {
        points.push(BurnupPoint {
            date: last_date.clone(),
            planned: total,
            completed: total,
            label: last_date.clone(),
        });
    }

    BurnupSeries {
        points,
        start_date: start_date.to_string(),
        end_date: if last_date.is_empty() {
            end_date.to_string()
        } else {
            last_date
        },
    }
}
