use chrono::{Datelike, NaiveDate};

use crate::model::dates::parse_date;
use crate::model::TaskStatus;

/// Fallback shown when a task has no assignee.
pub const UNASSIGNED: &str = "Unassigned";

/// Projection of a task used only for timeline rendering; always re-derivable
/// from the source task.
#[derive(Debug, Clone, PartialEq)]
pub struct GanttTask {
    pub id: String,
    pub name: String,
    pub start_date: String,
    pub end_date: String,
    pub assignee: String,
    pub status: TaskStatus,
}

impl GanttTask {
    /// Project a task's fields; `None` when either date is unset, since a
    /// bar without both endpoints cannot be placed.
    pub fn from_fields(
        id: &str,
        title: &str,
        start_date: &str,
        end_date: &str,
        assignee: &str,
        status: TaskStatus,
    ) -> Option<Self> {
        if start_date.is_empty() || end_date.is_empty() {
            return None;
        }
        Some(Self {
            id: id.to_string(),
            name: title.to_string(),
            start_date: start_date.to_string(),
            end_date: end_date.to_string(),
            assignee: if assignee.is_empty() {
                UNASSIGNED.to_string()
            } else {
                assignee.to_string()
            },
            status,
        })
    }
}

/// The derived Gantt view: tasks sorted by start date plus the chart range
/// and its month label strip.
#[derive(Debug, Clone, PartialEq)]
pub struct GanttView {
    pub tasks: Vec<GanttTask>,
    pub start_date: String,
    pub end_date: String,
    pub months: Vec<String>,
}

impl Default for GanttView {
    fn default() -> Self {
        Self {
            tasks: Vec::new(),
            start_date: "2024-04-01".to_string(),
            end_date: "2024-06-30".to_string(),
            months: vec![
                "Apr 2024".to_string(),
                "May 2024".to_string(),
                "Jun 2024".to_string(),
            ],
        }
    }
}

/// Build the Gantt view from the candidate tasks: sort by start date and
/// derive the chart range, snapped outward to month boundaries.
pub fn gantt_view(mut tasks: Vec<GanttTask>) -> GanttView {
    tasks.sort_by(|a, b| a.start_date.cmp(&b.start_date));
    let mut view = GanttView {
        tasks,
        ..GanttView::default()
    };

    let dates: Vec<NaiveDate> = view
        .tasks
        .iter()
        .flat_map(|t| [parse_date(&t.start_date), parse_date(&t.end_date)])
        .flatten()
        .collect();
    let (Some(&min), Some(&max)) = (dates.iter().min(), dates.iter().max()) else {
        return view;
    };

    let start = min.with_day(1).unwrap_or(min);
    let end = month_end(max);
    view.start_date = start.format("%Y-%m-%d").to_string();
    view.end_date = end.format("%Y-%m-%d").to_string();
    view.months = month_labels(start, end);
    view
}

/// Horizontal placement of one task bar, as percentages of the chart width.
#[derive(Debug, Clone, PartialEq)]
pub struct BarGeometry {
    pub left_pct: f64,
    pub width_pct: f64,
    pub color: &'static str,
}

/// Fixed status colors for timeline bars.
pub fn status_color(status: TaskStatus) -> &'static str {
    match status {
        TaskStatus::Completed => "#4CAF50",
        TaskStatus::InProgress => "#2196F3",
        TaskStatus::NotStarted => "#FFA07A",
    }
}

/// Position a task bar within the chart range. Day counts are inclusive of
/// both endpoints: a one-day task on a ten-day chart is 10% wide.
///
/// `None` when any date fails to parse; a bar that cannot be placed is
/// simply not drawn.
pub fn bar_geometry(task: &GanttTask, chart_start: &str, chart_end: &str) -> Option<BarGeometry> {
    let start = parse_date(&task.start_date)?;
    let end = parse_date(&task.end_date)?;
    let gantt_start = parse_date(chart_start)?;
    let gantt_end = parse_date(chart_end)?;

    let total_days = ((gantt_end - gantt_start).num_days() + 1).max(1) as f64;
    let start_offset = (start - gantt_start).num_days() as f64;
    let duration = ((end - start).num_days() + 1) as f64;

    Some(BarGeometry {
        left_pct: start_offset / total_days * 100.0,
        width_pct: duration / total_days * 100.0,
        color: status_color(task.status),
    })
}

/// Last day of the month containing `d`.
fn month_end(d: NaiveDate) -> NaiveDate {
    let (year, month) = if d.month() == 12 {
        (d.year() + 1, 1)
    } else {
        (d.year(), d.month() + 1)
    };
    NaiveDate::from_ymd_opt(year, month, 1)
        .map(|first| first - chrono::Duration::days(1))
        .unwrap_or(d)
}

/// "Apr 2024", "May 2024", ... for every month the range touches.
fn month_labels(start: NaiveDate, end: NaiveDate) -> Vec<String> {
    let mut labels = Vec::new();
    let mut cursor = start.with_day(1).unwrap_or(start);
    while cursor <= end {
        labels.push(cursor.format("%b %Y").to_string());
        let (year, month) = if cursor.month() == 12 {
            (cursor.year() + 1, 1)
        } else {
            (cursor.year(), cursor.month() + 1)
        };
        match NaiveDate::from_ymd_opt(year, month, 1) {
            Some(next) => cursor = next,
            None => break,
        }
    }
    labels
}
