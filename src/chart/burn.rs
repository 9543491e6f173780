use crate::agg::{percent, BurnupSeries};
use crate::model::dates::parse_date;
use crate::model::{TaskStatus, WorkItem};

/// One bar of the cumulative-progress strip.
#[derive(Debug, Clone, PartialEq)]
pub struct ProgressBar {
    /// ISO completion date.
    pub date: String,
    /// Cumulative progress percent after this completion.
    pub progress: u8,
    /// "yyyy/mm/dd" display label.
    pub label: String,
}

/// Geometry of one axis slot: where the label sits and which progress column
/// it carries.
#[derive(Debug, Clone, PartialEq)]
pub struct AxisLabel {
    pub date: String,
    /// "MM/DD" display label.
    pub label: String,
    pub x: f64,
    /// 0 at the start slot, 100 at the end slot, the cumulative progress of
    /// that completion date in between.
    pub progress: u8,
}

/// How an axis maps dates onto pixels.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct AxisSpec {
    pub x_start: f64,
    pub x_end: f64,
    /// Consecutive labels are pushed right until at least this far apart.
    pub min_label_margin: f64,
    /// Pin the final (end-date) label to `x_end` regardless of its true
    /// elapsed-time ratio, so the chart terminates at the container edge.
    pub pin_end: bool,
}

impl AxisSpec {
    /// The compact summary chart: fixed 70..270 strip, no right-edge pin.
    pub fn summary() -> Self {
        Self {
            x_start: 70.0,
            x_end: 270.0,
            min_label_margin: 12.0,
            pin_end: false,
        }
    }

    /// The full bar chart: 40 px gutters inside the given width, end label
    /// pinned to the right edge.
    pub fn full(width: f64) -> Self {
        Self {
            x_start: 40.0,
            x_end: width - 40.0,
            min_label_margin: 28.0,
            pin_end: true,
        }
    }
}

/// One bar per completed task, in completion order, with cumulative progress
/// over the full task count.
pub fn progress_bars(items: &[WorkItem]) -> Vec<ProgressBar> {
    if items.is_empty() {
        return Vec::new();
    }
    let total = items.len();
    let mut completed: Vec<&WorkItem> = items
        .iter()
        .filter(|t| t.status() == TaskStatus::Completed && !t.completed_date().is_empty())
        .collect();
    completed.sort_by(|a, b| a.completed_date().cmp(b.completed_date()));

    completed
        .iter()
        .enumerate()
        .map(|(i, item)| {
            let date = item.completed_date().to_string();
            ProgressBar {
                progress: percent(i + 1, total),
                label: slash_label(&date),
                date,
            }
        })
        .collect()
}

/// Axis labels for a burn chart: the entity start date, each distinct
/// completion date, and the entity end date, mapped linearly by elapsed time
/// onto `[x_start, x_end]`.
///
/// A zero-length total span is treated as exactly one day. When `pin_end` is
/// set the final label lands on `x_end` before the margin pass runs. The
/// margin pass walks left to right pushing any label that would sit closer
/// than `min_label_margin` to its predecessor; it never reorders labels.
pub fn axis_labels(
    start_date: &str,
    end_date: &str,
    bars: &[ProgressBar],
    spec: AxisSpec,
) -> Vec<AxisLabel> {
    if bars.is_empty() {
        return Vec::new();
    }

    let mut dates: Vec<String> = Vec::with_capacity(bars.len() + 2);
    if !start_date.is_empty() {
        dates.push(start_date.to_string());
    }
    dates.extend(bars.iter().map(|b| b.date.clone()));
    if !end_date.is_empty() {
        dates.push(end_date.to_string());
    }
    dates.sort_by(|a, b| parse_date(a).cmp(&parse_date(b)));
    dates.dedup();
    if dates.is_empty() {
        return Vec::new();
    }

    let min = dates.iter().filter_map(|d| parse_date(d)).min();
    let max = dates.iter().filter_map(|d| parse_date(d)).max();
    let (Some(min), Some(max)) = (min, max) else {
        return Vec::new();
    };
    let total_span = (max - min).num_days().max(1) as f64;

    let last = dates.len() - 1;
    let mut last_x = f64::NEG_INFINITY;
    dates
        .iter()
        .enumerate()
        .map(|(i, date)| {
            let ratio = parse_date(date)
                .map(|d| (d - min).num_days() as f64 / total_span)
                .unwrap_or(0.0);
            let mut x = spec.x_start + ratio * (spec.x_end - spec.x_start);
            if spec.pin_end && i == last {
                x = spec.x_end;
            }
            if x - last_x < spec.min_label_margin {
                x = last_x + spec.min_label_margin;
            }
            last_x = x;
            let progress = if i == 0 {
                0
            } else if i == last {
                100
            } else {
                progress_at(date, bars)
            };
            AxisLabel {
                date: date.clone(),
                label: month_day_label(date),
                x,
                progress,
            }
        })
        .collect()
}

/// Cumulative progress reached on a given completion date.
fn progress_at(date: &str, bars: &[ProgressBar]) -> u8 {
    bars.iter()
        .filter(|b| b.date == date)
        .map(|b| b.progress)
        .max()
        .unwrap_or(0)
}

fn slash_label(date: &str) -> String {
    parse_date(date)
        .map(|d| d.format("%Y/%m/%d").to_string())
        .unwrap_or_else(|| date.replace('-', "/"))
}

fn month_day_label(date: &str) -> String {
    parse_date(date)
        .map(|d| d.format("%m/%d").to_string())
        .unwrap_or_else(|| date.to_string())
}

/// Bar-strip width: 36 px per bar with a 320 px floor.
pub fn bar_chart_width(bar_count: usize) -> f64 {
    (bar_count as f64 * 36.0).max(320.0)
}

/// Full chart width: the measured container width with a label-density floor
/// (18 px per gap plus gutters) and a 340 px hard floor.
pub fn chart_svg_width(container_width: f64, label_count: usize) -> f64 {
    let label_floor = label_count.saturating_sub(1) as f64 * 18.0 + 80.0;
    container_width.max(label_floor).max(340.0)
}

/// Join (x, y) vertices into an SVG `points` attribute.
fn polyline_attr(points: &[(f64, f64)]) -> String {
    points
        .iter()
        .map(|(x, y)| format!("{x},{y}"))
        .collect::<Vec<_>>()
        .join(" ")
}

/// Actual-progress line of the burndown chart: anchored at the bottom-left
/// of the plot area, then one vertex per interior label (the synthetic start
/// and end slots are implied by the anchor and the right-edge pin).
pub fn burndown_polyline(labels: &[AxisLabel]) -> String {
    anchored_polyline(labels, 40.0, 170.0, 1.3)
}

/// Actual-progress line of the taller burnup chart.
pub fn burnup_polyline(labels: &[AxisLabel]) -> String {
    anchored_polyline(labels, 40.0, 340.0, 2.6)
}

fn anchored_polyline(labels: &[AxisLabel], anchor_x: f64, base_y: f64, scale: f64) -> String {
    if labels.is_empty() {
        return String::new();
    }
    let interior: &[AxisLabel] = if labels.len() > 2 {
        &labels[1..labels.len() - 1]
    } else {
        &[]
    };
    let mut points = vec![(anchor_x, base_y)];
    for label in interior {
        points.push((label.x, base_y - f64::from(label.progress) * scale));
    }
    polyline_attr(&points)
}

/// Points attribute for the compact summary line: x by elapsed-time ratio
/// over the 70..270 strip, y with a 0.8 headroom scale below the 100 px top.
pub fn summary_points(series: &BurnupSeries) -> String {
    let (Some(min), Some(max)) = (parse_date(&series.start_date), parse_date(&series.end_date))
    else {
        return String::new();
    };
    let spec = AxisSpec::summary();
    let total_span = (max - min).num_days().max(1) as f64;
    let points: Vec<(f64, f64)> = series
        .points
        .iter()
        .map(|p| {
            let ratio = parse_date(&p.date)
                .map(|d| (d - min).num_days() as f64 / total_span)
                .unwrap_or(0.0);
            let x = spec.x_start + ratio * (spec.x_end - spec.x_start);
            let y = if p.planned == 0 {
                100.0
            } else {
                100.0 - ((p.completed as f64 / p.planned as f64) * 80.0).round()
            };
            (x, y)
        })
        .collect();
    polyline_attr(&points)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::agg::burnup_series;
    use crate::model::Task;
    use pretty_assertions::assert_eq;

    fn completed(date: &str) -> WorkItem {
        WorkItem::Task(Task {
            status: TaskStatus::Completed,
            completed_date: date.to_string(),
            ..Task::default()
        })
    }

    fn open() -> WorkItem {
        WorkItem::Task(Task::default())
    }

    #[test]
    fn bars_accumulate_progress_in_date_order() {
        let bars = progress_bars(&[
            completed("2024-04-07"),
            completed("2024-04-03"),
            open(),
            open(),
        ]);
        assert_eq!(bars.len(), 2);
        assert_eq!(bars[0].date, "2024-04-03");
        assert_eq!(bars[0].progress, 25);
        assert_eq!(bars[1].progress, 50);
        assert_eq!(bars[1].label, "2024/04/07");
    }

    #[test]
    fn axis_maps_dates_linearly_and_pins_the_end() {
        let bars = progress_bars(&[completed("2024-04-05"), open()]);
        let labels = axis_labels("2024-04-01", "2024-04-09", &bars, AxisSpec::full(1080.0));
        assert_eq!(labels.len(), 3);
        assert_eq!(labels[0].x, 40.0);
        // 2024-04-05 is halfway through an eight-day span.
        assert_eq!(labels[1].x, 540.0);
        assert_eq!(labels[2].x, 1040.0);
        assert_eq!(labels[0].progress, 0);
        assert_eq!(labels[1].progress, 50);
        assert_eq!(labels[2].progress, 100);
        assert_eq!(labels[1].label, "04/05");
    }

    #[test]
    fn label_margins_are_monotonic_and_at_least_the_minimum() {
        // Completions crowd the start of a long range.
        let items: Vec<WorkItem> = (1..=5).map(|d| completed(&format!("2024-04-0{d}"))).collect();
        let bars = progress_bars(&items);
        let spec = AxisSpec::full(400.0);
        let labels = axis_labels("2024-04-01", "2024-12-31", &bars, spec);
        for pair in labels.windows(2) {
            let gap = pair[1].x - pair[0].x;
            assert!(gap >= spec.min_label_margin - 1e-9, "gap {gap} too small");
        }
    }

    #[test]
    fn zero_span_range_is_treated_as_one_day() {
        let bars = progress_bars(&[completed("2024-04-01")]);
        let labels = axis_labels("2024-04-01", "2024-04-01", &bars, AxisSpec::summary());
        // A single distinct date collapses to one slot at the strip start.
        assert_eq!(labels.len(), 1);
        assert_eq!(labels[0].x, 70.0);
    }

    #[test]
    fn duplicate_completion_dates_collapse_to_one_slot() {
        let bars = progress_bars(&[
            completed("2024-04-05"),
            completed("2024-04-05"),
            open(),
            open(),
        ]);
        let labels = axis_labels("2024-04-01", "2024-04-09", &bars, AxisSpec::full(1080.0));
        assert_eq!(labels.len(), 3);
        // The slot carries the furthest progress reached on that date.
        assert_eq!(labels[1].progress, 50);
    }

    #[test]
    fn polylines_anchor_bottom_left_and_skip_the_end_slots() {
        let bars = progress_bars(&[completed("2024-04-05"), open()]);
        let labels = axis_labels("2024-04-01", "2024-04-09", &bars, AxisSpec::full(1080.0));
        assert_eq!(burndown_polyline(&labels), "40,170 540,105");
        assert_eq!(burnup_polyline(&labels), "40,340 540,210");
        assert_eq!(burndown_polyline(&[]), "");
    }

    #[test]
    fn summary_line_scales_progress_into_the_headroom() {
        let series = burnup_series("2024-04-01", "2024-04-09", &[completed("2024-04-05"), open()]);
        // Points: start (0%), completion (50%), synthetic end (100%). The
        // series' own axis ends at the last completion date, so the final
        // points sit on the right edge of the strip.
        assert_eq!(summary_points(&series), "70,100 270,60 270,20");
    }

    #[test]
    fn widths_respect_their_floors() {
        assert_eq!(bar_chart_width(0), 320.0);
        assert_eq!(bar_chart_width(20), 720.0);
        assert_eq!(chart_svg_width(200.0, 3), 340.0);
        assert_eq!(chart_svg_width(200.0, 40), 40.0 * 18.0 - 18.0 + 80.0);
        assert_eq!(chart_svg_width(2000.0, 3), 2000.0);
    }
}
