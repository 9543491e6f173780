//! Chart geometry engine: maps the time axis onto pixels for the Gantt view
//! and the burnup/burndown charts. Everything here is a pure function of its
//! inputs; the container width arrives as a parameter (see [`width`] for the
//! bounded-retry measurement helper the presentation layer drives).

pub mod burn;
pub mod gantt;
pub mod width;

pub use burn::{
    axis_labels, bar_chart_width, burndown_polyline, burnup_polyline, chart_svg_width,
    progress_bars, summary_points, AxisLabel, AxisSpec, ProgressBar,
};
pub use gantt::{bar_geometry, gantt_view, status_color, BarGeometry, GanttTask, GanttView};
pub use width::{ProbeState, WidthProbe};
