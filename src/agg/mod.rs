//! Aggregation engine: derived values computed wholesale from the live
//! entity caches. Pure functions — malformed or missing input degrades to
//! empty or zero results, never a panic.

pub mod board;
pub mod burnup;
pub mod progress;
pub mod search;

pub use board::{board_partition, BoardCard, BoardView};
pub use burnup::{burnup_series, BurnupPoint, BurnupSeries};
pub use progress::{big_project_progress, percent, project_progress, sub_project_progress};
pub use search::search;
