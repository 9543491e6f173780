//! Hierarchy synchronization controller: fans subscriptions out across the
//! entity tree (projects → tasks; big projects → sub-projects → sub-tasks),
//! owns the local caches, and recomputes every derived view on each
//! snapshot.

pub mod controller;

pub use controller::{ChartTarget, Dashboard};
