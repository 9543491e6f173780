//! planboard — client core for a project/task dashboard backed by a live
//! document store.
//!
//! The store pushes collection snapshots; the [`sync::Dashboard`] controller
//! fans subscriptions out across the entity hierarchy (projects → tasks,
//! big projects → sub-projects → sub-tasks), keeps the local caches
//! consistent, and recomputes the derived views — kanban board buckets,
//! Gantt timeline, burnup/burndown series — on every snapshot. The
//! [`agg`] and [`chart`] modules hold those computations as pure functions;
//! [`comments`] builds reply trees and @mention suggestions for one task at
//! a time. Rendering is the embedding application's concern.

pub mod agg;
pub mod chart;
pub mod comments;
pub mod error;
pub mod model;
pub mod store;
pub mod sync;
pub mod validate;

pub use error::{AuthError, Error, StoreError, ValidationError};
pub use sync::{ChartTarget, Dashboard};
