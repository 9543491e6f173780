use serde::{Deserialize, Serialize};

/// A regular project owning a flat list of tasks (1:N via the tasks'
/// `projectId` back-reference).
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Project {
    pub id: String,
    pub name: String,
    pub description: String,
    pub start_date: String,
    pub start_time: String,
    pub end_date: String,
    pub end_time: String,
    pub category: String,
    pub tags: Vec<String>,
    /// Rolled-up completion percentage, 0–100. Written back to the store
    /// whenever the task set changes.
    pub progress: u8,
    pub assignee: String,
}
