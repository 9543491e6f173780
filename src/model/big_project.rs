use serde::{Deserialize, Serialize};

use super::task::SubTask;

/// A top-level container one level above `Project`, owning sub-projects
/// through a subcollection rather than an embedded array.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct BigProject {
    pub id: String,
    pub name: String,
    pub description: String,
    pub start_date: String,
    pub start_time: String,
    pub end_date: String,
    pub end_time: String,
    pub category: String,
    pub tags: Vec<String>,
    /// Rounded average of the sub-projects' progress values.
    pub progress: u8,
    pub assignee: String,
    pub budget: f64,
    /// Open-ended status keyword: "planning", "active", "on-hold", ...
    pub status: String,
}

impl Default for BigProject {
    fn default() -> Self {
        Self {
            id: String::new(),
            name: String::new(),
            description: String::new(),
            start_date: String::new(),
            start_time: String::new(),
            end_date: String::new(),
            end_time: String::new(),
            category: String::new(),
            tags: Vec::new(),
            progress: 0,
            assignee: String::new(),
            budget: 0.0,
            status: "planning".to_string(),
        }
    }
}

impl BigProject {
    /// Display label for the status keyword; unknown keywords pass through.
    pub fn status_label(&self) -> &str {
        status_label(&self.status)
    }
}

/// Map a status keyword to its display label; unknown keywords pass through.
pub fn status_label(status: &str) -> &str {
    match status {
        "not-started" => "Not started",
        "in-progress" => "In progress",
        "completed" => "Completed",
        "planning" => "Planning",
        "active" => "Active",
        "on-hold" => "On hold",
        other => other,
    }
}

/// A child of a big project, owning sub-tasks through a further-nested
/// subcollection. Legacy documents may also carry embedded `tasks`; those
/// still count toward progress, burnup and search.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct SubProject {
    pub id: String,
    pub name: String,
    pub description: String,
    pub start_date: String,
    pub start_time: String,
    pub end_date: String,
    pub end_time: String,
    pub assignee: String,
    pub tasks: Vec<SubTask>,
    /// Stamped from the parent when the snapshot arrives; the subcollection
    /// documents do not carry a parent reference themselves.
    #[serde(skip)]
    pub big_project_id: String,
    #[serde(skip)]
    pub big_project_name: String,
}
