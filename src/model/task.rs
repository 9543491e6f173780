use serde::{Deserialize, Serialize};

/// Lifecycle state of a single work item.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum TaskStatus {
    #[default]
    #[serde(rename = "not-started")]
    NotStarted,
    #[serde(rename = "in-progress")]
    InProgress,
    #[serde(rename = "completed")]
    Completed,
}

impl TaskStatus {
    /// Display label for the status.
    pub fn label(self) -> &'static str {
        match self {
            TaskStatus::NotStarted => "Not started",
            TaskStatus::InProgress => "In progress",
            TaskStatus::Completed => "Completed",
        }
    }
}

/// A task owned by a regular project.
///
/// Date and time fields are plain strings as stored in the document
/// (`yyyy-mm-dd` / `HH:MM`); an empty string means the field is unset.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Task {
    pub id: String,
    pub project_id: String,
    pub title: String,
    pub description: String,
    pub status: TaskStatus,
    pub start_date: String,
    pub start_time: String,
    pub end_date: String,
    pub end_time: String,
    pub assignee: String,
    pub category: String,
    pub completed_date: String,
}

/// A leaf work item owned by a sub-project.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct SubTask {
    pub id: String,
    pub sub_project_id: String,
    pub title: String,
    pub description: String,
    pub status: TaskStatus,
    pub start_date: String,
    pub start_time: String,
    pub end_date: String,
    pub end_time: String,
    pub assignee: String,
    pub completed_date: String,
}

/// A work item from either hierarchy, tagged by origin.
///
/// Replaces the field-presence check the board and burnup views would
/// otherwise need to tell a project task from a sub-project task.
#[derive(Debug, Clone, PartialEq)]
pub enum WorkItem {
    Task(Task),
    SubTask(SubTask),
}

impl WorkItem {
    pub fn id(&self) -> &str {
        match self {
            WorkItem::Task(t) => &t.id,
            WorkItem::SubTask(t) => &t.id,
        }
    }

    pub fn title(&self) -> &str {
        match self {
            WorkItem::Task(t) => &t.title,
            WorkItem::SubTask(t) => &t.title,
        }
    }

    pub fn status(&self) -> TaskStatus {
        match self {
            WorkItem::Task(t) => t.status,
            WorkItem::SubTask(t) => t.status,
        }
    }

    pub fn start_date(&self) -> &str {
        match self {
            WorkItem::Task(t) => &t.start_date,
            WorkItem::SubTask(t) => &t.start_date,
        }
    }

    pub fn end_date(&self) -> &str {
        match self {
            WorkItem::Task(t) => &t.end_date,
            WorkItem::SubTask(t) => &t.end_date,
        }
    }

    pub fn completed_date(&self) -> &str {
        match self {
            WorkItem::Task(t) => &t.completed_date,
            WorkItem::SubTask(t) => &t.completed_date,
        }
    }

    pub fn assignee(&self) -> &str {
        match self {
            WorkItem::Task(t) => &t.assignee,
            WorkItem::SubTask(t) => &t.assignee,
        }
    }
}

impl From<Task> for WorkItem {
    fn from(task: Task) -> Self {
        WorkItem::Task(task)
    }
}

impl From<SubTask> for WorkItem {
    fn from(task: SubTask) -> Self {
        WorkItem::SubTask(task)
    }
}
