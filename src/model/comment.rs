use serde::{Deserialize, Serialize};

/// One comment on a task. A non-empty `parentId` makes it a reply; comments
/// whose parent cannot be resolved are treated as roots.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct TaskComment {
    pub id: String,
    pub task_id: String,
    pub user_id: String,
    /// The author's email, shown as the display name.
    pub user_name: String,
    pub content: String,
    /// Store-assigned RFC 3339 timestamp.
    pub created_at: String,
    pub parent_id: String,
}
