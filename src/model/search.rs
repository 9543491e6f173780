/// Which entity families a search query runs against.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SearchFilters {
    pub projects: bool,
    pub tasks: bool,
    pub big_projects: bool,
    pub sub_projects: bool,
    pub sub_tasks: bool,
}

impl Default for SearchFilters {
    fn default() -> Self {
        Self::all()
    }
}

impl SearchFilters {
    /// Every entity family enabled.
    pub fn all() -> Self {
        Self {
            projects: true,
            tasks: true,
            big_projects: true,
            sub_projects: true,
            sub_tasks: true,
        }
    }

    /// Every entity family disabled.
    pub fn none() -> Self {
        Self {
            projects: false,
            tasks: false,
            big_projects: false,
            sub_projects: false,
            sub_tasks: false,
        }
    }
}

/// What kind of entity a search hit points at.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SearchKind {
    Project,
    Task,
    BigProject,
    SubProject,
    SubTask,
}

impl SearchKind {
    pub fn label(self) -> &'static str {
        match self {
            SearchKind::Project => "Project",
            SearchKind::Task => "Task",
            SearchKind::BigProject => "Big project",
            SearchKind::SubProject => "Sub-project",
            SearchKind::SubTask => "Sub-task",
        }
    }
}

/// A flattened search hit, carrying enough to render the result row and to
/// re-locate the source entity.
#[derive(Debug, Clone, PartialEq)]
pub struct SearchResult {
    pub kind: SearchKind,
    pub id: String,
    pub title: String,
    pub description: String,
    /// "Project" or "Big > Sub" breadcrumb; empty for top-level entities.
    pub parent: String,
    /// Formatted date range, empty when dates are unset.
    pub dates: String,
    /// Status or progress text, depending on the entity kind.
    pub status: String,
    pub project_id: String,
    pub big_project_id: String,
    pub sub_project_id: String,
}

impl SearchResult {
    pub(crate) fn new(kind: SearchKind, id: &str, title: &str, description: &str) -> Self {
        Self {
            kind,
            id: id.to_string(),
            title: title.to_string(),
            description: description.to_string(),
            parent: String::new(),
            dates: String::new(),
            status: String::new(),
            project_id: String::new(),
            big_project_id: String::new(),
            sub_project_id: String::new(),
        }
    }
}
