use std::collections::BTreeMap;

use crate::model::{Project, SubProject, SubTask, Task, TaskStatus, WorkItem};

/// One card on the kanban board.
#[derive(Debug, Clone, PartialEq)]
pub struct BoardCard {
    pub item: WorkItem,
    /// "Project" or "Big > Sub" breadcrumb; empty when the parent is unknown.
    pub parent: String,
}

/// The three status buckets of the board view.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct BoardView {
    pub not_started: Vec<BoardCard>,
    pub in_progress: Vec<BoardCard>,
    pub completed: Vec<BoardCard>,
}

impl BoardView {
    pub fn bucket(&self, status: TaskStatus) -> &[BoardCard] {
        match status {
            TaskStatus::NotStarted => &self.not_started,
            TaskStatus::InProgress => &self.in_progress,
            TaskStatus::Completed => &self.completed,
        }
    }

    pub fn len(&self) -> usize {
        self.not_started.len() + self.in_progress.len() + self.completed.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn push(&mut self, card: BoardCard) {
        match card.item.status() {
            TaskStatus::NotStarted => self.not_started.push(card),
            TaskStatus::InProgress => self.in_progress.push(card),
            TaskStatus::Completed => self.completed.push(card),
        }
    }
}

/// Partition the union of all regular tasks and all subscribed sub-tasks into
/// status buckets. Recomputed wholesale whenever any contributing collection
/// changes; idempotent over the same caches.
pub fn board_partition(
    projects: &[Project],
    project_tasks: &BTreeMap<String, Vec<Task>>,
    sub_projects: &BTreeMap<String, Vec<SubProject>>,
    sub_tasks: &BTreeMap<String, Vec<SubTask>>,
) -> BoardView {
    let mut view = BoardView::default();

    for (project_id, tasks) in project_tasks {
        let parent = projects
            .iter()
            .find(|p| &p.id == project_id)
            .map(|p| p.name.clone())
            .unwrap_or_default();
        for task in tasks {
            view.push(BoardCard {
                item: WorkItem::Task(task.clone()),
                parent: parent.clone(),
            });
        }
    }

    for sub in sub_projects.values().flatten() {
        let parent = if sub.big_project_name.is_empty() {
            sub.name.clone()
        } else {
            format!("{} > {}", sub.big_project_name, sub.name)
        };
        for task in sub_tasks.get(&sub.id).into_iter().flatten() {
            view.push(BoardCard {
                item: WorkItem::SubTask(task.clone()),
                parent: parent.clone(),
            });
        }
    }

    view
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn partitions_tasks_and_sub_tasks_by_status() {
        let projects = vec![Project {
            id: "p1".to_string(),
            name: "Alpha".to_string(),
            ..Project::default()
        }];
        let mut project_tasks = BTreeMap::new();
        project_tasks.insert(
            "p1".to_string(),
            vec![
                Task {
                    id: "t1".to_string(),
                    status: TaskStatus::Completed,
                    ..Task::default()
                },
                Task {
                    id: "t2".to_string(),
                    status: TaskStatus::NotStarted,
                    ..Task::default()
                },
            ],
        );
        let mut sub_projects = BTreeMap::new();
        sub_projects.insert(
            "bp1".to_string(),
            vec![SubProject {
                id: "sp1".to_string(),
                name: "Phase 1".to_string(),
                big_project_name: "Rollout".to_string(),
                ..SubProject::default()
            }],
        );
        let mut sub_tasks = BTreeMap::new();
        sub_tasks.insert(
            "sp1".to_string(),
            vec![SubTask {
                id: "st1".to_string(),
                status: TaskStatus::InProgress,
                ..SubTask::default()
            }],
        );

        let view = board_partition(&projects, &project_tasks, &sub_projects, &sub_tasks);
        assert_eq!(view.len(), 3);
        assert_eq!(view.completed.len(), 1);
        assert_eq!(view.not_started[0].parent, "Alpha");
        assert_eq!(view.in_progress[0].parent, "Rollout > Phase 1");

        // Idempotent over the same caches.
        let again = board_partition(&projects, &project_tasks, &sub_projects, &sub_tasks);
        assert_eq!(view, again);
    }

    #[test]
    fn unknown_parent_degrades_to_empty_breadcrumb() {
        let mut project_tasks = BTreeMap::new();
        project_tasks.insert(
            "ghost".to_string(),
            vec![Task {
                id: "t1".to_string(),
                ..Task::default()
            }],
        );
        let view = board_partition(&[], &project_tasks, &BTreeMap::new(), &BTreeMap::new());
        assert_eq!(view.not_started[0].parent, "");
    }
}
