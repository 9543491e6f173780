use std::collections::BTreeMap;

use crate::model::{SubProject, SubTask, Task, TaskStatus};

/// Rounded percentage of `completed` over `total`; 0 for an empty set.
pub fn percent(completed: usize, total: usize) -> u8 {
    if total == 0 {
        0
    } else {
        ((completed as f64 / total as f64) * 100.0).round() as u8
    }
}

/// Progress of a regular project over its task list.
pub fn project_progress(tasks: &[Task]) -> u8 {
    let completed = tasks
        .iter()
        .filter(|t| t.status == TaskStatus::Completed)
        .count();
    percent(completed, tasks.len())
}

/// Progress of a sub-project over the union of its embedded tasks and its
/// separately-subscribed sub-tasks.
pub fn sub_project_progress(sub: &SubProject, sub_tasks: &BTreeMap<String, Vec<SubTask>>) -> u8 {
    let extra = sub_tasks.get(&sub.id).map(Vec::as_slice).unwrap_or(&[]);
    let total = sub.tasks.len() + extra.len();
    let completed = sub
        .tasks
        .iter()
        .map(|t| t.status)
        .chain(extra.iter().map(|t| t.status))
        .filter(|s| *s == TaskStatus::Completed)
        .count();
    percent(completed, total)
}

/// Big-project progress: the rounded average of its sub-projects' progress
/// values. A sub-project with one task and one with a hundred contribute
/// equally; 0 with no sub-projects.
pub fn big_project_progress(
    sub_projects: &[SubProject],
    sub_tasks: &BTreeMap<String, Vec<SubTask>>,
) -> u8 {
    if sub_projects.is_empty() {
        return 0;
    }
    let sum: u32 = sub_projects
        .iter()
        .map(|sp| u32::from(sub_project_progress(sp, sub_tasks)))
        .sum();
    (f64::from(sum) / sub_projects.len() as f64).round() as u8
}
