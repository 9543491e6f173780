use std::collections::BTreeMap;

use crate::model::dates::format_range;
use crate::model::{
    BigProject, Project, SearchFilters, SearchKind, SearchResult, SubProject, SubTask, Task,
};

/// Case-insensitive substring match against the searchable fields.
fn matches(query: &str, fields: [&str; 4]) -> bool {
    fields
        .iter()
        .any(|f| !f.is_empty() && f.to_lowercase().contains(query))
}

/// Search every enabled entity family for a case-insensitive substring of
/// `query` in title/name, description, assignee or category.
///
/// An empty or whitespace-only query yields no results, not "match all".
pub fn search(
    query: &str,
    filters: SearchFilters,
    projects: &[Project],
    project_tasks: &BTreeMap<String, Vec<Task>>,
    big_projects: &[BigProject],
    sub_projects: &BTreeMap<String, Vec<SubProject>>,
    sub_tasks: &BTreeMap<String, Vec<SubTask>>,
) -> Vec<SearchResult> {
    let query = query.trim().to_lowercase();
    if query.is_empty() {
        return Vec::new();
    }
    let mut results = Vec::new();

    if filters.projects {
        for project in projects {
            if matches(
                &query,
                [
                    &project.name,
                    &project.description,
                    &project.assignee,
                    &project.category,
                ],
            ) {
                let mut result =
                    SearchResult::new(SearchKind::Project, &project.id, &project.name, &project.description);
                result.dates = format_range(&project.start_date, &project.end_date);
                result.status = format!("{}%", project.progress);
                results.push(result);
            }
        }
    }

    if filters.tasks {
        for (project_id, tasks) in project_tasks {
            let parent = projects
                .iter()
                .find(|p| &p.id == project_id)
                .map(|p| p.name.clone())
                .unwrap_or_default();
            for task in tasks {
                if matches(
                    &query,
                    [&task.title, &task.description, &task.assignee, &task.category],
                ) {
                    let mut result =
                        SearchResult::new(SearchKind::Task, &task.id, &task.title, &task.description);
                    result.parent = parent.clone();
                    result.dates = format_range(&task.start_date, &task.end_date);
                    result.status = task.status.label().to_string();
                    result.project_id = project_id.clone();
                    results.push(result);
                }
            }
        }
    }

    if filters.big_projects {
        for big in big_projects {
            if matches(
                &query,
                [&big.name, &big.description, &big.assignee, &big.category],
            ) {
                let mut result =
                    SearchResult::new(SearchKind::BigProject, &big.id, &big.name, &big.description);
                result.dates = format_range(&big.start_date, &big.end_date);
                result.status = big.status_label().to_string();
                results.push(result);
            }
        }
    }

    if filters.sub_projects {
        for sub in sub_projects.values().flatten() {
            if matches(&query, [&sub.name, &sub.description, &sub.assignee, ""]) {
                let mut result =
                    SearchResult::new(SearchKind::SubProject, &sub.id, &sub.name, &sub.description);
                result.parent = sub.big_project_name.clone();
                result.dates = format_range(&sub.start_date, &sub.end_date);
                result.big_project_id = sub.big_project_id.clone();
                results.push(result);
            }
            // A sub-project's embedded tasks surface under the same filter.
            for task in &sub.tasks {
                if matches(&query, [&task.title, &task.description, &task.assignee, ""]) {
                    results.push(sub_task_result(task, sub));
                }
            }
        }
    }

    if filters.sub_tasks {
        for sub in sub_projects.values().flatten() {
            for task in sub_tasks.get(&sub.id).into_iter().flatten() {
                if matches(&query, [&task.title, &task.description, &task.assignee, ""]) {
                    results.push(sub_task_result(task, sub));
                }
            }
        }
    }

    results
}

fn sub_task_result(task: &SubTask, sub: &SubProject) -> SearchResult {
    let mut result = SearchResult::new(SearchKind::SubTask, &task.id, &task.title, &task.description);
    result.parent = if sub.big_project_name.is_empty() {
        sub.name.clone()
    } else {
        format!("{} > {}", sub.big_project_name, sub.name)
    };
    result.dates = format_range(&task.start_date, &task.end_date);
    result.status = task.status.label().to_string();
    result.big_project_id = sub.big_project_id.clone();
    result.sub_project_id = sub.id.clone();
    result
}
