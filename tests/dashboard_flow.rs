//! End-to-end flow against the in-memory store: create entities through the
//! dashboard, let the subscription fan-out fill the caches, and check the
//! derived views after each step.

use std::rc::Rc;

use planboard::agg::percent;
use planboard::model::{
    BigProject, Project, SearchFilters, SearchKind, SubProject, SubTask, Task, TaskStatus,
};
use planboard::store::{DocumentStore, MemoryStore};
use planboard::{ChartTarget, Dashboard, Error, ValidationError};

use pretty_assertions::assert_eq;

fn dashboard() -> (MemoryStore, Dashboard) {
    let store = MemoryStore::new();
    let dashboard = Dashboard::new(Rc::new(store.clone()));
    dashboard.start();
    (store, dashboard)
}

fn project(name: &str, start: &str, end: &str) -> Project {
    Project {
        name: name.to_string(),
        start_date: start.to_string(),
        end_date: end.to_string(),
        ..Project::default()
    }
}

fn task(title: &str, start: &str, end: &str) -> Task {
    Task {
        title: title.to_string(),
        start_date: start.to_string(),
        end_date: end.to_string(),
        ..Task::default()
    }
}

fn sub_task(title: &str, start: &str, end: &str) -> SubTask {
    SubTask {
        title: title.to_string(),
        start_date: start.to_string(),
        end_date: end.to_string(),
        ..SubTask::default()
    }
}

#[test]
fn project_and_task_flow_updates_every_view() {
    let (_store, dash) = dashboard();

    let project_id = dash
        .add_project(project("Launch", "2024-04-01", "2024-04-10"))
        .unwrap();
    assert_eq!(dash.projects().len(), 1);
    assert_eq!(dash.status(), "Project added");

    let t1 = dash
        .add_task(&project_id, task("Write copy", "2024-04-01", "2024-04-05"))
        .unwrap();
    dash.add_task(&project_id, task("Ship site", "2024-04-03", "2024-04-09"))
        .unwrap();
    assert_eq!(dash.project_tasks(&project_id).len(), 2);
    assert_eq!(dash.board().not_started.len(), 2);

    // Completing a task rolls progress up and writes it back to the store.
    dash.set_task_status(&t1, TaskStatus::Completed, "2024-04-05")
        .unwrap();
    let cached = dash.projects();
    assert_eq!(cached[0].progress, 50);
    assert_eq!(dash.board().completed.len(), 1);
    assert_eq!(dash.board().not_started.len(), 1);

    // The burnup target defaulted to the first project; the series follows
    // the documented shape: 0% at the start, 50% at the completion, then a
    // synthetic 100% point on the same date.
    let series = dash.burnup();
    let shape: Vec<(String, usize)> = series
        .points
        .iter()
        .map(|p| (p.date.clone(), p.completed))
        .collect();
    assert_eq!(
        shape,
        vec![
            ("2024-04-01".to_string(), 0),
            ("2024-04-05".to_string(), 1),
            ("2024-04-05".to_string(), 2),
        ]
    );

    // Gantt view over the project target: both bars, range snapped to the
    // enclosing month.
    dash.set_gantt_target(Some(ChartTarget::Project(project_id.clone())));
    let gantt = dash.gantt();
    assert_eq!(gantt.tasks.len(), 2);
    assert_eq!(gantt.start_date, "2024-04-01");
    assert_eq!(gantt.end_date, "2024-04-30");
    assert_eq!(gantt.months, vec!["Apr 2024"]);

    // Deleting a task strips it everywhere and re-syncs progress.
    dash.delete_task(&t1).unwrap();
    assert_eq!(dash.project_tasks(&project_id).len(), 1);
    assert_eq!(dash.gantt().tasks.len(), 1);
    assert_eq!(dash.projects()[0].progress, 0);
}

#[test]
fn validation_stops_bad_writes_before_the_store() {
    let (_store, dash) = dashboard();

    let err = dash
        .add_project(project("Backwards", "2024-04-10", "2024-04-01"))
        .unwrap_err();
    assert_eq!(err, Error::Validation(ValidationError::EndBeforeStart));
    assert_eq!(dash.projects().len(), 0);

    let project_id = dash
        .add_project(project("Launch", "2024-04-01", "2024-04-10"))
        .unwrap();

    let mut late = task("Late", "2024-04-01", "2024-04-05");
    late.completed_date = "2024-04-06".to_string();
    late.status = TaskStatus::Completed;
    let err = dash.add_task(&project_id, late).unwrap_err();
    assert_eq!(err, Error::Validation(ValidationError::CompletedAfterEnd));

    let err = dash.add_task(&project_id, task("", "", "")).unwrap_err();
    assert_eq!(
        err,
        Error::Validation(ValidationError::MissingField("title"))
    );
    assert_eq!(dash.project_tasks(&project_id).len(), 0);

    // Completing without a completion date is rejected at the entry point.
    let t1 = dash
        .add_task(&project_id, task("Needs date", "2024-04-01", "2024-04-05"))
        .unwrap();
    let err = dash
        .set_task_status(&t1, TaskStatus::Completed, "")
        .unwrap_err();
    assert_eq!(
        err,
        Error::Validation(ValidationError::MissingField("completion date"))
    );
}

#[test]
fn big_project_fan_out_stamps_parents_and_averages_progress() {
    let (_store, dash) = dashboard();

    let big_id = dash
        .add_big_project(BigProject {
            name: "Rollout".to_string(),
            start_date: "2024-01-01".to_string(),
            end_date: "2024-03-31".to_string(),
            ..BigProject::default()
        })
        .unwrap();

    let sp = |name: &str| SubProject {
        name: name.to_string(),
        start_date: "2024-01-05".to_string(),
        end_date: "2024-02-01".to_string(),
        ..SubProject::default()
    };
    let sp1 = dash.add_sub_project(&big_id, sp("Phase 1")).unwrap();
    let sp2 = dash.add_sub_project(&big_id, sp("Phase 2")).unwrap();

    // Sub-projects arrive stamped with their parent's id and name.
    let subs = dash.sub_projects(&big_id);
    assert_eq!(subs.len(), 2);
    assert!(subs.iter().all(|s| s.big_project_id == big_id));
    assert!(subs.iter().all(|s| s.big_project_name == "Rollout"));

    // Phase 1: its single sub-task completed. Phase 2: two open sub-tasks.
    let st = dash
        .add_sub_task(&big_id, &sp1, sub_task("Only", "2024-01-05", "2024-01-10"))
        .unwrap();
    dash.set_sub_task_status(&big_id, &sp1, &st, TaskStatus::Completed, "2024-01-08")
        .unwrap();
    dash.add_sub_task(&big_id, &sp2, sub_task("A", "2024-01-05", "2024-01-10"))
        .unwrap();
    dash.add_sub_task(&big_id, &sp2, sub_task("B", "2024-01-05", "2024-01-10"))
        .unwrap();

    // Two-level averaging: (100 + 0) / 2, regardless of task counts.
    assert_eq!(dash.big_projects()[0].progress, 50);

    // The board unions regular tasks and sub-tasks with breadcrumbs.
    let board = dash.board();
    assert_eq!(board.completed.len(), 1);
    assert_eq!(board.not_started.len(), 2);
    assert_eq!(board.completed[0].parent, "Rollout > Phase 1");

    // Burnup over a sub-project target uses its own date range.
    dash.set_burnup_target(Some(ChartTarget::SubProject(sp1.clone())));
    let series = dash.burnup();
    assert_eq!(series.start_date, "2024-01-05");
    assert_eq!(series.points.last().map(|p| p.completed), Some(1));

    // Gantt over the sub-project covers its sub-tasks.
    dash.set_gantt_target(Some(ChartTarget::SubProject(sp2.clone())));
    assert_eq!(dash.gantt().tasks.len(), 2);
}

#[test]
fn sub_project_dates_must_fit_the_parent() {
    let (_store, dash) = dashboard();
    let big_id = dash
        .add_big_project(BigProject {
            name: "Rollout".to_string(),
            start_date: "2024-01-01".to_string(),
            end_date: "2024-01-31".to_string(),
            ..BigProject::default()
        })
        .unwrap();

    let err = dash
        .add_sub_project(
            &big_id,
            SubProject {
                name: "Too early".to_string(),
                start_date: "2023-12-31".to_string(),
                end_date: "2024-01-10".to_string(),
                ..SubProject::default()
            },
        )
        .unwrap_err();
    assert_eq!(err, Error::Validation(ValidationError::OutsideParentRange));
    assert_eq!(dash.sub_projects(&big_id).len(), 0);
}

#[test]
fn search_spans_every_entity_family_and_ignores_empty_queries() {
    let (_store, dash) = dashboard();
    let project_id = dash
        .add_project(project("Migration prep", "2024-04-01", "2024-04-10"))
        .unwrap();
    dash.add_task(&project_id, task("Migrate DNS", "2024-04-01", "2024-04-02"))
        .unwrap();
    let big_id = dash
        .add_big_project(BigProject {
            name: "Migration".to_string(),
            start_date: "2024-01-01".to_string(),
            end_date: "2024-12-31".to_string(),
            ..BigProject::default()
        })
        .unwrap();
    let sp = dash
        .add_sub_project(
            &big_id,
            SubProject {
                name: "Migrate storage".to_string(),
                start_date: "2024-02-01".to_string(),
                end_date: "2024-03-01".to_string(),
                ..SubProject::default()
            },
        )
        .unwrap();
    dash.add_sub_task(&big_id, &sp, sub_task("Migrate blobs", "2024-02-01", "2024-02-10"))
        .unwrap();

    assert_eq!(dash.search("", SearchFilters::all()), vec![]);

    let results = dash.search("migra", SearchFilters::all());
    let kinds: Vec<SearchKind> = results.iter().map(|r| r.kind).collect();
    assert_eq!(
        kinds,
        vec![
            SearchKind::Project,
            SearchKind::Task,
            SearchKind::BigProject,
            SearchKind::SubProject,
            SearchKind::SubTask,
        ]
    );
    // Each result carries locator ids for navigation.
    let sub_task_hit = &results[4];
    assert_eq!(sub_task_hit.big_project_id, big_id);
    assert_eq!(sub_task_hit.sub_project_id, sp);
}

#[test]
fn teardown_cancels_the_whole_subscription_tree() {
    let (store, dash) = dashboard();
    let project_id = dash
        .add_project(project("Launch", "2024-04-01", "2024-04-10"))
        .unwrap();
    dash.add_task(&project_id, task("One", "2024-04-01", "2024-04-02"))
        .unwrap();
    assert_eq!(dash.project_tasks(&project_id).len(), 1);

    dash.stop();

    // Writes that land after teardown no longer reach the caches.
    store
        .add(
            &planboard::store::CollectionRef::tasks(),
            serde_json::json!({"projectId": project_id, "title": "Late"}),
        )
        .unwrap();
    assert_eq!(dash.project_tasks(&project_id).len(), 1);
}

#[test]
fn deleting_a_project_stops_following_its_tasks() {
    let (store, dash) = dashboard();
    let project_id = dash
        .add_project(project("Launch", "2024-04-01", "2024-04-10"))
        .unwrap();
    dash.add_task(&project_id, task("One", "2024-04-01", "2024-04-02"))
        .unwrap();

    dash.delete_project(&project_id).unwrap();
    assert_eq!(dash.projects().len(), 0);
    assert!(dash.project_tasks(&project_id).is_empty());

    // A straggler write for the deleted project is tolerated and ignored.
    store
        .add(
            &planboard::store::CollectionRef::tasks(),
            serde_json::json!({"projectId": project_id, "title": "Straggler"}),
        )
        .unwrap();
    assert!(dash.project_tasks(&project_id).is_empty());
}

#[test]
fn progress_helper_matches_the_rollup_in_the_store() {
    // percent() is the single rounding rule used everywhere.
    assert_eq!(percent(0, 0), 0);
    assert_eq!(percent(1, 3), 33);
    assert_eq!(percent(2, 3), 67);
}
