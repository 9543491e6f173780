use std::cell::RefCell;
use std::collections::{BTreeMap, BTreeSet};
use std::rc::{Rc, Weak};

use serde::Serialize;
use serde_json::{json, Value};
use tracing::{debug, warn};

use crate::agg::{self, BoardView, BurnupSeries};
use crate::chart::{gantt_view, GanttTask, GanttView};
use crate::error::{Error, StoreError, ValidationError};
use crate::model::{
    BigProject, Project, SearchFilters, SearchResult, SubProject, SubTask, Task, TaskStatus,
    WorkItem,
};
use crate::store::{CollectionRef, Document, DocumentStore, Subscription};
use crate::validate;

/// What the Gantt and burnup charts are pointed at.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ChartTarget {
    Project(String),
    SubProject(String),
}

#[derive(Default)]
struct DashState {
    projects: Vec<Project>,
    /// project id -> its live task list.
    project_tasks: BTreeMap<String, Vec<Task>>,
    big_projects: Vec<BigProject>,
    /// big project id -> its sub-projects, stamped with the parent id/name.
    sub_projects: BTreeMap<String, Vec<SubProject>>,
    /// sub-project id -> its live sub-task list.
    sub_tasks: BTreeMap<String, Vec<SubTask>>,

    board: BoardView,
    gantt: GanttView,
    burnup: BurnupSeries,
    gantt_target: Option<ChartTarget>,
    burnup_target: Option<ChartTarget>,

    status: String,
}

/// Every live subscription the controller owns, keyed so a replacement can
/// cancel its predecessor and teardown can cancel everything.
#[derive(Default)]
struct SubTable {
    projects: Option<Subscription>,
    big_projects: Option<Subscription>,
    tasks: BTreeMap<String, Subscription>,
    sub_projects: BTreeMap<String, Subscription>,
    sub_tasks: BTreeMap<String, Subscription>,
}

struct DashboardCore {
    weak: Weak<DashboardCore>,
    store: Rc<dyn DocumentStore>,
    state: RefCell<DashState>,
    subs: RefCell<SubTable>,
}

/// The client core: sole writer of the entity caches, driven by store
/// snapshots on one side and validated mutation calls on the other.
pub struct Dashboard {
    core: Rc<DashboardCore>,
}

impl Dashboard {
    pub fn new(store: Rc<dyn DocumentStore>) -> Self {
        let core = Rc::new_cyclic(|weak| DashboardCore {
            weak: weak.clone(),
            store,
            state: RefCell::new(DashState::default()),
            subs: RefCell::new(SubTable::default()),
        });
        Self { core }
    }

    /// Open the two root subscriptions; the child fan-out follows from their
    /// snapshots.
    pub fn start(&self) {
        let weak = self.core.weak.clone();
        let sub = self.core.store.subscribe(
            CollectionRef::projects(),
            Rc::new(move |docs: &[Document]| {
                if let Some(core) = weak.upgrade() {
                    core.on_projects_snapshot(docs);
                }
            }),
        );
        self.core.subs.borrow_mut().projects = Some(sub);

        let weak = self.core.weak.clone();
        let sub = self.core.store.subscribe(
            CollectionRef::big_projects(),
            Rc::new(move |docs: &[Document]| {
                if let Some(core) = weak.upgrade() {
                    core.on_big_projects_snapshot(docs);
                }
            }),
        );
        self.core.subs.borrow_mut().big_projects = Some(sub);
    }

    /// Cancel every tracked subscription. Dropping the dashboard does the
    /// same.
    pub fn stop(&self) {
        let mut subs = self.core.subs.borrow_mut();
        let cancelled = usize::from(subs.projects.is_some())
            + usize::from(subs.big_projects.is_some())
            + subs.tasks.len()
            + subs.sub_projects.len()
            + subs.sub_tasks.len();
        debug!(cancelled, "controller teardown");
        *subs = SubTable::default();
    }

    // --- Cache reads ---

    pub fn projects(&self) -> Vec<Project> {
        self.core.state.borrow().projects.clone()
    }

    pub fn big_projects(&self) -> Vec<BigProject> {
        self.core.state.borrow().big_projects.clone()
    }

    pub fn project_tasks(&self, project_id: &str) -> Vec<Task> {
        self.core
            .state
            .borrow()
            .project_tasks
            .get(project_id)
            .cloned()
            .unwrap_or_default()
    }

    pub fn sub_projects(&self, big_project_id: &str) -> Vec<SubProject> {
        self.core
            .state
            .borrow()
            .sub_projects
            .get(big_project_id)
            .cloned()
            .unwrap_or_default()
    }

    pub fn all_sub_projects(&self) -> Vec<SubProject> {
        self.core
            .state
            .borrow()
            .sub_projects
            .values()
            .flatten()
            .cloned()
            .collect()
    }

    pub fn sub_tasks(&self, sub_project_id: &str) -> Vec<SubTask> {
        self.core
            .state
            .borrow()
            .sub_tasks
            .get(sub_project_id)
            .cloned()
            .unwrap_or_default()
    }

    /// Last human-readable operation outcome.
    pub fn status(&self) -> String {
        self.core.state.borrow().status.clone()
    }

    // --- Derived views ---

    pub fn board(&self) -> BoardView {
        self.core.state.borrow().board.clone()
    }

    pub fn gantt(&self) -> GanttView {
        self.core.state.borrow().gantt.clone()
    }

    pub fn burnup(&self) -> BurnupSeries {
        self.core.state.borrow().burnup.clone()
    }

    pub fn search(&self, query: &str, filters: SearchFilters) -> Vec<SearchResult> {
        let state = self.core.state.borrow();
        agg::search(
            query,
            filters,
            &state.projects,
            &state.project_tasks,
            &state.big_projects,
            &state.sub_projects,
            &state.sub_tasks,
        )
    }

    pub fn set_gantt_target(&self, target: Option<ChartTarget>) {
        self.core.state.borrow_mut().gantt_target = target;
        self.core.recompute();
    }

    pub fn set_burnup_target(&self, target: Option<ChartTarget>) {
        self.core.state.borrow_mut().burnup_target = target;
        self.core.recompute();
    }

    // --- Project operations ---

    pub fn add_project(&self, project: Project) -> Result<String, Error> {
        validate::require("name", &project.name)?;
        validate::require("start date", &project.start_date)?;
        validate::require("end date", &project.end_date)?;
        validate::check_range(&project.start_date, &project.end_date)?;
        let mut project = project;
        apply_time_defaults(&mut project.start_time, &mut project.end_time);
        project.progress = 0;
        let result = self
            .core
            .store
            .add(&CollectionRef::projects(), to_doc(&project));
        self.core
            .finish(result, "Project added", "Failed to add project")
    }

    pub fn update_project(&self, project: &Project) -> Result<(), Error> {
        validate::require("name", &project.name)?;
        validate::require("start date", &project.start_date)?;
        validate::require("end date", &project.end_date)?;
        validate::check_range(&project.start_date, &project.end_date)?;
        let result =
            self.core
                .store
                .update(&CollectionRef::projects(), &project.id, to_doc(project));
        self.core
            .finish(result, "Project updated", "Failed to update project")
    }

    pub fn delete_project(&self, id: &str) -> Result<(), Error> {
        let result = self.core.store.delete(&CollectionRef::projects(), id);
        if result.is_ok() {
            let old = self.core.subs.borrow_mut().tasks.remove(id);
            drop(old);
            {
                let mut state = self.core.state.borrow_mut();
                state.projects.retain(|p| p.id != id);
                state.project_tasks.remove(id);
            }
            self.core.recompute();
        }
        self.core
            .finish(result, "Project deleted", "Failed to delete project")
    }

    // --- Task operations ---

    pub fn add_task(&self, project_id: &str, task: Task) -> Result<String, Error> {
        validate::require("title", &task.title)?;
        validate::require("start date", &task.start_date)?;
        validate::require("end date", &task.end_date)?;
        validate::check_range(&task.start_date, &task.end_date)?;
        validate::check_completed(&task.completed_date, &task.end_date)?;
        let mut task = task;
        task.project_id = project_id.to_string();
        apply_time_defaults(&mut task.start_time, &mut task.end_time);
        let result = self.core.store.add(&CollectionRef::tasks(), to_doc(&task));
        self.core.finish(result, "Task added", "Failed to add task")
    }

    pub fn update_task(&self, task: &Task) -> Result<(), Error> {
        validate::require("title", &task.title)?;
        validate::check_range(&task.start_date, &task.end_date)?;
        validate::check_completed(&task.completed_date, &task.end_date)?;
        let result = self
            .core
            .store
            .update(&CollectionRef::tasks(), &task.id, to_doc(task));
        if result.is_ok() {
            self.core.sync_project_progress(&task.project_id);
        }
        self.core
            .finish(result, "Task updated", "Failed to update task")
    }

    /// Change a task's status. Completing requires a completion date, which
    /// must not fall after the task's end date; any other status clears the
    /// stored completion date.
    pub fn set_task_status(
        &self,
        task_id: &str,
        status: TaskStatus,
        completed_date: &str,
    ) -> Result<(), Error> {
        let (project_id, task) = self
            .core
            .find_task(task_id)
            .ok_or_else(|| StoreError::NotFound(format!("tasks/{task_id}")))?;
        if status == TaskStatus::Completed {
            if completed_date.is_empty() {
                return Err(ValidationError::MissingField("completion date").into());
            }
            validate::check_completed(completed_date, &task.end_date)?;
        }
        let completed_value = if status == TaskStatus::Completed {
            completed_date
        } else {
            ""
        };
        let patch = json!({"status": status, "completedDate": completed_value});
        let result = self.core.store.update(&CollectionRef::tasks(), task_id, patch);
        if result.is_ok() {
            self.core.sync_project_progress(&project_id);
        }
        self.core
            .finish(result, "Task updated", "Failed to update task")
    }

    /// Set or clear a task's completion date. A non-empty date forces the
    /// status to completed; clearing the date of a completed task is
    /// rejected.
    pub fn set_completed_date(&self, task_id: &str, date: &str) -> Result<(), Error> {
        if !date.is_empty() {
            return self.set_task_status(task_id, TaskStatus::Completed, date);
        }
        let (_, task) = self
            .core
            .find_task(task_id)
            .ok_or_else(|| StoreError::NotFound(format!("tasks/{task_id}")))?;
        if task.status == TaskStatus::Completed {
            return Err(ValidationError::MissingField("completion date").into());
        }
        let result = self.core.store.update(
            &CollectionRef::tasks(),
            task_id,
            json!({"completedDate": ""}),
        );
        self.core
            .finish(result, "Task updated", "Failed to update task")
    }

    pub fn delete_task(&self, task_id: &str) -> Result<(), Error> {
        let (project_id, _) = self
            .core
            .find_task(task_id)
            .ok_or_else(|| StoreError::NotFound(format!("tasks/{task_id}")))?;
        let result = self.core.store.delete(&CollectionRef::tasks(), task_id);
        if result.is_ok() {
            {
                let mut state = self.core.state.borrow_mut();
                if let Some(tasks) = state.project_tasks.get_mut(&project_id) {
                    tasks.retain(|t| t.id != task_id);
                }
                state.gantt.tasks.retain(|t| t.id != task_id);
            }
            self.core.sync_project_progress(&project_id);
            self.core.recompute();
        }
        self.core
            .finish(result, "Task deleted", "Failed to delete task")
    }

    // --- Big project operations ---

    pub fn add_big_project(&self, big: BigProject) -> Result<String, Error> {
        validate::require("name", &big.name)?;
        validate::require("start date", &big.start_date)?;
        validate::require("end date", &big.end_date)?;
        validate::check_range(&big.start_date, &big.end_date)?;
        let mut big = big;
        big.progress = 0;
        if big.status.is_empty() {
            big.status = "planning".to_string();
        }
        let result = self
            .core
            .store
            .add(&CollectionRef::big_projects(), to_doc(&big));
        self.core
            .finish(result, "Big project added", "Failed to add big project")
    }

    pub fn update_big_project(&self, big: &BigProject) -> Result<(), Error> {
        validate::require("name", &big.name)?;
        let result =
            self.core
                .store
                .update(&CollectionRef::big_projects(), &big.id, to_doc(big));
        self.core
            .finish(result, "Big project updated", "Failed to update big project")
    }

    pub fn delete_big_project(&self, id: &str) -> Result<(), Error> {
        let result = self.core.store.delete(&CollectionRef::big_projects(), id);
        if result.is_ok() {
            let old = self.core.subs.borrow_mut().sub_projects.remove(id);
            drop(old);
            let orphaned: Vec<String> = {
                let mut state = self.core.state.borrow_mut();
                state.big_projects.retain(|bp| bp.id != id);
                state
                    .sub_projects
                    .remove(id)
                    .into_iter()
                    .flatten()
                    .map(|sp| sp.id)
                    .collect()
            };
            for sub_id in orphaned {
                let old = self.core.subs.borrow_mut().sub_tasks.remove(&sub_id);
                drop(old);
                self.core.state.borrow_mut().sub_tasks.remove(&sub_id);
            }
            self.core.recompute();
        }
        self.core
            .finish(result, "Big project deleted", "Failed to delete big project")
    }

    // --- Sub-project operations ---

    pub fn add_sub_project(
        &self,
        big_project_id: &str,
        sub: SubProject,
    ) -> Result<String, Error> {
        validate::require("start date", &sub.start_date)?;
        validate::require("end date", &sub.end_date)?;
        self.core.check_parent_range(big_project_id, &sub)?;
        validate::check_range(&sub.start_date, &sub.end_date)?;
        let result = self
            .core
            .store
            .add(&CollectionRef::sub_projects(big_project_id), to_doc(&sub));
        self.core
            .finish(result, "Sub-project added", "Failed to add sub-project")
    }

    pub fn update_sub_project(
        &self,
        big_project_id: &str,
        sub: &SubProject,
    ) -> Result<(), Error> {
        validate::require("start date", &sub.start_date)?;
        validate::require("end date", &sub.end_date)?;
        self.core.check_parent_range(big_project_id, sub)?;
        validate::check_range(&sub.start_date, &sub.end_date)?;
        let result = self.core.store.update(
            &CollectionRef::sub_projects(big_project_id),
            &sub.id,
            to_doc(sub),
        );
        self.core
            .finish(result, "Sub-project updated", "Failed to update sub-project")
    }

    pub fn delete_sub_project(
        &self,
        big_project_id: &str,
        sub_project_id: &str,
    ) -> Result<(), Error> {
        let result = self
            .core
            .store
            .delete(&CollectionRef::sub_projects(big_project_id), sub_project_id);
        if result.is_ok() {
            let old = self.core.subs.borrow_mut().sub_tasks.remove(sub_project_id);
            drop(old);
            {
                let mut state = self.core.state.borrow_mut();
                if let Some(list) = state.sub_projects.get_mut(big_project_id) {
                    list.retain(|sp| sp.id != sub_project_id);
                }
                state.sub_tasks.remove(sub_project_id);
            }
            self.core.recompute();
        }
        self.core
            .finish(result, "Sub-project deleted", "Failed to delete sub-project")
    }

    // --- Sub-task operations ---

    pub fn add_sub_task(
        &self,
        big_project_id: &str,
        sub_project_id: &str,
        task: SubTask,
    ) -> Result<String, Error> {
        validate::require("title", &task.title)?;
        validate::require("start date", &task.start_date)?;
        validate::require("end date", &task.end_date)?;
        validate::check_range(&task.start_date, &task.end_date)?;
        validate::check_completed(&task.completed_date, &task.end_date)?;
        let mut task = task;
        task.sub_project_id = sub_project_id.to_string();
        let result = self.core.store.add(
            &CollectionRef::sub_tasks(big_project_id, sub_project_id),
            to_doc(&task),
        );
        self.core
            .finish(result, "Sub-task added", "Failed to add sub-task")
    }

    pub fn update_sub_task(
        &self,
        big_project_id: &str,
        sub_project_id: &str,
        task: &SubTask,
    ) -> Result<(), Error> {
        validate::require("title", &task.title)?;
        validate::check_range(&task.start_date, &task.end_date)?;
        validate::check_completed(&task.completed_date, &task.end_date)?;
        let result = self.core.store.update(
            &CollectionRef::sub_tasks(big_project_id, sub_project_id),
            &task.id,
            to_doc(task),
        );
        self.core
            .finish(result, "Sub-task updated", "Failed to update sub-task")
    }

    /// Change a sub-task's status under the same completion-date rules as
    /// [`Dashboard::set_task_status`].
    pub fn set_sub_task_status(
        &self,
        big_project_id: &str,
        sub_project_id: &str,
        task_id: &str,
        status: TaskStatus,
        completed_date: &str,
    ) -> Result<(), Error> {
        let task = {
            let state = self.core.state.borrow();
            state
                .sub_tasks
                .get(sub_project_id)
                .and_then(|list| list.iter().find(|t| t.id == task_id).cloned())
        }
        .ok_or_else(|| StoreError::NotFound(format!("subTasks/{task_id}")))?;
        if status == TaskStatus::Completed {
            if completed_date.is_empty() {
                return Err(ValidationError::MissingField("completion date").into());
            }
            validate::check_completed(completed_date, &task.end_date)?;
        }
        let completed_value = if status == TaskStatus::Completed {
            completed_date
        } else {
            ""
        };
        let result = self.core.store.update(
            &CollectionRef::sub_tasks(big_project_id, sub_project_id),
            task_id,
            json!({"status": status, "completedDate": completed_value}),
        );
        self.core
            .finish(result, "Sub-task updated", "Failed to update sub-task")
    }

    pub fn delete_sub_task(
        &self,
        big_project_id: &str,
        sub_project_id: &str,
        task_id: &str,
    ) -> Result<(), Error> {
        let result = self.core.store.delete(
            &CollectionRef::sub_tasks(big_project_id, sub_project_id),
            task_id,
        );
        if result.is_ok() {
            {
                let mut state = self.core.state.borrow_mut();
                if let Some(list) = state.sub_tasks.get_mut(sub_project_id) {
                    list.retain(|t| t.id != task_id);
                }
                state.gantt.tasks.retain(|t| t.id != task_id);
            }
            self.core.recompute();
        }
        self.core
            .finish(result, "Sub-task deleted", "Failed to delete sub-task")
    }
}

impl DashboardCore {
    fn set_status(&self, message: &str) {
        self.state.borrow_mut().status = message.to_string();
    }

    /// Record the outcome of a store operation as the status message and
    /// convert the error, per the surface-with-backend-text policy.
    fn finish<T>(
        &self,
        result: Result<T, StoreError>,
        ok: &str,
        err_context: &str,
    ) -> Result<T, Error> {
        match result {
            Ok(value) => {
                self.set_status(ok);
                Ok(value)
            }
            Err(err) => {
                self.set_status(&format!("{err_context}: {err}"));
                Err(err.into())
            }
        }
    }

    fn find_task(&self, task_id: &str) -> Option<(String, Task)> {
        let state = self.state.borrow();
        for (project_id, tasks) in &state.project_tasks {
            if let Some(task) = tasks.iter().find(|t| t.id == task_id) {
                return Some((project_id.clone(), task.clone()));
            }
        }
        None
    }

    fn check_parent_range(
        &self,
        big_project_id: &str,
        sub: &SubProject,
    ) -> Result<(), ValidationError> {
        let state = self.state.borrow();
        if let Some(parent) = state.big_projects.iter().find(|bp| bp.id == big_project_id) {
            validate::check_within_parent(
                &sub.start_date,
                &sub.end_date,
                &parent.start_date,
                &parent.end_date,
            )?;
        }
        Ok(())
    }

    /// Recompute the project's rolled-up progress and write it back to the
    /// store; the cache itself refreshes through the subscription.
    fn sync_project_progress(&self, project_id: &str) {
        let progress = {
            let state = self.state.borrow();
            agg::project_progress(
                state
                    .project_tasks
                    .get(project_id)
                    .map(Vec::as_slice)
                    .unwrap_or(&[]),
            )
        };
        if let Err(err) = self.store.update(
            &CollectionRef::projects(),
            project_id,
            json!({"progress": progress}),
        ) {
            warn!(project = project_id, %err, "progress write-back failed");
            self.set_status(&format!("Failed to update project progress: {err}"));
        }
    }

    // --- Snapshot handlers ---

    fn on_projects_snapshot(&self, docs: &[Document]) {
        let projects: Vec<Project> = docs.iter().filter_map(Document::decode).collect();
        debug!(count = projects.len(), "projects snapshot");
        let live: BTreeSet<String> = projects.iter().map(|p| p.id.clone()).collect();
        {
            let mut state = self.state.borrow_mut();
            if state.burnup_target.is_none() {
                state.burnup_target = projects.first().map(|p| ChartTarget::Project(p.id.clone()));
            }
            state.projects = projects;
        }

        // Cancel the task subscriptions of projects gone from the snapshot.
        let stale: Vec<String> = self
            .subs
            .borrow()
            .tasks
            .keys()
            .filter(|id| !live.contains(*id))
            .cloned()
            .collect();
        for id in &stale {
            let old = self.subs.borrow_mut().tasks.remove(id);
            drop(old);
            self.state.borrow_mut().project_tasks.remove(id);
        }

        // Open a task subscription for any project not yet subscribed.
        let fresh: Vec<String> = live
            .iter()
            .filter(|id| !self.subs.borrow().tasks.contains_key(*id))
            .cloned()
            .collect();
        for id in fresh {
            self.subscribe_tasks(&id);
        }
        self.recompute();
    }

    fn subscribe_tasks(&self, project_id: &str) {
        // Replacing a same-key subscription cancels the old one first.
        let old = self.subs.borrow_mut().tasks.remove(project_id);
        drop(old);

        let weak = self.weak.clone();
        let pid = project_id.to_string();
        let sub = self.store.subscribe(
            CollectionRef::tasks_for(project_id),
            Rc::new(move |docs: &[Document]| {
                if let Some(core) = weak.upgrade() {
                    core.on_tasks_snapshot(&pid, docs);
                }
            }),
        );
        self.subs
            .borrow_mut()
            .tasks
            .insert(project_id.to_string(), sub);
    }

    fn on_tasks_snapshot(&self, project_id: &str, docs: &[Document]) {
        let tasks: Vec<Task> = docs
            .iter()
            .filter_map(Document::decode)
            .filter(|t: &Task| t.project_id == project_id)
            .collect();
        debug!(project = project_id, count = tasks.len(), "tasks snapshot");
        self.state
            .borrow_mut()
            .project_tasks
            .insert(project_id.to_string(), tasks);
        self.recompute();
    }

    fn on_big_projects_snapshot(&self, docs: &[Document]) {
        let big_projects: Vec<BigProject> = docs.iter().filter_map(Document::decode).collect();
        debug!(count = big_projects.len(), "big projects snapshot");
        let live: BTreeSet<String> = big_projects.iter().map(|bp| bp.id.clone()).collect();
        self.state.borrow_mut().big_projects = big_projects.clone();

        // Tear down the whole fan-out of big projects that vanished.
        let stale: Vec<String> = self
            .subs
            .borrow()
            .sub_projects
            .keys()
            .filter(|id| !live.contains(*id))
            .cloned()
            .collect();
        for big_id in &stale {
            let old = self.subs.borrow_mut().sub_projects.remove(big_id);
            drop(old);
            let orphaned: Vec<String> = self
                .state
                .borrow_mut()
                .sub_projects
                .remove(big_id)
                .into_iter()
                .flatten()
                .map(|sp| sp.id)
                .collect();
            for sub_id in orphaned {
                let old = self.subs.borrow_mut().sub_tasks.remove(&sub_id);
                drop(old);
                self.state.borrow_mut().sub_tasks.remove(&sub_id);
            }
        }

        for bp in &big_projects {
            self.subscribe_sub_projects(&bp.id, &bp.name);
        }
        self.recompute();
    }

    fn subscribe_sub_projects(&self, big_project_id: &str, big_project_name: &str) {
        let old = self.subs.borrow_mut().sub_projects.remove(big_project_id);
        drop(old);

        let weak = self.weak.clone();
        let big_id = big_project_id.to_string();
        let big_name = big_project_name.to_string();
        let sub = self.store.subscribe(
            CollectionRef::sub_projects(big_project_id),
            Rc::new(move |docs: &[Document]| {
                if let Some(core) = weak.upgrade() {
                    core.on_sub_projects_snapshot(&big_id, &big_name, docs);
                }
            }),
        );
        self.subs
            .borrow_mut()
            .sub_projects
            .insert(big_project_id.to_string(), sub);
    }

    fn on_sub_projects_snapshot(&self, big_id: &str, big_name: &str, docs: &[Document]) {
        let mut sub_projects: Vec<SubProject> =
            docs.iter().filter_map(Document::decode).collect();
        // The subcollection documents carry no parent reference; stamp it.
        for sp in &mut sub_projects {
            sp.big_project_id = big_id.to_string();
            sp.big_project_name = big_name.to_string();
        }
        debug!(big_project = big_id, count = sub_projects.len(), "sub-projects snapshot");
        let live: BTreeSet<String> = sub_projects.iter().map(|sp| sp.id.clone()).collect();

        // Cancel sub-task subscriptions of sub-projects that vanished.
        let stale: Vec<String> = {
            let state = self.state.borrow();
            state
                .sub_projects
                .get(big_id)
                .into_iter()
                .flatten()
                .map(|sp| sp.id.clone())
                .filter(|id| !live.contains(id))
                .collect()
        };
        for sub_id in stale {
            let old = self.subs.borrow_mut().sub_tasks.remove(&sub_id);
            drop(old);
            self.state.borrow_mut().sub_tasks.remove(&sub_id);
        }

        self.state
            .borrow_mut()
            .sub_projects
            .insert(big_id.to_string(), sub_projects.clone());
        for sp in &sub_projects {
            self.subscribe_sub_tasks(big_id, &sp.id);
        }
        self.recompute();
    }

    fn subscribe_sub_tasks(&self, big_project_id: &str, sub_project_id: &str) {
        let old = self.subs.borrow_mut().sub_tasks.remove(sub_project_id);
        drop(old);

        let weak = self.weak.clone();
        let sub_id = sub_project_id.to_string();
        let sub = self.store.subscribe(
            CollectionRef::sub_tasks(big_project_id, sub_project_id),
            Rc::new(move |docs: &[Document]| {
                if let Some(core) = weak.upgrade() {
                    core.on_sub_tasks_snapshot(&sub_id, docs);
                }
            }),
        );
        self.subs
            .borrow_mut()
            .sub_tasks
            .insert(sub_project_id.to_string(), sub);
    }

    fn on_sub_tasks_snapshot(&self, sub_project_id: &str, docs: &[Document]) {
        let mut tasks: Vec<SubTask> = docs.iter().filter_map(Document::decode).collect();
        for task in &mut tasks {
            task.sub_project_id = sub_project_id.to_string();
        }
        debug!(sub_project = sub_project_id, count = tasks.len(), "sub-tasks snapshot");
        self.state
            .borrow_mut()
            .sub_tasks
            .insert(sub_project_id.to_string(), tasks);
        self.recompute();
    }

    /// Rebuild every derived view from the caches. Wholesale on purpose: a
    /// reader sees either the old complete result or the new one.
    fn recompute(&self) {
        let mut state = self.state.borrow_mut();
        let state = &mut *state;
        for bp in &mut state.big_projects {
            let sub_projects = state
                .sub_projects
                .get(&bp.id)
                .map(Vec::as_slice)
                .unwrap_or(&[]);
            bp.progress = agg::big_project_progress(sub_projects, &state.sub_tasks);
        }
        state.board = agg::board_partition(
            &state.projects,
            &state.project_tasks,
            &state.sub_projects,
            &state.sub_tasks,
        );
        state.gantt = gantt_view(gantt_candidates(state));
        state.burnup = burnup_for_target(state);
    }
}

fn gantt_candidates(state: &DashState) -> Vec<GanttTask> {
    let mut out = Vec::new();
    match &state.gantt_target {
        None => {}
        Some(ChartTarget::Project(id)) => {
            for task in state.project_tasks.get(id).into_iter().flatten() {
                out.extend(GanttTask::from_fields(
                    &task.id,
                    &task.title,
                    &task.start_date,
                    &task.end_date,
                    &task.assignee,
                    task.status,
                ));
            }
        }
        Some(ChartTarget::SubProject(id)) => {
            if let Some(sub) = find_sub_project(state, id) {
                for task in &sub.tasks {
                    out.extend(GanttTask::from_fields(
                        &task.id,
                        &task.title,
                        &task.start_date,
                        &task.end_date,
                        &task.assignee,
                        task.status,
                    ));
                }
            }
            for task in state.sub_tasks.get(id).into_iter().flatten() {
                out.extend(GanttTask::from_fields(
                    &task.id,
                    &task.title,
                    &task.start_date,
                    &task.end_date,
                    &task.assignee,
                    task.status,
                ));
            }
        }
    }
    out
}

fn burnup_for_target(state: &DashState) -> BurnupSeries {
    match &state.burnup_target {
        None => BurnupSeries::default(),
        Some(ChartTarget::Project(id)) => {
            let Some(project) = state.projects.iter().find(|p| &p.id == id) else {
                warn!(project = %id, "burnup target missing from cache");
                return BurnupSeries::default();
            };
            let items: Vec<WorkItem> = state
                .project_tasks
                .get(id)
                .into_iter()
                .flatten()
                .cloned()
                .map(WorkItem::Task)
                .collect();
            agg::burnup_series(&project.start_date, &project.end_date, &items)
        }
        Some(ChartTarget::SubProject(id)) => {
            let Some(sub) = find_sub_project(state, id) else {
                warn!(sub_project = %id, "burnup target missing from cache");
                return BurnupSeries::default();
            };
            let mut items: Vec<WorkItem> =
                sub.tasks.iter().cloned().map(WorkItem::SubTask).collect();
            items.extend(
                state
                    .sub_tasks
                    .get(id)
                    .into_iter()
                    .flatten()
                    .cloned()
                    .map(WorkItem::SubTask),
            );
            agg::burnup_series(&sub.start_date, &sub.end_date, &items)
        }
    }
}

fn find_sub_project<'a>(state: &'a DashState, sub_project_id: &str) -> Option<&'a SubProject> {
    state
        .sub_projects
        .values()
        .flatten()
        .find(|sp| sp.id == sub_project_id)
}

/// Serialize a record for the store, dropping the local `id` field — the
/// store owns id assignment and write-back.
fn to_doc<T: Serialize>(record: &T) -> Value {
    let mut value = serde_json::to_value(record).unwrap_or(Value::Null);
    if let Value::Object(map) = &mut value {
        map.remove("id");
    }
    value
}

fn apply_time_defaults(start_time: &mut String, end_time: &mut String) {
    if start_time.is_empty() {
        *start_time = "09:00".to_string();
    }
    if end_time.is_empty() {
        *end_time = "17:30".to_string();
    }
}
