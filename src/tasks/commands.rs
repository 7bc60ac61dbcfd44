//! Entry points for the presentation layer.
//!
//! Each command mutates or reads the shared store, reports the result to the
//! user through the [`Notifier`], and hands back plain data or an error string.

use super::query::{filter, TaskFilter};
use super::stats::{stats, TaskStats};
use super::types::{NewTask, Task, TaskError, TaskUpdate};
use super::SharedStore;
use crate::shared::errors::Outcome;
use crate::shared::notify::{Notifier, Severity, DEFAULT_TOAST_DURATION};
use std::sync::Arc;
use std::time::Duration;

/// State handed to every command.
#[derive(Clone)]
pub struct TaskState {
    store: Arc<SharedStore>,
    notifier: Arc<dyn Notifier>,
    toast_duration: Duration,
}

impl TaskState {
    pub fn new(store: Arc<SharedStore>, notifier: Arc<dyn Notifier>) -> Self {
        Self {
            store,
            notifier,
            toast_duration: DEFAULT_TOAST_DURATION,
        }
    }

    pub fn toast_duration(mut self, duration: Duration) -> Self {
        self.toast_duration = duration;
        self
    }

    pub fn store(&self) -> &Arc<SharedStore> {
        &self.store
    }

    fn toast(&self, message: &str, severity: Severity) {
        self.notifier.notify(message, severity, self.toast_duration);
    }

    /// Success toast, plus a warning when the change did not reach storage.
    fn report<T>(&self, outcome: Outcome<T>, message: &str) -> T {
        self.toast(message, Severity::Success);
        if let Some(e) = &outcome.storage_error {
            self.toast(&format!("Changes could not be saved: {}", e), Severity::Warning);
        }
        outcome.into_value()
    }

    /// Validation and filter problems are shown to the user; a missing task is not.
    fn reject(&self, error: TaskError) -> String {
        match &error {
            TaskError::Validation(message) => self.toast(message, Severity::Error),
            TaskError::InvalidFilter { .. } => self.toast(&error.to_string(), Severity::Error),
            TaskError::NotFound(id) => {
                tracing::debug!(target: "tasks", id = %id, "Command on missing task")
            }
        }
        error.to_string()
    }
}

pub fn task_create(state: &TaskState, input: NewTask) -> Result<Task, String> {
    let created = state.store.write().create(input);
    match created {
        Ok(outcome) => Ok(state.report(outcome, "Task added successfully!")),
        Err(e) => Err(state.reject(e)),
    }
}

pub fn task_update(state: &TaskState, id: &str, input: TaskUpdate) -> Result<Task, String> {
    let updated = state.store.write().update(id, input);
    match updated {
        Ok(outcome) => Ok(state.report(outcome, "Task updated successfully!")),
        Err(e) => Err(state.reject(e)),
    }
}

/// Deletes without asking; confirmation is the caller's job.
pub fn task_delete(state: &TaskState, id: &str) -> Result<Task, String> {
    let deleted = state.store.write().delete(id);
    match deleted {
        Ok(outcome) => Ok(state.report(outcome, "Task deleted successfully!")),
        Err(e) => Err(state.reject(e)),
    }
}

pub fn task_toggle_status(state: &TaskState, id: &str) -> Result<Task, String> {
    let toggled = state.store.write().toggle_status(id);
    match toggled {
        Ok(outcome) => {
            let message = if outcome.value.is_completed() {
                "Task completed!"
            } else {
                "Task marked as pending!"
            };
            Ok(state.report(outcome, message))
        }
        Err(e) => Err(state.reject(e)),
    }
}

/// Returns whether the order changed. Dropping a task on itself is silent.
pub fn task_reorder(state: &TaskState, moved_id: &str, target_id: &str) -> Result<bool, String> {
    let reordered = state.store.write().reorder(moved_id, target_id);
    match reordered {
        Ok(outcome) if !outcome.value => Ok(false),
        Ok(outcome) => Ok(state.report(outcome, "Task reordered successfully!")),
        Err(e) => Err(state.reject(e)),
    }
}

pub fn tasks_get_filtered(state: &TaskState, criteria: &TaskFilter) -> Vec<Task> {
    let store = state.store.read();
    filter(store.list(), criteria).into_iter().cloned().collect()
}

/// Filters by the raw values of the filter controls, `"all"` meaning any.
pub fn tasks_get_filtered_raw(
    state: &TaskState,
    category: &str,
    priority: &str,
    status: &str,
    search: &str,
) -> Result<Vec<Task>, String> {
    let criteria = TaskFilter::from_raw(category, priority, status, search)
        .map_err(|e| state.reject(e))?;
    Ok(tasks_get_filtered(state, &criteria))
}

pub fn tasks_get_stats(state: &TaskState) -> TaskStats {
    stats(state.store.read().list())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::clock::ManualClock;
    use crate::shared::errors::StorageError;
    use crate::shared::notify::QueuedNotifier;
    use crate::tasks::storage::{KeyValueStore, TaskRepository};
    use crate::tasks::store::TaskStore;
    use crate::tasks::types::{Category, Priority, EMPTY_TITLE_MESSAGE};
    use chrono::{Local, TimeZone};

    struct FailingStore;

    impl KeyValueStore for FailingStore {
        fn get(&self, _key: &str) -> Result<Option<String>, StorageError> {
            Ok(None)
        }

        fn set(&self, _key: &str, _value: &str) -> Result<(), StorageError> {
            Err(StorageError::directory("disk full"))
        }
    }

    fn state_with(repository: TaskRepository) -> (TaskState, Arc<QueuedNotifier>) {
        let clock = Arc::new(ManualClock::new(
            Local.with_ymd_and_hms(2026, 5, 4, 18, 30, 0).unwrap(),
        ));
        let store = Arc::new(SharedStore::new(TaskStore::new(Vec::new(), repository, clock)));
        let notifier = Arc::new(QueuedNotifier::new());
        (TaskState::new(store, notifier.clone()), notifier)
    }

    fn state() -> (TaskState, Arc<QueuedNotifier>) {
        state_with(TaskRepository::in_memory())
    }

    fn messages(notifier: &QueuedNotifier) -> Vec<(String, Severity)> {
        notifier
            .drain()
            .into_iter()
            .map(|t| (t.message, t.severity))
            .collect()
    }

    #[test]
    fn test_create_toasts_success() {
        let (state, notifier) = state();
        let task = task_create(&state, NewTask::new("Buy milk")).unwrap();

        assert_eq!(task.title, "Buy milk");
        assert_eq!(
            messages(&notifier),
            vec![("Task added successfully!".to_string(), Severity::Success)]
        );
    }

    #[test]
    fn test_create_blank_title_toasts_error() {
        let (state, notifier) = state();
        let err = task_create(&state, NewTask::new("  ")).unwrap_err();

        assert_eq!(err, EMPTY_TITLE_MESSAGE);
        assert_eq!(
            messages(&notifier),
            vec![(EMPTY_TITLE_MESSAGE.to_string(), Severity::Error)]
        );
        assert_eq!(tasks_get_stats(&state).total, 0);
    }

    #[test]
    fn test_missing_task_is_silent() {
        let (state, notifier) = state();

        let err = task_delete(&state, "ghost").unwrap_err();
        assert_eq!(err, "Task not found: ghost");
        assert!(task_toggle_status(&state, "ghost").is_err());
        assert!(notifier.is_empty());
    }

    #[test]
    fn test_toggle_messages_follow_status() {
        let (state, notifier) = state();
        let id = task_create(&state, NewTask::new("Laundry")).unwrap().id;
        notifier.drain();

        task_toggle_status(&state, &id).unwrap();
        task_toggle_status(&state, &id).unwrap();

        let texts: Vec<String> = messages(&notifier).into_iter().map(|(m, _)| m).collect();
        assert_eq!(texts, vec!["Task completed!", "Task marked as pending!"]);
    }

    #[test]
    fn test_update_and_delete_messages() {
        let (state, notifier) = state();
        let id = task_create(&state, NewTask::new("Old")).unwrap().id;

        let updated = task_update(
            &state,
            &id,
            NewTask::new("New").priority(Priority::High).into(),
        )
        .unwrap();
        assert_eq!(updated.title, "New");
        assert_eq!(updated.priority, Priority::High);

        task_delete(&state, &id).unwrap();

        let texts: Vec<String> = messages(&notifier).into_iter().map(|(m, _)| m).collect();
        assert_eq!(
            texts,
            vec![
                "Task added successfully!",
                "Task updated successfully!",
                "Task deleted successfully!"
            ]
        );
    }

    #[test]
    fn test_reorder_onto_itself_is_silent() {
        let (state, notifier) = state();
        let a = task_create(&state, NewTask::new("A")).unwrap().id;
        let b = task_create(&state, NewTask::new("B")).unwrap().id;
        notifier.drain();

        assert!(!task_reorder(&state, &a, &a).unwrap());
        assert!(notifier.is_empty());

        assert!(task_reorder(&state, &a, &b).unwrap());
        assert_eq!(notifier.len(), 1);
    }

    #[test]
    fn test_save_failure_adds_warning() {
        let (state, notifier) = state_with(TaskRepository::new(Arc::new(FailingStore)));

        let task = task_create(&state, NewTask::new("Unsaved")).unwrap();
        assert_eq!(task.title, "Unsaved");

        let toasts = messages(&notifier);
        assert_eq!(toasts.len(), 2);
        assert_eq!(toasts[0].1, Severity::Success);
        assert_eq!(toasts[1].1, Severity::Warning);
        assert!(toasts[1].0.starts_with("Changes could not be saved"));
    }

    #[test]
    fn test_filtered_and_stats() {
        let (state, _) = state();
        task_create(&state, NewTask::new("Groceries").category(Category::Shopping)).unwrap();
        let id = task_create(&state, NewTask::new("Report").category(Category::Work))
            .unwrap()
            .id;
        task_toggle_status(&state, &id).unwrap();

        let spec = TaskFilter::from_raw("shopping", "all", "all", "").unwrap();
        let shown = tasks_get_filtered(&state, &spec);
        assert_eq!(shown.len(), 1);
        assert_eq!(shown[0].title, "Groceries");

        assert_eq!(
            tasks_get_stats(&state),
            TaskStats {
                total: 2,
                pending: 1,
                completed: 1
            }
        );
    }

    #[test]
    fn test_raw_filter_rejects_unknown_value() {
        let (state, notifier) = state();
        task_create(&state, NewTask::new("Plan trip").priority(Priority::High)).unwrap();
        notifier.drain();

        let shown = tasks_get_filtered_raw(&state, "all", "high", "all", "trip").unwrap();
        assert_eq!(shown.len(), 1);

        let err = tasks_get_filtered_raw(&state, "all", "urgent", "all", "").unwrap_err();
        assert_eq!(err, "Invalid priority filter: urgent");
        assert_eq!(messages(&notifier), vec![(err, Severity::Error)]);
    }
}
