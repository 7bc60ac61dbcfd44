use super::types::{Task, TaskStatus};
use std::collections::HashSet;

pub fn find_task<'a>(tasks: &'a [Task], id: &str) -> Option<&'a Task> {
    tasks.iter().find(|task| task.id == id)
}

pub fn find_task_mut<'a>(tasks: &'a mut [Task], id: &str) -> Option<&'a mut Task> {
    tasks.iter_mut().find(|task| task.id == id)
}

pub fn position_of(tasks: &[Task], id: &str) -> Option<usize> {
    tasks.iter().position(|task| task.id == id)
}

/// Repairs a collection read from storage so the store invariants hold:
/// titles are non-blank, ids are unique (first occurrence wins) and
/// `completed_at` is set exactly when the task is completed. Tasks that
/// cannot be repaired are dropped. Returns how many tasks were touched.
pub fn normalize_loaded(tasks: &mut Vec<Task>) -> usize {
    let mut repaired = 0;

    let mut seen = HashSet::new();
    let before = tasks.len();
    tasks.retain(|task| {
        if task.title.trim().is_empty() {
            tracing::warn!(target: "tasks::storage", id = %task.id, "Dropping task with blank title");
            return false;
        }
        seen.insert(task.id.clone())
    });
    repaired += before - tasks.len();

    for task in tasks.iter_mut() {
        match task.status {
            TaskStatus::Completed if task.completed_at.is_none() => {
                task.completed_at = Some(task.updated_at.unwrap_or(task.created_at));
                repaired += 1;
            }
            TaskStatus::Pending if task.completed_at.is_some() => {
                task.completed_at = None;
                repaired += 1;
            }
            _ => {}
        }
    }

    repaired
}
