use super::types::{Category, Priority, Task, TaskError, TaskStatus};
use std::str::FromStr;

/// Value the presentation layer uses for "no constraint".
pub const ALL: &str = "all";

/// What the task list should show. The default constrains nothing.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TaskFilter {
    pub category: Option<Category>,
    pub priority: Option<Priority>,
    pub status: Option<TaskStatus>,
    pub search: String,
}

impl TaskFilter {
    /// Builds a filter from raw presentation values, where `"all"` (or an
    /// empty value) means unconstrained.
    pub fn from_raw(
        category: &str,
        priority: &str,
        status: &str,
        search: &str,
    ) -> Result<Self, TaskError> {
        Ok(Self {
            category: constraint("category", category)?,
            priority: constraint("priority", priority)?,
            status: constraint("status", status)?,
            search: search.to_string(),
        })
    }

    pub fn matches(&self, task: &Task) -> bool {
        if self.category.as_ref().is_some_and(|c| *c != task.category) {
            return false;
        }

        if self.priority.is_some_and(|p| p != task.priority) {
            return false;
        }

        if self.status.is_some_and(|s| s != task.status) {
            return false;
        }

        if !self.search.is_empty() {
            let needle = self.search.to_lowercase();
            if !task.searchable_text().to_lowercase().contains(&needle) {
                return false;
            }
        }

        true
    }
}

fn constraint<T: FromStr>(field: &'static str, raw: &str) -> Result<Option<T>, TaskError> {
    let raw = raw.trim();
    if raw.is_empty() || raw == ALL {
        return Ok(None);
    }
    raw.parse()
        .map(Some)
        .map_err(|_| TaskError::invalid_filter(field, raw))
}

/// Tasks matching `criteria`, in collection order.
pub fn filter<'a>(tasks: &'a [Task], criteria: &TaskFilter) -> Vec<&'a Task> {
    tasks.iter().filter(|task| criteria.matches(task)).collect()
}
