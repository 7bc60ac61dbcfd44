use super::helpers::{find_task, find_task_mut, position_of};
use super::reminders::ReminderHandle;
use super::storage::TaskRepository;
use super::types::{NewTask, Task, TaskError, TaskStatus, TaskUpdate};
use crate::core::clock::{until_local, Clock};
use crate::shared::errors::Outcome;
use chrono::{NaiveDateTime, Utc};
use std::sync::Arc;
use uuid::Uuid;

/// Owner of the ordered task collection. Every successful mutation is saved
/// through the repository before the call returns.
pub struct TaskStore {
    tasks: Vec<Task>,
    repository: TaskRepository,
    clock: Arc<dyn Clock>,
    reminders: Option<ReminderHandle>,
}

impl TaskStore {
    pub fn new(tasks: Vec<Task>, repository: TaskRepository, clock: Arc<dyn Clock>) -> Self {
        Self {
            tasks,
            repository,
            clock,
            reminders: None,
        }
    }

    /// Loads the saved collection. A failed load still yields a usable
    /// (empty) store; the error is handed back alongside it.
    pub fn open(repository: TaskRepository, clock: Arc<dyn Clock>) -> Outcome<Self> {
        let loaded = repository.load();
        let storage_error = loaded.storage_error;
        let store = Self::new(loaded.value, repository, clock);

        tracing::info!(target: "tasks", "Task store initialized: {} tasks", store.tasks.len());

        Outcome {
            value: store,
            storage_error,
        }
    }

    pub fn set_reminder_handle(&mut self, handle: ReminderHandle) {
        self.reminders = Some(handle);
    }

    pub fn list(&self) -> &[Task] {
        &self.tasks
    }

    pub fn get(&self, id: &str) -> Option<&Task> {
        find_task(&self.tasks, id)
    }

    pub fn len(&self) -> usize {
        self.tasks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tasks.is_empty()
    }

    pub fn create(&mut self, input: NewTask) -> Result<Outcome<Task>, TaskError> {
        let title = input.title.trim().to_string();
        if title.is_empty() {
            return Err(TaskError::empty_title());
        }

        let task = Task {
            id: self.fresh_id(),
            title,
            description: input.description.trim().to_string(),
            category: input.category,
            priority: input.priority,
            status: TaskStatus::Pending,
            due_date: input.due_date,
            reminder: input.reminder,
            created_at: self.clock.now().with_timezone(&Utc),
            updated_at: None,
            completed_at: None,
        };

        self.tasks.insert(0, task.clone());
        tracing::info!(target: "tasks", id = %task.id, "Task created");

        if let Some(at) = task.reminder {
            self.schedule_reminder(&task.id, at);
        }

        Ok(self.persist(task))
    }

    pub fn update(&mut self, id: &str, input: TaskUpdate) -> Result<Outcome<Task>, TaskError> {
        let title = match input.title {
            Some(title) => {
                let title = title.trim().to_string();
                if title.is_empty() {
                    return Err(TaskError::empty_title());
                }
                Some(title)
            }
            None => None,
        };

        let now = self.clock.now().with_timezone(&Utc);
        let task = find_task_mut(&mut self.tasks, id).ok_or_else(|| TaskError::not_found(id))?;
        let previous_reminder = task.reminder;

        if let Some(title) = title {
            task.title = title;
        }
        if let Some(description) = input.description {
            task.description = description.trim().to_string();
        }
        if let Some(category) = input.category {
            task.category = category;
        }
        if let Some(priority) = input.priority {
            task.priority = priority;
        }
        if let Some(due_date) = input.due_date {
            task.due_date = due_date;
        }
        if let Some(reminder) = input.reminder {
            task.reminder = reminder;
        }
        task.updated_at = Some(now);

        let task = task.clone();
        tracing::info!(target: "tasks", id = %task.id, "Task updated");

        if task.reminder != previous_reminder {
            if let Some(at) = task.reminder {
                self.schedule_reminder(&task.id, at);
            }
        }

        Ok(self.persist(task))
    }

    /// Removes a task and returns it. The caller owns any confirmation step.
    pub fn delete(&mut self, id: &str) -> Result<Outcome<Task>, TaskError> {
        let index = position_of(&self.tasks, id).ok_or_else(|| TaskError::not_found(id))?;
        let task = self.tasks.remove(index);
        tracing::info!(target: "tasks", id = %task.id, "Task deleted");

        Ok(self.persist(task))
    }

    pub fn toggle_status(&mut self, id: &str) -> Result<Outcome<Task>, TaskError> {
        let now = self.clock.now().with_timezone(&Utc);
        let task = find_task_mut(&mut self.tasks, id).ok_or_else(|| TaskError::not_found(id))?;

        task.status = task.status.toggled();
        task.completed_at = match task.status {
            TaskStatus::Completed => Some(now),
            TaskStatus::Pending => None,
        };

        let task = task.clone();
        tracing::info!(target: "tasks", id = %task.id, status = %task.status, "Task status toggled");

        Ok(self.persist(task))
    }

    /// Moves `moved_id` into the slot `target_id` occupies, shifting the
    /// tasks in between. Returns whether anything moved.
    pub fn reorder(&mut self, moved_id: &str, target_id: &str) -> Result<Outcome<bool>, TaskError> {
        let from = position_of(&self.tasks, moved_id).ok_or_else(|| TaskError::not_found(moved_id))?;
        let to = position_of(&self.tasks, target_id).ok_or_else(|| TaskError::not_found(target_id))?;

        if from == to {
            return Ok(Outcome::clean(false));
        }

        let task = self.tasks.remove(from);
        self.tasks.insert(to, task);
        tracing::info!(target: "tasks", moved_id = moved_id, target_id = target_id, from, to, "Task reordered");

        Ok(self.persist(true))
    }

    fn persist<T>(&self, value: T) -> Outcome<T> {
        match self.repository.save(&self.tasks) {
            Ok(()) => Outcome::clean(value),
            Err(e) => {
                tracing::error!(target: "tasks", "Failed to save tasks: {}", e);
                Outcome::with_error(value, e)
            }
        }
    }

    /// Hands a future reminder to the scheduler. Past reminders are left to the sweep.
    fn schedule_reminder(&self, id: &str, at: NaiveDateTime) {
        if until_local(&self.clock.now(), at) <= chrono::Duration::zero() {
            return;
        }

        match &self.reminders {
            Some(handle) => {
                if !handle.register(id, at) {
                    tracing::warn!(target: "reminders", id = id, "Reminder scheduler is not running");
                }
            }
            None => tracing::debug!(target: "reminders", id = id, "No reminder scheduler attached"),
        }
    }

    fn fresh_id(&self) -> String {
        loop {
            let id = Uuid::new_v4().to_string();
            if find_task(&self.tasks, &id).is_none() {
                return id;
            }
        }
    }
}
