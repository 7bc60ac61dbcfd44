use super::types::{Task, TaskStatus};
use serde::Serialize;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TaskStats {
    pub total: usize,
    pub pending: usize,
    pub completed: usize,
}

pub fn stats(tasks: &[Task]) -> TaskStats {
    tasks.iter().fold(
        TaskStats {
            total: tasks.len(),
            ..TaskStats::default()
        },
        |mut acc, task| {
            match task.status {
                TaskStatus::Pending => acc.pending += 1,
                TaskStatus::Completed => acc.completed += 1,
            }
            acc
        },
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tasks::types::{Category, Priority};
    use chrono::Utc;

    fn task(status: TaskStatus) -> Task {
        Task {
            id: uuid::Uuid::new_v4().to_string(),
            title: "t".to_string(),
            description: String::new(),
            category: Category::Other,
            priority: Priority::Low,
            status,
            due_date: None,
            reminder: None,
            created_at: Utc::now(),
            updated_at: None,
            completed_at: None,
        }
    }

    #[test]
    fn test_empty_collection() {
        assert_eq!(stats(&[]), TaskStats::default());
    }

    #[test]
    fn test_counts_by_status() {
        let tasks = vec![
            task(TaskStatus::Pending),
            task(TaskStatus::Completed),
            task(TaskStatus::Pending),
        ];
        assert_eq!(
            stats(&tasks),
            TaskStats {
                total: 3,
                pending: 2,
                completed: 1
            }
        );
    }
}
