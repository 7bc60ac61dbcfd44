use chrono::{DateTime, NaiveDate, NaiveDateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

pub const EMPTY_TITLE_MESSAGE: &str = "Please enter a task title";

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum TaskError {
    #[error("{0}")]
    Validation(String),
    #[error("Task not found: {0}")]
    NotFound(String),
    #[error("Invalid {field} filter: {value}")]
    InvalidFilter { field: &'static str, value: String },
}

impl TaskError {
    pub fn empty_title() -> Self {
        TaskError::Validation(EMPTY_TITLE_MESSAGE.to_string())
    }

    pub fn not_found(id: impl Into<String>) -> Self {
        TaskError::NotFound(id.into())
    }

    pub fn invalid_filter(field: &'static str, value: impl Into<String>) -> Self {
        TaskError::InvalidFilter {
            field,
            value: value.into(),
        }
    }
}

/// Task category. The four built-in categories serialize to their lowercase
/// names; anything else is kept verbatim.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum Category {
    Work,
    Personal,
    Shopping,
    Other,
    Custom(String),
}

impl Category {
    pub fn as_str(&self) -> &str {
        match self {
            Category::Work => "work",
            Category::Personal => "personal",
            Category::Shopping => "shopping",
            Category::Other => "other",
            Category::Custom(name) => name,
        }
    }
}

impl Default for Category {
    fn default() -> Self {
        Category::Other
    }
}

impl From<String> for Category {
    fn from(value: String) -> Self {
        match value.as_str() {
            "work" => Category::Work,
            "personal" => Category::Personal,
            "shopping" => Category::Shopping,
            "other" => Category::Other,
            _ => Category::Custom(value),
        }
    }
}

impl From<&str> for Category {
    fn from(value: &str) -> Self {
        Category::from(value.to_string())
    }
}

impl From<Category> for String {
    fn from(value: Category) -> Self {
        match value {
            Category::Custom(name) => name,
            other => other.as_str().to_string(),
        }
    }
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Category {
    type Err = TaskError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        if s.trim().is_empty() {
            return Err(TaskError::Validation("Category cannot be empty".to_string()));
        }
        Ok(Category::from(s))
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Priority {
    Low,
    #[default]
    Medium,
    High,
}

impl Priority {
    pub fn as_str(&self) -> &'static str {
        match self {
            Priority::Low => "low",
            Priority::Medium => "medium",
            Priority::High => "high",
        }
    }
}

impl fmt::Display for Priority {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Priority {
    type Err = TaskError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "low" => Ok(Priority::Low),
            "medium" => Ok(Priority::Medium),
            "high" => Ok(Priority::High),
            _ => Err(TaskError::Validation(format!("Invalid priority: {}", s))),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TaskStatus {
    #[default]
    Pending,
    Completed,
}

impl TaskStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            TaskStatus::Pending => "pending",
            TaskStatus::Completed => "completed",
        }
    }

    pub fn toggled(self) -> Self {
        match self {
            TaskStatus::Pending => TaskStatus::Completed,
            TaskStatus::Completed => TaskStatus::Pending,
        }
    }
}

impl fmt::Display for TaskStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for TaskStatus {
    type Err = TaskError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "pending" => Ok(TaskStatus::Pending),
            "completed" => Ok(TaskStatus::Completed),
            _ => Err(TaskError::Validation(format!("Invalid status: {}", s))),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Task {
    pub id: String,
    pub title: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub category: Category,
    #[serde(default)]
    pub priority: Priority,
    #[serde(default)]
    pub status: TaskStatus,
    #[serde(default, with = "formats::due_date")]
    pub due_date: Option<NaiveDate>,
    /// Local wall-clock time, minute precision as entered.
    #[serde(default, with = "formats::reminder")]
    pub reminder: Option<NaiveDateTime>,
    pub created_at: DateTime<Utc>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub updated_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub completed_at: Option<DateTime<Utc>>,
}

impl Task {
    pub fn is_completed(&self) -> bool {
        self.status == TaskStatus::Completed
    }

    /// A task is overdue when its due date lies before `today` and it is still open.
    pub fn is_overdue(&self, today: NaiveDate) -> bool {
        !self.is_completed() && self.due_date.is_some_and(|due| due < today)
    }

    /// Text the search box matches against.
    pub fn searchable_text(&self) -> String {
        format!("{} {}", self.title, self.description)
    }
}

/// Fields a user supplies when creating a task.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewTask {
    pub title: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub category: Category,
    #[serde(default)]
    pub priority: Priority,
    #[serde(default, with = "formats::due_date")]
    pub due_date: Option<NaiveDate>,
    #[serde(default, with = "formats::reminder")]
    pub reminder: Option<NaiveDateTime>,
}

impl NewTask {
    pub fn new(title: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            ..Self::default()
        }
    }

    pub fn description(mut self, description: impl Into<String>) -> Self {
        self.description = description.into();
        self
    }

    pub fn category(mut self, category: impl Into<Category>) -> Self {
        self.category = category.into();
        self
    }

    pub fn priority(mut self, priority: Priority) -> Self {
        self.priority = priority;
        self
    }

    pub fn due_date(mut self, due_date: NaiveDate) -> Self {
        self.due_date = Some(due_date);
        self
    }

    pub fn reminder(mut self, reminder: NaiveDateTime) -> Self {
        self.reminder = Some(reminder);
        self
    }
}

/// Partial update. `None` leaves a field untouched; for the nullable fields
/// `Some(None)` clears the value.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct TaskUpdate {
    pub title: Option<String>,
    pub description: Option<String>,
    pub category: Option<Category>,
    pub priority: Option<Priority>,
    pub due_date: Option<Option<NaiveDate>>,
    pub reminder: Option<Option<NaiveDateTime>>,
}

/// Submitting the edit form replaces every editable field.
impl From<NewTask> for TaskUpdate {
    fn from(input: NewTask) -> Self {
        Self {
            title: Some(input.title),
            description: Some(input.description),
            category: Some(input.category),
            priority: Some(input.priority),
            due_date: Some(input.due_date),
            reminder: Some(input.reminder),
        }
    }
}

/// Due date pre-filled when opening the "add task" form: tomorrow.
pub fn default_due_date(today: NaiveDate) -> NaiveDate {
    today.succ_opt().unwrap_or(today)
}

pub(crate) mod formats {
    //! Lenient date formats for values that come straight from HTML inputs:
    //! empty strings mean "not set" and reminders may omit seconds.

    pub mod due_date {
        use chrono::NaiveDate;
        use serde::{Deserialize, Deserializer, Serializer};

        const FORMAT: &str = "%Y-%m-%d";

        pub fn serialize<S>(value: &Option<NaiveDate>, serializer: S) -> Result<S::Ok, S::Error>
        where
            S: Serializer,
        {
            match value {
                Some(date) => serializer.serialize_str(&date.format(FORMAT).to_string()),
                None => serializer.serialize_none(),
            }
        }

        pub fn deserialize<'de, D>(deserializer: D) -> Result<Option<NaiveDate>, D::Error>
        where
            D: Deserializer<'de>,
        {
            let raw = Option::<String>::deserialize(deserializer)?;
            match raw.as_deref().map(str::trim) {
                None | Some("") => Ok(None),
                Some(s) => NaiveDate::parse_from_str(s, FORMAT)
                    .map(Some)
                    .map_err(serde::de::Error::custom),
            }
        }
    }

    pub mod reminder {
        use chrono::{NaiveDateTime, Timelike};
        use serde::{Deserialize, Deserializer, Serializer};

        const MINUTE_FORMAT: &str = "%Y-%m-%dT%H:%M";
        const SECOND_FORMAT: &str = "%Y-%m-%dT%H:%M:%S";
        const PARSE_FORMATS: [&str; 3] = ["%Y-%m-%dT%H:%M:%S%.f", SECOND_FORMAT, MINUTE_FORMAT];

        pub fn serialize<S>(
            value: &Option<NaiveDateTime>,
            serializer: S,
        ) -> Result<S::Ok, S::Error>
        where
            S: Serializer,
        {
            match value {
                Some(at) if at.second() == 0 && at.nanosecond() == 0 => {
                    serializer.serialize_str(&at.format(MINUTE_FORMAT).to_string())
                }
                Some(at) => serializer.serialize_str(&at.format(SECOND_FORMAT).to_string()),
                None => serializer.serialize_none(),
            }
        }

        pub fn deserialize<'de, D>(deserializer: D) -> Result<Option<NaiveDateTime>, D::Error>
        where
            D: Deserializer<'de>,
        {
            let raw = Option::<String>::deserialize(deserializer)?;
            let Some(s) = raw.as_deref().map(str::trim).filter(|s| !s.is_empty()) else {
                return Ok(None);
            };

            PARSE_FORMATS
                .iter()
                .find_map(|format| NaiveDateTime::parse_from_str(s, format).ok())
                .map(Some)
                .ok_or_else(|| serde::de::Error::custom(format!("invalid reminder: {}", s)))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn sample_task() -> Task {
        Task {
            id: "t1".to_string(),
            title: "Buy milk".to_string(),
            description: "2 litres".to_string(),
            category: Category::Shopping,
            priority: Priority::Low,
            status: TaskStatus::Pending,
            due_date: NaiveDate::from_ymd_opt(2026, 3, 10),
            reminder: NaiveDate::from_ymd_opt(2026, 3, 10).and_then(|d| d.and_hms_opt(9, 30, 0)),
            created_at: Utc.with_ymd_and_hms(2026, 3, 1, 8, 0, 0).unwrap(),
            updated_at: None,
            completed_at: None,
        }
    }

    #[test]
    fn test_task_serializes_camel_case() {
        let json = serde_json::to_value(sample_task()).unwrap();

        assert_eq!(json["title"], "Buy milk");
        assert_eq!(json["category"], "shopping");
        assert_eq!(json["priority"], "low");
        assert_eq!(json["status"], "pending");
        assert_eq!(json["dueDate"], "2026-03-10");
        assert_eq!(json["reminder"], "2026-03-10T09:30");
        assert!(json["completedAt"].is_null());
        assert!(json.get("updatedAt").is_none());
        assert!(json.get("createdAt").is_some());
    }

    #[test]
    fn test_task_parses_browser_shaped_json() {
        let json = r#"{
            "id": "lxk2j3abc",
            "title": "Call mom",
            "description": "",
            "category": "personal",
            "priority": "high",
            "dueDate": "",
            "reminder": "2026-03-10T18:45",
            "status": "completed",
            "createdAt": "2026-03-01T10:00:00.000Z",
            "completedAt": "2026-03-02T10:00:00.000Z"
        }"#;

        let task: Task = serde_json::from_str(json).unwrap();
        assert_eq!(task.category, Category::Personal);
        assert_eq!(task.priority, Priority::High);
        assert_eq!(task.status, TaskStatus::Completed);
        assert_eq!(task.due_date, None);
        assert_eq!(
            task.reminder,
            NaiveDate::from_ymd_opt(2026, 3, 10).and_then(|d| d.and_hms_opt(18, 45, 0))
        );
        assert!(task.completed_at.is_some());
    }

    #[test]
    fn test_reminder_with_seconds_round_trips_with_seconds() {
        let mut task = sample_task();
        task.reminder = NaiveDate::from_ymd_opt(2026, 3, 10).and_then(|d| d.and_hms_opt(9, 30, 15));

        let json = serde_json::to_string(&task).unwrap();
        assert!(json.contains("\"reminder\":\"2026-03-10T09:30:15\""));

        let parsed: Task = serde_json::from_str(&json).unwrap();
        assert_eq!(parsed.reminder, task.reminder);
    }

    #[test]
    fn test_invalid_reminder_is_rejected() {
        let json = r#"{"id":"x","title":"t","reminder":"tomorrow","createdAt":"2026-03-01T10:00:00Z"}"#;
        assert!(serde_json::from_str::<Task>(json).is_err());
    }

    #[test]
    fn test_custom_category_kept_verbatim() {
        let category: Category = serde_json::from_str("\"garden\"").unwrap();
        assert_eq!(category, Category::Custom("garden".to_string()));
        assert_eq!(serde_json::to_string(&category).unwrap(), "\"garden\"");
        assert_eq!("work".parse::<Category>().unwrap(), Category::Work);
        assert!("  ".parse::<Category>().is_err());
    }

    #[test]
    fn test_priority_and_status_parsing() {
        assert_eq!("high".parse::<Priority>().unwrap(), Priority::High);
        assert!("urgent".parse::<Priority>().is_err());
        assert_eq!("completed".parse::<TaskStatus>().unwrap(), TaskStatus::Completed);
        assert!("done".parse::<TaskStatus>().is_err());
        assert_eq!(TaskStatus::Pending.toggled(), TaskStatus::Completed);
    }

    #[test]
    fn test_overdue_only_for_open_tasks_past_due() {
        let mut task = sample_task();
        let due = NaiveDate::from_ymd_opt(2026, 3, 10).unwrap();

        assert!(!task.is_overdue(due));
        assert!(task.is_overdue(due.succ_opt().unwrap()));

        task.status = TaskStatus::Completed;
        assert!(!task.is_overdue(due.succ_opt().unwrap()));

        task.status = TaskStatus::Pending;
        task.due_date = None;
        assert!(!task.is_overdue(due.succ_opt().unwrap()));
    }

    #[test]
    fn test_default_due_date_is_tomorrow() {
        let today = NaiveDate::from_ymd_opt(2026, 12, 31).unwrap();
        assert_eq!(
            default_due_date(today),
            NaiveDate::from_ymd_opt(2027, 1, 1).unwrap()
        );
    }

    #[test]
    fn test_form_submit_replaces_every_field() {
        let update = TaskUpdate::from(NewTask::new("Read").priority(Priority::High));
        assert_eq!(update.title.as_deref(), Some("Read"));
        assert_eq!(update.priority, Some(Priority::High));
        assert_eq!(update.due_date, Some(None));
        assert_eq!(update.reminder, Some(None));
        assert_ne!(update, TaskUpdate::default());
    }
}
