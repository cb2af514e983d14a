use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

/// A task as returned by the server. Field names are camelCase on the wire.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Task {
    pub id: i64,
    pub title: String,
    #[serde(default)]
    pub description: String,
    pub due_date: Option<NaiveDate>,
    pub priority: Priority,
    pub status: Status,
    #[serde(default)]
    pub category: String,
    pub created_at: DateTime<Utc>,
    pub user_id: i64,
}

/// The mutable fields of a task, used as the body of create and update
/// requests. The server assigns `id`, `createdAt` and `userId`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TaskDraft {
    pub title: String,
    #[serde(default)]
    pub description: String,
    pub due_date: Option<NaiveDate>,
    pub priority: Priority,
    pub status: Status,
    #[serde(default)]
    pub category: String,
}

impl Default for TaskDraft {
    fn default() -> Self {
        Self {
            title: String::new(),
            description: String::new(),
            due_date: None,
            priority: Priority::Medium,
            status: Status::ToDo,
            category: String::new(),
        }
    }
}

impl TaskDraft {
    /// Pre-fill a draft from an existing task, for the edit flow.
    pub fn from_task(task: &Task) -> Self {
        Self {
            title: task.title.clone(),
            description: task.description.clone(),
            due_date: task.due_date,
            priority: task.priority,
            status: task.status,
            category: task.category.clone(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Priority {
    Low,
    Medium,
    High,
}

impl Priority {
    pub const ALL: [Priority; 3] = [Priority::Low, Priority::Medium, Priority::High];
}

impl fmt::Display for Priority {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            Priority::Low => "Low",
            Priority::Medium => "Medium",
            Priority::High => "High",
        };
        write!(f, "{}", label)
    }
}

impl FromStr for Priority {
    type Err = ParseEnumError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "low" => Ok(Priority::Low),
            "medium" => Ok(Priority::Medium),
            "high" => Ok(Priority::High),
            _ => Err(ParseEnumError {
                value: s.to_string(),
                expected: "low, medium or high",
            }),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Status {
    ToDo,
    InProgress,
    Done,
}

impl Status {
    pub const ALL: [Status; 3] = [Status::ToDo, Status::InProgress, Status::Done];
}

impl fmt::Display for Status {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            Status::ToDo => "To Do",
            Status::InProgress => "In Progress",
            Status::Done => "Done",
        };
        write!(f, "{}", label)
    }
}

impl FromStr for Status {
    type Err = ParseEnumError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().replace(['-', '_', ' '], "").as_str() {
            "todo" => Ok(Status::ToDo),
            "inprogress" => Ok(Status::InProgress),
            "done" => Ok(Status::Done),
            _ => Err(ParseEnumError {
                value: s.to_string(),
                expected: "todo, in-progress or done",
            }),
        }
    }
}

#[derive(Debug, Clone, Error)]
#[error("invalid value '{value}', expected {expected}")]
pub struct ParseEnumError {
    value: String,
    expected: &'static str,
}

/// Filter criteria applied to the in-memory collection. All three predicates
/// are conjunctive; `None` on status/priority means "All".
#[derive(Debug, Clone, Default, PartialEq)]
pub struct TaskFilter {
    pub search: String,
    pub status: Option<Status>,
    pub priority: Option<Priority>,
}

impl TaskFilter {
    pub fn is_active(&self) -> bool {
        !self.search.is_empty() || self.status.is_some() || self.priority.is_some()
    }

    pub fn clear(&mut self) {
        *self = TaskFilter::default();
    }

    /// Status and priority match exactly; the search text is a
    /// case-insensitive substring of either the title or the category.
    pub fn matches(&self, task: &Task) -> bool {
        if let Some(status) = self.status {
            if task.status != status {
                return false;
            }
        }
        if let Some(priority) = self.priority {
            if task.priority != priority {
                return false;
            }
        }
        if !self.search.is_empty() {
            let needle = self.search.to_lowercase();
            if !task.title.to_lowercase().contains(&needle)
                && !task.category.to_lowercase().contains(&needle)
            {
                return false;
            }
        }
        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    pub(crate) fn sample_task(id: i64, title: &str, status: Status, priority: Priority) -> Task {
        Task {
            id,
            title: title.to_string(),
            description: String::new(),
            due_date: None,
            priority,
            status,
            category: String::new(),
            created_at: DateTime::parse_from_rfc3339("2024-06-01T12:00:00Z")
                .unwrap()
                .with_timezone(&Utc),
            user_id: 1,
        }
    }

    #[test]
    fn task_serializes_with_camel_case_field_names() {
        let mut task = sample_task(7, "Groceries", Status::ToDo, Priority::High);
        task.due_date = Some(NaiveDate::from_ymd_opt(2024, 6, 15).unwrap());
        let json = serde_json::to_value(&task).unwrap();
        assert_eq!(json["dueDate"], "2024-06-15");
        let created: DateTime<Utc> = json["createdAt"].as_str().unwrap().parse().unwrap();
        assert_eq!(created, task.created_at);
        assert_eq!(json["userId"], 1);
        assert_eq!(json["priority"], "High");
        assert_eq!(json["status"], "ToDo");
    }

    #[test]
    fn task_deserializes_from_server_shape() {
        let task: Task = serde_json::from_value(serde_json::json!({
            "id": 3,
            "title": "Write report",
            "description": "",
            "dueDate": null,
            "priority": "Low",
            "status": "InProgress",
            "category": "Work",
            "createdAt": "2024-06-01T12:00:00Z",
            "userId": 9
        }))
        .unwrap();
        assert_eq!(task.status, Status::InProgress);
        assert_eq!(task.due_date, None);
        assert_eq!(task.category, "Work");
    }

    #[test]
    fn draft_defaults_match_the_empty_form() {
        let draft = TaskDraft::default();
        assert_eq!(draft.priority, Priority::Medium);
        assert_eq!(draft.status, Status::ToDo);
        assert!(draft.title.is_empty());
        assert_eq!(draft.due_date, None);
    }

    #[test]
    fn enums_parse_case_insensitively() {
        assert_eq!("HIGH".parse::<Priority>().unwrap(), Priority::High);
        assert_eq!("in-progress".parse::<Status>().unwrap(), Status::InProgress);
        assert_eq!("ToDo".parse::<Status>().unwrap(), Status::ToDo);
        assert!("urgent".parse::<Priority>().is_err());
    }

    #[test]
    fn empty_filter_matches_everything() {
        let filter = TaskFilter::default();
        let task = sample_task(1, "Anything", Status::Done, Priority::Low);
        assert!(filter.matches(&task));
        assert!(!filter.is_active());
    }

    #[test]
    fn search_is_case_insensitive_on_title_and_category() {
        let filter = TaskFilter {
            search: "gro".to_string(),
            ..TaskFilter::default()
        };
        let by_title = sample_task(1, "Groceries", Status::ToDo, Priority::Low);
        let mut by_category = sample_task(2, "Saturday errand", Status::ToDo, Priority::Low);
        by_category.category = "GROCERY".to_string();
        let neither = sample_task(3, "Laundry", Status::ToDo, Priority::Low);
        assert!(filter.matches(&by_title));
        assert!(filter.matches(&by_category));
        assert!(!filter.matches(&neither));
    }

    #[test]
    fn status_and_priority_match_exactly() {
        let filter = TaskFilter {
            status: Some(Status::Done),
            priority: Some(Priority::High),
            ..TaskFilter::default()
        };
        assert!(filter.matches(&sample_task(1, "A", Status::Done, Priority::High)));
        assert!(!filter.matches(&sample_task(2, "B", Status::Done, Priority::Low)));
        assert!(!filter.matches(&sample_task(3, "C", Status::ToDo, Priority::High)));
    }
}
