use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use validator::Validate;

/// A task entity as stored in the database and returned by the API.
///
/// Completion is a two-state machine (`is_completed` false/true) driven
/// either through the generic update path or through the dedicated
/// `complete` / `incomplete` endpoints.
#[derive(Debug, Serialize, Deserialize, FromRow)]
pub struct Task {
    pub id: i64,
    pub title: String,
    pub description: Option<String>,
    pub due_date: DateTime<Utc>,
    pub is_completed: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Input structure for creating a task.
#[derive(Debug, Serialize, Deserialize, Validate)]
pub struct TaskInput {
    #[validate(length(min = 1, max = 255, message = "The title must be between 1 and 255 characters."))]
    pub title: String,

    #[validate(length(max = 1000, message = "The description may not be greater than 1000 characters."))]
    pub description: Option<String>,

    /// RFC 3339 timestamp, e.g. "2024-12-31T23:59:59Z".
    pub due_date: DateTime<Utc>,

    pub is_completed: bool,
}

/// Input structure for partially updating a task. Absent fields are left
/// untouched.
#[derive(Debug, Serialize, Deserialize, Validate)]
pub struct TaskUpdate {
    #[validate(length(min = 1, max = 255, message = "The title must be between 1 and 255 characters."))]
    pub title: Option<String>,

    #[validate(length(max = 1000, message = "The description may not be greater than 1000 characters."))]
    pub description: Option<String>,

    pub due_date: Option<DateTime<Utc>>,

    pub is_completed: Option<bool>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_task_input_validation() {
        let valid_input = TaskInput {
            title: "Valid Task".to_string(),
            description: Some("A description".to_string()),
            due_date: Utc::now(),
            is_completed: false,
        };
        assert!(valid_input.validate().is_ok());

        let invalid_input = TaskInput {
            title: "".to_string(),
            description: None,
            due_date: Utc::now(),
            is_completed: false,
        };
        assert!(
            invalid_input.validate().is_err(),
            "Validation should fail for empty title."
        );

        let long_title = "a".repeat(256);
        let invalid_input = TaskInput {
            title: long_title,
            description: None,
            due_date: Utc::now(),
            is_completed: false,
        };
        assert!(
            invalid_input.validate().is_err(),
            "Validation should fail for overly long title."
        );

        let long_description = "b".repeat(1001);
        let invalid_input = TaskInput {
            title: "Valid title".to_string(),
            description: Some(long_description),
            due_date: Utc::now(),
            is_completed: false,
        };
        assert!(
            invalid_input.validate().is_err(),
            "Validation should fail for overly long description."
        );
    }

    #[test]
    fn test_task_input_deserializes_rfc3339_due_date() {
        let input: TaskInput = serde_json::from_value(serde_json::json!({
            "title": "New Task",
            "due_date": "2024-12-31T23:59:59Z",
            "is_completed": false
        }))
        .unwrap();
        assert_eq!(input.title, "New Task");
        assert!(input.description.is_none());
    }

    #[test]
    fn test_task_update_all_fields_optional() {
        let update: TaskUpdate = serde_json::from_value(serde_json::json!({})).unwrap();
        assert!(update.validate().is_ok());
        assert!(update.title.is_none());
        assert!(update.is_completed.is_none());
    }
}
