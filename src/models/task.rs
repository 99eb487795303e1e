use chrono::{DateTime, Utc};
use serde::{de::DeserializeOwned, Deserialize, Serialize};
use serde_json::{Map, Value};
use sqlx::FromRow;
use std::fmt;
use std::str::FromStr;
use uuid::Uuid;
use validator::Validate;

use crate::error::{AppError, FieldError};
use crate::validation::{known_priority, known_status, not_blank, parse_due_date, valid_due_date};

/// Progress label of a task. Any value may follow any other.
/// Corresponds to the `task_status` SQL enum.
#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq, Eq, Default, sqlx::Type)]
#[sqlx(type_name = "task_status", rename_all = "kebab-case")]
#[serde(rename_all = "kebab-case")]
pub enum TaskStatus {
    /// Not started yet.
    #[default]
    Pending,
    /// Being worked on.
    InProgress,
    /// Done.
    Completed,
}

/// Represents the priority of a task.
/// Corresponds to the `task_priority` SQL enum.
#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq, Eq, Default, sqlx::Type)]
#[sqlx(type_name = "task_priority", rename_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum TaskPriority {
    Low,
    #[default]
    Medium,
    High,
}

impl TaskStatus {
    pub const ALL: [TaskStatus; 3] = [TaskStatus::Pending, TaskStatus::InProgress, TaskStatus::Completed];

    pub fn as_str(&self) -> &'static str {
        match self {
            TaskStatus::Pending => "pending",
            TaskStatus::InProgress => "in-progress",
            TaskStatus::Completed => "completed",
        }
    }
}

impl TaskPriority {
    pub const ALL: [TaskPriority; 3] = [TaskPriority::Low, TaskPriority::Medium, TaskPriority::High];

    pub fn as_str(&self) -> &'static str {
        match self {
            TaskPriority::Low => "low",
            TaskPriority::Medium => "medium",
            TaskPriority::High => "high",
        }
    }
}

/// Returned when a string is not one of an enum's labels. Nothing is coerced.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UnknownLabel {
    pub kind: &'static str,
    pub value: String,
}

impl fmt::Display for UnknownLabel {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "unknown {} {:?}", self.kind, self.value)
    }
}

impl std::error::Error for UnknownLabel {}

impl FromStr for TaskStatus {
    type Err = UnknownLabel;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        TaskStatus::ALL
            .into_iter()
            .find(|status| status.as_str() == s)
            .ok_or_else(|| UnknownLabel {
                kind: "status",
                value: s.to_string(),
            })
    }
}

impl FromStr for TaskPriority {
    type Err = UnknownLabel;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        TaskPriority::ALL
            .into_iter()
            .find(|priority| priority.as_str() == s)
            .ok_or_else(|| UnknownLabel {
                kind: "priority",
                value: s.to_string(),
            })
    }
}

impl fmt::Display for TaskStatus {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl fmt::Display for TaskPriority {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Represents a task entity as stored in the database and returned by the API.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, FromRow)]
#[serde(rename_all = "camelCase")]
pub struct Task {
    /// Unique identifier for the task (UUID v4), assigned at creation.
    pub id: Uuid,
    pub title: String,
    pub description: String,
    pub status: TaskStatus,
    pub priority: TaskPriority,
    pub due_date: DateTime<Utc>,
    /// The user who created the task. Never reassigned.
    pub owner_id: Uuid,
    pub created_at: DateTime<Utc>,
    /// Refreshed on every successful update; never earlier than `created_at`.
    pub updated_at: DateTime<Utc>,
}

/// Validated fields of a task about to be created.
#[derive(Debug, Clone, PartialEq)]
pub struct NewTask {
    pub title: String,
    pub description: String,
    pub status: TaskStatus,
    pub priority: TaskPriority,
    pub due_date: DateTime<Utc>,
}

/// Validated partial update. `None` leaves the field unchanged.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct TaskChanges {
    pub title: Option<String>,
    pub description: Option<String>,
    pub status: Option<TaskStatus>,
    pub priority: Option<TaskPriority>,
    pub due_date: Option<DateTime<Utc>>,
}

impl Task {
    /// Creates a new `Task` owned by `owner_id`, with a fresh id and
    /// `created_at == updated_at == now`.
    pub fn new(input: NewTask, owner_id: Uuid, now: DateTime<Utc>) -> Self {
        Self {
            id: Uuid::new_v4(),
            title: input.title,
            description: input.description,
            status: input.status,
            priority: input.priority,
            due_date: input.due_date,
            owner_id,
            created_at: now,
            updated_at: now,
        }
    }

    /// Applies a partial update in place and advances `updated_at`.
    ///
    /// `id`, `owner_id` and `created_at` are never touched. `updated_at` never
    /// moves backwards, even if `now` does.
    pub fn apply(&mut self, changes: TaskChanges, now: DateTime<Utc>) {
        if let Some(title) = changes.title {
            self.title = title;
        }
        if let Some(description) = changes.description {
            self.description = description;
        }
        if let Some(status) = changes.status {
            self.status = status;
        }
        if let Some(priority) = changes.priority {
            self.priority = priority;
        }
        if let Some(due_date) = changes.due_date {
            self.due_date = due_date;
        }
        self.updated_at = now.max(self.updated_at);
    }

    pub fn is_owned_by(&self, user_id: Uuid) -> bool {
        self.owner_id == user_id
    }
}

/// Body of `POST /tasks`.
///
/// Enum fields and the due date arrive as strings so unknown values are reported
/// as field errors instead of failing deserialization of the whole body.
#[derive(Debug, Clone, Default, Serialize, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct CreateTaskRequest {
    #[validate(
        required(message = "Please provide a task title"),
        custom(function = "not_blank", message = "Please provide a task title")
    )]
    pub title: Option<String>,

    #[validate(
        required(message = "Please provide a task description"),
        custom(function = "not_blank", message = "Please provide a task description")
    )]
    pub description: Option<String>,

    #[validate(custom(
        function = "known_status",
        message = "Status must be one of: pending, in-progress, completed"
    ))]
    #[serde(skip_serializing_if = "Option::is_none")]
    pub status: Option<String>,

    #[validate(custom(
        function = "known_priority",
        message = "Priority must be one of: low, medium, high"
    ))]
    #[serde(skip_serializing_if = "Option::is_none")]
    pub priority: Option<String>,

    #[validate(
        required(message = "Please provide a due date"),
        custom(function = "valid_due_date", message = "Due date must be a valid date")
    )]
    pub due_date: Option<String>,
}

/// Body of `PUT /tasks/{id}`. Every field is optional; an explicitly empty
/// string is rejected rather than ignored.
#[derive(Debug, Clone, Default, Serialize, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct UpdateTaskRequest {
    #[validate(custom(function = "not_blank", message = "Title cannot be empty"))]
    #[serde(skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,

    #[validate(custom(function = "not_blank", message = "Description cannot be empty"))]
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,

    #[validate(custom(
        function = "known_status",
        message = "Status must be one of: pending, in-progress, completed"
    ))]
    #[serde(skip_serializing_if = "Option::is_none")]
    pub status: Option<String>,

    #[validate(custom(
        function = "known_priority",
        message = "Priority must be one of: low, medium, high"
    ))]
    #[serde(skip_serializing_if = "Option::is_none")]
    pub priority: Option<String>,

    #[validate(custom(function = "valid_due_date", message = "Due date must be a valid date"))]
    #[serde(skip_serializing_if = "Option::is_none")]
    pub due_date: Option<String>,
}

impl CreateTaskRequest {
    /// Validates the body and turns it into a `NewTask`, applying the
    /// `pending`/`medium` defaults.
    pub fn into_new_task(self) -> Result<NewTask, AppError> {
        self.validate()?;

        let title = required_text(self.title, "title", "Please provide a task title")?
            .trim()
            .to_string();
        let description = required_text(
            self.description,
            "description",
            "Please provide a task description",
        )?;
        let due_date = self
            .due_date
            .as_deref()
            .and_then(parse_due_date)
            .ok_or_else(|| AppError::invalid_field("dueDate", "Please provide a due date"))?;

        Ok(NewTask {
            title,
            description,
            status: parse_label(self.status.as_deref(), "status")?.unwrap_or_default(),
            priority: parse_label(self.priority.as_deref(), "priority")?.unwrap_or_default(),
            due_date,
        })
    }

    /// Decodes a create body. A field sent as something other than a string is
    /// reported as an error on that field alongside any other validation failures.
    pub fn from_json(body: Value) -> Result<NewTask, AppError> {
        let (request, type_errors) = decode_text_fields::<Self>(body)?;
        with_type_errors(type_errors, request.into_new_task())
    }
}

impl UpdateTaskRequest {
    /// Decodes a raw update body. An empty body is an update that changes nothing.
    pub fn from_body(body: &[u8]) -> Result<TaskChanges, AppError> {
        let value = if body.iter().all(u8::is_ascii_whitespace) {
            Value::Object(Map::new())
        } else {
            serde_json::from_slice(body)
                .map_err(|e| AppError::BadRequest(format!("Invalid request body: {}", e)))?
        };
        let (request, type_errors) = decode_text_fields::<Self>(value)?;
        with_type_errors(type_errors, request.into_changes())
    }

    pub fn into_changes(self) -> Result<TaskChanges, AppError> {
        self.validate()?;

        let due_date = match self.due_date.as_deref() {
            Some(raw) => Some(
                parse_due_date(raw)
                    .ok_or_else(|| AppError::invalid_field("dueDate", "Due date must be a valid date"))?,
            ),
            None => None,
        };

        Ok(TaskChanges {
            title: self.title.map(|t| t.trim().to_string()),
            description: self.description,
            status: parse_label(self.status.as_deref(), "status")?,
            priority: parse_label(self.priority.as_deref(), "priority")?,
            due_date,
        })
    }
}

fn required_text(value: Option<String>, field: &str, message: &str) -> Result<String, AppError> {
    match value {
        Some(text) if !text.trim().is_empty() => Ok(text),
        _ => Err(AppError::invalid_field(field, message)),
    }
}

fn parse_label<T>(value: Option<&str>, field: &str) -> Result<Option<T>, AppError>
where
    T: FromStr<Err = UnknownLabel>,
{
    value
        .map(|raw| raw.parse::<T>())
        .transpose()
        .map_err(|e| AppError::invalid_field(field, e.to_string()))
}

/// JSON names of the text fields of the task request bodies.
const TASK_FIELDS: [&str; 5] = ["title", "description", "status", "priority", "dueDate"];

/// Splits off task fields that are neither a string nor null, then decodes the rest.
fn decode_text_fields<T: DeserializeOwned>(body: Value) -> Result<(T, Vec<FieldError>), AppError> {
    let Value::Object(mut fields) = body else {
        return Err(AppError::BadRequest(
            "Invalid request body: expected a JSON object".into(),
        ));
    };

    let mut type_errors = Vec::new();
    for name in TASK_FIELDS {
        let wrong_type = matches!(fields.get(name), Some(v) if !v.is_string() && !v.is_null());
        if wrong_type {
            fields.remove(name);
            type_errors.push(FieldError::new(name, format!("{} must be a string", name)));
        }
    }

    let request = serde_json::from_value(Value::Object(fields))
        .map_err(|e| AppError::BadRequest(format!("Invalid request body: {}", e)))?;
    Ok((request, type_errors))
}

/// Folds type errors into the outcome of validating the remaining fields.
/// A field with a type error is reported once, with the type error.
fn with_type_errors<T>(mut type_errors: Vec<FieldError>, result: Result<T, AppError>) -> Result<T, AppError> {
    if type_errors.is_empty() {
        return result;
    }
    match result {
        Ok(_) => {}
        Err(AppError::Validation(others)) => {
            let others: Vec<FieldError> = others
                .into_iter()
                .filter(|e| !type_errors.iter().any(|t| t.field == e.field))
                .collect();
            type_errors.extend(others);
        }
        Err(other) => return Err(other),
    }
    type_errors.sort_by(|a, b| a.field.cmp(&b.field));
    Err(AppError::Validation(type_errors))
}

/// `GET /tasks` response body.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TaskList {
    pub tasks: Vec<Task>,
}

/// Response body carrying a single task, with an optional confirmation message.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TaskEnvelope {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
    pub task: Task,
}
