pub mod task;
pub mod user;

use serde::{Deserialize, Serialize};

pub use task::{
    CreateTaskRequest, NewTask, Task, TaskChanges, TaskEnvelope, TaskList, TaskPriority,
    TaskStatus, UnknownLabel, UpdateTaskRequest,
};
pub use user::{NewUser, User, UserProfile};

/// Body of responses that only confirm an action.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MessageResponse {
    pub message: String,
}

impl MessageResponse {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }
}
