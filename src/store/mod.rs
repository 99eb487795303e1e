//! Persistence seams.
//!
//! Handlers talk to `TaskStore` and `UserStore` only. Every operation reads or
//! writes exactly one record, so no transactions are involved; concurrent
//! updates of the same task are last-write-wins.

pub mod memory;
pub mod postgres;

use async_trait::async_trait;
use uuid::Uuid;

use crate::error::AppError;
use crate::models::{NewUser, Task, User};

pub use memory::{MemoryTaskStore, MemoryUserStore};
pub use postgres::{PgTaskStore, PgUserStore};

#[async_trait]
pub trait TaskStore: Send + Sync {
    /// Persists a freshly built task and returns it as stored.
    async fn insert(&self, task: &Task) -> Result<Task, AppError>;

    /// All tasks owned by `owner_id`, newest first.
    async fn find_by_owner(&self, owner_id: Uuid) -> Result<Vec<Task>, AppError>;

    async fn find_by_id(&self, id: Uuid) -> Result<Option<Task>, AppError>;

    /// Overwrites the mutable fields (title, description, status, priority,
    /// due date, updated_at) of the task with `task.id`.
    /// Returns `None` if the task no longer exists.
    async fn update(&self, task: &Task) -> Result<Option<Task>, AppError>;

    /// Returns whether a task was removed.
    async fn delete(&self, id: Uuid) -> Result<bool, AppError>;
}

#[async_trait]
pub trait UserStore: Send + Sync {
    /// Fails with `AppError::Conflict` if the email is already registered.
    async fn create_user(&self, user: NewUser) -> Result<User, AppError>;

    /// Lookup by the lower-cased email.
    async fn find_by_email(&self, email: &str) -> Result<Option<User>, AppError>;

    async fn find_by_id(&self, id: Uuid) -> Result<Option<User>, AppError>;

    /// Returns `None` if the user does not exist.
    async fn update_name(&self, id: Uuid, name: &str) -> Result<Option<User>, AppError>;
}
