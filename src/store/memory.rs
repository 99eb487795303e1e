use async_trait::async_trait;
use chrono::Utc;
use std::collections::HashMap;
use tokio::sync::RwLock;
use uuid::Uuid;

use super::{TaskStore, UserStore};
use crate::error::AppError;
use crate::models::{NewUser, Task, User};

/// Process-local task storage, used by the test suite and by runs without
/// `DATABASE_URL`. Keyed by task id; each row remembers its insertion order so
/// tasks created within the same instant still list newest first.
#[derive(Debug, Default)]
pub struct MemoryTaskStore {
    table: RwLock<TaskTable>,
}

#[derive(Debug, Default)]
struct TaskTable {
    next_seq: u64,
    rows: HashMap<Uuid, (u64, Task)>,
}

impl MemoryTaskStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl TaskStore for MemoryTaskStore {
    async fn insert(&self, task: &Task) -> Result<Task, AppError> {
        let mut table = self.table.write().await;
        if table.rows.contains_key(&task.id) {
            return Err(AppError::Conflict("Duplicate field value".into()));
        }
        let seq = table.next_seq;
        table.next_seq += 1;
        table.rows.insert(task.id, (seq, task.clone()));
        Ok(task.clone())
    }

    async fn find_by_owner(&self, owner_id: Uuid) -> Result<Vec<Task>, AppError> {
        let table = self.table.read().await;
        let mut owned: Vec<&(u64, Task)> = table
            .rows
            .values()
            .filter(|(_, t)| t.owner_id == owner_id)
            .collect();
        owned.sort_by(|(a_seq, a), (b_seq, b)| {
            b.created_at.cmp(&a.created_at).then(b_seq.cmp(a_seq))
        });
        Ok(owned.into_iter().map(|(_, t)| t.clone()).collect())
    }

    async fn find_by_id(&self, id: Uuid) -> Result<Option<Task>, AppError> {
        let table = self.table.read().await;
        Ok(table.rows.get(&id).map(|(_, t)| t.clone()))
    }

    async fn update(&self, task: &Task) -> Result<Option<Task>, AppError> {
        let mut table = self.table.write().await;
        let Some((_, stored)) = table.rows.get_mut(&task.id) else {
            return Ok(None);
        };
        stored.title = task.title.clone();
        stored.description = task.description.clone();
        stored.status = task.status;
        stored.priority = task.priority;
        stored.due_date = task.due_date;
        stored.updated_at = task.updated_at;
        Ok(Some(stored.clone()))
    }

    async fn delete(&self, id: Uuid) -> Result<bool, AppError> {
        let mut table = self.table.write().await;
        Ok(table.rows.remove(&id).is_some())
    }
}

/// Process-local user storage, keyed by user id.
#[derive(Debug, Default)]
pub struct MemoryUserStore {
    users: RwLock<HashMap<Uuid, User>>,
}

impl MemoryUserStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl UserStore for MemoryUserStore {
    async fn create_user(&self, user: NewUser) -> Result<User, AppError> {
        let mut users = self.users.write().await;
        if users.values().any(|u| u.email.eq_ignore_ascii_case(&user.email)) {
            return Err(AppError::Conflict("User already exists".into()));
        }
        let user = User::new(user, Utc::now());
        users.insert(user.id, user.clone());
        Ok(user)
    }

    async fn find_by_email(&self, email: &str) -> Result<Option<User>, AppError> {
        let users = self.users.read().await;
        Ok(users.values().find(|u| u.email.eq_ignore_ascii_case(email)).cloned())
    }

    async fn find_by_id(&self, id: Uuid) -> Result<Option<User>, AppError> {
        let users = self.users.read().await;
        Ok(users.get(&id).cloned())
    }

    async fn update_name(&self, id: Uuid, name: &str) -> Result<Option<User>, AppError> {
        let mut users = self.users.write().await;
        Ok(users.get_mut(&id).map(|u| {
            u.name = name.to_string();
            u.clone()
        }))
    }
}
