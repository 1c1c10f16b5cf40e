use std::sync::{Arc, Mutex};

use chrono::{DateTime, Utc};

use crate::models::{reminder_time, Task, TaskDraft};
use crate::storage::{Storage, StorageError};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ValidationError {
    EmptyName,
    MissingTime,
    PastTime,
}

impl std::fmt::Display for ValidationError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ValidationError::EmptyName => write!(f, "task name is empty"),
            ValidationError::MissingTime => write!(f, "task time is missing"),
            ValidationError::PastTime => write!(f, "task time is not in the future"),
        }
    }
}

impl std::error::Error for ValidationError {}

#[derive(Debug)]
pub enum StoreError {
    Validation(ValidationError),
    NotFound(String),
    Storage(StorageError),
}

impl std::fmt::Display for StoreError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            StoreError::Validation(err) => write!(f, "{err}"),
            StoreError::NotFound(id) => write!(f, "task not found: {id}"),
            StoreError::Storage(err) => write!(f, "storage error: {err}"),
        }
    }
}

impl std::error::Error for StoreError {}

impl From<ValidationError> for StoreError {
    fn from(value: ValidationError) -> Self {
        StoreError::Validation(value)
    }
}

impl From<StorageError> for StoreError {
    fn from(value: StorageError) -> Self {
        StoreError::Storage(value)
    }
}

/// The authoritative task collection. The store is the single writer: every
/// mutation validates, updates the in-memory list, and synchronously
/// overwrites the on-disk snapshot before returning.
#[derive(Clone)]
pub struct TaskStore {
    inner: Arc<Mutex<StoreData>>,
}

struct StoreData {
    tasks: Vec<Task>,
    storage: Storage,
}

impl TaskStore {
    /// Restores the last persisted snapshot. A missing snapshot is normal
    /// (first launch); a corrupt one is logged and treated as "no data".
    pub fn open(storage: Storage) -> Self {
        let tasks = match storage.load_tasks() {
            Ok(tasks) => tasks,
            Err(error) if error.is_missing_snapshot() => Vec::new(),
            Err(error) => {
                log::warn!("task snapshot unreadable, starting empty: {error}");
                Vec::new()
            }
        };
        Self {
            inner: Arc::new(Mutex::new(StoreData { tasks, storage })),
        }
    }

    /// All tasks in insertion order. Display sorting is the consumer's concern.
    pub fn list(&self) -> Vec<Task> {
        let guard = self.inner.lock().expect("store poisoned");
        guard.tasks.clone()
    }

    pub fn get(&self, id: &str) -> Option<Task> {
        let guard = self.inner.lock().expect("store poisoned");
        guard.tasks.iter().find(|task| task.id == id).cloned()
    }

    pub fn add(&self, draft: &TaskDraft) -> Result<Task, StoreError> {
        self.add_at(draft, Utc::now())
    }

    pub fn add_at(&self, draft: &TaskDraft, now: DateTime<Utc>) -> Result<Task, StoreError> {
        let time = validate(draft, now)?;
        let mut guard = self.inner.lock().expect("store poisoned");
        let task = Task {
            id: next_id(&guard.tasks, now),
            name: draft.name.clone(),
            time,
            reminder_minutes: draft.reminder_minutes,
            reminder_time: reminder_time(time, draft.reminder_minutes),
            completed: false,
            created_at: now,
        };
        guard.tasks.push(task.clone());
        guard.storage.save_tasks(&guard.tasks)?;
        Ok(task)
    }

    pub fn update(&self, id: &str, draft: &TaskDraft) -> Result<Task, StoreError> {
        self.update_at(id, draft, Utc::now())
    }

    /// Replaces the mutable fields and recomputes the reminder instant;
    /// `id`, `completed` and `created_at` are preserved.
    pub fn update_at(
        &self,
        id: &str,
        draft: &TaskDraft,
        now: DateTime<Utc>,
    ) -> Result<Task, StoreError> {
        let time = validate(draft, now)?;
        let mut guard = self.inner.lock().expect("store poisoned");
        let task = match guard.tasks.iter_mut().find(|task| task.id == id) {
            Some(task) => {
                task.name = draft.name.clone();
                task.time = time;
                task.reminder_minutes = draft.reminder_minutes;
                task.reminder_time = reminder_time(time, draft.reminder_minutes);
                task.clone()
            }
            None => return Err(StoreError::NotFound(id.to_string())),
        };
        guard.storage.save_tasks(&guard.tasks)?;
        Ok(task)
    }

    pub fn toggle_completed(&self, id: &str) -> Result<Task, StoreError> {
        let mut guard = self.inner.lock().expect("store poisoned");
        let task = match guard.tasks.iter_mut().find(|task| task.id == id) {
            Some(task) => {
                task.completed = !task.completed;
                task.clone()
            }
            None => return Err(StoreError::NotFound(id.to_string())),
        };
        guard.storage.save_tasks(&guard.tasks)?;
        Ok(task)
    }

    pub fn delete(&self, id: &str) -> Result<(), StoreError> {
        let mut guard = self.inner.lock().expect("store poisoned");
        let index = match guard.tasks.iter().position(|task| task.id == id) {
            Some(index) => index,
            None => return Err(StoreError::NotFound(id.to_string())),
        };
        guard.tasks.remove(index);
        guard.storage.save_tasks(&guard.tasks)?;
        Ok(())
    }
}

fn validate(draft: &TaskDraft, now: DateTime<Utc>) -> Result<DateTime<Utc>, ValidationError> {
    if draft.name.trim().is_empty() {
        return Err(ValidationError::EmptyName);
    }
    let time = draft.time.ok_or(ValidationError::MissingTime)?;
    if time <= now {
        return Err(ValidationError::PastTime);
    }
    Ok(time)
}

/// Ids are the creation instant in milliseconds, bumped until unique so two
/// tasks created within the same millisecond never collide.
fn next_id(tasks: &[Task], now: DateTime<Utc>) -> String {
    let mut millis = now.timestamp_millis();
    loop {
        let candidate = millis.to_string();
        if tasks.iter().all(|task| task.id != candidate) {
            return candidate;
        }
        millis += 1;
    }
}
