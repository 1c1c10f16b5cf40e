use std::fs::{self, File};
use std::io::{Read, Write};
use std::path::PathBuf;

use crate::models::Task;

/// The single fixed key of the persisted state: one JSON array of tasks.
const TASKS_FILE: &str = "tasks.json";

#[derive(Debug)]
pub enum StorageError {
    Io(std::io::Error),
    Json(serde_json::Error),
}

impl std::fmt::Display for StorageError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            StorageError::Io(err) => write!(f, "io error: {err}"),
            StorageError::Json(err) => write!(f, "json error: {err}"),
        }
    }
}

impl std::error::Error for StorageError {}

impl From<std::io::Error> for StorageError {
    fn from(value: std::io::Error) -> Self {
        StorageError::Io(value)
    }
}

impl From<serde_json::Error> for StorageError {
    fn from(value: serde_json::Error) -> Self {
        StorageError::Json(value)
    }
}

impl StorageError {
    /// True when loading failed only because no snapshot has been written yet.
    pub fn is_missing_snapshot(&self) -> bool {
        matches!(self, StorageError::Io(err) if err.kind() == std::io::ErrorKind::NotFound)
    }
}

pub struct Storage {
    root: PathBuf,
}

impl Storage {
    pub fn new(root: PathBuf) -> Self {
        Self { root }
    }

    pub fn ensure_dirs(&self) -> Result<(), StorageError> {
        fs::create_dir_all(&self.root)?;
        Ok(())
    }

    pub fn load_tasks(&self) -> Result<Vec<Task>, StorageError> {
        let mut file = File::open(self.root.join(TASKS_FILE))?;
        let mut buf = String::new();
        file.read_to_string(&mut buf)?;
        Ok(serde_json::from_str(&buf)?)
    }

    /// Overwrites the whole snapshot. The write goes through a temp file and a
    /// rename so a crash mid-write never leaves a truncated snapshot behind.
    pub fn save_tasks(&self, tasks: &[Task]) -> Result<(), StorageError> {
        let path = self.root.join(TASKS_FILE);
        let temp_path = path.with_extension("tmp");
        let json = serde_json::to_vec_pretty(&tasks)?;
        {
            let mut file = File::create(&temp_path)?;
            file.write_all(&json)?;
            file.sync_all()?;
        }
        fs::rename(temp_path, path)?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::reminder_time;
    use chrono::{TimeZone, Utc};

    fn make_task(id: &str) -> Task {
        let time = Utc.with_ymd_and_hms(2024, 3, 1, 12, 0, 0).unwrap();
        Task {
            id: id.to_string(),
            name: format!("task-{id}"),
            time,
            reminder_minutes: 10,
            reminder_time: reminder_time(time, 10),
            completed: false,
            created_at: Utc.with_ymd_and_hms(2024, 3, 1, 11, 0, 0).unwrap(),
        }
    }

    #[test]
    fn save_then_load_round_trips_the_collection() {
        let dir = tempfile::tempdir().unwrap();
        let storage = Storage::new(dir.path().to_path_buf());
        storage.ensure_dirs().unwrap();

        let tasks = vec![make_task("a"), make_task("b")];
        storage.save_tasks(&tasks).unwrap();

        let loaded = storage.load_tasks().unwrap();
        assert_eq!(loaded, tasks);
    }

    #[test]
    fn load_reports_missing_snapshot_distinctly() {
        let dir = tempfile::tempdir().unwrap();
        let storage = Storage::new(dir.path().to_path_buf());
        let err = storage.load_tasks().expect_err("no snapshot yet");
        assert!(err.is_missing_snapshot());
    }

    #[test]
    fn load_rejects_malformed_snapshot() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("tasks.json"), b"{ not json").unwrap();
        let storage = Storage::new(dir.path().to_path_buf());
        let err = storage.load_tasks().expect_err("snapshot is corrupt");
        assert!(matches!(err, StorageError::Json(_)));
        assert!(!err.is_missing_snapshot());
    }

    #[test]
    fn save_leaves_no_temp_file_behind() {
        let dir = tempfile::tempdir().unwrap();
        let storage = Storage::new(dir.path().to_path_buf());
        storage.save_tasks(&[make_task("a")]).unwrap();
        assert!(dir.path().join("tasks.json").is_file());
        assert!(!dir.path().join("tasks.tmp").exists());
    }
}
