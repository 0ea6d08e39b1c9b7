#![forbid(unsafe_code)]

use std::collections::HashSet;
use std::ffi::OsString;
use std::io::Write as _;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::error::TaskError;
use crate::task::date;
use crate::task::model::{NewTask, Task};

const FORMAT_VERSION: u32 = 1;

/// Returns one past the largest id in `tasks`, or 1 for an empty collection.
///
/// `None` when the largest id is `u64::MAX`.
#[must_use]
pub fn next_id(tasks: &[Task]) -> Option<u64> {
    max_id(tasks).checked_add(1)
}

fn max_id(tasks: &[Task]) -> u64 {
    tasks.iter().map(|t| t.id).max().unwrap_or(0)
}

/// The full task collection, in insertion order, plus the id high-water mark.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TaskList {
    tasks: Vec<Task>,
    last_id: u64,
}

impl TaskList {
    #[must_use]
    pub fn new(tasks: Vec<Task>) -> Self {
        let last_id = max_id(&tasks);
        Self { tasks, last_id }
    }

    #[must_use]
    pub fn tasks(&self) -> &[Task] {
        &self.tasks
    }

    /// Largest id ever handed out, including ids of deleted tasks.
    #[must_use]
    pub fn last_id(&self) -> u64 {
        self.last_id
    }

    pub fn is_empty(&self) -> bool {
        self.tasks.is_empty()
    }

    fn allocate_id(&mut self) -> Result<u64, TaskError> {
        let id = max_id(&self.tasks)
            .max(self.last_id)
            .checked_add(1)
            .ok_or(TaskError::IdsExhausted)?;
        self.last_id = id;
        Ok(id)
    }

    fn position(&self, id: u64) -> Option<usize> {
        self.tasks.iter().position(|t| t.id == id)
    }
}

/// Result of [`TaskStorage::load`].
#[derive(Debug, Clone)]
pub struct Loaded {
    pub list: TaskList,
    /// `false` when the backing file did not exist; it is created on first save.
    pub existed: bool,
}

#[derive(Serialize)]
struct DocumentOut<'a> {
    version: u32,
    last_id: u64,
    tasks: &'a [Task],
}

#[derive(Deserialize)]
struct DocumentIn {
    #[serde(default = "default_version")]
    version: u32,
    #[serde(default)]
    last_id: u64,
    tasks: Vec<Task>,
}

fn default_version() -> u32 {
    FORMAT_VERSION
}

/// Whole-file JSON persistence for a [`TaskList`].
#[derive(Debug, Clone)]
pub struct TaskStorage {
    path: PathBuf,
}

impl TaskStorage {
    #[must_use]
    pub fn new(path: PathBuf) -> Self {
        Self { path }
    }

    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn load(&self) -> Result<Loaded, TaskError> {
        let raw = match std::fs::read(&self.path) {
            Ok(raw) => raw,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                tracing::debug!(path = %self.path.display(), "task store absent, starting empty");
                return Ok(Loaded {
                    list: TaskList::default(),
                    existed: false,
                });
            }
            Err(source) => {
                return Err(TaskError::IoPath {
                    path: self.path.clone(),
                    source,
                });
            }
        };

        let list = self.parse(&raw)?;
        tracing::debug!(
            path = %self.path.display(),
            tasks = list.tasks.len(),
            last_id = list.last_id,
            "loaded task store"
        );
        Ok(Loaded {
            list,
            existed: true,
        })
    }

    /// Replaces the backing file with `list` via a temp file and rename.
    pub fn save(&self, list: &TaskList) -> Result<(), TaskError> {
        if let Some(parent) = self.path.parent()
            && !parent.as_os_str().is_empty()
        {
            std::fs::create_dir_all(parent).map_err(|source| TaskError::IoPath {
                path: parent.to_path_buf(),
                source,
            })?;
        }

        let doc = DocumentOut {
            version: FORMAT_VERSION,
            last_id: list.last_id,
            tasks: &list.tasks,
        };
        let mut data = serde_json::to_vec_pretty(&doc)?;
        data.push(b'\n');

        let tmp = self.tmp_path();
        let written = write_synced(&tmp, &data).and_then(|()| std::fs::rename(&tmp, &self.path));
        if let Err(source) = written {
            let _ = std::fs::remove_file(&tmp);
            return Err(TaskError::IoPath {
                path: self.path.clone(),
                source,
            });
        }

        tracing::debug!(
            path = %self.path.display(),
            tasks = list.tasks.len(),
            "saved task store"
        );
        Ok(())
    }

    fn parse(&self, raw: &[u8]) -> Result<TaskList, TaskError> {
        let corrupt = |reason: String| TaskError::CorruptStore {
            path: self.path.clone(),
            reason,
        };

        if raw.iter().all(u8::is_ascii_whitespace) {
            return Ok(TaskList::default());
        }

        let value: serde_json::Value =
            serde_json::from_slice(raw).map_err(|e| corrupt(format!("invalid JSON: {e}")))?;

        let (tasks, last_id) = match value {
            serde_json::Value::Array(_) => {
                let tasks: Vec<Task> = serde_json::from_value(value)
                    .map_err(|e| corrupt(format!("unexpected task entry: {e}")))?;
                (tasks, 0)
            }
            serde_json::Value::Object(_) => {
                let doc: DocumentIn = serde_json::from_value(value)
                    .map_err(|e| corrupt(format!("unexpected document shape: {e}")))?;
                if doc.version > FORMAT_VERSION {
                    return Err(corrupt(format!(
                        "unsupported format version {} (this build reads up to {FORMAT_VERSION})",
                        doc.version
                    )));
                }
                (doc.tasks, doc.last_id)
            }
            _ => return Err(corrupt("expected a list of tasks".to_owned())),
        };

        let mut seen = HashSet::with_capacity(tasks.len());
        for t in &tasks {
            if t.id == 0 {
                return Err(corrupt("task ids must be positive, found 0".to_owned()));
            }
            if !seen.insert(t.id) {
                return Err(corrupt(format!("duplicate task id {}", t.id)));
            }
        }

        let mut list = TaskList::new(tasks);
        list.last_id = list.last_id.max(last_id);
        Ok(list)
    }

    fn tmp_path(&self) -> PathBuf {
        let mut name = self
            .path
            .file_name()
            .map_or_else(|| OsString::from("tasks"), |n| n.to_os_string());
        name.push(".tmp");
        self.path.with_file_name(name)
    }
}

fn write_synced(path: &Path, data: &[u8]) -> std::io::Result<()> {
    let mut file = std::fs::File::create(path)?;
    file.write_all(data)?;
    file.sync_all()
}

/// Outcome of [`TaskStore::complete`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Completion {
    pub task: Task,
    /// `false` when the task was already done; nothing is written then.
    pub newly_done: bool,
}

/// A loaded task collection bound to its backing file.
///
/// Every mutating call persists the whole collection before updating the
/// in-memory copy, so a failed save leaves both untouched.
#[derive(Debug)]
pub struct TaskStore {
    storage: TaskStorage,
    list: TaskList,
}

impl TaskStore {
    pub fn open(storage: TaskStorage) -> Result<Self, TaskError> {
        let Loaded { list, .. } = storage.load()?;
        Ok(Self { storage, list })
    }

    #[must_use]
    pub fn list(&self) -> &TaskList {
        &self.list
    }

    #[must_use]
    pub fn tasks(&self) -> &[Task] {
        self.list.tasks()
    }

    pub fn add(&mut self, new: NewTask) -> Result<Task, TaskError> {
        let mut next = self.list.clone();
        let id = next.allocate_id()?;
        let task = new.into_task(id, date::now_rfc3339());
        next.tasks.push(task.clone());

        self.storage.save(&next)?;
        self.list = next;
        tracing::debug!(id, title = %task.title, "added task");
        Ok(task)
    }

    pub fn complete(&mut self, id: u64) -> Result<Completion, TaskError> {
        let idx = self.list.position(id).ok_or(TaskError::NotFound(id))?;
        if self.list.tasks[idx].done {
            tracing::debug!(id, "task already done");
            return Ok(Completion {
                task: self.list.tasks[idx].clone(),
                newly_done: false,
            });
        }

        let mut next = self.list.clone();
        let task = &mut next.tasks[idx];
        task.done = true;
        task.done_at = Some(date::now_rfc3339());
        let task = task.clone();

        self.storage.save(&next)?;
        self.list = next;
        tracing::debug!(id, "completed task");
        Ok(Completion {
            task,
            newly_done: true,
        })
    }

    /// Removes task `id` once `confirm` approves it.
    ///
    /// `confirm` is not called for an unknown id. A `false` answer yields
    /// [`TaskError::Cancelled`] and leaves the store untouched.
    pub fn delete<F>(&mut self, id: u64, confirm: F) -> Result<Task, TaskError>
    where
        F: FnOnce(&Task) -> bool,
    {
        let idx = self.list.position(id).ok_or(TaskError::NotFound(id))?;
        if !confirm(&self.list.tasks[idx]) {
            tracing::debug!(id, "delete declined");
            return Err(TaskError::Cancelled);
        }

        let mut next = self.list.clone();
        let removed = next.tasks.remove(idx);

        self.storage.save(&next)?;
        self.list = next;
        tracing::debug!(id, "deleted task");
        Ok(removed)
    }
}
