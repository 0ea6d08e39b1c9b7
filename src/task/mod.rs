#![forbid(unsafe_code)]

pub mod date;
pub mod model;
pub mod query;
pub mod storage;

pub use model::{NewTask, Task};
pub use query::{Filter, StatusFilter};
pub use storage::{Completion, TaskList, TaskStorage, TaskStore};
