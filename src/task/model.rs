#![forbid(unsafe_code)]

use serde::{Deserialize, Serialize};
use time::Date;

use crate::error::TaskError;
use crate::task::date;

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Task {
    pub id: u64,
    pub title: String,
    #[serde(default)]
    pub done: bool,
    #[serde(
        default,
        with = "date::optional",
        skip_serializing_if = "Option::is_none"
    )]
    pub due: Option<Date>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tag: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub created_at: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub done_at: Option<String>,
}

impl Task {
    /// Not done and due strictly before `today`.
    #[must_use]
    pub fn is_overdue(&self, today: Date) -> bool {
        !self.done && self.due.is_some_and(|due| due < today)
    }

    #[must_use]
    pub fn is_due_on(&self, day: Date) -> bool {
        self.due == Some(day)
    }
}

/// Validated input for a task that has not been assigned an id yet.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewTask {
    title: String,
    due: Option<Date>,
    tag: Option<String>,
}

impl NewTask {
    pub fn new(title: &str, due: Option<&str>, tag: Option<&str>) -> Result<Self, TaskError> {
        if title.trim().is_empty() {
            return Err(TaskError::Validation("task title must not be empty".to_owned()));
        }
        let due = due.map(date::parse_date).transpose()?;
        let tag = tag
            .map(str::trim)
            .filter(|t| !t.is_empty())
            .map(str::to_owned);
        Ok(Self {
            title: title.to_owned(),
            due,
            tag,
        })
    }

    #[must_use]
    pub fn into_task(self, id: u64, created_at: String) -> Task {
        Task {
            id,
            title: self.title,
            done: false,
            due: self.due,
            tag: self.tag,
            created_at: Some(created_at),
            done_at: None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use time::macros::date;

    fn task(done: bool, due: Option<Date>) -> Task {
        Task {
            id: 1,
            title: "t".to_owned(),
            done,
            due,
            tag: None,
            created_at: None,
            done_at: None,
        }
    }

    #[test]
    fn new_task_requires_title() {
        assert!(matches!(
            NewTask::new("", None, None),
            Err(TaskError::Validation(_))
        ));
        assert!(matches!(
            NewTask::new("   ", None, None),
            Err(TaskError::Validation(_))
        ));
    }

    #[test]
    fn new_task_rejects_bad_due_date() {
        let err = NewTask::new("pay rent", Some("2024-02-30"), None).unwrap_err();
        assert!(err.to_string().contains("2024-02-30"));
    }

    #[test]
    fn blank_tag_is_dropped() {
        let t = NewTask::new("x", None, Some("  ")).unwrap();
        assert_eq!(t.into_task(1, "now".to_owned()).tag, None);
    }

    #[test]
    fn overdue_needs_past_due_and_not_done() {
        let today = date!(2024 - 12 - 02);
        assert!(task(false, Some(date!(2024 - 12 - 01))).is_overdue(today));
        assert!(!task(false, Some(today)).is_overdue(today));
        assert!(!task(true, Some(date!(2024 - 12 - 01))).is_overdue(today));
        assert!(!task(false, None).is_overdue(today));
    }

    #[test]
    fn absent_and_null_fields_deserialize_alike() {
        let a: Task = serde_json::from_str(r#"{"id":1,"title":"a"}"#).unwrap();
        let b: Task = serde_json::from_str(
            r#"{"id":1,"title":"a","done":false,"due":null,"tag":null,"created_at":null,"done_at":null}"#,
        )
        .unwrap();
        assert_eq!(a, b);
        assert_eq!(a.due, None);
        assert_eq!(a.tag, None);
    }
}
