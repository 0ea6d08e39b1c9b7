#![forbid(unsafe_code)]

//! Read-only views over a task collection.
//!
//! Everything here is pure: the caller passes the current date in, and
//! results keep the collection's insertion order.

use time::Date;

use crate::task::model::Task;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum StatusFilter {
    /// Not-done tasks only.
    #[default]
    Pending,
    All,
    Done,
}

/// Criteria for the `list` view. All set criteria must hold.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Filter {
    pub status: StatusFilter,
    /// Exact, case-sensitive tag match.
    pub tag: Option<String>,
    pub overdue: bool,
}

impl Filter {
    #[must_use]
    pub fn matches(&self, task: &Task, today: Date) -> bool {
        let status_ok = match self.status {
            StatusFilter::Pending => !task.done,
            StatusFilter::All => true,
            StatusFilter::Done => task.done,
        };
        status_ok
            && self
                .tag
                .as_deref()
                .is_none_or(|want| task.tag.as_deref() == Some(want))
            && (!self.overdue || task.is_overdue(today))
    }
}

#[must_use]
pub fn filter<'a>(tasks: &'a [Task], filter: &Filter, today: Date) -> Vec<&'a Task> {
    tasks.iter().filter(|t| filter.matches(t, today)).collect()
}

/// Tasks whose title contains `query`, ignoring case. Done tasks are included.
#[must_use]
pub fn search<'a>(tasks: &'a [Task], query: &str) -> Vec<&'a Task> {
    let needle = fold_case(query);
    tasks
        .iter()
        .filter(|t| fold_case(&t.title).contains(&needle))
        .collect()
}

/// Lowercase, plus the common characters whose case fold differs from
/// their lowercase form (`ß` folds to `ss`, final sigma to `σ`).
fn fold_case(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    for c in s.chars().flat_map(char::to_lowercase) {
        match c {
            'ß' => out.push_str("ss"),
            'ſ' => out.push('s'),
            'ς' => out.push('σ'),
            'ﬁ' => out.push_str("fi"),
            'ﬂ' => out.push_str("fl"),
            _ => out.push(c),
        }
    }
    out
}

/// Not-done tasks due exactly on `today`.
#[must_use]
pub fn due_today(tasks: &[Task], today: Date) -> Vec<&Task> {
    tasks
        .iter()
        .filter(|t| !t.done && t.is_due_on(today))
        .collect()
}
