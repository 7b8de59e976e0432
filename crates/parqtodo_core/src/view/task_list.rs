//! Task list view model with optimistic updates and rollback.

use crate::bridge::{BridgeError, BridgeResult, TaskStore};
use crate::model::task::{normalize_title, Task, TaskId};
use log::debug;

/// Placeholder line rendered when there are no tasks.
pub const EMPTY_PLACEHOLDER: &str = "Empty task";
const HEADING: &str = "My Tasks";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Theme {
    #[default]
    Light,
    Dark,
}

impl Theme {
    pub fn toggled(self) -> Self {
        match self {
            Self::Light => Self::Dark,
            Self::Dark => Self::Light,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Light => "light",
            Self::Dark => "dark",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ViewStatus {
    Loading,
    Ready,
    /// The store could not be initialized or loaded.
    Unavailable(String),
}

/// Local change applied before the store answered, with what is needed to undo it.
#[derive(Debug)]
enum PendingOp {
    Edit { index: usize, previous: Task },
    Toggle { index: usize, previous: Task },
    Delete { index: usize, task: Task },
    Clear { previous: Vec<Task> },
}

#[derive(Debug)]
pub struct TaskListView {
    tasks: Vec<Task>,
    theme: Theme,
    status: ViewStatus,
    last_error: Option<String>,
    pending: Option<PendingOp>,
}

impl Default for TaskListView {
    fn default() -> Self {
        Self::new()
    }
}

impl TaskListView {
    pub fn new() -> Self {
        Self {
            tasks: Vec::new(),
            theme: Theme::default(),
            status: ViewStatus::Loading,
            last_error: None,
            pending: None,
        }
    }

    pub fn tasks(&self) -> &[Task] {
        &self.tasks
    }

    pub fn theme(&self) -> Theme {
        self.theme
    }

    pub fn status(&self) -> &ViewStatus {
        &self.status
    }

    pub fn last_error(&self) -> Option<&str> {
        self.last_error.as_deref()
    }

    pub fn remaining_count(&self) -> usize {
        self.tasks.iter().filter(|task| task.is_remaining()).count()
    }

    pub fn completed_count(&self) -> usize {
        self.tasks.len() - self.remaining_count()
    }

    pub fn toggle_theme(&mut self) -> Theme {
        self.theme = self.theme.toggled();
        self.theme
    }

    /// Records that the store will never become usable.
    pub fn mark_unavailable(&mut self, reason: impl Into<String>) {
        self.status = ViewStatus::Unavailable(reason.into());
    }

    /// Replaces the list with the store contents.
    pub fn load<S: TaskStore + ?Sized>(&mut self, store: &S) -> BridgeResult<()> {
        match store.load_tasks() {
            Ok(tasks) => {
                self.tasks = tasks;
                self.status = ViewStatus::Ready;
                self.last_error = None;
                Ok(())
            }
            Err(err) => {
                self.status = ViewStatus::Unavailable(err.to_string());
                Err(err)
            }
        }
    }

    /// Appends the task created by the store. The id is only known afterwards.
    pub fn add<S: TaskStore + ?Sized>(&mut self, store: &S, title: &str) -> BridgeResult<Task> {
        let created = self.settle(store.add(title))?;
        self.tasks.push(created.clone());
        Ok(created)
    }

    pub fn edit<S: TaskStore + ?Sized>(
        &mut self,
        store: &S,
        id: TaskId,
        title: &str,
    ) -> BridgeResult<()> {
        let normalized = match normalize_title(title) {
            Ok(normalized) => normalized,
            Err(err) => return self.settle(Err(BridgeError::from(err))),
        };
        if let Some(index) = self.position(id) {
            let previous = self.tasks[index].clone();
            self.tasks[index].title = normalized;
            self.pending = Some(PendingOp::Edit { index, previous });
        }
        let updated = self.settle(store.edit(id, title))?;
        self.replace(updated);
        Ok(())
    }

    pub fn delete<S: TaskStore + ?Sized>(&mut self, store: &S, id: TaskId) -> BridgeResult<()> {
        if let Some(index) = self.position(id) {
            let task = self.tasks.remove(index);
            self.pending = Some(PendingOp::Delete { index, task });
        }
        self.settle(store.delete(id))
    }

    pub fn toggle_completed<S: TaskStore + ?Sized>(
        &mut self,
        store: &S,
        id: TaskId,
    ) -> BridgeResult<()> {
        if let Some(index) = self.position(id) {
            let previous = self.tasks[index].clone();
            self.tasks[index].completed = !previous.completed;
            self.pending = Some(PendingOp::Toggle { index, previous });
        }
        let updated = self.settle(store.toggle_completed(id))?;
        self.replace(updated);
        Ok(())
    }

    /// Removes every task. Returns the count reported by the store.
    pub fn clear<S: TaskStore + ?Sized>(&mut self, store: &S) -> BridgeResult<usize> {
        let previous = std::mem::take(&mut self.tasks);
        self.pending = Some(PendingOp::Clear { previous });
        self.settle(store.clear())
    }

    /// Plain text screen: heading, counter, then tasks or the placeholder.
    pub fn render_lines(&self) -> Vec<String> {
        let mut lines = vec![
            HEADING.to_string(),
            format!("{} tasks left", self.remaining_count()),
        ];
        match &self.status {
            ViewStatus::Loading => lines.push("loading...".to_string()),
            ViewStatus::Unavailable(reason) => lines.push(format!("unavailable: {reason}")),
            ViewStatus::Ready => {}
        }
        if self.tasks.is_empty() {
            lines.push(EMPTY_PLACEHOLDER.to_string());
        } else {
            lines.extend(self.tasks.iter().map(|task| {
                let mark = if task.completed { 'x' } else { ' ' };
                format!("[{mark}] {}  #{}", task.title, task.id)
            }));
        }
        if let Some(err) = &self.last_error {
            lines.push(format!("error: {err}"));
        }
        lines
    }

    fn position(&self, id: TaskId) -> Option<usize> {
        self.tasks.iter().position(|task| task.id == id)
    }

    fn replace(&mut self, task: Task) {
        match self.position(task.id) {
            Some(index) => self.tasks[index] = task,
            None => self.tasks.push(task),
        }
    }

    fn settle<T>(&mut self, result: BridgeResult<T>) -> BridgeResult<T> {
        let pending = self.pending.take();
        match result {
            Ok(value) => {
                self.last_error = None;
                Ok(value)
            }
            Err(err) => {
                if let Some(op) = pending {
                    self.rollback(op);
                }
                debug!(
                    "event=view_rollback module=view status=error error_code={}",
                    err.code()
                );
                self.last_error = Some(err.to_string());
                Err(err)
            }
        }
    }

    fn rollback(&mut self, op: PendingOp) {
        match op {
            PendingOp::Edit { index, previous } | PendingOp::Toggle { index, previous } => {
                if let Some(slot) = self.tasks.get_mut(index) {
                    *slot = previous;
                }
            }
            PendingOp::Delete { index, task } => {
                let index = index.min(self.tasks.len());
                self.tasks.insert(index, task);
            }
            PendingOp::Clear { previous } => self.tasks = previous,
        }
    }
}
