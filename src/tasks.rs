//! Role-aware task store.
//!
//! The store owns the durable `tasks` collection and is the only writer.
//! Every mutation checks the access policy against the acting user and
//! writes through to storage immediately. Queries are filter predicates
//! over the in-memory collection loaded at startup.

use crate::error::Error;
use crate::policy;
use crate::storage::{Storage, TASKS_KEY};
use crate::users::{fresh_id, User, UserDirectory, UserId};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::rc::Rc;

pub type TaskId = i64;

/// Task progress state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum TaskStatus {
    #[default]
    Pending,
    InProgress,
    Completed,
}

impl TaskStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Pending => "pending",
            Self::InProgress => "in-progress",
            Self::Completed => "completed",
        }
    }

    pub fn from_str(s: &str) -> Option<Self> {
        match s {
            "pending" => Some(Self::Pending),
            "in-progress" | "in_progress" | "inprogress" => Some(Self::InProgress),
            "completed" | "done" => Some(Self::Completed),
            _ => None,
        }
    }

    pub fn icon(&self) -> &'static str {
        match self {
            Self::Pending => "[ ]",
            Self::InProgress => "[>]",
            Self::Completed => "[x]",
        }
    }

    /// The two-state toggle: completed goes back to pending, everything
    /// else (pending or in-progress) goes to completed. There is no toggle
    /// transition into in-progress; that state is only set explicitly.
    pub fn toggled(&self) -> Self {
        match self {
            Self::Completed => Self::Pending,
            Self::Pending | Self::InProgress => Self::Completed,
        }
    }
}

/// A stored task. `created_at` is set once and kept across updates.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Task {
    pub id: TaskId,
    pub title: String,
    #[serde(default)]
    pub description: String,
    pub status: TaskStatus,
    pub created_at: DateTime<Utc>,
    pub created_by: UserId,
    pub assigned_to: UserId,
}

/// Caller-supplied fields for a new task; id, creation time, and creator
/// are assigned by the store.
#[derive(Debug, Clone)]
pub struct TaskDraft {
    pub title: String,
    pub description: String,
    pub status: TaskStatus,
    pub assigned_to: UserId,
}

/// What `update` does when no task has the given id.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum UpdateMode {
    /// Silently drop the update (the original behavior).
    #[default]
    Lenient,
    /// Fail with a not-found error.
    Strict,
}

pub struct TaskStore {
    storage: Rc<dyn Storage>,
    tasks: Vec<Task>,
    update_mode: UpdateMode,
}

impl TaskStore {
    /// Load the task collection from storage.
    pub fn open(storage: Rc<dyn Storage>, update_mode: UpdateMode) -> anyhow::Result<Self> {
        let tasks = match storage.read(TASKS_KEY)? {
            Some(value) => serde_json::from_value(value)?,
            None => Vec::new(),
        };
        Ok(Self {
            storage,
            tasks,
            update_mode,
        })
    }

    /// Create a task. Admin only; the assignee must be a registered user.
    pub fn add(
        &mut self,
        draft: TaskDraft,
        actor: &User,
        directory: &UserDirectory,
    ) -> anyhow::Result<Task> {
        policy::authorize_create(actor)?;
        if !directory.contains(draft.assigned_to) {
            return Err(Error::validation("assignee", "no such user").into());
        }

        let task = Task {
            id: fresh_id(self.tasks.iter().map(|t| t.id)),
            title: draft.title,
            description: draft.description,
            status: draft.status,
            created_at: Utc::now(),
            created_by: actor.id,
            assigned_to: draft.assigned_to,
        };
        self.tasks.push(task.clone());
        self.persist()?;
        Ok(task)
    }

    /// Replace the stored task carrying `task.id`. Admin or assignee only.
    ///
    /// When no task has that id, lenient mode reports success without
    /// changing anything and strict mode fails with not-found. Either way
    /// the stored creation time is kept.
    pub fn update(
        &mut self,
        task: Task,
        actor: &User,
        directory: &UserDirectory,
    ) -> anyhow::Result<()> {
        policy::authorize_modify(actor, &task)?;
        if !directory.contains(task.assigned_to) {
            return Err(Error::validation("assignee", "no such user").into());
        }

        match self.tasks.iter().position(|t| t.id == task.id) {
            Some(pos) => {
                let created_at = self.tasks[pos].created_at;
                self.tasks[pos] = Task { created_at, ..task };
                self.persist()
            }
            None => match self.update_mode {
                UpdateMode::Lenient => Ok(()),
                UpdateMode::Strict => {
                    Err(Error::NotFound(format!("task {}", task.id)).into())
                }
            },
        }
    }

    /// Delete the task with `id`. Admin or assignee only.
    pub fn remove(&mut self, id: TaskId, actor: &User) -> anyhow::Result<Task> {
        let pos = self
            .tasks
            .iter()
            .position(|t| t.id == id)
            .ok_or_else(|| Error::NotFound(format!("task {}", id)))?;
        policy::authorize_modify(actor, &self.tasks[pos])?;

        let removed = self.tasks.remove(pos);
        self.persist()?;
        Ok(removed)
    }

    /// Flip the task's status (see [`TaskStatus::toggled`]). Same
    /// authorization and missing-id behavior as `update`.
    pub fn toggle_status(
        &mut self,
        task: &Task,
        actor: &User,
        directory: &UserDirectory,
    ) -> anyhow::Result<Task> {
        let mut updated = task.clone();
        updated.status = task.status.toggled();
        self.update(updated.clone(), actor, directory)?;
        Ok(updated)
    }

    pub fn get(&self, id: TaskId) -> Option<&Task> {
        self.tasks.iter().find(|t| t.id == id)
    }

    /// "My tasks" is asymmetric: an admin sees the tasks they authored,
    /// a regular user sees the tasks assigned to them.
    pub fn get_mine(&self, actor: &User) -> Vec<Task> {
        if actor.is_admin() {
            self.tasks
                .iter()
                .filter(|t| t.created_by == actor.id)
                .cloned()
                .collect()
        } else {
            self.get_assigned_to_me(actor)
        }
    }

    pub fn get_assigned_to_me(&self, actor: &User) -> Vec<Task> {
        self.tasks
            .iter()
            .filter(|t| t.assigned_to == actor.id)
            .cloned()
            .collect()
    }

    /// The whole collection for an admin, nothing for anyone else.
    pub fn get_all(&self, actor: &User) -> Vec<Task> {
        if policy::can_view_all(actor) {
            self.tasks.clone()
        } else {
            Vec::new()
        }
    }

    fn persist(&self) -> anyhow::Result<()> {
        self.storage
            .write(TASKS_KEY, &serde_json::to_value(&self.tasks)?)
    }
}
