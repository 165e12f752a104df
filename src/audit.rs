//! Append-only JSONL audit log of account and task events.

use anyhow::Result;
use chrono::{DateTime, Utc};
use serde::Serialize;
use std::fs::{File, OpenOptions};
use std::io::Write;
use std::path::{Path, PathBuf};

use crate::tasks::{Task, TaskId};
use crate::users::UserId;

pub struct AuditLog {
    pub path: PathBuf,
    file: File,
}

#[derive(Serialize)]
struct Event<'a> {
    ts: DateTime<Utc>,
    #[serde(rename = "type")]
    event_type: &'a str,
    #[serde(flatten)]
    data: serde_json::Value,
}

impl AuditLog {
    pub fn open(path: &Path) -> Result<Self> {
        let file = OpenOptions::new().create(true).append(true).open(path)?;
        Ok(Self {
            path: path.to_path_buf(),
            file,
        })
    }

    fn log(&mut self, event_type: &str, data: serde_json::Value) -> Result<()> {
        let event = Event {
            ts: Utc::now(),
            event_type,
            data,
        };
        let line = serde_json::to_string(&event)?;
        writeln!(self.file, "{}", line)?;
        self.file.flush()?;
        Ok(())
    }

    pub fn user_registered(&mut self, id: UserId, email: &str) -> Result<()> {
        self.log(
            "user_registered",
            serde_json::json!({ "id": id, "email": email }),
        )
    }

    pub fn login_ok(&mut self, id: UserId, email: &str) -> Result<()> {
        self.log("login_ok", serde_json::json!({ "id": id, "email": email }))
    }

    pub fn login_failed(&mut self, email: &str) -> Result<()> {
        self.log("login_failed", serde_json::json!({ "email": email }))
    }

    pub fn logout(&mut self, id: UserId) -> Result<()> {
        self.log("logout", serde_json::json!({ "id": id }))
    }

    pub fn task_added(&mut self, task: &Task) -> Result<()> {
        self.log(
            "task_added",
            serde_json::json!({
                "id": task.id,
                "title": task.title,
                "assigned_to": task.assigned_to,
            }),
        )
    }

    pub fn task_updated(&mut self, id: TaskId, actor: UserId) -> Result<()> {
        self.log(
            "task_updated",
            serde_json::json!({ "id": id, "actor": actor }),
        )
    }

    pub fn task_removed(&mut self, id: TaskId, actor: UserId) -> Result<()> {
        self.log(
            "task_removed",
            serde_json::json!({ "id": id, "actor": actor }),
        )
    }

    pub fn task_toggled(&mut self, id: TaskId, status: &str, actor: UserId) -> Result<()> {
        self.log(
            "task_toggled",
            serde_json::json!({ "id": id, "status": status, "actor": actor }),
        )
    }

    pub fn denied(&mut self, operation: &str, reason: &str) -> Result<()> {
        self.log(
            "denied",
            serde_json::json!({ "operation": operation, "reason": reason }),
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_events_append_as_jsonl() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("audit.log");
        let mut log = AuditLog::open(&path).unwrap();
        log.login_ok(7, "u@example.com").unwrap();
        log.denied("add", "only an admin can create tasks").unwrap();

        let content = std::fs::read_to_string(&path).unwrap();
        let lines: Vec<&str> = content.lines().collect();
        assert_eq!(lines.len(), 2);

        let first: serde_json::Value = serde_json::from_str(lines[0]).unwrap();
        assert_eq!(first["type"], "login_ok");
        assert_eq!(first["id"], 7);
        assert!(first["ts"].is_string());

        let second: serde_json::Value = serde_json::from_str(lines[1]).unwrap();
        assert_eq!(second["type"], "denied");
        assert_eq!(second["operation"], "add");
    }
}
