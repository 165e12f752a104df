//! Key-value storage backing the user directory, session, and task store.
//!
//! The store is an explicit dependency handed to each component at
//! construction, not ambient global state. Each key holds one JSON document;
//! the file-backed implementation keeps one `<key>.json` per key under the
//! data directory, and the in-memory implementation backs the tests.

use anyhow::Result;
use serde_json::Value;
use std::cell::RefCell;
use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};

/// Storage key for the registered user list.
pub const USERS_KEY: &str = "users";
/// Storage key for the encoded admin password.
pub const ADMIN_PASSWORD_KEY: &str = "admin_password";
/// Storage key for the active session record.
pub const CURRENT_USER_KEY: &str = "current_user";
/// Storage key for the task collection.
pub const TASKS_KEY: &str = "tasks";

/// A durable key-value store of JSON documents.
pub trait Storage {
    /// Read the document under `key`, or `None` if the key is absent.
    fn read(&self, key: &str) -> Result<Option<Value>>;
    /// Write the document under `key`, replacing any prior value.
    fn write(&self, key: &str, value: &Value) -> Result<()>;
    /// Remove `key`. Removing an absent key is a no-op.
    fn remove(&self, key: &str) -> Result<()>;
}

/// File-backed storage: one pretty-printed JSON file per key.
pub struct FileStorage {
    dir: PathBuf,
}

impl FileStorage {
    /// Open (creating if needed) a storage directory.
    pub fn open(dir: &Path) -> Result<Self> {
        fs::create_dir_all(dir)?;
        Ok(Self {
            dir: dir.to_path_buf(),
        })
    }

    fn key_path(&self, key: &str) -> PathBuf {
        self.dir.join(format!("{}.json", key))
    }
}

impl Storage for FileStorage {
    fn read(&self, key: &str) -> Result<Option<Value>> {
        let path = self.key_path(key);
        if !path.exists() {
            return Ok(None);
        }
        let content = fs::read_to_string(&path)?;
        let value = serde_json::from_str(&content)?;
        Ok(Some(value))
    }

    fn write(&self, key: &str, value: &Value) -> Result<()> {
        let path = self.key_path(key);
        fs::write(&path, serde_json::to_string_pretty(value)?)?;
        Ok(())
    }

    fn remove(&self, key: &str) -> Result<()> {
        let path = self.key_path(key);
        if path.exists() {
            fs::remove_file(&path)?;
        }
        Ok(())
    }
}

/// In-memory storage for tests and dry runs.
#[derive(Default)]
pub struct MemoryStorage {
    entries: RefCell<HashMap<String, Value>>,
}

impl MemoryStorage {
    pub fn new() -> Self {
        Self::default()
    }
}

impl Storage for MemoryStorage {
    fn read(&self, key: &str) -> Result<Option<Value>> {
        Ok(self.entries.borrow().get(key).cloned())
    }

    fn write(&self, key: &str, value: &Value) -> Result<()> {
        self.entries
            .borrow_mut()
            .insert(key.to_string(), value.clone());
        Ok(())
    }

    fn remove(&self, key: &str) -> Result<()> {
        self.entries.borrow_mut().remove(key);
        Ok(())
    }
}
