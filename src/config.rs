//! TOML configuration.
//!
//! Priority: project (./.taskdeck/config.toml) > user (~/.taskdeck/config.toml)
//! > built-in defaults. Files may set any subset of keys; later files
//! override earlier ones field by field.

use crate::tasks::UpdateMode;
use crate::users::validate_password;
use anyhow::Result;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// A validation error in the configuration
#[derive(Debug, Clone)]
pub struct ConfigError {
    pub field: String,
    pub message: String,
}

impl std::fmt::Display for ConfigError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "[{}]: {}", self.field, self.message)
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct Config {
    /// Where the JSON storage keys live. Defaults to ~/.taskdeck/data.
    pub data_dir: Option<PathBuf>,
    /// Credentials for the bootstrapped admin account.
    pub admin_email: String,
    pub admin_password: String,
    /// Fail updates that reference a missing task id instead of silently
    /// dropping them.
    pub strict_updates: bool,
    /// Write the JSONL audit log.
    pub audit: bool,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            data_dir: None,
            admin_email: "admin@example.com".to_string(),
            admin_password: "Admin123".to_string(),
            strict_updates: false,
            audit: true,
        }
    }
}

/// A partial config as read from one file.
#[derive(Debug, Clone, Default, Deserialize)]
struct ConfigOverlay {
    data_dir: Option<PathBuf>,
    admin_email: Option<String>,
    admin_password: Option<String>,
    strict_updates: Option<bool>,
    audit: Option<bool>,
}

impl Config {
    /// Load configuration from default paths, user level first so the
    /// project file wins.
    pub fn load() -> Result<Self> {
        let mut config = Self::default();

        if let Some(home) = dirs::home_dir() {
            let user_config = home.join(".taskdeck").join("config.toml");
            if user_config.exists() {
                config.apply(read_overlay(&user_config)?);
            }
        }

        let project_config = Path::new(".taskdeck").join("config.toml");
        if project_config.exists() {
            config.apply(read_overlay(&project_config)?);
        }

        Ok(config)
    }

    /// Load configuration from a specific path over the defaults.
    pub fn load_from(path: &Path) -> Result<Self> {
        let mut config = Self::default();
        config.apply(read_overlay(path)?);
        Ok(config)
    }

    fn apply(&mut self, overlay: ConfigOverlay) {
        if let Some(dir) = overlay.data_dir {
            self.data_dir = Some(dir);
        }
        if let Some(email) = overlay.admin_email {
            self.admin_email = email;
        }
        if let Some(password) = overlay.admin_password {
            self.admin_password = password;
        }
        if let Some(strict) = overlay.strict_updates {
            self.strict_updates = strict;
        }
        if let Some(audit) = overlay.audit {
            self.audit = audit;
        }
    }

    /// Check the configuration, returning all problems found.
    pub fn validate(&self) -> std::result::Result<(), Vec<ConfigError>> {
        let mut errors = Vec::new();

        if !self.admin_email.contains('@') {
            errors.push(ConfigError {
                field: "admin_email".to_string(),
                message: "must be a valid email address".to_string(),
            });
        }
        if let Err(e) = validate_password(&self.admin_password) {
            errors.push(ConfigError {
                field: "admin_password".to_string(),
                message: e.to_string(),
            });
        }

        if errors.is_empty() {
            Ok(())
        } else {
            Err(errors)
        }
    }

    pub fn update_mode(&self) -> UpdateMode {
        if self.strict_updates {
            UpdateMode::Strict
        } else {
            UpdateMode::Lenient
        }
    }

    /// The effective data directory.
    pub fn resolve_data_dir(&self) -> Result<PathBuf> {
        if let Some(dir) = &self.data_dir {
            return Ok(dir.clone());
        }
        let home = dirs::home_dir()
            .ok_or_else(|| anyhow::anyhow!("cannot determine home directory"))?;
        Ok(home.join(".taskdeck").join("data"))
    }
}

fn read_overlay(path: &Path) -> Result<ConfigOverlay> {
    let content = std::fs::read_to_string(path)?;
    let overlay = toml::from_str(&content)?;
    Ok(overlay)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_defaults_validate() {
        let config = Config::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.update_mode(), UpdateMode::Lenient);
        assert!(config.audit);
    }

    #[test]
    fn test_validate_bad_admin_credentials() {
        let mut config = Config::default();
        config.admin_email = "not-an-email".to_string();
        config.admin_password = "weak".to_string();
        let errors = config.validate().unwrap_err();
        assert_eq!(errors.len(), 2);
        assert!(errors[0].field.contains("admin_email"));
        assert!(errors[1].field.contains("admin_password"));
    }

    #[test]
    fn test_load_from_overlays_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        let mut file = std::fs::File::create(&path).unwrap();
        writeln!(file, "strict_updates = true").unwrap();
        writeln!(file, "data_dir = \"/tmp/taskdeck-test\"").unwrap();

        let config = Config::load_from(&path).unwrap();
        assert_eq!(config.update_mode(), UpdateMode::Strict);
        assert_eq!(config.data_dir, Some(PathBuf::from("/tmp/taskdeck-test")));
        // Untouched keys keep their defaults.
        assert_eq!(config.admin_email, "admin@example.com");
    }

    #[test]
    fn test_wrong_value_type_in_overlay_is_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        std::fs::write(&path, "strict_updates = \"yes\"").unwrap();
        assert!(Config::load_from(&path).is_err());
    }
}
