//! User directory: registered accounts plus the bootstrapped admin.
//!
//! The directory owns the durable `users` collection. Passwords are stored
//! base64-encoded (reversible by design, not hashed); the admin password
//! lives under its own storage key and the admin record carries none.

use crate::error::Error;
use crate::storage::{Storage, ADMIN_PASSWORD_KEY, USERS_KEY};
use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use chrono::Utc;
use serde::{Deserialize, Serialize};
use std::rc::Rc;

pub type UserId = i64;

/// Id of the bootstrapped admin account.
pub const ADMIN_ID: UserId = 1;
/// Display name of the bootstrapped admin account.
pub const ADMIN_NAME: &str = "Admin User";

/// Account role. Exactly one admin exists per installation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    Admin,
    #[default]
    User,
}

impl Role {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Admin => "admin",
            Self::User => "user",
        }
    }
}

/// A registered account.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct User {
    pub id: UserId,
    pub name: String,
    pub email: String,
    pub role: Role,
    /// Base64-encoded password; absent for the admin record.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub password: Option<String>,
}

impl User {
    pub fn is_admin(&self) -> bool {
        self.role == Role::Admin
    }

    /// Copy safe to hand to callers and the session: password cleared.
    pub fn without_password(&self) -> User {
        User {
            password: None,
            ..self.clone()
        }
    }
}

/// Allocate a creation-timestamp-derived id, bumped past the existing
/// maximum so two records created in the same millisecond stay distinct.
pub(crate) fn fresh_id(existing: impl IntoIterator<Item = i64>) -> i64 {
    let max = existing.into_iter().max().unwrap_or(0);
    Utc::now().timestamp_millis().max(max + 1)
}

pub(crate) fn encode_password(raw: &str) -> String {
    STANDARD.encode(raw)
}

/// Registration password policy: at least 6 characters, at least one
/// capital letter. Exactly this rule set.
pub fn validate_password(password: &str) -> Result<(), Error> {
    if password.len() < 6 {
        return Err(Error::validation(
            "password",
            "must be at least 6 characters",
        ));
    }
    if !password.chars().any(|c| c.is_ascii_uppercase()) {
        return Err(Error::validation(
            "password",
            "must contain at least one capital letter",
        ));
    }
    Ok(())
}

/// The durable set of accounts.
pub struct UserDirectory {
    storage: Rc<dyn Storage>,
    users: Vec<User>,
    admin_email: String,
}

impl UserDirectory {
    /// Open the directory, bootstrapping the admin account on first run.
    ///
    /// Bootstrap is idempotent: if the `users` key already exists nothing
    /// is written, whatever it contains.
    pub fn open(
        storage: Rc<dyn Storage>,
        admin_email: &str,
        admin_password: &str,
    ) -> anyhow::Result<Self> {
        let users = match storage.read(USERS_KEY)? {
            Some(value) => serde_json::from_value(value)?,
            None => {
                let admin = User {
                    id: ADMIN_ID,
                    name: ADMIN_NAME.to_string(),
                    email: admin_email.to_string(),
                    role: Role::Admin,
                    password: None,
                };
                let users = vec![admin];
                storage.write(USERS_KEY, &serde_json::to_value(&users)?)?;
                storage.write(
                    ADMIN_PASSWORD_KEY,
                    &serde_json::to_value(encode_password(admin_password))?,
                )?;
                users
            }
        };

        Ok(Self {
            storage,
            users,
            admin_email: admin_email.to_string(),
        })
    }

    /// Register a new regular-user account.
    pub fn register(&mut self, name: &str, email: &str, password: &str) -> anyhow::Result<User> {
        if name.trim().is_empty() {
            return Err(Error::validation("name", "is required").into());
        }
        if email.is_empty() {
            return Err(Error::validation("email", "is required").into());
        }
        if !email.contains('@') {
            return Err(Error::validation("email", "must be a valid email address").into());
        }
        if password.is_empty() {
            return Err(Error::validation("password", "is required").into());
        }
        validate_password(password)?;

        // Case-sensitive exact match, as in the original.
        if self.users.iter().any(|u| u.email == email) {
            return Err(Error::DuplicateEmail(email.to_string()).into());
        }

        let user = User {
            id: fresh_id(self.users.iter().map(|u| u.id)),
            name: name.to_string(),
            email: email.to_string(),
            role: Role::User,
            password: Some(encode_password(password)),
        };
        self.users.push(user.clone());
        self.persist()?;

        Ok(user.without_password())
    }

    pub fn find_by_email(&self, email: &str) -> Option<&User> {
        self.users.iter().find(|u| u.email == email)
    }

    pub fn find_by_id(&self, id: UserId) -> Option<&User> {
        self.users.iter().find(|u| u.id == id)
    }

    /// Whether `id` names a registered account.
    pub fn contains(&self, id: UserId) -> bool {
        self.users.iter().any(|u| u.id == id)
    }

    /// Check credentials and return the matching account.
    ///
    /// "user not found" and "invalid password" carry distinct messages for
    /// display but are the same error kind, so callers cannot tell them
    /// apart programmatically.
    pub fn verify_credentials(&self, email: &str, password: &str) -> anyhow::Result<User> {
        let user = self
            .find_by_email(email)
            .ok_or_else(|| Error::Authentication("user not found".to_string()))?;

        let supplied = encode_password(password);
        let matches = if user.email == self.admin_email {
            match self.storage.read(ADMIN_PASSWORD_KEY)? {
                Some(value) => serde_json::from_value::<String>(value)? == supplied,
                None => false,
            }
        } else {
            user.password.as_deref() == Some(supplied.as_str())
        };

        if !matches {
            return Err(Error::Authentication("invalid password".to_string()).into());
        }
        Ok(user.without_password())
    }

    /// Every registered account. Admin-only consumption is enforced by the
    /// caller, not here.
    pub fn list_all(&self) -> &[User] {
        &self.users
    }

    fn persist(&self) -> anyhow::Result<()> {
        self.storage
            .write(USERS_KEY, &serde_json::to_value(&self.users)?)
    }
}
