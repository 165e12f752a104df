//! The active sign-in: a durable, non-authoritative copy of one user.
//!
//! Sessions have no expiry. The `current_user` key survives restarts and is
//! cleared only by an explicit logout (or by wiping storage externally).

use crate::storage::{Storage, CURRENT_USER_KEY};
use crate::users::User;
use std::rc::Rc;

pub struct Session {
    storage: Rc<dyn Storage>,
    current: Option<User>,
}

impl Session {
    /// Restore the persisted session, if any.
    pub fn restore(storage: Rc<dyn Storage>) -> anyhow::Result<Self> {
        let current = match storage.read(CURRENT_USER_KEY)? {
            Some(value) => Some(serde_json::from_value(value)?),
            None => None,
        };
        Ok(Self { storage, current })
    }

    /// Make `user` the active session, replacing any prior one. The stored
    /// copy never carries the encoded password.
    pub fn login(&mut self, user: &User) -> anyhow::Result<()> {
        let copy = user.without_password();
        self.storage
            .write(CURRENT_USER_KEY, &serde_json::to_value(&copy)?)?;
        self.current = Some(copy);
        Ok(())
    }

    pub fn logout(&mut self) -> anyhow::Result<()> {
        self.storage.remove(CURRENT_USER_KEY)?;
        self.current = None;
        Ok(())
    }

    pub fn current(&self) -> Option<&User> {
        self.current.as_ref()
    }

    pub fn is_admin(&self) -> bool {
        self.current.as_ref().is_some_and(|u| u.is_admin())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::MemoryStorage;
    use crate::users::{Role, User};

    fn user(id: i64, role: Role) -> User {
        User {
            id,
            name: format!("user-{}", id),
            email: format!("u{}@example.com", id),
            role,
            password: Some("c2VjcmV0".to_string()),
        }
    }

    #[test]
    fn test_login_logout() {
        let storage = Rc::new(MemoryStorage::new());
        let mut session = Session::restore(Rc::clone(&storage) as Rc<dyn Storage>).unwrap();
        assert!(session.current().is_none());
        assert!(!session.is_admin());

        session.login(&user(7, Role::User)).unwrap();
        assert_eq!(session.current().unwrap().id, 7);
        assert!(!session.is_admin());

        session.login(&user(1, Role::Admin)).unwrap();
        assert_eq!(session.current().unwrap().id, 1);
        assert!(session.is_admin());

        session.logout().unwrap();
        assert!(session.current().is_none());
    }

    #[test]
    fn test_session_survives_restart_without_password() {
        let storage = Rc::new(MemoryStorage::new());
        let mut session = Session::restore(Rc::clone(&storage) as Rc<dyn Storage>).unwrap();
        session.login(&user(7, Role::User)).unwrap();

        let restored = Session::restore(Rc::clone(&storage) as Rc<dyn Storage>).unwrap();
        let current = restored.current().unwrap();
        assert_eq!(current.id, 7);
        assert_eq!(current.role, Role::User);
        assert!(current.password.is_none());
    }

    #[test]
    fn test_logout_clears_durable_record() {
        let storage = Rc::new(MemoryStorage::new());
        let mut session = Session::restore(Rc::clone(&storage) as Rc<dyn Storage>).unwrap();
        session.login(&user(7, Role::User)).unwrap();
        session.logout().unwrap();

        let restored = Session::restore(Rc::clone(&storage) as Rc<dyn Storage>).unwrap();
        assert!(restored.current().is_none());
    }
}
