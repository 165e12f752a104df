//! Authorization rules for task operations.
//!
//! One predicate per decision, so the role/ownership rules live in a single
//! place instead of `is_admin()` branches scattered through the store.

use crate::error::Error;
use crate::tasks::Task;
use crate::users::User;

/// Only an admin may create (and assign) tasks.
pub fn can_create(actor: &User) -> bool {
    actor.is_admin()
}

/// An admin, or the task's assignee, may edit, toggle, or delete it.
pub fn can_modify(actor: &User, task: &Task) -> bool {
    actor.is_admin() || task.assigned_to == actor.id
}

/// Only an admin sees the full collection.
pub fn can_view_all(actor: &User) -> bool {
    actor.is_admin()
}

pub fn authorize_create(actor: &User) -> Result<(), Error> {
    if can_create(actor) {
        Ok(())
    } else {
        Err(Error::Authorization(
            "only an admin can create tasks".to_string(),
        ))
    }
}

pub fn authorize_modify(actor: &User, task: &Task) -> Result<(), Error> {
    if can_modify(actor, task) {
        Ok(())
    } else {
        Err(Error::Authorization(format!(
            "task {} is not assigned to you",
            task.id
        )))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tasks::{Task, TaskStatus};
    use crate::users::{Role, User};
    use chrono::Utc;

    fn user(id: i64, role: Role) -> User {
        User {
            id,
            name: format!("user-{}", id),
            email: format!("u{}@example.com", id),
            role,
            password: None,
        }
    }

    fn task(id: i64, assigned_to: i64) -> Task {
        Task {
            id,
            title: "t".to_string(),
            description: String::new(),
            status: TaskStatus::Pending,
            created_at: Utc::now(),
            created_by: 1,
            assigned_to,
        }
    }

    #[test]
    fn test_only_admin_creates() {
        assert!(can_create(&user(1, Role::Admin)));
        assert!(!can_create(&user(2, Role::User)));
        assert!(authorize_create(&user(2, Role::User)).is_err());
    }

    #[test]
    fn test_admin_or_assignee_modifies() {
        let t = task(10, 2);
        assert!(can_modify(&user(1, Role::Admin), &t));
        assert!(can_modify(&user(2, Role::User), &t));
        assert!(!can_modify(&user(3, Role::User), &t));

        let err = authorize_modify(&user(3, Role::User), &t).unwrap_err();
        assert!(matches!(err, Error::Authorization(_)));
    }

    #[test]
    fn test_only_admin_views_all() {
        assert!(can_view_all(&user(1, Role::Admin)));
        assert!(!can_view_all(&user(2, Role::User)));
    }
}
