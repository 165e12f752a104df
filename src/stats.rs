//! Dashboard aggregation over the task collection.

use crate::tasks::{Task, TaskStatus};
use crate::users::User;

/// Counts by status for the admin dashboard.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct TaskStats {
    pub total: usize,
    pub completed: usize,
    pub pending: usize,
    pub in_progress: usize,
}

impl TaskStats {
    pub fn collect(tasks: &[Task]) -> Self {
        let mut stats = Self {
            total: tasks.len(),
            ..Self::default()
        };
        for task in tasks {
            match task.status {
                TaskStatus::Completed => stats.completed += 1,
                TaskStatus::Pending => stats.pending += 1,
                TaskStatus::InProgress => stats.in_progress += 1,
            }
        }
        stats
    }
}

/// Per-user assignment counts, busiest first. Admins are excluded; they
/// author tasks rather than receive them.
pub fn assignment_counts(tasks: &[Task], users: &[User]) -> Vec<(String, usize)> {
    let mut counts: Vec<(String, usize)> = users
        .iter()
        .filter(|u| !u.is_admin())
        .map(|u| {
            let count = tasks.iter().filter(|t| t.assigned_to == u.id).count();
            (u.name.clone(), count)
        })
        .collect();
    counts.sort_by(|a, b| b.1.cmp(&a.1));
    counts
}
