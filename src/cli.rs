//! Interactive shell and one-shot command execution.
//!
//! This is the view layer: the only caller of the directory, session, and
//! task store, and the place where every failure becomes a printed message.

use crate::audit::AuditLog;
use crate::commands::{self, Command, ListScope};
use crate::error::Error;
use crate::session::Session;
use crate::stats::{assignment_counts, TaskStats};
use crate::tasks::{Task, TaskDraft, TaskStore};
use crate::users::{User, UserDirectory, UserId};
use anyhow::Result;
use rustyline::error::ReadlineError;
use rustyline::DefaultEditor;
use std::cell::RefCell;

pub struct Context {
    pub directory: RefCell<UserDirectory>,
    pub session: RefCell<Session>,
    pub tasks: RefCell<TaskStore>,
    pub audit: Option<RefCell<AuditLog>>,
}

pub fn run_once(ctx: &Context, line: &str) -> Result<()> {
    run_line(ctx, line)?;
    Ok(())
}

pub fn run_repl(ctx: Context) -> Result<()> {
    let mut rl = DefaultEditor::new()?;

    println!("taskdeck - type 'help' for commands, 'quit' to exit");

    loop {
        match rl.readline(&prompt(&ctx)) {
            Ok(line) => {
                let line = line.trim();
                if line.is_empty() {
                    continue;
                }
                rl.add_history_entry(line)?;

                match run_line(&ctx, line) {
                    Ok(true) => break,
                    Ok(false) => {}
                    Err(e) => eprintln!("Error: {}", e),
                }
            }
            Err(ReadlineError::Interrupted | ReadlineError::Eof) => break,
            Err(e) => {
                eprintln!("Input error: {}", e);
                break;
            }
        }
    }

    Ok(())
}

fn prompt(ctx: &Context) -> String {
    match ctx.session.borrow().current() {
        Some(user) => format!("{}> ", user.email),
        None => "taskdeck> ".to_string(),
    }
}

/// Parse and execute one line. Returns true when the session should end.
fn run_line(ctx: &Context, line: &str) -> Result<bool> {
    let command = commands::parse(line)?;
    let op = line.split_whitespace().next().unwrap_or("").to_string();

    match execute(ctx, command) {
        Ok(quit) => Ok(quit),
        Err(e) => {
            if let Some(Error::Authorization(reason)) = e.downcast_ref::<Error>() {
                if let Some(log) = &ctx.audit {
                    log.borrow_mut().denied(&op, reason)?;
                }
            }
            Err(e)
        }
    }
}

fn execute(ctx: &Context, command: Command) -> Result<bool> {
    match command {
        Command::Help => print_help(),
        Command::Quit => return Ok(true),
        Command::Register {
            name,
            email,
            password,
        } => {
            let user = ctx
                .directory
                .borrow_mut()
                .register(&name, &email, &password)?;
            if let Some(log) = &ctx.audit {
                log.borrow_mut().user_registered(user.id, &user.email)?;
            }
            println!("Registered {}. You can now sign in.", user.email);
        }
        Command::Login { email, password } => {
            let verified = ctx.directory.borrow().verify_credentials(&email, &password);
            match verified {
                Ok(user) => {
                    ctx.session.borrow_mut().login(&user)?;
                    if let Some(log) = &ctx.audit {
                        log.borrow_mut().login_ok(user.id, &user.email)?;
                    }
                    println!("Welcome back, {}!", user.name);
                }
                Err(e) => {
                    if let Some(log) = &ctx.audit {
                        log.borrow_mut().login_failed(&email)?;
                    }
                    return Err(e);
                }
            }
        }
        Command::Logout => {
            let id = ctx.session.borrow().current().map(|u| u.id);
            ctx.session.borrow_mut().logout()?;
            if let (Some(id), Some(log)) = (id, &ctx.audit) {
                log.borrow_mut().logout(id)?;
            }
            println!("Signed out.");
        }
        Command::Whoami => match ctx.session.borrow().current() {
            Some(user) => println!("{} <{}> ({})", user.name, user.email, user.role.as_str()),
            None => println!("Not signed in."),
        },
        Command::Users => {
            let actor = require_user(ctx)?;
            if !actor.is_admin() {
                return Err(Error::Authorization(
                    "only an admin can list users".to_string(),
                )
                .into());
            }
            let directory = ctx.directory.borrow();
            for user in directory.list_all() {
                println!(
                    "{:>15}  {} <{}> ({})",
                    user.id,
                    user.name,
                    user.email,
                    user.role.as_str()
                );
            }
        }
        Command::Stats => {
            let actor = require_user(ctx)?;
            if !actor.is_admin() {
                return Err(Error::Authorization(
                    "only an admin can view statistics".to_string(),
                )
                .into());
            }
            let tasks = ctx.tasks.borrow().get_all(&actor);
            let stats = TaskStats::collect(&tasks);
            println!(
                "Tasks: {} total | {} completed | {} pending | {} in progress",
                stats.total, stats.completed, stats.pending, stats.in_progress
            );
            let directory = ctx.directory.borrow();
            for (name, count) in assignment_counts(&tasks, directory.list_all()) {
                println!("  {:<20} {}", name, count);
            }
        }
        Command::Add {
            title,
            description,
            status,
            assignee,
        } => {
            let actor = require_user(ctx)?;
            let assigned_to = resolve_user(ctx, &assignee)?;
            let directory = ctx.directory.borrow();
            let task = ctx.tasks.borrow_mut().add(
                TaskDraft {
                    title,
                    description,
                    status,
                    assigned_to,
                },
                &actor,
                &directory,
            )?;
            if let Some(log) = &ctx.audit {
                log.borrow_mut().task_added(&task)?;
            }
            println!("Added task #{}: {}", task.id, task.title);
        }
        Command::Edit {
            id,
            title,
            description,
            status,
            assignee,
        } => {
            let actor = require_user(ctx)?;
            let mut task = ctx
                .tasks
                .borrow()
                .get(id)
                .cloned()
                .ok_or_else(|| Error::NotFound(format!("task {}", id)))?;
            if let Some(title) = title {
                task.title = title;
            }
            if let Some(description) = description {
                task.description = description;
            }
            if let Some(status) = status {
                task.status = status;
            }
            if let Some(assignee) = assignee {
                task.assigned_to = resolve_user(ctx, &assignee)?;
            }
            let directory = ctx.directory.borrow();
            ctx.tasks.borrow_mut().update(task, &actor, &directory)?;
            if let Some(log) = &ctx.audit {
                log.borrow_mut().task_updated(id, actor.id)?;
            }
            println!("Updated task #{}", id);
        }
        Command::Toggle { id } => {
            let actor = require_user(ctx)?;
            let task = ctx
                .tasks
                .borrow()
                .get(id)
                .cloned()
                .ok_or_else(|| Error::NotFound(format!("task {}", id)))?;
            let directory = ctx.directory.borrow();
            let updated = ctx
                .tasks
                .borrow_mut()
                .toggle_status(&task, &actor, &directory)?;
            if let Some(log) = &ctx.audit {
                log.borrow_mut()
                    .task_toggled(id, updated.status.as_str(), actor.id)?;
            }
            println!("Task #{} marked {}", id, updated.status.as_str());
        }
        Command::Remove { id } => {
            let actor = require_user(ctx)?;
            let removed = ctx.tasks.borrow_mut().remove(id, &actor)?;
            if let Some(log) = &ctx.audit {
                log.borrow_mut().task_removed(id, actor.id)?;
            }
            println!("Deleted task #{}: {}", removed.id, removed.title);
        }
        Command::List { scope } => {
            let actor = require_user(ctx)?;
            let tasks = ctx.tasks.borrow();
            let selected = match scope {
                ListScope::Mine => tasks.get_mine(&actor),
                ListScope::Assigned => tasks.get_assigned_to_me(&actor),
                ListScope::All => tasks.get_all(&actor),
            };
            drop(tasks);
            print_tasks(ctx, &selected);
        }
    }

    Ok(false)
}

fn require_user(ctx: &Context) -> Result<User> {
    let session = ctx.session.borrow();
    match session.current() {
        Some(user) => Ok(user.clone()),
        None => Err(Error::Authorization("not signed in".to_string()).into()),
    }
}

/// Accept a numeric user id or an email address.
fn resolve_user(ctx: &Context, who: &str) -> Result<UserId> {
    let directory = ctx.directory.borrow();
    if let Ok(id) = who.parse::<UserId>() {
        if directory.contains(id) {
            return Ok(id);
        }
    }
    if let Some(user) = directory.find_by_email(who) {
        return Ok(user.id);
    }
    Err(Error::validation("assignee", format!("no such user '{}'", who)).into())
}

fn print_tasks(ctx: &Context, tasks: &[Task]) {
    if tasks.is_empty() {
        println!("No tasks.");
        return;
    }
    let directory = ctx.directory.borrow();
    for task in tasks {
        let assignee = directory
            .find_by_id(task.assigned_to)
            .map(|u| u.name.clone())
            .unwrap_or_else(|| format!("user {}", task.assigned_to));
        println!(
            "{} #{} {} (assigned to {}, created {})",
            task.status.icon(),
            task.id,
            task.title,
            assignee,
            task.created_at.format("%Y-%m-%d")
        );
        if !task.description.is_empty() {
            println!("      {}", task.description);
        }
    }
}

fn print_help() {
    println!("Accounts:");
    println!("  register <name> <email> <password>  - create an account");
    println!("  login <email> <password>            - sign in");
    println!("  logout                              - sign out");
    println!("  whoami                              - show the active session");
    println!("  users                               - list accounts (admin)");
    println!("Tasks:");
    println!("  add <title> --to <user> [--desc <d>] [--status <s>]  - create (admin)");
    println!("  edit <id> [--title <t>] [--desc <d>] [--status <s>] [--to <u>]");
    println!("  done <id>                           - toggle pending/completed");
    println!("  rm <id>                             - delete a task");
    println!("  list [mine|assigned|all]            - show tasks");
    println!("  stats                               - dashboard totals (admin)");
    println!("Session:");
    println!("  help                                - show commands");
    println!("  quit                                - exit");
}
