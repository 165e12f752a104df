//! Shell command parsing for the interactive session.
//!
//! Lines are tokenized with shell quoting rules, so titles and names with
//! spaces work: `add "write the report" --to alice@example.com`.

use crate::error::Error;
use crate::tasks::{TaskId, TaskStatus};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ListScope {
    #[default]
    Mine,
    Assigned,
    All,
}

/// One parsed input line.
#[derive(Debug, Clone, PartialEq)]
pub enum Command {
    Help,
    Quit,
    Register {
        name: String,
        email: String,
        password: String,
    },
    Login {
        email: String,
        password: String,
    },
    Logout,
    Whoami,
    Users,
    Stats,
    Add {
        title: String,
        description: String,
        status: TaskStatus,
        /// User id or email; resolved against the directory by the caller.
        assignee: String,
    },
    Edit {
        id: TaskId,
        title: Option<String>,
        description: Option<String>,
        status: Option<TaskStatus>,
        assignee: Option<String>,
    },
    Toggle {
        id: TaskId,
    },
    Remove {
        id: TaskId,
    },
    List {
        scope: ListScope,
    },
}

/// Parse one input line into a command.
pub fn parse(line: &str) -> Result<Command, Error> {
    let tokens = shell_words::split(line)
        .map_err(|e| Error::validation("command", e.to_string()))?;
    let Some((name, args)) = tokens.split_first() else {
        return Err(Error::validation("command", "empty command"));
    };

    match name.as_str() {
        "help" => Ok(Command::Help),
        "quit" | "exit" => Ok(Command::Quit),
        "register" => match args {
            [name, email, password] => Ok(Command::Register {
                name: name.clone(),
                email: email.clone(),
                password: password.clone(),
            }),
            _ => Err(usage("register <name> <email> <password>")),
        },
        "login" => match args {
            [email, password] => Ok(Command::Login {
                email: email.clone(),
                password: password.clone(),
            }),
            _ => Err(usage("login <email> <password>")),
        },
        "logout" => Ok(Command::Logout),
        "whoami" => Ok(Command::Whoami),
        "users" => Ok(Command::Users),
        "stats" => Ok(Command::Stats),
        "add" => parse_add(args),
        "edit" => parse_edit(args),
        "done" | "toggle" => match args {
            [id] => Ok(Command::Toggle { id: parse_id(id)? }),
            _ => Err(usage("done <task-id>")),
        },
        "rm" | "delete" => match args {
            [id] => Ok(Command::Remove { id: parse_id(id)? }),
            _ => Err(usage("rm <task-id>")),
        },
        "list" => match args {
            [] => Ok(Command::List {
                scope: ListScope::Mine,
            }),
            [scope] => {
                let scope = match scope.as_str() {
                    "mine" => ListScope::Mine,
                    "assigned" => ListScope::Assigned,
                    "all" => ListScope::All,
                    other => {
                        return Err(Error::validation(
                            "scope",
                            format!("unknown scope '{}' (mine|assigned|all)", other),
                        ))
                    }
                };
                Ok(Command::List { scope })
            }
            _ => Err(usage("list [mine|assigned|all]")),
        },
        other => Err(Error::validation(
            "command",
            format!("unknown command '{}' (try 'help')", other),
        )),
    }
}

fn parse_add(args: &[String]) -> Result<Command, Error> {
    let mut title = None;
    let mut description = String::new();
    let mut status = TaskStatus::Pending;
    let mut assignee = None;

    let mut iter = args.iter();
    while let Some(token) = iter.next() {
        match token.as_str() {
            "--to" => assignee = Some(flag_value(&mut iter, "--to")?),
            "--desc" => description = flag_value(&mut iter, "--desc")?,
            "--status" => status = parse_status(&flag_value(&mut iter, "--status")?)?,
            _ if title.is_none() => title = Some(token.clone()),
            other => {
                return Err(Error::validation(
                    "command",
                    format!("unexpected argument '{}'", other),
                ))
            }
        }
    }

    // The title and assignee checks live here at the boundary; the store
    // assumes well-formed drafts.
    let title = match title {
        Some(t) if !t.trim().is_empty() => t,
        _ => return Err(Error::validation("title", "task title is required")),
    };
    let assignee = assignee
        .ok_or_else(|| Error::validation("assignee", "select a user with --to <id-or-email>"))?;

    Ok(Command::Add {
        title,
        description,
        status,
        assignee,
    })
}

fn parse_edit(args: &[String]) -> Result<Command, Error> {
    let Some((id, rest)) = args.split_first() else {
        return Err(usage(
            "edit <task-id> [--title <t>] [--desc <d>] [--status <s>] [--to <u>]",
        ));
    };
    let id = parse_id(id)?;

    let mut title = None;
    let mut description = None;
    let mut status = None;
    let mut assignee = None;

    let mut iter = rest.iter();
    while let Some(token) = iter.next() {
        match token.as_str() {
            "--title" => {
                let t = flag_value(&mut iter, "--title")?;
                if t.trim().is_empty() {
                    return Err(Error::validation("title", "task title is required"));
                }
                title = Some(t);
            }
            "--desc" => description = Some(flag_value(&mut iter, "--desc")?),
            "--status" => status = Some(parse_status(&flag_value(&mut iter, "--status")?)?),
            "--to" => assignee = Some(flag_value(&mut iter, "--to")?),
            other => {
                return Err(Error::validation(
                    "command",
                    format!("unexpected argument '{}'", other),
                ))
            }
        }
    }

    Ok(Command::Edit {
        id,
        title,
        description,
        status,
        assignee,
    })
}

fn usage(text: &str) -> Error {
    Error::validation("usage", text)
}

fn flag_value<'a>(
    iter: &mut impl Iterator<Item = &'a String>,
    flag: &str,
) -> Result<String, Error> {
    iter.next()
        .cloned()
        .ok_or_else(|| Error::validation("command", format!("{} needs a value", flag)))
}

fn parse_id(s: &str) -> Result<TaskId, Error> {
    s.parse()
        .map_err(|_| Error::validation("id", format!("'{}' is not a task id", s)))
}

fn parse_status(s: &str) -> Result<TaskStatus, Error> {
    TaskStatus::from_str(s).ok_or_else(|| {
        Error::validation(
            "status",
            format!("unknown status '{}' (pending|in-progress|completed)", s),
        )
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_register_and_login() {
        assert_eq!(
            parse("register \"Bob Smith\" bob@example.com Passw0rd").unwrap(),
            Command::Register {
                name: "Bob Smith".to_string(),
                email: "bob@example.com".to_string(),
                password: "Passw0rd".to_string(),
            }
        );
        assert_eq!(
            parse("login bob@example.com Passw0rd").unwrap(),
            Command::Login {
                email: "bob@example.com".to_string(),
                password: "Passw0rd".to_string(),
            }
        );
        assert!(parse("login bob@example.com").is_err());
    }

    #[test]
    fn test_parse_add() {
        let cmd = parse("add \"write the report\" --to alice@example.com --status in-progress")
            .unwrap();
        assert_eq!(
            cmd,
            Command::Add {
                title: "write the report".to_string(),
                description: String::new(),
                status: TaskStatus::InProgress,
                assignee: "alice@example.com".to_string(),
            }
        );
    }

    #[test]
    fn test_add_requires_title_and_assignee() {
        let err = parse("add --to alice@example.com").unwrap_err();
        assert!(err.to_string().contains("title"));

        let err = parse("add \"a task\"").unwrap_err();
        assert!(err.to_string().contains("assignee"));
    }

    #[test]
    fn test_parse_edit_partial_fields() {
        let cmd = parse("edit 42 --status completed").unwrap();
        assert_eq!(
            cmd,
            Command::Edit {
                id: 42,
                title: None,
                description: None,
                status: Some(TaskStatus::Completed),
                assignee: None,
            }
        );
        assert!(parse("edit notanid --status completed").is_err());
    }

    #[test]
    fn test_parse_list_scopes() {
        assert_eq!(
            parse("list").unwrap(),
            Command::List {
                scope: ListScope::Mine
            }
        );
        assert_eq!(
            parse("list all").unwrap(),
            Command::List {
                scope: ListScope::All
            }
        );
        assert!(parse("list everything").is_err());
    }

    #[test]
    fn test_parse_toggle_aliases() {
        assert_eq!(parse("done 7").unwrap(), Command::Toggle { id: 7 });
        assert_eq!(parse("toggle 7").unwrap(), Command::Toggle { id: 7 });
        assert_eq!(parse("rm 7").unwrap(), Command::Remove { id: 7 });
    }

    #[test]
    fn test_unknown_command() {
        let err = parse("frobnicate").unwrap_err();
        assert!(err.to_string().contains("unknown command"));
    }
}
