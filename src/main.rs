mod audit;
mod cli;
mod commands;
mod config;
mod error;
mod policy;
mod session;
mod stats;
mod storage;
mod tasks;
mod users;

use anyhow::Result;
use clap::Parser;
use std::cell::RefCell;
use std::path::PathBuf;
use std::rc::Rc;

use crate::audit::AuditLog;
use crate::session::Session;
use crate::storage::{FileStorage, Storage};
use crate::tasks::TaskStore;
use crate::users::UserDirectory;

#[derive(Parser)]
#[command(name = "taskdeck", about = "A role-aware task manager")]
pub struct Args {
    #[arg(short = 'c', long, help = "Run one command and exit")]
    pub command: Option<String>,

    #[arg(long, env = "TASKDECK_HOME", help = "Data directory")]
    pub data_dir: Option<PathBuf>,

    #[arg(long, help = "Config file path")]
    pub config: Option<PathBuf>,

    #[arg(long, help = "Fail updates that reference a missing task id")]
    pub strict_updates: bool,

    #[arg(long, help = "Disable the audit log")]
    pub no_audit: bool,
}

fn main() -> Result<()> {
    dotenvy::dotenv().ok();
    let args = Args::parse();

    let mut cfg = if let Some(config_path) = &args.config {
        config::Config::load_from(config_path)?
    } else {
        config::Config::load().unwrap_or_default()
    };

    // CLI flags override file configuration.
    if let Some(dir) = &args.data_dir {
        cfg.data_dir = Some(dir.clone());
    }
    if args.strict_updates {
        cfg.strict_updates = true;
    }
    if args.no_audit {
        cfg.audit = false;
    }

    if let Err(errors) = cfg.validate() {
        for error in &errors {
            eprintln!("Config error: {}", error);
        }
        anyhow::bail!("invalid configuration");
    }

    let data_dir = cfg.resolve_data_dir()?;
    let storage: Rc<dyn Storage> = Rc::new(FileStorage::open(&data_dir)?);

    let directory = UserDirectory::open(
        Rc::clone(&storage),
        &cfg.admin_email,
        &cfg.admin_password,
    )?;
    let session = Session::restore(Rc::clone(&storage))?;
    let tasks = TaskStore::open(Rc::clone(&storage), cfg.update_mode())?;
    let audit = if cfg.audit {
        Some(RefCell::new(AuditLog::open(&data_dir.join("audit.log"))?))
    } else {
        None
    };

    let ctx = cli::Context {
        directory: RefCell::new(directory),
        session: RefCell::new(session),
        tasks: RefCell::new(tasks),
        audit,
    };

    if let Some(command) = &args.command {
        cli::run_once(&ctx, command)
    } else {
        cli::run_repl(ctx)
    }
}
