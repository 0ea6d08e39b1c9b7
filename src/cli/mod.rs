#![forbid(unsafe_code)]

use std::io::{BufRead, Write};
use std::path::{Path, PathBuf};
use std::process::ExitCode;

use anyhow::Context as _;
use clap::{CommandFactory as _, Parser, Subcommand};

use crate::config::{self, Config, DisplayConfig};
use crate::error::TaskError;
use crate::logging;
use crate::output::table::Table;
use crate::task::date::{self, format_date};
use crate::task::query::{self, Filter, StatusFilter};
use crate::task::{NewTask, Task, TaskStorage, TaskStore};

#[derive(Debug, Parser)]
#[command(name = "taskcli", version, about = "Simple file-backed task tracker")]
pub struct Cli {
    /// Task file to use instead of the configured one
    #[arg(long = "file", global = true, value_name = "PATH")]
    pub file: Option<PathBuf>,
    /// Log debug output to stderr
    #[arg(short = 'v', long = "verbose", global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub cmd: Commands,
}

#[derive(Debug, Subcommand)]
pub enum Commands {
    /// Add a task
    Add(AddArgs),
    /// List tasks (not-done only unless --all or --done)
    #[command(alias = "ls")]
    List(ListArgs),
    /// Show not-done tasks due today
    Today,
    /// Mark a task as done
    Done(IdArgs),
    /// Search task titles (case-insensitive)
    Search(SearchArgs),
    /// Delete a task after confirmation
    #[command(alias = "rm")]
    Delete(DeleteArgs),
    Config(ConfigArgs),
    Completion(CompletionArgs),
    Version,
}

#[derive(Debug, Parser)]
pub struct AddArgs {
    /// Task title
    pub title: String,
    /// Due date (YYYY-MM-DD)
    #[arg(long = "due", value_name = "DATE")]
    pub due: Option<String>,
    /// Tag
    #[arg(long = "tag")]
    pub tag: Option<String>,
}

#[allow(clippy::struct_excessive_bools)]
#[derive(Debug, Parser)]
pub struct ListArgs {
    /// Include done tasks
    #[arg(short = 'a', long = "all", conflicts_with = "done")]
    pub all: bool,
    /// Only done tasks
    #[arg(long = "done")]
    pub done: bool,
    /// Only tasks with exactly this tag
    #[arg(long = "tag")]
    pub tag: Option<String>,
    /// Only not-done tasks past their due date
    #[arg(long = "overdue")]
    pub overdue: bool,
    /// Output as JSON
    #[arg(long = "json", conflicts_with = "csv")]
    pub json: bool,
    /// Output as CSV
    #[arg(long = "csv")]
    pub csv: bool,
}

impl ListArgs {
    fn filter(&self) -> Filter {
        let status = if self.done {
            StatusFilter::Done
        } else if self.all {
            StatusFilter::All
        } else {
            StatusFilter::Pending
        };
        Filter {
            status,
            tag: self.tag.clone().filter(|t| !t.is_empty()),
            overdue: self.overdue,
        }
    }
}

#[derive(Debug, Parser)]
pub struct IdArgs {
    pub id: u64,
}

#[derive(Debug, Parser)]
pub struct SearchArgs {
    /// Text to look for in titles
    pub text: String,
}

#[derive(Debug, Parser)]
pub struct DeleteArgs {
    pub id: u64,
    /// Skip the confirmation prompt
    #[arg(short = 'y', long = "yes")]
    pub yes: bool,
}

#[derive(Debug, Parser)]
pub struct CompletionArgs {
    pub shell: clap_complete::Shell,
}

#[derive(Debug, Parser)]
pub struct ConfigArgs {
    #[command(subcommand)]
    pub cmd: ConfigCmd,
}

#[derive(Debug, Subcommand)]
pub enum ConfigCmd {
    List,
    Set(ConfigSetArgs),
    Get(ConfigGetArgs),
}

#[derive(Debug, Parser)]
pub struct ConfigSetArgs {
    pub key: String,
    pub value: String,
}

#[derive(Debug, Parser)]
pub struct ConfigGetArgs {
    pub key: String,
}

pub fn main() -> ExitCode {
    let cli = Cli::parse();
    logging::init(cli.verbose);

    match run(cli) {
        Ok(code) => code,
        Err(err) => {
            tracing::debug!(error = ?err, "command failed");
            eprintln!("error: {err:#}");
            ExitCode::from(exit_code(&err))
        }
    }
}

/// Maps a command failure to its process exit status.
#[must_use]
pub fn exit_code(err: &anyhow::Error) -> u8 {
    err.downcast_ref::<TaskError>()
        .map_or(1, TaskError::exit_code)
}

fn run(cli: Cli) -> anyhow::Result<ExitCode> {
    match cli.cmd {
        Commands::Completion(args) => {
            let mut cmd = Cli::command();
            clap_complete::generate(args.shell, &mut cmd, "taskcli", &mut std::io::stdout());
            Ok(ExitCode::SUCCESS)
        }
        Commands::Config(args) => match args.cmd {
            ConfigCmd::List => {
                print!("{}", config::list_resolved_toml()?);
                Ok(ExitCode::SUCCESS)
            }
            ConfigCmd::Set(set) => {
                config::set_value_string(&set.key, &set.value)?;
                println!("Set {} = {}", set.key, set.value);
                Ok(ExitCode::SUCCESS)
            }
            ConfigCmd::Get(get) => match config::get_value_string(&get.key)? {
                Some(v) => {
                    println!("{v}");
                    Ok(ExitCode::SUCCESS)
                }
                None => anyhow::bail!(
                    "configuration key '{}' not found - use 'taskcli config list' to see available keys",
                    get.key
                ),
            },
        },
        Commands::Version => Ok(cmd_version()),
        Commands::Add(args) => cmd_add(cli.file.as_deref(), &args),
        Commands::List(args) => cmd_list(cli.file.as_deref(), &args),
        Commands::Today => cmd_today(cli.file.as_deref()),
        Commands::Done(args) => cmd_done(cli.file.as_deref(), args.id),
        Commands::Search(args) => cmd_search(cli.file.as_deref(), &args.text),
        Commands::Delete(args) => cmd_delete(cli.file.as_deref(), &args),
    }
}

fn open_store(file: Option<&Path>) -> anyhow::Result<(Config, TaskStore)> {
    let (cfg, _doc, _paths) = config::load()?;
    let path = config::resolve_store_path(&cfg, file)?;
    tracing::debug!(path = %path.display(), "using task store");
    let store = TaskStore::open(TaskStorage::new(path))?;
    Ok((cfg, store))
}

fn cmd_add(file: Option<&Path>, args: &AddArgs) -> anyhow::Result<ExitCode> {
    let (cfg, mut store) = open_store(file)?;
    let new = NewTask::new(&args.title, args.due.as_deref(), args.tag.as_deref())?;
    let task = store.add(new)?;

    println!("Added task {}", task.id);
    print_task_table(&cfg.display, &[&task], date::today())?;
    Ok(ExitCode::SUCCESS)
}

fn cmd_list(file: Option<&Path>, args: &ListArgs) -> anyhow::Result<ExitCode> {
    let (cfg, store) = open_store(file)?;
    let today = date::today();
    let tasks = query::filter(store.tasks(), &args.filter(), today);

    if args.json {
        let mut out = serde_json::to_string_pretty(&tasks)?;
        out.push('\n');
        print!("{out}");
        return Ok(ExitCode::SUCCESS);
    }
    if args.csv {
        csv_table(&tasks).write_csv()?;
        return Ok(ExitCode::SUCCESS);
    }

    if tasks.is_empty() {
        println!("No matching tasks.");
        return Ok(ExitCode::SUCCESS);
    }
    print_task_table(&cfg.display, &tasks, today)?;
    Ok(ExitCode::SUCCESS)
}

fn cmd_today(file: Option<&Path>) -> anyhow::Result<ExitCode> {
    let (cfg, store) = open_store(file)?;
    let today = date::today();
    let tasks = query::due_today(store.tasks(), today);

    if tasks.is_empty() {
        println!("No open tasks due today ({}).", format_date(today));
        return Ok(ExitCode::SUCCESS);
    }
    print_task_table(&cfg.display, &tasks, today)?;
    Ok(ExitCode::SUCCESS)
}

fn cmd_done(file: Option<&Path>, id: u64) -> anyhow::Result<ExitCode> {
    let (_cfg, mut store) = open_store(file)?;
    let completion = store.complete(id)?;

    if completion.newly_done {
        println!("Completed task {}: {}", id, completion.task.title);
    } else {
        println!("Task {id} is already done.");
    }
    Ok(ExitCode::SUCCESS)
}

fn cmd_search(file: Option<&Path>, text: &str) -> anyhow::Result<ExitCode> {
    let (cfg, store) = open_store(file)?;
    let tasks = query::search(store.tasks(), text);

    if tasks.is_empty() {
        println!("No tasks match '{text}'.");
        return Ok(ExitCode::SUCCESS);
    }
    print_task_table(&cfg.display, &tasks, date::today())?;
    Ok(ExitCode::SUCCESS)
}

fn cmd_delete(file: Option<&Path>, args: &DeleteArgs) -> anyhow::Result<ExitCode> {
    let (_cfg, mut store) = open_store(file)?;

    let confirm = |task: &Task| {
        args.yes
            || confirm_delete(task, std::io::stdin().lock(), std::io::stdout().lock())
    };
    match store.delete(args.id, confirm) {
        Ok(removed) => {
            println!("Deleted task {}: {}", removed.id, removed.title);
            Ok(ExitCode::SUCCESS)
        }
        Err(TaskError::Cancelled) => {
            println!("Cancelled.");
            Ok(ExitCode::SUCCESS)
        }
        Err(err) => Err(err.into()),
    }
}

/// Asks on `out` and reads one line from `input`; only `y`/`yes` approve.
fn confirm_delete(task: &Task, mut input: impl BufRead, mut out: impl Write) -> bool {
    let asked = write!(out, "Delete task {} '{}'? (y/N): ", task.id, task.title)
        .and_then(|()| out.flush());
    if asked.is_err() {
        return false;
    }
    let mut line = String::new();
    match input.read_line(&mut line) {
        Ok(_) => is_affirmative(&line),
        Err(e) => {
            tracing::warn!(error = %e, "failed to read confirmation");
            false
        }
    }
}

fn is_affirmative(answer: &str) -> bool {
    let resp = answer.trim().to_lowercase();
    resp == "y" || resp == "yes"
}

fn cmd_version() -> ExitCode {
    println!("taskcli version {}", env!("CARGO_PKG_VERSION"));
    println!("  rust: {}", rustc_version_runtime::version());
    println!(
        "  os/arch: {}/{}",
        std::env::consts::OS,
        std::env::consts::ARCH
    );
    ExitCode::SUCCESS
}

fn print_task_table(display: &DisplayConfig, tasks: &[&Task], today: time::Date) -> anyhow::Result<()> {
    task_table(display, tasks, today)
        .print()
        .context("failed to write task table")
}

fn task_table(display: &DisplayConfig, tasks: &[&Task], today: time::Date) -> Table {
    let any_overdue = tasks.iter().any(|t| t.is_overdue(today));
    let blank_marker = " ".repeat(display.overdue_marker.chars().count());

    let mut t = Table::new(["id", "done", "due", "tag", "title"]);
    for task in tasks {
        let id = if task.is_overdue(today) {
            format!("{}{}", display.overdue_marker, task.id)
        } else if any_overdue {
            format!("{blank_marker}{}", task.id)
        } else {
            task.id.to_string()
        };
        let done = if task.done {
            display.done_marker.clone()
        } else {
            String::new()
        };
        let due = task
            .due
            .map_or_else(|| display.empty_cell.clone(), format_date);
        let tag = task.tag.clone().unwrap_or_else(|| display.empty_cell.clone());
        t.row([id, done, due, tag, task.title.clone()]);
    }
    t
}

fn csv_table(tasks: &[&Task]) -> Table {
    let mut t = Table::new(["id", "done", "due", "tag", "title"]);
    for task in tasks {
        t.row([
            task.id.to_string(),
            task.done.to_string(),
            task.due.map(format_date).unwrap_or_default(),
            task.tag.clone().unwrap_or_default(),
            task.title.clone(),
        ]);
    }
    t
}
