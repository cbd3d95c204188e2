//! CLI entry point for tasklist.

use std::path::PathBuf;

use anyhow::Result;
use clap::{Args, Parser, Subcommand, ValueEnum};
use tasklist_app::AppConfig;
use tasklist_core::{Category, CategoryFilter, Placement, StatusFilter, TaskId, ViewFilter};
use tracing_subscriber::{EnvFilter, fmt::format::FmtSpan};

mod commands;

/// Categorized to-do list with a local cache and an optional remote table.
#[derive(Parser, Debug)]
#[command(
    name = "tasklist",
    version,
    about = "tasklist: categorized to-dos cached locally and synced to a remote table"
)]
struct Cli {
    /// Configuration file (defaults to <config dir>/tasklist/config.toml).
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Ignore the configured remote and use the local cache only.
    #[arg(long, global = true)]
    offline: bool,

    #[command(subcommand)]
    cmd: Command,
}

/// View filter flags shared by `ls` and `mv`.
#[derive(Args, Debug, Clone, Copy)]
struct ViewArgs {
    /// Completion filter: all, active or completed.
    #[arg(long, default_value = "all")]
    status: StatusFilter,
    /// Category filter: all or a category name.
    #[arg(long, default_value = "all")]
    category: CategoryFilter,
}

impl From<ViewArgs> for ViewFilter {
    fn from(args: ViewArgs) -> Self {
        Self::new(args.status, args.category)
    }
}

/// Drop position for `mv`.
#[derive(Args, Debug, Clone, Copy)]
#[group(required = true, multiple = false)]
struct DropTarget {
    /// Place the task immediately before TARGET.
    #[arg(long, value_name = "TARGET")]
    before: Option<TaskId>,
    /// Place the task immediately after TARGET.
    #[arg(long, value_name = "TARGET")]
    after: Option<TaskId>,
}

impl DropTarget {
    const fn resolve(self) -> Option<(TaskId, Placement)> {
        match (self.before, self.after) {
            (Some(target), None) => Some((target, Placement::Before)),
            (None, Some(target)) => Some((target, Placement::After)),
            _ => None,
        }
    }
}

#[derive(ValueEnum, Debug, Clone, Copy, PartialEq, Eq)]
enum LsFormat {
    Table,
    Json,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// List tasks passing the filter, with counts and sync status.
    Ls {
        #[command(flatten)]
        view: ViewArgs,
        #[arg(long, value_enum, default_value_t = LsFormat::Table)]
        format: LsFormat,
    },

    /// Append a new task.
    Add {
        #[arg(required = true, num_args = 1..)]
        text: Vec<String>,
        #[arg(short, long, default_value = "Personal")]
        category: Category,
    },

    /// Flip the completion flag of a task.
    Toggle { id: TaskId },

    /// Replace the text (and optionally the category) of a task.
    Edit {
        id: TaskId,
        #[arg(required = true, num_args = 1..)]
        text: Vec<String>,
        #[arg(short, long)]
        category: Option<Category>,
    },

    /// Delete a task.
    Rm { id: TaskId },

    /// Delete every completed task.
    ClearCompleted,

    /// Move a task relative to another one, positions taken from the filtered view.
    Mv {
        id: TaskId,
        #[command(flatten)]
        target: DropTarget,
        #[command(flatten)]
        view: ViewArgs,
    },

    /// Load the list and report the resulting sync status.
    Status,
}

fn main() -> Result<()> {
    let Cli {
        config,
        offline,
        cmd,
    } = Cli::parse();

    install_tracing();

    let mut config = AppConfig::load(config.as_deref())?;
    if offline {
        config = config.without_remote();
    }

    tokio::runtime::Runtime::new()?.block_on(commands::run(cmd, &config))
}

fn install_tracing() {
    // RUST_LOG overrides the default INFO level. Logs go to stderr so stdout stays parseable.
    let filter = EnvFilter::from_default_env().add_directive(tracing::Level::INFO.into());
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .with_span_events(FmtSpan::NONE)
        .compact()
        .try_init();
}
