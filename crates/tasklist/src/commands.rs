use std::io::{self, Write};
use std::sync::Arc;

use anyhow::{Result, bail};
use serde_json::json;
use tasklist_app::{AppConfig, PendingSave, PersistenceCoordinator, TaskSession};
use tasklist_core::{Task, TaskId, ViewFilter};
use tasklist_store::{FileCache, LocalCache, RemoteStore, RestRemote};
use tracing::{debug, info};

use crate::{Command, LsFormat};

/// Build the stores from `config`, load the list and execute `command`.
pub async fn run(command: Command, config: &AppConfig) -> Result<()> {
    let cache = FileCache::new(config.cache.resolved_dir(), &config.cache.namespace);
    debug!(path = %cache.path().display(), "using local cache");
    let remote = config
        .rest_config()
        .map(|rest| RestRemote::new(&rest))
        .transpose()?;
    if remote.is_none() {
        info!("no remote configured; working against the local cache");
    }

    let coordinator = Arc::new(PersistenceCoordinator::new(cache, remote));
    let mut session = TaskSession::new(coordinator);
    let mut stdout = io::stdout().lock();
    execute(&mut session, command, &mut stdout).await
}

async fn execute<C, R, W>(session: &mut TaskSession<C, R>, command: Command, out: &mut W) -> Result<()>
where
    C: LocalCache + 'static,
    R: RemoteStore,
    W: Write,
{
    let loaded = session.load().await;
    debug!(status = %loaded, count = session.tasks().len(), "initial load finished");

    let pending = match command {
        Command::Ls { view, format } => {
            session.set_filter(view.into());
            return handle_ls(session, format, out);
        }
        Command::Status => {
            writeln!(out, "{}", session.status())?;
            return Ok(());
        }
        Command::Add { text, category } => session.add(&text.join(" "), category),
        Command::Toggle { id } => {
            require(session.tasks(), id)?;
            session.toggle(id)
        }
        Command::Edit { id, text, category } => {
            let current = require(session.tasks(), id)?.category;
            session.begin_edit(id);
            session.edit(id, &text.join(" "), category.unwrap_or(current))
        }
        Command::Rm { id } => {
            require(session.tasks(), id)?;
            session.delete(id)
        }
        Command::ClearCompleted => session.clear_completed(),
        Command::Mv { id, target, view } => {
            let Some((target, placement)) = target.resolve() else {
                bail!("mv needs exactly one of --before or --after");
            };
            let filter = ViewFilter::from(view);
            require_visible(session.tasks(), filter, id)?;
            require_visible(session.tasks(), filter, target)?;
            session.set_filter(filter);
            session.reorder(id, target, placement)
        }
    };

    settle(session, pending, out).await
}

async fn settle<C, R, W: Write>(
    session: &TaskSession<C, R>,
    pending: Option<PendingSave>,
    out: &mut W,
) -> Result<()> {
    match pending {
        Some(pending) => {
            let outcome = pending.wait().await;
            debug!(?outcome, "save finished");
        }
        None => writeln!(out, "nothing changed")?,
    }
    writeln!(out, "sync: {}", session.status())?;
    Ok(())
}

fn handle_ls<C, R, W: Write>(session: &TaskSession<C, R>, format: LsFormat, out: &mut W) -> Result<()> {
    let visible = session.visible();
    let counts = session.counts();

    match format {
        LsFormat::Json => {
            let report = json!({
                "tasks": visible,
                "active": counts.active,
                "completed": counts.completed,
                "status": session.status(),
            });
            writeln!(out, "{}", serde_json::to_string_pretty(&report)?)?;
        }
        LsFormat::Table => {
            if visible.is_empty() {
                if session.filter().is_empty() {
                    writeln!(out, "No tasks yet")?;
                } else {
                    writeln!(out, "No tasks matched the filter")?;
                }
            }
            for (position, task) in visible.iter().enumerate() {
                writeln!(out, "{}", render_row(position + 1, task))?;
            }
            writeln!(
                out,
                "{} active, {} completed | sync: {}",
                counts.active,
                counts.completed,
                session.status()
            )?;
        }
    }
    Ok(())
}

fn render_row(position: usize, task: &Task) -> String {
    let mark = if task.completed { "x" } else { " " };
    format!(
        "{position:>3}. [{mark}] {id} {category:<8} {text}",
        id = task.id,
        category = task.category.as_str(),
        text = task.text
    )
}

fn require(tasks: &[Task], id: TaskId) -> Result<&Task> {
    match tasks.iter().find(|task| task.id == id) {
        Some(task) => Ok(task),
        None => bail!("no task with id {id}"),
    }
}

fn require_visible(tasks: &[Task], filter: ViewFilter, id: TaskId) -> Result<()> {
    if !filter.matches(require(tasks, id)?) {
        bail!("task {id} is hidden by the filter");
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{DropTarget, ViewArgs};
    use tasklist_core::{Category, CategoryFilter, StatusFilter, serialize_tasks};
    use tasklist_store::{MemoryCache, MemoryRemote};

    type Session = TaskSession<MemoryCache, MemoryRemote>;

    fn session_with(tasks: &[Task]) -> (Arc<PersistenceCoordinator<MemoryCache, MemoryRemote>>, Session) {
        let payload = serialize_tasks(tasks).unwrap_or_else(|err| panic!("serialize: {err}"));
        let coordinator = Arc::new(PersistenceCoordinator::new(MemoryCache::with_payload(payload), None));
        let session = TaskSession::new(Arc::clone(&coordinator));
        (coordinator, session)
    }

    async fn output(session: &mut Session, command: Command) -> Result<String> {
        let mut out = Vec::new();
        execute(session, command, &mut out).await?;
        Ok(String::from_utf8(out)?)
    }

    fn seed() -> Vec<Task> {
        vec![
            Task::new(TaskId(1), "a", Category::Home),
            Task::new(TaskId(2), "b", Category::Work).with_completed(true),
            Task::new(TaskId(3), "c", Category::Home),
        ]
    }

    fn all_view() -> ViewArgs {
        ViewArgs {
            status: StatusFilter::All,
            category: CategoryFilter::All,
        }
    }

    #[tokio::test]
    async fn ls_prints_rows_counts_and_status() -> Result<()> {
        let (_, mut session) = session_with(&seed());
        let text = output(
            &mut session,
            Command::Ls {
                view: ViewArgs {
                    status: StatusFilter::Active,
                    category: CategoryFilter::All,
                },
                format: LsFormat::Table,
            },
        )
        .await?;

        let lines: Vec<&str> = text.lines().collect();
        assert_eq!(lines.len(), 3);
        assert!(lines[0].starts_with("  1. [ ] 1 Home"));
        assert!(lines[1].ends_with(" c"));
        assert_eq!(lines[2], "2 active, 1 completed | sync: local_only");
        Ok(())
    }

    #[tokio::test]
    async fn ls_json_reports_visible_tasks() -> Result<()> {
        let (_, mut session) = session_with(&seed());
        let text = output(
            &mut session,
            Command::Ls {
                view: all_view(),
                format: LsFormat::Json,
            },
        )
        .await?;

        let value: serde_json::Value = serde_json::from_str(&text)?;
        assert_eq!(value["tasks"].as_array().map(Vec::len), Some(3));
        assert_eq!(value["status"], "local_only");
        assert_eq!(value["completed"], 1);
        Ok(())
    }

    #[tokio::test]
    async fn edit_keeps_category_unless_given() -> Result<()> {
        let (coordinator, mut session) = session_with(&seed());
        let text = output(
            &mut session,
            Command::Edit {
                id: TaskId(1),
                text: vec!["renamed".into(), "task".into()],
                category: None,
            },
        )
        .await?;

        assert_eq!(text, "sync: local_only\n");
        let cached = coordinator
            .cache()
            .contents()
            .map(|raw| tasklist_core::parse_tasks(&raw))
            .unwrap_or_default();
        assert_eq!(cached[0].text, "renamed task");
        assert_eq!(cached[0].category, Category::Home);
        Ok(())
    }

    #[tokio::test]
    async fn unknown_id_is_an_error() {
        let (_, mut session) = session_with(&seed());
        let result = output(&mut session, Command::Toggle { id: TaskId(42) }).await;
        let Err(err) = result else {
            panic!("toggling an unknown id should fail");
        };
        assert_eq!(err.to_string(), "no task with id 42");
    }

    #[tokio::test]
    async fn mv_rejects_hidden_target() {
        let (_, mut session) = session_with(&seed());
        let result = output(
            &mut session,
            Command::Mv {
                id: TaskId(1),
                target: DropTarget {
                    before: Some(TaskId(2)),
                    after: None,
                },
                view: ViewArgs {
                    status: StatusFilter::All,
                    category: CategoryFilter::Only(Category::Home),
                },
            },
        )
        .await;
        assert!(result.is_err());
    }

    #[tokio::test]
    async fn mv_reorders_within_view() -> Result<()> {
        let (coordinator, mut session) = session_with(&seed());
        output(
            &mut session,
            Command::Mv {
                id: TaskId(3),
                target: DropTarget {
                    before: Some(TaskId(1)),
                    after: None,
                },
                view: ViewArgs {
                    status: StatusFilter::Active,
                    category: CategoryFilter::All,
                },
            },
        )
        .await?;

        let cached: Vec<i64> = coordinator
            .cache()
            .contents()
            .map(|raw| tasklist_core::parse_tasks(&raw))
            .unwrap_or_default()
            .iter()
            .map(|task| task.id.get())
            .collect();
        assert_eq!(cached, vec![3, 2, 1]);
        Ok(())
    }

    #[tokio::test]
    async fn clear_completed_without_completed_tasks_reports_no_change() -> Result<()> {
        let (_, mut session) = session_with(&seed()[..1]);
        let text = output(&mut session, Command::ClearCompleted).await?;
        assert_eq!(text, "nothing changed\nsync: local_only\n");
        Ok(())
    }
}
