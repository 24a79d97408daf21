use std::io::Write;

use anyhow::{Context, anyhow};
use chrono::{DateTime, Utc};
use tracing::{debug, info, instrument, warn};

use crate::cli::Invocation;
use crate::render::Renderer;
use crate::session::Session;
use crate::task::{Priority, TaskId};
use crate::view::{PriorityFilter, SortMode};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Flow {
    Continue,
    Quit,
}

pub fn known_command_names() -> Vec<&'static str> {
    vec![
        "add", "toggle", "delete", "priority", "select", "filter", "sort", "list", "stats",
        "export", "help", "version", "quit", "exit",
    ]
}

pub fn expand_command_abbrev<'a>(token: &'a str, known: &[&'a str]) -> Option<&'a str> {
    if known.contains(&token) {
        return Some(token);
    }

    let mut matches = known.iter().copied().filter(|name| name.starts_with(token));
    let first = matches.next()?;
    if matches.next().is_some() {
        None
    } else {
        Some(first)
    }
}

#[instrument(skip(session, renderer, inv, now), fields(command = %inv.command))]
pub fn dispatch<W: Write>(
    session: &mut Session,
    renderer: &mut Renderer<W>,
    inv: Invocation,
    now: DateTime<Utc>,
) -> anyhow::Result<Flow> {
    debug!(args = ?inv.args, "dispatching command");

    match inv.command.as_str() {
        "add" => cmd_add(session, renderer, &inv.args, now),
        "toggle" => cmd_toggle(session, renderer, &inv.args),
        "delete" => cmd_delete(session, renderer, &inv.args),
        "priority" => cmd_priority(session, renderer, &inv.args),
        "select" => cmd_select(session, renderer, &inv.args),
        "filter" => cmd_filter(session, renderer, &inv.args),
        "sort" => cmd_sort(session, renderer, &inv.args),
        "list" => cmd_list(session, renderer),
        "stats" => {
            renderer.print_stats(&session.stats())?;
            Ok(Flow::Continue)
        }
        "export" => {
            renderer.print_json(&session.visible(), &session.stats())?;
            Ok(Flow::Continue)
        }
        "help" => cmd_help(renderer),
        "version" => {
            renderer.line(env!("CARGO_PKG_VERSION"))?;
            Ok(Flow::Continue)
        }
        "quit" | "exit" => Ok(Flow::Quit),
        other => Err(anyhow!("unknown command: {other}")),
    }
}

/// Runs one command per token list, stopping at the first error or `quit`.
/// Errors name the 1-based position of the failing command.
#[instrument(skip(session, renderer, commands))]
pub fn run_script<W, I>(
    session: &mut Session,
    renderer: &mut Renderer<W>,
    commands: I,
    default_command: &str,
) -> anyhow::Result<()>
where
    W: Write,
    I: IntoIterator<Item = Vec<String>>,
{
    for (idx, tokens) in commands.into_iter().enumerate() {
        let inv = Invocation::parse(&tokens, default_command)
            .with_context(|| format!("line {}", idx + 1))?;
        let flow = dispatch(session, renderer, inv, Utc::now())
            .with_context(|| format!("line {}", idx + 1))?;
        if flow == Flow::Quit {
            debug!(line = idx + 1, "quit requested");
            break;
        }
    }
    Ok(())
}

#[instrument(skip(session, renderer, args, now))]
fn cmd_add<W: Write>(
    session: &mut Session,
    renderer: &mut Renderer<W>,
    args: &[String],
    now: DateTime<Utc>,
) -> anyhow::Result<Flow> {
    info!("command add");

    let (priority, words) = parse_add_args(args, session.selected)?;
    let text = words.join(" ");
    let next = session.store.create(&text, priority, now);

    if next == session.store {
        renderer.line("Nothing to add: task text is empty.")?;
        return Ok(Flow::Continue);
    }

    session.store = next;
    if let Some(task) = session.store.last_created() {
        renderer.line(&format!(
            "Created task {} ({}).",
            task.id(),
            task.priority()
        ))?;
    }
    Ok(Flow::Continue)
}

/// Leading `pri:LEVEL` / `priority:LEVEL` tokens override the selected level.
fn parse_add_args(args: &[String], selected: Priority) -> anyhow::Result<(Priority, &[String])> {
    let mut priority = selected;
    let mut rest = args;

    while let Some((head, tail)) = rest.split_first() {
        let Some(level) = head
            .strip_prefix("pri:")
            .or_else(|| head.strip_prefix("priority:"))
        else {
            break;
        };
        priority = level.parse()?;
        rest = tail;
    }

    Ok((priority, rest))
}

#[instrument(skip(session, renderer, args))]
fn cmd_toggle<W: Write>(
    session: &mut Session,
    renderer: &mut Renderer<W>,
    args: &[String],
) -> anyhow::Result<Flow> {
    info!("command toggle");

    let id = parse_id_arg(args, "toggle")?;
    session.store = session.store.toggle_complete(id);

    match session.store.get(id) {
        Some(task) if task.is_completed() => renderer.line(&format!("Completed task {id}."))?,
        Some(_) => renderer.line(&format!("Reopened task {id}."))?,
        None => renderer.line(&format!("No task with id {id}."))?,
    }
    Ok(Flow::Continue)
}

#[instrument(skip(session, renderer, args))]
fn cmd_delete<W: Write>(
    session: &mut Session,
    renderer: &mut Renderer<W>,
    args: &[String],
) -> anyhow::Result<Flow> {
    info!("command delete");

    let id = parse_id_arg(args, "delete")?;
    let existed = session.store.contains(id);
    session.store = session.store.delete(id);

    if existed {
        renderer.line(&format!("Deleted task {id}."))?;
    } else {
        renderer.line(&format!("No task with id {id}."))?;
    }
    Ok(Flow::Continue)
}

#[instrument(skip(session, renderer, args))]
fn cmd_priority<W: Write>(
    session: &mut Session,
    renderer: &mut Renderer<W>,
    args: &[String],
) -> anyhow::Result<Flow> {
    info!("command priority");

    let [id_raw, level_raw] = args else {
        return Err(anyhow!("priority requires ID and LEVEL arguments"));
    };
    let id: TaskId = id_raw.parse()?;

    let level = match level_raw.parse::<Priority>() {
        Ok(level) => level,
        Err(err) => {
            warn!(error = %err, "ignoring reprioritize with invalid level");
            renderer.line(&format!("Priority unchanged: {err}."))?;
            return Ok(Flow::Continue);
        }
    };

    if !session.store.contains(id) {
        renderer.line(&format!("No task with id {id}."))?;
        return Ok(Flow::Continue);
    }

    session.store = session.store.set_priority(id, level);
    renderer.line(&format!("Task {id} priority set to {level}."))?;
    Ok(Flow::Continue)
}

fn cmd_select<W: Write>(
    session: &mut Session,
    renderer: &mut Renderer<W>,
    args: &[String],
) -> anyhow::Result<Flow> {
    if let Some(raw) = single_arg(args, "select")? {
        session.selected = raw.parse()?;
    }
    renderer.line(&format!("New tasks get priority {}.", session.selected))?;
    Ok(Flow::Continue)
}

fn cmd_filter<W: Write>(
    session: &mut Session,
    renderer: &mut Renderer<W>,
    args: &[String],
) -> anyhow::Result<Flow> {
    if let Some(raw) = single_arg(args, "filter")? {
        session.view.filter = raw.parse::<PriorityFilter>()?;
    }
    renderer.line(&format!("Filter: {}.", session.view.filter))?;
    Ok(Flow::Continue)
}

fn cmd_sort<W: Write>(
    session: &mut Session,
    renderer: &mut Renderer<W>,
    args: &[String],
) -> anyhow::Result<Flow> {
    if let Some(raw) = single_arg(args, "sort")? {
        session.view.sort = raw.parse::<SortMode>()?;
    }
    renderer.line(&format!("Sort: {}.", session.view.sort))?;
    Ok(Flow::Continue)
}

#[instrument(skip(session, renderer))]
fn cmd_list<W: Write>(session: &Session, renderer: &mut Renderer<W>) -> anyhow::Result<Flow> {
    let rows = session.visible();
    debug!(
        shown = rows.len(),
        total = session.store.len(),
        filter = %session.view.filter,
        sort = %session.view.sort,
        "listing tasks"
    );

    renderer.print_task_table(&rows)?;
    renderer.print_stats(&session.stats())?;
    Ok(Flow::Continue)
}

fn cmd_help<W: Write>(renderer: &mut Renderer<W>) -> anyhow::Result<Flow> {
    for line in [
        "add [pri:LEVEL] TEXT      create a task (LEVEL: high, medium, low)",
        "toggle ID                 mark done / not done",
        "delete ID                 remove a task",
        "priority ID LEVEL         change a task's priority",
        "select [LEVEL]            priority for new tasks",
        "filter [all|LEVEL]        show one priority or all",
        "sort [priority|created|alphabetical]",
        "list | stats | export     show tasks, counts, or JSON",
        "quit                      leave",
    ] {
        renderer.line(line)?;
    }
    Ok(Flow::Continue)
}

fn parse_id_arg(args: &[String], command: &str) -> anyhow::Result<TaskId> {
    let [raw] = args else {
        return Err(anyhow!("{command} requires exactly one task ID"));
    };
    raw.parse()
}

fn single_arg<'a>(args: &'a [String], command: &str) -> anyhow::Result<Option<&'a str>> {
    match args {
        [] => Ok(None),
        [raw] => Ok(Some(raw.as_str())),
        _ => Err(anyhow!("{command} takes at most one argument")),
    }
}
