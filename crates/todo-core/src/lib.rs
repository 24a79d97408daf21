pub mod cli;
pub mod commands;
pub mod config;
pub mod render;
pub mod session;
pub mod stats;
pub mod store;
pub mod task;
pub mod view;

use std::ffi::OsString;
use std::fs;
use std::io::{
  self,
  BufRead,
  IsTerminal
};

use anyhow::Context;
use chrono::Utc;
use clap::Parser;
use tracing::{
  debug,
  info
};

pub use session::Session;
pub use stats::{
  Stats,
  stats
};
pub use store::TaskStore;
pub use task::{
  Priority,
  Task,
  TaskId
};
pub use view::{
  PriorityFilter,
  SortMode,
  ViewSpec,
  build_view
};

#[tracing::instrument(skip_all)]
pub fn run(
  raw_args: Vec<OsString>
) -> anyhow::Result<()> {
  let pre =
    cli::preprocess_args(&raw_args)?;
  let cli = cli::GlobalCli::parse_from(
    pre.cleaned_args
  );

  cli::init_tracing(
    cli.verbose,
    cli.quiet
  )?;

  info!(
    verbose = cli.verbose,
    quiet = cli.quiet,
    "starting todo"
  );
  debug!(?pre.rc_overrides, "preprocessed rc overrides");

  let mut cfg = config::Config::load(
    cli.todorc.as_deref()
  )?;
  cfg.apply_overrides(
    pre.rc_overrides.into_iter().chain(
      cli
        .rc_overrides
        .into_iter()
        .map(|kv| (kv.key, kv.value))
    )
  );

  let mut session =
    Session::from_config(&cfg)
      .context(
        "failed to apply configured \
         defaults"
      )?;
  let mut renderer =
    render::Renderer::stdout(&cfg)?;
  let default_command = cfg
    .get("default.command")
    .unwrap_or_else(|| {
      "list".to_string()
    });

  if let Some(path) = cli.script {
    let text = fs::read_to_string(
      &path
    )
    .with_context(|| {
      format!(
        "failed to read script {}",
        path.display()
      )
    })?;
    commands::run_script(
      &mut session,
      &mut renderer,
      text.lines().map(cli::tokenize_line),
      &default_command
    )
    .with_context(|| {
      format!(
        "script {} failed",
        path.display()
      )
    })?;
  } else if !cli.rest.is_empty() {
    commands::run_script(
      &mut session,
      &mut renderer,
      cli::split_commands(cli.rest),
      &default_command
    )?;
  } else if io::stdin().is_terminal() {
    let prompt = cfg
      .get("prompt")
      .unwrap_or_default();
    interactive(
      &mut session,
      &mut renderer,
      &default_command,
      &prompt
    )?;
  } else {
    let lines = io::stdin()
      .lock()
      .lines()
      .collect::<Result<Vec<_>, _>>()
      .context(
        "failed to read commands \
         from stdin"
      )?;
    commands::run_script(
      &mut session,
      &mut renderer,
      lines
        .iter()
        .map(|line| {
          cli::tokenize_line(line)
        }),
      &default_command
    )?;
  }

  info!(
    tasks = session.store.len(),
    "done"
  );
  Ok(())
}

/// Prompt loop. Command errors are reported and the loop keeps going.
#[tracing::instrument(skip(
  session, renderer
))]
fn interactive(
  session: &mut Session,
  renderer: &mut render::Renderer<
    io::Stdout
  >,
  default_command: &str,
  prompt: &str
) -> anyhow::Result<()> {
  let stdin = io::stdin();
  let mut line = String::new();

  loop {
    renderer.prompt(prompt)?;

    line.clear();
    if stdin.lock().read_line(&mut line)?
      == 0
    {
      debug!("stdin closed");
      return renderer.line("");
    }

    let outcome =
      cli::Invocation::parse_line(
        &line,
        default_command
      )
      .and_then(|inv| {
        commands::dispatch(
          session,
          renderer,
          inv,
          Utc::now()
        )
      });

    match outcome {
      | Ok(commands::Flow::Quit) => {
        return Ok(());
      }
      | Ok(commands::Flow::Continue) => {}
      | Err(err) => {
        eprintln!("error: {err:#}");
      }
    }
  }
}
