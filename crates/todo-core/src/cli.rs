use std::ffi::OsString;
use std::io::IsTerminal;
use std::path::PathBuf;

use anyhow::anyhow;
use clap::{ArgAction, Parser};
use tracing::debug;
use tracing_subscriber::EnvFilter;

#[derive(Debug, Clone)]
pub struct PreprocessedArgs {
    pub cleaned_args: Vec<OsString>,
    pub rc_overrides: Vec<(String, String)>,
}

#[derive(Debug, Clone)]
pub struct KeyVal {
    pub key: String,
    pub value: String,
}

impl std::str::FromStr for KeyVal {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let (k, v) = s
            .split_once('=')
            .ok_or_else(|| anyhow!("expected KEY=VALUE, got: {s}"))?;
        Ok(Self {
            key: k.trim().to_string(),
            value: v.trim().to_string(),
        })
    }
}

#[derive(Parser, Debug, Clone)]
#[command(
    name = "todo",
    version,
    about = "Priority task list for the terminal",
    disable_help_subcommand = true
)]
pub struct GlobalCli {
    #[arg(short = 'v', long = "verbose", action = ArgAction::Count)]
    pub verbose: u8,

    #[arg(short = 'q', long = "quiet", action = ArgAction::Count)]
    pub quiet: u8,

    #[arg(
        long = "rc",
        value_parser = clap::builder::ValueParser::new(|s: &str| s.parse::<KeyVal>()),
        action = ArgAction::Append
    )]
    pub rc_overrides: Vec<KeyVal>,

    #[arg(long = "todorc")]
    pub todorc: Option<PathBuf>,

    /// Read commands from a file instead of standard input.
    #[arg(long = "script", conflicts_with = "rest")]
    pub script: Option<PathBuf>,

    /// Commands to run, separated by a standalone `;`.
    #[arg(trailing_var_arg = true, allow_hyphen_values = true)]
    pub rest: Vec<OsString>,
}

pub fn init_tracing(verbose: u8, quiet: u8) -> anyhow::Result<()> {
    let default_level = if quiet >= 2 {
        "error"
    } else if quiet == 1 {
        "warn"
    } else if verbose >= 3 {
        "trace"
    } else if verbose == 2 {
        "debug"
    } else if verbose == 1 {
        "info"
    } else {
        "warn"
    };

    let env_filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(default_level))
        .map_err(|e| anyhow!("invalid RUST_LOG / log filter: {e}"))?;

    let init_result = tracing_subscriber::fmt()
        .with_env_filter(env_filter)
        .with_writer(std::io::stderr)
        .with_target(true)
        .with_level(true)
        .with_ansi(std::io::stderr().is_terminal())
        .try_init();

    if let Err(err) = init_result {
        debug!(error = %err, "tracing subscriber already set, continuing");
    }

    Ok(())
}

/// Pulls positional `rc.KEY=VALUE` / `rc.KEY:VALUE` overrides out of argv.
#[tracing::instrument(skip_all)]
pub fn preprocess_args(raw: &[OsString]) -> anyhow::Result<PreprocessedArgs> {
    let mut cleaned = Vec::with_capacity(raw.len());
    let mut overrides: Vec<(String, String)> = Vec::new();

    let mut iter = raw.iter().cloned();
    if let Some(bin) = iter.next() {
        cleaned.push(bin);
    }

    for arg in iter {
        let s = arg.to_string_lossy();
        if let Some(rest) = s.strip_prefix("rc.") {
            let parsed = rest
                .split_once('=')
                .or_else(|| rest.split_once(':'))
                .map(|(k, v)| (format!("rc.{k}"), v.to_string()));

            if let Some((k, v)) = parsed {
                debug!(key = %k, value = %v, "captured positional rc override");
                overrides.push((k, v));
                continue;
            }
        }

        cleaned.push(arg);
    }

    Ok(PreprocessedArgs {
        cleaned_args: cleaned,
        rc_overrides: overrides,
    })
}

/// Splits trailing argv into one token list per command.
pub fn split_commands(rest: Vec<OsString>) -> Vec<Vec<String>> {
    let mut commands = Vec::new();
    let mut current = Vec::new();

    for arg in rest {
        let token = arg.to_string_lossy().to_string();
        if token == ";" {
            if !current.is_empty() {
                commands.push(std::mem::take(&mut current));
            }
            continue;
        }
        current.push(token);
    }

    if !current.is_empty() {
        commands.push(current);
    }
    commands
}

/// Whitespace tokenization for typed or scripted lines.
pub fn tokenize_line(line: &str) -> Vec<String> {
    line.split_whitespace().map(ToString::to_string).collect()
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Invocation {
    pub command: String,
    pub args: Vec<String>,
}

impl Invocation {
    /// Resolves the first token to a command name. Blank input maps to
    /// `default_command`.
    #[tracing::instrument(skip(tokens))]
    pub fn parse(tokens: &[String], default_command: &str) -> anyhow::Result<Self> {
        let Some((head, args)) = tokens.split_first() else {
            debug!(command = %default_command, "no explicit command, using default");
            return Ok(Self {
                command: default_command.to_string(),
                args: vec![],
            });
        };

        let lowered = head.to_ascii_lowercase();
        let known = crate::commands::known_command_names();
        let command = crate::commands::expand_command_abbrev(&lowered, &known)
            .ok_or_else(|| {
                let candidates: Vec<&str> = known
                    .iter()
                    .copied()
                    .filter(|name| name.starts_with(lowered.as_str()))
                    .collect();
                if candidates.is_empty() {
                    anyhow!("unknown command: {head}")
                } else {
                    anyhow!(
                        "ambiguous command: {head} (could be {})",
                        candidates.join(", ")
                    )
                }
            })?;

        debug!(token = %head, expanded = %command, "resolved command token");
        Ok(Self {
            command: command.to_string(),
            args: args.to_vec(),
        })
    }

    pub fn parse_line(line: &str, default_command: &str) -> anyhow::Result<Self> {
        Self::parse(&tokenize_line(line), default_command)
    }
}

#[cfg(test)]
mod tests {
    use std::ffi::OsString;

    use clap::Parser;

    use super::{GlobalCli, Invocation, preprocess_args, split_commands};

    fn os(args: &[&str]) -> Vec<OsString> {
        args.iter().map(OsString::from).collect()
    }

    #[test]
    fn positional_rc_overrides_are_extracted() {
        let pre = preprocess_args(&os(&[
            "todo",
            "rc.color=off",
            "rc.default.sort:created",
            "list",
        ]))
        .unwrap();

        assert_eq!(pre.cleaned_args, os(&["todo", "list"]));
        assert_eq!(
            pre.rc_overrides,
            vec![
                ("rc.color".to_string(), "off".to_string()),
                ("rc.default.sort".to_string(), "created".to_string()),
            ]
        );
    }

    #[test]
    fn global_flags_and_trailing_commands() {
        let cli = GlobalCli::parse_from(os(&[
            "todo", "-vv", "--rc", "color=off", "add", "Buy", "milk", ";", "list",
        ]));

        assert_eq!(cli.verbose, 2);
        assert_eq!(cli.rc_overrides[0].key, "color");
        assert_eq!(
            split_commands(cli.rest),
            vec![
                vec!["add".to_string(), "Buy".to_string(), "milk".to_string()],
                vec!["list".to_string()],
            ]
        );
    }

    #[test]
    fn split_skips_empty_segments() {
        assert_eq!(
            split_commands(os(&[";", "list", ";", ";"])),
            vec![vec!["list".to_string()]]
        );
        assert!(split_commands(vec![]).is_empty());
    }

    #[test]
    fn abbreviations_resolve_when_unique() {
        let inv = Invocation::parse_line("TOG 3", "list").unwrap();
        assert_eq!(inv.command, "toggle");
        assert_eq!(inv.args, vec!["3".to_string()]);

        assert_eq!(Invocation::parse_line("   ", "list").unwrap().command, "list");

        let err = Invocation::parse_line("s", "list").unwrap_err();
        assert!(err.to_string().starts_with("ambiguous command"));
        assert!(Invocation::parse_line("frobnicate", "list").is_err());
    }
}
