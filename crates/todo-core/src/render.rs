use std::io::{self, IsTerminal, Write};

use chrono::Local;
use serde::Serialize;
use unicode_width::UnicodeWidthStr;

use crate::config::Config;
use crate::stats::Stats;
use crate::task::{Priority, Task};

pub struct Renderer<W: Write> {
    out: W,
    color: bool,
}

impl Renderer<io::Stdout> {
    pub fn stdout(cfg: &Config) -> anyhow::Result<Self> {
        let color = color_enabled(cfg)? && io::stdout().is_terminal();
        Ok(Self::new(io::stdout(), color))
    }
}

impl<W: Write> Renderer<W> {
    pub fn new(out: W, color: bool) -> Self {
        Self { out, color }
    }

    pub fn into_inner(self) -> W {
        self.out
    }

    pub fn line(&mut self, text: &str) -> anyhow::Result<()> {
        writeln!(self.out, "{text}")?;
        Ok(())
    }

    /// Writes `text` without a newline and flushes it ahead of reading input.
    pub fn prompt(&mut self, text: &str) -> anyhow::Result<()> {
        write!(self.out, "{text}")?;
        self.out.flush()?;
        Ok(())
    }

    #[tracing::instrument(skip(self, tasks))]
    pub fn print_task_table(&mut self, tasks: &[&Task]) -> anyhow::Result<()> {
        if tasks.is_empty() {
            return self.line("No tasks.");
        }

        let headers = vec![
            "ID".to_string(),
            "Pri".to_string(),
            "Done".to_string(),
            "Description".to_string(),
            "Created".to_string(),
        ];

        let mut rows = Vec::with_capacity(tasks.len());
        for task in tasks {
            let priority = self.paint(task.priority().label(), priority_color(task.priority()));
            let done = if task.is_completed() { "x" } else { "" };
            let created = task
                .created_at()
                .with_timezone(&Local)
                .format("%Y-%m-%d %H:%M")
                .to_string();

            rows.push(vec![
                task.id().to_string(),
                priority,
                done.to_string(),
                task.text().to_string(),
                created,
            ]);
        }

        write_table(&mut self.out, headers, rows)
    }

    #[tracing::instrument(skip(self))]
    pub fn print_stats(&mut self, stats: &Stats) -> anyhow::Result<()> {
        let mut parts = Vec::with_capacity(Priority::ALL.len() + 1);
        for priority in Priority::ALL {
            let label = self.paint(priority.label(), priority_color(priority));
            parts.push(format!("{label} {}", stats.count(priority)));
        }
        parts.push(format!("Open {}", stats.total));

        writeln!(self.out, "{}", parts.join("  "))?;
        Ok(())
    }

    #[tracing::instrument(skip(self, tasks))]
    pub fn print_json(&mut self, tasks: &[&Task], stats: &Stats) -> anyhow::Result<()> {
        #[derive(Serialize)]
        struct Export<'a> {
            tasks: &'a [&'a Task],
            stats: &'a Stats,
        }

        let payload = serde_json::to_string(&Export { tasks, stats })?;
        writeln!(self.out, "{payload}")?;
        Ok(())
    }

    fn paint(&self, text: &str, code: &str) -> String {
        if !self.color {
            return text.to_string();
        }
        format!("\x1b[{code}m{text}\x1b[0m")
    }
}

fn color_enabled(cfg: &Config) -> anyhow::Result<bool> {
    Ok(cfg.get_bool("color")?.unwrap_or(true))
}

fn priority_color(priority: Priority) -> &'static str {
    match priority {
        Priority::High => "31",
        Priority::Medium => "33",
        Priority::Low => "34",
    }
}

fn write_table<W: Write>(
    mut writer: W,
    headers: Vec<String>,
    rows: Vec<Vec<String>>,
) -> anyhow::Result<()> {
    let mut widths: Vec<usize> = headers
        .iter()
        .map(|header| UnicodeWidthStr::width(header.as_str()))
        .collect();

    for row in &rows {
        for (idx, cell) in row.iter().enumerate() {
            widths[idx] = widths[idx].max(UnicodeWidthStr::width(strip_ansi(cell).as_str()));
        }
    }

    let header_line: Vec<String> = headers
        .iter()
        .zip(&widths)
        .map(|(header, width)| format!("{header:width$}"))
        .collect();
    writeln!(writer, "{}", header_line.join(" ").trim_end())?;

    let rule: Vec<String> = widths.iter().map(|width| "-".repeat(*width)).collect();
    writeln!(writer, "{}", rule.join(" "))?;

    for row in rows {
        let cells: Vec<String> = row
            .iter()
            .zip(&widths)
            .map(|(cell, width)| {
                let visible = UnicodeWidthStr::width(strip_ansi(cell).as_str());
                format!("{cell}{}", " ".repeat(width.saturating_sub(visible)))
            })
            .collect();
        writeln!(writer, "{}", cells.join(" ").trim_end())?;
    }

    Ok(())
}

fn strip_ansi(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    let mut escaped = false;

    for ch in s.chars() {
        if escaped {
            if ch == 'm' {
                escaped = false;
            }
            continue;
        }

        if ch == '\x1b' {
            escaped = true;
            continue;
        }

        out.push(ch);
    }

    out
}

#[cfg(test)]
mod tests {
    use chrono::Utc;

    use super::{Renderer, color_enabled, strip_ansi};
    use crate::config::Config;
    use crate::stats::Stats;
    use crate::store::TaskStore;
    use crate::task::Priority;

    fn rendered(f: impl FnOnce(&mut Renderer<Vec<u8>>)) -> String {
        let mut renderer = Renderer::new(Vec::new(), false);
        f(&mut renderer);
        String::from_utf8(renderer.into_inner()).unwrap()
    }

    #[test]
    fn table_aligns_wide_text() {
        let store = TaskStore::new()
            .create("短い", Priority::High, Utc::now())
            .create("plain", Priority::Low, Utc::now());
        let tasks: Vec<_> = store.tasks().collect();

        let out = rendered(|r| r.print_task_table(&tasks).unwrap());
        let lines: Vec<&str> = out.lines().collect();
        assert_eq!(lines.len(), 4);
        assert!(lines[0].starts_with("ID Pri  Done Description"));
        assert!(lines[2].contains("High"));
        assert!(lines[3].contains("plain"));
    }

    #[test]
    fn empty_table_prints_notice() {
        let out = rendered(|r| r.print_task_table(&[]).unwrap());
        assert_eq!(out, "No tasks.\n");
    }

    #[test]
    fn stats_line_lists_each_level() {
        let stats = Stats {
            high: 1,
            medium: 2,
            low: 0,
            total: 3,
        };
        let out = rendered(|r| r.print_stats(&stats).unwrap());
        assert_eq!(out, "High 1  Medium 2  Low 0  Open 3\n");
    }

    #[test]
    fn paint_is_stripped_for_width() {
        let renderer = Renderer::new(Vec::new(), true);
        let painted = renderer.paint("High", "31");
        assert_ne!(painted, "High");
        assert_eq!(strip_ansi(&painted), "High");
    }

    #[test]
    fn prompt_has_no_trailing_newline() {
        let out = rendered(|r| {
            r.prompt("todo> ").unwrap();
            r.line("").unwrap();
        });
        assert_eq!(out, "todo> \n");
    }

    #[test]
    fn color_setting_uses_config_switch() {
        let mut cfg = Config::default();
        assert!(color_enabled(&cfg).unwrap());

        for (raw, expected) in [("y", true), ("off", false), ("0", false)] {
            cfg.apply_overrides([("color".to_string(), raw.to_string())]);
            assert_eq!(color_enabled(&cfg).unwrap(), expected, "{raw}");
        }

        cfg.apply_overrides([("color".to_string(), "sometimes".to_string())]);
        assert!(color_enabled(&cfg).is_err());
    }
}
