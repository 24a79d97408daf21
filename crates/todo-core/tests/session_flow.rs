use todo_core::cli::tokenize_line;
use todo_core::commands::run_script;
use todo_core::config::Config;
use todo_core::render::Renderer;
use todo_core::{Priority, Session, TaskId};

fn run(session: &mut Session, script: &str) -> anyhow::Result<String> {
    let mut renderer = Renderer::new(Vec::new(), false);
    run_script(
        session,
        &mut renderer,
        script.lines().map(tokenize_line),
        "list",
    )?;
    Ok(String::from_utf8(renderer.into_inner()).expect("utf8 output"))
}

#[test]
fn scripted_session_lists_sorted_view_and_stats() {
    let mut session = Session::from_config(&Config::default()).expect("session");
    let out = run(
        &mut session,
        "add pri:low Buy milk\n\
         add pri:high File taxes\n\
         add Call mom\n\
         toggle 1\n\
         list",
    )
    .expect("script should succeed");

    let lines: Vec<&str> = out.lines().collect();
    assert_eq!(lines[0], "Created task 1 (low).");
    assert_eq!(lines[2], "Created task 3 (medium).");
    assert_eq!(lines[3], "Completed task 1.");

    let rows: Vec<&str> = lines[6..9].to_vec();
    assert!(rows[0].contains("File taxes"));
    assert!(rows[1].contains("Call mom"));
    assert!(rows[2].contains("Buy milk"));
    assert_eq!(lines[9], "High 1  Medium 1  Low 0  Open 2");
}

#[test]
fn blank_line_runs_default_command() {
    let mut session = Session::default();
    let out = run(&mut session, "add Solo\n\n").expect("script should succeed");
    assert!(out.contains("Solo"));
    assert!(out.ends_with("High 0  Medium 1  Low 0  Open 1\n"));
}

#[test]
fn filter_then_export_emits_json_view() {
    let mut session = Session::default();
    let out = run(
        &mut session,
        "add pri:h File taxes\n\
         add pri:l Buy milk\n\
         filter high\n\
         export",
    )
    .expect("script should succeed");

    let json = out.lines().last().expect("export line");
    let value: serde_json::Value = serde_json::from_str(json).expect("valid json");
    let tasks = value["tasks"].as_array().expect("tasks array");
    assert_eq!(tasks.len(), 1);
    assert_eq!(tasks[0]["text"], "File taxes");
    assert_eq!(tasks[0]["priority"], "high");
    assert_eq!(value["stats"]["total"], 2);
}

#[test]
fn errors_carry_the_line_number() {
    let mut session = Session::default();
    let err = run(&mut session, "add ok\nsort sideways\nadd never").unwrap_err();

    assert!(format!("{err:#}").contains("line 2"));
    assert_eq!(session.store.len(), 1);
}

#[test]
fn quit_ends_the_script_early() {
    let mut session = Session::default();
    run(&mut session, "add first\nquit\nadd second").expect("script should succeed");

    assert_eq!(session.store.len(), 1);
    assert_eq!(
        session.store.get(TaskId::new(1)).map(|t| t.priority()),
        Some(Priority::Medium)
    );
}

#[test]
fn argv_tokens_keep_inner_whitespace() {
    let mut session = Session::from_config(&Config::default()).expect("session");
    let mut renderer = Renderer::new(Vec::new(), false);
    let commands = vec![
        vec!["add".to_string(), "Buy  milk".to_string()],
        vec!["add".to_string(), "pri:high".to_string(), "a\tb".to_string()],
    ];

    run_script(&mut session, &mut renderer, commands, "list").expect("argv commands");

    assert_eq!(session.store.get(TaskId::new(1)).unwrap().text(), "Buy  milk");
    let second = session.store.get(TaskId::new(2)).unwrap();
    assert_eq!(second.text(), "a\tb");
    assert_eq!(second.priority(), Priority::High);
}
