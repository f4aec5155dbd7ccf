//! CLI integration tests.
//!
//! Runs the subcommands end to end against temporary files.

use card_cli::{commands, CliConfig, Command};
use card_renderer::ExportFormat;
use std::path::PathBuf;

fn block_on<F: std::future::Future>(future: F) -> F::Output {
    tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()
        .expect("runtime")
        .block_on(future)
}

fn render_command(out: PathBuf, payload: Option<&str>) -> Command {
    Command::Render {
        template: Some("forest-business".to_string()),
        payload: payload.map(str::to_string),
        out,
        filename: "card".to_string(),
        format: ExportFormat::Svg,
        scale: 1.0,
    }
}

#[test]
fn test_templates_lists_builtin_catalog() {
    let output = block_on(commands::run(&CliConfig::default(), &Command::Templates)).expect("run");
    assert!(output.contains("minimalist-white"));
    assert!(output.contains("forest-business"));
}

#[test]
fn test_render_without_payload_draws_placeholder() {
    let dir = tempfile::tempdir().expect("tempdir");
    let command = render_command(dir.path().to_path_buf(), None);

    let output = block_on(commands::run(&CliConfig::default(), &command)).expect("run");
    let path = PathBuf::from(output.trim());
    assert_eq!(path, dir.path().join("card.svg"));

    let svg = std::fs::read_to_string(path).expect("written");
    assert!(svg.contains("Jane Doe"));
    assert!(svg.contains("stroke-dasharray"));
}

#[cfg(unix)]
#[test]
fn test_render_with_payload_embeds_encoder_output() {
    let dir = tempfile::tempdir().expect("tempdir");
    let config = CliConfig {
        qr_command: "printf <svg/>".to_string(),
        ..CliConfig::default()
    };
    let command = render_command(dir.path().to_path_buf(), Some("https://example.com"));

    block_on(commands::run(&config, &command)).expect("run");
    let svg = std::fs::read_to_string(dir.path().join("card.svg")).expect("written");
    assert!(svg.contains("data:image/svg+xml;base64,"));
}

#[cfg(unix)]
#[test]
fn test_render_fails_when_encoder_fails() {
    let dir = tempfile::tempdir().expect("tempdir");
    let config = CliConfig {
        qr_command: "false".to_string(),
        ..CliConfig::default()
    };
    let command = render_command(dir.path().to_path_buf(), Some("hello"));

    assert!(block_on(commands::run(&config, &command)).is_err());
    assert!(!dir.path().join("card.svg").exists());
}

#[test]
fn test_unknown_template_is_an_error() {
    let dir = tempfile::tempdir().expect("tempdir");
    let command = Command::Render {
        template: Some("nope".to_string()),
        payload: None,
        out: dir.path().to_path_buf(),
        filename: "card".to_string(),
        format: ExportFormat::Svg,
        scale: 1.0,
    };
    assert!(block_on(commands::run(&CliConfig::default(), &command)).is_err());
}

#[test]
fn test_replay_prints_document() {
    let dir = tempfile::tempdir().expect("tempdir");
    let events = dir.path().join("events.json");
    std::fs::write(
        &events,
        r#"[
            {"type":"Click","data":{"target":{"kind":"element","id":"qr-main"}}},
            {"type":"Click","data":{"target":{"kind":"background"}}}
        ]"#,
    )
    .expect("write");

    let command = Command::Replay {
        events,
        template: None,
        tree: false,
    };
    let output = block_on(commands::run(&CliConfig::default(), &command)).expect("run");
    let document: serde_json::Value = serde_json::from_str(&output).expect("json");

    assert!(document["selected"].is_null());
    assert_eq!(document["elements"].as_array().map(Vec::len), Some(3));
}

#[test]
fn test_replay_tree_output() {
    let dir = tempfile::tempdir().expect("tempdir");
    let events = dir.path().join("events.json");
    std::fs::write(
        &events,
        r#"[{"type":"Click","data":{"target":{"kind":"element","id":"qr-main"}}}]"#,
    )
    .expect("write");

    let command = Command::Replay {
        events,
        template: None,
        tree: true,
    };
    let output = block_on(commands::run(&CliConfig::default(), &command)).expect("run");
    let tree: serde_json::Value = serde_json::from_str(&output).expect("json");

    let selected: Vec<_> = tree["nodes"]
        .as_array()
        .expect("nodes")
        .iter()
        .filter(|node| node["selected"] == serde_json::Value::Bool(true))
        .collect();
    assert_eq!(selected.len(), 1);
    assert_eq!(selected[0]["stacking"], 10);
}
