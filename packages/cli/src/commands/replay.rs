//! Replay a scripted session against a diagram client.
//!
//! A script has one JSON step per line:
//!
//! ```text
//! {"received": {"clientId": "c1", "action": {"kind": "setModel", "newRoot": {...}}}}
//! {"local": {"kind": "elementSelected", "selectedElementsIDs": ["n1"], "deselectedElementsIDs": []}}
//! {"received": "{\"action\": {\"kind\": \"undo\"}}"}
//! ```
//!
//! `local` steps are dispatched as if the renderer produced them; `received` steps
//! are fed through `message_received` as if the authority sent them (a string is
//! delivered as a text payload). Blank lines and lines starting with `#` are skipped.

use anyhow::{Context, Result};
use clap::Args;
use colored::Colorize;
use serde::Deserialize;
use serde_json::Value;
use std::path::PathBuf;
use trellis_editor::Action;
use trellis_sync::{
    ChannelTransport, DiagramServer, DiagramServerConfig, DirectoryExportSink, InboundMessage,
};

const OUTGOING_CAPACITY: usize = 256;

#[derive(Debug, Args)]
pub struct ReplayArgs {
    /// Script file (one JSON step per line)
    pub script: PathBuf,

    /// Config file (defaults to trellis.config.json in the working directory)
    #[arg(short, long)]
    pub config: Option<PathBuf>,

    /// Directory where exported diagrams are saved
    #[arg(short, long)]
    pub export_dir: Option<PathBuf>,

    /// Print the final model as JSON
    #[arg(short, long)]
    pub print_model: bool,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum ScriptStep {
    Local(Action),
    Received(Value),
}

/// What one script step did
#[derive(Debug, Clone, PartialEq)]
pub struct StepOutcome {
    pub line: usize,
    pub description: String,
    /// Envelopes sent to the authority while the step ran (JSON text)
    pub sent: Vec<String>,
    pub model_changed: bool,
}

pub fn parse_script(script: &str) -> Result<Vec<(usize, ScriptStep)>> {
    script
        .lines()
        .enumerate()
        .map(|(i, line)| (i + 1, line.trim()))
        .filter(|(_, line)| !line.is_empty() && !line.starts_with('#'))
        .map(|(number, line)| {
            let step = serde_json::from_str(line)
                .with_context(|| format!("Invalid script step on line {}", number))?;
            Ok((number, step))
        })
        .collect()
}

/// Feed every step into `server`, collecting what each one sent
pub fn run_script(
    server: &mut DiagramServer,
    outgoing: &mut tokio::sync::mpsc::Receiver<String>,
    steps: Vec<(usize, ScriptStep)>,
) -> Vec<StepOutcome> {
    steps
        .into_iter()
        .map(|(line, step)| {
            let (description, model_changed) = match step {
                ScriptStep::Local(action) => {
                    let result = server.dispatch(&action);
                    (format!("local {}", action.kind()), result.updated())
                }
                ScriptStep::Received(payload) => {
                    let payload = match payload {
                        Value::String(text) => InboundMessage::Text(text),
                        other => InboundMessage::Json(other),
                    };
                    match server.message_received(payload) {
                        Some(result) => ("received".to_string(), result.updated()),
                        None => ("received (discarded)".to_string(), false),
                    }
                }
            };

            let mut sent = Vec::new();
            while let Ok(text) = outgoing.try_recv() {
                sent.push(text);
            }

            StepOutcome {
                line,
                description,
                sent,
                model_changed,
            }
        })
        .collect()
}

pub fn replay(args: ReplayArgs, cwd: &str) -> Result<()> {
    let config = match &args.config {
        Some(path) => DiagramServerConfig::load_file(path)
            .with_context(|| format!("Failed to load config {}", path.display()))?,
        None => DiagramServerConfig::load(cwd)?,
    };

    let script = std::fs::read_to_string(&args.script)
        .with_context(|| format!("Failed to read script {}", args.script.display()))?;
    let steps = parse_script(&script)?;
    tracing::debug!("Loaded {} steps from {}", steps.len(), args.script.display());

    let (transport, mut outgoing) = ChannelTransport::channel(OUTGOING_CAPACITY);
    let mut server = DiagramServer::new(config, Box::new(transport))?;
    if let Some(dir) = &args.export_dir {
        server.set_export_sink(Box::new(DirectoryExportSink::new(dir)));
    }

    println!(
        "{} {} ({} steps, client {})",
        "▶".bright_blue(),
        args.script.display(),
        steps.len(),
        server.client_id().bright_white()
    );

    for outcome in run_script(&mut server, &mut outgoing, steps) {
        let marker = if outcome.model_changed {
            "✓".green()
        } else {
            "·".dimmed()
        };
        println!(
            "  {} {:>4}  {}",
            marker,
            outcome.line,
            outcome.description
        );
        for text in &outcome.sent {
            println!("        {} {}", "→".cyan(), text);
        }
    }

    let model = server.model();
    println!();
    println!(
        "{} model {} ({} elements, {} undo / {} redo)",
        "✅".green(),
        model.root().id.bright_white(),
        model.index().len(),
        server.dispatcher().command_stack().undo_levels(),
        server.dispatcher().command_stack().redo_levels()
    );

    if args.print_model {
        println!("{}", serde_json::to_string_pretty(model.root())?);
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    const SCRIPT: &str = r#"
# authority pushes the model
{"received": {"clientId": "c1", "action": {"kind": "setModel", "newRoot": {"id": "g", "type": "graph", "children": [{"id": "n1", "type": "node"}]}}}}
{"local": {"kind": "elementSelected", "selectedElementsIDs": ["n1"], "deselectedElementsIDs": []}}
{"received": "{\"clientId\": \"other\", \"action\": {\"kind\": \"undo\"}}"}
{"received": "{\"action\": {\"kind\": \"undo\"}}"}
"#;

    fn server() -> (DiagramServer, tokio::sync::mpsc::Receiver<String>) {
        let (transport, outgoing) = ChannelTransport::channel(16);
        let server = DiagramServer::new(DiagramServerConfig::new("c1"), Box::new(transport)).unwrap();
        (server, outgoing)
    }

    #[test]
    fn test_parse_script_skips_comments() {
        let steps = parse_script(SCRIPT).unwrap();
        assert_eq!(steps.len(), 4);
        assert_eq!(steps[0].0, 3);
        assert!(matches!(steps[1].1, ScriptStep::Local(Action::Select(_))));
        assert!(matches!(steps[2].1, ScriptStep::Received(Value::String(_))));
    }

    #[test]
    fn test_parse_script_reports_line() {
        let err = parse_script("{\"local\": {\"kind\": \"undo\"}}\n{\"bogus\": 1}").unwrap_err();
        assert!(err.to_string().contains("line 2"));
    }

    #[test]
    fn test_run_script() {
        let (mut server, mut outgoing) = server();
        let outcomes = run_script(&mut server, &mut outgoing, parse_script(SCRIPT).unwrap());

        assert!(outcomes[0].model_changed);
        assert!(outcomes[0].sent.is_empty());

        assert_eq!(outcomes[1].description, "local elementSelected");
        assert_eq!(outcomes[1].sent.len(), 1);
        assert!(outcomes[1].sent[0].contains("\"selectedElementsIDs\":[\"n1\"]"));

        assert_eq!(outcomes[2].description, "received (discarded)");
        assert!(!outcomes[2].model_changed);

        assert!(outcomes[3].model_changed);
        assert!(!server.model().get("n1").unwrap().selected);
    }

    #[test]
    fn test_replay_with_export_dir() {
        let temp = TempDir::new().unwrap();
        let script = temp.path().join("session.jsonl");
        std::fs::write(
            &script,
            r#"{"received": {"action": {"kind": "export", "svg": "<svg/>"}}}"#,
        )
        .unwrap();

        replay(
            ReplayArgs {
                script,
                config: None,
                export_dir: Some(temp.path().join("out")),
                print_model: false,
            },
            temp.path().to_str().unwrap(),
        )
        .unwrap();

        let saved = std::fs::read_to_string(temp.path().join("out").join("diagram.svg")).unwrap();
        assert_eq!(saved, "<svg/>");
    }
}
