//! Scene Replay
//!
//! Replays a scripted sequence of commands against one document and prints
//! the resulting hierarchy and history. Useful for reproducing editor bugs
//! without a UI.
//!
//! # Usage
//!
//! ```bash
//! cargo run --bin scene-replay -- script.json [--config engine.json] [--scene level.scene.json]
//! ```
//!
//! The script is a JSON array of steps:
//!
//! ```json
//! [
//!   { "command": "scene.createNode", "args": { "nodeType": "sprite" } },
//!   { "command": "scene.renameNode", "args": { "name": "Hero" } },
//!   { "command": "history.undo" }
//! ]
//! ```
//!
//! Without `--scene` an empty document is created. Set `RUST_LOG` to
//! override the configured log filter.

use anyhow::{bail, Context};
use clap::Parser;
use serde::Deserialize;
use serde_json::{json, Value};
use stagehand_core::collaborators::Collaborators;
use stagehand_core::{CommandError, EditorSession, EngineConfig};
use std::path::PathBuf;

#[derive(Debug, Deserialize)]
struct Step {
    command: String,
    #[serde(default)]
    args: Value,
}

/// Replay a scripted command sequence against one document
#[derive(Debug, Parser)]
#[command(name = "scene-replay", version, about)]
struct Args {
    /// JSON array of `{ "command", "args" }` steps
    #[arg(value_name = "SCRIPT")]
    script: PathBuf,

    /// Engine config file (JSON)
    #[arg(long, value_name = "PATH")]
    config: Option<PathBuf>,

    /// Open this scene instead of starting from an empty document
    #[arg(long, value_name = "PATH")]
    scene: Option<PathBuf>,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args = Args::parse();

    let config = match &args.config {
        Some(path) => EngineConfig::load(path)
            .await
            .with_context(|| format!("Failed to load config from {}", path.display()))?,
        None => EngineConfig::default(),
    };

    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(&config.log_filter)),
        )
        .with_writer(std::io::stderr)
        .init();

    let script = tokio::fs::read_to_string(&args.script)
        .await
        .with_context(|| format!("Failed to read script {}", args.script.display()))?;
    let steps: Vec<Step> = serde_json::from_str(&script).context("Script is not a list of steps")?;

    let session = EditorSession::new(config, Collaborators::default());
    let scene_id = match &args.scene {
        Some(path) => session.open_document(path).await?,
        None => session.new_document("Untitled"),
    };
    tracing::info!("Replaying {} steps against {}", steps.len(), scene_id);

    let mut blocked = 0;
    let mut failed = 0;
    for (index, step) in steps.iter().enumerate() {
        match session.run_registered(&step.command, step.args.clone()).await {
            Ok(outcome) => {
                let payload = outcome.payload.unwrap_or(Value::Null);
                tracing::info!(
                    "#{} {}: did_mutate={} payload={}",
                    index,
                    step.command,
                    outcome.did_mutate,
                    payload
                );
            }
            Err(CommandError::PreconditionFailed { reason, scope }) => {
                blocked += 1;
                tracing::warn!("#{} {} blocked ({:?}): {}", index, step.command, scope, reason);
            }
            Err(e) => {
                failed += 1;
                tracing::error!("#{} {} failed: {}", index, step.command, e);
            }
        }
    }

    let service = session
        .document(&scene_id)
        .context("Replayed document was closed by the script")?;
    let state = session.state();
    let report = json!({
        "sceneId": scene_id,
        "steps": steps.len(),
        "blocked": blocked,
        "failed": failed,
        "descriptor": state.scenes.descriptors.get(&scene_id),
        "hierarchy": state.scenes.hierarchies.get(&scene_id).map(|h| h.as_ref()),
        "selection": state.selection.as_ref(),
        "history": service.history_labels().await,
    });
    println!("{}", serde_json::to_string_pretty(&report)?);

    if failed > 0 {
        bail!("{} step(s) failed", failed);
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn test_args_definition_is_valid() {
        Args::command().debug_assert();
    }

    #[test]
    fn test_parses_script_and_flags() {
        let args = Args::try_parse_from([
            "scene-replay",
            "steps.json",
            "--scene",
            "level.scene.json",
            "--config",
            "engine.json",
        ])
        .unwrap();
        assert_eq!(args.script, PathBuf::from("steps.json"));
        assert_eq!(args.scene, Some(PathBuf::from("level.scene.json")));
        assert_eq!(args.config, Some(PathBuf::from("engine.json")));

        assert!(Args::try_parse_from(["scene-replay"]).is_err());
        assert!(Args::try_parse_from(["scene-replay", "a.json", "--verbose"]).is_err());
    }
}
