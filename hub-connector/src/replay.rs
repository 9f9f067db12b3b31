//! Scripted world replay.
//!
//! A script is JSON lines, one [`ReplayStep`] per line. Blank lines and lines
//! starting with `#` are skipped:
//!
//! ```text
//! {"step":"tick","frame":{"player_name":"Zezima","game_state":"logged_in","world":301}}
//! {"step":"tick","repeat":20}
//! {"step":"signal","signal":{"kind":"player_despawned"}}
//! {"step":"config","patch":{"aggression":{"enabled":false}}}
//! ```

use anyhow::{Context, Result};
use serde::Deserialize;
use serde_json::Value;
use std::sync::Arc;
use tickbridge::dispatch::RecordingTransport;
use tickbridge::world::GameState;
use tickbridge::{BridgeConfig, LifecycleSignal, Pipeline, WorldFrame};
use tracing::{debug, info};

fn default_repeat() -> u32 {
    1
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(tag = "step", rename_all = "snake_case")]
pub enum ReplayStep {
    /// Advance `repeat` ticks; a frame replaces the current world first
    Tick {
        #[serde(default)]
        frame: Option<WorldFrame>,
        #[serde(default = "default_repeat")]
        repeat: u32,
    },
    Signal { signal: LifecycleSignal },
    /// Deep-merged into the current configuration
    Config { patch: Value },
}

/// Parse a JSON-lines script
pub fn parse_script(text: &str) -> Result<Vec<ReplayStep>> {
    text.lines()
        .enumerate()
        .filter(|(_, line)| {
            let line = line.trim();
            !line.is_empty() && !line.starts_with('#')
        })
        .map(|(index, line)| {
            serde_json::from_str(line.trim())
                .with_context(|| format!("Invalid replay step on line {}", index + 1))
        })
        .collect()
}

pub fn load_script(path: &str) -> Result<Vec<ReplayStep>> {
    let text = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read replay script {}", path))?;
    parse_script(&text)
}

/// Recursive object merge; non-object values replace
pub fn merge_patch(target: &mut Value, patch: &Value) {
    match (target, patch) {
        (Value::Object(target), Value::Object(patch)) => {
            for (name, value) in patch {
                merge_patch(target.entry(name.clone()).or_insert(Value::Null), value);
            }
        }
        (target, patch) => *target = patch.clone(),
    }
}

/// Totals reported at the end of a replay
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ReplaySummary {
    pub ticks: u64,
    pub signals: usize,
    pub config_keys: Vec<String>,
}

/// Feeds script steps into a pipeline.
///
/// Holds the current frame between ticks. A frame whose game state differs
/// from the previous one raises a `GameStateChanged` signal before the tick,
/// as the client would.
pub struct Replayer {
    pipeline: Pipeline,
    frame: WorldFrame,
    summary: ReplaySummary,
}

impl Replayer {
    pub fn new(pipeline: Pipeline) -> Self {
        Self {
            pipeline,
            frame: WorldFrame::default(),
            summary: ReplaySummary::default(),
        }
    }

    /// Swap in a new frame, signalling a game state change if there is one
    pub fn set_frame(&mut self, frame: WorldFrame) {
        let changed = frame.game_state != self.frame.game_state;
        self.frame = frame;
        if changed {
            let state = self.frame.game_state;
            self.signal(&LifecycleSignal::GameStateChanged { state });
        }
    }

    pub fn tick(&mut self) {
        self.pipeline.on_tick(&self.frame);
        self.summary.ticks += 1;
    }

    pub fn signal(&mut self, signal: &LifecycleSignal) {
        debug!(signal = ?signal, "Replaying signal");
        self.pipeline.on_signal(&self.frame, signal);
        self.summary.signals += 1;
    }

    /// Merge `patch` into the live configuration; returns the changed keys
    pub fn apply_config_patch(&mut self, patch: &Value) -> Result<Vec<String>> {
        let mut merged =
            serde_json::to_value(self.pipeline.config()).context("Failed to serialize config")?;
        merge_patch(&mut merged, patch);
        let config: BridgeConfig =
            serde_json::from_value(merged).context("Invalid config patch")?;

        let keys = self.pipeline.update_config(config);
        if !keys.is_empty() {
            info!(keys = ?keys, "Config updated");
        }
        self.summary.config_keys.extend(keys.iter().cloned());
        Ok(keys)
    }

    /// Apply one step without pacing; returns the config keys it changed
    pub fn apply(&mut self, step: &ReplayStep) -> Result<Vec<String>> {
        match step {
            ReplayStep::Tick { frame, repeat } => {
                if let Some(frame) = frame {
                    self.set_frame(frame.clone());
                }
                for _ in 0..*repeat {
                    self.tick();
                }
                Ok(Vec::new())
            }
            ReplayStep::Signal { signal } => {
                self.signal(signal);
                Ok(Vec::new())
            }
            ReplayStep::Config { patch } => self.apply_config_patch(patch),
        }
    }

    pub fn pipeline(&self) -> &Pipeline {
        &self.pipeline
    }

    pub fn frame(&self) -> &WorldFrame {
        &self.frame
    }

    pub fn is_logged_in(&self) -> bool {
        self.frame.game_state == GameState::LoggedIn
    }

    pub fn summary(&self) -> &ReplaySummary {
        &self.summary
    }
}

/// Run a whole script against an in-memory transport.
///
/// Returns the totals and every (path, body) the pipeline posted.
pub fn dry_run(
    config: BridgeConfig,
    steps: &[ReplayStep],
) -> Result<(ReplaySummary, Vec<(String, Value)>)> {
    let transport = Arc::new(RecordingTransport::new());
    let mut replayer = Replayer::new(Pipeline::new(config, transport.clone()));

    for step in steps {
        replayer.apply(step)?;
    }

    Ok((replayer.summary().clone(), transport.take()))
}
