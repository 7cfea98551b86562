//! Best-effort duration lookup through ffprobe.
//!
//! Duration is display-only, so every failure collapses to `None` (or the
//! [`UNKNOWN_DURATION`] sentinel) instead of an error.

use serde::Deserialize;
use std::path::Path;
use std::sync::Arc;
use tracing::{debug, warn};

use crate::media::{path_text, CommandExecutor, MediaCommandBuilder};
use crate::timecode;

/// Shown in place of a duration that could not be probed
pub const UNKNOWN_DURATION: &str = "unknown";

#[derive(Debug, Deserialize)]
struct ProbeOutput {
    format: ProbeFormat,
}

#[derive(Debug, Deserialize)]
struct ProbeFormat {
    duration: Option<ProbeSeconds>,
}

/// ffprobe prints numbers as strings in JSON mode, accept both
#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum ProbeSeconds {
    Text(String),
    Number(f64),
}

impl ProbeSeconds {
    fn whole_seconds(&self) -> Option<u64> {
        let seconds = match self {
            ProbeSeconds::Text(text) => text.trim().parse::<f64>().ok()?,
            ProbeSeconds::Number(number) => *number,
        };

        if seconds.is_finite() && seconds >= 0.0 {
            Some(seconds.trunc() as u64)
        } else {
            None
        }
    }
}

/// Extract whole seconds from ffprobe's JSON output
pub fn parse_probe_output(stdout: &[u8]) -> Option<u64> {
    let output: ProbeOutput = match serde_json::from_slice(stdout) {
        Ok(output) => output,
        Err(e) => {
            debug!("Unreadable probe output: {}", e);
            return None;
        }
    };

    output.format.duration?.whole_seconds()
}

pub struct DurationProbe {
    executor: Arc<dyn CommandExecutor>,
    commands: MediaCommandBuilder,
}

impl DurationProbe {
    pub fn new(executor: Arc<dyn CommandExecutor>, commands: MediaCommandBuilder) -> Self {
        Self { executor, commands }
    }

    /// Duration of `path` in whole seconds, `None` when it cannot be determined
    pub async fn probe(&self, path: &Path) -> Option<u64> {
        let input = match path_text(path) {
            Ok(input) => input,
            Err(e) => {
                warn!("Cannot probe {}: {}", path.display(), e);
                return None;
            }
        };

        let command = self.commands.probe(input);
        let output = match command.execute(self.executor.as_ref()).await {
            Ok(output) => output,
            Err(e) => {
                warn!("Cannot probe {}: {}", path.display(), e);
                return None;
            }
        };

        let seconds = parse_probe_output(&output.stdout);
        if seconds.is_none() {
            warn!("No duration reported for {}", path.display());
        }
        seconds
    }

    /// Formatted duration of `path`, or [`UNKNOWN_DURATION`]
    pub async fn probe_duration(&self, path: &Path) -> String {
        display_duration(self.probe(path).await)
    }
}

/// Render a probed duration for display
pub fn display_duration(duration: Option<u64>) -> String {
    duration
        .map(timecode::format)
        .unwrap_or_else(|| UNKNOWN_DURATION.to_string())
}
