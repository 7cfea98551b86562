use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use tracing::info;
use crate::error::{Result, ClipdeckError};

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub media: MediaConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct MediaConfig {
    /// Path to ffmpeg binary
    pub ffmpeg_path: String,
    /// Path to ffprobe binary
    pub ffprobe_path: String,
    /// Extension given to extracted audio files
    pub audio_extension: String,
    /// Encoder used for audio extraction
    pub audio_codec: String,
    /// Variable bitrate quality passed as `-q:a` (0 best, 9 worst)
    pub audio_quality: String,
    /// Overwrite existing outputs (`-y`) instead of refusing (`-n`)
    pub overwrite: bool,
    /// Rewrite well-formed trim/split times to canonical `MM:SS` / `HH:MM:SS`
    /// before handing them to ffmpeg. Other text is passed through verbatim.
    pub canonicalize_times: bool,
    /// Delete the first split part when producing the second one fails
    pub discard_partial_split: bool,
    /// Directory for temporary concat manifests (system temp dir when unset)
    pub manifest_dir: Option<PathBuf>,
    /// File extensions picked up when a directory is queued for extraction
    pub extract_extensions: Vec<String>,
}

impl Default for MediaConfig {
    fn default() -> Self {
        Self {
            ffmpeg_path: "ffmpeg".to_string(),
            ffprobe_path: "ffprobe".to_string(),
            audio_extension: "mp3".to_string(),
            audio_codec: "libmp3lame".to_string(),
            audio_quality: "2".to_string(),
            overwrite: true,
            canonicalize_times: false,
            discard_partial_split: false,
            manifest_dir: None,
            extract_extensions: vec!["mp4".to_string()],
        }
    }
}

impl Config {
    /// Load `explicit` when given, else `fallback` if it exists, else defaults
    pub fn load(explicit: Option<&Path>, fallback: &Path) -> Result<Self> {
        match explicit {
            Some(path) => Self::from_file(path),
            None if fallback.exists() => {
                info!("Found {} in current directory, loading...", fallback.display());
                Self::from_file(fallback)
            }
            None => Ok(Self::default()),
        }
    }

    /// Write the default configuration to `path`, replacing whatever is there.
    /// Never reads the existing file, so a broken config can be reset.
    pub fn write_default<P: AsRef<Path>>(path: P) -> Result<()> {
        Self::default().save_to_file(path)
    }

    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .map_err(|e| ClipdeckError::Config(format!("Failed to read config file: {}", e)))?;

        toml::from_str(&content)
            .map_err(|e| ClipdeckError::Config(format!("Failed to parse config file: {}", e)))
    }

    pub fn save_to_file<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let content = toml::to_string_pretty(self)
            .map_err(|e| ClipdeckError::Config(format!("Failed to serialize config: {}", e)))?;

        std::fs::write(path, content)
            .map_err(|e| ClipdeckError::Config(format!("Failed to write config file: {}", e)))?;

        Ok(())
    }
}
