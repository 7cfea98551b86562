use async_trait::async_trait;
use std::process::Stdio;
use tokio::process::Command;
use tracing::debug;

use crate::error::{ClipdeckError, Result};
use super::{CommandExecutor, CommandOutput};

/// External tool invocation: program, argument list and a short label used
/// in logs and error messages
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MediaCommand {
    pub program: String,
    pub args: Vec<String>,
    pub description: String,
}

impl MediaCommand {
    /// Create a new media processing command
    pub fn new<S1: Into<String>, S2: Into<String>>(program: S1, description: S2) -> Self {
        Self {
            program: program.into(),
            args: Vec::new(),
            description: description.into(),
        }
    }

    /// Add an argument
    pub fn arg<S: Into<String>>(mut self, arg: S) -> Self {
        self.args.push(arg.into());
        self
    }

    /// Add multiple arguments
    pub fn args<I, S>(mut self, args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.args.extend(args.into_iter().map(|s| s.into()));
        self
    }

    /// Add input file
    pub fn input<S: Into<String>>(self, path: S) -> Self {
        self.arg("-i").arg(path)
    }

    /// Add output file
    pub fn output<S: Into<String>>(self, path: S) -> Self {
        self.arg(path)
    }

    /// `-y` to overwrite an existing output, `-n` to refuse
    pub fn overwrite(self, overwrite: bool) -> Self {
        self.arg(if overwrite { "-y" } else { "-n" })
    }

    /// Disable video
    pub fn no_video(self) -> Self {
        self.arg("-vn")
    }

    /// Set audio encoder
    pub fn audio_codec<S: Into<String>>(self, codec: S) -> Self {
        self.arg("-acodec").arg(codec)
    }

    /// Variable bitrate audio quality
    pub fn audio_quality<S: Into<String>>(self, quality: S) -> Self {
        self.arg("-q:a").arg(quality)
    }

    /// Copy every stream without re-encoding
    pub fn stream_copy(self) -> Self {
        self.arg("-c").arg("copy")
    }

    /// Start reading at `time`
    pub fn seek<S: Into<String>>(self, time: S) -> Self {
        self.arg("-ss").arg(time)
    }

    /// Stop writing at position `time`
    pub fn until<S: Into<String>>(self, time: S) -> Self {
        self.arg("-to").arg(time)
    }

    /// Limit output to `time` from the start
    pub fn limit<S: Into<String>>(self, time: S) -> Self {
        self.arg("-t").arg(time)
    }

    /// Run through `executor` and fail on a non-zero exit
    pub async fn execute(&self, executor: &dyn CommandExecutor) -> Result<CommandOutput> {
        debug!("Executing {}: {} {:?}", self.description, self.program, self.args);

        executor.run(self).await?.check(&self.description)
    }
}

/// Builds the argument shapes used by the media operations
#[derive(Debug, Clone)]
pub struct MediaCommandBuilder {
    ffmpeg_path: String,
    ffprobe_path: String,
    overwrite: bool,
}

impl MediaCommandBuilder {
    pub fn new<S1: Into<String>, S2: Into<String>>(ffmpeg_path: S1, ffprobe_path: S2, overwrite: bool) -> Self {
        Self {
            ffmpeg_path: ffmpeg_path.into(),
            ffprobe_path: ffprobe_path.into(),
            overwrite,
        }
    }

    /// Strip video and re-encode audio with a lossy encoder
    pub fn extract_audio(&self, input: &str, output: &str, codec: &str, quality: &str) -> MediaCommand {
        MediaCommand::new(&self.ffmpeg_path, "Audio extraction")
            .overwrite(self.overwrite)
            .input(input)
            .no_video()
            .audio_codec(codec)
            .audio_quality(quality)
            .output(output)
    }

    /// Stream-copy concatenation of the files listed in a concat manifest
    pub fn concatenate(&self, manifest: &str, output: &str) -> MediaCommand {
        MediaCommand::new(&self.ffmpeg_path, "Concatenation")
            .overwrite(self.overwrite)
            .args(["-f", "concat", "-safe", "0"])
            .input(manifest)
            .stream_copy()
            .output(output)
    }

    /// Stream-copy the range `[start, end]`
    pub fn trim(&self, input: &str, output: &str, start: &str, end: &str) -> MediaCommand {
        MediaCommand::new(&self.ffmpeg_path, "Trim")
            .overwrite(self.overwrite)
            .input(input)
            .seek(start)
            .until(end)
            .stream_copy()
            .output(output)
    }

    /// Stream-copy everything before `point`
    pub fn split_head(&self, input: &str, output: &str, point: &str) -> MediaCommand {
        MediaCommand::new(&self.ffmpeg_path, "Split (part 1)")
            .overwrite(self.overwrite)
            .input(input)
            .limit(point)
            .stream_copy()
            .output(output)
    }

    /// Stream-copy everything from `point` on
    pub fn split_tail(&self, input: &str, output: &str, point: &str) -> MediaCommand {
        MediaCommand::new(&self.ffmpeg_path, "Split (part 2)")
            .overwrite(self.overwrite)
            .input(input)
            .seek(point)
            .stream_copy()
            .output(output)
    }

    /// JSON format and stream metadata for one file
    pub fn probe(&self, input: &str) -> MediaCommand {
        MediaCommand::new(&self.ffprobe_path, "Probe")
            .args(["-v", "quiet", "-print_format", "json", "-show_format", "-show_streams"])
            .arg(input)
    }

    /// Build version check command
    pub fn version_check(&self) -> MediaCommand {
        MediaCommand::new(&self.ffmpeg_path, "Version check")
            .arg("-version")
    }
}

/// Runs commands as real child processes
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemExecutor;

#[async_trait]
impl CommandExecutor for SystemExecutor {
    async fn run(&self, command: &MediaCommand) -> Result<CommandOutput> {
        let output = Command::new(&command.program)
            .args(&command.args)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .output()
            .await
            .map_err(|e| ClipdeckError::Spawn {
                program: command.program.clone(),
                source: e,
            })?;

        Ok(CommandOutput {
            code: output.status.code(),
            stdout: output.stdout,
            stderr: output.stderr,
        })
    }
}
