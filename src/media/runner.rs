use std::ffi::OsString;
use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tempfile::NamedTempFile;
use tracing::{debug, info, warn};

use crate::config::MediaConfig;
use crate::error::{ClipdeckError, Result};
use crate::timecode;
use super::{path_text, CommandExecutor, MediaCommandBuilder};

/// One media operation and its inputs
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum OperationRequest {
    Extract {
        source: PathBuf,
    },
    Concatenate {
        sources: Vec<PathBuf>,
        destination: PathBuf,
    },
    Trim {
        source: PathBuf,
        destination: PathBuf,
        start: String,
        end: String,
    },
    Split {
        source: PathBuf,
        split_point: String,
    },
}

/// Files produced by a successful operation
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum OperationOutput {
    Single(PathBuf),
    Pair(PathBuf, PathBuf),
}

impl OperationOutput {
    pub fn paths(&self) -> Vec<&Path> {
        match self {
            OperationOutput::Single(path) => vec![path.as_path()],
            OperationOutput::Pair(first, second) => vec![first.as_path(), second.as_path()],
        }
    }
}

/// Runs extract, concatenate, trim and split through ffmpeg
pub struct OperationRunner {
    config: MediaConfig,
    executor: Arc<dyn CommandExecutor>,
    commands: MediaCommandBuilder,
}

impl OperationRunner {
    pub fn new(config: MediaConfig, executor: Arc<dyn CommandExecutor>) -> Self {
        let commands = MediaCommandBuilder::new(&config.ffmpeg_path, &config.ffprobe_path, config.overwrite);

        Self {
            config,
            executor,
            commands,
        }
    }

    /// Execute any operation request
    pub async fn run(&self, request: &OperationRequest) -> Result<OperationOutput> {
        match request {
            OperationRequest::Extract { source } => {
                self.extract(source).await.map(OperationOutput::Single)
            }
            OperationRequest::Concatenate { sources, destination } => {
                self.merge(sources, destination).await.map(OperationOutput::Single)
            }
            OperationRequest::Trim { source, destination, start, end } => {
                self.trim(source, destination, start, end).await.map(OperationOutput::Single)
            }
            OperationRequest::Split { source, split_point } => {
                let (first, second) = self.split(source, split_point).await?;
                Ok(OperationOutput::Pair(first, second))
            }
        }
    }

    /// Extract the audio track next to `source`, swapping the extension.
    ///
    /// An existing file at the output path is overwritten.
    pub async fn extract(&self, source: &Path) -> Result<PathBuf> {
        let output = source.with_extension(&self.config.audio_extension);
        info!("Extracting audio from {} to {}", source.display(), output.display());

        let command = self.commands.extract_audio(
            path_text(source)?,
            path_text(&output)?,
            &self.config.audio_codec,
            &self.config.audio_quality,
        );
        command.execute(self.executor.as_ref()).await?;

        info!("Audio extraction completed");
        Ok(output)
    }

    /// Concatenate `sources` in order into `destination` without re-encoding.
    ///
    /// The number of sources is not checked here. The temporary manifest is
    /// removed before returning, whether or not ffmpeg succeeded.
    pub async fn merge(&self, sources: &[PathBuf], destination: &Path) -> Result<PathBuf> {
        info!("Concatenating {} files into {}", sources.len(), destination.display());

        let contents = concat_manifest(sources)?;
        let output = path_text(destination)?;

        let mut manifest = self.create_manifest()?;
        manifest.write_all(contents.as_bytes())?;
        manifest.flush()?;
        debug!("Concat manifest at {}", manifest.path().display());

        let command = self.commands.concatenate(path_text(manifest.path())?, output);
        let outcome = command.execute(self.executor.as_ref()).await;

        if let Err(e) = manifest.close() {
            warn!("Failed to remove concat manifest: {}", e);
        }
        outcome?;

        info!("Concatenation completed");
        Ok(destination.to_path_buf())
    }

    /// Stream-copy `[start, end]` of `source` into `destination`
    pub async fn trim(&self, source: &Path, destination: &Path, start: &str, end: &str) -> Result<PathBuf> {
        let start = self.time_arg(start);
        let end = self.time_arg(end);
        info!("Trimming {} from {} to {} into {}", source.display(), start, end, destination.display());

        let command = self.commands.trim(path_text(source)?, path_text(destination)?, &start, &end);
        command.execute(self.executor.as_ref()).await?;

        info!("Trim completed");
        Ok(destination.to_path_buf())
    }

    /// Split `source` at `split_point` into `<stem>_part1` and `<stem>_part2`.
    ///
    /// The two halves are produced by independent invocations. When the
    /// second fails, the first is left on disk unless
    /// `discard_partial_split` is set.
    pub async fn split(&self, source: &Path, split_point: &str) -> Result<(PathBuf, PathBuf)> {
        let point = self.time_arg(split_point);
        let (first, second) = split_paths(source)?;
        info!("Splitting {} at {}", source.display(), point);

        let input = path_text(source)?;
        let head = self.commands.split_head(input, path_text(&first)?, &point);
        let tail = self.commands.split_tail(input, path_text(&second)?, &point);

        head.execute(self.executor.as_ref()).await?;

        if let Err(e) = tail.execute(self.executor.as_ref()).await {
            if self.config.discard_partial_split {
                match std::fs::remove_file(&first) {
                    Ok(()) => debug!("Removed partial split output {}", first.display()),
                    Err(remove_err) => warn!("Failed to remove {}: {}", first.display(), remove_err),
                }
            } else {
                warn!("Second half failed, leaving {} in place", first.display());
            }
            return Err(e);
        }

        info!("Split completed: {} / {}", first.display(), second.display());
        Ok((first, second))
    }

    /// Check if ffmpeg is available
    pub async fn check_availability(&self) -> Result<()> {
        self.version_info().await?;
        info!("FFmpeg is available");
        Ok(())
    }

    /// First line of `ffmpeg -version`
    pub async fn version_info(&self) -> Result<String> {
        let output = self.commands.version_check().execute(self.executor.as_ref()).await?;
        let version_info = String::from_utf8_lossy(&output.stdout);

        Ok(version_info.lines().next().unwrap_or("Unknown version").to_string())
    }

    fn time_arg(&self, text: &str) -> String {
        if self.config.canonicalize_times {
            if let Some(canonical) = timecode::canonicalize(text) {
                return canonical;
            }
            debug!("Passing non-canonical time '{}' through unchanged", text);
        }
        text.to_string()
    }

    fn create_manifest(&self) -> Result<NamedTempFile> {
        let mut builder = tempfile::Builder::new();
        builder.prefix("clipdeck-concat-").suffix(".txt");

        let manifest = match &self.config.manifest_dir {
            Some(dir) => builder.tempfile_in(dir)?,
            None => builder.tempfile()?,
        };
        Ok(manifest)
    }
}

/// One `file '<path>'` line per source, in order.
///
/// ffmpeg resolves relative entries against the manifest's own directory,
/// so every source is written as an absolute path.
pub fn concat_manifest(sources: &[PathBuf]) -> Result<String> {
    let mut manifest = String::new();
    for source in sources {
        let absolute = std::path::absolute(source)?;
        let path = path_text(&absolute)?;
        manifest.push_str(&format!("file '{}'\n", path.replace('\'', r"'\''")));
    }
    Ok(manifest)
}

/// Sibling paths with `_part1` / `_part2` inserted before the extension
pub fn split_paths(source: &Path) -> Result<(PathBuf, PathBuf)> {
    let stem = source.file_stem().ok_or_else(|| {
        ClipdeckError::Precondition(format!("Not a file path: {}", source.display()))
    })?;

    let sibling = |suffix: &str| {
        let mut name = OsString::from(stem);
        name.push(suffix);
        if let Some(extension) = source.extension() {
            name.push(".");
            name.push(extension);
        }
        source.with_file_name(name)
    };

    Ok((sibling("_part1"), sibling("_part2")))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::media::{CommandOutput, MediaCommand, MockCommandExecutor};
    use std::sync::Mutex;

    type Calls = Arc<Mutex<Vec<MediaCommand>>>;

    /// Mock that records every command and answers with the given exit codes in turn
    fn recording_executor(codes: Vec<i32>) -> (MockCommandExecutor, Calls) {
        let calls: Calls = Arc::new(Mutex::new(Vec::new()));
        let recorded = calls.clone();
        let mut executor = MockCommandExecutor::new();
        executor.expect_run().returning(move |cmd| {
            let mut calls = recorded.lock().unwrap();
            let code = codes.get(calls.len()).copied().unwrap_or(0);
            calls.push(cmd.clone());
            Ok(CommandOutput::new(code, "", if code == 0 { "" } else { "conversion failed" }))
        });
        (executor, calls)
    }

    fn runner(config: MediaConfig, executor: MockCommandExecutor) -> OperationRunner {
        OperationRunner::new(config, Arc::new(executor))
    }

    fn manifest_arg(cmd: &MediaCommand) -> PathBuf {
        let index = cmd.args.iter().position(|arg| arg == "-i").unwrap();
        PathBuf::from(&cmd.args[index + 1])
    }

    #[tokio::test]
    async fn test_extract_replaces_extension() {
        let (executor, calls) = recording_executor(vec![0]);
        let output = runner(MediaConfig::default(), executor)
            .extract(Path::new("/videos/lecture.mp4"))
            .await
            .unwrap();

        assert_eq!(output, PathBuf::from("/videos/lecture.mp3"));
        let calls = calls.lock().unwrap();
        assert_eq!(calls.len(), 1);
        assert_eq!(calls[0].program, "ffmpeg");
        assert_eq!(
            calls[0].args,
            ["-y", "-i", "/videos/lecture.mp4", "-vn", "-acodec", "libmp3lame", "-q:a", "2", "/videos/lecture.mp3"]
        );
    }

    #[tokio::test]
    async fn test_extract_failure_carries_stderr() {
        let (executor, _) = recording_executor(vec![1]);
        let err = runner(MediaConfig::default(), executor)
            .extract(Path::new("broken.mp4"))
            .await
            .unwrap_err();

        match err {
            ClipdeckError::ExternalTool { description, stderr, .. } => {
                assert_eq!(description, "Audio extraction");
                assert_eq!(stderr, "conversion failed");
            }
            other => panic!("unexpected error: {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_spawn_failure_is_reported() {
        let mut executor = MockCommandExecutor::new();
        executor.expect_run().returning(|cmd| {
            Err(ClipdeckError::Spawn {
                program: cmd.program.clone(),
                source: std::io::Error::new(std::io::ErrorKind::NotFound, "not found"),
            })
        });

        let result = runner(MediaConfig::default(), executor)
            .trim(Path::new("a.mp3"), Path::new("b.mp3"), "00:10", "00:20")
            .await;
        assert!(matches!(result, Err(ClipdeckError::Spawn { .. })));
    }

    #[tokio::test]
    async fn test_merge_writes_manifest_in_order_and_removes_it() {
        let dir = tempfile::tempdir().unwrap();
        let config = MediaConfig {
            manifest_dir: Some(dir.path().to_path_buf()),
            ..MediaConfig::default()
        };

        let seen: Arc<Mutex<Option<String>>> = Arc::new(Mutex::new(None));
        let seen_in_call = seen.clone();
        let mut executor = MockCommandExecutor::new();
        executor.expect_run().times(1).returning(move |cmd| {
            let manifest = manifest_arg(cmd);
            *seen_in_call.lock().unwrap() = std::fs::read_to_string(&manifest).ok();
            Ok(CommandOutput::new(0, "", ""))
        });

        let sources = vec![PathBuf::from("/music/b.mp3"), PathBuf::from("/music/a.mp3")];
        let output = runner(config, executor)
            .merge(&sources, Path::new("/music/joined.mp3"))
            .await
            .unwrap();

        assert_eq!(output, PathBuf::from("/music/joined.mp3"));
        assert_eq!(
            seen.lock().unwrap().as_deref(),
            Some("file '/music/b.mp3'\nfile '/music/a.mp3'\n")
        );
        assert_eq!(std::fs::read_dir(dir.path()).unwrap().count(), 0);
    }

    #[tokio::test]
    async fn test_merge_removes_manifest_on_failure() {
        let (executor, calls) = recording_executor(vec![1]);
        let sources = vec![PathBuf::from("a.mp3"), PathBuf::from("b.wav")];
        let result = runner(MediaConfig::default(), executor)
            .merge(&sources, Path::new("out.mp3"))
            .await;

        assert!(matches!(result, Err(ClipdeckError::ExternalTool { .. })));
        let calls = calls.lock().unwrap();
        assert!(!manifest_arg(&calls[0]).exists());
    }

    #[tokio::test]
    async fn test_merge_removes_manifest_on_spawn_failure() {
        let manifest: Arc<Mutex<Option<PathBuf>>> = Arc::new(Mutex::new(None));
        let manifest_in_call = manifest.clone();
        let mut executor = MockCommandExecutor::new();
        executor.expect_run().returning(move |cmd| {
            *manifest_in_call.lock().unwrap() = Some(manifest_arg(cmd));
            Err(ClipdeckError::Spawn {
                program: cmd.program.clone(),
                source: std::io::Error::new(std::io::ErrorKind::NotFound, "not found"),
            })
        });

        let sources = vec![PathBuf::from("a.mp3"), PathBuf::from("b.mp3")];
        let result = runner(MediaConfig::default(), executor)
            .merge(&sources, Path::new("out.mp3"))
            .await;

        assert!(result.is_err());
        let manifest = manifest.lock().unwrap().clone().unwrap();
        assert!(!manifest.exists());
    }

    #[tokio::test]
    async fn test_merge_does_not_check_source_count() {
        let (executor, calls) = recording_executor(vec![0]);
        let sources = vec![PathBuf::from("only.mp3")];
        runner(MediaConfig::default(), executor)
            .merge(&sources, Path::new("out.mp3"))
            .await
            .unwrap();

        let calls = calls.lock().unwrap();
        assert_eq!(calls.len(), 1);
        assert_eq!(calls[0].args[1..5], ["-f", "concat", "-safe", "0"]);
    }

    #[tokio::test]
    async fn test_trim_passes_times_verbatim() {
        let (executor, calls) = recording_executor(vec![0]);
        runner(MediaConfig::default(), executor)
            .trim(Path::new("in.mp3"), Path::new("out.mp3"), "1:5", "90")
            .await
            .unwrap();

        let calls = calls.lock().unwrap();
        assert_eq!(
            calls[0].args,
            ["-y", "-i", "in.mp3", "-ss", "1:5", "-to", "90", "-c", "copy", "out.mp3"]
        );
    }

    #[tokio::test]
    async fn test_trim_canonicalizes_well_formed_times() {
        let config = MediaConfig {
            canonicalize_times: true,
            ..MediaConfig::default()
        };
        let (executor, calls) = recording_executor(vec![0]);
        runner(config, executor)
            .trim(Path::new("in.mp3"), Path::new("out.mp3"), "1:5", "90.5")
            .await
            .unwrap();

        let calls = calls.lock().unwrap();
        assert_eq!(calls[0].args[3..7], ["-ss", "01:05", "-to", "90.5"]);
    }

    #[tokio::test]
    async fn test_split_requests_two_extractions() {
        let (executor, calls) = recording_executor(vec![0, 0]);
        let (first, second) = runner(MediaConfig::default(), executor)
            .split(Path::new("/audio/show.mp3"), "05:00")
            .await
            .unwrap();

        assert_eq!(first, PathBuf::from("/audio/show_part1.mp3"));
        assert_eq!(second, PathBuf::from("/audio/show_part2.mp3"));

        let calls = calls.lock().unwrap();
        assert_eq!(calls.len(), 2);
        assert_eq!(
            calls[0].args,
            ["-y", "-i", "/audio/show.mp3", "-t", "05:00", "-c", "copy", "/audio/show_part1.mp3"]
        );
        assert_eq!(
            calls[1].args,
            ["-y", "-i", "/audio/show.mp3", "-ss", "05:00", "-c", "copy", "/audio/show_part2.mp3"]
        );
    }

    #[tokio::test]
    async fn test_split_stops_after_first_failure() {
        let (executor, calls) = recording_executor(vec![1]);
        let result = runner(MediaConfig::default(), executor)
            .split(Path::new("show.mp3"), "05:00")
            .await;

        assert!(result.is_err());
        assert_eq!(calls.lock().unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_split_keeps_first_half_when_second_fails() {
        let dir = tempfile::tempdir().unwrap();
        let source = dir.path().join("show.mp3");
        let (first, _) = split_paths(&source).unwrap();
        std::fs::write(&first, b"part one").unwrap();

        let (executor, _) = recording_executor(vec![0, 1]);
        let result = runner(MediaConfig::default(), executor).split(&source, "05:00").await;

        assert!(result.is_err());
        assert!(first.exists());
    }

    #[tokio::test]
    async fn test_split_discards_first_half_when_configured() {
        let dir = tempfile::tempdir().unwrap();
        let source = dir.path().join("show.mp3");
        let (first, _) = split_paths(&source).unwrap();
        std::fs::write(&first, b"part one").unwrap();

        let config = MediaConfig {
            discard_partial_split: true,
            ..MediaConfig::default()
        };
        let (executor, _) = recording_executor(vec![0, 1]);
        let result = runner(config, executor).split(&source, "05:00").await;

        assert!(result.is_err());
        assert!(!first.exists());
    }

    #[tokio::test]
    async fn test_run_dispatches_split() {
        let (executor, calls) = recording_executor(vec![0, 0]);
        let request = OperationRequest::Split {
            source: PathBuf::from("a.wav"),
            split_point: "00:30".to_string(),
        };
        let output = runner(MediaConfig::default(), executor).run(&request).await.unwrap();

        assert_eq!(
            output,
            OperationOutput::Pair(PathBuf::from("a_part1.wav"), PathBuf::from("a_part2.wav"))
        );
        assert_eq!(output.paths().len(), 2);
        assert_eq!(calls.lock().unwrap().len(), 2);
    }

    #[tokio::test]
    async fn test_version_info_reads_first_line() {
        let mut executor = MockCommandExecutor::new();
        executor
            .expect_run()
            .withf(|cmd| cmd.args == ["-version"])
            .returning(|_| Ok(CommandOutput::new(0, "ffmpeg version 6.1.1\nbuilt with gcc\n", "")));

        let version = runner(MediaConfig::default(), executor).version_info().await.unwrap();
        assert_eq!(version, "ffmpeg version 6.1.1");
    }

    #[test]
    fn test_concat_manifest_escapes_quotes() {
        let sources = vec![PathBuf::from("/music/it's.mp3"), PathBuf::from("/music/plain.mp3")];
        assert_eq!(
            concat_manifest(&sources).unwrap(),
            "file '/music/it'\\''s.mp3'\nfile '/music/plain.mp3'\n"
        );
    }

    #[tokio::test]
    async fn test_merge_writes_relative_sources_as_absolute() {
        let seen: Arc<Mutex<Option<String>>> = Arc::new(Mutex::new(None));
        let seen_in_call = seen.clone();
        let mut executor = MockCommandExecutor::new();
        executor.expect_run().times(1).returning(move |cmd| {
            *seen_in_call.lock().unwrap() = std::fs::read_to_string(manifest_arg(cmd)).ok();
            Ok(CommandOutput::new(0, "", ""))
        });

        let sources = vec![PathBuf::from("a.mp3"), PathBuf::from("b.mp3")];
        runner(MediaConfig::default(), executor)
            .merge(&sources, Path::new("out.mp3"))
            .await
            .unwrap();

        let cwd = std::env::current_dir().unwrap();
        let expected = format!(
            "file '{}'\nfile '{}'\n",
            cwd.join("a.mp3").display(),
            cwd.join("b.mp3").display()
        );
        assert_eq!(seen.lock().unwrap().as_deref(), Some(expected.as_str()));
    }

    #[test]
    fn test_split_paths_without_extension() {
        let (first, second) = split_paths(Path::new("dir/recording")).unwrap();
        assert_eq!(first, PathBuf::from("dir/recording_part1"));
        assert_eq!(second, PathBuf::from("dir/recording_part2"));
    }

    #[test]
    fn test_split_paths_rejects_non_file() {
        assert!(matches!(split_paths(Path::new("/")), Err(ClipdeckError::Precondition(_))));
    }
}
