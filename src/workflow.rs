use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::{info, warn};
use walkdir::WalkDir;

use crate::config::Config;
use crate::error::{ClipdeckError, Result};
use crate::media::{CommandExecutor, MediaCommandBuilder, OperationRunner, SystemExecutor};
use crate::probe::{display_duration, DurationProbe};
use crate::queue::MediaQueue;

/// Outcome of converting every queued file
#[derive(Debug, Default)]
pub struct BatchReport {
    pub converted: Vec<PathBuf>,
    pub failed: Vec<(PathBuf, ClipdeckError)>,
}

impl BatchReport {
    pub fn is_success(&self) -> bool {
        self.failed.is_empty()
    }
}

/// Session state: the extract and merge queues with their cached durations,
/// plus the probe and runner that act on them.
pub struct Workflow {
    config: Config,
    probe: DurationProbe,
    runner: OperationRunner,
    extract_queue: MediaQueue,
    merge_queue: MediaQueue,
}

impl Workflow {
    /// Create a workflow backed by real processes, failing when ffmpeg is missing
    pub async fn new(config: Config) -> Result<Self> {
        let workflow = Self::with_executor(config, Arc::new(SystemExecutor));
        workflow.runner.check_availability().await?;
        Ok(workflow)
    }

    pub fn with_executor(config: Config, executor: Arc<dyn CommandExecutor>) -> Self {
        let media = &config.media;
        let commands = MediaCommandBuilder::new(&media.ffmpeg_path, &media.ffprobe_path, media.overwrite);
        let probe = DurationProbe::new(executor.clone(), commands);
        let runner = OperationRunner::new(media.clone(), executor);

        Self {
            config,
            probe,
            runner,
            extract_queue: MediaQueue::new(),
            merge_queue: MediaQueue::new(),
        }
    }

    pub fn runner(&self) -> &OperationRunner {
        &self.runner
    }

    pub fn extract_queue(&self) -> &MediaQueue {
        &self.extract_queue
    }

    pub fn merge_queue(&self) -> &MediaQueue {
        &self.merge_queue
    }

    /// Reordering goes through the queue so durations stay attached
    pub fn merge_queue_mut(&mut self) -> &mut MediaQueue {
        &mut self.merge_queue
    }

    pub async fn probe_duration(&self, path: &Path) -> String {
        self.probe.probe_duration(path).await
    }

    /// Queue a file for extraction and probe its duration
    pub async fn queue_for_extract<P: Into<PathBuf>>(&mut self, path: P) -> bool {
        let path = path.into();
        if !self.extract_queue.add(path.clone()) {
            return false;
        }

        let duration = self.probe.probe(&path).await;
        self.extract_queue.set_duration(self.extract_queue.len() - 1, duration);
        true
    }

    /// Queue a file for merging and probe its duration
    pub async fn queue_for_merge<P: Into<PathBuf>>(&mut self, path: P) -> bool {
        let path = path.into();
        if !self.merge_queue.add(path.clone()) {
            return false;
        }

        let duration = self.probe.probe(&path).await;
        self.merge_queue.set_duration(self.merge_queue.len() - 1, duration);
        true
    }

    /// Files under `dir` whose extension is one of `extract_extensions`
    pub fn collect_media_files<P: AsRef<Path>>(&self, dir: P) -> Vec<PathBuf> {
        let extensions = &self.config.media.extract_extensions;
        let mut files = Vec::new();

        for entry in WalkDir::new(dir.as_ref()).sort_by_file_name().into_iter().filter_map(|e| e.ok()) {
            if !entry.file_type().is_file() {
                continue;
            }
            if let Some(ext_str) = entry.path().extension().and_then(|e| e.to_str()) {
                if extensions.iter().any(|ext| ext.eq_ignore_ascii_case(ext_str)) {
                    files.push(entry.path().to_path_buf());
                }
            }
        }

        files
    }

    /// Extract audio from every queued file, then empty the queue.
    ///
    /// Missing files and failed conversions are reported, not fatal.
    pub async fn extract_all(&mut self) -> BatchReport {
        let mut report = BatchReport::default();
        info!("Extracting audio from {} files", self.extract_queue.len());

        for path in self.extract_queue.paths() {
            if !path.exists() {
                warn!("Skipping missing file: {}", path.display());
                report.failed.push((path.clone(), ClipdeckError::FileNotFound(path.display().to_string())));
                continue;
            }

            match self.runner.extract(&path).await {
                Ok(output) => report.converted.push(output),
                Err(e) => {
                    warn!("Failed to extract {}: {}", path.display(), e);
                    report.failed.push((path, e));
                }
            }
        }

        self.extract_queue.clear();
        report
    }

    /// Concatenate the merge queue, in its current order, into `destination`
    pub async fn merge_queued<P: AsRef<Path>>(&self, destination: P) -> Result<PathBuf> {
        if self.merge_queue.len() < 2 {
            return Err(ClipdeckError::Precondition(format!(
                "At least two files are needed to merge, {} queued",
                self.merge_queue.len()
            )));
        }

        for file in self.merge_queue.iter() {
            info!("  {} [{}]", file.display_name(), display_duration(file.duration));
        }

        self.runner.merge(&self.merge_queue.paths(), destination.as_ref()).await
    }

    pub async fn trim<P: AsRef<Path>, Q: AsRef<Path>>(
        &self,
        source: P,
        destination: Q,
        start: &str,
        end: &str,
    ) -> Result<PathBuf> {
        let source = existing_file(source.as_ref())?;
        if start.trim().is_empty() || end.trim().is_empty() {
            return Err(ClipdeckError::Precondition("Both start and end times are required".to_string()));
        }

        self.runner.trim(source, destination.as_ref(), start, end).await
    }

    pub async fn split<P: AsRef<Path>>(&self, source: P, split_point: &str) -> Result<(PathBuf, PathBuf)> {
        let source = existing_file(source.as_ref())?;
        if split_point.trim().is_empty() {
            return Err(ClipdeckError::Precondition("A split time is required".to_string()));
        }

        self.runner.split(source, split_point).await
    }
}

fn existing_file(path: &Path) -> Result<&Path> {
    if path.is_file() {
        Ok(path)
    } else {
        Err(ClipdeckError::FileNotFound(path.display().to_string()))
    }
}
