use std::path::{Path, PathBuf};

/// A queued file and its cached duration in seconds
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MediaFile {
    pub path: PathBuf,
    pub duration: Option<u64>,
}

impl MediaFile {
    pub fn new<P: Into<PathBuf>>(path: P) -> Self {
        Self {
            path: path.into(),
            duration: None,
        }
    }

    /// File name for display, falling back to the whole path
    pub fn display_name(&self) -> String {
        self.path
            .file_name()
            .unwrap_or(self.path.as_os_str())
            .to_string_lossy()
            .into_owned()
    }
}

/// Ordered set of files. Insertion order is the merge order.
///
/// Durations are stored on the entries themselves, so reordering always
/// moves a path together with its duration.
#[derive(Debug, Clone, Default)]
pub struct MediaQueue {
    files: Vec<MediaFile>,
}

impl MediaQueue {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append `path` unless it is already queued. Returns whether it was added.
    pub fn add<P: Into<PathBuf>>(&mut self, path: P) -> bool {
        let path = path.into();
        if self.contains(&path) {
            return false;
        }

        self.files.push(MediaFile::new(path));
        true
    }

    pub fn clear(&mut self) {
        self.files.clear();
    }

    /// Swap the entry at `index` with its predecessor. No-op at the front.
    pub fn move_up(&mut self, index: usize) -> bool {
        if index == 0 || index >= self.files.len() {
            return false;
        }

        self.files.swap(index, index - 1);
        true
    }

    /// Swap the entry at `index` with its successor. No-op at the back.
    pub fn move_down(&mut self, index: usize) -> bool {
        let next = match index.checked_add(1) {
            Some(next) if next < self.files.len() => next,
            _ => return false,
        };

        self.files.swap(index, next);
        true
    }

    pub fn set_duration(&mut self, index: usize, duration: Option<u64>) {
        if let Some(file) = self.files.get_mut(index) {
            file.duration = duration;
        }
    }

    pub fn contains(&self, path: &Path) -> bool {
        self.files.iter().any(|file| file.path == path)
    }

    pub fn get(&self, index: usize) -> Option<&MediaFile> {
        self.files.get(index)
    }

    pub fn len(&self) -> usize {
        self.files.len()
    }

    pub fn is_empty(&self) -> bool {
        self.files.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &MediaFile> {
        self.files.iter()
    }

    /// Queued paths in order
    pub fn paths(&self) -> Vec<PathBuf> {
        self.files.iter().map(|file| file.path.clone()).collect()
    }
}
