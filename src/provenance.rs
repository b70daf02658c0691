use std::collections::HashSet;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex, MutexGuard};

/// Answers whether a path was written by the upload mechanism itself.
pub trait ProvenanceCheck {
    fn is_genuine_upload(&self, path: &Path) -> bool;
}

impl<F> ProvenanceCheck for F
where
    F: Fn(&Path) -> bool,
{
    fn is_genuine_upload(&self, path: &Path) -> bool {
        self(path)
    }
}

#[derive(Debug, Clone, Default)]
pub struct UploadRegistry {
    paths: Arc<Mutex<HashSet<PathBuf>>>,
}

impl UploadRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register(&self, path: impl Into<PathBuf>) {
        self.lock().insert(path.into());
    }

    pub fn unregister(&self, path: &Path) -> bool {
        self.lock().remove(path)
    }

    pub fn contains(&self, path: &Path) -> bool {
        self.lock().contains(path)
    }

    pub fn len(&self) -> usize {
        self.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.lock().is_empty()
    }

    // a panic while holding the lock cannot leave the set half-updated
    fn lock(&self) -> MutexGuard<'_, HashSet<PathBuf>> {
        self.paths.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

impl ProvenanceCheck for UploadRegistry {
    fn is_genuine_upload(&self, path: &Path) -> bool {
        self.contains(path)
    }
}
