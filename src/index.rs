use std::{
    path::{Path, PathBuf},
    sync::{
        atomic::{AtomicU8, Ordering},
        Arc, Mutex, MutexGuard, OnceLock,
    },
};

use rand::{rngs::StdRng, seq::SliceRandom, SeedableRng};

use crate::{
    error::GalleryError,
    fs_utils::{collect_images, serving_path},
    gallery::tracker::CompletionTracker,
};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub enum ConversionState {
    Idle = 0,
    Pending = 1,
    Done = 2,
    Failed = 3,
}

impl ConversionState {
    fn from_u8(value: u8) -> Self {
        match value {
            0 => ConversionState::Idle,
            1 => ConversionState::Pending,
            2 => ConversionState::Done,
            _ => ConversionState::Failed,
        }
    }

    pub fn is_terminal(self) -> bool {
        matches!(self, ConversionState::Done | ConversionState::Failed)
    }
}

#[derive(Debug)]
pub struct GalleryEntry {
    index: usize,
    source_path: PathBuf,
    serving_path: String,
    thumbnail: OnceLock<String>,
    state: AtomicU8,
    waiters: Mutex<Vec<Arc<CompletionTracker>>>,
}

impl GalleryEntry {
    pub fn new(index: usize, source_path: PathBuf, serving_path: String) -> Self {
        Self {
            index,
            source_path,
            serving_path,
            thumbnail: OnceLock::new(),
            state: AtomicU8::new(ConversionState::Idle as u8),
            waiters: Mutex::new(Vec::new()),
        }
    }

    pub fn index(&self) -> usize {
        self.index
    }

    pub fn source_path(&self) -> &Path {
        &self.source_path
    }

    pub fn serving_path(&self) -> &str {
        &self.serving_path
    }

    pub fn thumbnail(&self) -> Option<&str> {
        self.thumbnail.get().map(String::as_str)
    }

    pub fn state(&self) -> ConversionState {
        ConversionState::from_u8(self.state.load(Ordering::Acquire))
    }

    /// Moves the entry from `Idle` to `Pending`. Only the caller that wins
    /// this exchange may enqueue a conversion for the entry.
    pub fn try_claim(&self) -> bool {
        self.state
            .compare_exchange(
                ConversionState::Idle as u8,
                ConversionState::Pending as u8,
                Ordering::AcqRel,
                Ordering::Acquire,
            )
            .is_ok()
    }

    /// Registers `tracker` to be completed once this entry is `Done` or
    /// `Failed`. Returns `false`, without registering, if it already is.
    pub fn subscribe(&self, tracker: &Arc<CompletionTracker>) -> bool {
        let mut waiters = self.lock_waiters();
        if self.state().is_terminal() {
            return false;
        }
        tracker.register(1);
        waiters.push(Arc::clone(tracker));
        true
    }

    /// Publishes the outcome of a conversion and releases every subscriber.
    pub fn finish(&self, result: Result<String, GalleryError>) -> ConversionState {
        let waiters = {
            let mut waiters = self.lock_waiters();
            let state = match result {
                Ok(thumbnail) => {
                    let _ = self.thumbnail.set(thumbnail);
                    ConversionState::Done
                }
                Err(_) => ConversionState::Failed,
            };
            self.state.store(state as u8, Ordering::Release);
            std::mem::take(&mut *waiters)
        };
        for tracker in &waiters {
            tracker.complete();
        }
        self.state()
    }

    fn lock_waiters(&self) -> MutexGuard<'_, Vec<Arc<CompletionTracker>>> {
        self.waiters
            .lock()
            .unwrap_or_else(|poison| poison.into_inner())
    }
}

/// Fixed-length arena of gallery entries addressed by index.
#[derive(Debug, Default)]
pub struct EntryIndex {
    entries: Vec<GalleryEntry>,
}

impl EntryIndex {
    pub fn build(root: &Path) -> Result<Self, GalleryError> {
        let entries = collect_images(root)?
            .into_iter()
            .enumerate()
            .map(|(index, path)| {
                let serving = serving_path(root, &path);
                GalleryEntry::new(index, path, serving)
            })
            .collect();
        Ok(Self { entries })
    }

    pub fn from_entries(entries: Vec<GalleryEntry>) -> Self {
        Self { entries }
    }

    /// Permutes the entries deterministically for `seed` and renumbers them.
    pub fn shuffle(&mut self, seed: u64) {
        let mut rng = StdRng::seed_from_u64(seed);
        self.entries.shuffle(&mut rng);
        for (index, entry) in self.entries.iter_mut().enumerate() {
            entry.index = index;
        }
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn get(&self, index: usize) -> Option<&GalleryEntry> {
        self.entries.get(index)
    }

    pub fn iter(&self) -> impl Iterator<Item = &GalleryEntry> {
        self.entries.iter()
    }
}
