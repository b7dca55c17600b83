//! Marker-file rendezvous between independently launched build steps.
//!
//! When the IDE builds the whole solution it starts many target build steps
//! at once, alongside the build-all step that compiles everything with one
//! engine invocation. Each target step drops a marker into a shared scratch
//! directory, waits a fixed window, then counts markers: alone means an
//! isolated build (compile just this target), company means a solution build
//! (do nothing, build-all covers it). The prebuild step clears the directory
//! before any target step runs.
//!
//! A step removes its own marker when it finishes. A grouped step keeps it for
//! one more window first, so peers that registered after it still count it.
//! Build-all clears the directory again before compiling, which also drops
//! markers left behind by steps that were killed.
//!
//! The only possible mistake is a false "alone" when siblings register after
//! the window closes, which costs a redundant build but never skips one.
//! No locks are involved.

use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Mutex;
use std::time::{Duration, SystemTime};

use sha2::{Digest, Sha256};
use thiserror::Error;
use tracing::debug;

/// Extension of marker files inside the scratch directory.
pub const MARKER_EXTENSION: &str = "marker";

/// Default wait between registering and counting.
pub const DEFAULT_WINDOW: Duration = Duration::from_millis(200);

#[derive(Debug, Error)]
pub enum CoordinationError {
    #[error("Failed to {action} {path}: {source}")]
    Io {
        action: &'static str,
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

pub type CoordinationResult<T> = Result<T, CoordinationError>;

/// Source of the delay between registering and counting.
pub trait Clock {
    fn sleep(&self, duration: Duration);
}

/// Real wall-clock sleeping.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn sleep(&self, duration: Duration) {
        std::thread::sleep(duration);
    }
}

impl<F: Fn(Duration)> Clock for F {
    fn sleep(&self, duration: Duration) {
        self(duration)
    }
}

/// A registered marker as seen when listing the scratch directory.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Marker {
    pub name: String,
    /// Time since the marker was written, when the store can tell.
    pub age: Option<Duration>,
}

/// Storage for markers. The filesystem implementation is [`DirMarkerStore`].
pub trait MarkerStore {
    fn register(&self, marker: &str) -> CoordinationResult<()>;
    fn markers(&self) -> CoordinationResult<Vec<Marker>>;
    /// Remove one marker. Removing a marker that is already gone succeeds.
    fn remove(&self, marker: &str) -> CoordinationResult<()>;
    fn clear(&self) -> CoordinationResult<()>;
}

/// Markers as empty files in a scratch directory.
#[derive(Debug, Clone)]
pub struct DirMarkerStore {
    dir: PathBuf,
}

impl DirMarkerStore {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }
}

fn io_error(
    action: &'static str,
    path: &Path,
) -> impl FnOnce(std::io::Error) -> CoordinationError {
    let path = path.to_path_buf();
    move |source| CoordinationError::Io { action, path, source }
}

impl MarkerStore for DirMarkerStore {
    fn register(&self, marker: &str) -> CoordinationResult<()> {
        fs::create_dir_all(&self.dir).map_err(io_error("create scratch dir", &self.dir))?;
        let path = self.dir.join(marker);
        fs::write(&path, b"").map_err(io_error("write marker", &path))
    }

    fn markers(&self) -> CoordinationResult<Vec<Marker>> {
        if !self.dir.is_dir() {
            return Ok(Vec::new());
        }
        let now = SystemTime::now();
        let mut markers = Vec::new();
        for entry in fs::read_dir(&self.dir).map_err(io_error("list scratch dir", &self.dir))? {
            let entry = entry.map_err(io_error("list scratch dir", &self.dir))?;
            let path = entry.path();
            if path.extension().and_then(|e| e.to_str()) != Some(MARKER_EXTENSION) {
                continue;
            }
            // A marker removed mid-listing by a concurrent prebuild is just gone.
            let Ok(meta) = entry.metadata() else {
                continue;
            };
            let age = meta.modified().ok().and_then(|m| now.duration_since(m).ok());
            markers.push(Marker { name: entry.file_name().to_string_lossy().to_string(), age });
        }
        markers.sort_by(|a, b| a.name.cmp(&b.name));
        Ok(markers)
    }

    fn remove(&self, marker: &str) -> CoordinationResult<()> {
        let path = self.dir.join(marker);
        match fs::remove_file(&path) {
            Err(err) if err.kind() != std::io::ErrorKind::NotFound => {
                Err(io_error("remove marker", &path)(err))
            }
            _ => Ok(()),
        }
    }

    fn clear(&self) -> CoordinationResult<()> {
        if self.dir.exists() {
            fs::remove_dir_all(&self.dir).map_err(io_error("clear scratch dir", &self.dir))?;
        }
        fs::create_dir_all(&self.dir).map_err(io_error("create scratch dir", &self.dir))
    }
}

/// In-process store, for embedding the protocol in a single process and for tests.
#[derive(Debug, Default)]
pub struct MemoryMarkerStore {
    markers: Mutex<Vec<String>>,
}

impl MemoryMarkerStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, Vec<String>> {
        self.markers.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

impl MarkerStore for MemoryMarkerStore {
    fn register(&self, marker: &str) -> CoordinationResult<()> {
        let mut markers = self.lock();
        if !markers.iter().any(|m| m == marker) {
            markers.push(marker.to_string());
        }
        Ok(())
    }

    fn markers(&self) -> CoordinationResult<Vec<Marker>> {
        Ok(self.lock().iter().map(|name| Marker { name: name.clone(), age: None }).collect())
    }

    fn remove(&self, marker: &str) -> CoordinationResult<()> {
        self.lock().retain(|m| m != marker);
        Ok(())
    }

    fn clear(&self) -> CoordinationResult<()> {
        self.lock().clear();
        Ok(())
    }
}

impl<S: MarkerStore + ?Sized> MarkerStore for &S {
    fn register(&self, marker: &str) -> CoordinationResult<()> {
        (**self).register(marker)
    }

    fn markers(&self) -> CoordinationResult<Vec<Marker>> {
        (**self).markers()
    }

    fn remove(&self, marker: &str) -> CoordinationResult<()> {
        (**self).remove(marker)
    }

    fn clear(&self) -> CoordinationResult<()> {
        (**self).clear()
    }
}

/// Filesystem-safe, collision-resistant marker file name for a step identity.
///
/// Keeps a readable prefix and appends a hash so identities that sanitize
/// to the same prefix (`a/b` vs `a_b`) still get distinct files.
pub fn marker_name(identity: &str) -> String {
    let readable: String = identity
        .chars()
        .map(|c| if c.is_ascii_alphanumeric() || matches!(c, '-' | '_' | '.') { c } else { '_' })
        .take(48)
        .collect();
    let digest = Sha256::digest(identity.as_bytes());
    let hash: String = digest.iter().take(8).map(|b| format!("{b:02x}")).collect();
    format!("{readable}-{hash}.{MARKER_EXTENSION}")
}

/// Outcome of [`Rendezvous::register_and_count`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Presence {
    /// Only our own marker: an isolated build.
    Alone,
    /// Other steps registered within the window: a solution-wide build.
    Grouped { peers: usize },
}

/// The register-then-count protocol over a marker store and a clock.
#[derive(Debug)]
pub struct Rendezvous<S, C> {
    store: S,
    clock: C,
    window: Duration,
    ttl: Option<Duration>,
}

impl<S: MarkerStore, C: Clock> Rendezvous<S, C> {
    pub fn new(store: S, clock: C, window: Duration) -> Self {
        Self { store, clock, window, ttl: None }
    }

    /// Ignore peer markers older than `ttl`. Ignoring a marker can only turn
    /// "grouped" into "alone", so this never causes a skipped build.
    pub fn with_ttl(mut self, ttl: Option<Duration>) -> Self {
        self.ttl = ttl;
        self
    }

    /// Remove every marker; run once per solution build by the prebuild step.
    pub fn reset(&self) -> CoordinationResult<()> {
        self.store.clear()
    }

    pub fn register_and_count(&self, self_id: &str) -> CoordinationResult<Presence> {
        let own = marker_name(self_id);
        self.store.register(&own)?;
        self.clock.sleep(self.window);

        let peers = self
            .store
            .markers()?
            .into_iter()
            .filter(|m| m.name != own)
            .filter(|m| match (self.ttl, m.age) {
                (Some(ttl), Some(age)) => age <= ttl,
                _ => true,
            })
            .count();
        debug!(step = self_id, peers, "rendezvous counted markers");

        Ok(if peers == 0 { Presence::Alone } else { Presence::Grouped { peers } })
    }

    /// Drop the marker registered for `self_id` once its step is done.
    ///
    /// A grouped step holds its marker for another window so that a peer
    /// still inside its own window does not mistake itself for alone.
    pub fn release(&self, self_id: &str, presence: Presence) -> CoordinationResult<()> {
        if let Presence::Grouped { .. } = presence {
            self.clock.sleep(self.window);
        }
        self.store.remove(&marker_name(self_id))
    }
}
