//! Asset loading seam
//!
//! The manager never touches files or scene nodes directly. It asks an
//! [`AssetLoader`] for a handle, polls the handle once per update tick, and
//! hands the loaded [`Asset`] to the window's content when it completes.
//! Loaders may do the actual work on worker threads; completion is only ever
//! observed through [`AssetLoader::poll`] on the update thread.

mod fs;

pub use fs::FsAssetLoader;

use log::debug;
use std::collections::{HashMap, HashSet};
use std::fmt;
use std::sync::Arc;

/// Opaque handle to a load submitted to an [`AssetLoader`]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct AssetHandle(pub u64);

impl fmt::Display for AssetHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "asset#{}", self.0)
    }
}

/// What to load
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AssetRequest {
    /// Asset location, relative to the loader's root for file-backed assets
    pub path: String,
    /// Served from the loader's built-in table instead of storage
    pub builtin: bool,
}

impl AssetRequest {
    pub fn new(path: impl Into<String>, builtin: bool) -> Self {
        Self {
            path: path.into(),
            builtin,
        }
    }
}

/// Loaded asset content
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Asset {
    pub path: String,
    pub bytes: Arc<[u8]>,
    pub builtin: bool,
}

impl Asset {
    /// Asset bytes as UTF-8 text, if they are valid UTF-8
    pub fn as_text(&self) -> Option<&str> {
        std::str::from_utf8(&self.bytes).ok()
    }
}

/// Asset loading failures
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum AssetError {
    /// Nothing exists at this location
    #[error("asset not found: {0}")]
    NotFound(String),

    /// Storage error while reading the asset
    #[error("failed to read asset {path}: {message}")]
    Io { path: String, message: String },

    /// The handle was never issued or was already disposed
    #[error("unknown asset handle: {0}")]
    UnknownHandle(AssetHandle),

    /// The worker performing the load went away without reporting
    #[error("asset worker for {0} stopped before completing")]
    WorkerGone(String),
}

/// Progress of a submitted load
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AssetStatus {
    Pending,
    Loaded(Asset),
    Failed(AssetError),
}

impl AssetStatus {
    pub fn is_pending(&self) -> bool {
        matches!(self, AssetStatus::Pending)
    }
}

/// Turns asset locations into loaded content
#[cfg_attr(test, mockall::automock)]
pub trait AssetLoader {
    /// Load immediately. The next [`AssetLoader::poll`] of the returned handle
    /// must not report [`AssetStatus::Pending`].
    fn load_sync(&mut self, request: &AssetRequest) -> AssetHandle;

    /// Submit a load and return without waiting for it
    fn load_async(&mut self, request: &AssetRequest) -> AssetHandle;

    /// Check on a submitted load
    fn poll(&mut self, handle: AssetHandle) -> AssetStatus;

    /// Release a handle and whatever the loader holds for it
    fn dispose(&mut self, handle: AssetHandle);
}

#[derive(Debug)]
struct MemoryLoad {
    path: String,
    builtin: bool,
    /// Polls left before the load resolves; `None` never resolves
    remaining_polls: Option<u32>,
}

/// In-memory loader for headless hosts and tests
///
/// Every path resolves against a table filled with [`MemoryAssetLoader::insert`].
/// Async loads can be given a latency (in polls), stalled forever, or fail
/// because the path is absent.
#[derive(Debug, Default)]
pub struct MemoryAssetLoader {
    assets: HashMap<String, Arc<[u8]>>,
    latency: HashMap<String, u32>,
    stalled: HashSet<String>,
    loads: HashMap<AssetHandle, MemoryLoad>,
    next_handle: u64,
}

impl MemoryAssetLoader {
    pub fn new() -> Self {
        Self::default()
    }

    /// Make `bytes` available at `path`
    pub fn insert(&mut self, path: impl Into<String>, bytes: impl Into<Vec<u8>>) {
        self.assets.insert(path.into(), Arc::from(bytes.into()));
    }

    /// Builder form of [`MemoryAssetLoader::insert`]
    pub fn with_asset(mut self, path: impl Into<String>, bytes: impl Into<Vec<u8>>) -> Self {
        self.insert(path, bytes);
        self
    }

    /// Async loads of `path` stay pending for `polls` polls before resolving
    pub fn set_latency(&mut self, path: impl Into<String>, polls: u32) {
        self.latency.insert(path.into(), polls);
    }

    /// Async loads of `path` never resolve
    pub fn stall(&mut self, path: impl Into<String>) {
        self.stalled.insert(path.into());
    }

    /// Handles issued and not yet disposed
    pub fn live_handles(&self) -> usize {
        self.loads.len()
    }

    fn submit(&mut self, request: &AssetRequest, remaining_polls: Option<u32>) -> AssetHandle {
        self.next_handle += 1;
        let handle = AssetHandle(self.next_handle);
        self.loads.insert(
            handle,
            MemoryLoad {
                path: request.path.clone(),
                builtin: request.builtin,
                remaining_polls,
            },
        );
        debug!("Submitted {} for '{}'", handle, request.path);
        handle
    }
}

impl AssetLoader for MemoryAssetLoader {
    fn load_sync(&mut self, request: &AssetRequest) -> AssetHandle {
        self.submit(request, Some(0))
    }

    fn load_async(&mut self, request: &AssetRequest) -> AssetHandle {
        let remaining = if self.stalled.contains(&request.path) {
            None
        } else {
            Some(self.latency.get(&request.path).copied().unwrap_or(0))
        };
        self.submit(request, remaining)
    }

    fn poll(&mut self, handle: AssetHandle) -> AssetStatus {
        let Some(load) = self.loads.get_mut(&handle) else {
            return AssetStatus::Failed(AssetError::UnknownHandle(handle));
        };

        match load.remaining_polls.as_mut() {
            None => return AssetStatus::Pending,
            Some(remaining) if *remaining > 0 => {
                *remaining -= 1;
                return AssetStatus::Pending;
            }
            Some(_) => {}
        }

        match self.assets.get(&load.path) {
            Some(bytes) => AssetStatus::Loaded(Asset {
                path: load.path.clone(),
                bytes: Arc::clone(bytes),
                builtin: load.builtin,
            }),
            None => AssetStatus::Failed(AssetError::NotFound(load.path.clone())),
        }
    }

    fn dispose(&mut self, handle: AssetHandle) {
        if self.loads.remove(&handle).is_some() {
            debug!("Disposed {}", handle);
        }
    }
}
