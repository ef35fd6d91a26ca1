//! File-backed asset loader with tokio worker loads

use super::{Asset, AssetError, AssetHandle, AssetLoader, AssetRequest, AssetStatus};
use log::{debug, warn};
use parking_lot::Mutex;
use std::collections::HashMap;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tokio::runtime::Handle;
use tokio::sync::oneshot::{self, error::TryRecvError};

type Bytes = Arc<[u8]>;

enum Load {
    Waiting {
        path: String,
        rx: oneshot::Receiver<Result<Bytes, AssetError>>,
    },
    Done(Result<Asset, AssetError>),
}

/// File bytes shared between handles, plus how many live handles use each file
///
/// Shared with blocking workers, which only fill in a file that still has users.
#[derive(Default)]
struct FileCache {
    bytes: HashMap<PathBuf, Bytes>,
    users: HashMap<PathBuf, usize>,
}

impl FileCache {
    fn fill(&mut self, full_path: &Path, bytes: &Bytes) {
        if self.users.contains_key(full_path) {
            self.bytes
                .entry(full_path.to_path_buf())
                .or_insert_with(|| Arc::clone(bytes));
        }
    }

    /// Drop one user of a file, evicting its bytes once nobody holds it
    fn release(&mut self, full_path: &Path) {
        let Some(count) = self.users.get_mut(full_path) else {
            return;
        };
        *count -= 1;
        if *count == 0 {
            self.users.remove(full_path);
            if self.bytes.remove(full_path).is_some() {
                debug!("Evicted {} from the asset cache", full_path.display());
            }
        }
    }
}

/// Loads assets from a root directory
///
/// Built-in assets are served from an in-memory table. Everything else is read
/// from `root`; async loads run on the tokio blocking pool and are picked up by
/// [`AssetLoader::poll`]. File bytes are cached and shared between handles
/// until the last handle for that file is disposed.
pub struct FsAssetLoader {
    root: PathBuf,
    builtin: HashMap<String, Bytes>,
    runtime: Handle,
    cache: Arc<Mutex<FileCache>>,
    loads: HashMap<AssetHandle, Load>,
    /// File each live non-builtin handle refers to
    files: HashMap<AssetHandle, PathBuf>,
    next_handle: u64,
}

impl FsAssetLoader {
    /// Create a loader reading from `root`, spawning async loads on `runtime`
    pub fn new(root: impl Into<PathBuf>, runtime: Handle) -> Self {
        Self {
            root: root.into(),
            builtin: HashMap::new(),
            runtime,
            cache: Arc::new(Mutex::new(FileCache::default())),
            loads: HashMap::new(),
            files: HashMap::new(),
            next_handle: 0,
        }
    }

    /// Register a built-in asset
    pub fn with_builtin(mut self, path: impl Into<String>, bytes: impl Into<Vec<u8>>) -> Self {
        self.builtin.insert(path.into(), Arc::from(bytes.into()));
        self
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Number of distinct files held in the shared cache
    pub fn cached_files(&self) -> usize {
        self.cache.lock().bytes.len()
    }

    fn issue(&mut self, load: Load) -> AssetHandle {
        self.next_handle += 1;
        let handle = AssetHandle(self.next_handle);
        self.loads.insert(handle, load);
        handle
    }

    fn issue_file(&mut self, full_path: PathBuf, load: Load) -> AssetHandle {
        let handle = self.issue(load);
        self.files.insert(handle, full_path);
        handle
    }

    /// Count a new user of `full_path` and return its cached bytes, if any
    fn acquire(&self, full_path: &Path) -> Option<Bytes> {
        let mut cache = self.cache.lock();
        *cache.users.entry(full_path.to_path_buf()).or_default() += 1;
        cache.bytes.get(full_path).cloned()
    }

    fn builtin_asset(&self, request: &AssetRequest) -> Result<Asset, AssetError> {
        self.builtin
            .get(&request.path)
            .map(|bytes| Asset {
                path: request.path.clone(),
                bytes: Arc::clone(bytes),
                builtin: true,
            })
            .ok_or_else(|| AssetError::NotFound(request.path.clone()))
    }
}

fn read_file(full_path: &Path, display: &str) -> Result<Bytes, AssetError> {
    std::fs::read(full_path)
        .map(Arc::from)
        .map_err(|e| match e.kind() {
            ErrorKind::NotFound => AssetError::NotFound(display.to_string()),
            _ => AssetError::Io {
                path: display.to_string(),
                message: e.to_string(),
            },
        })
}

impl AssetLoader for FsAssetLoader {
    fn load_sync(&mut self, request: &AssetRequest) -> AssetHandle {
        if request.builtin {
            let result = self.builtin_asset(request);
            return self.issue(Load::Done(result));
        }

        let full_path = self.root.join(&request.path);
        let bytes = match self.acquire(&full_path) {
            Some(bytes) => Ok(bytes),
            None => read_file(&full_path, &request.path).map(|bytes| {
                self.cache.lock().fill(&full_path, &bytes);
                bytes
            }),
        };

        let result = bytes.map(|bytes| Asset {
            path: request.path.clone(),
            bytes,
            builtin: false,
        });
        self.issue_file(full_path, Load::Done(result))
    }

    fn load_async(&mut self, request: &AssetRequest) -> AssetHandle {
        if request.builtin {
            let result = self.builtin_asset(request);
            return self.issue(Load::Done(result));
        }

        let full_path = self.root.join(&request.path);
        if let Some(bytes) = self.acquire(&full_path) {
            let load = Load::Done(Ok(Asset {
                path: request.path.clone(),
                bytes,
                builtin: false,
            }));
            return self.issue_file(full_path, load);
        }

        let (tx, rx) = oneshot::channel();
        let cache = Arc::clone(&self.cache);
        let worker_path = full_path.clone();
        let display = request.path.clone();
        self.runtime.spawn_blocking(move || {
            let result = read_file(&worker_path, &display);
            if let Ok(bytes) = &result {
                cache.lock().fill(&worker_path, bytes);
            }
            // The receiver is gone if the handle was disposed mid-load
            let _ = tx.send(result);
        });

        let load = Load::Waiting {
            path: request.path.clone(),
            rx,
        };
        let handle = self.issue_file(full_path, load);
        debug!("Queued async load of '{}' as {}", request.path, handle);
        handle
    }

    fn poll(&mut self, handle: AssetHandle) -> AssetStatus {
        let Some(load) = self.loads.get_mut(&handle) else {
            return AssetStatus::Failed(AssetError::UnknownHandle(handle));
        };

        if let Load::Waiting { path, rx } = load {
            let finished = match rx.try_recv() {
                Ok(result) => result.map(|bytes| Asset {
                    path: path.clone(),
                    bytes,
                    builtin: false,
                }),
                Err(TryRecvError::Empty) => return AssetStatus::Pending,
                Err(TryRecvError::Closed) => {
                    warn!("Asset worker for '{}' dropped its result", path);
                    Err(AssetError::WorkerGone(path.clone()))
                }
            };
            *load = Load::Done(finished);
        }

        match load {
            Load::Done(Ok(asset)) => AssetStatus::Loaded(asset.clone()),
            Load::Done(Err(e)) => AssetStatus::Failed(e.clone()),
            Load::Waiting { .. } => AssetStatus::Pending,
        }
    }

    fn dispose(&mut self, handle: AssetHandle) {
        self.loads.remove(&handle);
        if let Some(full_path) = self.files.remove(&handle) {
            self.cache.lock().release(&full_path);
        }
    }
}
