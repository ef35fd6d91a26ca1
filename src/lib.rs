//! # Strata Window Manager Library
//!
//! Runtime manager for layered UI windows: which windows exist, the order they
//! draw in, and which of them are visible.
//!
//! ## Architecture
//!
//! Strata is built from small modules around one orchestrator:
//! - `manager`: Show/hide/close lifecycle, per-frame update, cooperative waits
//! - `stack`: Layer-grouped window order, sorting orders, occlusion cascade
//! - `registry`: Name-keyed ownership of live windows
//! - `window`: Descriptors, instances, the content trait and the type catalog
//! - `assets`: Asset loader seam plus in-memory and filesystem loaders
//! - `timer`: Tick-driven one-shot timers for hide-to-close
//! - `config`: TOML configuration
//! - `logging`: env_logger setup
//!
//! ## Usage
//!
//! ```rust
//! use std::sync::Arc;
//! use strata::assets::MemoryAssetLoader;
//! use strata::config::ManagerConfig;
//! use strata::context::UiRoot;
//! use strata::timer::FrameTimers;
//! use strata::window::{CreateContext, LoadMode, WindowCatalog, WindowContent, WindowDescriptor};
//! use strata::WindowManager;
//!
//! struct Hud;
//!
//! impl WindowContent for Hud {
//!     fn create(&mut self, _ctx: &CreateContext<'_>) -> anyhow::Result<()> {
//!         Ok(())
//!     }
//! }
//!
//! let mut catalog = WindowCatalog::new();
//! catalog.register_with("Hud", WindowDescriptor::new(0, "ui/hud"), || Box::new(Hud))?;
//!
//! let loader = MemoryAssetLoader::new().with_asset("ui/hud", "hud layout");
//! let mut manager = WindowManager::new(
//!     &ManagerConfig::default(),
//!     Arc::new(UiRoot::default()),
//!     catalog,
//!     loader,
//!     FrameTimers::new(),
//! );
//!
//! let hud = manager.show("Hud", serde_json::Value::Null, LoadMode::Sync)?;
//! assert!(hud.is_visible());
//! # Ok::<(), strata::WindowError>(())
//! ```

pub mod assets;
pub mod config;
pub mod context;
pub mod error;
pub mod logging;
pub mod manager;
pub mod registry;
pub mod stack;
pub mod timer;
pub mod window;

// Re-export main types for easy access
pub use config::StrataConfig;
pub use context::UiRoot;
pub use error::WindowError;
pub use manager::{AwaitOutcome, Awaited, CancelToken, WindowManager, WindowSnapshot};
pub use stack::WindowStack;
pub use window::{
    LoadMode, UserData, WindowCatalog, WindowContent, WindowDescriptor, WindowId,
    WindowInstance, WindowKind,
};

/// Version information for Strata
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
pub const DESCRIPTION: &str = env!("CARGO_PKG_DESCRIPTION");
