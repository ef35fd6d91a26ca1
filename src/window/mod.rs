//! Window types and per-window state
//!
//! This module defines what a window *is* to the manager:
//! - [`WindowDescriptor`]: static, per-type metadata (layer, asset, flags)
//! - [`WindowInstance`]: one live window and its lifecycle flags
//! - [`WindowContent`]: the widget layer behind a window, supplied per type
//!
//! Instances are only created through the manager, which routes them through
//! the registry so at most one instance per identifier is ever live.

pub mod catalog;

pub use catalog::{ContentFactory, WindowCatalog, WindowKind};

use crate::assets::{Asset, AssetHandle};
use crate::context::UiRoot;
use crate::timer::TimerHandle;
use serde::{Deserialize, Serialize};
use std::borrow::Borrow;
use std::fmt;
use std::sync::Arc;
use std::time::Duration;

/// Payload handed to a window each time it is shown
pub type UserData = serde_json::Value;

/// Window identifier; by convention the window type's name
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct WindowId(String);

impl WindowId {
    pub fn new(name: impl Into<String>) -> Self {
        Self(name.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for WindowId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl Borrow<str> for WindowId {
    fn borrow(&self) -> &str {
        &self.0
    }
}

impl AsRef<str> for WindowId {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl From<&str> for WindowId {
    fn from(name: &str) -> Self {
        Self(name.to_string())
    }
}

impl From<String> for WindowId {
    fn from(name: String) -> Self {
        Self(name)
    }
}

/// Static metadata for a window type
///
/// Immutable once the type is registered with a [`WindowCatalog`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WindowDescriptor {
    /// Gross front-to-back bucket; higher layers draw on top
    #[serde(default)]
    pub layer: i32,

    /// Fully opaque and screen covering; occludes everything below once prepared
    #[serde(default)]
    pub full_screen: bool,

    /// Asset location handed to the loader
    pub asset: String,

    /// Asset comes from the loader's built-in table
    #[serde(default)]
    pub builtin_asset: bool,

    /// Content plays a close tween before it is destroyed
    #[serde(default)]
    pub tween_on_close: bool,

    /// Seconds a hidden window waits before closing; negative closes on hide
    #[serde(default = "WindowDescriptor::default_hide_time_to_close")]
    pub hide_time_to_close: f32,
}

impl WindowDescriptor {
    /// Descriptor for a partial window on `layer` that closes immediately when hidden
    pub fn new(layer: i32, asset: impl Into<String>) -> Self {
        Self {
            layer,
            full_screen: false,
            asset: asset.into(),
            builtin_asset: false,
            tween_on_close: false,
            hide_time_to_close: Self::default_hide_time_to_close(),
        }
    }

    pub fn as_full_screen(mut self) -> Self {
        self.full_screen = true;
        self
    }

    pub fn as_builtin(mut self) -> Self {
        self.builtin_asset = true;
        self
    }

    pub fn with_close_tween(mut self) -> Self {
        self.tween_on_close = true;
        self
    }

    pub fn with_hide_to_close(mut self, seconds: f32) -> Self {
        self.hide_time_to_close = seconds;
        self
    }

    /// Delay between hide and close, or `None` when hiding closes at once
    ///
    /// Values too large for a [`Duration`] (including infinity) saturate to
    /// [`Duration::MAX`], which never comes due.
    pub fn hide_delay(&self) -> Option<Duration> {
        if self.hide_time_to_close.is_nan() || self.hide_time_to_close < 0.0 {
            return None;
        }
        Some(Duration::try_from_secs_f32(self.hide_time_to_close).unwrap_or(Duration::MAX))
    }

    fn default_hide_time_to_close() -> f32 {
        -1.0
    }
}

/// How a window's asset is loaded
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LoadMode {
    /// Load before `show` returns; the window is prepared on return
    Sync,
    /// Submit the load and return; completion is picked up on the update tick
    #[default]
    Async,
}

/// Lifecycle state derived from an instance's flags
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum WindowState {
    /// Asset load in flight
    Loading,
    /// Asset load or content creation failed; never retried
    LoadFailed,
    /// Content ready but currently occluded
    Prepared,
    /// Content ready and drawn
    Visible,
    /// Administratively hidden, waiting for its hide-to-close timer
    Hidden,
}

/// Everything content needs to build itself
pub struct CreateContext<'a> {
    pub window: &'a WindowId,
    pub descriptor: &'a WindowDescriptor,
    pub asset: &'a Asset,
    pub root: &'a UiRoot,
}

/// Something a window asks the manager to do during its update
#[derive(Debug, Clone, PartialEq)]
pub enum WindowRequest {
    Show {
        id: WindowId,
        user_data: UserData,
        mode: LoadMode,
    },
    Hide(WindowId),
    Close(WindowId),
}

/// Per-frame context passed to [`WindowContent::update`]
///
/// Windows cannot reach the manager while it is iterating over them, so they
/// queue requests here. Requests run right after the window's update returns.
pub struct FrameContext<'a> {
    pub dt: Duration,
    pub window: &'a WindowId,
    pub root: &'a UiRoot,
    requests: Vec<WindowRequest>,
}

impl<'a> FrameContext<'a> {
    pub(crate) fn new(dt: Duration, window: &'a WindowId, root: &'a UiRoot) -> Self {
        Self {
            dt,
            window,
            root,
            requests: Vec::new(),
        }
    }

    pub fn close_self(&mut self) {
        self.requests.push(WindowRequest::Close(self.window.clone()));
    }

    pub fn hide_self(&mut self) {
        self.requests.push(WindowRequest::Hide(self.window.clone()));
    }

    pub fn show(&mut self, id: impl Into<WindowId>, user_data: UserData) {
        self.requests.push(WindowRequest::Show {
            id: id.into(),
            user_data,
            mode: LoadMode::Async,
        });
    }

    pub fn close(&mut self, id: impl Into<WindowId>) {
        self.requests.push(WindowRequest::Close(id.into()));
    }

    pub fn hide(&mut self, id: impl Into<WindowId>) {
        self.requests.push(WindowRequest::Hide(id.into()));
    }

    pub fn requests(&self) -> &[WindowRequest] {
        &self.requests
    }

    pub(crate) fn into_requests(self) -> Vec<WindowRequest> {
        self.requests
    }
}

/// The widget layer behind one window
///
/// Only [`WindowContent::create`] is required. The manager calls the hooks at
/// fixed lifecycle points: `create` then `bind_children` once the asset has
/// loaded, `prepare` on every show, `destroy` on close.
pub trait WindowContent {
    /// Build child content from the loaded asset. Failure is a fatal
    /// configuration error and is not retried.
    fn create(&mut self, ctx: &CreateContext<'_>) -> anyhow::Result<()>;

    fn bind_children(&mut self) {}

    /// Called with the caller's data each time the window is shown
    fn prepare(&mut self, _user_data: &UserData) {}

    fn update(&mut self, _frame: &mut FrameContext<'_>) {}

    fn on_visibility_changed(&mut self, _visible: bool) {}

    fn on_sorting_order_changed(&mut self, _sorting_order: i32) {}

    /// Length of the close tween to play, if any. Only asked when the
    /// descriptor sets `tween_on_close`.
    fn close_tween(&mut self) -> Option<Duration> {
        None
    }

    fn destroy(&mut self) {}
}

/// One live window
pub struct WindowInstance {
    id: WindowId,
    descriptor: Arc<WindowDescriptor>,
    sorting_order: i32,
    visible: bool,
    is_hide: bool,
    is_prepared: bool,
    is_load_done: bool,
    load_error: Option<String>,
    pending_hide_timer: Option<TimerHandle>,
    asset: Option<AssetHandle>,
    pending_user_data: Option<UserData>,
    content: Box<dyn WindowContent>,
}

impl fmt::Debug for WindowInstance {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("WindowInstance")
            .field("id", &self.id)
            .field("layer", &self.descriptor.layer)
            .field("sorting_order", &self.sorting_order)
            .field("visible", &self.visible)
            .field("is_hide", &self.is_hide)
            .field("is_prepared", &self.is_prepared)
            .field("is_load_done", &self.is_load_done)
            .field("load_error", &self.load_error)
            .field("pending_hide_timer", &self.pending_hide_timer)
            .finish_non_exhaustive()
    }
}

impl WindowInstance {
    pub fn new(
        id: impl Into<WindowId>,
        descriptor: Arc<WindowDescriptor>,
        content: Box<dyn WindowContent>,
    ) -> Self {
        Self {
            id: id.into(),
            descriptor,
            sorting_order: 0,
            visible: false,
            is_hide: false,
            is_prepared: false,
            is_load_done: false,
            load_error: None,
            pending_hide_timer: None,
            asset: None,
            pending_user_data: None,
            content,
        }
    }

    pub fn id(&self) -> &WindowId {
        &self.id
    }

    pub fn descriptor(&self) -> &WindowDescriptor {
        &self.descriptor
    }

    pub fn layer(&self) -> i32 {
        self.descriptor.layer
    }

    pub fn is_full_screen(&self) -> bool {
        self.descriptor.full_screen
    }

    pub fn sorting_order(&self) -> i32 {
        self.sorting_order
    }

    pub fn is_visible(&self) -> bool {
        self.visible
    }

    pub fn is_hide(&self) -> bool {
        self.is_hide
    }

    pub fn is_prepared(&self) -> bool {
        self.is_prepared
    }

    pub fn is_load_done(&self) -> bool {
        self.is_load_done
    }

    pub fn load_error(&self) -> Option<&str> {
        self.load_error.as_deref()
    }

    /// Load still in flight (not done and not failed)
    pub fn is_loading(&self) -> bool {
        !self.is_load_done && self.load_error.is_none()
    }

    pub fn pending_hide_timer(&self) -> Option<TimerHandle> {
        self.pending_hide_timer
    }

    pub fn state(&self) -> WindowState {
        if self.is_hide {
            WindowState::Hidden
        } else if self.load_error.is_some() {
            WindowState::LoadFailed
        } else if !self.is_prepared {
            WindowState::Loading
        } else if self.visible {
            WindowState::Visible
        } else {
            WindowState::Prepared
        }
    }

    pub(crate) fn set_sorting_order(&mut self, sorting_order: i32) {
        if self.sorting_order != sorting_order {
            self.sorting_order = sorting_order;
            self.content.on_sorting_order_changed(sorting_order);
        }
    }

    pub(crate) fn set_visible(&mut self, visible: bool) {
        if self.visible != visible {
            self.visible = visible;
            self.content.on_visibility_changed(visible);
        }
    }

    pub(crate) fn set_hide(&mut self, is_hide: bool) {
        self.is_hide = is_hide;
    }

    pub(crate) fn set_prepared(&mut self, is_prepared: bool) {
        self.is_prepared = is_prepared;
    }

    pub(crate) fn mark_load_done(&mut self) {
        self.is_load_done = true;
    }

    pub(crate) fn mark_failed(&mut self, reason: String) {
        self.load_error = Some(reason);
    }

    pub(crate) fn asset(&self) -> Option<AssetHandle> {
        self.asset
    }

    pub(crate) fn set_asset(&mut self, handle: AssetHandle) {
        self.asset = Some(handle);
    }

    pub(crate) fn take_asset(&mut self) -> Option<AssetHandle> {
        self.asset.take()
    }

    pub(crate) fn replace_hide_timer(&mut self, handle: Option<TimerHandle>) -> Option<TimerHandle> {
        std::mem::replace(&mut self.pending_hide_timer, handle)
    }

    pub(crate) fn stash_user_data(&mut self, user_data: UserData) {
        self.pending_user_data = Some(user_data);
    }

    pub(crate) fn take_user_data(&mut self) -> Option<UserData> {
        self.pending_user_data.take()
    }

    pub(crate) fn create_content(&mut self, asset: &Asset, root: &UiRoot) -> anyhow::Result<()> {
        let ctx = CreateContext {
            window: &self.id,
            descriptor: &self.descriptor,
            asset,
            root,
        };
        self.content.create(&ctx)
    }

    pub(crate) fn content_mut(&mut self) -> &mut dyn WindowContent {
        self.content.as_mut()
    }
}

#[cfg(test)]
pub(crate) mod tests;
