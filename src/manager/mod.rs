//! Window lifecycle orchestration
//!
//! [`WindowManager`] owns the registry and the stack and keeps them in
//! lockstep: a window is in both or in neither. It drives asset loads, hide
//! timers, close tweens and per-frame content updates from a single update
//! thread; nothing here is shared across threads.

mod await_ops;

pub use await_ops::{AwaitOutcome, Awaited, CancelToken};

use crate::assets::{Asset, AssetLoader, AssetRequest, AssetStatus};
use crate::config::ManagerConfig;
use crate::context::UiRoot;
use crate::error::{Result, WindowError};
use crate::registry::WindowRegistry;
use crate::stack::WindowStack;
use crate::timer::{FrameTimers, TimerAction, TimerService};
use crate::window::{
    FrameContext, LoadMode, UserData, WindowCatalog, WindowId, WindowInstance, WindowKind,
    WindowRequest, WindowState,
};
use log::{debug, error, info, trace, warn};
use serde::Serialize;
use std::sync::Arc;
use std::time::Duration;

/// Point-in-time view of one stacked window
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct WindowSnapshot {
    pub id: WindowId,
    pub layer: i32,
    pub sorting_order: i32,
    pub visible: bool,
    pub hidden: bool,
    pub prepared: bool,
    pub load_done: bool,
    pub state: WindowState,
}

impl From<&WindowInstance> for WindowSnapshot {
    fn from(window: &WindowInstance) -> Self {
        Self {
            id: window.id().clone(),
            layer: window.layer(),
            sorting_order: window.sorting_order(),
            visible: window.is_visible(),
            hidden: window.is_hide(),
            prepared: window.is_prepared(),
            load_done: window.is_load_done(),
            state: window.state(),
        }
    }
}

/// A closed window whose content is still playing its close tween
struct ClosingWindow {
    window: WindowInstance,
    remaining: Duration,
}

/// Orchestrates window existence, order and visibility
pub struct WindowManager<A: AssetLoader, T: TimerService = FrameTimers> {
    config: ManagerConfig,
    root: Arc<UiRoot>,
    catalog: WindowCatalog,
    registry: WindowRegistry,
    stack: WindowStack,
    assets: A,
    timers: T,
    closing: Vec<ClosingWindow>,
}

impl<A: AssetLoader, T: TimerService> WindowManager<A, T> {
    /// Create a manager over the host's root context and collaborators
    pub fn new(
        config: &ManagerConfig,
        root: Arc<UiRoot>,
        catalog: WindowCatalog,
        assets: A,
        timers: T,
    ) -> Self {
        if let Err(e) = config.validate() {
            warn!("{:#}; out-of-range manager settings fall back to defaults", e);
        }
        debug!(
            "Window manager ready with {} window types (layer stride {}, window stride {})",
            catalog.len(),
            config.layer_stride(),
            config.window_stride()
        );
        Self {
            config: config.clone(),
            root,
            catalog,
            registry: WindowRegistry::new(),
            stack: WindowStack::new(),
            assets,
            timers,
            closing: Vec::new(),
        }
    }

    /// Show a window, creating it on first use
    ///
    /// A live window is raised to the top of its layer group, un-hidden, and
    /// handed `user_data` again. Otherwise a new instance is built from the
    /// catalog, stacked, and its asset load submitted. With [`LoadMode::Sync`]
    /// the window is prepared before this returns.
    pub fn show(&mut self, id: &str, user_data: UserData, mode: LoadMode) -> Result<&WindowInstance> {
        if self.registry.contains(id) {
            self.reshow(id, user_data);
        } else {
            self.open(id, user_data, mode)?;
        }
        self.window(id)
    }

    /// Typed form of [`WindowManager::show`]
    pub fn show_kind<K: WindowKind>(
        &mut self,
        user_data: UserData,
        mode: LoadMode,
    ) -> Result<&WindowInstance> {
        self.show(K::NAME, user_data, mode)
    }

    fn reshow(&mut self, id: &str, user_data: UserData) {
        let Some(window) = self.registry.get_mut(id) else {
            return;
        };
        if let Some(timer) = window.replace_hide_timer(None) {
            self.timers.cancel(timer);
        }
        window.set_hide(false);
        let layer = window.layer();

        self.stack.raise(id);
        self.refresh_layer(layer);
        self.cascade();

        if let Some(window) = self.registry.get_mut(id) {
            if window.is_prepared() {
                window.content_mut().prepare(&user_data);
            } else {
                // Still loading: the latest data is delivered once prepared
                window.stash_user_data(user_data);
            }
        }
        info!("Re-showed window '{}'", id);
    }

    fn open(&mut self, id: &str, user_data: UserData, mode: LoadMode) -> Result<()> {
        let (descriptor, content) = self.catalog.instantiate(id)?;
        let request = AssetRequest::new(descriptor.asset.clone(), descriptor.builtin_asset);
        let layer = descriptor.layer;

        let mut window = WindowInstance::new(id, descriptor, content);
        window.stash_user_data(user_data);
        self.registry.put(window)?;
        self.stack.push(WindowId::from(id), layer);
        self.refresh_layer(layer);

        let handle = match mode {
            LoadMode::Sync => self.assets.load_sync(&request),
            LoadMode::Async => self.assets.load_async(&request),
        };
        if let Some(window) = self.registry.get_mut(id) {
            window.set_asset(handle);
        }
        info!("Opened window '{}' (layer {}, {:?} load of {})", id, layer, mode, request.path);

        self.cascade();

        if mode == LoadMode::Sync {
            self.poll_load(id)?;
        }
        Ok(())
    }

    /// Check one window's in-flight load and prepare it if it finished
    ///
    /// Returns `true` once the load is no longer in flight.
    pub(crate) fn poll_load(&mut self, id: &str) -> Result<bool> {
        let Some(window) = self.registry.get_mut(id) else {
            return Ok(true);
        };
        if !window.is_loading() {
            return Ok(true);
        }
        let Some(handle) = window.asset() else {
            return Ok(true);
        };

        match self.assets.poll(handle) {
            AssetStatus::Pending => Ok(false),
            AssetStatus::Failed(e) => {
                error!("Failed to load asset for window '{}': {}", id, e);
                window.mark_failed(e.to_string());
                Ok(true)
            }
            AssetStatus::Loaded(asset) => {
                window.mark_load_done();
                self.on_prepared(id, &asset)?;
                Ok(true)
            }
        }
    }

    fn on_prepared(&mut self, id: &str, asset: &Asset) -> Result<()> {
        let root = Arc::clone(&self.root);
        let Some(window) = self.registry.get_mut(id) else {
            return Ok(());
        };

        if let Err(source) = window.create_content(asset, &root) {
            error!("Content creation failed for window '{}': {:#}", id, source);
            window.mark_failed(format!("{:#}", source));
            return Err(WindowError::ContentCreation {
                id: WindowId::from(id),
                source,
            });
        }
        window.content_mut().bind_children();
        window.set_prepared(true);
        let layer = window.layer();
        let user_data = window.take_user_data().unwrap_or(UserData::Null);

        self.refresh_layer(layer);
        self.cascade();

        if let Some(window) = self.registry.get_mut(id) {
            window.content_mut().prepare(&user_data);
        }
        info!("Window '{}' prepared", id);
        Ok(())
    }

    /// Close a live window: tear down its content and drop it from the stack
    pub fn close(&mut self, id: &str) -> Result<()> {
        if self.stack.remove(id).is_none() {
            return Err(WindowError::WindowNotFound(WindowId::from(id)));
        }
        let mut window = self
            .registry
            .remove(id)
            .ok_or_else(|| WindowError::WindowNotFound(WindowId::from(id)))?;

        if let Some(timer) = window.replace_hide_timer(None) {
            self.timers.cancel(timer);
        }

        let tween = if window.descriptor().tween_on_close && window.is_prepared() {
            window.content_mut().close_tween().filter(|d| !d.is_zero())
        } else {
            None
        };
        let layer = window.layer();

        match tween {
            Some(remaining) => {
                debug!("Window '{}' playing close tween for {:?}", id, remaining);
                self.closing.push(ClosingWindow { window, remaining });
            }
            None => self.finalize(window),
        }

        self.refresh_layer(layer);
        self.cascade();
        info!("Closed window '{}'", id);
        Ok(())
    }

    fn finalize(&mut self, mut window: WindowInstance) {
        if window.is_prepared() {
            window.content_mut().destroy();
        }
        if let Some(handle) = window.take_asset() {
            self.assets.dispose(handle);
        }
        trace!("Destroyed window '{}'", window.id());
    }

    /// Hide a live window, closing it after its descriptor's hide delay
    ///
    /// With a negative `hide_time_to_close` this is exactly [`WindowManager::close`].
    pub fn hide(&mut self, id: &str) -> Result<()> {
        let window = self
            .registry
            .get_mut(id)
            .ok_or_else(|| WindowError::WindowNotFound(WindowId::from(id)))?;
        let Some(delay) = window.descriptor().hide_delay() else {
            return self.close(id);
        };

        if let Some(previous) = window.replace_hide_timer(None) {
            self.timers.cancel(previous);
        }
        window.set_hide(true);
        window.set_visible(false);
        let full_screen = window.is_full_screen();

        let handle = self
            .timers
            .schedule_once(delay, TimerAction::CloseWindow(WindowId::from(id)));
        if let Some(window) = self.registry.get_mut(id) {
            window.replace_hide_timer(Some(handle));
        }

        if full_screen {
            self.cascade();
        }
        info!("Hid window '{}', closing in {:?}", id, delay);
        Ok(())
    }

    /// Close every window not listed in `exceptions`, top first
    ///
    /// Returns the number of windows closed.
    pub fn close_all(&mut self, exceptions: &[&str]) -> Result<usize> {
        let targets: Vec<WindowId> = self
            .stack
            .render_order()
            .rev()
            .filter(|id| !exceptions.contains(&id.as_str()))
            .cloned()
            .collect();

        for id in &targets {
            self.close(id.as_str())?;
        }
        Ok(targets.len())
    }

    /// Advance one frame
    ///
    /// Polls in-flight loads, fires due hide timers, advances close tweens,
    /// then updates every prepared window back to front. If the set of windows
    /// changes during the update pass, the pass stops early. A content
    /// creation failure is returned after the frame completes.
    pub fn update(&mut self, dt: Duration) -> Result<()> {
        let mut failure = None;

        let loading: Vec<WindowId> = self
            .registry
            .iter()
            .filter(|w| w.is_loading())
            .map(|w| w.id().clone())
            .collect();
        for id in loading {
            if let Err(e) = self.poll_load(id.as_str()) {
                failure.get_or_insert(e);
            }
        }

        for fired in self.timers.advance(dt) {
            let TimerAction::CloseWindow(id) = fired.action;
            let current = self
                .registry
                .get(id.as_str())
                .and_then(|w| w.pending_hide_timer());
            if current != Some(fired.handle) {
                debug!("Ignoring stale {} for '{}'", fired.handle, id);
                continue;
            }
            if let Some(window) = self.registry.get_mut(id.as_str()) {
                window.replace_hide_timer(None);
            }
            debug!("Hide timer expired for '{}'", id);
            self.close(id.as_str())?;
        }

        self.advance_close_tweens(dt);

        if let Err(e) = self.update_windows(dt) {
            failure.get_or_insert(e);
        }

        match failure {
            Some(e) => Err(e),
            None => Ok(()),
        }
    }

    fn advance_close_tweens(&mut self, dt: Duration) {
        if self.closing.is_empty() {
            return;
        }

        let root = Arc::clone(&self.root);
        let (done, playing): (Vec<_>, Vec<_>) = std::mem::take(&mut self.closing)
            .into_iter()
            .map(|mut closing| {
                closing.remaining = closing.remaining.saturating_sub(dt);
                // Tweening content still animates; its requests are dropped
                let id = closing.window.id().clone();
                let mut frame = FrameContext::new(dt, &id, &root);
                closing.window.content_mut().update(&mut frame);
                closing
            })
            .partition(|closing| closing.remaining.is_zero());

        self.closing = playing;
        for closing in done {
            self.finalize(closing.window);
        }
    }

    fn update_windows(&mut self, dt: Duration) -> Result<()> {
        let generation = self.stack.generation();
        let order: Vec<WindowId> = self.stack.render_order().cloned().collect();
        let root = Arc::clone(&self.root);

        for id in order {
            let Some(window) = self.registry.get_mut(id.as_str()) else {
                continue;
            };
            if !window.is_prepared() {
                continue;
            }

            let mut frame = FrameContext::new(dt, &id, &root);
            window.content_mut().update(&mut frame);
            for request in frame.into_requests() {
                self.apply_request(request)?;
            }

            if self.stack.generation() != generation {
                debug!("Window set changed while updating '{}'; ending update pass", id);
                break;
            }
        }
        Ok(())
    }

    fn apply_request(&mut self, request: WindowRequest) -> Result<()> {
        let result = match &request {
            WindowRequest::Show {
                id,
                user_data,
                mode,
            } => self.show(id.as_str(), user_data.clone(), *mode).map(|_| ()),
            WindowRequest::Hide(id) => self.hide(id.as_str()),
            WindowRequest::Close(id) => self.close(id.as_str()),
        };

        match result {
            Err(e @ WindowError::ContentCreation { .. }) => Err(e),
            Err(e) => {
                warn!("Ignoring window request {:?}: {}", request, e);
                Ok(())
            }
            Ok(()) => Ok(()),
        }
    }

    /// Close every window and finish pending close tweens
    pub fn shutdown(&mut self) -> Result<()> {
        let closed = self.close_all(&[])?;
        for closing in std::mem::take(&mut self.closing) {
            self.finalize(closing.window);
        }
        info!("Window manager shut down ({} windows closed)", closed);
        Ok(())
    }

    fn refresh_layer(&mut self, layer: i32) {
        self.stack.assign_sorting_orders(
            layer,
            self.config.layer_stride(),
            self.config.window_stride(),
            &mut self.registry,
        );
    }

    fn cascade(&mut self) {
        if let Some(occluder) = self.stack.cascade_visibility(&mut self.registry) {
            trace!("Windows below '{}' are occluded", occluder);
        }
    }

    fn window(&self, id: &str) -> Result<&WindowInstance> {
        self.registry
            .get(id)
            .ok_or_else(|| WindowError::WindowNotFound(WindowId::from(id)))
    }

    pub fn contains(&self, id: &str) -> bool {
        self.registry.contains(id)
    }

    pub fn get(&self, id: &str) -> Option<&WindowInstance> {
        self.registry.get(id)
    }

    /// Top-most window
    pub fn get_top(&self) -> Option<&WindowId> {
        self.stack.top()
    }

    /// Top-most window of `layer`
    pub fn get_top_in_layer(&self, layer: i32) -> Option<&WindowId> {
        self.stack.top_in_layer(layer)
    }

    /// Whether any stacked window has not finished loading
    ///
    /// A window whose asset failed counts here, since it never becomes load
    /// done. Use [`WindowManager::is_any_in_flight`] to leave failures out.
    pub fn is_any_loading(&self) -> bool {
        self.windows().any(|w| !w.is_load_done())
    }

    /// Whether any stacked window still has a load that may yet finish
    pub fn is_any_in_flight(&self) -> bool {
        self.windows().any(WindowInstance::is_loading)
    }

    /// Live windows in back-to-front order
    pub fn windows(&self) -> impl Iterator<Item = &WindowInstance> {
        self.stack
            .render_order()
            .filter_map(move |id| self.registry.get(id.as_str()))
    }

    pub fn snapshot(&self) -> Vec<WindowSnapshot> {
        self.windows().map(WindowSnapshot::from).collect()
    }

    pub fn len(&self) -> usize {
        self.stack.len()
    }

    pub fn is_empty(&self) -> bool {
        self.stack.is_empty()
    }

    /// Closed windows still playing a close tween
    pub fn closing_count(&self) -> usize {
        self.closing.len()
    }

    pub fn stack(&self) -> &WindowStack {
        &self.stack
    }

    pub fn registry(&self) -> &WindowRegistry {
        &self.registry
    }

    pub fn catalog(&self) -> &WindowCatalog {
        &self.catalog
    }

    pub fn root(&self) -> &Arc<UiRoot> {
        &self.root
    }

    pub fn assets(&self) -> &A {
        &self.assets
    }

    pub fn assets_mut(&mut self) -> &mut A {
        &mut self.assets
    }

    pub fn timers(&self) -> &T {
        &self.timers
    }
}
