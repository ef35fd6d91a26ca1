//! Cooperative waits on window loads
//!
//! The wait polls the window's load once per interval and sleeps on the tokio
//! clock in between. It gives up at the configured ceiling or when its
//! [`CancelToken`] fires; either way the window stays registered.

use super::WindowManager;
use crate::assets::AssetLoader;
use crate::error::{Result, WindowError};
use crate::timer::TimerService;
use crate::window::{LoadMode, UserData, WindowId, WindowInstance};
use log::{debug, warn};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use tokio::time::Instant;

/// Shared flag that stops an in-progress wait
#[derive(Debug, Clone, Default)]
pub struct CancelToken(Arc<AtomicBool>);

impl CancelToken {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cancel(&self) {
        self.0.store(true, Ordering::SeqCst);
    }

    pub fn is_cancelled(&self) -> bool {
        self.0.load(Ordering::SeqCst)
    }
}

/// Why a wait ended
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AwaitOutcome {
    /// The window finished loading and is prepared
    Loaded,
    /// The asset load failed
    Failed,
    /// The wait ceiling elapsed with the load still in flight
    TimedOut,
    /// The caller's token was cancelled
    Cancelled,
}

/// A window together with how the wait on it ended
#[derive(Debug)]
pub struct Awaited<'a> {
    pub outcome: AwaitOutcome,
    pub window: &'a WindowInstance,
}

impl Awaited<'_> {
    pub fn is_loaded(&self) -> bool {
        self.outcome == AwaitOutcome::Loaded
    }
}

impl<A: AssetLoader, T: TimerService> WindowManager<A, T> {
    /// Show a window asynchronously and wait until it is prepared
    ///
    /// Returns early, with the window still registered, on load failure,
    /// on cancellation, or once the wait ceiling has elapsed.
    pub async fn show_and_await(
        &mut self,
        id: &str,
        user_data: UserData,
        cancel: Option<&CancelToken>,
    ) -> Result<Awaited<'_>> {
        self.show(id, user_data, LoadMode::Async)?;
        let outcome = self.wait_for_load(id, cancel).await?;
        let window = self
            .registry
            .get(id)
            .ok_or_else(|| WindowError::WindowNotFound(WindowId::from(id)))?;
        Ok(Awaited { outcome, window })
    }

    /// Wait on a live window without re-showing it
    ///
    /// Returns `None` if no window with this identifier is live.
    pub async fn get_and_await(
        &mut self,
        id: &str,
        cancel: Option<&CancelToken>,
    ) -> Result<Option<Awaited<'_>>> {
        if !self.registry.contains(id) {
            return Ok(None);
        }
        let outcome = self.wait_for_load(id, cancel).await?;
        Ok(self
            .registry
            .get(id)
            .map(|window| Awaited { outcome, window }))
    }

    async fn wait_for_load(&mut self, id: &str, cancel: Option<&CancelToken>) -> Result<AwaitOutcome> {
        let ceiling = self.config.await_ceiling();
        let interval = self.config.await_poll_interval();
        let started = Instant::now();

        loop {
            self.poll_load(id)?;

            let window = self
                .registry
                .get(id)
                .ok_or_else(|| WindowError::WindowNotFound(WindowId::from(id)))?;
            if window.load_error().is_some() {
                return Ok(AwaitOutcome::Failed);
            }
            if window.is_prepared() {
                return Ok(AwaitOutcome::Loaded);
            }
            if cancel.is_some_and(CancelToken::is_cancelled) {
                debug!("Wait on '{}' cancelled", id);
                return Ok(AwaitOutcome::Cancelled);
            }

            let elapsed = started.elapsed();
            if elapsed >= ceiling {
                warn!("Gave up waiting on '{}' after {:?}", id, elapsed);
                return Ok(AwaitOutcome::TimedOut);
            }
            tokio::time::sleep(interval.min(ceiling - elapsed)).await;
        }
    }
}
