//! Host-owned UI root context
//!
//! Shared canvas and camera settings live here instead of in globals. The
//! application host builds one [`UiRoot`] at startup, hands an `Arc` to the
//! manager, and drops it at shutdown. Window content sees it when it is created.

use crate::config::RootConfig;

/// Canvas and camera settings shared by every window
#[derive(Debug, Clone, PartialEq)]
pub struct UiRoot {
    /// Reference resolution window layouts are authored against
    pub reference_resolution: (u32, u32),
    /// Current screen size in pixels
    pub screen_size: (u32, u32),
    /// Depth of the UI camera relative to the scene
    pub camera_depth: i32,
}

impl UiRoot {
    pub fn new(config: &RootConfig) -> Self {
        let reference = (config.reference_width, config.reference_height);
        Self {
            reference_resolution: reference,
            screen_size: reference,
            camera_depth: config.camera_depth,
        }
    }

    /// Uniform scale from reference resolution to screen, matching on the
    /// narrower axis
    pub fn scale_factor(&self) -> f32 {
        let (rw, rh) = self.reference_resolution;
        let (sw, sh) = self.screen_size;
        if rw == 0 || rh == 0 {
            return 1.0;
        }
        (sw as f32 / rw as f32).min(sh as f32 / rh as f32)
    }
}

impl Default for UiRoot {
    fn default() -> Self {
        Self::new(&RootConfig::default())
    }
}
