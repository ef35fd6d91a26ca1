//! # Strata - Layered UI Window Manager
//!
//! Headless demo host. Builds a window manager over demo window kinds, runs a
//! scripted session and prints the window stack after each step.

use anyhow::{Context, Result};
use clap::Parser;
use log::{error, info, warn};
use serde_json::json;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;
use strata::assets::{AssetLoader, FsAssetLoader, MemoryAssetLoader};
use strata::timer::{FrameTimers, TimerService};
use strata::window::{CreateContext, FrameContext, LoadMode, UserData, WindowKind};
use strata::{
    logging, StrataConfig, UiRoot, WindowCatalog, WindowContent, WindowDescriptor, WindowManager,
    WindowSnapshot,
};

const FRAME: Duration = Duration::from_millis(16);

#[derive(Parser)]
#[command(name = "strata")]
#[command(about = "Headless demo of the Strata layered UI window manager")]
#[command(version)]
struct Cli {
    /// Path to configuration file
    #[arg(short, long, default_value = "~/.config/strata/strata.toml")]
    config: String,

    /// Enable debug logging
    #[arg(short, long)]
    debug: bool,

    /// Frames to tick after the windows are opened
    #[arg(short, long, default_value_t = 120)]
    frames: u32,

    /// Print stack snapshots as JSON
    #[arg(long)]
    json: bool,

    /// Load window layouts from this directory instead of the built-in set
    #[arg(long)]
    assets: Option<PathBuf>,
}

/// Text of the built-in layouts, keyed by asset location
const LAYOUTS: &[(&str, &str)] = &[
    ("ui/hud.layout", "health\nammo\nminimap"),
    ("ui/main_menu.layout", "title\ncontinue\nsettings\nquit"),
    ("ui/confirm.layout", "prompt\nyes\nno"),
    ("ui/toast.layout", "message"),
];

/// Content that keeps the lines of its layout as widget names
#[derive(Default)]
struct Layout {
    widgets: Vec<String>,
}

impl Layout {
    fn build(&mut self, ctx: &CreateContext<'_>) -> Result<()> {
        let text = ctx
            .asset
            .as_text()
            .with_context(|| format!("layout {} is not UTF-8", ctx.asset.path))?;
        self.widgets = text.lines().map(str::to_string).collect();
        info!(
            "Built '{}' with {} widgets at scale {:.2}",
            ctx.window,
            self.widgets.len(),
            ctx.root.scale_factor()
        );
        Ok(())
    }
}

#[derive(Default)]
struct Hud(Layout);

impl WindowContent for Hud {
    fn create(&mut self, ctx: &CreateContext<'_>) -> Result<()> {
        self.0.build(ctx)
    }

    fn on_visibility_changed(&mut self, visible: bool) {
        info!("Hud {}", if visible { "uncovered" } else { "covered" });
    }
}

impl WindowKind for Hud {
    const NAME: &'static str = "Hud";

    fn descriptor() -> WindowDescriptor {
        WindowDescriptor::new(0, "ui/hud.layout")
    }

    fn new_content() -> Self {
        Self::default()
    }
}

#[derive(Default)]
struct MainMenu(Layout);

impl WindowContent for MainMenu {
    fn create(&mut self, ctx: &CreateContext<'_>) -> Result<()> {
        self.0.build(ctx)
    }

    fn prepare(&mut self, user_data: &UserData) {
        if let Some(save) = user_data.get("save").and_then(UserData::as_str) {
            info!("Main menu offers to continue '{}'", save);
        }
    }

    fn close_tween(&mut self) -> Option<Duration> {
        Some(Duration::from_millis(250))
    }
}

impl WindowKind for MainMenu {
    const NAME: &'static str = "MainMenu";

    fn descriptor() -> WindowDescriptor {
        WindowDescriptor::new(2, "ui/main_menu.layout")
            .as_full_screen()
            .with_close_tween()
    }

    fn new_content() -> Self {
        Self::default()
    }
}

/// Dialog that answers itself after a fixed number of frames
#[derive(Default)]
struct ConfirmDialog {
    layout: Layout,
    frames_left: u32,
}

impl WindowContent for ConfirmDialog {
    fn create(&mut self, ctx: &CreateContext<'_>) -> Result<()> {
        self.layout.build(ctx)
    }

    fn prepare(&mut self, user_data: &UserData) {
        self.frames_left = user_data
            .get("answer_after")
            .and_then(UserData::as_u64)
            .unwrap_or(30) as u32;
        let prompt = user_data.get("prompt").and_then(UserData::as_str).unwrap_or("?");
        info!("Asking '{}'", prompt);
    }

    fn update(&mut self, frame: &mut FrameContext<'_>) {
        self.frames_left = self.frames_left.saturating_sub(1);
        if self.frames_left == 0 {
            info!("Dialog answered; closing");
            frame.close_self();
            frame.show("Toast", json!({"text": "Settings saved"}));
        }
    }
}

impl WindowKind for ConfirmDialog {
    const NAME: &'static str = "ConfirmDialog";

    fn descriptor() -> WindowDescriptor {
        WindowDescriptor::new(3, "ui/confirm.layout")
    }

    fn new_content() -> Self {
        Self::default()
    }
}

#[derive(Default)]
struct Toast {
    layout: Layout,
    shown_for: Duration,
    dismissed: bool,
}

impl WindowContent for Toast {
    fn create(&mut self, ctx: &CreateContext<'_>) -> Result<()> {
        self.layout.build(ctx)
    }

    fn prepare(&mut self, user_data: &UserData) {
        self.shown_for = Duration::ZERO;
        self.dismissed = false;
        let text = user_data.get("text").and_then(UserData::as_str).unwrap_or_default();
        info!("Toast: {}", text);
    }

    fn update(&mut self, frame: &mut FrameContext<'_>) {
        self.shown_for += frame.dt;
        if !self.dismissed && self.shown_for >= Duration::from_secs(1) {
            self.dismissed = true;
            frame.hide_self();
        }
    }
}

impl WindowKind for Toast {
    const NAME: &'static str = "Toast";

    fn descriptor() -> WindowDescriptor {
        WindowDescriptor::new(4, "ui/toast.layout").with_hide_to_close(0.5)
    }

    fn new_content() -> Self {
        Self::default()
    }
}

fn catalog(config: &StrataConfig) -> Result<WindowCatalog> {
    let mut catalog = WindowCatalog::with_declared(config.windows.clone());
    catalog.register::<Hud>()?;
    catalog.register::<MainMenu>()?;
    catalog.register::<ConfirmDialog>()?;
    catalog.register::<Toast>()?;
    Ok(catalog)
}

fn print_stack(step: &str, snapshot: &[WindowSnapshot], as_json: bool) -> Result<()> {
    if as_json {
        let value = json!({ "step": step, "windows": snapshot });
        println!("{}", serde_json::to_string(&value)?);
        return Ok(());
    }

    println!("== {} ==", step);
    for window in snapshot.iter().rev() {
        println!(
            "  {:<14} layer {:>2}  order {:>5}  {:?}",
            window.id.as_str(),
            window.layer,
            window.sorting_order,
            window.state
        );
    }
    Ok(())
}

async fn run_session<A: AssetLoader, T: TimerService>(
    manager: &mut WindowManager<A, T>,
    frames: u32,
    as_json: bool,
) -> Result<()> {
    manager.show_kind::<Hud>(UserData::Null, LoadMode::Sync)?;
    print_stack("hud", &manager.snapshot(), as_json)?;

    let awaited = manager
        .show_and_await(MainMenu::NAME, json!({"save": "slot 1"}), None)
        .await?;
    info!("Main menu wait ended: {:?}", awaited.outcome);
    print_stack("main menu", &manager.snapshot(), as_json)?;

    manager.show_kind::<ConfirmDialog>(
        json!({"prompt": "Apply settings?", "answer_after": frames / 2}),
        LoadMode::Sync,
    )?;
    print_stack("dialog", &manager.snapshot(), as_json)?;

    for _ in 0..frames {
        manager.update(FRAME)?;
    }
    print_stack("after frames", &manager.snapshot(), as_json)?;

    manager.close(MainMenu::NAME)?;
    manager.update(FRAME)?;
    print_stack("menu closed", &manager.snapshot(), as_json)?;

    manager.shutdown()?;
    Ok(())
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // Load configuration
    let (config, load_error) = match StrataConfig::load(&cli.config) {
        Ok(config) => (config, None),
        Err(e) => (StrataConfig::default(), Some(e)),
    };
    logging::init(&config.logging, cli.debug);

    match load_error {
        None => info!("Configuration loaded from: {}", cli.config),
        Some(e) => {
            error!("Failed to load configuration: {:#}", e);
            info!("Using default configuration");
        }
    }
    info!(
        "Starting Strata {} ({}, built {})",
        strata::VERSION,
        env!("STRATA_GIT_COMMIT"),
        env!("STRATA_BUILD_DATE")
    );

    let root = Arc::new(UiRoot::new(&config.root));
    let catalog = catalog(&config)?;
    info!("Window types: {}", catalog.names().join(", "));

    match cli.assets.filter(|dir| dir.is_dir()) {
        Some(dir) => {
            info!("Loading layouts from {}", dir.display());
            let loader = FsAssetLoader::new(dir, tokio::runtime::Handle::current());
            let mut manager =
                WindowManager::new(&config.manager, root, catalog, loader, FrameTimers::new());
            run_session(&mut manager, cli.frames, cli.json).await?;
        }
        None => {
            if config.assets.root.is_dir() {
                warn!(
                    "Ignoring asset root {}; pass --assets to load from disk",
                    config.assets.root.display()
                );
            }
            let mut loader = MemoryAssetLoader::new();
            for (path, text) in LAYOUTS {
                loader.insert(*path, *text);
            }
            // Make the menu load take a few frames
            loader.set_latency("ui/main_menu.layout", 3);
            let mut manager =
                WindowManager::new(&config.manager, root, catalog, loader, FrameTimers::new());
            run_session(&mut manager, cli.frames, cli.json).await?;
        }
    }

    info!("Strata demo finished");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cli_parsing() {
        let cli = Cli::try_parse_from(["strata"]).unwrap();
        assert!(!cli.debug);
        assert!(!cli.json);
        assert_eq!(cli.frames, 120);
        assert!(cli.assets.is_none());
    }

    #[test]
    fn test_cli_flags() {
        let cli = Cli::try_parse_from(["strata", "--debug", "--json", "--frames", "10"]).unwrap();
        assert!(cli.debug);
        assert!(cli.json);
        assert_eq!(cli.frames, 10);
    }

    #[test]
    fn test_demo_catalog_registers_every_kind() {
        let catalog = catalog(&StrataConfig::default()).unwrap();
        assert_eq!(catalog.names(), vec!["ConfirmDialog", "Hud", "MainMenu", "Toast"]);
    }

    #[tokio::test(start_paused = true)]
    async fn test_scripted_session_runs_to_completion() {
        let config = StrataConfig::default();
        let mut loader = MemoryAssetLoader::new();
        for (path, text) in LAYOUTS {
            loader.insert(*path, *text);
        }
        let mut manager = WindowManager::new(
            &config.manager,
            Arc::new(UiRoot::default()),
            catalog(&config).unwrap(),
            loader,
            FrameTimers::new(),
        );

        run_session(&mut manager, 20, true).await.unwrap();
        assert!(manager.is_empty());
        assert_eq!(manager.assets().live_handles(), 0);
    }
}
