//! Unit tests for window types, plus content doubles shared by other test modules

use super::*;
use std::cell::RefCell;
use std::rc::Rc;

/// Content that builds nothing
pub(crate) struct Blank;

impl WindowContent for Blank {
    fn create(&mut self, _ctx: &CreateContext<'_>) -> anyhow::Result<()> {
        Ok(())
    }
}

/// Calls observed by a [`Probe`]
#[derive(Debug, Default)]
pub(crate) struct ProbeLog {
    pub created: usize,
    pub bound: usize,
    pub prepared: Vec<UserData>,
    pub updates: usize,
    pub visibility: Vec<bool>,
    pub sorting: Vec<i32>,
    pub destroyed: usize,
}

pub(crate) type SharedLog = Rc<RefCell<ProbeLog>>;

type UpdateHook = Box<dyn FnMut(&mut FrameContext<'_>)>;

/// Content that records every hook call into a shared log
pub(crate) struct Probe {
    log: SharedLog,
    fail_create: bool,
    tween: Option<Duration>,
    on_update: Option<UpdateHook>,
}

impl Probe {
    pub fn new(log: &SharedLog) -> Self {
        Self {
            log: Rc::clone(log),
            fail_create: false,
            tween: None,
            on_update: None,
        }
    }

    pub fn failing(log: &SharedLog) -> Self {
        Self {
            fail_create: true,
            ..Self::new(log)
        }
    }

    pub fn with_tween(mut self, tween: Duration) -> Self {
        self.tween = Some(tween);
        self
    }

    pub fn on_update(mut self, hook: impl FnMut(&mut FrameContext<'_>) + 'static) -> Self {
        self.on_update = Some(Box::new(hook));
        self
    }
}

impl WindowContent for Probe {
    fn create(&mut self, ctx: &CreateContext<'_>) -> anyhow::Result<()> {
        if self.fail_create {
            anyhow::bail!("broken layout in {}", ctx.asset.path);
        }
        self.log.borrow_mut().created += 1;
        Ok(())
    }

    fn bind_children(&mut self) {
        self.log.borrow_mut().bound += 1;
    }

    fn prepare(&mut self, user_data: &UserData) {
        self.log.borrow_mut().prepared.push(user_data.clone());
    }

    fn update(&mut self, frame: &mut FrameContext<'_>) {
        self.log.borrow_mut().updates += 1;
        if let Some(hook) = self.on_update.as_mut() {
            hook(frame);
        }
    }

    fn on_visibility_changed(&mut self, visible: bool) {
        self.log.borrow_mut().visibility.push(visible);
    }

    fn on_sorting_order_changed(&mut self, sorting_order: i32) {
        self.log.borrow_mut().sorting.push(sorting_order);
    }

    fn close_tween(&mut self) -> Option<Duration> {
        self.tween
    }

    fn destroy(&mut self) {
        self.log.borrow_mut().destroyed += 1;
    }
}

pub(crate) fn new_log() -> SharedLog {
    Rc::new(RefCell::new(ProbeLog::default()))
}

/// Bare instance for stack and registry tests
pub(crate) fn instance(id: &str, layer: i32, full_screen: bool) -> WindowInstance {
    let mut descriptor = WindowDescriptor::new(layer, format!("ui/{}", id));
    descriptor.full_screen = full_screen;
    WindowInstance::new(id, Arc::new(descriptor), Box::new(Blank))
}

#[test]
fn test_descriptor_defaults() {
    let descriptor = WindowDescriptor::new(3, "ui/shop");

    assert_eq!(descriptor.layer, 3);
    assert!(!descriptor.full_screen);
    assert!(!descriptor.builtin_asset);
    assert!(!descriptor.tween_on_close);
    assert_eq!(descriptor.hide_delay(), None);
}

#[test]
fn test_hide_delay() {
    let descriptor = WindowDescriptor::new(0, "ui/toast").with_hide_to_close(2.0);
    assert_eq!(descriptor.hide_delay(), Some(Duration::from_secs(2)));

    let immediate = WindowDescriptor::new(0, "ui/toast").with_hide_to_close(0.0);
    assert_eq!(immediate.hide_delay(), Some(Duration::ZERO));

    let nan = WindowDescriptor::new(0, "ui/toast").with_hide_to_close(f32::NAN);
    assert_eq!(nan.hide_delay(), None);
}

#[test]
fn test_huge_hide_delay_saturates() {
    let forever = WindowDescriptor::new(0, "ui/toast").with_hide_to_close(f32::INFINITY);
    assert_eq!(forever.hide_delay(), Some(Duration::MAX));

    let huge = WindowDescriptor::new(0, "ui/toast").with_hide_to_close(1e20);
    assert_eq!(huge.hide_delay(), Some(Duration::MAX));

    let negative_infinity = WindowDescriptor::new(0, "ui/toast").with_hide_to_close(f32::NEG_INFINITY);
    assert_eq!(negative_infinity.hide_delay(), None);
}

#[test]
fn test_descriptor_deserializes_with_defaults() {
    let descriptor: WindowDescriptor = toml::from_str(r#"asset = "ui/hud""#).unwrap();

    assert_eq!(descriptor, WindowDescriptor::new(0, "ui/hud"));
}

#[test]
fn test_window_id_borrows_as_str() {
    let mut map = std::collections::HashMap::new();
    map.insert(WindowId::from("Inventory"), 1);

    assert_eq!(map.get("Inventory"), Some(&1));
    assert_eq!(WindowId::new("Inventory").to_string(), "Inventory");
}

#[test]
fn test_new_instance_is_loading() {
    let window = instance("Inventory", 1, false);

    assert_eq!(window.state(), WindowState::Loading);
    assert!(window.is_loading());
    assert!(!window.is_visible());
    assert_eq!(window.layer(), 1);
}

#[test]
fn test_state_follows_flags() {
    let mut window = instance("Inventory", 1, false);

    window.mark_load_done();
    window.set_prepared(true);
    assert_eq!(window.state(), WindowState::Prepared);

    window.set_visible(true);
    assert_eq!(window.state(), WindowState::Visible);

    window.set_hide(true);
    assert_eq!(window.state(), WindowState::Hidden);

    let mut broken = instance("Broken", 0, false);
    broken.mark_failed("asset not found".into());
    assert_eq!(broken.state(), WindowState::LoadFailed);
    assert!(!broken.is_loading());
}

#[test]
fn test_content_hooks_fire_only_on_change() {
    let log = new_log();
    let descriptor = Arc::new(WindowDescriptor::new(0, "ui/probe"));
    let mut window = WindowInstance::new("Probe", descriptor, Box::new(Probe::new(&log)));

    window.set_visible(true);
    window.set_visible(true);
    window.set_visible(false);
    window.set_sorting_order(100);
    window.set_sorting_order(100);

    let log = RefCell::borrow(&log);
    assert_eq!(log.visibility, vec![true, false]);
    assert_eq!(log.sorting, vec![100]);
}

#[test]
fn test_frame_context_queues_requests() {
    let root = UiRoot::default();
    let id = WindowId::from("Dialog");
    let mut frame = FrameContext::new(Duration::from_millis(16), &id, &root);

    frame.show("Toast", serde_json::json!({"text": "saved"}));
    frame.close_self();

    assert_eq!(
        frame.into_requests(),
        vec![
            WindowRequest::Show {
                id: WindowId::from("Toast"),
                user_data: serde_json::json!({"text": "saved"}),
                mode: LoadMode::Async,
            },
            WindowRequest::Close(WindowId::from("Dialog")),
        ]
    );
}
