//! Layer-grouped window stacking order
//!
//! This module provides the `WindowStack` data structure, the single source of
//! truth for back-to-front render order. Entries are grouped by layer in
//! non-decreasing order; within a layer, the most recently pushed window is
//! nearest the top. The stack also derives sorting orders and runs the
//! visibility cascade over the registry.

use crate::registry::WindowRegistry;
use crate::window::WindowId;
use log::{debug, warn};
use std::collections::HashMap;

/// One stacked window
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StackEntry {
    pub id: WindowId,
    pub layer: i32,
}

/// Manages the layer-grouped Z-ordering of windows.
///
/// Windows are stored in back-to-front order, where index 0 is drawn first
/// and the last index is the top-most window.
///
/// # Examples
///
/// ```
/// use strata::stack::WindowStack;
///
/// let mut stack = WindowStack::new();
/// stack.push("Hud".into(), 0);
/// stack.push("Popup".into(), 2);
/// stack.push("Menu".into(), 1);
///
/// let order: Vec<&str> = stack.render_order().map(|id| id.as_str()).collect();
/// assert_eq!(order, ["Hud", "Menu", "Popup"]);
/// ```
#[derive(Debug, Clone, Default)]
pub struct WindowStack {
    /// Windows ordered from back to front
    entries: Vec<StackEntry>,

    /// Fast lookup: window ID → position in stack
    positions: HashMap<WindowId, usize>,

    /// Bumped on every structural change
    generation: u64,
}

impl WindowStack {
    /// Creates a new empty window stack.
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a window stack with the specified initial capacity.
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            entries: Vec::with_capacity(capacity),
            positions: HashMap::with_capacity(capacity),
            generation: 0,
        }
    }

    /// Inserts a window on top of its layer group.
    ///
    /// The window goes right after the last entry of the same layer. With no
    /// such entry it goes right after the last entry of a lower layer, and
    /// with neither it goes to the front.
    ///
    /// # Returns
    ///
    /// `Some(index)` where the window landed, or `None` if it was already stacked
    pub fn push(&mut self, window_id: WindowId, layer: i32) -> Option<usize> {
        if self.positions.contains_key(&window_id) {
            return None;
        }

        let same_layer = self.entries.iter().rposition(|e| e.layer == layer);
        let index = match same_layer {
            Some(i) => i + 1,
            None => self
                .entries
                .iter()
                .rposition(|e| e.layer < layer)
                .map_or(0, |i| i + 1),
        };

        debug!("Stacked '{}' (layer {}) at {}", window_id, layer, index);
        self.entries.insert(index, StackEntry { id: window_id, layer });
        self.rebuild_positions();
        self.generation += 1;
        Some(index)
    }

    /// Removes a window from the stack. Remaining entries keep their order.
    ///
    /// # Returns
    ///
    /// `Some(entry)` with the removed entry if found, `None` otherwise
    pub fn remove(&mut self, window_id: &str) -> Option<StackEntry> {
        let pos = self.positions.remove(window_id)?;
        let entry = self.entries.remove(pos);
        self.rebuild_positions();
        self.generation += 1;
        Some(entry)
    }

    /// Moves a window to the top of its layer group (remove + push).
    ///
    /// # Returns
    ///
    /// `true` if the window was raised, `false` if it wasn't in the stack
    pub fn raise(&mut self, window_id: &str) -> bool {
        match self.remove(window_id) {
            Some(entry) => self.push(entry.id, entry.layer).is_some(),
            None => false,
        }
    }

    /// Returns the windows in back-to-front rendering order.
    pub fn render_order(&self) -> impl DoubleEndedIterator<Item = &WindowId> {
        self.entries.iter().map(|e| &e.id)
    }

    /// Returns the stacked entries in back-to-front order.
    pub fn entries(&self) -> &[StackEntry] {
        &self.entries
    }

    /// Returns the top-most window in the stack.
    pub fn top(&self) -> Option<&WindowId> {
        self.entries.last().map(|e| &e.id)
    }

    /// Returns the top-most window of a given layer.
    pub fn top_in_layer(&self, layer: i32) -> Option<&WindowId> {
        self.entries
            .iter()
            .rev()
            .find(|e| e.layer == layer)
            .map(|e| &e.id)
    }

    /// Returns the bottom-most window in the stack.
    pub fn bottom(&self) -> Option<&WindowId> {
        self.entries.first().map(|e| &e.id)
    }

    /// Returns the number of windows in the stack.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Returns `true` if the stack contains no windows.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Checks if a window is in the stack.
    pub fn contains(&self, window_id: &str) -> bool {
        self.positions.contains_key(window_id)
    }

    /// Returns the position of a window in the stack.
    ///
    /// Position 0 is the bottom-most window, and `len() - 1` is the top-most.
    pub fn position(&self, window_id: &str) -> Option<usize> {
        self.positions.get(window_id).copied()
    }

    /// Returns the layer a stacked window was pushed with.
    pub fn layer_of(&self, window_id: &str) -> Option<i32> {
        self.position(window_id).map(|pos| self.entries[pos].layer)
    }

    /// Returns the windows of one layer in back-to-front order.
    pub fn windows_in_layer(&self, layer: i32) -> Vec<&WindowId> {
        self.entries
            .iter()
            .filter(|e| e.layer == layer)
            .map(|e| &e.id)
            .collect()
    }

    /// Returns all entries above a given window in the stack.
    pub fn windows_above(&self, window_id: &str) -> &[StackEntry] {
        match self.positions.get(window_id) {
            Some(&pos) => &self.entries[pos + 1..],
            None => &[],
        }
    }

    /// Returns all entries below a given window in the stack.
    pub fn windows_below(&self, window_id: &str) -> &[StackEntry] {
        match self.positions.get(window_id) {
            Some(&pos) => &self.entries[..pos],
            None => &[],
        }
    }

    /// Structural change counter; differs whenever a push or remove happened in between.
    pub fn generation(&self) -> u64 {
        self.generation
    }

    /// Whether layers are non-decreasing from back to front.
    pub fn is_layer_grouped(&self) -> bool {
        self.entries.windows(2).all(|w| w[0].layer <= w[1].layer)
    }

    /// Clears all windows from the stack.
    pub fn clear(&mut self) {
        self.entries.clear();
        self.positions.clear();
        self.generation += 1;
    }

    /// Assigns sorting orders to every window of `layer`.
    ///
    /// Values start at `layer * layer_stride` and step by `window_stride`
    /// back to front. Other layers are untouched.
    ///
    /// # Returns
    ///
    /// The number of windows assigned
    pub fn assign_sorting_orders(
        &self,
        layer: i32,
        layer_stride: i32,
        window_stride: i32,
        registry: &mut WindowRegistry,
    ) -> usize {
        let mut order = layer.saturating_mul(layer_stride);
        let mut assigned = 0;

        for entry in self.entries.iter().filter(|e| e.layer == layer) {
            if let Some(window) = registry.get_mut(entry.id.as_str()) {
                window.set_sorting_order(order);
            }
            order = order.saturating_add(window_stride);
            assigned += 1;
        }

        let capacity = if window_stride > 0 {
            (layer_stride / window_stride).max(0) as usize
        } else {
            0
        };
        if assigned > capacity {
            warn!(
                "Layer {} holds {} windows but its sorting range fits {}; orders overlap the next layer",
                layer, assigned, capacity
            );
        }

        assigned
    }

    /// Recomputes visibility from the top of the stack down.
    ///
    /// Administratively hidden windows are skipped. Everything above and
    /// including the top-most prepared full-screen window is visible; everything
    /// below it is not.
    ///
    /// # Returns
    ///
    /// The occluding full-screen window, if one was found
    pub fn cascade_visibility(&self, registry: &mut WindowRegistry) -> Option<WindowId> {
        let mut occluder = None;

        for entry in self.entries.iter().rev() {
            let Some(window) = registry.get_mut(entry.id.as_str()) else {
                continue;
            };

            if occluder.is_some() {
                window.set_visible(false);
                continue;
            }

            if window.is_hide() {
                continue;
            }

            window.set_visible(true);
            if window.is_prepared() && window.is_full_screen() {
                occluder = Some(entry.id.clone());
            }
        }

        occluder
    }

    /// Rebuilds the position lookup map.
    ///
    /// This is called internally after operations that change window positions.
    fn rebuild_positions(&mut self) {
        self.positions.clear();
        for (i, entry) in self.entries.iter().enumerate() {
            self.positions.insert(entry.id.clone(), i);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::window::tests::instance;
    use proptest::prelude::*;

    fn ids(stack: &WindowStack) -> Vec<&str> {
        stack.render_order().map(|id| id.as_str()).collect()
    }

    fn push(stack: &mut WindowStack, id: &str, layer: i32) -> Option<usize> {
        stack.push(WindowId::from(id), layer)
    }

    /// Registry and stack holding the same windows, pushed in order
    fn stacked(windows: &[(&str, i32, bool)]) -> (WindowStack, WindowRegistry) {
        let mut stack = WindowStack::new();
        let mut registry = WindowRegistry::new();
        for &(id, layer, full_screen) in windows {
            registry.put(instance(id, layer, full_screen)).unwrap();
            push(&mut stack, id, layer);
        }
        (stack, registry)
    }

    fn prepare(registry: &mut WindowRegistry, id: &str) {
        registry.get_mut(id).unwrap().set_prepared(true);
    }

    fn visible(registry: &WindowRegistry, id: &str) -> bool {
        registry.get(id).unwrap().is_visible()
    }

    #[test]
    fn test_new_stack_is_empty() {
        let stack = WindowStack::new();
        assert!(stack.is_empty());
        assert_eq!(stack.len(), 0);
        assert_eq!(stack.top(), None);
        assert_eq!(stack.bottom(), None);
    }

    #[test]
    fn test_push_same_layer_goes_on_top_of_group() {
        let mut stack = WindowStack::new();
        push(&mut stack, "A", 1);
        push(&mut stack, "Top", 3);
        push(&mut stack, "B", 1);

        assert_eq!(ids(&stack), ["A", "B", "Top"]);
        assert_eq!(stack.position("B"), Some(1));
    }

    #[test]
    fn test_push_new_layer_goes_after_lower_layers() {
        let mut stack = WindowStack::new();
        push(&mut stack, "Low", 0);
        push(&mut stack, "High", 4);

        assert_eq!(push(&mut stack, "Mid", 2), Some(1));
        assert_eq!(ids(&stack), ["Low", "Mid", "High"]);
    }

    #[test]
    fn test_push_lowest_layer_goes_to_front() {
        let mut stack = WindowStack::new();
        push(&mut stack, "Mid", 2);
        push(&mut stack, "High", 4);

        assert_eq!(push(&mut stack, "Floor", -1), Some(0));
        assert_eq!(stack.bottom().map(|id| id.as_str()), Some("Floor"));
    }

    #[test]
    fn test_push_into_empty_stack() {
        let mut stack = WindowStack::new();
        assert_eq!(push(&mut stack, "Only", 7), Some(0));
        assert_eq!(stack.top().map(|id| id.as_str()), Some("Only"));
    }

    #[test]
    fn test_push_duplicate_is_noop() {
        let mut stack = WindowStack::new();
        assert!(push(&mut stack, "A", 0).is_some());
        let generation = stack.generation();

        assert!(push(&mut stack, "A", 5).is_none());
        assert_eq!(stack.len(), 1);
        assert_eq!(stack.layer_of("A"), Some(0));
        assert_eq!(stack.generation(), generation);
    }

    #[test]
    fn test_remove_window() {
        let mut stack = WindowStack::new();
        push(&mut stack, "A", 0);
        push(&mut stack, "B", 0);
        push(&mut stack, "C", 1);

        let removed = stack.remove("B");
        assert_eq!(removed, Some(StackEntry { id: "B".into(), layer: 0 }));
        assert_eq!(ids(&stack), ["A", "C"]);
        assert!(!stack.contains("B"));
        assert_eq!(stack.remove("B"), None);
    }

    #[test]
    fn test_raise_stays_within_layer() {
        let mut stack = WindowStack::new();
        push(&mut stack, "A", 1);
        push(&mut stack, "B", 1);
        push(&mut stack, "Top", 2);

        assert!(stack.raise("A"));
        assert_eq!(ids(&stack), ["B", "A", "Top"]);
        assert!(!stack.raise("Nope"));
    }

    #[test]
    fn test_top_in_layer() {
        let mut stack = WindowStack::new();
        push(&mut stack, "A", 1);
        push(&mut stack, "X", 2);
        push(&mut stack, "B", 1);

        assert_eq!(stack.top_in_layer(1).map(|id| id.as_str()), Some("B"));
        assert_eq!(stack.top_in_layer(2).map(|id| id.as_str()), Some("X"));
        assert_eq!(stack.top_in_layer(9), None);
        assert_eq!(stack.top().map(|id| id.as_str()), Some("X"));
    }

    #[test]
    fn test_windows_above_and_below() {
        let mut stack = WindowStack::new();
        push(&mut stack, "A", 0);
        push(&mut stack, "B", 1);
        push(&mut stack, "C", 2);

        let above: Vec<_> = stack.windows_above("A").iter().map(|e| e.id.as_str()).collect();
        assert_eq!(above, ["B", "C"]);
        assert!(stack.windows_below("A").is_empty());
        assert!(stack.windows_above("Nope").is_empty());
        assert_eq!(stack.windows_in_layer(1).len(), 1);
    }

    #[test]
    fn test_generation_tracks_structure() {
        let mut stack = WindowStack::new();
        let start = stack.generation();
        push(&mut stack, "A", 0);
        stack.remove("A");
        assert_eq!(stack.generation(), start + 2);

        stack.clear();
        assert!(stack.is_empty());
        assert!(stack.generation() > start + 2);
    }

    #[test]
    fn test_position_consistency_after_operations() {
        let mut stack = WindowStack::new();
        push(&mut stack, "A", 0);
        push(&mut stack, "B", 2);
        push(&mut stack, "C", 1);
        stack.remove("A");

        for (i, id) in stack.render_order().enumerate() {
            assert_eq!(stack.position(id.as_str()), Some(i));
        }
    }

    #[test]
    fn test_sorting_orders_per_layer() {
        let (stack, mut registry) = stacked(&[("A", 1, false), ("X", 2, false), ("B", 1, false)]);

        assert_eq!(stack.assign_sorting_orders(1, 2000, 100, &mut registry), 2);
        assert_eq!(registry.get("A").unwrap().sorting_order(), 2000);
        assert_eq!(registry.get("B").unwrap().sorting_order(), 2100);
        // Other layers untouched
        assert_eq!(registry.get("X").unwrap().sorting_order(), 0);
    }

    #[test]
    fn test_sorting_overflow_still_assigns() {
        let (stack, mut registry) = stacked(&[("A", 0, false), ("B", 0, false), ("C", 0, false)]);

        assert_eq!(stack.assign_sorting_orders(0, 200, 100, &mut registry), 3);
        assert_eq!(registry.get("C").unwrap().sorting_order(), 200);
    }

    #[test]
    fn test_cascade_hides_below_prepared_full_screen() {
        let (stack, mut registry) = stacked(&[("A", 0, false), ("B", 1, true), ("C", 2, false)]);
        prepare(&mut registry, "B");

        let occluder = stack.cascade_visibility(&mut registry);

        assert_eq!(occluder.as_ref().map(|id| id.as_str()), Some("B"));
        assert!(!visible(&registry, "A"));
        assert!(visible(&registry, "B"));
        assert!(visible(&registry, "C"));
    }

    #[test]
    fn test_cascade_ignores_unprepared_full_screen() {
        let (stack, mut registry) = stacked(&[("A", 0, false), ("B", 1, true)]);

        assert!(stack.cascade_visibility(&mut registry).is_none());
        assert!(visible(&registry, "A"));
        assert!(visible(&registry, "B"));
    }

    #[test]
    fn test_cascade_skips_hidden_windows() {
        let (stack, mut registry) = stacked(&[("A", 0, false), ("B", 1, true)]);
        prepare(&mut registry, "B");
        registry.get_mut("B").unwrap().set_hide(true);

        // A hidden full-screen window does not occlude
        assert!(stack.cascade_visibility(&mut registry).is_none());
        assert!(visible(&registry, "A"));
        assert!(!visible(&registry, "B"));
    }

    fn arb_windows() -> impl Strategy<Value = Vec<(i32, bool, bool)>> {
        prop::collection::vec((-3i32..6, any::<bool>(), any::<bool>()), 0..20)
    }

    proptest! {
        #[test]
        fn prop_push_keeps_layers_grouped(layers in prop::collection::vec(-3i32..6, 0..40)) {
            let mut stack = WindowStack::new();
            for (i, layer) in layers.iter().enumerate() {
                stack.push(WindowId::from(format!("w{}", i)), *layer);
                prop_assert!(stack.is_layer_grouped());
            }
            prop_assert_eq!(stack.len(), layers.len());
        }

        #[test]
        fn prop_latest_push_is_top_of_its_layer(layers in prop::collection::vec(-3i32..6, 1..40)) {
            let mut stack = WindowStack::new();
            for (i, layer) in layers.iter().enumerate() {
                let id = WindowId::from(format!("w{}", i));
                stack.push(id.clone(), *layer);
                prop_assert_eq!(stack.top_in_layer(*layer), Some(&id));
            }
        }

        #[test]
        fn prop_sorting_orders_strictly_increase(windows in arb_windows()) {
            let mut stack = WindowStack::new();
            let mut registry = WindowRegistry::new();
            for (i, (layer, full_screen, _)) in windows.iter().enumerate() {
                let id = format!("w{}", i);
                registry.put(instance(&id, *layer, *full_screen)).unwrap();
                stack.push(WindowId::from(id), *layer);
            }
            for layer in -3..6 {
                stack.assign_sorting_orders(layer, 2000, 100, &mut registry);
            }

            let orders: Vec<i32> = stack
                .render_order()
                .map(|id| registry.get(id.as_str()).unwrap().sorting_order())
                .collect();
            // Fewer windows per layer than the stride allows, so orders increase globally
            prop_assert!(orders.windows(2).all(|w| w[0] < w[1]));
        }

        #[test]
        fn prop_cascade_matches_topmost_occluder(windows in arb_windows()) {
            let mut stack = WindowStack::new();
            let mut registry = WindowRegistry::new();
            for (i, (layer, full_screen, prepared)) in windows.iter().enumerate() {
                let id = format!("w{}", i);
                let mut window = instance(&id, *layer, *full_screen);
                window.set_prepared(*prepared);
                registry.put(window).unwrap();
                stack.push(WindowId::from(id), *layer);
            }

            let occluder = stack.cascade_visibility(&mut registry);
            let cut = occluder.as_ref().and_then(|id| stack.position(id.as_str()));

            for (pos, id) in stack.render_order().enumerate() {
                let window = registry.get(id.as_str()).unwrap();
                match cut {
                    Some(cut) if pos < cut => prop_assert!(!window.is_visible()),
                    _ => prop_assert!(window.is_visible()),
                }
            }
        }
    }
}
