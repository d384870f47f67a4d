use super::{
    Anchor, Item, ItemId, ItemSpec, LayoutSolver, Placement, Scene, SolverKind, seed_items,
};
use crate::config::{Config, InteractionConfig, LayoutConfig};
use crate::geometry::{Point, Vector, Viewport};
use serde::Serialize;
use std::time::Instant;
use strum::Display as StrumDisplay;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, StrumDisplay)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum Visibility {
    Closed,
    Open,
}

/// Why a relayout ran. Only used for logging.
#[derive(Debug, Clone, Copy, PartialEq, Eq, StrumDisplay)]
#[strum(serialize_all = "kebab-case")]
enum Trigger {
    Visibility,
    Hover,
    DragEnd,
    Resize,
    ItemSet,
    Reconfigure,
}

/// What the presentation layer has to do after an input.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Reaction {
    pub relayout: bool,
    pub should_redraw: bool,
}

impl Reaction {
    pub fn new(relayout: bool, should_redraw: bool) -> Self {
        Self {
            relayout,
            should_redraw,
        }
    }

    fn relayout() -> Self {
        Self::new(true, true)
    }

    fn redraw() -> Self {
        Self::new(false, true)
    }
}

#[derive(Debug, Clone, PartialEq)]
struct PendingHover {
    target: Option<ItemId>,
    due: Instant,
}

/// Debounced hover state. Entering commits after the enter delay, leaving
/// clears after the (shorter) leave delay.
#[derive(Debug, Clone, Default)]
struct HoverIntent {
    committed: Option<ItemId>,
    pending: Option<PendingHover>,
}

impl HoverIntent {
    fn enter(&mut self, id: ItemId, now: Instant, cfg: &InteractionConfig) {
        if self.committed.as_ref() == Some(&id) {
            self.pending = None;
        } else {
            self.pending = Some(PendingHover {
                target: Some(id),
                due: now + cfg.hover_enter_delay(),
            });
        }
    }

    fn leave(&mut self, id: &ItemId, now: Instant, cfg: &InteractionConfig) {
        match self.pending.as_ref().and_then(|p| p.target.clone()) {
            Some(target) if &target == id => self.pending = None,
            // an enter on a neighbour replaces the committed hover when it lands
            Some(_) => return,
            None => {}
        }
        if self.committed.as_ref() == Some(id) {
            self.pending = Some(PendingHover {
                target: None,
                due: now + cfg.hover_leave_delay(),
            });
        }
    }

    /// Commits a due change. Returns true if the committed hover changed.
    fn poll(&mut self, now: Instant) -> bool {
        match self.pending.take() {
            Some(p) if p.due <= now => {
                let changed = self.committed != p.target;
                self.committed = p.target;
                changed
            }
            other => {
                self.pending = other;
                false
            }
        }
    }

    fn deadline(&self) -> Option<Instant> {
        self.pending.as_ref().map(|p| p.due)
    }

    fn clear(&mut self) -> bool {
        self.pending = None;
        self.committed.take().is_some()
    }

    /// Drops hover state naming items that are gone. Returns true if the
    /// committed hover was among them.
    fn forget_missing(&mut self, items: &[Item]) -> bool {
        let exists = |id: &ItemId| items.iter().any(|item| &item.id == id);

        let pending_gone = self
            .pending
            .as_ref()
            .and_then(|p| p.target.as_ref())
            .is_some_and(|id| !exists(id));
        if pending_gone {
            self.pending = None;
        }

        if self.committed.as_ref().is_some_and(|id| !exists(id)) {
            self.clear()
        } else {
            false
        }
    }
}

#[derive(Debug, Clone, Copy)]
struct DragGesture {
    pointer_start: Point,
    anchor_start: Point,
    travelled: f64,
}

/// Output consumed by the presentation layer.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct LayoutSnapshot {
    pub visibility: Visibility,
    pub solver: SolverKind,
    pub anchor: Point,
    pub viewport: Viewport,
    pub hovered: Option<ItemId>,
    pub items: Vec<Placement>,
}

/// Owns item state and decides when the solver runs.
///
/// Recomputes happen on open/close, committed hover changes, drag
/// completion, resize, item count changes and reconfiguration. Intermediate
/// drag moves only move the anchor.
pub struct LayoutController {
    params: LayoutConfig,
    interaction: InteractionConfig,
    solver: Box<dyn LayoutSolver>,
    anchor: Anchor,
    viewport: Viewport,
    items: Vec<Item>,
    placed: bool,
    visibility: Visibility,
    hover: HoverIntent,
    drag: Option<DragGesture>,
    suppress_click: bool,
}

impl LayoutController {
    pub fn new(config: &Config) -> Self {
        let params = config.layout.clone();
        let viewport = config.viewport;
        let mut controller = Self {
            solver: config.solver.build(params.clone()),
            anchor: Anchor::centered_in(&viewport, params.anchor_diameter),
            items: seed_items(config.item_specs(), &params),
            interaction: config.interaction.clone(),
            params,
            viewport,
            placed: false,
            visibility: Visibility::Closed,
            hover: HoverIntent::default(),
            drag: None,
            suppress_click: false,
        };
        controller.recompute(Trigger::ItemSet);
        controller
    }

    pub fn visibility(&self) -> Visibility {
        self.visibility
    }

    pub fn is_open(&self) -> bool {
        self.visibility == Visibility::Open
    }

    pub fn anchor(&self) -> Anchor {
        self.anchor
    }

    pub fn items(&self) -> &[Item] {
        &self.items
    }

    pub fn hovered(&self) -> Option<&ItemId> {
        self.hover.committed.as_ref()
    }

    /// When the next debounced hover change is due, if any.
    pub fn next_deadline(&self) -> Option<Instant> {
        self.hover.deadline()
    }

    pub fn snapshot(&self) -> LayoutSnapshot {
        LayoutSnapshot {
            visibility: self.visibility,
            solver: self.solver.kind(),
            anchor: self.anchor.center(),
            viewport: self.viewport,
            hovered: self.hover.committed.clone(),
            items: if self.placed {
                self.items.iter().map(Item::placement).collect()
            } else {
                Vec::new()
            },
        }
    }

    pub fn set_open(&mut self, open: bool) -> Reaction {
        let next = if open {
            Visibility::Open
        } else {
            Visibility::Closed
        };
        if next == self.visibility {
            return Reaction::default();
        }
        self.visibility = next;
        if next == Visibility::Closed && self.hover.clear() {
            self.apply_hover();
        }
        self.recompute(Trigger::Visibility)
    }

    /// Anchor click. Ignored when it ends a gesture that travelled past the drag threshold.
    pub fn click(&mut self) -> Reaction {
        if std::mem::take(&mut self.suppress_click) {
            log::debug!("Click swallowed after drag");
            return Reaction::default();
        }
        self.set_open(!self.is_open())
    }

    pub fn drag_start(&mut self, pointer: Point) -> Reaction {
        self.suppress_click = false;
        self.drag = Some(DragGesture {
            pointer_start: pointer,
            anchor_start: self.anchor.origin,
            travelled: 0.0,
        });
        Reaction::default()
    }

    pub fn drag_move(&mut self, pointer: Point) -> Reaction {
        if self.move_anchor(pointer) {
            Reaction::redraw()
        } else {
            Reaction::default()
        }
    }

    pub fn drag_end(&mut self, pointer: Point) -> Reaction {
        self.move_anchor(pointer);
        let Some(gesture) = self.drag.take() else {
            return Reaction::default();
        };

        if gesture.travelled > self.interaction.drag_threshold {
            self.suppress_click = true;
            self.recompute(Trigger::DragEnd)
        } else if self.anchor.origin != gesture.anchor_start {
            Reaction::redraw()
        } else {
            Reaction::default()
        }
    }

    fn move_anchor(&mut self, pointer: Point) -> bool {
        let Some(gesture) = self.drag.as_mut() else {
            return false;
        };
        let delta: Vector = pointer - gesture.pointer_start;
        gesture.travelled = gesture.travelled.max(delta.magnitude());

        let moved = Anchor::new(gesture.anchor_start + delta, self.anchor.diameter)
            .clamped_to(&self.viewport);
        let changed = moved != self.anchor;
        self.anchor = moved;
        changed
    }

    pub fn hover_enter(&mut self, id: ItemId, now: Instant) -> Reaction {
        if !self.is_open() || !self.items.iter().any(|item| item.id == id) {
            return Reaction::default();
        }
        self.hover.enter(id, now, &self.interaction);
        self.poll(now)
    }

    pub fn hover_leave(&mut self, id: &ItemId, now: Instant) -> Reaction {
        if !self.is_open() {
            return Reaction::default();
        }
        self.hover.leave(id, now, &self.interaction);
        self.poll(now)
    }

    /// Commits debounced hover changes that are due by `now`.
    pub fn poll(&mut self, now: Instant) -> Reaction {
        if self.hover.poll(now) {
            self.apply_hover();
            self.recompute(Trigger::Hover)
        } else {
            Reaction::default()
        }
    }

    pub fn resize(&mut self, viewport: Viewport) -> Reaction {
        if viewport == self.viewport {
            return Reaction::default();
        }
        self.viewport = viewport;
        self.anchor = self.anchor.clamped_to(&viewport);
        self.recompute(Trigger::Resize)
    }

    /// Replaces the item set. Items are re-seeded only when the count changes;
    /// otherwise they keep their relaxed offsets and relayout only if the
    /// hovered item went away.
    pub fn set_items(&mut self, specs: Vec<ItemSpec>) -> Reaction {
        if specs.len() != self.items.len() {
            self.items = seed_items(specs, &self.params);
            self.hover.forget_missing(&self.items);
            self.apply_hover();
            return self.recompute(Trigger::ItemSet);
        }

        for (item, spec) in self.items.iter_mut().zip(specs) {
            item.refresh(spec);
        }
        let dropped_hover = self.hover.forget_missing(&self.items);
        self.apply_hover();
        if dropped_hover {
            // the formerly hovered slot shrank back to its base size
            self.recompute(Trigger::Hover)
        } else {
            Reaction::redraw()
        }
    }

    /// Swaps in a reloaded configuration and relays out with the new solver.
    pub fn reconfigure(&mut self, config: &Config) -> Reaction {
        self.params = config.layout.clone();
        self.interaction = config.interaction.clone();
        self.solver = config.solver.build(self.params.clone());
        self.anchor = Anchor::new(self.anchor.origin, self.params.anchor_diameter)
            .clamped_to(&self.viewport);
        self.items = seed_items(config.item_specs(), &self.params);
        self.hover.clear();
        self.recompute(Trigger::Reconfigure)
    }

    fn apply_hover(&mut self) {
        let hovered = self.hover.committed.clone();
        let scale = self.params.hover_scale;
        for item in &mut self.items {
            item.set_hovered(hovered.as_ref() == Some(&item.id), scale);
        }
    }

    fn recompute(&mut self, trigger: Trigger) -> Reaction {
        let scene = Scene {
            anchor: self.anchor.center(),
            viewport: self.viewport,
        };
        let solved = self.solver.solve(&self.items, &scene);

        log::debug!(
            "Relayout on {} with {} solver: {} items",
            trigger,
            self.solver.kind(),
            solved.len()
        );

        if solved.len() == self.items.len() && !solved.is_empty() {
            self.items = solved;
            self.placed = true;
        } else {
            if !self.items.is_empty() {
                log::warn!(
                    "Solver produced no layout for {} items (reference radius {})",
                    self.items.len(),
                    self.params.reference_radius
                );
            }
            self.placed = false;
        }
        Reaction::relayout()
    }
}
