use crate::config::LayoutConfig;
use crate::geometry::{Point, Vector, Viewport, normalize_angle};
use derive_more::{AsRef, Deref, Display, From, Into};
use serde::{Deserialize, Serialize};
use serde_with::DeserializeFromStr;
use std::f64::consts::TAU;
use strum::{Display as StrumDisplay, EnumIter, EnumString};

pub mod arc;
pub mod controller;
pub mod force;

pub use arc::{ArcSolver, SafeArc};
pub use controller::{LayoutController, LayoutSnapshot, Reaction, Visibility};
pub use force::ForceSolver;

#[derive(
    Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize, Display, Deref, From, Into, AsRef,
)]
#[serde(transparent)]
pub struct ItemId(String);

impl ItemId {
    pub fn new(s: impl Into<String>) -> Self {
        Self(s.into())
    }
}

/// Presentation data carried alongside an item. The engine never reads it.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Payload {
    pub label: Option<String>,
    pub icon: Option<String>,
    pub color: Option<String>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ItemSpec {
    pub id: ItemId,
    pub base_size: f64,
    pub payload: Payload,
}

impl ItemSpec {
    pub fn new(id: impl Into<String>, base_size: f64) -> Self {
        Self {
            id: ItemId::new(id),
            base_size,
            payload: Payload::default(),
        }
    }
}

/// An orbital item and its accumulated relaxed state.
///
/// `offset` is anchor-relative. `target` mirrors it for the presentation
/// layer, which animates toward it. `size` is always `base_size * scale`.
#[derive(Debug, Clone, PartialEq)]
pub struct Item {
    pub id: ItemId,
    pub payload: Payload,
    pub base_size: f64,
    pub base_angle: f64,
    pub offset: Vector,
    pub target: Vector,
    pub current_radius: f64,
    pub current_angle: f64,
    pub hovered: bool,
    pub scale: f64,
    pub size: f64,
}

impl Item {
    /// Places item `index` of `count` on its ideal orbit position.
    pub fn seed(spec: ItemSpec, index: usize, count: usize, params: &LayoutConfig) -> Self {
        let base_angle = params.start_angle + index as f64 / count.max(1) as f64 * TAU;
        let mut item = Self {
            id: spec.id,
            payload: spec.payload,
            base_size: spec.base_size,
            base_angle,
            offset: Vector::ZERO,
            target: Vector::ZERO,
            current_radius: 0.0,
            current_angle: 0.0,
            hovered: false,
            scale: 1.0,
            size: spec.base_size,
        };
        item.settle(item.ideal_offset(params.reference_radius), params.reference_radius);
        item
    }

    pub fn ideal_offset(&self, reference_radius: f64) -> Vector {
        Vector::from_polar(self.base_angle, reference_radius)
    }

    pub fn set_hovered(&mut self, hovered: bool, hover_scale: f64) {
        self.hovered = hovered;
        self.scale = if hovered { hover_scale } else { 1.0 };
        self.size = self.base_size * self.scale;
    }

    /// Refreshes identity and payload from a same-position spec, keeping relaxed state.
    pub fn refresh(&mut self, spec: ItemSpec) {
        self.id = spec.id;
        self.payload = spec.payload;
        self.base_size = spec.base_size;
        self.size = self.base_size * self.scale;
    }

    pub fn collision_radius(&self, margin: f64) -> f64 {
        self.size / 2.0 + margin
    }

    /// Commits a solved offset and recomputes the polar form.
    pub fn settle(&mut self, offset: Vector, reference_radius: f64) {
        self.offset = offset;
        self.target = offset;
        self.current_radius = offset
            .magnitude()
            .clamp(0.0, (2.0 * reference_radius).max(0.0));
        self.current_angle = normalize_angle(offset.angle());
    }

    pub fn placement(&self) -> Placement {
        Placement {
            id: self.id.clone(),
            offset: self.target,
            angle: self.current_angle,
            radius: self.current_radius,
            scale: self.scale,
            size: self.size,
            payload: self.payload.clone(),
        }
    }
}

/// Builds a fresh item list in angular order.
pub fn seed_items(specs: Vec<ItemSpec>, params: &LayoutConfig) -> Vec<Item> {
    let count = specs.len();
    specs
        .into_iter()
        .enumerate()
        .map(|(i, spec)| Item::seed(spec, i, count, params))
        .collect()
}

/// The draggable reference point, stored by its top-left corner.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Anchor {
    pub origin: Point,
    pub diameter: f64,
}

impl Anchor {
    pub fn new(origin: Point, diameter: f64) -> Self {
        Self { origin, diameter }
    }

    pub fn centered_in(viewport: &Viewport, diameter: f64) -> Self {
        let half = diameter / 2.0;
        Self::new(viewport.center() - Vector::new(half, half), diameter)
    }

    pub fn center(&self) -> Point {
        self.origin + Vector::new(self.diameter / 2.0, self.diameter / 2.0)
    }

    /// Keeps the whole anchor inside the viewport.
    pub fn clamped_to(self, viewport: &Viewport) -> Self {
        let max_x = (viewport.width - self.diameter).max(0.0);
        let max_y = (viewport.height - self.diameter).max(0.0);
        Self {
            origin: Point::new(
                self.origin.x.clamp(0.0, max_x),
                self.origin.y.clamp(0.0, max_y),
            ),
            ..self
        }
    }
}

/// Solver input besides the items themselves.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Scene {
    /// Absolute anchor center.
    pub anchor: Point,
    pub viewport: Viewport,
}

/// Per-item output handed to the presentation layer.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Placement {
    pub id: ItemId,
    /// Relative to the anchor center.
    pub offset: Vector,
    pub angle: f64,
    pub radius: f64,
    pub scale: f64,
    pub size: f64,
    pub payload: Payload,
}

/// A placement strategy. Implementations are pure: the same items and scene
/// always produce the same result, and the input is never mutated.
pub trait LayoutSolver {
    fn kind(&self) -> SolverKind;

    /// Returns the relaxed item list, or an empty list when there is
    /// nothing sensible to place.
    fn solve(&self, items: &[Item], scene: &Scene) -> Vec<Item>;
}

#[derive(
    Debug,
    Clone,
    Copy,
    Default,
    PartialEq,
    Eq,
    Hash,
    Serialize,
    DeserializeFromStr,
    EnumString,
    EnumIter,
    StrumDisplay,
)]
#[strum(ascii_case_insensitive)]
#[serde(rename_all = "lowercase")]
pub enum SolverKind {
    #[default]
    #[strum(to_string = "force", serialize = "relax")]
    Force,
    #[strum(to_string = "arc", serialize = "safe-arc")]
    Arc,
}

impl SolverKind {
    pub fn build(self, params: LayoutConfig) -> Box<dyn LayoutSolver> {
        match self {
            Self::Force => Box::new(ForceSolver::new(params)),
            Self::Arc => Box::new(ArcSolver::new(params)),
        }
    }
}

/// Empty item sets and non-positive radii skip solving altogether.
pub(crate) fn is_degenerate(items: &[Item], params: &LayoutConfig) -> bool {
    items.is_empty() || !(params.reference_radius > 0.0)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::geometry::Circle;
    use strum::IntoEnumIterator;

    const EPS: f64 = 1e-6;

    fn scene(width: f64, height: f64) -> Scene {
        let viewport = Viewport::new(width, height);
        Scene {
            anchor: viewport.center(),
            viewport,
        }
    }

    fn items(count: usize, params: &LayoutConfig) -> Vec<Item> {
        let specs = (0..count)
            .map(|i| ItemSpec::new(format!("item-{i}"), params.item_size))
            .collect();
        seed_items(specs, params)
    }

    fn min_gap(items: &[Item]) -> f64 {
        let mut gap = f64::INFINITY;
        for (i, a) in items.iter().enumerate() {
            for b in &items[i + 1..] {
                let d = a.offset.distance(b.offset) - (a.size + b.size) / 2.0;
                gap = gap.min(d);
            }
        }
        gap
    }

    fn assert_no_overlap(items: &[Item], margin: f64) {
        for (i, a) in items.iter().enumerate() {
            for b in &items[i + 1..] {
                let ca = Circle::new(a.offset, a.collision_radius(margin));
                let cb = Circle::new(b.offset, b.collision_radius(margin));
                assert!(
                    a.offset.distance(b.offset) + EPS >= ca.radius + cb.radius,
                    "{} overlaps {}",
                    a.id,
                    b.id
                );
            }
        }
    }

    #[test]
    fn test_solver_kind_parsing() {
        let cases = vec![
            ("\"force\"", SolverKind::Force),
            ("\"Force\"", SolverKind::Force),
            ("\"relax\"", SolverKind::Force),
            ("\"arc\"", SolverKind::Arc),
            ("\"SAFE-ARC\"", SolverKind::Arc),
        ];

        for (json, expected) in cases {
            let deserialized: SolverKind = serde_json::from_str(json).unwrap();
            assert_eq!(deserialized, expected);
        }
    }

    #[test]
    fn test_seed_assigns_even_base_angles() {
        let params = LayoutConfig::default();
        let seeded = items(4, &params);
        for (i, item) in seeded.iter().enumerate() {
            assert!((item.base_angle - i as f64 * TAU / 4.0).abs() < EPS);
            assert!((item.current_radius - params.reference_radius).abs() < EPS);
            assert_eq!(item.offset, item.target);
        }
    }

    #[test]
    fn test_hover_keeps_size_invariant() {
        let params = LayoutConfig::default();
        let mut item = items(1, &params).remove(0);
        item.set_hovered(true, params.hover_scale);
        assert!((item.size - item.base_size * item.scale).abs() < EPS);
        assert!(item.size > item.base_size);
        item.set_hovered(false, params.hover_scale);
        assert_eq!(item.size, item.base_size);
    }

    #[test]
    fn test_anchor_clamped_to_viewport() {
        let viewport = Viewport::new(300.0, 200.0);
        let anchor = Anchor::new(Point::new(-40.0, 190.0), 56.0).clamped_to(&viewport);
        assert_eq!(anchor.origin, Point::new(0.0, 144.0));
        assert_eq!(anchor.center(), Point::new(28.0, 172.0));
    }

    #[test]
    fn test_degenerate_inputs_short_circuit() {
        let params = LayoutConfig {
            reference_radius: 0.0,
            ..LayoutConfig::default()
        };
        let seeded = items(3, &params);
        for kind in SolverKind::iter() {
            let solver = kind.build(params.clone());
            assert!(solver.solve(&seeded, &scene(1200.0, 800.0)).is_empty());
            assert!(solver.solve(&[], &scene(1200.0, 800.0)).is_empty());
        }
    }

    #[test]
    fn test_both_solvers_avoid_overlap_when_feasible() {
        let params = LayoutConfig::default();
        let mut seeded = items(6, &params);
        // pull item 1 from 60 degrees to 15 degrees, well inside item 0
        seeded[1].settle(
            Vector::from_polar(std::f64::consts::PI / 12.0, params.reference_radius),
            params.reference_radius,
        );
        let squeezed = seeded[0].offset.distance(seeded[1].offset);
        assert!(squeezed < 2.0 * seeded[0].collision_radius(params.item_margin));

        for kind in SolverKind::iter() {
            let solver = kind.build(params.clone());
            let mut solved = seeded.clone();
            for _ in 0..10 {
                solved = solver.solve(&solved, &scene(1200.0, 800.0));
            }
            assert_eq!(solved.len(), 6);
            assert_no_overlap(&solved, params.item_margin);
        }
    }

    #[test]
    fn test_both_solvers_keep_items_contained() {
        let params = LayoutConfig::default();
        let scene = scene(1200.0, 800.0);
        for kind in SolverKind::iter() {
            let solved = kind.build(params.clone()).solve(&items(8, &params), &scene);
            for item in &solved {
                let abs = scene.anchor + item.offset;
                let pad = params.screen_padding;
                assert!(abs.x >= pad && abs.x <= scene.viewport.width - pad, "{kind}");
                assert!(abs.y >= pad && abs.y <= scene.viewport.height - pad, "{kind}");
            }
        }
    }

    #[test]
    fn test_both_solvers_are_deterministic() {
        let params = LayoutConfig::default();
        let mut seeded = items(7, &params);
        seeded[2].set_hovered(true, params.hover_scale);
        let scene = Scene {
            anchor: Point::new(140.0, 300.0),
            viewport: Viewport::new(900.0, 600.0),
        };
        for kind in SolverKind::iter() {
            let solver = kind.build(params.clone());
            assert_eq!(solver.solve(&seeded, &scene), solver.solve(&seeded, &scene));
        }
    }

    #[test]
    fn test_hover_does_not_shrink_others_or_collapse_gaps() {
        let params = LayoutConfig::default();
        let scene = scene(1200.0, 800.0);
        for kind in SolverKind::iter() {
            let solver = kind.build(params.clone());
            let before = solver.solve(&items(6, &params), &scene);

            let mut hovered = before.clone();
            hovered[3].set_hovered(true, params.hover_scale);
            let delta = hovered[3].size - before[3].size;
            let after = solver.solve(&hovered, &scene);

            for (i, (a, b)) in before.iter().zip(&after).enumerate() {
                if i != 3 {
                    assert!(b.size >= a.size);
                }
            }
            assert!(min_gap(&after) + EPS >= min_gap(&before) - delta, "{kind}");
        }
    }
}
