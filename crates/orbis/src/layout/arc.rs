//! Safe-arc angular search.
//!
//! Scans the orbit for angles where a fully hovered item would stay on
//! screen, spreads items evenly over the safe arc length, and grows the
//! orbit until no two items overlap or the radius ceiling is hit.

use super::{Item, LayoutSolver, Scene, SolverKind, is_degenerate};
use crate::config::LayoutConfig;
use crate::geometry::{Circle, Point, Vector, Viewport};
use std::f64::consts::TAU;

/// Contiguous angular interval in radians. `end` may exceed `2PI` when the
/// arc wraps past angle zero.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SafeArc {
    pub start: f64,
    pub end: f64,
    pub length: f64,
}

impl SafeArc {
    fn from_samples(first: usize, last: usize, step: f64) -> Self {
        Self {
            start: first as f64 * step,
            end: (last + 1) as f64 * step,
            length: (last + 1 - first) as f64 * step,
        }
    }

    fn midpoint(&self) -> f64 {
        self.start + self.length / 2.0
    }
}

pub struct ArcSolver {
    params: LayoutConfig,
}

impl ArcSolver {
    pub fn new(params: LayoutConfig) -> Self {
        Self { params }
    }

    fn step(&self) -> f64 {
        TAU / self.params.angular_resolution.max(1) as f64
    }

    /// Safe arcs at `radius` around the absolute `center`, sorted by start.
    pub fn safe_arcs(
        &self,
        center: Point,
        radius: f64,
        item_radius: f64,
        viewport: &Viewport,
    ) -> Vec<SafeArc> {
        let samples = self.params.angular_resolution;
        if samples == 0 {
            return Vec::new();
        }
        let step = self.step();

        let safe: Vec<bool> = (0..samples)
            .map(|k| {
                let probe = center + Vector::from_polar(k as f64 * step, radius);
                viewport.contains(&Circle::new(probe, item_radius), self.params.screen_padding)
            })
            .collect();

        let mut runs: Vec<(usize, usize)> = Vec::new();
        let mut current: Option<(usize, usize)> = None;
        for (k, &ok) in safe.iter().enumerate() {
            current = match (ok, current) {
                (true, None) => Some((k, k)),
                (true, Some((first, _))) => Some((first, k)),
                (false, Some(run)) => {
                    runs.push(run);
                    None
                }
                (false, None) => None,
            };
        }
        runs.extend(current);

        // join the run ending at the last sample with the one starting at zero
        if runs.len() > 1 && safe[0] && safe[samples - 1] {
            let (_, head_last) = runs.remove(0);
            if let Some(tail) = runs.last_mut() {
                tail.1 = head_last + samples;
            }
        }

        let mut arcs: Vec<SafeArc> = runs
            .into_iter()
            .map(|(first, last)| SafeArc::from_samples(first, last, step))
            .collect();
        arcs.sort_by(|a, b| a.start.total_cmp(&b.start));
        arcs
    }

    /// One angle per item, in item order.
    fn distribute(&self, items: &[Item], arcs: &[SafeArc]) -> Vec<f64> {
        let total: f64 = arcs.iter().map(|a| a.length).sum();
        let count = items.len();

        if total < count as f64 * self.step() {
            return items.iter().map(|item| item.base_angle).collect();
        }

        let spacing = total / count as f64;
        items
            .iter()
            .enumerate()
            .map(|(i, item)| {
                let target = (i as f64 + 0.5) * spacing;
                locate(arcs, target)
                    .or_else(|| arcs.first().map(SafeArc::midpoint))
                    .unwrap_or(item.base_angle)
            })
            .collect()
    }

    fn has_overlap(&self, items: &[Item], angles: &[f64], radius: f64) -> bool {
        let margin = self.params.item_margin;
        let anchor = Circle::new(Vector::ZERO, self.params.anchor_diameter / 2.0 + margin);
        let circles: Vec<Circle> = items
            .iter()
            .zip(angles)
            .map(|(item, &angle)| {
                Circle::new(Vector::from_polar(angle, radius), item.collision_radius(margin))
            })
            .collect();

        circles.iter().enumerate().any(|(i, circle)| {
            circle.overlaps(&anchor) || circles[i + 1..].iter().any(|other| circle.overlaps(other))
        })
    }
}

/// Maps a position along the concatenated arcs back to a real angle.
fn locate(arcs: &[SafeArc], target: f64) -> Option<f64> {
    let mut walked = 0.0;
    for arc in arcs {
        if target <= walked + arc.length {
            return Some(arc.start + (target - walked));
        }
        walked += arc.length;
    }
    None
}

impl LayoutSolver for ArcSolver {
    fn kind(&self) -> SolverKind {
        SolverKind::Arc
    }

    fn solve(&self, items: &[Item], scene: &Scene) -> Vec<Item> {
        let p = &self.params;
        if is_degenerate(items, p) {
            return Vec::new();
        }

        // any item may be the next one hovered
        let scan_radius = items
            .iter()
            .map(|item| item.base_size * p.hover_scale / 2.0)
            .fold(0.0, f64::max);

        let initial = p.reference_radius;
        let ceiling = initial * p.max_radius_factor.max(1.0);
        let mut radius = initial;

        let angles = loop {
            let arcs = self.safe_arcs(scene.anchor, radius, scan_radius, &scene.viewport);
            let angles = self.distribute(items, &arcs);
            let overlap = self.has_overlap(items, &angles, radius);

            if !overlap {
                break angles;
            }
            if radius >= ceiling || !(p.radius_step > 0.0) {
                log::warn!(
                    "Accepting overlapping layout of {} items at radius {:.1}",
                    items.len(),
                    radius
                );
                break angles;
            }
            radius = (radius + p.radius_step).min(ceiling);
            log::trace!("Orbit overlaps, growing radius to {:.1}", radius);
        };

        items
            .iter()
            .zip(angles)
            .map(|(item, angle)| {
                let mut next = item.clone();
                next.settle(Vector::from_polar(angle, radius), p.reference_radius);
                next
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::layout::{ItemSpec, seed_items};
    use std::f64::consts::PI;

    const EPS: f64 = 1e-6;

    fn items(count: usize, params: &LayoutConfig) -> Vec<Item> {
        let specs = (0..count)
            .map(|i| ItemSpec::new(format!("item-{i}"), params.item_size))
            .collect();
        seed_items(specs, params)
    }

    fn scene(width: f64, height: f64) -> Scene {
        let viewport = Viewport::new(width, height);
        Scene {
            anchor: viewport.center(),
            viewport,
        }
    }

    fn descents(items: &[Item]) -> usize {
        items
            .windows(2)
            .filter(|w| w[1].current_angle < w[0].current_angle)
            .count()
    }

    #[test]
    fn test_full_circle_is_one_arc() {
        let params = LayoutConfig::default();
        let solver = ArcSolver::new(params);
        let s = scene(1200.0, 800.0);
        let arcs = solver.safe_arcs(s.anchor, 120.0, 33.6, &s.viewport);

        assert_eq!(arcs.len(), 1);
        assert!(arcs[0].start.abs() < EPS);
        assert!((arcs[0].length - TAU).abs() < EPS);
    }

    #[test]
    fn test_arcs_merge_across_zero() {
        let params = LayoutConfig::default();
        let solver = ArcSolver::new(params);
        let viewport = Viewport::new(1200.0, 800.0);
        // anchor near the left edge: only the right-facing side is safe
        let arcs = solver.safe_arcs(Point::new(100.0, 400.0), 120.0, 33.6, &viewport);

        let step = TAU / 360.0;
        assert_eq!(arcs.len(), 1);
        assert!((arcs[0].start - 248.0 * step).abs() < EPS);
        assert!(arcs[0].end > TAU);
        assert!((arcs[0].length - 225.0 * step).abs() < EPS);
    }

    #[test]
    fn test_split_arcs_are_sorted() {
        let params = LayoutConfig::default();
        let solver = ArcSolver::new(params);
        let s = scene(300.0, 300.0);
        let arcs = solver.safe_arcs(s.anchor, 120.0, 33.6, &s.viewport);

        assert_eq!(arcs.len(), 4);
        assert!(arcs.windows(2).all(|w| w[0].end <= w[1].start));
    }

    #[test]
    fn test_six_items_at_sixty_degree_spacing() {
        let params = LayoutConfig::default();
        let solver = ArcSolver::new(params.clone());
        let solved = solver.solve(&items(6, &params), &scene(1200.0, 800.0));

        assert_eq!(solved.len(), 6);
        for (i, item) in solved.iter().enumerate() {
            assert!((item.current_radius - 120.0).abs() < EPS);
            let expected = (i as f64 + 0.5) * PI / 3.0;
            assert!((item.current_angle - expected).abs() < EPS, "item {i}");
        }
        for (i, a) in solved.iter().enumerate() {
            for b in &solved[i + 1..] {
                assert!(a.offset.distance(b.offset) >= 56.0 + params.item_margin);
            }
        }
    }

    #[test]
    fn test_crowded_orbit_grows_until_clear() {
        let params = LayoutConfig::default();
        let solver = ArcSolver::new(params.clone());
        let solved = solver.solve(&items(12, &params), &scene(1200.0, 800.0));

        // 12 circles of radius 36 need a chord of 72, first reached at 140
        for item in &solved {
            assert!((item.current_radius - 140.0).abs() < EPS);
        }
        for (i, a) in solved.iter().enumerate() {
            for b in &solved[i + 1..] {
                assert!(a.offset.distance(b.offset) + EPS >= 72.0);
            }
        }
    }

    #[test]
    fn test_tiny_viewport_falls_back_to_uniform_spacing() {
        let params = LayoutConfig::default();
        let solver = ArcSolver::new(params.clone());
        let seeded = items(6, &params);
        let solved = solver.solve(&seeded, &scene(100.0, 100.0));

        for (before, after) in seeded.iter().zip(&solved) {
            assert!(after.offset.distance(before.ideal_offset(120.0)) < EPS);
        }
    }

    #[test]
    fn test_escalation_terminates_with_every_item() {
        let params = LayoutConfig::default();
        let solver = ArcSolver::new(params.clone());
        let seeded = items(8, &params);
        let solved = solver.solve(&seeded, &scene(300.0, 300.0));

        assert_eq!(solved.len(), seeded.len());
        for (before, after) in seeded.iter().zip(&solved) {
            assert_eq!(before.id, after.id);
            let r = after.offset.magnitude();
            assert!(r >= 120.0 - EPS && r <= 240.0 + EPS);
        }
    }

    #[test]
    fn test_zero_step_still_terminates() {
        let params = LayoutConfig {
            radius_step: 0.0,
            ..LayoutConfig::default()
        };
        let solver = ArcSolver::new(params.clone());
        let solved = solver.solve(&items(24, &params), &scene(1200.0, 800.0));
        assert_eq!(solved.len(), 24);
    }

    #[test]
    fn test_items_keep_angular_order() {
        let params = LayoutConfig::default();
        let solver = ArcSolver::new(params.clone());
        let scenes = [
            scene(1200.0, 800.0),
            Scene {
                anchor: Point::new(100.0, 400.0),
                viewport: Viewport::new(1200.0, 800.0),
            },
            Scene {
                anchor: Point::new(1150.0, 60.0),
                viewport: Viewport::new(1200.0, 800.0),
            },
        ];

        for s in &scenes {
            let solved = solver.solve(&items(5, &params), s);
            // cyclic order survives when the sequence rotates at most once
            assert!(descents(&solved) <= 1, "anchor {:?}", s.anchor);
        }
    }

    #[test]
    fn test_placed_items_stay_on_screen() {
        let params = LayoutConfig::default();
        let solver = ArcSolver::new(params.clone());
        let s = Scene {
            anchor: Point::new(100.0, 400.0),
            viewport: Viewport::new(1200.0, 800.0),
        };
        let solved = solver.solve(&items(5, &params), &s);

        for item in &solved {
            let circle = Circle::new(s.anchor + item.offset, item.size / 2.0);
            assert!(s.viewport.contains(&circle, params.screen_padding), "{}", item.id);
        }
    }
}
