//! Iterative force relaxation.
//!
//! Each recompute continues from the previous offsets, so repeated solves
//! converge incrementally instead of snapping from a fresh seed.

use super::{Item, LayoutSolver, Scene, SolverKind, is_degenerate};
use crate::config::LayoutConfig;
use crate::geometry::{
    Circle, Vector, attraction_force, edge_force, repulsion_force_with_nudge,
};

/// Relaxes items toward their ideal orbit positions.
///
/// Attraction only pulls each item back to its own base-angle slot on the
/// reference radius, so the solver never grows the orbit. When more items
/// than fit on that circle are requested (12 default-size items at radius
/// 120, say) neighbours settle partially overlapped. The arc solver is the
/// one that escalates the radius.
pub struct ForceSolver {
    params: LayoutConfig,
}

impl ForceSolver {
    pub fn new(params: LayoutConfig) -> Self {
        Self { params }
    }

    /// Net force on `items[index]` given the offsets of the previous iteration.
    fn net_force(&self, index: usize, items: &[Item], offsets: &[Vector], scene: &Scene) -> Vector {
        let p = &self.params;
        let item = &items[index];
        let offset = offsets[index];
        let own = Circle::new(offset, item.collision_radius(p.item_margin));
        // coincident centers separate along the item's own orbit direction
        let nudge = Vector::from_polar(item.base_angle, 1.0);

        let mut force = edge_force(
            scene.anchor + offset,
            item.size / 2.0,
            p.screen_padding,
            &scene.viewport,
        );

        for (j, (other, &other_offset)) in items.iter().zip(offsets).enumerate() {
            if j == index {
                continue;
            }
            let peer = Circle::new(other_offset, other.collision_radius(p.item_margin));
            force += repulsion_force_with_nudge(&own, &peer, nudge);
        }

        let anchor = Circle::new(Vector::ZERO, p.anchor_diameter / 2.0 + p.item_margin);
        force += repulsion_force_with_nudge(&own, &anchor, nudge);

        force += attraction_force(offset, item.ideal_offset(p.reference_radius), p.attraction);

        force.limit_magnitude(item.size / 2.0)
    }
}

impl LayoutSolver for ForceSolver {
    fn kind(&self) -> SolverKind {
        SolverKind::Force
    }

    fn solve(&self, items: &[Item], scene: &Scene) -> Vec<Item> {
        if is_degenerate(items, &self.params) {
            return Vec::new();
        }

        let mut offsets: Vec<Vector> = items.iter().map(|item| item.offset).collect();

        for _ in 0..self.params.iterations {
            // synchronous update: every force reads the same snapshot
            let forces: Vec<Vector> = (0..items.len())
                .map(|i| self.net_force(i, items, &offsets, scene))
                .collect();

            for (offset, force) in offsets.iter_mut().zip(forces) {
                *offset += force * self.params.damping;
            }
        }

        items
            .iter()
            .zip(offsets)
            .map(|(item, offset)| {
                let mut next = item.clone();
                next.settle(offset, self.params.reference_radius);
                next
            })
            .collect()
    }
}
