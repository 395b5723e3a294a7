//! Nesting-aware cut ordering.
//!
//! Builds a containment forest over the curve arena and walks it depth
//! first, emitting every child before its parent. A piece is therefore never
//! released from the sheet while detail inside it is still uncut.
//!
//! # Containment
//!
//! Curve `A` is a candidate parent of `B` when `A` is closed, `B`'s bounding
//! box fits inside `A`'s, every point of `B`'s tessellated outline lies
//! strictly inside `A`'s outline, and `A` encloses more area than `B`. The
//! bounding-box test only prunes candidates; the point test decides. Among
//! all candidates the one with the smallest area is the direct parent.
//!
//! # Sibling order
//!
//! Siblings are sorted by the minimum corner of their bounding box, X then Y.
//! [`SortMode::Interleaved`] then deals the sorted siblings out with a fixed
//! stride so consecutive cuts land far apart, which spreads heat over
//! sensitive sheet material.

use std::cmp::Ordering;

use lasercam_core::geometry::{point_in_polygon, signed_area};
use lasercam_core::{Containment, CurveObject, LayerRole, Point};
use tracing::debug;

/// Sibling ordering strategy
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SortMode {
    /// Ascending X, then Y
    #[default]
    Spatial,
    /// Every `stride`-th sibling of the spatial order, then the next offset
    Interleaved { stride: usize },
}

#[derive(Debug, Clone)]
pub struct NestingSorter {
    tolerance: f64,
    mode: SortMode,
}

impl NestingSorter {
    pub fn new(tolerance: f64, mode: SortMode) -> Self {
        Self { tolerance, mode }
    }

    pub fn mode(&self) -> SortMode {
        self.mode
    }

    /// Link the curves in `members` into per-layer containment forests and
    /// return them in cut order, engrave layer first.
    ///
    /// `outlines[i]` holds the tessellated outline of `objects[i]`; curves
    /// without one take part as leaves only.
    pub fn sort(
        &self,
        objects: &mut [CurveObject],
        outlines: &[Option<Vec<Point>>],
        members: &[usize],
    ) -> Vec<usize> {
        self.build_forest(objects, outlines, members);

        let mut order = Vec::with_capacity(members.len());
        for role in LayerRole::ALL {
            let layer: Vec<usize> = members
                .iter()
                .copied()
                .filter(|i| objects[*i].layer == role)
                .collect();
            order.extend(self.order(objects, &layer));
        }
        order
    }

    /// Fill `parent` and `children` of every member.
    ///
    /// Only curves on the same layer nest. Links to non-members are cleared.
    pub fn build_forest(
        &self,
        objects: &mut [CurveObject],
        outlines: &[Option<Vec<Point>>],
        members: &[usize],
    ) {
        for i in members {
            objects[*i].parent = None;
            objects[*i].children.clear();
        }

        let areas: Vec<f64> = (0..objects.len())
            .map(|i| match outlines.get(i) {
                Some(Some(outline)) if objects[i].closed => signed_area(outline).abs(),
                _ => 0.0,
            })
            .collect();

        for &child in members {
            let Some(Some(child_outline)) = outlines.get(child) else {
                continue;
            };

            let mut best: Option<usize> = None;
            for &candidate in members {
                if candidate == child || objects[candidate].layer != objects[child].layer {
                    continue;
                }
                if !self.contains(objects, outlines, &areas, candidate, child, child_outline) {
                    continue;
                }
                let closer = match best {
                    None => true,
                    Some(b) => areas[candidate] < areas[b],
                };
                if closer {
                    best = Some(candidate);
                }
            }

            if let Some(parent) = best {
                objects[child].parent = Some(parent);
                objects[parent].children.push(child);
            }
        }

        let nested = members
            .iter()
            .filter(|i| objects[**i].parent.is_some())
            .count();
        debug!("Containment forest: {} curves, {} nested", members.len(), nested);
    }

    fn contains(
        &self,
        objects: &[CurveObject],
        outlines: &[Option<Vec<Point>>],
        areas: &[f64],
        parent: usize,
        child: usize,
        child_outline: &[Point],
    ) -> bool {
        let p = &objects[parent];
        if !p.closed || areas[parent] <= areas[child] {
            return false;
        }
        if !p.bounding_box.contains_box(&objects[child].bounding_box, self.tolerance) {
            return false;
        }
        let Some(Some(parent_outline)) = outlines.get(parent) else {
            return false;
        };
        if parent_outline.len() < 3 {
            return false;
        }
        child_outline
            .iter()
            .all(|pt| point_in_polygon(pt, parent_outline, self.tolerance) == Containment::Inside)
    }

    /// Cut order of an already linked set of curves: children before parents.
    pub fn order(&self, objects: &[CurveObject], members: &[usize]) -> Vec<usize> {
        let mut roots: Vec<usize> = members
            .iter()
            .copied()
            .filter(|i| match objects[*i].parent {
                None => true,
                Some(p) => !members.contains(&p),
            })
            .collect();
        self.arrange_siblings(objects, &mut roots);

        let mut order = Vec::with_capacity(members.len());
        for root in roots {
            self.visit(objects, root, &mut order);
        }
        order
    }

    fn visit(&self, objects: &[CurveObject], node: usize, order: &mut Vec<usize>) {
        let mut children = objects[node].children.clone();
        self.arrange_siblings(objects, &mut children);
        for child in children {
            self.visit(objects, child, order);
        }
        order.push(node);
    }

    fn arrange_siblings(&self, objects: &[CurveObject], siblings: &mut Vec<usize>) {
        siblings.sort_by(|a, b| spatial_cmp(&objects[*a], &objects[*b]));

        if let SortMode::Interleaved { stride } = self.mode {
            if stride > 1 && siblings.len() > stride {
                *siblings = interleave(siblings, stride);
            }
        }
    }
}

fn spatial_cmp(a: &CurveObject, b: &CurveObject) -> Ordering {
    let pa = a.bounding_box.min_corner();
    let pb = b.bounding_box.min_corner();
    pa.x.total_cmp(&pb.x).then(pa.y.total_cmp(&pb.y))
}

/// `[0, k, 2k, ..., 1, k+1, ..., k-1, 2k-1, ...]`
fn interleave(sorted: &[usize], stride: usize) -> Vec<usize> {
    (0..stride)
        .flat_map(|offset| sorted.iter().skip(offset).step_by(stride).copied())
        .collect()
}
