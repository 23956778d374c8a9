//! Per-pixel face-exposure detection and the per-layer collection pass.

use strata_volume::{LayerMask, LayerStack};

use crate::arena::FaceRec;
use crate::candidate::candidate_mask;
use crate::face::{Face, FaceSet};

/// Full six-direction exposure test for one solid pixel.
///
/// Grid boundaries and missing neighbour layers count as empty space. An
/// empty pixel short-circuits to the empty set regardless of neighbours.
pub fn exposed_faces(stack: &LayerStack, layer: usize, x: usize, y: usize) -> FaceSet {
    let Some(cur) = stack.layer(layer) else {
        return FaceSet::EMPTY;
    };
    if !cur.solid(x, y) {
        return FaceSet::EMPTY;
    }
    let mut set = FaceSet::EMPTY;
    if empty_at(stack.layer(layer + 1), x, y) {
        set.insert(Face::Top);
    }
    if layer == 0 || empty_at(stack.layer(layer - 1), x, y) {
        set.insert(Face::Bottom);
    }
    for face in side_exposure(cur, x, y).iter() {
        set.insert(face);
    }
    set
}

#[inline]
fn empty_at(layer: Option<&LayerMask>, x: usize, y: usize) -> bool {
    layer.is_none_or(|l| !l.solid(x, y))
}

/// In-plane exposure of a solid pixel against its 4-neighbours.
#[inline]
fn side_exposure(cur: &LayerMask, x: usize, y: usize) -> FaceSet {
    let (w, h) = (cur.width(), cur.height());
    let mut set = FaceSet::EMPTY;
    if x == 0 || !cur.solid(x - 1, y) {
        set.insert(Face::Left);
    }
    if x + 1 == w || !cur.solid(x + 1, y) {
        set.insert(Face::Right);
    }
    if y == 0 || !cur.solid(x, y - 1) {
        set.insert(Face::Front);
    }
    if y + 1 == h || !cur.solid(x, y + 1) {
        set.insert(Face::Back);
    }
    set
}

/// Collects every exposed face of layer `li`, in row-major pixel order.
///
/// Side faces are only tested on the candidate mask; Top/Bottom exposure is
/// taken from the word-level set difference against the neighbouring layers,
/// which covers every solid pixel of the layer.
pub(crate) fn detect_layer(stack: &LayerStack, li: usize) -> Vec<FaceRec> {
    let cur = &stack.layers()[li];
    let below = li.checked_sub(1).and_then(|i| stack.layer(i));
    let above = stack.layer(li + 1);
    let thickness = cur.thickness_mm();

    let mut faces: Vec<FaceRec> = Vec::new();

    let candidates = candidate_mask(cur, below, above);
    candidates.for_each_set(|x, y| {
        for face in side_exposure(cur, x, y).iter() {
            faces.push(FaceRec::new(face, li, x, y, thickness));
        }
    });

    let top_exposed = match above {
        Some(a) => cur.grid().difference(a.grid()),
        None => cur.grid().clone(),
    };
    top_exposed.for_each_set(|x, y| {
        faces.push(FaceRec::new(Face::Top, li, x, y, thickness));
    });

    let bottom_exposed = match below {
        Some(b) => cur.grid().difference(b.grid()),
        None => cur.grid().clone(),
    };
    bottom_exposed.for_each_set(|x, y| {
        faces.push(FaceRec::new(Face::Bottom, li, x, y, thickness));
    });

    log::trace!(
        "layer {}: {} candidates, {} faces",
        li,
        candidates.count_ones(),
        faces.len()
    );
    faces
}
