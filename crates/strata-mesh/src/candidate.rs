//! Candidate-mask construction: the reduced pixel set that can carry side faces.

use strata_volume::{BitGrid, LayerMask};

/// Builds the candidate mask for one layer: contour pixels of the current
/// mask unioned with the set differences against the layers above and below.
/// A missing neighbour layer counts as all-empty, so the difference collapses
/// to the current mask itself.
///
/// Every pixel with an exposed side face is contained in the result, and the
/// result is always a subset of the layer's solid pixels.
pub fn candidate_mask(
    cur: &LayerMask,
    below: Option<&LayerMask>,
    above: Option<&LayerMask>,
) -> BitGrid {
    let mut mask = contour(cur);
    match above {
        Some(a) => mask.union_with(&cur.grid().difference(a.grid())),
        None => mask.union_with(cur.grid()),
    }
    match below {
        Some(b) => mask.union_with(&cur.grid().difference(b.grid())),
        None => mask.union_with(cur.grid()),
    }
    mask
}

/// Outer and inner contour pixels: solid pixels on the grid border or with at
/// least one empty 4-neighbour in-plane. Interior holes surface here the same
/// way the outer outline does.
pub fn contour(cur: &LayerMask) -> BitGrid {
    let (w, h) = (cur.width(), cur.height());
    let mut out = BitGrid::new(w, h);
    cur.grid().for_each_set(|x, y| {
        let on_border = x == 0 || y == 0 || x + 1 == w || y + 1 == h;
        if on_border
            || !cur.solid(x - 1, y)
            || !cur.solid(x + 1, y)
            || !cur.solid(x, y - 1)
            || !cur.solid(x, y + 1)
        {
            out.set(x, y, true);
        }
    });
    out
}
