//! Vertical chain merging: links same-column, same-orientation faces on
//! consecutive layers into parent→child chains.

use hashbrown::HashMap;

use crate::arena::{FaceArena, FaceId};
use crate::face::Face;

/// Walks the arena in strictly increasing layer order and links each face to
/// the face at the same `(x, y, orientation)` on the layer directly below,
/// when one exists. The newer face always becomes the *child*, so the oldest
/// layer holds the chain root and traversal never backtracks.
pub(crate) fn link_chains(arena: &mut FaceArena) {
    let mut below: HashMap<(u32, u32, Face), FaceId> = HashMap::new();
    for li in 0..arena.layer_count() {
        let range = arena.layer_range(li);
        let mut cur: HashMap<(u32, u32, Face), FaceId> = HashMap::with_capacity(range.len());
        for i in range {
            let rec = arena.at(i);
            let key = (rec.x, rec.y, rec.face);
            let id = FaceId::from_index(i);
            if let Some(&parent) = below.get(&key) {
                arena.at_mut(parent.index()).child = id;
                arena.at_mut(i).parent = parent;
            }
            cur.insert(key, id);
        }
        below = cur;
    }
}

/// Number of chain roots (faces with no parent) in the arena.
pub(crate) fn chain_root_count(arena: &FaceArena) -> usize {
    arena.iter().filter(|r| r.is_chain_root()).count()
}
