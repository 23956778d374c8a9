//! Flat face arena with index-based chain links.
//!
//! Faces are stored in one `Vec`, appended in layer order; each layer owns a
//! contiguous range. Parent/child chain links are plain indices into the
//! arena, so there is no ownership cycle to manage and no per-face
//! allocation at tens-of-millions-of-faces scale.

use std::ops::Range;

use crate::VoxelizeError;
use crate::face::Face;

/// Index of a face in the arena. `FaceId::NONE` is the null link.
#[derive(Copy, Clone, Debug, Eq, PartialEq, Hash)]
pub struct FaceId(u32);

impl FaceId {
    pub const NONE: FaceId = FaceId(u32::MAX);

    #[inline]
    pub(crate) fn from_index(i: usize) -> FaceId {
        debug_assert!(i < u32::MAX as usize);
        FaceId(i as u32)
    }

    #[inline]
    pub fn index(self) -> usize {
        self.0 as usize
    }

    #[inline]
    pub fn is_none(self) -> bool {
        self == FaceId::NONE
    }
}

/// One boundary face of one voxel. Orientation, layer, and pixel position
/// never change after creation; only the chain links are mutated while
/// merging.
#[derive(Clone, Debug)]
pub struct FaceRec {
    pub face: Face,
    pub layer: u32,
    pub x: u32,
    pub y: u32,
    pub thickness_mm: f32,
    pub parent: FaceId,
    pub child: FaceId,
}

impl FaceRec {
    pub fn new(face: Face, layer: usize, x: usize, y: usize, thickness_mm: f32) -> Self {
        Self {
            face,
            layer: layer as u32,
            x: x as u32,
            y: y as u32,
            thickness_mm,
            parent: FaceId::NONE,
            child: FaceId::NONE,
        }
    }

    #[inline]
    pub fn is_chain_root(&self) -> bool {
        self.parent.is_none()
    }
}

#[derive(Default)]
pub struct FaceArena {
    faces: Vec<FaceRec>,
    layer_ends: Vec<u32>,
}

// Room must remain for the FaceId::NONE sentinel.
const MAX_FACES: usize = u32::MAX as usize - 1;

impl FaceArena {
    pub fn with_layer_capacity(layers: usize) -> Self {
        Self {
            faces: Vec::new(),
            layer_ends: Vec::with_capacity(layers),
        }
    }

    /// Appends one layer's faces, in layer order. Surfaces an explicit
    /// capacity error instead of silently truncating when the index space is
    /// exhausted.
    pub fn append_layer(&mut self, mut faces: Vec<FaceRec>) -> Result<(), VoxelizeError> {
        let count = self.faces.len() + faces.len();
        if count > MAX_FACES {
            return Err(VoxelizeError::TooManyFaces { count });
        }
        self.faces.append(&mut faces);
        self.layer_ends.push(self.faces.len() as u32);
        Ok(())
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.faces.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.faces.is_empty()
    }

    #[inline]
    pub fn layer_count(&self) -> usize {
        self.layer_ends.len()
    }

    /// Contiguous arena range holding layer `li`'s faces.
    pub fn layer_range(&self, li: usize) -> Range<usize> {
        let end = self.layer_ends[li] as usize;
        let start = if li == 0 {
            0
        } else {
            self.layer_ends[li - 1] as usize
        };
        start..end
    }

    #[inline]
    pub fn get(&self, id: FaceId) -> &FaceRec {
        &self.faces[id.index()]
    }

    #[inline]
    pub fn at(&self, i: usize) -> &FaceRec {
        &self.faces[i]
    }

    #[inline]
    pub fn at_mut(&mut self, i: usize) -> &mut FaceRec {
        &mut self.faces[i]
    }

    pub fn iter(&self) -> impl Iterator<Item = &FaceRec> {
        self.faces.iter()
    }

    /// Sum of `thickness_mm` from `root` to the chain tail via child links.
    pub fn chain_height(&self, root: FaceId) -> f32 {
        let mut h = 0.0f32;
        let mut cur = root;
        while !cur.is_none() {
            let rec = self.get(cur);
            h += rec.thickness_mm;
            cur = rec.child;
        }
        h
    }
}
