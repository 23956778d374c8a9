//! Triangle emission over the merged chain structure.

use std::sync::atomic::{AtomicBool, Ordering};

use strata_geom::{Aabb, Triangle, Vec3};
use strata_volume::PixelPitch;

use crate::VoxelizeError;
use crate::arena::{FaceArena, FaceId, FaceRec};
use crate::face::Face;

/// The finished boundary representation of a voxelized layer stack.
///
/// Holds the merged face arena plus the physical scaling needed to place
/// quads; triangles are produced lazily from the chain roots.
pub struct SurfaceMesh {
    arena: FaceArena,
    pitch: PixelPitch,
    z_origins: Vec<f32>,
}

/// Summary of one merged chain, for inspection and tests.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct ChainInfo {
    pub face: Face,
    pub layer: usize,
    pub x: usize,
    pub y: usize,
    pub height_mm: f32,
}

impl SurfaceMesh {
    pub(crate) fn new(arena: FaceArena, pitch: PixelPitch, z_origins: Vec<f32>) -> Self {
        Self {
            arena,
            pitch,
            z_origins,
        }
    }

    /// Total face records, merged or not.
    #[inline]
    pub fn face_count(&self) -> usize {
        self.arena.len()
    }

    /// Chain roots; each becomes exactly one emitted quad.
    pub fn chain_root_count(&self) -> usize {
        crate::merge::chain_root_count(&self.arena)
    }

    /// Emitted triangle count (two per chain root).
    pub fn triangle_count(&self) -> usize {
        self.chain_root_count() * 2
    }

    /// Iterates the merged chains (one entry per chain root).
    pub fn chains(&self) -> impl Iterator<Item = ChainInfo> + '_ {
        (0..self.arena.len()).filter_map(move |i| {
            let rec = self.arena.at(i);
            rec.is_chain_root().then(|| ChainInfo {
                face: rec.face,
                layer: rec.layer as usize,
                x: rec.x as usize,
                y: rec.y as usize,
                height_mm: self.arena.chain_height(FaceId::from_index(i)),
            })
        })
    }

    /// Lazy, finite, non-restartable triangle sequence over the chain roots.
    /// Winding is counter-clockwise viewed from outside the volume.
    pub fn triangles(&self) -> Triangles<'_> {
        Triangles {
            mesh: self,
            next: 0,
            pending: None,
        }
    }

    /// Axis-aligned bounds of the emitted surface, or `None` for an empty mesh.
    pub fn bounds(&self) -> Option<Aabb> {
        let mut tris = self.triangles();
        let first = tris.next()?;
        let mut aabb = Aabb::new(first.a, first.a);
        for t in std::iter::once(first).chain(tris) {
            aabb.expand(t.a);
            aabb.expand(t.b);
            aabb.expand(t.c);
        }
        Some(aabb)
    }

    /// Collects the whole surface into flat vertex/index buffers.
    pub fn to_buffers(&self) -> MeshBuffers {
        // Cancellation never fires with no flag supplied.
        match self.collect_buffers(None) {
            Ok(buffers) => buffers,
            Err(_) => unreachable!("uncancellable collection cannot fail"),
        }
    }

    /// Same as [`SurfaceMesh::to_buffers`], checking the flag between chain
    /// roots. Returns [`VoxelizeError::Cancelled`] once it is raised.
    pub fn to_buffers_with_cancel(
        &self,
        cancel: &AtomicBool,
    ) -> Result<MeshBuffers, VoxelizeError> {
        self.collect_buffers(Some(cancel))
    }

    fn collect_buffers(&self, cancel: Option<&AtomicBool>) -> Result<MeshBuffers, VoxelizeError> {
        let mut mb = MeshBuffers::default();
        mb.reserve_quads(self.arena.len().min(1 << 20));
        for i in 0..self.arena.len() {
            let rec = self.arena.at(i);
            if !rec.is_chain_root() {
                continue;
            }
            if let Some(flag) = cancel {
                if flag.load(Ordering::Relaxed) {
                    return Err(VoxelizeError::Cancelled);
                }
            }
            let [a, b, c, d] = self.quad_corners(i, rec);
            mb.add_quad(a, b, c, d, rec.face.normal());
        }
        Ok(mb)
    }

    /// Physical-space corners of the quad for chain root `i`, ordered
    /// counter-clockwise as seen from outside.
    fn quad_corners(&self, i: usize, rec: &FaceRec) -> [Vec3; 4] {
        let x0 = rec.x as f32 * self.pitch.x_mm;
        let x1 = (rec.x + 1) as f32 * self.pitch.x_mm;
        let y0 = rec.y as f32 * self.pitch.y_mm;
        let y1 = (rec.y + 1) as f32 * self.pitch.y_mm;
        let z0 = self.z_origins[rec.layer as usize];
        let z1 = z0 + self.arena.chain_height(FaceId::from_index(i));
        let corners = match rec.face {
            // Top/Bottom footprint is the pixel's own XY rectangle; the chain
            // height only elevates the Top plane.
            Face::Top => [
                Vec3::new(x0, y0, z1),
                Vec3::new(x1, y0, z1),
                Vec3::new(x1, y1, z1),
                Vec3::new(x0, y1, z1),
            ],
            Face::Bottom => [
                Vec3::new(x0, y0, z0),
                Vec3::new(x0, y1, z0),
                Vec3::new(x1, y1, z0),
                Vec3::new(x1, y0, z0),
            ],
            Face::Right => [
                Vec3::new(x1, y0, z0),
                Vec3::new(x1, y1, z0),
                Vec3::new(x1, y1, z1),
                Vec3::new(x1, y0, z1),
            ],
            Face::Left => [
                Vec3::new(x0, y0, z0),
                Vec3::new(x0, y0, z1),
                Vec3::new(x0, y1, z1),
                Vec3::new(x0, y1, z0),
            ],
            Face::Back => [
                Vec3::new(x1, y1, z0),
                Vec3::new(x0, y1, z0),
                Vec3::new(x0, y1, z1),
                Vec3::new(x1, y1, z1),
            ],
            Face::Front => [
                Vec3::new(x0, y0, z0),
                Vec3::new(x1, y0, z0),
                Vec3::new(x1, y0, z1),
                Vec3::new(x0, y0, z1),
            ],
        };
        debug_assert!(
            (corners[1] - corners[0])
                .cross(corners[2] - corners[0])
                .dot(rec.face.normal())
                > 0.0
        );
        corners
    }
}

/// Lazy triangle iterator over a [`SurfaceMesh`]'s chain roots.
pub struct Triangles<'a> {
    mesh: &'a SurfaceMesh,
    next: usize,
    pending: Option<Triangle>,
}

impl Iterator for Triangles<'_> {
    type Item = Triangle;

    fn next(&mut self) -> Option<Triangle> {
        if let Some(t) = self.pending.take() {
            return Some(t);
        }
        while self.next < self.mesh.arena.len() {
            let i = self.next;
            self.next += 1;
            let rec = self.mesh.arena.at(i);
            if !rec.is_chain_root() {
                continue;
            }
            let n = rec.face.normal();
            let [a, b, c, d] = self.mesh.quad_corners(i, rec);
            self.pending = Some(Triangle::new(a, c, d, n));
            return Some(Triangle::new(a, b, c, n));
        }
        None
    }
}

/// Flat vertex/index buffers for GPU preview or mesh-format writers.
#[derive(Default, Clone)]
pub struct MeshBuffers {
    pub pos: Vec<f32>,
    pub norm: Vec<f32>,
    pub idx: Vec<u32>,
}

impl MeshBuffers {
    /// Clears all arrays but retains capacity for reuse across runs.
    #[inline]
    pub fn clear_keep_capacity(&mut self) {
        self.pos.clear();
        self.norm.clear();
        self.idx.clear();
    }

    /// Pre-reserve capacity for approximately `n_quads` quads worth of data.
    #[inline]
    pub fn reserve_quads(&mut self, n_quads: usize) {
        // 4 vertices per quad
        self.pos.reserve(n_quads * 4 * 3);
        self.norm.reserve(n_quads * 4 * 3);
        self.idx.reserve(n_quads * 6);
    }

    /// Appends a quad as two triangles sharing four vertices. Vertex order is
    /// re-checked against the normal and flipped if it winds the wrong way.
    pub fn add_quad(&mut self, a: Vec3, b: Vec3, c: Vec3, d: Vec3, n: Vec3) {
        let base = (self.pos.len() / 3) as u32;
        let mut vs = [a, b, c, d];
        let cross = (vs[1] - vs[0]).cross(vs[2] - vs[0]);
        if cross.dot(n) < 0.0 {
            vs.swap(1, 3);
        }
        for v in &vs {
            self.pos.extend_from_slice(&[v.x, v.y, v.z]);
            self.norm.extend_from_slice(&[n.x, n.y, n.z]);
        }
        self.idx
            .extend_from_slice(&[base, base + 1, base + 2, base, base + 2, base + 3]);
    }

    #[inline]
    pub fn triangle_count(&self) -> usize {
        self.idx.len() / 3
    }

    /// Returns a slice of interleaved vertex positions (x,y,z per vertex).
    pub fn positions(&self) -> &[f32] {
        &self.pos
    }

    /// Returns a slice of interleaved vertex normals (x,y,z per vertex).
    pub fn normals(&self) -> &[f32] {
        &self.norm
    }
}
