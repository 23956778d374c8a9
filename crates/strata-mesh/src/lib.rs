//! CPU voxel-surface extraction for layer-mask stacks: candidate reduction,
//! six-direction exposure detection, vertical chain merging, and triangle
//! emission.
#![forbid(unsafe_code)]

pub mod arena;
pub mod candidate;
mod detect;
pub mod emit;
pub mod face;
mod merge;

use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Instant;

use rayon::prelude::*;
use thiserror::Error;

pub use crate::arena::{FaceArena, FaceId, FaceRec};
pub use crate::detect::exposed_faces;
pub use crate::emit::{ChainInfo, MeshBuffers, SurfaceMesh, Triangles};
pub use crate::face::{Face, FaceSet};
pub use strata_geom::{Aabb, Triangle, Vec3};
pub use strata_volume::{LayerMask, LayerStack, PixelPitch, StackError};

#[derive(Debug, Error, Clone, PartialEq)]
pub enum VoxelizeError {
    #[error("face count {count} exceeds the 32-bit arena index space")]
    TooManyFaces { count: usize },
    #[error("voxelization cancelled")]
    Cancelled,
}

/// Converts a validated layer stack into its boundary surface.
///
/// Detection runs layer-parallel; each task reads only its own layer plus the
/// neighbours directly above and below. Merging then runs once in layer
/// order. The stack is never mutated, and no state survives between runs.
pub fn voxelize(stack: &LayerStack) -> Result<SurfaceMesh, VoxelizeError> {
    run(stack, None)
}

/// Same as [`voxelize`], checking `cancel` between layers. A raised flag
/// yields [`VoxelizeError::Cancelled`]; partial results are discarded.
pub fn voxelize_with_cancel(
    stack: &LayerStack,
    cancel: &AtomicBool,
) -> Result<SurfaceMesh, VoxelizeError> {
    run(stack, Some(cancel))
}

fn run(stack: &LayerStack, cancel: Option<&AtomicBool>) -> Result<SurfaceMesh, VoxelizeError> {
    let t0 = Instant::now();
    let layer_count = stack.layer_count();

    let per_layer: Vec<Vec<FaceRec>> = (0..layer_count)
        .into_par_iter()
        .map(|li| {
            if let Some(flag) = cancel {
                if flag.load(Ordering::Relaxed) {
                    return Vec::new();
                }
            }
            detect::detect_layer(stack, li)
        })
        .collect();
    if let Some(flag) = cancel {
        if flag.load(Ordering::Relaxed) {
            return Err(VoxelizeError::Cancelled);
        }
    }

    let mut arena = FaceArena::with_layer_capacity(layer_count);
    for faces in per_layer {
        arena.append_layer(faces)?;
    }
    merge::link_chains(&mut arena);

    let mesh = SurfaceMesh::new(arena, stack.pitch(), stack.z_origins());
    if log::log_enabled!(log::Level::Debug) {
        log::debug!(
            "voxelized {} layers: {} faces, {} chain roots in {:?}",
            layer_count,
            mesh.face_count(),
            mesh.chain_root_count(),
            t0.elapsed()
        );
    }
    Ok(mesh)
}
