use std::sync::atomic::{AtomicBool, Ordering};

use strata_mesh::{
    Face, LayerMask, LayerStack, PixelPitch, SurfaceMesh, VoxelizeError, exposed_faces, voxelize,
    voxelize_with_cancel,
};

const PITCH: PixelPitch = PixelPitch::new(0.1, 0.2);

fn stack_of(layers: Vec<LayerMask>) -> LayerStack {
    LayerStack::try_new(layers, PITCH).unwrap()
}

fn tri_area_sum(mesh: &SurfaceMesh) -> f32 {
    mesh.triangles().map(|t| t.area()).sum()
}

fn tri_volume_sum(mesh: &SurfaceMesh) -> f32 {
    mesh.triangles().map(|t| t.signed_volume()).sum()
}

/// Brute-force six-neighbour surface area, independent of the pipeline.
fn expected_surface_area(stack: &LayerStack) -> f32 {
    let (w, h) = stack.dims();
    let px = stack.pitch().x_mm;
    let py = stack.pitch().y_mm;
    let solid = |li: i32, x: i32, y: i32| -> bool {
        li >= 0
            && x >= 0
            && y >= 0
            && (x as usize) < w
            && (y as usize) < h
            && stack
                .layer(li as usize)
                .is_some_and(|l| l.solid(x as usize, y as usize))
    };
    let mut area = 0.0f32;
    for (li, layer) in stack.layers().iter().enumerate() {
        let th = layer.thickness_mm();
        for y in 0..h as i32 {
            for x in 0..w as i32 {
                if !solid(li as i32, x, y) {
                    continue;
                }
                if !solid(li as i32 + 1, x, y) {
                    area += px * py; // top
                }
                if !solid(li as i32 - 1, x, y) {
                    area += px * py; // bottom
                }
                if !solid(li as i32, x - 1, y) {
                    area += py * th;
                }
                if !solid(li as i32, x + 1, y) {
                    area += py * th;
                }
                if !solid(li as i32, x, y - 1) {
                    area += px * th;
                }
                if !solid(li as i32, x, y + 1) {
                    area += px * th;
                }
            }
        }
    }
    area
}

fn expected_volume(stack: &LayerStack) -> f32 {
    let px = stack.pitch().x_mm;
    let py = stack.pitch().y_mm;
    stack
        .layers()
        .iter()
        .map(|l| l.solid_count() as f32 * px * py * l.thickness_mm())
        .sum()
}

fn assert_close(a: f32, b: f32, eps: f32) {
    assert!((a - b).abs() <= eps, "{a} vs {b}");
}

#[test]
fn isolated_voxel_exposes_all_six_faces() {
    let stack = stack_of(vec![LayerMask::from_fn(3, 3, 0.05, |x, y| {
        x == 1 && y == 1
    })]);
    let set = exposed_faces(&stack, 0, 1, 1);
    assert_eq!(set.len(), 6);
    for face in Face::ALL {
        assert!(set.contains(face));
    }
}

#[test]
fn empty_pixel_has_no_exposure() {
    let stack = stack_of(vec![LayerMask::from_fn(3, 3, 0.05, |x, y| {
        x == 1 && y == 1
    })]);
    assert!(exposed_faces(&stack, 0, 0, 0).is_empty());
    assert!(exposed_faces(&stack, 0, 2, 2).is_empty());
}

#[test]
fn isolated_voxel_closes_as_unit_cell() {
    let stack = stack_of(vec![LayerMask::from_fn(3, 3, 0.05, |x, y| {
        x == 1 && y == 1
    })]);
    let mesh = voxelize(&stack).unwrap();
    assert_eq!(mesh.triangle_count(), 12);
    assert_eq!(mesh.triangles().count(), 12);
    assert_close(tri_area_sum(&mesh), expected_surface_area(&stack), 1e-5);
    assert_close(tri_volume_sum(&mesh), expected_volume(&stack), 1e-6);

    let bounds = mesh.bounds().unwrap();
    assert_close(bounds.min.x, 0.1, 1e-6);
    assert_close(bounds.max.x, 0.2, 1e-6);
    assert_close(bounds.min.y, 0.2, 1e-6);
    assert_close(bounds.max.y, 0.4, 1e-6);
    assert_close(bounds.min.z, 0.0, 1e-6);
    assert_close(bounds.max.z, 0.05, 1e-6);
}

#[test]
fn stacked_voxels_merge_into_single_column() {
    let stack = stack_of(vec![
        LayerMask::from_fn(1, 1, 0.5, |_, _| true),
        LayerMask::from_fn(1, 1, 0.3, |_, _| true),
    ]);
    let mesh = voxelize(&stack).unwrap();

    // Interior boundary produces nothing: one Top, one Bottom, four walls.
    let chains: Vec<_> = mesh.chains().collect();
    assert_eq!(chains.len(), 6);
    assert_eq!(mesh.triangle_count(), 12);

    let tops: Vec<_> = chains.iter().filter(|c| c.face == Face::Top).collect();
    let bottoms: Vec<_> = chains.iter().filter(|c| c.face == Face::Bottom).collect();
    assert_eq!(tops.len(), 1);
    assert_eq!(bottoms.len(), 1);
    assert_eq!(tops[0].layer, 1);
    assert_eq!(bottoms[0].layer, 0);

    for c in chains.iter().filter(|c| c.face.is_side()) {
        assert_eq!(c.layer, 0);
        assert_close(c.height_mm, 0.8, 1e-6);
    }

    // The Top plane sits at the summed stack height.
    for t in mesh.triangles().filter(|t| t.normal.z > 0.5) {
        assert_close(t.a.z, 0.8, 1e-6);
        assert_close(t.b.z, 0.8, 1e-6);
        assert_close(t.c.z, 0.8, 1e-6);
    }

    assert_close(tri_area_sum(&mesh), expected_surface_area(&stack), 1e-5);
    assert_close(tri_volume_sum(&mesh), expected_volume(&stack), 1e-6);
}

#[test]
fn triangle_count_independent_of_layer_count() {
    let count_for = |n: usize| {
        let layers = (0..n)
            .map(|_| LayerMask::from_fn(4, 4, 0.05, |x, y| (1..3).contains(&x) && (1..3).contains(&y)))
            .collect();
        voxelize(&stack_of(layers)).unwrap().triangle_count()
    };
    let one = count_for(1);
    // 2x2 column: 4 top + 4 bottom + 8 wall chains
    assert_eq!(one, 32);
    assert_eq!(count_for(3), one);
    assert_eq!(count_for(7), one);
}

#[test]
fn single_column_chain_heights_round_trip() {
    let thicknesses = [0.5f32, 0.25, 1.0, 0.05, 0.2];
    let layers = thicknesses
        .iter()
        .map(|&th| LayerMask::from_fn(1, 1, th, |_, _| true))
        .collect();
    let stack = stack_of(layers);
    let total: f32 = thicknesses.iter().sum();
    let mesh = voxelize(&stack).unwrap();

    for c in mesh.chains() {
        match c.face {
            Face::Top => assert_close(c.height_mm, 0.2, 1e-6),
            Face::Bottom => assert_close(c.height_mm, 0.5, 1e-6),
            _ => assert_close(c.height_mm, total, 1e-5),
        }
    }
    assert_close(tri_volume_sum(&mesh), expected_volume(&stack), 1e-6);
}

#[test]
fn plus_shape_with_hole_keeps_hole_boundary() {
    let plus = |x: usize, y: usize| ((1..=3).contains(&x) || (1..=3).contains(&y)) && !(x == 2 && y == 2);
    let stack = stack_of(vec![LayerMask::from_fn(5, 5, 0.05, plus)]);
    let mesh = voxelize(&stack).unwrap();

    // The hole's four neighbours carry walls facing into it.
    let set = exposed_faces(&stack, 0, 1, 2);
    assert!(set.contains(Face::Right));
    let set = exposed_faces(&stack, 0, 2, 1);
    assert!(set.contains(Face::Back));

    assert_close(tri_area_sum(&mesh), expected_surface_area(&stack), 1e-5);
    assert_close(tri_volume_sum(&mesh), expected_volume(&stack), 1e-6);
}

#[test]
fn separated_islands_close_independently() {
    let solid = LayerMask::from_fn(1, 1, 0.1, |_, _| true);
    let empty = LayerMask::from_fn(1, 1, 0.1, |_, _| false);
    let stack = stack_of(vec![solid.clone(), empty, solid]);
    let mesh = voxelize(&stack).unwrap();
    assert_eq!(mesh.triangle_count(), 24);
    assert_close(tri_volume_sum(&mesh), expected_volume(&stack), 1e-6);
}

#[test]
fn empty_inputs_produce_empty_meshes() {
    let stack = LayerStack::try_new(Vec::new(), PITCH).unwrap();
    let mesh = voxelize(&stack).unwrap();
    assert_eq!(mesh.face_count(), 0);
    assert_eq!(mesh.triangles().count(), 0);
    assert!(mesh.bounds().is_none());

    let stack = stack_of(vec![LayerMask::from_fn(8, 8, 0.05, |_, _| false)]);
    let mesh = voxelize(&stack).unwrap();
    assert_eq!(mesh.triangle_count(), 0);
}

#[test]
fn overhang_step_matches_brute_force() {
    // An L-profile: wide base, narrower column, with an overhang ledge.
    let base = LayerMask::from_fn(6, 4, 0.1, |x, _| x < 5);
    let column = LayerMask::from_fn(6, 4, 0.08, |x, y| (1..3).contains(&x) && y < 3);
    let ledge = LayerMask::from_fn(6, 4, 0.12, |x, y| x < 4 && y < 3);
    let stack = stack_of(vec![base, column, ledge]);
    let mesh = voxelize(&stack).unwrap();

    assert_close(tri_area_sum(&mesh), expected_surface_area(&stack), 1e-4);
    assert_close(tri_volume_sum(&mesh), expected_volume(&stack), 1e-5);
}

#[test]
fn buffers_agree_with_triangle_stream() {
    let stack = stack_of(vec![
        LayerMask::from_fn(4, 4, 0.05, |x, y| x != y),
        LayerMask::from_fn(4, 4, 0.05, |x, _| x > 0),
    ]);
    let mesh = voxelize(&stack).unwrap();
    let buffers = mesh.to_buffers();
    assert_eq!(buffers.triangle_count(), mesh.triangle_count());
    assert_eq!(buffers.positions().len(), buffers.normals().len());

    for n in buffers.normals().chunks_exact(3) {
        let len = (n[0] * n[0] + n[1] * n[1] + n[2] * n[2]).sqrt();
        assert_close(len, 1.0, 1e-6);
    }
}

#[test]
fn cancellation_is_surfaced() {
    let stack = stack_of(vec![LayerMask::from_fn(16, 16, 0.05, |_, _| true); 4]);
    let cancel = AtomicBool::new(true);
    assert!(matches!(
        voxelize_with_cancel(&stack, &cancel),
        Err(VoxelizeError::Cancelled)
    ));

    cancel.store(false, Ordering::Relaxed);
    let mesh = voxelize_with_cancel(&stack, &cancel).unwrap();
    cancel.store(true, Ordering::Relaxed);
    assert!(matches!(
        mesh.to_buffers_with_cancel(&cancel),
        Err(VoxelizeError::Cancelled)
    ));
}
