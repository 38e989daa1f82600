use std::f32::consts::{PI, TAU};

use glam::Vec3;

use crate::renderer::mesh::TriangleMesh;

pub const MIN_BOX_SEGMENTS: u32 = 1;
pub const MIN_RADIAL_SEGMENTS: u32 = 3;
pub const MIN_SPHERE_RINGS: u32 = 2;

/// Axis-aligned box. Only the width axis is subdivided; height and depth
/// always use a single segment.
pub fn box_mesh(width: f32, height: f32, depth: f32, width_segments: u32) -> TriangleMesh {
    let width_segments = width_segments.max(MIN_BOX_SEGMENTS);
    let half = Vec3::new(width, height, depth) * 0.5;

    // (normal, u axis, v axis, u segments); u x v points along the normal
    let faces = [
        (Vec3::X, Vec3::NEG_Z * depth, Vec3::Y * height, 1),
        (Vec3::NEG_X, Vec3::Z * depth, Vec3::Y * height, 1),
        (Vec3::Y, Vec3::X * width, Vec3::NEG_Z * depth, width_segments),
        (Vec3::NEG_Y, Vec3::X * width, Vec3::Z * depth, width_segments),
        (Vec3::Z, Vec3::X * width, Vec3::Y * height, width_segments),
        (Vec3::NEG_Z, Vec3::NEG_X * width, Vec3::Y * height, width_segments),
    ];

    let vertex_estimate = faces
        .iter()
        .map(|(_, _, _, segs)| (*segs as usize + 1) * 2)
        .sum();
    let mut mesh = TriangleMesh::with_capacity(vertex_estimate, vertex_estimate * 3);

    for (normal, u_axis, v_axis, u_segments) in faces {
        let center = normal * half;
        let row = u_segments + 1;
        let base = mesh.vertex_count() as u32;

        for iv in 0..=1u32 {
            let v = iv as f32 - 0.5;
            for iu in 0..=u_segments {
                let u = iu as f32 / u_segments as f32 - 0.5;
                mesh.push_vertex(center + u_axis * u + v_axis * v, normal);
            }
        }

        for iu in 0..u_segments {
            let a = base + iu;
            let b = a + 1;
            let c = b + row;
            let d = a + row;
            mesh.push_triangle(a, b, c);
            mesh.push_triangle(a, c, d);
        }
    }

    mesh
}

pub fn sphere(radius: f32, width_segments: u32, rings: u32) -> TriangleMesh {
    let width_segments = width_segments.max(MIN_RADIAL_SEGMENTS);
    let rings = rings.max(MIN_SPHERE_RINGS);
    let row = width_segments + 1;

    let mut mesh = TriangleMesh::with_capacity(
        (row * (rings + 1)) as usize,
        (width_segments * rings * 6) as usize,
    );

    for iy in 0..=rings {
        let theta = iy as f32 / rings as f32 * PI;
        for ix in 0..=width_segments {
            let phi = ix as f32 / width_segments as f32 * TAU;
            let direction = Vec3::new(
                -phi.cos() * theta.sin(),
                theta.cos(),
                phi.sin() * theta.sin(),
            );
            mesh.push_vertex(direction * radius, direction.normalize_or_zero());
        }
    }

    for iy in 0..rings {
        for ix in 0..width_segments {
            let a = iy * row + ix + 1;
            let b = iy * row + ix;
            let c = (iy + 1) * row + ix;
            let d = (iy + 1) * row + ix + 1;

            // pole rows collapse to a single triangle per segment
            if iy != 0 {
                mesh.push_triangle(a, b, d);
            }
            if iy != rings - 1 {
                mesh.push_triangle(b, c, d);
            }
        }
    }

    mesh
}

/// Capped cylinder. A zero radius on either end drops that cap, which is how
/// [`cone`] is produced.
pub fn cylinder(radius_top: f32, radius_bottom: f32, height: f32, radial_segments: u32) -> TriangleMesh {
    let radial_segments = radial_segments.max(MIN_RADIAL_SEGMENTS);
    let half_height = height * 0.5;
    let row = radial_segments + 1;
    let slope = if height.abs() > f32::EPSILON {
        (radius_bottom - radius_top) / height
    } else {
        0.0
    };

    let mut mesh = TriangleMesh::with_capacity((row * 6) as usize, (radial_segments * 12) as usize);

    for iy in 0..=1u32 {
        let v = iy as f32;
        let radius = v * (radius_bottom - radius_top) + radius_top;
        for ix in 0..=radial_segments {
            let theta = ix as f32 / radial_segments as f32 * TAU;
            let (sin, cos) = theta.sin_cos();
            let position = Vec3::new(radius * sin, -v * height + half_height, radius * cos);
            let normal = Vec3::new(sin, slope, cos).normalize_or_zero();
            mesh.push_vertex(position, normal);
        }
    }

    for ix in 0..radial_segments {
        let a = ix;
        let b = row + ix;
        let c = row + ix + 1;
        let d = ix + 1;
        mesh.push_triangle(a, b, d);
        mesh.push_triangle(b, c, d);
    }

    if radius_top > 0.0 {
        push_cap(&mut mesh, radius_top, half_height, radial_segments, true);
    }
    if radius_bottom > 0.0 {
        push_cap(&mut mesh, radius_bottom, half_height, radial_segments, false);
    }

    mesh
}

pub fn cone(radius: f32, height: f32, radial_segments: u32) -> TriangleMesh {
    cylinder(0.0, radius, height, radial_segments)
}

fn push_cap(mesh: &mut TriangleMesh, radius: f32, half_height: f32, radial_segments: u32, top: bool) {
    let sign = if top { 1.0 } else { -1.0 };
    let normal = Vec3::Y * sign;
    let y = half_height * sign;

    // one centre vertex per segment
    let center_start = mesh.vertex_count() as u32;
    for _ in 0..radial_segments {
        mesh.push_vertex(Vec3::new(0.0, y, 0.0), normal);
    }

    let ring_start = mesh.vertex_count() as u32;
    for ix in 0..=radial_segments {
        let theta = ix as f32 / radial_segments as f32 * TAU;
        let (sin, cos) = theta.sin_cos();
        mesh.push_vertex(Vec3::new(radius * sin, y, radius * cos), normal);
    }

    for ix in 0..radial_segments {
        let center = center_start + ix;
        let i = ring_start + ix;
        if top {
            mesh.push_triangle(i, i + 1, center);
        } else {
            mesh.push_triangle(i + 1, i, center);
        }
    }
}

/// Lies in the XY plane. `radial_segments` goes around the tube cross-section.
pub fn torus(radius: f32, tube: f32, radial_segments: u32, tubular_segments: u32) -> TriangleMesh {
    let radial_segments = radial_segments.max(MIN_RADIAL_SEGMENTS);
    let tubular_segments = tubular_segments.max(MIN_RADIAL_SEGMENTS);
    let row = tubular_segments + 1;

    let mut mesh = TriangleMesh::with_capacity(
        (row * (radial_segments + 1)) as usize,
        (radial_segments * tubular_segments * 6) as usize,
    );

    for j in 0..=radial_segments {
        let v = j as f32 / radial_segments as f32 * TAU;
        for i in 0..=tubular_segments {
            let u = i as f32 / tubular_segments as f32 * TAU;
            let position = Vec3::new(
                (radius + tube * v.cos()) * u.cos(),
                (radius + tube * v.cos()) * u.sin(),
                tube * v.sin(),
            );
            let center = Vec3::new(radius * u.cos(), radius * u.sin(), 0.0);
            mesh.push_vertex(position, (position - center).normalize_or_zero());
        }
    }

    for j in 1..=radial_segments {
        for i in 1..=tubular_segments {
            let a = row * j + i - 1;
            let b = row * (j - 1) + i - 1;
            let c = row * (j - 1) + i;
            let d = row * j + i;
            mesh.push_triangle(a, b, d);
            mesh.push_triangle(b, c, d);
        }
    }

    mesh
}

#[cfg(test)]
mod tests {
    use super::*;

    fn assert_indices_in_range(mesh: &TriangleMesh) {
        let count = mesh.vertex_count() as u32;
        assert!(mesh.indices.iter().all(|&i| i < count));
        assert_eq!(mesh.indices.len() % 3, 0);
    }

    fn assert_close(a: Vec3, b: Vec3) {
        assert!((a - b).length() < 1e-5, "{a:?} != {b:?}");
    }

    #[test]
    fn box_extents_match_dimensions() {
        let mesh = box_mesh(2.0, 1.0, 0.5, 1);
        let (min, max) = mesh.bounds().unwrap();
        assert_close(min, Vec3::new(-1.0, -0.5, -0.25));
        assert_close(max, Vec3::new(1.0, 0.5, 0.25));
        assert_eq!(mesh.vertex_count(), 24);
        assert_eq!(mesh.triangle_count(), 12);
        assert_indices_in_range(&mesh);
    }

    #[test]
    fn box_segments_subdivide_width_faces_only() {
        let mesh = box_mesh(1.0, 1.0, 1.0, 4);
        // four faces split 4 ways, the two X faces stay whole
        assert_eq!(mesh.triangle_count(), 4 * 4 * 2 + 2 * 2);
        assert_indices_in_range(&mesh);
    }

    #[test]
    fn box_faces_wind_outwards() {
        let mesh = box_mesh(1.0, 1.0, 1.0, 1);
        for tri in mesh.indices.chunks_exact(3) {
            let a = mesh.position(tri[0] as usize);
            let b = mesh.position(tri[1] as usize);
            let c = mesh.position(tri[2] as usize);
            let face_normal = (b - a).cross(c - a);
            let centroid = (a + b + c) / 3.0;
            assert!(face_normal.dot(centroid) > 0.0);
        }
    }

    #[test]
    fn sphere_vertices_lie_on_radius() {
        let mesh = sphere(0.5, 32, 16);
        for i in 0..mesh.vertex_count() {
            assert!((mesh.position(i).length() - 0.5).abs() < 1e-5);
        }
        assert_eq!(mesh.vertex_count(), 33 * 17);
        // pole rows contribute one triangle per segment instead of two
        assert_eq!(mesh.triangle_count(), 32 * 16 * 2 - 2 * 32);
        assert_indices_in_range(&mesh);
    }

    #[test]
    fn cylinder_has_both_caps() {
        let mesh = cylinder(1.0, 1.0, 2.0, 8);
        let (min, max) = mesh.bounds().unwrap();
        assert!((min.y + 1.0).abs() < 1e-5);
        assert!((max.y - 1.0).abs() < 1e-5);
        assert_eq!(mesh.triangle_count(), 8 * 2 + 8 * 2);
        assert_indices_in_range(&mesh);
    }

    #[test]
    fn cone_drops_the_top_cap() {
        let mesh = cone(1.0, 2.0, 8);
        assert_eq!(mesh.triangle_count(), 8 * 2 + 8);
        let (_, max) = mesh.bounds().unwrap();
        assert!((max.y - 1.0).abs() < 1e-5);
        assert_indices_in_range(&mesh);
    }

    #[test]
    fn torus_spans_ring_plus_tube() {
        let mesh = torus(1.0, 0.2, 8, 6);
        let (min, max) = mesh.bounds().unwrap();
        assert!((max.x - 1.2).abs() < 1e-5);
        assert!((max.z - 0.2).abs() < 1e-5);
        assert!((min.z + 0.2).abs() < 1e-5);
        assert_eq!(mesh.vertex_count(), 9 * 7);
        assert_eq!(mesh.triangle_count(), 8 * 6 * 2);
        assert_indices_in_range(&mesh);
    }

    #[test]
    fn segment_counts_below_minimum_are_raised() {
        assert_eq!(sphere(1.0, 0, 0).vertex_count(), 4 * 3);
        assert_eq!(torus(1.0, 0.1, 0, 1).triangle_count(), 3 * 3 * 2);
        assert_eq!(box_mesh(1.0, 1.0, 1.0, 0).triangle_count(), 12);
    }

    #[test]
    fn degenerate_dimensions_still_build() {
        let mesh = cylinder(0.0, 0.0, 0.0, 3);
        assert!(mesh.vertex_count() > 0);
        assert!(mesh.vertices.iter().all(|v| v.is_finite()));
        assert!(mesh.normals.iter().all(|n| n.is_finite()));
    }
}
