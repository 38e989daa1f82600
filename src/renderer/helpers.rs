use glam::Vec3;

use crate::renderer::primitives;
use crate::scene::light::HelperKind;
use crate::scene::{DirectionalLight, PointLight, Scene};

const POINT_HELPER_WIDTH_SEGMENTS: u32 = 4;
const POINT_HELPER_RINGS: u32 = 2;

fn push_line(vertices: &mut Vec<f32>, a: Vec3, b: Vec3) {
    vertices.extend_from_slice(&a.to_array());
    vertices.extend_from_slice(&b.to_array());
}

/// Square of half-extent `size` around the light, facing its target, plus a
/// line from the light to the target.
pub fn directional_helper_vertices(light: &DirectionalLight, size: f32) -> Vec<f32> {
    let dir = light.direction();
    let up = if dir.y.abs() > 0.99 { Vec3::Z } else { Vec3::Y };
    let right = up.cross(dir).normalize() * size;
    let up = dir.cross(right.normalize()) * size;

    let p = light.position;
    let corners = [p - right + up, p + right + up, p + right - up, p - right - up];

    let mut vertices = Vec::with_capacity(10 * 3);
    for i in 0..corners.len() {
        push_line(&mut vertices, corners[i], corners[(i + 1) % corners.len()]);
    }
    push_line(&mut vertices, p, light.target);

    vertices
}

/// Low-poly wireframe sphere of radius `size` at the light position.
pub fn point_helper_vertices(light: &PointLight, size: f32) -> Vec<f32> {
    let mesh = primitives::sphere(size, POINT_HELPER_WIDTH_SEGMENTS, POINT_HELPER_RINGS);
    let edges = mesh.edge_indices();

    let mut vertices = Vec::with_capacity(edges.len() * 3);
    for &index in &edges {
        let p = mesh.position(index as usize) + light.position;
        vertices.extend_from_slice(&p.to_array());
    }

    vertices
}

/// Line list for every visible helper, rebuilt from the current light state.
pub fn helper_line_vertices(scene: &Scene) -> Vec<f32> {
    let mut vertices = Vec::new();

    for helper in [&scene.directional_light_helper, &scene.point_light_helper] {
        if !helper.visible {
            continue;
        }

        let lines = match helper.kind {
            HelperKind::Directional => directional_helper_vertices(&scene.directional_light, helper.size),
            HelperKind::Point => point_helper_vertices(&scene.point_light, helper.size),
        };
        vertices.extend(lines);
    }

    vertices
}
