use std::fmt;
use std::str::FromStr;
use std::sync::atomic::{AtomicU64, Ordering};

use crate::renderer::mesh::TriangleMesh;
use crate::renderer::primitives;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ShapeKind {
    Box,
    Sphere,
    Cone,
    Cylinder,
    Torus,
}

/// Numeric knobs of [`ShapeParameters`], used to describe which ones a kind reads.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ShapeField {
    Width,
    Height,
    Depth,
    Radius,
    RadialSegments,
    HeightSegments,
    TubeRadius,
}

impl ShapeField {
    /// Control label, matching the parameter names of the settings panel.
    pub fn label(self) -> &'static str {
        match self {
            ShapeField::Width => "width",
            ShapeField::Height => "height",
            ShapeField::Depth => "depth",
            ShapeField::Radius => "radius",
            ShapeField::RadialSegments => "radialSegments",
            ShapeField::HeightSegments => "heightSegments",
            ShapeField::TubeRadius => "tubeRadius",
        }
    }
}

impl ShapeKind {
    pub const ALL: [ShapeKind; 5] = [
        ShapeKind::Box,
        ShapeKind::Sphere,
        ShapeKind::Cone,
        ShapeKind::Cylinder,
        ShapeKind::Torus,
    ];

    pub fn name(self) -> &'static str {
        match self {
            ShapeKind::Box => "Box",
            ShapeKind::Sphere => "Sphere",
            ShapeKind::Cone => "Cone",
            ShapeKind::Cylinder => "Cylinder",
            ShapeKind::Torus => "Torus",
        }
    }

    pub fn consumed_fields(self) -> &'static [ShapeField] {
        use ShapeField::*;

        match self {
            ShapeKind::Box => &[Width, Height, Depth, HeightSegments],
            ShapeKind::Sphere => &[Radius, RadialSegments, HeightSegments],
            ShapeKind::Cone => &[Radius, Height, RadialSegments],
            ShapeKind::Cylinder => &[Radius, Height, RadialSegments],
            ShapeKind::Torus => &[Radius, TubeRadius, RadialSegments, HeightSegments],
        }
    }
}

impl fmt::Display for ShapeKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown shape kind {0:?}")]
pub struct UnknownShapeKind(pub String);

impl FromStr for ShapeKind {
    type Err = UnknownShapeKind;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        ShapeKind::ALL
            .into_iter()
            .find(|kind| kind.name() == s)
            .ok_or_else(|| UnknownShapeKind(s.to_string()))
    }
}

/// The single parameter record shared by every shape kind. Fields a kind does
/// not consume are kept as-is, so values survive switching back and forth.
#[derive(Debug, Clone, PartialEq)]
pub struct ShapeParameters {
    pub kind: ShapeKind,
    pub width: f32,
    pub height: f32,
    pub depth: f32,
    pub radius: f32,
    pub radial_segments: u32,
    pub height_segments: u32,
    pub tube_radius: f32,
}

impl Default for ShapeParameters {
    fn default() -> Self {
        Self {
            kind: ShapeKind::Box,
            width: 1.0,
            height: 1.0,
            depth: 1.0,
            radius: 0.5,
            radial_segments: 32,
            height_segments: 16,
            tube_radius: 0.2,
        }
    }
}

/// The engine-level description of a built geometry: exactly the values the
/// constructor was called with.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum GeometryShape {
    Box {
        width: f32,
        height: f32,
        depth: f32,
        width_segments: u32,
    },
    Sphere {
        radius: f32,
        width_segments: u32,
        height_segments: u32,
    },
    Cone {
        radius: f32,
        height: f32,
        radial_segments: u32,
    },
    Cylinder {
        radius_top: f32,
        radius_bottom: f32,
        height: f32,
        radial_segments: u32,
    },
    Torus {
        radius: f32,
        tube: f32,
        radial_segments: u32,
        tubular_segments: u32,
    },
}

impl GeometryShape {
    pub fn kind(&self) -> ShapeKind {
        match self {
            GeometryShape::Box { .. } => ShapeKind::Box,
            GeometryShape::Sphere { .. } => ShapeKind::Sphere,
            GeometryShape::Cone { .. } => ShapeKind::Cone,
            GeometryShape::Cylinder { .. } => ShapeKind::Cylinder,
            GeometryShape::Torus { .. } => ShapeKind::Torus,
        }
    }

    fn tessellate(&self) -> TriangleMesh {
        match *self {
            GeometryShape::Box {
                width,
                height,
                depth,
                width_segments,
            } => primitives::box_mesh(width, height, depth, width_segments),
            GeometryShape::Sphere {
                radius,
                width_segments,
                height_segments,
            } => primitives::sphere(radius, width_segments, height_segments),
            GeometryShape::Cone {
                radius,
                height,
                radial_segments,
            } => primitives::cone(radius, height, radial_segments),
            GeometryShape::Cylinder {
                radius_top,
                radius_bottom,
                height,
                radial_segments,
            } => primitives::cylinder(radius_top, radius_bottom, height, radial_segments),
            GeometryShape::Torus {
                radius,
                tube,
                radial_segments,
                tubular_segments,
            } => primitives::torus(radius, tube, radial_segments, tubular_segments),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct GeometryId(u64);

static NEXT_GEOMETRY_ID: AtomicU64 = AtomicU64::new(1);

impl GeometryId {
    fn next() -> Self {
        Self(NEXT_GEOMETRY_ID.fetch_add(1, Ordering::Relaxed))
    }
}

/// A freshly allocated geometry. Two geometries built from the same
/// parameters compare equal by `shape` but never by `id`.
#[derive(Debug)]
pub struct Geometry {
    id: GeometryId,
    pub shape: GeometryShape,
    pub mesh: TriangleMesh,
}

impl Geometry {
    pub fn new(shape: GeometryShape) -> Self {
        Self {
            id: GeometryId::next(),
            mesh: shape.tessellate(),
            shape,
        }
    }

    pub fn id(&self) -> GeometryId {
        self.id
    }

    pub fn kind(&self) -> ShapeKind {
        self.shape.kind()
    }
}

pub fn build_geometry(kind: ShapeKind, params: &ShapeParameters) -> Geometry {
    let shape = match kind {
        ShapeKind::Box => GeometryShape::Box {
            width: params.width,
            height: params.height,
            depth: params.depth,
            width_segments: params.height_segments,
        },
        ShapeKind::Sphere => GeometryShape::Sphere {
            radius: params.radius,
            width_segments: params.radial_segments,
            height_segments: params.height_segments,
        },
        ShapeKind::Cone => GeometryShape::Cone {
            radius: params.radius,
            height: params.height,
            radial_segments: params.radial_segments,
        },
        ShapeKind::Cylinder => GeometryShape::Cylinder {
            radius_top: params.radius,
            radius_bottom: params.radius,
            height: params.height,
            radial_segments: params.radial_segments,
        },
        ShapeKind::Torus => GeometryShape::Torus {
            radius: params.radius,
            tube: params.tube_radius,
            radial_segments: params.radial_segments,
            tubular_segments: params.height_segments,
        },
    };

    Geometry::new(shape)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn every_kind_builds_its_own_geometry() {
        let params = ShapeParameters::default();
        for kind in ShapeKind::ALL {
            let geometry = build_geometry(kind, &params);
            assert_eq!(geometry.kind(), kind);
            assert!(geometry.mesh.vertex_count() > 0);
            assert!(geometry.mesh.triangle_count() > 0);
        }
    }

    #[test]
    fn default_box_is_unit_sized() {
        let params = ShapeParameters::default();
        assert_eq!(params.kind, ShapeKind::Box);

        let geometry = build_geometry(params.kind, &params);
        assert_eq!(
            geometry.shape,
            GeometryShape::Box {
                width: 1.0,
                height: 1.0,
                depth: 1.0,
                width_segments: 16,
            }
        );
        let (min, max) = geometry.mesh.bounds().unwrap();
        assert_eq!(max - min, glam::Vec3::ONE);
    }

    #[test]
    fn torus_reads_radius_and_tube() {
        let params = ShapeParameters {
            kind: ShapeKind::Torus,
            radius: 1.0,
            tube_radius: 0.2,
            radial_segments: 8,
            height_segments: 6,
            ..Default::default()
        };

        let geometry = build_geometry(params.kind, &params);
        assert_eq!(
            geometry.shape,
            GeometryShape::Torus {
                radius: 1.0,
                tube: 0.2,
                radial_segments: 8,
                tubular_segments: 6,
            }
        );
    }

    #[test]
    fn cylinder_uses_radius_for_both_ends() {
        let params = ShapeParameters {
            radius: 0.75,
            height: 3.0,
            radial_segments: 12,
            ..Default::default()
        };

        match build_geometry(ShapeKind::Cylinder, &params).shape {
            GeometryShape::Cylinder {
                radius_top,
                radius_bottom,
                height,
                radial_segments,
            } => {
                assert_eq!(radius_top, 0.75);
                assert_eq!(radius_bottom, 0.75);
                assert_eq!(height, 3.0);
                assert_eq!(radial_segments, 12);
            }
            other => panic!("expected cylinder, got {other:?}"),
        }
    }

    #[test]
    fn unconsumed_fields_do_not_affect_the_shape() {
        let base = ShapeParameters::default();
        let tweaked = ShapeParameters {
            radius: 9.0,
            tube_radius: 0.9,
            radial_segments: 3,
            ..base.clone()
        };

        assert_eq!(
            build_geometry(ShapeKind::Box, &base).shape,
            build_geometry(ShapeKind::Box, &tweaked).shape
        );
        assert!(!ShapeKind::Box.consumed_fields().contains(&ShapeField::Radius));
    }

    #[test]
    fn repeated_builds_are_equivalent_but_distinct() {
        let params = ShapeParameters::default();
        let first = build_geometry(ShapeKind::Sphere, &params);
        let second = build_geometry(ShapeKind::Sphere, &params);

        assert_ne!(first.id(), second.id());
        assert_eq!(first.shape, second.shape);
        assert_eq!(first.mesh, second.mesh);
    }

    #[test]
    fn kind_names_round_trip_through_parsing() {
        for kind in ShapeKind::ALL {
            assert_eq!(kind.name().parse::<ShapeKind>(), Ok(kind));
            assert_eq!(kind.to_string(), kind.name());
        }
        assert_eq!(
            "Pyramid".parse::<ShapeKind>(),
            Err(UnknownShapeKind("Pyramid".to_string()))
        );
    }
}
