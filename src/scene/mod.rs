pub mod controller;
pub mod light;
pub mod shape;

use std::sync::atomic::{AtomicU64, Ordering};

use glam::{EulerRot, Mat4, Quat, Vec3};

pub use controller::MeshController;
pub use light::{AmbientLight, DirectionalLight, LightHelper, PointLight};
pub use shape::{Geometry, GeometryId, ShapeField, ShapeKind, ShapeParameters, UnknownShapeKind, build_geometry};

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum PropertyValue {
    Float(f32),
    Bool(bool),
}

/// Name-addressed access to the editable state of a scene object. Setting
/// returns `false` when the name is unknown or the value has the wrong type.
pub trait Properties {
    fn property(&self, name: &str) -> Option<PropertyValue>;
    fn set_property(&mut self, name: &str, value: PropertyValue) -> bool;
}

fn vec3_component<'a>(name: &'a str, prefix: &str) -> Option<&'a str> {
    name.strip_prefix(prefix)?.strip_prefix('.')
}

pub(crate) fn get_vec3_property(name: &str, prefix: &str, v: Vec3) -> Option<PropertyValue> {
    let value = match vec3_component(name, prefix)? {
        "x" => v.x,
        "y" => v.y,
        "z" => v.z,
        _ => return None,
    };
    Some(PropertyValue::Float(value))
}

pub(crate) fn set_vec3_property(name: &str, prefix: &str, v: &mut Vec3, value: PropertyValue) -> bool {
    let (Some(component), PropertyValue::Float(value)) = (vec3_component(name, prefix), value) else {
        return false;
    };
    match component {
        "x" => v.x = value,
        "y" => v.y = value,
        "z" => v.z = value,
        _ => return false,
    }
    true
}

#[derive(Debug, Clone, PartialEq)]
pub struct Transform {
    pub position: Vec3,
    /// Euler angles in radians, applied in XYZ order.
    pub rotation: Vec3,
    pub scale: Vec3,
}

impl Default for Transform {
    fn default() -> Self {
        Self {
            position: Vec3::ZERO,
            rotation: Vec3::ZERO,
            scale: Vec3::ONE,
        }
    }
}

impl Transform {
    pub fn matrix(&self) -> Mat4 {
        let rotation = Quat::from_euler(EulerRot::XYZ, self.rotation.x, self.rotation.y, self.rotation.z);
        Mat4::from_scale_rotation_translation(self.scale, rotation, self.position)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct MaterialId(u32);

#[derive(Debug, Clone, PartialEq)]
pub struct Material {
    pub color: [f32; 3],
    pub roughness: f32,
    pub metalness: f32,
    pub opacity: f32,
    pub transparent: bool,
    pub wireframe: bool,
}

impl Material {
    pub fn standard(color: [f32; 3]) -> Self {
        Self {
            color,
            roughness: 1.0,
            metalness: 0.0,
            opacity: 1.0,
            transparent: false,
            wireframe: false,
        }
    }

    /// Opacity only applies while the material is flagged transparent.
    pub fn effective_opacity(&self) -> f32 {
        if self.transparent { self.opacity } else { 1.0 }
    }
}

impl Properties for Material {
    fn property(&self, name: &str) -> Option<PropertyValue> {
        let value = match name {
            "roughness" => PropertyValue::Float(self.roughness),
            "metalness" => PropertyValue::Float(self.metalness),
            "opacity" => PropertyValue::Float(self.opacity),
            "transparent" => PropertyValue::Bool(self.transparent),
            "wireframe" => PropertyValue::Bool(self.wireframe),
            _ => return None,
        };
        Some(value)
    }

    fn set_property(&mut self, name: &str, value: PropertyValue) -> bool {
        match (name, value) {
            ("roughness", PropertyValue::Float(v)) => self.roughness = v,
            ("metalness", PropertyValue::Float(v)) => self.metalness = v,
            ("opacity", PropertyValue::Float(v)) => self.opacity = v,
            ("transparent", PropertyValue::Bool(v)) => self.transparent = v,
            ("wireframe", PropertyValue::Bool(v)) => self.wireframe = v,
            _ => return false,
        }
        true
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct MeshId(u64);

static NEXT_MESH_ID: AtomicU64 = AtomicU64::new(1);

#[derive(Debug)]
pub struct Mesh {
    id: MeshId,
    pub geometry: Geometry,
    pub material: MaterialId,
    pub transform: Transform,
}

impl Mesh {
    pub fn new(geometry: Geometry, material: MaterialId) -> Self {
        Self {
            id: MeshId(NEXT_MESH_ID.fetch_add(1, Ordering::Relaxed)),
            geometry,
            material,
            transform: Transform::default(),
        }
    }

    pub fn id(&self) -> MeshId {
        self.id
    }
}

impl Properties for Mesh {
    fn property(&self, name: &str) -> Option<PropertyValue> {
        let t = &self.transform;
        get_vec3_property(name, "position", t.position)
            .or_else(|| get_vec3_property(name, "rotation", t.rotation))
            .or_else(|| get_vec3_property(name, "scale", t.scale))
    }

    fn set_property(&mut self, name: &str, value: PropertyValue) -> bool {
        let t = &mut self.transform;
        set_vec3_property(name, "position", &mut t.position, value)
            || set_vec3_property(name, "rotation", &mut t.rotation, value)
            || set_vec3_property(name, "scale", &mut t.scale, value)
    }
}

/// Addresses one of the scene's persistent objects, or whatever mesh
/// currently occupies the mesh slot.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ObjectRef {
    Material,
    Mesh,
    AmbientLight,
    DirectionalLight,
    PointLight,
    DirectionalLightHelper,
    PointLightHelper,
}

pub struct Scene {
    pub ambient_light: AmbientLight,
    pub directional_light: DirectionalLight,
    pub directional_light_helper: LightHelper,
    pub point_light: PointLight,
    pub point_light_helper: LightHelper,
    pub material: Material,
    material_id: MaterialId,
    mesh: Option<Mesh>,
}

impl Scene {
    pub fn new(material: Material) -> Self {
        let mut directional_light = DirectionalLight::new(light::WHITE, 0.5);
        directional_light.position = Vec3::new(5.0, 5.0, 5.0);

        let mut point_light = PointLight::new(light::WHITE, 0.5);
        point_light.position = Vec3::new(1.0, -1.0, 1.0);

        Self {
            ambient_light: AmbientLight::new(light::WHITE, 0.5),
            directional_light,
            directional_light_helper: LightHelper::directional(1.0),
            point_light,
            point_light_helper: LightHelper::point(1.0),
            material,
            material_id: MaterialId(0),
            mesh: None,
        }
    }

    pub fn material_id(&self) -> MaterialId {
        self.material_id
    }

    pub fn resolve_material(&self, id: MaterialId) -> Option<&Material> {
        (id == self.material_id).then_some(&self.material)
    }

    pub fn mesh(&self) -> Option<&Mesh> {
        self.mesh.as_ref()
    }

    pub fn mesh_mut(&mut self) -> Option<&mut Mesh> {
        self.mesh.as_mut()
    }

    /// Places `mesh` in the slot, handing back any mesh that was still there.
    pub fn add_mesh(&mut self, mesh: Mesh) -> Option<Mesh> {
        self.mesh.replace(mesh)
    }

    pub fn remove_mesh(&mut self) -> Option<Mesh> {
        self.mesh.take()
    }

    pub fn meshes(&self) -> impl Iterator<Item = &Mesh> {
        self.mesh.iter()
    }

    pub fn object(&self, target: ObjectRef) -> Option<&dyn Properties> {
        let object: &dyn Properties = match target {
            ObjectRef::Material => &self.material,
            ObjectRef::Mesh => self.mesh()?,
            ObjectRef::AmbientLight => &self.ambient_light,
            ObjectRef::DirectionalLight => &self.directional_light,
            ObjectRef::PointLight => &self.point_light,
            ObjectRef::DirectionalLightHelper => &self.directional_light_helper,
            ObjectRef::PointLightHelper => &self.point_light_helper,
        };
        Some(object)
    }

    pub fn object_mut(&mut self, target: ObjectRef) -> Option<&mut dyn Properties> {
        let object: &mut dyn Properties = match target {
            ObjectRef::Material => &mut self.material,
            ObjectRef::Mesh => self.mesh_mut()?,
            ObjectRef::AmbientLight => &mut self.ambient_light,
            ObjectRef::DirectionalLight => &mut self.directional_light,
            ObjectRef::PointLight => &mut self.point_light,
            ObjectRef::DirectionalLightHelper => &mut self.directional_light_helper,
            ObjectRef::PointLightHelper => &mut self.point_light_helper,
        };
        Some(object)
    }
}
