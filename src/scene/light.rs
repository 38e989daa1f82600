use glam::Vec3;

use crate::scene::{Properties, PropertyValue, get_vec3_property, set_vec3_property};

pub const WHITE: [f32; 3] = [1.0, 1.0, 1.0];

#[derive(Debug, Clone, PartialEq)]
pub struct AmbientLight {
    pub color: [f32; 3],
    pub intensity: f32,
}

impl AmbientLight {
    pub fn new(color: [f32; 3], intensity: f32) -> Self {
        Self { color, intensity }
    }
}

/// Parallel light shining from `position` towards `target`.
#[derive(Debug, Clone, PartialEq)]
pub struct DirectionalLight {
    pub color: [f32; 3],
    pub intensity: f32,
    pub position: Vec3,
    pub target: Vec3,
}

impl DirectionalLight {
    pub fn new(color: [f32; 3], intensity: f32) -> Self {
        Self {
            color,
            intensity,
            position: Vec3::Y,
            target: Vec3::ZERO,
        }
    }

    /// Direction the light travels in; falls back to straight down when the
    /// light sits on its target.
    pub fn direction(&self) -> Vec3 {
        let dir = self.target - self.position;
        if dir.length_squared() > f32::EPSILON {
            dir.normalize()
        } else {
            Vec3::NEG_Y
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct PointLight {
    pub color: [f32; 3],
    pub intensity: f32,
    pub position: Vec3,
    pub decay: f32,
}

impl PointLight {
    pub fn new(color: [f32; 3], intensity: f32) -> Self {
        Self {
            color,
            intensity,
            position: Vec3::ZERO,
            decay: 2.0,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum HelperKind {
    Directional,
    Point,
}

/// Debug visual that mirrors one positional light. Its lines are rebuilt from
/// the light every frame, so it never holds stale light state.
#[derive(Debug, Clone, PartialEq)]
pub struct LightHelper {
    pub kind: HelperKind,
    pub size: f32,
    pub visible: bool,
}

impl LightHelper {
    pub fn directional(size: f32) -> Self {
        Self {
            kind: HelperKind::Directional,
            size,
            visible: true,
        }
    }

    pub fn point(size: f32) -> Self {
        Self {
            kind: HelperKind::Point,
            size,
            visible: true,
        }
    }
}

impl Properties for AmbientLight {
    fn property(&self, name: &str) -> Option<PropertyValue> {
        match name {
            "intensity" => Some(PropertyValue::Float(self.intensity)),
            _ => None,
        }
    }

    fn set_property(&mut self, name: &str, value: PropertyValue) -> bool {
        match (name, value) {
            ("intensity", PropertyValue::Float(v)) => {
                self.intensity = v;
                true
            }
            _ => false,
        }
    }
}

impl Properties for DirectionalLight {
    fn property(&self, name: &str) -> Option<PropertyValue> {
        match name {
            "intensity" => Some(PropertyValue::Float(self.intensity)),
            _ => get_vec3_property(name, "position", self.position),
        }
    }

    fn set_property(&mut self, name: &str, value: PropertyValue) -> bool {
        match (name, value) {
            ("intensity", PropertyValue::Float(v)) => {
                self.intensity = v;
                true
            }
            _ => set_vec3_property(name, "position", &mut self.position, value),
        }
    }
}

impl Properties for PointLight {
    fn property(&self, name: &str) -> Option<PropertyValue> {
        match name {
            "intensity" => Some(PropertyValue::Float(self.intensity)),
            _ => get_vec3_property(name, "position", self.position),
        }
    }

    fn set_property(&mut self, name: &str, value: PropertyValue) -> bool {
        match (name, value) {
            ("intensity", PropertyValue::Float(v)) => {
                self.intensity = v;
                true
            }
            _ => set_vec3_property(name, "position", &mut self.position, value),
        }
    }
}

impl Properties for LightHelper {
    fn property(&self, name: &str) -> Option<PropertyValue> {
        match name {
            "visible" => Some(PropertyValue::Bool(self.visible)),
            _ => None,
        }
    }

    fn set_property(&mut self, name: &str, value: PropertyValue) -> bool {
        match (name, value) {
            ("visible", PropertyValue::Bool(v)) => {
                self.visible = v;
                true
            }
            _ => false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn directional_light_points_at_target() {
        let mut light = DirectionalLight::new(WHITE, 0.5);
        light.position = Vec3::new(0.0, 5.0, 0.0);
        assert_eq!(light.direction(), Vec3::NEG_Y);

        light.position = Vec3::ZERO;
        assert_eq!(light.direction(), Vec3::NEG_Y);
    }

    #[test]
    fn light_position_components_are_addressable() {
        let mut light = PointLight::new(WHITE, 0.5);
        assert!(light.set_property("position.y", PropertyValue::Float(-1.0)));
        assert_eq!(light.position, Vec3::new(0.0, -1.0, 0.0));
        assert_eq!(
            light.property("position.y"),
            Some(PropertyValue::Float(-1.0))
        );
    }

    #[test]
    fn mismatched_property_types_are_rejected() {
        let mut helper = LightHelper::point(1.0);
        assert!(!helper.set_property("visible", PropertyValue::Float(0.0)));
        assert!(helper.visible);

        let mut ambient = AmbientLight::new(WHITE, 0.5);
        assert!(!ambient.set_property("color", PropertyValue::Float(0.0)));
        assert_eq!(ambient.property("missing"), None);
    }
}
