use std::f32::consts::TAU;

use crate::scene::{ObjectRef, PropertyValue, ShapeField, ShapeKind, ShapeParameters, UnknownShapeKind};
use crate::viewer::{Viewer, ViewerState};

pub trait Binding<T> {
    fn get(&self, state: &ViewerState) -> Option<T>;
    fn set(&self, state: &mut ViewerState, value: T) -> bool;
}

pub struct RecordField<T> {
    get: fn(&ShapeParameters) -> T,
    set: fn(&mut ShapeParameters, T),
}

impl<T> RecordField<T> {
    pub fn new(get: fn(&ShapeParameters) -> T, set: fn(&mut ShapeParameters, T)) -> Self {
        Self { get, set }
    }
}

impl<T> Binding<T> for RecordField<T> {
    fn get(&self, state: &ViewerState) -> Option<T> {
        Some((self.get)(&state.params))
    }

    fn set(&self, state: &mut ViewerState, value: T) -> bool {
        (self.set)(&mut state.params, value);
        true
    }
}

/// A named property of a scene object. `ObjectRef::Mesh` resolves to whatever
/// mesh occupies the slot at the time of access.
pub struct ObjectProperty {
    pub object: ObjectRef,
    pub name: &'static str,
}

impl ObjectProperty {
    pub fn new(object: ObjectRef, name: &'static str) -> Self {
        Self { object, name }
    }

    fn write(&self, state: &mut ViewerState, value: PropertyValue) -> bool {
        state
            .scene
            .object_mut(self.object)
            .is_some_and(|object| object.set_property(self.name, value))
    }
}

impl Binding<f32> for ObjectProperty {
    fn get(&self, state: &ViewerState) -> Option<f32> {
        match state.scene.object(self.object)?.property(self.name)? {
            PropertyValue::Float(v) => Some(v),
            PropertyValue::Bool(_) => None,
        }
    }

    fn set(&self, state: &mut ViewerState, value: f32) -> bool {
        self.write(state, PropertyValue::Float(value))
    }
}

impl Binding<bool> for ObjectProperty {
    fn get(&self, state: &ViewerState) -> Option<bool> {
        match state.scene.object(self.object)?.property(self.name)? {
            PropertyValue::Bool(v) => Some(v),
            PropertyValue::Float(_) => None,
        }
    }

    fn set(&self, state: &mut ViewerState, value: bool) -> bool {
        self.write(state, PropertyValue::Bool(value))
    }
}

pub enum ControlKind {
    Number {
        binding: Box<dyn Binding<f32>>,
        min: f32,
        max: f32,
        step: Option<f32>,
    },
    Toggle {
        binding: Box<dyn Binding<bool>>,
    },
    Choice {
        binding: Box<dyn Binding<ShapeKind>>,
        options: &'static [ShapeKind],
    },
}

pub struct Control {
    pub label: &'static str,
    pub kind: ControlKind,
    pub on_change: Option<fn(&mut Viewer)>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ControlId(usize);

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum EditValue {
    Number(f32),
    Toggle(bool),
    Choice(ShapeKind),
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Edit {
    pub control: ControlId,
    pub value: EditValue,
}

pub struct Folder {
    pub title: &'static str,
    pub controls: Vec<ControlId>,
    pub folders: Vec<Folder>,
}

impl Folder {
    fn new(title: &'static str) -> Self {
        Self {
            title,
            controls: Vec::new(),
            folders: Vec::new(),
        }
    }
}

pub fn constrain(value: f32, min: f32, max: f32, step: Option<f32>) -> f32 {
    let snapped = match step {
        Some(step) if step > 0.0 => (value / step).round() * step,
        _ => value,
    };
    snapped.clamp(min, max)
}

pub struct Panel {
    controls: Vec<Control>,
    pub root: Folder,
}

fn record(get: fn(&ShapeParameters) -> f32, set: fn(&mut ShapeParameters, f32)) -> Box<dyn Binding<f32>> {
    Box::new(RecordField::new(get, set))
}

fn property(object: ObjectRef, name: &'static str) -> Box<ObjectProperty> {
    Box::new(ObjectProperty::new(object, name))
}

impl Panel {
    pub fn settings() -> Self {
        let mut panel = Self {
            controls: Vec::new(),
            root: Folder::new("Settings"),
        };

        let geometry = panel.geometry_folder();
        let material = panel.material_folder();
        let mesh = panel.mesh_folder();
        let lights = panel.lights_folder();
        panel.root.folders = vec![geometry, material, mesh, lights];

        panel
    }

    fn add(&mut self, folder: &mut Folder, control: Control) {
        let id = ControlId(self.controls.len());
        self.controls.push(control);
        folder.controls.push(id);
    }

    fn number(
        &mut self,
        folder: &mut Folder,
        label: &'static str,
        binding: Box<dyn Binding<f32>>,
        (min, max): (f32, f32),
        step: Option<f32>,
    ) {
        let control = Control {
            label,
            kind: ControlKind::Number {
                binding,
                min,
                max,
                step,
            },
            on_change: None,
        };
        self.add(folder, control);
    }

    fn toggle(&mut self, folder: &mut Folder, label: &'static str, binding: Box<dyn Binding<bool>>) {
        let control = Control {
            label,
            kind: ControlKind::Toggle { binding },
            on_change: None,
        };
        self.add(folder, control);
    }

    fn geometry_folder(&mut self) -> Folder {
        let mut folder = Folder::new("Geometry");

        let kind = Control {
            label: "type",
            kind: ControlKind::Choice {
                binding: Box::new(RecordField::<ShapeKind>::new(|p| p.kind, |p, v| p.kind = v)),
                options: &ShapeKind::ALL,
            },
            on_change: Some(Viewer::rebuild_geometry),
        };
        self.add(&mut folder, kind);

        let dims: [(ShapeField, Box<dyn Binding<f32>>, (f32, f32), Option<f32>); 7] = [
            (ShapeField::Width, record(|p| p.width, |p, v| p.width = v), (0.1, 10.0), None),
            (ShapeField::Height, record(|p| p.height, |p, v| p.height = v), (0.1, 10.0), None),
            (ShapeField::Depth, record(|p| p.depth, |p, v| p.depth = v), (0.1, 10.0), None),
            (ShapeField::Radius, record(|p| p.radius, |p, v| p.radius = v), (0.1, 10.0), None),
            (
                ShapeField::RadialSegments,
                record(|p| p.radial_segments as f32, |p, v| p.radial_segments = v.round() as u32),
                (3.0, 64.0),
                Some(1.0),
            ),
            (
                ShapeField::HeightSegments,
                record(|p| p.height_segments as f32, |p, v| p.height_segments = v.round() as u32),
                (3.0, 64.0),
                Some(1.0),
            ),
            (
                ShapeField::TubeRadius,
                record(|p| p.tube_radius, |p, v| p.tube_radius = v),
                (0.01, 1.0),
                None,
            ),
        ];

        for (field, binding, (min, max), step) in dims {
            let control = Control {
                label: field.label(),
                kind: ControlKind::Number {
                    binding,
                    min,
                    max,
                    step,
                },
                on_change: Some(Viewer::rebuild_geometry),
            };
            self.add(&mut folder, control);
        }

        folder
    }

    fn material_folder(&mut self) -> Folder {
        let mut folder = Folder::new("Material");
        let unit = (0.0, 1.0);

        self.toggle(&mut folder, "wireframe", property(ObjectRef::Material, "wireframe"));
        self.number(&mut folder, "roughness", property(ObjectRef::Material, "roughness"), unit, Some(0.01));
        self.number(&mut folder, "metalness", property(ObjectRef::Material, "metalness"), unit, Some(0.01));
        self.number(&mut folder, "opacity", property(ObjectRef::Material, "opacity"), unit, Some(0.01));
        self.toggle(&mut folder, "transparent", property(ObjectRef::Material, "transparent"));

        folder
    }

    fn mesh_folder(&mut self) -> Folder {
        let mut folder = Folder::new("Mesh");
        let mesh = ObjectRef::Mesh;

        self.number(&mut folder, "x position", property(mesh, "position.x"), (-10.0, 10.0), Some(0.1));
        self.number(&mut folder, "y position", property(mesh, "position.y"), (-10.0, 10.0), Some(0.1));
        self.number(&mut folder, "z position", property(mesh, "position.z"), (-10.0, 10.0), Some(0.1));
        self.number(&mut folder, "x rotation", property(mesh, "rotation.x"), (0.0, TAU), Some(0.01));
        self.number(&mut folder, "y rotation", property(mesh, "rotation.y"), (0.0, TAU), Some(0.01));
        self.number(&mut folder, "z rotation", property(mesh, "rotation.z"), (0.0, TAU), Some(0.01));
        self.number(&mut folder, "x scale", property(mesh, "scale.x"), (0.1, 5.0), Some(0.1));
        self.number(&mut folder, "y scale", property(mesh, "scale.y"), (0.1, 5.0), Some(0.1));
        self.number(&mut folder, "z scale", property(mesh, "scale.z"), (0.1, 5.0), Some(0.1));

        folder
    }

    fn light_folder(&mut self, title: &'static str, light: ObjectRef, positioned: bool) -> Folder {
        let mut folder = Folder::new(title);

        self.number(&mut folder, "intensity", property(light, "intensity"), (0.0, 1.0), Some(0.01));
        if positioned {
            self.number(&mut folder, "x position", property(light, "position.x"), (-10.0, 10.0), Some(0.1));
            self.number(&mut folder, "y position", property(light, "position.y"), (-10.0, 10.0), Some(0.1));
            self.number(&mut folder, "z position", property(light, "position.z"), (-10.0, 10.0), Some(0.1));
        }

        folder
    }

    fn lights_folder(&mut self) -> Folder {
        let mut folder = Folder::new("Lights");

        let ambient = self.light_folder("Ambient Light", ObjectRef::AmbientLight, false);
        let directional = self.light_folder("Directional Light", ObjectRef::DirectionalLight, true);
        let point = self.light_folder("Point Light", ObjectRef::PointLight, true);

        let mut helpers = Folder::new("Light Helpers");
        let mut directional_helper = Folder::new("Directional Light Helper");
        self.toggle(
            &mut directional_helper,
            "Visible",
            property(ObjectRef::DirectionalLightHelper, "visible"),
        );
        let mut point_helper = Folder::new("Point Light Helper");
        self.toggle(&mut point_helper, "Visible", property(ObjectRef::PointLightHelper, "visible"));
        helpers.folders = vec![directional_helper, point_helper];

        folder.folders = vec![ambient, directional, point, helpers];
        folder
    }

    pub fn control(&self, id: ControlId) -> Option<&Control> {
        self.controls.get(id.0)
    }

    /// Looks a control up by folder titles followed by its label, e.g.
    /// `["Lights", "Point Light", "intensity"]`.
    pub fn find(&self, path: &[&str]) -> Option<ControlId> {
        let (label, folders) = path.split_last()?;
        let mut folder = &self.root;
        for title in folders {
            folder = folder.folders.iter().find(|f| f.title == *title)?;
        }
        folder
            .controls
            .iter()
            .copied()
            .find(|id| self.controls[id.0].label == *label)
    }

    pub fn value(&self, id: ControlId, state: &ViewerState) -> Option<EditValue> {
        let value = match &self.control(id)?.kind {
            ControlKind::Number { binding, .. } => EditValue::Number(binding.get(state)?),
            ControlKind::Toggle { binding } => EditValue::Toggle(binding.get(state)?),
            ControlKind::Choice { binding, .. } => EditValue::Choice(binding.get(state)?),
        };
        Some(value)
    }

    /// Returns whether the value was written.
    pub fn apply(&self, edit: Edit, viewer: &mut Viewer) -> bool {
        let Some(control) = self.control(edit.control) else {
            return false;
        };

        let state = &mut viewer.state;
        let written = match (&control.kind, edit.value) {
            (ControlKind::Number { binding, min, max, step }, EditValue::Number(v)) => {
                binding.set(state, constrain(v, *min, *max, *step))
            }
            (ControlKind::Toggle { binding }, EditValue::Toggle(v)) => binding.set(state, v),
            (ControlKind::Choice { binding, options }, EditValue::Choice(v)) => {
                options.contains(&v) && binding.set(state, v)
            }
            _ => false,
        };

        if !written {
            log::warn!("edit of {:?} rejected: {:?}", control.label, edit.value);
            return false;
        }
        log::debug!("{} <- {:?}", control.label, edit.value);

        if let Some(on_change) = control.on_change {
            on_change(viewer);
        }
        true
    }

    pub fn set_by_name(&self, id: ControlId, name: &str, viewer: &mut Viewer) -> Result<bool, UnknownShapeKind> {
        let kind = name.parse::<ShapeKind>().inspect_err(|err| {
            log::warn!("ignoring selection: {err}");
        })?;
        Ok(self.apply(
            Edit {
                control: id,
                value: EditValue::Choice(kind),
            },
            viewer,
        ))
    }
}
