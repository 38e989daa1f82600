use crate::renderer::{Camera, OrbitControls};
use crate::scene::{Material, MeshController, Scene, ShapeParameters};
use crate::storage::KeyValueStore;

const MATERIAL_COLOR: [f32; 3] = [0.0, 1.0, 0.0];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Viewport {
    pub width: u32,
    pub height: u32,
}

impl Viewport {
    pub fn size(&self) -> (u32, u32) {
        (self.width, self.height)
    }
}

/// Everything the panel edits and the renderer draws.
pub struct ViewerState {
    pub params: ShapeParameters,
    pub scene: Scene,
    pub camera: Camera,
    pub controls: OrbitControls,
    pub viewport: Viewport,
}

impl ViewerState {
    pub fn new(width: u32, height: u32) -> Self {
        let mut state = Self {
            params: ShapeParameters::default(),
            scene: Scene::new(Material::standard(MATERIAL_COLOR)),
            camera: Camera::default(),
            controls: OrbitControls::new(true, true),
            viewport: Viewport {
                width: 1,
                height: 1,
            },
        };
        state.resize(width, height);
        state
    }

    /// Zero-sized notifications (minimised window) are ignored.
    pub fn resize(&mut self, width: u32, height: u32) {
        if width == 0 || height == 0 {
            return;
        }
        self.viewport = Viewport { width, height };
        self.camera.set_aspect(width as f32, height as f32);
    }
}

pub struct Viewer {
    pub state: ViewerState,
    mesh_controller: MeshController,
}

impl Viewer {
    pub fn new(store: Box<dyn KeyValueStore>, width: u32, height: u32) -> Self {
        Self::build(store, width, height, false)
    }

    /// Like [`Viewer::new`], but starts from the persisted shape kind when
    /// the store holds a known one.
    pub fn restore(store: Box<dyn KeyValueStore>, width: u32, height: u32) -> Self {
        Self::build(store, width, height, true)
    }

    fn build(store: Box<dyn KeyValueStore>, width: u32, height: u32, restore: bool) -> Self {
        let mut state = ViewerState::new(width, height);
        let mut mesh_controller = MeshController::new(store);

        if restore {
            if let Some(kind) = mesh_controller.restore_kind(&mut state) {
                log::info!("restored shape kind {kind}");
            }
        }
        mesh_controller.attach_initial(&mut state);

        Self {
            state,
            mesh_controller,
        }
    }

    pub fn rebuild_geometry(&mut self) {
        self.mesh_controller.rebuild(&mut self.state);
    }

    pub fn replacements(&self) -> u64 {
        self.mesh_controller.replacements()
    }

    pub fn resize(&mut self, width: u32, height: u32) {
        self.state.resize(width, height);
    }

    /// Advances the orbit controls by one frame.
    pub fn frame(&mut self) -> bool {
        let state = &mut self.state;
        state.controls.update(&mut state.camera)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::scene::ShapeKind;
    use crate::scene::controller::OBJECT_TYPE_KEY;
    use crate::scene::shape::GeometryShape;
    use crate::storage::MemoryStore;

    #[test]
    fn resize_updates_aspect_and_viewport() {
        let mut state = ViewerState::new(1280, 720);
        assert_eq!(state.camera.aspect, 1280.0 / 720.0);

        state.resize(800, 600);
        assert_eq!(state.camera.aspect, 800.0 / 600.0);
        assert_eq!(state.viewport.size(), (800, 600));
    }

    #[test]
    fn zero_sized_resize_is_ignored() {
        let mut state = ViewerState::new(800, 600);
        state.resize(0, 600);
        state.resize(800, 0);
        assert_eq!(state.viewport.size(), (800, 600));
        assert_eq!(state.camera.aspect, 800.0 / 600.0);
    }

    #[test]
    fn initial_load_shows_the_default_box() {
        let store = MemoryStore::new();
        let viewer = Viewer::new(Box::new(store.clone()), 1280, 720);

        let mesh = viewer.state.scene.mesh().unwrap();
        assert_eq!(
            mesh.geometry.shape,
            GeometryShape::Box {
                width: 1.0,
                height: 1.0,
                depth: 1.0,
                width_segments: 16,
            }
        );
        assert_eq!(viewer.state.scene.material.color, [0.0, 1.0, 0.0]);
        assert_eq!(viewer.replacements(), 0);
        assert_eq!(store.get(OBJECT_TYPE_KEY).unwrap(), None);
    }

    #[test]
    fn restore_starts_from_the_persisted_kind() {
        let mut store = MemoryStore::new();
        store.set(OBJECT_TYPE_KEY, "Torus").unwrap();

        let viewer = Viewer::restore(Box::new(store), 1280, 720);
        assert_eq!(viewer.state.params.kind, ShapeKind::Torus);
        assert_eq!(viewer.state.scene.mesh().unwrap().geometry.kind(), ShapeKind::Torus);
        assert_eq!(viewer.replacements(), 0);
    }

    #[test]
    fn new_ignores_the_persisted_kind() {
        let mut store = MemoryStore::new();
        store.set(OBJECT_TYPE_KEY, "Torus").unwrap();

        let viewer = Viewer::new(Box::new(store), 1280, 720);
        assert_eq!(viewer.state.params.kind, ShapeKind::Box);
    }

    #[test]
    fn frames_keep_the_camera_orbiting() {
        let mut viewer = Viewer::new(Box::new(MemoryStore::new()), 1280, 720);
        let start = viewer.state.camera.position;
        for _ in 0..10 {
            assert!(viewer.frame());
        }
        assert_ne!(viewer.state.camera.position, start);
    }
}
