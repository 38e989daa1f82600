use crate::scene::{Mesh, ShapeKind, build_geometry};
use crate::storage::KeyValueStore;
use crate::viewer::ViewerState;

/// Storage key holding the name of the last built shape kind.
pub const OBJECT_TYPE_KEY: &str = "objectType";

/// Owns the lifecycle of the mesh in the scene's mesh slot: every rebuild
/// swaps in a brand new mesh built from the current parameters.
pub struct MeshController {
    store: Box<dyn KeyValueStore>,
    replacements: u64,
}

impl MeshController {
    pub fn new(store: Box<dyn KeyValueStore>) -> Self {
        Self {
            store,
            replacements: 0,
        }
    }

    /// Places the initial mesh without touching storage.
    pub fn attach_initial(&mut self, state: &mut ViewerState) {
        let geometry = build_geometry(state.params.kind, &state.params);
        let mesh = Mesh::new(geometry, state.scene.material_id());
        state.scene.add_mesh(mesh);
    }

    pub fn rebuild(&mut self, state: &mut ViewerState) {
        let previous = state.scene.remove_mesh();

        let kind = state.params.kind;
        let geometry = build_geometry(kind, &state.params);

        let mut mesh = Mesh::new(geometry, state.scene.material_id());
        if let Some(previous) = previous {
            mesh.transform = previous.transform;
        }

        self.replacements += 1;
        log::debug!(
            "rebuild #{}: {} mesh {:?}, {} vertices, {} triangles",
            self.replacements,
            kind,
            mesh.id(),
            mesh.geometry.mesh.vertex_count(),
            mesh.geometry.mesh.triangle_count()
        );

        state.scene.add_mesh(mesh);

        if let Err(err) = self.store.set(OBJECT_TYPE_KEY, kind.name()) {
            log::warn!("failed to persist {OBJECT_TYPE_KEY}: {err}");
        }
    }

    pub fn replacements(&self) -> u64 {
        self.replacements
    }

    /// Reads the persisted kind back into the parameters. Missing, unreadable
    /// or unknown values leave the parameters untouched.
    pub fn restore_kind(&self, state: &mut ViewerState) -> Option<ShapeKind> {
        let name = match self.store.get(OBJECT_TYPE_KEY) {
            Ok(Some(name)) => name,
            Ok(None) => return None,
            Err(err) => {
                log::warn!("failed to read {OBJECT_TYPE_KEY}: {err}");
                return None;
            }
        };

        match name.parse::<ShapeKind>() {
            Ok(kind) => {
                state.params.kind = kind;
                Some(kind)
            }
            Err(err) => {
                log::warn!("ignoring persisted {OBJECT_TYPE_KEY}: {err}");
                None
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    use crate::scene::shape::GeometryShape;
    use crate::storage::{MemoryStore, StorageError};

    fn setup() -> (MeshController, ViewerState, MemoryStore) {
        let store = MemoryStore::new();
        let mut controller = MeshController::new(Box::new(store.clone()));
        let mut state = ViewerState::new(1280, 720);
        controller.attach_initial(&mut state);
        (controller, state, store)
    }

    fn current_shape(state: &ViewerState) -> GeometryShape {
        state.scene.mesh().unwrap().geometry.shape
    }

    #[test]
    fn initial_mesh_is_not_persisted() {
        let (controller, state, store) = setup();
        assert_eq!(state.scene.meshes().count(), 1);
        assert_eq!(controller.replacements(), 0);
        assert_eq!(store.get(OBJECT_TYPE_KEY).unwrap(), None);
    }

    #[test]
    fn rebuild_persists_the_kind_name() {
        let (mut controller, mut state, store) = setup();
        state.params.kind = ShapeKind::Sphere;
        state.params.radius = 0.5;
        state.params.radial_segments = 32;
        state.params.height_segments = 16;

        controller.rebuild(&mut state);

        assert_eq!(store.get(OBJECT_TYPE_KEY).unwrap().as_deref(), Some("Sphere"));
        assert_eq!(
            current_shape(&state),
            GeometryShape::Sphere {
                radius: 0.5,
                width_segments: 32,
                height_segments: 16,
            }
        );
    }

    #[test]
    fn repeated_rebuilds_yield_distinct_equivalent_meshes() {
        let (mut controller, mut state, _) = setup();

        controller.rebuild(&mut state);
        let first = state.scene.mesh().map(|m| (m.id(), m.geometry.id(), m.geometry.shape)).unwrap();
        controller.rebuild(&mut state);
        let second = state.scene.mesh().map(|m| (m.id(), m.geometry.id(), m.geometry.shape)).unwrap();

        assert_ne!(first.0, second.0);
        assert_ne!(first.1, second.1);
        assert_eq!(first.2, second.2);
    }

    #[test]
    fn switching_kind_keeps_box_fields() {
        let (mut controller, mut state, _) = setup();
        state.params.width = 2.5;
        state.params.height = 0.5;
        state.params.depth = 4.0;
        state.params.height_segments = 7;
        controller.rebuild(&mut state);
        let original = current_shape(&state);

        state.params.kind = ShapeKind::Sphere;
        controller.rebuild(&mut state);
        assert_eq!(current_shape(&state).kind(), ShapeKind::Sphere);

        state.params.kind = ShapeKind::Box;
        controller.rebuild(&mut state);
        assert_eq!(current_shape(&state), original);
    }

    #[test]
    fn every_kind_switch_replaces_exactly_one_mesh() {
        let (mut controller, mut state, store) = setup();
        let sequence = [
            ShapeKind::Box,
            ShapeKind::Sphere,
            ShapeKind::Cone,
            ShapeKind::Cylinder,
            ShapeKind::Torus,
        ];

        let mut seen = HashSet::new();
        for kind in sequence {
            state.params.kind = kind;
            controller.rebuild(&mut state);

            assert_eq!(state.scene.meshes().count(), 1);
            let mesh = state.scene.mesh().unwrap();
            assert_eq!(mesh.geometry.kind(), kind);
            seen.insert(mesh.id());
        }

        assert_eq!(controller.replacements(), 5);
        assert_eq!(seen.len(), 5);
        assert_eq!(store.get(OBJECT_TYPE_KEY).unwrap().as_deref(), Some("Torus"));
    }

    #[test]
    fn rebuild_keeps_the_mesh_transform_and_material() {
        let (mut controller, mut state, _) = setup();
        if let Some(mesh) = state.scene.mesh_mut() {
            mesh.transform.position.x = 3.0;
        }

        state.params.kind = ShapeKind::Cone;
        controller.rebuild(&mut state);

        let mesh = state.scene.mesh().unwrap();
        assert_eq!(mesh.transform.position.x, 3.0);
        assert_eq!(mesh.material, state.scene.material_id());
    }

    #[test]
    fn restore_reads_back_a_known_kind() {
        let mut store = MemoryStore::new();
        store.set(OBJECT_TYPE_KEY, "Cylinder").unwrap();
        let controller = MeshController::new(Box::new(store));
        let mut state = ViewerState::new(800, 600);

        assert_eq!(controller.restore_kind(&mut state), Some(ShapeKind::Cylinder));
        assert_eq!(state.params.kind, ShapeKind::Cylinder);
    }

    #[test]
    fn restore_ignores_an_unknown_kind() {
        let mut store = MemoryStore::new();
        store.set(OBJECT_TYPE_KEY, "Teapot").unwrap();
        let controller = MeshController::new(Box::new(store));
        let mut state = ViewerState::new(800, 600);
        state.params.kind = ShapeKind::Cone;

        assert_eq!(controller.restore_kind(&mut state), None);
        assert_eq!(state.params.kind, ShapeKind::Cone);
    }

    struct FailingStore;

    impl KeyValueStore for FailingStore {
        fn get(&self, _key: &str) -> Result<Option<String>, StorageError> {
            Ok(None)
        }

        fn set(&mut self, _key: &str, _value: &str) -> Result<(), StorageError> {
            Err(StorageError::NotAnObject)
        }
    }

    #[test]
    fn storage_failure_does_not_abort_the_rebuild() {
        let mut controller = MeshController::new(Box::new(FailingStore));
        let mut state = ViewerState::new(800, 600);
        controller.attach_initial(&mut state);

        state.params.kind = ShapeKind::Torus;
        controller.rebuild(&mut state);

        assert_eq!(controller.replacements(), 1);
        assert_eq!(state.scene.mesh().unwrap().geometry.kind(), ShapeKind::Torus);
    }
}
