pub mod camera;
pub mod gpu;
pub mod helpers;
pub mod mesh;
pub mod primitives;

pub use camera::{Camera, OrbitControls};
pub use gpu::GpuState;
