use std::f32::consts::{PI, TAU};

use glam::{Mat4, Vec2, Vec3};

const EPS: f32 = 1e-6;
const MOVE_EPS: f32 = 1e-10;

pub struct Camera {
    pub position: Vec3,
    pub target: Vec3,

    pub fov: f32,
    pub aspect: f32,
    pub near: f32,
    pub far: f32,
}

impl Default for Camera {
    fn default() -> Self {
        Self {
            position: Vec3::new(0.0, 0.0, 5.0),
            target: Vec3::ZERO,

            fov: 75.0_f32.to_radians(),
            aspect: 16.0 / 9.0,
            near: 0.1,
            far: 1000.0,
        }
    }
}

impl Camera {
    pub fn view_matrix(&self) -> Mat4 {
        Mat4::look_at_rh(self.position, self.target, Vec3::Y)
    }

    pub fn projection_matrix(&self) -> Mat4 {
        Mat4::perspective_rh(self.fov, self.aspect, self.near, self.far)
    }

    pub fn view_projection_matrix(&self) -> Mat4 {
        self.projection_matrix() * self.view_matrix()
    }

    pub fn set_aspect(&mut self, width: f32, height: f32) {
        self.aspect = width / height;
    }
}

#[repr(C)]
#[derive(Clone, Copy, bytemuck::Pod, bytemuck::Zeroable)]
pub struct CameraUniform {
    pub view_proj: [[f32; 4]; 4],
    pub camera_pos: [f32; 3],
    pub _padding: f32,
}

impl CameraUniform {
    pub fn from_camera(camera: &Camera) -> Self {
        Self {
            view_proj: camera.view_projection_matrix().to_cols_array_2d(),
            camera_pos: camera.position.to_array(),
            _padding: 0.0,
        }
    }
}

/// Orbits the camera around `target` in spherical coordinates. Input only
/// queues deltas; `update` applies them once per frame.
pub struct OrbitControls {
    pub target: Vec3,

    pub enable_damping: bool,
    pub damping_factor: f32,

    pub auto_rotate: bool,
    /// 2.0 is one orbit per 30 seconds at 60 fps.
    pub auto_rotate_speed: f32,

    pub rotate_speed: f32,
    pub zoom_speed: f32,
    pub min_distance: f32,
    pub max_distance: f32,

    delta_theta: f32,
    delta_phi: f32,
    scale: f32,
    dragging: bool,
}

impl Default for OrbitControls {
    fn default() -> Self {
        Self {
            target: Vec3::ZERO,

            enable_damping: false,
            damping_factor: 0.05,

            auto_rotate: false,
            auto_rotate_speed: 2.0,

            rotate_speed: 1.0,
            zoom_speed: 1.0,
            min_distance: 0.0,
            max_distance: f32::INFINITY,

            delta_theta: 0.0,
            delta_phi: 0.0,
            scale: 1.0,
            dragging: false,
        }
    }
}

impl OrbitControls {
    pub fn new(enable_damping: bool, auto_rotate: bool) -> Self {
        Self {
            enable_damping,
            auto_rotate,
            ..Self::default()
        }
    }

    pub fn rotate_left(&mut self, angle: f32) {
        self.delta_theta -= angle;
    }

    pub fn rotate_up(&mut self, angle: f32) {
        self.delta_phi -= angle;
    }

    pub fn set_dragging(&mut self, dragging: bool) {
        self.dragging = dragging;
    }

    /// Pointer drag in pixels; a drag across the full viewport height turns a
    /// full circle.
    pub fn drag(&mut self, delta: Vec2, viewport_height: f32) {
        if viewport_height <= 0.0 {
            return;
        }
        self.rotate_left(TAU * delta.x / viewport_height * self.rotate_speed);
        self.rotate_up(TAU * delta.y / viewport_height * self.rotate_speed);
    }

    /// Positive scroll moves towards the target.
    pub fn zoom(&mut self, scroll: f32) {
        if scroll == 0.0 {
            return;
        }
        let step = 0.95_f32.powf(self.zoom_speed);
        if scroll > 0.0 {
            self.scale *= step;
        } else {
            self.scale /= step;
        }
    }

    fn auto_rotation_angle(&self) -> f32 {
        TAU / 60.0 / 60.0 * self.auto_rotate_speed
    }

    /// Applies queued motion to `camera`. Returns whether the camera moved.
    pub fn update(&mut self, camera: &mut Camera) -> bool {
        let offset = camera.position - self.target;

        let mut radius = offset.length();
        let mut theta = offset.x.atan2(offset.z);
        let mut phi = if radius > 0.0 {
            (offset.y / radius).clamp(-1.0, 1.0).acos()
        } else {
            0.0
        };

        if self.auto_rotate && !self.dragging {
            self.rotate_left(self.auto_rotation_angle());
        }

        if self.enable_damping {
            theta += self.delta_theta * self.damping_factor;
            phi += self.delta_phi * self.damping_factor;
        } else {
            theta += self.delta_theta;
            phi += self.delta_phi;
        }

        phi = phi.clamp(EPS, PI - EPS);
        radius = (radius * self.scale).clamp(self.min_distance, self.max_distance);

        let sin_phi = phi.sin();
        let position = self.target
            + Vec3::new(
                radius * sin_phi * theta.sin(),
                radius * phi.cos(),
                radius * sin_phi * theta.cos(),
            );

        if self.enable_damping {
            self.delta_theta *= 1.0 - self.damping_factor;
            self.delta_phi *= 1.0 - self.damping_factor;
        } else {
            self.delta_theta = 0.0;
            self.delta_phi = 0.0;
        }
        self.scale = 1.0;

        let moved = position.distance_squared(camera.position) > MOVE_EPS;
        camera.position = position;
        camera.target = self.target;
        moved
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn damped() -> OrbitControls {
        OrbitControls::new(true, false)
    }

    #[test]
    fn constructor_keeps_default_tuning() {
        let controls = OrbitControls::new(true, true);
        assert!(controls.enable_damping);
        assert!(controls.auto_rotate);
        assert_eq!(controls.damping_factor, 0.05);
        assert_eq!(controls.auto_rotate_speed, 2.0);
        assert_eq!(controls.scale, 1.0);
    }

    #[test]
    fn idle_controls_leave_the_camera_alone() {
        let mut camera = Camera::default();
        let mut controls = OrbitControls::default();
        assert!(!controls.update(&mut camera));
        assert!((camera.position - Vec3::new(0.0, 0.0, 5.0)).length() < 1e-4);
    }

    #[test]
    fn auto_rotation_orbits_at_constant_distance() {
        let mut camera = Camera::default();
        let mut controls = OrbitControls {
            auto_rotate: true,
            ..damped()
        };

        for _ in 0..120 {
            assert!(controls.update(&mut camera));
        }

        assert!((camera.position.length() - 5.0).abs() < 1e-3);
        assert!(camera.position.y.abs() < 1e-3);
        assert!(camera.position.x < 0.0);
    }

    #[test]
    fn damped_rotation_settles_on_the_requested_angle() {
        let mut camera = Camera::default();
        let mut controls = damped();
        controls.rotate_left(0.5);

        controls.update(&mut camera);
        let after_one = camera.position.x;
        for _ in 0..600 {
            controls.update(&mut camera);
        }

        assert!(after_one.abs() < 5.0 * 0.5_f32.sin());
        assert!((camera.position.x - 5.0 * (-0.5_f32).sin()).abs() < 1e-2);
        assert!(!controls.update(&mut camera));
    }

    #[test]
    fn polar_angle_stays_off_the_poles() {
        let mut camera = Camera::default();
        let mut controls = OrbitControls::default();
        controls.rotate_up(10.0);
        controls.update(&mut camera);

        assert!(camera.position.y > 4.99);
        assert!(camera.position.x.abs() < 1e-3);
        assert!(camera.position.z > 0.0);

        controls.rotate_up(-10.0);
        controls.update(&mut camera);
        assert!(camera.position.y < -4.99);
    }

    #[test]
    fn zoom_is_clamped_to_the_distance_range() {
        let mut camera = Camera::default();
        let mut controls = OrbitControls {
            min_distance: 4.0,
            max_distance: 6.0,
            ..Default::default()
        };

        for _ in 0..50 {
            controls.zoom(1.0);
            controls.update(&mut camera);
        }
        assert!((camera.position.length() - 4.0).abs() < 1e-4);

        for _ in 0..50 {
            controls.zoom(-1.0);
            controls.update(&mut camera);
        }
        assert!((camera.position.length() - 6.0).abs() < 1e-4);
    }

    #[test]
    fn aspect_follows_the_viewport() {
        let mut camera = Camera::default();
        camera.set_aspect(800.0, 600.0);
        assert_eq!(camera.aspect, 800.0 / 600.0);
    }
}
