use std::sync::Arc;

use anyhow::Context as _;
use glam::Mat4;

use crate::renderer::camera::{Camera, CameraUniform};
use crate::renderer::helpers::helper_line_vertices;
use crate::scene::{GeometryId, Mesh, Scene};

const INITIAL_MESH_VERTICES: usize = 8_192;
const INITIAL_MESH_INDICES: usize = 49_152;
const INITIAL_HELPER_VERTICES: usize = 256;

const CLEAR_COLOR: wgpu::Color = wgpu::Color::BLACK;
const HELPER_COLOR: [f32; 4] = [1.0, 1.0, 0.6, 1.0];

#[repr(C)]
#[derive(Clone, Copy, bytemuck::Pod, bytemuck::Zeroable)]
pub struct SceneUniforms {
    pub model: [[f32; 4]; 4],
    pub normal_matrix: [[f32; 4]; 4],
    pub base_color: [f32; 4],
    pub material: [f32; 4],
    pub ambient: [f32; 4],
    pub dir_light_dir: [f32; 4],
    pub dir_light_color: [f32; 4],
    pub point_light_pos: [f32; 4],
    pub point_light_color: [f32; 4],
    pub helper_color: [f32; 4],
}

fn scaled(color: [f32; 3], intensity: f32) -> [f32; 4] {
    [color[0] * intensity, color[1] * intensity, color[2] * intensity, 1.0]
}

impl SceneUniforms {
    pub fn from_scene(scene: &Scene) -> Self {
        let model = scene.mesh().map_or(Mat4::IDENTITY, |mesh| mesh.transform.matrix());
        let normal_matrix = model.inverse().transpose();

        let material = scene
            .mesh()
            .and_then(|mesh| scene.resolve_material(mesh.material))
            .unwrap_or(&scene.material);
        let [r, g, b] = material.color;
        let dir = scene.directional_light.direction();
        let point = &scene.point_light;

        Self {
            model: model.to_cols_array_2d(),
            normal_matrix: normal_matrix.to_cols_array_2d(),
            base_color: [r, g, b, material.effective_opacity()],
            material: [material.roughness, material.metalness, 0.0, 0.0],
            ambient: scaled(scene.ambient_light.color, scene.ambient_light.intensity),
            dir_light_dir: dir.extend(0.0).to_array(),
            dir_light_color: scaled(scene.directional_light.color, scene.directional_light.intensity),
            point_light_pos: point.position.extend(point.decay).to_array(),
            point_light_color: scaled(point.color, point.intensity),
            helper_color: HELPER_COLOR,
        }
    }
}

fn create_buffer(device: &wgpu::Device, label: &str, size: usize, usage: wgpu::BufferUsages) -> wgpu::Buffer {
    device.create_buffer(&wgpu::BufferDescriptor {
        label: Some(label),
        size: size as u64,
        usage: usage | wgpu::BufferUsages::COPY_DST,
        mapped_at_creation: false,
    })
}

/// Replaces `buffer` with a larger one when `needed` bytes do not fit.
fn ensure_capacity(
    device: &wgpu::Device,
    buffer: &mut wgpu::Buffer,
    label: &str,
    needed: usize,
    usage: wgpu::BufferUsages,
) {
    if needed as u64 > buffer.size() {
        let size = needed.next_power_of_two();
        log::debug!("growing {label} to {size} bytes");
        *buffer = create_buffer(device, label, size, usage);
    }
}

pub struct MeshBuffers {
    pub position_buffer: wgpu::Buffer,
    pub normal_buffer: wgpu::Buffer,
    pub index_buffer: wgpu::Buffer,
    pub edge_buffer: wgpu::Buffer,
    pub index_count: u32,
    pub edge_count: u32,

    pub helper_buffer: wgpu::Buffer,
    pub helper_vertex_count: u32,

    uploaded: Option<GeometryId>,
}

impl MeshBuffers {
    pub fn new(device: &wgpu::Device) -> Self {
        let vertex = wgpu::BufferUsages::VERTEX;
        let index = wgpu::BufferUsages::INDEX;

        Self {
            position_buffer: create_buffer(device, "Mesh Position Buffer", INITIAL_MESH_VERTICES * 12, vertex),
            normal_buffer: create_buffer(device, "Mesh Normal Buffer", INITIAL_MESH_VERTICES * 12, vertex),
            index_buffer: create_buffer(device, "Mesh Index Buffer", INITIAL_MESH_INDICES * 4, index),
            edge_buffer: create_buffer(device, "Mesh Edge Buffer", INITIAL_MESH_INDICES * 8, index),
            index_count: 0,
            edge_count: 0,
            helper_buffer: create_buffer(device, "Helper Vertex Buffer", INITIAL_HELPER_VERTICES * 12, vertex),
            helper_vertex_count: 0,
            uploaded: None,
        }
    }

    /// Uploads the slot mesh when its geometry differs from the last upload.
    pub fn sync_mesh(&mut self, device: &wgpu::Device, queue: &wgpu::Queue, mesh: Option<&Mesh>) {
        let Some(mesh) = mesh else {
            self.index_count = 0;
            self.edge_count = 0;
            self.uploaded = None;
            return;
        };

        let geometry = &mesh.geometry;
        if self.uploaded == Some(geometry.id()) {
            return;
        }

        let data = &geometry.mesh;
        let edges = data.edge_indices();
        let vertex = wgpu::BufferUsages::VERTEX;
        let index = wgpu::BufferUsages::INDEX;

        ensure_capacity(device, &mut self.position_buffer, "Mesh Position Buffer", data.vertices.len() * 4, vertex);
        ensure_capacity(device, &mut self.normal_buffer, "Mesh Normal Buffer", data.normals.len() * 4, vertex);
        ensure_capacity(device, &mut self.index_buffer, "Mesh Index Buffer", data.indices.len() * 4, index);
        ensure_capacity(device, &mut self.edge_buffer, "Mesh Edge Buffer", edges.len() * 4, index);

        queue.write_buffer(&self.position_buffer, 0, bytemuck::cast_slice(&data.vertices));
        queue.write_buffer(&self.normal_buffer, 0, bytemuck::cast_slice(&data.normals));
        queue.write_buffer(&self.index_buffer, 0, bytemuck::cast_slice(&data.indices));
        queue.write_buffer(&self.edge_buffer, 0, bytemuck::cast_slice(&edges));

        self.index_count = data.indices.len() as u32;
        self.edge_count = edges.len() as u32;
        self.uploaded = Some(geometry.id());

        log::debug!(
            "uploaded {} geometry: {} indices, {} edge indices",
            geometry.kind(),
            self.index_count,
            self.edge_count
        );
    }

    pub fn upload_helpers(&mut self, device: &wgpu::Device, queue: &wgpu::Queue, vertices: &[f32]) {
        ensure_capacity(
            device,
            &mut self.helper_buffer,
            "Helper Vertex Buffer",
            vertices.len() * 4,
            wgpu::BufferUsages::VERTEX,
        );
        if !vertices.is_empty() {
            queue.write_buffer(&self.helper_buffer, 0, bytemuck::cast_slice(vertices));
        }
        self.helper_vertex_count = (vertices.len() / 3) as u32;
    }
}

pub struct GpuState {
    pub surface: wgpu::Surface<'static>,
    pub device: wgpu::Device,
    pub queue: wgpu::Queue,
    pub config: wgpu::SurfaceConfiguration,
    pub size: winit::dpi::PhysicalSize<u32>,

    pub pipeline_mesh: wgpu::RenderPipeline,
    pub pipeline_wireframe: wgpu::RenderPipeline,
    pub pipeline_helper: wgpu::RenderPipeline,

    pub camera_buffer: wgpu::Buffer,
    pub scene_buffer: wgpu::Buffer,
    pub scene_bind_group: wgpu::BindGroup,

    pub mesh_buffers: MeshBuffers,
    pub wireframe: bool,

    pub depth_texture: wgpu::TextureView,
}

fn mesh_position_layout() -> wgpu::VertexBufferLayout<'static> {
    wgpu::VertexBufferLayout {
        array_stride: 12,
        step_mode: wgpu::VertexStepMode::Vertex,
        attributes: &[wgpu::VertexAttribute {
            offset: 0,
            shader_location: 0,
            format: wgpu::VertexFormat::Float32x3,
        }],
    }
}

fn mesh_normal_layout() -> wgpu::VertexBufferLayout<'static> {
    wgpu::VertexBufferLayout {
        array_stride: 12,
        step_mode: wgpu::VertexStepMode::Vertex,
        attributes: &[wgpu::VertexAttribute {
            offset: 0,
            shader_location: 1,
            format: wgpu::VertexFormat::Float32x3,
        }],
    }
}

fn depth_state() -> wgpu::DepthStencilState {
    wgpu::DepthStencilState {
        format: wgpu::TextureFormat::Depth32Float,
        depth_write_enabled: true,
        depth_compare: wgpu::CompareFunction::Less,
        stencil: wgpu::StencilState::default(),
        bias: wgpu::DepthBiasState::default(),
    }
}

struct PipelineDesc<'a> {
    label: &'a str,
    vs: &'a str,
    fs: &'a str,
    buffers: &'a [wgpu::VertexBufferLayout<'a>],
    topology: wgpu::PrimitiveTopology,
}

fn create_pipeline(
    device: &wgpu::Device,
    layout: &wgpu::PipelineLayout,
    shader: &wgpu::ShaderModule,
    format: wgpu::TextureFormat,
    desc: PipelineDesc<'_>,
) -> wgpu::RenderPipeline {
    device.create_render_pipeline(&wgpu::RenderPipelineDescriptor {
        label: Some(desc.label),
        layout: Some(layout),
        vertex: wgpu::VertexState {
            module: shader,
            entry_point: Some(desc.vs),
            buffers: desc.buffers,
            compilation_options: Default::default(),
        },
        fragment: Some(wgpu::FragmentState {
            module: shader,
            entry_point: Some(desc.fs),
            targets: &[Some(wgpu::ColorTargetState {
                format,
                blend: Some(wgpu::BlendState::ALPHA_BLENDING),
                write_mask: wgpu::ColorWrites::ALL,
            })],
            compilation_options: Default::default(),
        }),
        primitive: wgpu::PrimitiveState {
            topology: desc.topology,
            cull_mode: None,
            ..Default::default()
        },
        depth_stencil: Some(depth_state()),
        multisample: wgpu::MultisampleState::default(),
        multiview: None,
        cache: None,
    })
}

impl GpuState {
    pub async fn new(window: Arc<winit::window::Window>, vsync: bool) -> anyhow::Result<Self> {
        let size = window.inner_size();

        let instance = wgpu::Instance::new(wgpu::InstanceDescriptor {
            backends: wgpu::Backends::all(),
            ..Default::default()
        });

        let surface = instance
            .create_surface(window)
            .context("failed to create window surface")?;

        let adapter = instance
            .request_adapter(&wgpu::RequestAdapterOptions {
                power_preference: wgpu::PowerPreference::HighPerformance,
                compatible_surface: Some(&surface),
                force_fallback_adapter: false,
            })
            .await
            .context("no compatible GPU adapter found")?;

        let info = adapter.get_info();
        log::info!("using adapter {} ({:?})", info.name, info.backend);

        let (device, queue) = adapter
            .request_device(
                &wgpu::DeviceDescriptor {
                    label: None,
                    required_features: wgpu::Features::empty(),
                    required_limits: wgpu::Limits::default(),
                    memory_hints: wgpu::MemoryHints::Performance,
                },
                None,
            )
            .await
            .context("failed to open GPU device")?;

        let surface_caps = surface.get_capabilities(&adapter);
        let surface_format = surface_caps
            .formats
            .iter()
            .find(|f| f.is_srgb())
            .or_else(|| surface_caps.formats.first())
            .copied()
            .context("surface reports no texture formats")?;
        let alpha_mode = surface_caps
            .alpha_modes
            .first()
            .copied()
            .unwrap_or(wgpu::CompositeAlphaMode::Auto);

        let config = wgpu::SurfaceConfiguration {
            usage: wgpu::TextureUsages::RENDER_ATTACHMENT,
            format: surface_format,
            width: size.width.max(1),
            height: size.height.max(1),
            present_mode: present_mode(vsync),
            alpha_mode,
            view_formats: vec![],
            desired_maximum_frame_latency: 2,
        };
        surface.configure(&device, &config);

        let shader = device.create_shader_module(wgpu::ShaderModuleDescriptor {
            label: Some("Shader"),
            source: wgpu::ShaderSource::Wgsl(include_str!("shaders.wgsl").into()),
        });

        let camera_buffer = create_buffer(
            &device,
            "Camera Buffer",
            std::mem::size_of::<CameraUniform>(),
            wgpu::BufferUsages::UNIFORM,
        );
        let scene_buffer = create_buffer(
            &device,
            "Scene Buffer",
            std::mem::size_of::<SceneUniforms>(),
            wgpu::BufferUsages::UNIFORM,
        );

        let uniform_entry = |binding| wgpu::BindGroupLayoutEntry {
            binding,
            visibility: wgpu::ShaderStages::VERTEX | wgpu::ShaderStages::FRAGMENT,
            ty: wgpu::BindingType::Buffer {
                ty: wgpu::BufferBindingType::Uniform,
                has_dynamic_offset: false,
                min_binding_size: None,
            },
            count: None,
        };

        let scene_bind_group_layout = device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
            label: Some("Scene Bind Group Layout"),
            entries: &[uniform_entry(0), uniform_entry(1)],
        });

        let scene_bind_group = device.create_bind_group(&wgpu::BindGroupDescriptor {
            label: Some("Scene Bind Group"),
            layout: &scene_bind_group_layout,
            entries: &[
                wgpu::BindGroupEntry {
                    binding: 0,
                    resource: camera_buffer.as_entire_binding(),
                },
                wgpu::BindGroupEntry {
                    binding: 1,
                    resource: scene_buffer.as_entire_binding(),
                },
            ],
        });

        let pipeline_layout = device.create_pipeline_layout(&wgpu::PipelineLayoutDescriptor {
            label: Some("Scene Pipeline Layout"),
            bind_group_layouts: &[&scene_bind_group_layout],
            push_constant_ranges: &[],
        });

        let mesh_layouts = [mesh_position_layout(), mesh_normal_layout()];
        let helper_layouts = [mesh_position_layout()];

        let pipeline_mesh = create_pipeline(
            &device,
            &pipeline_layout,
            &shader,
            config.format,
            PipelineDesc {
                label: "Mesh Render Pipeline",
                vs: "vs_mesh",
                fs: "fs_mesh",
                buffers: &mesh_layouts,
                topology: wgpu::PrimitiveTopology::TriangleList,
            },
        );

        let pipeline_wireframe = create_pipeline(
            &device,
            &pipeline_layout,
            &shader,
            config.format,
            PipelineDesc {
                label: "Wireframe Render Pipeline",
                vs: "vs_mesh",
                fs: "fs_mesh",
                buffers: &mesh_layouts,
                topology: wgpu::PrimitiveTopology::LineList,
            },
        );

        let pipeline_helper = create_pipeline(
            &device,
            &pipeline_layout,
            &shader,
            config.format,
            PipelineDesc {
                label: "Helper Render Pipeline",
                vs: "vs_helper",
                fs: "fs_helper",
                buffers: &helper_layouts,
                topology: wgpu::PrimitiveTopology::LineList,
            },
        );

        let mesh_buffers = MeshBuffers::new(&device);
        let depth_texture = Self::create_depth_texture(&device, &config);

        Ok(Self {
            surface,
            device,
            queue,
            config,
            size,
            pipeline_mesh,
            pipeline_wireframe,
            pipeline_helper,
            camera_buffer,
            scene_buffer,
            scene_bind_group,
            mesh_buffers,
            wireframe: false,
            depth_texture,
        })
    }

    fn create_depth_texture(device: &wgpu::Device, config: &wgpu::SurfaceConfiguration) -> wgpu::TextureView {
        let size = wgpu::Extent3d {
            width: config.width.max(1),
            height: config.height.max(1),
            depth_or_array_layers: 1,
        };

        let texture = device.create_texture(&wgpu::TextureDescriptor {
            label: Some("Depth Texture"),
            size,
            mip_level_count: 1,
            sample_count: 1,
            dimension: wgpu::TextureDimension::D2,
            format: wgpu::TextureFormat::Depth32Float,
            usage: wgpu::TextureUsages::RENDER_ATTACHMENT | wgpu::TextureUsages::TEXTURE_BINDING,
            view_formats: &[],
        });

        texture.create_view(&wgpu::TextureViewDescriptor::default())
    }

    pub fn resize(&mut self, new_size: winit::dpi::PhysicalSize<u32>) {
        if new_size.width > 0 && new_size.height > 0 {
            self.size = new_size;
            self.config.width = new_size.width;
            self.config.height = new_size.height;
            self.surface.configure(&self.device, &self.config);
            self.depth_texture = Self::create_depth_texture(&self.device, &self.config);
        }
    }

    pub fn set_vsync(&mut self, enabled: bool) {
        self.config.present_mode = present_mode(enabled);
        self.surface.configure(&self.device, &self.config);
    }

    /// Pushes the committed scene state to the GPU for the next frame.
    pub fn prepare_scene(&mut self, scene: &Scene, camera: &Camera) {
        let camera_uniform = CameraUniform::from_camera(camera);
        self.queue
            .write_buffer(&self.camera_buffer, 0, bytemuck::cast_slice(&[camera_uniform]));

        let scene_uniform = SceneUniforms::from_scene(scene);
        self.queue
            .write_buffer(&self.scene_buffer, 0, bytemuck::cast_slice(&[scene_uniform]));

        self.mesh_buffers.sync_mesh(&self.device, &self.queue, scene.mesh());
        self.wireframe = scene.material.wireframe;

        let helpers = helper_line_vertices(scene);
        self.mesh_buffers.upload_helpers(&self.device, &self.queue, &helpers);
    }

    pub fn render_scene(&self, view: &wgpu::TextureView, encoder: &mut wgpu::CommandEncoder) {
        let mut render_pass = encoder.begin_render_pass(&wgpu::RenderPassDescriptor {
            label: Some("Scene Render Pass"),
            color_attachments: &[Some(wgpu::RenderPassColorAttachment {
                view,
                resolve_target: None,
                ops: wgpu::Operations {
                    load: wgpu::LoadOp::Clear(CLEAR_COLOR),
                    store: wgpu::StoreOp::Store,
                },
            })],
            depth_stencil_attachment: Some(wgpu::RenderPassDepthStencilAttachment {
                view: &self.depth_texture,
                depth_ops: Some(wgpu::Operations {
                    load: wgpu::LoadOp::Clear(1.0),
                    store: wgpu::StoreOp::Store,
                }),
                stencil_ops: None,
            }),
            timestamp_writes: None,
            occlusion_query_set: None,
        });

        render_pass.set_bind_group(0, &self.scene_bind_group, &[]);

        let buffers = &self.mesh_buffers;
        if buffers.helper_vertex_count > 0 {
            render_pass.set_pipeline(&self.pipeline_helper);
            render_pass.set_vertex_buffer(0, buffers.helper_buffer.slice(..));
            render_pass.draw(0..buffers.helper_vertex_count, 0..1);
        }

        let (pipeline, index_buffer, count) = if self.wireframe {
            (&self.pipeline_wireframe, &buffers.edge_buffer, buffers.edge_count)
        } else {
            (&self.pipeline_mesh, &buffers.index_buffer, buffers.index_count)
        };

        if count > 0 {
            render_pass.set_pipeline(pipeline);
            render_pass.set_vertex_buffer(0, buffers.position_buffer.slice(..));
            render_pass.set_vertex_buffer(1, buffers.normal_buffer.slice(..));
            render_pass.set_index_buffer(index_buffer.slice(..), wgpu::IndexFormat::Uint32);
            render_pass.draw_indexed(0..count, 0, 0..1);
        }
    }
}

fn present_mode(vsync: bool) -> wgpu::PresentMode {
    if vsync {
        wgpu::PresentMode::AutoVsync
    } else {
        wgpu::PresentMode::AutoNoVsync
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::scene::{Material, ShapeKind, ShapeParameters, build_geometry};
    use glam::Vec3;

    fn scene() -> Scene {
        Scene::new(Material::standard([0.0, 1.0, 0.0]))
    }

    #[test]
    fn uniforms_track_material_and_lights() {
        let mut scene = scene();
        scene.material.opacity = 0.4;
        scene.ambient_light.intensity = 0.25;

        let uniforms = SceneUniforms::from_scene(&scene);
        assert_eq!(uniforms.base_color, [0.0, 1.0, 0.0, 1.0]);
        assert_eq!(uniforms.ambient, [0.25, 0.25, 0.25, 1.0]);
        assert_eq!(uniforms.point_light_pos, [1.0, -1.0, 1.0, 2.0]);

        scene.material.transparent = true;
        let uniforms = SceneUniforms::from_scene(&scene);
        assert_eq!(uniforms.base_color[3], 0.4);
    }

    #[test]
    fn model_matrix_follows_the_slot_mesh() {
        let mut scene = scene();
        assert_eq!(SceneUniforms::from_scene(&scene).model, Mat4::IDENTITY.to_cols_array_2d());

        let material = scene.material_id();
        let mut mesh = Mesh::new(build_geometry(ShapeKind::Box, &ShapeParameters::default()), material);
        mesh.transform.position = Vec3::new(2.0, 0.0, 0.0);
        scene.add_mesh(mesh);

        let model = SceneUniforms::from_scene(&scene).model;
        assert_eq!(model[3], [2.0, 0.0, 0.0, 1.0]);
    }

    #[test]
    fn scene_uniforms_match_the_shader_layout() {
        assert_eq!(std::mem::size_of::<SceneUniforms>(), 2 * 64 + 8 * 16);
        assert_eq!(std::mem::size_of::<CameraUniform>(), 80);
    }
}
