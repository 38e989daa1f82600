use std::sync::Arc;
use std::time::Instant;

use anyhow::Context as _;
use clap::Parser;
use winit::{
    application::ApplicationHandler,
    dpi::PhysicalSize,
    event::{ElementState, MouseButton, WindowEvent},
    event_loop::{ActiveEventLoop, ControlFlow, EventLoop},
    keyboard::{KeyCode, PhysicalKey},
    window::{Window, WindowId},
};

use glam::Vec2;

mod cli;
mod renderer;
mod scene;
mod storage;
mod ui;
mod viewer;

use cli::Cli;
use renderer::GpuState;
use storage::{JsonFileStore, KeyValueStore, MemoryStore};
use ui::{Panel, PanelStatus, UiActions, apply_theme, draw_help_overlay, draw_side_panel};
use viewer::Viewer;

#[derive(Default)]
struct InputState {
    orbiting: bool,
    cursor: Option<Vec2>,
}

struct App {
    window: Option<Arc<Window>>,
    gpu: Option<GpuState>,
    egui_state: Option<egui_winit::State>,
    egui_renderer: Option<egui_wgpu::Renderer>,
    egui_ctx: egui::Context,

    viewer: Viewer,
    panel: Panel,
    input: InputState,

    initial_size: PhysicalSize<u32>,
    vsync: bool,

    frame_count: u32,
    fps_timer: Instant,
    fps: f32,

    fatal: Option<anyhow::Error>,
}

impl App {
    fn new(viewer: Viewer, panel: Panel, cli: &Cli) -> Self {
        Self {
            window: None,
            gpu: None,
            egui_state: None,
            egui_renderer: None,
            egui_ctx: egui::Context::default(),

            viewer,
            panel,
            input: InputState::default(),

            initial_size: PhysicalSize::new(cli.width.max(1), cli.height.max(1)),
            vsync: cli.vsync(),

            frame_count: 0,
            fps_timer: Instant::now(),
            fps: 0.0,

            fatal: None,
        }
    }

    fn init_gpu(&mut self, window: Arc<Window>) -> anyhow::Result<()> {
        let gpu = pollster::block_on(GpuState::new(window.clone(), self.vsync))?;

        let egui_state = egui_winit::State::new(
            self.egui_ctx.clone(),
            self.egui_ctx.viewport_id(),
            &window,
            Some(window.scale_factor() as f32),
            None,
            Some(2048),
        );

        let egui_renderer = egui_wgpu::Renderer::new(&gpu.device, gpu.config.format, None, 1, false);

        apply_theme(&self.egui_ctx);

        let size = window.inner_size();
        self.viewer.resize(size.width, size.height);

        self.window = Some(window);
        self.gpu = Some(gpu);
        self.egui_state = Some(egui_state);
        self.egui_renderer = Some(egui_renderer);
        Ok(())
    }

    fn fail(&mut self, event_loop: &ActiveEventLoop, err: anyhow::Error) {
        log::error!("{err:#}");
        self.fatal = Some(err);
        event_loop.exit();
    }

    fn tick_fps(&mut self) {
        self.frame_count += 1;
        let elapsed = self.fps_timer.elapsed().as_secs_f32();
        if elapsed >= 1.0 {
            self.fps = self.frame_count as f32 / elapsed;
            self.frame_count = 0;
            self.fps_timer = Instant::now();
        }
    }

    fn render(&mut self, event_loop: &ActiveEventLoop) {
        self.tick_fps();

        let (Some(window), Some(egui_state)) = (&self.window, &mut self.egui_state) else {
            return;
        };

        let raw_input = egui_state.take_egui_input(window);

        let status = PanelStatus {
            replacements: self.viewer.replacements(),
            vsync: self.vsync,
            fps: self.fps,
        };

        let mut ui_actions = UiActions::default();
        let panel = &self.panel;
        let state = &self.viewer.state;

        let full_output = self.egui_ctx.run(raw_input, |ctx| {
            ui_actions = draw_side_panel(ctx, panel, state, &status);
            draw_help_overlay(ctx, state);
        });

        self.handle_ui_actions(ui_actions);
        self.viewer.frame();

        let Some(gpu) = &mut self.gpu else { return };
        let Some(window) = &self.window else { return };
        let Some(egui_state) = &mut self.egui_state else {
            return;
        };
        let Some(egui_renderer) = &mut self.egui_renderer else {
            return;
        };

        egui_state.handle_platform_output(window, full_output.platform_output);

        let output = match gpu.surface.get_current_texture() {
            Ok(t) => t,
            Err(wgpu::SurfaceError::Lost | wgpu::SurfaceError::Outdated) => {
                gpu.resize(gpu.size);
                return;
            }
            Err(wgpu::SurfaceError::OutOfMemory) => {
                self.fail(event_loop, anyhow::anyhow!("out of GPU memory"));
                return;
            }
            Err(err) => {
                log::warn!("skipping frame: {err}");
                return;
            }
        };

        let view = output
            .texture
            .create_view(&wgpu::TextureViewDescriptor::default());

        gpu.prepare_scene(&self.viewer.state.scene, &self.viewer.state.camera);

        let paint_jobs = self
            .egui_ctx
            .tessellate(full_output.shapes, full_output.pixels_per_point);

        let screen_descriptor = egui_wgpu::ScreenDescriptor {
            size_in_pixels: [gpu.config.width, gpu.config.height],
            pixels_per_point: full_output.pixels_per_point,
        };

        for (id, delta) in full_output.textures_delta.set {
            egui_renderer.update_texture(&gpu.device, &gpu.queue, id, &delta);
        }

        let mut encoder = gpu
            .device
            .create_command_encoder(&wgpu::CommandEncoderDescriptor {
                label: Some("Main Encoder"),
            });

        egui_renderer.update_buffers(
            &gpu.device,
            &gpu.queue,
            &mut encoder,
            &paint_jobs,
            &screen_descriptor,
        );

        gpu.render_scene(&view, &mut encoder);

        {
            let render_pass = encoder.begin_render_pass(&wgpu::RenderPassDescriptor {
                label: Some("egui Render Pass"),
                color_attachments: &[Some(wgpu::RenderPassColorAttachment {
                    view: &view,
                    resolve_target: None,
                    ops: wgpu::Operations {
                        load: wgpu::LoadOp::Load,
                        store: wgpu::StoreOp::Store,
                    },
                })],
                depth_stencil_attachment: None,
                timestamp_writes: None,
                occlusion_query_set: None,
            });

            let mut render_pass = render_pass.forget_lifetime();
            egui_renderer.render(&mut render_pass, &paint_jobs, &screen_descriptor);
        }

        for id in full_output.textures_delta.free {
            egui_renderer.free_texture(&id);
        }

        gpu.queue.submit(std::iter::once(encoder.finish()));
        output.present();

        window.request_redraw();
    }

    fn handle_ui_actions(&mut self, actions: UiActions) {
        for edit in actions.edits {
            self.panel.apply(edit, &mut self.viewer);
        }

        if let Some(enabled) = actions.set_vsync {
            self.vsync = enabled;
            if let Some(gpu) = &mut self.gpu {
                gpu.set_vsync(enabled);
            }
        }

        if let Some(enabled) = actions.set_auto_rotate {
            self.viewer.state.controls.auto_rotate = enabled;
        }
    }

    fn handle_key(&mut self, key: KeyCode, pressed: bool) {
        if !pressed {
            return;
        }

        if key == KeyCode::Space {
            let controls = &mut self.viewer.state.controls;
            controls.auto_rotate = !controls.auto_rotate;
        }
    }

    fn set_orbiting(&mut self, orbiting: bool) {
        self.input.orbiting = orbiting;
        self.viewer.state.controls.set_dragging(orbiting);
    }
}

impl ApplicationHandler for App {
    fn resumed(&mut self, event_loop: &ActiveEventLoop) {
        if self.window.is_some() {
            return;
        }

        let window_attrs = Window::default_attributes()
            .with_title("Primitive Viewer")
            .with_inner_size(self.initial_size);

        let result = event_loop
            .create_window(window_attrs)
            .context("failed to create window")
            .and_then(|window| self.init_gpu(Arc::new(window)));

        if let Err(err) = result {
            self.fail(event_loop, err);
        }
    }

    fn window_event(&mut self, event_loop: &ActiveEventLoop, _id: WindowId, event: WindowEvent) {
        let released = matches!(
            event,
            WindowEvent::MouseInput {
                state: ElementState::Released,
                ..
            }
        );

        if let Some(egui_state) = &mut self.egui_state {
            if let Some(window) = &self.window {
                let response = egui_state.on_window_event(window, &event);
                if response.consumed && !released {
                    return;
                }
            }
        }

        match event {
            WindowEvent::CloseRequested => {
                event_loop.exit();
            }

            WindowEvent::Resized(size) => {
                if let Some(gpu) = &mut self.gpu {
                    gpu.resize(size);
                }
                self.viewer.resize(size.width, size.height);
            }

            WindowEvent::KeyboardInput { event, .. } => {
                if let PhysicalKey::Code(key) = event.physical_key {
                    self.handle_key(key, event.state == ElementState::Pressed);
                }
            }

            WindowEvent::MouseInput {
                button: MouseButton::Left,
                state,
                ..
            } => {
                self.set_orbiting(state == ElementState::Pressed);
            }

            WindowEvent::CursorMoved { position, .. } => {
                let cursor = Vec2::new(position.x as f32, position.y as f32);
                if let Some(last) = self.input.cursor {
                    if self.input.orbiting {
                        let height = self.viewer.state.viewport.height as f32;
                        self.viewer.state.controls.drag(cursor - last, height);
                    }
                }
                self.input.cursor = Some(cursor);
            }

            WindowEvent::CursorLeft { .. } => {
                self.input.cursor = None;
            }

            WindowEvent::MouseWheel { delta, .. } => {
                let scroll = match delta {
                    winit::event::MouseScrollDelta::LineDelta(_, y) => y,
                    winit::event::MouseScrollDelta::PixelDelta(pos) => pos.y as f32 / 50.0,
                };
                self.viewer.state.controls.zoom(scroll);
            }

            WindowEvent::RedrawRequested => {
                self.render(event_loop);
            }

            _ => {}
        }
    }

    fn about_to_wait(&mut self, _event_loop: &ActiveEventLoop) {
        if let Some(window) = &self.window {
            window.request_redraw();
        }
    }
}

fn open_store(cli: &Cli) -> anyhow::Result<Box<dyn KeyValueStore>> {
    if cli.no_persist {
        log::info!("persistence disabled, using in-memory storage");
        return Ok(Box::new(MemoryStore::new()));
    }

    let store = JsonFileStore::open(&cli.storage)
        .with_context(|| format!("failed to open storage file {}", cli.storage.display()))?;
    log::info!("storage file: {}", store.path().display());
    Ok(Box::new(store))
}

fn main() -> anyhow::Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let cli = Cli::parse();
    let store = open_store(&cli)?;

    let mut viewer = if cli.restore {
        Viewer::restore(store, cli.width, cli.height)
    } else {
        Viewer::new(store, cli.width, cli.height)
    };
    if cli.no_auto_rotate {
        viewer.state.controls.auto_rotate = false;
    }

    let panel = Panel::settings();
    if let Some(name) = &cli.shape {
        if let Some(control) = panel.find(&["Geometry", "type"]) {
            match panel.set_by_name(control, name, &mut viewer) {
                Ok(true) => log::info!("starting with shape {name}"),
                Ok(false) => log::warn!("shape {name} was not applied"),
                // already logged by the panel
                Err(_) => {}
            }
        }
    }

    let event_loop = EventLoop::new().context("failed to create event loop")?;
    event_loop.set_control_flow(ControlFlow::Poll);

    let mut app = App::new(viewer, panel, &cli);
    event_loop.run_app(&mut app).context("event loop failed")?;

    match app.fatal.take() {
        Some(err) => Err(err),
        None => Ok(()),
    }
}
