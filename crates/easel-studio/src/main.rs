//! Demo host loop.
//!
//! Owns the window, surface, and device, and drives two scene objects
//! through the shared lifecycle: a grayscale-split filter computing over a
//! demo image, and a slowly rotating quad textured with the filter's
//! output. The host treats both uniformly through `SceneNode`.

use std::sync::Arc;
use std::time::Instant;

use anyhow::{Context, Result};
use winit::application::ApplicationHandler;
use winit::dpi::LogicalSize;
use winit::event::WindowEvent;
use winit::event_loop::{ActiveEventLoop, ControlFlow, EventLoop};
use winit::window::{Window, WindowId};

use easel_engine::assets::AssetLoader;
use easel_engine::device::{Gpu, GpuInit, SurfaceErrorAction};
use easel_engine::logging::{init_logging, LoggingConfig};
use easel_engine::scene::{
    GrayscaleSplitFilter, Pose, SceneNode, TextureSource, TexturedQuad,
};

const DEMO_IMAGE: &str = "images/inkwheel.png";

/// Quad corners in triangle-strip order, four floats per vertex (x, y, u, v).
const QUAD_VERTICES: [f32; 16] = [
    -0.8, -0.8, 0.0, 1.0, //
    0.8, -0.8, 1.0, 1.0, //
    -0.8, 0.8, 0.0, 0.0, //
    0.8, 0.8, 1.0, 0.0,
];

fn main() -> Result<()> {
    init_logging(LoggingConfig::default());

    let event_loop = EventLoop::new().context("failed to create winit EventLoop")?;
    event_loop.set_control_flow(ControlFlow::Poll);

    let mut app = Studio::default();
    event_loop
        .run_app(&mut app)
        .context("event loop terminated with error")?;
    Ok(())
}

#[derive(Default)]
struct Studio {
    scene: Option<Scene>,
}

struct Scene {
    window: Arc<Window>,
    gpu: Gpu,
    nodes: Vec<SceneNode>,
    started: Instant,
}

impl Scene {
    fn build(event_loop: &ActiveEventLoop) -> Result<Self> {
        let attrs = Window::default_attributes()
            .with_title("easel studio")
            .with_inner_size(LogicalSize::new(900.0, 600.0));
        let window = Arc::new(
            event_loop
                .create_window(attrs)
                .context("failed to create window")?,
        );

        let gpu = pollster::block_on(Gpu::new(Arc::clone(&window), GpuInit::default()))?;
        let ctx = gpu.device_context();
        let loader = AssetLoader::new(asset_root());

        // The filter is set up first so its output texture exists for the
        // quad to display.
        let mut filter = SceneNode::from(GrayscaleSplitFilter::new(
            ctx.clone(),
            loader.clone(),
            DEMO_IMAGE,
        ));
        pollster::block_on(filter.setup()).context("filter setup failed")?;

        let filtered = match &filter {
            SceneNode::GrayscaleSplit(f) => f.output_texture(),
            SceneNode::TexturedQuad(_) => None,
        }
        .context("filter produced no output texture")?;

        let mut quad = SceneNode::from(TexturedQuad::new(
            ctx,
            loader,
            QUAD_VERTICES.to_vec(),
            TextureSource::Shared(filtered),
            Some(Pose::identity()),
        )?);
        pollster::block_on(quad.setup()).context("quad setup failed")?;

        log::info!("scene ready: grayscale-split filter + textured quad");

        Ok(Self {
            window,
            gpu,
            nodes: vec![filter, quad],
            started: Instant::now(),
        })
    }

    /// Records and submits one frame. Returns `false` on a fatal surface
    /// error.
    fn redraw(&mut self) -> bool {
        let elapsed = self.started.elapsed().as_secs_f32();

        for node in &mut self.nodes {
            if let SceneNode::TexturedQuad(quad) = node {
                quad.set_pose(Pose::rotation_z(elapsed * 0.4));
            }
            if let Err(e) = node.update_geometry() {
                log::error!("updateGeometry failed: {e}");
            }
        }

        let mut frame = match self.gpu.begin_frame() {
            Ok(frame) => frame,
            Err(e) => {
                log::warn!("surface error: {e}");
                return match self.gpu.handle_surface_error(e) {
                    SurfaceErrorAction::Fatal => false,
                    SurfaceErrorAction::Reconfigured | SurfaceErrorAction::SkipFrame => {
                        self.window.request_redraw();
                        true
                    }
                };
            }
        };

        {
            let mut cpass = frame
                .encoder
                .begin_compute_pass(&wgpu::ComputePassDescriptor {
                    label: Some("easel filter pass"),
                    timestamp_writes: None,
                });
            for node in &mut self.nodes {
                if let Err(e) = node.compute(&mut cpass) {
                    log::error!("compute failed: {e}");
                }
            }
        }

        {
            let mut rpass = frame.encoder.begin_render_pass(&wgpu::RenderPassDescriptor {
                label: Some("easel scene pass"),
                color_attachments: &[Some(wgpu::RenderPassColorAttachment {
                    view: &frame.view,
                    resolve_target: None,
                    ops: wgpu::Operations {
                        load: wgpu::LoadOp::Clear(wgpu::Color {
                            r: 0.08,
                            g: 0.07,
                            b: 0.10,
                            a: 1.0,
                        }),
                        store: wgpu::StoreOp::Store,
                    },
                    depth_slice: None,
                })],
                depth_stencil_attachment: None,
                timestamp_writes: None,
                occlusion_query_set: None,
                multiview_mask: None,
            });
            for node in &mut self.nodes {
                if let Err(e) = node.render(&mut rpass) {
                    log::error!("render failed: {e}");
                }
            }
        }

        self.gpu.submit(frame);
        self.window.request_redraw();
        true
    }

    fn teardown(&mut self) {
        for node in &mut self.nodes {
            node.destroy();
        }
    }
}

impl ApplicationHandler for Studio {
    fn resumed(&mut self, event_loop: &ActiveEventLoop) {
        if self.scene.is_some() {
            return;
        }

        match Scene::build(event_loop) {
            Ok(scene) => {
                scene.window.request_redraw();
                self.scene = Some(scene);
            }
            Err(e) => {
                log::error!("failed to build scene: {e:#}");
                event_loop.exit();
            }
        }
    }

    fn window_event(
        &mut self,
        event_loop: &ActiveEventLoop,
        _window_id: WindowId,
        event: WindowEvent,
    ) {
        let Some(scene) = self.scene.as_mut() else {
            return;
        };

        match event {
            WindowEvent::CloseRequested => {
                scene.teardown();
                event_loop.exit();
            }
            WindowEvent::Resized(size) => {
                scene.gpu.resize(size);
            }
            WindowEvent::RedrawRequested => {
                if !scene.redraw() {
                    scene.teardown();
                    event_loop.exit();
                }
            }
            _ => {}
        }
    }
}

/// Crate-local assets when running via `cargo run`, the working directory
/// otherwise.
fn asset_root() -> String {
    let dev = concat!(env!("CARGO_MANIFEST_DIR"), "/assets");
    if std::path::Path::new(dev).is_dir() {
        dev.to_string()
    } else {
        "assets".to_string()
    }
}
