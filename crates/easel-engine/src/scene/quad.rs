use std::sync::Arc;

use crate::assets::AssetLoader;
use crate::device::DeviceContext;
use crate::error::EngineError;

use super::lifecycle::{Lifecycle, Stage};
use super::pipeline::{self, BindingKind, BindingSlot, FRAGMENT_ENTRY, VERTEX_ENTRY};
use super::pose::Pose;
use super::resources::Slot;

/// Shader locators, resolved by the asset loader. The posed variant
/// declares the pose uniform at binding 0; the choice between the two is
/// fixed at construction so the shader's binding declarations always mirror
/// the bind group exactly.
pub const QUAD_SHADER: &str = "shaders/quad_textured.wgsl";
pub const QUAD_POSED_SHADER: &str = "shaders/quad_textured_posed.wgsl";

const FLOATS_PER_VERTEX: usize = 4; // x, y, u, v

/// Where a quad's texture comes from.
pub enum TextureSource {
    /// Fetch and decode the image at this locator; the quad owns the
    /// resulting texture.
    Locator(String),
    /// Sample a texture owned elsewhere (e.g. a filter's output). The
    /// owner must outlive this quad's rendering.
    Shared(wgpu::Texture),
}

/// A 2D quad with a UV-mapped texture and an optional pose transform.
///
/// Vertex data is a flat f32 slice, four floats per vertex (x, y, u, v),
/// validated at construction. Setup follows the object lifecycle:
/// `create_geometry` → `create_shaders` → `create_render_pipeline`, then
/// `render` each frame. The compute half of the contract is a no-op.
pub struct TexturedQuad {
    ctx: DeviceContext,
    loader: AssetLoader,
    vertices: Vec<f32>,
    vertex_count: u32,
    source: TextureSource,
    pose: Option<Pose>,
    lifecycle: Lifecycle,
    shader_text: Option<Arc<str>>,
    res: QuadResources,
}

/// Every GPU handle the quad owns, torn down together on destroy.
#[derive(Default)]
struct QuadResources {
    vertex_buffer: Slot<wgpu::Buffer>,
    pose_buffer: Slot<wgpu::Buffer>,
    texture: Slot<wgpu::Texture>,
    texture_view: Slot<wgpu::TextureView>,
    sampler: Slot<wgpu::Sampler>,
    shader_module: Slot<wgpu::ShaderModule>,
    bind_group: Slot<wgpu::BindGroup>,
    pipeline: Slot<wgpu::RenderPipeline>,
}

impl QuadResources {
    fn release_all(&mut self) {
        self.pipeline.release();
        self.bind_group.release();
        self.shader_module.release();
        self.sampler.release();
        self.texture_view.release();
        self.texture.release();
        self.pose_buffer.release();
        self.vertex_buffer.release();
    }
}

impl TexturedQuad {
    /// Rejects vertex data that is not a whole, non-zero number of
    /// (x, y, u, v) tuples.
    pub fn new(
        ctx: DeviceContext,
        loader: AssetLoader,
        vertices: Vec<f32>,
        source: TextureSource,
        pose: Option<Pose>,
    ) -> Result<Self, EngineError> {
        let vertex_count = validate_vertices(&vertices)?;

        Ok(Self {
            ctx,
            loader,
            vertices,
            vertex_count,
            source,
            pose,
            lifecycle: Lifecycle::new(),
            shader_text: None,
            res: QuadResources::default(),
        })
    }

    pub fn stage(&self) -> Stage {
        self.lifecycle.stage()
    }

    /// Draw call size: one vertex per four floats.
    pub fn vertex_count(&self) -> u32 {
        self.vertex_count
    }

    pub fn pose(&self) -> Option<&Pose> {
        self.pose.as_ref()
    }

    /// Replaces the CPU-side pose; takes effect on the next
    /// `update_geometry`. Ignored for quads constructed without a pose.
    pub fn set_pose(&mut self, pose: Pose) {
        if self.pose.is_some() {
            self.pose = Some(pose);
        }
    }

    /// Bind-group arrangement for group 0, conditioned on pose presence.
    pub fn binding_plan(posed: bool) -> &'static [BindingSlot] {
        const POSED: &[BindingSlot] = &[
            BindingSlot {
                binding: 0,
                kind: BindingKind::UniformBuffer,
                visibility: wgpu::ShaderStages::VERTEX,
            },
            BindingSlot {
                binding: 1,
                kind: BindingKind::SampledTexture,
                visibility: wgpu::ShaderStages::FRAGMENT,
            },
            BindingSlot {
                binding: 2,
                kind: BindingKind::FilteringSampler,
                visibility: wgpu::ShaderStages::FRAGMENT,
            },
        ];
        const UNPOSED: &[BindingSlot] = &[
            BindingSlot {
                binding: 0,
                kind: BindingKind::SampledTexture,
                visibility: wgpu::ShaderStages::FRAGMENT,
            },
            BindingSlot {
                binding: 1,
                kind: BindingKind::FilteringSampler,
                visibility: wgpu::ShaderStages::FRAGMENT,
            },
        ];

        if posed { POSED } else { UNPOSED }
    }

    /// Shader fetched for this quad, selected once by pose presence.
    pub fn shader_locator(posed: bool) -> &'static str {
        if posed { QUAD_POSED_SHADER } else { QUAD_SHADER }
    }

    fn vertex_layout() -> wgpu::VertexBufferLayout<'static> {
        const ATTRS: [wgpu::VertexAttribute; 2] =
            wgpu::vertex_attr_array![0 => Float32x2, 1 => Float32x2];

        wgpu::VertexBufferLayout {
            array_stride: (FLOATS_PER_VERTEX * std::mem::size_of::<f32>()) as u64,
            step_mode: wgpu::VertexStepMode::Vertex,
            attributes: &ATTRS,
        }
    }

    /// Uploads vertices (and the pose, if any), then fetches, decodes, and
    /// uploads the texture. The texture is fully uploaded before this
    /// returns, so a later `render` never samples a half-written image.
    pub async fn create_geometry(&mut self) -> Result<(), EngineError> {
        self.lifecycle.begin(Stage::GeometryReady, "createGeometry")?;

        let device = self.ctx.device();
        let queue = self.ctx.queue();

        let vertex_buffer = device.create_buffer(&wgpu::BufferDescriptor {
            label: Some("easel quad vertices"),
            size: std::mem::size_of_val(self.vertices.as_slice()) as u64,
            usage: wgpu::BufferUsages::VERTEX | wgpu::BufferUsages::COPY_DST,
            mapped_at_creation: false,
        });
        queue.write_buffer(&vertex_buffer, 0, bytemuck::cast_slice(&self.vertices));
        self.res.vertex_buffer.fill(vertex_buffer);

        if let Some(pose) = self.pose.as_ref() {
            let pose_buffer = device.create_buffer(&wgpu::BufferDescriptor {
                label: Some("easel quad pose"),
                size: pose.as_bytes().len() as u64,
                usage: wgpu::BufferUsages::UNIFORM | wgpu::BufferUsages::COPY_DST,
                mapped_at_creation: false,
            });
            queue.write_buffer(&pose_buffer, 0, pose.as_bytes());
            self.res.pose_buffer.fill(pose_buffer);
        }

        self.load_texture().await?;

        self.res.sampler.fill(self.ctx.device().create_sampler(
            &wgpu::SamplerDescriptor {
                label: Some("easel quad sampler"),
                mag_filter: wgpu::FilterMode::Linear,
                min_filter: wgpu::FilterMode::Linear,
                ..Default::default()
            },
        ));

        self.lifecycle.advance(Stage::GeometryReady);
        Ok(())
    }

    async fn load_texture(&mut self) -> Result<(), EngineError> {
        match &self.source {
            TextureSource::Locator(locator) => {
                let locator = locator.clone();
                let bitmap = self.loader.load_bitmap(&locator).await?;

                let texture = self.ctx.device().create_texture(&wgpu::TextureDescriptor {
                    label: Some("easel quad texture"),
                    size: wgpu::Extent3d {
                        width: bitmap.width(),
                        height: bitmap.height(),
                        depth_or_array_layers: 1,
                    },
                    mip_level_count: 1,
                    sample_count: 1,
                    dimension: wgpu::TextureDimension::D2,
                    format: wgpu::TextureFormat::Rgba8UnormSrgb,
                    usage: wgpu::TextureUsages::TEXTURE_BINDING
                        | wgpu::TextureUsages::COPY_DST
                        | wgpu::TextureUsages::RENDER_ATTACHMENT,
                    view_formats: &[],
                });

                self.ctx.queue().write_texture(
                    wgpu::TexelCopyTextureInfo {
                        texture: &texture,
                        mip_level: 0,
                        origin: wgpu::Origin3d::ZERO,
                        aspect: wgpu::TextureAspect::All,
                    },
                    bitmap.pixels(),
                    wgpu::TexelCopyBufferLayout {
                        offset: 0,
                        bytes_per_row: Some(bitmap.bytes_per_row()),
                        rows_per_image: Some(bitmap.height()),
                    },
                    wgpu::Extent3d {
                        width: bitmap.width(),
                        height: bitmap.height(),
                        depth_or_array_layers: 1,
                    },
                );

                self.res
                    .texture_view
                    .fill(texture.create_view(&wgpu::TextureViewDescriptor::default()));
                self.res.texture.fill(texture);
            }
            TextureSource::Shared(texture) => {
                // Not owned: only the view goes into the resource set, so
                // destroy never frees the sharer's texture.
                self.res
                    .texture_view
                    .fill(texture.create_view(&wgpu::TextureViewDescriptor::default()));
            }
        }
        Ok(())
    }

    /// Fetches and compiles the pose-matched quad shader.
    pub async fn create_shaders(&mut self) -> Result<(), EngineError> {
        self.lifecycle.begin(Stage::ShadersReady, "createShaders")?;

        let locator = Self::shader_locator(self.pose.is_some());
        let text = self.loader.load_shader(locator).await?;

        let module = self
            .ctx
            .device()
            .create_shader_module(wgpu::ShaderModuleDescriptor {
                label: Some("easel quad shader"),
                source: wgpu::ShaderSource::Wgsl(text.as_ref().into()),
            });

        self.shader_text = Some(text);
        self.res.shader_module.fill(module);

        self.lifecycle.advance(Stage::ShadersReady);
        Ok(())
    }

    /// Builds the render pipeline and the pose-matched bind group.
    pub async fn create_render_pipeline(&mut self) -> Result<(), EngineError> {
        self.lifecycle
            .begin(Stage::PipelineReady, "createRenderPipeline")?;

        let (Some(text), Some(module)) = (self.shader_text.as_ref(), self.res.shader_module.get())
        else {
            return Err(EngineError::usage("shader module missing"));
        };
        pipeline::ensure_entry_point(text, VERTEX_ENTRY)?;
        pipeline::ensure_entry_point(text, FRAGMENT_ENTRY)?;

        let (Some(view), Some(sampler)) = (self.res.texture_view.get(), self.res.sampler.get())
        else {
            return Err(EngineError::usage("geometry missing"));
        };

        let posed = self.pose.is_some();
        let device = self.ctx.device();

        let bind_group_layout =
            device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
                label: Some("easel quad bgl"),
                entries: &pipeline::layout_entries(Self::binding_plan(posed)),
            });

        let pipeline_layout = device.create_pipeline_layout(&wgpu::PipelineLayoutDescriptor {
            label: Some("easel quad pipeline layout"),
            bind_group_layouts: &[&bind_group_layout],
            immediate_size: 0,
        });

        let render_pipeline = device.create_render_pipeline(&wgpu::RenderPipelineDescriptor {
            label: Some("easel quad pipeline"),
            layout: Some(&pipeline_layout),

            vertex: wgpu::VertexState {
                module,
                entry_point: Some(VERTEX_ENTRY),
                compilation_options: Default::default(),
                buffers: &[Self::vertex_layout()],
            },

            fragment: Some(wgpu::FragmentState {
                module,
                entry_point: Some(FRAGMENT_ENTRY),
                compilation_options: Default::default(),
                targets: &[Some(wgpu::ColorTargetState {
                    format: self.ctx.target_format(),
                    blend: None,
                    write_mask: wgpu::ColorWrites::ALL,
                })],
            }),

            primitive: wgpu::PrimitiveState {
                topology: wgpu::PrimitiveTopology::TriangleStrip,
                strip_index_format: None,
                front_face: wgpu::FrontFace::Ccw,
                cull_mode: None,
                polygon_mode: wgpu::PolygonMode::Fill,
                unclipped_depth: false,
                conservative: false,
            },

            depth_stencil: None,
            multisample: wgpu::MultisampleState::default(),
            multiview_mask: None,
            cache: None,
        });

        // Two explicit arrangements, never one builder branching inside.
        let bind_group = if posed {
            let Some(pose_buffer) = self.res.pose_buffer.get() else {
                return Err(EngineError::usage("pose buffer missing"));
            };
            device.create_bind_group(&wgpu::BindGroupDescriptor {
                label: Some("easel quad bind group (posed)"),
                layout: &bind_group_layout,
                entries: &[
                    wgpu::BindGroupEntry {
                        binding: 0,
                        resource: pose_buffer.as_entire_binding(),
                    },
                    wgpu::BindGroupEntry {
                        binding: 1,
                        resource: wgpu::BindingResource::TextureView(view),
                    },
                    wgpu::BindGroupEntry {
                        binding: 2,
                        resource: wgpu::BindingResource::Sampler(sampler),
                    },
                ],
            })
        } else {
            device.create_bind_group(&wgpu::BindGroupDescriptor {
                label: Some("easel quad bind group"),
                layout: &bind_group_layout,
                entries: &[
                    wgpu::BindGroupEntry {
                        binding: 0,
                        resource: wgpu::BindingResource::TextureView(view),
                    },
                    wgpu::BindGroupEntry {
                        binding: 1,
                        resource: wgpu::BindingResource::Sampler(sampler),
                    },
                ],
            })
        };

        self.res.bind_group.fill(bind_group);
        self.res.pipeline.fill(render_pipeline);

        self.lifecycle.advance(Stage::PipelineReady);
        Ok(())
    }

    /// Pure render object; the compute half of the contract is a no-op.
    pub async fn create_compute_pipeline(&mut self) -> Result<(), EngineError> {
        self.lifecycle.ensure_alive("createComputePipeline")
    }

    /// Re-uploads the current pose bytes; a no-op for unposed quads.
    pub fn update_geometry(&mut self) -> Result<(), EngineError> {
        self.lifecycle.ensure_alive("updateGeometry")?;

        if let (Some(pose), Some(buffer)) = (self.pose.as_ref(), self.res.pose_buffer.get()) {
            self.ctx.queue().write_buffer(buffer, 0, pose.as_bytes());
        }
        Ok(())
    }

    /// Records one draw of the quad into the host's render pass.
    pub fn render(&mut self, pass: &mut wgpu::RenderPass<'_>) -> Result<(), EngineError> {
        self.lifecycle.require(Stage::PipelineReady, "render")?;

        let (Some(render_pipeline), Some(vertex_buffer), Some(bind_group)) = (
            self.res.pipeline.get(),
            self.res.vertex_buffer.get(),
            self.res.bind_group.get(),
        ) else {
            return Err(EngineError::usage("render pipeline missing"));
        };

        pass.set_pipeline(render_pipeline);
        pass.set_vertex_buffer(0, vertex_buffer.slice(..));
        pass.set_bind_group(0, bind_group, &[]);
        pass.draw(0..self.vertex_count, 0..1);
        Ok(())
    }

    pub fn compute(&mut self, _pass: &mut wgpu::ComputePass<'_>) -> Result<(), EngineError> {
        self.lifecycle.ensure_alive("compute")
    }

    /// Releases every owned GPU resource. Safe to call more than once.
    pub fn destroy(&mut self) {
        self.res.release_all();
        self.shader_text = None;
        self.lifecycle.destroy();
    }
}

fn validate_vertices(vertices: &[f32]) -> Result<u32, EngineError> {
    if vertices.is_empty() || vertices.len() % FLOATS_PER_VERTEX != 0 {
        return Err(EngineError::config(format!(
            "vertex data must be a non-zero multiple of {FLOATS_PER_VERTEX} floats, got {}",
            vertices.len()
        )));
    }
    Ok((vertices.len() / FLOATS_PER_VERTEX) as u32)
}

#[cfg(test)]
mod tests {
    use super::*;

    // ── vertex validation ─────────────────────────────────────────────────

    #[test]
    fn vertex_count_is_one_per_four_floats() {
        let quad = [
            -1.0, -1.0, 0.0, 1.0, //
            1.0, -1.0, 1.0, 1.0, //
            1.0, 1.0, 1.0, 0.0, //
            -1.0, 1.0, 0.0, 0.0,
        ];
        assert_eq!(validate_vertices(&quad).unwrap(), 4);
    }

    #[test]
    fn ragged_vertex_data_is_rejected() {
        let err = validate_vertices(&[0.0; 7]).unwrap_err();
        assert!(matches!(err, EngineError::Configuration(_)));
        assert!(validate_vertices(&[]).is_err());
    }

    // ── binding arrangements ──────────────────────────────────────────────

    #[test]
    fn posed_quads_bind_pose_texture_sampler() {
        let plan = TexturedQuad::binding_plan(true);
        assert_eq!(plan.len(), 3);
        assert_eq!(
            plan.iter().map(|s| s.binding).collect::<Vec<_>>(),
            vec![0, 1, 2]
        );
        assert_eq!(plan[0].kind, BindingKind::UniformBuffer);
        assert_eq!(plan[1].kind, BindingKind::SampledTexture);
        assert_eq!(plan[2].kind, BindingKind::FilteringSampler);
    }

    #[test]
    fn unposed_quads_bind_texture_sampler_only() {
        let plan = TexturedQuad::binding_plan(false);
        assert_eq!(plan.len(), 2);
        assert_eq!(
            plan.iter().map(|s| s.binding).collect::<Vec<_>>(),
            vec![0, 1]
        );
        assert_eq!(plan[0].kind, BindingKind::SampledTexture);
        assert_eq!(plan[1].kind, BindingKind::FilteringSampler);
    }

    #[test]
    fn shader_choice_follows_pose_presence() {
        assert_eq!(TexturedQuad::shader_locator(true), QUAD_POSED_SHADER);
        assert_eq!(TexturedQuad::shader_locator(false), QUAD_SHADER);
    }

    // ── vertex layout ─────────────────────────────────────────────────────

    #[test]
    fn vertex_layout_matches_the_xyuv_tuple() {
        let layout = TexturedQuad::vertex_layout();
        assert_eq!(layout.array_stride, 16);
        assert_eq!(layout.attributes.len(), 2);
        assert_eq!(layout.attributes[0].shader_location, 0);
        assert_eq!(layout.attributes[0].offset, 0);
        assert_eq!(layout.attributes[1].shader_location, 1);
        assert_eq!(layout.attributes[1].offset, 8);
    }
}
