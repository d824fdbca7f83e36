use std::sync::Arc;

use crate::assets::AssetLoader;
use crate::device::DeviceContext;
use crate::error::EngineError;

use super::lifecycle::{Lifecycle, Stage};
use super::pipeline::{self, BindingKind, BindingSlot, COMPUTE_ENTRY, STORAGE_TEXTURE_FORMAT};
use super::resources::Slot;

/// Shader locator of the grayscale-split filter.
pub const GRAYSCALE_SPLIT_SHADER: &str = "shaders/grayscale_split.wgsl";

/// A compute object that runs a filter shader over an input image,
/// producing a same-sized output texture.
///
/// Shares the object lifecycle: `create_geometry` fetches the input image
/// and allocates the output, `create_shaders` fetches the filter shader,
/// `create_compute_pipeline` builds the pipeline and bind group, and
/// `compute` dispatches one workgroup grid covering the image. The render
/// half of the contract is a no-op; to display the result, hand
/// [`output_texture`](Self::output_texture) to a textured quad.
pub struct ImageFilter {
    ctx: DeviceContext,
    loader: AssetLoader,
    image: String,
    shader_locator: String,
    workgroup: (u32, u32),
    lifecycle: Lifecycle,
    extent: Option<(u32, u32)>,
    shader_text: Option<Arc<str>>,
    res: FilterResources,
}

/// Every GPU handle the filter owns, torn down together on destroy.
#[derive(Default)]
struct FilterResources {
    input: Slot<wgpu::Texture>,
    input_view: Slot<wgpu::TextureView>,
    output: Slot<wgpu::Texture>,
    output_view: Slot<wgpu::TextureView>,
    shader_module: Slot<wgpu::ShaderModule>,
    bind_group: Slot<wgpu::BindGroup>,
    pipeline: Slot<wgpu::ComputePipeline>,
}

impl FilterResources {
    fn release_all(&mut self) {
        self.pipeline.release();
        self.bind_group.release();
        self.shader_module.release();
        self.output_view.release();
        self.output.release();
        self.input_view.release();
        self.input.release();
    }
}

impl ImageFilter {
    /// `workgroup` is the shader's `@workgroup_size`; dispatch sizing is
    /// derived from it, so the two must agree.
    pub fn new(
        ctx: DeviceContext,
        loader: AssetLoader,
        image: impl Into<String>,
        shader_locator: impl Into<String>,
        workgroup: (u32, u32),
    ) -> Self {
        Self {
            ctx,
            loader,
            image: image.into(),
            shader_locator: shader_locator.into(),
            workgroup,
            lifecycle: Lifecycle::new(),
            extent: None,
            shader_text: None,
            res: FilterResources::default(),
        }
    }

    pub fn stage(&self) -> Stage {
        self.lifecycle.stage()
    }

    /// Input image dimensions, known once geometry has been created.
    pub fn extent(&self) -> Option<(u32, u32)> {
        self.extent
    }

    pub fn workgroup(&self) -> (u32, u32) {
        self.workgroup
    }

    /// The filter's output, for composition with a textured quad. The
    /// texture stays owned by the filter; destroying the filter frees it.
    pub fn output_texture(&self) -> Option<wgpu::Texture> {
        self.res.output.get().cloned()
    }

    /// Bind-group arrangement for group 0: the sampled input and the
    /// write-only storage output.
    pub fn binding_plan() -> &'static [BindingSlot] {
        const PLAN: &[BindingSlot] = &[
            BindingSlot {
                binding: 0,
                kind: BindingKind::SampledTexture,
                visibility: wgpu::ShaderStages::COMPUTE,
            },
            BindingSlot {
                binding: 1,
                kind: BindingKind::StorageTexture,
                visibility: wgpu::ShaderStages::COMPUTE,
            },
        ];
        PLAN
    }

    /// Fetches and uploads the input image, and allocates the output
    /// texture at the same dimensions.
    pub async fn create_geometry(&mut self) -> Result<(), EngineError> {
        self.lifecycle.begin(Stage::GeometryReady, "createGeometry")?;

        let bitmap = self.loader.load_bitmap(&self.image).await?;
        let size = wgpu::Extent3d {
            width: bitmap.width(),
            height: bitmap.height(),
            depth_or_array_layers: 1,
        };

        let device = self.ctx.device();

        let input = device.create_texture(&wgpu::TextureDescriptor {
            label: Some("easel filter input"),
            size,
            mip_level_count: 1,
            sample_count: 1,
            dimension: wgpu::TextureDimension::D2,
            format: STORAGE_TEXTURE_FORMAT,
            usage: wgpu::TextureUsages::TEXTURE_BINDING | wgpu::TextureUsages::COPY_DST,
            view_formats: &[],
        });

        self.ctx.queue().write_texture(
            wgpu::TexelCopyTextureInfo {
                texture: &input,
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
            size,
        );

        let output = device.create_texture(&wgpu::TextureDescriptor {
            label: Some("easel filter output"),
            size,
            mip_level_count: 1,
            sample_count: 1,
            dimension: wgpu::TextureDimension::D2,
            format: STORAGE_TEXTURE_FORMAT,
            usage: wgpu::TextureUsages::STORAGE_BINDING | wgpu::TextureUsages::TEXTURE_BINDING,
            view_formats: &[],
        });

        self.res
            .input_view
            .fill(input.create_view(&wgpu::TextureViewDescriptor::default()));
        self.res
            .output_view
            .fill(output.create_view(&wgpu::TextureViewDescriptor::default()));
        self.res.input.fill(input);
        self.res.output.fill(output);
        self.extent = Some((size.width, size.height));

        self.lifecycle.advance(Stage::GeometryReady);
        Ok(())
    }

    /// Fetches and compiles the filter's compute shader.
    pub async fn create_shaders(&mut self) -> Result<(), EngineError> {
        self.lifecycle.begin(Stage::ShadersReady, "createShaders")?;

        let text = self.loader.load_shader(&self.shader_locator).await?;

        let module = self
            .ctx
            .device()
            .create_shader_module(wgpu::ShaderModuleDescriptor {
                label: Some("easel filter shader"),
                source: wgpu::ShaderSource::Wgsl(text.as_ref().into()),
            });

        self.shader_text = Some(text);
        self.res.shader_module.fill(module);

        self.lifecycle.advance(Stage::ShadersReady);
        Ok(())
    }

    /// Pure compute object; the render half of the contract is a no-op.
    pub async fn create_render_pipeline(&mut self) -> Result<(), EngineError> {
        self.lifecycle.ensure_alive("createRenderPipeline")
    }

    /// Builds the compute pipeline and its bind group.
    pub async fn create_compute_pipeline(&mut self) -> Result<(), EngineError> {
        self.lifecycle
            .begin(Stage::PipelineReady, "createComputePipeline")?;

        let (Some(text), Some(module)) = (self.shader_text.as_ref(), self.res.shader_module.get())
        else {
            return Err(EngineError::usage("shader module missing"));
        };
        pipeline::ensure_entry_point(text, COMPUTE_ENTRY)?;

        let (Some(input_view), Some(output_view)) =
            (self.res.input_view.get(), self.res.output_view.get())
        else {
            return Err(EngineError::usage("geometry missing"));
        };

        let device = self.ctx.device();

        let bind_group_layout =
            device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
                label: Some("easel filter bgl"),
                entries: &pipeline::layout_entries(Self::binding_plan()),
            });

        let pipeline_layout = device.create_pipeline_layout(&wgpu::PipelineLayoutDescriptor {
            label: Some("easel filter pipeline layout"),
            bind_group_layouts: &[&bind_group_layout],
            immediate_size: 0,
        });

        let compute_pipeline =
            device.create_compute_pipeline(&wgpu::ComputePipelineDescriptor {
                label: Some("easel filter pipeline"),
                layout: Some(&pipeline_layout),
                module,
                entry_point: Some(COMPUTE_ENTRY),
                compilation_options: Default::default(),
                cache: None,
            });

        let bind_group = device.create_bind_group(&wgpu::BindGroupDescriptor {
            label: Some("easel filter bind group"),
            layout: &bind_group_layout,
            entries: &[
                wgpu::BindGroupEntry {
                    binding: 0,
                    resource: wgpu::BindingResource::TextureView(input_view),
                },
                wgpu::BindGroupEntry {
                    binding: 1,
                    resource: wgpu::BindingResource::TextureView(output_view),
                },
            ],
        });

        self.res.bind_group.fill(bind_group);
        self.res.pipeline.fill(compute_pipeline);

        self.lifecycle.advance(Stage::PipelineReady);
        Ok(())
    }

    /// Nothing is CPU-mutable after setup; kept for contract uniformity.
    pub fn update_geometry(&mut self) -> Result<(), EngineError> {
        self.lifecycle.ensure_alive("updateGeometry")
    }

    pub fn render(&mut self, _pass: &mut wgpu::RenderPass<'_>) -> Result<(), EngineError> {
        self.lifecycle.ensure_alive("render")
    }

    /// Dispatches one workgroup grid covering the input image.
    pub fn compute(&mut self, pass: &mut wgpu::ComputePass<'_>) -> Result<(), EngineError> {
        self.lifecycle.require(Stage::PipelineReady, "compute")?;

        let (Some(compute_pipeline), Some(bind_group), Some((width, height))) = (
            self.res.pipeline.get(),
            self.res.bind_group.get(),
            self.extent,
        ) else {
            return Err(EngineError::usage("compute pipeline missing"));
        };

        let (x, y, z) = pipeline::dispatch_extent(width, height, self.workgroup);

        pass.set_pipeline(compute_pipeline);
        pass.set_bind_group(0, bind_group, &[]);
        pass.dispatch_workgroups(x, y, z);
        Ok(())
    }

    /// Releases every owned GPU resource. Safe to call more than once.
    pub fn destroy(&mut self) {
        self.res.release_all();
        self.shader_text = None;
        self.lifecycle.destroy();
    }
}

/// Quadrant study of grayscale conversions: the input split four ways,
/// each quadrant converted with a different luminance formula (the
/// top-left passes through untouched).
pub struct GrayscaleSplitFilter {
    filter: ImageFilter,
}

impl GrayscaleSplitFilter {
    /// Must match the shader's `@workgroup_size`.
    pub const WORKGROUP: (u32, u32) = (8, 8);

    pub fn new(ctx: DeviceContext, loader: AssetLoader, image: impl Into<String>) -> Self {
        Self {
            filter: ImageFilter::new(ctx, loader, image, GRAYSCALE_SPLIT_SHADER, Self::WORKGROUP),
        }
    }

    pub fn stage(&self) -> Stage {
        self.filter.stage()
    }

    pub fn extent(&self) -> Option<(u32, u32)> {
        self.filter.extent()
    }

    pub fn output_texture(&self) -> Option<wgpu::Texture> {
        self.filter.output_texture()
    }

    pub async fn create_geometry(&mut self) -> Result<(), EngineError> {
        self.filter.create_geometry().await
    }

    pub async fn create_shaders(&mut self) -> Result<(), EngineError> {
        self.filter.create_shaders().await
    }

    pub async fn create_render_pipeline(&mut self) -> Result<(), EngineError> {
        self.filter.create_render_pipeline().await
    }

    pub async fn create_compute_pipeline(&mut self) -> Result<(), EngineError> {
        self.filter.create_compute_pipeline().await
    }

    pub fn update_geometry(&mut self) -> Result<(), EngineError> {
        self.filter.update_geometry()
    }

    pub fn render(&mut self, pass: &mut wgpu::RenderPass<'_>) -> Result<(), EngineError> {
        self.filter.render(pass)
    }

    pub fn compute(&mut self, pass: &mut wgpu::ComputePass<'_>) -> Result<(), EngineError> {
        self.filter.compute(pass)
    }

    pub fn destroy(&mut self) {
        self.filter.destroy()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn filter_binds_input_then_storage_output() {
        let plan = ImageFilter::binding_plan();
        assert_eq!(plan.len(), 2);
        assert_eq!(plan[0].binding, 0);
        assert_eq!(plan[0].kind, BindingKind::SampledTexture);
        assert_eq!(plan[1].binding, 1);
        assert_eq!(plan[1].kind, BindingKind::StorageTexture);
        assert!(plan
            .iter()
            .all(|s| s.visibility == wgpu::ShaderStages::COMPUTE));
    }

    #[test]
    fn grayscale_split_workgroup_is_square() {
        assert_eq!(GrayscaleSplitFilter::WORKGROUP, (8, 8));
    }
}
