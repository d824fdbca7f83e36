use crate::error::EngineError;

use super::filter::GrayscaleSplitFilter;
use super::lifecycle::Stage;
use super::quad::TexturedQuad;

/// The closed set of object variants a host loop can own.
///
/// Dispatch is by construction-time variant, so the host drives a
/// heterogeneous collection through one surface without knowing concrete
/// types. Variants that do not render (or compute) no-op that half of the
/// contract.
pub enum SceneNode {
    TexturedQuad(TexturedQuad),
    GrayscaleSplit(GrayscaleSplitFilter),
}

impl SceneNode {
    pub fn stage(&self) -> Stage {
        match self {
            Self::TexturedQuad(quad) => quad.stage(),
            Self::GrayscaleSplit(filter) => filter.stage(),
        }
    }

    pub async fn create_geometry(&mut self) -> Result<(), EngineError> {
        match self {
            Self::TexturedQuad(quad) => quad.create_geometry().await,
            Self::GrayscaleSplit(filter) => filter.create_geometry().await,
        }
    }

    pub async fn create_shaders(&mut self) -> Result<(), EngineError> {
        match self {
            Self::TexturedQuad(quad) => quad.create_shaders().await,
            Self::GrayscaleSplit(filter) => filter.create_shaders().await,
        }
    }

    pub async fn create_render_pipeline(&mut self) -> Result<(), EngineError> {
        match self {
            Self::TexturedQuad(quad) => quad.create_render_pipeline().await,
            Self::GrayscaleSplit(filter) => filter.create_render_pipeline().await,
        }
    }

    pub async fn create_compute_pipeline(&mut self) -> Result<(), EngineError> {
        match self {
            Self::TexturedQuad(quad) => quad.create_compute_pipeline().await,
            Self::GrayscaleSplit(filter) => filter.create_compute_pipeline().await,
        }
    }

    /// Runs the whole setup chain in contract order. After this returns
    /// `Ok`, the object is ready to render/compute.
    pub async fn setup(&mut self) -> Result<(), EngineError> {
        self.create_geometry().await?;
        self.create_shaders().await?;
        self.create_render_pipeline().await?;
        self.create_compute_pipeline().await
    }

    pub fn update_geometry(&mut self) -> Result<(), EngineError> {
        match self {
            Self::TexturedQuad(quad) => quad.update_geometry(),
            Self::GrayscaleSplit(filter) => filter.update_geometry(),
        }
    }

    pub fn render(&mut self, pass: &mut wgpu::RenderPass<'_>) -> Result<(), EngineError> {
        match self {
            Self::TexturedQuad(quad) => quad.render(pass),
            Self::GrayscaleSplit(filter) => filter.render(pass),
        }
    }

    pub fn compute(&mut self, pass: &mut wgpu::ComputePass<'_>) -> Result<(), EngineError> {
        match self {
            Self::TexturedQuad(quad) => quad.compute(pass),
            Self::GrayscaleSplit(filter) => filter.compute(pass),
        }
    }

    pub fn destroy(&mut self) {
        match self {
            Self::TexturedQuad(quad) => quad.destroy(),
            Self::GrayscaleSplit(filter) => filter.destroy(),
        }
    }
}

impl From<TexturedQuad> for SceneNode {
    fn from(quad: TexturedQuad) -> Self {
        Self::TexturedQuad(quad)
    }
}

impl From<GrayscaleSplitFilter> for SceneNode {
    fn from(filter: GrayscaleSplitFilter) -> Self {
        Self::GrayscaleSplit(filter)
    }
}
