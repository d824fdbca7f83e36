//! Scene objects and their lifecycle contract.
//!
//! Every drawable/computable unit is one of a closed set of variants behind
//! [`SceneNode`], all sharing the same contract: geometry, shaders, and
//! pipeline are created asynchronously in that order, `render`/`compute`
//! record commands into a host-supplied pass each frame, and `destroy`
//! releases every owned GPU resource exactly once.
//!
//! Convention:
//! - objects own their GPU resources exclusively; the device context is the
//!   only shared handle
//! - setup ordering is enforced by the lifecycle state machine, not by
//!   caller discipline

mod filter;
mod lifecycle;
mod node;
mod pipeline;
mod pose;
mod quad;
mod resources;

pub use filter::{GrayscaleSplitFilter, ImageFilter, GRAYSCALE_SPLIT_SHADER};
pub use lifecycle::{Lifecycle, Stage};
pub use node::SceneNode;
pub use pipeline::{
    dispatch_extent, BindingKind, BindingSlot, COMPUTE_ENTRY, FRAGMENT_ENTRY,
    STORAGE_TEXTURE_FORMAT, VERTEX_ENTRY,
};
pub use pose::Pose;
pub use quad::{TextureSource, TexturedQuad, QUAD_POSED_SHADER, QUAD_SHADER};
pub use resources::{ReleaseHandle, Slot};
