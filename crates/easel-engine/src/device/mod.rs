//! GPU device + surface management.
//!
//! This module is responsible for:
//! - creating the wgpu Instance/Adapter/Device/Queue
//! - creating & configuring the Surface (swapchain)
//! - acquiring frames and providing encoders/views for rendering
//! - handing out the shared [`DeviceContext`] that scene objects hold

mod context;
mod frame;
mod init;
mod surface;

pub use context::{DeviceContext, Gpu};
pub use frame::GpuFrame;
pub use init::GpuInit;
pub use surface::SurfaceErrorAction;
