//! Easel engine crate.
//!
//! A small GPU framework for image-processing demos: a device/surface layer,
//! an asset loader, and a closed set of scene objects (a textured quad and
//! compute image filters) that share one create/update/render/destroy
//! lifecycle so a host loop can drive them without knowing their concrete
//! type.

pub mod assets;
pub mod device;
pub mod error;
pub mod logging;
pub mod scene;

pub use error::EngineError;
