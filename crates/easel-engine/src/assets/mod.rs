//! Asset fetching.
//!
//! Scene objects name their shaders and textures by locator (a relative
//! path or an `http(s)` URL); this module turns locators into bytes, shader
//! text, or decoded bitmaps. Shader text is memoized by locator so objects
//! sharing a shader fetch it once.

mod bitmap;
mod loader;

pub use bitmap::Bitmap;
pub use loader::AssetLoader;
