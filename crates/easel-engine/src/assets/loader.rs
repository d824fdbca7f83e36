use std::collections::HashMap;
use std::sync::{Arc, Mutex, PoisonError};

use crate::error::EngineError;

use super::Bitmap;

/// Fetches assets by locator and memoizes shader text.
///
/// Cloning is cheap and shares the cache; every scene object holds a clone.
/// Relative locators are resolved against the loader's root (a directory or
/// URL prefix); absolute paths and full URLs pass through untouched.
#[derive(Clone)]
pub struct AssetLoader {
    inner: Arc<Inner>,
}

struct Inner {
    root: Option<String>,
    shaders: Mutex<HashMap<String, Arc<str>>>,
}

impl AssetLoader {
    /// A loader resolving relative locators against `root`.
    pub fn new(root: impl Into<String>) -> Self {
        let mut root = root.into();
        while root.ends_with('/') {
            root.pop();
        }
        Self {
            inner: Arc::new(Inner {
                root: Some(root),
                shaders: Mutex::new(HashMap::new()),
            }),
        }
    }

    /// A loader that takes every locator verbatim.
    pub fn without_root() -> Self {
        Self {
            inner: Arc::new(Inner {
                root: None,
                shaders: Mutex::new(HashMap::new()),
            }),
        }
    }

    fn resolve(&self, locator: &str) -> String {
        match &self.inner.root {
            Some(root) if !is_url(locator) && !locator.starts_with('/') => {
                format!("{root}/{locator}")
            }
            _ => locator.to_string(),
        }
    }

    /// Fetches raw bytes from a local path or `http(s)` URL.
    pub async fn load_bytes(&self, locator: &str) -> Result<Vec<u8>, EngineError> {
        let resolved = self.resolve(locator);

        if is_url(&resolved) {
            let response = ehttp::fetch_async(ehttp::Request::get(&resolved))
                .await
                .map_err(|e| EngineError::fetch(&resolved, e))?;
            if !response.ok {
                return Err(EngineError::fetch(
                    &resolved,
                    format!("HTTP {} {}", response.status, response.status_text),
                ));
            }
            Ok(response.bytes)
        } else {
            std::fs::read(&resolved).map_err(|e| EngineError::fetch(&resolved, e))
        }
    }

    /// Fetches shader source text, verbatim, memoized by locator.
    pub async fn load_shader(&self, locator: &str) -> Result<Arc<str>, EngineError> {
        if let Some(cached) = self.cached_shader(locator) {
            return Ok(cached);
        }

        let bytes = self.load_bytes(locator).await?;
        let text = String::from_utf8(bytes)
            .map_err(|_| EngineError::fetch(locator, "shader source is not valid UTF-8"))?;
        let text: Arc<str> = text.into();

        self.lock_shaders()
            .insert(locator.to_string(), Arc::clone(&text));

        log::debug!("loaded shader `{locator}` ({} bytes)", text.len());
        Ok(text)
    }

    /// Fetches and fully decodes an image.
    pub async fn load_bitmap(&self, locator: &str) -> Result<Bitmap, EngineError> {
        let bytes = self.load_bytes(locator).await?;
        Bitmap::decode(locator, &bytes)
    }

    fn cached_shader(&self, locator: &str) -> Option<Arc<str>> {
        self.lock_shaders().get(locator).cloned()
    }

    fn lock_shaders(&self) -> std::sync::MutexGuard<'_, HashMap<String, Arc<str>>> {
        self.inner
            .shaders
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
    }
}

fn is_url(locator: &str) -> bool {
    locator.starts_with("http://") || locator.starts_with("https://")
}

#[cfg(test)]
mod tests {
    use super::*;

    fn temp_file(name: &str, contents: &[u8]) -> std::path::PathBuf {
        let path = std::env::temp_dir().join(format!("easel-loader-{}-{name}", std::process::id()));
        std::fs::write(&path, contents).expect("write temp file");
        path
    }

    // ── locator resolution ────────────────────────────────────────────────

    #[test]
    fn resolve_joins_relative_locators_to_root() {
        let loader = AssetLoader::new("/opt/assets/");
        assert_eq!(loader.resolve("shaders/quad.wgsl"), "/opt/assets/shaders/quad.wgsl");
    }

    #[test]
    fn resolve_passes_urls_and_absolute_paths_through() {
        let loader = AssetLoader::new("/opt/assets");
        assert_eq!(
            loader.resolve("https://example.org/a.wgsl"),
            "https://example.org/a.wgsl"
        );
        assert_eq!(loader.resolve("/etc/b.wgsl"), "/etc/b.wgsl");
    }

    // ── byte + shader fetch ───────────────────────────────────────────────

    #[test]
    fn load_bytes_reads_local_files() {
        let path = temp_file("bytes.bin", b"quad data");
        let loader = AssetLoader::without_root();

        let bytes = pollster::block_on(loader.load_bytes(path.to_str().unwrap())).unwrap();
        assert_eq!(bytes, b"quad data");

        let _ = std::fs::remove_file(path);
    }

    #[test]
    fn missing_file_is_a_resource_fetch_error() {
        let loader = AssetLoader::without_root();
        let err = pollster::block_on(loader.load_shader("/no/such/shader.wgsl")).unwrap_err();
        assert!(matches!(err, EngineError::ResourceFetch { .. }));
    }

    #[test]
    fn shader_text_is_memoized_by_locator() {
        let path = temp_file("memo.wgsl", b"fn vertexMain() {}");
        let locator = path.to_str().unwrap().to_string();
        let loader = AssetLoader::without_root();

        let first = pollster::block_on(loader.load_shader(&locator)).unwrap();

        // A second load must be served from cache, not the (now changed) file.
        std::fs::write(&path, b"fn somethingElse() {}").unwrap();
        let second = pollster::block_on(loader.load_shader(&locator)).unwrap();

        assert_eq!(first, second);
        assert_eq!(&*second, "fn vertexMain() {}");

        let _ = std::fs::remove_file(path);
    }

    #[test]
    fn non_utf8_shader_source_is_rejected() {
        let path = temp_file("bad.wgsl", &[0xff, 0xfe, 0x00]);
        let loader = AssetLoader::without_root();

        let err = pollster::block_on(loader.load_shader(path.to_str().unwrap())).unwrap_err();
        assert!(matches!(err, EngineError::ResourceFetch { .. }));

        let _ = std::fs::remove_file(path);
    }
}
