use thiserror::Error;

/// Errors surfaced by the object lifecycle.
///
/// Each variant maps to a distinct failure class so the host can decide
/// whether to drop the object (`ResourceFetch`), fix its setup
/// (`Configuration`), or fix its own call sequence (`Usage`). The engine
/// never retries internally.
#[derive(Debug, Error)]
pub enum EngineError {
    /// A shader or image could not be fetched or decoded. Fatal to that
    /// object's setup; other objects are unaffected.
    #[error("failed to fetch `{uri}`: {reason}")]
    ResourceFetch { uri: String, reason: String },

    /// A pipeline or bind-group specification is inconsistent (missing
    /// entry point, bad vertex data). Detected before any draw happens.
    #[error("configuration error: {0}")]
    Configuration(String),

    /// A lifecycle method was called out of order, or after `destroy`.
    /// A programming error in the host; fails fast.
    #[error("usage error: {0}")]
    Usage(String),
}

impl EngineError {
    pub(crate) fn fetch(uri: impl Into<String>, reason: impl ToString) -> Self {
        Self::ResourceFetch {
            uri: uri.into(),
            reason: reason.to_string(),
        }
    }

    pub(crate) fn config(msg: impl Into<String>) -> Self {
        Self::Configuration(msg.into())
    }

    pub(crate) fn usage(msg: impl Into<String>) -> Self {
        Self::Usage(msg.into())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fetch_error_names_the_uri() {
        let e = EngineError::fetch("shaders/missing.wgsl", "no such file");
        assert_eq!(
            e.to_string(),
            "failed to fetch `shaders/missing.wgsl`: no such file"
        );
    }

    #[test]
    fn usage_error_is_prefixed() {
        let e = EngineError::usage("render before pipeline creation");
        assert!(e.to_string().starts_with("usage error:"));
    }
}
