use std::error::Error as StdError;

/// Required pieces of the background were missing or unusable at startup.
#[derive(Debug, thiserror::Error)]
pub enum InitializationError {
    #[error("no anchor region configured for the exclusion zone")]
    MissingAnchor,
    #[error("anchor region must have a positive size (got {width}x{height})")]
    DegenerateAnchor { width: f64, height: f64 },
    #[error("relative anchor {field} = {value} is outside 0..=1")]
    AnchorOutOfRange { field: &'static str, value: f64 },
    #[error("failed to create render surface: {0}")]
    Surface(String),
}

/// The background texture could not be fetched or decoded.
#[derive(Debug, thiserror::Error)]
#[error("failed to load texture from {source_url}")]
pub struct ResourceLoadError {
    pub source_url: String,
    #[source]
    pub cause: Box<dyn StdError + Send + Sync + 'static>,
}

impl ResourceLoadError {
    pub fn new(
        source_url: impl Into<String>,
        cause: impl Into<Box<dyn StdError + Send + Sync + 'static>>,
    ) -> Self {
        Self {
            source_url: source_url.into(),
            cause: cause.into(),
        }
    }
}

#[cfg(test)]
mod tests {
    use std::error::Error;

    use super::*;

    #[test]
    fn resource_error_keeps_cause_chain() {
        let err = ResourceLoadError::new("https://example.invalid/a.jpg", "connection refused");
        assert_eq!(
            err.to_string(),
            "failed to load texture from https://example.invalid/a.jpg"
        );
        let cause = err.source().expect("cause");
        assert_eq!(cause.to_string(), "connection refused");
    }
}
