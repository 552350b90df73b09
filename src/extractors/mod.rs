use async_trait::async_trait;
#[cfg(test)]
use mockall::automock;
use serde::{Deserialize, Serialize};

pub mod youtube;

pub use youtube::YtDlpExtractor;

/// Where the pipeline's text comes from
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", content = "value")]
pub enum SourceInput {
    /// A video URL that has to go through the extractor
    Url(String),
    /// Text supplied directly by the user
    RawText(String),
}

impl SourceInput {
    /// Classify user input. Anything starting with the literal `http` is a URL.
    pub fn classify(value: impl Into<String>) -> Self {
        let value = value.into();
        if value.starts_with("http") {
            SourceInput::Url(value)
        } else {
            SourceInput::RawText(value)
        }
    }

    pub fn value(&self) -> &str {
        match self {
            SourceInput::Url(value) | SourceInput::RawText(value) => value,
        }
    }

    pub fn is_url(&self) -> bool {
        matches!(self, SourceInput::Url(_))
    }
}

impl From<&str> for SourceInput {
    fn from(value: &str) -> Self {
        Self::classify(value)
    }
}

impl From<String> for SourceInput {
    fn from(value: String) -> Self {
        Self::classify(value)
    }
}

/// Reasons text extraction can fail. The display strings are shown to the user as-is.
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum ExtractionError {
    #[error("Request timed out after {seconds}s (timeout). Try a different video.")]
    Timeout { seconds: u64 },

    #[error("{tool} not installed properly. Using text mode is recommended.")]
    ToolMissing { tool: String },

    #[error("No transcript or description available for this video.")]
    NoContent,

    #[error("Could not fetch video data: {detail}")]
    Unknown { detail: String },
}

/// Turns a [`SourceInput`] into plain text for the generation stages
#[cfg_attr(test, automock)]
#[async_trait]
pub trait TextExtractor: Send + Sync {
    /// Raw text is returned unchanged; URLs are resolved to a transcript or description.
    async fn extract(&self, source: &SourceInput) -> Result<String, ExtractionError>;
}
