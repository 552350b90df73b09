//! Social Automator - turn video content or raw text into social media posts
//!
//! This library extracts text from a YouTube URL (via yt-dlp) or takes raw text as-is,
//! then runs it through a fixed chain of LLM calls: key points, a LinkedIn post, an
//! optional X/Twitter thread and an image concept.

pub mod cli;
pub mod config;
pub mod extractors;
pub mod generation;
pub mod output;
pub mod pipeline;
pub mod utils;

pub use cli::{Cli, Commands, OutputFormat};
pub use config::{ApiKey, Config};
pub use extractors::{ExtractionError, SourceInput, TextExtractor, YtDlpExtractor};
pub use generation::{GenerationClient, GenerationError, GroqClient};
pub use pipeline::{ContentPipeline, PipelineRun, Stage, StageOutput};

/// Result type used throughout the library
pub type Result<T> = anyhow::Result<T>;

/// Error types specific to the automator
#[derive(thiserror::Error, Debug)]
pub enum AutomatorError {
    #[error("Missing API credential: environment variable {0} is not set")]
    MissingCredential(String),

    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    #[error("No input provided. Pass text, a YouTube URL, or --file <FILE>")]
    MissingInput,
}
