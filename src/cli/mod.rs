use clap::{Parser, Subcommand, ValueEnum};
use std::path::PathBuf;

#[derive(Parser)]
#[command(
    name = "automator",
    about = "Social Automator - Turn YouTube videos or text into LinkedIn posts, X threads and image concepts",
    version,
    long_about = "Extracts a transcript or description from a YouTube video (via yt-dlp), or takes your text as-is, and runs it through a chain of LLM agents: a researcher that pulls out key points, a writer for LinkedIn, an optional X/Twitter thread writer and an artist that describes a matching image."
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Disable progress indicators
    #[arg(short, long, global = true)]
    pub quiet: bool,

    /// Use this config file instead of the default locations
    #[arg(long, global = true, value_name = "FILE")]
    pub config: Option<PathBuf>,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Generate social media content from a URL or text
    Generate {
        /// YouTube URL (anything starting with "http") or the content itself
        #[arg(value_name = "URL_OR_TEXT", conflicts_with = "file")]
        input: Option<String>,

        /// Read the input from a file
        #[arg(long, value_name = "FILE")]
        file: Option<PathBuf>,

        /// Skip the X/Twitter thread
        #[arg(long)]
        no_thread: bool,

        /// Output file path (prints to console if not specified)
        #[arg(short, long, value_name = "FILE")]
        output: Option<PathBuf>,

        /// Output format (defaults to app.default_output_format)
        #[arg(short, long, value_enum)]
        format: Option<OutputFormat>,
    },

    /// Write the default configuration or show the current one
    Config {
        /// Show current configuration
        #[arg(short, long)]
        show: bool,
    },

    /// Check that yt-dlp and the API key are available
    Check,
}

#[derive(ValueEnum, Clone, Debug, PartialEq, Eq)]
pub enum OutputFormat {
    /// Plain text
    Text,
    /// JSON
    Json,
    /// Markdown
    Markdown,
}

impl OutputFormat {
    /// Parse a config value, falling back to text for anything unknown
    pub fn from_config(value: &str) -> Self {
        <Self as ValueEnum>::from_str(value, true).unwrap_or(OutputFormat::Text)
    }
}

impl std::fmt::Display for OutputFormat {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            OutputFormat::Text => write!(f, "text"),
            OutputFormat::Json => write!(f, "json"),
            OutputFormat::Markdown => write!(f, "markdown"),
        }
    }
}
