use indicatif::ProgressBar;
use serde::{Serialize, Serializer};
use std::borrow::Cow;
use std::fmt;
use tracing::Instrument;
use uuid::Uuid;

use crate::config::{ApiKey, Config};
use crate::extractors::{SourceInput, TextExtractor, YtDlpExtractor};
use crate::generation::{GenerationClient, GroqClient};

pub mod prompts;

/// Characters of source text kept in [`PipelineRun::transcript_preview`]
pub const PREVIEW_CHARS: usize = 500;

/// One LLM call in the chain, with its sampling parameters
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Stage {
    /// Extracts five key points from the source text
    Researcher,
    /// Writes the LinkedIn post from the key points
    Writer,
    /// Writes the X/Twitter thread from the key points (optional)
    ThreadWriter,
    /// Describes an image for the LinkedIn post
    Artist,
}

impl Stage {
    pub fn max_tokens(self) -> u32 {
        match self {
            Stage::Researcher => 500,
            Stage::Writer => 400,
            Stage::ThreadWriter => 600,
            Stage::Artist => 150,
        }
    }

    pub fn temperature(self) -> f32 {
        match self {
            Stage::Researcher | Stage::Artist => 0.7,
            Stage::Writer | Stage::ThreadWriter => 0.8,
        }
    }

    fn progress_message(self) -> &'static str {
        match self {
            Stage::Researcher => "📝 Agent 1 (Researcher): Extracting key points...",
            Stage::Writer => "✍️  Agent 2 (Writer): Creating LinkedIn post...",
            Stage::ThreadWriter => "🐦 Agent 2B (Twitter Writer): Creating thread...",
            Stage::Artist => "🎨 Agent 3 (Artist): Designing image concept...",
        }
    }
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Stage::Researcher => write!(f, "researcher"),
            Stage::Writer => write!(f, "writer"),
            Stage::ThreadWriter => write!(f, "thread writer"),
            Stage::Artist => write!(f, "artist"),
        }
    }
}

/// Outcome of a single generation stage
#[derive(Debug, Clone, PartialEq)]
pub enum StageOutput {
    Generated(String),
    Failed { detail: String },
}

impl StageOutput {
    /// The generated text, or `Error: {detail}` for a failed stage.
    ///
    /// Later stages build their prompts from this, failed or not.
    pub fn as_text(&self) -> Cow<'_, str> {
        match self {
            StageOutput::Generated(text) => Cow::Borrowed(text),
            StageOutput::Failed { detail } => Cow::Owned(format!("Error: {}", detail)),
        }
    }

    pub fn failure(&self) -> Option<&str> {
        match self {
            StageOutput::Failed { detail } => Some(detail),
            StageOutput::Generated(_) => None,
        }
    }
}

impl fmt::Display for StageOutput {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.as_text())
    }
}

impl Serialize for StageOutput {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.as_text())
    }
}

/// Everything one pipeline run produced
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct PipelineRun {
    /// All requested stages ran. Stages may still have failed individually.
    pub success: bool,

    /// First [`PREVIEW_CHARS`] characters of the source text, followed by `...`
    pub transcript_preview: Option<String>,

    pub key_points: Option<StageOutput>,
    pub linkedin_post: Option<StageOutput>,

    /// Only populated when the thread was requested
    pub twitter_thread: Option<StageOutput>,

    pub image_description: Option<StageOutput>,

    /// Set when extraction failed and no stage ran
    pub error: Option<String>,
}

impl PipelineRun {
    fn failed(error: impl Into<String>) -> Self {
        Self {
            error: Some(error.into()),
            ..Self::default()
        }
    }

    /// Stages that fell back to the error text, in execution order
    pub fn failed_stages(&self) -> Vec<(Stage, &str)> {
        [
            (Stage::Researcher, &self.key_points),
            (Stage::Writer, &self.linkedin_post),
            (Stage::ThreadWriter, &self.twitter_thread),
            (Stage::Artist, &self.image_description),
        ]
        .into_iter()
        .filter_map(|(stage, output)| output.as_ref()?.failure().map(|detail| (stage, detail)))
        .collect()
    }

    /// Succeeded overall, but at least one stage failed
    pub fn is_degraded(&self) -> bool {
        self.success && !self.failed_stages().is_empty()
    }
}

/// Sequential extract → research → write → (thread) → illustrate pipeline
pub struct ContentPipeline {
    extractor: Box<dyn TextExtractor>,
    generator: Box<dyn GenerationClient>,
    progress: Option<ProgressBar>,
}

impl ContentPipeline {
    pub fn new(extractor: Box<dyn TextExtractor>, generator: Box<dyn GenerationClient>) -> Self {
        Self {
            extractor,
            generator,
            progress: None,
        }
    }

    /// Wire the yt-dlp extractor and the Groq client from configuration
    pub fn from_config(config: &Config, api_key: ApiKey) -> crate::Result<Self> {
        let generator = GroqClient::new(&config.generation, api_key)?;
        tracing::debug!("Using model {}", generator.model());

        Ok(Self::new(
            Box::new(YtDlpExtractor::from_config(&config.extraction)),
            Box::new(generator),
        ))
    }

    /// Report stage changes on a spinner
    pub fn with_progress(mut self, progress: ProgressBar) -> Self {
        self.progress = Some(progress);
        self
    }

    /// Run every stage in order. Never fails: problems end up in the returned record.
    pub async fn run(&self, source: &SourceInput, include_thread: bool) -> PipelineRun {
        let run_id = Uuid::new_v4();
        let span = tracing::info_span!("pipeline", %run_id);

        self.run_stages(source, include_thread).instrument(span).await
    }

    async fn run_stages(&self, source: &SourceInput, include_thread: bool) -> PipelineRun {
        if source.is_url() {
            self.report("🎬 Fetching YouTube content...");
        } else {
            self.report("🎬 Using provided text...");
        }

        let transcript = match self.extractor.extract(source).await {
            Ok(text) => text,
            Err(e) => {
                tracing::warn!("Extraction failed: {}", e);
                return PipelineRun::failed(e.to_string());
            }
        };

        let mut run = PipelineRun {
            transcript_preview: Some(preview(&transcript)),
            ..PipelineRun::default()
        };

        let key_points = self
            .generate(Stage::Researcher, prompts::researcher(&transcript))
            .await;
        let key_points_text = key_points.as_text().into_owned();
        run.key_points = Some(key_points);

        let linkedin_post = self
            .generate(Stage::Writer, prompts::writer(&key_points_text))
            .await;
        let linkedin_post_text = linkedin_post.as_text().into_owned();
        run.linkedin_post = Some(linkedin_post);

        if include_thread {
            let thread = self
                .generate(Stage::ThreadWriter, prompts::thread_writer(&key_points_text))
                .await;
            run.twitter_thread = Some(thread);
        }

        let image_description = self
            .generate(Stage::Artist, prompts::artist(&linkedin_post_text))
            .await;
        run.image_description = Some(image_description);

        run.success = true;

        let failed = run.failed_stages();
        if failed.is_empty() {
            self.report("✅ All agents completed successfully!");
        } else {
            tracing::warn!("{} stage(s) failed; output contains error text", failed.len());
            self.report("⚠️  Agents completed with errors");
        }

        run
    }

    async fn generate(&self, stage: Stage, prompt: String) -> StageOutput {
        self.report(stage.progress_message());
        tracing::debug!(%stage, prompt_chars = prompt.chars().count(), "Stage started");

        match self
            .generator
            .complete(&prompt, stage.max_tokens(), stage.temperature())
            .await
        {
            Ok(text) => {
                tracing::info!(%stage, "Stage finished ({} chars)", text.chars().count());
                StageOutput::Generated(text)
            }
            Err(e) => {
                tracing::warn!(%stage, "Stage failed: {}", e);
                StageOutput::Failed {
                    detail: e.to_string(),
                }
            }
        }
    }

    fn report(&self, message: &'static str) {
        tracing::debug!("{}", message);
        if let Some(progress) = &self.progress {
            progress.set_message(message);
        }
    }
}

fn preview(text: &str) -> String {
    format!("{}...", crate::utils::truncate_chars(text, PREVIEW_CHARS))
}
