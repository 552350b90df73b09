use async_trait::async_trait;
#[cfg(test)]
use mockall::automock;

pub mod groq;

pub use groq::GroqClient;

/// Failures from the text-generation backend
#[derive(thiserror::Error, Debug)]
pub enum GenerationError {
    #[error("Generation timed out after {seconds}s")]
    Timeout { seconds: u64 },

    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("API returned {status}: {body}")]
    Api { status: u16, body: String },

    #[error("API returned an empty completion")]
    EmptyResponse,
}

/// Stateless request/response text completion. One request per call, no retries.
#[cfg_attr(test, automock)]
#[async_trait]
pub trait GenerationClient: Send + Sync {
    async fn complete(
        &self,
        prompt: &str,
        max_tokens: u32,
        temperature: f32,
    ) -> Result<String, GenerationError>;
}
