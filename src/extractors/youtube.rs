use async_trait::async_trait;
use serde::Deserialize;
use std::path::{Path, PathBuf};
use std::process::{Output, Stdio};
use std::time::Duration;
use tempfile::TempDir;
use tokio::process::Command;

use super::{ExtractionError, SourceInput, TextExtractor};
use crate::config::ExtractionConfig;

/// yt-dlp caption track in the `json3` format
#[derive(Debug, Deserialize)]
struct Json3Captions {
    #[serde(default)]
    events: Vec<Json3Event>,
}

#[derive(Debug, Deserialize)]
struct Json3Event {
    #[serde(default)]
    segs: Vec<Json3Segment>,
}

#[derive(Debug, Deserialize)]
struct Json3Segment {
    #[serde(default)]
    utf8: String,
}

/// Video text extractor using yt-dlp.
///
/// Each call spawns its own yt-dlp processes and writes captions into its own
/// temporary directory, so one extractor can serve concurrent runs.
pub struct YtDlpExtractor {
    yt_dlp_path: String,
    subtitle_language: String,
    subtitle_timeout: Duration,
    description_timeout: Duration,
    min_content_chars: usize,
}

impl YtDlpExtractor {
    pub fn new() -> Self {
        Self::from_config(&ExtractionConfig::default())
    }

    pub fn from_config(config: &ExtractionConfig) -> Self {
        Self {
            yt_dlp_path: config.yt_dlp_path.clone(),
            subtitle_language: config.subtitle_language.clone(),
            subtitle_timeout: Duration::from_secs(config.subtitle_timeout_secs),
            description_timeout: Duration::from_secs(config.description_timeout_secs),
            min_content_chars: config.min_content_chars,
        }
    }

    /// Run a yt-dlp invocation, bounded by `limit`. The child is killed if the bound is hit.
    async fn run_bounded(&self, mut command: Command, limit: Duration) -> Result<Output, ExtractionError> {
        command
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true);

        match tokio::time::timeout(limit, command.output()).await {
            Err(_) => {
                tracing::warn!("yt-dlp did not finish within {}s", limit.as_secs());
                Err(ExtractionError::Timeout {
                    seconds: limit.as_secs(),
                })
            }
            Ok(Err(e)) if e.kind() == std::io::ErrorKind::NotFound => Err(ExtractionError::ToolMissing {
                tool: self.yt_dlp_path.clone(),
            }),
            Ok(Err(e)) => Err(ExtractionError::Unknown {
                detail: e.to_string(),
            }),
            Ok(Ok(output)) => Ok(output),
        }
    }

    /// Download the caption track (manual or automatic) and flatten it to text
    async fn fetch_subtitles(&self, url: &str) -> Result<Option<String>, ExtractionError> {
        tracing::debug!("Fetching {} subtitles for: {}", self.subtitle_language, url);

        let temp_dir = TempDir::new().map_err(|e| ExtractionError::Unknown {
            detail: format!("Failed to create temporary directory: {}", e),
        })?;
        let template = temp_dir.path().join("subs.%(ext)s");

        let mut command = Command::new(&self.yt_dlp_path);
        command
            .args([
                "--skip-download",
                "--write-auto-subs",
                "--write-subs",
                "--sub-langs",
                self.subtitle_language.as_str(),
                "--sub-format",
                "json3",
                "--no-playlist",
                "-o",
            ])
            .arg(&template)
            .arg(url);

        let output = self.run_bounded(command, self.subtitle_timeout).await?;

        if !output.status.success() {
            let error = String::from_utf8_lossy(&output.stderr);
            tracing::debug!("Subtitle download failed, falling back to description: {}", error.trim());
            return Ok(None);
        }

        let Some(path) = find_caption_file(temp_dir.path()) else {
            tracing::debug!("No caption track available for: {}", url);
            return Ok(None);
        };

        let content = fs_err::read_to_string(&path).map_err(|e| ExtractionError::Unknown {
            detail: e.to_string(),
        })?;

        Ok(flatten_json3(&content))
    }

    /// Get the video description
    async fn fetch_description(&self, url: &str) -> Result<String, ExtractionError> {
        tracing::debug!("Fetching description for: {}", url);

        let mut command = Command::new(&self.yt_dlp_path);
        command
            .args(["--skip-download", "--get-description", "--no-playlist"])
            .arg(url);

        let output = self.run_bounded(command, self.description_timeout).await?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            let mut detail = String::from("Video may be private or restricted.");
            if !stderr.trim().is_empty() {
                detail.push(' ');
                detail.push_str(stderr.trim());
            }
            return Err(ExtractionError::Unknown { detail });
        }

        Ok(String::from_utf8_lossy(&output.stdout).trim().to_string())
    }

    async fn extract_from_url(&self, url: &str) -> Result<String, ExtractionError> {
        // yt-dlp gets the URL without surrounding whitespace
        let url = url.trim();

        if let Some(transcript) = self.fetch_subtitles(url).await? {
            if transcript.chars().count() >= self.min_content_chars {
                tracing::info!("Using subtitles ({} chars)", transcript.chars().count());
                return Ok(transcript);
            }
        }

        let description = self.fetch_description(url).await?;
        if description.chars().count() < self.min_content_chars {
            return Err(ExtractionError::NoContent);
        }

        tracing::info!("Using video description ({} chars)", description.chars().count());
        Ok(description)
    }
}

#[async_trait]
impl TextExtractor for YtDlpExtractor {
    async fn extract(&self, source: &SourceInput) -> Result<String, ExtractionError> {
        match source {
            SourceInput::RawText(text) => Ok(text.clone()),
            SourceInput::Url(url) => self.extract_from_url(url).await,
        }
    }
}

impl Default for YtDlpExtractor {
    fn default() -> Self {
        Self::new()
    }
}

fn find_caption_file(dir: &Path) -> Option<PathBuf> {
    fs_err::read_dir(dir)
        .ok()?
        .filter_map(|entry| entry.ok())
        .map(|entry| entry.path())
        .find(|path| path.extension().is_some_and(|ext| ext == "json3"))
}

/// Join caption events into a single line of text. `None` when there is nothing to read.
fn flatten_json3(content: &str) -> Option<String> {
    let captions: Json3Captions = serde_json::from_str(content).ok()?;

    let joined = captions
        .events
        .iter()
        .map(|event| event.segs.iter().map(|seg| seg.utf8.as_str()).collect::<String>())
        .collect::<Vec<_>>()
        .join(" ");

    let text = joined.split_whitespace().collect::<Vec<_>>().join(" ");
    (!text.is_empty()).then_some(text)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serial_test::serial;

    fn extractor_for(path: &Path, subtitle_timeout_secs: u64) -> YtDlpExtractor {
        YtDlpExtractor::from_config(&ExtractionConfig {
            yt_dlp_path: path.to_string_lossy().into_owned(),
            subtitle_timeout_secs,
            description_timeout_secs: subtitle_timeout_secs,
            ..ExtractionConfig::default()
        })
    }

    #[cfg(unix)]
    fn write_stub(dir: &Path, body: &str) -> PathBuf {
        use std::os::unix::fs::PermissionsExt;

        let path = dir.join("yt-dlp");
        std::fs::write(&path, format!("#!/bin/sh\n{}\n", body)).unwrap();
        let mut perms = std::fs::metadata(&path).unwrap().permissions();
        perms.set_mode(0o755);
        std::fs::set_permissions(&path, perms).unwrap();
        path
    }

    const VIDEO_URL: &str = "https://www.youtube.com/watch?v=dQw4w9WgXcQ";

    #[test]
    fn test_flatten_json3() {
        let content = r#"{"events":[
            {"tStartMs":0,"segs":[{"utf8":"Remote"},{"utf8":" work"}]},
            {"tStartMs":900,"segs":[{"utf8":"\n"}]},
            {"tStartMs":1200,"segs":[{"utf8":"boosts  productivity"}]},
            {"tStartMs":2000}
        ]}"#;
        assert_eq!(flatten_json3(content).as_deref(), Some("Remote work boosts productivity"));
        assert_eq!(flatten_json3(r#"{"events":[{"segs":[{"utf8":"\n"}]}]}"#), None);
        assert_eq!(flatten_json3("not json"), None);
    }

    #[tokio::test]
    async fn test_raw_text_is_returned_verbatim() {
        let extractor = YtDlpExtractor::new();
        let text = "short";
        let result = extractor.extract(&SourceInput::RawText(text.into())).await;
        assert_eq!(result, Ok(text.to_string()));
    }

    #[tokio::test]
    #[serial]
    async fn test_missing_tool() {
        let extractor = extractor_for(Path::new("/nonexistent/bin/yt-dlp"), 5);
        let result = extractor.extract(&SourceInput::classify(VIDEO_URL)).await;
        assert!(matches!(result, Err(ExtractionError::ToolMissing { .. })));
    }

    #[cfg(unix)]
    #[tokio::test]
    #[serial]
    async fn test_timeout_is_bounded() {
        let dir = TempDir::new().unwrap();
        let stub = write_stub(dir.path(), "exec sleep 10");
        let extractor = extractor_for(&stub, 1);

        let started = std::time::Instant::now();
        let result = extractor.extract(&SourceInput::classify(VIDEO_URL)).await;

        assert_eq!(result, Err(ExtractionError::Timeout { seconds: 1 }));
        assert!(started.elapsed() < Duration::from_secs(5));
    }

    #[cfg(unix)]
    #[tokio::test]
    #[serial]
    async fn test_short_description_is_no_content() {
        let dir = TempDir::new().unwrap();
        let stub = write_stub(
            dir.path(),
            r#"case "$*" in
  *--get-description*) echo "A fifty character description for this video....."; exit 0;;
  *) echo "no subtitles" >&2; exit 1;;
esac"#,
        );
        let extractor = extractor_for(&stub, 5);

        let result = extractor.extract(&SourceInput::classify(VIDEO_URL)).await;
        assert_eq!(result, Err(ExtractionError::NoContent));
    }

    #[cfg(unix)]
    #[tokio::test]
    #[serial]
    async fn test_description_fallback() {
        let dir = TempDir::new().unwrap();
        let description = "In this talk we look at how remote work changes the way teams plan, \
                           communicate and ship software, with five concrete habits to adopt.";
        let stub = write_stub(
            dir.path(),
            &format!(
                r#"case "$*" in
  *--get-description*) echo "{}"; exit 0;;
  *) exit 0;;
esac"#,
                description
            ),
        );
        let extractor = extractor_for(&stub, 5);

        let result = extractor.extract(&SourceInput::classify(VIDEO_URL)).await;
        assert_eq!(result, Ok(description.to_string()));
    }

    #[cfg(unix)]
    #[tokio::test]
    #[serial]
    async fn test_restricted_video_is_unknown_error() {
        let dir = TempDir::new().unwrap();
        let stub = write_stub(dir.path(), r#"echo "ERROR: Private video" >&2; exit 1"#);
        let extractor = extractor_for(&stub, 5);

        match extractor.extract(&SourceInput::classify(VIDEO_URL)).await {
            Err(ExtractionError::Unknown { detail }) => assert!(detail.contains("Private video")),
            other => panic!("unexpected result: {:?}", other),
        }
    }

    #[cfg(unix)]
    #[tokio::test]
    #[serial]
    async fn test_subtitles_are_preferred() {
        let dir = TempDir::new().unwrap();
        let captions = serde_json::json!({
            "events": [
                {"segs": [{"utf8": "Working remotely lets people focus on deep work"}]},
                {"segs": [{"utf8": "\n"}]},
                {"segs": [{"utf8": "and cuts the time lost to commuting every single day of the week."}]}
            ]
        })
        .to_string();
        let body = String::from(
            r#"case "$*" in
  *--get-description*) echo "description should not be used"; exit 1;;
esac
out=""
while [ $# -gt 0 ]; do
  if [ "$1" = "-o" ]; then out="$2"; fi
  shift
done
cat > "$(dirname "$out")/subs.en.json3" <<'JSON'
"#,
        ) + &captions
            + "\nJSON";
        let stub = write_stub(dir.path(), &body);
        let extractor = extractor_for(&stub, 5);

        let text = extractor
            .extract(&SourceInput::classify(VIDEO_URL))
            .await
            .unwrap();
        assert_eq!(
            text,
            "Working remotely lets people focus on deep work and cuts the time lost to commuting every single day of the week."
        );
    }

    #[cfg(unix)]
    #[tokio::test]
    #[serial]
    async fn test_restricted_video_without_stderr() {
        let dir = TempDir::new().unwrap();
        let stub = write_stub(dir.path(), "exit 1");
        let extractor = extractor_for(&stub, 5);

        let result = extractor.extract(&SourceInput::classify(VIDEO_URL)).await;
        assert_eq!(
            result,
            Err(ExtractionError::Unknown {
                detail: "Video may be private or restricted.".to_string()
            })
        );
    }

    #[cfg(unix)]
    #[tokio::test]
    #[serial]
    async fn test_url_is_trimmed_before_yt_dlp() {
        let dir = TempDir::new().unwrap();
        let description = "A long description that is only printed when yt-dlp receives the exact URL, \
                           without any stray whitespace or newline characters attached to it.";
        let stub = write_stub(
            dir.path(),
            &format!(
                r#"for last; do :; done
case "$*" in
  *--get-description*)
    if [ "$last" = "{}" ]; then echo "{}"; exit 0; fi
    echo "unexpected url: [$last]" >&2; exit 1;;
  *) exit 1;;
esac"#,
                VIDEO_URL, description
            ),
        );
        let extractor = extractor_for(&stub, 5);

        let source = SourceInput::classify(format!("{}\n", VIDEO_URL));
        assert!(source.is_url());
        let result = extractor.extract(&source).await;
        assert_eq!(result, Ok(description.to_string()));
    }

    #[cfg(unix)]
    #[tokio::test]
    #[serial]
    async fn test_short_subtitles_fall_back_to_description() {
        let dir = TempDir::new().unwrap();
        let captions = serde_json::json!({
            "events": [{"segs": [{"utf8": "[Music]"}]}]
        })
        .to_string();
        let description = "Five habits for remote teams: write decisions down, protect focus time, \
                           keep meetings short, default to async updates, and review work openly.";
        let body = format!(
            r#"case "$*" in
  *--get-description*) echo "{}"; exit 0;;
esac
out=""
while [ $# -gt 0 ]; do
  if [ "$1" = "-o" ]; then out="$2"; fi
  shift
done
cat > "$(dirname "$out")/subs.en.json3" <<'JSON'
"#,
            description
        ) + &captions
            + "\nJSON";
        let stub = write_stub(dir.path(), &body);
        let extractor = extractor_for(&stub, 5);

        let result = extractor.extract(&SourceInput::classify(VIDEO_URL)).await;
        assert_eq!(result, Ok(description.to_string()));
    }
}
