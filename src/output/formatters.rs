use anyhow::Result;
use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::pipeline::{PipelineRun, StageOutput};

#[derive(Serialize)]
struct JsonReport<'a> {
    generated_at: DateTime<Utc>,
    run: &'a PipelineRun,
}

fn sections(run: &PipelineRun) -> Vec<(&'static str, &StageOutput)> {
    [
        ("📝 Key Points", &run.key_points),
        ("✍️ LinkedIn Post", &run.linkedin_post),
        ("🐦 Twitter Thread", &run.twitter_thread),
        ("🎨 Image Concept", &run.image_description),
    ]
    .into_iter()
    .filter_map(|(title, output)| output.as_ref().map(|output| (title, output)))
    .collect()
}

/// Plain text, one underlined section per generated field
pub fn format_as_text(run: &PipelineRun) -> String {
    if !run.success {
        return format!("❌ Error: {}", run.error.as_deref().unwrap_or("unknown error"));
    }

    sections(run)
        .into_iter()
        .map(|(title, output)| {
            let underline = "=".repeat(title.chars().count());
            format!("{}\n{}\n{}\n", title, underline, output.as_text().trim())
        })
        .collect::<Vec<_>>()
        .join("\n")
}

/// Markdown with an H2 per section and the source preview as a quote
pub fn format_as_markdown(run: &PipelineRun) -> String {
    if !run.success {
        return format!(
            "# Social Media Content\n\n> ❌ Error: {}\n",
            run.error.as_deref().unwrap_or("unknown error")
        );
    }

    let mut markdown = String::from("# Social Media Content\n");

    if let Some(preview) = &run.transcript_preview {
        markdown.push_str("\n## 🎬 Source\n\n");
        for line in preview.lines() {
            markdown.push_str("> ");
            markdown.push_str(line);
            markdown.push('\n');
        }
    }

    for (title, output) in sections(run) {
        markdown.push_str(&format!("\n## {}\n\n{}\n", title, output.as_text().trim()));
    }

    markdown
}

/// Pretty JSON of the whole run plus a generation timestamp
pub fn format_as_json(run: &PipelineRun) -> Result<String> {
    let report = JsonReport {
        generated_at: Utc::now(),
        run,
    };
    Ok(serde_json::to_string_pretty(&report)?)
}
