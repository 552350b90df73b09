use anyhow::Result;
use std::path::Path;

use crate::cli::OutputFormat;
use crate::pipeline::PipelineRun;

pub mod formatters;

pub use formatters::*;

fn render(run: &PipelineRun, format: &OutputFormat) -> Result<String> {
    Ok(match format {
        OutputFormat::Text => format_as_text(run),
        OutputFormat::Json => format_as_json(run)?,
        OutputFormat::Markdown => format_as_markdown(run),
    })
}

/// Save pipeline output to file
pub fn save_to_file(run: &PipelineRun, path: &Path, format: &OutputFormat) -> Result<()> {
    let content = render(run, format)?;

    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            fs_err::create_dir_all(parent)?;
        }
    }

    fs_err::write(path, content)?;
    Ok(())
}

/// Print pipeline output to console
pub fn print_to_console(run: &PipelineRun, format: &OutputFormat) -> Result<()> {
    let content = render(run, format)?;

    println!("{}", content);
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pipeline::StageOutput;

    #[test]
    fn test_save_to_file_creates_parent_dirs() {
        let dir = tempfile::TempDir::new().unwrap();
        let path = dir.path().join("posts").join("run.md");
        let run = PipelineRun {
            success: true,
            key_points: Some(StageOutput::Generated("1. Focus".into())),
            ..PipelineRun::default()
        };

        save_to_file(&run, &path, &OutputFormat::Markdown).unwrap();

        let written = std::fs::read_to_string(&path).unwrap();
        assert!(written.contains("## 📝 Key Points"));
        assert!(written.contains("1. Focus"));
    }
}
