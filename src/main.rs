use anyhow::{Context, Result};
use clap::Parser;
use console::style;
use indicatif::{ProgressBar, ProgressStyle};
use std::path::Path;
use std::time::{Duration, Instant};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use social_automator::cli::{Cli, Commands, OutputFormat};
use social_automator::config::{ApiKey, Config};
use social_automator::{
    output, utils, AutomatorError, ContentPipeline, GenerationClient, GroqClient, SourceInput,
};

#[tokio::main]
async fn main() -> Result<()> {
    // Load .env before anything reads the environment
    dotenvy::dotenv().ok();

    let cli = Cli::parse();

    let default_filter = if cli.verbose {
        "social_automator=debug,automator=debug"
    } else {
        "social_automator=info,automator=info"
    };
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| default_filter.into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    if let Commands::Config { show: false } = cli.command {
        return write_default_config(cli.config.as_deref()).await;
    }

    let config = Config::load(cli.config.as_deref()).await?;

    match cli.command {
        Commands::Generate {
            input,
            file,
            no_thread,
            output,
            format,
        } => {
            // Fail fast: no extraction or generation without a key
            let api_key = ApiKey::from_env(&config.generation)?;

            let raw = match (input, file) {
                (Some(text), _) => text,
                (None, Some(path)) => fs_err::read_to_string(&path)
                    .with_context(|| format!("Failed to read input file {}", path.display()))?,
                (None, None) => return Err(AutomatorError::MissingInput.into()),
            };
            if raw.trim().is_empty() {
                return Err(AutomatorError::MissingInput.into());
            }

            let source = SourceInput::classify(raw);
            if source.is_url() {
                let missing_deps = utils::check_dependencies(&config.extraction.yt_dlp_path).await;
                if !missing_deps.is_empty() {
                    eprintln!("⚠️  Dependency check warnings:");
                    for dep in missing_deps {
                        eprintln!("   • {}", dep);
                    }
                }
                tracing::info!(
                    "Generating content from {}",
                    utils::extract_domain(source.value()).unwrap_or_else(|| source.value().to_string())
                );
            }

            let include_thread = config.app.include_thread && !no_thread;
            let format = format.unwrap_or_else(|| OutputFormat::from_config(&config.app.default_output_format));

            let mut pipeline = ContentPipeline::from_config(&config, api_key)?;
            let progress = (!cli.quiet).then(|| {
                let progress = ProgressBar::new_spinner();
                progress.set_style(
                    ProgressStyle::default_spinner()
                        .template("{spinner:.green} [{elapsed_precise}] {msg}")
                        .unwrap_or_else(|_| ProgressStyle::default_spinner()),
                );
                progress.enable_steady_tick(Duration::from_millis(120));
                progress.set_message("🤖 AI Agents are working...");
                progress
            });
            if let Some(progress) = &progress {
                pipeline = pipeline.with_progress(progress.clone());
            }

            let started = Instant::now();
            let run = pipeline.run(&source, include_thread).await;

            if let Some(progress) = progress {
                progress.finish_and_clear();
            }

            if !run.success {
                anyhow::bail!("{}", run.error.as_deref().unwrap_or("Pipeline failed"));
            }

            eprintln!(
                "{} Content generated in {}",
                style("✅").green(),
                utils::format_duration(started.elapsed().as_secs_f64())
            );
            for (stage, detail) in run.failed_stages() {
                eprintln!("{} {} stage failed: {}", style("⚠️").yellow(), stage, detail);
            }

            match output {
                Some(path) => {
                    output::save_to_file(&run, &path, &format)?;
                    println!("Content saved to: {}", path.display());
                }
                None => {
                    output::print_to_console(&run, &format)?;
                }
            }
        }
        Commands::Config { .. } => {
            config.display();
        }
        Commands::Check => {
            let yt_dlp_ok = utils::check_command_available(&config.extraction.yt_dlp_path).await;
            let api_key = ApiKey::from_env(&config.generation);

            let mark = |ok: bool| if ok { style("✔").green() } else { style("✘").red() };
            println!("{} {} (needed for YouTube URLs)", mark(yt_dlp_ok), config.extraction.yt_dlp_path);
            println!("{} {} is set", mark(api_key.is_ok()), config.generation.api_key_env);

            let client = GroqClient::new(&config.generation, api_key?)?;
            match client.complete("Say hello", 10, 0.7).await {
                Ok(_) => println!("{} {} responded", mark(true), client.model()),
                Err(e) => {
                    println!("{} {} did not respond: {}", mark(false), client.model(), e);
                    anyhow::bail!("Connection check failed: {}", e);
                }
            }
        }
    }

    Ok(())
}

/// Write the defaults, leaving an existing file untouched
async fn write_default_config(path: Option<&Path>) -> Result<()> {
    let target = match path {
        Some(path) => path.to_path_buf(),
        None => Config::config_path()?,
    };

    if target.exists() {
        println!("Configuration already exists at: {}", target.display());
        return Ok(());
    }

    let written = Config::default().save(Some(&target)).await?;
    println!("Configuration written to: {}", written.display());
    Ok(())
}
