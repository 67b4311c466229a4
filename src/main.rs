use std::io::{self, BufRead, Write};
use std::path::PathBuf;
use std::sync::Arc;

use eyre::{Result, bail};
use log::{debug, info};

mod cli;

use cli::Cli;
use ytsum::config::{Config, DEFAULT_HOST, DEFAULT_PORT, PipelineConfig};
use ytsum::pipeline::{Pipeline, PipelineError, Progress};

fn setup_logging() -> Result<()> {
    let log_dir = log_dir();
    std::fs::create_dir_all(&log_dir)?;
    let log_file = log_dir.join("ytsum.log");

    let target = Box::new(std::fs::OpenOptions::new().create(true).append(true).open(&log_file)?);

    env_logger::Builder::from_default_env()
        .target(env_logger::Target::Pipe(target))
        .init();

    info!("Logging initialized: {}", log_file.display());
    Ok(())
}

fn log_dir() -> PathBuf {
    dirs::data_local_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join("ytsum")
        .join("logs")
}

fn build_after_help() -> String {
    format!(
        "\nConfig is read from: {}\nLogs are written to: {}",
        ytsum::config::config_path().display(),
        log_dir().join("ytsum.log").display()
    )
}

fn print_progress(event: Progress) {
    match event {
        Progress::FetchingTitle => println!("Fetching video info..."),
        Progress::Title(title) => println!("Video title: {title}"),
        Progress::FetchingTranscript => println!("Fetching transcript..."),
        Progress::Language(lang) => println!("Original language: {lang}"),
        Progress::Translating { done, total } => {
            print!("\rTranslating: {done}/{total} lines");
            if done == total {
                println!("\nTranslation complete!");
            }
            let _ = io::stdout().flush();
        }
        Progress::Summarizing => println!("Generating summary..."),
    }
}

fn read_input() -> Result<String> {
    print!("Enter YouTube URL or Video ID: ");
    io::stdout().flush()?;

    let mut line = String::new();
    io::stdin().lock().read_line(&mut line)?;
    Ok(line.trim().to_string())
}

async fn run_console(pipeline: Pipeline, url: Option<String>, verbose: bool) -> Result<()> {
    let input = match url {
        Some(url) => url,
        None => read_input()?,
    };

    let report = match pipeline.run(&input).await {
        Ok(report) => report,
        Err(PipelineError::NoVideoId { .. }) => bail!("Invalid URL or Video ID"),
        Err(PipelineError::NoTranscript { reason, .. }) => {
            bail!("Could not fetch transcript. The video may not have captions available.\n{reason}")
        }
        Err(e @ PipelineError::Persist(_)) => return Err(e.into()),
    };

    if verbose {
        if report.title.is_degraded() {
            eprintln!("Title: lookups failed, using {}", report.title.title());
        }
        if let Some(ref translation) = report.translation {
            eprintln!(
                "Translation: {} batches, {} failed, {} segments misaligned, {} pieces dropped",
                translation.batches,
                translation.failed_batches,
                translation.misaligned_segments,
                translation.surplus_pieces,
            );
        }
    }

    println!("Transcript saved to: {}", report.path.display());
    println!("\nSummary:\n");
    println!("{}", report.artifact.summary_text);
    Ok(())
}

#[tokio::main]
async fn main() -> Result<()> {
    setup_logging()?;

    let cmd = <Cli as clap::CommandFactory>::command().after_help(build_after_help());
    let matches = cmd.get_matches();
    let cli = <Cli as clap::FromArgMatches>::from_arg_matches(&matches)?;

    // Load config file (non-fatal if missing/invalid)
    let config = Config::load_or_default(&ytsum::config::config_path());
    let pipeline_config = PipelineConfig::resolve(&config, cli.output_dir.clone(), cli.openai, cli.model.clone());
    debug!("Pipeline config: {pipeline_config:?}");

    let client = reqwest::Client::new();
    let pipeline = Pipeline::youtube(pipeline_config, client);
    info!("Saving transcripts to {}", pipeline.config().output_dir.display());

    if cli.serve {
        let host = cli.host.or(config.host).unwrap_or_else(|| DEFAULT_HOST.to_string());
        let port = cli.port.or(config.port).unwrap_or(DEFAULT_PORT);
        ytsum::web::serve(Arc::new(pipeline), &host, port).await
    } else {
        run_console(pipeline.with_progress(print_progress), cli.url, cli.verbose).await
    }
}
