use clap::Parser;
use std::path::PathBuf;

#[derive(Parser)]
#[command(
    name = "ytsum",
    about = "YouTube transcript summarizer",
    version
)]
pub struct Cli {
    /// YouTube video URL or video ID (prompts on stdin if omitted)
    pub url: Option<String>,

    /// Directory for saved transcripts
    #[arg(short, long)]
    pub output_dir: Option<PathBuf>,

    /// Summarize via OpenAI instead of the basic summary
    #[arg(long)]
    pub openai: bool,

    /// OpenAI model for summarization
    #[arg(long)]
    pub model: Option<String>,

    /// Run the web form instead of the console flow
    #[arg(long)]
    pub serve: bool,

    /// Address to bind in --serve mode
    #[arg(long)]
    pub host: Option<String>,

    /// Port to bind in --serve mode
    #[arg(long, env = "PORT")]
    pub port: Option<u16>,

    /// Show where the title came from and translation quality
    #[arg(short, long)]
    pub verbose: bool,
}
