//! repo-digest - summarize a GitHub repository from the command line.

use std::path::PathBuf;
use std::process::ExitCode;

use clap::Parser;
use tracing::error;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use repo_digest::types::RepoReference;
use repo_digest::{DigestConfig, RepoDigest};

#[derive(Parser)]
#[command(name = "repo-digest", about = "Summarize a GitHub repository with an LLM", version)]
struct Cli {
    /// Repository URL, e.g. https://github.com/owner/repo
    github_url: String,

    /// Log level (trace, debug, info, warn, error)
    #[arg(long, default_value = "info")]
    log_level: String,

    /// Summary cache directory
    #[arg(long)]
    cache_dir: Option<PathBuf>,

    /// Character budget for assembled file contents
    #[arg(long)]
    budget: Option<usize>,

    /// Print the assembled prompt instead of calling the LLM
    #[arg(long)]
    dry_run: bool,
}

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();

    let filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(&cli.log_level))
        .unwrap_or_else(|_| EnvFilter::new("info"));

    tracing_subscriber::registry()
        .with(filter)
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    let mut config = DigestConfig::from_env();
    if let Some(dir) = cli.cache_dir {
        config.cache_dir = dir;
    }
    if let Some(budget) = cli.budget {
        config.content_budget = budget;
    }

    match run(&config, &cli.github_url, cli.dry_run).await {
        Ok(output) => {
            println!("{output}");
            ExitCode::SUCCESS
        }
        Err(e) => {
            error!("{e}");
            ExitCode::FAILURE
        }
    }
}

async fn run(
    config: &DigestConfig,
    github_url: &str,
    dry_run: bool,
) -> Result<String, Box<dyn std::error::Error>> {
    let digest = RepoDigest::from_config(config)?;

    if dry_run {
        let repo = RepoReference::parse(github_url)?;
        let (content, _) = digest.assemble(&repo).await?;
        return Ok(content.render());
    }

    let report = digest.summarize(github_url).await?;
    Ok(serde_json::to_string_pretty(&report)?)
}
