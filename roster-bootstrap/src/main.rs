use anyhow::Result;
use clap::Parser;

use roster_infrastructure::AppConfig;

#[derive(Parser, Debug)]
#[command(name = "roster-service")]
#[command(about = "Tournament roster cache and waitlist service", long_about = None)]
struct Args {
    /// Path to config file
    #[arg(short, long)]
    config: Option<String>,
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();
    if let Some(config) = args.config {
        std::env::set_var("ROSTER_CONFIG", config);
    }

    // Loaded before tracing is installed so the log directory is known.
    let config = AppConfig::load().await?;
    let _log_guard = roster_bootstrap::logging::init(config.log_dir.as_deref())?;

    roster_bootstrap::run_standalone(config).await
}
