use std::sync::Arc;

use clap::Parser;
use submission_ingestor::logging::init_logging;
use submission_ingestor::{GithubContents, IngestorConfig, server};

/// Serve the submission endpoint.
///
/// Repository settings come from the environment (`GITHUB_TOKEN`,
/// `GITHUB_REPO`, `GITHUB_REPO_OWNER`, `SUBMISSIONS_PATH`, ...), optionally
/// through a `.env` file.
#[derive(Parser, Debug)]
#[command(name = "submission-ingestor", version)]
struct Args {
    /// Address to listen on
    #[arg(long, env = "BIND_ADDR", default_value = "0.0.0.0:8888")]
    bind: String,

    /// Emit logs as JSON lines
    #[arg(long)]
    log_json: bool,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    dotenv::dotenv().ok();
    let args = Args::parse();
    init_logging(args.log_json);

    let config = IngestorConfig::from_env();
    match config.target() {
        Ok(target) => tracing::info!("Writing submissions to {}/{}", target.owner, target.name),
        Err(e) => tracing::error!("{e}; every submission will be rejected"),
    }

    let contents = GithubContents::new(config.api_base_url(), config.timeout())?;
    let app = server::router(Arc::new(config.build(contents)));

    let listener = tokio::net::TcpListener::bind(&args.bind).await?;
    tracing::info!("Listening on {}", listener.local_addr()?);
    axum::serve(listener, app)
        .with_graceful_shutdown(server::shutdown_signal())
        .await?;
    Ok(())
}
