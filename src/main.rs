use clap::Parser;
use tracing_subscriber::EnvFilter;

use licensemap::{Config, GitHubClient, Pipeline, PipelineConfig, RunReport, Storage};

#[derive(Parser, Debug)]
#[command(name = "licensemap")]
#[command(version = "0.1.0")]
#[command(about = "Count license usage of GitHub users by location")]
struct Args {
    /// Database holding the users and locations tables
    #[arg(long)]
    database: Option<String>,

    /// Maximum candidate users to process this run
    #[arg(long)]
    batch_size: Option<usize>,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize logging
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::from_default_env()
                .add_directive("licensemap=info".parse()?)
                .add_directive("reqwest=warn".parse()?),
        )
        .init();

    // Load environment variables
    dotenvy::dotenv().ok();

    let args = Args::parse();

    let mut config = Config::from_env()?;
    if let Some(database) = args.database {
        config.database_path = database;
    }
    if let Some(batch_size) = args.batch_size {
        config.batch_size = batch_size;
    }

    let storage = Storage::new(&config.database_path)?;
    let github = GitHubClient::new(&config.github_token)?;

    let pipeline_config = PipelineConfig::from(&config);
    let mut pipeline = Pipeline::new(github, storage, pipeline_config);

    tracing::info!(
        "Starting license aggregation run (batch size {})",
        config.batch_size
    );
    let report = pipeline.run().await?;

    print_report(&report);

    Ok(())
}

fn print_report(report: &RunReport) {
    println!("\n=== License aggregation run ===\n");
    println!("Users processed: {}", report.processed);
    println!("Tallies applied: {}", report.applied);
    println!("Empty tallies:   {}", report.empty);
    println!("Failures:        {}", report.failed);
}
