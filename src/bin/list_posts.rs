use anyhow::{Context, Result};
use clap::Parser;
use env_logger::Env;
use postfeed::firebase::{self, FirestoreClient};
use postfeed::{Config, FeedRepository};

#[derive(Parser, Debug)]
struct Args {
    /// Only print the number of posts
    #[arg(long)]
    count: bool,
}

#[tokio::main]
async fn main() -> Result<()> {
    env_logger::Builder::from_env(Env::default().default_filter_or("warn")).init();
    let args = Args::parse();

    let config = Config::load_env_config()?;
    let http = firebase::http_client(&config).context("Couldn't build the HTTP client")?;
    let repository = FeedRepository::new(FirestoreClient::new(http, &config));

    let snapshot = repository
        .fetch_feed()
        .await
        .context("Fetching the feed failed")?;

    if args.count {
        println!("{}", snapshot.len());
    } else {
        println!("{}", serde_json::to_string_pretty(&snapshot)?);
    }
    Ok(())
}
