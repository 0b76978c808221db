use std::net::SocketAddr;

use anyhow::{Context, Result};
use clap::Parser;
use postfeed::firebase::{self, FirebaseStorageClient, FirestoreClient};
use postfeed::{Config, FeedServer};

#[derive(Parser, Debug)]
struct Args {
    /// Address to bind the feed server to
    #[arg(long, default_value = "0.0.0.0:3030")]
    address: SocketAddr,
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    let config = Config::load_env_config()?;
    let http = firebase::http_client(&config).context("Couldn't build the HTTP client")?;

    let server = FeedServer::new(
        FirestoreClient::new(http.clone(), &config),
        FirebaseStorageClient::new(http, &config),
    );
    server.start(args.address).await;
    Ok(())
}
