use anyhow::{bail, Context, Result};
use clap::Parser;
use env_logger::Env;
use postfeed::firebase::{self, FirebaseStorageClient, FirestoreClient};
use postfeed::{Config, PostDeletionCoordinator, PostId};

#[derive(Parser, Debug)]
struct Args {
    /// Id of the post document to delete, together with its image.
    #[arg(long)]
    id: String,
}

#[tokio::main]
async fn main() -> Result<()> {
    env_logger::Builder::from_env(Env::default().default_filter_or("info")).init();
    let args = Args::parse();

    let config = Config::load_env_config()?;
    let http = firebase::http_client(&config).context("Couldn't build the HTTP client")?;
    let coordinator = PostDeletionCoordinator::new(
        FirestoreClient::new(http.clone(), &config),
        FirebaseStorageClient::new(http, &config),
    );

    let id = PostId(args.id);
    match coordinator.delete_post(&id).await {
        Ok(()) => {
            println!("Post deleted: your post {id} has been deleted successfully");
            Ok(())
        }
        Err(e) if e.is_partial() => {
            eprintln!("{}", e.user_message());
            bail!("post {id} needs manual cleanup: {e}")
        }
        Err(e) => {
            eprintln!("{}", e.user_message());
            Err(e).context(format!("Deleting post {id} failed"))
        }
    }
}
