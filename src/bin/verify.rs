use clap::Parser;
use reqwest::Client;
use serde_json::Value;

#[derive(Parser, Debug)]
struct Args {
    /// Local URL/Port to use for requests
    /// Ex: http://0.0.0.0:3030
    #[arg(long)]
    local_url: String,

    /// Also delete this post and fetch the feed again
    #[arg(long)]
    delete: Option<String>,
}

#[tokio::main]
async fn main() {
    let args = Args::parse();

    let client = Client::new();

    let feed = fetch_feed(&client, &args.local_url).await;
    let posts = feed["posts"].as_array().map(Vec::len).unwrap_or(0);
    println!(
        "Feed Response ({posts} posts):\n{}",
        serde_json::to_string_pretty(&feed).expect("Failed to pretty print feed JSON")
    );

    if let Some(id) = args.delete {
        let delete_response = client
            .delete(format!("{}/posts/{}", args.local_url, urlencoding::encode(&id)))
            .send()
            .await
            .expect("Delete request failed");
        let status = delete_response.status();
        let delete_body: Value = delete_response
            .json()
            .await
            .expect("Failed to parse delete JSON");
        println!(
            "Delete Response ({status}):\n{}",
            serde_json::to_string_pretty(&delete_body)
                .expect("Failed to pretty print delete JSON")
        );

        let feed = fetch_feed(&client, &args.local_url).await;
        let still_listed = feed["posts"]
            .as_array()
            .is_some_and(|posts| posts.iter().any(|post| post["id"] == id.as_str()));
        println!("Post {id} still listed: {still_listed}");
    }
}

async fn fetch_feed(client: &Client, local_url: &str) -> Value {
    let feed_response = client
        .get(format!("{}/posts", local_url))
        .send()
        .await
        .expect("Feed request failed");

    let feed_body = feed_response
        .text()
        .await
        .expect("Failed to read feed response text");
    serde_json::from_str(&feed_body).expect("Failed to parse feed JSON")
}
