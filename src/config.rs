use std::env;

use anyhow::{Context, Result};
use dotenv::dotenv;

pub const DEFAULT_FIRESTORE_ENDPOINT: &str = "https://firestore.googleapis.com/v1";
pub const DEFAULT_STORAGE_ENDPOINT: &str = "https://firebasestorage.googleapis.com/v0";

#[derive(Debug, Clone)]
pub struct Config {
    pub project_id: String,
    pub database: String,
    pub posts_collection: String,
    pub firestore_endpoint: String,
    pub storage_endpoint: String,
    /// Bearer token issued by the identity provider, passed through as is.
    pub auth_token: Option<String>,
    pub request_timeout_secs: u64,
}

impl Config {
    /// Defaults for everything but the project.
    pub fn for_project(project_id: impl Into<String>) -> Self {
        Config {
            project_id: project_id.into(),
            database: "(default)".to_owned(),
            posts_collection: "posts".to_owned(),
            firestore_endpoint: DEFAULT_FIRESTORE_ENDPOINT.to_owned(),
            storage_endpoint: DEFAULT_STORAGE_ENDPOINT.to_owned(),
            auth_token: None,
            request_timeout_secs: 30,
        }
    }

    /// Reads the configuration from the environment, after loading a `.env`
    /// file if one exists.
    pub fn load_env_config() -> Result<Self> {
        // A missing .env is fine, the variables may come from the environment.
        let _ = dotenv();

        let project_id = env::var("FIRESTORE_PROJECT_ID")
            .context("FIRESTORE_PROJECT_ID environment variable must be set")?;
        let mut config = Config::for_project(project_id);

        if let Ok(database) = env::var("FIRESTORE_DATABASE") {
            config.database = database;
        }
        if let Ok(collection) = env::var("POSTS_COLLECTION") {
            config.posts_collection = collection;
        }
        if let Ok(endpoint) = env::var("FIRESTORE_ENDPOINT") {
            config.firestore_endpoint = endpoint;
        }
        if let Ok(endpoint) = env::var("FIREBASE_STORAGE_ENDPOINT") {
            config.storage_endpoint = endpoint;
        }
        config.auth_token = env::var("FIREBASE_AUTH_TOKEN").ok().filter(|t| !t.is_empty());
        if let Ok(secs) = env::var("REQUEST_TIMEOUT_SECS") {
            config.request_timeout_secs = secs
                .parse()
                .with_context(|| format!("REQUEST_TIMEOUT_SECS must be a number, got {secs:?}"))?;
        }
        Ok(config)
    }
}
