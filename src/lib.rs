mod config;
mod deletion;
mod error;
pub mod firebase;
pub mod memory;
mod models;
mod repository;
mod server;
mod store;
mod view_state;

pub use config::Config;
pub use deletion::{DeletionStep, PostDeletionCoordinator};
pub use error::{BlobError, FeedError, StoreError};
pub use models::{FeedSnapshot, MediaUri, Post, PostId, PostMetadata, StorageRef};
pub use repository::FeedRepository;
pub use server::FeedServer;
pub use store::{BlobStorage, DeletionListener, DocumentStore};
pub use view_state::ViewState;
