use thiserror::Error;

use crate::models::PostId;

/// Failures surfaced to callers of the feed core.
///
/// Nothing is retried internally. `RecordDeletionFailed` is the only variant
/// that leaves remote state changed, see [`FeedError::is_partial`].
#[derive(Error, Debug)]
pub enum FeedError {
    #[error("remote store unavailable: {0}")]
    RemoteUnavailable(#[source] StoreError),

    #[error("post not found: {0}")]
    NotFound(PostId),

    #[error("could not delete media for post {post_id}: {source}")]
    MediaDeletionFailed {
        post_id: PostId,
        #[source]
        source: BlobError,
    },

    #[error("media for post {post_id} was deleted but the post record remains: {source}")]
    RecordDeletionFailed {
        post_id: PostId,
        #[source]
        source: StoreError,
    },
}

impl FeedError {
    /// True when the media of a post is gone but its record is still stored.
    pub fn is_partial(&self) -> bool {
        matches!(self, FeedError::RecordDeletionFailed { .. })
    }

    /// Short message suitable for showing to the person who asked for the change.
    pub fn user_message(&self) -> &'static str {
        match self {
            FeedError::RemoteUnavailable(_) => "Couldn't reach the server. Try again later.",
            FeedError::NotFound(_) => "This post no longer exists.",
            FeedError::MediaDeletionFailed { .. } => {
                "Couldn't delete the post image. The post was kept, try again."
            }
            FeedError::RecordDeletionFailed { .. } => {
                "The post image was deleted but the post itself could not be removed."
            }
        }
    }
}

/// Document store backend errors.
#[derive(Error, Debug)]
pub enum StoreError {
    #[error("transport error: {0}")]
    Transport(String),

    #[error("unexpected status {status}: {body}")]
    Status { status: u16, body: String },

    #[error("malformed document: {0}")]
    Decode(String),
}

/// Blob storage backend errors.
#[derive(Error, Debug)]
pub enum BlobError {
    #[error("transport error: {0}")]
    Transport(String),

    #[error("blob not found: {0}")]
    NotFound(String),

    #[error("unexpected status {status}: {body}")]
    Status { status: u16, body: String },

    #[error("media uri cannot be resolved to a storage object: {0}")]
    UnresolvableMedia(String),
}

impl From<reqwest::Error> for StoreError {
    fn from(e: reqwest::Error) -> Self {
        if e.is_decode() {
            StoreError::Decode(e.to_string())
        } else {
            StoreError::Transport(e.to_string())
        }
    }
}

impl From<reqwest::Error> for BlobError {
    fn from(e: reqwest::Error) -> Self {
        BlobError::Transport(e.to_string())
    }
}
