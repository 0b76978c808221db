use log::{debug, error, info};

use crate::error::FeedError;
use crate::models::FeedSnapshot;
use crate::store::DocumentStore;

/// Reads the feed out of a [`DocumentStore`].
#[derive(Debug, Clone)]
pub struct FeedRepository<Store> {
    store: Store,
}

impl<Store: DocumentStore + Sync> FeedRepository<Store> {
    pub fn new(store: Store) -> Self {
        FeedRepository { store }
    }

    /// Fetches every post, newest first.
    ///
    /// An empty store yields an empty snapshot. Store failures are returned as
    /// `FeedError::RemoteUnavailable` without retrying.
    pub async fn fetch_feed(&self) -> Result<FeedSnapshot, FeedError> {
        let posts = self.store.list_posts_by_time_desc().await.map_err(|e| {
            error!("Fetching posts failed: {e}");
            FeedError::RemoteUnavailable(e)
        })?;
        let snapshot = FeedSnapshot::new(posts);
        debug_assert!(
            snapshot.is_newest_first(),
            "store returned posts out of postTime order"
        );
        info!("Total posts: {}", snapshot.len());
        debug!("Fetched {:?}", snapshot.ids());
        Ok(snapshot)
    }
}
