use std::sync::atomic::{AtomicU64, Ordering};

use log::{debug, error, warn};
use tokio::sync::Mutex;

use crate::error::FeedError;
use crate::models::{FeedSnapshot, PostId};
use crate::repository::FeedRepository;
use crate::store::{DeletionListener, DocumentStore};

#[derive(Debug)]
struct Shown {
    snapshot: Option<FeedSnapshot>,
    is_loading: bool,
    // Ticket of the refresh that produced `snapshot`.
    applied: u64,
}

/// The last fetched feed and whether the first load is still pending.
///
/// Refreshes may overlap. Each one takes a ticket when it is issued, and a
/// result is only shown if no later-issued refresh has been shown already.
#[derive(Debug)]
pub struct ViewState<Store> {
    repository: FeedRepository<Store>,
    issued: AtomicU64,
    shown: Mutex<Shown>,
}

impl<Store: DocumentStore + Sync> ViewState<Store> {
    pub fn new(repository: FeedRepository<Store>) -> Self {
        ViewState {
            repository,
            issued: AtomicU64::new(0),
            shown: Mutex::new(Shown {
                snapshot: None,
                is_loading: true,
                applied: 0,
            }),
        }
    }

    /// Fetches the feed and shows it.
    ///
    /// Returns `Ok(false)` when the fetch succeeded but a refresh issued after
    /// this one had already been shown. On error the previous snapshot stays.
    pub async fn refresh(&self) -> Result<bool, FeedError> {
        let ticket = self.issued.fetch_add(1, Ordering::SeqCst) + 1;
        let fetched = self.repository.fetch_feed().await;

        let mut shown = self.shown.lock().await;
        match fetched {
            Ok(snapshot) if ticket > shown.applied => {
                shown.snapshot = Some(snapshot);
                shown.is_loading = false;
                shown.applied = ticket;
                Ok(true)
            }
            Ok(_) => {
                debug!("Refresh #{ticket} superseded by #{}", shown.applied);
                Ok(false)
            }
            Err(e) => {
                warn!("Refresh #{ticket} failed, keeping the current feed: {e}");
                Err(e)
            }
        }
    }

    pub async fn on_deletion_confirmed(&self) -> Result<bool, FeedError> {
        self.refresh().await
    }

    pub async fn snapshot(&self) -> Option<FeedSnapshot> {
        self.shown.lock().await.snapshot.clone()
    }

    pub async fn is_loading(&self) -> bool {
        self.shown.lock().await.is_loading
    }
}

impl<Store: DocumentStore + Sync + Send> DeletionListener for ViewState<Store> {
    async fn deletion_confirmed(&self, id: &PostId) {
        debug!("Post {id} deleted, refreshing feed");
        if let Err(e) = self.on_deletion_confirmed().await {
            error!("Refresh after deleting {id} failed: {e}");
        }
    }
}
