use std::fmt;

use log::{error, info, warn};

use crate::error::{BlobError, FeedError};
use crate::models::{MediaUri, PostId, PostMetadata};
use crate::store::{BlobStorage, DeletionListener, DocumentStore};

/// The steps of a post deletion, in the order they run.
///
/// A step only runs when every step before it succeeded.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DeletionStep {
    LookupRecord,
    DeleteMedia,
    DeleteRecord,
}

impl fmt::Display for DeletionStep {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            DeletionStep::LookupRecord => "lookup record",
            DeletionStep::DeleteMedia => "delete media",
            DeletionStep::DeleteRecord => "delete record",
        };
        f.write_str(name)
    }
}

/// Deletes posts together with the image they reference.
///
/// The image goes first. If it cannot be deleted the record is left alone, so
/// a failed deletion can simply be retried.
#[derive(Debug, Clone)]
pub struct PostDeletionCoordinator<Store, Blobs> {
    store: Store,
    blobs: Blobs,
}

impl<Store, Blobs> PostDeletionCoordinator<Store, Blobs>
where
    Store: DocumentStore + Sync,
    Blobs: BlobStorage + Sync,
{
    pub fn new(store: Store, blobs: Blobs) -> Self {
        PostDeletionCoordinator { store, blobs }
    }

    /// Deletes the post and its media.
    ///
    /// `Ok(())` means both are gone. Every error except
    /// `FeedError::RecordDeletionFailed` leaves the record in the store.
    pub async fn delete_post(&self, id: &PostId) -> Result<(), FeedError> {
        info!("Deleting post {id}");
        let metadata = self.lookup_record(id).await?;
        if let Some(media) = &metadata.media_uri {
            self.delete_media(id, media).await?;
        }
        self.delete_record(id).await?;
        info!("Post {id} deleted");
        Ok(())
    }

    /// Runs [`Self::delete_post`] and tells `listener` when it succeeded.
    pub async fn delete_and_notify<L>(&self, id: &PostId, listener: &L) -> Result<(), FeedError>
    where
        L: DeletionListener + Sync,
    {
        self.delete_post(id).await?;
        listener.deletion_confirmed(id).await;
        Ok(())
    }

    async fn lookup_record(&self, id: &PostId) -> Result<PostMetadata, FeedError> {
        match self.store.get_post_metadata(id).await {
            Ok(Some(metadata)) => Ok(metadata),
            Ok(None) => {
                warn!("{}: post {id} does not exist", DeletionStep::LookupRecord);
                Err(FeedError::NotFound(id.clone()))
            }
            Err(e) => {
                error!("{}: post {id}: {e}", DeletionStep::LookupRecord);
                Err(FeedError::RemoteUnavailable(e))
            }
        }
    }

    async fn delete_media(&self, id: &PostId, media: &MediaUri) -> Result<(), FeedError> {
        let step = DeletionStep::DeleteMedia;
        let media_failed = |source: BlobError| FeedError::MediaDeletionFailed {
            post_id: id.clone(),
            source,
        };
        let reference = media.resolve().map_err(|e| {
            error!("{step}: post {id}: {e}");
            media_failed(e)
        })?;
        match self.blobs.delete_object(&reference).await {
            Ok(()) => {
                info!("{step}: {media} has been deleted");
                Ok(())
            }
            Err(BlobError::NotFound(_)) => {
                warn!("{step}: {reference} was already gone");
                Ok(())
            }
            Err(e) => {
                error!("{step}: error while deleting {reference}: {e}");
                Err(media_failed(e))
            }
        }
    }

    async fn delete_record(&self, id: &PostId) -> Result<(), FeedError> {
        self.store.delete_post(id).await.map_err(|source| {
            error!("{}: post {id}: {source}", DeletionStep::DeleteRecord);
            FeedError::RecordDeletionFailed {
                post_id: id.clone(),
                source,
            }
        })
    }
}
