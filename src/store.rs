use crate::error::{BlobError, StoreError};
use crate::models::{Post, PostId, PostMetadata, StorageRef};

/// The remote document store holding post records.
pub trait DocumentStore {
    /// All posts, ordered by `postTime` descending.
    fn list_posts_by_time_desc(
        &self,
    ) -> impl std::future::Future<Output = Result<Vec<Post>, StoreError>> + Send;
    /// The id and media of one post, `Ok(None)` when no record has this id.
    fn get_post_metadata(
        &self,
        id: &PostId,
    ) -> impl std::future::Future<Output = Result<Option<PostMetadata>, StoreError>> + Send;
    fn delete_post(
        &self,
        id: &PostId,
    ) -> impl std::future::Future<Output = Result<(), StoreError>> + Send;
}

/// The remote blob storage holding post media.
pub trait BlobStorage {
    /// Fails with `BlobError::NotFound` when the object does not exist.
    fn delete_object(
        &self,
        reference: &StorageRef,
    ) -> impl std::future::Future<Output = Result<(), BlobError>> + Send;
}

/// Told about every deletion that completed in full.
pub trait DeletionListener {
    fn deletion_confirmed(&self, id: &PostId) -> impl std::future::Future<Output = ()> + Send;
}
