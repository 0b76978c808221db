//! Process-local backends. They keep everything in memory, record the calls
//! made against them and can be told to fail, which is what the tests need.

use std::collections::HashSet;
use std::sync::Arc;

use chrono::Utc;
use tokio::sync::Mutex;

use crate::error::{BlobError, StoreError};
use crate::models::{Post, PostId, PostMetadata, StorageRef};
use crate::store::{BlobStorage, DocumentStore};

#[derive(Debug, Default)]
struct Documents {
    // Insertion order breaks postTime ties.
    posts: Vec<Post>,
    fail_listing: bool,
    fail_lookup: bool,
    fail_delete: bool,
    deleted: Vec<PostId>,
}

#[derive(Debug, Clone, Default)]
pub struct MemoryDocumentStore {
    inner: Arc<Mutex<Documents>>,
}

impl MemoryDocumentStore {
    pub fn with_posts(posts: impl IntoIterator<Item = Post>) -> Self {
        MemoryDocumentStore {
            inner: Arc::new(Mutex::new(Documents {
                posts: posts.into_iter().collect(),
                ..Default::default()
            })),
        }
    }

    /// Inserts a post, replacing any post with the same id.
    pub async fn insert(&self, post: Post) {
        let mut documents = self.inner.lock().await;
        documents.posts.retain(|p| p.id != post.id);
        documents.posts.push(post);
    }

    pub async fn contains(&self, id: &PostId) -> bool {
        self.inner.lock().await.posts.iter().any(|p| &p.id == id)
    }

    pub async fn len(&self) -> usize {
        self.inner.lock().await.posts.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.len().await == 0
    }

    /// Ids passed to successful `delete_post` calls, in call order.
    pub async fn deleted(&self) -> Vec<PostId> {
        self.inner.lock().await.deleted.clone()
    }

    pub async fn fail_listing(&self, fail: bool) {
        self.inner.lock().await.fail_listing = fail;
    }

    pub async fn fail_lookup(&self, fail: bool) {
        self.inner.lock().await.fail_lookup = fail;
    }

    pub async fn fail_delete(&self, fail: bool) {
        self.inner.lock().await.fail_delete = fail;
    }
}

impl DocumentStore for MemoryDocumentStore {
    async fn list_posts_by_time_desc(&self) -> Result<Vec<Post>, StoreError> {
        let documents = self.inner.lock().await;
        if documents.fail_listing {
            return Err(StoreError::Transport("listing disabled".to_owned()));
        }
        let mut posts = documents.posts.clone();
        posts.sort_by(|a, b| b.post_time.cmp(&a.post_time));
        Ok(posts)
    }

    async fn get_post_metadata(&self, id: &PostId) -> Result<Option<PostMetadata>, StoreError> {
        let documents = self.inner.lock().await;
        if documents.fail_lookup {
            return Err(StoreError::Transport("lookup disabled".to_owned()));
        }
        Ok(documents
            .posts
            .iter()
            .find(|p| &p.id == id)
            .map(PostMetadata::from))
    }

    async fn delete_post(&self, id: &PostId) -> Result<(), StoreError> {
        let mut documents = self.inner.lock().await;
        if documents.fail_delete {
            return Err(StoreError::Status {
                status: 503,
                body: "delete disabled".to_owned(),
            });
        }
        documents.posts.retain(|p| &p.id != id);
        documents.deleted.push(id.clone());
        Ok(())
    }
}

#[derive(Debug, Default)]
struct Objects {
    stored: HashSet<StorageRef>,
    fail_deletes: bool,
    delete_calls: Vec<StorageRef>,
}

#[derive(Debug, Clone, Default)]
pub struct MemoryBlobStorage {
    inner: Arc<Mutex<Objects>>,
}

impl MemoryBlobStorage {
    pub async fn put(&self, reference: StorageRef) {
        self.inner.lock().await.stored.insert(reference);
    }

    pub async fn contains(&self, reference: &StorageRef) -> bool {
        self.inner.lock().await.stored.contains(reference)
    }

    /// Every `delete_object` call, successful or not, in call order.
    pub async fn delete_calls(&self) -> Vec<StorageRef> {
        self.inner.lock().await.delete_calls.clone()
    }

    pub async fn fail_deletes(&self, fail: bool) {
        self.inner.lock().await.fail_deletes = fail;
    }
}

impl BlobStorage for MemoryBlobStorage {
    async fn delete_object(&self, reference: &StorageRef) -> Result<(), BlobError> {
        let mut objects = self.inner.lock().await;
        objects.delete_calls.push(reference.clone());
        if objects.fail_deletes {
            return Err(BlobError::Status {
                status: 500,
                body: "delete disabled".to_owned(),
            });
        }
        if objects.stored.remove(reference) {
            Ok(())
        } else {
            Err(BlobError::NotFound(reference.to_string()))
        }
    }
}

/// A text-only post written now by a fixed author.
///
/// Fixture for tests and local demos of the in-memory backends.
#[doc(hidden)]
pub fn sample_post(id: &str) -> Post {
    Post {
        id: PostId::from(id),
        author_id: "user-1".to_owned(),
        author_name: "Jenny Doe".to_owned(),
        author_avatar: None,
        post_time: Utc::now(),
        body: "Hey there, this is my test for a post of my social app.".to_owned(),
        media_uri: None,
        like_count: 0,
        comment_count: 0,
        liked: false,
    }
}
