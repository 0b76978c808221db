use chrono::{Duration, Utc};
use postfeed::memory::{sample_post, MemoryBlobStorage, MemoryDocumentStore};
use postfeed::{
    FeedError, FeedRepository, MediaUri, PostDeletionCoordinator, PostId, StorageRef, ViewState,
};

fn m1() -> StorageRef {
    StorageRef {
        bucket: "social-app.appspot.com".to_owned(),
        full_path: "photos/m1.jpg".to_owned(),
    }
}

/// P1 (now, with image M1) and P2 (an hour earlier, text only).
async fn seeded() -> (MemoryDocumentStore, MemoryBlobStorage) {
    let now = Utc::now();
    let store = MemoryDocumentStore::default();
    let blobs = MemoryBlobStorage::default();

    let mut p2 = sample_post("P2");
    p2.post_time = now - Duration::hours(1);
    store.insert(p2).await;

    let mut p1 = sample_post("P1");
    p1.post_time = now;
    p1.media_uri = Some(MediaUri(
        "https://firebasestorage.googleapis.com/v0/b/social-app.appspot.com/o/photos%2Fm1.jpg?alt=media&token=1"
            .to_owned(),
    ));
    store.insert(p1).await;
    blobs.put(m1()).await;

    (store, blobs)
}

fn ids(snapshot: &postfeed::FeedSnapshot) -> Vec<&str> {
    snapshot.ids().into_iter().map(|id| id.0.as_str()).collect()
}

#[tokio::test]
async fn delete_with_image_then_refetch() {
    let (store, blobs) = seeded().await;
    let repository = FeedRepository::new(store.clone());
    let coordinator = PostDeletionCoordinator::new(store.clone(), blobs.clone());

    let before = repository.fetch_feed().await.unwrap();
    assert_eq!(ids(&before), ["P1", "P2"]);

    coordinator.delete_post(&PostId::from("P1")).await.unwrap();
    assert_eq!(blobs.delete_calls().await, vec![m1()]);
    assert!(!blobs.contains(&m1()).await);
    assert_eq!(store.deleted().await, vec![PostId::from("P1")]);

    let after = repository.fetch_feed().await.unwrap();
    assert_eq!(ids(&after), ["P2"]);
}

#[tokio::test]
async fn view_follows_confirmed_deletions_only() {
    let (store, blobs) = seeded().await;
    let view = ViewState::new(FeedRepository::new(store.clone()));
    let coordinator = PostDeletionCoordinator::new(store.clone(), blobs.clone());
    view.refresh().await.unwrap();

    blobs.fail_deletes(true).await;
    let err = coordinator
        .delete_and_notify(&PostId::from("P1"), &view)
        .await
        .unwrap_err();
    assert!(matches!(err, FeedError::MediaDeletionFailed { .. }));
    assert_eq!(ids(&view.snapshot().await.unwrap()), ["P1", "P2"]);

    blobs.fail_deletes(false).await;
    coordinator
        .delete_and_notify(&PostId::from("P1"), &view)
        .await
        .unwrap();
    assert_eq!(ids(&view.snapshot().await.unwrap()), ["P2"]);
}

#[tokio::test]
async fn not_found_leaves_the_store_alone() {
    let (store, blobs) = seeded().await;
    let coordinator = PostDeletionCoordinator::new(store.clone(), blobs.clone());

    let err = coordinator.delete_post(&PostId::from("P9")).await.unwrap_err();
    assert!(matches!(err, FeedError::NotFound(_)));
    assert_eq!(err.user_message(), "This post no longer exists.");
    assert_eq!(store.len().await, 2);
    assert!(blobs.delete_calls().await.is_empty());
}

#[tokio::test]
async fn record_failure_after_image_deletion_is_reported_distinctly() {
    let (store, blobs) = seeded().await;
    store.fail_delete(true).await;
    let coordinator = PostDeletionCoordinator::new(store.clone(), blobs.clone());

    let err = coordinator.delete_post(&PostId::from("P1")).await.unwrap_err();
    assert!(err.is_partial());
    assert!(matches!(err, FeedError::RecordDeletionFailed { ref post_id, .. } if post_id.0 == "P1"));
    assert!(store.contains(&PostId::from("P1")).await);
    assert!(!blobs.contains(&m1()).await);
}

#[tokio::test]
async fn disjoint_deletions_may_interleave() {
    let store = MemoryDocumentStore::default();
    let blobs = MemoryBlobStorage::default();
    for i in 0..20 {
        let mut post = sample_post(&format!("post-{i}"));
        if i % 2 == 0 {
            let reference = StorageRef {
                bucket: "bucket".to_owned(),
                full_path: format!("photos/{i}.jpg"),
            };
            post.media_uri = Some(MediaUri(reference.to_string()));
            blobs.put(reference).await;
        }
        store.insert(post).await;
    }
    let coordinator = std::sync::Arc::new(PostDeletionCoordinator::new(
        store.clone(),
        blobs.clone(),
    ));

    let tasks: Vec<_> = (0..20)
        .map(|i| {
            let coordinator = coordinator.clone();
            tokio::spawn(async move {
                coordinator
                    .delete_post(&PostId(format!("post-{i}")))
                    .await
            })
        })
        .collect();
    for task in tasks {
        task.await.unwrap().unwrap();
    }

    assert!(store.is_empty().await);
    assert_eq!(blobs.delete_calls().await.len(), 10);
}

#[tokio::test]
async fn large_feeds_are_newest_first() {
    let now = Utc::now();
    let store = MemoryDocumentStore::default();
    // Scrambled but deterministic timestamps, with repeats.
    for i in 0..50i64 {
        let mut post = sample_post(&format!("post-{i}"));
        post.post_time = now - Duration::minutes((i * 37) % 23);
        store.insert(post).await;
    }

    let snapshot = FeedRepository::new(store).fetch_feed().await.unwrap();
    assert_eq!(snapshot.len(), 50);
    assert!(snapshot
        .posts
        .windows(2)
        .all(|pair| pair[0].post_time >= pair[1].post_time));
}
