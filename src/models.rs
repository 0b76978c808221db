use std::fmt;

use chrono::{DateTime, Utc};
use reqwest::Url;
use serde::{Deserialize, Serialize};

use crate::error::BlobError;

const FIREBASE_STORAGE_API_PREFIX: [&str; 2] = ["v0", "b"];
const GOOGLE_STORAGE_HOST: &str = "storage.googleapis.com";

#[derive(Debug, Clone, Hash, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PostId(pub String);

impl fmt::Display for PostId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for PostId {
    fn from(value: &str) -> Self {
        PostId(value.to_owned())
    }
}

/// A feed entry as stored in the `posts` collection.
///
/// Field names on the wire follow the mobile client's documents.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Post {
    pub id: PostId,
    #[serde(rename = "userId")]
    pub author_id: String,
    #[serde(rename = "userName")]
    pub author_name: String,
    #[serde(rename = "userImg")]
    pub author_avatar: Option<String>,
    #[serde(rename = "postTime")]
    pub post_time: DateTime<Utc>,
    #[serde(rename = "post")]
    pub body: String,
    #[serde(rename = "postImg")]
    pub media_uri: Option<MediaUri>,
    #[serde(rename = "likes")]
    pub like_count: u64,
    #[serde(rename = "comments")]
    pub comment_count: u64,
    pub liked: bool,
}

/// What a deletion needs to know about a stored post.
///
/// Decoding it never depends on the rest of the document, so records with
/// legacy or damaged fields can still be deleted.
#[derive(Debug, Clone, PartialEq)]
pub struct PostMetadata {
    pub id: PostId,
    pub media_uri: Option<MediaUri>,
}

impl From<&Post> for PostMetadata {
    fn from(post: &Post) -> Self {
        PostMetadata {
            id: post.id.clone(),
            media_uri: post.media_uri.clone(),
        }
    }
}

/// Posts ordered newest first, exactly as the store returned them.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(transparent)]
pub struct FeedSnapshot {
    pub posts: Vec<Post>,
}

impl FeedSnapshot {
    pub fn new(posts: Vec<Post>) -> Self {
        FeedSnapshot { posts }
    }

    pub fn len(&self) -> usize {
        self.posts.len()
    }

    pub fn is_empty(&self) -> bool {
        self.posts.is_empty()
    }

    pub fn ids(&self) -> Vec<&PostId> {
        self.posts.iter().map(|post| &post.id).collect()
    }

    /// Every adjacent pair is ordered by `post_time`, newest first.
    pub fn is_newest_first(&self) -> bool {
        self.posts
            .windows(2)
            .all(|pair| pair[0].post_time >= pair[1].post_time)
    }
}

/// Download URL or `gs://` reference of a post image.
#[derive(Debug, Clone, Hash, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct MediaUri(pub String);

impl fmt::Display for MediaUri {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Location of an object in blob storage.
#[derive(Debug, Clone, Hash, PartialEq, Eq)]
pub struct StorageRef {
    pub bucket: String,
    pub full_path: String,
}

impl fmt::Display for StorageRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "gs://{}/{}", self.bucket, self.full_path)
    }
}

impl MediaUri {
    /// Resolves the uri to the bucket and object path it points at.
    ///
    /// Understands `gs://bucket/path`, Firebase download urls
    /// (`/v0/b/<bucket>/o/<encoded path>`, on any host so emulators work) and
    /// `https://storage.googleapis.com/<bucket>/<path>`.
    pub fn resolve(&self) -> Result<StorageRef, BlobError> {
        let unresolvable = || BlobError::UnresolvableMedia(self.0.clone());
        let url = Url::parse(&self.0).map_err(|_| unresolvable())?;

        match url.scheme() {
            "gs" => {
                let bucket = url.host_str().ok_or_else(unresolvable)?;
                let full_path = decode(url.path().trim_start_matches('/')).ok_or_else(unresolvable)?;
                storage_ref(bucket, full_path).ok_or_else(unresolvable)
            }
            "http" | "https" => {
                let segments: Vec<&str> = url
                    .path_segments()
                    .map(|s| s.collect())
                    .unwrap_or_default();
                match segments.as_slice() {
                    [v0, b, bucket, "o", object] if [*v0, *b] == FIREBASE_STORAGE_API_PREFIX => {
                        let full_path = decode(object).ok_or_else(unresolvable)?;
                        storage_ref(bucket, full_path).ok_or_else(unresolvable)
                    }
                    [bucket, rest @ ..]
                        if url.host_str() == Some(GOOGLE_STORAGE_HOST) && !rest.is_empty() =>
                    {
                        let full_path = rest
                            .iter()
                            .map(|segment| decode(segment))
                            .collect::<Option<Vec<String>>>()
                            .ok_or_else(unresolvable)?
                            .join("/");
                        storage_ref(bucket, full_path).ok_or_else(unresolvable)
                    }
                    _ => Err(unresolvable()),
                }
            }
            _ => Err(unresolvable()),
        }
    }
}

fn decode(raw: &str) -> Option<String> {
    urlencoding::decode(raw).ok().map(|s| s.into_owned())
}

fn storage_ref(bucket: &str, full_path: String) -> Option<StorageRef> {
    if bucket.is_empty() || full_path.is_empty() {
        return None;
    }
    Some(StorageRef {
        bucket: bucket.to_owned(),
        full_path,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn resolve(uri: &str) -> Result<StorageRef, BlobError> {
        MediaUri(uri.to_owned()).resolve()
    }

    #[test]
    fn resolves_firebase_download_url() {
        let storage_ref = resolve(
            "https://firebasestorage.googleapis.com/v0/b/social-app.appspot.com/o/photos%2Fcat%20one.jpg?alt=media&token=abc",
        )
        .unwrap();
        assert_eq!(storage_ref.bucket, "social-app.appspot.com");
        assert_eq!(storage_ref.full_path, "photos/cat one.jpg");
    }

    #[test]
    fn resolves_emulator_download_url() {
        let storage_ref =
            resolve("http://127.0.0.1:9199/v0/b/demo-bucket/o/photos%2Fa.png?alt=media").unwrap();
        assert_eq!(storage_ref.bucket, "demo-bucket");
        assert_eq!(storage_ref.full_path, "photos/a.png");
    }

    #[test]
    fn resolves_gs_reference() {
        let storage_ref = resolve("gs://social-app.appspot.com/photos/1.jpg").unwrap();
        assert_eq!(storage_ref.to_string(), "gs://social-app.appspot.com/photos/1.jpg");
    }

    #[test]
    fn resolves_public_storage_url() {
        let storage_ref = resolve("https://storage.googleapis.com/bucket/photos/a%2Bb.jpg").unwrap();
        assert_eq!(storage_ref.bucket, "bucket");
        assert_eq!(storage_ref.full_path, "photos/a+b.jpg");
    }

    #[test]
    fn rejects_foreign_urls() {
        for uri in [
            "none",
            "https://example.com/photos/a.jpg",
            "gs://bucket-only",
            "https://firebasestorage.googleapis.com/v0/b/bucket/o/",
            "ftp://bucket/photo.jpg",
        ] {
            assert!(
                matches!(resolve(uri), Err(BlobError::UnresolvableMedia(_))),
                "{uri} should not resolve"
            );
        }
    }

    #[test]
    fn newest_first_check() {
        let at = |secs| DateTime::from_timestamp(secs, 0).unwrap();
        let post = |id: &str, secs| Post {
            id: PostId::from(id),
            author_id: "u1".to_owned(),
            author_name: "Jenny Doe".to_owned(),
            author_avatar: None,
            post_time: at(secs),
            body: String::new(),
            media_uri: None,
            like_count: 0,
            comment_count: 0,
            liked: false,
        };
        assert!(FeedSnapshot::new(vec![post("a", 20), post("b", 20), post("c", 10)]).is_newest_first());
        assert!(!FeedSnapshot::new(vec![post("a", 10), post("b", 20)]).is_newest_first());
        assert!(FeedSnapshot::default().is_newest_first());
    }
}
