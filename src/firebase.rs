//! REST adapters for Cloud Firestore and Firebase Storage.

use std::collections::HashMap;
use std::time::Duration;

use chrono::{DateTime, Utc};
use log::{debug, warn};
use reqwest::{Client, RequestBuilder, Response, StatusCode};
use serde::Deserialize;
use serde_json::{json, Value};

use crate::config::Config;
use crate::error::{BlobError, StoreError};
use crate::models::{MediaUri, Post, PostId, PostMetadata, StorageRef};
use crate::store::{BlobStorage, DocumentStore};

/// Builds the HTTP client shared by both adapters.
pub fn http_client(config: &Config) -> reqwest::Result<Client> {
    Client::builder()
        .timeout(Duration::from_secs(config.request_timeout_secs))
        .build()
}

/// A Firestore collection of posts, accessed through the v1 REST API.
#[derive(Debug, Clone)]
pub struct FirestoreClient {
    http: Client,
    documents_url: String,
    collection: String,
    auth_token: Option<String>,
}

impl FirestoreClient {
    pub fn new(http: Client, config: &Config) -> Self {
        FirestoreClient {
            http,
            documents_url: format!(
                "{}/projects/{}/databases/{}/documents",
                config.firestore_endpoint.trim_end_matches('/'),
                config.project_id,
                config.database
            ),
            collection: config.posts_collection.clone(),
            auth_token: config.auth_token.clone(),
        }
    }

    fn document_url(&self, id: &PostId) -> String {
        format!(
            "{}/{}/{}",
            self.documents_url,
            self.collection,
            urlencoding::encode(&id.0)
        )
    }

    fn authorized(&self, request: RequestBuilder) -> RequestBuilder {
        match &self.auth_token {
            Some(token) => request.bearer_auth(token),
            None => request,
        }
    }
}

#[derive(Debug, Deserialize)]
struct RunQueryItem {
    document: Option<Document>,
}

#[derive(Debug, Deserialize)]
struct Document {
    name: String,
    #[serde(default)]
    fields: HashMap<String, Value>,
}

impl DocumentStore for FirestoreClient {
    async fn list_posts_by_time_desc(&self) -> Result<Vec<Post>, StoreError> {
        let query = json!({
            "structuredQuery": {
                "from": [{ "collectionId": self.collection }],
                "orderBy": [{
                    "field": { "fieldPath": "postTime" },
                    "direction": "DESCENDING"
                }]
            }
        });
        let request = self
            .http
            .post(format!("{}:runQuery", self.documents_url))
            .json(&query);
        let response = checked(self.authorized(request).send().await?).await?;
        let items: Vec<RunQueryItem> = response.json().await?;
        // Without matches the API still answers with a single item carrying only a readTime.
        let posts = items
            .into_iter()
            .filter_map(|item| item.document)
            .filter_map(|document| match decode_post(document) {
                Ok(post) => Some(post),
                Err(e) => {
                    warn!("Leaving a document out of the feed: {e}");
                    None
                }
            })
            .collect();
        Ok(posts)
    }

    async fn get_post_metadata(&self, id: &PostId) -> Result<Option<PostMetadata>, StoreError> {
        let request = self.http.get(self.document_url(id));
        let response = self.authorized(request).send().await?;
        if response.status() == StatusCode::NOT_FOUND {
            let body = response.text().await.unwrap_or_default();
            if names_missing_document(&body) {
                return Ok(None);
            }
            return Err(StoreError::Status { status: 404, body });
        }
        let document: Document = checked(response).await?.json().await?;
        decode_metadata(&document).map(Some)
    }

    async fn delete_post(&self, id: &PostId) -> Result<(), StoreError> {
        let request = self.http.delete(self.document_url(id));
        checked(self.authorized(request).send().await?).await?;
        debug!("Firestore document {} deleted", self.document_url(id));
        Ok(())
    }
}

async fn checked(response: Response) -> Result<Response, StoreError> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }
    let body = response.text().await.unwrap_or_default();
    Err(StoreError::Status {
        status: status.as_u16(),
        body,
    })
}

#[derive(Debug, Deserialize)]
struct ErrorBody {
    error: ErrorStatus,
}

#[derive(Debug, Deserialize)]
struct ErrorStatus {
    #[serde(default)]
    message: String,
}

// Firestore also answers 404 for an unknown project or database. Only a
// message naming a document path means the document itself is missing.
fn names_missing_document(body: &str) -> bool {
    serde_json::from_str::<ErrorBody>(body)
        .map(|e| e.error.message.contains("/documents/"))
        .unwrap_or(false)
}

fn document_id(document: &Document) -> Result<&str, StoreError> {
    document
        .name
        .rsplit('/')
        .next()
        .filter(|id| !id.is_empty())
        .ok_or_else(|| StoreError::Decode(format!("document name {:?} has no id", document.name)))
}

fn media_uri(fields: &HashMap<String, Value>) -> Option<MediaUri> {
    string(fields.get("postImg"))
        .filter(|s| !s.is_empty())
        .map(MediaUri)
}

fn decode_metadata(document: &Document) -> Result<PostMetadata, StoreError> {
    Ok(PostMetadata {
        id: PostId(document_id(document)?.to_owned()),
        media_uri: media_uri(&document.fields),
    })
}

fn decode_post(document: Document) -> Result<Post, StoreError> {
    let id = document_id(&document)?;
    let fields = &document.fields;
    let post_time = timestamp(fields.get("postTime")).ok_or_else(|| {
        StoreError::Decode(format!("post {id} has no valid postTime"))
    })?;

    Ok(Post {
        id: PostId(id.to_owned()),
        author_id: string(fields.get("userId")).unwrap_or_default(),
        author_name: string(fields.get("userName")).unwrap_or_default(),
        author_avatar: string(fields.get("userImg")).filter(|s| !s.is_empty()),
        post_time,
        body: string(fields.get("post")).unwrap_or_default(),
        media_uri: media_uri(fields),
        like_count: count(fields.get("likes")),
        comment_count: count(fields.get("comments")),
        liked: fields
            .get("liked")
            .and_then(|v| v.get("booleanValue"))
            .and_then(Value::as_bool)
            .unwrap_or(false),
    })
}

fn string(value: Option<&Value>) -> Option<String> {
    value?.get("stringValue")?.as_str().map(str::to_owned)
}

fn timestamp(value: Option<&Value>) -> Option<DateTime<Utc>> {
    let raw = value?.get("timestampValue")?.as_str()?;
    DateTime::parse_from_rfc3339(raw)
        .ok()
        .map(|t| t.with_timezone(&Utc))
}

// Counters were written as numbers by some clients and as strings by others.
fn count(value: Option<&Value>) -> u64 {
    let Some(value) = value else {
        return 0;
    };
    if let Some(n) = value.get("integerValue") {
        return n
            .as_str()
            .and_then(|s| s.parse().ok())
            .or_else(|| n.as_u64())
            .unwrap_or(0);
    }
    if let Some(n) = value.get("doubleValue").and_then(Value::as_f64) {
        return if n.is_finite() && n > 0.0 { n as u64 } else { 0 };
    }
    value
        .get("stringValue")
        .and_then(Value::as_str)
        .and_then(|s| s.trim().parse().ok())
        .unwrap_or(0)
}

/// Firebase Storage objects, deleted through the v0 REST API.
#[derive(Debug, Clone)]
pub struct FirebaseStorageClient {
    http: Client,
    endpoint: String,
    auth_token: Option<String>,
}

impl FirebaseStorageClient {
    pub fn new(http: Client, config: &Config) -> Self {
        FirebaseStorageClient {
            http,
            endpoint: config.storage_endpoint.trim_end_matches('/').to_owned(),
            auth_token: config.auth_token.clone(),
        }
    }

    fn object_url(&self, reference: &StorageRef) -> String {
        format!(
            "{}/b/{}/o/{}",
            self.endpoint,
            reference.bucket,
            urlencoding::encode(&reference.full_path)
        )
    }
}

impl BlobStorage for FirebaseStorageClient {
    async fn delete_object(&self, reference: &StorageRef) -> Result<(), BlobError> {
        let mut request = self.http.delete(self.object_url(reference));
        if let Some(token) = &self.auth_token {
            request = request.bearer_auth(token);
        }
        let response = request.send().await?;
        match response.status() {
            status if status.is_success() => Ok(()),
            StatusCode::NOT_FOUND => Err(BlobError::NotFound(reference.to_string())),
            status => Err(BlobError::Status {
                status: status.as_u16(),
                body: response.text().await.unwrap_or_default(),
            }),
        }
    }
}
