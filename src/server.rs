use std::fmt::Debug;
use std::net::SocketAddr;
use std::sync::Arc;

use env_logger::Env;
use log::{error, info, warn};
use serde::Serialize;
use serde_json::json;
use warp::http::StatusCode;
use warp::Filter;

use crate::deletion::PostDeletionCoordinator;
use crate::error::FeedError;
use crate::models::{Post, PostId};
use crate::repository::FeedRepository;
use crate::store::{BlobStorage, DocumentStore};
use crate::view_state::ViewState;

/// Serves the feed and post deletion over HTTP for a thin UI client.
///
/// - `GET /posts` refreshes and returns the feed.
/// - `DELETE /posts/{id}` deletes a post with its media and refreshes the feed.
pub struct FeedServer<Store, Blobs> {
    view: Arc<ViewState<Store>>,
    coordinator: Arc<PostDeletionCoordinator<Store, Blobs>>,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct FeedBody<'a> {
    posts: &'a [Post],
    is_loading: bool,
    stale: bool,
}

impl<Store, Blobs> FeedServer<Store, Blobs>
where
    Store: DocumentStore + Clone + Send + Sync + 'static,
    Blobs: BlobStorage + Send + Sync + 'static,
{
    pub fn new(store: Store, blobs: Blobs) -> Self {
        FeedServer {
            view: Arc::new(ViewState::new(FeedRepository::new(store.clone()))),
            coordinator: Arc::new(PostDeletionCoordinator::new(store, blobs)),
        }
    }

    pub fn view(&self) -> Arc<ViewState<Store>> {
        self.view.clone()
    }

    pub fn routes(
        &self,
    ) -> impl Filter<Extract = (impl warp::Reply,), Error = warp::Rejection> + Clone {
        let list_view = self.view.clone();
        let list = warp::path("posts")
            .and(warp::path::end())
            .and(warp::get())
            .and_then(move || list_posts(list_view.clone()));

        let delete_view = self.view.clone();
        let coordinator = self.coordinator.clone();
        let delete = warp::path!("posts" / String)
            .and(warp::delete())
            .and_then(move |id: String| {
                delete_post(id, coordinator.clone(), delete_view.clone())
            });

        list.or(delete).with(warp::log::custom(|info| {
            let method = info.method();
            let path = info.path();
            let status = info.status();
            let elapsed = info.elapsed().as_millis();

            if status.is_success() {
                info!(
                    "Method: {}, Path: {}, Status: {}, Elapsed Time: {}ms",
                    method, path, status, elapsed
                );
            } else {
                error!(
                    "Method: {}, Path: {}, Status: {}, Elapsed Time: {}ms",
                    method, path, status, elapsed,
                );
            }
        }))
    }

    /// Loads the feed once, then serves until the process exits.
    pub async fn start(self, address: impl Into<SocketAddr> + Debug + Clone + Send) {
        let _ = env_logger::Builder::from_env(Env::default().default_filter_or("info")).try_init();

        if let Err(e) = self.view.refresh().await {
            warn!("Initial feed load failed, serving once the store is reachable: {e}");
        }

        info!("Serving feed on {:?}", address);
        warp::serve(self.routes()).run(address).await
    }
}

async fn list_posts<Store>(
    view: Arc<ViewState<Store>>,
) -> Result<warp::reply::WithStatus<warp::reply::Json>, warp::Rejection>
where
    Store: DocumentStore + Send + Sync,
{
    let stale = match view.refresh().await {
        Ok(_) => false,
        Err(e) => {
            warn!("Serving the previous feed: {e}");
            true
        }
    };

    let reply = match view.snapshot().await {
        Some(snapshot) => warp::reply::with_status(
            warp::reply::json(&FeedBody {
                posts: &snapshot.posts,
                is_loading: view.is_loading().await,
                stale,
            }),
            StatusCode::OK,
        ),
        None => warp::reply::with_status(
            warp::reply::json(&json!({
                "error": "remote_unavailable",
                "message": "Couldn't reach the server. Try again later.",
                "isLoading": true,
            })),
            StatusCode::SERVICE_UNAVAILABLE,
        ),
    };
    Ok(reply)
}

async fn delete_post<Store, Blobs>(
    raw_id: String,
    coordinator: Arc<PostDeletionCoordinator<Store, Blobs>>,
    view: Arc<ViewState<Store>>,
) -> Result<warp::reply::WithStatus<warp::reply::Json>, warp::Rejection>
where
    Store: DocumentStore + Send + Sync,
    Blobs: BlobStorage + Send + Sync,
{
    let id = match urlencoding::decode(&raw_id) {
        Ok(id) => PostId(id.into_owned()),
        Err(_) => PostId(raw_id.clone()),
    };

    let reply = match coordinator.delete_and_notify(&id, view.as_ref()).await {
        Ok(()) => warp::reply::with_status(warp::reply::json(&json!({ "deleted": id })), StatusCode::OK),
        Err(e) => {
            let (status, code) = error_status(&e);
            warp::reply::with_status(
                warp::reply::json(&json!({
                    "error": code,
                    "message": e.user_message(),
                    "detail": e.to_string(),
                })),
                status,
            )
        }
    };
    Ok(reply)
}

fn error_status(error: &FeedError) -> (StatusCode, &'static str) {
    match error {
        FeedError::RemoteUnavailable(_) => (StatusCode::SERVICE_UNAVAILABLE, "remote_unavailable"),
        FeedError::NotFound(_) => (StatusCode::NOT_FOUND, "not_found"),
        FeedError::MediaDeletionFailed { .. } => (StatusCode::BAD_GATEWAY, "media_deletion_failed"),
        FeedError::RecordDeletionFailed { .. } => {
            (StatusCode::INTERNAL_SERVER_ERROR, "orphaned_media")
        }
    }
}
