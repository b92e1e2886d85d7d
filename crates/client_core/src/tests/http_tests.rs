use super::*;
use std::sync::Arc;

use axum::{
    extract::{Path, State},
    http::StatusCode,
    routing::{get, put},
    Json, Router,
};
use shared::error::ErrorCode;
use tokio::{net::TcpListener, sync::Mutex};

use crate::{test_support::sample_tree, InMemoryNavigationBackend};

#[derive(Clone)]
struct ServerState {
    backend: Arc<InMemoryNavigationBackend>,
    group_order_posts: Arc<Mutex<Vec<Vec<GroupOrderEntry>>>>,
}

type ApiFailure = (StatusCode, Json<ApiError>);

fn failure(err: anyhow::Error) -> ApiFailure {
    match err.downcast::<ApiException>() {
        Ok(api) => (StatusCode::NOT_FOUND, Json(ApiError::from(api))),
        Err(other) => (
            StatusCode::INTERNAL_SERVER_ERROR,
            Json(ApiError::new(ErrorCode::Internal, other.to_string())),
        ),
    }
}

async fn list_tree(
    State(state): State<ServerState>,
) -> Result<Json<Vec<GroupWithSites>>, ApiFailure> {
    state
        .backend
        .get_groups_with_sites()
        .await
        .map(Json)
        .map_err(failure)
}

async fn put_group_orders(
    State(state): State<ServerState>,
    Json(entries): Json<Vec<GroupOrderEntry>>,
) -> Result<Json<SuccessResponse>, ApiFailure> {
    state.group_order_posts.lock().await.push(entries.clone());
    let success = state
        .backend
        .update_group_order(&entries)
        .await
        .map_err(failure)?;
    Ok(Json(SuccessResponse { success }))
}

async fn put_site_orders(
    State(state): State<ServerState>,
    Json(entries): Json<Vec<SiteOrderEntry>>,
) -> Result<Json<SuccessResponse>, ApiFailure> {
    let success = state
        .backend
        .update_site_order(&entries)
        .await
        .map_err(failure)?;
    Ok(Json(SuccessResponse { success }))
}

async fn put_site(
    State(state): State<ServerState>,
    Path(site_id): Path<i64>,
    Json(patch): Json<SitePatch>,
) -> Result<Json<Site>, ApiFailure> {
    state
        .backend
        .update_site(SiteId(site_id), &patch)
        .await
        .map(Json)
        .map_err(failure)
}

async fn delete_group(
    State(state): State<ServerState>,
    Path(group_id): Path<i64>,
) -> Result<Json<SuccessResponse>, ApiFailure> {
    let success = state
        .backend
        .delete_group(GroupId(group_id))
        .await
        .map_err(failure)?;
    Ok(Json(SuccessResponse { success }))
}

async fn broken() -> (StatusCode, &'static str) {
    (StatusCode::INTERNAL_SERVER_ERROR, "upstream exploded")
}

async fn spawn_navigation_server() -> Result<(String, ServerState)> {
    std::env::set_var("NO_PROXY", "127.0.0.1,localhost");
    let listener = TcpListener::bind("127.0.0.1:0").await?;
    let addr = listener.local_addr()?;
    let state = ServerState {
        backend: Arc::new(InMemoryNavigationBackend::seeded(sample_tree())),
        group_order_posts: Arc::new(Mutex::new(Vec::new())),
    };
    let api = Router::new()
        .route("/groups-with-sites", get(list_tree))
        .route("/group-orders", put(put_group_orders))
        .route("/site-orders", put(put_site_orders))
        .route("/sites/:id", put(put_site))
        .route("/groups/:id", axum::routing::delete(delete_group))
        .route("/broken", get(broken))
        .with_state(state.clone());
    let app = Router::new().nest("/api", api);
    tokio::spawn(async move {
        let _ = axum::serve(listener, app).await;
    });
    Ok((format!("http://{addr}/api"), state))
}

#[test]
fn base_url_gets_a_trailing_slash_so_paths_join_below_it() {
    let client = HttpNavigationClient::new("http://localhost:8788/api").expect("client");
    assert_eq!(
        client.endpoint("group-orders").expect("join").as_str(),
        "http://localhost:8788/api/group-orders"
    );
    assert!(HttpNavigationClient::new("not a url").is_err());
}

#[tokio::test]
async fn loads_groups_with_sites() {
    let (url, _) = spawn_navigation_server().await.expect("spawn server");
    let client = HttpNavigationClient::new(&url).expect("client");

    let tree = client.get_groups_with_sites().await.expect("load");
    assert_eq!(tree, sample_tree());
}

#[tokio::test]
async fn group_order_write_sends_the_full_list() {
    let (url, state) = spawn_navigation_server().await.expect("spawn server");
    let client = HttpNavigationClient::new(&url).expect("client");
    let entries = vec![
        GroupOrderEntry {
            id: GroupId(3),
            order_num: 0,
        },
        GroupOrderEntry {
            id: GroupId(1),
            order_num: 1,
        },
        GroupOrderEntry {
            id: GroupId(2),
            order_num: 2,
        },
    ];

    assert!(client.update_group_order(&entries).await.expect("write"));
    assert_eq!(state.group_order_posts.lock().await.clone(), vec![entries]);

    let ids: Vec<_> = client
        .get_groups_with_sites()
        .await
        .expect("reload")
        .iter()
        .map(GroupWithSites::id)
        .collect();
    assert_eq!(ids, vec![GroupId(3), GroupId(1), GroupId(2)]);
}

#[tokio::test]
async fn rejected_site_order_reports_false() {
    let (url, _) = spawn_navigation_server().await.expect("spawn server");
    let client = HttpNavigationClient::new(&url).expect("client");
    let accepted = client
        .update_site_order(&[SiteOrderEntry {
            id: SiteId(404),
            order_num: 0,
        }])
        .await
        .expect("call");
    assert!(!accepted);
}

#[tokio::test]
async fn site_update_returns_the_moved_site() {
    let (url, _) = spawn_navigation_server().await.expect("spawn server");
    let client = HttpNavigationClient::new(&url).expect("client");
    let patch = SitePatch {
        group_id: Some(GroupId(3)),
        order_num: Some(0),
        ..SitePatch::default()
    };

    let site = client.update_site(SiteId(12), &patch).await.expect("update");
    assert_eq!(site.group_id, GroupId(3));
    assert_eq!(site.order_num, 0);
}

#[tokio::test]
async fn api_error_body_surfaces_as_api_exception() {
    let (url, _) = spawn_navigation_server().await.expect("spawn server");
    let client = HttpNavigationClient::new(&url).expect("client");

    let err = client
        .update_site(SiteId(404), &SitePatch::default())
        .await
        .expect_err("missing site");
    let api = err
        .downcast_ref::<ApiException>()
        .expect("typed api exception");
    assert_eq!(api.code, ErrorCode::NotFound);
    assert!(format!("{err:#}").starts_with("PUT /sites/404"));
}

#[tokio::test]
async fn plain_error_body_reports_status() {
    let (url, _) = spawn_navigation_server().await.expect("spawn server");
    let client = HttpNavigationClient::new(&url).expect("client");

    let err = client
        .send::<(), SuccessResponse>(Method::GET, "broken", None)
        .await
        .expect_err("broken endpoint");
    assert!(format!("{err:#}").contains("backend returned 500"));
}

#[tokio::test]
async fn delete_group_reports_success_flag() {
    let (url, _) = spawn_navigation_server().await.expect("spawn server");
    let client = HttpNavigationClient::new(&url).expect("client");
    assert!(client.delete_group(GroupId(2)).await.expect("delete"));
    assert!(!client.delete_group(GroupId(2)).await.expect("delete again"));
}
