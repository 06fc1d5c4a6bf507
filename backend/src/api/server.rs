//! HTTP Server for the repairlog API.
//!
//! # API Endpoints
//!
//! | Method | Path                      | Description                          |
//! |--------|---------------------------|--------------------------------------|
//! | GET    | `/health`                 | Health check                         |
//! | POST   | `/api/import/{kind}`      | Upload a CSV of assets or repairs    |
//! | GET    | `/api/templates/{kind}`   | Download an example CSV              |
//! | GET    | `/api/assets`             | Assets visible to the caller         |
//! | GET    | `/api/logs`               | SSE stream for real-time logs        |
//!
//! The caller is identified by the `x-user-id` and `x-user-role` headers.

use axum::{
    extract::{Multipart, Path, Query, State},
    http::{header, HeaderMap, HeaderName, HeaderValue, Method},
    response::{sse::Event, IntoResponse, Json, Sse},
    routing::{get, post},
    Router,
};
use futures::stream::Stream;
use serde::Deserialize;
use serde_json::{json, Value};
use std::{convert::Infallible, net::SocketAddr, sync::Arc, time::Duration};
use tokio::sync::RwLock;
use tokio_stream::wrappers::BroadcastStream;
use tokio_stream::StreamExt as _;
use tower_http::cors::CorsLayer;

use super::logs::LOG_BROADCASTER;
use super::types::{AssetSummary, ImportResponse};
use crate::config::AppConfig;
use crate::error::{ServerError, ServerResult};
use crate::import::template::{template_file_name, template_csv};
use crate::import::{run_import, ImportOptions};
use crate::models::{Requester, SchemaKind, UserRole};
use crate::store::AssetStore;

pub const USER_ID_HEADER: &str = "x-user-id";
pub const USER_ROLE_HEADER: &str = "x-user-role";

/// Shared server state
#[derive(Clone)]
pub struct AppState {
    pub store: Arc<RwLock<AssetStore>>,
    pub config: Arc<AppConfig>,
}

impl AppState {
    pub fn new(store: AssetStore, config: AppConfig) -> Self {
        Self {
            store: Arc::new(RwLock::new(store)),
            config: Arc::new(config),
        }
    }
}

/// Build the router
pub fn router(state: AppState) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(tower_http::cors::Any)
        .allow_methods([Method::GET, Method::POST, Method::OPTIONS])
        .allow_headers([
            header::CONTENT_TYPE,
            header::ACCEPT,
            HeaderName::from_static(USER_ID_HEADER),
            HeaderName::from_static(USER_ROLE_HEADER),
        ])
        .expose_headers([header::CONTENT_TYPE, header::CONTENT_DISPOSITION]);

    Router::new()
        .route("/", get(health))
        .route("/health", get(health))
        .route("/api/import/{kind}", post(import_upload))
        .route("/api/templates/{kind}", get(download_template))
        .route("/api/assets", get(list_assets))
        .route("/api/logs", get(sse_logs))
        .layer(cors)
        .with_state(state)
}

/// Start the HTTP server
pub async fn start_server(config: AppConfig) -> Result<(), Box<dyn std::error::Error>> {
    let store = AssetStore::open(&config.data_dir)?;
    let port = config.port;
    let app = router(AppState::new(store, config));

    let addr = SocketAddr::from(([0, 0, 0, 0], port));
    println!("🚀 Repairlog server running on http://localhost:{}", port);
    println!("   POST /api/import/{{kind}}    - Upload assets or repairs CSV");
    println!("   GET  /api/templates/{{kind}} - Example CSV");
    println!("   GET  /api/assets           - Asset list");
    println!("   GET  /api/logs             - SSE log stream");
    println!("   GET  /health               - Health check");

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}

/// Identify the caller from request headers.
///
/// A missing `x-user-id` falls back to `default_user`; a missing role means a
/// regular user.
pub fn requester_from_headers(headers: &HeaderMap, default_user: u64) -> ServerResult<Requester> {
    let text = |name: &str| -> ServerResult<Option<String>> {
        headers
            .get(name)
            .map(|v: &HeaderValue| {
                v.to_str()
                    .map(|s| s.trim().to_string())
                    .map_err(|_| ServerError::BadRequest(format!("{} is not valid text", name)))
            })
            .transpose()
    };

    let user_id = match text(USER_ID_HEADER)? {
        Some(id) => id
            .parse()
            .map_err(|_| ServerError::BadRequest(format!("invalid {} '{}'", USER_ID_HEADER, id)))?,
        None => default_user,
    };

    let role = match text(USER_ROLE_HEADER)?.map(|r| r.to_lowercase()).as_deref() {
        None | Some("") | Some("user") => UserRole::User,
        Some("admin") => UserRole::Admin,
        Some(other) => {
            return Err(ServerError::BadRequest(format!(
                "invalid {} '{}'",
                USER_ROLE_HEADER, other
            )))
        }
    };

    Ok(Requester { user_id, role })
}

fn parse_kind(kind: &str) -> ServerResult<SchemaKind> {
    SchemaKind::from_selector(kind)
        .ok_or_else(|| ServerError::NotFound(format!("unknown import kind '{}'", kind)))
}

/// Health check endpoint
async fn health() -> Json<Value> {
    Json(json!({
        "status": "ok",
        "service": "repairlog",
        "version": env!("CARGO_PKG_VERSION"),
        "endpoints": {
            "import": "POST /api/import/{assets|repairs}",
            "templates": "GET /api/templates/{assets|repairs}",
            "assets": "GET /api/assets",
            "logs": "GET /api/logs (SSE)"
        }
    }))
}

/// SSE endpoint for real-time log streaming
async fn sse_logs() -> Sse<impl Stream<Item = Result<Event, Infallible>>> {
    let rx = LOG_BROADCASTER.subscribe();

    let stream = BroadcastStream::new(rx).filter_map(|result| match result {
        Ok(entry) => {
            let json = serde_json::to_string(&entry).ok()?;
            Some(Ok(Event::default().data(json)))
        }
        Err(_) => None,
    });

    Sse::new(stream).keep_alive(
        axum::response::sse::KeepAlive::new()
            .interval(Duration::from_secs(15))
            .text("keep-alive"),
    )
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ImportQuery {
    #[serde(default)]
    dry_run: bool,
}

/// Import upload endpoint
async fn import_upload(
    State(state): State<AppState>,
    Path(kind): Path<String>,
    Query(query): Query<ImportQuery>,
    headers: HeaderMap,
    mut multipart: Multipart,
) -> ServerResult<Json<ImportResponse>> {
    let kind = parse_kind(&kind)?;
    let requester = requester_from_headers(&headers, state.config.default_user_id)?;

    let mut file_data: Option<Vec<u8>> = None;
    let mut file_name: Option<String> = None;

    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| ServerError::BadRequest(format!("Multipart error: {}", e)))?
    {
        if field.name() == Some("file") {
            file_name = field.file_name().map(|s| s.to_string());
            file_data = Some(
                field
                    .bytes()
                    .await
                    .map_err(|e| ServerError::BadRequest(format!("Read error: {}", e)))?
                    .to_vec(),
            );
        }
    }

    let bytes = file_data.ok_or_else(|| ServerError::BadRequest("No file provided".into()))?;
    let file_name = file_name.unwrap_or_default();
    if !file_name.to_lowercase().ends_with(".csv") {
        return Err(ServerError::BadRequest("only .csv files are accepted".into()));
    }

    let options = ImportOptions {
        dry_run: query.dry_run,
        ..Default::default()
    };

    let mut store = state.store.write().await;
    let report = run_import(&bytes, kind, &requester, &mut store, options)?;

    Ok(Json(ImportResponse::from(report)))
}

/// Template download endpoint
async fn download_template(Path(kind): Path<String>) -> ServerResult<impl IntoResponse> {
    let kind = parse_kind(&kind)?;
    let body = template_csv(kind)
        .map_err(|e| ServerError::BadRequest(format!("template error: {}", e)))?;
    let disposition = format!("attachment; filename=\"{}\"", template_file_name(kind));

    Ok((
        [
            (header::CONTENT_TYPE, "text/csv; charset=utf-8".to_string()),
            (header::CONTENT_DISPOSITION, disposition),
        ],
        body,
    ))
}

/// Asset listing endpoint
async fn list_assets(
    State(state): State<AppState>,
    headers: HeaderMap,
) -> ServerResult<Json<Vec<AssetSummary>>> {
    let requester = requester_from_headers(&headers, state.config.default_user_id)?;
    let store = state.store.read().await;

    let assets = store
        .list_assets(&requester)
        .into_iter()
        .map(|asset| AssetSummary::new(asset, store.repairs_for(&asset.id).len()))
        .collect();

    Ok(Json(assets))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{AssetType, NormalizedAsset};
    use axum::http::StatusCode;
    use tempfile::tempdir;

    fn headers(pairs: &[(&'static str, &'static str)]) -> HeaderMap {
        let mut map = HeaderMap::new();
        for (name, value) in pairs {
            map.insert(*name, HeaderValue::from_static(value));
        }
        map
    }

    #[test]
    fn test_requester_from_headers() {
        assert_eq!(requester_from_headers(&HeaderMap::new(), 1).unwrap(), Requester::user(1));
        assert_eq!(
            requester_from_headers(&headers(&[(USER_ID_HEADER, "7"), (USER_ROLE_HEADER, "ADMIN")]), 1).unwrap(),
            Requester::admin(7)
        );
        assert!(requester_from_headers(&headers(&[(USER_ID_HEADER, "me")]), 1).is_err());
        assert!(requester_from_headers(&headers(&[(USER_ROLE_HEADER, "root")]), 1).is_err());
    }

    #[test]
    fn test_unknown_kind_is_not_found() {
        let err = parse_kind("invoices").unwrap_err();
        assert_eq!(err.status_code(), StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn test_template_download() {
        let response = download_template(Path("assets".to_string())).await.unwrap().into_response();
        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(
            response.headers()[header::CONTENT_DISPOSITION],
            "attachment; filename=\"assets_template.csv\""
        );
    }

    #[tokio::test]
    async fn test_list_assets_is_scoped() {
        let dir = tempdir().unwrap();
        let mut store = AssetStore::open(dir.path()).unwrap();
        let garage = NormalizedAsset {
            name: "Garage".into(),
            asset_type: AssetType::Property,
        };
        store.create_asset(&garage, &Requester::user(1)).unwrap();
        store.create_asset(&garage, &Requester::user(2)).unwrap();
        let state = AppState::new(store, AppConfig::default());

        let Json(mine) = list_assets(State(state.clone()), HeaderMap::new()).await.unwrap();
        assert_eq!(mine.len(), 1);
        assert_eq!(mine[0].owner_id, 1);

        let Json(all) = list_assets(State(state), headers(&[(USER_ROLE_HEADER, "admin")])).await.unwrap();
        assert_eq!(all.len(), 2);
    }

    #[tokio::test]
    async fn test_health() {
        let Json(body) = health().await;
        assert_eq!(body["status"], "ok");
    }
}
