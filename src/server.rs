//! JSON HTTP API behind the portfolio site.
//!
//! Reads are public. Writes require the request to carry the owner's
//! verified email in the configured identity header (default
//! `x-verified-email`), which the fronting authentication proxy sets.
//!
//! # Endpoints
//!
//! | Method | Path | Description |
//! |--------|------|-------------|
//! | `GET`    | `/health` | Health check (returns version) |
//! | `GET`    | `/api/publications/{kind}` | Publications grouped by year, newest first |
//! | `POST`   | `/api/publications/{kind}/{year}` | Add a publication (owner) |
//! | `PUT`    | `/api/publications/{kind}/{year}/{index}` | Replace or move a publication (owner) |
//! | `DELETE` | `/api/publications/{kind}/{year}/{index}` | Remove a publication (owner) |
//! | `GET`    | `/api/sections/{name}` | Items of a flat section |
//! | `POST`   | `/api/sections/{name}` | Append an item (owner) |
//! | `PUT`    | `/api/sections/{name}/{index}` | Replace an item (owner) |
//! | `DELETE` | `/api/sections/{name}` | Remove the item equal to the body (owner) |
//! | `GET`    | `/api/profile/{doc}` | Hero or about document |
//! | `PUT`    | `/api/profile/{doc}` | Overwrite hero or about (owner) |
//! | `GET`    | `/api/stats` | Publication statistics |
//! | `POST`   | `/api/stats/refresh` | Recompute and store statistics (owner) |
//!
//! # Error Contract
//!
//! ```json
//! { "error": { "code": "forbidden", "message": "sign in to edit the portfolio" } }
//! ```
//!
//! Error codes: `bad_request` (400), `forbidden` (403), `not_found` (404),
//! `internal` (500).

use axum::{
    extract::{Path, State},
    http::{HeaderMap, StatusCode},
    response::{IntoResponse, Response},
    routing::{get, post, put},
    Json, Router,
};
use serde::Serialize;
use serde_json::{json, Value};
use std::sync::Arc;
use tower_http::cors::{Any, CorsLayer};
use tracing::{error, info};

use folio_core::access::{AccessPolicy, Editor, Identity, OwnerPolicy};
use folio_core::catalog::{Catalog, ProfileDoc, PublicationKind, Section};
use folio_core::store::DocumentStore;
use folio_core::FolioError;

use crate::config::Config;
use crate::db;

/// Shared application state passed to all route handlers.
#[derive(Clone)]
struct AppState {
    catalog: Catalog,
    policy: Arc<dyn AccessPolicy>,
    identity_header: Arc<str>,
}

impl AppState {
    fn editor(&self, headers: &HeaderMap) -> Result<Editor, AppError> {
        let identity = headers
            .get(self.identity_header.as_ref())
            .and_then(|v| v.to_str().ok())
            .map(str::trim)
            .filter(|v| !v.is_empty())
            .map(Identity::verified);
        Ok(self.policy.authorize(identity.as_ref())?)
    }
}

/// Starts the HTTP server on the configured SQLite database.
pub async fn run_server(config: &Config) -> anyhow::Result<()> {
    let store = db::open_store(config).await?;
    run_server_with_store(config, store).await
}

/// Starts the HTTP server on an arbitrary document store.
pub async fn run_server_with_store(
    config: &Config,
    store: Arc<dyn DocumentStore>,
) -> anyhow::Result<()> {
    let bind_addr = config.server.bind.clone();
    let app = router(config, store);

    info!(%bind_addr, "folio API listening");
    println!("Folio API listening on http://{}", bind_addr);

    let listener = tokio::net::TcpListener::bind(&bind_addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}

/// Build the router without binding, for embedding and tests.
pub fn router(config: &Config, store: Arc<dyn DocumentStore>) -> Router {
    let state = AppState {
        catalog: Catalog::new(store),
        policy: Arc::new(OwnerPolicy::new(config.owner.email.clone())),
        identity_header: Arc::from(config.server.identity_header.to_lowercase()),
    };

    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    Router::new()
        .route("/health", get(handle_health))
        .route("/api/publications/{kind}", get(handle_list_publications))
        .route("/api/publications/{kind}/{year}", post(handle_add_publication))
        .route(
            "/api/publications/{kind}/{year}/{index}",
            put(handle_update_publication).delete(handle_remove_publication),
        )
        .route(
            "/api/sections/{name}",
            get(handle_list_section)
                .post(handle_add_to_section)
                .delete(handle_remove_from_section),
        )
        .route("/api/sections/{name}/{index}", put(handle_update_in_section))
        .route(
            "/api/profile/{doc}",
            get(handle_get_profile).put(handle_set_profile),
        )
        .route("/api/stats", get(handle_stats))
        .route("/api/stats/refresh", post(handle_refresh_stats))
        .layer(cors)
        .with_state(state)
}

// ============ Error response ============

#[derive(Serialize)]
struct ErrorBody {
    error: ErrorDetail,
}

#[derive(Serialize)]
struct ErrorDetail {
    code: String,
    message: String,
}

struct AppError {
    status: StatusCode,
    code: String,
    message: String,
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let body = ErrorBody {
            error: ErrorDetail {
                code: self.code,
                message: self.message,
            },
        };
        (self.status, Json(body)).into_response()
    }
}

impl From<FolioError> for AppError {
    fn from(err: FolioError) -> Self {
        let status = match &err {
            FolioError::NotFound(_) => StatusCode::NOT_FOUND,
            FolioError::InvalidRecord { .. } | FolioError::InvalidInput(_) => {
                StatusCode::BAD_REQUEST
            }
            FolioError::Forbidden(_) => StatusCode::FORBIDDEN,
            FolioError::Decode { .. } | FolioError::Store(_) => {
                error!(error = %err, "request failed");
                StatusCode::INTERNAL_SERVER_ERROR
            }
        };
        AppError {
            status,
            code: err.code().to_string(),
            message: err.to_string(),
        }
    }
}

type ApiResult<T> = Result<Json<T>, AppError>;

/// Path indexes are taken as text so a malformed one still gets the JSON
/// error body.
fn parse_index(raw: &str) -> Result<usize, FolioError> {
    raw.parse().map_err(|_| {
        FolioError::InvalidInput(format!("index must be a non-negative integer, got '{}'", raw))
    })
}

// ============ GET /health ============

#[derive(Serialize)]
struct HealthResponse {
    status: String,
    version: String,
}

async fn handle_health() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok".to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
    })
}

// ============ Publications ============

async fn handle_list_publications(
    State(state): State<AppState>,
    Path(kind): Path<String>,
) -> ApiResult<Value> {
    let kind: PublicationKind = kind.parse()?;
    let groups = state.catalog.publications(kind).await?;
    Ok(Json(json!({ "kind": kind.collection(), "years": groups })))
}

async fn handle_add_publication(
    State(state): State<AppState>,
    headers: HeaderMap,
    Path((kind, year)): Path<(String, String)>,
    Json(record): Json<Value>,
) -> ApiResult<Value> {
    let editor = state.editor(&headers)?;
    let kind: PublicationKind = kind.parse()?;
    let tagged = state
        .catalog
        .add_publication(&editor, kind, &year, record)
        .await?;
    Ok(Json(json!(tagged)))
}

async fn handle_update_publication(
    State(state): State<AppState>,
    headers: HeaderMap,
    Path((kind, year, index)): Path<(String, String, String)>,
    Json(record): Json<Value>,
) -> ApiResult<Value> {
    let editor = state.editor(&headers)?;
    let kind: PublicationKind = kind.parse()?;
    let index = parse_index(&index)?;
    let tagged = state
        .catalog
        .update_publication(&editor, kind, &year, index, record)
        .await?;
    Ok(Json(json!(tagged)))
}

async fn handle_remove_publication(
    State(state): State<AppState>,
    headers: HeaderMap,
    Path((kind, year, index)): Path<(String, String, String)>,
) -> ApiResult<Value> {
    let editor = state.editor(&headers)?;
    let kind: PublicationKind = kind.parse()?;
    let index = parse_index(&index)?;
    let removed = state
        .catalog
        .remove_publication(&editor, kind, &year, index)
        .await?;
    Ok(Json(json!({ "removed": removed })))
}

// ============ Sections ============

async fn handle_list_section(
    State(state): State<AppState>,
    Path(name): Path<String>,
) -> ApiResult<Value> {
    let section: Section = name.parse()?;
    let items = state.catalog.section(section).await?;
    Ok(Json(json!({ "section": section.document(), "items": items })))
}

async fn handle_add_to_section(
    State(state): State<AppState>,
    headers: HeaderMap,
    Path(name): Path<String>,
    Json(record): Json<Value>,
) -> ApiResult<Value> {
    let editor = state.editor(&headers)?;
    let section: Section = name.parse()?;
    let index = state
        .catalog
        .add_to_section(&editor, section, record)
        .await?;
    Ok(Json(json!({ "index": index })))
}

async fn handle_update_in_section(
    State(state): State<AppState>,
    headers: HeaderMap,
    Path((name, index)): Path<(String, String)>,
    Json(record): Json<Value>,
) -> ApiResult<Value> {
    let editor = state.editor(&headers)?;
    let section: Section = name.parse()?;
    let index = parse_index(&index)?;
    state
        .catalog
        .update_in_section(&editor, section, index, record)
        .await?;
    Ok(Json(json!({ "index": index })))
}

async fn handle_remove_from_section(
    State(state): State<AppState>,
    headers: HeaderMap,
    Path(name): Path<String>,
    Json(record): Json<Value>,
) -> ApiResult<Value> {
    let editor = state.editor(&headers)?;
    let section: Section = name.parse()?;
    state
        .catalog
        .remove_from_section(&editor, section, record)
        .await?;
    Ok(Json(json!({ "removed": true })))
}

// ============ Profile ============

async fn handle_get_profile(
    State(state): State<AppState>,
    Path(doc): Path<String>,
) -> ApiResult<Value> {
    let doc: ProfileDoc = doc.parse()?;
    let value = state.catalog.profile(doc).await?;
    Ok(Json(value.unwrap_or(Value::Null)))
}

async fn handle_set_profile(
    State(state): State<AppState>,
    headers: HeaderMap,
    Path(doc): Path<String>,
    Json(value): Json<Value>,
) -> ApiResult<Value> {
    let editor = state.editor(&headers)?;
    let doc: ProfileDoc = doc.parse()?;
    state.catalog.set_profile(&editor, doc, value).await?;
    Ok(Json(json!({ "saved": doc.document() })))
}

// ============ Stats ============

async fn handle_stats(State(state): State<AppState>) -> ApiResult<Value> {
    let stats = state.catalog.stats().await?;
    Ok(Json(json!(stats)))
}

async fn handle_refresh_stats(
    State(state): State<AppState>,
    headers: HeaderMap,
) -> ApiResult<Value> {
    let editor = state.editor(&headers)?;
    let stats = state.catalog.refresh_stats(&editor).await?;
    Ok(Json(json!(stats)))
}
