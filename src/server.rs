//! HTTP surface: public waitlist and deletion forms, the image proxy, and
//! the bearer-protected admin API.

use crate::batch::{BatchEnricher, BatchReport};
use crate::catalog::{Catalog, ImageSearchOutcome};
use crate::draft::{DetailsPatch, FlyDraft};
use crate::error::{AppError, StatusMessage};
use crate::proxy::proxy_routes;
use crate::record::{Fly, FlyDetails, FlyId};
use axum::{
    Json, Router,
    body::Bytes,
    extract::{DefaultBodyLimit, Path, Query, Request, State},
    http::{StatusCode, header},
    middleware::{self, Next},
    response::{IntoResponse, Response},
    routing::{get, post},
};
use log::{error, info, warn};
use reqwest::Client;
use serde::{Deserialize, Serialize};

const MAX_IMAGE_BYTES: usize = 10 * 1024 * 1024;

#[derive(Clone)]
pub struct AppState {
    pub catalog: Catalog,
    /// Bearer token for `/api/admin`. Unset disables the admin API.
    pub admin_token: Option<String>,
}

impl AppState {
    pub fn new(catalog: Catalog, admin_token: Option<String>) -> Self {
        Self {
            catalog,
            admin_token,
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = match &self {
            AppError::Validation(_) => StatusCode::BAD_REQUEST,
            AppError::NotFound(_) => StatusCode::NOT_FOUND,
            AppError::Store(_)
            | AppError::Completion(_)
            | AppError::Search(_)
            | AppError::Download(_) => StatusCode::BAD_GATEWAY,
            AppError::Config(_) => StatusCode::SERVICE_UNAVAILABLE,
            AppError::Io(_) | AppError::Csv(_) => StatusCode::INTERNAL_SERVER_ERROR,
        };
        if status.is_server_error() {
            error!("{}", self);
        }
        (status, Json(StatusMessage::error(&self))).into_response()
    }
}

pub async fn require_admin(State(state): State<AppState>, request: Request, next: Next) -> Response {
    let Some(expected) = state.admin_token.as_deref() else {
        warn!("Admin request rejected: ADMIN_TOKEN is not configured");
        return unauthorized("Admin API is disabled");
    };

    let provided = request
        .headers()
        .get(header::AUTHORIZATION)
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.strip_prefix("Bearer "));

    match provided {
        Some(token) if token == expected => next.run(request).await,
        _ => unauthorized("Invalid or missing admin token"),
    }
}

fn unauthorized(message: &str) -> Response {
    (
        StatusCode::UNAUTHORIZED,
        Json(StatusMessage::error(message)),
    )
        .into_response()
}

#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub status: String,
    pub version: String,
}

pub async fn health_check() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok".to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
    })
}

#[derive(Debug, Deserialize)]
pub struct WaitlistForm {
    pub name: Option<String>,
    pub email: String,
}

async fn join_waitlist(
    State(state): State<AppState>,
    Json(form): Json<WaitlistForm>,
) -> Result<Json<StatusMessage>, AppError> {
    Ok(Json(state.catalog.join_waitlist(form.name, &form.email).await?))
}

#[derive(Debug, Deserialize)]
pub struct DeletionForm {
    pub email: String,
}

async fn request_data_deletion(
    State(state): State<AppState>,
    Json(form): Json<DeletionForm>,
) -> Result<Json<StatusMessage>, AppError> {
    Ok(Json(state.catalog.request_data_deletion(&form.email).await?))
}

#[derive(Debug, Default, Deserialize)]
pub struct ListQuery {
    #[serde(default)]
    pub all: bool,
    /// Only flies in season during this month (1-12).
    pub month: Option<u8>,
}

async fn list_flies(
    State(state): State<AppState>,
    Query(query): Query<ListQuery>,
) -> Result<Json<Vec<Fly>>, AppError> {
    Ok(Json(state.catalog.list_flies(query.all, query.month).await?))
}

#[derive(Debug, Deserialize)]
pub struct CreateFly {
    pub name: String,
    pub image_url: Option<String>,
    pub details: Option<FlyDetails>,
}

async fn create_fly(
    State(state): State<AppState>,
    Json(body): Json<CreateFly>,
) -> Result<(StatusCode, Json<Fly>), AppError> {
    let mut draft = FlyDraft::new(body.name)?.apply(DetailsPatch::ImageUrl(body.image_url))?;
    if let Some(details) = body.details {
        draft = draft.apply(DetailsPatch::Classified(details))?;
    }
    let fly = state.catalog.create_fly(&draft).await?;
    info!("Created fly {} ({})", fly.name, fly.id);
    Ok((StatusCode::CREATED, Json(fly)))
}

async fn import_flies(
    State(state): State<AppState>,
    body: String,
) -> Result<Json<StatusMessage>, AppError> {
    Ok(Json(state.catalog.bulk_import(&body).await?))
}

async fn enrich_fly(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<FlyDetails>, AppError> {
    Ok(Json(state.catalog.enrich_fly(&FlyId(id)).await?))
}

async fn save_details(
    State(state): State<AppState>,
    Path(id): Path<String>,
    Json(details): Json<FlyDetails>,
) -> Result<Json<StatusMessage>, AppError> {
    Ok(Json(state.catalog.save_details(&FlyId(id), &details).await?))
}

async fn edit_fly(
    State(state): State<AppState>,
    Path(id): Path<String>,
    Json(patches): Json<Vec<DetailsPatch>>,
) -> Result<Json<FlyDetails>, AppError> {
    let draft = state.catalog.edit_fly(&FlyId(id), patches).await?;
    Ok(Json(draft.details()))
}

#[derive(Debug, Default, Deserialize)]
pub struct BatchRequest {
    #[serde(default)]
    pub ids: Vec<FlyId>,
    pub group_size: Option<usize>,
    pub delay_ms: Option<u64>,
}

/// Runs to completion before responding. An empty `ids` list means every
/// incomplete fly.
async fn run_batch(
    State(state): State<AppState>,
    Json(request): Json<BatchRequest>,
) -> Result<Json<BatchReport>, AppError> {
    let mut enricher =
        BatchEnricher::new(state.catalog.store(), state.catalog.completion()?).with_progress(false);
    if let Some(group_size) = request.group_size {
        enricher = enricher.with_group_size(group_size);
    }
    if let Some(delay_ms) = request.delay_ms {
        enricher = enricher.with_delay(delay_ms);
    }

    let report = if request.ids.is_empty() {
        enricher.enrich_incomplete().await?
    } else {
        enricher.enrich_ids(&request.ids).await?
    };
    Ok(Json(report))
}

#[derive(Debug, Deserialize)]
pub struct SearchQuery {
    pub q: String,
}

async fn search_images(
    State(state): State<AppState>,
    Query(query): Query<SearchQuery>,
) -> Result<Json<ImageSearchOutcome>, AppError> {
    Ok(Json(state.catalog.search_images(&query.q).await?))
}

#[derive(Debug, Deserialize)]
pub struct SelectImage {
    pub url: String,
}

async fn select_image(
    State(state): State<AppState>,
    Path(id): Path<String>,
    Json(body): Json<SelectImage>,
) -> Result<Json<StatusMessage>, AppError> {
    Ok(Json(state.catalog.select_image(&FlyId(id), &body.url).await?))
}

#[derive(Debug, Deserialize)]
pub struct UploadQuery {
    pub name: String,
    #[serde(default = "default_extension")]
    pub ext: String,
}

fn default_extension() -> String {
    "jpg".to_string()
}

async fn upload_image(
    State(state): State<AppState>,
    Query(query): Query<UploadQuery>,
    body: Bytes,
) -> Result<Json<StatusMessage>, AppError> {
    let message = state
        .catalog
        .upload_image(&query.name, body.to_vec(), &query.ext)
        .await?;
    Ok(Json(message))
}

fn admin_routes(state: AppState) -> Router<AppState> {
    Router::new()
        .route("/api/admin/flies", get(list_flies).post(create_fly))
        .route("/api/admin/flies/import", post(import_flies))
        .route("/api/admin/flies/:id", axum::routing::put(save_details).patch(edit_fly))
        .route("/api/admin/flies/:id/enrich", get(enrich_fly))
        .route("/api/admin/flies/:id/image", post(select_image))
        .route("/api/admin/batch", post(run_batch))
        .route("/api/admin/image-search", get(search_images))
        .route(
            "/api/admin/images",
            post(upload_image).layer(DefaultBodyLimit::max(MAX_IMAGE_BYTES)),
        )
        .layer(middleware::from_fn_with_state(state, require_admin))
}

pub fn build_router(state: AppState, http: Client) -> Router {
    let public = Router::new()
        .route("/health", get(health_check))
        .route("/api/waitlist", post(join_waitlist))
        .route("/api/data-deletion", post(request_data_deletion));

    Router::new()
        .merge(admin_routes(state.clone()))
        .merge(public)
        .with_state(state)
        .merge(proxy_routes(http))
}

/// Health check and image proxy only, for running without store credentials.
pub fn proxy_only_router(http: Client) -> Router {
    Router::new()
        .route("/health", get(health_check))
        .merge(proxy_routes(http))
}

pub async fn serve(router: Router, addr: &str) -> Result<(), AppError> {
    let listener = tokio::net::TcpListener::bind(addr).await?;
    info!("Listening on {}", listener.local_addr()?);
    axum::serve(listener, router).await?;
    Ok(())
}
