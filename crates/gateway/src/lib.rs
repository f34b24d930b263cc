//! HTTP API gateway for Synaxarion.
//!
//! Exposes the router, the per-domain retrieval stores, the embedding
//! service and ingestion over a small JSON API. Every failure is answered
//! with `{"detail": "..."}`.
//!
//! Built on Axum; sessions live in process memory.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use axum::body::Bytes;
use axum::extract::DefaultBodyLimit;
use axum::{
    Router,
    extract::State,
    http::StatusCode,
    response::{IntoResponse, Json, Response},
    routing::{get, post},
};
use serde::{Deserialize, Serialize};
use tokio::sync::{Mutex, OwnedMutexGuard, RwLock};
use tokio::time::Instant;
use tower_http::cors::CorsLayer;
use tracing::{debug, error, info, warn};

use synaxarion_agent::{Domain, Services, Session, ToolStep};
use synaxarion_ingest::SourceFetcher;

/// One chat session plus the last time a request touched it.
struct SessionEntry {
    session: Arc<Mutex<Session>>,
    last_used: Instant,
}

/// Shared application state for the gateway.
pub struct AppState {
    services: Arc<Services>,
    fetcher: Arc<dyn SourceFetcher>,
    sessions: RwLock<HashMap<String, SessionEntry>>,
    session_ttl: Duration,
}

impl AppState {
    pub fn new(services: Arc<Services>) -> Self {
        let fetcher = services.http_fetcher();
        Self::with_fetcher(services, fetcher)
    }

    /// State whose `/ingest` reads sources through `fetcher`.
    pub fn with_fetcher(services: Arc<Services>, fetcher: Arc<dyn SourceFetcher>) -> Self {
        let session_ttl = Duration::from_secs(services.config().gateway.session_ttl_secs);
        Self {
            services,
            fetcher,
            sessions: RwLock::new(HashMap::new()),
            session_ttl,
        }
    }

    pub fn services(&self) -> &Arc<Services> {
        &self.services
    }

    /// Lock `id`'s session for the length of one turn.
    ///
    /// The lock is released when the guard drops, including when the
    /// request future is cancelled mid-turn.
    async fn check_out(&self, id: &str) -> Result<OwnedMutexGuard<Session>, ApiError> {
        let now = Instant::now();
        let mut sessions = self.sessions.write().await;
        self.evict_idle(&mut sessions, now);

        let entry = sessions.entry(id.to_string()).or_insert_with(|| SessionEntry {
            session: Arc::new(Mutex::new(Session::with_id(id))),
            last_used: now,
        });
        entry.last_used = now;
        entry.session.clone().try_lock_owned().map_err(|_| {
            ApiError::new(
                StatusCode::CONFLICT,
                format!("Session '{id}' is already processing a request"),
            )
        })
    }

    /// Drop sessions idle past the TTL. Sessions mid-turn are kept.
    fn evict_idle(&self, sessions: &mut HashMap<String, SessionEntry>, now: Instant) {
        let before = sessions.len();
        sessions.retain(|_, entry| {
            now.duration_since(entry.last_used) < self.session_ttl
                || entry.session.try_lock().is_err()
        });
        let evicted = before - sessions.len();
        if evicted > 0 {
            debug!(evicted, remaining = sessions.len(), "Evicted idle sessions");
        }
    }

    async fn session_count(&self) -> usize {
        self.sessions.read().await.len()
    }

    fn domain(&self, name: Option<&str>) -> Result<&Domain, ApiError> {
        self.services.domain_or_default(name).ok_or_else(|| {
            let name = name.unwrap_or(&self.services.config().default_domain);
            ApiError::new(StatusCode::NOT_FOUND, format!("Unknown domain: '{name}'"))
        })
    }
}

type SharedState = Arc<AppState>;

// ── Errors ────────────────────────────────────────────────────────────────

/// An error answered as `{"detail": "..."}`.
#[derive(Debug)]
pub struct ApiError {
    status: StatusCode,
    detail: String,
}

impl ApiError {
    pub fn new(status: StatusCode, detail: impl Into<String>) -> Self {
        Self {
            status,
            detail: detail.into(),
        }
    }

    fn bad_request(detail: impl Into<String>) -> Self {
        Self::new(StatusCode::BAD_REQUEST, detail)
    }
}

impl From<synaxarion_core::Error> for ApiError {
    fn from(e: synaxarion_core::Error) -> Self {
        Self::new(StatusCode::INTERNAL_SERVER_ERROR, e.to_string())
    }
}

impl From<synaxarion_core::error::ProviderError> for ApiError {
    fn from(e: synaxarion_core::error::ProviderError) -> Self {
        synaxarion_core::Error::from(e).into()
    }
}

#[derive(Serialize, Deserialize)]
struct ErrorBody {
    detail: String,
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        if self.status.is_server_error() {
            error!(status = %self.status, detail = %self.detail, "Request failed");
        } else {
            warn!(status = %self.status, detail = %self.detail, "Request rejected");
        }
        (self.status, Json(ErrorBody { detail: self.detail })).into_response()
    }
}

// ── Request / response types ──────────────────────────────────────────────

#[derive(Debug, Deserialize)]
pub struct ChatRequest {
    pub query: String,
    #[serde(default)]
    pub session_id: Option<String>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct ChatResponse {
    pub response: String,
    pub thought_process: Vec<ToolStep>,
    pub session_id: String,
}

#[derive(Debug, Deserialize)]
pub struct DomainQueryRequest {
    pub query: String,
    #[serde(default)]
    pub domain: Option<String>,
    #[serde(default)]
    pub top_k: Option<usize>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct DomainQueryResponse {
    pub results: String,
}

#[derive(Debug, Deserialize)]
pub struct EmbeddingRequest {
    pub text: String,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct EmbeddingResponse {
    pub embedding: Vec<f32>,
}

#[derive(Debug, Deserialize)]
pub struct BatchEmbeddingRequest {
    pub texts: Vec<String>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct BatchEmbeddingResponse {
    pub embeddings: Vec<Vec<f32>>,
}

#[derive(Debug, Default, Deserialize)]
pub struct IngestRequest {
    #[serde(default)]
    pub domain: Option<String>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct IngestResponse {
    pub message: String,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct HealthResponse {
    pub status: String,
    pub version: String,
    pub domains: Vec<String>,
    pub provider_reachable: bool,
    pub sessions: usize,
}

// ── Router ────────────────────────────────────────────────────────────────

/// Build the Axum router with every gateway route.
///
/// Layers: 1 MB body limit, permissive CORS, HTTP trace logging.
pub fn build_router(state: SharedState) -> Router {
    Router::new()
        .route("/health", get(health_handler))
        .route("/chat", post(chat_handler))
        .route("/query-domain", post(query_domain_handler))
        .route("/embedding", post(embedding_handler))
        .route("/batch-embedding", post(batch_embedding_handler))
        .route("/ingest", post(ingest_handler))
        .layer(DefaultBodyLimit::max(1024 * 1024))
        .layer(CorsLayer::permissive())
        .layer(tower_http::trace::TraceLayer::new_for_http())
        .with_state(state)
}

/// Start the gateway HTTP server.
///
/// Provider, indexes, experts and router are built once and shared by every
/// request.
pub async fn start(config: synaxarion_config::AppConfig) -> Result<(), Box<dyn std::error::Error>> {
    let addr = format!("{}:{}", config.gateway.host, config.gateway.port);

    if !config.has_api_key() {
        warn!("No API key configured; model and embedding calls will fail");
    }

    let services = Arc::new(Services::from_config(config)?);
    for domain in services.domains() {
        if !domain.store.is_initialized().await? {
            warn!(domain = %domain.config.name, "Domain has no index yet; run ingestion");
        }
    }

    let app = build_router(Arc::new(AppState::new(services)));

    info!(addr = %addr, "Gateway starting");
    let listener = tokio::net::TcpListener::bind(&addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}

// ── Handlers ──────────────────────────────────────────────────────────────

async fn health_handler(State(state): State<SharedState>) -> Json<HealthResponse> {
    let provider_reachable = match state.services.provider().health_check().await {
        Ok(reachable) => reachable,
        Err(e) => {
            warn!(error = %e, "Provider health check failed");
            false
        }
    };
    Json(HealthResponse {
        status: "ok".into(),
        version: env!("CARGO_PKG_VERSION").into(),
        domains: state
            .services
            .domains()
            .iter()
            .map(|d| d.config.name.clone())
            .collect(),
        provider_reachable,
        sessions: state.session_count().await,
    })
}

/// `POST /chat`: one router turn inside a session.
async fn chat_handler(
    State(state): State<SharedState>,
    Json(payload): Json<ChatRequest>,
) -> Result<Json<ChatResponse>, ApiError> {
    if payload.query.trim().is_empty() {
        return Err(ApiError::bad_request("query must not be empty"));
    }

    let session_id = payload
        .session_id
        .filter(|id| !id.is_empty())
        .unwrap_or_else(|| uuid::Uuid::new_v4().to_string());
    info!(session = %session_id, "Chat request");

    let mut session = state.check_out(&session_id).await?;
    let reply = state
        .services
        .router()
        .process(&mut session, &payload.query)
        .await?;

    Ok(Json(ChatResponse {
        response: reply.response,
        thought_process: reply.trace,
        session_id,
    }))
}

/// `POST /query-domain`: formatted retrieval output, no generation.
async fn query_domain_handler(
    State(state): State<SharedState>,
    Json(payload): Json<DomainQueryRequest>,
) -> Result<Json<DomainQueryResponse>, ApiError> {
    let domain = state.domain(payload.domain.as_deref())?;
    let top_k = payload.top_k.unwrap_or_else(|| domain.store.top_k());
    let results = domain.store.query(&payload.query, top_k).await?;
    Ok(Json(DomainQueryResponse { results }))
}

async fn embedding_handler(
    State(state): State<SharedState>,
    Json(payload): Json<EmbeddingRequest>,
) -> Result<Json<EmbeddingResponse>, ApiError> {
    let embedding = state.services.embedder().embed(&payload.text).await?;
    Ok(Json(EmbeddingResponse { embedding }))
}

async fn batch_embedding_handler(
    State(state): State<SharedState>,
    Json(payload): Json<BatchEmbeddingRequest>,
) -> Result<Json<BatchEmbeddingResponse>, ApiError> {
    let embeddings = state.services.embedder().embed_batch(&payload.texts).await?;
    Ok(Json(BatchEmbeddingResponse { embeddings }))
}

/// `POST /ingest`: re-scrape and re-index one domain. The body is optional.
async fn ingest_handler(
    State(state): State<SharedState>,
    body: Bytes,
) -> Result<Json<IngestResponse>, ApiError> {
    let payload: IngestRequest = if body.is_empty() {
        IngestRequest::default()
    } else {
        serde_json::from_slice(&body)
            .map_err(|e| ApiError::bad_request(format!("Invalid ingest request: {e}")))?
    };
    let domain = state.domain(payload.domain.as_deref())?;
    let report = state
        .services
        .ingest(domain, state.fetcher.clone())
        .await?;
    Ok(Json(IngestResponse {
        message: format!("Ingestion complete. {report}"),
    }))
}
