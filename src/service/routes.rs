//! Axum routes for the film graph service.

use axum::{
    extract::{Json, Path, Query, State},
    http::StatusCode,
    middleware,
    response::{IntoResponse, Response},
    routing::{get, put},
    Router,
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;

use crate::directory::{AccountDirectory, Directory, FilmCatalog, PostgresDirectory};
use crate::engagement::{EngagementError, DEFAULT_POPULAR_COUNT};
use crate::graph::{FriendshipError, Removal};
use crate::store::{PostgresRelationshipStore, RelationshipStore};
use crate::types::{Account, AccountId, Film, FilmId, RelationshipEdge};
use crate::FILMGRAPH_SCHEMA_VERSION;

use super::middleware::metrics_middleware;
use super::state::ServiceState;

/// Type alias for the service state over PostgreSQL backends.
pub type AppState = ServiceState<PostgresRelationshipStore, PostgresDirectory>;

// ============================================================================
// Request/Response Types
// ============================================================================

/// Query for the popular films listing.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PopularQuery {
    /// Number of films to return (default: 10).
    pub count: Option<usize>,
}

/// Service health response (detailed).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HealthResponse {
    /// "healthy" or "degraded".
    pub status: String,
    /// Crate version.
    pub version: String,
    /// Persisted schema version.
    pub schema_version: String,
    /// Whether the store answered a ping.
    pub store_connected: bool,
    /// Ping failure, if any.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub store_error: Option<String>,
    /// Current pool size (pooled backends only).
    #[serde(skip_serializing_if = "Option::is_none")]
    pub pool_size: Option<u32>,
    /// Idle pool connections (pooled backends only).
    #[serde(skip_serializing_if = "Option::is_none")]
    pub pool_idle: Option<usize>,
    /// Maximum pool size (pooled backends only).
    #[serde(skip_serializing_if = "Option::is_none")]
    pub pool_max: Option<u32>,
}

/// Simple liveness response.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LivenessResponse {
    /// Always "alive".
    pub status: String,
}

/// Readiness response with dependency status.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReadinessResponse {
    /// Whether the service can take traffic.
    pub ready: bool,
    /// Whether the store is reachable.
    pub store: bool,
    /// Failure detail when not ready.
    pub details: Option<String>,
}

/// Structured error response.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ErrorResponse {
    /// Human-readable error message.
    pub error: String,
    /// Machine-readable error code.
    pub code: String,
}

impl ErrorResponse {
    /// Create a new error response with code and message.
    pub fn new(code: impl Into<String>, error: impl Into<String>) -> Self {
        Self {
            error: error.into(),
            code: code.into(),
        }
    }
}

/// Error returned by handlers: a status code plus a JSON body.
#[derive(Debug, Clone)]
pub struct ApiError {
    status: StatusCode,
    body: ErrorResponse,
}

impl ApiError {
    fn new(status: StatusCode, code: &str, error: impl ToString) -> Self {
        Self {
            status,
            body: ErrorResponse::new(code, error.to_string()),
        }
    }

    /// HTTP status of this error.
    pub fn status(&self) -> StatusCode {
        self.status
    }
}

impl From<FriendshipError> for ApiError {
    fn from(e: FriendshipError) -> Self {
        let (status, code) = match &e {
            FriendshipError::AccountNotFound(_) => (StatusCode::NOT_FOUND, "ACCOUNT_NOT_FOUND"),
            FriendshipError::SelfRelationship(_) => (StatusCode::BAD_REQUEST, "SELF_RELATIONSHIP"),
            FriendshipError::AlreadyRequested { .. } => (StatusCode::CONFLICT, "ALREADY_REQUESTED"),
            FriendshipError::AlreadyRelated(..) => (StatusCode::CONFLICT, "ALREADY_RELATED"),
            FriendshipError::NoSuchPendingRequest { .. } => (StatusCode::NOT_FOUND, "NO_SUCH_PENDING_REQUEST"),
            FriendshipError::Store(_) => (StatusCode::INTERNAL_SERVER_ERROR, "STORE_ERROR"),
            FriendshipError::Directory(_) => (StatusCode::INTERNAL_SERVER_ERROR, "DIRECTORY_ERROR"),
        };
        Self::new(status, code, e)
    }
}

impl From<EngagementError> for ApiError {
    fn from(e: EngagementError) -> Self {
        let (status, code) = match &e {
            EngagementError::FilmNotFound(_) => (StatusCode::NOT_FOUND, "FILM_NOT_FOUND"),
            EngagementError::AccountNotFound(_) => (StatusCode::NOT_FOUND, "ACCOUNT_NOT_FOUND"),
            EngagementError::Catalog(_) => (StatusCode::INTERNAL_SERVER_ERROR, "CATALOG_ERROR"),
            EngagementError::Directory(_) => (StatusCode::INTERNAL_SERVER_ERROR, "DIRECTORY_ERROR"),
        };
        Self::new(status, code, e)
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        if self.status.is_server_error() {
            tracing::error!(code = %self.body.code, error = %self.body.error, "Request failed");
        } else {
            tracing::warn!(code = %self.body.code, error = %self.body.error, "Request error");
        }
        (self.status, Json(self.body)).into_response()
    }
}

type SharedState<S, D> = State<Arc<ServiceState<S, D>>>;

// ============================================================================
// Route Handlers
// ============================================================================

/// Resolve account ids to records, skipping ids the directory no longer knows.
async fn resolve_accounts<S, D>(
    state: &ServiceState<S, D>,
    ids: impl IntoIterator<Item = AccountId>,
) -> Result<Vec<Account>, ApiError>
where
    S: RelationshipStore + 'static,
    D: AccountDirectory + FilmCatalog + 'static,
{
    let mut accounts = Vec::new();
    for id in ids {
        let record = <D as Directory<AccountId>>::get(&state.directory, &id)
            .await
            .map_err(|e| ApiError::from(FriendshipError::from_directory(e)))?;
        if let Some(account) = record {
            accounts.push(account);
        }
    }
    Ok(accounts)
}

/// Send a friend request from `id` to `friend_id`.
async fn request_friend_handler<S, D>(
    State(state): SharedState<S, D>,
    Path((id, friend_id)): Path<(i64, i64)>,
) -> Result<StatusCode, ApiError>
where
    S: RelationshipStore + 'static,
    D: AccountDirectory + FilmCatalog + 'static,
{
    state.graph.request(AccountId::new(id), AccountId::new(friend_id)).await?;
    Ok(StatusCode::OK)
}

/// Confirm, as `id`, the request sent by `friend_id`.
async fn confirm_friend_handler<S, D>(
    State(state): SharedState<S, D>,
    Path((id, friend_id)): Path<(i64, i64)>,
) -> Result<StatusCode, ApiError>
where
    S: RelationshipStore + 'static,
    D: AccountDirectory + FilmCatalog + 'static,
{
    state.graph.confirm(AccountId::new(id), AccountId::new(friend_id)).await?;
    Ok(StatusCode::OK)
}

/// Remove any relationship between `id` and `friend_id`. Always 204 on success.
async fn remove_friend_handler<S, D>(
    State(state): SharedState<S, D>,
    Path((id, friend_id)): Path<(i64, i64)>,
) -> Result<StatusCode, ApiError>
where
    S: RelationshipStore + 'static,
    D: AccountDirectory + FilmCatalog + 'static,
{
    let removal = state.graph.remove(AccountId::new(id), AccountId::new(friend_id)).await?;
    if removal == Removal::NotRelated {
        tracing::debug!(id, friend_id, "Remove of absent relationship accepted");
    }
    Ok(StatusCode::NO_CONTENT)
}

/// List confirmed friends of `id`.
async fn list_friends_handler<S, D>(
    State(state): SharedState<S, D>,
    Path(id): Path<i64>,
) -> Result<Json<Vec<Account>>, ApiError>
where
    S: RelationshipStore + 'static,
    D: AccountDirectory + FilmCatalog + 'static,
{
    let friends = state.graph.friends_of(AccountId::new(id)).await?;
    Ok(Json(resolve_accounts(&state, friends).await?))
}

/// List friends shared by `id` and `other_id`.
async fn common_friends_handler<S, D>(
    State(state): SharedState<S, D>,
    Path((id, other_id)): Path<(i64, i64)>,
) -> Result<Json<Vec<Account>>, ApiError>
where
    S: RelationshipStore + 'static,
    D: AccountDirectory + FilmCatalog + 'static,
{
    let common = state.graph
        .common_friends(AccountId::new(id), AccountId::new(other_id))
        .await?;
    Ok(Json(resolve_accounts(&state, common).await?))
}

/// List pending requests awaiting `id`'s confirmation.
async fn incoming_requests_handler<S, D>(
    State(state): SharedState<S, D>,
    Path(id): Path<i64>,
) -> Result<Json<Vec<RelationshipEdge>>, ApiError>
where
    S: RelationshipStore + 'static,
    D: AccountDirectory + FilmCatalog + 'static,
{
    Ok(Json(state.graph.incoming_requests(AccountId::new(id)).await?))
}

/// Like a film.
async fn add_like_handler<S, D>(
    State(state): SharedState<S, D>,
    Path((id, user_id)): Path<(i64, i64)>,
) -> Result<StatusCode, ApiError>
where
    S: RelationshipStore + 'static,
    D: AccountDirectory + FilmCatalog + 'static,
{
    state.engagement.add_like(FilmId::new(id), AccountId::new(user_id)).await?;
    Ok(StatusCode::OK)
}

/// Withdraw a like.
async fn remove_like_handler<S, D>(
    State(state): SharedState<S, D>,
    Path((id, user_id)): Path<(i64, i64)>,
) -> Result<StatusCode, ApiError>
where
    S: RelationshipStore + 'static,
    D: AccountDirectory + FilmCatalog + 'static,
{
    state.engagement.remove_like(FilmId::new(id), AccountId::new(user_id)).await?;
    Ok(StatusCode::NO_CONTENT)
}

/// Most liked films.
async fn popular_films_handler<S, D>(
    State(state): SharedState<S, D>,
    Query(query): Query<PopularQuery>,
) -> Result<Json<Vec<Film>>, ApiError>
where
    S: RelationshipStore + 'static,
    D: AccountDirectory + FilmCatalog + 'static,
{
    let count = query.count.unwrap_or(DEFAULT_POPULAR_COUNT);
    Ok(Json(state.engagement.popular(count).await?))
}

/// Health check endpoint (detailed).
async fn health_handler<S, D>(State(state): SharedState<S, D>) -> Json<HealthResponse>
where
    S: RelationshipStore + 'static,
    D: AccountDirectory + FilmCatalog + 'static,
{
    let ping = state.store().ping().await;
    let pool = state.store().pool_stats();

    Json(HealthResponse {
        status: if ping.is_ok() { "healthy" } else { "degraded" }.to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
        schema_version: FILMGRAPH_SCHEMA_VERSION.to_string(),
        store_connected: ping.is_ok(),
        store_error: ping.err().map(|e| e.to_string()),
        pool_size: pool.as_ref().map(|p| p.size),
        pool_idle: pool.as_ref().map(|p| p.idle),
        pool_max: pool.as_ref().map(|p| p.max),
    })
}

/// Liveness probe endpoint. Does NOT check dependencies.
async fn liveness_handler() -> Json<LivenessResponse> {
    Json(LivenessResponse {
        status: "alive".to_string(),
    })
}

/// Readiness probe endpoint. Returns 503 while the store is unreachable.
async fn readiness_handler<S, D>(
    State(state): SharedState<S, D>,
) -> Result<Json<ReadinessResponse>, (StatusCode, Json<ReadinessResponse>)>
where
    S: RelationshipStore + 'static,
    D: AccountDirectory + FilmCatalog + 'static,
{
    match state.store().ping().await {
        Ok(()) => Ok(Json(ReadinessResponse {
            ready: true,
            store: true,
            details: None,
        })),
        Err(e) => Err((
            StatusCode::SERVICE_UNAVAILABLE,
            Json(ReadinessResponse {
                ready: false,
                store: false,
                details: Some(e.to_string()),
            }),
        )),
    }
}

// ============================================================================
// Router Construction
// ============================================================================

/// Create the Axum router for the film graph service.
pub fn create_router<S, D>(state: ServiceState<S, D>) -> Router
where
    S: RelationshipStore + 'static,
    D: AccountDirectory + FilmCatalog + 'static,
{
    let state = Arc::new(state);

    Router::new()
        // Friendships
        .route("/users/:id/friends", get(list_friends_handler::<S, D>))
        .route("/users/:id/friends/requests", get(incoming_requests_handler::<S, D>))
        .route("/users/:id/friends/common/:other_id", get(common_friends_handler::<S, D>))
        .route(
            "/users/:id/friends/:friend_id",
            put(request_friend_handler::<S, D>).delete(remove_friend_handler::<S, D>),
        )
        .route("/users/:id/friends/:friend_id/confirm", put(confirm_friend_handler::<S, D>))
        // Films
        .route("/films/popular", get(popular_films_handler::<S, D>))
        .route(
            "/films/:id/like/:user_id",
            put(add_like_handler::<S, D>).delete(remove_like_handler::<S, D>),
        )
        // Health checks
        .route("/health", get(health_handler::<S, D>))
        .route("/health/live", get(liveness_handler))
        .route("/health/ready", get(readiness_handler::<S, D>))
        .layer(middleware::from_fn(metrics_middleware))
        .with_state(state)
}
