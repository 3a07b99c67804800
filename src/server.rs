//! HTTP API.
//!
//! JSON endpoints over [`TaskService`]. Every task route is scoped to the
//! owner named by the `x-owner-id` header. Responses share one envelope:
//! `{ success, data?, error?, count?, message? }`.

use axum::{
    Router,
    extract::{FromRequest, FromRequestParts, Path, Query, Request, State, rejection::JsonRejection},
    http::{StatusCode, request::Parts},
    response::{IntoResponse, Json, Response},
    routing::{get, post, put},
};
use chrono::Local;
use serde::{Deserialize, Serialize, de::DeserializeOwned};
use std::net::SocketAddr;
use std::sync::Arc;
use tokio::sync::oneshot;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;
use tracing::{info, warn};

use crate::config::{ListingConfig, ServerConfig};
use crate::drag::DropAction;
use crate::error::{ErrorCode, OrderError};
use crate::quadrant::Quadrant;
use crate::service::TaskService;
use crate::store::TaskStore;
use crate::types::{NewTask, SortBy, SortOrder, TaskPatch, TaskQuery, local_day_bounds};

/// Header carrying the caller's owner id.
pub const OWNER_HEADER: &str = "x-owner-id";

/// Service type the router is built over.
pub type SharedService = Arc<TaskService<Arc<dyn TaskStore>>>;

/// State shared across handlers.
#[derive(Clone)]
pub struct AppState {
    service: SharedService,
    listing: Arc<ListingConfig>,
}

impl AppState {
    pub fn new(service: SharedService, listing: ListingConfig) -> Self {
        Self {
            service,
            listing: Arc::new(listing),
        }
    }
}

/// Response envelope.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ApiResponse<T: Serialize> {
    pub success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<T>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<OrderError>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub count: Option<usize>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}

impl<T: Serialize> ApiResponse<T> {
    fn ok(data: T) -> Self {
        Self {
            success: true,
            data: Some(data),
            error: None,
            count: None,
            message: None,
        }
    }

    fn with_count(mut self, count: usize) -> Self {
        self.count = Some(count);
        self
    }

    fn with_message(mut self, message: impl Into<String>) -> Self {
        self.message = Some(message.into());
        self
    }
}

/// Error side of a handler, rendered through the envelope.
#[derive(Debug)]
pub struct ApiError(pub OrderError);

impl From<OrderError> for ApiError {
    fn from(err: OrderError) -> Self {
        ApiError(err)
    }
}

/// HTTP status for an error code.
pub fn status_for(code: ErrorCode) -> StatusCode {
    match code {
        ErrorCode::TaskNotFound => StatusCode::NOT_FOUND,
        ErrorCode::MissingOwner => StatusCode::UNAUTHORIZED,
        ErrorCode::MissingRequiredField | ErrorCode::InvalidFieldValue => StatusCode::BAD_REQUEST,
        ErrorCode::UnsupportedReorder => StatusCode::UNPROCESSABLE_ENTITY,
        ErrorCode::PartialWrite | ErrorCode::DatabaseError | ErrorCode::InternalError => {
            StatusCode::INTERNAL_SERVER_ERROR
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = status_for(self.0.code);
        if status.is_server_error() {
            warn!(code = ?self.0.code, error = %self.0, "Request failed");
        }
        let body: ApiResponse<()> = ApiResponse {
            success: false,
            data: None,
            error: Some(self.0),
            count: None,
            message: None,
        };
        (status, Json(body)).into_response()
    }
}

type ApiResult<T> = Result<Json<ApiResponse<T>>, ApiError>;

/// Owner id taken from the request header.
#[derive(Debug, Clone)]
pub struct Owner(pub String);

impl<S: Send + Sync> FromRequestParts<S> for Owner {
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        parts
            .headers
            .get(OWNER_HEADER)
            .and_then(|v| v.to_str().ok())
            .map(str::trim)
            .filter(|v| !v.is_empty())
            .map(|v| Owner(v.to_string()))
            .ok_or_else(|| ApiError(OrderError::missing_owner()))
    }
}

impl From<JsonRejection> for ApiError {
    fn from(rejection: JsonRejection) -> Self {
        ApiError(OrderError::invalid_body(rejection.body_text()))
    }
}

/// JSON body whose rejections use the response envelope.
#[derive(Debug)]
pub struct ApiJson<T>(pub T);

impl<S, T> FromRequest<S> for ApiJson<T>
where
    S: Send + Sync,
    T: DeserializeOwned,
{
    type Rejection = ApiError;

    async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
        let Json(value) = Json::<T>::from_request(req, state).await?;
        Ok(ApiJson(value))
    }
}

/// Query string for `GET /api/tasks`.
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ListParams {
    pub search: Option<String>,
    pub quadrant: Option<String>,
    pub completed: Option<bool>,
    pub sort_by: Option<String>,
    pub sort_order: Option<String>,
    #[serde(default)]
    pub filter_today: bool,
    pub limit: Option<usize>,
    pub offset: Option<usize>,
}

impl ListParams {
    /// Build a [`TaskQuery`], filling gaps from the listing defaults.
    pub fn to_query(&self, defaults: &ListingConfig) -> Result<TaskQuery, OrderError> {
        let quadrant = self
            .quadrant
            .as_deref()
            .map(|q| q.parse::<Quadrant>())
            .transpose()
            .map_err(|e| OrderError::invalid_value("quadrant", &e.to_string()))?;
        let sort_by = match self.sort_by.as_deref() {
            Some(s) => s
                .parse::<SortBy>()
                .map_err(|e| OrderError::invalid_value("sortBy", &e))?,
            None => defaults.sort_by,
        };
        let sort_order = match self.sort_order.as_deref() {
            Some(s) => s
                .parse::<SortOrder>()
                .map_err(|e| OrderError::invalid_value("sortOrder", &e))?,
            None => defaults.sort_order,
        };

        Ok(TaskQuery {
            search: self.search.clone().filter(|s| !s.trim().is_empty()),
            quadrant,
            completed: self.completed,
            due_between: self.filter_today.then(|| local_day_bounds(Local::now())),
            sort_by,
            sort_order,
            limit: self.limit.unwrap_or(defaults.page_size),
            offset: self.offset.unwrap_or(0),
        })
    }
}

/// Body of `POST /api/tasks/drop`.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DropRequest {
    pub active_id: String,
    pub over_id: Option<String>,
}

#[derive(Serialize)]
struct HealthResponse {
    status: &'static str,
    version: &'static str,
}

async fn health() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok",
        version: env!("CARGO_PKG_VERSION"),
    })
}

async fn list_tasks(
    State(state): State<AppState>,
    Owner(owner): Owner,
    Query(params): Query<ListParams>,
) -> ApiResult<Vec<crate::types::Task>> {
    let query = params.to_query(&state.listing)?;
    let tasks = state.service.list(&owner, &query).await?;
    let count = tasks.len();
    Ok(Json(ApiResponse::ok(tasks).with_count(count)))
}

async fn ordered_tasks(
    State(state): State<AppState>,
    Owner(owner): Owner,
) -> ApiResult<Vec<crate::types::Task>> {
    let tasks = state.service.ordered(&owner).await?;
    let count = tasks.len();
    Ok(Json(ApiResponse::ok(tasks).with_count(count)))
}

async fn create_task(
    State(state): State<AppState>,
    Owner(owner): Owner,
    ApiJson(new): ApiJson<NewTask>,
) -> Result<(StatusCode, Json<ApiResponse<crate::types::Task>>), ApiError> {
    let task = state.service.create(&owner, new).await?;
    Ok((
        StatusCode::CREATED,
        Json(ApiResponse::ok(task).with_message("Task created")),
    ))
}

async fn update_task(
    State(state): State<AppState>,
    Owner(owner): Owner,
    Path(task_id): Path<String>,
    ApiJson(patch): ApiJson<TaskPatch>,
) -> ApiResult<crate::types::Task> {
    let task = state.service.update(&owner, &task_id, patch).await?;
    Ok(Json(ApiResponse::ok(task)))
}

async fn toggle_task(
    State(state): State<AppState>,
    Owner(owner): Owner,
    Path(task_id): Path<String>,
) -> ApiResult<crate::types::Task> {
    let task = state.service.toggle_complete(&owner, &task_id).await?;
    Ok(Json(ApiResponse::ok(task)))
}

async fn delete_task(
    State(state): State<AppState>,
    Owner(owner): Owner,
    Path(task_id): Path<String>,
) -> ApiResult<()> {
    state.service.delete(&owner, &task_id).await?;
    Ok(Json(ApiResponse {
        success: true,
        data: None,
        error: None,
        count: None,
        message: Some("Task deleted".to_string()),
    }))
}

async fn drop_task(
    State(state): State<AppState>,
    Owner(owner): Owner,
    ApiJson(body): ApiJson<DropRequest>,
) -> ApiResult<crate::service::DropOutcome> {
    let action = DropAction::resolve(&body.active_id, body.over_id.as_deref());
    let outcome = state.service.apply_drop(&owner, action).await?;
    Ok(Json(ApiResponse::ok(outcome)))
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct FixOrderResponse {
    updated_count: usize,
    scanned: usize,
    failed: Vec<String>,
}

async fn fix_order(State(state): State<AppState>, Owner(owner): Owner) -> ApiResult<FixOrderResponse> {
    let report = state.service.repair(&owner).await?;
    let message = if report.is_clean() {
        format!("Fixed order for {} tasks", report.updated)
    } else {
        format!(
            "Fixed order for {} tasks, {} failed",
            report.updated,
            report.failed.len()
        )
    };
    Ok(Json(
        ApiResponse::ok(FixOrderResponse {
            updated_count: report.updated,
            scanned: report.scanned,
            failed: report.failed,
        })
        .with_message(message),
    ))
}

/// Build the router with all routes.
pub fn build_router(state: AppState) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    Router::new()
        .route("/api/health", get(health))
        .route("/api/tasks", get(list_tasks).post(create_task))
        .route("/api/tasks/ordered", get(ordered_tasks))
        .route("/api/tasks/drop", post(drop_task))
        .route("/api/tasks/fix-order", post(fix_order))
        .route(
            "/api/tasks/{task_id}",
            put(update_task).patch(toggle_task).delete(delete_task),
        )
        .layer(cors)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

/// Start the HTTP server.
///
/// Returns a oneshot sender that signals shutdown, and the address the
/// server is bound to. Port 0 binds an ephemeral port.
pub async fn start_server(
    state: AppState,
    config: &ServerConfig,
) -> anyhow::Result<(oneshot::Sender<()>, SocketAddr)> {
    let app = build_router(state);

    let listener = tokio::net::TcpListener::bind((config.host.as_str(), config.port)).await?;
    let bound_addr = listener.local_addr()?;

    info!("API server listening on http://{}", bound_addr);

    let (shutdown_tx, shutdown_rx) = oneshot::channel::<()>();

    tokio::spawn(async move {
        if let Err(e) = axum::serve(listener, app)
            .with_graceful_shutdown(async {
                let _ = shutdown_rx.await;
                info!("API server shutting down");
            })
            .await
        {
            tracing::error!("API server error: {}", e);
        }
    });

    Ok((shutdown_tx, bound_addr))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_mapping() {
        assert_eq!(status_for(ErrorCode::TaskNotFound), StatusCode::NOT_FOUND);
        assert_eq!(status_for(ErrorCode::MissingOwner), StatusCode::UNAUTHORIZED);
        assert_eq!(
            status_for(ErrorCode::UnsupportedReorder),
            StatusCode::UNPROCESSABLE_ENTITY
        );
        assert_eq!(
            status_for(ErrorCode::PartialWrite),
            StatusCode::INTERNAL_SERVER_ERROR
        );
    }

    #[test]
    fn test_list_params_defaults() {
        let listing = ListingConfig {
            page_size: 7,
            sort_by: SortBy::CreatedAt,
            sort_order: SortOrder::Desc,
        };
        let query = ListParams::default().to_query(&listing).unwrap();
        assert_eq!(query.limit, 7);
        assert_eq!(query.sort_by, SortBy::CreatedAt);
        assert_eq!(query.sort_order, SortOrder::Desc);
        assert!(query.due_between.is_none());
    }

    #[test]
    fn test_list_params_reject_bad_quadrant() {
        let params = ListParams {
            quadrant: Some("7".to_string()),
            ..Default::default()
        };
        let err = params.to_query(&ListingConfig::default()).unwrap_err();
        assert_eq!(err.code, ErrorCode::InvalidFieldValue);
        assert_eq!(err.field.as_deref(), Some("quadrant"));
    }

    #[test]
    fn test_filter_today_sets_window() {
        let params = ListParams {
            filter_today: true,
            quadrant: Some("q2".to_string()),
            ..Default::default()
        };
        let query = params.to_query(&ListingConfig::default()).unwrap();
        let (start, end) = query.due_between.unwrap();
        assert!(start < end);
        assert_eq!(query.quadrant, Some(Quadrant::Schedule));
    }
}
