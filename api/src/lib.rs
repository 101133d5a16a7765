use axum::{
    Json, Router,
    extract::{FromRef, Path, State},
    http::StatusCode,
    response::{IntoResponse, Json as JsonResponse, Response},
    routing::{get, put},
};
use std::sync::Arc;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;
use tracing::{error, info};

use application::{
    ApplicationError, ErrorResponse, IdGenerator, MessageResponse, ProjectService, RecordService,
    SharedStore, SkillService, StoreRepository,
};
use domain::{Project, Record, Skill};

pub mod config;

/// Application state shared by every handler.
#[derive(Clone)]
pub struct AppState {
    skill_service: Arc<SkillService>,
    project_service: Arc<ProjectService>,
}

impl AppState {
    /// Wires both services onto one shared store (and so one writer lock).
    pub fn new(repository: Arc<dyn StoreRepository>, ids: Arc<dyn IdGenerator>) -> Self {
        let store = Arc::new(SharedStore::new(repository));
        Self {
            skill_service: Arc::new(SkillService::new(store.clone(), ids.clone())),
            project_service: Arc::new(ProjectService::new(store, ids)),
        }
    }
}

impl FromRef<AppState> for Arc<SkillService> {
    fn from_ref(state: &AppState) -> Self {
        state.skill_service.clone()
    }
}

impl FromRef<AppState> for Arc<ProjectService> {
    fn from_ref(state: &AppState) -> Self {
        state.project_service.clone()
    }
}

/// Builds the full router: `/health` plus the skill and project routes under `/api`.
pub fn build_router(state: AppState) -> Router {
    let api = Router::new()
        .route(
            "/skills",
            get(list_records_handler::<Skill>).post(create_record_handler::<Skill>),
        )
        .route(
            "/skills/:id",
            put(update_record_handler::<Skill>).delete(delete_record_handler::<Skill>),
        )
        .route(
            "/projects",
            get(list_records_handler::<Project>).post(create_record_handler::<Project>),
        )
        .route(
            "/projects/:id",
            put(update_record_handler::<Project>).delete(delete_record_handler::<Project>),
        );

    Router::new()
        .route("/health", get(health_check))
        .nest("/api", api)
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
        .with_state(state)
}

// --- API Handlers ---

async fn health_check() -> impl IntoResponse {
    info!("Health check endpoint called");
    (StatusCode::OK, "OK")
}

/// GET /api/{collection}
async fn list_records_handler<R: Record>(
    State(service): State<Arc<RecordService<R>>>,
) -> Response {
    let collection = R::KIND.collection();
    info!(collection, "Received request to list records");
    match service.list().await {
        Ok(records) => (StatusCode::OK, JsonResponse(records)).into_response(),
        Err(e) => {
            error!(collection, "Failed to list records via handler: {}", e);
            map_application_error_to_response(e)
        }
    }
}

/// POST /api/{collection}. Responds 200 with the stored record, id included.
async fn create_record_handler<R: Record>(
    State(service): State<Arc<RecordService<R>>>,
    Json(draft): Json<R::Draft>,
) -> Response {
    let collection = R::KIND.collection();
    info!(collection, "Received request to create record");
    match service.create(draft).await {
        Ok(record) => (StatusCode::OK, JsonResponse(record)).into_response(),
        Err(e) => {
            error!(collection, "Failed to create record via handler: {}", e);
            map_application_error_to_response(e)
        }
    }
}

/// PUT /api/{collection}/:id
async fn update_record_handler<R: Record>(
    State(service): State<Arc<RecordService<R>>>,
    Path(raw_id): Path<String>,
    Json(draft): Json<R::Draft>,
) -> Response {
    let collection = R::KIND.collection();
    info!(collection, id = %raw_id, "Received request to update record");
    match service.update(&raw_id, draft).await {
        Ok(record) => (StatusCode::OK, JsonResponse(record)).into_response(),
        Err(e) => map_application_error_to_response(e),
    }
}

/// DELETE /api/{collection}/:id. Always confirms, whether or not anything matched.
async fn delete_record_handler<R: Record>(
    State(service): State<Arc<RecordService<R>>>,
    Path(raw_id): Path<String>,
) -> Response {
    let collection = R::KIND.collection();
    info!(collection, id = %raw_id, "Received request to delete record");
    match service.delete(&raw_id).await {
        Ok(_) => (
            StatusCode::OK,
            JsonResponse(MessageResponse::deleted(R::KIND)),
        )
            .into_response(),
        Err(e) => {
            error!(collection, id = %raw_id, "Failed to delete record via handler: {}", e);
            map_application_error_to_response(e)
        }
    }
}

/// Maps ApplicationError to an HTTP status code and response body.
/// Only not-found carries a JSON body; store failures stay opaque to the client.
fn map_application_error_to_response(err: ApplicationError) -> Response {
    match err {
        ApplicationError::NotFound(kind) => (
            StatusCode::NOT_FOUND,
            JsonResponse(ErrorResponse::not_found(kind)),
        )
            .into_response(),
        ApplicationError::StoreUnavailable(msg) | ApplicationError::StoreCorrupt(msg) => {
            error!("Underlying store error: {}", msg);
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                "An internal server error occurred".to_string(),
            )
                .into_response()
        }
    }
}
