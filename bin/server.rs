// RideRoad - API Server
// JSON API over the garage store, shared behind a mutex

use anyhow::Context;
use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::{IntoResponse, Json, Response},
    routing::{delete, get},
    Router,
};
use serde::{Deserialize, Serialize};
use std::sync::{Arc, Mutex, MutexGuard};
use tower::ServiceBuilder;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;
use uuid::Uuid;

use rideroad::achievements::{self, AchievementStatus, AchievementSummary};
use rideroad::stats::{self, GarageSummary, GroupStatistics};
use rideroad::{AppConfig, Family, GarageStore, InventoryRow, SqliteSettings, Vehicle, VehicleGroup};

const ADDR: &str = "0.0.0.0:3000";

/// Shared application state
#[derive(Clone)]
struct AppState {
    store: Arc<Mutex<GarageStore>>,
}

/// API Response wrapper
#[derive(Serialize)]
struct ApiResponse<T> {
    success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    data: Option<T>,
    #[serde(skip_serializing_if = "Option::is_none")]
    error: Option<String>,
}

impl<T> ApiResponse<T> {
    fn ok(data: T) -> Self {
        Self {
            success: true,
            data: Some(data),
            error: None,
        }
    }
}

impl ApiResponse<()> {
    fn err(message: impl Into<String>) -> Self {
        Self {
            success: false,
            data: None,
            error: Some(message.into()),
        }
    }
}

fn error_response(status: StatusCode, message: impl Into<String>) -> Response {
    (status, Json(ApiResponse::err(message))).into_response()
}

/// Group plus its derived figures
#[derive(Serialize)]
struct GroupResponse {
    #[serde(flatten)]
    group: VehicleGroup,
    statistics: GroupStatistics,
}

impl From<&VehicleGroup> for GroupResponse {
    fn from(group: &VehicleGroup) -> Self {
        Self {
            group: group.clone(),
            statistics: GroupStatistics::compute(group),
        }
    }
}

#[derive(Serialize)]
struct AchievementsResponse {
    summary: AchievementSummary,
    achievements: Vec<AchievementStatus>,
}

#[derive(Serialize)]
struct TypeCountResponse {
    family: Family,
    type_tag: String,
    count: i64,
}

#[derive(Serialize)]
struct CreatedResponse {
    id: Uuid,
}

#[derive(Deserialize)]
struct NewGroupRequest {
    name: String,
    location: String,
    #[serde(default)]
    description: String,
}

// ============================================================================
// Helpers
// ============================================================================

fn lock_store(state: &AppState) -> Result<MutexGuard<'_, GarageStore>, Response> {
    state.store.lock().map_err(|_| {
        warn!("Store mutex poisoned");
        error_response(StatusCode::INTERNAL_SERVER_ERROR, "store unavailable")
    })
}

fn parse_family(raw: &str) -> Result<Family, Response> {
    Family::parse(raw).ok_or_else(|| {
        error_response(StatusCode::NOT_FOUND, format!("unknown family '{}'", raw))
    })
}

/// Mutation applied; report a failed write-through as a server error
fn write_outcome(store: &GarageStore, ok: Response) -> Response {
    match store.last_write_error() {
        Some(err) => error_response(
            StatusCode::INTERNAL_SERVER_ERROR,
            format!("change applied but not saved: {}", err),
        ),
        None => ok,
    }
}

// ============================================================================
// API Handlers
// ============================================================================

/// GET /api/health - Health check
async fn health_check() -> impl IntoResponse {
    Json(ApiResponse::ok("OK"))
}

/// GET /api/stats - Both families plus combined figures
async fn get_stats(State(state): State<AppState>) -> Response {
    let store = match lock_store(&state) {
        Ok(store) => store,
        Err(resp) => return resp,
    };

    let summary = GarageSummary::compute(store.garage());
    (StatusCode::OK, Json(ApiResponse::ok(summary))).into_response()
}

/// GET /api/achievements - Every rule, evaluated now
async fn get_achievements(State(state): State<AppState>) -> Response {
    let store = match lock_store(&state) {
        Ok(store) => store,
        Err(resp) => return resp,
    };

    let statuses = achievements::evaluate(store.garage());
    let response = AchievementsResponse {
        summary: AchievementSummary::from_statuses(&statuses),
        achievements: statuses,
    };
    (StatusCode::OK, Json(ApiResponse::ok(response))).into_response()
}

/// GET /api/:family/groups
async fn list_groups(State(state): State<AppState>, Path(family): Path<String>) -> Response {
    let family = match parse_family(&family) {
        Ok(family) => family,
        Err(resp) => return resp,
    };
    let store = match lock_store(&state) {
        Ok(store) => store,
        Err(resp) => return resp,
    };

    let groups: Vec<GroupResponse> = store.groups(family).iter().map(GroupResponse::from).collect();
    (StatusCode::OK, Json(ApiResponse::ok(groups))).into_response()
}

/// POST /api/:family/groups
async fn create_group(
    State(state): State<AppState>,
    Path(family): Path<String>,
    Json(request): Json<NewGroupRequest>,
) -> Response {
    let family = match parse_family(&family) {
        Ok(family) => family,
        Err(resp) => return resp,
    };
    if request.name.trim().is_empty() || request.location.trim().is_empty() {
        return error_response(StatusCode::BAD_REQUEST, "name and location are required");
    }

    let mut store = match lock_store(&state) {
        Ok(store) => store,
        Err(resp) => return resp,
    };

    let id = store.create_group(family, request.name, request.location, request.description);
    info!(family = family.as_str(), group_id = %id, "Group created via API");

    let ok = (StatusCode::CREATED, Json(ApiResponse::ok(CreatedResponse { id }))).into_response();
    write_outcome(&store, ok)
}

/// DELETE /api/:family/groups/:id
async fn delete_group(
    State(state): State<AppState>,
    Path((family, group_id)): Path<(String, Uuid)>,
) -> Response {
    let family = match parse_family(&family) {
        Ok(family) => family,
        Err(resp) => return resp,
    };
    let mut store = match lock_store(&state) {
        Ok(store) => store,
        Err(resp) => return resp,
    };

    if !store.delete_group(family, group_id) {
        return error_response(StatusCode::NOT_FOUND, format!("group {} not found", group_id));
    }

    let ok = (StatusCode::OK, Json(ApiResponse::ok(group_id))).into_response();
    write_outcome(&store, ok)
}

/// GET /api/:family/groups/:id/members
async fn list_members(
    State(state): State<AppState>,
    Path((family, group_id)): Path<(String, Uuid)>,
) -> Response {
    let family = match parse_family(&family) {
        Ok(family) => family,
        Err(resp) => return resp,
    };
    let store = match lock_store(&state) {
        Ok(store) => store,
        Err(resp) => return resp,
    };

    if store.get_group(family, group_id).is_none() {
        return error_response(StatusCode::NOT_FOUND, format!("group {} not found", group_id));
    }

    let members: Vec<Vehicle> = store.get_members(family, group_id).to_vec();
    (StatusCode::OK, Json(ApiResponse::ok(members))).into_response()
}

/// POST /api/:family/groups/:id/members - body uses the CSV row fields
async fn add_member(
    State(state): State<AppState>,
    Path((family, group_id)): Path<(String, Uuid)>,
    Json(row): Json<InventoryRow>,
) -> Response {
    let family = match parse_family(&family) {
        Ok(family) => family,
        Err(resp) => return resp,
    };
    let mut store = match lock_store(&state) {
        Ok(store) => store,
        Err(resp) => return resp,
    };

    let vehicle = row.into_vehicle(family);
    let id = vehicle.id;

    if !store.add_member(family, group_id, vehicle) {
        return error_response(StatusCode::NOT_FOUND, format!("group {} not found", group_id));
    }

    let ok = (StatusCode::CREATED, Json(ApiResponse::ok(CreatedResponse { id }))).into_response();
    write_outcome(&store, ok)
}

/// DELETE /api/:family/groups/:id/members/:member_id
async fn remove_member(
    State(state): State<AppState>,
    Path((family, group_id, member_id)): Path<(String, Uuid, Uuid)>,
) -> Response {
    let family = match parse_family(&family) {
        Ok(family) => family,
        Err(resp) => return resp,
    };
    let mut store = match lock_store(&state) {
        Ok(store) => store,
        Err(resp) => return resp,
    };

    if !store.remove_member(family, group_id, member_id) {
        return error_response(
            StatusCode::NOT_FOUND,
            format!("member {} not found in group {}", member_id, group_id),
        );
    }

    let ok = (StatusCode::OK, Json(ApiResponse::ok(member_id))).into_response();
    write_outcome(&store, ok)
}

/// GET /api/:family/types/:tag - quantity carrying one type tag
async fn count_by_type(
    State(state): State<AppState>,
    Path((family, tag)): Path<(String, String)>,
) -> Response {
    let family = match parse_family(&family) {
        Ok(family) => family,
        Err(resp) => return resp,
    };
    let store = match lock_store(&state) {
        Ok(store) => store,
        Err(resp) => return resp,
    };

    // Tags are emoji; clients may send them percent-encoded
    let decoded_tag = urlencoding::decode(&tag)
        .unwrap_or_else(|_| tag.clone().into())
        .into_owned();

    let response = TypeCountResponse {
        family,
        count: stats::count_by_type(store.groups(family), &decoded_tag),
        type_tag: decoded_tag,
    };
    (StatusCode::OK, Json(ApiResponse::ok(response))).into_response()
}

// ============================================================================
// Main Server
// ============================================================================

fn build_router(state: AppState) -> Router {
    let api_routes = Router::new()
        .route("/health", get(health_check))
        .route("/stats", get(get_stats))
        .route("/achievements", get(get_achievements))
        .route("/:family/groups", get(list_groups).post(create_group))
        .route("/:family/groups/:id", delete(delete_group))
        .route("/:family/groups/:id/members", get(list_members).post(add_member))
        .route("/:family/groups/:id/members/:member_id", delete(remove_member))
        .route("/:family/types/:tag", get(count_by_type))
        .with_state(state);

    let middleware = ServiceBuilder::new()
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive());

    Router::new().nest("/api", api_routes).layer(middleware)
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new("rideroad=info,tower_http=info")),
        )
        .init();

    println!("🌐 RideRoad - API Server");
    println!("━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━");

    let config = AppConfig::from_env();
    config
        .ensure_data_dir()
        .with_context(|| format!("Failed to create {}", config.data_dir().display()))?;

    let db_path = config.database_path();
    let settings = SqliteSettings::open(&db_path)
        .with_context(|| format!("Failed to open database {}", db_path.display()))?;
    println!("✓ Database opened: {:?}", db_path);

    let mut store = GarageStore::open(Box::new(settings));
    store.subscribe(|event| {
        info!(
            event = event.event_type.as_str(),
            entity = event.entity_type(),
            persisted = event.persisted,
            "Store changed"
        );
    });

    let state = AppState {
        store: Arc::new(Mutex::new(store)),
    };
    let app = build_router(state);

    let listener = tokio::net::TcpListener::bind(ADDR)
        .await
        .with_context(|| format!("Failed to bind to {}", ADDR))?;

    println!("\n🚀 Server running on http://localhost:3000");
    println!("   API: http://localhost:3000/api/stats");
    println!("\n   Press Ctrl+C to stop\n");

    axum::serve(listener, app).await.context("Server error")?;

    Ok(())
}
