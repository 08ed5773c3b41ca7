use axum::{
    extract::{
        rejection::{JsonRejection, QueryRejection},
        Path, Query, State,
    },
    http::StatusCode,
    response::Json,
    Json as RequestJson,
};
use parking_lot::Mutex;
use serde::{Deserialize, Serialize};
use std::sync::Arc;

use crate::logic::{PropertyStore, StoreError};
use crate::model::{
    Id, NewProperty, Property, PropertyFeature, PropertyFilter, PropertyImage, PropertyPatch,
    StatusCounts,
};
use crate::store::KeyValueStorage;

/// The store behind one lock, so requests are applied strictly one at a time
pub type AppState<S> = Arc<Mutex<PropertyStore<S>>>;

type ApiResult<T> = Result<T, (StatusCode, Json<ErrorResponse>)>;

#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub status: String,
    pub timestamp: String,
}

pub async fn health_check() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "healthy".to_string(),
        timestamp: chrono::Utc::now().to_rfc3339(),
    })
}

#[derive(Debug, Serialize)]
pub struct ListResponse<T> {
    pub items: Vec<T>,
    pub total: usize,
}

#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    pub error: String,
}

impl ErrorResponse {
    pub fn new(message: &str) -> Self {
        Self {
            error: message.to_string(),
        }
    }
}

#[derive(Debug, Deserialize)]
pub struct ReorderRequest {
    pub active_id: Id,
    pub over_id: Id,
}

#[derive(Debug, Deserialize)]
pub struct NewImageRequest {
    pub url: String,
}

#[derive(Debug, Deserialize)]
pub struct NewFeatureRequest {
    pub name: String,
}

fn store_error(e: StoreError) -> (StatusCode, Json<ErrorResponse>) {
    let status = match e {
        StoreError::InvalidInput(_) => StatusCode::BAD_REQUEST,
        StoreError::NotLoaded | StoreError::Storage(_) | StoreError::Serialize(_) => {
            log::error!("Property store failure: {}", e);
            StatusCode::INTERNAL_SERVER_ERROR
        }
    };
    (status, Json(ErrorResponse::new(&e.to_string())))
}

fn not_found(what: &str) -> (StatusCode, Json<ErrorResponse>) {
    (
        StatusCode::NOT_FOUND,
        Json(ErrorResponse::new(&format!("{} not found", what))),
    )
}

fn json_rejection(rejection: JsonRejection) -> (StatusCode, Json<ErrorResponse>) {
    (
        rejection.status(),
        Json(ErrorResponse::new(&rejection.body_text())),
    )
}

fn query_rejection(rejection: QueryRejection) -> (StatusCode, Json<ErrorResponse>) {
    (
        rejection.status(),
        Json(ErrorResponse::new(&rejection.body_text())),
    )
}

/// A move onto itself is an accepted no-op as long as the id exists;
/// anything else the store declined means an id was missing
fn reorder_outcome(
    moved: bool,
    request: &ReorderRequest,
    exists: bool,
    what: &str,
) -> ApiResult<()> {
    if moved || (request.active_id == request.over_id && exists) {
        Ok(())
    } else {
        Err(not_found(what))
    }
}

fn applied_or_404(applied: bool, what: &str) -> ApiResult<StatusCode> {
    if applied {
        Ok(StatusCode::NO_CONTENT)
    } else {
        Err(not_found(what))
    }
}

pub async fn list_properties<S: KeyValueStorage>(
    State(state): State<AppState<S>>,
    query: Result<Query<PropertyFilter>, QueryRejection>,
) -> ApiResult<Json<ListResponse<Property>>> {
    let Query(filter) = query.map_err(query_rejection)?;
    let items = state.lock().filtered(&filter).map_err(store_error)?;
    let total = items.len();
    Ok(Json(ListResponse { items, total }))
}

pub async fn get_status_counts<S: KeyValueStorage>(
    State(state): State<AppState<S>>,
) -> ApiResult<Json<StatusCounts>> {
    let counts = state.lock().status_counts().map_err(store_error)?;
    Ok(Json(counts))
}

pub async fn get_property<S: KeyValueStorage>(
    State(state): State<AppState<S>>,
    Path(id): Path<Id>,
) -> ApiResult<Json<Property>> {
    match state.lock().get(&id).map_err(store_error)? {
        Some(property) => Ok(Json(property)),
        None => Err(not_found("Property")),
    }
}

pub async fn create_property<S: KeyValueStorage>(
    State(state): State<AppState<S>>,
    body: Result<RequestJson<NewProperty>, JsonRejection>,
) -> ApiResult<(StatusCode, Json<Property>)> {
    let RequestJson(data) = body.map_err(json_rejection)?;
    let property = state.lock().add_property(data).map_err(store_error)?;
    Ok((StatusCode::CREATED, Json(property)))
}

pub async fn update_property<S: KeyValueStorage>(
    State(state): State<AppState<S>>,
    Path(id): Path<Id>,
    body: Result<RequestJson<PropertyPatch>, JsonRejection>,
) -> ApiResult<Json<Property>> {
    let RequestJson(patch) = body.map_err(json_rejection)?;
    let mut store = state.lock();
    if !store.update_property(&id, &patch).map_err(store_error)? {
        return Err(not_found("Property"));
    }
    store
        .get(&id)
        .map_err(store_error)?
        .map(Json)
        .ok_or_else(|| not_found("Property"))
}

pub async fn delete_property<S: KeyValueStorage>(
    State(state): State<AppState<S>>,
    Path(id): Path<Id>,
) -> ApiResult<StatusCode> {
    let deleted = state.lock().delete_property(&id).map_err(store_error)?;
    applied_or_404(deleted, "Property")
}

pub async fn reorder_properties<S: KeyValueStorage>(
    State(state): State<AppState<S>>,
    body: Result<RequestJson<ReorderRequest>, JsonRejection>,
) -> ApiResult<Json<ListResponse<Property>>> {
    let RequestJson(request) = body.map_err(json_rejection)?;
    let mut store = state.lock();
    let moved = store
        .reorder_properties(&request.active_id, &request.over_id)
        .map_err(store_error)?;
    let exists = store.get(&request.active_id).map_err(store_error)?.is_some();
    reorder_outcome(moved, &request, exists, "Property")?;
    let items = store.properties().map_err(store_error)?;
    let total = items.len();
    Ok(Json(ListResponse { items, total }))
}

pub async fn add_image<S: KeyValueStorage>(
    State(state): State<AppState<S>>,
    Path(id): Path<Id>,
    body: Result<RequestJson<NewImageRequest>, JsonRejection>,
) -> ApiResult<(StatusCode, Json<PropertyImage>)> {
    let RequestJson(request) = body.map_err(json_rejection)?;
    match state.lock().add_image(&id, &request.url).map_err(store_error)? {
        Some(image) => Ok((StatusCode::CREATED, Json(image))),
        None => Err(not_found("Property")),
    }
}

pub async fn remove_image<S: KeyValueStorage>(
    State(state): State<AppState<S>>,
    Path((id, image_id)): Path<(Id, Id)>,
) -> ApiResult<StatusCode> {
    let removed = state.lock().remove_image(&id, &image_id).map_err(store_error)?;
    applied_or_404(removed, "Image")
}

pub async fn reorder_images<S: KeyValueStorage>(
    State(state): State<AppState<S>>,
    Path(id): Path<Id>,
    body: Result<RequestJson<ReorderRequest>, JsonRejection>,
) -> ApiResult<StatusCode> {
    let RequestJson(request) = body.map_err(json_rejection)?;
    let mut store = state.lock();
    let moved = store
        .reorder_images(&id, &request.active_id, &request.over_id)
        .map_err(store_error)?;
    let exists = store
        .get(&id)
        .map_err(store_error)?
        .is_some_and(|property| {
            property
                .images
                .iter()
                .any(|item| item.id == request.active_id)
        });
    reorder_outcome(moved, &request, exists, "Image")?;
    Ok(StatusCode::NO_CONTENT)
}

pub async fn add_feature<S: KeyValueStorage>(
    State(state): State<AppState<S>>,
    Path(id): Path<Id>,
    body: Result<RequestJson<NewFeatureRequest>, JsonRejection>,
) -> ApiResult<(StatusCode, Json<PropertyFeature>)> {
    let RequestJson(request) = body.map_err(json_rejection)?;
    match state.lock().add_feature(&id, &request.name).map_err(store_error)? {
        Some(feature) => Ok((StatusCode::CREATED, Json(feature))),
        None => Err(not_found("Property")),
    }
}

pub async fn remove_feature<S: KeyValueStorage>(
    State(state): State<AppState<S>>,
    Path((id, feature_id)): Path<(Id, Id)>,
) -> ApiResult<StatusCode> {
    let removed = state
        .lock()
        .remove_feature(&id, &feature_id)
        .map_err(store_error)?;
    applied_or_404(removed, "Feature")
}

pub async fn reorder_features<S: KeyValueStorage>(
    State(state): State<AppState<S>>,
    Path(id): Path<Id>,
    body: Result<RequestJson<ReorderRequest>, JsonRejection>,
) -> ApiResult<StatusCode> {
    let RequestJson(request) = body.map_err(json_rejection)?;
    let mut store = state.lock();
    let moved = store
        .reorder_features(&id, &request.active_id, &request.over_id)
        .map_err(store_error)?;
    let exists = store
        .get(&id)
        .map_err(store_error)?
        .is_some_and(|property| {
            property
                .features
                .iter()
                .any(|item| item.id == request.active_id)
        });
    reorder_outcome(moved, &request, exists, "Feature")?;
    Ok(StatusCode::NO_CONTENT)
}
