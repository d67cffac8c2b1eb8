//! Source CRUD endpoints and the identifier mapping preview

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    routing::{get, post},
    Json, Router,
};
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use sqlx::SqlitePool;
use stats_common::db::models::Source;
use tracing::info;

use super::{form_data, ListParams, ListResponse};
use crate::db::{countries, sources};
use crate::error::{ApiError, ApiResult};
use crate::forms::source::{source_form, SourceFields, LIST_COLUMNS};
use crate::forms::{FieldErrors, FormInfo};
use crate::mapping::{format_map_type, normalize_identifier_mapping, preview_mapping, MappingPreview};
use crate::AppState;

const UNKNOWN_COUNTRY: &str = "Unknown country.";

/// Source as rendered to clients, with the mode's display label
#[derive(Debug, Serialize)]
pub struct SourceView {
    #[serde(flatten)]
    pub source: Source,
    pub identifier_map_type_label: String,
}

impl From<Source> for SourceView {
    fn from(source: Source) -> Self {
        let identifier_map_type_label = format_map_type(source.identifier_map_type);
        Self {
            source,
            identifier_map_type_label,
        }
    }
}

/// Mapping preview request body
#[derive(Debug, Default, Deserialize)]
pub struct PreviewRequest {
    pub regex: Option<String>,
    pub replace: Option<String>,
    pub sample: Option<String>,
}

/// GET /api/v1/source/_info
pub async fn source_info() -> Json<FormInfo> {
    Json(source_form().info())
}

/// GET /api/v1/source/
pub async fn list_sources(
    State(state): State<AppState>,
    Query(params): Query<ListParams>,
) -> ApiResult<Json<ListResponse<SourceView>>> {
    let sort = params.sort(&LIST_COLUMNS, "source_id")?;
    let total = sources::count_sources(&state.db).await?;
    let pagination = params.pagination(total);
    let items = sources::list_sources(&state.db, sort, pagination.page_size, pagination.offset)
        .await?
        .into_iter()
        .map(SourceView::from)
        .collect();

    Ok(Json(ListResponse::new(items, pagination, sort)))
}

/// GET /api/v1/source/:id
pub async fn get_source(State(state): State<AppState>, Path(id): Path<i64>) -> ApiResult<Json<SourceView>> {
    sources::get_source(&state.db, id)
        .await?
        .map(|source| Json(source.into()))
        .ok_or_else(|| source_not_found(id))
}

/// POST /api/v1/source/
pub async fn create_source(
    State(state): State<AppState>,
    Json(body): Json<Value>,
) -> ApiResult<(StatusCode, Json<SourceView>)> {
    let fields = prepare(&state.db, &body).await?;
    let id = sources::insert_source(&state.db, &fields).await?;
    info!("Created source {} ({})", fields.source_id, id);

    let stored = sources::get_source(&state.db, id)
        .await?
        .ok_or_else(|| ApiError::Internal(format!("Source {} vanished after insert", id)))?;
    Ok((StatusCode::CREATED, Json(stored.into())))
}

/// PUT /api/v1/source/:id
pub async fn update_source(
    State(state): State<AppState>,
    Path(id): Path<i64>,
    Json(body): Json<Value>,
) -> ApiResult<Json<SourceView>> {
    if sources::get_source(&state.db, id).await?.is_none() {
        return Err(source_not_found(id));
    }

    let fields = prepare(&state.db, &body).await?;
    if !sources::update_source(&state.db, id, &fields).await? {
        return Err(source_not_found(id));
    }
    info!("Updated source {} ({})", fields.source_id, id);

    sources::get_source(&state.db, id)
        .await?
        .map(|source| Json(source.into()))
        .ok_or_else(|| source_not_found(id))
}

/// DELETE /api/v1/source/:id
pub async fn delete_source(State(state): State<AppState>, Path(id): Path<i64>) -> ApiResult<Json<Value>> {
    if !sources::delete_source(&state.db, id).await? {
        return Err(source_not_found(id));
    }
    info!("Deleted source {}", id);
    Ok(Json(json!({ "deleted": id })))
}

/// POST /api/v1/source/mapping-preview
pub async fn mapping_preview(Json(req): Json<PreviewRequest>) -> Json<MappingPreview> {
    Json(preview_mapping(
        req.regex.as_deref(),
        req.replace.as_deref(),
        req.sample.as_deref(),
    ))
}

/// Validate, coerce and normalize a submitted source form
async fn prepare(pool: &SqlitePool, body: &Value) -> ApiResult<SourceFields> {
    let data = form_data(body)?;
    source_form().validate(&data)?;

    let mut fields = SourceFields::from_form(&data)?;
    normalize_identifier_mapping(&mut fields);

    if let Some(iso) = &fields.country_iso {
        if !countries::country_exists(pool, iso).await? {
            return Err(ApiError::Validation(FieldErrors::single("country_iso", UNKNOWN_COUNTRY)));
        }
    }

    Ok(fields)
}

fn source_not_found(id: i64) -> ApiError {
    ApiError::NotFound(format!("Source {} not found", id))
}

/// Source routes (session required)
pub fn source_routes() -> Router<AppState> {
    Router::new()
        .route("/api/v1/source/_info", get(source_info))
        .route("/api/v1/source/mapping-preview", post(mapping_preview))
        .route("/api/v1/source/", get(list_sources).post(create_source))
        .route("/api/v1/source", get(list_sources).post(create_source))
        .route(
            "/api/v1/source/:id",
            get(get_source).put(update_source).delete(delete_source),
        )
}
