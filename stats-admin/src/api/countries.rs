//! Country CRUD endpoints

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    routing::get,
    Json, Router,
};
use serde_json::{json, Value};
use stats_common::db::models::Country;
use tracing::info;

use super::{form_data, ListParams, ListResponse};
use crate::db::countries;
use crate::error::{ApiError, ApiResult};
use crate::forms::country::{country_form, CountryFields, LIST_COLUMNS};
use crate::forms::{FormData, FormInfo};
use crate::AppState;

/// GET /api/v1/country/_info
pub async fn country_info() -> Json<FormInfo> {
    Json(country_form().info())
}

/// GET /api/v1/country/
pub async fn list_countries(
    State(state): State<AppState>,
    Query(params): Query<ListParams>,
) -> ApiResult<Json<ListResponse<Country>>> {
    let sort = params.sort(&LIST_COLUMNS, "iso")?;
    let total = countries::count_countries(&state.db).await?;
    let pagination = params.pagination(total);
    let items = countries::list_countries(&state.db, sort, pagination.page_size, pagination.offset).await?;

    Ok(Json(ListResponse::new(items, pagination, sort)))
}

/// GET /api/v1/country/:iso
pub async fn get_country(State(state): State<AppState>, Path(iso): Path<String>) -> ApiResult<Json<Country>> {
    countries::get_country(&state.db, &iso)
        .await?
        .map(Json)
        .ok_or_else(|| country_not_found(&iso))
}

/// POST /api/v1/country/
pub async fn create_country(
    State(state): State<AppState>,
    Json(body): Json<Value>,
) -> ApiResult<(StatusCode, Json<Country>)> {
    let fields = validated(&form_data(&body)?)?;

    // Duplicate ISO codes surface as 409 through the unique violation
    countries::insert_country(&state.db, &fields).await?;
    info!("Created country {}", fields.iso);

    Ok((
        StatusCode::CREATED,
        Json(Country {
            iso: fields.iso,
            name: fields.name,
        }),
    ))
}

/// PUT /api/v1/country/:iso
pub async fn update_country(
    State(state): State<AppState>,
    Path(iso): Path<String>,
    Json(body): Json<Value>,
) -> ApiResult<Json<Country>> {
    if !countries::country_exists(&state.db, &iso).await? {
        return Err(country_not_found(&iso));
    }

    let fields = validated(&form_data(&body)?)?;
    countries::update_country(&state.db, &iso, &fields).await?;
    info!("Updated country {}", iso);

    Ok(Json(Country {
        iso: fields.iso,
        name: fields.name,
    }))
}

/// DELETE /api/v1/country/:iso
///
/// Refused with 409 while any source still references the country.
pub async fn delete_country(State(state): State<AppState>, Path(iso): Path<String>) -> ApiResult<Json<Value>> {
    if !countries::country_exists(&state.db, &iso).await? {
        return Err(country_not_found(&iso));
    }

    let in_use = countries::count_country_sources(&state.db, &iso).await?;
    if in_use > 0 {
        return Err(ApiError::Conflict(format!(
            "Country {} is used by {} source(s)",
            iso, in_use
        )));
    }

    countries::delete_country(&state.db, &iso).await?;
    info!("Deleted country {}", iso);

    Ok(Json(json!({ "deleted": iso })))
}

fn validated(data: &FormData) -> ApiResult<CountryFields> {
    country_form().validate(data)?;
    Ok(CountryFields::from_form(data)?)
}

fn country_not_found(iso: &str) -> ApiError {
    ApiError::NotFound(format!("Country {} not found", iso))
}

/// Country routes (session required)
pub fn country_routes() -> Router<AppState> {
    Router::new()
        .route("/api/v1/country/_info", get(country_info))
        .route("/api/v1/country/", get(list_countries).post(create_country))
        .route("/api/v1/country", get(list_countries).post(create_country))
        .route(
            "/api/v1/country/:iso",
            get(get_country).put(update_country).delete(delete_country),
        )
}
