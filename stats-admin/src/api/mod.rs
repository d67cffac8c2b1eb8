//! HTTP API handlers for stats-admin

pub mod auth;
pub mod buildinfo;
pub mod countries;
pub mod health;
pub mod sources;
pub mod ui;

pub use auth::{auth_routes, current_user, require_user, CurrentUser};
pub use buildinfo::get_build_info;
pub use countries::country_routes;
pub use health::health_routes;
pub use sources::source_routes;
pub use ui::{not_found, serve_app_js, serve_index};

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::db::{Sort, SortOrder};
use crate::error::{ApiError, ApiResult};
use crate::forms::FormData;
use crate::pagination::{calculate_pagination, Pagination};

/// Query parameters of list endpoints
#[derive(Debug, Default, Deserialize)]
pub struct ListParams {
    pub page: Option<i64>,
    pub sort: Option<String>,
    pub order: Option<String>,
}

impl ListParams {
    /// Validate sorting against the entity's list columns
    pub(crate) fn sort(&self, allowed: &[&'static str], default: &'static str) -> ApiResult<Sort> {
        let order = SortOrder::parse(self.order.as_deref())?;
        Ok(Sort::resolve(self.sort.as_deref(), order, allowed, default)?)
    }

    pub(crate) fn pagination(&self, total: i64) -> Pagination {
        calculate_pagination(total, self.page.unwrap_or(1))
    }
}

/// List response body
#[derive(Debug, Serialize)]
pub struct ListResponse<T> {
    pub items: Vec<T>,
    pub pagination: Pagination,
    pub sort: &'static str,
    pub order: &'static str,
}

impl<T> ListResponse<T> {
    pub(crate) fn new(items: Vec<T>, pagination: Pagination, sort: Sort) -> Self {
        Self {
            items,
            pagination,
            sort: sort.column,
            order: match sort.order {
                SortOrder::Asc => "asc",
                SortOrder::Desc => "desc",
            },
        }
    }
}

/// Submitted form values from a JSON request body
pub(crate) fn form_data(body: &Value) -> ApiResult<FormData> {
    FormData::from_json(body)
        .ok_or_else(|| ApiError::BadRequest("Request body must be a JSON object".to_string()))
}
