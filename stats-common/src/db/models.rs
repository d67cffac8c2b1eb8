//! Database models

use serde::{Deserialize, Serialize};

/// ISO country reference record
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Country {
    pub iso: String,
    pub name: String,
}

/// Harvesting source configuration record
///
/// At rest the identifier mapping group satisfies exactly one of:
/// - mode 0: regex, replace and filename are all `None`
/// - mode 1: regex and replace are `Some`, filename is `None`
/// - mode 2: filename is `Some`, regex and replace are `None`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Source {
    pub id: i64,
    pub source_id: String,
    pub name: String,
    pub url: Option<String>,
    pub institution: Option<String>,
    #[serde(rename = "type")]
    pub source_type: Option<String>,
    pub site_id: Option<String>,
    pub national_site_id: Option<String>,
    pub regional_site_id: Option<String>,
    pub auth_token: Option<String>,
    pub country_iso: Option<String>,
    pub identifier_prefix: Option<String>,
    pub identifier_map_type: i64,
    pub identifier_map_regex: Option<String>,
    pub identifier_map_replace: Option<String>,
    pub identifier_map_filename: Option<String>,
    pub updated_at: String,
}

/// Administrator account
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct User {
    pub id: i64,
    pub username: String,
    pub active: bool,
}
