//! Source form: field configuration and typed form values

use once_cell::sync::Lazy;
use serde::Serialize;

use super::{Choice, FieldErrors, FieldSpec, FormData, FormSpec};
use crate::mapping::{
    self, coerce_mode, IdentifierMapType, FILENAME_FIELD, MODE_FIELD, REGEX_FIELD, REPLACE_FIELD,
};

/// Columns a source list may be sorted by
pub const LIST_COLUMNS: [&str; 7] = [
    "source_id",
    "name",
    "type",
    "site_id",
    "country_iso",
    "identifier_map_type",
    "updated_at",
];

/// Writable source columns after validation and coercion
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct SourceFields {
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
}

impl SourceFields {
    /// Build typed values from validated form data
    ///
    /// Identifier mapping strings are copied raw; trimming and clearing is
    /// the job of [`mapping::normalize_identifier_mapping`].
    pub fn from_form(data: &FormData) -> Result<Self, FieldErrors> {
        let identifier_map_type = coerce_mode(data.get(MODE_FIELD))
            .ok_or_else(|| FieldErrors::single(MODE_FIELD, "Identifier mapping mode must be an integer."))?;

        Ok(Self {
            source_id: data.trimmed("source_id").unwrap_or_default(),
            name: data.trimmed("name").unwrap_or_default(),
            url: data.trimmed("url"),
            institution: data.trimmed("institution"),
            source_type: data.trimmed("type"),
            site_id: data.trimmed("site_id"),
            national_site_id: data.trimmed("national_site_id"),
            regional_site_id: data.trimmed("regional_site_id"),
            auth_token: data.trimmed("auth_token"),
            country_iso: data.trimmed("country_iso"),
            identifier_prefix: data.get("identifier_prefix").map(str::to_string),
            identifier_map_type,
            identifier_map_regex: data.get(REGEX_FIELD).map(str::to_string),
            identifier_map_replace: data.get(REPLACE_FIELD).map(str::to_string),
            identifier_map_filename: data.get(FILENAME_FIELD).map(str::to_string),
        })
    }
}

const REGEX_DESCRIPTION: &str = "Only for mode 1 (Regex replacement). Example: ^oai:([^:]+):(.+)$ \
     Rust regex syntax: no look-around or backreferences; use \\z for end of text and {0,3} for bounded repeats.";

static SOURCE_FORM: Lazy<FormSpec> = Lazy::new(build_source_form);

/// Source form configuration
pub fn source_form() -> &'static FormSpec {
    &SOURCE_FORM
}

fn build_source_form() -> FormSpec {
    let mode_choices = IdentifierMapType::ALL
        .into_iter()
        .map(|mode| Choice {
            value: mode.code(),
            label: mode.choice_label(),
        })
        .collect();

    FormSpec {
        entity: "source",
        fields: vec![
            FieldSpec::new("source_id", "Source").required(),
            FieldSpec::new("name", "Name").required(),
            FieldSpec::new("url", "URL"),
            FieldSpec::new("institution", "Institution"),
            FieldSpec::new("type", "Type"),
            FieldSpec::new("site_id", "Site ID"),
            FieldSpec::new("national_site_id", "National Site ID"),
            FieldSpec::new("regional_site_id", "Regional Site ID"),
            FieldSpec::new("auth_token", "Auth Token"),
            FieldSpec::new("country_iso", "Country"),
            FieldSpec::new("identifier_prefix", "Identifier Prefix").description(
                "Expected base OAI prefix after normalization. Example: oai:sedici.unlp.edu.ar",
            ),
            FieldSpec::new(MODE_FIELD, "Identifier Mapping Mode")
                .description("Defines how identifiers are normalized before indexing.")
                .required()
                .choices(mode_choices)
                .validator(mapping::validate_mode_field),
            FieldSpec::new(REGEX_FIELD, "Regex Pattern")
                .description(REGEX_DESCRIPTION)
                .validator(mapping::validate_regex_field),
            FieldSpec::new(REPLACE_FIELD, "Regex Replacement")
                .description(r"Replacement for mode 1. Example: oai:\1:\2")
                .validator(mapping::validate_replace_field),
            FieldSpec::new(FILENAME_FIELD, "Mapping File Path")
                .description("Only for mode 2 (File mapping). Absolute path inside the container.")
                .validator(mapping::validate_filename_field),
        ],
        list_columns: LIST_COLUMNS.to_vec(),
        extra_labels: vec![("updated_at", "Updated")],
    }
}
