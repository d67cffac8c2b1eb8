//! Identifier mapping rules for harvesting sources
//!
//! A source normalizes harvested record identifiers in one of three modes:
//! - 0: standard normalization (no companion fields)
//! - 1: regex replace (`identifier_map_regex` + `identifier_map_replace`)
//! - 2: file mapping (`identifier_map_filename`, must exist on disk)
//!
//! This module validates a proposed configuration, normalizes it before
//! persistence, and previews a regex replacement on a sample identifier.

pub mod template;

use regex::Regex;
use serde::Serialize;
use std::path::Path;

use crate::forms::source::SourceFields;
use crate::forms::{trim_or_none, FieldErrors, FormData};
use template::{substitute, ReplacementTemplate};

pub const MODE_FIELD: &str = "identifier_map_type";
pub const REGEX_FIELD: &str = "identifier_map_regex";
pub const REPLACE_FIELD: &str = "identifier_map_replace";
pub const FILENAME_FIELD: &str = "identifier_map_filename";

const INVALID_MODE: &str = "Invalid identifier mapping mode. Allowed values: 0, 1, 2.";
const REGEX_REQUIRED: &str = "Regex pattern is required when the mode is 'Regex replacement'.";
const REPLACE_REQUIRED: &str = "Regex replacement is required when the mode is 'Regex replacement'.";
const FILENAME_REQUIRED: &str = "Mapping file path is required when the mode is 'File mapping'.";

/// Identifier mapping mode
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum IdentifierMapType {
    Standard,
    RegexReplace,
    FileMapping,
}

impl IdentifierMapType {
    pub const ALL: [IdentifierMapType; 3] = [
        IdentifierMapType::Standard,
        IdentifierMapType::RegexReplace,
        IdentifierMapType::FileMapping,
    ];

    /// Stored integer code
    pub fn code(self) -> i64 {
        match self {
            IdentifierMapType::Standard => 0,
            IdentifierMapType::RegexReplace => 1,
            IdentifierMapType::FileMapping => 2,
        }
    }

    pub fn from_code(code: i64) -> Option<Self> {
        Self::ALL.into_iter().find(|mode| mode.code() == code)
    }

    pub fn label(self) -> &'static str {
        match self {
            IdentifierMapType::Standard => "Standard normalization",
            IdentifierMapType::RegexReplace => "Regex replacement",
            IdentifierMapType::FileMapping => "File mapping",
        }
    }

    /// Label shown in the mode selector, e.g. `1 - Regex replacement`
    pub fn choice_label(self) -> &'static str {
        match self {
            IdentifierMapType::Standard => "0 - Standard normalization",
            IdentifierMapType::RegexReplace => "1 - Regex replacement",
            IdentifierMapType::FileMapping => "2 - File mapping",
        }
    }
}

/// List-screen rendering of a stored mode code
pub fn format_map_type(code: i64) -> String {
    match IdentifierMapType::from_code(code) {
        Some(mode) => mode.label().to_string(),
        None => format!("Unknown ({})", code),
    }
}

/// Coerce a raw mode value to an integer
///
/// Accepts surrounding whitespace, an optional sign and single `_`
/// separators between digits. Anything else yields `None`.
pub fn coerce_mode(raw: Option<&str>) -> Option<i64> {
    parse_lenient_int(raw?)
}

/// Lenient base-10 integer parsing shared with session id coercion
pub(crate) fn parse_lenient_int(raw: &str) -> Option<i64> {
    let trimmed = raw.trim();
    let (negative, digits) = match trimmed.as_bytes().first() {
        Some(b'-') => (true, &trimmed[1..]),
        Some(b'+') => (false, &trimmed[1..]),
        _ => (false, trimmed),
    };

    if digits.is_empty()
        || digits.starts_with('_')
        || digits.ends_with('_')
        || digits.contains("__")
        || !digits.chars().all(|c| c.is_ascii_digit() || c == '_')
    {
        return None;
    }

    let cleaned: String = digits.chars().filter(|c| *c != '_').collect();
    let magnitude: i64 = cleaned.parse().ok()?;
    Some(if negative { -magnitude } else { magnitude })
}

/// Resolve a raw mode value to a known mode
pub fn check_mode(raw: Option<&str>) -> Result<IdentifierMapType, String> {
    coerce_mode(raw)
        .and_then(IdentifierMapType::from_code)
        .ok_or_else(|| INVALID_MODE.to_string())
}

/// Regex field rule: required and compilable in regex mode
pub fn check_regex(mode: Option<IdentifierMapType>, regex: Option<&str>) -> Result<(), String> {
    if mode != Some(IdentifierMapType::RegexReplace) {
        return Ok(());
    }

    let pattern = trim_or_none(regex).ok_or_else(|| REGEX_REQUIRED.to_string())?;
    compile(&pattern).map(|_| ())
}

/// Replacement field rule: required in regex mode and must expand against
/// the pattern
///
/// When the pattern itself is missing or invalid the regex field reports it
/// and this rule only checks presence.
pub fn check_replacement(
    mode: Option<IdentifierMapType>,
    regex: Option<&str>,
    replace: Option<&str>,
) -> Result<(), String> {
    if mode != Some(IdentifierMapType::RegexReplace) {
        return Ok(());
    }

    let replacement = trim_or_none(replace).ok_or_else(|| REPLACE_REQUIRED.to_string())?;
    let compiled = match trim_or_none(regex).map(|pattern| compile(&pattern)) {
        Some(Ok(compiled)) => compiled,
        _ => return Ok(()),
    };

    // A template whose group references all resolve expands on any input
    ReplacementTemplate::parse(&replacement, &compiled)
        .map(|_| ())
        .map_err(|e| format!("Invalid replacement expression: {}", e))
}

/// Filename field rule: required in file mode and must name an existing file
pub fn check_filename(mode: Option<IdentifierMapType>, filename: Option<&str>) -> Result<(), String> {
    if mode != Some(IdentifierMapType::FileMapping) {
        return Ok(());
    }

    let path = trim_or_none(filename).ok_or_else(|| FILENAME_REQUIRED.to_string())?;
    if !Path::new(&path).is_file() {
        return Err(format!("Mapping file does not exist at path: {}", path));
    }
    Ok(())
}

/// Validate a complete mapping configuration
///
/// Returns the resolved mode, or every field-level message. An unknown mode
/// is reported on the mode field alone.
pub fn validate_identifier_mapping(
    mode: Option<&str>,
    regex: Option<&str>,
    replace: Option<&str>,
    filename: Option<&str>,
) -> Result<IdentifierMapType, FieldErrors> {
    let mode = check_mode(mode).map_err(|message| FieldErrors::single(MODE_FIELD, message))?;

    let mut errors = FieldErrors::new();
    if let Err(message) = check_regex(Some(mode), regex) {
        errors.add(REGEX_FIELD, message);
    }
    if let Err(message) = check_replacement(Some(mode), regex, replace) {
        errors.add(REPLACE_FIELD, message);
    }
    if let Err(message) = check_filename(Some(mode), filename) {
        errors.add(FILENAME_FIELD, message);
    }

    errors.into_result().map(|_| mode)
}

// Form validators wired into the source FormSpec.

pub(crate) fn validate_mode_field(form: &FormData, field: &str) -> Result<(), String> {
    check_mode(form.get(field)).map(|_| ())
}

pub(crate) fn validate_regex_field(form: &FormData, field: &str) -> Result<(), String> {
    check_regex(form_mode(form), form.get(field))
}

pub(crate) fn validate_replace_field(form: &FormData, field: &str) -> Result<(), String> {
    check_replacement(form_mode(form), form.get(REGEX_FIELD), form.get(field))
}

pub(crate) fn validate_filename_field(form: &FormData, field: &str) -> Result<(), String> {
    check_filename(form_mode(form), form.get(field))
}

fn form_mode(form: &FormData) -> Option<IdentifierMapType> {
    check_mode(form.get(MODE_FIELD)).ok()
}

fn compile(pattern: &str) -> Result<Regex, String> {
    Regex::new(pattern).map_err(|e| format!("Invalid regex pattern: {}", e))
}

/// Pre-write normalization of the identifier mapping group
///
/// Trims the prefix and the three companion fields (blank becomes `None`),
/// then clears the companions that do not belong to the mode. Unknown mode
/// codes keep their companions.
pub fn normalize_identifier_mapping(item: &mut SourceFields) {
    item.identifier_prefix = trim_or_none(item.identifier_prefix.as_deref());
    item.identifier_map_regex = trim_or_none(item.identifier_map_regex.as_deref());
    item.identifier_map_replace = trim_or_none(item.identifier_map_replace.as_deref());
    item.identifier_map_filename = trim_or_none(item.identifier_map_filename.as_deref());

    match IdentifierMapType::from_code(item.identifier_map_type) {
        Some(IdentifierMapType::Standard) => {
            item.identifier_map_regex = None;
            item.identifier_map_replace = None;
            item.identifier_map_filename = None;
        }
        Some(IdentifierMapType::RegexReplace) => {
            item.identifier_map_filename = None;
        }
        Some(IdentifierMapType::FileMapping) => {
            item.identifier_map_regex = None;
            item.identifier_map_replace = None;
        }
        None => {}
    }
}

/// Outcome of a mapping preview
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum PreviewStatus {
    Waiting,
    EmptyPattern,
    InvalidPattern,
    InvalidReplacement,
    Unchanged,
    Changed,
}

/// Result of applying a regex/replacement pair to a sample identifier
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct MappingPreview {
    pub status: PreviewStatus,
    pub message: String,
    pub result: Option<String>,
}

impl MappingPreview {
    fn new(status: PreviewStatus, message: impl Into<String>, result: Option<String>) -> Self {
        Self {
            status,
            message: message.into(),
            result,
        }
    }
}

/// Preview a replacement on `sample`
///
/// The pattern is trimmed; the replacement is used as typed.
pub fn preview_mapping(regex: Option<&str>, replace: Option<&str>, sample: Option<&str>) -> MappingPreview {
    let sample = match sample {
        Some(s) if !s.is_empty() => s,
        _ => {
            return MappingPreview::new(
                PreviewStatus::Waiting,
                "Enter a sample identifier to preview.",
                None,
            )
        }
    };

    let pattern = match trim_or_none(regex) {
        Some(pattern) => pattern,
        None => return MappingPreview::new(PreviewStatus::EmptyPattern, "The regex pattern is empty.", None),
    };

    let compiled = match compile(&pattern) {
        Ok(compiled) => compiled,
        Err(message) => return MappingPreview::new(PreviewStatus::InvalidPattern, message, None),
    };

    let template = match ReplacementTemplate::parse(replace.unwrap_or(""), &compiled) {
        Ok(template) => template,
        Err(e) => {
            return MappingPreview::new(
                PreviewStatus::InvalidReplacement,
                format!("Invalid replacement expression: {}", e),
                None,
            )
        }
    };

    let transformed = substitute(&compiled, &template, sample);
    if transformed == sample {
        MappingPreview::new(
            PreviewStatus::Unchanged,
            format!("No change: {}", transformed),
            Some(transformed),
        )
    } else {
        MappingPreview::new(
            PreviewStatus::Changed,
            format!("Result: {}", transformed),
            Some(transformed),
        )
    }
}
