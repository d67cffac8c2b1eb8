//! Country form

use once_cell::sync::Lazy;
use serde::Serialize;

use super::{FieldErrors, FieldSpec, FormData, FormSpec};

/// Columns a country list may be sorted by
pub const LIST_COLUMNS: [&str; 2] = ["iso", "name"];

/// Writable country columns
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct CountryFields {
    pub iso: String,
    pub name: String,
}

impl CountryFields {
    pub fn from_form(data: &FormData) -> Result<Self, FieldErrors> {
        let mut errors = FieldErrors::new();
        let iso = data.trimmed("iso");
        let name = data.trimmed("name");
        if iso.is_none() {
            errors.add("iso", super::REQUIRED_MESSAGE);
        }
        if name.is_none() {
            errors.add("name", super::REQUIRED_MESSAGE);
        }
        errors.into_result()?;

        Ok(Self {
            iso: iso.unwrap_or_default(),
            name: name.unwrap_or_default(),
        })
    }
}

static COUNTRY_FORM: Lazy<FormSpec> = Lazy::new(|| FormSpec {
    entity: "country",
    fields: vec![
        FieldSpec::new("iso", "ISO Code").required(),
        FieldSpec::new("name", "Name").required(),
    ],
    list_columns: LIST_COLUMNS.to_vec(),
    extra_labels: Vec::new(),
});

/// Country form configuration
pub fn country_form() -> &'static FormSpec {
    &COUNTRY_FORM
}
