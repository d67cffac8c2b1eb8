//! Declarative form specifications and the generic validation routine
//!
//! Each entity declares its editable fields as a [`FormSpec`]: field name,
//! label, description, required flag, optional choices and an ordered list
//! of validator functions. The same spec drives request validation and the
//! `_info` metadata the UI renders its screens from.

pub mod country;
pub mod source;

use serde::Serialize;
use serde_json::Value;
use std::collections::BTreeMap;

/// Message attached to a blank required field
pub const REQUIRED_MESSAGE: &str = "This field is required.";

/// Field validator: receives the whole submitted form and the field name
pub type Validator = fn(&FormData, &str) -> Result<(), String>;

/// Raw submitted form values, keyed by field name
///
/// Values stay textual as a browser form would send them; typed coercion
/// happens after validation.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FormData {
    values: BTreeMap<String, Option<String>>,
}

impl FormData {
    /// Build form data from a JSON object body
    ///
    /// Strings are kept as-is, numbers and booleans are rendered to text,
    /// `null` becomes an absent value. Returns `None` if `body` is not an
    /// object.
    pub fn from_json(body: &Value) -> Option<Self> {
        let object = body.as_object()?;
        let values = object
            .iter()
            .map(|(key, value)| {
                let text = match value {
                    Value::Null => None,
                    Value::String(s) => Some(s.clone()),
                    other => Some(other.to_string()),
                };
                (key.clone(), text)
            })
            .collect();
        Some(Self { values })
    }

    /// Set a single value (builder style, used by tests and fixtures)
    pub fn with(mut self, name: &str, value: &str) -> Self {
        self.values.insert(name.to_string(), Some(value.to_string()));
        self
    }

    /// Raw value for `name`, `None` when absent or null
    pub fn get(&self, name: &str) -> Option<&str> {
        self.values.get(name).and_then(|v| v.as_deref())
    }

    /// Trimmed value for `name`, `None` when absent or blank
    pub fn trimmed(&self, name: &str) -> Option<String> {
        trim_or_none(self.get(name))
    }
}

/// Trim a string, mapping blank results to `None`
pub fn trim_or_none(value: Option<&str>) -> Option<String> {
    let trimmed = value?.trim();
    if trimmed.is_empty() {
        None
    } else {
        Some(trimmed.to_string())
    }
}

/// Per-field validation messages
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct FieldErrors(BTreeMap<String, Vec<String>>);

impl FieldErrors {
    pub fn new() -> Self {
        Self::default()
    }

    /// Single-message error for one field
    pub fn single(field: &str, message: impl Into<String>) -> Self {
        let mut errors = Self::new();
        errors.add(field, message);
        errors
    }

    pub fn add(&mut self, field: &str, message: impl Into<String>) {
        self.0.entry(field.to_string()).or_default().push(message.into());
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Messages for one field (empty slice when the field is valid)
    pub fn field(&self, name: &str) -> &[String] {
        self.0.get(name).map(Vec::as_slice).unwrap_or(&[])
    }

    pub fn fields(&self) -> impl Iterator<Item = &str> {
        self.0.keys().map(String::as_str)
    }

    /// `Ok(())` when no messages were collected
    pub fn into_result(self) -> Result<(), FieldErrors> {
        if self.is_empty() {
            Ok(())
        } else {
            Err(self)
        }
    }
}

/// One selectable option of a choice field
#[derive(Debug, Clone, Copy, Serialize)]
pub struct Choice {
    pub value: i64,
    pub label: &'static str,
}

/// Declarative configuration of one form field
#[derive(Debug, Clone)]
pub struct FieldSpec {
    pub name: &'static str,
    pub label: &'static str,
    pub description: &'static str,
    pub required: bool,
    pub choices: Vec<Choice>,
    pub validators: Vec<Validator>,
}

impl FieldSpec {
    pub fn new(name: &'static str, label: &'static str) -> Self {
        Self {
            name,
            label,
            description: "",
            required: false,
            choices: Vec::new(),
            validators: Vec::new(),
        }
    }

    pub fn description(mut self, description: &'static str) -> Self {
        self.description = description;
        self
    }

    pub fn required(mut self) -> Self {
        self.required = true;
        self
    }

    pub fn choices(mut self, choices: Vec<Choice>) -> Self {
        self.choices = choices;
        self
    }

    pub fn validator(mut self, validator: Validator) -> Self {
        self.validators.push(validator);
        self
    }
}

/// Declarative configuration of a whole form
#[derive(Debug, Clone)]
pub struct FormSpec {
    /// Entity name as used in API paths
    pub entity: &'static str,
    /// Editable fields in display order
    pub fields: Vec<FieldSpec>,
    /// Columns shown on the list screen
    pub list_columns: Vec<&'static str>,
    /// Labels for list-only columns that are not editable fields
    pub extra_labels: Vec<(&'static str, &'static str)>,
}

impl FormSpec {
    /// Run every field's validators against `data`
    ///
    /// A blank required field reports [`REQUIRED_MESSAGE`] and skips its
    /// remaining validators. Otherwise every validator runs and each failure
    /// is recorded under the field name in declaration order.
    pub fn validate(&self, data: &FormData) -> Result<(), FieldErrors> {
        let mut errors = FieldErrors::new();

        for field in &self.fields {
            if field.required && data.trimmed(field.name).is_none() {
                errors.add(field.name, REQUIRED_MESSAGE);
                continue;
            }

            for validator in &field.validators {
                if let Err(message) = validator(data, field.name) {
                    errors.add(field.name, message);
                }
            }
        }

        errors.into_result()
    }

    pub fn field(&self, name: &str) -> Option<&FieldSpec> {
        self.fields.iter().find(|f| f.name == name)
    }

    /// Label for any field or list column
    pub fn label(&self, name: &str) -> Option<&'static str> {
        self.field(name).map(|f| f.label).or_else(|| {
            self.extra_labels
                .iter()
                .find(|(column, _)| *column == name)
                .map(|(_, label)| *label)
        })
    }

    /// Serializable metadata for UI rendering
    pub fn info(&self) -> FormInfo {
        let mut label_columns = BTreeMap::new();
        for field in &self.fields {
            label_columns.insert(field.name, field.label);
        }
        for (column, label) in &self.extra_labels {
            label_columns.insert(*column, *label);
        }

        FormInfo {
            entity: self.entity,
            add_columns: self.fields.iter().map(|f| f.name).collect(),
            list_columns: self.list_columns.clone(),
            label_columns,
            fields: self
                .fields
                .iter()
                .map(|f| FieldInfo {
                    name: f.name,
                    label: f.label,
                    description: f.description,
                    required: f.required,
                    choices: f.choices.clone(),
                })
                .collect(),
        }
    }
}

/// `_info` response body
#[derive(Debug, Clone, Serialize)]
pub struct FormInfo {
    pub entity: &'static str,
    pub add_columns: Vec<&'static str>,
    pub list_columns: Vec<&'static str>,
    pub label_columns: BTreeMap<&'static str, &'static str>,
    pub fields: Vec<FieldInfo>,
}

/// Field entry of [`FormInfo`]
#[derive(Debug, Clone, Serialize)]
pub struct FieldInfo {
    pub name: &'static str,
    pub label: &'static str,
    pub description: &'static str,
    pub required: bool,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub choices: Vec<Choice>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn reject_x(form: &FormData, field: &str) -> Result<(), String> {
        match form.get(field) {
            Some(v) if v.contains('x') => Err("no x allowed".to_string()),
            _ => Ok(()),
        }
    }

    fn reject_long(form: &FormData, field: &str) -> Result<(), String> {
        match form.get(field) {
            Some(v) if v.len() > 3 => Err("too long".to_string()),
            _ => Ok(()),
        }
    }

    fn spec() -> FormSpec {
        FormSpec {
            entity: "thing",
            fields: vec![
                FieldSpec::new("code", "Code").required().validator(reject_x),
                FieldSpec::new("note", "Note")
                    .validator(reject_x)
                    .validator(reject_long),
            ],
            list_columns: vec!["code"],
            extra_labels: vec![("updated_at", "Updated")],
        }
    }

    #[test]
    fn test_required_short_circuits() {
        let data = FormData::default().with("code", "   ");
        let errors = spec().validate(&data).unwrap_err();
        assert_eq!(errors.field("code"), [REQUIRED_MESSAGE.to_string()]);
        assert!(errors.field("note").is_empty());
    }

    #[test]
    fn test_all_validators_collected_in_order() {
        let data = FormData::default().with("code", "ab").with("note", "xxxx");
        let errors = spec().validate(&data).unwrap_err();
        assert_eq!(errors.field("note"), ["no x allowed".to_string(), "too long".to_string()]);
        assert_eq!(errors.len(), 1);
    }

    #[test]
    fn test_valid_form() {
        let data = FormData::default().with("code", "ab");
        assert!(spec().validate(&data).is_ok());
    }

    #[test]
    fn test_from_json_renders_scalars() {
        let data = FormData::from_json(&json!({"a": "s", "b": 1, "c": null, "d": true})).unwrap();
        assert_eq!(data.get("a"), Some("s"));
        assert_eq!(data.get("b"), Some("1"));
        assert_eq!(data.get("c"), None);
        assert_eq!(data.get("d"), Some("true"));
        assert_eq!(data.get("missing"), None);

        assert!(FormData::from_json(&json!([1, 2])).is_none());
    }

    #[test]
    fn test_info_labels() {
        let info = spec().info();
        assert_eq!(info.add_columns, vec!["code", "note"]);
        assert_eq!(info.label_columns.get("updated_at"), Some(&"Updated"));
        assert!(info.fields[0].required);
        assert_eq!(spec().label("updated_at"), Some("Updated"));
    }

    #[test]
    fn test_trim_or_none() {
        assert_eq!(trim_or_none(None), None);
        assert_eq!(trim_or_none(Some("   ")), None);
        assert_eq!(trim_or_none(Some(" a ")), Some("a".to_string()));
    }
}
