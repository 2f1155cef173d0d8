//! Form submission capture with sensitive field masking

use std::collections::BTreeMap;

pub const MASKED: &str = "[MASKED]";
pub const FILE: &str = "[FILE]";

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum FieldValue {
    Text(String),
    File,
}

/// One entry of a submitted form's data set
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct FormField {
    pub name: String,
    pub value: FieldValue,
}

impl FormField {
    pub fn text(name: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            value: FieldValue::Text(value.into()),
        }
    }

    pub fn file(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            value: FieldValue::File,
        }
    }
}

/// Rules applied to submitted values
#[derive(Clone, Debug)]
pub struct FieldMask<'a> {
    pub sensitive: &'a [String],
    pub max_len: usize,
}

impl FieldMask<'_> {
    pub fn is_sensitive(&self, name: &str) -> bool {
        let name = name.to_lowercase();
        self.sensitive
            .iter()
            .filter(|marker| !marker.is_empty())
            .any(|marker| name.contains(&marker.to_lowercase()))
    }

    /// Recorded form data; a repeated name keeps its last value.
    pub fn apply(&self, fields: &[FormField]) -> BTreeMap<String, String> {
        fields
            .iter()
            .map(|field| {
                let value = if self.is_sensitive(&field.name) {
                    MASKED.to_string()
                } else {
                    match &field.value {
                        FieldValue::Text(text) => text.chars().take(self.max_len).collect(),
                        FieldValue::File => FILE.to_string(),
                    }
                };
                (field.name.clone(), value)
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn markers() -> Vec<String> {
        vec!["password".into(), "ssn".into(), "credit".into()]
    }

    #[test]
    fn sensitive_names_are_masked_case_insensitively() {
        let markers = markers();
        let mask = FieldMask {
            sensitive: &markers,
            max_len: 100,
        };
        let data = mask.apply(&[
            FormField::text("user", "ada"),
            FormField::text("NewPassword", "hunter2"),
            FormField::text("customer_SSN", "123"),
            FormField::text("creditCard", "4111"),
            FormField::file("avatar"),
        ]);
        assert_eq!(data["user"], "ada");
        assert_eq!(data["NewPassword"], MASKED);
        assert_eq!(data["customer_SSN"], MASKED);
        assert_eq!(data["creditCard"], MASKED);
        assert_eq!(data["avatar"], FILE);
    }

    #[test]
    fn long_values_are_truncated() {
        let markers = markers();
        let mask = FieldMask {
            sensitive: &markers,
            max_len: 100,
        };
        let data = mask.apply(&[FormField::text("bio", "x".repeat(250))]);
        assert_eq!(data["bio"].len(), 100);
    }

    #[test]
    fn sensitive_file_fields_are_masked() {
        let markers = markers();
        let mask = FieldMask {
            sensitive: &markers,
            max_len: 100,
        };
        let data = mask.apply(&[FormField::file("credit_report")]);
        assert_eq!(data["credit_report"], MASKED);
    }
}
