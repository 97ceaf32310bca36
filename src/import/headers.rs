//! Header row mapping and validation

use csv::StringRecord;
use std::collections::HashMap;

use super::catalog::Catalog;
use super::fields::{normalize_label, FieldLabels, StandardField};
use super::ImportError;

/// Column positions found in a header row
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct HeaderMapping {
    standard: HashMap<StandardField, usize>,
    /// (normalized label, column) for every label that is not a standard one
    custom: Vec<(String, usize)>,
}

impl HeaderMapping {
    /// Map a header row. Duplicate labels resolve to their first column and
    /// empty header cells are skipped.
    pub fn from_headers(headers: &StringRecord, labels: &FieldLabels) -> Self {
        let normalized: Vec<String> = headers.iter().map(normalize_label).collect();

        let standard = labels
            .fields()
            .filter_map(|field| {
                let label = labels.label(field)?;
                normalized
                    .iter()
                    .position(|h| h == label)
                    .map(|idx| (field, idx))
            })
            .collect();

        let mut custom: Vec<(String, usize)> = Vec::new();
        for (idx, label) in normalized.iter().enumerate() {
            if label.is_empty() || labels.is_standard_label(label) {
                continue;
            }
            if custom.iter().all(|(l, _)| l != label) {
                custom.push((label.clone(), idx));
            }
        }

        Self { standard, custom }
    }

    pub fn column(&self, field: StandardField) -> Option<usize> {
        self.standard.get(&field).copied()
    }

    pub fn custom_columns(&self) -> &[(String, usize)] {
        &self.custom
    }

    /// Required fields without a column, in required-field order
    pub fn missing_required(&self) -> Vec<StandardField> {
        StandardField::REQUIRED
            .iter()
            .copied()
            .filter(|f| !self.standard.contains_key(f))
            .collect()
    }

    /// Check required columns, then bind every custom column to a custom
    /// field usable in the catalog's project
    pub fn resolve<C: Catalog + ?Sized>(self, catalog: &C) -> Result<ResolvedHeaders, ImportError> {
        let missing = self.missing_required();
        if !missing.is_empty() {
            return Err(ImportError::MissingRequiredFields(missing));
        }

        let project_id = catalog.project().id;
        let mut invalid = Vec::new();
        let mut custom = Vec::new();

        for (label, column) in &self.custom {
            match catalog.custom_field(label) {
                Some(field) if field.is_enabled_for(project_id) => custom.push(CustomColumn {
                    column: *column,
                    field_id: field.id,
                    name: field.name.clone(),
                }),
                _ => invalid.push(label.clone()),
            }
        }

        if !invalid.is_empty() {
            return Err(ImportError::InvalidCustomFields(invalid));
        }

        Ok(ResolvedHeaders {
            standard: self.standard,
            custom,
        })
    }
}

/// A custom-field column bound to its field definition
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CustomColumn {
    pub column: usize,
    pub field_id: i64,
    pub name: String,
}

/// Header mapping that passed validation
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedHeaders {
    standard: HashMap<StandardField, usize>,
    custom: Vec<CustomColumn>,
}

impl ResolvedHeaders {
    pub fn column(&self, field: StandardField) -> Option<usize> {
        self.standard.get(&field).copied()
    }

    pub fn custom_columns(&self) -> &[CustomColumn] {
        &self.custom
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::store::{NewCustomField, TrackerStore};
    use crate::import::catalog::ProjectCatalog;
    use crate::import::fields::Dialect;

    fn record(fields: &[&str]) -> StringRecord {
        StringRecord::from(fields.to_vec())
    }

    fn catalog() -> ProjectCatalog {
        let mut store = TrackerStore::open_in_memory().unwrap();
        let project = store.add_project("web", "Website").unwrap();
        store.add_project("api", "API").unwrap();
        store
            .add_custom_field(&NewCustomField {
                name: "Severity".to_string(),
                is_for_all: true,
                ..Default::default()
            })
            .unwrap();
        store
            .add_custom_field(&NewCustomField {
                name: "Team".to_string(),
                projects: vec!["web".to_string()],
                ..Default::default()
            })
            .unwrap();
        store
            .add_custom_field(&NewCustomField {
                name: "Endpoint".to_string(),
                projects: vec!["api".to_string()],
                ..Default::default()
            })
            .unwrap();
        ProjectCatalog::load(&store, project).unwrap()
    }

    #[test]
    fn test_header_matching_ignores_case_and_padding() {
        let labels = FieldLabels::default();
        for author in ["Author", "author", "AUTHOR", "  aUtHoR "] {
            let mapping = HeaderMapping::from_headers(
                &record(&["Subject", author, "Tracker"]),
                &labels,
            );
            assert_eq!(mapping.column(StandardField::Author), Some(1));
            assert!(mapping.custom_columns().is_empty());
        }
    }

    #[test]
    fn test_multi_word_labels() {
        let mapping = HeaderMapping::from_headers(
            &record(&["Estimated Hours", "Start date", "due date"]),
            &FieldLabels::default(),
        );
        assert_eq!(mapping.column(StandardField::EstimatedHours), Some(0));
        assert_eq!(mapping.column(StandardField::StartDate), Some(1));
        assert_eq!(mapping.column(StandardField::DueDate), Some(2));
        assert_eq!(mapping.column(StandardField::Status), None);
    }

    #[test]
    fn test_unknown_labels_become_custom_columns() {
        let mapping = HeaderMapping::from_headers(
            &record(&["Author", "Severity", "", "Team", "severity"]),
            &FieldLabels::default(),
        );
        assert_eq!(
            mapping.custom_columns(),
            &[("severity".to_string(), 1), ("team".to_string(), 3)]
        );
    }

    #[test]
    fn test_basic_dialect_treats_priority_as_custom() {
        let mapping = HeaderMapping::from_headers(
            &record(&["Author", "Priority"]),
            &FieldLabels::for_dialect(Dialect::Basic),
        );
        assert_eq!(mapping.column(StandardField::Priority), None);
        assert_eq!(mapping.custom_columns(), &[("priority".to_string(), 1)]);
    }

    #[test]
    fn test_missing_required_fields_listed_in_order() {
        let mapping = HeaderMapping::from_headers(&record(&["Subject"]), &FieldLabels::default());
        assert_eq!(
            mapping.missing_required(),
            vec![StandardField::Author, StandardField::Tracker]
        );

        let err = mapping.resolve(&catalog()).unwrap_err();
        assert_eq!(err.to_string(), "Missing required fields: Author, Tracker");
    }

    #[test]
    fn test_custom_fields_must_be_enabled_for_project() {
        let mapping = HeaderMapping::from_headers(
            &record(&["Author", "Subject", "Tracker", "Endpoint", "Colour", "TEAM"]),
            &FieldLabels::default(),
        );
        let err = mapping.resolve(&catalog()).unwrap_err();
        assert_eq!(
            err.to_string(),
            "These issue custom fields are invalid or not assigned to project: Endpoint, Colour"
        );
    }

    #[test]
    fn test_resolve_binds_custom_columns() {
        let mapping = HeaderMapping::from_headers(
            &record(&["Author", "Subject", "Tracker", "severity", "Team"]),
            &FieldLabels::default(),
        );
        let resolved = mapping.resolve(&catalog()).unwrap();
        let names: Vec<_> = resolved
            .custom_columns()
            .iter()
            .map(|c| (c.column, c.name.as_str()))
            .collect();
        assert_eq!(names, vec![(3, "Severity"), (4, "Team")]);
        assert_eq!(resolved.column(StandardField::Tracker), Some(2));
    }
}
