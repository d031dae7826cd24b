//! Reading mappings back from the search service

use serde::Deserialize;
use std::collections::HashMap;

use super::types::{DocumentMapping, FieldMapping, FieldType};
use crate::error::{Error, Result};

/// `GET /{index}/_mapping` response structure
#[derive(Debug, Deserialize)]
pub struct EsMappingResponse {
    #[serde(flatten)]
    pub indices: HashMap<String, EsIndexMapping>,
}

#[derive(Debug, Deserialize)]
pub struct EsIndexMapping {
    pub mappings: EsMappings,
}

#[derive(Debug, Default, Deserialize)]
pub struct EsMappings {
    #[serde(default)]
    pub properties: HashMap<String, EsFieldMapping>,
}

#[derive(Debug, Deserialize)]
pub struct EsFieldMapping {
    #[serde(rename = "type")]
    pub field_type: Option<String>,
    pub analyzer: Option<String>,
    pub search_analyzer: Option<String>,
    pub index: Option<bool>,
    pub store: Option<bool>,
    pub format: Option<String>,
}

/// Decode the field mappings of `index` from a mapping response
pub fn parse_mapping_response(
    index: &str,
    body: serde_json::Value,
) -> Result<HashMap<String, FieldMapping>> {
    let response: EsMappingResponse = serde_json::from_value(body)?;

    // Aliased indices answer under their concrete name
    let mappings = match response.indices.get(index) {
        Some(m) => &m.mappings,
        None if response.indices.len() == 1 => match response.indices.values().next() {
            Some(m) => &m.mappings,
            None => return Err(Error::IndexNotFound(index.to_string())),
        },
        None => return Err(Error::IndexNotFound(index.to_string())),
    };

    Ok(mappings
        .properties
        .iter()
        .map(|(name, prop)| (name.clone(), convert_field(name, prop)))
        .collect())
}

fn convert_field(name: &str, prop: &EsFieldMapping) -> FieldMapping {
    let field_type = FieldType::parse(prop.field_type.as_deref().unwrap_or("object"));
    if let FieldType::Unknown(other) = &field_type {
        tracing::warn!("Unknown ES type '{}' for field '{}'", other, name);
    }

    FieldMapping {
        field_type,
        analyzer: prop.analyzer.clone(),
        search_analyzer: prop.search_analyzer.clone(),
        index: prop.index.unwrap_or(true),
        store: prop.store.unwrap_or(false),
        format: prop.format.clone(),
    }
}

/// A difference between a declared mapping and the one live in the index
#[derive(Debug, Clone, PartialEq)]
pub enum MappingMismatch {
    MissingField(String),
    TypeDiffers {
        field: String,
        expected: FieldType,
        actual: FieldType,
    },
    AnalyzerDiffers {
        field: String,
        expected: Option<String>,
        actual: Option<String>,
    },
    IndexFlagDiffers {
        field: String,
        expected: bool,
        actual: bool,
    },
}

impl std::fmt::Display for MappingMismatch {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::MissingField(field) => write!(f, "field '{}' is not mapped", field),
            Self::TypeDiffers {
                field,
                expected,
                actual,
            } => write!(f, "field '{}' is {} (expected {})", field, actual, expected),
            Self::AnalyzerDiffers {
                field,
                expected,
                actual,
            } => write!(
                f,
                "field '{}' uses analyzer {} (expected {})",
                field,
                actual.as_deref().unwrap_or("default"),
                expected.as_deref().unwrap_or("default")
            ),
            Self::IndexFlagDiffers {
                field,
                expected,
                actual,
            } => write!(f, "field '{}' has index={} (expected {})", field, actual, expected),
        }
    }
}

/// Compare declared fields against live ones. Extra live fields are ignored.
pub fn diff_mappings(
    expected: &DocumentMapping,
    actual: &HashMap<String, FieldMapping>,
) -> Vec<MappingMismatch> {
    let mut mismatches = Vec::new();

    for (name, want) in &expected.fields {
        let Some(have) = actual.get(name) else {
            mismatches.push(MappingMismatch::MissingField(name.clone()));
            continue;
        };

        if want.field_type != have.field_type {
            mismatches.push(MappingMismatch::TypeDiffers {
                field: name.clone(),
                expected: want.field_type.clone(),
                actual: have.field_type.clone(),
            });
            continue;
        }
        if want.analyzer != have.analyzer {
            mismatches.push(MappingMismatch::AnalyzerDiffers {
                field: name.clone(),
                expected: want.analyzer.clone(),
                actual: have.analyzer.clone(),
            });
        }
        if want.index != have.index {
            mismatches.push(MappingMismatch::IndexFlagDiffers {
                field: name.clone(),
                expected: want.index,
                actual: have.index,
            });
        }
    }

    mismatches
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn live_mapping() -> serde_json::Value {
        json!({
            "products": {
                "mappings": {
                    "properties": {
                        "title": { "type": "text", "analyzer": "ik_max_word" },
                        "category": { "type": "keyword" },
                        "price": { "type": "double" },
                        "images": { "type": "keyword", "index": false },
                        "location": { "type": "geo_point" }
                    }
                }
            }
        })
    }

    #[test]
    fn test_parse_basic_types() {
        let fields = parse_mapping_response("products", live_mapping()).unwrap();
        assert_eq!(fields.len(), 5);

        let title = &fields["title"];
        assert_eq!(title.field_type, FieldType::Text);
        assert_eq!(title.analyzer.as_deref(), Some("ik_max_word"));

        assert!(!fields["images"].index);
        assert!(fields["price"].index);
        assert!(matches!(fields["location"].field_type, FieldType::Unknown(_)));
    }

    #[test]
    fn test_parse_single_index_under_other_name() {
        let fields = parse_mapping_response("products-alias", live_mapping()).unwrap();
        assert!(fields.contains_key("title"));
    }

    #[test]
    fn test_parse_missing_index() {
        let body = json!({
            "a": {"mappings": {}},
            "b": {"mappings": {}}
        });
        let err = parse_mapping_response("c", body).unwrap_err();
        assert!(matches!(err, Error::IndexNotFound(name) if name == "c"));
    }

    #[test]
    fn test_diff_reports_each_kind() {
        let expected = DocumentMapping::new("products")
            .field("title", FieldMapping::text().analyzer("standard"))
            .field("category", FieldMapping::text())
            .field("images", FieldMapping::keyword())
            .field("brand", FieldMapping::keyword());

        let live = parse_mapping_response("products", live_mapping()).unwrap();
        let diff = diff_mappings(&expected, &live);

        assert_eq!(diff.len(), 4);
        assert!(diff.contains(&MappingMismatch::MissingField("brand".into())));
        assert!(diff.contains(&MappingMismatch::TypeDiffers {
            field: "category".into(),
            expected: FieldType::Text,
            actual: FieldType::Keyword,
        }));
        assert!(diff.contains(&MappingMismatch::AnalyzerDiffers {
            field: "title".into(),
            expected: Some("standard".into()),
            actual: Some("ik_max_word".into()),
        }));
        assert!(diff.contains(&MappingMismatch::IndexFlagDiffers {
            field: "images".into(),
            expected: true,
            actual: false,
        }));
    }

    #[test]
    fn test_diff_clean() {
        let expected = DocumentMapping::new("products")
            .field("price", FieldMapping::double())
            .field("images", FieldMapping::keyword().not_indexed());
        let live = parse_mapping_response("products", live_mapping()).unwrap();
        assert!(diff_mappings(&expected, &live).is_empty());
    }
}
