//! Declarative index layout for document types

use std::collections::HashSet;

use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::{json, Map, Value};

use crate::error::{Error, Result};

/// Elasticsearch field datatypes
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FieldType {
    Text,
    Keyword,
    Long,
    Integer,
    Short,
    Byte,
    Double,
    Float,
    HalfFloat,
    ScaledFloat,
    Boolean,
    Date,
    Object,
    Nested,
    Unknown(String),
}

impl FieldType {
    pub fn as_str(&self) -> &str {
        match self {
            Self::Text => "text",
            Self::Keyword => "keyword",
            Self::Long => "long",
            Self::Integer => "integer",
            Self::Short => "short",
            Self::Byte => "byte",
            Self::Double => "double",
            Self::Float => "float",
            Self::HalfFloat => "half_float",
            Self::ScaledFloat => "scaled_float",
            Self::Boolean => "boolean",
            Self::Date => "date",
            Self::Object => "object",
            Self::Nested => "nested",
            Self::Unknown(s) => s,
        }
    }

    pub fn parse(s: &str) -> Self {
        match s {
            "text" => Self::Text,
            "keyword" => Self::Keyword,
            "long" => Self::Long,
            "integer" => Self::Integer,
            "short" => Self::Short,
            "byte" => Self::Byte,
            "double" => Self::Double,
            "float" => Self::Float,
            "half_float" => Self::HalfFloat,
            "scaled_float" => Self::ScaledFloat,
            "boolean" => Self::Boolean,
            "date" => Self::Date,
            "object" => Self::Object,
            "nested" => Self::Nested,
            other => Self::Unknown(other.to_string()),
        }
    }

    /// Numeric types can back range queries, sorting and metric aggregations
    pub fn is_numeric(&self) -> bool {
        matches!(
            self,
            Self::Long
                | Self::Integer
                | Self::Short
                | Self::Byte
                | Self::Double
                | Self::Float
                | Self::HalfFloat
                | Self::ScaledFloat
        )
    }
}

impl std::fmt::Display for FieldType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Mapping of a single document field
#[derive(Debug, Clone, PartialEq)]
pub struct FieldMapping {
    pub field_type: FieldType,
    pub analyzer: Option<String>,
    pub search_analyzer: Option<String>,
    /// Whether the field is searchable (default true)
    pub index: bool,
    /// Whether the field is stored separately from `_source` (default false)
    pub store: bool,
    pub format: Option<String>,
}

impl FieldMapping {
    pub fn new(field_type: FieldType) -> Self {
        Self {
            field_type,
            analyzer: None,
            search_analyzer: None,
            index: true,
            store: false,
            format: None,
        }
    }

    pub fn text() -> Self {
        Self::new(FieldType::Text)
    }

    pub fn keyword() -> Self {
        Self::new(FieldType::Keyword)
    }

    pub fn long() -> Self {
        Self::new(FieldType::Long)
    }

    pub fn double() -> Self {
        Self::new(FieldType::Double)
    }

    pub fn boolean() -> Self {
        Self::new(FieldType::Boolean)
    }

    pub fn date() -> Self {
        Self::new(FieldType::Date)
    }

    pub fn analyzer(mut self, analyzer: impl Into<String>) -> Self {
        self.analyzer = Some(analyzer.into());
        self
    }

    pub fn search_analyzer(mut self, analyzer: impl Into<String>) -> Self {
        self.search_analyzer = Some(analyzer.into());
        self
    }

    pub fn format(mut self, format: impl Into<String>) -> Self {
        self.format = Some(format.into());
        self
    }

    /// Keep the value in `_source` but make it unsearchable
    pub fn not_indexed(mut self) -> Self {
        self.index = false;
        self
    }

    pub fn stored(mut self) -> Self {
        self.store = true;
        self
    }

    /// JSON body of this field inside `properties`. Only non-default flags are emitted.
    pub fn to_json(&self) -> Value {
        let mut obj = Map::new();
        obj.insert("type".into(), Value::String(self.field_type.as_str().into()));
        if let Some(analyzer) = &self.analyzer {
            obj.insert("analyzer".into(), Value::String(analyzer.clone()));
        }
        if let Some(analyzer) = &self.search_analyzer {
            obj.insert("search_analyzer".into(), Value::String(analyzer.clone()));
        }
        if !self.index {
            obj.insert("index".into(), Value::Bool(false));
        }
        if self.store {
            obj.insert("store".into(), Value::Bool(true));
        }
        if let Some(format) = &self.format {
            obj.insert("format".into(), Value::String(format.clone()));
        }
        Value::Object(obj)
    }
}

/// Index-level settings applied on creation
#[derive(Debug, Clone, PartialEq)]
pub struct IndexSettings {
    pub number_of_shards: u32,
    pub number_of_replicas: u32,
    pub refresh_interval: Option<String>,
}

impl Default for IndexSettings {
    fn default() -> Self {
        Self {
            number_of_shards: 1,
            number_of_replicas: 1,
            refresh_interval: None,
        }
    }
}

impl IndexSettings {
    pub fn to_json(&self) -> Value {
        let mut obj = Map::new();
        obj.insert("number_of_shards".into(), json!(self.number_of_shards));
        obj.insert("number_of_replicas".into(), json!(self.number_of_replicas));
        if let Some(interval) = &self.refresh_interval {
            obj.insert("refresh_interval".into(), Value::String(interval.clone()));
        }
        Value::Object(obj)
    }
}

/// Complete index layout for one document type
#[derive(Debug, Clone, PartialEq)]
pub struct DocumentMapping {
    pub index_name: String,
    pub settings: IndexSettings,
    /// Fields in declaration order
    pub fields: Vec<(String, FieldMapping)>,
}

impl DocumentMapping {
    pub fn new(index_name: impl Into<String>) -> Self {
        Self {
            index_name: index_name.into(),
            settings: IndexSettings::default(),
            fields: Vec::new(),
        }
    }

    pub fn shards(mut self, shards: u32) -> Self {
        self.settings.number_of_shards = shards;
        self
    }

    pub fn replicas(mut self, replicas: u32) -> Self {
        self.settings.number_of_replicas = replicas;
        self
    }

    pub fn refresh_interval(mut self, interval: impl Into<String>) -> Self {
        self.settings.refresh_interval = Some(interval.into());
        self
    }

    pub fn field(mut self, name: impl Into<String>, mapping: FieldMapping) -> Self {
        self.fields.push((name.into(), mapping));
        self
    }

    pub fn get_field(&self, name: &str) -> Option<&FieldMapping> {
        self.fields.iter().find(|(n, _)| n == name).map(|(_, m)| m)
    }

    pub fn settings_body(&self) -> Value {
        self.settings.to_json()
    }

    pub fn mapping_body(&self) -> Value {
        let properties: Map<String, Value> = self
            .fields
            .iter()
            .map(|(name, mapping)| (name.clone(), mapping.to_json()))
            .collect();
        json!({ "properties": properties })
    }

    /// Reject duplicate fields, analyzers on non-text fields and an empty index name
    pub fn validate(&self) -> Result<()> {
        if self.index_name.is_empty() {
            return Err(Error::Mapping("index name is empty".into()));
        }
        if self.settings.number_of_shards == 0 {
            return Err(Error::Mapping(format!(
                "index '{}' needs at least one shard",
                self.index_name
            )));
        }

        let mut seen = HashSet::new();
        for (name, mapping) in &self.fields {
            if !seen.insert(name.as_str()) {
                return Err(Error::Mapping(format!("field '{}' is mapped twice", name)));
            }
            let analyzed = mapping.analyzer.is_some() || mapping.search_analyzer.is_some();
            if analyzed && mapping.field_type != FieldType::Text {
                return Err(Error::Mapping(format!(
                    "field '{}' of type {} cannot have an analyzer",
                    name, mapping.field_type
                )));
            }
        }
        Ok(())
    }

    /// Body for `PUT /{index}`
    pub fn create_index_body(&self) -> Value {
        json!({
            "settings": self.settings_body(),
            "mappings": self.mapping_body(),
        })
    }
}

/// A type persisted as documents of one index
pub trait Document: Serialize + DeserializeOwned + Send + Sync + 'static {
    fn mapping() -> DocumentMapping;

    /// Value used as the document `_id`
    fn document_id(&self) -> String;

    /// Restore the id from a hit's `_id` when the source left it out
    fn set_document_id(&mut self, _id: &str) {}

    fn index_name() -> String {
        Self::mapping().index_name
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_field_defaults_are_omitted() {
        assert_eq!(FieldMapping::keyword().to_json(), json!({"type": "keyword"}));
    }

    #[test]
    fn test_field_flags() {
        let field = FieldMapping::text()
            .analyzer("ik_max_word")
            .search_analyzer("ik_smart")
            .stored();
        assert_eq!(
            field.to_json(),
            json!({
                "type": "text",
                "analyzer": "ik_max_word",
                "search_analyzer": "ik_smart",
                "store": true
            })
        );

        let images = FieldMapping::keyword().not_indexed();
        assert_eq!(images.to_json(), json!({"type": "keyword", "index": false}));
    }

    #[test]
    fn test_create_index_body() {
        let mapping = DocumentMapping::new("books")
            .shards(2)
            .replicas(0)
            .refresh_interval("5s")
            .field("name", FieldMapping::text())
            .field("published", FieldMapping::date().format("yyyy-MM-dd"));

        assert_eq!(
            mapping.create_index_body(),
            json!({
                "settings": {
                    "number_of_shards": 2,
                    "number_of_replicas": 0,
                    "refresh_interval": "5s"
                },
                "mappings": {
                    "properties": {
                        "name": {"type": "text"},
                        "published": {"type": "date", "format": "yyyy-MM-dd"}
                    }
                }
            })
        );
    }

    #[test]
    fn test_field_type_parse() {
        assert_eq!(FieldType::parse("half_float"), FieldType::HalfFloat);
        assert_eq!(
            FieldType::parse("geo_point"),
            FieldType::Unknown("geo_point".to_string())
        );
        assert!(FieldType::Double.is_numeric());
        assert!(!FieldType::Keyword.is_numeric());
    }

    #[test]
    fn test_validate_mapping() {
        let ok = DocumentMapping::new("books").field("name", FieldMapping::text().analyzer("standard"));
        assert!(ok.validate().is_ok());

        let twice = DocumentMapping::new("books")
            .field("name", FieldMapping::text())
            .field("name", FieldMapping::keyword());
        assert!(matches!(twice.validate(), Err(Error::Mapping(_))));

        let keyword_analyzer =
            DocumentMapping::new("books").field("tag", FieldMapping::keyword().analyzer("ik_smart"));
        assert!(matches!(keyword_analyzer.validate(), Err(Error::Mapping(_))));

        assert!(matches!(
            DocumentMapping::new("").validate(),
            Err(Error::Mapping(_))
        ));
        assert!(matches!(
            DocumentMapping::new("books").shards(0).validate(),
            Err(Error::Mapping(_))
        ));
    }
}
