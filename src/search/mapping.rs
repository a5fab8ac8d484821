//! Index mapping declarations
//!
//! A mapping names an index, the fields that get analyzed out of the raw JSON
//! document, and optionally a version field used to reject stale writes. The
//! mappings for the built-in kinds are compiled into the binary; more can be
//! registered from a directory of `<index>.json` files.

use crate::search::error::EngineError;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::{BTreeMap, HashSet};
use std::path::Path;
use std::sync::Arc;
use tantivy::schema::{Schema, FAST, INDEXED, STORED, STRING, TEXT};

/// Stored, untokenized document id
pub const ID_FIELD: &str = "_id";

/// Stored raw document, returned verbatim on hits
pub const SOURCE_FIELD: &str = "_source";

const EMBEDDED_MAPPINGS: &[(&str, &str)] = &[
    ("question", include_str!("mappings/question.json")),
    ("question_set", include_str!("mappings/question_set.json")),
    ("case", include_str!("mappings/case.json")),
    ("skill", include_str!("mappings/skill.json")),
];

/// How a mapped field is analyzed
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FieldKind {
    /// Tokenized full-text
    Text,
    /// Exact term, used for filters
    Keyword,
    /// Signed 64-bit integer with a fast column, used for ordering
    Long,
}

/// A single mapped field
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FieldMapping {
    /// Field name inside the index
    pub name: String,

    /// Dotted path into the source document, defaults to `name`
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub path: Option<String>,

    #[serde(rename = "type")]
    pub kind: FieldKind,
}

impl FieldMapping {
    pub fn path(&self) -> &str {
        self.path.as_deref().unwrap_or(&self.name)
    }
}

/// Mapping of one index
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IndexMapping {
    pub index: String,

    /// Long field whose value must not decrease across upserts of a document
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub version_field: Option<String>,

    pub fields: Vec<FieldMapping>,
}

impl IndexMapping {
    /// Parse and validate a mapping declaration
    pub fn from_json(raw: &str) -> Result<Self, EngineError> {
        let mapping: IndexMapping = serde_json::from_str(raw)
            .map_err(|e| EngineError::InvalidMapping(format!("malformed mapping: {}", e)))?;
        mapping.validate()?;
        Ok(mapping)
    }

    fn validate(&self) -> Result<(), EngineError> {
        if self.index.trim().is_empty() {
            return Err(EngineError::InvalidMapping("index name is empty".to_string()));
        }

        let mut seen = HashSet::new();
        for field in &self.fields {
            if field.name.is_empty() || field.name.starts_with('_') {
                return Err(EngineError::InvalidMapping(format!(
                    "{}: field name '{}' is reserved or empty",
                    self.index, field.name
                )));
            }
            if !seen.insert(field.name.as_str()) {
                return Err(EngineError::InvalidMapping(format!(
                    "{}: duplicate field '{}'",
                    self.index, field.name
                )));
            }
        }

        if let Some(version) = &self.version_field {
            match self.field(version) {
                Some(f) if f.kind == FieldKind::Long => {}
                _ => {
                    return Err(EngineError::InvalidMapping(format!(
                        "{}: version field '{}' must be a declared long field",
                        self.index, version
                    )))
                }
            }
        }

        Ok(())
    }

    pub fn field(&self, name: &str) -> Option<&FieldMapping> {
        self.fields.iter().find(|f| f.name == name)
    }

    /// Build the Tantivy schema for this mapping
    pub fn build_schema(&self) -> Schema {
        let mut schema_builder = Schema::builder();

        schema_builder.add_text_field(ID_FIELD, STRING | STORED);
        schema_builder.add_text_field(SOURCE_FIELD, STORED);

        for field in &self.fields {
            match field.kind {
                FieldKind::Text => {
                    schema_builder.add_text_field(&field.name, TEXT);
                }
                FieldKind::Keyword => {
                    schema_builder.add_text_field(&field.name, STRING);
                }
                FieldKind::Long => {
                    schema_builder.add_i64_field(&field.name, INDEXED | FAST);
                }
            }
        }

        schema_builder.build()
    }
}

/// Describe how an on-disk schema differs from a declared one
pub fn schema_difference(existing: &Schema, declared: &Schema) -> Option<String> {
    let describe = |schema: &Schema| -> BTreeMap<String, Value> {
        schema
            .fields()
            .map(|(_, entry)| {
                (
                    entry.name().to_string(),
                    serde_json::to_value(entry).unwrap_or(Value::Null),
                )
            })
            .collect()
    };

    let existing = describe(existing);
    let declared = describe(declared);
    if existing == declared {
        return None;
    }

    let mut differences = Vec::new();
    for (name, entry) in &declared {
        match existing.get(name) {
            None => differences.push(format!("missing field '{}'", name)),
            Some(current) if current != entry => {
                differences.push(format!("field '{}' has a different type", name))
            }
            _ => {}
        }
    }
    for name in existing.keys() {
        if !declared.contains_key(name) {
            differences.push(format!("unexpected field '{}'", name));
        }
    }

    Some(differences.join(", "))
}

/// Collect the values found at a dotted path, flattening arrays on the way
pub fn values_at<'a>(source: &'a Value, path: &str) -> Vec<&'a Value> {
    let mut current = vec![source];

    for segment in path.split('.') {
        let mut next = Vec::new();
        for value in current {
            match value {
                Value::Object(map) => {
                    if let Some(child) = map.get(segment) {
                        next.push(child);
                    }
                }
                Value::Array(items) => {
                    for item in items {
                        if let Some(child) = item.get(segment) {
                            next.push(child);
                        }
                    }
                }
                _ => {}
            }
        }
        current = next;
    }

    let mut leaves = Vec::new();
    for value in current {
        match value {
            Value::Array(items) => leaves.extend(items.iter()),
            Value::Null => {}
            other => leaves.push(other),
        }
    }
    leaves
}

/// The set of indexes known to this process, keyed by name
#[derive(Debug, Clone, Default)]
pub struct MappingRegistry {
    mappings: BTreeMap<String, Arc<IndexMapping>>,
}

impl MappingRegistry {
    /// Registry holding only the compiled-in mappings
    pub fn embedded() -> Result<Self, EngineError> {
        let mut registry = Self::default();
        for (name, raw) in EMBEDDED_MAPPINGS {
            let mapping = IndexMapping::from_json(raw)?;
            if mapping.index != *name {
                return Err(EngineError::InvalidMapping(format!(
                    "embedded mapping {} declares index {}",
                    name, mapping.index
                )));
            }
            registry.register(mapping)?;
        }
        Ok(registry)
    }

    /// Register every `*.json` mapping found in `dir`
    pub fn load_dir(&mut self, dir: &Path) -> Result<usize, EngineError> {
        let mut loaded = 0;
        let mut paths: Vec<_> = std::fs::read_dir(dir)?
            .filter_map(|entry| entry.ok().map(|e| e.path()))
            .filter(|p| p.extension().map(|ext| ext == "json").unwrap_or(false))
            .collect();
        paths.sort();

        for path in paths {
            let raw = std::fs::read_to_string(&path)?;
            let mapping = IndexMapping::from_json(&raw)?;
            tracing::info!(index = %mapping.index, path = %path.display(), "Registered extra mapping");
            self.register(mapping)?;
            loaded += 1;
        }

        Ok(loaded)
    }

    pub fn register(&mut self, mapping: IndexMapping) -> Result<(), EngineError> {
        if self.mappings.contains_key(&mapping.index) {
            return Err(EngineError::InvalidMapping(format!(
                "index {} registered twice",
                mapping.index
            )));
        }
        self.mappings
            .insert(mapping.index.clone(), Arc::new(mapping));
        Ok(())
    }

    pub fn get(&self, index: &str) -> Option<Arc<IndexMapping>> {
        self.mappings.get(index).cloned()
    }

    pub fn contains(&self, index: &str) -> bool {
        self.mappings.contains_key(index)
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.mappings.keys().map(String::as_str)
    }

    pub fn mappings(&self) -> impl Iterator<Item = &Arc<IndexMapping>> {
        self.mappings.values()
    }

    pub fn len(&self) -> usize {
        self.mappings.len()
    }

    pub fn is_empty(&self) -> bool {
        self.mappings.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_embedded_mappings_parse() {
        let registry = MappingRegistry::embedded().unwrap();
        let names: Vec<_> = registry.names().collect();
        assert_eq!(names, vec!["case", "question", "question_set", "skill"]);

        let question = registry.get("question").unwrap();
        assert_eq!(question.version_field.as_deref(), Some("utime"));
        assert_eq!(
            question.field("answer_basic").unwrap().path(),
            "answer.basic.content"
        );
    }

    #[test]
    fn test_schema_has_reserved_fields() {
        let registry = MappingRegistry::embedded().unwrap();
        let schema = registry.get("case").unwrap().build_schema();
        assert!(schema.get_field(ID_FIELD).is_ok());
        assert!(schema.get_field(SOURCE_FIELD).is_ok());
        assert!(schema.get_field("code_content").is_ok());
    }

    #[test]
    fn test_reject_bad_mappings() {
        let dup = r#"{"index":"x","fields":[{"name":"a","type":"text"},{"name":"a","type":"long"}]}"#;
        assert!(IndexMapping::from_json(dup).is_err());

        let reserved = r#"{"index":"x","fields":[{"name":"_id","type":"keyword"}]}"#;
        assert!(IndexMapping::from_json(reserved).is_err());

        let bad_version = r#"{"index":"x","version_field":"a","fields":[{"name":"a","type":"text"}]}"#;
        assert!(IndexMapping::from_json(bad_version).is_err());
    }

    #[test]
    fn test_duplicate_registration() {
        let mut registry = MappingRegistry::embedded().unwrap();
        let again = registry.get("skill").unwrap().as_ref().clone();
        assert!(registry.register(again).is_err());
    }

    #[test]
    fn test_schema_difference() {
        let registry = MappingRegistry::embedded().unwrap();
        let question = registry.get("question").unwrap().build_schema();
        let case = registry.get("case").unwrap().build_schema();

        assert!(schema_difference(&question, &question).is_none());
        let diff = schema_difference(&question, &case).unwrap();
        assert!(diff.contains("code_content"));
    }

    #[test]
    fn test_values_at_flattens_arrays() {
        let doc = json!({
            "labels": ["go", "channel"],
            "answer": { "basic": { "content": "buffered" } },
            "levels": [{ "desc": "a" }, { "desc": "b" }],
            "empty": null
        });

        assert_eq!(values_at(&doc, "labels").len(), 2);
        assert_eq!(values_at(&doc, "answer.basic.content"), vec![&json!("buffered")]);
        assert_eq!(values_at(&doc, "levels.desc").len(), 2);
        assert!(values_at(&doc, "empty").is_empty());
        assert!(values_at(&doc, "missing.path").is_empty());
    }
}
