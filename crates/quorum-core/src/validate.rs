//! Structural validation of result payloads.
//!
//! Payloads arrive as loosely-typed JSON from producers and files. Every
//! check here runs before a payload is converted to [`Payload`], so the
//! aggregation code never has to default missing fields.

use serde_json::{Map, Value};
use thiserror::Error;

use crate::record::Payload;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SchemaError {
    #[error("payload root should be an object of documents, got {found}")]
    RootNotObject { found: &'static str },

    #[error("document {doc_id}: document should be an object, got {found}")]
    DocumentNotObject { doc_id: String, found: &'static str },

    #[error("document {doc_id}: missing required field '{field}'")]
    MissingField { doc_id: String, field: &'static str },

    #[error("document {doc_id}: '{field}' should be {expected}, got {found}")]
    WrongType {
        doc_id: String,
        field: &'static str,
        expected: &'static str,
        found: &'static str,
    },

    #[error("document {doc_id}: entity at index {index} should be an object, got {found}")]
    EntityNotObject {
        doc_id: String,
        index: usize,
        found: &'static str,
    },

    #[error("document {doc_id}: entity at index {index} is missing '{field}'")]
    EntityMissingField {
        doc_id: String,
        index: usize,
        field: &'static str,
    },

    #[error("document {doc_id}: entity at index {index}: '{field}' should be {expected}, got {found}")]
    EntityWrongType {
        doc_id: String,
        index: usize,
        field: &'static str,
        expected: &'static str,
        found: &'static str,
    },

    #[error("document {doc_id}: entity at index {entity}: mention at index {index} should be a string, got {found}")]
    MentionNotString {
        doc_id: String,
        entity: usize,
        index: usize,
        found: &'static str,
    },

    #[error("document {doc_id}: entity at index {index} has no mentions")]
    EmptyMentions { doc_id: String, index: usize },

    #[error("document {doc_id}: triple at index {index} should be an object, got {found}")]
    TripleNotObject {
        doc_id: String,
        index: usize,
        found: &'static str,
    },

    #[error("document {doc_id}: triple at index {index} is missing '{field}'")]
    TripleMissingField {
        doc_id: String,
        index: usize,
        field: &'static str,
    },

    #[error("document {doc_id}: triple at index {index}: '{field}' should be a string, got {found}")]
    TripleFieldNotString {
        doc_id: String,
        index: usize,
        field: &'static str,
        found: &'static str,
    },

    #[error("payload could not be decoded: {0}")]
    Malformed(String),
}

impl SchemaError {
    /// The offending document id, when the failure is document-scoped.
    #[must_use]
    pub fn doc_id(&self) -> Option<&str> {
        match self {
            Self::RootNotObject { .. } | Self::Malformed(_) => None,
            Self::DocumentNotObject { doc_id, .. }
            | Self::MissingField { doc_id, .. }
            | Self::WrongType { doc_id, .. }
            | Self::EntityNotObject { doc_id, .. }
            | Self::EntityMissingField { doc_id, .. }
            | Self::EntityWrongType { doc_id, .. }
            | Self::MentionNotString { doc_id, .. }
            | Self::EmptyMentions { doc_id, .. }
            | Self::TripleNotObject { doc_id, .. }
            | Self::TripleMissingField { doc_id, .. }
            | Self::TripleFieldNotString { doc_id, .. } => Some(doc_id),
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ValidationOptions {
    /// Accept entities whose mention list is empty. They still never vote or merge.
    pub allow_empty_mentions: bool,
}

impl ValidationOptions {
    #[must_use]
    pub fn lenient() -> Self {
        Self {
            allow_empty_mentions: true,
        }
    }
}

#[must_use]
pub fn json_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}

/// Check a whole payload, stopping at the first failing document.
pub fn validate(payload: &Value, options: ValidationOptions) -> Result<(), SchemaError> {
    let Value::Object(documents) = payload else {
        return Err(SchemaError::RootNotObject {
            found: json_kind(payload),
        });
    };

    for (doc_id, document) in documents {
        validate_document(doc_id, document, options)?;
    }

    Ok(())
}

/// Validate, then decode into a typed [`Payload`].
pub fn parse_payload(value: Value, options: ValidationOptions) -> Result<Payload, SchemaError> {
    validate(&value, options)?;
    serde_json::from_value(value).map_err(|e| SchemaError::Malformed(e.to_string()))
}

pub fn validate_document(
    doc_id: &str,
    document: &Value,
    options: ValidationOptions,
) -> Result<(), SchemaError> {
    let Value::Object(fields) = document else {
        return Err(SchemaError::DocumentNotObject {
            doc_id: doc_id.to_string(),
            found: json_kind(document),
        });
    };

    if let Some(title) = fields.get("title") {
        if !title.is_string() {
            return Err(SchemaError::WrongType {
                doc_id: doc_id.to_string(),
                field: "title",
                expected: "a string",
                found: json_kind(title),
            });
        }
    }

    let entities = required_list(doc_id, fields, "entities")?;
    for (index, entity) in entities.iter().enumerate() {
        validate_entity(doc_id, index, entity, options)?;
    }

    let triples = required_list(doc_id, fields, "triples")?;
    for (index, triple) in triples.iter().enumerate() {
        validate_triple(doc_id, index, triple)?;
    }

    Ok(())
}

fn required_list<'a>(
    doc_id: &str,
    fields: &'a Map<String, Value>,
    field: &'static str,
) -> Result<&'a Vec<Value>, SchemaError> {
    match fields.get(field) {
        None => Err(SchemaError::MissingField {
            doc_id: doc_id.to_string(),
            field,
        }),
        Some(Value::Array(items)) => Ok(items),
        Some(other) => Err(SchemaError::WrongType {
            doc_id: doc_id.to_string(),
            field,
            expected: "a list",
            found: json_kind(other),
        }),
    }
}

fn validate_entity(
    doc_id: &str,
    index: usize,
    entity: &Value,
    options: ValidationOptions,
) -> Result<(), SchemaError> {
    let Value::Object(fields) = entity else {
        return Err(SchemaError::EntityNotObject {
            doc_id: doc_id.to_string(),
            index,
            found: json_kind(entity),
        });
    };

    let missing = |field| SchemaError::EntityMissingField {
        doc_id: doc_id.to_string(),
        index,
        field,
    };

    let mentions = fields.get("mentions").ok_or_else(|| missing("mentions"))?;
    let Value::Array(mentions) = mentions else {
        return Err(SchemaError::EntityWrongType {
            doc_id: doc_id.to_string(),
            index,
            field: "mentions",
            expected: "a list",
            found: json_kind(mentions),
        });
    };

    for (mention_index, mention) in mentions.iter().enumerate() {
        if !mention.is_string() {
            return Err(SchemaError::MentionNotString {
                doc_id: doc_id.to_string(),
                entity: index,
                index: mention_index,
                found: json_kind(mention),
            });
        }
    }

    if mentions.is_empty() && !options.allow_empty_mentions {
        return Err(SchemaError::EmptyMentions {
            doc_id: doc_id.to_string(),
            index,
        });
    }

    let entity_type = fields.get("type").ok_or_else(|| missing("type"))?;
    if !entity_type.is_string() {
        return Err(SchemaError::EntityWrongType {
            doc_id: doc_id.to_string(),
            index,
            field: "type",
            expected: "a string",
            found: json_kind(entity_type),
        });
    }

    Ok(())
}

fn validate_triple(doc_id: &str, index: usize, triple: &Value) -> Result<(), SchemaError> {
    let Value::Object(fields) = triple else {
        return Err(SchemaError::TripleNotObject {
            doc_id: doc_id.to_string(),
            index,
            found: json_kind(triple),
        });
    };

    for field in ["head", "relation", "tail"] {
        let value = fields.get(field).ok_or_else(|| SchemaError::TripleMissingField {
            doc_id: doc_id.to_string(),
            index,
            field,
        })?;
        if !value.is_string() {
            return Err(SchemaError::TripleFieldNotString {
                doc_id: doc_id.to_string(),
                index,
                field,
                found: json_kind(value),
            });
        }
    }

    Ok(())
}
