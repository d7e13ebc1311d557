use std::cmp::Ordering;
use std::collections::{BTreeMap, BTreeSet};

use serde::{Deserialize, Serialize};

/// A named concept extracted from a document.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Entity {
    pub mentions: Vec<String>,
    #[serde(rename = "type")]
    pub entity_type: String,
}

impl Entity {
    #[must_use]
    pub fn new(mentions: Vec<String>, entity_type: impl Into<String>) -> Self {
        Self {
            mentions,
            entity_type: entity_type.into(),
        }
    }

    /// The first listed mention, used as the voting anchor.
    #[must_use]
    pub fn representative(&self) -> Option<&str> {
        self.mentions.first().map(String::as_str)
    }

    /// Alphabetically first mention, used for output ordering.
    #[must_use]
    pub fn first_mention_sorted(&self) -> &str {
        self.mentions.iter().min().map_or("", String::as_str)
    }

    /// Output order: by type, then by alphabetically first mention.
    #[must_use]
    pub fn canonical_cmp(&self, other: &Self) -> Ordering {
        (self.entity_type.as_str(), self.first_mention_sorted())
            .cmp(&(other.entity_type.as_str(), other.first_mention_sorted()))
    }
}

/// A relation fact between two entity surface forms.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Triple {
    pub head: String,
    pub relation: String,
    pub tail: String,
}

impl Triple {
    #[must_use]
    pub fn new(
        head: impl Into<String>,
        relation: impl Into<String>,
        tail: impl Into<String>,
    ) -> Self {
        Self {
            head: head.into(),
            relation: relation.into(),
            tail: tail.into(),
        }
    }

    /// Output order: by head, relation, then tail.
    #[must_use]
    pub fn canonical_cmp(&self, other: &Self) -> Ordering {
        (&self.head, &self.relation, &self.tail).cmp(&(&other.head, &other.relation, &other.tail))
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DocumentRecord {
    #[serde(default)]
    pub title: String,
    pub entities: Vec<Entity>,
    pub triples: Vec<Triple>,
}

impl DocumentRecord {
    #[must_use]
    pub fn new(title: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            entities: Vec::new(),
            triples: Vec::new(),
        }
    }

    #[must_use]
    pub fn with_entity(mut self, entity: Entity) -> Self {
        self.entities.push(entity);
        self
    }

    #[must_use]
    pub fn with_triple(mut self, triple: Triple) -> Self {
        self.triples.push(triple);
        self
    }

    /// Every mention of every entity, in entity order.
    pub fn mentions(&self) -> impl Iterator<Item = &str> {
        self.entities
            .iter()
            .flat_map(|e| e.mentions.iter().map(String::as_str))
    }

    /// Sort entities by `(type, first mention)` and triples by
    /// `(head, relation, tail)`, with each entity's mentions sorted.
    pub fn sort_canonical(&mut self) {
        for entity in &mut self.entities {
            entity.mentions.sort();
        }
        self.entities.sort_by(Entity::canonical_cmp);
        self.triples.sort_by(Triple::canonical_cmp);
    }
}

/// Document id to record. Ordered so serialized output is stable.
pub type Payload = BTreeMap<String, DocumentRecord>;

/// Input handed to an extraction producer.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct DocumentSample {
    pub id: String,
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub domain: Option<String>,
    #[serde(default, flatten)]
    pub fields: BTreeMap<String, serde_json::Value>,
}

impl DocumentSample {
    #[must_use]
    pub fn new(id: impl Into<String>, title: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            title: title.into(),
            domain: None,
            fields: BTreeMap::new(),
        }
    }

    #[must_use]
    pub fn with_domain(mut self, domain: impl Into<String>) -> Self {
        self.domain = Some(domain.into());
        self
    }

    #[must_use]
    pub fn with_field(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.fields
            .insert(key.into(), serde_json::Value::String(value.into()));
        self
    }
}

/// Set difference of document ids between two payloads.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct IdComparison {
    pub missing_in_a: BTreeSet<String>,
    pub missing_in_b: BTreeSet<String>,
}

impl IdComparison {
    #[must_use]
    pub fn is_match(&self) -> bool {
        self.missing_in_a.is_empty() && self.missing_in_b.is_empty()
    }
}

/// Report which document ids each side lacks relative to the other.
pub fn compare_document_ids<'a, A, B>(a: A, b: B) -> IdComparison
where
    A: IntoIterator<Item = &'a String>,
    B: IntoIterator<Item = &'a String>,
{
    let a: BTreeSet<&String> = a.into_iter().collect();
    let b: BTreeSet<&String> = b.into_iter().collect();

    IdComparison {
        missing_in_a: b.difference(&a).map(|s| (*s).clone()).collect(),
        missing_in_b: a.difference(&b).map(|s| (*s).clone()).collect(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_entity_wire_shape() {
        let entity = Entity::new(vec!["Acme".into()], "ORG");
        let json = serde_json::to_value(&entity).unwrap();

        assert_eq!(json, serde_json::json!({"mentions": ["Acme"], "type": "ORG"}));
    }

    #[test]
    fn test_missing_title_defaults_empty() {
        let doc: DocumentRecord =
            serde_json::from_str(r#"{"entities": [], "triples": []}"#).unwrap();
        assert_eq!(doc.title, "");
    }

    #[test]
    fn test_sort_canonical() {
        let mut doc = DocumentRecord::new("t")
            .with_entity(Entity::new(vec!["Paris".into()], "LOC"))
            .with_entity(Entity::new(vec!["Zeta".into(), "Acme".into()], "ORG"))
            .with_entity(Entity::new(vec!["Berlin".into()], "LOC"))
            .with_triple(Triple::new("b", "r", "c"))
            .with_triple(Triple::new("a", "r", "c"));

        doc.sort_canonical();

        assert_eq!(doc.entities[0].mentions, vec!["Berlin"]);
        assert_eq!(doc.entities[1].mentions, vec!["Paris"]);
        assert_eq!(doc.entities[2].mentions, vec!["Acme", "Zeta"]);
        assert_eq!(doc.triples[0].head, "a");
    }

    #[test]
    fn test_compare_document_ids() {
        let a: Vec<String> = vec!["d1".into(), "d2".into()];
        let b: Vec<String> = vec!["d2".into(), "d3".into()];

        let cmp = compare_document_ids(&a, &b);

        assert_eq!(cmp.missing_in_a, BTreeSet::from(["d3".to_string()]));
        assert_eq!(cmp.missing_in_b, BTreeSet::from(["d1".to_string()]));
        assert!(!cmp.is_match());
        assert!(compare_document_ids(&a, &a).is_match());
    }

    #[test]
    fn test_sample_flattens_fields() {
        let sample: DocumentSample = serde_json::from_str(
            r#"{"id": "d1", "title": "T", "domain": "news", "doc": "body text"}"#,
        )
        .unwrap();

        assert_eq!(sample.domain.as_deref(), Some("news"));
        assert_eq!(sample.fields["doc"], "body text");
    }
}
