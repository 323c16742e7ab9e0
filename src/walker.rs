//! Structural classification of payloads.
//!
//! The walker splits a record's fields into plain properties and
//! sub-entities by consulting the registry. It never stringifies plain
//! properties; they are carried through as raw payload values.

use crate::metadata::{EntityMetadata, FieldKind};
use crate::payload::{Payload, PropertyBag, Record};
use crate::registry::RegistrySnapshot;

/// Result of classifying a top-level payload.
#[derive(Debug, Clone, PartialEq)]
pub enum Traversal<'p> {
    /// A structured record
    Entity(RecordView<'p>),
    /// A list or map, traversed member by member
    Collection(CollectionView<'p>),
    /// Anything else
    Scalar(&'p Payload),
}

/// A record split into plain properties and sub-entities.
#[derive(Debug, Clone, PartialEq)]
pub struct RecordView<'p> {
    /// The classified record
    pub record: &'p Record,
    /// Plain fields, in declaration order
    pub properties: PropertyBag,
    /// Entity-valued fields, in declaration order
    pub sub_entities: Vec<SubEntity<'p>>,
}

impl<'p> RecordView<'p> {
    /// The record's runtime class name.
    pub fn class(&self) -> &'p str {
        &self.record.class
    }
}

/// An entity-valued field.
#[derive(Debug, Clone, PartialEq)]
pub struct SubEntity<'p> {
    /// Field name
    pub field: &'p str,
    /// The entity or entities it holds
    pub value: SubEntityValue<'p>,
}

/// Value of an entity-valued field.
#[derive(Debug, Clone, PartialEq)]
pub enum SubEntityValue<'p> {
    /// A single embedded entity
    Single(&'p Record),
    /// Collection members, in order
    List(Vec<&'p Payload>),
}

/// A top-level collection.
#[derive(Debug, Clone, PartialEq)]
pub struct CollectionView<'p> {
    /// Class of the first member, if it is a record
    pub element_class: Option<&'p str>,
    /// Members in order
    pub members: Vec<&'p Payload>,
}

impl CollectionView<'_> {
    /// The document class reported for the collection, e.g. `[]Widget`.
    pub fn class(&self) -> Option<String> {
        self.element_class.map(|c| format!("[]{}", c))
    }
}

/// Classifies payloads against one registry snapshot.
#[derive(Debug, Clone, Copy)]
pub struct StructuralWalker<'r> {
    registry: &'r RegistrySnapshot,
}

impl<'r> StructuralWalker<'r> {
    /// Creates a walker over a registry snapshot.
    pub fn new(registry: &'r RegistrySnapshot) -> Self {
        Self { registry }
    }

    /// Classifies a top-level payload.
    pub fn classify<'p>(&self, value: &'p Payload) -> Traversal<'p> {
        match value {
            Payload::Record(record) => Traversal::Entity(self.classify_record(record)),
            Payload::List(_) | Payload::Map(_) => Traversal::Collection(CollectionView {
                element_class: value.first_member().and_then(Payload::class_name),
                members: value.members(),
            }),
            Payload::Scalar(_) => Traversal::Scalar(value),
        }
    }

    /// Splits a record's fields into properties and sub-entities.
    ///
    /// A field is a sub-entity if its type declared it one at registration,
    /// or, absent a declaration, if it holds a record of a registered class or
    /// a collection whose first member is one. Capability-tag fields declared
    /// at registration are dropped. An empty collection is plain data unless
    /// declared as a sub-entity list.
    pub fn classify_record<'p>(&self, record: &'p Record) -> RecordView<'p> {
        let declared = self.registry.lookup(&record.class);
        let missing = self.missing_declared_fields(record);
        if !missing.is_empty() {
            tracing::warn!(
                class = %record.class,
                fields = ?missing,
                "declared fields absent from captured record"
            );
        }
        let mut properties = PropertyBag::new();
        let mut sub_entities = Vec::new();

        for (name, value) in &record.fields {
            match self.field_kind(declared, name, value) {
                FieldKind::Capability => {}
                FieldKind::Plain => properties.insert(name.clone(), value.clone()),
                FieldKind::SubEntity => match value {
                    Payload::Record(inner) => sub_entities.push(SubEntity {
                        field: name,
                        value: SubEntityValue::Single(inner),
                    }),
                    _ => properties.insert(name.clone(), value.clone()),
                },
                FieldKind::SubEntityList => sub_entities.push(SubEntity {
                    field: name,
                    value: SubEntityValue::List(value.members()),
                }),
            }
        }

        RecordView {
            record,
            properties,
            sub_entities,
        }
    }

    /// Declared non-plain fields of the record's class that the record does
    /// not carry.
    ///
    /// A hand-written shape that names a field differently from its serde
    /// output (a missed `rename`, say) shows up here.
    pub fn missing_declared_fields(&self, record: &Record) -> Vec<&'r str> {
        let Some(declared) = self.registry.lookup(&record.class) else {
            return Vec::new();
        };
        declared
            .fields
            .iter()
            .filter(|(name, kind)| **kind != FieldKind::Plain && !record.fields.contains_key(*name))
            .map(|(name, _)| name.as_str())
            .collect()
    }

    /// Treats every data field as a plain property.
    ///
    /// Used once the traversal depth limit is reached.
    pub fn flatten_record<'p>(&self, record: &'p Record) -> RecordView<'p> {
        let declared = self.registry.lookup(&record.class);
        let properties = record
            .fields
            .iter()
            .filter(|(name, _)| {
                declared.and_then(|m| m.field_kind(name)) != Some(FieldKind::Capability)
            })
            .map(|(name, value)| (name.as_str(), value.clone()))
            .collect();
        RecordView {
            record,
            properties,
            sub_entities: Vec::new(),
        }
    }

    fn field_kind(
        &self,
        declared: Option<&EntityMetadata>,
        name: &str,
        value: &Payload,
    ) -> FieldKind {
        match declared.and_then(|m| m.field_kind(name)) {
            Some(FieldKind::SubEntityList) if !value.is_collection() => FieldKind::Plain,
            Some(kind) => kind,
            None => self.detect(value),
        }
    }

    fn detect(&self, value: &Payload) -> FieldKind {
        match value {
            Payload::Record(inner) if self.registry.is_entity(&inner.class) => FieldKind::SubEntity,
            Payload::List(_) | Payload::Map(_) => match value.first_member().and_then(Payload::class_name) {
                Some(class) if self.registry.is_entity(class) => FieldKind::SubEntityList,
                _ => FieldKind::Plain,
            },
            _ => FieldKind::Plain,
        }
    }
}
