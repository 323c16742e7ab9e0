//! Registration by introspection.
//!
//! A type describes itself once through [`Hypermedia::shape`]: which of its
//! fields are plain data, which hold sub-entities, and which are capability
//! tags (entity marker, link, action, curie) carrying declarative metadata.
//! [`resolve_shape`] turns that description into [`EntityMetadata`], so the
//! per-call traversal never has to re-derive field roles.

use indexmap::IndexMap;
use serde::Serialize;

use crate::error::{Error, ShapeViolation};
use crate::metadata::{
    ActionDescriptor, CurieDescriptor, EntityMetadata, FieldKind, LinkDescriptor, Placement,
};

/// Declarative key/value metadata attached to a field.
///
/// Accepts the familiar struct-tag notation, `key:"value" other:"value"`.
/// Runs of whitespace between pairs are collapsed before parsing, and a
/// malformed tail is ignored.
///
/// # Examples
///
/// ```
/// use hypermedia_decorator::Tags;
///
/// let tags = Tags::parse(r#"class:"Widget"   href:"/widgets""#);
/// assert_eq!(tags.get("class"), Some("Widget"));
/// assert_eq!(tags.get("href"), Some("/widgets"));
/// assert_eq!(tags.get("title"), None);
/// ```
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Tags {
    entries: IndexMap<String, String>,
}

impl Tags {
    /// Creates an empty tag set.
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a tag and returns the set for chaining.
    pub fn with(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.entries.insert(key.into(), value.into());
        self
    }

    /// Parses struct-tag notation.
    pub fn parse(raw: &str) -> Self {
        let collapsed = raw.split_whitespace().collect::<Vec<_>>().join(" ");
        let mut entries = IndexMap::new();
        let mut rest = collapsed.as_str();

        loop {
            rest = rest.trim_start();
            if rest.is_empty() {
                break;
            }
            let Some(colon) = rest.find(':') else { break };
            let key = &rest[..colon];
            if key.is_empty() || key.contains(|c: char| c == '"' || c.is_whitespace()) {
                break;
            }
            let Some(quoted) = rest[colon + 1..].strip_prefix('"') else {
                break;
            };
            let Some((value, consumed)) = read_quoted(quoted) else {
                break;
            };
            entries.insert(key.to_owned(), value);
            rest = &quoted[consumed..];
        }

        Self { entries }
    }

    /// Returns a tag's value; empty values count as absent.
    pub fn get(&self, key: &str) -> Option<&str> {
        self.entries
            .get(key)
            .map(String::as_str)
            .filter(|v| !v.is_empty())
    }

    fn owned(&self, key: &str) -> Option<String> {
        self.get(key).map(str::to_owned)
    }

    fn flag(&self, key: &str) -> bool {
        self.get(key) == Some("true")
    }

    fn placement(&self) -> Placement {
        self.get("in")
            .and_then(|p| p.parse().ok())
            .unwrap_or_default()
    }
}

/// Reads a quoted value up to its closing quote, returning the unescaped
/// value and the number of bytes consumed including the closing quote.
fn read_quoted(s: &str) -> Option<(String, usize)> {
    let mut value = String::new();
    let mut escaped = false;
    for (i, c) in s.char_indices() {
        match (escaped, c) {
            (true, c) => {
                value.push(c);
                escaped = false;
            }
            (false, '\\') => escaped = true,
            (false, '"') => return Some((value, i + 1)),
            (false, c) => value.push(c),
        }
    }
    None
}

/// Role of a field in a [`TypeShape`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FieldRole {
    /// Ordinary data
    Plain,
    /// A single entity-typed value
    SubEntityScalar,
    /// A collection of entity-typed values
    SubEntityList,
    /// The entity marker field; its tags carry `class`, `title`, `href`, `type`
    Marker(Tags),
    /// A link; the field name is the relation
    Link(Tags),
    /// An action; the field name is the action name
    Action(Tags),
    /// A curie; the field name is the prefix
    Curie(Tags),
}

impl FieldRole {
    fn kind(&self) -> FieldKind {
        match self {
            FieldRole::Plain => FieldKind::Plain,
            FieldRole::SubEntityScalar => FieldKind::SubEntity,
            FieldRole::SubEntityList => FieldKind::SubEntityList,
            FieldRole::Marker(_) | FieldRole::Link(_) | FieldRole::Action(_) | FieldRole::Curie(_) => {
                FieldKind::Capability
            }
        }
    }
}

/// One declared field.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FieldShape {
    /// Field name as it appears in the serialized payload
    pub name: String,
    /// What the field is
    pub role: FieldRole,
}

/// Self-description of a type for introspective registration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TypeShape {
    /// A structured record with named fields
    Record {
        /// Type name
        type_name: String,
        /// Fields in declaration order
        fields: Vec<FieldShape>,
    },
    /// A leaf type
    Scalar {
        /// Type name
        type_name: String,
    },
    /// A collection type
    Sequence {
        /// Type name
        type_name: String,
    },
}

impl TypeShape {
    /// Starts describing a record type.
    pub fn record(type_name: impl Into<String>) -> Self {
        TypeShape::Record {
            type_name: type_name.into(),
            fields: Vec::new(),
        }
    }

    /// Appends a field to a record shape. Has no effect on other shapes.
    pub fn field(mut self, name: impl Into<String>, role: FieldRole) -> Self {
        if let TypeShape::Record { fields, .. } = &mut self {
            fields.push(FieldShape {
                name: name.into(),
                role,
            });
        }
        self
    }

    /// Returns the described type's name.
    pub fn type_name(&self) -> &str {
        match self {
            TypeShape::Record { type_name, .. }
            | TypeShape::Scalar { type_name }
            | TypeShape::Sequence { type_name } => type_name,
        }
    }
}

/// Types that can describe their hypermedia shape.
///
/// # Examples
///
/// ```
/// use hypermedia_decorator::{FieldRole, Hypermedia, Tags, TypeShape};
///
/// struct Widget;
///
/// impl Hypermedia for Widget {
///     fn shape() -> TypeShape {
///         TypeShape::record("Widget")
///             .field("entity", FieldRole::Marker(Tags::parse(r#"class:"Widget" href:"/widgets""#)))
///             .field("id", FieldRole::Plain)
///             .field("self", FieldRole::Link(Tags::parse(r#"href:"/widgets/{id}""#)))
///     }
/// }
/// ```
pub trait Hypermedia {
    /// Describes the type.
    fn shape() -> TypeShape;
}

/// Zero-sized entity marker field type.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct EntityMarker;

/// Zero-sized link capability field type.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct Link;

/// Zero-sized action capability field type.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct Action;

/// Zero-sized curie capability field type.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct Curie;

/// Resolves a type shape into entity metadata.
///
/// # Errors
///
/// Returns [`Error::InvalidShape`] if the shape is not a record, has no
/// marker field, or has more than one.
pub fn resolve_shape(shape: &TypeShape) -> Result<EntityMetadata, Error> {
    let TypeShape::Record { type_name, fields } = shape else {
        return Err(Error::invalid_shape(
            shape.type_name(),
            ShapeViolation::NotARecord,
        ));
    };

    let mut markers = fields.iter().filter_map(|f| match &f.role {
        FieldRole::Marker(tags) => Some(tags),
        _ => None,
    });
    let marker = markers
        .next()
        .ok_or_else(|| Error::invalid_shape(type_name.as_str(), ShapeViolation::MissingMarker))?;
    if markers.next().is_some() {
        return Err(Error::invalid_shape(
            type_name.as_str(),
            ShapeViolation::DuplicateMarker,
        ));
    }

    let class_name = marker.owned("class").unwrap_or_else(|| type_name.clone());
    let mut meta = EntityMetadata::new(class_name, marker.get("href").unwrap_or_default());
    meta.title = marker.owned("title");
    meta.media_type = marker.owned("type");

    for field in fields {
        meta.fields.insert(field.name.clone(), field.role.kind());
        match &field.role {
            FieldRole::Link(tags) => {
                meta = meta.with_link(LinkDescriptor {
                    relation: field.name.clone(),
                    href_template: tags.get("href").unwrap_or_default().to_owned(),
                    target_class: tags.owned("class").unwrap_or_default(),
                    placement: tags.placement(),
                    name: tags.owned("name"),
                    title: tags.owned("title"),
                    media_type: tags.owned("type"),
                    templated: tags.flag("templated"),
                });
            }
            FieldRole::Action(tags) => {
                let mut action = ActionDescriptor::new(
                    field.name.clone(),
                    tags.get("method").unwrap_or("GET"),
                    tags.get("href").unwrap_or_default(),
                )
                .placed(tags.placement());
                action.target_class = tags.owned("class").unwrap_or_default();
                action.title = tags.owned("title");
                action.media_type = tags.owned("type");
                meta = meta.with_action(action);
            }
            FieldRole::Curie(tags) => {
                meta = meta.with_curie(CurieDescriptor::new(
                    field.name.clone(),
                    tags.get("href").unwrap_or_default(),
                    tags.flag("templated"),
                ));
            }
            FieldRole::Plain
            | FieldRole::SubEntityScalar
            | FieldRole::SubEntityList
            | FieldRole::Marker(_) => {}
        }
    }

    Ok(meta)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn widget_shape() -> TypeShape {
        TypeShape::record("Widget")
            .field(
                "entity",
                FieldRole::Marker(Tags::parse(r#"class:"Widget" title:"A widget" href:"/widgets""#)),
            )
            .field("id", FieldRole::Plain)
            .field("parts", FieldRole::SubEntityList)
            .field(
                "self",
                FieldRole::Link(Tags::parse(r#"href:"/widgets/{id}" class:"Widget" in:"both""#)),
            )
            .field(
                "remove",
                FieldRole::Action(Tags::parse(r#"method:"delete" href:"/widgets/{id}" class:"Widget""#)),
            )
            .field(
                "doc",
                FieldRole::Curie(Tags::parse(r#"href:"/docs/{rel}" templated:"true""#)),
            )
    }

    #[test]
    fn parse_collapses_whitespace_and_unescapes() {
        let tags = Tags::parse("a:\"1\"\n\t  b:\"say \\\"hi\\\"\"");
        assert_eq!(tags.get("a"), Some("1"));
        assert_eq!(tags.get("b"), Some("say \"hi\""));
    }

    #[test]
    fn parse_stops_at_malformed_tail() {
        let tags = Tags::parse(r#"a:"1" broken b:"2""#);
        assert_eq!(tags.get("a"), Some("1"));
        assert_eq!(tags.get("b"), None);
    }

    #[test]
    fn resolves_marker_links_actions_and_curies() {
        let meta = resolve_shape(&widget_shape()).expect("valid shape");

        assert_eq!(meta.class_name, "Widget");
        assert_eq!(meta.base_href, "/widgets");
        assert_eq!(meta.title.as_deref(), Some("A widget"));

        let link = meta.link("self").expect("self link");
        assert_eq!(link.href_template, "/widgets/{id}");
        assert_eq!(link.target_class, "Widget");

        let action = meta.action("remove").expect("remove action");
        assert_eq!(action.method, "DELETE");

        assert_eq!(meta.curies.len(), 1);
        assert!(meta.curies[0].templated);

        assert_eq!(meta.field_kind("id"), Some(FieldKind::Plain));
        assert_eq!(meta.field_kind("parts"), Some(FieldKind::SubEntityList));
        assert_eq!(meta.field_kind("self"), Some(FieldKind::Capability));
        assert_eq!(meta.field_kind("entity"), Some(FieldKind::Capability));
    }

    #[test]
    fn class_defaults_to_type_name_and_method_to_get() {
        let shape = TypeShape::record("Gadget")
            .field("entity", FieldRole::Marker(Tags::new()))
            .field("fetch", FieldRole::Action(Tags::new().with("href", "/g")));
        let meta = resolve_shape(&shape).unwrap();
        assert_eq!(meta.class_name, "Gadget");
        assert_eq!(meta.action("fetch").unwrap().method, "GET");
    }

    #[test]
    fn missing_marker_is_invalid() {
        let shape = TypeShape::record("Widget").field("id", FieldRole::Plain);
        let err = resolve_shape(&shape).unwrap_err();
        assert!(matches!(
            err,
            Error::InvalidShape {
                reason: ShapeViolation::MissingMarker,
                ..
            }
        ));
    }

    #[test]
    fn non_record_is_invalid() {
        let shape = TypeShape::Scalar {
            type_name: "u32".into(),
        };
        let err = resolve_shape(&shape).unwrap_err();
        assert!(matches!(
            err,
            Error::InvalidShape {
                reason: ShapeViolation::NotARecord,
                ..
            }
        ));
    }

    #[test]
    fn two_markers_are_invalid() {
        let shape = TypeShape::record("Widget")
            .field("a", FieldRole::Marker(Tags::new()))
            .field("b", FieldRole::Marker(Tags::new()));
        assert!(matches!(
            resolve_shape(&shape),
            Err(Error::InvalidShape {
                reason: ShapeViolation::DuplicateMarker,
                ..
            })
        ));
    }
}
