//! Hypermedia metadata registered per resource class.

use std::fmt;
use std::str::FromStr;

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

/// Where a link or action applies.
///
/// A descriptor placed in `Class` is emitted when the resource is rendered
/// on its own; `List` when it is rendered as a collection member; `Both`
/// in either case.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Placement {
    /// Only on a singly rendered resource
    Class,
    /// Only on collection members
    List,
    /// Everywhere
    #[default]
    Both,
}

/// How a resource is being rendered at a given point of the traversal.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Membership {
    /// Rendered on its own (top level or directly embedded)
    Single,
    /// Rendered as a member of a collection
    ListItem,
}

impl Placement {
    /// Returns true if a descriptor with this placement is emitted for `membership`.
    pub fn applies_to(self, membership: Membership) -> bool {
        matches!(
            (self, membership),
            (Placement::Both, _)
                | (Placement::Class, Membership::Single)
                | (Placement::List, Membership::ListItem)
        )
    }
}

impl fmt::Display for Placement {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Placement::Class => write!(f, "class"),
            Placement::List => write!(f, "list"),
            Placement::Both => write!(f, "both"),
        }
    }
}

impl FromStr for Placement {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "class" => Ok(Placement::Class),
            "list" => Ok(Placement::List),
            "both" | "" => Ok(Placement::Both),
            other => Err(format!("unknown placement `{}`", other)),
        }
    }
}

/// A navigational relation from one resource to another.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LinkDescriptor {
    /// Relation name, unique within one entity's links
    pub relation: String,
    /// Href template, may contain `{field}` placeholders
    pub href_template: String,
    /// Class the link points at; used by role-based access checks
    pub target_class: String,
    /// Where the link applies
    pub placement: Placement,
    /// Optional HAL `name`
    pub name: Option<String>,
    /// Optional human readable title
    pub title: Option<String>,
    /// Optional media type hint
    pub media_type: Option<String>,
    /// Whether the href is itself a URI template for the client to expand
    pub templated: bool,
}

impl LinkDescriptor {
    /// Creates a link with the given relation and href template.
    pub fn new(relation: impl Into<String>, href_template: impl Into<String>) -> Self {
        Self {
            relation: relation.into(),
            href_template: href_template.into(),
            target_class: String::new(),
            placement: Placement::Both,
            name: None,
            title: None,
            media_type: None,
            templated: false,
        }
    }

    /// Sets the target class.
    pub fn targeting(mut self, class: impl Into<String>) -> Self {
        self.target_class = class.into();
        self
    }

    /// Sets the placement.
    pub fn placed(mut self, placement: Placement) -> Self {
        self.placement = placement;
        self
    }

    /// Sets the title.
    pub fn titled(mut self, title: impl Into<String>) -> Self {
        self.title = Some(title.into());
        self
    }
}

/// A Siren-style affordance: an HTTP method plus an href.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ActionDescriptor {
    /// Action name
    pub name: String,
    /// HTTP method, upper case
    pub method: String,
    /// Href template
    pub href_template: String,
    /// Class the action targets
    pub target_class: String,
    /// Where the action applies
    pub placement: Placement,
    /// Optional human readable title
    pub title: Option<String>,
    /// Optional request media type
    pub media_type: Option<String>,
}

impl ActionDescriptor {
    /// Creates an action.
    pub fn new(
        name: impl Into<String>,
        method: impl Into<String>,
        href_template: impl Into<String>,
    ) -> Self {
        Self {
            name: name.into(),
            method: method.into().to_ascii_uppercase(),
            href_template: href_template.into(),
            target_class: String::new(),
            placement: Placement::Both,
            title: None,
            media_type: None,
        }
    }

    /// Sets the target class.
    pub fn targeting(mut self, class: impl Into<String>) -> Self {
        self.target_class = class.into();
        self
    }

    /// Sets the placement.
    pub fn placed(mut self, placement: Placement) -> Self {
        self.placement = placement;
        self
    }
}

/// A HAL documentation-link prefix.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CurieDescriptor {
    /// Short prefix name
    pub name: String,
    /// Documentation href, usually containing `{rel}`
    pub href_template: String,
    /// Whether the href is a template
    pub templated: bool,
}

impl CurieDescriptor {
    /// Creates a curie.
    pub fn new(name: impl Into<String>, href_template: impl Into<String>, templated: bool) -> Self {
        Self {
            name: name.into(),
            href_template: href_template.into(),
            templated,
        }
    }
}

/// Role a record field plays, resolved once at registration.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FieldKind {
    /// Ordinary data
    Plain,
    /// A single embedded entity
    SubEntity,
    /// A collection of embedded entities
    SubEntityList,
    /// A capability-tag field (marker, link, action or curie); carries no data
    Capability,
}

/// Hypermedia metadata for one resource class.
///
/// # Examples
///
/// ```
/// use hypermedia_decorator::{EntityMetadata, LinkDescriptor};
///
/// let widget = EntityMetadata::new("Widget", "/widgets")
///     .with_link(LinkDescriptor::new("self", "/widgets/{id}"));
///
/// assert_eq!(widget.link("self").map(|l| l.href_template.as_str()), Some("/widgets/{id}"));
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EntityMetadata {
    /// Class name; the registry key
    pub class_name: String,
    /// Base href, may contain placeholders
    pub base_href: String,
    /// Optional title
    pub title: Option<String>,
    /// Optional media type
    pub media_type: Option<String>,
    /// Links in declaration order
    pub links: Vec<LinkDescriptor>,
    /// Actions in declaration order
    pub actions: Vec<ActionDescriptor>,
    /// Curies in declaration order
    pub curies: Vec<CurieDescriptor>,
    /// Field roles declared by the type, if registered by introspection
    pub fields: IndexMap<String, FieldKind>,
}

impl EntityMetadata {
    /// Creates metadata with no links, actions or curies.
    pub fn new(class_name: impl Into<String>, base_href: impl Into<String>) -> Self {
        Self {
            class_name: class_name.into(),
            base_href: base_href.into(),
            title: None,
            media_type: None,
            links: Vec::new(),
            actions: Vec::new(),
            curies: Vec::new(),
            fields: IndexMap::new(),
        }
    }

    /// Appends a link, replacing an existing one with the same relation in place.
    pub fn with_link(mut self, link: LinkDescriptor) -> Self {
        match self.links.iter_mut().find(|l| l.relation == link.relation) {
            Some(existing) => *existing = link,
            None => self.links.push(link),
        }
        self
    }

    /// Appends an action.
    pub fn with_action(mut self, action: ActionDescriptor) -> Self {
        self.actions.push(action);
        self
    }

    /// Appends a curie.
    pub fn with_curie(mut self, curie: CurieDescriptor) -> Self {
        self.curies.push(curie);
        self
    }

    /// Looks up a link by relation.
    pub fn link(&self, relation: &str) -> Option<&LinkDescriptor> {
        self.links.iter().find(|l| l.relation == relation)
    }

    /// Looks up an action by name.
    pub fn action(&self, name: &str) -> Option<&ActionDescriptor> {
        self.actions.iter().find(|a| a.name == name)
    }

    /// Returns the declared role of a field, if the type declared one.
    pub fn field_kind(&self, field: &str) -> Option<FieldKind> {
        self.fields.get(field).copied()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn placement_matrix() {
        assert!(Placement::Both.applies_to(Membership::Single));
        assert!(Placement::Both.applies_to(Membership::ListItem));
        assert!(Placement::Class.applies_to(Membership::Single));
        assert!(!Placement::Class.applies_to(Membership::ListItem));
        assert!(Placement::List.applies_to(Membership::ListItem));
        assert!(!Placement::List.applies_to(Membership::Single));
    }

    #[test]
    fn placement_parses_and_defaults_to_both() {
        assert_eq!("list".parse::<Placement>(), Ok(Placement::List));
        assert_eq!("".parse::<Placement>(), Ok(Placement::Both));
        assert!("nowhere".parse::<Placement>().is_err());
        assert_eq!(Placement::default(), Placement::Both);
    }

    #[test]
    fn duplicate_relation_replaces_in_place() {
        let meta = EntityMetadata::new("Widget", "/widgets")
            .with_link(LinkDescriptor::new("self", "/a"))
            .with_link(LinkDescriptor::new("parts", "/b"))
            .with_link(LinkDescriptor::new("self", "/c"));

        let rels: Vec<&str> = meta.links.iter().map(|l| l.relation.as_str()).collect();
        assert_eq!(rels, vec!["self", "parts"]);
        assert_eq!(meta.link("self").unwrap().href_template, "/c");
    }

    #[test]
    fn action_method_is_upper_cased() {
        let action = ActionDescriptor::new("delete", "delete", "/widgets/{id}");
        assert_eq!(action.method, "DELETE");
    }
}
