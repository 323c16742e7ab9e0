//! Declarative hypermedia definitions.
//!
//! A definition document names resources (base hrefs) and classes. Each
//! class points at one resource for its own href and lists links and actions
//! whose hrefs are *relative to the resource of their target class*.
//!
//! ```json
//! {
//!   "resources": { "widgets": { "href": "/widgets", "version": "1" } },
//!   "classes": {
//!     "Widget": {
//!       "resource": "widgets",
//!       "links": [ { "name": "self", "class": "widgets", "href": "/{id}", "in": "both" } ],
//!       "actions": [ { "name": "remove", "class": "widgets", "method": "DELETE", "href": "/{id}" } ]
//!     }
//!   }
//! }
//! ```

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::error::Error;
use crate::metadata::{ActionDescriptor, EntityMetadata, LinkDescriptor, Placement};

/// A bulk hypermedia definition document.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct HypermediaDefinition {
    /// Resources by name
    #[serde(default)]
    pub resources: BTreeMap<String, ResourceDefinition>,
    /// Classes by name
    #[serde(default)]
    pub classes: BTreeMap<String, ClassDefinition>,
}

/// A named resource and its base href.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ResourceDefinition {
    /// Base href of the resource
    pub href: String,
    /// Free-form version label
    #[serde(default)]
    pub version: String,
}

/// A class entry.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ClassDefinition {
    /// Resource providing this class's base href
    pub resource: String,
    /// Actions in declaration order
    #[serde(default)]
    pub actions: Vec<ActionDefinition>,
    /// Links in declaration order
    #[serde(default)]
    pub links: Vec<LinkDefinition>,
}

/// An action entry.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ActionDefinition {
    /// Action name
    pub name: String,
    /// Target resource; its href prefixes `href`
    pub class: String,
    /// HTTP method
    pub method: String,
    /// Href relative to the target resource
    #[serde(default)]
    pub href: String,
    /// Placement
    #[serde(default, rename = "in")]
    pub placement: Placement,
}

/// A link entry.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LinkDefinition {
    /// Relation name
    pub name: String,
    /// Target resource; its href prefixes `href`
    pub class: String,
    /// Href relative to the target resource
    #[serde(default)]
    pub href: String,
    /// Placement
    #[serde(default, rename = "in")]
    pub placement: Placement,
}

impl HypermediaDefinition {
    /// Parses a JSON definition document.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Definition`] if the document is not valid JSON or does
    /// not match the definition schema.
    pub fn from_json(json: &str) -> Result<Self, Error> {
        serde_json::from_str(json).map_err(Error::Definition)
    }

    /// Returns the href of a resource, or an empty string if it is unknown.
    pub fn resource_href(&self, resource: &str) -> &str {
        match self.resources.get(resource) {
            Some(r) => &r.href,
            None => {
                tracing::warn!(resource, "definition references an unknown resource");
                ""
            }
        }
    }

    /// Builds entity metadata for every class in the document.
    ///
    /// Link and action hrefs are resolved as `resource_href(target) + href`.
    pub fn to_metadata(&self) -> Vec<EntityMetadata> {
        self.classes
            .iter()
            .map(|(class_name, class)| {
                let mut meta =
                    EntityMetadata::new(class_name.clone(), self.resource_href(&class.resource));

                for link in &class.links {
                    let mut descriptor = LinkDescriptor::new(
                        link.name.clone(),
                        format!("{}{}", self.resource_href(&link.class), link.href),
                    )
                    .targeting(link.class.clone())
                    .placed(link.placement);
                    descriptor.name = Some(link.name.clone());
                    meta = meta.with_link(descriptor);
                }

                for action in &class.actions {
                    meta = meta.with_action(
                        ActionDescriptor::new(
                            action.name.clone(),
                            action.method.clone(),
                            format!("{}{}", self.resource_href(&action.class), action.href),
                        )
                        .targeting(action.class.clone())
                        .placed(action.placement),
                    );
                }

                meta
            })
            .collect()
    }
}
