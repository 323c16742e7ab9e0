//! Media-type renderers.
//!
//! Every renderer shares one pipeline: the [`StructuralWalker`] classifies
//! the payload, each entity's metadata is looked up in the registry
//! snapshot, links and actions are pruned by placement and then by the
//! access policy, and surviving hrefs are resolved against the entity's own
//! property bag. Only the envelope differs between formats.

mod collection;
mod hal;
mod siren;

use std::fmt;

use serde::Serialize;

pub use collection::{
    CollectionBody, CollectionDocument, CollectionItem, CollectionLink, CollectionRenderer,
    DataField, COLLECTION_JSON,
};
pub use hal::{HalCurie, HalEmbedded, HalLink, HalLinkEntry, HalMember, HalRenderer, HalResource, HAL_JSON};
pub use siren::{SirenAction, SirenDocument, SirenEntity, SirenLink, SirenRenderer, SIREN_JSON};

use crate::access::{AccessContext, AccessPolicy, AccessTarget};
use crate::metadata::{ActionDescriptor, EntityMetadata, LinkDescriptor, Membership};
use crate::path::PathResolver;
use crate::payload::{Payload, PropertyBag, Record};
use crate::registry::RegistrySnapshot;
use crate::walker::{RecordView, StructuralWalker};

/// A decorated document, ready for the transport layer to encode.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum Document {
    /// The payload, unchanged
    Payload(Payload),
    /// HAL-style resource
    Hal(HalResource),
    /// Siren-style entity
    Siren(SirenDocument),
    /// Collection+JSON envelope
    Collection(CollectionDocument),
}

impl Document {
    /// Returns the undecorated payload, if this is a pass-through document.
    pub fn as_payload(&self) -> Option<&Payload> {
        match self {
            Document::Payload(payload) => Some(payload),
            _ => None,
        }
    }
}

/// Turns a payload into one media type's envelope.
///
/// Renderers hold no per-call state: a render is a pure function of the
/// payload and the [`RenderContext`].
pub trait FormatRenderer: Send + Sync + fmt::Debug {
    /// The media type this renderer produces, e.g. `application/hal+json`.
    fn media_type(&self) -> &str;

    /// Renders `payload`.
    fn render(&self, payload: &Payload, ctx: &RenderContext<'_>) -> Document;
}

/// Everything one decoration call reads.
#[derive(Debug, Clone, Copy)]
pub struct RenderContext<'a> {
    /// Registry state for this call
    pub registry: &'a RegistrySnapshot,
    /// Access rules for this call
    pub access: &'a AccessPolicy,
    /// The caller
    pub caller: &'a AccessContext,
    /// Href resolution with the call's path prefix
    pub resolver: &'a PathResolver,
    /// Maximum sub-entity nesting depth
    pub max_depth: usize,
}

/// A link that survived placement and access filtering.
#[derive(Debug, Clone, PartialEq)]
pub struct ResolvedLink<'m> {
    /// The declaration
    pub descriptor: &'m LinkDescriptor,
    /// Prefixed, substituted href
    pub href: String,
}

/// An action that survived placement and access filtering.
#[derive(Debug, Clone, PartialEq)]
pub struct ResolvedAction<'m> {
    /// The declaration
    pub descriptor: &'m ActionDescriptor,
    /// Prefixed, substituted href
    pub href: String,
}

impl<'a> RenderContext<'a> {
    /// A walker over this call's registry snapshot.
    pub fn walker(&self) -> StructuralWalker<'a> {
        StructuralWalker::new(self.registry)
    }

    /// Registered metadata for a class.
    pub fn metadata(&self, class: &str) -> Option<&'a EntityMetadata> {
        self.registry.lookup(class)
    }

    /// Metadata for a top-level collection: `[]Elem` if registered,
    /// otherwise the element class itself.
    pub fn collection_metadata(&self, element_class: Option<&str>) -> Option<&'a EntityMetadata> {
        let element = element_class?;
        self.metadata(&format!("[]{}", element))
            .or_else(|| self.metadata(element))
    }

    /// Classifies a record at `depth`, flattening it once the limit is hit.
    pub fn view<'p>(&self, record: &'p Record, depth: usize) -> RecordView<'p> {
        if depth >= self.max_depth {
            tracing::warn!(
                request_id = self.caller.request_id().unwrap_or_default(),
                class = %record.class,
                max_depth = self.max_depth,
                "depth limit reached, rendering sub-entities as plain data"
            );
            self.walker().flatten_record(record)
        } else {
            self.walker().classify_record(record)
        }
    }

    /// Resolves an href template with the call's prefix.
    pub fn resolve(&self, template: &str, bag: &PropertyBag) -> String {
        self.resolver.resolve(template, bag)
    }

    /// Links of `meta` placed for `membership` and visible to the caller.
    pub fn visible_links<'m>(
        &self,
        meta: &'m EntityMetadata,
        membership: Membership,
        bag: &PropertyBag,
    ) -> Vec<ResolvedLink<'m>> {
        meta.links
            .iter()
            .filter(|link| link.placement.applies_to(membership))
            .filter(|link| {
                self.access.is_visible(
                    &AccessTarget {
                        class: target_class(&link.target_class, meta),
                        method: "GET",
                        path: &link.href_template,
                    },
                    self.caller,
                )
            })
            .map(|link| ResolvedLink {
                descriptor: link,
                href: self.resolve(&link.href_template, bag),
            })
            .collect()
    }

    /// Actions of `meta` placed for `membership` and visible to the caller.
    pub fn visible_actions<'m>(
        &self,
        meta: &'m EntityMetadata,
        membership: Membership,
        bag: &PropertyBag,
    ) -> Vec<ResolvedAction<'m>> {
        meta.actions
            .iter()
            .filter(|action| action.placement.applies_to(membership))
            .filter(|action| {
                self.access.is_visible(
                    &AccessTarget {
                        class: target_class(&action.target_class, meta),
                        method: &action.method,
                        path: &action.href_template,
                    },
                    self.caller,
                )
            })
            .map(|action| ResolvedAction {
                descriptor: action,
                href: self.resolve(&action.href_template, bag),
            })
            .collect()
    }
}

/// Descriptors without an explicit target class point at their owner.
fn target_class<'m>(declared: &'m str, owner: &'m EntityMetadata) -> &'m str {
    if declared.is_empty() {
        &owner.class_name
    } else {
        declared
    }
}

/// Strips media type parameters and lowercases, so
/// `Application/HAL+JSON; charset=utf-8` matches `application/hal+json`.
pub fn normalize_media_type(media_type: &str) -> String {
    media_type
        .split(';')
        .next()
        .unwrap_or_default()
        .trim()
        .to_ascii_lowercase()
}

#[cfg(test)]
pub(crate) mod test_support {
    use crate::access::{AccessContext, AccessFilter, AccessMode, AccessPolicy};
    use crate::path::PathResolver;
    use crate::registry::{MetadataRegistry, RegistrySnapshot};
    use std::sync::Arc;

    use super::RenderContext;

    /// Owns the pieces a [`RenderContext`] borrows.
    pub(crate) struct Fixture {
        pub registry: RegistrySnapshot,
        pub access: Arc<AccessPolicy>,
        pub caller: AccessContext,
        pub resolver: PathResolver,
    }

    impl Fixture {
        pub(crate) fn new(registry: &MetadataRegistry) -> Self {
            Self::with_access(registry, &AccessFilter::new(AccessMode::Scopes))
        }

        pub(crate) fn with_access(registry: &MetadataRegistry, filter: &AccessFilter) -> Self {
            Self {
                registry: registry.snapshot(),
                access: filter.snapshot(),
                caller: AccessContext::anonymous(),
                resolver: PathResolver::new("/api"),
            }
        }

        pub(crate) fn ctx(&self) -> RenderContext<'_> {
            RenderContext {
                registry: &self.registry,
                access: &self.access,
                caller: &self.caller,
                resolver: &self.resolver,
                max_depth: 32,
            }
        }
    }
}
