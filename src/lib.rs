//! Hypermedia decoration for arbitrary API response payloads.
//!
//! This crate augments plain response data with links, actions and embedded
//! sub-resources so clients can navigate a resource graph without
//! out-of-band documentation. One call supports several competing
//! conventions:
//! - **HAL** (`application/hal+json`): `_links`, `_embedded` and the properties
//! - **Siren** (`application/vnd.siren+json`): `class`, `properties`, `entities`, `actions`, `links`
//! - **Collection+JSON** (`application/vnd.collection+json`), partial: `version`, `href`, `links`, `items`
//!
//! # Core Types
//!
//! - [`MetadataRegistry`]: class name to [`EntityMetadata`], shared across calls
//! - [`PathResolver`]: fills `{field}` and `{field+N}` placeholders in hrefs
//! - [`access::AccessFilter`]: hides links and actions the caller may not use
//! - [`StructuralWalker`]: splits payloads into properties and sub-entities
//! - [`FormatRenderer`]: one implementation per media type
//! - [`DecorationService`]: the entry point that ties them together
//!
//! Decoration never fails. Unknown media types pass the payload through,
//! unregistered classes are plain data, unresolved placeholders stay in the
//! href and denied links are left out.
//!
//! # Examples
//!
//! ```
//! use hypermedia_decorator::{
//!     access::AccessContext, DecorationService, EntityMetadata, LinkDescriptor,
//! };
//! use serde::Serialize;
//!
//! #[derive(Serialize)]
//! struct Widget {
//!     id: u32,
//!     name: String,
//! }
//!
//! let service = DecorationService::builder().build();
//! service.register(
//!     EntityMetadata::new("Widget", "/widgets").with_link(LinkDescriptor::new("self", "/widgets/{id}")),
//! );
//!
//! let doc = service
//!     .decorate_value(
//!         "application/vnd.siren+json",
//!         "/api",
//!         &Widget { id: 7, name: "gear".into() },
//!         &AccessContext::anonymous(),
//!     )
//!     .unwrap();
//!
//! let json = serde_json::to_value(&doc).unwrap();
//! assert_eq!(json["class"], "Widget");
//! assert_eq!(json["links"][0]["href"], "/api/widgets/7");
//! ```

#![forbid(unsafe_code)]
#![warn(missing_docs)]

pub mod access;
mod config;
mod definition;
mod error;
mod introspect;
mod metadata;
mod path;
mod payload;
mod registry;
mod render;
mod service;
mod walker;
pub mod web;

pub use config::{AccessRuleConfig, DecoratorConfig, RolePermissionConfig, DEFAULT_MAX_DEPTH};
pub use definition::{
    ActionDefinition, ClassDefinition, HypermediaDefinition, LinkDefinition, ResourceDefinition,
};
pub use error::{Error, ShapeViolation};
pub use introspect::{
    resolve_shape, Action, Curie, EntityMarker, FieldRole, FieldShape, Hypermedia, Link, Tags,
    TypeShape,
};
pub use metadata::{
    ActionDescriptor, CurieDescriptor, EntityMetadata, FieldKind, LinkDescriptor, Membership,
    Placement,
};
pub use path::{resolve, substitute, PathResolver, INVALID_VALUE};
pub use payload::{
    to_payload, to_payload_with_limit, to_record, Payload, PayloadError, PropertyBag, Record,
    Scalar, DEFAULT_CAPTURE_DEPTH,
};
pub use registry::{MetadataRegistry, RegistrySnapshot};
pub use render::{
    normalize_media_type, CollectionBody, CollectionDocument, CollectionItem, CollectionLink,
    CollectionRenderer, DataField, Document, FormatRenderer, HalCurie, HalEmbedded, HalLink,
    HalLinkEntry, HalMember, HalRenderer, HalResource, RenderContext, ResolvedAction,
    ResolvedLink, SirenAction, SirenDocument, SirenEntity, SirenLink, SirenRenderer,
    COLLECTION_JSON, HAL_JSON, SIREN_JSON,
};
pub use service::{DecorationService, DecorationServiceBuilder};
pub use walker::{
    CollectionView, RecordView, StructuralWalker, SubEntity, SubEntityValue, Traversal,
};
