//! Web framework integration surface.
//!
//! This module is the boundary between HTTP frameworks and the decoration
//! engine. It contains no framework-specific code; it maps request data into
//! the engine's types:
//!
//! - the caller's already-resolved scopes or role become an
//!   [`AccessContext`](crate::access::AccessContext),
//! - the `Accept` header selects a registered media type,
//! - the mount point of the API becomes the href prefix.
//!
//! Authentication is not performed here. Whatever authenticated the caller
//! upstream hands its result to the [`RequestAdapter`].
//!
//! # Example Flow
//!
//! ```
//! use hypermedia_decorator::web::RequestAdapter;
//! use hypermedia_decorator::{DecorationService, EntityMetadata, LinkDescriptor, Payload, Record};
//!
//! let service = DecorationService::builder().build();
//! service.register(
//!     EntityMetadata::new("Widget", "/widgets").with_link(LinkDescriptor::new("self", "/widgets/{id}")),
//! );
//!
//! let mut request = RequestAdapter::new("req-1");
//! request.add_header("Accept", "application/vnd.siren+json");
//! request.set_path_prefix("/api");
//!
//! let widget = Payload::Record(Record::new("Widget").with_field("id", 7u64));
//! let response = service.decorate_request(&request, widget);
//!
//! assert_eq!(response.media_type.as_deref(), Some("application/vnd.siren+json"));
//! ```

mod adapter;
mod extract;
mod middleware;
mod negotiate;

pub use adapter::RequestAdapter;
pub use extract::ExtractAccess;
pub use middleware::Decorated;
pub use negotiate::negotiate;
