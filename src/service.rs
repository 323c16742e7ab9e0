//! The decoration entry point.

use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

use serde::Serialize;

use crate::access::{AccessContext, AccessFilter, AccessMode};
use crate::config::{DecoratorConfig, DEFAULT_MAX_DEPTH};
use crate::definition::HypermediaDefinition;
use crate::error::Error;
use crate::introspect::Hypermedia;
use crate::metadata::EntityMetadata;
use crate::path::PathResolver;
use crate::payload::{to_payload, type_class, Payload};
use crate::registry::MetadataRegistry;
use crate::render::{
    normalize_media_type, CollectionRenderer, Document, FormatRenderer, HalRenderer, RenderContext,
    SirenRenderer,
};

/// Owns a registry, access rules and renderers, and decorates payloads.
///
/// Each service is independent: two services never share registrations or
/// access rules unless they were built around the same
/// [`MetadataRegistry`].
///
/// # Examples
///
/// ```
/// use hypermedia_decorator::{
///     access::AccessContext, DecorationService, EntityMetadata, LinkDescriptor, Payload, Record,
/// };
///
/// let service = DecorationService::builder().build();
/// service.register(
///     EntityMetadata::new("Widget", "/widgets").with_link(LinkDescriptor::new("self", "/{id}")),
/// );
///
/// let widget = Payload::Record(Record::new("Widget").with_field("id", 7u64));
/// let doc = service.decorate("application/hal+json", "/api", widget, &AccessContext::anonymous());
///
/// let json = serde_json::to_value(&doc).unwrap();
/// assert_eq!(json["_links"]["self"]["href"], "/api/7");
/// ```
pub struct DecorationService {
    registry: Arc<MetadataRegistry>,
    access: AccessFilter,
    renderers: HashMap<String, Arc<dyn FormatRenderer>>,
    max_depth: usize,
}

impl fmt::Debug for DecorationService {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DecorationService")
            .field("registry", &self.registry)
            .field("access", &self.access)
            .field("media_types", &self.media_types())
            .field("max_depth", &self.max_depth)
            .finish()
    }
}

impl Default for DecorationService {
    fn default() -> Self {
        Self::builder().build()
    }
}

impl DecorationService {
    /// Starts building a service with the built-in renderers.
    pub fn builder() -> DecorationServiceBuilder {
        DecorationServiceBuilder::new()
    }

    /// Builds a service from configuration.
    pub fn from_config(config: &DecoratorConfig) -> Self {
        let service = Self::builder()
            .access_mode(config.access_mode)
            .max_depth(config.max_depth)
            .build();
        for rule in &config.access_rules {
            service.add_access_rule(&rule.method, &rule.path, rule.scopes.iter().cloned());
        }
        for grant in &config.role_permissions {
            service.add_role_permission(&grant.resource, &grant.role, &grant.permissions);
        }
        if config.security_enabled {
            service.enable_security();
        }
        service
    }

    /// Decorates `payload` for `media_type`.
    ///
    /// Unknown media types return the payload unchanged. Decoration never
    /// fails; see the crate docs for how unknown classes, unresolved
    /// placeholders and denied links are handled.
    pub fn decorate(
        &self,
        media_type: &str,
        path_prefix: &str,
        payload: Payload,
        caller: &AccessContext,
    ) -> Document {
        let _span = tracing::debug_span!(
            "decorate",
            media_type,
            request_id = caller.request_id().unwrap_or_default()
        )
        .entered();

        let Some(renderer) = self.renderer(media_type) else {
            tracing::debug!("no renderer for media type, passing payload through");
            return Document::Payload(payload);
        };

        let registry = self.registry.snapshot();
        let access = self.access.snapshot();
        let resolver = PathResolver::new(path_prefix);
        let ctx = RenderContext {
            registry: &registry,
            access: &access,
            caller,
            resolver: &resolver,
            max_depth: self.max_depth,
        };
        renderer.render(&payload, &ctx)
    }

    /// Captures any `Serialize` value and decorates it.
    ///
    /// A registered struct with `#[serde(flatten)]` fields is captured by
    /// serde as a map. When the top-level value is such a map and `T`'s own
    /// name is a registered class, the map is decorated as a record of that
    /// class. Any other map is treated as a collection.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Payload`] if the value cannot be captured.
    pub fn decorate_value<T: Serialize + ?Sized>(
        &self,
        media_type: &str,
        path_prefix: &str,
        value: &T,
        caller: &AccessContext,
    ) -> Result<Document, Error> {
        let mut payload = to_payload(value)?;
        if matches!(payload, Payload::Map(_)) {
            let class = type_class::<T>();
            if self.registry.contains(class) {
                tracing::debug!(class, "captured map decorated as a registered record");
                payload = payload.into_record(class);
            }
        }
        Ok(self.decorate(media_type, path_prefix, payload, caller))
    }

    /// The renderer registered for a media type, ignoring parameters and case.
    pub fn renderer(&self, media_type: &str) -> Option<&dyn FormatRenderer> {
        self.renderers
            .get(&normalize_media_type(media_type))
            .map(|r| r.as_ref())
    }

    /// Registered media types, sorted.
    pub fn media_types(&self) -> Vec<&str> {
        let mut types: Vec<&str> = self.renderers.keys().map(String::as_str).collect();
        types.sort_unstable();
        types
    }

    /// The shared registry.
    pub fn registry(&self) -> &Arc<MetadataRegistry> {
        &self.registry
    }

    /// The access filter.
    pub fn access(&self) -> &AccessFilter {
        &self.access
    }

    /// Maximum sub-entity nesting depth.
    pub fn max_depth(&self) -> usize {
        self.max_depth
    }

    /// See [`MetadataRegistry::register`].
    pub fn register(&self, metadata: EntityMetadata) {
        self.registry.register(metadata);
    }

    /// See [`MetadataRegistry::unregister`].
    pub fn unregister(&self, class_name: &str) {
        self.registry.unregister(class_name);
    }

    /// See [`MetadataRegistry::register_type`].
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidShape`] if `T` does not describe a valid entity.
    pub fn register_type<T: Hypermedia>(&self) -> Result<(), Error> {
        self.registry.register_type::<T>()
    }

    /// See [`MetadataRegistry::load_definition`].
    pub fn load_definition(&self, definition: &HypermediaDefinition) {
        self.registry.load_definition(definition);
    }

    /// See [`AccessFilter::add_access_rule`].
    pub fn add_access_rule<I, S>(&self, method: &str, path: &str, scopes: I)
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.access.add_access_rule(method, path, scopes);
    }

    /// See [`AccessFilter::add_role_permission`].
    pub fn add_role_permission(&self, resource: &str, role: &str, permissions: &str) {
        self.access.add_role_permission(resource, role, permissions);
    }

    /// See [`AccessFilter::enable_security`].
    pub fn enable_security(&self) {
        self.access.enable_security();
    }
}

/// Builder for [`DecorationService`].
pub struct DecorationServiceBuilder {
    registry: Option<Arc<MetadataRegistry>>,
    access_mode: AccessMode,
    max_depth: usize,
    renderers: HashMap<String, Arc<dyn FormatRenderer>>,
}

impl DecorationServiceBuilder {
    fn new() -> Self {
        let builder = Self {
            registry: None,
            access_mode: AccessMode::default(),
            max_depth: DEFAULT_MAX_DEPTH,
            renderers: HashMap::new(),
        };
        builder
            .with_builtin(HalRenderer)
            .with_builtin(SirenRenderer)
            .with_builtin(CollectionRenderer)
    }

    fn with_builtin(self, renderer: impl FormatRenderer + 'static) -> Self {
        let media_type = renderer.media_type().to_owned();
        self.renderer(&media_type, renderer)
    }

    /// Shares an existing registry instead of creating a new one.
    pub fn registry(mut self, registry: Arc<MetadataRegistry>) -> Self {
        self.registry = Some(registry);
        self
    }

    /// Selects the access strategy.
    pub fn access_mode(mut self, mode: AccessMode) -> Self {
        self.access_mode = mode;
        self
    }

    /// Limits sub-entity nesting depth.
    pub fn max_depth(mut self, max_depth: usize) -> Self {
        self.max_depth = max_depth;
        self
    }

    /// Registers a renderer for a media type, replacing any existing one.
    pub fn renderer(mut self, media_type: &str, renderer: impl FormatRenderer + 'static) -> Self {
        self.renderers
            .insert(normalize_media_type(media_type), Arc::new(renderer));
        self
    }

    /// Finishes the service.
    pub fn build(self) -> DecorationService {
        DecorationService {
            registry: self.registry.unwrap_or_default(),
            access: AccessFilter::new(self.access_mode),
            renderers: self.renderers,
            max_depth: self.max_depth,
        }
    }
}
