//! Class-name to metadata registry.
//!
//! Writers (registration, typically at startup) copy the map, change the
//! copy and swap it in under the write lock. Readers take an [`Arc`] snapshot
//! under the read lock and keep it for the whole decoration call, so one call
//! always sees one consistent registry state.

use std::collections::HashMap;
use std::sync::Arc;

use parking_lot::RwLock;

use crate::definition::HypermediaDefinition;
use crate::error::Error;
use crate::introspect::{resolve_shape, Hypermedia, TypeShape};
use crate::metadata::EntityMetadata;

type EntityMap = HashMap<String, Arc<EntityMetadata>>;

/// Shared, long-lived registry of entity metadata.
///
/// # Examples
///
/// ```
/// use hypermedia_decorator::{EntityMetadata, MetadataRegistry};
///
/// let registry = MetadataRegistry::new();
/// registry.register(EntityMetadata::new("Widget", "/widgets"));
///
/// assert!(registry.lookup("Widget").is_some());
/// assert!(registry.lookup("Gadget").is_none());
///
/// registry.unregister("Widget");
/// assert!(registry.lookup("Widget").is_none());
/// ```
#[derive(Debug, Default)]
pub struct MetadataRegistry {
    entities: RwLock<Arc<EntityMap>>,
}

impl MetadataRegistry {
    /// Creates an empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers metadata under its class name, replacing any prior entry.
    pub fn register(&self, metadata: EntityMetadata) {
        tracing::debug!(
            class = %metadata.class_name,
            links = metadata.links.len(),
            actions = metadata.actions.len(),
            curies = metadata.curies.len(),
            "registering entity"
        );
        self.update(|map| {
            map.insert(metadata.class_name.clone(), Arc::new(metadata));
        });
    }

    /// Removes a class. Unknown classes are ignored.
    pub fn unregister(&self, class_name: &str) {
        tracing::debug!(class = class_name, "unregistering entity");
        self.update(|map| {
            map.remove(class_name);
        });
    }

    /// Looks up a class. `None` means "not an entity", which is a normal outcome.
    pub fn lookup(&self, class_name: &str) -> Option<Arc<EntityMetadata>> {
        self.entities.read().get(class_name).cloned()
    }

    /// Returns true if the class is registered.
    pub fn contains(&self, class_name: &str) -> bool {
        self.entities.read().contains_key(class_name)
    }

    /// Number of registered classes.
    pub fn len(&self) -> usize {
        self.entities.read().len()
    }

    /// Returns true if nothing is registered.
    pub fn is_empty(&self) -> bool {
        self.entities.read().is_empty()
    }

    /// Bulk-registers every class of a definition document in one swap.
    pub fn load_definition(&self, definition: &HypermediaDefinition) {
        let metas = definition.to_metadata();
        tracing::debug!(classes = metas.len(), "loading hypermedia definition");
        self.update(|map| {
            for meta in metas {
                map.insert(meta.class_name.clone(), Arc::new(meta));
            }
        });
    }

    /// Registers a type through its self-described shape.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidShape`] without registering anything if the
    /// type is not a record or lacks an entity marker field.
    pub fn register_type<T: Hypermedia>(&self) -> Result<(), Error> {
        self.register_shape(&T::shape())
    }

    /// Registers a shape.
    ///
    /// # Errors
    ///
    /// See [`register_type`](Self::register_type).
    pub fn register_shape(&self, shape: &TypeShape) -> Result<(), Error> {
        let metadata = resolve_shape(shape)?;
        self.register(metadata);
        Ok(())
    }

    /// Returns an immutable view of the registry as it is right now.
    pub fn snapshot(&self) -> RegistrySnapshot {
        RegistrySnapshot {
            entities: Arc::clone(&*self.entities.read()),
        }
    }

    fn update(&self, change: impl FnOnce(&mut EntityMap)) {
        let mut guard = self.entities.write();
        let mut next = (**guard).clone();
        change(&mut next);
        *guard = Arc::new(next);
    }
}

/// An immutable registry state shared by one decoration call.
#[derive(Debug, Clone, Default)]
pub struct RegistrySnapshot {
    entities: Arc<EntityMap>,
}

impl RegistrySnapshot {
    /// Looks up a class.
    pub fn lookup(&self, class_name: &str) -> Option<&EntityMetadata> {
        self.entities.get(class_name).map(Arc::as_ref)
    }

    /// Returns true if the class is registered.
    pub fn is_entity(&self, class_name: &str) -> bool {
        self.entities.contains_key(class_name)
    }

    /// Sorted class names; mostly useful for diagnostics and tests.
    pub fn class_names(&self) -> Vec<&str> {
        let mut names: Vec<&str> = self.entities.keys().map(String::as_str).collect();
        names.sort_unstable();
        names
    }
}
