//! Simulated objects, the live object table, and the object factory.
//!
//! The entity/component machinery that gives an object physics and
//! behavior lives outside this crate. Here an [`Object`] is only what the
//! lifecycle code needs: a unique id and a type name.

use std::collections::{BTreeMap, HashMap};
use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};

use freebooter_protocol::ObjectId;

/// Counter for generating unique object IDs.
static NEXT_OBJECT_ID: AtomicU64 = AtomicU64::new(1);

/// A simulated entity.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Object {
    id: ObjectId,
    kind: String,
}

impl Object {
    /// Creates an object of type `kind` with a fresh id.
    pub fn new(kind: impl Into<String>) -> Self {
        Self {
            id: ObjectId(NEXT_OBJECT_ID.fetch_add(1, Ordering::Relaxed)),
            kind: kind.into(),
        }
    }

    pub fn id(&self) -> ObjectId {
        self.id
    }

    /// The type name the object was created from.
    pub fn kind(&self) -> &str {
        &self.kind
    }
}

// ---------------------------------------------------------------------------
// ObjectTable
// ---------------------------------------------------------------------------

/// The live object table. Owned by the world on the main thread.
#[derive(Debug, Default)]
pub struct ObjectTable {
    objects: HashMap<ObjectId, Object>,
}

impl ObjectTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// Inserts an object. An object with the same id is replaced.
    pub fn add_object(&mut self, object: Object) {
        self.objects.insert(object.id(), object);
    }

    /// Removes and returns the object with `id`.
    pub fn delete_object(&mut self, id: ObjectId) -> Option<Object> {
        self.objects.remove(&id)
    }

    pub fn has_object(&self, id: ObjectId) -> bool {
        self.objects.contains_key(&id)
    }

    pub fn get(&self, id: ObjectId) -> Option<&Object> {
        self.objects.get(&id)
    }

    pub fn len(&self) -> usize {
        self.objects.len()
    }

    pub fn is_empty(&self) -> bool {
        self.objects.is_empty()
    }
}

// ---------------------------------------------------------------------------
// ObjectFactory
// ---------------------------------------------------------------------------

/// Creates objects by type name.
///
/// Injected into the world; the real implementation builds fully
/// equipped entities, tests use a [`CreatorRegistry`].
pub trait ObjectFactory: Send + Sync {
    /// Builds a new object of `type_name`, or `None` if the type is
    /// unknown or construction failed.
    fn create_a(&self, type_name: &str) -> Option<Object>;

    /// Every type name `create_a` accepts.
    fn type_names(&self) -> Vec<String>;
}

/// A named object constructor.
pub type Creator = Box<dyn Fn() -> Object + Send + Sync>;

/// An [`ObjectFactory`] assembled from creator closures at setup.
#[derive(Default)]
pub struct CreatorRegistry {
    creators: BTreeMap<String, Creator>,
}

impl CreatorRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers `creator` under `type_name`. A later registration for
    /// the same name replaces the earlier one.
    pub fn register_creator(
        &mut self,
        type_name: impl Into<String>,
        creator: impl Fn() -> Object + Send + Sync + 'static,
    ) -> &mut Self {
        let type_name = type_name.into();
        tracing::debug!(%type_name, "object creator registered");
        self.creators.insert(type_name, Box::new(creator));
        self
    }

    /// Registers a creator that makes plain objects of `type_name`.
    pub fn register_type(&mut self, type_name: impl Into<String>) -> &mut Self {
        let type_name = type_name.into();
        let kind = type_name.clone();
        self.register_creator(type_name, move || Object::new(kind.clone()))
    }
}

impl ObjectFactory for CreatorRegistry {
    fn create_a(&self, type_name: &str) -> Option<Object> {
        self.creators.get(type_name).map(|create| create())
    }

    fn type_names(&self) -> Vec<String> {
        self.creators.keys().cloned().collect()
    }
}

impl fmt::Debug for CreatorRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CreatorRegistry")
            .field("types", &self.type_names())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_object_new_assigns_unique_ids() {
        let a = Object::new("ship");
        let b = Object::new("ship");
        assert_ne!(a.id(), b.id());
        assert_eq!(a.kind(), "ship");
    }

    #[test]
    fn test_object_table_add_and_delete() {
        let mut table = ObjectTable::new();
        let object = Object::new("ship");
        let id = object.id();

        table.add_object(object);
        assert!(table.has_object(id));
        assert_eq!(table.len(), 1);

        assert_eq!(table.delete_object(id).map(|o| o.id()), Some(id));
        assert!(!table.has_object(id));
        assert!(table.is_empty());
    }

    #[test]
    fn test_object_table_delete_unknown_returns_none() {
        let mut table = ObjectTable::new();
        assert!(table.delete_object(ObjectId(999_999)).is_none());
    }

    #[test]
    fn test_creator_registry_unknown_type_returns_none() {
        let mut registry = CreatorRegistry::new();
        registry.register_type("ship");

        assert!(registry.create_a("ship").is_some());
        assert!(registry.create_a("duck").is_none());
    }

    #[test]
    fn test_creator_registry_type_names_sorted() {
        let mut registry = CreatorRegistry::new();
        registry.register_type("ship").register_type("duck");

        assert_eq!(registry.type_names(), vec!["duck", "ship"]);
    }

    #[test]
    fn test_creator_registry_custom_creator_is_called() {
        let mut registry = CreatorRegistry::new();
        registry.register_creator("giant", || Object::new("giant_ship"));

        assert_eq!(registry.create_a("giant").unwrap().kind(), "giant_ship");
    }
}
