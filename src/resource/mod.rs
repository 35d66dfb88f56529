//! Resource definitions
//!
//! The ORM layer owns resource definitions; the adapter only reads them.
//! `ResourceProvider` is the lookup seam used when merging relations.

mod descriptor;

use std::collections::HashMap;

pub use descriptor::{HasOneKey, RelationDescriptor, RelationKind, ResourceDescriptor};

/// Lookup of resources by name
pub trait ResourceProvider: Send + Sync {
    /// Returns the resource registered under `name`
    fn related_resource(&self, name: &str) -> Option<&ResourceDescriptor>;
}

/// HashMap-backed resource provider
#[derive(Debug, Clone, Default)]
pub struct ResourceRegistry {
    resources: HashMap<String, ResourceDescriptor>,
}

impl ResourceRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers a resource, replacing any previous one with the same name
    pub fn register(&mut self, resource: ResourceDescriptor) {
        self.resources.insert(resource.name.clone(), resource);
    }

    /// Builder-style register
    pub fn with(mut self, resource: ResourceDescriptor) -> Self {
        self.register(resource);
        self
    }

    /// Returns the resource registered under `name`
    pub fn get(&self, name: &str) -> Option<&ResourceDescriptor> {
        self.resources.get(name)
    }

    pub fn len(&self) -> usize {
        self.resources.len()
    }

    pub fn is_empty(&self) -> bool {
        self.resources.is_empty()
    }
}

impl ResourceProvider for ResourceRegistry {
    fn related_resource(&self, name: &str) -> Option<&ResourceDescriptor> {
        self.get(name)
    }
}
