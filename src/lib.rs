//! aerodoc - ORM query translation and persistence adapter for a document
//! database
//!
//! Translates ORM filter parameters into executor query plans, provisions
//! databases, tables and indexes on first use, and merges related resources
//! into single-entity fetches.

pub mod adapter;
pub mod config;
pub mod executor;
pub mod observability;
pub mod planner;
pub mod provision;
pub mod relations;
pub mod resource;

pub use adapter::{Adapter, AdapterError, AdapterResult, OperationOptions};
pub use config::AdapterConfig;
pub use executor::{DocumentExecutor, MemoryExecutor};
pub use resource::{RelationDescriptor, ResourceDescriptor, ResourceProvider, ResourceRegistry};
