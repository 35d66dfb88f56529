//! ORM-facing adapter
//!
//! `Adapter` implements find, findAll, create, update, updateAll, destroy and
//! destroyAll over a `DocumentExecutor`.
//!
//! # Usage
//!
//! ```ignore
//! let adapter = Adapter::new(AdapterConfig::default(), executor, resources)?;
//! let user = adapter.create(&users, json!({"name": "Ada"}), &OperationOptions::new()).await?;
//! let found = adapter.find(&users, user["id"].as_str().unwrap_or_default(), &OperationOptions::new()).await?;
//! ```

mod errors;
mod operations;
mod options;

pub use errors::{AdapterError, AdapterResult};
pub use operations::Adapter;
pub use options::OperationOptions;
