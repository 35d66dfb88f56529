//! Relation merging for single-entity fetches
//!
//! | kind                  | sub-fetch                          | merged as         |
//! |-----------------------|------------------------------------|-------------------|
//! | belongsTo             | `Get` by local key                 | object or null    |
//! | hasOne (local key)    | `Get` by local key                 | object or null    |
//! | hasMany               | `GetAll` on foreign-key index      | array             |
//! | hasOne (foreign key)  | `GetAll` on foreign-key index      | first row or `[]` |

mod fetch;
mod merger;

pub use fetch::{ExtendedFetch, MergeShape, RelationFetch, RelationSource};
pub use merger::merge_relations;
