//! Extended single-entity fetch
//!
//! A base `Get` by id plus one sub-fetch per requested relation. Sub-fetches
//! depend only on the base row and run concurrently.

use futures_util::future::try_join_all;
use serde_json::Value;

use crate::adapter::AdapterResult;
use crate::executor::{DocumentExecutor, Query, RunOptions};
use crate::planner::TableRef;

/// Where the related rows come from
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RelationSource {
    /// Primary-key lookup by the base row's `local_key` value
    ByLocalKey { table: TableRef, local_key: String },
    /// Secondary-index lookup on `foreign_key` by the base row's id
    ByForeignIndex { table: TableRef, foreign_key: String },
}

impl RelationSource {
    pub fn table(&self) -> &TableRef {
        match self {
            RelationSource::ByLocalKey { table, .. } | RelationSource::ByForeignIndex { table, .. } => {
                table
            }
        }
    }
}

/// How the sub-fetch result lands in the base document
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MergeShape {
    /// Object, or null if unresolved
    One,
    /// Array, possibly empty
    Many,
    /// First element of the array; an empty array stays `[]`
    CollapseOne,
}

/// One relation sub-fetch
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RelationFetch {
    pub local_field: String,
    pub source: RelationSource,
    pub shape: MergeShape,
}

impl RelationFetch {
    async fn resolve(
        &self,
        executor: &dyn DocumentExecutor,
        base: &Value,
        options: RunOptions,
    ) -> AdapterResult<(String, Value)> {
        let value = match &self.source {
            RelationSource::ByLocalKey { table, local_key } => match key_string(base.get(local_key)) {
                Some(id) => {
                    let query = Query::Get {
                        table: table.clone(),
                        id,
                    };
                    executor
                        .run(query, options)
                        .await?
                        .into_document()?
                        .unwrap_or(Value::Null)
                }
                None => Value::Null,
            },
            RelationSource::ByForeignIndex { table, foreign_key } => {
                let key = base.get("id").cloned().unwrap_or(Value::Null);
                let query = Query::GetAll {
                    table: table.clone(),
                    index: foreign_key.clone(),
                    key,
                };
                let rows = executor.run(query, options).await?.into_documents()?;
                shape_rows(self.shape, rows)
            }
        };
        Ok((self.local_field.clone(), value))
    }
}

fn key_string(value: Option<&Value>) -> Option<String> {
    match value? {
        Value::String(s) => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        _ => None,
    }
}

fn shape_rows(shape: MergeShape, rows: Vec<Value>) -> Value {
    match shape {
        MergeShape::CollapseOne => match rows.into_iter().next() {
            Some(first) => first,
            None => Value::Array(Vec::new()),
        },
        MergeShape::One => rows.into_iter().next().unwrap_or(Value::Null),
        MergeShape::Many => Value::Array(rows),
    }
}

/// Base lookup plus relation sub-fetches
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExtendedFetch {
    pub table: TableRef,
    pub id: String,
    pub relations: Vec<RelationFetch>,
}

impl ExtendedFetch {
    pub fn new(table: TableRef, id: impl Into<String>) -> Self {
        Self {
            table,
            id: id.into(),
            relations: Vec::new(),
        }
    }

    /// Base table first, then each related table once
    pub fn required_tables(&self) -> Vec<TableRef> {
        let mut tables = vec![self.table.clone()];
        for rel in &self.relations {
            let table = rel.source.table();
            if !tables.contains(table) {
                tables.push(table.clone());
            }
        }
        tables
    }

    /// Foreign-key indexes read by index sub-fetches
    pub fn required_indexes(&self) -> Vec<(TableRef, String)> {
        let mut indexes: Vec<(TableRef, String)> = Vec::new();
        for rel in &self.relations {
            if let RelationSource::ByForeignIndex { table, foreign_key } = &rel.source {
                let entry = (table.clone(), foreign_key.clone());
                if !indexes.contains(&entry) {
                    indexes.push(entry);
                }
            }
        }
        indexes
    }

    /// Runs the fetch. `None` when the base row does not exist.
    pub async fn execute(
        &self,
        executor: &dyn DocumentExecutor,
        options: RunOptions,
    ) -> AdapterResult<Option<Value>> {
        let base = Query::Get {
            table: self.table.clone(),
            id: self.id.clone(),
        };
        let mut doc = match executor.run(base, options).await?.into_document()? {
            Some(doc) => doc,
            None => return Ok(None),
        };

        if self.relations.is_empty() {
            return Ok(Some(doc));
        }

        let merged = try_join_all(
            self.relations
                .iter()
                .map(|rel| rel.resolve(executor, &doc, options)),
        )
        .await?;

        if let Value::Object(map) = &mut doc {
            for (field, value) in merged {
                map.insert(field, value);
            }
        }
        Ok(Some(doc))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_collapse_shapes() {
        assert_eq!(
            shape_rows(MergeShape::CollapseOne, vec![json!({"id": "a"}), json!({"id": "b"})]),
            json!({"id": "a"})
        );
        assert_eq!(shape_rows(MergeShape::CollapseOne, vec![]), json!([]));
        assert_eq!(shape_rows(MergeShape::Many, vec![]), json!([]));
        assert_eq!(shape_rows(MergeShape::One, vec![]), Value::Null);
    }

    #[test]
    fn test_key_string() {
        assert_eq!(key_string(Some(&json!("u1"))), Some("u1".to_string()));
        assert_eq!(key_string(Some(&json!(7))), Some("7".to_string()));
        assert_eq!(key_string(Some(&Value::Null)), None);
        assert_eq!(key_string(None), None);
    }

    #[test]
    fn test_required_tables_dedup() {
        let posts = TableRef::new("test", "posts");
        let mut fetch = ExtendedFetch::new(TableRef::new("test", "users"), "u1");
        for field in ["posts", "latestPost"] {
            fetch.relations.push(RelationFetch {
                local_field: field.into(),
                source: RelationSource::ByForeignIndex {
                    table: posts.clone(),
                    foreign_key: "userId".into(),
                },
                shape: MergeShape::Many,
            });
        }

        assert_eq!(fetch.required_tables().len(), 2);
        assert_eq!(fetch.required_indexes(), vec![(posts, "userId".to_string())]);
    }
}
