//! Builds the extended fetch for a `find` with requested relations

use super::fetch::{ExtendedFetch, MergeShape, RelationFetch, RelationSource};
use crate::adapter::{AdapterError, AdapterResult, OperationOptions};
use crate::planner::QueryPlanner;
use crate::resource::{HasOneKey, RelationKind, ResourceDescriptor, ResourceProvider};

/// Extends the base lookup of `id` with one sub-fetch per relation named in
/// `options.with`, in the resource's declaration order.
pub fn merge_relations(
    resource: &ResourceDescriptor,
    provider: &dyn ResourceProvider,
    planner: &QueryPlanner,
    id: &str,
    options: &OperationOptions,
) -> AdapterResult<ExtendedFetch> {
    let db = options.db();
    let mut fetch = ExtendedFetch::new(planner.select_table(resource, db), id);

    for relation in resource.requested_relations(&options.with) {
        let related = provider
            .related_resource(&relation.related)
            .ok_or_else(|| AdapterError::UnknownRelatedResource(relation.related.clone()))?;
        let table = planner.select_table(related, db);

        let (source, shape) = match &relation.kind {
            RelationKind::BelongsTo { local_key }
            | RelationKind::HasOne(HasOneKey::Local(local_key)) => (
                RelationSource::ByLocalKey {
                    table,
                    local_key: local_key.clone(),
                },
                MergeShape::One,
            ),
            RelationKind::HasMany { foreign_key } => (
                RelationSource::ByForeignIndex {
                    table,
                    foreign_key: foreign_key.clone(),
                },
                MergeShape::Many,
            ),
            RelationKind::HasOne(HasOneKey::Foreign(foreign_key)) => (
                RelationSource::ByForeignIndex {
                    table,
                    foreign_key: foreign_key.clone(),
                },
                MergeShape::CollapseOne,
            ),
        };

        fetch.relations.push(RelationFetch {
            local_field: relation.local_field.clone(),
            source,
            shape,
        });
    }

    Ok(fetch)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::planner::TableRef;
    use crate::resource::{RelationDescriptor, ResourceRegistry};

    fn registry() -> ResourceRegistry {
        ResourceRegistry::new()
            .with(ResourceDescriptor::new("user"))
            .with(ResourceDescriptor::new("post"))
            .with(ResourceDescriptor::new("profile"))
    }

    fn user() -> ResourceDescriptor {
        ResourceDescriptor::new("user")
            .with_relation(RelationDescriptor::has_many("post", "posts", "userId"))
            .with_relation(RelationDescriptor::has_one_by_foreign_key(
                "profile", "profile", "userId",
            ))
    }

    #[test]
    fn test_only_requested_relations() {
        let planner = QueryPlanner::new("test");
        let options = OperationOptions::new().with_relation("post");

        let fetch = merge_relations(&user(), &registry(), &planner, "u1", &options).unwrap();

        assert_eq!(fetch.relations.len(), 1);
        assert_eq!(fetch.relations[0].local_field, "posts");
        assert_eq!(fetch.relations[0].shape, MergeShape::Many);
    }

    #[test]
    fn test_has_one_by_foreign_key_collapses() {
        let planner = QueryPlanner::new("test");
        let options = OperationOptions::new().with_relation("profile");

        let fetch = merge_relations(&user(), &registry(), &planner, "u1", &options).unwrap();

        assert_eq!(fetch.relations[0].shape, MergeShape::CollapseOne);
        assert_eq!(
            fetch.required_indexes(),
            vec![(TableRef::new("test", "profile"), "userId".to_string())]
        );
    }

    #[test]
    fn test_belongs_to_uses_local_key() {
        let planner = QueryPlanner::new("test");
        let post = ResourceDescriptor::new("post")
            .with_relation(RelationDescriptor::belongs_to("user", "user", "userId"));
        let options = OperationOptions::new().with_relation("user").in_db("blog");

        let fetch = merge_relations(&post, &registry(), &planner, "p1", &options).unwrap();

        assert_eq!(fetch.table, TableRef::new("blog", "post"));
        assert_eq!(
            fetch.relations[0].source,
            RelationSource::ByLocalKey {
                table: TableRef::new("blog", "user"),
                local_key: "userId".into(),
            }
        );
        assert!(fetch.required_indexes().is_empty());
    }

    #[test]
    fn test_unknown_related_resource() {
        let planner = QueryPlanner::new("test");
        let comment = ResourceDescriptor::new("comment")
            .with_relation(RelationDescriptor::belongs_to("ghost", "ghost", "ghostId"));
        let options = OperationOptions::new().with_relation("ghost");

        let err = merge_relations(&comment, &registry(), &planner, "c1", &options).unwrap_err();
        assert_eq!(err, AdapterError::UnknownRelatedResource("ghost".into()));
    }
}
