//! Relation Merge Tests
//!
//! Tests for relation merging on single-entity fetches:
//! - belongsTo merges an object, or null when unresolved
//! - hasOne by local key behaves like belongsTo
//! - hasMany merges an array read through the foreign-key index
//! - hasOne by foreign key collapses to the first row, or stays []
//! - Only relations named in `with` are merged
//! - findAll never merges relations

use std::sync::Arc;

use aerodoc::executor::MemoryExecutor;
use aerodoc::planner::TableRef;
use aerodoc::provision::ProvisionStatus;
use aerodoc::{
    Adapter, AdapterConfig, AdapterError, OperationOptions, RelationDescriptor,
    ResourceDescriptor, ResourceRegistry,
};
use futures_util::future::join_all;
use serde_json::json;

// =============================================================================
// Helper Functions
// =============================================================================

fn user() -> ResourceDescriptor {
    ResourceDescriptor::new("user")
        .with_relation(RelationDescriptor::has_many("post", "posts", "userId"))
        .with_relation(RelationDescriptor::has_one_by_foreign_key(
            "profile", "profile", "userId",
        ))
}

fn post() -> ResourceDescriptor {
    ResourceDescriptor::new("post")
        .with_relation(RelationDescriptor::belongs_to("user", "author", "userId"))
}

fn profile() -> ResourceDescriptor {
    ResourceDescriptor::new("profile")
}

fn team() -> ResourceDescriptor {
    ResourceDescriptor::new("team").with_relation(RelationDescriptor::has_one_by_local_key(
        "profile",
        "captain",
        "captainProfileId",
    ))
}

fn seed_teams(exec: &MemoryExecutor) {
    exec.seed(
        &TableRef::new("test", "team"),
        vec![
            json!({"id": "t1", "name": "Red", "captainProfileId": "pr1"}),
            json!({"id": "t2", "name": "Blue", "captainProfileId": null}),
            json!({"id": "t3", "name": "Green"}),
            json!({"id": "t4", "name": "Gray", "captainProfileId": "gone"}),
        ],
    )
    .unwrap();
}

fn setup() -> (Arc<MemoryExecutor>, Adapter) {
    let exec = Arc::new(MemoryExecutor::new());
    let resources = Arc::new(
        ResourceRegistry::new()
            .with(user())
            .with(post())
            .with(profile()),
    );
    let adapter = Adapter::new(AdapterConfig::default(), exec.clone(), resources).unwrap();

    exec.seed(
        &TableRef::new("test", "user"),
        vec![
            json!({"id": "u1", "name": "Ada"}),
            json!({"id": "u2", "name": "Grace"}),
        ],
    )
    .unwrap();
    exec.seed(
        &TableRef::new("test", "post"),
        vec![
            json!({"id": "p1", "title": "Engines", "userId": "u1"}),
            json!({"id": "p2", "title": "Notes", "userId": "u1"}),
            json!({"id": "p3", "title": "Orphan", "userId": null}),
        ],
    )
    .unwrap();
    exec.seed(
        &TableRef::new("test", "profile"),
        vec![json!({"id": "pr1", "bio": "Analyst", "userId": "u1"})],
    )
    .unwrap();

    (exec, adapter)
}

fn with(names: &[&str]) -> OperationOptions {
    names
        .iter()
        .fold(OperationOptions::new(), |opts, name| opts.with_relation(*name))
}

// =============================================================================
// belongsTo Tests
// =============================================================================

/// A post fetched with its user carries the user object under the local field.
#[tokio::test]
async fn test_belongs_to_merges_object() {
    let (_exec, adapter) = setup();

    let doc = adapter.find(&post(), "p1", &with(&["user"])).await.unwrap();

    assert_eq!(doc["title"], "Engines");
    assert_eq!(doc["author"], json!({"id": "u1", "name": "Ada"}));
}

/// A relation may be requested by its local field name.
#[tokio::test]
async fn test_with_matches_local_field() {
    let (_exec, adapter) = setup();

    let doc = adapter.find(&post(), "p2", &with(&["author"])).await.unwrap();
    assert_eq!(doc["author"]["name"], "Ada");
}

/// A null local key merges null.
#[tokio::test]
async fn test_belongs_to_unresolved_is_null() {
    let (_exec, adapter) = setup();

    let doc = adapter.find(&post(), "p3", &with(&["user"])).await.unwrap();
    assert!(doc["author"].is_null());
    assert!(doc.as_object().unwrap().contains_key("author"));
}

/// A post created through the adapter merges the created user under `user`.
#[tokio::test]
async fn test_created_post_merges_created_user() {
    let (_exec, adapter) = setup();
    let post_with_user = ResourceDescriptor::new("post")
        .with_relation(RelationDescriptor::belongs_to("user", "user", "userId"));
    let options = OperationOptions::new();

    let created_user = adapter
        .create(&user(), json!({"name": "Linus"}), &options)
        .await
        .unwrap();
    let created_post = adapter
        .create(
            &post_with_user,
            json!({"title": "Kernels", "userId": created_user["id"].clone()}),
            &options,
        )
        .await
        .unwrap();
    let post_id = created_post["id"].as_str().unwrap();

    let doc = adapter
        .find(&post_with_user, post_id, &with(&["user"]))
        .await
        .unwrap();

    assert_eq!(doc["title"], "Kernels");
    assert_eq!(doc["user"], created_user);
}

// =============================================================================
// hasMany / hasOne Tests
// =============================================================================

/// hasMany merges every row pointing back at the base row.
#[tokio::test]
async fn test_has_many_merges_array() {
    let (_exec, adapter) = setup();

    let doc = adapter.find(&user(), "u1", &with(&["post"])).await.unwrap();
    let titles: Vec<_> = doc["posts"]
        .as_array()
        .unwrap()
        .iter()
        .map(|p| p["title"].as_str().unwrap())
        .collect();
    assert_eq!(titles, vec!["Engines", "Notes"]);

    let lonely = adapter.find(&user(), "u2", &with(&["post"])).await.unwrap();
    assert_eq!(lonely["posts"], json!([]));
}

/// hasOne by foreign key collapses a single row to an object.
#[tokio::test]
async fn test_has_one_collapses_single_row() {
    let (_exec, adapter) = setup();

    let doc = adapter.find(&user(), "u1", &with(&["profile"])).await.unwrap();
    assert_eq!(doc["profile"]["bio"], "Analyst");
}

/// hasOne by foreign key with no rows stays an empty array.
#[tokio::test]
async fn test_has_one_without_rows_stays_empty_array() {
    let (_exec, adapter) = setup();

    let doc = adapter.find(&user(), "u2", &with(&["profile"])).await.unwrap();
    assert_eq!(doc["profile"], json!([]));
}

/// hasOne by local key reads the related row by primary key.
#[tokio::test]
async fn test_has_one_by_local_key_merges_object() {
    let (exec, adapter) = setup();
    seed_teams(&exec);

    let doc = adapter.find(&team(), "t1", &with(&["captain"])).await.unwrap();

    assert_eq!(doc["captain"], json!({"id": "pr1", "bio": "Analyst", "userId": "u1"}));
    assert_eq!(exec.provision_count("index"), 0);
}

/// hasOne by local key with a null or missing key merges null without a lookup.
#[tokio::test]
async fn test_has_one_by_local_key_unresolved_is_null() {
    let (exec, adapter) = setup();
    seed_teams(&exec);

    for id in ["t2", "t3"] {
        let before = exec.queries_run();
        let doc = adapter.find(&team(), id, &with(&["profile"])).await.unwrap();

        assert!(doc["captain"].is_null());
        assert!(doc.as_object().unwrap().contains_key("captain"));
        // Only the base row was read
        assert_eq!(exec.queries_run() - before, 1);
    }
}

/// A dangling local key merges null.
#[tokio::test]
async fn test_has_one_by_local_key_dangling_is_null() {
    let (exec, adapter) = setup();
    seed_teams(&exec);

    let doc = adapter.find(&team(), "t4", &with(&["captain"])).await.unwrap();
    assert!(doc["captain"].is_null());
}

/// Foreign-key indexes are created and ready before they are read.
#[tokio::test]
async fn test_index_provisioned_before_fetch() {
    let (exec, adapter) = setup();

    adapter
        .find(&user(), "u1", &with(&["post", "profile"]))
        .await
        .unwrap();

    let post_table = TableRef::new("test", "post");
    assert_eq!(
        adapter.provisioner().registry().index_status(&post_table, "userId"),
        ProvisionStatus::Ready
    );
    assert_eq!(exec.provision_count("index"), 2);
    assert_eq!(exec.provision_count("index_wait"), 2);
}

/// Concurrent finds share one index creation.
#[tokio::test]
async fn test_concurrent_finds_create_index_once() {
    let (exec, adapter) = setup();
    let options = with(&["post"]);
    let resource = user();

    let results = join_all((0..8).map(|_| adapter.find(&resource, "u1", &options))).await;

    assert!(results.iter().all(Result::is_ok));
    assert_eq!(exec.provision_count("index"), 1);
}

// =============================================================================
// Scope Tests
// =============================================================================

/// Relations not named in `with` are left out.
#[tokio::test]
async fn test_unrequested_relations_skipped() {
    let (exec, adapter) = setup();

    let doc = adapter.find(&user(), "u1", &OperationOptions::new()).await.unwrap();

    assert!(doc.get("posts").is_none());
    assert!(doc.get("profile").is_none());
    assert_eq!(exec.provision_count("index"), 0);
}

/// findAll ignores `with`.
#[tokio::test]
async fn test_find_all_does_not_merge() {
    let (_exec, adapter) = setup();

    let docs = adapter
        .find_all(&post(), &json!({"userId": "u1"}), &with(&["user"]))
        .await
        .unwrap();

    assert_eq!(docs.len(), 2);
    assert!(docs.iter().all(|d| d.get("author").is_none()));
}

/// A missing base row is Not Found even with relations requested.
#[tokio::test]
async fn test_missing_base_row() {
    let (_exec, adapter) = setup();

    let err = adapter
        .find(&user(), "ghost", &with(&["post"]))
        .await
        .unwrap_err();
    assert!(err.is_not_found());
}

/// A relation to an unregistered resource fails.
#[tokio::test]
async fn test_unknown_related_resource() {
    let (_exec, adapter) = setup();
    let comment = ResourceDescriptor::new("comment")
        .with_relation(RelationDescriptor::belongs_to("ghost", "ghost", "ghostId"));

    let err = adapter
        .find(&comment, "c1", &with(&["ghost"]))
        .await
        .unwrap_err();
    assert_eq!(err, AdapterError::UnknownRelatedResource("ghost".into()));
}
