//! Schema provisioner
//!
//! `ensure_table` waits on `ensure_database`; `ensure_index` waits on
//! `ensure_table`, creates the index, then waits until it is queryable.

use std::sync::Arc;

use futures_util::future::FutureExt;

use super::errors::{ProvisionError, ProvisionResult};
use super::registry::{ProvisionRegistry, ReadySignal};
use crate::executor::{DocumentExecutor, ProvisionRequest};
use crate::observability::{log_event_with_fields, Event};
use crate::planner::TableRef;

struct Inner {
    executor: Arc<dyn DocumentExecutor>,
    registry: ProvisionRegistry,
}

/// Idempotent create-if-missing manager for databases, tables and indexes.
///
/// Cheap to clone; clones share one registry.
#[derive(Clone)]
pub struct SchemaProvisioner {
    inner: Arc<Inner>,
}

impl SchemaProvisioner {
    pub fn new(executor: Arc<dyn DocumentExecutor>) -> Self {
        Self {
            inner: Arc::new(Inner {
                executor,
                registry: ProvisionRegistry::new(),
            }),
        }
    }

    pub fn registry(&self) -> &ProvisionRegistry {
        &self.inner.registry
    }

    pub fn ensure_database(&self, db: &str) -> ReadySignal {
        let executor = Arc::clone(&self.inner.executor);
        let db = db.to_string();
        self.inner
            .registry
            .databases
            .get_or_start(db.clone(), move || {
                async move { create(executor.as_ref(), ProvisionRequest::CreateDatabase { db }).await }
                    .boxed()
            })
    }

    pub fn ensure_table(&self, table: &TableRef) -> ReadySignal {
        let executor = Arc::clone(&self.inner.executor);
        let key = table.clone();
        self.inner.registry.tables.get_or_start(key, || {
            let database_ready = self.ensure_database(&table.db);
            let table = table.clone();
            async move {
                database_ready.await?;
                create(executor.as_ref(), ProvisionRequest::CreateTable { table }).await
            }
            .boxed()
        })
    }

    pub fn ensure_index(&self, table: &TableRef, index: &str) -> ReadySignal {
        let executor = Arc::clone(&self.inner.executor);
        let key = (table.clone(), index.to_string());
        self.inner.registry.indexes.get_or_start(key, || {
            let table_ready = self.ensure_table(table);
            let table = table.clone();
            let index = index.to_string();
            async move {
                table_ready.await?;
                create(
                    executor.as_ref(),
                    ProvisionRequest::CreateIndex {
                        table: table.clone(),
                        index: index.clone(),
                    },
                )
                .await?;
                create(executor.as_ref(), ProvisionRequest::WaitIndex { table, index }).await
            }
            .boxed()
        })
    }

    /// Ensures every table and then every `(table, index)` pair
    pub async fn ensure_all(
        &self,
        tables: &[TableRef],
        indexes: &[(TableRef, String)],
    ) -> ProvisionResult<()> {
        let mut signals: Vec<ReadySignal> = tables.iter().map(|t| self.ensure_table(t)).collect();
        signals.extend(indexes.iter().map(|(t, i)| self.ensure_index(t, i)));
        for result in futures_util::future::join_all(signals).await {
            result?;
        }
        Ok(())
    }
}

async fn create(executor: &dyn DocumentExecutor, request: ProvisionRequest) -> ProvisionResult<()> {
    let kind = request.kind();
    let target = request.target();
    log_event_with_fields(Event::ProvisionStart, &[("kind", kind), ("target", &target)]);

    match executor.provision(request).await {
        Ok(created) => {
            log_event_with_fields(
                Event::ProvisionComplete,
                &[
                    ("created", if created { "true" } else { "false" }),
                    ("kind", kind),
                    ("target", &target),
                ],
            );
            Ok(())
        }
        Err(source) => {
            let message = source.to_string();
            log_event_with_fields(
                Event::ProvisionFailed,
                &[("error", &message), ("kind", kind), ("target", &target)],
            );
            Err(ProvisionError {
                kind,
                target,
                source,
            })
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::executor::{ExecutorError, MemoryExecutor};
    use crate::provision::ProvisionStatus;
    use futures_util::future::join_all;

    fn setup() -> (Arc<MemoryExecutor>, SchemaProvisioner) {
        let exec = Arc::new(MemoryExecutor::new());
        let provisioner = SchemaProvisioner::new(exec.clone());
        (exec, provisioner)
    }

    #[tokio::test]
    async fn test_concurrent_ensure_table_creates_once() {
        let (exec, provisioner) = setup();
        let table = TableRef::new("test", "users");

        let results = join_all((0..16).map(|_| provisioner.ensure_table(&table))).await;

        assert!(results.iter().all(Result::is_ok));
        assert_eq!(exec.provision_count("database"), 1);
        assert_eq!(exec.provision_count("table"), 1);
        assert_eq!(provisioner.registry().table_status(&table), ProvisionStatus::Ready);
    }

    #[tokio::test]
    async fn test_concurrent_ensure_table_across_tasks() {
        let (exec, provisioner) = setup();
        let table = TableRef::new("test", "users");

        let handles: Vec<_> = (0..8)
            .map(|_| {
                let provisioner = provisioner.clone();
                let table = table.clone();
                tokio::spawn(async move { provisioner.ensure_table(&table).await })
            })
            .collect();

        for handle in handles {
            handle.await.unwrap().unwrap();
        }
        assert_eq!(exec.provision_count("table"), 1);
    }

    #[tokio::test]
    async fn test_tables_share_database() {
        let (exec, provisioner) = setup();

        provisioner
            .ensure_table(&TableRef::new("test", "users"))
            .await
            .unwrap();
        provisioner
            .ensure_table(&TableRef::new("test", "posts"))
            .await
            .unwrap();

        assert_eq!(exec.provision_count("database"), 1);
        assert_eq!(exec.provision_count("table"), 2);
        assert_eq!(provisioner.registry().tracked(), (1, 2, 0));
    }

    #[tokio::test]
    async fn test_index_waits_for_readiness() {
        let (exec, provisioner) = setup();
        let table = TableRef::new("test", "posts");

        provisioner.ensure_index(&table, "userId").await.unwrap();
        provisioner.ensure_index(&table, "userId").await.unwrap();

        let log = exec.provision_log();
        let kinds: Vec<_> = log.iter().map(ProvisionRequest::kind).collect();
        assert_eq!(kinds, vec!["database", "table", "index", "index_wait"]);
    }

    #[tokio::test]
    async fn test_failure_is_shared_and_cached() {
        let (exec, provisioner) = setup();
        exec.deny_provisioning("test.secrets");
        let table = TableRef::new("test", "secrets");

        let results = join_all((0..4).map(|_| provisioner.ensure_table(&table))).await;
        for result in &results {
            let err = result.as_ref().unwrap_err();
            assert_eq!(err.target, "test.secrets");
            assert!(matches!(err.source, ExecutorError::Failed(_)));
        }

        // Later callers observe the same failure without a new attempt
        assert!(provisioner.ensure_table(&table).await.is_err());
        assert_eq!(exec.provision_count("table"), 1);
        assert!(matches!(
            provisioner.registry().table_status(&table),
            ProvisionStatus::Failed(_)
        ));
    }

    #[tokio::test]
    async fn test_database_failure_propagates_to_index() {
        let (exec, provisioner) = setup();
        exec.deny_provisioning("locked");

        let err = provisioner
            .ensure_index(&TableRef::new("locked", "posts"), "userId")
            .await
            .unwrap_err();

        assert_eq!(err.kind, "database");
        assert_eq!(exec.provision_count("table"), 0);
        assert_eq!(exec.provision_count("index"), 0);
    }

    #[tokio::test]
    async fn test_ensure_all() {
        let (exec, provisioner) = setup();
        let users = TableRef::new("test", "users");
        let posts = TableRef::new("test", "posts");

        provisioner
            .ensure_all(&[users.clone(), posts.clone()], &[(posts, "userId".into())])
            .await
            .unwrap();

        assert_eq!(exec.provision_count("table"), 2);
        assert_eq!(exec.provision_count("index_wait"), 1);
    }
}
