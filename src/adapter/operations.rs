//! CRUD operations

use std::sync::Arc;

use serde_json::Value;

use super::errors::{AdapterError, AdapterResult};
use super::options::OperationOptions;
use crate::config::{AdapterConfig, ConfigResult};
use crate::executor::{DocumentExecutor, ExecutorError, Query, QueryOutput, Target, WriteSummary};
use crate::observability::{log_event_with_fields, trace_event, Event};
use crate::planner::{Plan, QueryPlanner, TableRef};
use crate::provision::SchemaProvisioner;
use crate::relations::merge_relations;
use crate::resource::{ResourceDescriptor, ResourceProvider};

/// ORM persistence adapter over a document database.
///
/// Every operation first waits for the tables (and indexes) it touches to
/// exist, then runs through the executor.
pub struct Adapter {
    config: AdapterConfig,
    planner: QueryPlanner,
    provisioner: SchemaProvisioner,
    executor: Arc<dyn DocumentExecutor>,
    resources: Arc<dyn ResourceProvider>,
}

impl Adapter {
    /// Validates `config` and builds an adapter with a fresh provisioning
    /// registry.
    pub fn new(
        config: AdapterConfig,
        executor: Arc<dyn DocumentExecutor>,
        resources: Arc<dyn ResourceProvider>,
    ) -> ConfigResult<Self> {
        config.validate()?;
        Ok(Self {
            planner: QueryPlanner::new(config.db.clone()),
            provisioner: SchemaProvisioner::new(Arc::clone(&executor)),
            config,
            executor,
            resources,
        })
    }

    pub fn config(&self) -> &AdapterConfig {
        &self.config
    }

    pub fn planner(&self) -> &QueryPlanner {
        &self.planner
    }

    /// Schema provisioner, for pre-warming tables and indexes
    pub fn provisioner(&self) -> &SchemaProvisioner {
        &self.provisioner
    }

    pub fn select_table(&self, resource: &ResourceDescriptor, options: &OperationOptions) -> TableRef {
        self.planner.select_table(resource, options.db())
    }

    /// Plan for `find_all` with raw ORM parameters
    pub fn plan(
        &self,
        resource: &ResourceDescriptor,
        params: &Value,
        options: &OperationOptions,
    ) -> AdapterResult<Plan> {
        let plan = self.planner.build_plan(resource, params, options.db())?;
        if options.debug {
            trace_event(Event::QueryPlanned, &[("plan", &plan.describe())]);
        }
        Ok(plan)
    }

    /// Single entity by id, with the relations named in `options.with`
    pub async fn find(
        &self,
        resource: &ResourceDescriptor,
        id: &str,
        options: &OperationOptions,
    ) -> AdapterResult<Value> {
        let fetch = merge_relations(
            resource,
            self.resources.as_ref(),
            &self.planner,
            id,
            options,
        )?;
        self.provisioner
            .ensure_all(&fetch.required_tables(), &fetch.required_indexes())
            .await?;

        let found = fetch
            .execute(self.executor.as_ref(), options.run_options())
            .await?;
        match found {
            Some(doc) => {
                if !fetch.relations.is_empty() {
                    let count = fetch.relations.len().to_string();
                    log_event_with_fields(
                        Event::RelationMerged,
                        &[("relations", &count), ("table", &fetch.table.to_string())],
                    );
                }
                Ok(doc)
            }
            None => {
                log_event_with_fields(
                    Event::NotFound,
                    &[("id", id), ("table", &fetch.table.to_string())],
                );
                Err(AdapterError::NotFound)
            }
        }
    }

    /// Rows matching `params`. Relations are not merged.
    pub async fn find_all(
        &self,
        resource: &ResourceDescriptor,
        params: &Value,
        options: &OperationOptions,
    ) -> AdapterResult<Vec<Value>> {
        let plan = self.plan(resource, params, options)?;
        self.provisioner.ensure_table(&plan.table).await?;
        Ok(self.run(Query::Select(plan), options).await?.into_documents()?)
    }

    /// Inserts `attrs` and returns the stored document, id included
    pub async fn create(
        &self,
        resource: &ResourceDescriptor,
        attrs: Value,
        options: &OperationOptions,
    ) -> AdapterResult<Value> {
        let table = self.ready_table(resource, options).await?;
        let query = Query::Insert {
            table: table.clone(),
            document: attrs,
            return_changes: true,
        };
        let summary = self.run(query, options).await?.into_changes()?;
        log_commit("create", &table, &summary);

        summary
            .new_values()
            .into_iter()
            .next()
            .ok_or_else(|| ExecutorError::unexpected_shape("change", "no changes").into())
    }

    /// Merges `attrs` into the row `id` and returns the updated document
    pub async fn update(
        &self,
        resource: &ResourceDescriptor,
        id: &str,
        attrs: Value,
        options: &OperationOptions,
    ) -> AdapterResult<Value> {
        let table = self.ready_table(resource, options).await?;
        let query = Query::Update {
            target: Target::Id {
                table: table.clone(),
                id: id.to_string(),
            },
            attrs,
            return_changes: true,
        };
        let summary = self.run(query, options).await?.into_changes()?;
        log_commit("update", &table, &summary);

        if let Some(doc) = summary.new_values().into_iter().next() {
            return Ok(doc);
        }

        // Nothing changed; the row may still exist with identical values
        let reread = Query::Get {
            table: table.clone(),
            id: id.to_string(),
        };
        match self.run(reread, options).await?.into_document()? {
            Some(doc) => Ok(doc),
            None => {
                log_event_with_fields(Event::NotFound, &[("id", id), ("table", &table.to_string())]);
                Err(AdapterError::NotFound)
            }
        }
    }

    /// Merges `attrs` into every row `find_all` would return for `params`
    pub async fn update_all(
        &self,
        resource: &ResourceDescriptor,
        attrs: Value,
        params: &Value,
        options: &OperationOptions,
    ) -> AdapterResult<Vec<Value>> {
        let plan = self.plan(resource, params, options)?;
        self.provisioner.ensure_table(&plan.table).await?;

        let query = Query::Update {
            target: Target::Plan(plan.clone()),
            attrs,
            return_changes: true,
        };
        let summary = self.run(query, options).await?.into_changes()?;
        log_commit("update_all", &plan.table, &summary);

        let updated = summary.new_values();
        if !updated.is_empty() {
            return Ok(updated);
        }
        Ok(self.run(Query::Select(plan), options).await?.into_documents()?)
    }

    /// Deletes row `id`. A missing row is not an error.
    pub async fn destroy(
        &self,
        resource: &ResourceDescriptor,
        id: &str,
        options: &OperationOptions,
    ) -> AdapterResult<()> {
        let table = self.ready_table(resource, options).await?;
        let query = Query::Delete {
            target: Target::Id {
                table: table.clone(),
                id: id.to_string(),
            },
        };
        let summary = self.run(query, options).await?.into_changes()?;
        log_commit("destroy", &table, &summary);
        Ok(())
    }

    /// Deletes exactly the rows `find_all` would return for `params`
    pub async fn destroy_all(
        &self,
        resource: &ResourceDescriptor,
        params: &Value,
        options: &OperationOptions,
    ) -> AdapterResult<()> {
        let plan = self.plan(resource, params, options)?;
        self.provisioner.ensure_table(&plan.table).await?;

        let table = plan.table.clone();
        let summary = self
            .run(Query::Delete { target: Target::Plan(plan) }, options)
            .await?
            .into_changes()?;
        log_commit("destroy_all", &table, &summary);
        Ok(())
    }

    async fn ready_table(
        &self,
        resource: &ResourceDescriptor,
        options: &OperationOptions,
    ) -> AdapterResult<TableRef> {
        let table = self.select_table(resource, options);
        self.provisioner.ensure_table(&table).await?;
        Ok(table)
    }

    async fn run(&self, query: Query, options: &OperationOptions) -> AdapterResult<QueryOutput> {
        if options.debug {
            trace_event(
                Event::QueryExecuted,
                &[
                    ("kind", query.kind()),
                    ("query", &query.to_string()),
                    ("table", &query.table().to_string()),
                ],
            );
        }
        Ok(self.executor.run(query, options.run_options()).await?)
    }
}

fn log_commit(op: &str, table: &TableRef, summary: &WriteSummary) {
    let affected = summary.inserted + summary.replaced + summary.deleted;
    log_event_with_fields(
        Event::WriteCommit,
        &[
            ("affected", &affected.to_string()),
            ("op", op),
            ("table", &table.to_string()),
        ],
    );
}
