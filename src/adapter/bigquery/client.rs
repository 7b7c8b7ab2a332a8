//! BigQuery Warehouse Repository
//!
//! BigQuery REST API による WarehouseRepository の実装

use std::future::Future;
use std::time::Duration;

use async_trait::async_trait;
use google_cloud_bigquery::client::Client;
use google_cloud_bigquery::http::error::Error as SdkError;
use google_cloud_bigquery::http::job::get::GetJobRequest;
use google_cloud_bigquery::http::job::get_query_results::GetQueryResultsRequest;
use google_cloud_bigquery::http::table::Table;
use log::debug;

use super::errors::{invalid_response, service_error};
use super::models::{
    job_status, result_page_from_json, schema_to_json, table_description_from_json,
    table_reference, time_partitioning_to_json, to_sdk_job,
};
use crate::domain::entities::job::{JobRef, JobSpec, JobStatus};
use crate::domain::entities::result_page::ResultPage;
use crate::domain::entities::table::{
    TableDefinition, TableDescription, TableRef, TimePartitioning,
};
use crate::domain::error::ServiceError;
use crate::domain::repositories::warehouse_repository::WarehouseRepository;

/// Runs one SDK request, failing with a timeout ServiceError after `timeout`
pub async fn bounded<T, F>(
    operation: &str,
    timeout: Duration,
    request: F,
) -> Result<T, ServiceError>
where
    F: Future<Output = Result<T, SdkError>>,
{
    debug!("BigQuery request: {}", operation);
    match tokio::time::timeout(timeout, request).await {
        Ok(result) => result.map_err(service_error),
        Err(_) => Err(ServiceError::timeout(operation, timeout)),
    }
}

/// BigQuery client that owns the Client instance
///
/// Every SDK call is bounded by `request_timeout`.
#[derive(Clone)]
pub struct BigQueryWarehouseRepository {
    client: Client,
    request_timeout: Duration,
}

impl BigQueryWarehouseRepository {
    pub fn new(client: Client, request_timeout: Duration) -> Self {
        Self {
            client,
            request_timeout,
        }
    }

    async fn call<T, F>(&self, operation: &str, request: F) -> Result<T, ServiceError>
    where
        F: Future<Output = Result<T, SdkError>>,
    {
        bounded(operation, self.request_timeout, request).await
    }

    async fn fetch_table(&self, table: &TableRef) -> Result<Table, ServiceError> {
        self.call(
            "tables.get",
            self.client
                .table()
                .get(&table.project_id, &table.dataset_id, &table.table_id),
        )
        .await
    }
}

#[async_trait]
impl WarehouseRepository for BigQueryWarehouseRepository {
    async fn insert_job(&self, job: &JobSpec) -> Result<JobStatus, ServiceError> {
        let request = to_sdk_job(job)?;
        let created = self
            .call("jobs.insert", self.client.job().create(&request))
            .await?;
        job_status(&job.reference, &created)
    }

    async fn get_job(&self, job: &JobRef) -> Result<JobStatus, ServiceError> {
        let request = GetJobRequest {
            location: job.location.clone(),
            ..Default::default()
        };
        let current = self
            .call(
                "jobs.get",
                self.client
                    .job()
                    .get(&job.project_id, &job.job_id, &request),
            )
            .await?;
        job_status(job, &current)
    }

    async fn get_query_results(
        &self,
        job: &JobRef,
        page_token: Option<String>,
    ) -> Result<ResultPage, ServiceError> {
        let request = GetQueryResultsRequest {
            page_token,
            location: job.location.clone(),
            ..Default::default()
        };
        let response = self
            .call(
                "jobs.getQueryResults",
                self.client
                    .job()
                    .get_query_results(&job.project_id, &job.job_id, &request),
            )
            .await?;
        let value = serde_json::to_value(&response)
            .map_err(|e| invalid_response("query results", e))?;
        result_page_from_json(&value)
    }

    async fn create_table(&self, table: &TableDefinition) -> Result<(), ServiceError> {
        let mut request = Table::default();
        request.table_reference = table_reference(&table.reference);
        request.schema = Some(
            serde_json::from_value(schema_to_json(&table.schema))
                .map_err(|e| invalid_response("table schema", e))?,
        );
        if let Some(partitioning) = &table.time_partitioning {
            request.time_partitioning = Some(
                serde_json::from_value(time_partitioning_to_json(partitioning))
                    .map_err(|e| invalid_response("time partitioning", e))?,
            );
        }
        self.call("tables.insert", self.client.table().create(&request))
            .await?;
        Ok(())
    }

    async fn get_table(&self, table: &TableRef) -> Result<TableDescription, ServiceError> {
        let current = self.fetch_table(table).await?;
        let value = serde_json::to_value(&current)
            .map_err(|e| invalid_response("table metadata", e))?;
        table_description_from_json(table, &value)
    }

    async fn set_time_partitioning(
        &self,
        table: &TableRef,
        partitioning: &TimePartitioning,
    ) -> Result<(), ServiceError> {
        let mut current = self.fetch_table(table).await?;
        current.time_partitioning = Some(
            serde_json::from_value(time_partitioning_to_json(partitioning))
                .map_err(|e| invalid_response("time partitioning", e))?,
        );
        self.call("tables.patch", self.client.table().patch(&current))
            .await?;
        Ok(())
    }

    async fn delete_table(&self, table: &TableRef) -> Result<(), ServiceError> {
        self.call(
            "tables.delete",
            self.client
                .table()
                .delete(&table.project_id, &table.dataset_id, &table.table_id),
        )
        .await
    }
}
