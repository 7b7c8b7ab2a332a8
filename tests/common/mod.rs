//! In-memory stand-in for the warehouse service
//!
//! ジョブは投入直後に RUNNING を返し、次の状態取得で DONE になる。
//! CSV ロードは原子的（1行でも不正ならテーブルは変更しない）。

#![allow(dead_code)]

use std::collections::{BTreeMap, BTreeSet, HashMap};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;

use littlebq::application::dto::warehouse_options::{PollOptions, WarehouseOptions};
use littlebq::application::warehouse::Warehouse;
use littlebq::domain::entities::job::{
    CreateDisposition, JobKind, JobRef, JobSpec, JobState, JobStatus, LoadJob, WriteDisposition,
};
use littlebq::domain::entities::result_page::{RawValue, ResultPage};
use littlebq::domain::entities::schema::{ColumnMode, ColumnType, TableSchema};
use littlebq::domain::entities::table::{
    TableDefinition, TableDescription, TableRef, TimePartitioning,
};
use littlebq::domain::error::ServiceError;
use littlebq::domain::repositories::warehouse_repository::WarehouseRepository;

pub const PROJECT: &str = "test-project";
pub const DATASET: &str = "analytics";

#[derive(Debug, Clone)]
pub struct StoredTable {
    pub schema: TableSchema,
    pub time_partitioning: Option<TimePartitioning>,
    pub rows: Vec<Vec<Option<String>>>,
}

#[derive(Debug, Clone)]
enum CannedQuery {
    Rows(ResultPage),
    JobError(ServiceError),
    Rejected(ServiceError),
}

#[derive(Debug, Clone)]
struct StoredJob {
    error: Option<ServiceError>,
    result: ResultPage,
}

#[derive(Default)]
struct State {
    datasets: BTreeSet<String>,
    tables: BTreeMap<(String, String), StoredTable>,
    objects: BTreeMap<String, String>,
    queries: HashMap<String, CannedQuery>,
    jobs: HashMap<String, StoredJob>,
    submitted: Vec<JobSpec>,
}

/// In-memory warehouse implementing the repository port
#[derive(Default)]
pub struct InMemoryWarehouse {
    state: Mutex<State>,
    requests: AtomicUsize,
    page_size: Mutex<Option<usize>>,
    unauthenticated: Mutex<bool>,
    never_finish: Mutex<bool>,
    timed_out: Mutex<bool>,
}

fn not_found(message: impl Into<String>) -> ServiceError {
    ServiceError::new(Some(404), Some("notFound".to_string()), message)
}

fn job_error(reason: &str, message: impl Into<String>) -> ServiceError {
    ServiceError::new(None, Some(reason.to_string()), message)
}

/// Text between the first pair of backticks
fn quoted(sql: &str) -> Option<&str> {
    let start = sql.find('`')? + 1;
    let end = start + sql[start..].find('`')?;
    Some(&sql[start..end])
}

fn names_page(column: &str, names: Vec<String>) -> ResultPage {
    ResultPage {
        schema: Some(TableSchema::from_pairs(&[(column, "STRING")]).unwrap()),
        rows: names.into_iter().map(|n| vec![RawValue::Scalar(n)]).collect(),
        page_token: None,
        job_complete: true,
    }
}

fn ddl_page() -> ResultPage {
    ResultPage {
        job_complete: true,
        ..Default::default()
    }
}

impl InMemoryWarehouse {
    pub fn new() -> Self {
        let fake = Self::default();
        fake.add_dataset(DATASET);
        fake
    }

    pub fn add_dataset(&self, name: &str) {
        self.state.lock().unwrap().datasets.insert(name.to_string());
    }

    pub fn put_object(&self, uri: &str, content: &str) {
        self.state
            .lock()
            .unwrap()
            .objects
            .insert(uri.to_string(), content.to_string());
    }

    /// Registers the result of a query
    pub fn add_query(&self, sql: &str, columns: &[(&str, &str)], rows: &[&[Option<&str>]]) {
        let page = ResultPage {
            schema: Some(TableSchema::from_pairs(columns).unwrap()),
            rows: rows
                .iter()
                .map(|row| {
                    row.iter()
                        .map(|cell| match cell {
                            Some(v) => RawValue::scalar(*v),
                            None => RawValue::Null,
                        })
                        .collect()
                })
                .collect(),
            page_token: None,
            job_complete: true,
        };
        self.add_query_page(sql, page);
    }

    pub fn add_query_page(&self, sql: &str, page: ResultPage) {
        self.state
            .lock()
            .unwrap()
            .queries
            .insert(sql.to_string(), CannedQuery::Rows(page));
    }

    /// The query job is accepted and then fails
    pub fn fail_query(&self, sql: &str, reason: &str, message: &str) {
        self.state
            .lock()
            .unwrap()
            .queries
            .insert(sql.to_string(), CannedQuery::JobError(job_error(reason, message)));
    }

    /// The query job is rejected at submission
    pub fn reject_query(&self, sql: &str, code: u16, message: &str) {
        self.state
            .lock()
            .unwrap()
            .queries
            .insert(sql.to_string(), CannedQuery::Rejected(ServiceError::http(code, message)));
    }

    pub fn set_page_size(&self, size: usize) {
        *self.page_size.lock().unwrap() = Some(size);
    }

    pub fn set_unauthenticated(&self) {
        *self.unauthenticated.lock().unwrap() = true;
    }

    pub fn set_never_finish(&self) {
        *self.never_finish.lock().unwrap() = true;
    }

    /// Every request fails as if its per-request timeout expired
    pub fn set_requests_time_out(&self) {
        *self.timed_out.lock().unwrap() = true;
    }

    pub fn request_count(&self) -> usize {
        self.requests.load(Ordering::SeqCst)
    }

    pub fn table(&self, dataset: &str, name: &str) -> Option<StoredTable> {
        self.state
            .lock()
            .unwrap()
            .tables
            .get(&(dataset.to_string(), name.to_string()))
            .cloned()
    }

    pub fn row_count(&self, dataset: &str, name: &str) -> usize {
        self.table(dataset, name).map(|t| t.rows.len()).unwrap_or(0)
    }

    pub fn has_dataset(&self, name: &str) -> bool {
        self.state.lock().unwrap().datasets.contains(name)
    }

    pub fn submitted_jobs(&self) -> Vec<JobSpec> {
        self.state.lock().unwrap().submitted.clone()
    }

    fn begin(&self) -> Result<(), ServiceError> {
        self.requests.fetch_add(1, Ordering::SeqCst);
        if *self.timed_out.lock().unwrap() {
            return Err(ServiceError::timeout("tables.get", Duration::from_secs(60)));
        }
        if *self.unauthenticated.lock().unwrap() {
            return Err(ServiceError::http(401, "Request had invalid authentication credentials."));
        }
        Ok(())
    }

    fn run_query(state: &mut State, sql: &str) -> Result<StoredJob, ServiceError> {
        if let Some(canned) = state.queries.get(sql).cloned() {
            return match canned {
                CannedQuery::Rows(result) => Ok(StoredJob { error: None, result }),
                CannedQuery::JobError(error) => Ok(StoredJob {
                    error: Some(error),
                    result: ddl_page(),
                }),
                CannedQuery::Rejected(error) => Err(error),
            };
        }

        let outcome = if sql.contains("INFORMATION_SCHEMA.TABLES") {
            let dataset = quoted(sql)
                .and_then(|q| q.split('.').nth(1))
                .unwrap_or_default()
                .to_string();
            let tables = state
                .tables
                .keys()
                .filter(|(d, _)| *d == dataset)
                .map(|(_, t)| t.clone())
                .collect();
            Ok(names_page("table_name", tables))
        } else if sql.contains("INFORMATION_SCHEMA.SCHEMATA") {
            Ok(names_page(
                "schema_name",
                state.datasets.iter().cloned().collect(),
            ))
        } else if sql.starts_with("CREATE SCHEMA") {
            let name = quoted(sql)
                .and_then(|q| q.split('.').nth(1))
                .unwrap_or_default()
                .to_string();
            if state.datasets.insert(name.clone()) {
                Ok(ddl_page())
            } else {
                Err(job_error("duplicate", format!("Already Exists: Dataset {}:{}", PROJECT, name)))
            }
        } else if sql.starts_with("DROP SCHEMA") {
            let name = quoted(sql)
                .and_then(|q| q.split('.').nth(1))
                .unwrap_or_default()
                .to_string();
            let has_tables = state.tables.keys().any(|(d, _)| *d == name);
            if !state.datasets.contains(&name) {
                Err(job_error("notFound", format!("Not found: Dataset {}:{}", PROJECT, name)))
            } else if has_tables && !sql.ends_with("CASCADE") {
                Err(job_error(
                    "resourceInUse",
                    format!("Dataset {}:{} is still in use", PROJECT, name),
                ))
            } else {
                state.datasets.remove(&name);
                state.tables.retain(|(d, _), _| *d != name);
                Ok(ddl_page())
            }
        } else {
            Err(job_error("invalidQuery", format!("Unrecognized name in query: {}", sql)))
        };

        Ok(match outcome {
            Ok(result) => StoredJob { error: None, result },
            Err(error) => StoredJob {
                error: Some(error),
                result: ddl_page(),
            },
        })
    }

    fn matching_objects(state: &State, uri: &str) -> Vec<String> {
        match uri.strip_suffix('*') {
            Some(prefix) => state
                .objects
                .iter()
                .filter(|(k, _)| k.starts_with(prefix))
                .map(|(_, v)| v.clone())
                .collect(),
            None => state.objects.get(uri).cloned().into_iter().collect(),
        }
    }

    fn parse_cell(
        column_type: ColumnType,
        mode: ColumnMode,
        cell: &str,
    ) -> Result<Option<String>, String> {
        if cell.is_empty() {
            return if mode == ColumnMode::Required {
                Err("missing required field".to_string())
            } else {
                Ok(None)
            };
        }
        let valid = match column_type {
            ColumnType::Integer => cell.parse::<i64>().is_ok(),
            ColumnType::Float => cell.parse::<f64>().is_ok(),
            ColumnType::Boolean => matches!(cell.to_ascii_lowercase().as_str(), "true" | "false"),
            ColumnType::Timestamp => chrono::DateTime::parse_from_rfc3339(cell).is_ok()
                || chrono::NaiveDateTime::parse_from_str(cell, "%Y-%m-%d %H:%M:%S").is_ok(),
            _ => true,
        };
        if valid {
            Ok(Some(cell.to_string()))
        } else {
            Err(format!("Could not parse '{}' as {}", cell, column_type))
        }
    }

    fn run_load(state: &mut State, load: &LoadJob) -> Option<ServiceError> {
        let key = (
            load.destination.dataset_id.clone(),
            load.destination.table_id.clone(),
        );
        if !state.datasets.contains(&key.0) {
            return Some(job_error("notFound", format!("Not found: Dataset {}:{}", PROJECT, key.0)));
        }
        let existing = state.tables.get(&key).cloned();
        if existing.is_none() && load.create_disposition == CreateDisposition::CreateNever {
            return Some(job_error("notFound", format!("Not found: Table {}", load.destination)));
        }
        if let Some(table) = &existing {
            if load.write_disposition == WriteDisposition::WriteEmpty && !table.rows.is_empty() {
                return Some(job_error(
                    "duplicate",
                    format!("Already Exists: Table {}", load.destination),
                ));
            }
        }
        let schema = match (&load.schema, &existing) {
            (Some(schema), _) => schema.clone(),
            (None, Some(table)) => table.schema.clone(),
            (None, None) => {
                return Some(job_error("invalid", "No schema specified on job or table."))
            }
        };

        let mut contents = Vec::new();
        for uri in &load.source_uris {
            let found = Self::matching_objects(state, uri);
            if found.is_empty() {
                return Some(job_error("notFound", format!("Not found: URI {}", uri)));
            }
            contents.extend(found);
        }

        let mut rows = Vec::new();
        for content in contents {
            for line in content
                .lines()
                .skip(load.csv.skip_leading_rows as usize)
                .filter(|l| !l.trim().is_empty())
            {
                let cells: Vec<&str> = line.split(load.csv.field_delimiter.as_str()).collect();
                if cells.len() != schema.len() {
                    return Some(job_error(
                        "invalid",
                        format!(
                            "Error while reading data, error message: CSV table references column position {}, but line contains only {} columns.",
                            schema.len() - 1,
                            cells.len()
                        ),
                    ));
                }
                let mut row = Vec::with_capacity(cells.len());
                for (column, cell) in schema.columns().iter().zip(cells) {
                    match Self::parse_cell(column.column_type, column.mode, cell.trim()) {
                        Ok(value) => row.push(value),
                        Err(message) => {
                            return Some(job_error(
                                "invalid",
                                format!("Error while reading data, error message: {}", message),
                            ))
                        }
                    }
                }
                rows.push(row);
            }
        }

        let table = state.tables.entry(key).or_insert_with(|| StoredTable {
            schema: schema.clone(),
            time_partitioning: None,
            rows: Vec::new(),
        });
        if load.write_disposition == WriteDisposition::WriteTruncate {
            table.schema = schema;
            table.rows = rows;
        } else {
            table.rows.extend(rows);
        }
        None
    }

    fn base_table(name: &str) -> &str {
        name.split('$').next().unwrap_or(name)
    }
}

#[async_trait]
impl WarehouseRepository for InMemoryWarehouse {
    async fn insert_job(&self, job: &JobSpec) -> Result<JobStatus, ServiceError> {
        self.begin()?;
        let mut state = self.state.lock().unwrap();
        state.submitted.push(job.clone());
        let stored = match &job.kind {
            JobKind::Query { sql, .. } => Self::run_query(&mut state, sql)?,
            JobKind::Load(load) => StoredJob {
                error: Self::run_load(&mut state, load),
                result: ddl_page(),
            },
        };
        state.jobs.insert(job.reference.job_id.clone(), stored);
        Ok(JobStatus {
            reference: job.reference.clone(),
            state: JobState::Running,
            error: None,
        })
    }

    async fn get_job(&self, job: &JobRef) -> Result<JobStatus, ServiceError> {
        self.begin()?;
        if *self.never_finish.lock().unwrap() {
            return Ok(JobStatus {
                reference: job.clone(),
                state: JobState::Running,
                error: None,
            });
        }
        let state = self.state.lock().unwrap();
        let stored = state
            .jobs
            .get(&job.job_id)
            .ok_or_else(|| not_found(format!("Not found: Job {}:{}", job.project_id, job.job_id)))?;
        Ok(JobStatus {
            reference: job.clone(),
            state: JobState::Done,
            error: stored.error.clone(),
        })
    }

    async fn get_query_results(
        &self,
        job: &JobRef,
        page_token: Option<String>,
    ) -> Result<ResultPage, ServiceError> {
        self.begin()?;
        let state = self.state.lock().unwrap();
        let stored = state
            .jobs
            .get(&job.job_id)
            .ok_or_else(|| not_found(format!("Not found: Job {}:{}", job.project_id, job.job_id)))?;
        let result = &stored.result;

        let Some(size) = *self.page_size.lock().unwrap() else {
            return Ok(result.clone());
        };
        let start: usize = page_token
            .as_deref()
            .and_then(|t| t.strip_prefix("offset-"))
            .and_then(|o| o.parse().ok())
            .unwrap_or(0);
        let end = (start + size).min(result.rows.len());
        Ok(ResultPage {
            schema: result.schema.clone(),
            rows: result.rows[start.min(end)..end].to_vec(),
            page_token: (end < result.rows.len()).then(|| format!("offset-{}", end)),
            job_complete: true,
        })
    }

    async fn create_table(&self, table: &TableDefinition) -> Result<(), ServiceError> {
        self.begin()?;
        let mut state = self.state.lock().unwrap();
        let reference = &table.reference;
        if !state.datasets.contains(&reference.dataset_id) {
            return Err(not_found(format!(
                "Not found: Dataset {}:{}",
                PROJECT, reference.dataset_id
            )));
        }
        let key = (reference.dataset_id.clone(), reference.table_id.clone());
        if state.tables.contains_key(&key) {
            return Err(ServiceError::new(
                Some(409),
                Some("duplicate".to_string()),
                format!("Already Exists: Table {}", reference),
            ));
        }
        state.tables.insert(
            key,
            StoredTable {
                schema: table.schema.clone(),
                time_partitioning: table.time_partitioning.clone(),
                rows: Vec::new(),
            },
        );
        Ok(())
    }

    async fn get_table(&self, table: &TableRef) -> Result<TableDescription, ServiceError> {
        self.begin()?;
        let state = self.state.lock().unwrap();
        let key = (
            table.dataset_id.clone(),
            Self::base_table(&table.table_id).to_string(),
        );
        let stored = state
            .tables
            .get(&key)
            .ok_or_else(|| not_found(format!("Not found: Table {}", table)))?;
        Ok(TableDescription {
            table: table.clone(),
            schema: stored.schema.clone(),
            num_rows: Some(stored.rows.len() as u64),
            num_bytes: Some(0),
            time_partitioning: stored.time_partitioning.clone(),
            creation_time: None,
            description: None,
        })
    }

    async fn set_time_partitioning(
        &self,
        table: &TableRef,
        partitioning: &TimePartitioning,
    ) -> Result<(), ServiceError> {
        self.begin()?;
        let mut state = self.state.lock().unwrap();
        let key = (table.dataset_id.clone(), table.table_id.clone());
        let stored = state
            .tables
            .get_mut(&key)
            .ok_or_else(|| not_found(format!("Not found: Table {}", table)))?;
        stored.time_partitioning = Some(partitioning.clone());
        Ok(())
    }

    async fn delete_table(&self, table: &TableRef) -> Result<(), ServiceError> {
        self.begin()?;
        let mut state = self.state.lock().unwrap();
        let key = (table.dataset_id.clone(), table.table_id.clone());
        state
            .tables
            .remove(&key)
            .map(|_| ())
            .ok_or_else(|| not_found(format!("Not found: Table {}", table)))
    }
}

pub fn fast_options() -> WarehouseOptions {
    WarehouseOptions {
        poll: PollOptions {
            interval: Duration::from_millis(1),
            timeout: Duration::from_secs(5),
        },
        ..Default::default()
    }
}

pub fn warehouse(fake: &Arc<InMemoryWarehouse>) -> Warehouse<InMemoryWarehouse> {
    Warehouse::new(fake.clone(), PROJECT, DATASET, fast_options()).unwrap()
}
