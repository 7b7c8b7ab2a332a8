//! # Run Query Use Case
//!
//! クエリ実行ユースケース（ジョブ投入 → 完了待ち → 結果取得 → 表形式へ変換）

use std::sync::Arc;

use arrow::record_batch::RecordBatch;
use log::{debug, info, warn};
use tokio::time::{sleep, Instant};

use super::wait_for_job::WaitForJobUseCase;
use crate::application::dto::warehouse_options::WarehouseOptions;
use crate::domain::entities::job::{JobRef, JobSpec};
use crate::domain::entities::result_page::RawRow;
use crate::domain::entities::schema::TableSchema;
use crate::domain::error::{Result, ServiceError, WarehouseError};
use crate::domain::repositories::warehouse_repository::WarehouseRepository;
use crate::domain::services::tabular::to_record_batch;

/// 変換前のクエリ結果
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QueryRows {
    pub job: JobRef,
    /// DDL/DML の場合は `None`
    pub schema: Option<TableSchema>,
    pub rows: Vec<RawRow>,
}

impl QueryRows {
    pub fn to_record_batch(&self) -> Result<RecordBatch> {
        to_record_batch(self.schema.as_ref(), &self.rows)
    }
}

/// クエリ実行ユースケース
pub struct RunQueryUseCase<R: WarehouseRepository> {
    repository: Arc<R>,
    wait: WaitForJobUseCase<R>,
    project_id: String,
    options: WarehouseOptions,
}

impl<R: WarehouseRepository> RunQueryUseCase<R> {
    pub fn new(repository: Arc<R>, project_id: String, options: WarehouseOptions) -> Self {
        let wait = WaitForJobUseCase::new(repository.clone(), options.poll.clone());
        Self {
            repository,
            wait,
            project_id,
            options,
        }
    }

    /// クエリを実行して RecordBatch を返す
    pub async fn execute(&self, sql: &str) -> Result<RecordBatch> {
        self.fetch(sql, self.options.use_legacy_sql, WarehouseError::Query)
            .await?
            .to_record_batch()
    }

    /// クエリを実行して変換前の結果を返す
    ///
    /// # Arguments
    ///
    /// * `sql` - 実行するクエリ
    /// * `use_legacy_sql` - レガシーSQL方言を使うかどうか
    /// * `classify` - サービスエラーとジョブ失敗をエラー種別に変換する関数
    pub async fn fetch(
        &self,
        sql: &str,
        use_legacy_sql: bool,
        classify: fn(ServiceError) -> WarehouseError,
    ) -> Result<QueryRows> {
        if sql.trim().is_empty() {
            return Err(WarehouseError::invalid("query text is empty"));
        }

        let reference = JobRef::generate(&self.project_id, self.options.location.clone());
        let job = JobSpec::query(reference.clone(), sql, use_legacy_sql);
        info!("Submitting query job {}", reference.job_id);

        let status = self
            .repository
            .insert_job(&job)
            .await
            .map_err(|e| WarehouseError::classify(e, classify))?;
        let status = self.wait.execute(status, classify).await?;
        if let Some(error) = status.error {
            warn!("Query job {} failed: {}", reference.job_id, error);
            return Err(WarehouseError::classify(error, classify));
        }

        // 結果の取得にはサービスが返した参照（リージョン付き）を使う
        self.collect_pages(status.reference, classify).await
    }

    /// 全ページを取得して結合
    async fn collect_pages(
        &self,
        job: JobRef,
        classify: fn(ServiceError) -> WarehouseError,
    ) -> Result<QueryRows> {
        let poll = self.wait.poll_options();
        let deadline = Instant::now() + poll.timeout;
        let mut schema = None;
        let mut rows = Vec::new();
        let mut page_token: Option<String> = None;

        loop {
            let page = self
                .repository
                .get_query_results(&job, page_token.clone())
                .await
                .map_err(|e| WarehouseError::classify(e, classify))?;

            if !page.job_complete {
                if Instant::now() + poll.interval > deadline {
                    return Err(WarehouseError::Timeout(format!(
                        "results of job {} were not ready within {:?}",
                        job.job_id, poll.timeout
                    )));
                }
                sleep(poll.interval).await;
                continue;
            }

            if schema.is_none() {
                schema = page.schema;
            }
            debug!("Fetched {} rows for job {}", page.rows.len(), job.job_id);
            rows.extend(page.rows);

            match page.page_token {
                Some(token) if !token.is_empty() => page_token = Some(token),
                _ => break,
            }
        }

        Ok(QueryRows { job, schema, rows })
    }
}
