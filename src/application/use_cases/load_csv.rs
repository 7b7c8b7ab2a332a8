//! # Load CSV Use Case
//!
//! Cloud Storage 上の CSV からのテーブル作成と追記

use std::sync::Arc;

use log::{info, warn};

use super::wait_for_job::WaitForJobUseCase;
use crate::application::dto::warehouse_options::WarehouseOptions;
use crate::domain::entities::job::{
    CreateDisposition, JobRef, JobSpec, LoadJob, WriteDisposition,
};
use crate::domain::entities::schema::TableSchema;
use crate::domain::entities::table::{IfExists, TableRef};
use crate::domain::error::{Result, WarehouseError};
use crate::domain::repositories::warehouse_repository::WarehouseRepository;
use crate::domain::services::identifier::{
    validate_dataset_id, validate_source_uri, validate_table_name,
};

/// CSV ロードユースケース
///
/// ロードジョブの失敗は行単位の拒否も含めて1つの `Load` エラーになる。
/// 不正な行を許容する設定は送らないため、部分的な追記は起こらない。
pub struct LoadCsvUseCase<R: WarehouseRepository> {
    repository: Arc<R>,
    wait: WaitForJobUseCase<R>,
    project_id: String,
    options: WarehouseOptions,
}

impl<R: WarehouseRepository> LoadCsvUseCase<R> {
    pub fn new(repository: Arc<R>, project_id: String, options: WarehouseOptions) -> Self {
        let wait = WaitForJobUseCase::new(repository.clone(), options.poll.clone());
        Self {
            repository,
            wait,
            project_id,
            options,
        }
    }

    /// CSV からテーブルを作成
    ///
    /// # Arguments
    ///
    /// * `dataset` - データセット
    /// * `name` - テーブル名
    /// * `schema` - テーブルスキーマ
    /// * `source_uri` - `gs://` URI（ワイルドカード可）
    /// * `if_exists` - 既存テーブルがある場合の振る舞い
    pub async fn create_from_csv(
        &self,
        dataset: &str,
        name: &str,
        schema: &TableSchema,
        source_uri: &str,
        if_exists: IfExists,
    ) -> Result<()> {
        validate_dataset_id(dataset)?;
        validate_table_name(name)?;
        validate_source_uri(source_uri)?;

        let destination = TableRef::new(&self.project_id, dataset, name);
        let write_disposition = match if_exists {
            IfExists::Fail => {
                if self.exists(&destination).await? {
                    return Err(WarehouseError::TableExists {
                        table: name.to_string(),
                        source: None,
                    });
                }
                WriteDisposition::WriteEmpty
            }
            IfExists::Overwrite => WriteDisposition::WriteTruncate,
        };

        self.run(LoadJob {
            destination,
            source_uris: vec![source_uri.to_string()],
            schema: Some(schema.clone()),
            create_disposition: CreateDisposition::CreateIfNeeded,
            write_disposition,
            csv: self.options.csv.clone(),
        })
        .await
    }

    /// 既存テーブルに CSV を追記
    ///
    /// # Errors
    ///
    /// テーブルが存在しない場合は `TableNotFound`
    pub async fn append_from_csv(&self, dataset: &str, name: &str, source_uri: &str) -> Result<()> {
        validate_dataset_id(dataset)?;
        validate_table_name(name)?;
        validate_source_uri(source_uri)?;

        let destination = TableRef::new(&self.project_id, dataset, name);
        if !self.exists(&destination).await? {
            return Err(WarehouseError::TableNotFound {
                table: name.to_string(),
                source: None,
            });
        }

        self.run(LoadJob {
            destination,
            source_uris: vec![source_uri.to_string()],
            schema: None,
            create_disposition: CreateDisposition::CreateNever,
            write_disposition: WriteDisposition::WriteAppend,
            csv: self.options.csv.clone(),
        })
        .await
    }

    async fn exists(&self, table: &TableRef) -> Result<bool> {
        match self.repository.get_table(table).await {
            Ok(_) => Ok(true),
            Err(e) if e.is_not_found() => Ok(false),
            Err(e) => Err(WarehouseError::classify(e, WarehouseError::Service)),
        }
    }

    async fn run(&self, load: LoadJob) -> Result<()> {
        let reference = JobRef::generate(&self.project_id, self.options.location.clone());
        let destination = load.destination.clone();
        info!(
            "Submitting load job {} into {} from {:?}",
            reference.job_id, destination, load.source_uris
        );

        let status = self
            .repository
            .insert_job(&JobSpec::load(reference.clone(), load))
            .await
            .map_err(|e| WarehouseError::classify(e, WarehouseError::Load))?;
        let status = self.wait.execute(status, WarehouseError::Load).await?;
        if let Some(error) = status.error {
            warn!("Load job {} failed: {}", reference.job_id, error);
            return Err(WarehouseError::classify(error, WarehouseError::Load));
        }
        info!("Loaded into {}", destination);
        Ok(())
    }
}
