//! # Wait For Job Use Case
//!
//! ジョブ完了待ちユースケース（上限付きポーリング）

use std::sync::Arc;

use log::{debug, info};
use tokio::time::{sleep, Instant};

use crate::application::dto::warehouse_options::PollOptions;
use crate::domain::entities::job::JobStatus;
use crate::domain::error::{Result, ServiceError, WarehouseError};
use crate::domain::repositories::warehouse_repository::WarehouseRepository;

/// ジョブ完了待ちユースケース
///
/// `interval` ごとにジョブ状態を取得し、`timeout` を超えたら `Timeout` を返す。
/// 失敗したリクエストのリトライは行わない。
pub struct WaitForJobUseCase<R: WarehouseRepository> {
    repository: Arc<R>,
    poll: PollOptions,
}

impl<R: WarehouseRepository> WaitForJobUseCase<R> {
    pub fn new(repository: Arc<R>, poll: PollOptions) -> Self {
        Self { repository, poll }
    }

    pub fn poll_options(&self) -> &PollOptions {
        &self.poll
    }

    /// ジョブが DONE になるまで待つ
    ///
    /// # Arguments
    ///
    /// * `status` - 投入直後のジョブ状態
    /// * `classify` - ジョブ状態取得の失敗をエラー種別に変換する関数
    ///
    /// # Returns
    ///
    /// DONE になったジョブ状態（ジョブ自体の失敗は `error` に入る）
    pub async fn execute(
        &self,
        status: JobStatus,
        classify: fn(ServiceError) -> WarehouseError,
    ) -> Result<JobStatus> {
        let deadline = Instant::now() + self.poll.timeout;
        let job = status.reference.clone();
        let mut status = status;

        info!("Waiting for job {} to finish...", job.job_id);
        loop {
            if status.is_done() {
                info!("Job {} complete.", job.job_id);
                return Ok(status);
            }
            if Instant::now() + self.poll.interval > deadline {
                return Err(WarehouseError::Timeout(format!(
                    "job {} did not finish within {:?}",
                    job.job_id, self.poll.timeout
                )));
            }

            sleep(self.poll.interval).await;
            status = self
                .repository
                .get_job(&job)
                .await
                .map_err(|e| WarehouseError::classify(e, classify))?;
            debug!("Job {} state: {:?}", job.job_id, status.state);
        }
    }
}
