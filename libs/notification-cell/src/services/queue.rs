use deadpool_redis::{Config, Connection, Pool, Runtime};
use redis::AsyncCommands;
use tracing::debug;

use shared_config::AppConfig;

use crate::{NotificationError, NotificationJob};

/// Seven days, matching how long delivery state stays inspectable.
const JOB_TTL_SECONDS: i64 = 604800;

const PENDING_QUEUE_KEY: &str = "notification_queue:pending";

/// Producer side of the notification queue. The mail worker that pops
/// `notification_queue:pending` and sends the actual emails lives outside
/// this codebase.
pub struct NotificationQueueService {
    pool: Pool,
}

impl NotificationQueueService {
    pub fn new(config: &AppConfig) -> Result<Self, NotificationError> {
        let redis_url = config
            .redis_url
            .clone()
            .unwrap_or_else(|| "redis://localhost:6379".to_string());

        let cfg = Config::from_url(redis_url);
        let pool = cfg
            .create_pool(Some(Runtime::Tokio1))
            .map_err(|e| NotificationError::Pool(format!("Pool creation error: {}", e)))?;

        Ok(Self { pool })
    }

    pub async fn enqueue(&self, job: &NotificationJob) -> Result<(), NotificationError> {
        let mut conn = self.get_connection().await?;

        let job_data = serde_json::to_string(job)?;

        // Store job details in hash
        let job_key = format!("notification_job:{}", job.job_id);
        let _: () = conn
            .hset_multiple(
                &job_key,
                &[
                    ("data", job_data.as_str()),
                    ("event", &job.event.to_string()),
                    ("subject_id", &job.subject_id.to_string()),
                    ("created_at", &job.created_at.to_rfc3339()),
                ],
            )
            .await?;

        let _: () = conn.expire(&job_key, JOB_TTL_SECONDS).await?;

        // Hand the job id to the delivery worker
        let _: () = conn.lpush(PENDING_QUEUE_KEY, job.job_id.to_string()).await?;

        debug!("Notification job {} enqueued ({})", job.job_id, job.event);
        Ok(())
    }

    async fn get_connection(&self) -> Result<Connection, NotificationError> {
        self.pool
            .get()
            .await
            .map_err(|e| NotificationError::Pool(e.to_string()))
    }
}
