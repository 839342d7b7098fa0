use tracing::{debug, warn};
use uuid::Uuid;

use shared_config::AppConfig;

use crate::{NotificationError, NotificationEvent, NotificationJob};
use crate::services::queue::NotificationQueueService;

/// Entry point the other cells call. `notify` is fire-and-forget: it spawns
/// the enqueue onto the runtime and returns before the queue is touched, so
/// an HTTP response never waits on Redis. Enqueue failures are logged and
/// never reach the caller.
pub struct NotificationService {
    config: AppConfig,
}

impl NotificationService {
    pub fn new(config: &AppConfig) -> Self {
        Self {
            config: config.clone(),
        }
    }

    pub fn notify(&self, event: NotificationEvent, subject_id: Uuid) {
        let config = self.config.clone();
        tokio::spawn(async move {
            if let Err(e) = enqueue_notification(&config, event, subject_id).await {
                warn!(
                    "Failed to enqueue {} notification for {}: {}",
                    event, subject_id, e
                );
            }
        });
    }
}

async fn enqueue_notification(
    config: &AppConfig,
    event: NotificationEvent,
    subject_id: Uuid,
) -> Result<(), NotificationError> {
    let queue = NotificationQueueService::new(config)?;
    let job = NotificationJob::new(event, subject_id);
    queue.enqueue(&job).await?;

    debug!("Queued {} notification for subject {}", event, subject_id);
    Ok(())
}
