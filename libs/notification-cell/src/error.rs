use thiserror::Error;

#[derive(Error, Debug)]
pub enum NotificationError {
    #[error("Queue pool error: {0}")]
    Pool(String),

    #[error("Redis error: {0}")]
    Redis(#[from] redis::RedisError),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}
