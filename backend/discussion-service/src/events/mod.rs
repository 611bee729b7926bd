//! Outbound events
//!
//! Moderation requests and e-mail notifications are published to Kafka as JSON, keyed by a stable
//! identifier so retries land on the same partition.

pub mod moderation;
pub mod notification;

pub use moderation::ModerationRequest;
pub use notification::{EmailNotification, EmailTemplate};

use crate::config::KafkaConfig;
use crate::error::{AppError, Result};
use crate::metrics::EVENTS_PUBLISHED_TOTAL;
use async_trait::async_trait;
use rdkafka::config::ClientConfig;
use rdkafka::producer::{FutureProducer, FutureRecord};
use std::time::Duration;
use tracing::{debug, error, info};

#[async_trait]
pub trait EventPublisher: Send + Sync {
    async fn publish_moderation(&self, request: &ModerationRequest) -> Result<()>;

    async fn publish_notification(&self, notification: &EmailNotification) -> Result<()>;
}

#[derive(Clone)]
pub struct KafkaEventPublisher {
    producer: FutureProducer,
    moderation_topic: String,
    notification_topic: String,
    timeout: Duration,
}

impl KafkaEventPublisher {
    pub fn new(config: &KafkaConfig) -> Result<Self> {
        let brokers = config.brokers.join(",");
        let producer: FutureProducer = ClientConfig::new()
            .set("bootstrap.servers", &brokers)
            .set("message.timeout.ms", config.request_timeout_ms.to_string())
            .set("acks", "all")
            .set("enable.idempotence", "true")
            .set("retries", "3")
            .set("retry.backoff.ms", "100")
            .create()
            .map_err(|e| AppError::Messaging(format!("Failed to create Kafka producer: {}", e)))?;

        info!(
            brokers = %brokers,
            moderation_topic = %config.moderation_topic,
            notification_topic = %config.notification_topic,
            "KafkaEventPublisher initialized"
        );

        Ok(Self {
            producer,
            moderation_topic: config.moderation_topic.clone(),
            notification_topic: config.notification_topic.clone(),
            timeout: Duration::from_millis(config.request_timeout_ms),
        })
    }

    async fn send(&self, kind: &'static str, topic: &str, key: &str, payload: String) -> Result<()> {
        let record = FutureRecord::to(topic).key(key).payload(&payload);

        match self.producer.send(record, self.timeout).await {
            Ok((partition, offset)) => {
                EVENTS_PUBLISHED_TOTAL
                    .with_label_values(&[kind, "success"])
                    .inc();
                debug!(kind, key, partition, offset, "Event published to Kafka");
                Ok(())
            }
            Err((e, _)) => {
                EVENTS_PUBLISHED_TOTAL
                    .with_label_values(&[kind, "failure"])
                    .inc();
                error!(kind, key, topic, error = %e, "Failed to publish event to Kafka");
                Err(AppError::Messaging(format!(
                    "Failed to send {} event: {}",
                    kind, e
                )))
            }
        }
    }
}

#[async_trait]
impl EventPublisher for KafkaEventPublisher {
    async fn publish_moderation(&self, request: &ModerationRequest) -> Result<()> {
        let payload = serde_json::to_string(request)?;
        self.send("moderation", &self.moderation_topic, &request.id, payload)
            .await?;
        info!(
            id = %request.id,
            content_id = %request.content_id,
            "Moderation event sent"
        );
        Ok(())
    }

    async fn publish_notification(&self, notification: &EmailNotification) -> Result<()> {
        let payload = serde_json::to_string(notification)?;
        self.send(
            "notification",
            &self.notification_topic,
            &notification.user_id,
            payload,
        )
        .await
    }
}
