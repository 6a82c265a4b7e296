use crate::analysis::{
    Analysis, IMAGE_SERVICE, ImageAnalyzer, TEXT_SERVICE, TextAnalyzer, with_fallback,
};
use crate::broker::{Delivery, EventSource, RedisStream, RedisStreamConsumer};
use crate::catalog::CatalogClient;
use crate::config::BrokerConfig;
use crate::error::{BrokerError, ParseError};
use crate::models::{
    ImageAnalysisResult, ListingCreatedEvent, QualityAssessment, TextAnalysisResult,
};
use crate::scoring;
use std::{sync::Arc, time::Duration, time::Instant};
use tracing::{error, info, warn};

/// Scores one listing event at a time against the analysis services and
/// records the result in the catalog.
#[derive(Clone)]
pub struct QualityWorker {
    image: Arc<dyn ImageAnalyzer>,
    text: Arc<dyn TextAnalyzer>,
    catalog: Arc<dyn CatalogClient>,
}

#[derive(Debug, Clone, PartialEq)]
pub enum CatalogWrite {
    Written,
    Failed { reason: String },
}

#[derive(Debug, Clone, PartialEq)]
pub struct EventReport {
    pub product_id: String,
    pub image: Analysis<ImageAnalysisResult>,
    pub text: Analysis<TextAnalysisResult>,
    pub assessment: QualityAssessment,
    pub catalog: CatalogWrite,
}

impl EventReport {
    pub fn outcome(&self) -> &'static str {
        match (&self.catalog, self.image.is_fallback() || self.text.is_fallback()) {
            (CatalogWrite::Failed { .. }, _) => "catalog_failed",
            (CatalogWrite::Written, true) => "degraded",
            (CatalogWrite::Written, false) => "scored",
        }
    }
}

impl QualityWorker {
    pub fn new(
        image: Arc<dyn ImageAnalyzer>,
        text: Arc<dyn TextAnalyzer>,
        catalog: Arc<dyn CatalogClient>,
    ) -> Self {
        Self {
            image,
            text,
            catalog,
        }
    }

    pub async fn handle_payload(&self, payload: &[u8]) -> Result<EventReport, ParseError> {
        let event: ListingCreatedEvent = serde_json::from_slice(payload)?;
        Ok(self.handle_event(&event).await)
    }

    pub async fn handle_event(&self, event: &ListingCreatedEvent) -> EventReport {
        let product_id = event.product_id.as_str();
        info!(
            target = "listing_quality.consumer",
            product_id,
            "processing listing_created event",
        );

        let (image, text) = tokio::join!(
            with_fallback(
                IMAGE_SERVICE,
                product_id,
                self.image.analyze_image(&event.image_url)
            ),
            with_fallback(
                TEXT_SERVICE,
                product_id,
                self.text.analyze_text(&event.title, &event.description)
            ),
        );

        let assessment = scoring::assess(&image.value(), &text.value());
        info!(
            target = "listing_quality.consumer",
            product_id,
            quality_score = assessment.quality_score,
            quality_status = %assessment.quality_status,
            "listing scored",
        );

        let catalog = match self.catalog.put_quality(product_id, &assessment).await {
            Ok(()) => CatalogWrite::Written,
            Err(err) => {
                error!(
                    target = "listing_quality.consumer",
                    product_id,
                    error = %err,
                    "catalog update failed",
                );
                CatalogWrite::Failed {
                    reason: err.to_string(),
                }
            }
        };

        EventReport {
            product_id: event.product_id.clone(),
            image,
            text,
            assessment,
            catalog,
        }
    }

    async fn handle_delivery(&self, delivery: &Delivery) {
        let started = Instant::now();
        let outcome = match self.handle_payload(&delivery.payload).await {
            Ok(report) => report.outcome(),
            Err(err) => {
                warn!(
                    target = "listing_quality.consumer",
                    delivery_id = %delivery.id,
                    error = %err,
                    "skipping malformed message",
                );
                "skipped"
            }
        };
        crate::metrics::event_handled(outcome, started.elapsed().as_millis());
    }
}

/// Handle one batch from `source`, acknowledging every message once it has
/// been processed or skipped. Returns how many messages the batch held.
pub async fn poll_once<S>(worker: &QualityWorker, source: &S) -> Result<usize, BrokerError>
where
    S: EventSource + ?Sized,
{
    let batch = source.next_batch().await?;
    for delivery in &batch {
        worker.handle_delivery(delivery).await;
        if let Err(err) = source.ack(&delivery.id).await {
            warn!(
                target = "listing_quality.consumer",
                delivery_id = %delivery.id,
                error = %err,
                "ack failed, entry stays pending and is read again",
            );
        }
    }
    Ok(batch.len())
}

/// Consume forever. Idle polls and broker errors wait `idle_wait` before the
/// next read.
pub async fn run<S>(worker: QualityWorker, source: S, idle_wait: Duration)
where
    S: EventSource,
{
    info!(target = "listing_quality.consumer", "consumer loop started");
    loop {
        match poll_once(&worker, &source).await {
            Ok(0) => tokio::time::sleep(idle_wait).await,
            Ok(_) => {}
            Err(err) => {
                error!(target = "listing_quality.consumer", error = %err, "broker read failed");
                tokio::time::sleep(idle_wait).await;
            }
        }
    }
}

async fn subscribe(broker: &BrokerConfig) -> Result<RedisStreamConsumer, BrokerError> {
    let stream = RedisStream::connect(&broker.url, &broker.topic).await?;
    RedisStreamConsumer::join(
        stream,
        &broker.group,
        &broker.consumer_name,
        broker.batch_size,
    )
    .await
}

/// Join the consumer group, retrying every `poll_interval` until the broker
/// answers, then consume forever.
pub async fn run_with_broker(worker: QualityWorker, broker: BrokerConfig) {
    let source = loop {
        match subscribe(&broker).await {
            Ok(source) => break source,
            Err(err) => {
                error!(
                    target = "listing_quality.consumer",
                    broker = %broker.url,
                    error = %err,
                    "broker unavailable, retrying",
                );
                tokio::time::sleep(broker.poll_interval).await;
            }
        }
    };
    info!(
        target = "listing_quality.consumer",
        topic = %broker.topic,
        group = %broker.group,
        consumer = %broker.consumer_name,
        "subscribed",
    );
    run(worker, source, broker.poll_interval).await
}
