use crate::broker::EventSink;
use crate::models::ListingCreatedEvent;
use chrono::{DateTime, SecondsFormat, Utc};
use tracing::{error, info};

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct PublishSummary {
    pub sent: usize,
    pub failed: usize,
}

pub fn listing_created(
    product_id: &str,
    image_url: &str,
    title: &str,
    description: &str,
    at: DateTime<Utc>,
) -> ListingCreatedEvent {
    ListingCreatedEvent {
        product_id: product_id.to_string(),
        image_url: image_url.to_string(),
        title: title.to_string(),
        description: description.to_string(),
        timestamp: at.to_rfc3339_opts(SecondsFormat::Millis, true),
    }
}

/// Three demo listings: a clean shirt with marketing claims, blurry jeans and
/// a stock-photo item.
pub fn sample_events(at: DateTime<Utc>) -> Vec<ListingCreatedEvent> {
    vec![
        listing_created(
            "product-123",
            "http://example.com/images/product-123.jpg",
            "Amazing New T-Shirt",
            "This is an amazing new t-shirt made from 100% original cotton. Best quality guaranteed!",
            at,
        ),
        listing_created(
            "product-456",
            "http://example.com/images/blurry-product-456.jpg",
            "Blurry Old Jeans",
            "These are old jeans, not very good quality.",
            at,
        ),
        listing_created(
            "product-789",
            "http://example.com/images/stock-photo-789.jpg",
            "Generic Item",
            "A generic item with no special features.",
            at,
        ),
    ]
}

/// Publish each event in order. A failed send is logged and the rest still
/// go out.
pub async fn publish_all<S>(sink: &S, events: &[ListingCreatedEvent]) -> PublishSummary
where
    S: EventSink + ?Sized,
{
    let mut summary = PublishSummary::default();
    for event in events {
        let payload = match serde_json::to_string(event) {
            Ok(payload) => payload,
            Err(err) => {
                error!(target = "listing_quality.producer", product_id = %event.product_id, error = %err, "event encoding failed");
                summary.failed += 1;
                continue;
            }
        };
        match sink.publish(&payload).await {
            Ok(message_id) => {
                info!(target = "listing_quality.producer", product_id = %event.product_id, %message_id, "sent listing_created event");
                summary.sent += 1;
            }
            Err(err) => {
                error!(target = "listing_quality.producer", product_id = %event.product_id, error = %err, "sending listing_created event failed");
                summary.failed += 1;
            }
        }
    }
    summary
}
