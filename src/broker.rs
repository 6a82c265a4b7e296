//! `listing_created` topic on Redis Streams.
//!
//! The topic name is the stream key and every entry carries the JSON event in
//! its `value` field. Consumers read through a consumer group so an entry is
//! redelivered until it is acknowledged: a member first drains its own
//! pending entries (read id `0`) before asking for new ones (read id `>`).

use crate::error::BrokerError;
use async_trait::async_trait;
use redis::{
    AsyncCommands, RedisError,
    aio::MultiplexedConnection,
    streams::{StreamReadOptions, StreamReadReply},
};
use std::sync::{
    Arc,
    atomic::{AtomicBool, Ordering},
};
use tracing::{debug, info};

pub const PAYLOAD_FIELD: &str = "value";

const PENDING_ID: &str = "0";
const NEW_ID: &str = ">";

/// One message handed to the consumer.
#[derive(Debug, Clone, PartialEq)]
pub struct Delivery {
    pub id: String,
    /// Empty when the entry had no `value` field.
    pub payload: Vec<u8>,
}

#[async_trait]
pub trait EventSource: Send + Sync {
    /// Next batch of unacknowledged messages; empty when the topic is idle.
    async fn next_batch(&self) -> Result<Vec<Delivery>, BrokerError>;

    async fn ack(&self, delivery_id: &str) -> Result<(), BrokerError>;
}

#[async_trait]
pub trait EventSink: Send + Sync {
    /// Append a payload to the topic and return the broker's message id.
    async fn publish(&self, payload: &str) -> Result<String, BrokerError>;
}

#[derive(Clone)]
pub struct RedisStream {
    conn: MultiplexedConnection,
    topic: String,
}

impl RedisStream {
    pub async fn connect(url: &str, topic: impl Into<String>) -> Result<Self, BrokerError> {
        let client =
            redis::Client::open(url).map_err(|err| BrokerError::Connection(err.to_string()))?;
        let conn = client
            .get_multiplexed_async_connection()
            .await
            .map_err(|err| BrokerError::Connection(err.to_string()))?;
        Ok(Self {
            conn,
            topic: topic.into(),
        })
    }

    pub fn topic(&self) -> &str {
        &self.topic
    }
}

#[async_trait]
impl EventSink for RedisStream {
    async fn publish(&self, payload: &str) -> Result<String, BrokerError> {
        let mut conn = self.conn.clone();
        let id: String = conn
            .xadd(&self.topic, "*", &[(PAYLOAD_FIELD, payload)])
            .await?;
        Ok(id)
    }
}

/// Group member reading `topic`. The group starts at the beginning of the
/// stream so events published before the first consumer came up are seen.
#[derive(Clone)]
pub struct RedisStreamConsumer {
    stream: RedisStream,
    group: String,
    consumer: String,
    batch_size: usize,
    /// Set while this member may still own delivered but unacked entries.
    backlog: Arc<AtomicBool>,
}

/// Flatten an `XREADGROUP` reply into deliveries, keeping the raw bytes of
/// each entry's `value` field.
pub fn deliveries_from_reply(reply: Option<StreamReadReply>) -> Vec<Delivery> {
    reply
        .map(|reply| reply.keys)
        .unwrap_or_default()
        .into_iter()
        .flat_map(|key| key.ids)
        .map(|entry| Delivery {
            payload: entry.get::<Vec<u8>>(PAYLOAD_FIELD).unwrap_or_default(),
            id: entry.id,
        })
        .collect()
}

/// `XGROUP CREATE` outcome: `Ok(true)` when created, `Ok(false)` when the
/// group already existed.
fn group_created(result: Result<(), RedisError>) -> Result<bool, BrokerError> {
    match result {
        Ok(()) => Ok(true),
        Err(err) if err.code() == Some("BUSYGROUP") => Ok(false),
        Err(err) => Err(err.into()),
    }
}

impl RedisStreamConsumer {
    pub async fn join(
        stream: RedisStream,
        group: impl Into<String>,
        consumer: impl Into<String>,
        batch_size: usize,
    ) -> Result<Self, BrokerError> {
        let group = group.into();
        let mut conn = stream.conn.clone();
        let created = conn
            .xgroup_create_mkstream(&stream.topic, &group, "0")
            .await;
        if group_created(created)? {
            info!(target = "listing_quality.broker", topic = %stream.topic, group = %group, "consumer group created");
        } else {
            debug!(target = "listing_quality.broker", topic = %stream.topic, group = %group, "consumer group exists");
        }
        Ok(Self {
            stream,
            group,
            consumer: consumer.into(),
            batch_size: batch_size.max(1),
            backlog: Arc::new(AtomicBool::new(true)),
        })
    }

    async fn read(&self, id: &str) -> Result<Vec<Delivery>, BrokerError> {
        let mut conn = self.stream.conn.clone();
        let options = StreamReadOptions::default()
            .group(&self.group, &self.consumer)
            .count(self.batch_size);
        let reply: Option<StreamReadReply> = conn
            .xread_options(&[&self.stream.topic], &[id], &options)
            .await?;
        Ok(deliveries_from_reply(reply))
    }
}

#[async_trait]
impl EventSource for RedisStreamConsumer {
    async fn next_batch(&self) -> Result<Vec<Delivery>, BrokerError> {
        if self.backlog.load(Ordering::Acquire) {
            let pending = self.read(PENDING_ID).await?;
            if !pending.is_empty() {
                debug!(
                    target = "listing_quality.broker",
                    consumer = %self.consumer,
                    count = pending.len(),
                    "redelivering pending entries",
                );
                return Ok(pending);
            }
            self.backlog.store(false, Ordering::Release);
        }
        self.read(NEW_ID).await
    }

    async fn ack(&self, delivery_id: &str) -> Result<(), BrokerError> {
        let mut conn = self.stream.conn.clone();
        let acked: Result<i64, RedisError> = conn
            .xack(&self.stream.topic, &self.group, &[delivery_id])
            .await;
        if acked.is_err() {
            self.backlog.store(true, Ordering::Release);
        }
        acked?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use redis::{
        ErrorKind, Value,
        streams::{StreamId, StreamKey},
    };
    use std::collections::HashMap;

    fn entry(id: &str, fields: &[(&str, Vec<u8>)]) -> StreamId {
        StreamId {
            id: id.to_string(),
            map: fields
                .iter()
                .map(|(field, value)| (field.to_string(), Value::BulkString(value.clone())))
                .collect::<HashMap<_, _>>(),
        }
    }

    fn reply(ids: Vec<StreamId>) -> Option<StreamReadReply> {
        Some(StreamReadReply {
            keys: vec![StreamKey {
                key: "listing_created".to_string(),
                ids,
            }],
        })
    }

    #[test]
    fn reply_entries_become_deliveries_in_order() {
        let deliveries = deliveries_from_reply(reply(vec![
            entry("1-0", &[(PAYLOAD_FIELD, br#"{"productId":"a"}"#.to_vec())]),
            entry("2-0", &[(PAYLOAD_FIELD, b"second".to_vec())]),
        ]));
        assert_eq!(
            deliveries,
            vec![
                Delivery {
                    id: "1-0".into(),
                    payload: br#"{"productId":"a"}"#.to_vec(),
                },
                Delivery {
                    id: "2-0".into(),
                    payload: b"second".to_vec(),
                },
            ]
        );
    }

    #[test]
    fn entry_without_value_field_has_empty_payload() {
        let deliveries =
            deliveries_from_reply(reply(vec![entry("3-0", &[("other", b"x".to_vec())])]));
        assert_eq!(deliveries.len(), 1);
        assert_eq!(deliveries[0].id, "3-0");
        assert!(deliveries[0].payload.is_empty());
    }

    #[test]
    fn non_utf8_value_keeps_raw_bytes() {
        let raw = vec![0xff, 0xfe, b'{'];
        let deliveries =
            deliveries_from_reply(reply(vec![entry("4-0", &[(PAYLOAD_FIELD, raw.clone())])]));
        assert_eq!(deliveries[0].payload, raw);
    }

    #[test]
    fn empty_reply_yields_no_deliveries() {
        assert!(deliveries_from_reply(None).is_empty());
        assert!(deliveries_from_reply(Some(StreamReadReply { keys: vec![] })).is_empty());
    }

    #[test]
    fn existing_group_is_not_an_error() {
        assert!(group_created(Ok(())).unwrap());

        let busy = redis::make_extension_error(
            "BUSYGROUP".to_string(),
            Some("Consumer Group name already exists".to_string()),
        );
        assert!(!group_created(Err(busy)).unwrap());

        let other = RedisError::from((
            ErrorKind::ResponseError,
            "WRONGTYPE",
            "not a stream".to_string(),
        ));
        assert!(matches!(group_created(Err(other)), Err(BrokerError::Command(_))));
    }
}
