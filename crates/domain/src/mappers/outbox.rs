//! Outbox item codec.
//!
//! Also decodes capture-stream snapshots, which carry the same attribute
//! layout as the stored item.

use chrono::{DateTime, Utc};

use crate::mappers::MapError;
use crate::outbox::{OutboxRecord, OutboxStatus};
use crate::shared_kernel::OutboxId;
use crate::store::{AttributeValue, Item};

pub const ID: &str = "Id";
pub const EVENT_TYPE: &str = "eventType";
pub const AGGREGATE_TYPE: &str = "aggregateType";
pub const AGGREGATE_ID: &str = "aggregateId";
pub const PAYLOAD_JSON: &str = "payloadJson";
pub const STATUS: &str = "status";
pub const OCCURRED_AT_UTC: &str = "occurredAtUtc";
pub const SENT_AT: &str = "sentAt";
pub const ATTEMPTS: &str = "attempts";
pub const IDEMPOTENCY_KEY: &str = "idempotencyKey";

pub fn to_item(record: &OutboxRecord) -> Item {
    let mut item = Item::with_capacity(10);
    item.insert(ID.to_string(), AttributeValue::s(record.id.as_str()));
    item.insert(
        EVENT_TYPE.to_string(),
        AttributeValue::s(record.event_type.clone()),
    );
    item.insert(
        AGGREGATE_TYPE.to_string(),
        AttributeValue::s(record.aggregate_type.clone()),
    );
    item.insert(
        AGGREGATE_ID.to_string(),
        AttributeValue::s(record.aggregate_id.clone()),
    );
    item.insert(
        PAYLOAD_JSON.to_string(),
        AttributeValue::s(record.payload_json.clone()),
    );
    item.insert(
        STATUS.to_string(),
        AttributeValue::s(record.status.as_str()),
    );
    item.insert(
        OCCURRED_AT_UTC.to_string(),
        AttributeValue::s(record.occurred_at_utc.to_rfc3339()),
    );
    item.insert(ATTEMPTS.to_string(), AttributeValue::n(record.attempts as i64));

    if let Some(sent_at) = record.sent_at {
        item.insert(SENT_AT.to_string(), AttributeValue::s(sent_at.to_rfc3339()));
    }
    if let Some(key) = &record.idempotency_key {
        item.insert(IDEMPOTENCY_KEY.to_string(), AttributeValue::s(key.clone()));
    }

    item
}

pub fn from_item(item: &Item) -> Result<OutboxRecord, MapError> {
    let status = required_s(item, STATUS)?;
    let status = OutboxStatus::parse(status).ok_or(MapError::Invalid(STATUS))?;

    let occurred_at_utc = parse_timestamp(required_s(item, OCCURRED_AT_UTC)?)
        .ok_or(MapError::Invalid(OCCURRED_AT_UTC))?;

    let sent_at = match item.get(SENT_AT).and_then(AttributeValue::as_s) {
        Some(raw) => Some(parse_timestamp(raw).ok_or(MapError::Invalid(SENT_AT))?),
        None => None,
    };

    Ok(OutboxRecord {
        id: OutboxId(required_s(item, ID)?.to_string()),
        event_type: required_s(item, EVENT_TYPE)?.to_string(),
        aggregate_type: required_s(item, AGGREGATE_TYPE)?.to_string(),
        aggregate_id: required_s(item, AGGREGATE_ID)?.to_string(),
        payload_json: required_s(item, PAYLOAD_JSON)?.to_string(),
        status,
        occurred_at_utc,
        sent_at,
        attempts: item
            .get(ATTEMPTS)
            .and_then(AttributeValue::as_n)
            .unwrap_or(0) as i32,
        idempotency_key: item
            .get(IDEMPOTENCY_KEY)
            .and_then(AttributeValue::as_s)
            .map(str::to_string),
    })
}

fn required_s<'a>(item: &'a Item, name: &'static str) -> Result<&'a str, MapError> {
    item.get(name)
        .and_then(AttributeValue::as_s)
        .ok_or(MapError::Missing(name))
}

fn parse_timestamp(raw: &str) -> Option<DateTime<Utc>> {
    DateTime::parse_from_rfc3339(raw)
        .ok()
        .map(|ts| ts.with_timezone(&Utc))
}
