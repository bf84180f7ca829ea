//! Inbound event batches in the queue-trigger shape
//!
//! `{"Records": [{"body": "<event json>"}, ...]}`, bodies in delivery order.

use grantsync_core::Event;
use serde::Deserialize;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum InboundError {
    #[error("malformed records batch: {0}")]
    Batch(#[source] serde_json::Error),

    #[error("record {index} does not hold an event: {source}")]
    Record {
        index: usize,
        #[source]
        source: serde_json::Error,
    },
}

#[derive(Debug, Deserialize)]
pub struct QueueRecords {
    #[serde(rename = "Records")]
    pub records: Vec<QueueRecord>,
}

#[derive(Debug, Deserialize)]
pub struct QueueRecord {
    pub body: String,
}

impl QueueRecords {
    pub fn parse(input: &str) -> Result<Self, InboundError> {
        serde_json::from_str(input).map_err(InboundError::Batch)
    }

    /// Decode every body, failing on the first that is not an event.
    pub fn events(&self) -> Result<Vec<Event>, InboundError> {
        self.records
            .iter()
            .enumerate()
            .map(|(index, record)| {
                serde_json::from_str(&record.body).map_err(|source| InboundError::Record { index, source })
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use grantsync_core::EventType;

    #[test]
    fn decodes_bodies_in_order() {
        let first = Event::activated("e-1", "a-1").to_json().unwrap();
        let second = Event::deactivated("e-2", "a-1").to_json().unwrap();
        let input = serde_json::json!({"Records": [{"body": first}, {"body": second}]}).to_string();

        let events = QueueRecords::parse(&input).unwrap().events().unwrap();
        assert_eq!(events.len(), 2);
        assert_eq!(events[0].event_type(), EventType::Activated);
        assert_eq!(events[1].id, "e-2");
    }

    #[test]
    fn bad_body_names_its_index() {
        let input = r#"{"Records": [{"body": "{\"id\":\"e-1\",\"type\":\"x\"}"}, {"body": "nope"}]}"#;
        match QueueRecords::parse(input).unwrap().events() {
            Err(InboundError::Record { index, .. }) => assert_eq!(index, 1),
            other => panic!("Expected record error, got {:?}", other),
        }
    }

    #[test]
    fn missing_records_key_fails() {
        assert!(matches!(
            QueueRecords::parse(r#"{"records": []}"#),
            Err(InboundError::Batch(_))
        ));
    }
}
