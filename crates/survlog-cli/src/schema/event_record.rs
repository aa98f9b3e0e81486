use anyhow::Context;
use chrono::{DateTime, Utc};
use serde::Deserialize;
use survlog_analysis::event::Event;

/// One line of an event log file.
///
/// ```json
/// {"timestamp": 1433221332117, "visitorid": 257597, "event": "view"}
/// {"timestamp": "2015-06-02T05:02:12Z", "subject": "u-42", "event": "transaction"}
/// ```
#[derive(Debug, Clone, Deserialize)]
pub struct EventRecord {
    /// Subject identifier
    #[serde(alias = "visitorid")]
    pub subject: SubjectId,
    /// Event type label
    #[serde(alias = "event_type")]
    pub event: String,
    /// Epoch milliseconds or RFC 3339 timestamp
    pub timestamp: Timestamp,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(untagged)]
pub enum SubjectId {
    Integer(i64),
    Text(String),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(untagged)]
pub enum Timestamp {
    EpochMillis(i64),
    Rfc3339(DateTime<Utc>),
}

impl SubjectId {
    fn into_string(self) -> String {
        match self {
            SubjectId::Integer(id) => id.to_string(),
            SubjectId::Text(id) => id,
        }
    }
}

impl Timestamp {
    fn to_utc(self) -> Option<DateTime<Utc>> {
        match self {
            Timestamp::EpochMillis(millis) => DateTime::from_timestamp_millis(millis),
            Timestamp::Rfc3339(ts) => Some(ts),
        }
    }
}

impl EventRecord {
    pub fn into_event(self) -> anyhow::Result<Event> {
        let timestamp = self
            .timestamp
            .to_utc()
            .with_context(|| format!("Timestamp out of range: {:?}", self.timestamp))?;
        Ok(Event::new(
            self.subject.into_string(),
            self.event,
            timestamp,
        ))
    }
}

#[cfg(test)]
mod tests {
    use chrono::TimeZone as _;

    use super::*;

    #[test]
    fn test_epoch_millis_with_visitor_alias() {
        let record: EventRecord = serde_json::from_str(
            r#"{"timestamp": 1433221332117, "visitorid": 257597, "event": "view", "itemid": 355908}"#,
        )
        .unwrap();
        let event = record.into_event().unwrap();
        assert_eq!(event.subject, "257597");
        assert_eq!(event.event_type, "view");
        assert_eq!(
            event.timestamp,
            Utc.timestamp_millis_opt(1_433_221_332_117).unwrap()
        );
    }

    #[test]
    fn test_rfc3339_with_text_subject() {
        let record: EventRecord = serde_json::from_str(
            r#"{"timestamp": "2015-06-02T05:02:12+02:00", "subject": "u-42", "event_type": "transaction"}"#,
        )
        .unwrap();
        let event = record.into_event().unwrap();
        assert_eq!(event.subject, "u-42");
        assert_eq!(event.event_type, "transaction");
        assert_eq!(
            event.timestamp,
            Utc.with_ymd_and_hms(2015, 6, 2, 3, 2, 12).unwrap()
        );
    }

    #[test]
    fn test_missing_field_is_rejected() {
        let result = serde_json::from_str::<EventRecord>(r#"{"subject": "a", "event": "view"}"#);
        assert!(result.is_err());
    }

    #[test]
    fn test_out_of_range_millis() {
        let record = EventRecord {
            subject: SubjectId::Integer(1),
            event: "view".to_owned(),
            timestamp: Timestamp::EpochMillis(i64::MAX),
        };
        assert!(record.into_event().is_err());
    }
}
