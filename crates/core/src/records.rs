use chrono::{DateTime, SecondsFormat, Utc};
use serde::{Deserialize, Serialize};

/// A prospective customer contact captured for follow-up.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct LeadRecord {
    pub timestamp: String,
    pub email: String,
    pub name: String,
    pub message: String,
}

/// An unanswered question or piece of feedback routed to a human.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct FeedbackRecord {
    pub timestamp: String,
    pub question: String,
}

/// Closed set of record kinds the journal accepts. Records are
/// write-once: nothing in this system updates or deletes an entry.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum JournalRecord {
    Lead(LeadRecord),
    Feedback(FeedbackRecord),
}

impl JournalRecord {
    pub fn lead(
        email: impl Into<String>,
        name: impl Into<String>,
        message: impl Into<String>,
    ) -> Self {
        Self::Lead(LeadRecord {
            timestamp: utc_timestamp(Utc::now()),
            email: email.into(),
            name: name.into(),
            message: message.into(),
        })
    }

    pub fn feedback(question: impl Into<String>) -> Self {
        Self::Feedback(FeedbackRecord {
            timestamp: utc_timestamp(Utc::now()),
            question: question.into(),
        })
    }

    pub fn kind(&self) -> &'static str {
        match self {
            Self::Lead(_) => "lead",
            Self::Feedback(_) => "feedback",
        }
    }

    pub fn timestamp(&self) -> &str {
        match self {
            Self::Lead(record) => &record.timestamp,
            Self::Feedback(record) => &record.timestamp,
        }
    }
}

fn utc_timestamp(at: DateTime<Utc>) -> String {
    at.to_rfc3339_opts(SecondsFormat::Micros, true)
}

#[cfg(test)]
mod tests {
    use super::JournalRecord;

    #[test]
    fn lead_record_serializes_with_type_tag_and_utc_timestamp() {
        let record = JournalRecord::lead("jane@example.com", "Jane Doe", "interested in a quote");

        let json = serde_json::to_value(&record).expect("record should serialize");
        assert_eq!(json["type"], "lead");
        assert_eq!(json["email"], "jane@example.com");
        assert_eq!(json["name"], "Jane Doe");
        let timestamp = json["timestamp"].as_str().expect("timestamp should be a string");
        assert!(timestamp.ends_with('Z'), "timestamp should be UTC: {timestamp}");
    }

    #[test]
    fn feedback_record_round_trips_through_json() {
        let record = JournalRecord::feedback("What is your cancellation policy?");

        let line = serde_json::to_string(&record).expect("record should serialize");
        let parsed: JournalRecord = serde_json::from_str(&line).expect("line should parse back");
        assert_eq!(parsed, record);
        assert_eq!(parsed.kind(), "feedback");
    }
}
