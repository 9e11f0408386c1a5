//! Record fields that conditions can inspect.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::rules::types::EmailRecord;

/// A record field a condition can test.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Field {
    FromEmail,
    Subject,
    Message,
    ReceivedDate,
}

/// The kind of value a field holds, which decides the predicates allowed on it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FieldCategory {
    Text,
    Timestamp,
}

/// A field's value, borrowed from the record.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FieldValue<'a> {
    Text(&'a str),
    Timestamp(DateTime<Utc>),
}

impl Field {
    /// Parse the rule-file spelling of a field name.
    pub fn parse(name: &str) -> Option<Self> {
        match name {
            "from_email" => Some(Self::FromEmail),
            "subject" => Some(Self::Subject),
            "message" => Some(Self::Message),
            "received_date" => Some(Self::ReceivedDate),
            _ => None,
        }
    }

    /// Rule-file spelling.
    pub fn name(&self) -> &'static str {
        match self {
            Self::FromEmail => "from_email",
            Self::Subject => "subject",
            Self::Message => "message",
            Self::ReceivedDate => "received_date",
        }
    }

    pub fn category(&self) -> FieldCategory {
        match self {
            Self::FromEmail | Self::Subject | Self::Message => FieldCategory::Text,
            Self::ReceivedDate => FieldCategory::Timestamp,
        }
    }

    /// Read this field from a record.
    pub fn extract<'a>(&self, record: &'a EmailRecord) -> FieldValue<'a> {
        match self {
            Self::FromEmail => FieldValue::Text(&record.from_email),
            Self::Subject => FieldValue::Text(&record.subject),
            Self::Message => FieldValue::Text(&record.message),
            Self::ReceivedDate => FieldValue::Timestamp(record.received_date),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn record() -> EmailRecord {
        EmailRecord {
            id: 1,
            from_email: "Alice <alice@example.com>".into(),
            subject: "Lunch?".into(),
            message: "Are you free at noon".into(),
            message_id: "18c2f".into(),
            received_date: Utc.with_ymd_and_hms(2024, 3, 1, 12, 0, 0).unwrap(),
        }
    }

    #[test]
    fn parse_round_trips_names() {
        for field in [
            Field::FromEmail,
            Field::Subject,
            Field::Message,
            Field::ReceivedDate,
        ] {
            assert_eq!(Field::parse(field.name()), Some(field));
        }
        assert_eq!(Field::parse("fromEmail"), None);
        assert_eq!(Field::parse("to_email"), None);
    }

    #[test]
    fn extract_matches_category() {
        let rec = record();
        assert_eq!(
            Field::FromEmail.extract(&rec),
            FieldValue::Text("Alice <alice@example.com>")
        );
        assert_eq!(Field::Subject.extract(&rec), FieldValue::Text("Lunch?"));
        assert_eq!(
            Field::Message.extract(&rec),
            FieldValue::Text("Are you free at noon")
        );
        assert_eq!(
            Field::ReceivedDate.extract(&rec),
            FieldValue::Timestamp(rec.received_date)
        );
        assert_eq!(Field::ReceivedDate.category(), FieldCategory::Timestamp);
        assert_eq!(Field::Message.category(), FieldCategory::Text);
    }
}
