use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Who can discover an event.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Visibility {
    #[default]
    Public,
    Private,
}

/// An event guests can join.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Event {
    pub id: String,
    /// Short shareable code, e.g. `ABC123`.
    pub code: String,
    pub title: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub location: Option<String>,
    pub starts_at: DateTime<Utc>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ends_at: Option<DateTime<Utc>>,
    pub host_id: String,
    #[serde(default)]
    pub visibility: Visibility,
    #[serde(default)]
    pub guest_count: u32,
}

impl Event {
    /// Creates an event with the required fields; everything else is empty.
    pub fn new(
        id: impl Into<String>,
        code: impl Into<String>,
        title: impl Into<String>,
        host_id: impl Into<String>,
        starts_at: DateTime<Utc>,
    ) -> Self {
        Self {
            id: id.into(),
            code: code.into(),
            title: title.into(),
            description: None,
            location: None,
            starts_at,
            ends_at: None,
            host_id: host_id.into(),
            visibility: Visibility::Public,
            guest_count: 0,
        }
    }

    pub fn with_location(mut self, location: impl Into<String>) -> Self {
        self.location = Some(location.into());
        self
    }

    pub fn with_ends_at(mut self, ends_at: DateTime<Utc>) -> Self {
        self.ends_at = Some(ends_at);
        self
    }

    /// Returns true if `now` falls between the start and the end of the event.
    ///
    /// Events without an end are considered running from their start on.
    pub fn is_happening_at(&self, now: DateTime<Utc>) -> bool {
        self.starts_at <= now && self.ends_at.is_none_or(|end| now < end)
    }
}

/// Request payload for creating an event.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateEventInput {
    pub title: String,
    pub starts_at: DateTime<Utc>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ends_at: Option<DateTime<Utc>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub location: Option<String>,
    #[serde(default)]
    pub visibility: Visibility,
}

impl CreateEventInput {
    pub fn new(title: impl Into<String>, starts_at: DateTime<Utc>) -> Self {
        Self {
            title: title.into(),
            starts_at,
            ends_at: None,
            description: None,
            location: None,
            visibility: Visibility::Public,
        }
    }
}

/// Partial update for an event. Only present fields are sent.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateEventInput {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub starts_at: Option<DateTime<Utc>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ends_at: Option<DateTime<Utc>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub location: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub visibility: Option<Visibility>,
}

impl UpdateEventInput {
    /// Returns true if the update would not change anything.
    pub fn is_empty(&self) -> bool {
        self == &Self::default()
    }
}

/// Pagination and filters for event listings.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ListEventsQuery {
    pub limit: u32,
    pub offset: u32,
    /// Free-form filters, e.g. `city=Oslo`. Sorted, so equal filter sets
    /// always produce the same cache key.
    pub filters: BTreeMap<String, String>,
}

impl ListEventsQuery {
    pub const DEFAULT_LIMIT: u32 = 20;

    pub fn with_limit(mut self, limit: u32) -> Self {
        self.limit = limit;
        self
    }

    pub fn with_offset(mut self, offset: u32) -> Self {
        self.offset = offset;
        self
    }

    pub fn with_filter(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.filters.insert(name.into(), value.into());
        self
    }

    /// Query string pairs: `limit`, `offset`, then filters by name.
    pub fn pairs(&self) -> Vec<(String, String)> {
        let mut pairs = vec![
            ("limit".to_string(), self.limit.to_string()),
            ("offset".to_string(), self.offset.to_string()),
        ];
        pairs.extend(
            self.filters
                .iter()
                .map(|(name, value)| (name.clone(), value.clone())),
        );
        pairs
    }
}

impl Default for ListEventsQuery {
    fn default() -> Self {
        Self {
            limit: Self::DEFAULT_LIMIT,
            offset: 0,
            filters: BTreeMap::new(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, TimeZone};
    use serde_json::json;

    fn starts_at() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2026, 6, 1, 18, 0, 0).unwrap()
    }

    #[test]
    fn test_event_deserializes_camel_case() {
        let event: Event = serde_json::from_value(json!({
            "id": "evt-1",
            "code": "ABC123",
            "title": "Rooftop party",
            "startsAt": "2026-06-01T18:00:00Z",
            "hostId": "u9",
            "guestCount": 12
        }))
        .unwrap();

        assert_eq!(event.id, "evt-1");
        assert_eq!(event.starts_at, starts_at());
        assert_eq!(event.visibility, Visibility::Public);
        assert_eq!(event.guest_count, 12);
        assert!(event.ends_at.is_none());
    }

    #[test]
    fn test_is_happening_at() {
        let event = Event::new("evt-1", "ABC123", "Party", "u9", starts_at())
            .with_ends_at(starts_at() + Duration::hours(3));

        assert!(!event.is_happening_at(starts_at() - Duration::minutes(1)));
        assert!(event.is_happening_at(starts_at()));
        assert!(!event.is_happening_at(starts_at() + Duration::hours(3)));
    }

    #[test]
    fn test_open_ended_event_keeps_happening() {
        let event = Event::new("evt-1", "ABC123", "Party", "u9", starts_at());
        assert!(event.is_happening_at(starts_at() + Duration::days(2)));
    }

    #[test]
    fn test_update_input_skips_absent_fields() {
        let update = UpdateEventInput {
            title: Some("Renamed".to_string()),
            ..Default::default()
        };

        assert_eq!(
            serde_json::to_value(&update).unwrap(),
            json!({"title": "Renamed"})
        );
        assert!(!update.is_empty());
        assert!(UpdateEventInput::default().is_empty());
    }

    #[test]
    fn test_query_pairs_order() {
        let query = ListEventsQuery::default()
            .with_limit(5)
            .with_filter("z", "1")
            .with_filter("a", "2");

        let names: Vec<String> = query.pairs().into_iter().map(|(name, _)| name).collect();
        assert_eq!(names, vec!["limit", "offset", "a", "z"]);
    }
}
