use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// A message posted by an organizer to everyone in an event.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Announcement {
    pub id: String,
    pub event_id: String,
    pub author_id: String,
    pub title: String,
    pub body: String,
    #[serde(default)]
    pub pinned: bool,
    pub created_at: DateTime<Utc>,
}

/// Request payload for posting an announcement.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateAnnouncementInput {
    pub event_id: String,
    pub title: String,
    pub body: String,
    #[serde(default)]
    pub pinned: bool,
}

impl CreateAnnouncementInput {
    pub fn new(
        event_id: impl Into<String>,
        title: impl Into<String>,
        body: impl Into<String>,
    ) -> Self {
        Self {
            event_id: event_id.into(),
            title: title.into(),
            body: body.into(),
            pinned: false,
        }
    }
}

/// Partial update for an announcement.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateAnnouncementInput {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub body: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub pinned: Option<bool>,
}

/// Pagination for announcement listings.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ListAnnouncementsQuery {
    pub limit: u32,
    pub offset: u32,
}

impl ListAnnouncementsQuery {
    pub const DEFAULT_LIMIT: u32 = 50;

    pub fn pairs(&self) -> Vec<(String, String)> {
        vec![
            ("limit".to_string(), self.limit.to_string()),
            ("offset".to_string(), self.offset.to_string()),
        ]
    }
}

impl Default for ListAnnouncementsQuery {
    fn default() -> Self {
        Self {
            limit: Self::DEFAULT_LIMIT,
            offset: 0,
        }
    }
}
