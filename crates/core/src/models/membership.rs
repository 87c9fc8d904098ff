use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// A guest's answer to an invitation.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RsvpStatus {
    #[default]
    Going,
    Maybe,
    Declined,
}

/// A guest's role within an event.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum GuestRole {
    Host,
    CoHost,
    #[default]
    Guest,
}

/// A user's membership in an event's guest list.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GuestMembership {
    pub event_id: String,
    pub user_id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub display_name: Option<String>,
    #[serde(default)]
    pub status: RsvpStatus,
    #[serde(default)]
    pub role: GuestRole,
    pub joined_at: DateTime<Utc>,
}

impl GuestMembership {
    pub fn new(
        event_id: impl Into<String>,
        user_id: impl Into<String>,
        joined_at: DateTime<Utc>,
    ) -> Self {
        Self {
            event_id: event_id.into(),
            user_id: user_id.into(),
            display_name: None,
            status: RsvpStatus::Going,
            role: GuestRole::Guest,
            joined_at,
        }
    }

    pub fn is_organizer(&self) -> bool {
        matches!(self.role, GuestRole::Host | GuestRole::CoHost)
    }
}

/// Request payload for joining an event.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct JoinEventInput {
    pub event_id: String,
    pub user_id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub status: Option<RsvpStatus>,
}

impl JoinEventInput {
    pub fn new(event_id: impl Into<String>, user_id: impl Into<String>) -> Self {
        Self {
            event_id: event_id.into(),
            user_id: user_id.into(),
            status: None,
        }
    }

    pub fn with_status(mut self, status: RsvpStatus) -> Self {
        self.status = Some(status);
        self
    }
}

/// Identifies the membership to remove when leaving an event.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LeaveEventInput {
    pub event_id: String,
    pub user_id: String,
}

impl LeaveEventInput {
    pub fn new(event_id: impl Into<String>, user_id: impl Into<String>) -> Self {
        Self {
            event_id: event_id.into(),
            user_id: user_id.into(),
        }
    }
}

/// Partial update for a membership.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateMembershipInput {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub status: Option<RsvpStatus>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub role: Option<GuestRole>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_membership_defaults() {
        let membership: GuestMembership = serde_json::from_value(json!({
            "eventId": "evt-1",
            "userId": "u1",
            "joinedAt": "2026-05-01T10:00:00Z"
        }))
        .unwrap();

        assert_eq!(membership.status, RsvpStatus::Going);
        assert_eq!(membership.role, GuestRole::Guest);
        assert!(!membership.is_organizer());
    }

    #[test]
    fn test_role_wire_names() {
        assert_eq!(
            serde_json::to_value(GuestRole::CoHost).unwrap(),
            json!("co_host")
        );
    }

    #[test]
    fn test_join_input_serialization() {
        let input = JoinEventInput::new("evt-1", "u1").with_status(RsvpStatus::Maybe);
        assert_eq!(
            serde_json::to_value(&input).unwrap(),
            json!({"eventId": "evt-1", "userId": "u1", "status": "maybe"})
        );
    }
}
