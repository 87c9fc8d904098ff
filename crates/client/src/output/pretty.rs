//! Pretty output formatting.

use gatherly_core::models::{Announcement, Event, GuestMembership};
use gatherly_core::service::ServiceResult;

const TIME_FORMAT: &str = "%Y-%m-%d %H:%M UTC";

/// Format a result, delegating successes to `format`.
pub fn format_result<T>(result: &ServiceResult<T>, format: impl FnOnce(&T) -> String) -> String {
    match result {
        ServiceResult::Success { data, message } => {
            let mut output = format(data);
            if let Some(message) = message {
                output.push_str(&format!("\n{}", message));
            }
            output
        }
        ServiceResult::Failure(error) => format!("Error: {} ({})", error.message, error.code),
    }
}

/// Format an event for display.
pub fn format_event(event: &Event) -> String {
    let mut output = format!(
        "{} [{}]\n  ID: {}\n  Starts: {}",
        event.title,
        event.code,
        event.id,
        event.starts_at.format(TIME_FORMAT)
    );
    if let Some(ends_at) = &event.ends_at {
        output.push_str(&format!("\n  Ends: {}", ends_at.format(TIME_FORMAT)));
    }
    if let Some(loc) = &event.location {
        output.push_str(&format!("\n  Location: {}", loc));
    }
    if let Some(desc) = &event.description {
        output.push_str(&format!("\n  Description: {}", desc));
    }
    output.push_str(&format!("\n  Guests: {}", event.guest_count));
    output
}

/// Format events for display.
pub fn format_events(events: &[Event]) -> String {
    if events.is_empty() {
        return "No events found.".to_string();
    }
    let mut output = format!("EVENTS ({})\n", events.len());
    output.push_str(&"-".repeat(40));
    for event in events {
        output.push_str(&format!("\n{}", format_event(event)));
        output.push('\n');
    }
    output
}

/// Format a membership for display.
pub fn format_membership(membership: &GuestMembership) -> String {
    let name = membership
        .display_name
        .as_deref()
        .unwrap_or(&membership.user_id);
    format!(
        "{} ({:?}, {:?})\n  User: {}\n  Event: {}\n  Joined: {}",
        name,
        membership.role,
        membership.status,
        membership.user_id,
        membership.event_id,
        membership.joined_at.format(TIME_FORMAT)
    )
}

/// Format memberships for display.
pub fn format_memberships(memberships: &[GuestMembership]) -> String {
    if memberships.is_empty() {
        return "No guests found.".to_string();
    }
    let mut output = format!("GUESTS ({})\n", memberships.len());
    output.push_str(&"-".repeat(40));
    for membership in memberships {
        output.push_str(&format!("\n{}", format_membership(membership)));
        output.push('\n');
    }
    output
}

/// Format an announcement for display.
pub fn format_announcement(announcement: &Announcement) -> String {
    let pin = if announcement.pinned { " [pinned]" } else { "" };
    format!(
        "{}{}\n  ID: {}\n  Event: {}\n  Posted: {}\n\n{}",
        announcement.title,
        pin,
        announcement.id,
        announcement.event_id,
        announcement.created_at.format(TIME_FORMAT),
        announcement.body
    )
}

/// Format announcements for display.
pub fn format_announcements(announcements: &[Announcement]) -> String {
    if announcements.is_empty() {
        return "No announcements found.".to_string();
    }
    let mut output = format!("ANNOUNCEMENTS ({})\n", announcements.len());
    output.push_str(&"-".repeat(40));
    for announcement in announcements {
        output.push_str(&format!("\n{}", format_announcement(announcement)));
        output.push('\n');
    }
    output
}
