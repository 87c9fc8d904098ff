//! Plain data records exchanged with the backend.
//!
//! Every record uses camelCase field names on the wire. Update inputs are
//! patches: absent fields are not serialized.

mod announcement;
mod event;
mod membership;

pub use announcement::{
    Announcement, CreateAnnouncementInput, ListAnnouncementsQuery, UpdateAnnouncementInput,
};
pub use event::{CreateEventInput, Event, ListEventsQuery, UpdateEventInput, Visibility};
pub use membership::{
    GuestMembership, GuestRole, JoinEventInput, LeaveEventInput, RsvpStatus,
    UpdateMembershipInput,
};
