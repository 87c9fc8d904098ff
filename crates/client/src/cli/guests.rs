//! Guest CLI commands.

use clap::{Parser, Subcommand, ValueEnum};

use gatherly::DataLayer;
use gatherly_core::models::{JoinEventInput, LeaveEventInput, UpdateMembershipInput};

pub use gatherly_core::models::{GuestRole as CoreGuestRole, RsvpStatus as CoreRsvpStatus};

use super::OutputFormat;
use crate::output::{format_output, pretty, Rendered};

/// Guest list commands.
#[derive(Debug, Parser)]
pub struct GuestsCommand {
    #[command(subcommand)]
    pub action: GuestsAction,
}

/// CLI RSVP status (with clap ValueEnum).
#[derive(Debug, Clone, Copy, ValueEnum)]
pub enum RsvpStatus {
    Going,
    Maybe,
    Declined,
}

impl From<RsvpStatus> for CoreRsvpStatus {
    fn from(s: RsvpStatus) -> Self {
        match s {
            RsvpStatus::Going => CoreRsvpStatus::Going,
            RsvpStatus::Maybe => CoreRsvpStatus::Maybe,
            RsvpStatus::Declined => CoreRsvpStatus::Declined,
        }
    }
}

/// CLI guest role (with clap ValueEnum).
#[derive(Debug, Clone, Copy, ValueEnum)]
pub enum GuestRole {
    Host,
    CoHost,
    Guest,
}

impl From<GuestRole> for CoreGuestRole {
    fn from(r: GuestRole) -> Self {
        match r {
            GuestRole::Host => CoreGuestRole::Host,
            GuestRole::CoHost => CoreGuestRole::CoHost,
            GuestRole::Guest => CoreGuestRole::Guest,
        }
    }
}

/// Available guest actions.
#[derive(Debug, Subcommand)]
pub enum GuestsAction {
    /// List the guests of an event.
    List {
        /// Event ID.
        event_id: String,
    },
    /// List the events you have joined.
    Mine,
    /// Show one membership.
    Get {
        /// Event ID.
        event_id: String,
        /// User ID.
        user_id: String,
    },
    /// Join an event.
    Join {
        /// Event ID.
        event_id: String,
        /// User ID.
        #[arg(long)]
        user_id: String,
        /// Initial RSVP.
        #[arg(long, value_enum)]
        status: Option<RsvpStatus>,
    },
    /// Leave an event.
    Leave {
        /// Event ID.
        event_id: String,
        /// User ID.
        #[arg(long)]
        user_id: String,
    },
    /// Change a membership's RSVP or role.
    Update {
        /// Event ID.
        event_id: String,
        /// User ID.
        user_id: String,
        #[arg(long, value_enum)]
        status: Option<RsvpStatus>,
        #[arg(long, value_enum)]
        role: Option<GuestRole>,
    },
}

impl GuestsCommand {
    pub async fn run(self, layer: &DataLayer, format: OutputFormat) -> Rendered {
        let guests = layer.guests();
        match self.action {
            GuestsAction::List { event_id } => format_output(
                &guests.list_event_guests(&event_id).await,
                format,
                |found| pretty::format_memberships(found),
            ),
            GuestsAction::Mine => format_output(&guests.list_my_events().await, format, |found| {
                pretty::format_events(found)
            }),
            GuestsAction::Get { event_id, user_id } => format_output(
                &guests.get_membership(&event_id, &user_id).await,
                format,
                pretty::format_membership,
            ),
            GuestsAction::Join {
                event_id,
                user_id,
                status,
            } => {
                let mut input = JoinEventInput::new(event_id, user_id);
                if let Some(status) = status {
                    input = input.with_status(status.into());
                }
                format_output(&guests.join(&input).await, format, pretty::format_membership)
            }
            GuestsAction::Leave { event_id, user_id } => {
                let input = LeaveEventInput::new(event_id, user_id);
                format_output(&guests.leave(&input).await, format, |_| {
                    format!("Left event {}.", input.event_id)
                })
            }
            GuestsAction::Update {
                event_id,
                user_id,
                status,
                role,
            } => {
                let input = UpdateMembershipInput {
                    status: status.map(Into::into),
                    role: role.map(Into::into),
                };
                if input == UpdateMembershipInput::default() {
                    return Rendered::Failure("Nothing to update.".to_string());
                }
                format_output(
                    &guests.update_membership(&event_id, &user_id, &input).await,
                    format,
                    pretty::format_membership,
                )
            }
        }
    }
}
