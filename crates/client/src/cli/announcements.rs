//! Announcement CLI commands.

use clap::{Parser, Subcommand};

use gatherly::DataLayer;
use gatherly_core::models::{
    CreateAnnouncementInput, ListAnnouncementsQuery, UpdateAnnouncementInput,
};

use super::OutputFormat;
use crate::output::{format_output, pretty, Rendered};

/// Announcement commands.
#[derive(Debug, Parser)]
pub struct AnnouncementsCommand {
    #[command(subcommand)]
    pub action: AnnouncementsAction,
}

/// Available announcement actions.
#[derive(Debug, Subcommand)]
pub enum AnnouncementsAction {
    /// List an event's announcements.
    List {
        /// Event ID.
        event_id: String,
        #[arg(long, default_value_t = ListAnnouncementsQuery::DEFAULT_LIMIT)]
        limit: u32,
        #[arg(long, default_value_t = 0)]
        offset: u32,
    },
    /// Get an announcement by ID.
    Get {
        /// Announcement ID.
        id: String,
    },
    /// Post an announcement to an event.
    Create {
        /// Event ID.
        event_id: String,
        #[arg(long)]
        title: String,
        #[arg(long)]
        body: String,
        /// Pin the announcement to the top.
        #[arg(long)]
        pinned: bool,
    },
    /// Edit an announcement.
    Update {
        /// Announcement ID.
        id: String,
        #[arg(long)]
        title: Option<String>,
        #[arg(long)]
        body: Option<String>,
        #[arg(long)]
        pinned: Option<bool>,
    },
    /// Delete an announcement.
    Delete {
        /// Announcement ID.
        id: String,
    },
}

impl AnnouncementsCommand {
    pub async fn run(self, layer: &DataLayer, format: OutputFormat) -> Rendered {
        let announcements = layer.announcements();
        match self.action {
            AnnouncementsAction::List {
                event_id,
                limit,
                offset,
            } => {
                let query = ListAnnouncementsQuery { limit, offset };
                format_output(
                    &announcements.list_for_event(&event_id, &query).await,
                    format,
                    |found| pretty::format_announcements(found),
                )
            }
            AnnouncementsAction::Get { id } => format_output(
                &announcements.get_by_id(&id).await,
                format,
                pretty::format_announcement,
            ),
            AnnouncementsAction::Create {
                event_id,
                title,
                body,
                pinned,
            } => {
                let input = CreateAnnouncementInput {
                    pinned,
                    ..CreateAnnouncementInput::new(event_id, title, body)
                };
                format_output(
                    &announcements.create(&input).await,
                    format,
                    pretty::format_announcement,
                )
            }
            AnnouncementsAction::Update {
                id,
                title,
                body,
                pinned,
            } => {
                let input = UpdateAnnouncementInput {
                    title,
                    body,
                    pinned,
                };
                if input == UpdateAnnouncementInput::default() {
                    return Rendered::Failure("Nothing to update.".to_string());
                }
                format_output(
                    &announcements.update(&id, &input).await,
                    format,
                    pretty::format_announcement,
                )
            }
            AnnouncementsAction::Delete { id } => format_output(
                &announcements.delete(&id).await,
                format,
                |_| format!("Deleted announcement {}.", id),
            ),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cli::{Cli, Commands};

    #[test]
    fn test_list_defaults() {
        let cli = Cli::try_parse_from(["gatherly", "announcements", "list", "evt-1"]).unwrap();
        let Commands::Announcements(AnnouncementsCommand {
            action: AnnouncementsAction::List { limit, offset, .. },
        }) = cli.command
        else {
            panic!("expected announcements list");
        };

        assert_eq!(limit, ListAnnouncementsQuery::DEFAULT_LIMIT);
        assert_eq!(offset, 0);
    }

    #[test]
    fn test_update_pinned_takes_a_value() {
        let cli = Cli::try_parse_from([
            "gatherly",
            "announcements",
            "update",
            "ann-1",
            "--pinned",
            "false",
        ])
        .unwrap();
        let Commands::Announcements(AnnouncementsCommand {
            action: AnnouncementsAction::Update { pinned, .. },
        }) = cli.command
        else {
            panic!("expected announcements update");
        };

        assert_eq!(pinned, Some(false));
    }
}
