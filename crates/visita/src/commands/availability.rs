//! Availability command handlers.

use tabled::Tabled;
use visita_core::{Command as CoreCommand, CommandResult, Portal, PublishSlotsRequest, TimeSlot};

use crate::cli::{AvailabilityArgs, AvailabilityCommand, GlobalOpts};
use crate::error::CliError;
use crate::output;

use super::util;

// ── Table row ───────────────────────────────────────────────────────

#[derive(Tabled)]
struct SlotRow {
    #[tabled(rename = "Date")]
    date: String,
    #[tabled(rename = "Start")]
    start: String,
    #[tabled(rename = "End")]
    end: String,
    #[tabled(rename = "Slot ID")]
    id: String,
}

impl From<&TimeSlot> for SlotRow {
    fn from(s: &TimeSlot) -> Self {
        Self {
            date: s.date.to_string(),
            start: s.start.to_string(),
            end: s.end.to_string(),
            id: s.id.to_string(),
        }
    }
}

// ── Handler ─────────────────────────────────────────────────────────

pub async fn handle(
    portal: &Portal,
    args: AvailabilityArgs,
    global: &GlobalOpts,
) -> Result<(), CliError> {
    match args.command {
        AvailabilityCommand::Show { property } => {
            let calendar = portal.watch_property(property.into()).await?;

            if calendar.is_empty() && !global.quiet {
                eprintln!("No upcoming availability.");
                return Ok(());
            }

            let slots: Vec<TimeSlot> = calendar
                .iter()
                .flat_map(|(_, slots)| slots.iter().cloned())
                .collect();
            let out = output::render_list(
                &global.output,
                &slots,
                |s| SlotRow::from(s),
                |s| s.id.to_string(),
            );
            output::print_output(&out, global.quiet);
            Ok(())
        }

        AvailabilityCommand::Publish {
            property,
            date,
            times,
        } => {
            let result = portal
                .execute(CoreCommand::PublishSlots(PublishSlotsRequest {
                    property_id: property.into(),
                    date,
                    times,
                }))
                .await?;

            let CommandResult::Slots(created) = result else {
                return Err(CliError::General("unexpected command result".into()));
            };
            if !global.quiet {
                eprintln!("Published {} slot(s) for {date}", created.len());
            }
            let out = output::render_list(
                &global.output,
                &created,
                |s| SlotRow::from(s),
                |s| s.id.to_string(),
            );
            output::print_output(&out, global.quiet);
            Ok(())
        }

        AvailabilityCommand::DeleteSlot { slot } => {
            if !util::confirm(&format!("Delete slot '{slot}'?"), global.yes)? {
                return Ok(());
            }
            portal
                .execute(CoreCommand::DeleteSlot { id: slot.into() })
                .await?;
            if !global.quiet {
                eprintln!("Slot deleted");
            }
            Ok(())
        }

        AvailabilityCommand::Suggest { date } => {
            match portal.suggest_next_window(date) {
                Some((start, end)) => {
                    output::print_output(&format!("{start}-{end}"), global.quiet);
                }
                None => {
                    if !global.quiet {
                        eprintln!("No suggestable window remains for {date}.");
                    }
                }
            }
            Ok(())
        }
    }
}
