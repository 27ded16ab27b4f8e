//! Visit-request command handlers.

use std::sync::Arc;

use owo_colors::OwoColorize;
use tabled::Tabled;
use visita_core::{
    Command as CoreCommand, CommandResult, CreateVisitRequest, Portal, RescheduleRequest,
    StatusFilter, VisitRequest, VisitStatus,
};

use crate::cli::{GlobalOpts, VisitsArgs, VisitsCommand};
use crate::error::CliError;
use crate::output;

use super::util;

// ── Table row ───────────────────────────────────────────────────────

#[derive(Tabled)]
struct VisitRow {
    #[tabled(rename = "ID")]
    id: String,
    #[tabled(rename = "Property")]
    property: String,
    #[tabled(rename = "Scheduled")]
    scheduled: String,
    #[tabled(rename = "Status")]
    status: String,
    #[tabled(rename = "Note")]
    note: String,
}

fn status_cell(status: VisitStatus, color: bool) -> String {
    if !color {
        return status.to_string();
    }
    match status {
        VisitStatus::Pending => status.to_string().yellow().to_string(),
        VisitStatus::Approved => status.to_string().green().to_string(),
        VisitStatus::Rejected => status.to_string().red().to_string(),
        VisitStatus::Visited => status.to_string().cyan().to_string(),
        VisitStatus::NotVisited => status.to_string().magenta().to_string(),
    }
}

fn visit_row(v: &Arc<VisitRequest>, color: bool) -> VisitRow {
    VisitRow {
        id: v.id.to_string(),
        property: v.property_id.to_string(),
        scheduled: v.scheduled_at.format("%Y-%m-%d %H:%M").to_string(),
        status: status_cell(v.status, color),
        note: v.note.clone().unwrap_or_default(),
    }
}

fn visit_detail(v: &VisitRequest) -> String {
    format!(
        "Visit request {id}\n\
         Property:  {property}\n\
         Scheduled: {scheduled}\n\
         Status:    {status}\n\
         Note:      {note}",
        id = v.id,
        property = v.property_id,
        scheduled = v.scheduled_at.format("%Y-%m-%d %H:%M"),
        status = v.status,
        note = v.note.as_deref().unwrap_or("-"),
    )
}

fn print_visit(visit: &Arc<VisitRequest>, global: &GlobalOpts) {
    let out = output::render_single(&global.output, visit, |v| visit_detail(v), |v| {
        v.id.to_string()
    });
    output::print_output(&out, global.quiet);
}

fn expect_visit(result: CommandResult) -> Result<Arc<VisitRequest>, CliError> {
    match result {
        CommandResult::Visit(v) => Ok(v),
        _ => Err(CliError::General("unexpected command result".into())),
    }
}

fn list_visits(visits: &[Arc<VisitRequest>], filter: &StatusFilter, global: &GlobalOpts) {
    if visits.is_empty() && !global.quiet {
        match filter {
            StatusFilter::All => eprintln!("No visit requests."),
            StatusFilter::Is(status) => eprintln!("No visit requests with status '{status}'."),
        }
        return;
    }
    let color = output::should_color(&global.color);
    let out = output::render_list(
        &global.output,
        visits,
        |v| visit_row(v, color),
        |v| v.id.to_string(),
    );
    output::print_output(&out, global.quiet);
}

// ── Handler ─────────────────────────────────────────────────────────

#[allow(clippy::too_many_lines)]
pub async fn handle(
    portal: &Portal,
    args: VisitsArgs,
    global: &GlobalOpts,
) -> Result<(), CliError> {
    match args.command {
        VisitsCommand::Mine { status } => {
            // The status filter is a pure predicate over the fetched set.
            let visits = portal.store().my_visits_filtered(&status);
            list_visits(&visits, &status, global);
            Ok(())
        }

        VisitsCommand::Assigned { status } => {
            let visits = portal.store().assigned_visits_filtered(&status);
            list_visits(&visits, &status, global);
            Ok(())
        }

        VisitsCommand::Create { property, at, note } => {
            let result = portal
                .execute(CoreCommand::CreateVisit(CreateVisitRequest {
                    property_id: property.into(),
                    scheduled_at: at,
                    note,
                }))
                .await?;
            let visit = expect_visit(result)?;
            if !global.quiet {
                eprintln!("Visit requested (id {})", visit.id);
            }
            print_visit(&visit, global);
            Ok(())
        }

        VisitsCommand::Reschedule { id, at, note } => {
            let result = portal
                .execute(CoreCommand::RescheduleVisit {
                    id: id.into(),
                    update: RescheduleRequest {
                        scheduled_at: at,
                        note,
                    },
                })
                .await?;
            let visit = expect_visit(result)?;
            if !global.quiet {
                eprintln!("Visit rescheduled to {}", visit.scheduled_at);
            }
            print_visit(&visit, global);
            Ok(())
        }

        VisitsCommand::RecipientReschedule { id, at } => {
            let result = portal
                .execute(CoreCommand::RecipientReschedule {
                    id: id.into(),
                    scheduled_at: at,
                })
                .await?;
            let visit = expect_visit(result)?;
            if !global.quiet {
                eprintln!(
                    "Visit moved to {} (status stays {})",
                    visit.scheduled_at, visit.status
                );
            }
            print_visit(&visit, global);
            Ok(())
        }

        VisitsCommand::Cancel { id } => {
            if !util::confirm(
                &format!("Cancel visit request '{id}'? This removes it entirely."),
                global.yes,
            )? {
                return Ok(());
            }
            portal
                .execute(CoreCommand::CancelVisit { id: id.into() })
                .await?;
            if !global.quiet {
                eprintln!("Visit request cancelled");
            }
            Ok(())
        }

        VisitsCommand::Approve { id } => {
            let result = portal
                .execute(CoreCommand::ApproveVisit { id: id.into() })
                .await?;
            let visit = expect_visit(result)?;
            if !global.quiet {
                eprintln!("Visit approved");
            }
            print_visit(&visit, global);
            Ok(())
        }

        VisitsCommand::Reject { id } => {
            let result = portal
                .execute(CoreCommand::RejectVisit { id: id.into() })
                .await?;
            let visit = expect_visit(result)?;
            if !global.quiet {
                eprintln!("Visit rejected");
            }
            print_visit(&visit, global);
            Ok(())
        }

        VisitsCommand::Outcome { id, outcome } => {
            let result = portal
                .execute(CoreCommand::RecordOutcome {
                    id: id.into(),
                    outcome: outcome.into(),
                })
                .await?;
            let visit = expect_visit(result)?;
            if !global.quiet {
                eprintln!("Outcome recorded: {}", visit.status);
            }
            print_visit(&visit, global);
            Ok(())
        }
    }
}
