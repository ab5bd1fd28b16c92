//! Single-session move command.

use clap::Args;

use schedule_core::error::AppError;
use schedule_core::types::Slot;
use schedule_core::CommandContext;
use schedule_engine::{MoveDecision, MoveOutcome};

use super::Workspace;
use super::sessions::SessionRow;
use crate::output::{self, OutputFormat};

/// Arguments for the move command
#[derive(Debug, Args)]
pub struct MoveArgs {
    /// Session ID
    pub id: String,
    /// Target day, e.g. `thursday`
    pub day: String,
    /// Target time, `HH:MM`
    pub time: String,
    /// Apply even if the trainer is already booked in the target slot
    #[arg(long)]
    pub force: bool,
    /// Abort on conflict instead of asking
    #[arg(long, conflicts_with = "force")]
    pub no_prompt: bool,
}

/// Execute the move command
pub async fn execute(
    args: &MoveArgs,
    workspace: &Workspace,
    ctx: &CommandContext,
    format: OutputFormat,
) -> Result<(), AppError> {
    let id = super::parse_session_id(&args.id)?;
    let target = Slot::parse(&args.day, &args.time)?;

    let proposed = workspace.engine.propose_move(ctx, &id, target).await?;
    let outcome = match proposed {
        MoveOutcome::Conflicting {
            transaction_id,
            conflicts,
            ..
        } => {
            if format == OutputFormat::Table {
                output::print_warning(&format!(
                    "Trainer already booked at {target} by {} session(s):",
                    conflicts.len()
                ));
                let names = workspace.names(&conflicts).await;
                let rows: Vec<SessionRow> =
                    conflicts.iter().map(|s| SessionRow::new(s, &names)).collect();
                output::print_list(&rows, format);
            }

            let decision = if args.force {
                MoveDecision::Force
            } else if args.no_prompt {
                MoveDecision::Abort
            } else {
                let force = dialoguer::Confirm::new()
                    .with_prompt("Force the move anyway?")
                    .default(false)
                    .interact()
                    .map_err(|e| AppError::internal(format!("Input error: {e}")))?;
                if force { MoveDecision::Force } else { MoveDecision::Abort }
            };

            workspace
                .engine
                .resolve_move(ctx, &transaction_id, decision)
                .await?
        }
        other => other,
    };

    match format {
        OutputFormat::Json => output::print_json(&outcome),
        OutputFormat::Table => match &outcome {
            MoveOutcome::Applied {
                session,
                from,
                forced,
                ..
            } => {
                let note = if *forced { " (forced)" } else { "" };
                output::print_success(&format!(
                    "Moved '{}' from {from} to {}{note}",
                    session.title, session.slot
                ));
            }
            MoveOutcome::Aborted { .. } => println!("Move aborted, schedule unchanged."),
            MoveOutcome::Conflicting { .. } => {}
        },
    }

    if args.no_prompt && matches!(outcome, MoveOutcome::Aborted { .. }) {
        return Err(AppError::conflict(format!(
            "Session {id} not moved: trainer already booked at {target}"
        )));
    }
    Ok(())
}
