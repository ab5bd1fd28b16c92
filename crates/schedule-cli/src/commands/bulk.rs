//! Bulk operation CLI commands.

use clap::{Args, Subcommand};
use serde::Serialize;
use tabled::Tabled;

use schedule_core::error::AppError;
use schedule_core::types::Slot;
use schedule_core::CommandContext;
use schedule_engine::{BatchResult, BulkOperation, MoveTarget, SuccessDetail};

use super::Workspace;
use crate::output::{self, OutputFormat};

/// Arguments for bulk commands
#[derive(Debug, Args)]
pub struct BulkArgs {
    /// Bulk subcommand
    #[command(subcommand)]
    pub command: BulkCommand,
}

/// Bulk subcommands
#[derive(Debug, Subcommand)]
pub enum BulkCommand {
    /// Move sessions to one slot
    Move {
        /// Target day
        #[arg(long)]
        day: String,
        /// Target time, `HH:MM`
        #[arg(long)]
        time: String,
        /// Apply despite trainer conflicts
        #[arg(long)]
        force: bool,
        /// Session IDs
        #[arg(required = true)]
        ids: Vec<String>,
    },
    /// Copy sessions into their own slots with no bookings
    Duplicate {
        /// Session IDs
        #[arg(required = true)]
        ids: Vec<String>,
    },
    /// Cancel sessions, keeping them on the grid
    Cancel {
        /// Session IDs
        #[arg(required = true)]
        ids: Vec<String>,
    },
    /// Delete sessions permanently
    Delete {
        /// Skip confirmation
        #[arg(short, long)]
        yes: bool,
        /// Session IDs
        #[arg(required = true)]
        ids: Vec<String>,
    },
}

/// Per-id outcome row
#[derive(Debug, Serialize, Tabled)]
struct OutcomeRow {
    /// Session ID
    id: String,
    /// Result
    result: String,
    /// Detail
    detail: String,
}

/// Execute bulk commands
pub async fn execute(
    args: &BulkArgs,
    workspace: &Workspace,
    ctx: &CommandContext,
    format: OutputFormat,
) -> Result<(), AppError> {
    let (operation, ids) = match &args.command {
        BulkCommand::Move {
            day,
            time,
            force,
            ids,
        } => (
            BulkOperation::Move {
                target: MoveTarget::Same(Slot::parse(day, time)?),
                force: *force,
            },
            ids,
        ),
        BulkCommand::Duplicate { ids } => (BulkOperation::Duplicate, ids),
        BulkCommand::Cancel { ids } => (BulkOperation::Cancel, ids),
        BulkCommand::Delete { yes, ids } => {
            if !yes {
                let confirm = dialoguer::Confirm::new()
                    .with_prompt(format!("Permanently delete {} session(s)?", ids.len()))
                    .default(false)
                    .interact()
                    .map_err(|e| AppError::internal(format!("Input error: {e}")))?;

                if !confirm {
                    println!("Cancelled.");
                    return Ok(());
                }
            }
            (BulkOperation::Delete, ids)
        }
    };

    let ids = super::parse_session_ids(ids)?;
    let result = workspace.engine.bulk_apply(ctx, operation, &ids).await;

    match format {
        OutputFormat::Json => output::print_json(&result),
        OutputFormat::Table => print_batch(&result),
    }
    Ok(())
}

fn print_batch(result: &BatchResult) {
    let mut rows = Vec::with_capacity(result.total());
    for success in &result.successes {
        let mut detail = match &success.detail {
            SuccessDetail::Moved { from, to, forced } => {
                format!("{from} -> {to}{}", if *forced { " (forced)" } else { "" })
            }
            SuccessDetail::Duplicated { copy_id } => format!("copy {copy_id}"),
            SuccessDetail::Cancelled {
                already_cancelled: true,
            } => "already cancelled".to_string(),
            SuccessDetail::Cancelled {
                already_cancelled: false,
            } => "cancelled".to_string(),
            SuccessDetail::Deleted => "deleted".to_string(),
        };
        if let Some(err) = &success.persistence_error {
            detail.push_str(&format!(" [not persisted: {err}]"));
        }
        rows.push(OutcomeRow {
            id: success.session_id.short(),
            result: "ok".to_string(),
            detail,
        });
    }
    for failure in &result.failures {
        rows.push(OutcomeRow {
            id: failure.session_id.short(),
            result: failure.reason.kind().to_string(),
            detail: failure.reason.to_string(),
        });
    }
    output::print_list(&rows, OutputFormat::Table);

    let summary = format!(
        "{} {}: {} succeeded, {} failed",
        result.operation,
        result.batch_id.short(),
        result.successes.len(),
        result.failures.len()
    );
    if result.is_complete_success() {
        output::print_success(&summary);
    } else {
        output::print_warning(&summary);
        if result
            .failures
            .iter()
            .any(|f| matches!(f.reason, schedule_engine::FailureReason::Conflict { .. }))
        {
            println!("  Re-run with --force to double-book the conflicting trainers.");
        }
    }
}
