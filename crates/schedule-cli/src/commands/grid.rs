//! Weekly grid view.

use clap::Args;
use tabled::builder::Builder;

use schedule_core::error::AppError;
use schedule_core::types::Weekday;
use schedule_engine::GridCell;

use super::Workspace;
use crate::output::{self, OutputFormat};

/// Arguments for the grid command
#[derive(Debug, Args)]
pub struct GridArgs {
    /// Show session counts instead of titles
    #[arg(long)]
    pub compact: bool,
    /// Hide time rows with no sessions
    #[arg(long)]
    pub skip_empty: bool,
}

/// Execute the grid command
pub async fn execute(
    args: &GridArgs,
    workspace: &Workspace,
    format: OutputFormat,
) -> Result<(), AppError> {
    let grid = workspace.engine.grid().await;

    if format == OutputFormat::Json {
        output::print_json(&grid);
        return Ok(());
    }

    let mut builder = Builder::default();
    let mut header = vec!["Time".to_string()];
    header.extend(Weekday::ALL.iter().map(|d| d.to_string()));
    builder.push_record(header);

    for time in &grid.times {
        let row = grid.row(*time);
        if args.skip_empty && row.iter().all(|c| c.sessions.is_empty()) {
            continue;
        }
        let mut record = vec![time.to_string()];
        record.extend(row.iter().map(|cell| render_cell(cell, args.compact)));
        builder.push_record(record);
    }
    println!("{}", builder.build());

    if !grid.off_grid.is_empty() {
        output::print_warning(&format!(
            "{} session(s) outside the grid:",
            grid.off_grid.len()
        ));
        for session in &grid.off_grid {
            println!("  {} {} ({})", session.id.short(), session.title, session.slot);
        }
    }
    Ok(())
}

fn render_cell(cell: &GridCell, compact: bool) -> String {
    match (cell.sessions.len(), compact) {
        (0, _) => String::new(),
        (n, true) => n.to_string(),
        (_, false) => cell
            .sessions
            .iter()
            .map(|s| {
                if s.is_cancelled() {
                    format!("{} (x)", s.title)
                } else {
                    s.title.clone()
                }
            })
            .collect::<Vec<_>>()
            .join("\n"),
    }
}
