//! Integrity audit CLI command.

use serde::Serialize;
use tabled::Tabled;

use schedule_core::error::AppError;
use schedule_engine::IntegrityWarning;

use super::Workspace;
use crate::output::{self, OutputFormat};

/// Warning display row
#[derive(Debug, Serialize, Tabled)]
struct WarningRow {
    /// Kind
    kind: &'static str,
    /// Detail
    detail: String,
}

fn kind_of(warning: &IntegrityWarning) -> &'static str {
    match warning {
        IntegrityWarning::UnknownTrainer { .. } => "unknown trainer",
        IntegrityWarning::UnknownSessionType { .. } => "unknown type",
        IntegrityWarning::DirectoryUnavailable { .. } => "directory",
        IntegrityWarning::OverCapacity { .. } => "over capacity",
        IntegrityWarning::ZeroCapacity { .. } => "zero capacity",
        IntegrityWarning::TrainerDoubleBooked { .. } => "double booking",
    }
}

/// Execute the audit command
pub async fn execute(workspace: &Workspace, format: OutputFormat) -> Result<(), AppError> {
    let report = workspace.engine.audit().await;

    match format {
        OutputFormat::Json => output::print_json(&report),
        OutputFormat::Table => {
            if report.is_clean() {
                output::print_success(&format!(
                    "{} sessions checked, no problems found",
                    report.sessions_checked
                ));
                return Ok(());
            }
            let rows: Vec<WarningRow> = report
                .warnings
                .iter()
                .map(|w| WarningRow {
                    kind: kind_of(w),
                    detail: w.to_string(),
                })
                .collect();
            output::print_list(&rows, format);
            output::print_warning(&format!(
                "{} sessions checked, {} warning(s)",
                report.sessions_checked,
                report.warnings.len()
            ));
        }
    }
    Ok(())
}
