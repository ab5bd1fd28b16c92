//! Session inspection CLI commands.

use clap::{Args, Subcommand};
use serde::Serialize;
use tabled::Tabled;

use schedule_core::error::AppError;
use schedule_core::types::{SessionTypeId, TrainerId, Weekday};
use schedule_engine::{CapacityClassifier, NameIndex, ScheduleQuery, StatusFilter};
use schedule_entity::{CapacityTier, Session};

use super::Workspace;
use crate::output::{self, OutputFormat};

/// Arguments for session commands
#[derive(Debug, Args)]
pub struct SessionsArgs {
    /// Sessions subcommand
    #[command(subcommand)]
    pub command: SessionsCommand,
}

/// Sessions subcommands
#[derive(Debug, Subcommand)]
pub enum SessionsCommand {
    /// List sessions matching all given filters
    List(ListFilters),
    /// Show one session in full
    Show {
        /// Session ID
        id: String,
    },
}

/// Query filters; omitted filters match everything
#[derive(Debug, Args)]
pub struct ListFilters {
    /// Trainer ID
    #[arg(long)]
    pub trainer: Option<TrainerId>,
    /// Session type ID
    #[arg(long)]
    pub session_type: Option<SessionTypeId>,
    /// Capacity tier: low, medium, high, full
    #[arg(long)]
    pub capacity: Option<CapacityTier>,
    /// Status: active, expired, restricted, waiting, cancelled
    #[arg(long)]
    pub status: Option<StatusFilter>,
    /// Day of week
    #[arg(long)]
    pub day: Option<Weekday>,
    /// Text matched against title, trainer and session type
    #[arg(short, long)]
    pub search: Option<String>,
    /// Only sessions with a waiting list
    #[arg(long)]
    pub waiting_list: bool,
    /// Only sessions with payment issues
    #[arg(long)]
    pub payment_issues: bool,
}

impl ListFilters {
    fn to_query(&self) -> ScheduleQuery {
        ScheduleQuery {
            trainer_id: self.trainer,
            session_type_id: self.session_type,
            capacity: self.capacity,
            status: self.status,
            day: self.day,
            search: self.search.clone(),
            waiting_list_only: self.waiting_list,
            payment_issues_only: self.payment_issues,
        }
    }
}

/// Session display row
#[derive(Debug, Serialize, Tabled)]
pub struct SessionRow {
    /// Session ID
    id: String,
    /// Title
    title: String,
    /// Slot
    slot: String,
    /// Trainer
    trainer: String,
    /// Room
    room: String,
    /// Booked
    booked: String,
    /// Load
    load: String,
    /// Status
    status: String,
}

impl SessionRow {
    /// Build a row, showing directory names where known.
    pub fn new(session: &Session, names: &NameIndex) -> Self {
        let load = match CapacityClassifier::classify_session(session) {
            Ok(tier) => tier.to_string(),
            Err(_) => "n/a".to_string(),
        };
        let mut status = session.status.to_string();
        if session.flags.has_waiting_list {
            status.push_str(" +waitlist");
        }
        if session.flags.has_payment_issues {
            status.push_str(" +payment");
        }

        Self {
            id: session.id.short(),
            title: session.title.clone(),
            slot: session.slot.to_string(),
            trainer: names
                .trainer(&session.trainer_id)
                .map(str::to_string)
                .unwrap_or_else(|| session.trainer_id.short()),
            room: session.room.clone(),
            booked: format!("{}/{}", session.current_participants, session.max_participants),
            load,
            status,
        }
    }
}

/// Execute session commands
pub async fn execute(
    args: &SessionsArgs,
    workspace: &Workspace,
    format: OutputFormat,
) -> Result<(), AppError> {
    match &args.command {
        SessionsCommand::List(filters) => {
            let result = workspace.engine.query(filters.to_query()).await;
            match format {
                OutputFormat::Json => output::print_json(&result.to_vec()),
                OutputFormat::Table => {
                    let sessions = result.to_vec();
                    let names = workspace.names(&sessions).await;
                    let rows: Vec<SessionRow> =
                        sessions.iter().map(|s| SessionRow::new(s, &names)).collect();
                    output::print_list(&rows, format);
                }
            }
        }
        SessionsCommand::Show { id } => {
            let id = super::parse_session_id(id)?;
            let session = workspace.engine.get(&id).await?;
            match format {
                OutputFormat::Json => output::print_json(&session),
                OutputFormat::Table => print_session(workspace, &session).await,
            }
        }
    }

    Ok(())
}

async fn print_session(workspace: &Workspace, session: &Session) {
    let names = workspace.names(std::slice::from_ref(session)).await;
    let trainer = names
        .trainer(&session.trainer_id)
        .map(str::to_string)
        .unwrap_or_else(|| format!("{} (unknown)", session.trainer_id));
    let kind = names
        .session_type(&session.session_type_id)
        .map(str::to_string)
        .unwrap_or_else(|| format!("{} (unknown)", session.session_type_id));
    let load = CapacityClassifier::classify_session(session)
        .map(|t| t.to_string())
        .unwrap_or_else(|e| e.message);

    println!("{}", session.title);
    output::print_kv("ID", &session.id.to_string());
    output::print_kv("Slot", &session.slot.to_string());
    output::print_kv("Duration", &format!("{} min", session.duration_minutes));
    output::print_kv("Room", &session.room);
    output::print_kv("Level", &session.level);
    output::print_kv("Trainer", &trainer);
    output::print_kv("Type", &kind);
    output::print_kv(
        "Participants",
        &format!("{}/{} ({load})", session.current_participants, session.max_participants),
    );
    output::print_kv("Status", &session.status.to_string());
    output::print_kv("Recurring", &session.flags.is_recurring.to_string());
    output::print_kv("Waiting list", &session.flags.has_waiting_list.to_string());
    output::print_kv("Payment issues", &session.flags.has_payment_issues.to_string());
    output::print_kv("Restrictions", &session.flags.has_restrictions.to_string());
    output::print_kv("Expired", &session.flags.is_expired.to_string());
    if !session.description.is_empty() {
        output::print_kv("Description", &session.description);
    }
}
