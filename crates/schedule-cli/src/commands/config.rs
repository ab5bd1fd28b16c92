//! Configuration management CLI commands.

use clap::{Args, Subcommand};

use schedule_core::config::AppConfig;
use schedule_core::error::AppError;

use crate::output::{self, OutputFormat};

/// Arguments for config commands
#[derive(Debug, Args)]
pub struct ConfigArgs {
    /// Config subcommand
    #[command(subcommand)]
    pub command: ConfigCommand,
}

/// Config subcommands
#[derive(Debug, Subcommand)]
pub enum ConfigCommand {
    /// Show the effective configuration
    Show,
    /// Validate the configuration file
    Validate,
}

/// Execute config commands
///
/// Loading already validated the file; `validate` only reports the result.
pub fn execute(
    args: &ConfigArgs,
    config: &AppConfig,
    config_path: &str,
    format: OutputFormat,
) -> Result<(), AppError> {
    match &args.command {
        ConfigCommand::Show => match format {
            OutputFormat::Json => output::print_json(config),
            OutputFormat::Table => {
                println!("[grid]");
                output::print_kv("first_slot", &config.grid.first_slot.to_string());
                output::print_kv("last_slot", &config.grid.last_slot.to_string());
                output::print_kv("slot_minutes", &config.grid.slot_minutes.to_string());
                output::print_kv("strict", &config.grid.strict.to_string());
                println!("[persistence]");
                output::print_kv("provider", &config.persistence.provider.to_string());
                output::print_kv("path", &config.persistence.path);
                println!("[events]");
                output::print_kv("buffer_size", &config.events.buffer_size.to_string());
                println!("[moves]");
                output::print_kv(
                    "pending_ttl_seconds",
                    &config.moves.pending_ttl_seconds.to_string(),
                );
                println!("[logging]");
                output::print_kv("level", &config.logging.level);
                output::print_kv("format", &config.logging.format);
            }
        },
        ConfigCommand::Validate => {
            output::print_success(&format!("Configuration '{config_path}' is valid"));
            output::print_kv(
                "Grid",
                &format!(
                    "{} rows, {}..{} every {} min{}",
                    config.grid.times().len(),
                    config.grid.first_slot,
                    config.grid.last_slot,
                    config.grid.slot_minutes,
                    if config.grid.strict { ", strict" } else { "" }
                ),
            );
            output::print_kv(
                "Persistence",
                &format!("{} ({})", config.persistence.provider, config.persistence.path),
            );
            output::print_kv("Logging", &format!("{} / {}", config.logging.level, config.logging.format));
        }
    }

    Ok(())
}
