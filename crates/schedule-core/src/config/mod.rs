//! Engine configuration schemas.
//!
//! All configuration structs are deserialized from TOML via the `config`
//! crate. Each sub-module represents one configuration section, and every
//! field has a default so an empty file is a valid configuration.

pub mod events;
pub mod grid;
pub mod logging;
pub mod moves;
pub mod persistence;

use serde::{Deserialize, Serialize};

pub use self::events::EventsConfig;
pub use self::grid::GridConfig;
pub use self::logging::LoggingConfig;
pub use self::moves::MovesConfig;
pub use self::persistence::{PersistenceConfig, PersistenceProvider};

use crate::error::AppError;

/// Root configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AppConfig {
    /// Weekly grid bounds.
    #[serde(default)]
    pub grid: GridConfig,
    /// Durable store settings.
    #[serde(default)]
    pub persistence: PersistenceConfig,
    /// Event bus settings.
    #[serde(default)]
    pub events: EventsConfig,
    /// Pending move settings.
    #[serde(default)]
    pub moves: MovesConfig,
    /// Logging settings.
    #[serde(default)]
    pub logging: LoggingConfig,
}

impl AppConfig {
    /// Load configuration from a TOML file.
    ///
    /// The file is optional. Values are overlaid with environment variables
    /// prefixed with `SCHEDULE__`, e.g. `SCHEDULE__GRID__STRICT=false`.
    pub fn load(path: &str) -> Result<Self, AppError> {
        Self::load_layered(path, None)
    }

    /// Load a base file, then an optional per-environment overlay (for
    /// example `config/production.toml`), then environment variables.
    /// Later sources win key by key.
    pub fn load_layered(base: &str, overlay: Option<&str>) -> Result<Self, AppError> {
        let mut builder =
            config::Config::builder().add_source(config::File::with_name(base).required(false));
        if let Some(overlay) = overlay {
            builder = builder.add_source(config::File::with_name(overlay).required(false));
        }

        let config = builder
            .add_source(
                config::Environment::with_prefix("SCHEDULE")
                    .prefix_separator("__")
                    .separator("__")
                    .try_parsing(true),
            )
            .build()
            .map_err(|e| AppError::configuration(format!("Failed to build config: {e}")))?;

        let parsed: Self = config
            .try_deserialize()
            .map_err(|e| AppError::configuration(format!("Failed to deserialize config: {e}")))?;

        parsed.grid.validate()?;
        Ok(parsed)
    }
}
