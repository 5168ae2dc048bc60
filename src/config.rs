use std::path::PathBuf;

use chrono::FixedOffset;
use clap::{Parser, Subcommand};
use config::{Config, Environment, File};
use serde::Deserialize;

use crate::events::{DisplayLocale, EventProjector, TimeFormatter};

#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Config file path
    #[arg(short, long, env = "CONFIG_FILE")]
    pub config: Option<String>,

    /// Display locale for timestamps (en-US, en-GB, iso)
    #[arg(long, env = "HOPS_LOCALE")]
    pub locale: Option<String>,

    /// Offset from UTC in minutes used when rendering timestamps
    #[arg(long, env = "HOPS_UTC_OFFSET_MINUTES", allow_hyphen_values = true)]
    pub utc_offset_minutes: Option<i32>,

    /// Maximum rows shown per event payload
    #[arg(long, env = "HOPS_MAX_ROWS")]
    pub max_rows: Option<usize>,

    /// Emit logs as JSON
    #[arg(long, env = "HOPS_LOG_JSON")]
    pub log_json: bool,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug, Clone, PartialEq, Eq)]
pub enum Command {
    /// Project an event payload file into display rows
    Events {
        /// JSON file holding a batch log, an envelope or a list of envelopes
        file: PathBuf,
    },
    /// List task summaries
    Tasks {
        /// JSON file holding the task list
        file: PathBuf,
    },
    /// Describe the params of a task
    Describe {
        /// JSON file holding the task list
        file: PathBuf,
        /// Task name
        task: String,
    },
    /// Validate a task run submission
    Run {
        /// JSON file holding the task list
        tasks: PathBuf,
        /// Task name
        task: String,
        /// JSON file holding the submitted input object
        input: PathBuf,
    },
}

#[derive(Debug, Deserialize, Clone)]
pub struct AppConfig {
    pub display: DisplayConfig,
    pub events: EventsConfig,
}

#[derive(Debug, Deserialize, Clone)]
pub struct DisplayConfig {
    pub locale: String,
    pub utc_offset_minutes: i32,
}

#[derive(Debug, Deserialize, Clone)]
pub struct EventsConfig {
    pub max_rows: usize,
}

impl AppConfig {
    pub fn load() -> Result<Self, config::ConfigError> {
        Self::load_from_args(std::env::args())
    }

    pub fn load_from_args<I, T>(args: I) -> Result<Self, config::ConfigError>
    where
        I: IntoIterator<Item = T>,
        T: Into<std::ffi::OsString> + Clone,
    {
        let cli =
            Cli::try_parse_from(args).map_err(|e| config::ConfigError::Message(e.to_string()))?;
        Self::load_from_cli(&cli)
    }

    /// Defaults, then the config file, then `HOPS_` env vars, then CLI flags.
    pub fn load_from_cli(cli: &Cli) -> Result<Self, config::ConfigError> {
        let mut builder = Config::builder()
            .set_default("display.locale", DisplayLocale::default().as_str())?
            .set_default("display.utc_offset_minutes", 0)?
            .set_default("events.max_rows", 100)?;

        // An explicit file must exist; ./config.* is optional.
        builder = match &cli.config {
            Some(path) => builder.add_source(File::with_name(path)),
            None => builder.add_source(File::with_name("config").required(false)),
        };

        // E.g. HOPS_DISPLAY__LOCALE=en-GB
        builder = builder.add_source(
            Environment::with_prefix("HOPS")
                .prefix_separator("_")
                .separator("__")
                .try_parsing(true),
        );

        if let Some(locale) = &cli.locale {
            builder = builder.set_override("display.locale", locale.as_str())?;
        }
        if let Some(offset) = cli.utc_offset_minutes {
            builder = builder.set_override("display.utc_offset_minutes", i64::from(offset))?;
        }
        if let Some(max_rows) = cli.max_rows {
            builder =
                builder.set_override("events.max_rows", i64::try_from(max_rows).unwrap_or(i64::MAX))?;
        }

        let cfg = builder.build()?;
        cfg.try_deserialize()
    }

    pub fn locale(&self) -> Result<DisplayLocale, config::ConfigError> {
        self.display
            .locale
            .parse()
            .map_err(|e: crate::error::ConsoleError| config::ConfigError::Message(e.to_string()))
    }

    pub fn utc_offset(&self) -> Result<FixedOffset, config::ConfigError> {
        FixedOffset::east_opt(self.display.utc_offset_minutes.saturating_mul(60)).ok_or_else(|| {
            config::ConfigError::Message(format!(
                "display.utc_offset_minutes out of range: {}",
                self.display.utc_offset_minutes
            ))
        })
    }

    /// Projector configured for this display setup, reading the system clock.
    pub fn projector(&self) -> Result<EventProjector, config::ConfigError> {
        let formatter = TimeFormatter::new(self.locale()?).with_offset(self.utc_offset()?);
        Ok(EventProjector::new(formatter).with_row_limit(self.events.max_rows))
    }
}
