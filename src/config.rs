use crate::core::db::ConnectOptions;
use crate::core::{Result, SuperQueryError};
use crate::table_printer::{OutputFormat, TablePrinter, DEFAULT_MAX_COLUMN_WIDTH, DEFAULT_MAX_ROWS};
use serde::Deserialize;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::Level;

const DEFAULT_LOG_LEVEL: &str = "warn";

/// Top-level configuration structure parsed from a TOML file.
///
/// Every section is optional; missing values fall back to defaults.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(default)]
pub struct Config {
    pub database: DatabaseConfig,
    pub output: OutputConfig,
    pub logging: LoggingConfig,
}

/// Database to open at startup.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(default)]
pub struct DatabaseConfig {
    pub directory: Option<PathBuf>,
    pub name: Option<String>,
    pub read_only: bool,
}

/// Console output settings.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct OutputConfig {
    pub format: OutputFormat,
    pub max_rows: usize,
    pub max_column_width: usize,
}

impl Default for OutputConfig {
    fn default() -> Self {
        OutputConfig {
            format: OutputFormat::Table,
            max_rows: DEFAULT_MAX_ROWS,
            max_column_width: DEFAULT_MAX_COLUMN_WIDTH,
        }
    }
}

/// Logging settings.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    pub level: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        LoggingConfig {
            level: DEFAULT_LOG_LEVEL.to_string(),
        }
    }
}

impl LoggingConfig {
    /// The configured level as a tracing `Level`.
    pub fn level(&self) -> Result<Level> {
        self.level
            .parse::<Level>()
            .map_err(|_| SuperQueryError::Config(format!("unknown log level '{}'", self.level)))
    }
}

impl Config {
    /// Options for `database.name`, placed in `database.directory` when set.
    pub fn connect_options(&self) -> Option<ConnectOptions> {
        let name = self.database.name.as_ref()?;
        Some(self.options_for(name))
    }

    /// Options for an arbitrary database using the configured directory and mode.
    pub fn options_for(&self, database: &str) -> ConnectOptions {
        let mut options = ConnectOptions::new(database).read_only(self.database.read_only);
        if let Some(directory) = &self.database.directory {
            options = options.directory(directory.clone());
        }
        options
    }

    pub fn printer(&self) -> TablePrinter {
        TablePrinter::new(self.output.max_rows, self.output.max_column_width)
    }

    fn validate(&self) -> Result<()> {
        self.logging.level()?;
        if self.output.max_rows == 0 {
            return Err(SuperQueryError::Config(
                "output.max_rows must be greater than zero".to_string(),
            ));
        }
        Ok(())
    }
}

/// Parses and validates configuration from TOML text.
pub fn parse_config(content: &str) -> Result<Config> {
    let config: Config = toml::from_str(content)?;
    config.validate()?;
    Ok(config)
}

/// Loads configuration from a TOML file at the given path.
///
/// # Example
///
/// ```no_run
/// let config = superquery::config::load_config("superquery.toml").expect("Failed to load config");
/// println!("{:?}", config);
/// ```
pub fn load_config<P: AsRef<Path>>(path: P) -> Result<Config> {
    let content = fs::read_to_string(path)?;
    parse_config(&content)
}

/// `<user config dir>/superquery/config.toml`, if the platform has a config dir.
pub fn default_config_path() -> Option<PathBuf> {
    dirs::config_dir().map(|dir| dir.join("superquery").join("config.toml"))
}

/// Loads `explicit` if given, else the default config file if it exists,
/// else the built-in defaults.
pub fn load_or_default(explicit: Option<&Path>) -> Result<Config> {
    if let Some(path) = explicit {
        return load_config(path);
    }
    match default_config_path() {
        Some(path) if path.is_file() => load_config(path),
        _ => Ok(Config::default()),
    }
}
