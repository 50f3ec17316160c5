//! Job configuration and credentials.
//!
//! The JSON config file drives both the cleaning pipeline and the sheet
//! writer. Every key is optional:
//!
//! ```json
//! {
//!   "lowercase_columns": true,
//!   "trim_whitespace": true,
//!   "date_columns": ["created_at"],
//!   "dedupe_key": "email",
//!   "sheet_name": "CSV Import",
//!   "worksheet_name": "data",
//!   "mode": "overwrite"
//! }
//! ```
//!
//! Credentials are resolved once at start-up into [`Credentials`] and passed
//! explicitly to the Google client.

use serde::{Deserialize, Serialize};
use std::env;
use std::fmt;
use std::fs;
use std::path::{Path, PathBuf};

use crate::error::{ConfigError, ConfigResult};

/// Environment variable holding the service-account key path.
pub const CREDS_ENV_VAR: &str = "GOOGLE_CREDS_PATH";

/// How the cleaned data lands in the worksheet.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum WriteMode {
    /// Clear the worksheet, then write header + rows.
    #[default]
    Overwrite,
    /// Add rows after existing content (header only if the worksheet is empty).
    Append,
}

impl fmt::Display for WriteMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            WriteMode::Overwrite => f.write_str("overwrite"),
            WriteMode::Append => f.write_str("append"),
        }
    }
}

/// Options recognized in the config file.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ImportConfig {
    /// Lowercase column names (they are always trimmed)
    pub lowercase_columns: bool,

    /// Strip leading/trailing whitespace from text columns
    pub trim_whitespace: bool,

    /// Columns to parse as timestamps
    pub date_columns: Vec<String>,

    /// Column whose value identifies a row for deduplication
    #[serde(deserialize_with = "deserialize_dedupe_key")]
    pub dedupe_key: Option<String>,

    /// Target spreadsheet name
    pub sheet_name: String,

    /// Target worksheet (tab) name
    pub worksheet_name: String,

    /// Write mode
    pub mode: WriteMode,
}

impl Default for ImportConfig {
    fn default() -> Self {
        Self {
            lowercase_columns: true,
            trim_whitespace: true,
            date_columns: Vec::new(),
            dedupe_key: None,
            sheet_name: "CSV Import".to_string(),
            worksheet_name: "data".to_string(),
            mode: WriteMode::Overwrite,
        }
    }
}

/// An empty or `null` dedupe key means "no deduplication".
fn deserialize_dedupe_key<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: serde::Deserializer<'de>,
{
    let key: Option<String> = Option::deserialize(deserializer)?;
    Ok(key.filter(|k| !k.is_empty()))
}

impl ImportConfig {
    /// Parse a config from JSON text. A leading UTF-8 BOM is ignored.
    pub fn from_json(json: &str) -> ConfigResult<Self> {
        let json = json.strip_prefix('\u{feff}').unwrap_or(json);
        Ok(serde_json::from_str(json)?)
    }

    /// Apply the `--mode` command-line override, if any.
    pub fn with_mode_override(mut self, mode: Option<WriteMode>) -> Self {
        if let Some(mode) = mode {
            self.mode = mode;
        }
        self
    }
}

/// Load the config file at `path`.
pub fn load_config(path: impl AsRef<Path>) -> ConfigResult<ImportConfig> {
    let content = fs::read_to_string(path.as_ref())?;
    ImportConfig::from_json(&content)
}

/// Service-account credentials location.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Credentials {
    pub key_path: PathBuf,
}

impl Credentials {
    /// Validate that the key file exists.
    pub fn from_path(path: impl Into<PathBuf>) -> ConfigResult<Self> {
        let key_path = path.into();
        if key_path.as_os_str().is_empty() {
            return Err(ConfigError::MissingCredentials(format!("{} is empty", CREDS_ENV_VAR)));
        }
        if !key_path.exists() {
            return Err(ConfigError::MissingCredentials(format!(
                "{} does not exist",
                key_path.display()
            )));
        }
        Ok(Self { key_path })
    }

    /// Read [`CREDS_ENV_VAR`] from the environment.
    ///
    /// Call once at start-up (after loading `.env`).
    pub fn from_env() -> ConfigResult<Self> {
        let path = env::var(CREDS_ENV_VAR)
            .map_err(|_| ConfigError::MissingCredentials(format!("{} not set", CREDS_ENV_VAR)))?;
        Self::from_path(path)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    #[test]
    fn test_defaults_from_empty_object() {
        let cfg = ImportConfig::from_json("{}").unwrap();
        assert_eq!(cfg, ImportConfig::default());
        assert!(cfg.lowercase_columns);
        assert!(cfg.trim_whitespace);
        assert_eq!(cfg.sheet_name, "CSV Import");
        assert_eq!(cfg.worksheet_name, "data");
        assert_eq!(cfg.mode, WriteMode::Overwrite);
    }

    #[test]
    fn test_full_config() {
        let cfg = ImportConfig::from_json(
            r#"{
                "lowercase_columns": false,
                "trim_whitespace": false,
                "date_columns": ["Created"],
                "dedupe_key": "Email",
                "sheet_name": "Leads",
                "worksheet_name": "raw",
                "mode": "append",
                "unknown_option": 1
            }"#,
        )
        .unwrap();

        assert!(!cfg.lowercase_columns);
        assert!(!cfg.trim_whitespace);
        assert_eq!(cfg.date_columns, vec!["Created"]);
        assert_eq!(cfg.dedupe_key.as_deref(), Some("Email"));
        assert_eq!(cfg.sheet_name, "Leads");
        assert_eq!(cfg.worksheet_name, "raw");
        assert_eq!(cfg.mode, WriteMode::Append);
    }

    #[test]
    fn test_empty_or_null_dedupe_key_is_unset() {
        let cfg = ImportConfig::from_json(r#"{"dedupe_key": ""}"#).unwrap();
        assert_eq!(cfg.dedupe_key, None);
        let cfg = ImportConfig::from_json(r#"{"dedupe_key": null}"#).unwrap();
        assert_eq!(cfg.dedupe_key, None);
    }

    #[test]
    fn test_bom_is_ignored() {
        let cfg = ImportConfig::from_json("\u{feff}{\"mode\": \"append\"}").unwrap();
        assert_eq!(cfg.mode, WriteMode::Append);
    }

    #[test]
    fn test_invalid_config() {
        assert!(matches!(
            ImportConfig::from_json("not json"),
            Err(ConfigError::JsonError(_))
        ));
        assert!(ImportConfig::from_json(r#"{"mode": "upsert"}"#).is_err());
        assert!(ImportConfig::from_json(r#"{"trim_whitespace": "yes"}"#).is_err());
    }

    #[test]
    fn test_mode_override() {
        let cfg = ImportConfig::default().with_mode_override(Some(WriteMode::Append));
        assert_eq!(cfg.mode, WriteMode::Append);
        let cfg = cfg.with_mode_override(None);
        assert_eq!(cfg.mode, WriteMode::Append);
    }

    #[test]
    fn test_load_config_from_file() {
        let mut file = NamedTempFile::new().unwrap();
        write!(file, r#"{{"sheet_name": "From File"}}"#).unwrap();
        let cfg = load_config(file.path()).unwrap();
        assert_eq!(cfg.sheet_name, "From File");
    }

    #[test]
    fn test_credentials_path_checks() {
        let file = NamedTempFile::new().unwrap();
        let creds = Credentials::from_path(file.path()).unwrap();
        assert_eq!(creds.key_path, file.path());

        assert!(matches!(
            Credentials::from_path("/definitely/not/here.json"),
            Err(ConfigError::MissingCredentials(_))
        ));
        assert!(matches!(
            Credentials::from_path(""),
            Err(ConfigError::MissingCredentials(_))
        ));
    }

    #[test]
    fn test_write_mode_display() {
        assert_eq!(WriteMode::Overwrite.to_string(), "overwrite");
        assert_eq!(WriteMode::Append.to_string(), "append");
    }
}
