//! YAML configuration for the bot process
//!
//! Field names on disk are the camelCase keys the deployed `config.yml`
//! files already use, so existing installs keep working.

use std::path::Path;

use serde::{Deserialize, Serialize};
use tracing::info;

/// Bot identity and authorization settings
#[derive(Clone, Debug, Deserialize, Serialize)]
pub struct BotSection {
    /// Platform token for the gateway connection
    pub token: String,

    /// Presence/activity text; `{Version}` is substituted at startup
    #[serde(default)]
    pub activity: String,

    /// Role ids whose holders may run mutating commands
    #[serde(rename = "administratorRoleIDs", default)]
    pub administrator_role_ids: Vec<String>,

    /// Guild the bot operates in
    #[serde(default)]
    pub guild_id: String,
}

/// Destination channel and the labels it is renamed to per severity
#[derive(Clone, Debug, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct StatusSection {
    pub status_channel_id: String,
    pub operational_channel_name: String,
    pub partial_outage_channel_name: String,
    pub major_outage_channel_name: String,
    pub maintenance_channel_name: String,
}

/// Channels that receive mirrored log events
#[derive(Clone, Debug, Default, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LoggingSection {
    #[serde(default)]
    pub log_channel_id: String,
    #[serde(default)]
    pub fatal_log_channel_id: String,
}

/// Embed palette and footer, hex `#rrggbb` strings
#[derive(Clone, Debug, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct EmbedsSection {
    #[serde(default = "default_default_color")]
    pub default_color: String,
    #[serde(default = "default_success_color")]
    pub success_color: String,
    #[serde(default = "default_error_color")]
    pub error_color: String,
    #[serde(default = "default_warning_color")]
    pub warning_color: String,
    #[serde(default = "default_info_color")]
    pub info_color: String,
    /// `{Version}` is substituted at startup
    #[serde(default)]
    pub footer_text: String,
}

fn default_default_color() -> String {
    "#2073cb".into()
}
fn default_success_color() -> String {
    "#00ff33".into()
}
fn default_error_color() -> String {
    "#ff0000".into()
}
fn default_warning_color() -> String {
    "#ff9900".into()
}
fn default_info_color() -> String {
    "#ffcc33".into()
}

impl Default for EmbedsSection {
    fn default() -> Self {
        Self {
            default_color: default_default_color(),
            success_color: default_success_color(),
            error_color: default_error_color(),
            warning_color: default_warning_color(),
            info_color: default_info_color(),
            footer_text: String::new(),
        }
    }
}

/// Root configuration file structure
#[derive(Clone, Debug, Deserialize, Serialize)]
pub struct Config {
    pub bot: BotSection,
    pub status: StatusSection,
    #[serde(default)]
    pub logging: LoggingSection,
    #[serde(default)]
    pub embeds: EmbedsSection,
}

/// Configuration loading errors
#[derive(Debug)]
pub enum ConfigError {
    Io(std::io::Error),
    Yaml(serde_yaml::Error),
    NotFound { path: std::path::PathBuf },
}

impl std::fmt::Display for ConfigError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Io(e) => write!(f, "IO error: {}", e),
            Self::Yaml(e) => write!(f, "YAML parse error: {}", e),
            Self::NotFound { path } => {
                write!(f, "no config file at {}", path.display())
            }
        }
    }
}

impl std::error::Error for ConfigError {}

impl From<std::io::Error> for ConfigError {
    fn from(e: std::io::Error) -> Self {
        ConfigError::Io(e)
    }
}

impl From<serde_yaml::Error> for ConfigError {
    fn from(e: serde_yaml::Error) -> Self {
        ConfigError::Yaml(e)
    }
}

/// Template written by `statuswatch init` and on first run
pub const DEFAULT_CONFIG: &str = r##"bot:
  token: "YOUR_BOT_TOKEN"
  activity: ""
  administratorRoleIDs: ["ROLE_ID"]
  guild_id: "0000000000000000000"

status:
  statusChannelId: "0000000000000000000"
  operationalChannelName: "「🟢」status"
  partialOutageChannelName: "「🟡」status"
  majorOutageChannelName: "「🔴」status"
  maintenanceChannelName: "「🔵」status"

logging:
  logChannelId: "0000000000000000000"
  fatalLogChannelId: "0000000000000000000"

embeds:
  defaultColor: "#2073cb"
  successColor: "#00ff33"
  errorColor: "#ff0000"
  warningColor: "#ff9900"
  infoColor: "#ffcc33"
  footerText: "Statuswatch {Version}"
"##;

impl Config {
    /// Load configuration from a file
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        if !path.exists() {
            return Err(ConfigError::NotFound {
                path: path.to_path_buf(),
            });
        }
        let content = std::fs::read_to_string(path)?;
        Self::from_str(&content)
    }

    /// Load configuration from a string (useful for testing)
    pub fn from_str(content: &str) -> Result<Self, ConfigError> {
        Ok(serde_yaml::from_str(content)?)
    }

    /// Write the default template, refusing to overwrite an existing file
    pub fn write_default(path: &Path) -> Result<(), ConfigError> {
        if path.exists() {
            return Ok(());
        }
        std::fs::write(path, DEFAULT_CONFIG)?;
        info!(path = %path.display(), "created default config file");
        Ok(())
    }

    /// Channel label for a computed global severity
    pub fn channel_name_for(&self, severity: crate::report::GlobalSeverity) -> &str {
        use crate::report::GlobalSeverity;
        match severity {
            GlobalSeverity::Major => &self.status.major_outage_channel_name,
            GlobalSeverity::Partial => &self.status.partial_outage_channel_name,
            GlobalSeverity::Maintenance => &self.status.maintenance_channel_name,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::report::GlobalSeverity;

    #[test]
    fn test_default_template_parses() {
        let config = Config::from_str(DEFAULT_CONFIG).unwrap();
        assert_eq!(config.bot.token, "YOUR_BOT_TOKEN");
        assert_eq!(config.bot.administrator_role_ids, vec!["ROLE_ID"]);
        assert_eq!(config.status.operational_channel_name, "「🟢」status");
        assert_eq!(config.embeds.default_color, "#2073cb");
    }

    #[test]
    fn test_camel_case_keys_map() {
        let yaml = r#"
bot:
  token: "t"
  administratorRoleIDs: ["1", "2"]
  guild_id: "g"
status:
  statusChannelId: "c"
  operationalChannelName: "op"
  partialOutageChannelName: "po"
  majorOutageChannelName: "mo"
  maintenanceChannelName: "mt"
logging:
  fatalLogChannelId: "f"
"#;
        let config = Config::from_str(yaml).unwrap();
        assert_eq!(config.bot.administrator_role_ids.len(), 2);
        assert_eq!(config.status.status_channel_id, "c");
        assert_eq!(config.logging.fatal_log_channel_id, "f");
        assert_eq!(config.logging.log_channel_id, "");
        // embeds section omitted entirely falls back to the palette defaults
        assert_eq!(config.embeds.error_color, "#ff0000");
    }

    #[test]
    fn test_missing_file_is_not_found() {
        let dir = tempfile::tempdir().unwrap();
        let result = Config::load(&dir.path().join("config.yml"));
        assert!(matches!(result, Err(ConfigError::NotFound { .. })));
    }

    #[test]
    fn test_corrupt_yaml_is_error() {
        assert!(matches!(
            Config::from_str("bot: ["),
            Err(ConfigError::Yaml(_))
        ));
    }

    #[test]
    fn test_channel_name_for_severity() {
        let config = Config::from_str(DEFAULT_CONFIG).unwrap();
        assert_eq!(config.channel_name_for(GlobalSeverity::Major), "「🔴」status");
        assert_eq!(
            config.channel_name_for(GlobalSeverity::Maintenance),
            "「🔵」status"
        );
    }

    #[test]
    fn test_write_default_refuses_overwrite() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.yml");

        Config::write_default(&path).unwrap();
        std::fs::write(&path, "bot:\n  token: \"real\"\nstatus:\n  statusChannelId: \"c\"\n  operationalChannelName: \"a\"\n  partialOutageChannelName: \"b\"\n  majorOutageChannelName: \"c\"\n  maintenanceChannelName: \"d\"\n").unwrap();
        Config::write_default(&path).unwrap();

        let config = Config::load(&path).unwrap();
        assert_eq!(config.bot.token, "real");
    }
}
