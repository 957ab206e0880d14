//! Configuration management

use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::errors::{AppError, AppResult};
use crate::listing::{ListingOptions, Timezone, DEFAULT_LS_COMMAND};
use crate::shell::{SshAuth, SshConnectionInfo};

/// Main configuration structure
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Local shell settings
    pub shell: ShellConfig,
    /// Listing settings
    pub listing: ListingConfig,
    /// Saved SSH connections
    pub connections: Vec<SavedConnection>,
}

/// How local commands are run
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ShellConfig {
    /// Interpreter used for `-c` commands; `su` picks its own when privileged
    pub program: String,
    /// Run every command through `su -c`
    pub privileged: bool,
    /// The `su` binary
    pub su_program: String,
}

impl Default for ShellConfig {
    fn default() -> Self {
        Self {
            program: "sh".to_string(),
            privileged: false,
            su_program: "su".to_string(),
        }
    }
}

/// Listing behavior
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ListingConfig {
    /// Command prefix; the quoted path is appended
    pub command: String,
    /// Overall budget for symlink directory tests
    pub link_timeout_ms: u64,
    /// Parallel symlink directory tests
    pub link_workers: usize,
    /// "local" or "utc"
    pub timezone: Timezone,
}

impl Default for ListingConfig {
    fn default() -> Self {
        Self {
            command: DEFAULT_LS_COMMAND.to_string(),
            link_timeout_ms: 5000,
            link_workers: 4,
            timezone: Timezone::Local,
        }
    }
}

impl ListingConfig {
    pub fn to_options(&self) -> ListingOptions {
        ListingOptions {
            ls_command: self.command.clone(),
            timezone: self.timezone,
            link_timeout: Duration::from_millis(self.link_timeout_ms),
            link_workers: self.link_workers,
        }
    }
}

/// A saved SSH connection (password not stored for security)
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SavedConnection {
    /// Display name for the connection
    pub name: String,
    /// Username for SSH
    pub user: String,
    /// Hostname or IP address
    pub host: String,
    /// Port (default 22)
    #[serde(default = "default_ssh_port")]
    pub port: u16,
    /// Private key; the SSH agent is used when absent
    #[serde(default)]
    pub key: Option<String>,
}

impl SavedConnection {
    pub fn to_connection_info(&self) -> SshConnectionInfo {
        let info = SshConnectionInfo::new(self.user.clone(), self.host.clone()).port(self.port);
        match &self.key {
            Some(key) => info.auth(SshAuth::Key {
                private_key: expand_home(key),
                passphrase: None,
            }),
            None => info,
        }
    }
}

fn default_ssh_port() -> u16 {
    22
}

/// Expand a leading `~/` using `$HOME`
pub fn expand_home(path: &str) -> PathBuf {
    if let Some(rest) = path.strip_prefix("~/")
        && let Ok(home) = std::env::var("HOME")
    {
        return PathBuf::from(home).join(rest);
    }
    PathBuf::from(path)
}

/// Get the config directory path for the current platform
pub fn config_dir() -> Option<PathBuf> {
    #[cfg(target_os = "windows")]
    {
        // Windows: %APPDATA%\rootls
        std::env::var("APPDATA")
            .ok()
            .map(|p| PathBuf::from(p).join("rootls"))
    }

    #[cfg(not(target_os = "windows"))]
    {
        // XDG_CONFIG_HOME first, then ~/.config
        std::env::var("XDG_CONFIG_HOME")
            .ok()
            .filter(|p| !p.is_empty())
            .map(PathBuf::from)
            .or_else(|| std::env::var("HOME").ok().map(|p| PathBuf::from(p).join(".config")))
            .map(|p| p.join("rootls"))
    }
}

/// Get the config file path
pub fn config_file() -> Option<PathBuf> {
    config_dir().map(|p| p.join("config.toml"))
}

impl Config {
    /// Load the default config file, falling back to defaults on any problem
    pub fn load() -> Self {
        let Some(config_path) = config_file() else {
            tracing::warn!("could not determine config directory");
            return Config::default();
        };

        if !config_path.exists() {
            return Config::default();
        }

        match Self::load_from(&config_path) {
            Ok(config) => config,
            Err(e) => {
                tracing::warn!(error = %e, "using default configuration");
                Config::default()
            }
        }
    }

    /// Load an explicit config file; errors are returned, not swallowed
    pub fn load_from(path: &Path) -> AppResult<Self> {
        let content = fs::read_to_string(path)?;
        Self::parse(&content)
            .map_err(|e| AppError::Config(format!("{}: {}", path.display(), e)))
    }

    /// Parse TOML text
    pub fn parse(content: &str) -> Result<Self, toml_edit::de::Error> {
        toml_edit::de::from_str(content)
    }

    /// Find a saved connection by name
    pub fn find_connection(&self, name: &str) -> Option<&SavedConnection> {
        self.connections.iter().find(|c| c.name == name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_defaults() {
        let config = Config::parse("").unwrap();
        assert_eq!(config.shell.program, "sh");
        assert!(!config.shell.privileged);
        assert_eq!(config.listing.command, "ls -la");
        assert_eq!(config.listing.timezone, Timezone::Local);
        assert!(config.connections.is_empty());

        let options = config.listing.to_options();
        assert_eq!(options.link_timeout, Duration::from_secs(5));
        assert_eq!(options.link_workers, 4);
    }

    #[test]
    fn test_full_config() {
        let config = Config::parse(
            r#"
[shell]
privileged = true
su_program = "/system/xbin/su"

[listing]
command = "ls -la --time-style=long-iso"
link_timeout_ms = 250
timezone = "utc"

[[connections]]
name = "phone"
user = "root"
host = "192.168.1.20"
port = 8022
key = "/keys/phone"
"#,
        )
        .unwrap();

        assert!(config.shell.privileged);
        assert_eq!(config.shell.su_program, "/system/xbin/su");
        assert_eq!(config.shell.program, "sh");
        assert_eq!(config.listing.timezone, Timezone::Utc);
        assert_eq!(config.listing.link_workers, 4);
        assert_eq!(config.listing.to_options().link_timeout, Duration::from_millis(250));

        let conn = config.find_connection("phone").unwrap();
        let info = conn.to_connection_info();
        assert_eq!(info.display_name(), "root@192.168.1.20:8022");
        assert!(matches!(info.auth, SshAuth::Key { ref private_key, .. } if private_key == Path::new("/keys/phone")));
        assert!(config.find_connection("tablet").is_none());
    }

    #[test]
    fn test_invalid_timezone_rejected() {
        assert!(Config::parse("[listing]\ntimezone = \"mars\"\n").is_err());
    }

    #[test]
    fn test_load_from_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "[listing]\nlink_workers = 1").unwrap();
        let config = Config::load_from(file.path()).unwrap();
        assert_eq!(config.listing.link_workers, 1);

        let mut broken = tempfile::NamedTempFile::new().unwrap();
        writeln!(broken, "[listing\n").unwrap();
        assert!(matches!(Config::load_from(broken.path()), Err(AppError::Config(_))));

        assert!(matches!(
            Config::load_from(Path::new("/nonexistent/rootls.toml")),
            Err(AppError::Io(_))
        ));
    }

    #[test]
    fn test_saved_connection_agent_default() {
        let conn = SavedConnection {
            name: "lab".to_string(),
            user: "shell".to_string(),
            host: "lab.local".to_string(),
            port: 22,
            key: None,
        };
        assert!(matches!(conn.to_connection_info().auth, SshAuth::Agent));
    }
}
