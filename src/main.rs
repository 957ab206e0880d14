//! rootls - list a directory through a local, su or SSH shell

use std::io::{self, Write};
use std::path::PathBuf;
use std::process::ExitCode;
use std::sync::Arc;

use chrono::{DateTime, Local, Utc};
use clap::{ArgGroup, Parser};
use tracing_subscriber::EnvFilter;

use rootls::config::{self, Config};
use rootls::errors::{AppError, AppResult};
use rootls::shell::{SshAuth, SshConnectionInfo};
use rootls::{list_directory, FileEntry, LocalShell, ShellExecutor, SizeField, SshShell, Timezone};

/// List a directory by parsing `ls -la` output
#[derive(Debug, Parser)]
#[command(name = "rootls", version, about)]
#[command(group(ArgGroup::new("remote").args(["ssh", "connection"])))]
struct Cli {
    /// Directory to list
    path: String,

    /// Configuration file (default: $XDG_CONFIG_HOME/rootls/config.toml)
    #[arg(long, value_name = "FILE")]
    config: Option<PathBuf>,

    /// Run the listing through `su -c`
    #[arg(long)]
    su: bool,

    /// Remote shell target, `user@host[:port]`
    #[arg(long, value_name = "TARGET", conflicts_with_all = ["su", "connection"])]
    ssh: Option<String>,

    /// Saved connection name from the config file
    #[arg(long, value_name = "NAME", conflicts_with = "su")]
    connection: Option<String>,

    /// SSH private key (the agent is used otherwise)
    #[arg(long, value_name = "FILE", requires = "remote")]
    key: Option<PathBuf>,

    /// Print entries as JSON
    #[arg(long)]
    json: bool,

    /// Interpret listing timestamps as UTC
    #[arg(long)]
    utc: bool,

    /// More logging (-v debug, -vv trace)
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,
}

fn init_logging(verbose: u8) {
    let default = match verbose {
        0 => "warn",
        1 => "rootls=debug",
        _ => "rootls=trace",
    };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(io::stderr)
        .init();
}

/// Pick the executor from flags and config
fn build_shell(cli: &Cli, config: &Config) -> AppResult<Arc<dyn ShellExecutor>> {
    let password = std::env::var("ROOTLS_SSH_PASSWORD").ok();

    let remote = match (&cli.ssh, &cli.connection) {
        (Some(target), _) => Some(
            SshConnectionInfo::parse(target)
                .ok_or_else(|| AppError::Config(format!("invalid ssh target: {}", target)))?,
        ),
        (None, Some(name)) => Some(
            config
                .find_connection(name)
                .ok_or_else(|| AppError::Config(format!("no saved connection named {}", name)))?
                .to_connection_info(),
        ),
        (None, None) => None,
    };

    if let Some(info) = remote {
        let info = with_auth(info, cli.key.as_ref(), password);
        return Ok(Arc::new(SshShell::connect(info)?));
    }

    let shell = if cli.su || config.shell.privileged {
        LocalShell::privileged(config.shell.su_program.clone())
    } else {
        LocalShell::new(config.shell.program.clone())
    };
    Ok(Arc::new(shell))
}

/// `--key` wins, then a saved key; the password only replaces agent auth
fn with_auth(info: SshConnectionInfo, key: Option<&PathBuf>, password: Option<String>) -> SshConnectionInfo {
    if let Some(key) = key {
        return info.auth(SshAuth::Key {
            private_key: key.clone(),
            passphrase: None,
        });
    }
    if matches!(info.auth, SshAuth::Agent)
        && let Some(password) = password
    {
        return info.auth(SshAuth::Password(password));
    }
    info
}

fn format_size(entry: &FileEntry) -> String {
    match entry.size {
        SizeField::Bytes(n) => n.to_string(),
        SizeField::DateOnly => "-".to_string(),
        SizeField::Device { major, minor } => format!(
            "{}, {}",
            major.map(|m| m.to_string()).unwrap_or_default(),
            minor.map(|m| m.to_string()).unwrap_or_default()
        ),
    }
}

fn format_time(entry: &FileEntry, timezone: Timezone) -> String {
    match timezone {
        Timezone::Utc => DateTime::<Utc>::from(entry.modified).format("%Y-%m-%d %H:%M").to_string(),
        Timezone::Local => DateTime::<Local>::from(entry.modified).format("%Y-%m-%d %H:%M").to_string(),
    }
}

fn print_table(out: &mut impl Write, entries: &[FileEntry], timezone: Timezone) -> io::Result<()> {
    let owner_width = entries.iter().filter_map(|e| e.owner.as_ref()).map(|o| o.len()).max().unwrap_or(0);
    let group_width = entries.iter().filter_map(|e| e.group.as_ref()).map(|g| g.len()).max().unwrap_or(0);
    let size_width = entries.iter().map(|e| format_size(e).len()).max().unwrap_or(0);

    for entry in entries {
        if !entry.read_available {
            writeln!(out, "{:<10} ?  {}", "??????????", entry.name)?;
            continue;
        }
        let mut name = entry.name.clone();
        if let Some(target) = &entry.symlink_target {
            name.push_str(" -> ");
            name.push_str(target);
        }
        if entry.is_dir {
            name.push('/');
        }
        writeln!(
            out,
            "{:<10} {:<ow$} {:<gw$} {:>sw$} {} {}",
            entry.permissions,
            entry.owner.as_deref().unwrap_or("-"),
            entry.group.as_deref().unwrap_or("-"),
            format_size(entry),
            format_time(entry, timezone),
            name,
            ow = owner_width,
            gw = group_width,
            sw = size_width,
        )?;
    }
    Ok(())
}

fn run(cli: Cli) -> AppResult<()> {
    let config = match &cli.config {
        Some(path) => Config::load_from(path)?,
        None => Config::load(),
    };
    tracing::debug!(config_file = ?config::config_file(), "configuration loaded");

    let mut options = config.listing.to_options();
    if cli.utc {
        options.timezone = Timezone::Utc;
    }

    let shell = build_shell(&cli, &config)?;
    let entries = list_directory(&shell, &cli.path, &options)?;

    let stdout = io::stdout();
    let mut out = stdout.lock();
    if cli.json {
        serde_json::to_writer_pretty(&mut out, &entries).map_err(io::Error::other)?;
        writeln!(out)?;
    } else {
        print_table(&mut out, &entries, options.timezone)?;
    }
    Ok(())
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    match run(cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("rootls: {}", e);
            ExitCode::FAILURE
        }
    }
}
