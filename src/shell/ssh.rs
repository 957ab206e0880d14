//! Remote shell over SSH
//!
//! Uses SSH2 exec channels; one channel per command on a shared session.

use std::io::Read;
use std::net::TcpStream;
use std::path::PathBuf;
use std::sync::Mutex;

use super::{decode_output, ShellError, ShellExecutor, ShellResult};

/// Connection information for SSH
#[derive(Debug, Clone)]
pub struct SshConnectionInfo {
    /// Username
    pub user: String,
    /// Hostname or IP address
    pub host: String,
    /// Port (default 22)
    pub port: u16,
    /// Authentication method
    pub auth: SshAuth,
}

/// Authentication method for SSH
#[derive(Debug, Clone)]
pub enum SshAuth {
    /// Password authentication
    Password(String),
    /// SSH key authentication
    Key {
        /// Path to private key file
        private_key: PathBuf,
        /// Passphrase for key (if encrypted)
        passphrase: Option<String>,
    },
    /// SSH agent authentication
    Agent,
}

impl SshConnectionInfo {
    /// Create connection info using the SSH agent
    pub fn new(user: String, host: String) -> Self {
        Self {
            user,
            host,
            port: 22,
            auth: SshAuth::Agent,
        }
    }

    /// Set port
    pub fn port(mut self, port: u16) -> Self {
        self.port = port;
        self
    }

    /// Set authentication method
    pub fn auth(mut self, auth: SshAuth) -> Self {
        self.auth = auth;
        self
    }

    /// Get display name for this connection
    pub fn display_name(&self) -> String {
        if self.port != 22 {
            format!("{}@{}:{}", self.user, self.host, self.port)
        } else {
            format!("{}@{}", self.user, self.host)
        }
    }

    /// Parse `user@host[:port]`, with or without an `ssh://` prefix
    pub fn parse(target: &str) -> Option<Self> {
        let target = target.strip_prefix("ssh://").unwrap_or(target);
        let target = target.trim_end_matches('/');
        let (user, host_port) = target.split_once('@')?;
        if user.is_empty() {
            return None;
        }

        let (host, port) = if let Some((h, p)) = host_port.split_once(':') {
            (h.to_string(), p.parse().ok()?)
        } else {
            (host_port.to_string(), 22)
        };
        if host.is_empty() {
            return None;
        }

        Some(Self {
            user: user.to_string(),
            host,
            port,
            auth: SshAuth::Agent,
        })
    }
}

/// Shell executor backed by an authenticated SSH session
pub struct SshShell {
    connection: SshConnectionInfo,
    session: Mutex<ssh2::Session>,
}

impl SshShell {
    /// Connect and authenticate
    pub fn connect(connection: SshConnectionInfo) -> ShellResult<Self> {
        let addr = format!("{}:{}", connection.host, connection.port);
        let tcp = TcpStream::connect(&addr)
            .map_err(|e| ShellError::Connection(format!("Failed to connect to {}: {}", addr, e)))?;

        let mut session = ssh2::Session::new()
            .map_err(|e| ShellError::Connection(format!("Failed to create session: {}", e)))?;

        session.set_tcp_stream(tcp);
        session
            .handshake()
            .map_err(|e| ShellError::Connection(format!("SSH handshake failed: {}", e)))?;

        // Keepalive every 10 seconds
        session.set_keepalive(true, 10);

        match &connection.auth {
            SshAuth::Password(password) => {
                session
                    .userauth_password(&connection.user, password)
                    .map_err(|e| ShellError::Auth(format!("Password auth failed: {}", e)))?;
            }
            SshAuth::Key { private_key, passphrase } => {
                session
                    .userauth_pubkey_file(&connection.user, None, private_key, passphrase.as_deref())
                    .map_err(|e| ShellError::Auth(format!("Key auth failed: {}", e)))?;
            }
            SshAuth::Agent => {
                let mut agent = session
                    .agent()
                    .map_err(|e| ShellError::Auth(format!("Failed to connect to SSH agent: {}", e)))?;
                agent
                    .connect()
                    .map_err(|e| ShellError::Auth(format!("Failed to connect to SSH agent: {}", e)))?;
                agent
                    .list_identities()
                    .map_err(|e| ShellError::Auth(format!("Failed to list agent identities: {}", e)))?;

                let authenticated = agent
                    .identities()
                    .unwrap_or_default()
                    .iter()
                    .any(|identity| agent.userauth(&connection.user, identity).is_ok());
                if !authenticated {
                    return Err(ShellError::Auth("No valid identity found in SSH agent".to_string()));
                }
            }
        }

        if !session.authenticated() {
            return Err(ShellError::Auth("Authentication failed".to_string()));
        }

        tracing::debug!(connection = %connection.display_name(), "ssh session established");

        Ok(Self {
            connection,
            session: Mutex::new(session),
        })
    }

    fn map_ssh_error(e: ssh2::Error) -> ShellError {
        match e.code() {
            ssh2::ErrorCode::Session(_) => ShellError::Connection(e.to_string()),
            _ => ShellError::Channel(e.to_string()),
        }
    }
}

impl ShellExecutor for SshShell {
    fn describe(&self) -> String {
        format!("ssh {}", self.connection.display_name())
    }

    fn run(&self, command: &str) -> ShellResult<Vec<String>> {
        let session = self.session.lock().map_err(|_| ShellError::Poisoned)?;

        let mut channel = session.channel_session().map_err(Self::map_ssh_error)?;
        // stderr carries the `lstat ... Permission denied` lines, in order
        channel
            .handle_extended_data(ssh2::ExtendedData::Merge)
            .map_err(Self::map_ssh_error)?;
        channel.exec(command).map_err(Self::map_ssh_error)?;

        let mut raw = Vec::new();
        channel
            .read_to_end(&mut raw)
            .map_err(|e| ShellError::Channel(e.to_string()))?;

        channel.wait_close().map_err(Self::map_ssh_error)?;
        if let Ok(status) = channel.exit_status()
            && status != 0
        {
            tracing::debug!(status, command, "remote command exited non-zero");
        }

        Ok(decode_output(&raw))
    }
}

impl Drop for SshShell {
    fn drop(&mut self) {
        if let Ok(session) = self.session.lock() {
            let _ = session.disconnect(None, "Goodbye", None);
        }
    }
}
