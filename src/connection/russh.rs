//! Russh connection module
//!
//! SSH connectivity for network devices using the russh crate. Scripts are
//! written to an interactive shell channel (with a wide pseudo terminal so
//! the device does not wrap long lines) and the channel output is collected
//! until the device closes it.

use async_trait::async_trait;
use russh::client::{Handle, Handler};
use russh::keys::key::PublicKey;
use russh::keys::load_secret_key;
use russh::ChannelMsg;
use std::net::SocketAddr;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::RwLock;
use tracing::{debug, trace, warn};

use super::config::{expand_path, HostConfig};
use super::{
    CommandResult, Connection, ConnectionError, ConnectionResult, ExecuteOptions, RusshError,
};

/// Terminal width requested for the shell channel
const TERMINAL_WIDTH: u32 = 512;

/// Result of host key verification
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum HostKeyStatus {
    /// Key matches known_hosts entry
    Verified,
    /// Host not found in known_hosts (first connection)
    Unknown,
    /// Key doesn't match known_hosts entry
    Mismatch,
}

/// A parsed entry from a known_hosts file
#[derive(Debug, Clone)]
struct KnownHostEntry {
    patterns: Vec<String>,
    key: PublicKey,
}

/// Client handler for russh with host key verification
struct ClientHandler {
    host: String,
    port: u16,
    known_hosts: Vec<KnownHostEntry>,
    accept_unknown: bool,
}

impl ClientHandler {
    fn new(host: &str, port: u16, host_config: &HostConfig) -> Self {
        Self {
            host: host.to_string(),
            port,
            known_hosts: Self::load_known_hosts(host_config.known_hosts_path()),
            accept_unknown: !host_config.strict_host_key_checking,
        }
    }

    fn load_known_hosts(path: Option<PathBuf>) -> Vec<KnownHostEntry> {
        let Some(path) = path.filter(|p| p.exists()) else {
            return Vec::new();
        };

        let content = match std::fs::read_to_string(&path) {
            Ok(c) => c,
            Err(e) => {
                debug!(error = %e, path = %path.display(), "Failed to read known_hosts file");
                return Vec::new();
            }
        };

        let entries: Vec<KnownHostEntry> = content
            .lines()
            .map(str::trim)
            .filter(|line| !line.is_empty() && !line.starts_with('#'))
            .filter_map(Self::parse_known_hosts_line)
            .collect();

        debug!(entry_count = %entries.len(), "Loaded known_hosts entries");
        entries
    }

    /// Parse `hostname[,hostname...] keytype base64key [comment]`
    fn parse_known_hosts_line(line: &str) -> Option<KnownHostEntry> {
        let mut parts = line.split_whitespace();
        let patterns = parts.next()?.split(',').map(str::to_string).collect();
        let key_type = parts.next()?;
        let key_data = parts.next()?;

        match russh_keys::parse_public_key_base64(key_data) {
            Ok(key) => Some(KnownHostEntry { patterns, key }),
            Err(_) => {
                trace!(key_type = %key_type, "Failed to parse key, skipping entry");
                None
            }
        }
    }

    /// Plain names match port 22 only, `[host]:port` matches that port.
    /// Hashed entries are never matched.
    fn pattern_matches(pattern: &str, host: &str, port: u16) -> bool {
        if let Some(rest) = pattern.strip_prefix('[') {
            return match rest.split_once("]:") {
                Some((pattern_host, pattern_port)) => {
                    pattern_host == host && pattern_port.parse::<u16>().ok() == Some(port)
                }
                None => false,
            };
        }
        port == 22 && pattern == host
    }

    fn verify_host_key(&self, server_key: &PublicKey) -> HostKeyStatus {
        let entry = self.known_hosts.iter().find(|entry| {
            entry
                .patterns
                .iter()
                .any(|p| Self::pattern_matches(p, &self.host, self.port))
        });

        match entry {
            Some(entry) if entry.key.fingerprint() == server_key.fingerprint() => {
                HostKeyStatus::Verified
            }
            Some(_) => HostKeyStatus::Mismatch,
            None => HostKeyStatus::Unknown,
        }
    }
}

#[async_trait]
impl Handler for ClientHandler {
    type Error = RusshError;

    async fn check_server_key(
        &mut self,
        server_public_key: &PublicKey,
    ) -> Result<bool, Self::Error> {
        match self.verify_host_key(server_public_key) {
            HostKeyStatus::Verified => {
                debug!(host = %self.host, "Host key verified against known_hosts");
                Ok(true)
            }
            HostKeyStatus::Unknown if self.accept_unknown => {
                warn!(
                    host = %self.host,
                    fingerprint = %server_public_key.fingerprint(),
                    "Host not found in known_hosts, accepting"
                );
                Ok(true)
            }
            HostKeyStatus::Unknown => {
                warn!(host = %self.host, "Host not found in known_hosts, rejecting");
                Ok(false)
            }
            HostKeyStatus::Mismatch => {
                warn!(
                    host = %self.host,
                    "HOST KEY VERIFICATION FAILED! Server key does not match known_hosts entry."
                );
                Ok(false)
            }
        }
    }
}

/// SSH session to a single network device
pub struct RusshConnection {
    /// `user@host:port`
    identifier: String,
    /// Client handle, taken on close
    handle: RwLock<Option<Handle<ClientHandler>>>,
    connected: AtomicBool,
    /// Default script timeout
    timeout: Duration,
}

impl RusshConnection {
    /// Resolve, connect and authenticate
    pub async fn connect(host_config: &HostConfig) -> ConnectionResult<Self> {
        host_config.validate()?;

        let host = host_config.hostname.as_deref().unwrap_or_default();
        let user = host_config.user.as_deref().unwrap_or_default();
        let port = host_config.port_or_default();
        let timeout = host_config.timeout_duration();
        let identifier = host_config.identifier();

        let addr = Self::resolve(host, port, timeout).await?;
        debug!(host = %host, addr = %addr, user = %user, "Connecting via SSH (russh)");

        let mut config = russh::client::Config::default();
        config.inactivity_timeout = Some(timeout);
        let config = Arc::new(config);

        let socket = tokio::time::timeout(timeout, tokio::net::TcpStream::connect(addr))
            .await
            .map_err(|_| ConnectionError::Timeout(timeout.as_secs()))?
            .map_err(|e| {
                ConnectionError::ConnectionFailed(format!("Failed to connect to {}: {}", addr, e))
            })?;

        socket.set_nodelay(true).map_err(|e| {
            ConnectionError::ConnectionFailed(format!("Failed to set TCP_NODELAY: {}", e))
        })?;

        let handler = ClientHandler::new(host, port, host_config);
        let mut session = russh::client::connect_stream(config, socket, handler)
            .await
            .map_err(|e| {
                ConnectionError::ConnectionFailed(format!("SSH handshake failed: {}", e))
            })?;

        Self::authenticate(&mut session, user, host_config).await?;

        debug!(identifier = %identifier, "SSH connection established");
        Ok(Self {
            identifier,
            handle: RwLock::new(Some(session)),
            connected: AtomicBool::new(true),
            timeout,
        })
    }

    async fn resolve(host: &str, port: u16, timeout: Duration) -> ConnectionResult<SocketAddr> {
        let mut addrs = tokio::time::timeout(timeout, tokio::net::lookup_host((host, port)))
            .await
            .map_err(|_| ConnectionError::Timeout(timeout.as_secs()))?
            .map_err(|e| ConnectionError::HostNotFound(format!("{}: {}", host, e)))?;

        addrs
            .next()
            .ok_or_else(|| ConnectionError::HostNotFound(host.to_string()))
    }

    /// Key authentication first when an identity file is set, then password
    async fn authenticate(
        session: &mut Handle<ClientHandler>,
        user: &str,
        host_config: &HostConfig,
    ) -> ConnectionResult<()> {
        if let Some(identity_file) = &host_config.identity_file {
            let key_path = expand_path(identity_file);
            match Self::try_key_auth(session, user, &key_path, host_config.password.as_deref())
                .await
            {
                Ok(()) => {
                    debug!(key = %key_path.display(), "Authenticated using key");
                    return Ok(());
                }
                Err(e) => debug!(error = %e, "Key authentication failed"),
            }
        }

        if let Some(password) = &host_config.password {
            let authenticated = session
                .authenticate_password(user, password)
                .await
                .map_err(|e| {
                    ConnectionError::AuthenticationFailed(format!(
                        "Password authentication failed: {}",
                        e
                    ))
                })?;

            if authenticated {
                debug!("Authenticated using password");
                return Ok(());
            }
        }

        Err(ConnectionError::AuthenticationFailed(format!(
            "All authentication methods failed for {}",
            user
        )))
    }

    async fn try_key_auth(
        session: &mut Handle<ClientHandler>,
        user: &str,
        key_path: &Path,
        passphrase: Option<&str>,
    ) -> ConnectionResult<()> {
        if !key_path.exists() {
            return Err(ConnectionError::AuthenticationFailed(format!(
                "Key file not found: {}",
                key_path.display()
            )));
        }

        let key_pair = load_secret_key(key_path, passphrase).map_err(|e| {
            ConnectionError::AuthenticationFailed(format!(
                "Failed to load key {}: {}",
                key_path.display(),
                e
            ))
        })?;

        let authenticated = session
            .authenticate_publickey(user, Arc::new(key_pair))
            .await
            .map_err(|e| {
                ConnectionError::AuthenticationFailed(format!(
                    "Key authentication failed for {}: {}",
                    key_path.display(),
                    e
                ))
            })?;

        if authenticated {
            Ok(())
        } else {
            Err(ConnectionError::AuthenticationFailed(
                "Key authentication failed".to_string(),
            ))
        }
    }

    async fn run_script(&self, script: &str) -> ConnectionResult<CommandResult> {
        let handle_guard = self.handle.read().await;
        let handle = handle_guard
            .as_ref()
            .ok_or(ConnectionError::ConnectionClosed)?;

        let mut channel = handle.channel_open_session().await.map_err(|e| {
            ConnectionError::ExecutionFailed(format!("Failed to open channel: {}", e))
        })?;
        drop(handle_guard);

        channel
            .request_pty(false, "vt100", TERMINAL_WIDTH, 0, 0, 0, &[])
            .await
            .map_err(|e| ConnectionError::ExecutionFailed(format!("Failed to request pty: {}", e)))?;
        channel.request_shell(true).await.map_err(|e| {
            ConnectionError::ExecutionFailed(format!("Failed to start shell: {}", e))
        })?;

        let payload = format!("{}\n", script);
        channel.data(payload.as_bytes()).await.map_err(|e| {
            ConnectionError::ExecutionFailed(format!("Failed to write script: {}", e))
        })?;
        channel.eof().await.map_err(|e| {
            ConnectionError::ExecutionFailed(format!("Failed to send EOF: {}", e))
        })?;

        let mut stdout = Vec::new();
        let mut stderr = Vec::new();
        let mut exit_code = None;

        while let Some(msg) = channel.wait().await {
            match msg {
                ChannelMsg::Data { ref data } => stdout.extend_from_slice(data),
                ChannelMsg::ExtendedData { ref data, ext } if ext == 1 => {
                    stderr.extend_from_slice(data)
                }
                ChannelMsg::ExitStatus { exit_status } => exit_code = Some(exit_status),
                ChannelMsg::Close => break,
                _ => {}
            }
        }

        let exit_code = exit_code.map(|e| e as i32).unwrap_or(0);
        let stdout = String::from_utf8_lossy(&stdout).to_string();
        let stderr = String::from_utf8_lossy(&stderr).to_string();

        trace!(exit_code = %exit_code, bytes = stdout.len(), "Script completed");

        if exit_code == 0 {
            Ok(CommandResult::success(stdout, stderr))
        } else {
            Ok(CommandResult::failure(exit_code, stdout, stderr))
        }
    }
}

#[async_trait]
impl Connection for RusshConnection {
    fn identifier(&self) -> &str {
        &self.identifier
    }

    async fn is_alive(&self) -> bool {
        self.connected.load(Ordering::SeqCst) && self.handle.read().await.is_some()
    }

    async fn execute(
        &self,
        script: &str,
        options: Option<ExecuteOptions>,
    ) -> ConnectionResult<CommandResult> {
        let timeout = options
            .and_then(|o| o.timeout)
            .map(Duration::from_secs)
            .unwrap_or(self.timeout);

        trace!(identifier = %self.identifier, lines = script.lines().count(), "Running script");

        match tokio::time::timeout(timeout, self.run_script(script)).await {
            Ok(result) => {
                if result.is_err() {
                    self.connected.store(false, Ordering::SeqCst);
                }
                result
            }
            Err(_) => {
                self.connected.store(false, Ordering::SeqCst);
                Err(ConnectionError::Timeout(timeout.as_secs()))
            }
        }
    }

    async fn close(&self) -> ConnectionResult<()> {
        debug!(identifier = %self.identifier, "Closing SSH connection");
        self.connected.store(false, Ordering::SeqCst);

        let handle = self.handle.write().await.take();
        if let Some(handle) = handle {
            handle
                .disconnect(
                    russh::Disconnect::ByApplication,
                    "Connection closed by client",
                    "en",
                )
                .await?;
        }

        Ok(())
    }
}
