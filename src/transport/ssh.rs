use std::io::{ErrorKind, Read};
use std::net::{TcpStream, ToSocketAddrs};
use std::time::Duration;

use ssh2::{CheckResult, KnownHostFileKind, Session};
use tracing::{debug, warn};

use crate::config::{SshAuth, SshConfig};
use crate::error::BridgeError;

use super::{Capture, CommandRunner, RemoteCommandResult};

/// Back-off between polls when neither stream had data.
const IDLE_POLL: Duration = Duration::from_millis(10);

/// Runs each command on a brand-new SSH session. Nothing is pooled or retried.
#[derive(Debug, Clone)]
pub struct SshRunner {
    config: SshConfig,
}

impl SshRunner {
    pub fn new(config: SshConfig) -> Self {
        Self { config }
    }

    fn connect(&self, auth: &SshAuth) -> Result<Session, BridgeError> {
        let cfg = &self.config;
        let addr = (cfg.host.as_str(), cfg.port)
            .to_socket_addrs()
            .map_err(|e| BridgeError::transport_with(format!("cannot resolve {}", cfg.host), e))?
            .next()
            .ok_or_else(|| BridgeError::transport(format!("no address for {}", cfg.host)))?;

        let tcp = TcpStream::connect_timeout(&addr, cfg.connect_timeout).map_err(|e| {
            BridgeError::transport_with(format!("failed to connect to {addr}"), e)
        })?;

        let mut session = Session::new()
            .map_err(|e| BridgeError::transport_with("failed to create SSH session", e))?;
        session.set_tcp_stream(tcp);
        session.set_timeout(timeout_ms(cfg.connect_timeout));
        session
            .handshake()
            .map_err(|e| BridgeError::transport_with("SSH handshake failed", e))?;

        if cfg.trust_host {
            debug!(host = %cfg.host, "host key verification disabled");
        } else {
            self.verify_host_key(&session)?;
        }

        match auth {
            SshAuth::Key { path, passphrase } => session
                .userauth_pubkey_file(&cfg.user, None, path, passphrase.as_deref())
                .map_err(|e| {
                    BridgeError::transport_with(
                        format!("key authentication failed ({})", path.display()),
                        e,
                    )
                })?,
            SshAuth::Password(password) => session
                .userauth_password(&cfg.user, password)
                .map_err(|e| BridgeError::transport_with("password authentication failed", e))?,
        }

        if !session.authenticated() {
            return Err(BridgeError::transport("SSH authentication failed"));
        }

        // The command itself runs without a deadline.
        session.set_timeout(0);
        Ok(session)
    }

    fn verify_host_key(&self, session: &Session) -> Result<(), BridgeError> {
        let cfg = &self.config;
        let path = cfg.known_hosts.as_ref().ok_or_else(|| {
            BridgeError::Configuration(
                "SSH_TRUST_HOST is off but no known_hosts file is configured".to_string(),
            )
        })?;

        let mut known_hosts = session
            .known_hosts()
            .map_err(|e| BridgeError::transport_with("cannot initialise known_hosts", e))?;
        known_hosts
            .read_file(path, KnownHostFileKind::OpenSSH)
            .map_err(|e| {
                BridgeError::transport_with(format!("cannot read {}", path.display()), e)
            })?;

        let (key, _) = session
            .host_key()
            .ok_or_else(|| BridgeError::transport("server presented no host key"))?;

        match known_hosts.check_port(&cfg.host, cfg.port, key) {
            CheckResult::Match => Ok(()),
            CheckResult::NotFound => Err(BridgeError::transport(format!(
                "host key for {} not found in {}",
                cfg.host,
                path.display()
            ))),
            CheckResult::Mismatch => Err(BridgeError::transport(format!(
                "host key mismatch for {}",
                cfg.host
            ))),
            CheckResult::Failure => Err(BridgeError::transport(format!(
                "host key check failed for {}",
                cfg.host
            ))),
        }
    }
}

impl CommandRunner for SshRunner {
    fn run(&self, command: &str) -> Result<RemoteCommandResult, BridgeError> {
        // Fail before touching the network when no credential is configured.
        let auth = self.config.auth()?;
        let session = self.connect(&auth)?;

        let mut channel = session
            .channel_session()
            .map_err(|e| BridgeError::transport_with("failed to open channel", e))?;
        channel
            .exec(command)
            .map_err(|e| BridgeError::transport_with("failed to start remote command", e))?;

        let mut stderr_stream = channel.stderr();
        let mut stdout = Capture::new(self.config.max_capture_bytes);
        let mut stderr = Capture::new(self.config.max_capture_bytes);
        let mut buf = [0u8; 16 * 1024];

        // Poll both streams without blocking so a full stderr window can
        // never stall a blocked stdout read, or vice versa.
        session.set_blocking(false);
        loop {
            let out = pump(&mut channel, &mut buf, &mut stdout)
                .map_err(|e| BridgeError::transport_with("stdout read failed", e))?;
            let err = pump(&mut stderr_stream, &mut buf, &mut stderr)
                .map_err(|e| BridgeError::transport_with("stderr read failed", e))?;

            if !out && !err {
                if channel.eof() {
                    break;
                }
                std::thread::sleep(IDLE_POLL);
            }
        }
        session.set_blocking(true);

        if stdout.truncated() || stderr.truncated() {
            warn!(
                limit = self.config.max_capture_bytes,
                "remote output exceeded capture limit"
            );
        }

        let (exit_status, exit_signal) = match channel.wait_close() {
            Ok(()) => {
                let signal = channel
                    .exit_signal()
                    .ok()
                    .and_then(|sig| sig.exit_signal);
                match signal {
                    Some(signal) => (None, Some(signal)),
                    None => (
                        Some(channel.exit_status().map_err(|e| {
                            BridgeError::transport_with("cannot read exit status", e)
                        })?),
                        None,
                    ),
                }
            }
            Err(e) => {
                warn!(error = %e, "channel closed without exit status");
                (None, None)
            }
        };

        let _ = session.disconnect(None, "command complete", None);

        Ok(RemoteCommandResult {
            stdout: stdout.into_string(),
            stderr: stderr.into_string(),
            exit_status,
            exit_signal,
        })
    }
}

/// Read whatever is available. Returns `true` when bytes were captured.
fn pump(reader: &mut impl Read, buf: &mut [u8], capture: &mut Capture) -> std::io::Result<bool> {
    match reader.read(buf) {
        Ok(0) => Ok(false),
        Ok(n) => {
            capture.push(&buf[..n]);
            Ok(true)
        }
        Err(e) if e.kind() == ErrorKind::WouldBlock => Ok(false),
        Err(e) => Err(e),
    }
}

fn timeout_ms(duration: Duration) -> u32 {
    u32::try_from(duration.as_millis()).unwrap_or(u32::MAX)
}
