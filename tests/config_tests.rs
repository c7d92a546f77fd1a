use std::collections::HashMap;
use std::path::PathBuf;

use rails_mcp_bridge::config::{parse_adapter_list, ServerConfig, SshAuth, DEFAULT_JOURNAL_MAX_LINES};
use rails_mcp_bridge::error::BridgeError;

fn load(vars: &[(&str, &str)]) -> Result<ServerConfig, BridgeError> {
    let map: HashMap<&str, &str> = vars.iter().copied().collect();
    ServerConfig::from_lookup(|key| map.get(key).map(|v| v.to_string()))
}

#[test]
fn defaults_apply() {
    let config = load(&[("SSH_HOST", "h"), ("SSH_USER", "u")]).unwrap();
    assert_eq!(config.ssh.port, 22);
    assert!(config.ssh.trust_host);
    assert_eq!(config.rails.app_dir, "/app");
    assert_eq!(config.rails.rails_bin, "bin/rails");
    assert_eq!(config.rails.rails_env.as_deref(), Some("production"));
    assert!(!config.rails.login_shell);
    assert!(config.adapters.is_empty());
    assert_eq!(config.journal_max_lines, DEFAULT_JOURNAL_MAX_LINES);
}

#[test]
fn missing_host_or_user_is_fatal() {
    assert!(matches!(load(&[("SSH_USER", "u")]), Err(BridgeError::Configuration(_))));
    assert!(matches!(load(&[("SSH_HOST", "h")]), Err(BridgeError::Configuration(_))));
    assert!(matches!(
        load(&[("SSH_HOST", "  "), ("SSH_USER", "u")]),
        Err(BridgeError::Configuration(_))
    ));
}

#[test]
fn invalid_port_is_fatal() {
    let err = load(&[("SSH_HOST", "h"), ("SSH_USER", "u"), ("SSH_PORT", "ssh")]);
    assert!(matches!(err, Err(BridgeError::Configuration(_))));
}

#[test]
fn missing_auth_is_deferred_to_call_time() {
    let config = load(&[("SSH_HOST", "h"), ("SSH_USER", "u")]).unwrap();
    assert!(matches!(config.ssh.auth(), Err(BridgeError::Configuration(_))));
}

#[test]
fn key_auth_wins_over_password() {
    let config = load(&[
        ("SSH_HOST", "h"),
        ("SSH_USER", "u"),
        ("SSH_PASSWORD", "pw"),
        ("SSH_KEY_PATH", "/keys/id_ed25519"),
        ("SSH_KEY_PASSPHRASE", "phrase"),
    ])
    .unwrap();
    assert_eq!(
        config.ssh.auth().unwrap(),
        SshAuth::Key {
            path: PathBuf::from("/keys/id_ed25519"),
            passphrase: Some("phrase".into()),
        }
    );

    let config = load(&[("SSH_HOST", "h"), ("SSH_USER", "u"), ("SSH_PASSWORD", "pw")]).unwrap();
    assert_eq!(config.ssh.auth().unwrap(), SshAuth::Password("pw".into()));
}

#[test]
fn empty_rails_env_disables_assignment() {
    let config = load(&[("SSH_HOST", "h"), ("SSH_USER", "u"), ("RAILS_ENV", "")]).unwrap();
    assert_eq!(config.rails.rails_env, None);

    let config = load(&[("SSH_HOST", "h"), ("SSH_USER", "u"), ("RAILS_ENV", "staging")]).unwrap();
    assert_eq!(config.rails.rails_env.as_deref(), Some("staging"));
}

#[test]
fn flags_and_limits() {
    let config = load(&[
        ("SSH_HOST", "h"),
        ("SSH_USER", "u"),
        ("SSH_TRUST_HOST", "false"),
        ("RAILS_LOGIN_SHELL", "Yes"),
        ("JOURNALCTL_MAX_LINES", "0"),
    ])
    .unwrap();
    assert!(!config.ssh.trust_host);
    assert!(config.rails.login_shell);
    assert_eq!(config.journal_max_lines, DEFAULT_JOURNAL_MAX_LINES);

    let config = load(&[("SSH_HOST", "h"), ("SSH_USER", "u"), ("JOURNALCTL_MAX_LINES", "200")]).unwrap();
    assert_eq!(config.journal_max_lines, 200);
}

#[test]
fn adapter_list_is_trimmed_and_lowercased() {
    assert_eq!(
        parse_adapter_list(" JournalCtl , ,bogus,journalctl "),
        vec!["journalctl", "bogus", "journalctl"]
    );
}

#[test]
fn known_hosts_defaults_under_home() {
    let config = load(&[
        ("SSH_HOST", "h"),
        ("SSH_USER", "u"),
        ("SSH_TRUST_HOST", "false"),
        ("HOME", "/home/deploy"),
    ])
    .unwrap();
    assert!(!config.ssh.trust_host);
    assert_eq!(
        config.ssh.known_hosts,
        Some(PathBuf::from("/home/deploy/.ssh/known_hosts"))
    );

    let config = load(&[
        ("SSH_HOST", "h"),
        ("SSH_USER", "u"),
        ("HOME", "/home/deploy"),
        ("SSH_KNOWN_HOSTS", "/etc/ssh/ssh_known_hosts"),
    ])
    .unwrap();
    assert_eq!(
        config.ssh.known_hosts,
        Some(PathBuf::from("/etc/ssh/ssh_known_hosts"))
    );

    let config = load(&[("SSH_HOST", "h"), ("SSH_USER", "u"), ("SSH_TRUST_HOST", "no")]).unwrap();
    assert!(!config.ssh.trust_host);
    assert_eq!(config.ssh.known_hosts, None);
}
