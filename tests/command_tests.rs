//! Command construction: quoting, clamping and flag parsing.

use rails_mcp_bridge::command::{
    clamp_lines, collapse_newlines, is_truthy, quote_code, quote_token, rails_runner_command,
    JournalQuery,
};
use rails_mcp_bridge::config::RailsConfig;
use serde_json::json;

/// Single quotes not preceded by a backslash.
fn unescaped_quotes(s: &str) -> usize {
    let mut count = 0;
    let mut prev = None;
    for ch in s.chars() {
        if ch == '\'' && prev != Some('\\') {
            count += 1;
        }
        prev = Some(ch);
    }
    count
}

// ---------------------------------------------------------------------------
// rails runner commands
// ---------------------------------------------------------------------------

#[test]
fn rails_command_default_layout() {
    let cmd = rails_runner_command(&RailsConfig::default(), "User.count");
    assert_eq!(cmd, "cd /app && RAILS_ENV=production bin/rails r 'User.count'");
}

#[test]
fn rails_command_without_environment() {
    let rails = RailsConfig {
        rails_env: None,
        ..RailsConfig::default()
    };
    let cmd = rails_runner_command(&rails, "User.count");
    assert_eq!(cmd, "cd /app && bin/rails r 'User.count'");
}

#[test]
fn rails_command_quotes_app_dir_with_spaces() {
    let rails = RailsConfig {
        app_dir: "/srv/my app".into(),
        ..RailsConfig::default()
    };
    let cmd = rails_runner_command(&rails, "1");
    assert!(cmd.starts_with("cd '/srv/my app' && "), "got: {cmd}");
}

#[test]
fn rails_command_collapses_newlines() {
    let cmd = rails_runner_command(&RailsConfig::default(), "a = 1\nputs a\r\nputs 2\r");
    assert_eq!(
        cmd,
        "cd /app && RAILS_ENV=production bin/rails r 'a = 1 puts a puts 2 '"
    );
}

#[test]
fn rails_command_escapes_single_quotes() {
    let cmd = rails_runner_command(&RailsConfig::default(), "puts 'hi'");
    assert!(cmd.ends_with(r"r 'puts \'hi\''"), "got: {cmd}");
}

#[test]
fn rails_command_login_shell_wraps_and_escapes_double_quotes() {
    let rails = RailsConfig {
        login_shell: true,
        ..RailsConfig::default()
    };
    let cmd = rails_runner_command(&rails, r#"puts "x""#);
    assert_eq!(
        cmd,
        r#"bash -lic "cd /app && RAILS_ENV=production bin/rails r 'puts \"x\"'""#
    );
}

#[test]
fn quote_code_is_total_and_single_line() {
    let inputs = ["", "'", "a'b'c", "x\ny", "\r\n'\n", "''''", "$(rm -rf /)", "tab\there"];
    for input in inputs {
        let quoted = quote_code(input);
        assert!(!quoted.contains('\n') && !quoted.contains('\r'), "{input:?} -> {quoted:?}");
        assert!(quoted.starts_with('\'') && quoted.ends_with('\''));
        assert_eq!(unescaped_quotes(&quoted), 2, "{input:?} -> {quoted:?}");

        let full = rails_runner_command(&RailsConfig::default(), input);
        assert!(!full.contains('\n'));
        assert_eq!(unescaped_quotes(&full) % 2, 0, "{input:?} -> {full:?}");
    }
}

#[test]
fn collapse_newlines_keeps_other_text() {
    assert_eq!(collapse_newlines("a\nb\r\nc\rd"), "a b c d");
    assert_eq!(collapse_newlines("no breaks"), "no breaks");
}

#[test]
fn quote_token_leaves_safe_tokens_alone() {
    assert_eq!(quote_token("--no-pager"), "--no-pager");
    assert_eq!(quote_token("puma.service"), "puma.service");
    assert_eq!(quote_token("1 hour ago"), "'1 hour ago'");
    assert_eq!(quote_token("it's"), r"'it'\''s'");
    assert_eq!(quote_token(""), "''");
}

// ---------------------------------------------------------------------------
// journal queries
// ---------------------------------------------------------------------------

#[test]
fn journal_minimal_command() {
    let query = JournalQuery::from_arguments(&json!({}), 500);
    assert_eq!(query.to_command(), "journalctl --no-pager -n 500");
}

#[test]
fn journal_empty_strings_are_omitted() {
    let args = json!({
        "unit": "",
        "since": "",
        "priority": "",
        "grep": "",
        "reverse": false
    });
    let query = JournalQuery::from_arguments(&args, 500);
    assert_eq!(query.to_command(), "journalctl --no-pager -n 500");
}

#[test]
fn journal_full_command_quotes_every_value() {
    let args = json!({
        "unit": "puma.service",
        "lines": 50,
        "since": "1 hour ago",
        "priority": "err",
        "grep": "timeout; rm -rf /",
        "reverse": "yes"
    });
    let query = JournalQuery::from_arguments(&args, 500);
    assert_eq!(
        query.to_command(),
        "journalctl --no-pager -n 50 -u puma.service --since '1 hour ago' -p err -g 'timeout; rm -rf /' -r"
    );
}

#[test]
fn journal_lines_clamping() {
    assert_eq!(clamp_lines(Some(&json!(0)), 500), 1);
    assert_eq!(clamp_lines(Some(&json!(-3)), 500), 1);
    assert_eq!(clamp_lines(Some(&json!(100000)), 500), 500);
    assert_eq!(clamp_lines(Some(&json!("abc")), 500), 500);
    assert_eq!(clamp_lines(None, 500), 500);
    assert_eq!(clamp_lines(Some(&json!(null)), 500), 500);
    assert_eq!(clamp_lines(Some(&json!("25")), 500), 25);
    assert_eq!(clamp_lines(Some(&json!(12.7)), 500), 12);
    assert_eq!(clamp_lines(Some(&json!(40)), 20), 20);
}

#[test]
fn reverse_flag_parsing() {
    for truthy in [json!(true), json!("1"), json!("TRUE"), json!("yes"), json!("Y"), json!(1)] {
        assert!(is_truthy(Some(&truthy)), "{truthy} should be true");
    }
    for falsy in [json!(false), json!(null), json!("no"), json!("false"), json!(""), json!(0)] {
        assert!(!is_truthy(Some(&falsy)), "{falsy} should be false");
    }
    assert!(!is_truthy(None));
}
