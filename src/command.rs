//! Turns tool arguments into remote shell command lines.
//!
//! Two quoting schemes live here and they are deliberately different:
//!
//! - Free-form Ruby passed to `rails runner` goes through [`quote_code`], which
//!   only backslash-escapes `'` inside a single-quoted wrapper. The code is
//!   meant for the remote interpreter and may legitimately contain shell
//!   metacharacters, so nothing else is touched. This is a known weak spot:
//!   it is not a general shell-injection defence, and anyone allowed to call
//!   `rails_exec` can already run arbitrary code on the remote host.
//! - Structured flags (journal queries) go through [`quote_token`], which
//!   quotes every token with `shell-escape` so no value can introduce shell
//!   syntax.
//!
//! Everything in this module is pure and total over its inputs.

use std::borrow::Cow;

use serde_json::Value;
use shell_escape::escape;

use crate::config::RailsConfig;

/// Quote a single token for a POSIX shell.
pub fn quote_token(token: &str) -> String {
    escape(Cow::Borrowed(token)).into_owned()
}

/// Replace every line break with a space. Remote execution is single-line.
pub fn collapse_newlines(code: &str) -> String {
    code.replace("\r\n", " ").replace(['\n', '\r'], " ")
}

/// Wrap free-form code in single quotes, backslash-escaping embedded `'`.
pub fn quote_code(code: &str) -> String {
    format!("'{}'", collapse_newlines(code).replace('\'', "\\'"))
}

/// Wrap a composed command as the argument of an interactive login shell.
pub fn login_shell(command: &str) -> String {
    format!("bash -lic \"{}\"", command.replace('"', "\\\""))
}

/// Build `cd <app> && [RAILS_ENV=<env>] <rails> r '<code>'`.
pub fn rails_runner_command(rails: &RailsConfig, code: &str) -> String {
    let mut runner = String::new();
    if let Some(env) = rails.rails_env.as_deref().filter(|e| !e.is_empty()) {
        runner.push_str("RAILS_ENV=");
        runner.push_str(&quote_token(env));
        runner.push(' ');
    }
    runner.push_str(&quote_token(&rails.rails_bin));
    runner.push_str(" r ");
    runner.push_str(&quote_code(code));

    let command = [format!("cd {}", quote_token(&rails.app_dir)), runner].join(" && ");

    if rails.login_shell {
        login_shell(&command)
    } else {
        command
    }
}

/// Parameters for one `journalctl` invocation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct JournalQuery {
    pub unit: Option<String>,
    pub lines: u32,
    pub since: Option<String>,
    pub priority: Option<String>,
    pub grep: Option<String>,
    pub reverse: bool,
}

impl JournalQuery {
    /// Read a query from loosely-typed tool arguments.
    ///
    /// Never fails: bad values fall back to defaults and empty strings are
    /// treated as absent.
    pub fn from_arguments(args: &Value, max_lines: u32) -> Self {
        Self {
            unit: optional_text(args.get("unit")),
            lines: clamp_lines(args.get("lines"), max_lines),
            since: optional_text(args.get("since")),
            priority: optional_text(args.get("priority")),
            grep: optional_text(args.get("grep")),
            reverse: is_truthy(args.get("reverse")),
        }
    }

    /// Render the command line. Every token is shell-quoted.
    pub fn to_command(&self) -> String {
        let mut tokens: Vec<String> = vec![
            "journalctl".into(),
            "--no-pager".into(),
            "-n".into(),
            self.lines.to_string(),
        ];

        let options = [
            ("-u", &self.unit),
            ("--since", &self.since),
            ("-p", &self.priority),
            ("-g", &self.grep),
        ];
        for (flag, value) in options {
            if let Some(value) = value {
                tokens.push(flag.to_string());
                tokens.push(value.clone());
            }
        }

        if self.reverse {
            tokens.push("-r".into());
        }

        tokens
            .iter()
            .map(|t| quote_token(t))
            .collect::<Vec<_>>()
            .join(" ")
    }
}

/// Clamp a requested line count into `[1, max]`.
///
/// Missing or non-numeric values fall back to `max`.
pub fn clamp_lines(value: Option<&Value>, max: u32) -> u32 {
    let max = max.max(1);
    let requested = match value {
        Some(Value::Number(n)) => n
            .as_i64()
            .or_else(|| n.as_f64().filter(|f| f.is_finite()).map(|f| f.trunc() as i64)),
        Some(Value::String(s)) => s.trim().parse::<i64>().ok(),
        _ => None,
    };

    match requested {
        Some(n) if n < 1 => 1,
        Some(n) if n > i64::from(max) => max,
        Some(n) => n as u32,
        None => max,
    }
}

/// Boolean-ish flag reading.
///
/// Strings are true only for `1`, `true`, `yes`, `y` (case-insensitive).
/// Other values use their ordinary truthiness: `null`, `false`, zero and
/// empty collections are false.
pub fn is_truthy(value: Option<&Value>) -> bool {
    match value {
        None | Some(Value::Null) => false,
        Some(Value::Bool(b)) => *b,
        Some(Value::String(s)) => matches!(
            s.trim().to_ascii_lowercase().as_str(),
            "1" | "true" | "yes" | "y"
        ),
        Some(Value::Number(n)) => n.as_f64().map_or(false, |f| f != 0.0),
        Some(Value::Array(a)) => !a.is_empty(),
        Some(Value::Object(o)) => !o.is_empty(),
    }
}

fn optional_text(value: Option<&Value>) -> Option<String> {
    match value {
        Some(Value::String(s)) if !s.is_empty() => Some(collapse_newlines(s)),
        Some(Value::Number(n)) => Some(n.to_string()),
        _ => None,
    }
}
