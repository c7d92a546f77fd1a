use serde_json::{json, Value};

use crate::command::rails_runner_command;
use crate::config::RailsConfig;
use crate::error::BridgeError;
use crate::protocol::ToolResultContent;
use crate::transport::Executor;

use super::{Dispatch, ToolDescriptor};

pub const ADAPTER_NAME: &str = "rails";

pub const USER_LAST: &str = "user_last";
pub const RAILS_EXEC: &str = "rails_exec";

/// Looks up the newest user and prints a fixed projection as one JSON line,
/// or `null` when the table is empty. Single line, no single quotes.
const USER_LAST_SNIPPET: &str = concat!(
    r#"scope = User.column_names.include?("created_at") ? User.order(:created_at, :id) : User.order(:id); "#,
    r#"u = scope.last; "#,
    r#"if u.nil? then puts "null" else "#,
    r#"h = { id: u.id, type: u.class.name }; "#,
    r#"h[:email] = u.email if u.respond_to?(:email); "#,
    r#"h[:created_at] = u.created_at if u.respond_to?(:created_at); "#,
    r#"puts h.to_json end"#,
);

/// Core tools: always active.
#[derive(Debug, Clone)]
pub struct RailsAdapter {
    rails: RailsConfig,
}

impl RailsAdapter {
    pub fn new(rails: RailsConfig) -> Self {
        Self { rails }
    }

    pub fn descriptors(&self) -> Vec<ToolDescriptor> {
        vec![
            ToolDescriptor {
                name: USER_LAST,
                description: "Return the most recently created User as a JSON object (id, type, email, created_at), or null",
                input_schema: json!({
                    "type": "object",
                    "properties": {}
                }),
            },
            // `code` has no sensible default, so a missing or non-string
            // value is rejected as invalid params rather than substituted.
            ToolDescriptor {
                name: RAILS_EXEC,
                description: "Run arbitrary Ruby code with `rails runner` on the remote application host and return its output. Executes with full application privileges.",
                input_schema: json!({
                    "type": "object",
                    "required": ["code"],
                    "properties": {
                        "code": {
                            "type": "string",
                            "description": "Ruby code to evaluate; newlines are joined into a single line"
                        }
                    }
                }),
            },
        ]
    }

    pub async fn dispatch(&self, tool: &str, args: &Value, executor: &Executor) -> Dispatch {
        match tool {
            USER_LAST => Some(self.user_last(executor).await),
            RAILS_EXEC => Some(self.rails_exec(args, executor).await),
            _ => None,
        }
    }

    async fn user_last(&self, executor: &Executor) -> Result<Vec<ToolResultContent>, BridgeError> {
        let command = rails_runner_command(&self.rails, USER_LAST_SNIPPET);
        let stdout = executor.execute(command).await?.into_stdout()?;

        // Boot noise may precede the payload; the projection is the last line.
        let line = stdout
            .lines()
            .map(str::trim)
            .filter(|l| !l.is_empty())
            .last()
            .unwrap_or_default();
        Ok(vec![ToolResultContent::text(line)])
    }

    async fn rails_exec(
        &self,
        args: &Value,
        executor: &Executor,
    ) -> Result<Vec<ToolResultContent>, BridgeError> {
        let code = args
            .get("code")
            .and_then(Value::as_str)
            .ok_or_else(|| BridgeError::InvalidParams("rails_exec requires a string `code` argument".into()))?;

        let command = rails_runner_command(&self.rails, code);
        let result = executor.execute(command).await?;
        let stderr = result.stderr.clone();
        let stdout = result.into_stdout()?;

        let mut content = vec![ToolResultContent::text(stdout)];
        if !stderr.trim().is_empty() {
            content.push(ToolResultContent::text(format!("stderr:\n{stderr}")));
        }
        Ok(content)
    }
}
