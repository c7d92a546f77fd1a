//! Interactive console for a `rails-mcp-bridge` process.
//!
//! Spawns the server with piped stdio and speaks the same line protocol as
//! any MCP client. Commands: `list`, `call <tool> [json]`, `raw <json>`,
//! `help`, `quit`.

use std::error::Error;
use std::io::Write;
use std::path::{Path, PathBuf};
use std::process::Stdio;
use std::time::Duration;

use clap::Parser;
use rails_mcp_bridge::handlers::PROTOCOL_VERSION;
use serde_json::{json, Value};
use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader, Lines};
use tokio::process::{Child, ChildStdin, ChildStdout, Command};

type BoxError = Box<dyn Error + Send + Sync>;

#[derive(Debug, Parser)]
#[command(name = "rails-mcp-console", about = "Interactive client for rails-mcp-bridge")]
struct Args {
    /// Server executable (defaults to rails-mcp-bridge next to this binary)
    #[arg(long)]
    server: Option<PathBuf>,

    /// Seconds to wait for each response
    #[arg(long, default_value_t = 300)]
    timeout: u64,

    /// Extra arguments passed to the server
    #[arg(last = true)]
    server_args: Vec<String>,
}

struct Client {
    _child: Child,
    stdin: ChildStdin,
    stdout: Lines<BufReader<ChildStdout>>,
    next_id: u64,
    timeout: Duration,
}

impl Client {
    fn spawn(program: &Path, args: &[String], timeout: Duration) -> Result<Self, BoxError> {
        let mut child = Command::new(program)
            .args(args)
            .stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .stderr(Stdio::inherit())
            .kill_on_drop(true)
            .spawn()
            .map_err(|e| format!("cannot start {}: {e}", program.display()))?;

        let stdin = child.stdin.take().ok_or("server stdin unavailable")?;
        let stdout = child.stdout.take().ok_or("server stdout unavailable")?;

        Ok(Self {
            _child: child,
            stdin,
            stdout: BufReader::new(stdout).lines(),
            next_id: 1,
            timeout,
        })
    }

    async fn request(&mut self, method: &str, params: Value) -> Result<Value, BoxError> {
        let id = self.next_id;
        self.next_id += 1;
        let message = json!({
            "jsonrpc": "2.0",
            "id": id,
            "method": method,
            "params": params,
        });
        self.send(&message).await?;
        self.wait_for(&json!(id)).await
    }

    async fn send(&mut self, message: &Value) -> Result<(), BoxError> {
        let line = serde_json::to_string(message)?;
        self.stdin.write_all(line.as_bytes()).await?;
        self.stdin.write_all(b"\n").await?;
        self.stdin.flush().await?;
        Ok(())
    }

    /// Read responses until one carries `id`; others are printed and dropped.
    async fn wait_for(&mut self, id: &Value) -> Result<Value, BoxError> {
        loop {
            let line = tokio::time::timeout(self.timeout, self.stdout.next_line())
                .await
                .map_err(|_| "timed out waiting for server response")??
                .ok_or("server closed its output")?;

            let value: Value = match serde_json::from_str(&line) {
                Ok(v) => v,
                Err(_) => {
                    eprintln!("(ignoring non-JSON output: {line})");
                    continue;
                }
            };
            if value.get("id") == Some(id) {
                return Ok(value);
            }
            eprintln!("(unexpected message: {line})");
        }
    }
}

#[tokio::main(flavor = "current_thread")]
async fn main() {
    let args = Args::parse();
    if let Err(e) = run(args).await {
        eprintln!("rails-mcp-console: {e}");
        std::process::exit(1);
    }
}

async fn run(args: Args) -> Result<(), BoxError> {
    let program = match args.server {
        Some(path) => path,
        None => default_server_path()?,
    };
    let mut client = Client::spawn(&program, &args.server_args, Duration::from_secs(args.timeout))?;

    let init = client
        .request(
            "initialize",
            json!({
                "protocolVersion": PROTOCOL_VERSION,
                "clientInfo": { "name": "rails-mcp-console", "version": env!("CARGO_PKG_VERSION") }
            }),
        )
        .await?;
    if let Some(info) = init.pointer("/result/serverInfo") {
        println!(
            "connected to {} {}",
            info["name"].as_str().unwrap_or("?"),
            info["version"].as_str().unwrap_or("?")
        );
    }
    client
        .send(&json!({ "jsonrpc": "2.0", "method": "notifications/initialized" }))
        .await?;

    print_help();
    let mut input = BufReader::new(tokio::io::stdin()).lines();
    loop {
        print!("mcp> ");
        std::io::stdout().flush()?;

        let Some(line) = input.next_line().await? else {
            break;
        };
        let line = line.trim();
        if line.is_empty() {
            continue;
        }

        let (command, rest) = match line.split_once(char::is_whitespace) {
            Some((c, r)) => (c, r.trim()),
            None => (line, ""),
        };

        let outcome = match command {
            "quit" | "exit" => break,
            "help" => {
                print_help();
                Ok(())
            }
            "list" => list(&mut client).await,
            "call" => call(&mut client, rest).await,
            "raw" => raw(&mut client, rest).await,
            other => {
                println!("unknown command: {other} (try `help`)");
                Ok(())
            }
        };

        if let Err(e) = outcome {
            // A dead server cannot be recovered from; anything else is per-command.
            if e.to_string().contains("server closed") {
                return Err(e);
            }
            println!("error: {e}");
        }
    }

    Ok(())
}

async fn list(client: &mut Client) -> Result<(), BoxError> {
    let resp = client.request("tools/list", json!({})).await?;
    match resp.pointer("/result/tools").and_then(Value::as_array) {
        Some(tools) => {
            for tool in tools {
                println!(
                    "  {:<20} {}",
                    tool["name"].as_str().unwrap_or("?"),
                    tool["description"].as_str().unwrap_or("")
                );
            }
        }
        None => print_json(&resp)?,
    }
    Ok(())
}

async fn call(client: &mut Client, rest: &str) -> Result<(), BoxError> {
    let (name, arguments) = match rest.split_once(char::is_whitespace) {
        Some((name, json_args)) => (name, serde_json::from_str::<Value>(json_args.trim())?),
        None => (rest, json!({})),
    };
    if name.is_empty() {
        return Err("usage: call <tool> [json-arguments]".into());
    }

    let resp = client
        .request("tools/call", json!({ "name": name, "arguments": arguments }))
        .await?;

    if let Some(error) = resp.get("error") {
        println!(
            "error {}: {}",
            error["code"],
            error["message"].as_str().unwrap_or("")
        );
        return Ok(());
    }

    match resp.pointer("/result/content").and_then(Value::as_array) {
        Some(items) => {
            for item in items {
                println!("{}", item["text"].as_str().unwrap_or(""));
            }
        }
        None => print_json(&resp)?,
    }
    Ok(())
}

async fn raw(client: &mut Client, rest: &str) -> Result<(), BoxError> {
    let message: Value = serde_json::from_str(rest)?;
    client.send(&message).await?;

    match message.get("id") {
        Some(id) if !id.is_null() => {
            let resp = client.wait_for(id).await?;
            print_json(&resp)
        }
        _ => {
            println!("(sent; no response expected)");
            Ok(())
        }
    }
}

fn print_json(value: &Value) -> Result<(), BoxError> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

fn print_help() {
    println!("commands:");
    println!("  list                     list available tools");
    println!("  call <tool> [json-args]  call a tool, e.g. call rails_exec {{\"code\":\"User.count\"}}");
    println!("  raw <json>               send a raw JSON-RPC message");
    println!("  help                     show this help");
    println!("  quit                     exit");
}

fn default_server_path() -> Result<PathBuf, BoxError> {
    let exe = std::env::current_exe()?;
    let dir = exe.parent().ok_or("cannot locate executable directory")?;
    Ok(dir.join(format!("rails-mcp-bridge{}", std::env::consts::EXE_SUFFIX)))
}
