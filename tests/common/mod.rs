//! Shared fixtures: a scripted transport and a config builder.

#![allow(dead_code)]

use std::collections::{HashMap, VecDeque};
use std::sync::{Arc, Mutex};

use rails_mcp_bridge::adapters::Registry;
use rails_mcp_bridge::config::ServerConfig;
use rails_mcp_bridge::error::BridgeError;
use rails_mcp_bridge::transport::{CommandRunner, Executor, RemoteCommandResult};

pub enum Scripted {
    Output(RemoteCommandResult),
    TransportFailure(&'static str),
}

/// Replays scripted results in order and records every command it is given.
/// Once the script runs out, commands succeed with empty output.
#[derive(Default)]
pub struct RecordingRunner {
    script: Mutex<VecDeque<Scripted>>,
    commands: Mutex<Vec<String>>,
}

impl RecordingRunner {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub fn push(&self, step: Scripted) {
        self.script.lock().unwrap().push_back(step);
    }

    pub fn respond(&self, status: i32, stdout: &str, stderr: &str) {
        self.push(Scripted::Output(RemoteCommandResult::exited(status, stdout, stderr)));
    }

    pub fn commands(&self) -> Vec<String> {
        self.commands.lock().unwrap().clone()
    }
}

impl CommandRunner for RecordingRunner {
    fn run(&self, command: &str) -> Result<RemoteCommandResult, BridgeError> {
        self.commands.lock().unwrap().push(command.to_string());
        match self.script.lock().unwrap().pop_front() {
            Some(Scripted::Output(result)) => Ok(result),
            Some(Scripted::TransportFailure(msg)) => Err(BridgeError::transport(msg)),
            None => Ok(RemoteCommandResult::exited(0, "", "")),
        }
    }
}

pub fn config_with(extra: &[(&str, &str)]) -> ServerConfig {
    let mut vars: HashMap<String, String> = HashMap::from([
        ("SSH_HOST".to_string(), "app.example.internal".to_string()),
        ("SSH_USER".to_string(), "deploy".to_string()),
        ("SSH_PASSWORD".to_string(), "secret".to_string()),
    ]);
    for (k, v) in extra {
        vars.insert(k.to_string(), v.to_string());
    }
    ServerConfig::from_lookup(|key| vars.get(key).cloned()).unwrap()
}

pub fn registry(config: &ServerConfig, runner: &Arc<RecordingRunner>) -> Registry {
    let runner: Arc<dyn CommandRunner> = runner.clone();
    Registry::from_config(config, Executor::new(runner))
}
