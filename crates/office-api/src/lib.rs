//! In-process API facade over the office kernel: command validation, a
//! submission audit, and the HTTP/WebSocket server.

mod server;

use contracts::{
    AgentDetail, Command, CommandPayload, CommandResult, Event, RenderFrame, RunConfig, RunStatus,
};
use office_core::world::{OfficeWorld, WorldInitError};

pub use server::{serve, ServerError};

#[derive(Debug)]
pub struct EngineApi {
    engine: OfficeWorld,
    command_audit: Vec<CommandResult>,
}

impl EngineApi {
    pub fn from_config(config: RunConfig) -> Result<Self, WorldInitError> {
        Ok(Self {
            engine: OfficeWorld::new(config)?,
            command_audit: Vec::new(),
        })
    }

    pub fn run_id(&self) -> &str {
        self.engine.run_id()
    }

    pub fn config(&self) -> &RunConfig {
        self.engine.config()
    }

    pub fn status(&self) -> &RunStatus {
        self.engine.status()
    }

    pub fn events(&self) -> &[Event] {
        self.engine.events()
    }

    pub fn events_after(&self, cursor: usize) -> &[Event] {
        self.engine.events_after(cursor)
    }

    pub fn agent_details(&self) -> Vec<AgentDetail> {
        self.engine.agent_details()
    }

    pub fn agent_detail(&self, agent_id: &str) -> Option<AgentDetail> {
        self.engine.agent_detail(agent_id)
    }

    pub fn render_frame(&self) -> RenderFrame {
        self.engine.render_frame()
    }

    pub fn command_audit(&self) -> &[CommandResult] {
        &self.command_audit
    }

    pub fn start(&mut self) -> RunStatus {
        self.engine.start();
        self.engine.status().clone()
    }

    pub fn pause(&mut self) -> RunStatus {
        self.engine.pause();
        self.engine.status().clone()
    }

    pub fn step(&mut self, steps: u64) -> (RunStatus, u64) {
        let committed = self.engine.step_n(steps);
        (self.engine.status().clone(), committed)
    }

    pub fn run_to_tick(&mut self, tick: u64) -> (RunStatus, u64) {
        let committed = self.engine.run_to_tick(tick);
        (self.engine.status().clone(), committed)
    }

    /// Validate and queue a command for the next tick. Structural problems
    /// (wrong run, unknown agent) are rejected here; in-simulation
    /// constraint conflicts stay silent no-ops per the kernel contract.
    pub fn submit_command(&mut self, command: Command) -> CommandResult {
        let result = match self.validate(&command) {
            Ok(()) => {
                self.engine.inject_command(command.clone());
                CommandResult {
                    command_id: command.command_id.clone(),
                    accepted: true,
                    reason: None,
                }
            }
            Err(reason) => CommandResult {
                command_id: command.command_id.clone(),
                accepted: false,
                reason: Some(reason),
            },
        };
        self.command_audit.push(result.clone());
        result
    }

    fn validate(&self, command: &Command) -> Result<(), String> {
        if command.run_id != self.engine.run_id() {
            return Err(format!(
                "run_id {} does not match active run {}",
                command.run_id,
                self.engine.run_id()
            ));
        }
        let known = |agent_id: &str| self.engine.agent_detail(agent_id).is_some();
        match &command.payload {
            CommandPayload::SimStart | CommandPayload::SimPause | CommandPayload::DeselectAgent => {
                Ok(())
            }
            CommandPayload::SetAgentStatus { agent_id, .. }
            | CommandPayload::SelectAgent { agent_id } => {
                if known(agent_id) {
                    Ok(())
                } else {
                    Err(format!("unknown agent id: {agent_id}"))
                }
            }
            CommandPayload::TriggerConversation {
                asker_id,
                answerer_id,
            } => {
                if !known(asker_id) {
                    return Err(format!("unknown agent id: {asker_id}"));
                }
                if !known(answerer_id) {
                    return Err(format!("unknown agent id: {answerer_id}"));
                }
                if asker_id == answerer_id {
                    return Err("conversation requires two distinct agents".to_string());
                }
                Ok(())
            }
        }
    }
}
