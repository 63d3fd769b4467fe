//! The simulation-owned registry and deterministic tick executor.
//!
//! `OfficeWorld` holds the agent registry, the grid and pathfinder, both
//! schedulers, the deterministic command queue, and the append-only event
//! log. All mutation happens inside `step()` on a single thread; commands
//! are the only external input and are queued, never applied mid-tick.

use std::collections::BTreeMap;

use contracts::{
    ActorRef, AgentStatus, Command, CommandPayload, Event, EventType, RunConfig, RunMode,
    RunStatus, SCHEMA_VERSION_V1,
};
use serde_json::json;

use crate::agent::{
    MotionPurpose, MotionStep, OfficeAgent, DESK_SNAP_DISTANCE, DONE_REVERT_DELAY, WORK_SPEED,
};
use crate::path::{Pathfinder, DEFAULT_ADVANCE_BUDGET};
use crate::social::{SocialEvent, SocialScheduler};
use crate::wander::WanderScheduler;

mod commands;
mod events;
mod init;
mod inspect;
mod step;

pub use init::{default_office, WorldInitError};

#[derive(Debug, Clone)]
struct QueuedCommand {
    effective_tick: u64,
    insertion_sequence: u64,
    command: Command,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct StepMetrics {
    pub advanced_ticks: u64,
    pub processed_commands: u64,
    pub moving_agents: u64,
    pub events_emitted: u64,
}

#[derive(Debug)]
pub struct OfficeWorld {
    config: RunConfig,
    status: RunStatus,
    room_id: String,
    queued_commands: Vec<QueuedCommand>,
    next_command_sequence: u64,
    event_log: Vec<Event>,
    agents: BTreeMap<String, OfficeAgent>,
    pathfinder: Pathfinder,
    wander: WanderScheduler,
    social: SocialScheduler,
    selected_agent: Option<String>,
    last_step_metrics: StepMetrics,
}

fn synthetic_timestamp(tick: u64, seq: u64) -> String {
    format!(
        "1970-01-01T{:02}:{:02}:{:02}Z",
        (tick / 3600) % 24,
        (tick / 60) % 60,
        (tick + seq) % 60
    )
}

#[cfg(test)]
mod tests;
