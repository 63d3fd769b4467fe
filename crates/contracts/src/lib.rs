//! v1 cross-boundary contracts for the office simulation kernel, API, and viewers.

use std::fmt;

use serde::{Deserialize, Serialize};
use serde_json::Value;

pub mod serde_u64_string;

pub const SCHEMA_VERSION_V1: &str = "1.0";

/// Side length of one grid tile in world units.
pub const TILE_SIZE: f64 = 32.0;

// ---------------------------------------------------------------------------
// Geometry
// ---------------------------------------------------------------------------

/// Continuous render-space coordinate, in world units.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
pub struct WorldPoint {
    pub x: f64,
    pub y: f64,
}

impl WorldPoint {
    pub fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }

    pub fn distance_to(&self, other: WorldPoint) -> f64 {
        let dx = other.x - self.x;
        let dy = other.y - self.y;
        (dx * dx + dy * dy).sqrt()
    }
}

/// Integer grid cell of the walkability grid.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct TilePoint {
    pub x: i32,
    pub y: i32,
}

impl TilePoint {
    pub fn new(x: i32, y: i32) -> Self {
        Self { x, y }
    }

    pub fn manhattan_distance(&self, other: TilePoint) -> i32 {
        (self.x - other.x).abs() + (self.y - other.y).abs()
    }

    /// World point at the centre of this tile.
    pub fn center(&self) -> WorldPoint {
        WorldPoint {
            x: f64::from(self.x) * TILE_SIZE + TILE_SIZE / 2.0,
            y: f64::from(self.y) * TILE_SIZE + TILE_SIZE / 2.0,
        }
    }
}

// ---------------------------------------------------------------------------
// Agent enums and animation handles
// ---------------------------------------------------------------------------

/// Externally driven per-agent status. `Done` is transient and auto-reverts
/// to `Idle` after a fixed delay.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum AgentStatus {
    Idle,
    Working,
    Done,
}

/// Last movement direction; drives the idle pose and conversation facing.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum Facing {
    Up,
    Down,
    Left,
    Right,
}

impl Facing {
    /// Dominant-axis direction of a movement delta.
    pub fn from_delta(dx: f64, dy: f64) -> Self {
        if dx.abs() > dy.abs() {
            if dx > 0.0 {
                Facing::Right
            } else {
                Facing::Left
            }
        } else if dy > 0.0 {
            Facing::Down
        } else {
            Facing::Up
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Facing::Up => "up",
            Facing::Down => "down",
            Facing::Left => "left",
            Facing::Right => "right",
        }
    }
}

impl fmt::Display for Facing {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Animation intent for the render adapter.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum MotionKind {
    Idle,
    Walk,
    Run,
}

impl MotionKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            MotionKind::Idle => "idle",
            MotionKind::Walk => "walk",
            MotionKind::Run => "run",
        }
    }
}

/// Map (sprite, facing, motion) to a render-side animation handle, e.g.
/// `Adam-walk-left`. The render adapter owns what the handle plays.
pub fn animation_handle(sprite_id: &str, facing: Facing, motion: MotionKind) -> String {
    format!("{sprite_id}-{}-{}", motion.as_str(), facing.as_str())
}

// ---------------------------------------------------------------------------
// Map/grid provider contract
// ---------------------------------------------------------------------------

/// One named boolean occupancy layer, row-major (`y * width + x`).
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct MapLayer {
    pub name: String,
    /// Whether occupied cells of this layer block movement.
    pub blocking: bool,
    pub cells: Vec<bool>,
}

impl MapLayer {
    pub fn occupied(&self, width: u32, x: i32, y: i32) -> bool {
        if x < 0 || y < 0 {
            return false;
        }
        let index = y as usize * width as usize + x as usize;
        self.cells.get(index).copied().unwrap_or(false)
    }
}

/// Seed data for one character: identity plus the desk layer that anchors it.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct AgentSeed {
    pub agent_id: String,
    pub name: String,
    pub role: String,
    pub sprite_id: String,
    /// Name of the map layer whose occupied cells mark this agent's desk.
    pub desk_layer: String,
}

/// Everything the map provider yields at initialization; consumed once.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct MapBundle {
    pub room_id: String,
    pub width: u32,
    pub height: u32,
    pub layers: Vec<MapLayer>,
    pub agents: Vec<AgentSeed>,
}

// ---------------------------------------------------------------------------
// Run configuration and status
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct RunConfig {
    pub schema_version: String,
    pub run_id: String,
    #[serde(with = "serde_u64_string")]
    pub seed: u64,
    /// Time-units advanced per `step()`.
    pub tick_interval: u64,
    pub max_ticks: u64,
    /// Conversation cap per rolling 60 000 time-unit window.
    pub max_sessions_per_window: u16,
    /// Flat cooldown after a session ends, in time-units.
    pub session_cooldown: u64,
    pub notes: Option<String>,
}

impl RunConfig {
    pub fn max_time(&self) -> u64 {
        self.max_ticks * self.tick_interval
    }
}

impl Default for RunConfig {
    fn default() -> Self {
        Self {
            schema_version: SCHEMA_VERSION_V1.to_string(),
            run_id: "office_local_001".to_string(),
            seed: 1337,
            tick_interval: 100,
            max_ticks: 36_000,
            max_sessions_per_window: 5,
            session_cooldown: 10_000,
            notes: None,
        }
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum RunMode {
    Running,
    Paused,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct RunStatus {
    pub schema_version: String,
    pub run_id: String,
    pub current_tick: u64,
    pub max_ticks: u64,
    pub mode: RunMode,
    pub queue_depth: usize,
}

impl RunStatus {
    pub fn is_complete(&self) -> bool {
        self.current_tick >= self.max_ticks
    }
}

impl fmt::Display for RunStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "run_id={} tick={}/{} mode={:?} queue_depth={}",
            self.run_id, self.current_tick, self.max_ticks, self.mode, self.queue_depth
        )
    }
}

// ---------------------------------------------------------------------------
// Commands (external → core)
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum CommandType {
    SimStart,
    SimPause,
    SetAgentStatus,
    SelectAgent,
    DeselectAgent,
    TriggerConversation,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum CommandPayload {
    SimStart,
    SimPause,
    /// "start work" / "work finished" signals from the status event channel.
    SetAgentStatus {
        agent_id: String,
        status: AgentStatus,
    },
    SelectAgent {
        agent_id: String,
    },
    DeselectAgent,
    TriggerConversation {
        asker_id: String,
        answerer_id: String,
    },
}

impl CommandPayload {
    pub fn command_type(&self) -> CommandType {
        match self {
            CommandPayload::SimStart => CommandType::SimStart,
            CommandPayload::SimPause => CommandType::SimPause,
            CommandPayload::SetAgentStatus { .. } => CommandType::SetAgentStatus,
            CommandPayload::SelectAgent { .. } => CommandType::SelectAgent,
            CommandPayload::DeselectAgent => CommandType::DeselectAgent,
            CommandPayload::TriggerConversation { .. } => CommandType::TriggerConversation,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Command {
    pub schema_version: String,
    pub command_id: String,
    pub run_id: String,
    pub issued_at_tick: u64,
    pub command_type: CommandType,
    pub payload: CommandPayload,
}

impl Command {
    pub fn new(
        command_id: String,
        run_id: String,
        issued_at_tick: u64,
        payload: CommandPayload,
    ) -> Self {
        Self {
            schema_version: SCHEMA_VERSION_V1.to_string(),
            command_id,
            run_id,
            issued_at_tick,
            command_type: payload.command_type(),
            payload,
        }
    }
}

/// Outcome of submitting a command through the API facade.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct CommandResult {
    pub command_id: String,
    pub accepted: bool,
    pub reason: Option<String>,
}

// ---------------------------------------------------------------------------
// Events (core → external)
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum EventType {
    SimStarted,
    SimPaused,
    AgentStatusChanged,
    AgentSeated,
    AgentSelected,
    AgentDeselected,
    BioRequested,
    ChatRequested,
    WanderStarted,
    ConversationStarted,
    SpeechBubbleShown,
    SpeechBubbleHidden,
    ConversationEnded,
}

/// Why a conversation session terminated.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum ConversationEndReason {
    Completed,
    SpeakerReassigned,
    ApproachFailed,
    SafetyTimeout,
}

impl ConversationEndReason {
    pub fn as_str(&self) -> &'static str {
        match self {
            ConversationEndReason::Completed => "completed",
            ConversationEndReason::SpeakerReassigned => "speaker_reassigned",
            ConversationEndReason::ApproachFailed => "approach_failed",
            ConversationEndReason::SafetyTimeout => "safety_timeout",
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ActorRef {
    pub actor_id: String,
    pub actor_kind: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Event {
    pub schema_version: String,
    pub run_id: String,
    pub tick: u64,
    pub created_at: String,
    pub event_id: String,
    pub sequence_in_tick: u64,
    pub event_type: EventType,
    pub location_id: String,
    pub actors: Vec<ActorRef>,
    pub caused_by: Vec<String>,
    pub details: Option<Value>,
}

// ---------------------------------------------------------------------------
// Render adapter contract
// ---------------------------------------------------------------------------

/// Per-agent presentation state for one tick.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct AgentPose {
    pub agent_id: String,
    pub name: String,
    pub role: String,
    pub x: f64,
    pub y: f64,
    pub facing: Facing,
    pub motion: MotionKind,
    /// Resolved animation handle for (sprite, facing, motion).
    pub animation: String,
    pub status: AgentStatus,
    pub is_talking: bool,
    /// Speech-bubble asset currently shown above this agent, if any.
    pub bubble: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct RenderFrame {
    pub schema_version: String,
    pub run_id: String,
    pub tick: u64,
    /// Simulation time in time-units (`tick * tick_interval`).
    pub now: u64,
    pub agents: Vec<AgentPose>,
}

// ---------------------------------------------------------------------------
// Inspection views
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct MotionSummary {
    pub purpose: String,
    pub run: bool,
    pub waypoints_remaining: usize,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct AgentDetail {
    pub agent_id: String,
    pub name: String,
    pub role: String,
    pub sprite_id: String,
    pub status: AgentStatus,
    pub is_talking: bool,
    pub selected: bool,
    pub facing: Facing,
    pub x: f64,
    pub y: f64,
    pub desk_x: f64,
    pub desk_y: f64,
    pub walk_speed: f64,
    pub active_motion: Option<MotionSummary>,
}

// ---------------------------------------------------------------------------
// API error envelope and stream messages
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum ErrorCode {
    SimNotFound,
    AgentNotFound,
    InvalidCommand,
    InvalidQuery,
    SimStateConflict,
    InternalError,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ApiError {
    pub schema_version: String,
    pub code: ErrorCode,
    pub message: String,
    pub details: Option<String>,
}

impl ApiError {
    pub fn new(code: ErrorCode, message: impl Into<String>, details: Option<String>) -> Self {
        Self {
            schema_version: SCHEMA_VERSION_V1.to_string(),
            code,
            message: message.into(),
            details,
        }
    }
}

/// One message on the WebSocket stream.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct StreamMessage {
    pub schema_version: String,
    pub run_id: String,
    pub tick: u64,
    pub payload: StreamPayload,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum StreamPayload {
    Status { status: RunStatus },
    Frame { frame: RenderFrame },
    Event { event: Event },
    Warning { message: String },
}

impl StreamMessage {
    pub fn status(status: &RunStatus) -> Self {
        Self {
            schema_version: SCHEMA_VERSION_V1.to_string(),
            run_id: status.run_id.clone(),
            tick: status.current_tick,
            payload: StreamPayload::Status {
                status: status.clone(),
            },
        }
    }

    pub fn frame(frame: RenderFrame) -> Self {
        Self {
            schema_version: SCHEMA_VERSION_V1.to_string(),
            run_id: frame.run_id.clone(),
            tick: frame.tick,
            payload: StreamPayload::Frame { frame },
        }
    }

    pub fn event(event: Event) -> Self {
        Self {
            schema_version: SCHEMA_VERSION_V1.to_string(),
            run_id: event.run_id.clone(),
            tick: event.tick,
            payload: StreamPayload::Event { event },
        }
    }

    pub fn warning(run_id: &str, tick: u64, message: String) -> Self {
        Self {
            schema_version: SCHEMA_VERSION_V1.to_string(),
            run_id: run_id.to_string(),
            tick,
            payload: StreamPayload::Warning { message },
        }
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
