//! Per-character state machine: continuous position, desk anchor, walking,
//! and interruption handling.
//!
//! An agent owns at most one `Motion` at a time. Motions are cancelled
//! cooperatively: `interrupt` raises a flag that the per-tick advance
//! observes at the next waypoint boundary, never mid-segment. A forced
//! transition (external work, selection) interrupts first and only then
//! starts the replacement motion.

use contracts::{AgentSeed, AgentStatus, Facing, MotionKind, WorldPoint};

use crate::path::{PathPoll, Pathfinder, PathRequestId};

/// Forced run-to-desk speed, world units per 1000 time-units.
pub const WORK_SPEED: f64 = 180.0;
/// Within this range of the desk the agent seats directly instead of walking.
pub const DESK_SNAP_DISTANCE: f64 = 16.0;
/// Waypoints closer than this are skipped outright.
const SEGMENT_SKIP_DISTANCE: f64 = 2.0;
/// `done` auto-reverts to `idle` after this many time-units.
pub const DONE_REVERT_DELAY: u64 = 3000;
/// Ambient wander speed band; each agent draws one value at construction.
pub const WANDER_SPEED_MIN: f64 = 40.0;
pub const WANDER_SPEED_MAX: f64 = 70.0;

/// What a motion is for; schedulers use this to tell their walks apart.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MotionPurpose {
    Wander,
    Approach,
    ToDesk,
}

impl MotionPurpose {
    pub fn as_str(&self) -> &'static str {
        match self {
            MotionPurpose::Wander => "wander",
            MotionPurpose::Approach => "approach",
            MotionPurpose::ToDesk => "to_desk",
        }
    }
}

/// Ownership token for one in-flight walk.
#[derive(Debug)]
pub struct Motion {
    pub purpose: MotionPurpose,
    pub speed: f64,
    pub run: bool,
    interrupted: bool,
    pending_path: Option<PathRequestId>,
    waypoints: Vec<WorldPoint>,
    next_waypoint: usize,
}

impl Motion {
    fn awaiting(purpose: MotionPurpose, request: PathRequestId, speed: f64, run: bool) -> Self {
        Self {
            purpose,
            speed,
            run,
            interrupted: false,
            pending_path: Some(request),
            waypoints: Vec::new(),
            next_waypoint: 0,
        }
    }

    pub fn waypoints_remaining(&self) -> usize {
        self.waypoints.len().saturating_sub(self.next_waypoint)
    }

    fn traversing(&self) -> bool {
        self.pending_path.is_none() && self.next_waypoint < self.waypoints.len()
    }
}

/// Outcome of advancing an agent's motion by one tick.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MotionStep {
    /// Still waiting on the pathfinder.
    AwaitingPath,
    Moving,
    /// Walk finished naturally (including a no-op walk with no route).
    Finished,
    /// Cooperative cancellation observed at a waypoint boundary.
    Interrupted,
}

#[derive(Debug)]
pub struct OfficeAgent {
    pub id: String,
    pub name: String,
    pub role: String,
    pub sprite_id: String,
    pub position: WorldPoint,
    /// Fixed home point; supplied at construction, never mutated.
    pub desk_anchor: WorldPoint,
    pub status: AgentStatus,
    /// Set by the social scheduler only; suppresses wandering.
    pub is_talking: bool,
    pub selected: bool,
    pub facing: Facing,
    /// This agent's ambient walking speed, drawn once at construction.
    pub walk_speed: f64,
    pub motion: Option<Motion>,
    /// Absolute time at which a transient `done` reverts to `idle`.
    pub done_revert_at: Option<u64>,
}

impl OfficeAgent {
    /// Agents spawn seated at their desk, facing the monitor.
    pub fn new(seed: &AgentSeed, desk_anchor: WorldPoint, walk_speed: f64) -> Self {
        Self {
            id: seed.agent_id.clone(),
            name: seed.name.clone(),
            role: seed.role.clone(),
            sprite_id: seed.sprite_id.clone(),
            position: desk_anchor,
            desk_anchor,
            status: AgentStatus::Idle,
            is_talking: false,
            selected: false,
            facing: Facing::Up,
            walk_speed,
            motion: None,
            done_revert_at: None,
        }
    }

    /// Raise the cooperative interruption flag on the active motion and drop
    /// its outstanding path request. The motion slot itself is released at
    /// the next advance (or immediately replaced by `start_walk`).
    pub fn interrupt_motion(&mut self, pathfinder: &mut Pathfinder) {
        if let Some(motion) = self.motion.as_mut() {
            motion.interrupted = true;
            if let Some(request) = motion.pending_path.take() {
                pathfinder.cancel(request);
            }
        }
    }

    /// Cancel-then-start: any prior walk is interrupted before the new path
    /// request is registered, so a stale completion can never clobber the
    /// replacement.
    pub fn start_walk(
        &mut self,
        pathfinder: &mut Pathfinder,
        target: WorldPoint,
        purpose: MotionPurpose,
        speed: f64,
        run: bool,
    ) {
        self.interrupt_motion(pathfinder);
        let request = pathfinder.request(self.position, target);
        self.motion = Some(Motion::awaiting(purpose, request, speed, run));
    }

    /// Advance the active motion by `dt` time-units. Returns `None` when the
    /// agent has no motion. The motion is taken out of its slot and only put
    /// back while it is still running, so a finished or interrupted walk
    /// releases ownership in the same call.
    pub fn advance_motion(&mut self, pathfinder: &mut Pathfinder, dt: u64) -> Option<MotionStep> {
        let mut motion = self.motion.take()?;

        if motion.interrupted {
            return Some(MotionStep::Interrupted);
        }

        if let Some(request) = motion.pending_path {
            match pathfinder.poll(request) {
                PathPoll::Pending => {
                    self.motion = Some(motion);
                    return Some(MotionStep::AwaitingPath);
                }
                // No route: the whole walk is a silent no-op.
                PathPoll::Unreachable => return Some(MotionStep::Finished),
                PathPoll::Ready(waypoints) => {
                    motion.pending_path = None;
                    motion.waypoints = waypoints;
                    motion.next_waypoint = 0;
                }
            }
        }

        let mut travel = motion.speed * dt as f64 / 1000.0;
        loop {
            if motion.interrupted {
                return Some(MotionStep::Interrupted);
            }
            let Some(waypoint) = motion.waypoints.get(motion.next_waypoint).copied() else {
                return Some(MotionStep::Finished);
            };

            let dx = waypoint.x - self.position.x;
            let dy = waypoint.y - self.position.y;
            let distance = (dx * dx + dy * dy).sqrt();

            if distance < SEGMENT_SKIP_DISTANCE {
                self.position = waypoint;
                motion.next_waypoint += 1;
                continue;
            }

            self.facing = Facing::from_delta(dx, dy);

            if travel >= distance {
                travel -= distance;
                self.position = waypoint;
                motion.next_waypoint += 1;
                continue;
            }

            if travel > 0.0 {
                self.position.x += dx / distance * travel;
                self.position.y += dy / distance * travel;
            }
            self.motion = Some(motion);
            return Some(MotionStep::Moving);
        }
    }

    /// Snap to the desk in the seated pose.
    pub fn seat_at_desk(&mut self) {
        self.position = self.desk_anchor;
        self.facing = Facing::Up;
    }

    pub fn distance_to_desk(&self) -> f64 {
        self.position.distance_to(self.desk_anchor)
    }

    /// Animation intent for the render adapter.
    pub fn motion_kind(&self) -> MotionKind {
        match &self.motion {
            Some(motion) if motion.traversing() => {
                if motion.run {
                    MotionKind::Run
                } else {
                    MotionKind::Walk
                }
            }
            _ => MotionKind::Idle,
        }
    }

    /// Whether the wander scheduler may act on this agent right now.
    pub fn wander_gate_open(&self) -> bool {
        self.status == AgentStatus::Idle
            && !self.is_talking
            && !self.selected
            && self.motion.is_none()
    }
}
