//! Idle-time behavior: periodically pick a target and walk there.
//!
//! The scheduler keeps one pending deadline per agent and re-checks the
//! eligibility gate at fire time, because status writes and selection arrive
//! asynchronously between scheduling and firing. Targets are biased toward
//! the agent's own desk neighborhood.

use std::collections::BTreeMap;

use crate::agent::{MotionPurpose, OfficeAgent};
use crate::path::Pathfinder;
use crate::rng::SimRng;

/// Delay before an agent's first wander after becoming eligible.
const INITIAL_DELAY: (u64, u64) = (1000, 4000);
/// Delay between one wander cycle and the next.
const NEXT_DELAY: (u64, u64) = (2000, 7000);

/// Per-agent wander deadlines; owned by the simulation, no hidden globals.
#[derive(Debug)]
pub struct WanderScheduler {
    next_wander_at: BTreeMap<String, u64>,
    rng: SimRng,
}

impl WanderScheduler {
    pub fn new(rng: SimRng) -> Self {
        Self {
            next_wander_at: BTreeMap::new(),
            rng,
        }
    }

    /// Schedule the first wander after the agent becomes eligible (spawn,
    /// done→idle revert, deselection, conversation end).
    pub fn schedule_initial(&mut self, agent_id: &str, now: u64) {
        let delay = self.rng.range_u64(INITIAL_DELAY.0, INITIAL_DELAY.1);
        self.next_wander_at.insert(agent_id.to_string(), now + delay);
    }

    /// Schedule the next cycle after a completed or skipped wander.
    pub fn schedule_next(&mut self, agent_id: &str, now: u64) {
        let delay = self.rng.range_u64(NEXT_DELAY.0, NEXT_DELAY.1);
        self.next_wander_at.insert(agent_id.to_string(), now + delay);
    }

    pub fn has_pending(&self, agent_id: &str) -> bool {
        self.next_wander_at.contains_key(agent_id)
    }

    pub fn pending_count(&self) -> usize {
        self.next_wander_at.len()
    }

    /// Called by the world when an agent's wander motion has finished.
    pub fn note_walk_finished(&mut self, agent_id: &str, now: u64) {
        self.schedule_next(agent_id, now);
    }

    /// Fire all due deadlines. Eligible agents start a wander walk; agents
    /// whose gate closed in the meantime fast-exit and are rescheduled.
    /// Returns the ids that started walking, in deterministic order.
    pub fn tick(
        &mut self,
        now: u64,
        agents: &mut BTreeMap<String, OfficeAgent>,
        pathfinder: &mut Pathfinder,
    ) -> Vec<String> {
        let due = self
            .next_wander_at
            .iter()
            .filter(|(_, deadline)| **deadline <= now)
            .map(|(agent_id, _)| agent_id.clone())
            .collect::<Vec<_>>();

        let mut started = Vec::new();
        for agent_id in due {
            self.next_wander_at.remove(&agent_id);
            let Some(agent) = agents.get_mut(&agent_id) else {
                continue;
            };
            if !agent.wander_gate_open() {
                self.schedule_next(&agent_id, now);
                continue;
            }

            let desk_tile = pathfinder.grid().world_to_tile(agent.desk_anchor);
            let Some(target) = pathfinder.grid().random_walkable(&mut self.rng, Some(desk_tile))
            else {
                // Dead grid: nothing to walk to, try again later.
                self.schedule_next(&agent_id, now);
                continue;
            };

            let speed = agent.walk_speed;
            agent.start_walk(pathfinder, target, MotionPurpose::Wander, speed, false);
            started.push(agent_id);
        }
        started
    }
}
