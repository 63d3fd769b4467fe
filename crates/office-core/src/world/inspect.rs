use contracts::{AgentDetail, MotionSummary};

use super::*;

impl OfficeWorld {
    pub fn agent_ids(&self) -> Vec<String> {
        self.agents.keys().cloned().collect()
    }

    pub fn selected_agent(&self) -> Option<&str> {
        self.selected_agent.as_deref()
    }

    pub fn agent_detail(&self, agent_id: &str) -> Option<AgentDetail> {
        self.agents.get(agent_id).map(|agent| AgentDetail {
            agent_id: agent.id.clone(),
            name: agent.name.clone(),
            role: agent.role.clone(),
            sprite_id: agent.sprite_id.clone(),
            status: agent.status,
            is_talking: agent.is_talking,
            selected: agent.selected,
            facing: agent.facing,
            x: agent.position.x,
            y: agent.position.y,
            desk_x: agent.desk_anchor.x,
            desk_y: agent.desk_anchor.y,
            walk_speed: agent.walk_speed,
            active_motion: agent.motion.as_ref().map(|motion| MotionSummary {
                purpose: motion.purpose.as_str().to_string(),
                run: motion.run,
                waypoints_remaining: motion.waypoints_remaining(),
            }),
        })
    }

    pub fn agent_details(&self) -> Vec<AgentDetail> {
        self.agents
            .keys()
            .filter_map(|agent_id| self.agent_detail(agent_id))
            .collect()
    }

    /// Events with `sequence` at or beyond the cursor, for paged reads.
    pub fn events_after(&self, cursor: usize) -> &[Event] {
        if cursor >= self.event_log.len() {
            &[]
        } else {
            &self.event_log[cursor..]
        }
    }
}
