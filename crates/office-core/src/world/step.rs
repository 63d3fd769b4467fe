use contracts::{animation_handle, AgentPose, RenderFrame};

use super::*;

impl OfficeWorld {
    pub fn start(&mut self) {
        if !self.status.is_complete() {
            self.status.mode = RunMode::Running;
        }
    }

    pub fn pause(&mut self) {
        self.status.mode = RunMode::Paused;
    }

    pub fn run_id(&self) -> &str {
        &self.status.run_id
    }

    pub fn config(&self) -> &RunConfig {
        &self.config
    }

    pub fn status(&self) -> &RunStatus {
        &self.status
    }

    pub fn events(&self) -> &[Event] {
        &self.event_log
    }

    pub fn last_step_metrics(&self) -> StepMetrics {
        self.last_step_metrics
    }

    /// Simulation time in time-units.
    pub fn now(&self) -> u64 {
        self.status.current_tick * self.config.tick_interval
    }

    pub(super) fn sync_queue_depth(&mut self) {
        self.status.queue_depth = self.queued_commands.len();
    }

    /// Advance one tick: drain due commands, advance the pathfinder, move
    /// agents, run the done-revert timer, then both schedulers.
    pub fn step(&mut self) -> bool {
        let previous_tick = self.status.current_tick;
        let events_before = self.event_log.len();
        self.last_step_metrics = StepMetrics::default();
        if self.status.is_complete() {
            self.status.mode = RunMode::Paused;
            return false;
        }
        self.status.mode = RunMode::Running;
        let tick = self.status.current_tick.saturating_add(1);
        if tick > self.status.max_ticks {
            self.status.mode = RunMode::Paused;
            return false;
        }
        self.status.current_tick = tick;
        let now = self.now();
        let dt = self.config.tick_interval;
        let mut sequence_in_tick = 0_u64;

        let processed_commands = self.process_due_commands(tick, &mut sequence_in_tick);

        self.pathfinder.advance(DEFAULT_ADVANCE_BUDGET);

        let moving_agents = self.advance_agent_motions(tick, now, dt, &mut sequence_in_tick);
        self.process_done_reverts(tick, now, &mut sequence_in_tick);

        let wander_started =
            self.wander
                .tick(now, &mut self.agents, &mut self.pathfinder);
        for agent_id in wander_started {
            self.push_event(
                tick,
                &mut sequence_in_tick,
                EventType::WanderStarted,
                vec![Self::agent_actor(&agent_id, "agent")],
                Vec::new(),
                None,
            );
        }

        let social_events = self
            .social
            .tick(now, &mut self.agents, &mut self.pathfinder);
        self.commit_social_events(social_events, tick, &mut sequence_in_tick, Vec::new());

        self.last_step_metrics = StepMetrics {
            advanced_ticks: self.status.current_tick.saturating_sub(previous_tick),
            processed_commands,
            moving_agents,
            events_emitted: (self.event_log.len() - events_before) as u64,
        };

        if self.status.current_tick >= self.status.max_ticks {
            self.status.mode = RunMode::Paused;
        }
        self.sync_queue_depth();

        true
    }

    pub fn step_n(&mut self, n: u64) -> u64 {
        let mut committed = 0_u64;
        for _ in 0..n {
            if !self.step() {
                break;
            }
            committed += 1;
        }
        committed
    }

    pub fn run_to_tick(&mut self, tick: u64) -> u64 {
        let mut committed = 0_u64;
        while self.status.current_tick < tick {
            if !self.step() {
                break;
            }
            committed += 1;
        }
        committed
    }

    fn advance_agent_motions(
        &mut self,
        tick: u64,
        now: u64,
        dt: u64,
        sequence_in_tick: &mut u64,
    ) -> u64 {
        let agent_ids = self.agents.keys().cloned().collect::<Vec<_>>();
        let mut moving = 0_u64;
        for agent_id in agent_ids {
            let Some(agent) = self.agents.get_mut(&agent_id) else {
                continue;
            };
            let purpose = agent.motion.as_ref().map(|motion| motion.purpose);
            let Some(outcome) = agent.advance_motion(&mut self.pathfinder, dt) else {
                continue;
            };
            match outcome {
                MotionStep::Moving => moving += 1,
                MotionStep::AwaitingPath | MotionStep::Interrupted => {}
                MotionStep::Finished => match purpose {
                    Some(MotionPurpose::Wander) => {
                        self.wander.note_walk_finished(&agent_id, now);
                    }
                    Some(MotionPurpose::ToDesk) => {
                        let agent = self.agents.get_mut(&agent_id).expect("agent present");
                        if agent.status == AgentStatus::Working {
                            agent.seat_at_desk();
                            self.push_event(
                                tick,
                                sequence_in_tick,
                                EventType::AgentSeated,
                                vec![Self::agent_actor(&agent_id, "agent")],
                                Vec::new(),
                                None,
                            );
                        }
                    }
                    // The social scheduler notices arrival on its own tick.
                    Some(MotionPurpose::Approach) | None => {}
                },
            }
        }
        moving
    }

    /// `done` is transient: it reverts to `idle` after the fixed delay
    /// unless the status changed again in the meantime.
    fn process_done_reverts(&mut self, tick: u64, now: u64, sequence_in_tick: &mut u64) {
        let due = self
            .agents
            .values()
            .filter(|agent| {
                agent.status == AgentStatus::Done
                    && agent.done_revert_at.map(|at| at <= now).unwrap_or(false)
            })
            .map(|agent| agent.id.clone())
            .collect::<Vec<_>>();
        for agent_id in due {
            self.set_agent_status(
                &agent_id,
                AgentStatus::Idle,
                tick,
                sequence_in_tick,
                vec!["auto:done_revert".to_string()],
            );
        }
    }

    /// Per-tick presentation state for the render adapter.
    pub fn render_frame(&self) -> RenderFrame {
        let agents = self
            .agents
            .values()
            .map(|agent| {
                let motion = agent.motion_kind();
                AgentPose {
                    agent_id: agent.id.clone(),
                    name: agent.name.clone(),
                    role: agent.role.clone(),
                    x: agent.position.x,
                    y: agent.position.y,
                    facing: agent.facing,
                    motion,
                    animation: animation_handle(&agent.sprite_id, agent.facing, motion),
                    status: agent.status,
                    is_talking: agent.is_talking,
                    bubble: self
                        .social
                        .active_bubble_for(&agent.id)
                        .map(str::to_string),
                }
            })
            .collect();
        RenderFrame {
            schema_version: SCHEMA_VERSION_V1.to_string(),
            run_id: self.config.run_id.clone(),
            tick: self.status.current_tick,
            now: self.now(),
            agents,
        }
    }
}
