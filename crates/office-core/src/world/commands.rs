use super::*;

impl OfficeWorld {
    pub fn enqueue_command(&mut self, command: Command, effective_tick: u64) {
        self.queued_commands.push(QueuedCommand {
            effective_tick,
            insertion_sequence: self.next_command_sequence,
            command,
        });
        self.next_command_sequence = self.next_command_sequence.saturating_add(1);
        self.sync_queue_depth();
    }

    /// Queue a command for the next tick.
    pub fn inject_command(&mut self, command: Command) {
        let effective_tick = self.status.current_tick + 1;
        self.enqueue_command(command, effective_tick);
    }

    pub(super) fn process_due_commands(&mut self, tick: u64, sequence_in_tick: &mut u64) -> u64 {
        self.queued_commands.sort_by(|a, b| {
            a.effective_tick
                .cmp(&b.effective_tick)
                .then(a.insertion_sequence.cmp(&b.insertion_sequence))
        });

        let mut future = Vec::new();
        let mut due = Vec::new();
        for queued in self.queued_commands.drain(..) {
            if queued.effective_tick <= tick {
                due.push(queued);
            } else {
                future.push(queued);
            }
        }
        self.queued_commands = future;
        self.sync_queue_depth();

        let processed = due.len() as u64;
        for queued in due {
            self.apply_command(queued.command, tick, sequence_in_tick);
        }
        processed
    }

    pub(super) fn apply_command(
        &mut self,
        command: Command,
        tick: u64,
        sequence_in_tick: &mut u64,
    ) {
        let command_ref = format!("cmd:{}", command.command_id);
        match &command.payload {
            CommandPayload::SimStart => {
                self.start();
                self.push_event(
                    tick,
                    sequence_in_tick,
                    EventType::SimStarted,
                    Vec::new(),
                    vec![command_ref],
                    None,
                );
            }
            CommandPayload::SimPause => {
                self.pause();
                self.push_event(
                    tick,
                    sequence_in_tick,
                    EventType::SimPaused,
                    Vec::new(),
                    vec![command_ref],
                    None,
                );
            }
            CommandPayload::SetAgentStatus { agent_id, status } => {
                let agent_id = agent_id.clone();
                let status = *status;
                self.set_agent_status(&agent_id, status, tick, sequence_in_tick, vec![command_ref]);
            }
            CommandPayload::SelectAgent { agent_id } => {
                let agent_id = agent_id.clone();
                self.select_agent(&agent_id, tick, sequence_in_tick, vec![command_ref]);
            }
            CommandPayload::DeselectAgent => {
                self.deselect_agent(tick, sequence_in_tick, vec![command_ref]);
            }
            CommandPayload::TriggerConversation {
                asker_id,
                answerer_id,
            } => {
                let now = self.now();
                let started = self.social.trigger(
                    now,
                    asker_id,
                    answerer_id,
                    &mut self.agents,
                    &mut self.pathfinder,
                );
                // Constraint violations are a silent no-op per contract.
                if let Some(started) = started {
                    self.commit_social_events(
                        vec![started],
                        tick,
                        sequence_in_tick,
                        vec![command_ref],
                    );
                }
            }
        }
    }

    /// Externally driven status transition. Unknown agents are ignored.
    pub(super) fn set_agent_status(
        &mut self,
        agent_id: &str,
        status: AgentStatus,
        tick: u64,
        sequence_in_tick: &mut u64,
        caused_by: Vec<String>,
    ) {
        if !self.agents.contains_key(agent_id) {
            return;
        }
        let now = self.now();

        if let Some(agent) = self.agents.get_mut(agent_id) {
            agent.status = status;
        }

        let event_id = self.push_event(
            tick,
            sequence_in_tick,
            EventType::AgentStatusChanged,
            vec![Self::agent_actor(agent_id, "agent")],
            caused_by,
            Some(json!({ "status": status })),
        );

        match status {
            AgentStatus::Working => {
                // Cancel-then-start: conversation and motion ownership are
                // released before the desk walk is issued.
                let mut teardown = Vec::new();
                self.social
                    .interrupt_participant(agent_id, now, &mut self.agents, &mut teardown);
                self.commit_social_events(
                    teardown,
                    tick,
                    sequence_in_tick,
                    vec![event_id.clone()],
                );

                let agent = self.agents.get_mut(agent_id).expect("agent present");
                agent.is_talking = false;
                agent.interrupt_motion(&mut self.pathfinder);
                if agent.distance_to_desk() < DESK_SNAP_DISTANCE {
                    agent.seat_at_desk();
                    self.push_event(
                        tick,
                        sequence_in_tick,
                        EventType::AgentSeated,
                        vec![Self::agent_actor(agent_id, "agent")],
                        vec![event_id],
                        None,
                    );
                } else {
                    let desk = agent.desk_anchor;
                    agent.start_walk(
                        &mut self.pathfinder,
                        desk,
                        MotionPurpose::ToDesk,
                        WORK_SPEED,
                        true,
                    );
                }
            }
            AgentStatus::Done => {
                let mut teardown = Vec::new();
                self.social
                    .interrupt_participant(agent_id, now, &mut self.agents, &mut teardown);
                self.commit_social_events(
                    teardown,
                    tick,
                    sequence_in_tick,
                    vec![event_id.clone()],
                );

                let agent = self.agents.get_mut(agent_id).expect("agent present");
                agent.is_talking = false;
                agent.interrupt_motion(&mut self.pathfinder);
                agent.seat_at_desk();
                agent.done_revert_at = Some(now + DONE_REVERT_DELAY);
                self.push_event(
                    tick,
                    sequence_in_tick,
                    EventType::AgentSeated,
                    vec![Self::agent_actor(agent_id, "agent")],
                    vec![event_id],
                    None,
                );
            }
            AgentStatus::Idle => {
                let agent = self.agents.get_mut(agent_id).expect("agent present");
                agent.done_revert_at = None;
                let resumes = !agent.is_talking && !agent.selected;
                if resumes && !self.wander.has_pending(agent_id) {
                    self.wander.schedule_initial(agent_id, now);
                }
            }
        }
    }

    /// Selection pauses wandering and raises the two UI intents. Selecting
    /// the already-selected agent is a no-op; selecting another agent
    /// implicitly deselects the first.
    pub(super) fn select_agent(
        &mut self,
        agent_id: &str,
        tick: u64,
        sequence_in_tick: &mut u64,
        caused_by: Vec<String>,
    ) {
        if !self.agents.contains_key(agent_id) {
            return;
        }
        if self.selected_agent.as_deref() == Some(agent_id) {
            return;
        }
        if self.selected_agent.is_some() {
            self.deselect_agent(tick, sequence_in_tick, caused_by.clone());
        }

        self.selected_agent = Some(agent_id.to_string());
        let agent = self.agents.get_mut(agent_id).expect("agent present");
        agent.selected = true;
        agent.interrupt_motion(&mut self.pathfinder);

        let event_id = self.push_event(
            tick,
            sequence_in_tick,
            EventType::AgentSelected,
            vec![Self::agent_actor(agent_id, "agent")],
            caused_by,
            None,
        );
        self.push_event(
            tick,
            sequence_in_tick,
            EventType::BioRequested,
            vec![Self::agent_actor(agent_id, "agent")],
            vec![event_id.clone()],
            None,
        );
        self.push_event(
            tick,
            sequence_in_tick,
            EventType::ChatRequested,
            vec![Self::agent_actor(agent_id, "agent")],
            vec![event_id],
            None,
        );
    }

    /// Deselection resumes wandering if the agent is still idle and silent.
    pub(super) fn deselect_agent(
        &mut self,
        tick: u64,
        sequence_in_tick: &mut u64,
        caused_by: Vec<String>,
    ) {
        let Some(agent_id) = self.selected_agent.take() else {
            return;
        };
        let now = self.now();
        if let Some(agent) = self.agents.get_mut(&agent_id) {
            agent.selected = false;
            if agent.status == AgentStatus::Idle
                && !agent.is_talking
                && !self.wander.has_pending(&agent_id)
            {
                self.wander.schedule_initial(&agent_id, now);
            }
        }
        self.push_event(
            tick,
            sequence_in_tick,
            EventType::AgentDeselected,
            vec![Self::agent_actor(&agent_id, "agent")],
            caused_by,
            None,
        );
    }
}
