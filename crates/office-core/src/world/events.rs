use super::*;

impl OfficeWorld {
    /// Append a typed event to the log; returns the event id so follow-up
    /// events can reference it as a cause.
    pub(super) fn push_event(
        &mut self,
        tick: u64,
        sequence_in_tick: &mut u64,
        event_type: EventType,
        actors: Vec<ActorRef>,
        caused_by: Vec<String>,
        details: Option<serde_json::Value>,
    ) -> String {
        let event_id = format!("evt_{tick}_{sequence_in_tick}");
        self.event_log.push(Event {
            schema_version: SCHEMA_VERSION_V1.to_string(),
            run_id: self.config.run_id.clone(),
            tick,
            created_at: synthetic_timestamp(tick, *sequence_in_tick),
            event_id: event_id.clone(),
            event_type,
            sequence_in_tick: *sequence_in_tick,
            location_id: self.room_id.clone(),
            actors,
            caused_by,
            details,
        });
        *sequence_in_tick += 1;
        event_id
    }

    pub(super) fn agent_actor(agent_id: &str, kind: &str) -> ActorRef {
        ActorRef {
            actor_id: agent_id.to_string(),
            actor_kind: kind.to_string(),
        }
    }

    /// Convert scheduler output into log events. A session end also puts the
    /// surviving idle participants back on the wander schedule.
    pub(super) fn commit_social_events(
        &mut self,
        social_events: Vec<SocialEvent>,
        tick: u64,
        sequence_in_tick: &mut u64,
        caused_by: Vec<String>,
    ) {
        let now = self.now();
        for social_event in social_events {
            match social_event {
                SocialEvent::Started {
                    asker_id,
                    answerer_id,
                    exchange_count,
                    triggered,
                } => {
                    self.push_event(
                        tick,
                        sequence_in_tick,
                        EventType::ConversationStarted,
                        vec![
                            Self::agent_actor(&asker_id, "asker"),
                            Self::agent_actor(&answerer_id, "answerer"),
                        ],
                        caused_by.clone(),
                        Some(json!({
                            "exchange_count": exchange_count,
                            "total_turns": exchange_count * 2,
                            "triggered": triggered,
                        })),
                    );
                }
                SocialEvent::BubbleShown {
                    agent_id,
                    asset,
                    turn_index,
                } => {
                    self.push_event(
                        tick,
                        sequence_in_tick,
                        EventType::SpeechBubbleShown,
                        vec![Self::agent_actor(&agent_id, "speaker")],
                        caused_by.clone(),
                        Some(json!({ "asset": asset, "turn_index": turn_index })),
                    );
                }
                SocialEvent::BubbleHidden {
                    agent_id,
                    asset,
                    turn_index,
                } => {
                    self.push_event(
                        tick,
                        sequence_in_tick,
                        EventType::SpeechBubbleHidden,
                        vec![Self::agent_actor(&agent_id, "speaker")],
                        caused_by.clone(),
                        Some(json!({ "asset": asset, "turn_index": turn_index })),
                    );
                }
                SocialEvent::Ended {
                    asker_id,
                    answerer_id,
                    reason,
                    turns_taken,
                } => {
                    self.push_event(
                        tick,
                        sequence_in_tick,
                        EventType::ConversationEnded,
                        vec![
                            Self::agent_actor(&asker_id, "asker"),
                            Self::agent_actor(&answerer_id, "answerer"),
                        ],
                        caused_by.clone(),
                        Some(json!({
                            "reason": reason.as_str(),
                            "turns_taken": turns_taken,
                        })),
                    );
                    for id in [asker_id, answerer_id] {
                        let resumes = self
                            .agents
                            .get(&id)
                            .map(|agent| {
                                agent.status == AgentStatus::Idle
                                    && !agent.is_talking
                                    && !agent.selected
                            })
                            .unwrap_or(false);
                        if resumes {
                            self.wander.schedule_initial(&id, now);
                        }
                    }
                }
            }
        }
    }
}
