//! Opportunistic pairing of idle agents into rate-limited, turn-taking
//! dialogue sessions.
//!
//! Sessions are strictly 1-on-1. The asker stays put; the answerer walks
//! over and stops at a standoff distance. Turns alternate question/answer
//! starting with the asker and always closing on an answer. A session
//! terminates exactly once, whether it completes, a participant is
//! reassigned, the approach fails, or the safety timeout fires.

use std::collections::BTreeMap;

use contracts::{AgentStatus, ConversationEndReason, Facing, WorldPoint};

use crate::agent::{MotionPurpose, OfficeAgent};
use crate::path::Pathfinder;
use crate::rng::SimRng;

/// Rolling rate-limit window, in time-units.
pub const WINDOW_LENGTH: u64 = 60_000;
/// First ambient pairing attempt after simulation start.
const FIRST_ATTEMPT_AT: u64 = 6_000;
/// Delay band between ambient pairing attempts.
const ATTEMPT_DELAY: (u64, u64) = (10_000, 18_000);
/// Hard time budget for the answerer's approach.
const APPROACH_BUDGET: u64 = 2_500;
/// Answerer walking speed during the approach.
const APPROACH_SPEED: f64 = 55.0;
/// Conversing agents keep this separation; not touching.
const STANDOFF_DISTANCE: f64 = 35.0;
/// Below this separation no approach walk is needed at all.
const APPROACH_MIN_DISTANCE: f64 = 40.0;
/// Separation above this after the approach aborts the session.
const MAX_SEPARATION: f64 = 96.0;
/// Speech bubble display band per turn.
const DISPLAY_RANGE: (u64, u64) = (1200, 2000);
/// Pause band between turns.
const PAUSE_RANGE: (u64, u64) = (400, 1000);
/// Lead-in after facing before the first bubble.
const FIRST_TURN_LEAD_IN: u64 = 200;
/// Hard stop measured from pairing.
const SAFETY_TIMEOUT: u64 = 12_000;
/// Exchanges (question+answer pairs) per session.
const EXCHANGES: (u64, u64) = (1, 4);

/// Question-turn utterance assets (even turn indices).
const QUESTION_POOL: [&str; 14] = [
    "pixel-speech-bubble",
    "pixel-speech-bubble-2",
    "pixel-speech-bubble-3",
    "pixel-speech-bubble-4",
    "pixel-speech-bubble-5",
    "pixel-speech-bubble-6",
    "pixel-speech-bubble-7",
    "pixel-speech-bubble-8",
    "pixel-speech-bubble-9",
    "pixel-speech-bubble-10",
    "pixel-speech-bubble-11",
    "pixel-speech-bubble-12",
    "pixel-speech-bubble-13",
    "pixel-speech-bubble-14",
];

/// Answer-turn utterance assets (odd turn indices).
const ANSWER_POOL: [&str; 14] = [
    "pixel-speech-bubble-15",
    "pixel-speech-bubble-16",
    "pixel-speech-bubble-17",
    "pixel-speech-bubble-18",
    "pixel-speech-bubble-19",
    "pixel-speech-bubble-20",
    "pixel-speech-bubble-21",
    "pixel-speech-bubble-22",
    "pixel-speech-bubble-23",
    "pixel-speech-bubble-24",
    "pixel-speech-bubble-25",
    "pixel-speech-bubble-26",
    "pixel-speech-bubble-27",
    "pixel-speech-bubble-28",
];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum SessionPhase {
    /// Answerer walking over; ends at the deadline or on arrival.
    Approaching { deadline: u64 },
    /// Waiting to open the next turn's bubble.
    AwaitingTurn { next_turn_at: u64 },
    /// A bubble is on screen until the given time.
    Displaying { until: u64 },
}

/// One paired, turn-taking dialogue interaction. Ephemeral; never reused.
#[derive(Debug)]
pub struct ConversationSession {
    pub asker_id: String,
    pub answerer_id: String,
    pub exchange_count: u64,
    pub total_turns: u64,
    pub turn_index: u64,
    phase: SessionPhase,
    safety_deadline: u64,
    /// (speaker id, asset) of the bubble currently shown.
    active_bubble: Option<(String, String)>,
}

impl ConversationSession {
    pub fn participants(&self) -> [&str; 2] {
        [self.asker_id.as_str(), self.answerer_id.as_str()]
    }

    pub fn involves(&self, agent_id: &str) -> bool {
        self.asker_id == agent_id || self.answerer_id == agent_id
    }

    pub fn bubble_for(&self, agent_id: &str) -> Option<&str> {
        match &self.active_bubble {
            Some((speaker, asset)) if speaker == agent_id => Some(asset.as_str()),
            _ => None,
        }
    }

    fn speaker_id(&self) -> &str {
        if self.turn_index % 2 == 0 {
            &self.asker_id
        } else {
            &self.answerer_id
        }
    }
}

/// Observable effects of one social-scheduler tick, for the event log.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SocialEvent {
    Started {
        asker_id: String,
        answerer_id: String,
        exchange_count: u64,
        triggered: bool,
    },
    BubbleShown {
        agent_id: String,
        asset: String,
        turn_index: u64,
    },
    BubbleHidden {
        agent_id: String,
        asset: String,
        turn_index: u64,
    },
    Ended {
        asker_id: String,
        answerer_id: String,
        reason: ConversationEndReason,
        turns_taken: u64,
    },
}

/// Conversation scheduler with process-lifetime rate-limit state.
#[derive(Debug)]
pub struct SocialScheduler {
    session: Option<ConversationSession>,
    last_session_end: Option<u64>,
    sessions_in_window: u16,
    window_start: u64,
    next_attempt_at: u64,
    max_per_window: u16,
    cooldown: u64,
    rng: SimRng,
}

impl SocialScheduler {
    pub fn new(rng: SimRng, max_per_window: u16, cooldown: u64) -> Self {
        Self {
            session: None,
            last_session_end: None,
            sessions_in_window: 0,
            window_start: 0,
            next_attempt_at: FIRST_ATTEMPT_AT,
            max_per_window,
            cooldown,
            rng,
        }
    }

    pub fn session(&self) -> Option<&ConversationSession> {
        self.session.as_ref()
    }

    pub fn is_participant(&self, agent_id: &str) -> bool {
        self.session
            .as_ref()
            .map(|session| session.involves(agent_id))
            .unwrap_or(false)
    }

    pub fn active_bubble_for(&self, agent_id: &str) -> Option<&str> {
        self.session
            .as_ref()
            .and_then(|session| session.bubble_for(agent_id))
    }

    /// Advance rate-limit bookkeeping, the active session, and ambient
    /// pairing attempts by one tick.
    pub fn tick(
        &mut self,
        now: u64,
        agents: &mut BTreeMap<String, OfficeAgent>,
        pathfinder: &mut Pathfinder,
    ) -> Vec<SocialEvent> {
        if now.saturating_sub(self.window_start) > WINDOW_LENGTH {
            self.sessions_in_window = 0;
            self.window_start = now;
        }

        let mut events = Vec::new();
        if self.session.is_some() {
            self.advance_session(now, agents, pathfinder, &mut events);
        } else if now >= self.next_attempt_at {
            self.next_attempt_at = now + self.rng.range_u64(ATTEMPT_DELAY.0, ATTEMPT_DELAY.1);
            self.try_ambient_start(now, agents, pathfinder, &mut events);
        }
        events
    }

    /// User-triggered pairing: accepted only when no session is active and
    /// both named agents are idle and not talking; otherwise a silent no-op.
    /// Bypasses the cooldown and window cap; still counts on completion.
    pub fn trigger(
        &mut self,
        now: u64,
        asker_id: &str,
        answerer_id: &str,
        agents: &mut BTreeMap<String, OfficeAgent>,
        pathfinder: &mut Pathfinder,
    ) -> Option<SocialEvent> {
        if self.session.is_some() || asker_id == answerer_id {
            return None;
        }
        let eligible = |agent: Option<&OfficeAgent>| {
            agent
                .map(|agent| agent.status == AgentStatus::Idle && !agent.is_talking)
                .unwrap_or(false)
        };
        if !eligible(agents.get(asker_id)) || !eligible(agents.get(answerer_id)) {
            return None;
        }
        Some(self.start_session(
            now,
            asker_id.to_string(),
            answerer_id.to_string(),
            true,
            agents,
            pathfinder,
        ))
    }

    /// A participant was externally reassigned (e.g. to `working`): terminate
    /// its session within the same tick. No-op for non-participants.
    pub fn interrupt_participant(
        &mut self,
        agent_id: &str,
        now: u64,
        agents: &mut BTreeMap<String, OfficeAgent>,
        events: &mut Vec<SocialEvent>,
    ) {
        let involved = self
            .session
            .as_ref()
            .map(|session| session.involves(agent_id))
            .unwrap_or(false);
        if involved {
            let session = self.session.take().expect("involved session present");
            self.finalize(
                session,
                now,
                ConversationEndReason::SpeakerReassigned,
                agents,
                events,
            );
        }
    }

    fn rate_limited(&self, now: u64) -> bool {
        if self.sessions_in_window >= self.max_per_window {
            return true;
        }
        match self.last_session_end {
            Some(end) => now.saturating_sub(end) < self.cooldown,
            None => false,
        }
    }

    fn try_ambient_start(
        &mut self,
        now: u64,
        agents: &mut BTreeMap<String, OfficeAgent>,
        pathfinder: &mut Pathfinder,
        events: &mut Vec<SocialEvent>,
    ) {
        if self.rate_limited(now) {
            return;
        }
        let eligible = agents
            .values()
            .filter(|agent| {
                agent.status == AgentStatus::Idle && !agent.is_talking && !agent.selected
            })
            .map(|agent| agent.id.clone())
            .collect::<Vec<_>>();
        let Some((first, second)) = self.rng.pick_pair(eligible.len()) else {
            return;
        };
        let asker_id = eligible[first].clone();
        let answerer_id = eligible[second].clone();
        let started = self.start_session(now, asker_id, answerer_id, false, agents, pathfinder);
        events.push(started);
    }

    fn start_session(
        &mut self,
        now: u64,
        asker_id: String,
        answerer_id: String,
        triggered: bool,
        agents: &mut BTreeMap<String, OfficeAgent>,
        pathfinder: &mut Pathfinder,
    ) -> SocialEvent {
        let asker_position = agents
            .get(&asker_id)
            .map(|agent| agent.position)
            .unwrap_or(WorldPoint::new(0.0, 0.0));

        for id in [&asker_id, &answerer_id] {
            if let Some(agent) = agents.get_mut(id) {
                agent.is_talking = true;
                agent.interrupt_motion(pathfinder);
            }
        }

        // The answerer walks to a point a standoff short of the asker, on
        // the line between them, clamped into the room interior.
        if let Some(answerer) = agents.get_mut(&answerer_id) {
            let dx = asker_position.x - answerer.position.x;
            let dy = asker_position.y - answerer.position.y;
            let distance = (dx * dx + dy * dy).sqrt();
            if distance > APPROACH_MIN_DISTANCE {
                let ratio = (distance - STANDOFF_DISTANCE) / distance;
                let target = pathfinder.grid().clamp_world(WorldPoint::new(
                    answerer.position.x + dx * ratio,
                    answerer.position.y + dy * ratio,
                ));
                if answerer.position.distance_to(target) > 5.0 {
                    answerer.start_walk(
                        pathfinder,
                        target,
                        MotionPurpose::Approach,
                        APPROACH_SPEED,
                        false,
                    );
                }
            }
        }

        let exchange_count = self.rng.range_u64(EXCHANGES.0, EXCHANGES.1);
        self.session = Some(ConversationSession {
            asker_id: asker_id.clone(),
            answerer_id: answerer_id.clone(),
            exchange_count,
            total_turns: exchange_count * 2,
            turn_index: 0,
            phase: SessionPhase::Approaching {
                deadline: now + APPROACH_BUDGET,
            },
            safety_deadline: now + SAFETY_TIMEOUT,
            active_bubble: None,
        });

        SocialEvent::Started {
            asker_id,
            answerer_id,
            exchange_count,
            triggered,
        }
    }

    fn advance_session(
        &mut self,
        now: u64,
        agents: &mut BTreeMap<String, OfficeAgent>,
        pathfinder: &mut Pathfinder,
        events: &mut Vec<SocialEvent>,
    ) {
        let Some(mut session) = self.session.take() else {
            return;
        };

        if now >= session.safety_deadline {
            self.finalize(session, now, ConversationEndReason::SafetyTimeout, agents, events);
            return;
        }

        match session.phase {
            SessionPhase::Approaching { deadline } => {
                let answerer_arrived = agents
                    .get(&session.answerer_id)
                    .map(|agent| agent.motion.is_none())
                    .unwrap_or(true);
                if now < deadline && !answerer_arrived {
                    self.session = Some(session);
                    return;
                }

                // Budget elapsed or walk settled: stop any residual motion.
                if let Some(answerer) = agents.get_mut(&session.answerer_id) {
                    answerer.interrupt_motion(pathfinder);
                }

                let separation = match (
                    agents.get(&session.asker_id),
                    agents.get(&session.answerer_id),
                ) {
                    (Some(asker), Some(answerer)) => asker.position.distance_to(answerer.position),
                    _ => f64::INFINITY,
                };
                if separation > MAX_SEPARATION {
                    self.finalize(
                        session,
                        now,
                        ConversationEndReason::ApproachFailed,
                        agents,
                        events,
                    );
                    return;
                }

                face_each_other(&session.asker_id, &session.answerer_id, agents);
                session.phase = SessionPhase::AwaitingTurn {
                    next_turn_at: now + FIRST_TURN_LEAD_IN,
                };
                self.session = Some(session);
            }
            SessionPhase::AwaitingTurn { next_turn_at } => {
                if now < next_turn_at {
                    self.session = Some(session);
                    return;
                }
                if session.turn_index >= session.total_turns {
                    self.finalize(session, now, ConversationEndReason::Completed, agents, events);
                    return;
                }

                let speaker_id = session.speaker_id().to_string();
                let speaking_allowed = agents
                    .get(&speaker_id)
                    .map(|agent| agent.is_talking)
                    .unwrap_or(false);
                if !speaking_allowed {
                    self.finalize(
                        session,
                        now,
                        ConversationEndReason::SpeakerReassigned,
                        agents,
                        events,
                    );
                    return;
                }

                let pool: &[&str] = if session.turn_index % 2 == 0 {
                    &QUESTION_POOL
                } else {
                    &ANSWER_POOL
                };
                let asset = self
                    .rng
                    .pick(pool)
                    .map(|asset| (*asset).to_string())
                    .unwrap_or_default();
                session.active_bubble = Some((speaker_id.clone(), asset.clone()));
                events.push(SocialEvent::BubbleShown {
                    agent_id: speaker_id,
                    asset,
                    turn_index: session.turn_index,
                });
                session.phase = SessionPhase::Displaying {
                    until: now + self.rng.range_u64(DISPLAY_RANGE.0, DISPLAY_RANGE.1),
                };
                self.session = Some(session);
            }
            SessionPhase::Displaying { until } => {
                if now < until {
                    self.session = Some(session);
                    return;
                }
                if let Some((agent_id, asset)) = session.active_bubble.take() {
                    events.push(SocialEvent::BubbleHidden {
                        agent_id,
                        asset,
                        turn_index: session.turn_index,
                    });
                }
                session.turn_index += 1;
                session.phase = SessionPhase::AwaitingTurn {
                    next_turn_at: now + self.rng.range_u64(PAUSE_RANGE.0, PAUSE_RANGE.1),
                };
                self.session = Some(session);
            }
        }
    }

    /// Terminate a session exactly once: release both agents, update the
    /// rate-limit state, and report what happened.
    fn finalize(
        &mut self,
        mut session: ConversationSession,
        now: u64,
        reason: ConversationEndReason,
        agents: &mut BTreeMap<String, OfficeAgent>,
        events: &mut Vec<SocialEvent>,
    ) {
        if let Some((agent_id, asset)) = session.active_bubble.take() {
            events.push(SocialEvent::BubbleHidden {
                agent_id,
                asset,
                turn_index: session.turn_index,
            });
        }

        for id in [session.asker_id.clone(), session.answerer_id.clone()] {
            if let Some(agent) = agents.get_mut(&id) {
                agent.is_talking = false;
            }
        }

        self.last_session_end = Some(now);
        self.sessions_in_window = self.sessions_in_window.saturating_add(1);

        events.push(SocialEvent::Ended {
            asker_id: session.asker_id,
            answerer_id: session.answerer_id,
            reason,
            turns_taken: session.turn_index,
        });
    }
}

/// Turn two agents toward each other using the dominant-axis rule.
fn face_each_other(asker_id: &str, answerer_id: &str, agents: &mut BTreeMap<String, OfficeAgent>) {
    let positions = match (agents.get(asker_id), agents.get(answerer_id)) {
        (Some(asker), Some(answerer)) => Some((asker.position, answerer.position)),
        _ => None,
    };
    let Some((asker_position, answerer_position)) = positions else {
        return;
    };
    if let Some(asker) = agents.get_mut(asker_id) {
        asker.facing = Facing::from_delta(
            answerer_position.x - asker_position.x,
            answerer_position.y - asker_position.y,
        );
    }
    if let Some(answerer) = agents.get_mut(answerer_id) {
        answerer.facing = Facing::from_delta(
            asker_position.x - answerer_position.x,
            asker_position.y - answerer_position.y,
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::grid::TileGrid;
    use contracts::{AgentSeed, MapLayer, TilePoint};

    fn open_pathfinder(width: u32, height: u32) -> Pathfinder {
        let grid = TileGrid::build(
            width,
            height,
            &[MapLayer {
                name: "Wall".to_string(),
                blocking: true,
                cells: vec![false; width as usize * height as usize],
            }],
        )
        .expect("grid");
        Pathfinder::new(grid)
    }

    fn agents_at(placements: &[(&str, TilePoint)]) -> BTreeMap<String, OfficeAgent> {
        placements
            .iter()
            .map(|(id, tile)| {
                let seed = AgentSeed {
                    agent_id: id.to_string(),
                    name: id.to_string(),
                    role: "role".to_string(),
                    sprite_id: "Adam".to_string(),
                    desk_layer: "wp1".to_string(),
                };
                let mut agent = OfficeAgent::new(&seed, tile.center(), 60.0);
                agent.position = tile.center();
                (id.to_string(), agent)
            })
            .collect()
    }

    fn scheduler() -> SocialScheduler {
        SocialScheduler::new(SimRng::new(11), 5, 10_000)
    }

    /// Drive world-ish ticks: motions first, then the social scheduler.
    fn run_until(
        social: &mut SocialScheduler,
        agents: &mut BTreeMap<String, OfficeAgent>,
        pathfinder: &mut Pathfinder,
        from: u64,
        to: u64,
        dt: u64,
        collected: &mut Vec<SocialEvent>,
    ) {
        let mut now = from;
        while now < to {
            now += dt;
            pathfinder.advance(256);
            let ids = agents.keys().cloned().collect::<Vec<_>>();
            for id in ids {
                if let Some(agent) = agents.get_mut(&id) {
                    agent.advance_motion(pathfinder, dt);
                }
            }
            collected.extend(social.tick(now, agents, pathfinder));
        }
    }

    #[test]
    fn ambient_attempt_pairs_two_idle_agents() {
        let mut social = scheduler();
        let mut agents = agents_at(&[("a", TilePoint::new(2, 2)), ("b", TilePoint::new(8, 2))]);
        let mut pathfinder = open_pathfinder(16, 8);

        let mut events = Vec::new();
        run_until(&mut social, &mut agents, &mut pathfinder, 0, 6100, 100, &mut events);

        assert!(matches!(events.first(), Some(SocialEvent::Started { .. })));
        assert!(agents.values().all(|agent| agent.is_talking));
    }

    /// Hand-built one-exchange session: completes deterministically and must
    /// show exactly Q then A.
    #[test]
    fn completed_session_has_alternating_turns_question_first() {
        let mut social = scheduler();
        let mut agents = agents_at(&[("a", TilePoint::new(2, 2)), ("b", TilePoint::new(3, 2))]);
        let mut pathfinder = open_pathfinder(16, 8);

        for agent in agents.values_mut() {
            agent.is_talking = true;
        }
        social.session = Some(ConversationSession {
            asker_id: "a".to_string(),
            answerer_id: "b".to_string(),
            exchange_count: 1,
            total_turns: 2,
            turn_index: 0,
            phase: SessionPhase::AwaitingTurn { next_turn_at: 200 },
            safety_deadline: SAFETY_TIMEOUT,
            active_bubble: None,
        });

        let mut events = Vec::new();
        let mut now = 0;
        while social.session().is_some() {
            now += 100;
            assert!(now < SAFETY_TIMEOUT, "one exchange must complete in time");
            events.extend(social.tick(now, &mut agents, &mut pathfinder));
        }

        let shown = events
            .iter()
            .filter_map(|event| match event {
                SocialEvent::BubbleShown {
                    agent_id,
                    asset,
                    turn_index,
                } => Some((agent_id.clone(), asset.clone(), *turn_index)),
                _ => None,
            })
            .collect::<Vec<_>>();
        assert_eq!(shown.len(), 2);
        assert_eq!(shown[0].0, "a");
        assert!(QUESTION_POOL.contains(&shown[0].1.as_str()));
        assert_eq!(shown[0].2, 0);
        assert_eq!(shown[1].0, "b");
        assert!(ANSWER_POOL.contains(&shown[1].1.as_str()));
        assert_eq!(shown[1].2, 1);

        match events.last() {
            Some(SocialEvent::Ended {
                reason,
                turns_taken,
                ..
            }) => {
                assert_eq!(*reason, ConversationEndReason::Completed);
                assert_eq!(*turns_taken, 2);
            }
            other => panic!("expected Ended, got {other:?}"),
        }
        assert!(agents.values().all(|agent| !agent.is_talking));
    }

    /// A naturally paired session alternates speakers and pools for however
    /// many turns it gets through, and every bubble shown is hidden again.
    #[test]
    fn natural_session_alternates_and_cleans_up_bubbles() {
        let mut social = scheduler();
        let mut agents = agents_at(&[("a", TilePoint::new(2, 2)), ("b", TilePoint::new(4, 2))]);
        let mut pathfinder = open_pathfinder(16, 8);

        let mut events = Vec::new();
        run_until(&mut social, &mut agents, &mut pathfinder, 0, 40_000, 100, &mut events);

        // Only inspect the first session; a later attempt may start another.
        let end_index = events
            .iter()
            .position(|event| matches!(event, SocialEvent::Ended { .. }))
            .expect("session ended");
        events.truncate(end_index + 1);

        let asker_id = events
            .iter()
            .find_map(|event| match event {
                SocialEvent::Started { asker_id, .. } => Some(asker_id.clone()),
                _ => None,
            })
            .expect("session started");

        let shown = events
            .iter()
            .filter_map(|event| match event {
                SocialEvent::BubbleShown {
                    agent_id,
                    asset,
                    turn_index,
                } => Some((agent_id.clone(), asset.clone(), *turn_index)),
                _ => None,
            })
            .collect::<Vec<_>>();
        assert!(!shown.is_empty());
        for (index, (speaker, asset, turn_index)) in shown.iter().enumerate() {
            assert_eq!(*turn_index, index as u64);
            if index % 2 == 0 {
                assert_eq!(*speaker, asker_id);
                assert!(QUESTION_POOL.contains(&asset.as_str()));
            } else {
                assert_ne!(*speaker, asker_id);
                assert!(ANSWER_POOL.contains(&asset.as_str()));
            }
        }

        let hidden = events
            .iter()
            .filter(|event| matches!(event, SocialEvent::BubbleHidden { .. }))
            .count();
        assert_eq!(hidden, shown.len());
    }

    #[test]
    fn cooldown_rejects_at_5000_and_accepts_after_10000() {
        let mut social = scheduler();
        social.last_session_end = Some(100_000);
        assert!(social.rate_limited(105_000));
        assert!(!social.rate_limited(110_001));
    }

    #[test]
    fn window_cap_rejects_sixth_session() {
        let mut social = scheduler();
        social.window_start = 0;
        social.sessions_in_window = 5;
        // Cooldown long since elapsed; only the cap is in the way.
        social.last_session_end = Some(0);
        assert!(social.rate_limited(50_000));

        // A fresh window lifts the cap.
        let mut agents = agents_at(&[("a", TilePoint::new(2, 2)), ("b", TilePoint::new(4, 2))]);
        let mut pathfinder = open_pathfinder(16, 8);
        social.next_attempt_at = 61_000;
        let events = social.tick(61_000, &mut agents, &mut pathfinder);
        assert!(matches!(events.first(), Some(SocialEvent::Started { .. })));
    }

    #[test]
    fn reassigned_participant_terminates_session_immediately() {
        let mut social = scheduler();
        let mut agents = agents_at(&[("a", TilePoint::new(2, 2)), ("b", TilePoint::new(4, 2))]);
        let mut pathfinder = open_pathfinder(16, 8);

        let mut events = Vec::new();
        run_until(&mut social, &mut agents, &mut pathfinder, 0, 6100, 100, &mut events);
        assert!(social.session().is_some());

        let mut teardown = Vec::new();
        social.interrupt_participant("a", 6200, &mut agents, &mut teardown);
        assert!(social.session().is_none());
        assert!(matches!(
            teardown.last(),
            Some(SocialEvent::Ended {
                reason: ConversationEndReason::SpeakerReassigned,
                ..
            })
        ));
        assert!(agents.values().all(|agent| !agent.is_talking));
    }

    #[test]
    fn safety_timeout_always_terminates() {
        let mut social = scheduler();
        let mut agents = agents_at(&[("a", TilePoint::new(2, 2)), ("b", TilePoint::new(4, 2))]);
        let mut pathfinder = open_pathfinder(16, 8);

        let started = social
            .trigger(0, "a", "b", &mut agents, &mut pathfinder)
            .expect("trigger accepted");
        assert!(matches!(started, SocialEvent::Started { triggered: true, .. }));

        // Freeze the session by never advancing motions; only time passes.
        let mut events = Vec::new();
        let mut now = 0;
        while social.session().is_some() && now < 20_000 {
            now += 100;
            events.extend(social.tick(now, &mut agents, &mut pathfinder));
        }
        let ended = events
            .iter()
            .find_map(|event| match event {
                SocialEvent::Ended { reason, .. } => Some(*reason),
                _ => None,
            })
            .expect("session ended");
        // The session is over well before the 12s + slack mark, one way or
        // another, and both agents are released.
        assert!(now <= 12_100 || ended == ConversationEndReason::SafetyTimeout);
        assert!(agents.values().all(|agent| !agent.is_talking));
    }

    #[test]
    fn trigger_rejects_busy_or_unknown_agents() {
        let mut social = scheduler();
        let mut agents = agents_at(&[("a", TilePoint::new(2, 2)), ("b", TilePoint::new(4, 2))]);
        let mut pathfinder = open_pathfinder(16, 8);

        agents.get_mut("b").expect("agent").status = AgentStatus::Working;
        assert!(social.trigger(0, "a", "b", &mut agents, &mut pathfinder).is_none());
        assert!(social.trigger(0, "a", "ghost", &mut agents, &mut pathfinder).is_none());
        assert!(social.trigger(0, "a", "a", &mut agents, &mut pathfinder).is_none());

        agents.get_mut("b").expect("agent").status = AgentStatus::Idle;
        assert!(social.trigger(0, "a", "b", &mut agents, &mut pathfinder).is_some());
        // Second trigger while a session is active: silent no-op.
        assert!(social.trigger(0, "a", "b", &mut agents, &mut pathfinder).is_none());
    }

    #[test]
    fn distant_pair_aborts_when_approach_budget_runs_out() {
        let mut social = scheduler();
        // 20 tiles apart: the answerer cannot cover it inside the budget.
        let mut agents = agents_at(&[("a", TilePoint::new(1, 1)), ("b", TilePoint::new(21, 1))]);
        let mut pathfinder = open_pathfinder(24, 4);

        social
            .trigger(0, "a", "b", &mut agents, &mut pathfinder)
            .expect("trigger accepted");

        let mut events = Vec::new();
        run_until(&mut social, &mut agents, &mut pathfinder, 0, 4000, 100, &mut events);

        let ended = events
            .iter()
            .find_map(|event| match event {
                SocialEvent::Ended { reason, .. } => Some(*reason),
                _ => None,
            })
            .expect("session ended");
        assert_eq!(ended, ConversationEndReason::ApproachFailed);
        assert!(agents.values().all(|agent| !agent.is_talking));
    }
}
