use crate::event::{EventQueue, GameEvent};
use crate::net::ControlAction;
use crate::rng::GameRng;
use crate::state::{GamePhase, GameState, Side};

/// Wall-time interval after which the failsafe forces a countdown
/// decrement if the fixed-step path has not produced one.
pub const FAILSAFE_INTERVAL_SECS: f32 = 1.25;

#[derive(Debug)]
struct FailsafeTimer {
    elapsed: f32,
}

/// Authoritative game lifecycle. Both peers run one; the host's wins
/// through state sync. Owns the countdown and its stall failsafe as a
/// single explicit handle that is cancelled on any transition out of
/// the countdown, so a stale timer can never fire against a changed
/// phase.
#[derive(Debug)]
pub struct ControlMachine {
    last_control_ms: Option<u64>,
    countdown_acc: f32,
    failsafe: Option<FailsafeTimer>,
}

impl ControlMachine {
    pub fn new() -> Self {
        Self {
            last_control_ms: None,
            countdown_acc: 0.0,
            failsafe: None,
        }
    }

    pub fn last_control_ms(&self) -> Option<u64> {
        self.last_control_ms
    }

    /// Apply a lifecycle command. Commands whose timestamp is not newer
    /// than the last processed one are discarded; the channel may
    /// reorder or duplicate them. Returns whether the command changed
    /// anything.
    pub fn apply_control(
        &mut self,
        state: &mut GameState,
        action: ControlAction,
        timestamp_ms: u64,
        events: &mut EventQueue,
    ) -> bool {
        if let Some(last) = self.last_control_ms
            && timestamp_ms <= last
        {
            log::trace!("discarding stale control {:?} at t={}", action, timestamp_ms);
            return false;
        }

        let applied = match action {
            ControlAction::Start => {
                if state.phase == GamePhase::WaitingForOpponent {
                    self.enter_countdown(state, events);
                    true
                } else {
                    false
                }
            }
            ControlAction::Pause => {
                if state.phase == GamePhase::Playing {
                    self.set_phase(state, GamePhase::Paused, events);
                    true
                } else {
                    false
                }
            }
            ControlAction::Resume => {
                if state.phase == GamePhase::Paused {
                    self.set_phase(state, GamePhase::Playing, events);
                    true
                } else {
                    false
                }
            }
            ControlAction::Restart => {
                state.reset_match();
                self.enter_countdown(state, events);
                true
            }
        };

        if applied {
            self.last_control_ms = Some(timestamp_ms);
            log::debug!("applied control {:?}, phase now {:?}", action, state.phase);
        }
        applied
    }

    /// Primary countdown path, driven by fixed-step time: one decrement
    /// per elapsed simulated second.
    pub fn tick_fixed(
        &mut self,
        state: &mut GameState,
        dt: f32,
        rng: &mut GameRng,
        events: &mut EventQueue,
    ) {
        if !matches!(state.phase, GamePhase::Countdown { .. }) {
            return;
        }

        self.countdown_acc += dt;
        while self.countdown_acc >= 1.0 && matches!(state.phase, GamePhase::Countdown { .. }) {
            self.countdown_acc -= 1.0;
            self.decrement(state, rng, events);
        }
    }

    /// Stall recovery, driven by raw frame time so it still progresses
    /// when the fixed-step accumulator is stuck. Every decrement re-arms
    /// it; a healthy primary path keeps it from ever firing.
    pub fn tick_failsafe(
        &mut self,
        state: &mut GameState,
        frame_dt: f32,
        rng: &mut GameRng,
        events: &mut EventQueue,
    ) {
        if !matches!(state.phase, GamePhase::Countdown { .. }) {
            self.failsafe = None;
            return;
        }

        // Arm lazily: a peer can land in Countdown through a received
        // snapshot without ever seeing the Start control
        let timer = self.failsafe.get_or_insert(FailsafeTimer { elapsed: 0.0 });
        timer.elapsed += frame_dt;
        let fire = timer.elapsed >= FAILSAFE_INTERVAL_SECS;

        if fire {
            log::warn!("countdown stalled, failsafe forcing a decrement");
            self.decrement(state, rng, events);
        }
    }

    /// Force the lobby state, used when the connection drops.
    pub fn force_waiting(&mut self, state: &mut GameState, events: &mut EventQueue) {
        self.countdown_acc = 0.0;
        self.set_phase(state, GamePhase::WaitingForOpponent, events);
    }

    fn enter_countdown(&mut self, state: &mut GameState, events: &mut EventQueue) {
        state.reset_entities();
        self.countdown_acc = 0.0;
        let remaining = state.config.countdown_secs;
        self.set_phase(state, GamePhase::Countdown { remaining }, events);
        self.failsafe = Some(FailsafeTimer { elapsed: 0.0 });
    }

    fn decrement(&mut self, state: &mut GameState, rng: &mut GameRng, events: &mut EventQueue) {
        let GamePhase::Countdown { remaining } = state.phase else {
            return;
        };

        if let Some(timer) = &mut self.failsafe {
            timer.elapsed = 0.0;
        }

        let remaining = remaining.saturating_sub(1);
        if remaining == 0 {
            let config = state.config;
            let toward = Side::random(rng);
            state.ball.serve(&config, toward, rng);
            self.set_phase(state, GamePhase::Playing, events);
            events.push(GameEvent::Serve { toward });
        } else {
            self.set_phase(state, GamePhase::Countdown { remaining }, events);
        }
    }

    fn set_phase(&mut self, state: &mut GameState, phase: GamePhase, events: &mut EventQueue) {
        state.phase = phase;
        if !matches!(phase, GamePhase::Countdown { .. }) {
            self.failsafe = None;
        }
        events.push(GameEvent::PhaseChanged { phase });
    }
}

impl Default for ControlMachine {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::GameConfig;

    fn setup() -> (ControlMachine, GameState, GameRng, EventQueue) {
        (
            ControlMachine::new(),
            GameState::new(GameConfig::default()),
            GameRng::new(17),
            EventQueue::new(),
        )
    }

    #[test]
    fn start_enters_countdown_with_configured_value() {
        let (mut machine, mut state, _rng, mut events) = setup();

        assert!(machine.apply_control(&mut state, ControlAction::Start, 10, &mut events));
        assert_eq!(state.phase, GamePhase::Countdown { remaining: 3 });
    }

    #[test]
    fn countdown_reaches_playing_after_three_seconds() {
        let (mut machine, mut state, mut rng, mut events) = setup();
        machine.apply_control(&mut state, ControlAction::Start, 10, &mut events);

        // A few extra ticks of headroom for accumulator rounding
        let dt = 1.0 / 120.0;
        for _ in 0..(120 * 3 + 5) {
            machine.tick_fixed(&mut state, dt, &mut rng, &mut events);
        }

        assert_eq!(state.phase, GamePhase::Playing);
        assert!(state.ball.velocity.length() > 0.0);
    }

    #[test]
    fn duplicate_control_is_a_noop() {
        let (mut machine, mut state, _rng, mut events) = setup();

        assert!(machine.apply_control(&mut state, ControlAction::Restart, 100, &mut events));
        let after_first = state.clone();

        assert!(!machine.apply_control(&mut state, ControlAction::Restart, 100, &mut events));
        assert_eq!(state, after_first);
    }

    #[test]
    fn reordered_control_is_discarded() {
        let (mut machine, mut state, _rng, mut events) = setup();
        state.phase = GamePhase::Playing;

        assert!(machine.apply_control(&mut state, ControlAction::Pause, 60, &mut events));
        assert!(machine.apply_control(&mut state, ControlAction::Resume, 70, &mut events));
        assert_eq!(state.phase, GamePhase::Playing);

        // A pause from before the resume arrives late
        assert!(!machine.apply_control(&mut state, ControlAction::Pause, 50, &mut events));
        assert_eq!(state.phase, GamePhase::Playing);
    }

    #[test]
    fn pause_only_valid_while_playing() {
        let (mut machine, mut state, _rng, mut events) = setup();

        assert!(!machine.apply_control(&mut state, ControlAction::Pause, 10, &mut events));
        assert_eq!(state.phase, GamePhase::WaitingForOpponent);

        state.phase = GamePhase::Playing;
        assert!(machine.apply_control(&mut state, ControlAction::Pause, 20, &mut events));
        assert_eq!(state.phase, GamePhase::Paused);
        assert!(machine.apply_control(&mut state, ControlAction::Resume, 30, &mut events));
        assert_eq!(state.phase, GamePhase::Playing);
    }

    #[test]
    fn restart_clears_scores_from_game_over() {
        let (mut machine, mut state, _rng, mut events) = setup();
        state.phase = GamePhase::GameOver { winner: Side::Left };
        state.scores = [11, 4];

        assert!(machine.apply_control(&mut state, ControlAction::Restart, 10, &mut events));
        assert_eq!(state.scores, [0, 0]);
        assert_eq!(state.phase, GamePhase::Countdown { remaining: 3 });
    }

    #[test]
    fn failsafe_advances_a_stalled_countdown() {
        let (mut machine, mut state, mut rng, mut events) = setup();
        machine.apply_control(&mut state, ControlAction::Start, 10, &mut events);

        // The fixed-step path never runs; only wall time passes
        let mut guard = 0;
        while state.phase != GamePhase::Playing {
            machine.tick_failsafe(&mut state, 0.1, &mut rng, &mut events);
            guard += 1;
            assert!(guard < 1000, "failsafe failed to finish the countdown");
        }

        assert_eq!(state.phase, GamePhase::Playing);
        assert!(state.ball.velocity.length() > 0.0);
    }

    #[test]
    fn healthy_primary_path_keeps_failsafe_silent() {
        let (mut machine, mut state, mut rng, mut events) = setup();
        machine.apply_control(&mut state, ControlAction::Start, 10, &mut events);

        // Interleave both paths at a healthy rate; the countdown must
        // take its value from the 1 Hz primary path, not fire twice
        let dt = 1.0 / 120.0;
        let mut fixed_ticks = 0;
        while state.phase != GamePhase::Playing {
            machine.tick_fixed(&mut state, dt, &mut rng, &mut events);
            machine.tick_failsafe(&mut state, dt, &mut rng, &mut events);
            fixed_ticks += 1;
            assert!(fixed_ticks <= 120 * 3 + 5);
        }
        // Three simulated seconds, give or take accumulator rounding
        assert!((120 * 3 - 2..=120 * 3 + 5).contains(&fixed_ticks));
    }

    #[test]
    fn leaving_countdown_cancels_the_failsafe() {
        let (mut machine, mut state, mut rng, mut events) = setup();
        machine.apply_control(&mut state, ControlAction::Start, 10, &mut events);

        // Connection drop mid-countdown
        machine.force_waiting(&mut state, &mut events);
        assert_eq!(state.phase, GamePhase::WaitingForOpponent);

        // Lots of wall time later, the stale timer must not fire a
        // stale transition
        for _ in 0..100 {
            machine.tick_failsafe(&mut state, 1.0, &mut rng, &mut events);
        }
        assert_eq!(state.phase, GamePhase::WaitingForOpponent);
    }
}
