use rkyv::{Archive, Deserialize, Serialize};

use crate::config::GameConfig;
use crate::physics::{BallState, PaddleState};
use crate::powerup::{ActiveEffect, FieldPowerUp};
use crate::rng::GameRng;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Archive, Serialize, Deserialize)]
#[rkyv(compare(PartialEq), derive(Debug))]
pub enum Side {
    Left,
    Right,
}

impl Side {
    pub fn opposite(self) -> Side {
        match self {
            Side::Left => Side::Right,
            Side::Right => Side::Left,
        }
    }

    pub fn index(self) -> usize {
        match self {
            Side::Left => 0,
            Side::Right => 1,
        }
    }

    pub fn random(rng: &mut GameRng) -> Side {
        if rng.coin() { Side::Left } else { Side::Right }
    }
}

/// Game lifecycle. Countdown and winner data only exist in the phases
/// where they mean something.
#[derive(Debug, Clone, Copy, PartialEq, Archive, Serialize, Deserialize)]
#[rkyv(derive(Debug))]
pub enum GamePhase {
    WaitingForOpponent,
    Countdown { remaining: u8 },
    Playing,
    Paused,
    GameOver { winner: Side },
}

impl GamePhase {
    /// Phases whose snapshots must never be starved by send throttling.
    pub fn is_important(self) -> bool {
        matches!(
            self,
            GamePhase::Countdown { .. } | GamePhase::Playing | GamePhase::GameOver { .. }
        )
    }

    pub fn is_simulating(self) -> bool {
        matches!(self, GamePhase::Playing)
    }

    pub fn winner(self) -> Option<Side> {
        match self {
            GamePhase::GameOver { winner } => Some(winner),
            _ => None,
        }
    }

    pub fn countdown(self) -> Option<u8> {
        match self {
            GamePhase::Countdown { remaining } => Some(remaining),
            _ => None,
        }
    }
}

/// Aggregate root. Unit of wire transmission and of reconciliation
/// comparison; rebuilt locally every tick and snapshotted for sending.
#[derive(Debug, Clone, PartialEq, Archive, Serialize, Deserialize)]
#[rkyv(derive(Debug))]
pub struct GameState {
    pub phase: GamePhase,
    pub paddles: [PaddleState; 2],
    pub ball: BallState,
    /// Transient multi-ball entities. Removed on scoring or reset and
    /// never score themselves.
    pub extra_balls: Vec<BallState>,
    pub scores: [u8; 2],
    pub field_powerups: Vec<FieldPowerUp>,
    pub active_effects: Vec<ActiveEffect>,
    pub turbo_remaining: Option<f32>,
    pub speed_multiplier: f32,
    pub timestamp_ms: u64,
    pub config: GameConfig,
}

impl GameState {
    pub fn new(config: GameConfig) -> Self {
        Self {
            phase: GamePhase::WaitingForOpponent,
            paddles: [
                PaddleState::new(Side::Left, &config),
                PaddleState::new(Side::Right, &config),
            ],
            ball: BallState::new(&config),
            extra_balls: Vec::new(),
            scores: [0, 0],
            field_powerups: Vec::new(),
            active_effects: Vec::new(),
            turbo_remaining: None,
            speed_multiplier: 1.0,
            timestamp_ms: 0,
            config,
        }
    }

    pub fn paddle(&self, side: Side) -> &PaddleState {
        &self.paddles[side.index()]
    }

    pub fn paddle_mut(&mut self, side: Side) -> &mut PaddleState {
        &mut self.paddles[side.index()]
    }

    pub fn score(&self, side: Side) -> u8 {
        self.scores[side.index()]
    }

    /// Effective ball-speed multiplier for the current tick.
    pub fn effective_multiplier(&self) -> f32 {
        let turbo = if self.turbo_remaining.is_some() {
            self.config.powerups.turbo_multiplier
        } else {
            1.0
        };
        self.speed_multiplier * turbo
    }

    /// Reset entities for a fresh round: paddles recentered, ball parked
    /// at center, all transient effects cleared. Scores are untouched.
    pub fn reset_entities(&mut self) {
        let config = self.config;
        for paddle in &mut self.paddles {
            paddle.reset(&config);
        }
        self.ball = BallState::new(&config);
        self.extra_balls.clear();
        self.field_powerups.clear();
        self.active_effects.clear();
        self.turbo_remaining = None;
        self.speed_multiplier = 1.0;
    }

    /// Full match reset: entities plus scores.
    pub fn reset_match(&mut self) {
        self.reset_entities();
        self.scores = [0, 0];
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn phase_accessors() {
        assert_eq!(GamePhase::Countdown { remaining: 2 }.countdown(), Some(2));
        assert_eq!(GamePhase::Playing.countdown(), None);
        assert_eq!(
            GamePhase::GameOver { winner: Side::Left }.winner(),
            Some(Side::Left)
        );
        assert_eq!(GamePhase::Paused.winner(), None);
    }

    #[test]
    fn important_phases() {
        assert!(!GamePhase::WaitingForOpponent.is_important());
        assert!(GamePhase::Countdown { remaining: 3 }.is_important());
        assert!(GamePhase::Playing.is_important());
        assert!(!GamePhase::Paused.is_important());
        assert!(GamePhase::GameOver { winner: Side::Right }.is_important());
    }

    #[test]
    fn reset_entities_keeps_scores() {
        let mut state = GameState::new(GameConfig::default());
        state.scores = [3, 5];
        state.turbo_remaining = Some(2.0);
        state.extra_balls.push(state.ball.clone());

        state.reset_entities();

        assert_eq!(state.scores, [3, 5]);
        assert!(state.extra_balls.is_empty());
        assert_eq!(state.turbo_remaining, None);

        state.reset_match();
        assert_eq!(state.scores, [0, 0]);
    }

    #[test]
    fn turbo_raises_multiplier() {
        let mut state = GameState::new(GameConfig::default());
        let base = state.effective_multiplier();
        state.turbo_remaining = Some(1.0);
        assert!(state.effective_multiplier() > base);
    }
}
