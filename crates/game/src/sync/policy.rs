use crate::state::{GamePhase, GameState, Side};

/// What the client-side receive path decided to do with a snapshot.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReconcileOutcome {
    /// Local prediction drifted past the threshold; everything was
    /// overwritten from the snapshot.
    Hard,
    /// Prediction was close enough; locally simulated ball position and
    /// own paddle position were kept, the rest taken from the host.
    Soft,
}

/// Send throttle shared by the host snapshot path and the client intent
/// path. Important lifecycle phases bypass the interval so transitions
/// are never starved.
#[derive(Debug)]
pub struct SendThrottle {
    min_interval_ms: u64,
    last_send_ms: Option<u64>,
}

impl SendThrottle {
    pub fn new(min_interval_ms: u64) -> Self {
        Self {
            min_interval_ms,
            last_send_ms: None,
        }
    }

    pub fn should_send(&self, phase: GamePhase, now_ms: u64) -> bool {
        if phase.is_important() {
            return true;
        }
        match self.last_send_ms {
            None => true,
            Some(last) => now_ms.saturating_sub(last) >= self.min_interval_ms,
        }
    }

    /// Interval check alone, with no phase bypass. Used for the client
    /// intent cadence.
    pub fn ready(&self, now_ms: u64) -> bool {
        match self.last_send_ms {
            None => true,
            Some(last) => now_ms.saturating_sub(last) >= self.min_interval_ms,
        }
    }

    pub fn mark_sent(&mut self, now_ms: u64) {
        self.last_send_ms = Some(now_ms);
    }

    pub fn reset(&mut self) {
        self.last_send_ms = None;
    }
}

/// Divergence test: Euclidean distance for the ball, vertical distance
/// per paddle, anything past the threshold counts as diverged.
pub fn needs_reconciliation(local: &GameState, remote: &GameState, threshold: f32) -> bool {
    if local.ball.position.distance(remote.ball.position) > threshold {
        return true;
    }
    local
        .paddles
        .iter()
        .zip(remote.paddles.iter())
        .any(|(l, r)| (l.position.y - r.position.y).abs() > threshold)
}

/// Full overwrite from the authoritative snapshot. Sacrifices local
/// smoothness for correctness once prediction has drifted too far.
pub fn hard_reconcile(local: &mut GameState, remote: &GameState) {
    *local = remote.clone();
}

/// Partial overwrite that preserves the two locally predicted entities:
/// the ball's position and the own paddle's position/motion. Everything
/// the client has no authority or no inputs for (opponent paddle, ball
/// velocity and rally bookkeeping, scores, phase, effects, config) comes
/// from the host.
pub fn soft_merge(local: &mut GameState, remote: &GameState, own_side: Side) {
    let own = own_side.index();
    let opponent = own_side.opposite().index();

    // Opponent inputs are never simulated locally, only time-advanced,
    // so that paddle is always host truth
    local.paddles[opponent] = remote.paddles[opponent].clone();

    // Own paddle: keep predicted position and motion, take effect-driven
    // size from the host
    local.paddles[own].height = remote.paddles[own].height;
    local.paddles[own].combo_hits = remote.paddles[own].combo_hits;

    // Ball: keep the predicted position for render smoothness, take the
    // authoritative rest
    let predicted_position = local.ball.position;
    local.ball = remote.ball.clone();
    local.ball.position = predicted_position;

    local.extra_balls = remote.extra_balls.clone();
    local.scores = remote.scores;
    local.phase = remote.phase;
    local.field_powerups = remote.field_powerups.clone();
    local.active_effects = remote.active_effects.clone();
    local.turbo_remaining = remote.turbo_remaining;
    local.speed_multiplier = remote.speed_multiplier;
    local.timestamp_ms = remote.timestamp_ms;
    local.config = remote.config;
}

/// Client receive path: classify divergence, then apply the matching
/// merge.
pub fn reconcile(local: &mut GameState, remote: &GameState, own_side: Side) -> ReconcileOutcome {
    let threshold = local.config.reconcile_threshold;
    if needs_reconciliation(local, remote, threshold) {
        log::debug!(
            "hard reconciliation: ball drift {:.1}px",
            local.ball.position.distance(remote.ball.position)
        );
        hard_reconcile(local, remote);
        ReconcileOutcome::Hard
    } else {
        soft_merge(local, remote, own_side);
        ReconcileOutcome::Soft
    }
}
