use glam::Vec2;
use rkyv::{Archive, Deserialize, Serialize};

use crate::event::{EventQueue, GameEvent};
use crate::rng::GameRng;
use crate::state::{GameState, Side};

const MAX_FIELD_POWERUPS: usize = 3;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Archive, Serialize, Deserialize)]
#[rkyv(compare(PartialEq), derive(Debug))]
pub enum PowerUpKind {
    MultiBall,
    PaddleGrow,
    PaddleShrink,
    Turbo,
}

impl PowerUpKind {
    fn from_index(index: u32) -> PowerUpKind {
        match index % 4 {
            0 => PowerUpKind::MultiBall,
            1 => PowerUpKind::PaddleGrow,
            2 => PowerUpKind::PaddleShrink,
            _ => PowerUpKind::Turbo,
        }
    }
}

/// A pickup sitting on the field, waiting to be hit by a ball.
#[derive(Debug, Clone, PartialEq, Archive, Serialize, Deserialize)]
#[rkyv(derive(Debug))]
pub struct FieldPowerUp {
    pub kind: PowerUpKind,
    pub position: Vec2,
    pub remaining: f32,
}

/// A collected, still-running timed effect. Only effects that need a
/// revert on expiry are tracked here; multi-ball is fire-and-forget and
/// turbo keeps its own timer on the game state.
#[derive(Debug, Clone, PartialEq, Archive, Serialize, Deserialize)]
#[rkyv(derive(Debug))]
pub struct ActiveEffect {
    pub kind: PowerUpKind,
    pub side: Side,
    pub remaining: f32,
}

/// Host-side spawn cadence. Not part of the snapshot; the spawned
/// pickups are, so the client sees them through sync.
#[derive(Debug)]
pub struct PowerUpSpawner {
    since_last: f32,
}

impl PowerUpSpawner {
    pub fn new() -> Self {
        Self { since_last: 0.0 }
    }

    pub fn tick(&mut self, state: &mut GameState, dt: f32, rng: &mut GameRng, events: &mut EventQueue) {
        let config = state.config;
        if !config.powerups.enabled || !state.phase.is_simulating() {
            return;
        }

        self.since_last += dt;
        if self.since_last < config.powerups.spawn_interval_secs {
            return;
        }
        self.since_last = 0.0;

        if state.field_powerups.len() >= MAX_FIELD_POWERUPS {
            return;
        }

        // Spawn in the middle band of the field, out of the paddles' lanes
        let kind = PowerUpKind::from_index(rng.pick(4));
        let x = config.field_width * (0.3 + rng.jitter(0.4));
        let y = config.field_height * (0.15 + rng.jitter(0.7));
        let powerup = FieldPowerUp {
            kind,
            position: Vec2::new(x, y),
            remaining: config.powerups.lifetime_secs,
        };

        log::debug!("spawning powerup {:?} at {:?}", kind, powerup.position);
        events.push(GameEvent::PowerUpSpawned {
            kind,
            position: powerup.position,
        });
        state.field_powerups.push(powerup);
    }
}

impl Default for PowerUpSpawner {
    fn default() -> Self {
        Self::new()
    }
}

/// Age field pickups and running effects by one slice, reverting
/// whatever expired.
pub fn tick_effects(state: &mut GameState, dt: f32, events: &mut EventQueue) {
    let config = state.config;

    state.field_powerups.retain_mut(|p| {
        p.remaining -= dt;
        p.remaining > 0.0
    });

    if let Some(remaining) = state.turbo_remaining {
        let remaining = remaining - dt;
        state.turbo_remaining = (remaining > 0.0).then_some(remaining);
    }

    let mut expired = Vec::new();
    state.active_effects.retain_mut(|effect| {
        effect.remaining -= dt;
        if effect.remaining <= 0.0 {
            expired.push((effect.kind, effect.side));
            false
        } else {
            true
        }
    });

    for (kind, side) in expired {
        match kind {
            PowerUpKind::PaddleGrow | PowerUpKind::PaddleShrink => {
                state
                    .paddle_mut(side)
                    .set_height_clamped(config.paddle_height, &config);
            }
            _ => {}
        }
        events.push(GameEvent::PowerUpExpired { kind, side });
    }
}

/// Test every ball against every field pickup and apply collections.
/// The pickup is credited to the side that last touched the ball; an
/// untouched ball (fresh serve) collects nothing.
pub fn collect(state: &mut GameState, rng: &mut GameRng, events: &mut EventQueue) {
    let config = state.config;

    let mut collected: Vec<(usize, Side)> = Vec::new();
    for (index, powerup) in state.field_powerups.iter().enumerate() {
        let reach = config.powerups.pickup_radius;
        let hit_by = std::iter::once(&state.ball)
            .chain(state.extra_balls.iter())
            .find(|ball| ball.position.distance(powerup.position) <= reach + ball.radius);
        if let Some(ball) = hit_by
            && let Some(side) = ball.last_touched
        {
            collected.push((index, side));
        }
    }

    // Remove back to front so indices stay valid
    for (index, side) in collected.into_iter().rev() {
        let powerup = state.field_powerups.remove(index);
        apply(state, powerup.kind, side, rng);
        events.push(GameEvent::PowerUpCollected {
            kind: powerup.kind,
            side,
        });
    }
}

fn apply(state: &mut GameState, kind: PowerUpKind, side: Side, rng: &mut GameRng) {
    let config = state.config;
    let duration = config.powerups.effect_duration_secs;

    match kind {
        PowerUpKind::MultiBall => {
            for i in 0..config.powerups.extra_ball_count {
                let mut ball = state.ball.clone();
                let spread = 0.4 * (i as f32 + 1.0) * if rng.coin() { 1.0 } else { -1.0 };
                let speed = ball.speed().max(config.ball_base_speed);
                let angle = ball.velocity.y.atan2(ball.velocity.x) + spread;
                ball.velocity = Vec2::new(angle.cos(), angle.sin()) * speed;
                state.extra_balls.push(ball);
            }
        }
        PowerUpKind::PaddleGrow => {
            let height = state.paddle(side).height * config.powerups.resize_factor;
            state.paddle_mut(side).set_height_clamped(height, &config);
            state.active_effects.push(ActiveEffect {
                kind,
                side,
                remaining: duration,
            });
        }
        PowerUpKind::PaddleShrink => {
            let target = side.opposite();
            let height = state.paddle(target).height / config.powerups.resize_factor;
            state.paddle_mut(target).set_height_clamped(height, &config);
            state.active_effects.push(ActiveEffect {
                kind,
                side: target,
                remaining: duration,
            });
        }
        PowerUpKind::Turbo => {
            state.turbo_remaining = Some(duration);
            state.paddle_mut(side).start_dash();
        }
    }
}
