use glam::Vec2;
use rkyv::{Archive, Deserialize, Serialize};

use crate::config::GameConfig;
use crate::state::Side;

/// Movement intent as reported by input. Intent, not guaranteed motion:
/// a rebounding paddle ignores it until the rebound finishes.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Archive, Serialize, Deserialize)]
#[rkyv(compare(PartialEq), derive(Debug))]
pub struct MoveIntent {
    pub up: bool,
    pub down: bool,
}

impl MoveIntent {
    pub fn new(up: bool, down: bool) -> Self {
        Self { up, down }
    }

    /// -1 for up, +1 for down, 0 when idle or contradictory.
    pub fn direction(&self) -> f32 {
        match (self.up, self.down) {
            (true, false) => -1.0,
            (false, true) => 1.0,
            _ => 0.0,
        }
    }
}

/// Exclusive motion states. Rebounding and dashing cannot overlap by
/// construction.
#[derive(Debug, Clone, Copy, PartialEq, Archive, Serialize, Deserialize)]
#[rkyv(derive(Debug))]
pub enum PaddleMotion {
    Idle,
    Rebounding { elapsed: f32 },
    Dashing { elapsed: f32 },
}

#[derive(Debug, Clone, PartialEq, Archive, Serialize, Deserialize)]
#[rkyv(derive(Debug))]
pub struct PaddleState {
    pub side: Side,
    pub position: Vec2,
    pub width: f32,
    pub height: f32,
    pub intent: MoveIntent,
    pub motion: PaddleMotion,
    /// Consecutive ball hits this rally, reset when the owner concedes.
    pub combo_hits: u32,
}

impl PaddleState {
    pub fn new(side: Side, config: &GameConfig) -> Self {
        let x = match side {
            Side::Left => config.paddle_margin,
            Side::Right => config.field_width - config.paddle_margin,
        };

        Self {
            side,
            position: Vec2::new(x, config.field_height * 0.5),
            width: config.paddle_width,
            height: config.paddle_height,
            intent: MoveIntent::default(),
            motion: PaddleMotion::Idle,
            combo_hits: 0,
        }
    }

    pub fn half_height(&self) -> f32 {
        self.height * 0.5
    }

    pub fn half_width(&self) -> f32 {
        self.width * 0.5
    }

    /// Recenter vertically and clear motion and rally counters. Height is
    /// restored too; resize effects do not survive a match reset.
    pub fn reset(&mut self, config: &GameConfig) {
        self.position.y = config.field_height * 0.5;
        self.height = config.paddle_height;
        self.intent = MoveIntent::default();
        self.motion = PaddleMotion::Idle;
        self.combo_hits = 0;
    }

    pub fn set_height_clamped(&mut self, height: f32, config: &GameConfig) {
        self.height = height.clamp(config.paddle_min_height, config.paddle_max_height);
    }

    pub fn start_dash(&mut self) {
        // A rebound in progress wins over a dash request
        if !matches!(self.motion, PaddleMotion::Rebounding { .. }) {
            self.motion = PaddleMotion::Dashing { elapsed: 0.0 };
        }
    }

    /// One fixed slice of paddle movement: motion state first, then
    /// intent, then boundary handling with a forced rebound.
    pub fn step(&mut self, dt: f32, config: &GameConfig) {
        match self.motion {
            PaddleMotion::Rebounding { elapsed } => {
                let elapsed = elapsed + dt;
                if elapsed >= config.rebound_duration {
                    self.motion = PaddleMotion::Idle;
                } else {
                    // Push back toward the field center, away from the
                    // wall that triggered the rebound
                    let away = if self.position.y < config.field_height * 0.5 {
                        1.0
                    } else {
                        -1.0
                    };
                    self.position.y += away * config.rebound_speed * dt;
                    self.motion = PaddleMotion::Rebounding { elapsed };
                    return;
                }
            }
            PaddleMotion::Dashing { elapsed } => {
                let elapsed = elapsed + dt;
                if elapsed >= config.dash_duration {
                    self.motion = PaddleMotion::Idle;
                } else {
                    self.motion = PaddleMotion::Dashing { elapsed };
                    let speed = config.paddle_speed * config.dash_multiplier;
                    self.position.y += self.intent.direction() * speed * dt;
                    self.clamp_or_rebound(config);
                    return;
                }
            }
            PaddleMotion::Idle => {}
        }

        self.position.y += self.intent.direction() * config.paddle_speed * dt;
        self.clamp_or_rebound(config);
    }

    fn clamp_or_rebound(&mut self, config: &GameConfig) {
        let half = self.half_height();
        if self.position.y - half < 0.0 {
            self.position.y = half;
            self.motion = PaddleMotion::Rebounding { elapsed: 0.0 };
        } else if self.position.y + half > config.field_height {
            self.position.y = config.field_height - half;
            self.motion = PaddleMotion::Rebounding { elapsed: 0.0 };
        }
    }
}
